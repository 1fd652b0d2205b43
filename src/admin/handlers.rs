use std::collections::BTreeMap;
use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::BackendProtocol;
use crate::gateway::RefreshReport;
use crate::http::server::AppState;
use crate::load_balancer::Balanced;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub services: usize,
    pub client_groups: usize,
}

#[derive(Serialize)]
pub struct BackendStatus {
    pub address: String,
    pub protocol: BackendProtocol,
    pub in_flight: usize,
}

#[derive(Serialize)]
pub struct GroupStatus {
    pub service: String,
    pub backends: Vec<BackendStatus>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        services: state.runtime.registry().len(),
        client_groups: state.runtime.pool().len(),
    })
}

/// Registry contents, service name → backend addresses.
pub async fn get_services(State(state): State<AppState>) -> Json<BTreeMap<String, Vec<String>>> {
    Json(state.runtime.registry().to_map().into_iter().collect())
}

pub async fn get_pool(State(state): State<AppState>) -> Json<Vec<GroupStatus>> {
    let mut groups: Vec<GroupStatus> = state
        .runtime
        .pool()
        .entries()
        .into_iter()
        .map(|(service, group)| GroupStatus {
            service,
            backends: group
                .backends()
                .iter()
                .map(|b| BackendStatus {
                    address: b.address().to_string(),
                    protocol: b.protocol(),
                    in_flight: b.in_flight(),
                })
                .collect(),
        })
        .collect();
    groups.sort_by(|a, b| a.service.cmp(&b.service));
    Json(groups)
}

/// Last applied refresh, `null` before the first one.
pub async fn get_refresh(State(state): State<AppState>) -> Json<Option<RefreshReport>> {
    Json(state.runtime.last_refresh().map(|r| (*r).clone()))
}
