//! Eureka REST discovery source.
//!
//! Queries `GET {eureka_url}/apps` and decodes the JSON registry dump.

use std::time::Duration;
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::discovery::{Application, DiscoveryError, DiscoverySource, Instance};

/// Discovery source backed by a Eureka server.
#[derive(Debug, Clone)]
pub struct EurekaSource {
    apps_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl EurekaSource {
    /// Create a source for the given Eureka base URL (".../eureka").
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DiscoveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DiscoveryError::Request(e.to_string()))?;

        Ok(Self {
            apps_url: format!("{}/apps", base_url.trim_end_matches('/')),
            client,
            timeout_secs: timeout.as_secs(),
        })
    }
}

impl DiscoverySource for EurekaSource {
    async fn query_all(&self) -> Result<Vec<Application>, DiscoveryError> {
        let response = self
            .client
            .get(&self.apps_url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DiscoveryError::Timeout(self.timeout_secs)
                } else {
                    DiscoveryError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DiscoveryError::Request(e.to_string()))?;

        let apps = decode_apps(&body)?;
        tracing::debug!(url = %self.apps_url, applications = apps.len(), "Eureka registry fetched");
        Ok(apps)
    }
}

// Eureka's JSON encoder collapses single-element lists into a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(t) => vec![t],
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    applications: Applications,
}

#[derive(Debug, Deserialize)]
struct Applications {
    #[serde(default)]
    application: OneOrMany<EurekaApplication>,
}

#[derive(Debug, Deserialize)]
struct EurekaApplication {
    name: String,
    #[serde(default)]
    instance: OneOrMany<EurekaInstance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EurekaInstance {
    host_name: String,
    #[serde(default)]
    port: Option<EurekaPort>,
}

#[derive(Debug, Deserialize)]
struct EurekaPort {
    #[serde(rename = "$")]
    value: u16,
    #[serde(rename = "@enabled", default = "enabled_default")]
    enabled: String,
}

fn enabled_default() -> String {
    "true".to_string()
}

/// Decode a Eureka `/apps` JSON document.
pub fn decode_apps(body: &str) -> Result<Vec<Application>, DiscoveryError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| DiscoveryError::Decode(e.to_string()))?;

    let apps = envelope
        .applications
        .application
        .into_vec()
        .into_iter()
        .map(|app| {
            let instances = app
                .instance
                .into_vec()
                .into_iter()
                .map(|ins| {
                    let port = ins
                        .port
                        .filter(|p| p.enabled != "false")
                        .map(|p| p.value);
                    Instance::new(ins.host_name, port)
                })
                .collect();
            Application::new(app.name, instances)
        })
        .collect();

    Ok(apps)
}
