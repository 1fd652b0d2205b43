//! Discovery source answering from configuration.

use crate::config::StaticServiceConfig;
use crate::discovery::{Application, DiscoveryError, DiscoverySource, Instance};

/// Fixed set of applications, typically from `discovery.services`.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    apps: Vec<Application>,
}

impl StaticSource {
    pub fn new(apps: Vec<Application>) -> Self {
        Self { apps }
    }

    /// Build from config. Ports outside `u16` are treated as unreachable.
    pub fn from_config(services: &[StaticServiceConfig]) -> Self {
        let apps = services
            .iter()
            .map(|svc| {
                let instances = svc
                    .instances
                    .iter()
                    .map(|ins| {
                        let port = ins.port.and_then(|p| u16::try_from(p).ok());
                        Instance::new(ins.host.clone(), port)
                    })
                    .collect();
                Application::new(svc.name.clone(), instances)
            })
            .collect();
        Self { apps }
    }
}

impl DiscoverySource for StaticSource {
    async fn query_all(&self) -> Result<Vec<Application>, DiscoveryError> {
        Ok(self.apps.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticInstanceConfig;

    #[tokio::test]
    async fn test_from_config() {
        let source = StaticSource::from_config(&[StaticServiceConfig {
            name: "billing".into(),
            instances: vec![
                StaticInstanceConfig { host: "b1".into(), port: Some(7000) },
                StaticInstanceConfig { host: "b2".into(), port: None },
                StaticInstanceConfig { host: "b3".into(), port: Some(99999) },
            ],
        }]);

        let apps = source.query_all().await.unwrap();
        assert_eq!(
            apps,
            vec![Application::new(
                "billing",
                vec![
                    Instance::new("b1", Some(7000)),
                    Instance::new("b2", None),
                    Instance::new("b3", None),
                ]
            )]
        );
    }
}
