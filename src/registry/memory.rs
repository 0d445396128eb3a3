//! Process-local registrar.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::RegistryError;
use crate::registry::{Registrar, ServiceInstance};

/// Registrar keeping instances in memory, keyed by instance id.
///
/// Deregistering an unknown instance succeeds, so concurrent `stop` calls
/// are harmless.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    instances: DashMap<String, ServiceInstance>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an instance by id.
    pub fn get(&self, id: &str) -> Option<ServiceInstance> {
        self.instances.get(id).map(|entry| entry.value().clone())
    }

    /// All instances registered under a service name, ordered by id.
    pub fn list(&self, name: &str) -> Vec<ServiceInstance> {
        let mut found: Vec<ServiceInstance> = self
            .instances
            .iter()
            .filter(|entry| entry.value().name == name)
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[async_trait]
impl Registrar for InMemoryRegistry {
    async fn register(&self, instance: &ServiceInstance) -> Result<(), RegistryError> {
        if instance.id.is_empty() {
            return Err(RegistryError::Rejected("instance id is empty".to_string()));
        }
        tracing::debug!(id = %instance.id, name = %instance.name, "Instance registered");
        self.instances.insert(instance.id.clone(), instance.clone());
        Ok(())
    }

    async fn deregister(&self, instance: &ServiceInstance) -> Result<(), RegistryError> {
        if self.instances.remove(&instance.id).is_some() {
            tracing::debug!(id = %instance.id, name = %instance.name, "Instance deregistered");
        }
        Ok(())
    }
}
