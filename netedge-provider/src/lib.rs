//! Network Edge Provider
//!
//! Provisions virtual network appliances through the Network Edge API.
//!
//! ## Module Structure
//!
//! - `device` - Device model and remote status values
//! - `schema` - Attribute names of the `network_device` resource
//! - `client` - Provisioning API abstraction
//! - `translate` - Conversion between attributes and devices
//! - `license` - License file upload for BYOL devices
//! - `waits` - Status sources and waiters for lifecycle transitions
//! - `changes` - In-place update reconciliation
//! - `config` - Timeouts and poll intervals
//! - `provider` - NetworkEdgeProvider implementation

pub mod changes;
pub mod client;
pub mod config;
pub mod device;
pub mod license;
pub mod provider;
pub mod schema;
pub mod translate;
pub mod waits;

#[cfg(test)]
mod mock;

// Re-export main types
pub use client::{ApiError, NeClient};
pub use config::ProviderConfig;
pub use provider::NetworkEdgeProvider;

use netedge_core::provider::{BoxFuture, Provider, ProviderResult, ResourceType};
use netedge_core::resource::{Resource, ResourceId, State};

/// The `network_device` resource type
pub struct NetworkDeviceType;

impl ResourceType for NetworkDeviceType {
    fn name(&self) -> &'static str {
        schema::NETWORK_DEVICE
    }
}

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for NetworkEdgeProvider {
    fn name(&self) -> &'static str {
        "ne"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        vec![Box::new(NetworkDeviceType)]
    }

    fn read(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.read_device(&id, &identifier, None).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_device(&resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.update_device(&id, &identifier, &from, &to).await })
    }

    fn delete(
        &self,
        id: &ResourceId,
        identifier: &str,
        state: &State,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let state = state.clone();
        Box::pin(async move { self.delete_device(&id, &identifier, &state).await })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::device::{DeviceStatus, LicenseStatus};
    use crate::client::{ApplicationError, DeviceUpdateRequest, ERROR_CODE_DEVICE_REMOVED};
    use crate::mock::{Call, MockClient, Op, device_in};

    #[tokio::test]
    async fn provider_trait_delegates_to_device_operations() {
        let client = Arc::new(MockClient::new().with_device_states(
            "dev-1",
            vec![device_in("dev-1", DeviceStatus::Provisioned, LicenseStatus::Registered)],
        ));
        let provider: Box<dyn Provider> = Box::new(NetworkEdgeProvider::new(client));

        assert_eq!(provider.name(), "ne");
        let types = provider.resource_types();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].name(), "network_device");

        let id = ResourceId::new("network_device", "edge");
        let state = provider.read(&id, "dev-1").await.unwrap();
        assert!(state.exists);
        assert_eq!(state.identifier.as_deref(), Some("dev-1"));
    }

    #[tokio::test]
    async fn provider_trait_update_and_delete_reach_device_operations() {
        let client = Arc::new(
            MockClient::new()
                .with_device_states(
                    "dev-1",
                    vec![device_in("dev-1", DeviceStatus::Provisioned, LicenseStatus::Applied)],
                )
                .with_failure(
                    Op::Delete,
                    "dev-1",
                    ApiError::rest(
                        400,
                        vec![ApplicationError::new(ERROR_CODE_DEVICE_REMOVED, "removed")],
                    ),
                ),
        );
        let provider: Box<dyn Provider> = Box::new(NetworkEdgeProvider::new(client.clone()));
        let id = ResourceId::new("network_device", "edge");
        let from = State::existing(
            id.clone(),
            [("acl_template_id".to_string(), "acl-1".into())].into(),
        );
        let to = Resource::new("network_device", "edge");

        let state = provider.update(&id, "dev-1", &from, &to).await.unwrap();
        assert!(state.exists);
        provider.delete(&id, "dev-1", &from).await.unwrap();

        assert_eq!(
            client.calls(),
            vec![
                Call::UpdateDevice(DeviceUpdateRequest::new("dev-1").with_acl_template("")),
                Call::GetDevice("dev-1".into()),
                Call::UpdateDevice(DeviceUpdateRequest::new("dev-1").with_acl_template("")),
                Call::DeleteDevice("dev-1".into()),
            ]
        );
    }
}
