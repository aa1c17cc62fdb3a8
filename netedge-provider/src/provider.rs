//! Network Edge Provider implementation
//!
//! Lifecycle of a network device, optionally paired with a redundant
//! secondary. Every operation runs its API calls and waits strictly in
//! sequence and leaves already created devices in place when a later step
//! fails.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use netedge_core::differ::{AttributeDiff, optional_block};
use netedge_core::provider::{ProviderError, ProviderResult};
use netedge_core::resource::{Resource, ResourceId, State, Value};

use crate::changes::{
    SUPPORTED_CHANGES, apply_changes, primary_changes, secondary_changes, state_change_waits,
};
use crate::client::{DeviceUpdateRequest, ERROR_CODE_DEVICE_REMOVED, NeClient};
use crate::config::ProviderConfig;
use crate::license::upload_licenses;
use crate::schema::DeviceField;
use crate::translate::{expand_device_pair, flatten_device_pair};
use crate::waits::{
    DeviceStatusRefresh, LicenseStatusRefresh, license_waiter, provisioning_waiter,
};

/// Network Edge Provider
pub struct NetworkEdgeProvider {
    client: Arc<dyn NeClient>,
    config: ProviderConfig,
}

fn non_empty<'a>(attrs: &'a HashMap<String, Value>, field: DeviceField) -> Option<&'a str> {
    attrs
        .get(field.attr())
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

impl NetworkEdgeProvider {
    pub fn new(client: Arc<dyn NeClient>) -> Self {
        Self {
            client,
            config: ProviderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ProviderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn client(&self) -> &dyn NeClient {
        self.client.as_ref()
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Create a device (or redundant pair) and wait until it is usable
    pub async fn create_device(&self, resource: &Resource) -> ProviderResult<State> {
        self.create_pair(resource)
            .await
            .map_err(|e| e.for_resource(resource.id.clone()))
    }

    /// Read the primary device and its redundant secondary
    ///
    /// `desired` supplies the local license file paths, which the remote
    /// system does not know.
    pub async fn read_device(
        &self,
        id: &ResourceId,
        identifier: &str,
        desired: Option<&HashMap<String, Value>>,
    ) -> ProviderResult<State> {
        self.fetch(id, identifier, desired)
            .await
            .map_err(|e| e.for_resource(id.clone()))
    }

    /// Apply in-place changes to the primary and then the secondary device
    pub async fn update_device(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        self.reconcile(id, identifier, from, to)
            .await
            .map_err(|e| e.for_resource(id.clone()))
    }

    /// Release ACL templates and delete the device
    ///
    /// Deleting a device that is already removed succeeds.
    pub async fn delete_device(
        &self,
        id: &ResourceId,
        identifier: &str,
        state: &State,
    ) -> ProviderResult<()> {
        self.teardown(identifier, state)
            .await
            .map_err(|e| e.for_resource(id.clone()))
    }

    // =========================================================================
    // Lifecycle Steps
    // =========================================================================

    async fn create_pair(&self, resource: &Resource) -> ProviderResult<State> {
        let mut pair = expand_device_pair(&resource.attributes)?;
        upload_licenses(self.client(), &mut pair).await?;

        let (primary_id, secondary_id) = match &pair.secondary {
            Some(secondary) => {
                let (primary_id, secondary_id) = self
                    .client()
                    .create_redundant_device(&pair.primary, secondary)
                    .await
                    .map_err(|e| {
                        ProviderError::new("error creating redundant network devices").with_cause(e)
                    })?;
                info!(
                    "created redundant network devices {} and {}",
                    primary_id, secondary_id
                );
                (primary_id, Some(secondary_id))
            }
            None => {
                let primary_id = self
                    .client()
                    .create_device(&pair.primary)
                    .await
                    .map_err(|e| ProviderError::new("error creating network device").with_cause(e))?;
                info!("created network device {}", primary_id);
                (primary_id, None)
            }
        };
        let uuids: Vec<&str> = std::iter::once(primary_id.as_str())
            .chain(secondary_id.as_deref())
            .collect();

        for uuid in uuids.iter().copied() {
            provisioning_waiter(uuid, &self.config)
                .wait(&DeviceStatusRefresh::new(self.client(), uuid))
                .await
                .map_err(|e| {
                    ProviderError::from(e).context(format!(
                        "error waiting for network device ({}) to be created",
                        uuid
                    ))
                })?;
        }
        for uuid in uuids.iter().copied() {
            license_waiter(uuid, &self.config)
                .wait(&LicenseStatusRefresh::new(self.client(), uuid))
                .await
                .map_err(|e| {
                    ProviderError::from(e).context(format!(
                        "error waiting for network device ({}) license to be applied",
                        uuid
                    ))
                })?;
        }

        self.fetch(&resource.id, &primary_id, Some(&resource.attributes))
            .await
    }

    async fn fetch(
        &self,
        id: &ResourceId,
        identifier: &str,
        desired: Option<&HashMap<String, Value>>,
    ) -> ProviderResult<State> {
        let primary = self.client().get_device(identifier).await.map_err(|e| {
            ProviderError::new("cannot fetch primary network device").with_cause(e)
        })?;
        if primary.is_deprovisioned() {
            debug!(
                "network device {} is {}, treating as gone",
                identifier,
                primary.status.as_ref().map(|s| s.as_str()).unwrap_or_default()
            );
            return Ok(State::not_found(id.clone()));
        }

        let secondary = match primary.redundant_id.as_deref().filter(|s| !s.is_empty()) {
            Some(redundant_id) => Some(self.client().get_device(redundant_id).await.map_err(
                |e| ProviderError::new("cannot fetch secondary network device").with_cause(e),
            )?),
            None => None,
        };

        let attributes = flatten_device_pair(&primary, secondary.as_ref(), desired);
        Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
    }

    async fn reconcile(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let diff = AttributeDiff::new(&from.attributes, &to.attributes);
        debug!(
            "network device {} changed attributes: {:?}",
            identifier,
            diff.changed_attributes()
        );

        let primary = primary_changes(&SUPPORTED_CHANGES, &diff)?;
        apply_changes(self.client(), identifier, &primary).await?;

        let secondary_id = non_empty(&from.attributes, DeviceField::RedundantId);
        let secondary = match secondary_id {
            Some(secondary_id) => {
                let changes = secondary_changes(&SUPPORTED_CHANGES, &diff)?;
                apply_changes(self.client(), secondary_id, &changes).await?;
                changes
            }
            None => Vec::new(),
        };

        let waits = [(identifier, primary)]
            .into_iter()
            .chain(secondary_id.map(|uuid| (uuid, secondary)));
        for (uuid, changes) in waits {
            for wait in state_change_waits(&changes) {
                wait.wait(self.client(), &self.config).await.map_err(|e| {
                    ProviderError::from(e).context(format!(
                        "error waiting for network device {} to be updated",
                        uuid
                    ))
                })?;
            }
        }

        self.fetch(id, identifier, Some(&to.attributes)).await
    }

    /// Detach an ACL template, logging instead of failing
    async fn detach_acl_template(&self, uuid: &str, template_id: &str) {
        let request = DeviceUpdateRequest::new(uuid).with_acl_template("");
        if let Err(e) = self.client().update_device(&request).await {
            warn!(
                "could not unassign ACL template {} from device {}: {}",
                template_id, uuid, e
            );
        }
    }

    async fn teardown(&self, identifier: &str, state: &State) -> ProviderResult<()> {
        if let Some(template_id) = non_empty(&state.attributes, DeviceField::AclTemplateId) {
            self.detach_acl_template(identifier, template_id).await;
        }

        let name = DeviceField::SecondaryDevice.attr();
        match optional_block(name, state.attributes.get(name)) {
            Ok(Some(secondary)) => {
                if let (Some(uuid), Some(template_id)) = (
                    non_empty(secondary, DeviceField::Uuid),
                    non_empty(secondary, DeviceField::AclTemplateId),
                ) {
                    self.detach_acl_template(uuid, template_id).await;
                }
            }
            Ok(None) => {}
            Err(e) => warn!("could not read {} from state: {}", name, e),
        }

        match self.client().delete_device(identifier).await {
            Ok(()) => {
                info!("deleted network device {}", identifier);
                Ok(())
            }
            Err(e) if e.has_application_error(ERROR_CODE_DEVICE_REMOVED) => {
                info!("network device {} was already removed", identifier);
                Ok(())
            }
            Err(e) => Err(ProviderError::new(format!(
                "error deleting network device {}",
                identifier
            ))
            .with_cause(e)),
        }
    }
}
