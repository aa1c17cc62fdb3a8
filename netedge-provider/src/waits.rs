//! Status sources and waiters for device lifecycle transitions

use async_trait::async_trait;
use netedge_core::provider::{ProviderError, ProviderResult};
use netedge_core::waiter::{Refresh, StateWaiter};

use crate::client::NeClient;
use crate::config::ProviderConfig;
use crate::device::{AclTemplateStatus, DeviceStatus, LicenseStatus};

/// Provisioning status of one device
pub struct DeviceStatusRefresh<'a> {
    client: &'a dyn NeClient,
    uuid: &'a str,
}

impl<'a> DeviceStatusRefresh<'a> {
    pub fn new(client: &'a dyn NeClient, uuid: &'a str) -> Self {
        Self { client, uuid }
    }
}

#[async_trait]
impl Refresh for DeviceStatusRefresh<'_> {
    type Status = DeviceStatus;

    async fn refresh(&self) -> ProviderResult<DeviceStatus> {
        let device = self.client.get_device(self.uuid).await.map_err(|e| {
            ProviderError::new(format!("error fetching network device {}", self.uuid)).with_cause(e)
        })?;
        // a device without status is reported as the empty state
        Ok(device
            .status
            .unwrap_or_else(|| DeviceStatus::Other(String::new())))
    }
}

/// License status of one device
pub struct LicenseStatusRefresh<'a> {
    client: &'a dyn NeClient,
    uuid: &'a str,
}

impl<'a> LicenseStatusRefresh<'a> {
    pub fn new(client: &'a dyn NeClient, uuid: &'a str) -> Self {
        Self { client, uuid }
    }
}

#[async_trait]
impl Refresh for LicenseStatusRefresh<'_> {
    type Status = LicenseStatus;

    async fn refresh(&self) -> ProviderResult<LicenseStatus> {
        let device = self.client.get_device(self.uuid).await.map_err(|e| {
            ProviderError::new(format!("error fetching network device {}", self.uuid)).with_cause(e)
        })?;
        Ok(device.license_status)
    }
}

/// Attachment status of one ACL template
pub struct AclTemplateRefresh<'a> {
    client: &'a dyn NeClient,
    template_id: &'a str,
}

impl<'a> AclTemplateRefresh<'a> {
    pub fn new(client: &'a dyn NeClient, template_id: &'a str) -> Self {
        Self {
            client,
            template_id,
        }
    }
}

#[async_trait]
impl Refresh for AclTemplateRefresh<'_> {
    type Status = AclTemplateStatus;

    async fn refresh(&self) -> ProviderResult<AclTemplateStatus> {
        self.client
            .get_acl_template_status(self.template_id)
            .await
            .map_err(|e| {
                ProviderError::new(format!("error fetching ACL template {}", self.template_id))
                    .with_cause(e)
            })
    }
}

pub fn provisioning_waiter(uuid: &str, config: &ProviderConfig) -> StateWaiter<DeviceStatus> {
    StateWaiter::new(
        uuid,
        vec![
            DeviceStatus::Initializing,
            DeviceStatus::Provisioning,
            DeviceStatus::WaitingForSecondary,
        ],
        vec![DeviceStatus::Provisioned],
    )
    .with_poll_interval(config.poll_interval)
    .with_timeout(config.create_timeout)
}

pub fn license_waiter(uuid: &str, config: &ProviderConfig) -> StateWaiter<LicenseStatus> {
    StateWaiter::new(
        uuid,
        vec![LicenseStatus::Applying, LicenseStatus::Unset],
        vec![LicenseStatus::Registered, LicenseStatus::Applied],
    )
    .with_poll_interval(config.poll_interval)
    .with_timeout(config.create_timeout)
}

pub fn acl_template_waiter(
    template_id: &str,
    config: &ProviderConfig,
) -> StateWaiter<AclTemplateStatus> {
    StateWaiter::new(
        template_id,
        vec![AclTemplateStatus::Provisioning],
        vec![AclTemplateStatus::Provisioned],
    )
    .with_poll_interval(config.acl_poll_interval)
    .with_timeout(config.update_timeout)
}
