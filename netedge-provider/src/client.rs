//! Provisioning API client abstraction
//!
//! The provider drives the remote API exclusively through [`NeClient`]. The
//! REST transport behind it belongs to the vendor SDK.

use async_trait::async_trait;
use thiserror::Error;

use crate::device::{AclTemplateStatus, Device, TermLength};

/// Application error code returned when deleting a device that is already gone
pub const ERROR_CODE_DEVICE_REMOVED: &str = "IC-LD-STATUS-REMOVED";

/// Management type for devices configured by the customer
pub const DEVICE_MANAGEMENT_TYPE_SELF: &str = "SELF-CONFIGURED";

/// License mode for customer supplied licenses
pub const DEVICE_LICENSE_MODE_BYOL: &str = "BYOL";

/// One entry of the error list returned by the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationError {
    pub code: String,
    pub message: String,
}

impl ApplicationError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

fn describe(errors: &[ApplicationError]) -> String {
    errors
        .iter()
        .map(|e| format!("[{}] {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors reported by the provisioning API client
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The API answered with an error status
    #[error("HTTP {status}: {}", describe(.application_errors))]
    Rest {
        status: u16,
        application_errors: Vec<ApplicationError>,
    },

    /// The request did not complete
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn rest(status: u16, errors: Vec<ApplicationError>) -> Self {
        Self::Rest {
            status,
            application_errors: errors,
        }
    }

    /// Whether the API reported the given application error code
    pub fn has_application_error(&self, code: &str) -> bool {
        match self {
            ApiError::Rest {
                application_errors, ..
            } => application_errors.iter().any(|e| e.code == code),
            ApiError::Transport(_) => false,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Partial update of a device; only fields that are set are sent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceUpdateRequest {
    pub uuid: String,
    pub name: Option<String>,
    pub term_length: Option<TermLength>,
    pub notifications: Option<Vec<String>>,
    pub additional_bandwidth: Option<u32>,
    /// Empty string detaches the current template
    pub acl_template_id: Option<String>,
}

impl DeviceUpdateRequest {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            ..Default::default()
        }
    }

    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_term_length(mut self, term_length: TermLength) -> Self {
        self.term_length = Some(term_length);
        self
    }

    pub fn with_notifications(mut self, notifications: Vec<String>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn with_additional_bandwidth(mut self, bandwidth: u32) -> Self {
        self.additional_bandwidth = Some(bandwidth);
        self
    }

    pub fn with_acl_template(mut self, template_id: impl Into<String>) -> Self {
        self.acl_template_id = Some(template_id.into());
        self
    }

    /// Whether the request carries no field at all
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.term_length.is_none()
            && self.notifications.is_none()
            && self.additional_bandwidth.is_none()
            && self.acl_template_id.is_none()
    }
}

/// License file upload, transmitted byte for byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseUpload {
    pub metro_code: String,
    pub type_code: String,
    pub management_mode: String,
    pub license_mode: String,
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Operations of the provisioning API used by the provider
#[async_trait]
pub trait NeClient: Send + Sync {
    /// Create a single device, returning its uuid
    async fn create_device(&self, device: &Device) -> ApiResult<String>;

    /// Create a redundant pair in one request, returning `(primary, secondary)` uuids
    async fn create_redundant_device(
        &self,
        primary: &Device,
        secondary: &Device,
    ) -> ApiResult<(String, String)>;

    async fn get_device(&self, uuid: &str) -> ApiResult<Device>;

    async fn update_device(&self, request: &DeviceUpdateRequest) -> ApiResult<()>;

    async fn delete_device(&self, uuid: &str) -> ApiResult<()>;

    /// Upload a license file, returning the file handle to reference at creation
    async fn upload_license_file(&self, upload: &LicenseUpload) -> ApiResult<String>;

    /// Attachment status of an ACL template
    async fn get_acl_template_status(&self, template_id: &str) -> ApiResult<AclTemplateStatus>;
}
