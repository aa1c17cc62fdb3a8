//! Network Edge device model
//!
//! Typed view of a virtual network appliance as understood by the
//! provisioning API. Status fields are owned by the remote side and are only
//! ever read back.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Defines a remote-owned status enum backed by its wire string.
/// Unknown values are kept verbatim in `Other`.
macro_rules! remote_status {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $value,)+
                    Self::Other(s) => s,
                }
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $($value => Self::$variant,)+
                    other => Self::Other(other.to_string()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

remote_status!(
    /// Device lifecycle status
    DeviceStatus {
        Initializing => "INITIALIZING",
        Provisioning => "PROVISIONING",
        WaitingForSecondary => "WAITING_FOR_SECONDARY",
        Provisioned => "PROVISIONED",
        Failed => "FAILED",
        Deprovisioning => "DEPROVISIONING",
        Deprovisioned => "DEPROVISIONED",
    }
);

remote_status!(
    /// License status, independent from the lifecycle status
    LicenseStatus {
        Unset => "",
        Applying => "APPLYING",
        Applied => "APPLIED",
        Registered => "REGISTERED",
        Failed => "FAILED",
    }
);

remote_status!(
    /// Attachment status of an ACL template on a device
    AclTemplateStatus {
        Provisioning => "PROVISIONING",
        Provisioned => "PROVISIONED",
        Failed => "FAILED",
    }
);

remote_status!(
    /// Role of a device inside a redundant pair
    RedundancyType {
        Primary => "PRIMARY",
        Secondary => "SECONDARY",
    }
);

impl Default for LicenseStatus {
    fn default() -> Self {
        Self::Unset
    }
}

/// Contract term in months
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TermLength(u32);

impl TermLength {
    /// Terms offered by the platform
    pub const ALLOWED: [u32; 4] = [1, 12, 24, 36];

    pub fn new(months: u32) -> Option<Self> {
        Self::ALLOWED.contains(&months).then_some(Self(months))
    }

    pub fn months(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TermLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} months", self.0)
    }
}

/// License material of a device: a token, or a previously uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum License {
    Token(String),
    FileId(String),
}

/// Network interface reported by the remote system
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInterface {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub operational_status: String,
    pub mac_address: String,
    pub ip_address: String,
    pub assigned_type: String,
    pub kind: String,
}

/// SSH public key bound to the device at creation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPublicKey {
    pub username: String,
    pub key_name: String,
}

/// A provisioned (or to-be-provisioned) network edge device
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Device {
    /// Assigned by the remote system on creation
    pub uuid: Option<String>,
    pub name: String,
    pub type_code: String,
    pub status: Option<DeviceStatus>,
    pub license_status: LicenseStatus,
    pub metro_code: String,
    pub ibx: Option<String>,
    pub region: Option<String>,
    pub throughput: Option<u32>,
    pub throughput_unit: Option<String>,
    pub hostname: Option<String>,
    pub package_code: String,
    pub version: String,
    pub byol: bool,
    pub license: Option<License>,
    /// Local path of a license file still to be uploaded; never sent
    pub license_file: Option<PathBuf>,
    pub acl_template_id: Option<String>,
    pub ssh_ip_address: Option<String>,
    pub ssh_ip_fqdn: Option<String>,
    pub account_number: Option<String>,
    pub notifications: Vec<String>,
    pub purchase_order_number: Option<String>,
    pub redundancy_type: Option<RedundancyType>,
    pub redundant_id: Option<String>,
    pub term_length: Option<TermLength>,
    pub additional_bandwidth: Option<u32>,
    pub order_reference: Option<String>,
    pub interface_count: Option<u32>,
    pub core_count: Option<u32>,
    pub self_managed: bool,
    pub interfaces: Vec<DeviceInterface>,
    pub vendor_configuration: BTreeMap<String, String>,
    pub user_public_key: Option<UserPublicKey>,
}

impl Device {
    pub fn license_token(&self) -> Option<&str> {
        match &self.license {
            Some(License::Token(token)) => Some(token),
            _ => None,
        }
    }

    pub fn license_file_id(&self) -> Option<&str> {
        match &self.license {
            Some(License::FileId(id)) => Some(id),
            _ => None,
        }
    }

    /// Whether the remote system is tearing the device down or has done so
    pub fn is_deprovisioned(&self) -> bool {
        matches!(
            self.status,
            Some(DeviceStatus::Deprovisioning | DeviceStatus::Deprovisioned)
        )
    }
}

/// Primary device and its optional redundant secondary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevicePair {
    pub primary: Device,
    pub secondary: Option<Device>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_wire_strings() {
        assert_eq!(DeviceStatus::from("PROVISIONED"), DeviceStatus::Provisioned);
        assert_eq!(
            DeviceStatus::from("WAITING_FOR_SECONDARY").to_string(),
            "WAITING_FOR_SECONDARY"
        );
        assert_eq!(LicenseStatus::from(""), LicenseStatus::Unset);
        assert_eq!(
            AclTemplateStatus::from("DETACHING"),
            AclTemplateStatus::Other("DETACHING".to_string())
        );
    }

    #[test]
    fn term_length_accepts_offered_terms_only() {
        assert_eq!(TermLength::new(12).map(TermLength::months), Some(12));
        assert!(TermLength::new(6).is_none());
        assert!(TermLength::new(0).is_none());
    }

    #[test]
    fn license_accessors_are_exclusive() {
        let device = Device {
            license: Some(License::FileId("file-1".into())),
            ..Default::default()
        };
        assert_eq!(device.license_file_id(), Some("file-1"));
        assert_eq!(device.license_token(), None);
    }

    #[test]
    fn deprovisioning_device_counts_as_gone() {
        let device = Device {
            status: Some(DeviceStatus::Deprovisioning),
            ..Default::default()
        };
        assert!(device.is_deprovisioned());
        assert!(!Device::default().is_deprovisioned());
    }
}
