//! Attribute names of the `network_device` resource
//!
//! Each device field maps to exactly one configuration attribute name,
//! resolved at compile time.

/// Resource type name handled by this provider
pub const NETWORK_DEVICE: &str = "network_device";

/// Top-level (and secondary block) attributes of a network device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceField {
    Uuid,
    Name,
    TypeCode,
    Status,
    LicenseStatus,
    MetroCode,
    Ibx,
    Region,
    Throughput,
    ThroughputUnit,
    Hostname,
    PackageCode,
    Version,
    Byol,
    LicenseToken,
    LicenseFile,
    LicenseFileId,
    AclTemplateId,
    SshIpAddress,
    SshIpFqdn,
    AccountNumber,
    Notifications,
    PurchaseOrderNumber,
    RedundancyType,
    RedundantId,
    TermLength,
    AdditionalBandwidth,
    OrderReference,
    InterfaceCount,
    CoreCount,
    SelfManaged,
    Interfaces,
    VendorConfiguration,
    SshKey,
    SecondaryDevice,
}

impl DeviceField {
    pub const fn attr(self) -> &'static str {
        match self {
            DeviceField::Uuid => "uuid",
            DeviceField::Name => "name",
            DeviceField::TypeCode => "type_code",
            DeviceField::Status => "status",
            DeviceField::LicenseStatus => "license_status",
            DeviceField::MetroCode => "metro_code",
            DeviceField::Ibx => "ibx",
            DeviceField::Region => "region",
            DeviceField::Throughput => "throughput",
            DeviceField::ThroughputUnit => "throughput_unit",
            DeviceField::Hostname => "hostname",
            DeviceField::PackageCode => "package_code",
            DeviceField::Version => "version",
            DeviceField::Byol => "byol",
            DeviceField::LicenseToken => "license_token",
            DeviceField::LicenseFile => "license_file",
            DeviceField::LicenseFileId => "license_file_id",
            DeviceField::AclTemplateId => "acl_template_id",
            DeviceField::SshIpAddress => "ssh_ip_address",
            DeviceField::SshIpFqdn => "ssh_ip_fqdn",
            DeviceField::AccountNumber => "account_number",
            DeviceField::Notifications => "notifications",
            DeviceField::PurchaseOrderNumber => "purchase_order_number",
            DeviceField::RedundancyType => "redundancy_type",
            DeviceField::RedundantId => "redundant_id",
            DeviceField::TermLength => "term_length",
            DeviceField::AdditionalBandwidth => "additional_bandwidth",
            DeviceField::OrderReference => "order_reference",
            DeviceField::InterfaceCount => "interface_count",
            DeviceField::CoreCount => "core_count",
            DeviceField::SelfManaged => "self_managed",
            DeviceField::Interfaces => "interface",
            DeviceField::VendorConfiguration => "vendor_configuration",
            DeviceField::SshKey => "ssh_key",
            DeviceField::SecondaryDevice => "secondary_device",
        }
    }
}

/// Attributes of one entry in the `interface` list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceField {
    Id,
    Name,
    Status,
    OperationalStatus,
    MacAddress,
    IpAddress,
    AssignedType,
    Type,
}

impl InterfaceField {
    pub const fn attr(self) -> &'static str {
        match self {
            InterfaceField::Id => "id",
            InterfaceField::Name => "name",
            InterfaceField::Status => "status",
            InterfaceField::OperationalStatus => "operational_status",
            InterfaceField::MacAddress => "mac_address",
            InterfaceField::IpAddress => "ip_address",
            InterfaceField::AssignedType => "assigned_type",
            InterfaceField::Type => "type",
        }
    }
}

/// Attributes of the `ssh_key` block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKeyField {
    Username,
    KeyName,
}

impl UserKeyField {
    pub const fn attr(self) -> &'static str {
        match self {
            UserKeyField::Username => "username",
            UserKeyField::KeyName => "key_name",
        }
    }
}
