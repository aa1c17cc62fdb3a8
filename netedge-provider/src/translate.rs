//! Descriptor translation between configuration attributes and devices
//!
//! [`expand_device_pair`] turns the declarative attribute set into the
//! primary and optional secondary creation requests. [`flatten_device_pair`]
//! mirrors remote devices back into an attribute set.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use netedge_core::differ::optional_block;
use netedge_core::provider::{ProviderError, ProviderResult};
use netedge_core::resource::Value;

use crate::device::{
    Device, DeviceInterface, DevicePair, DeviceStatus, License, LicenseStatus, RedundancyType,
    TermLength, UserPublicKey,
};
use crate::schema::{DeviceField, InterfaceField, UserKeyField};

const THROUGHPUT_UNITS: [&str; 2] = ["Mbps", "Gbps"];
const NAME_LENGTH: std::ops::RangeInclusive<usize> = 3..=50;

/// Typed read access to one attribute block
struct Attrs<'a> {
    block: &'a str,
    attrs: &'a HashMap<String, Value>,
}

impl<'a> Attrs<'a> {
    fn new(block: &'a str, attrs: &'a HashMap<String, Value>) -> Self {
        Self { block, attrs }
    }

    fn mismatch(&self, field: DeviceField, expected: &str, found: &Value) -> ProviderError {
        ProviderError::configuration(format!(
            "{}.{} must be {}, got {}",
            self.block,
            field.attr(),
            expected,
            found.type_name()
        ))
    }

    fn string(&self, field: DeviceField) -> ProviderResult<Option<String>> {
        match self.attrs.get(field.attr()) {
            None => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.mismatch(field, "a string", other)),
        }
    }

    fn string_or_default(&self, field: DeviceField) -> ProviderResult<String> {
        Ok(self.string(field)?.unwrap_or_default())
    }

    fn uint(&self, field: DeviceField) -> ProviderResult<Option<u32>> {
        match self.attrs.get(field.attr()) {
            None | Some(Value::Int(0)) => Ok(None),
            Some(Value::Int(i)) => u32::try_from(*i).map(Some).map_err(|_| {
                ProviderError::configuration(format!(
                    "{}.{} must be a non-negative number, got {}",
                    self.block,
                    field.attr(),
                    i
                ))
            }),
            Some(other) => Err(self.mismatch(field, "a number", other)),
        }
    }

    fn flag(&self, field: DeviceField) -> ProviderResult<bool> {
        match self.attrs.get(field.attr()) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(self.mismatch(field, "a bool", other)),
        }
    }

    fn strings(&self, field: DeviceField) -> ProviderResult<Vec<String>> {
        match self.attrs.get(field.attr()) {
            None => Ok(Vec::new()),
            Some(Value::List(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(self.mismatch(field, "a list of strings", other)),
                })
                .collect(),
            Some(other) => Err(self.mismatch(field, "a list of strings", other)),
        }
    }

    fn string_map(&self, field: DeviceField) -> ProviderResult<BTreeMap<String, String>> {
        match self.attrs.get(field.attr()) {
            None => Ok(BTreeMap::new()),
            Some(Value::Map(map)) => map
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => Ok((k.clone(), s.clone())),
                    other => Err(self.mismatch(field, "a map of strings", other)),
                })
                .collect(),
            Some(other) => Err(self.mismatch(field, "a map of strings", other)),
        }
    }

    fn term_length(&self) -> ProviderResult<Option<TermLength>> {
        match self.uint(DeviceField::TermLength)? {
            None => Ok(None),
            Some(months) => TermLength::new(months).map(Some).ok_or_else(|| {
                ProviderError::configuration(format!(
                    "{}.{} must be one of {:?}, got {}",
                    self.block,
                    DeviceField::TermLength.attr(),
                    TermLength::ALLOWED,
                    months
                ))
            }),
        }
    }

    fn name(&self) -> ProviderResult<String> {
        let name = self.string_or_default(DeviceField::Name)?;
        if !NAME_LENGTH.contains(&name.chars().count()) {
            return Err(ProviderError::configuration(format!(
                "{}.{} must be between {} and {} characters, got {:?}",
                self.block,
                DeviceField::Name.attr(),
                NAME_LENGTH.start(),
                NAME_LENGTH.end(),
                name
            )));
        }
        Ok(name)
    }

    fn license(&self) -> ProviderResult<(Option<License>, Option<PathBuf>)> {
        let token = self.string(DeviceField::LicenseToken)?;
        let file_id = self.string(DeviceField::LicenseFileId)?;
        let file = self.string(DeviceField::LicenseFile)?.map(PathBuf::from);

        let license = match (token, file_id) {
            (Some(_), Some(_)) => return Err(self.conflict(DeviceField::LicenseFileId)),
            (Some(_), None) if file.is_some() => {
                return Err(self.conflict(DeviceField::LicenseFile));
            }
            (Some(token), None) => Some(License::Token(token)),
            (None, Some(id)) => Some(License::FileId(id)),
            (None, None) => None,
        };
        Ok((license, file))
    }

    fn conflict(&self, with: DeviceField) -> ProviderError {
        ProviderError::configuration(format!(
            "{}.{} conflicts with {}.{}",
            self.block,
            DeviceField::LicenseToken.attr(),
            self.block,
            with.attr()
        ))
    }

    fn status(&self) -> ProviderResult<Option<DeviceStatus>> {
        Ok(self
            .string(DeviceField::Status)?
            .map(|s| DeviceStatus::from(s.as_str())))
    }

    fn license_status(&self) -> ProviderResult<LicenseStatus> {
        Ok(self
            .string(DeviceField::LicenseStatus)?
            .map(|s| LicenseStatus::from(s.as_str()))
            .unwrap_or_default())
    }

    fn redundancy_type(&self) -> ProviderResult<Option<RedundancyType>> {
        Ok(self
            .string(DeviceField::RedundancyType)?
            .map(|s| RedundancyType::from(s.as_str())))
    }

    fn user_public_key(&self) -> ProviderResult<Option<UserPublicKey>> {
        let field = DeviceField::SshKey;
        let block = optional_block(field.attr(), self.attrs.get(field.attr()))
            .map_err(|e| ProviderError::configuration(format!("{}: {}", self.block, e)))?;
        let Some(block) = block else {
            return Ok(None);
        };
        let text = |key: UserKeyField| -> ProviderResult<String> {
            match block.get(key.attr()) {
                None => Ok(String::new()),
                Some(Value::String(s)) => Ok(s.clone()),
                Some(other) => Err(self.mismatch(field, "a block of strings", other)),
            }
        };
        Ok(Some(UserPublicKey {
            username: text(UserKeyField::Username)?,
            key_name: text(UserKeyField::KeyName)?,
        }))
    }

    /// Fields shared by the primary and the secondary block
    fn common(&self) -> ProviderResult<Device> {
        let (license, license_file) = self.license()?;
        Ok(Device {
            uuid: self.string(DeviceField::Uuid)?,
            name: self.name()?,
            status: self.status()?,
            license_status: self.license_status()?,
            metro_code: self.string_or_default(DeviceField::MetroCode)?,
            ibx: self.string(DeviceField::Ibx)?,
            region: self.string(DeviceField::Region)?,
            hostname: self.string(DeviceField::Hostname)?,
            license,
            license_file,
            acl_template_id: self.string(DeviceField::AclTemplateId)?,
            ssh_ip_address: self.string(DeviceField::SshIpAddress)?,
            ssh_ip_fqdn: self.string(DeviceField::SshIpFqdn)?,
            account_number: self.string(DeviceField::AccountNumber)?,
            notifications: self.strings(DeviceField::Notifications)?,
            redundancy_type: self.redundancy_type()?,
            redundant_id: self.string(DeviceField::RedundantId)?,
            additional_bandwidth: self.uint(DeviceField::AdditionalBandwidth)?,
            vendor_configuration: self.string_map(DeviceField::VendorConfiguration)?,
            user_public_key: self.user_public_key()?,
            ..Default::default()
        })
    }
}

fn expand_primary(attrs: &HashMap<String, Value>) -> ProviderResult<Device> {
    let a = Attrs::new("network_device", attrs);
    let throughput_unit = a.string(DeviceField::ThroughputUnit)?;
    if let Some(unit) = &throughput_unit
        && !THROUGHPUT_UNITS.contains(&unit.as_str())
    {
        return Err(ProviderError::configuration(format!(
            "network_device.{} must be one of {:?}, got {:?}",
            DeviceField::ThroughputUnit.attr(),
            THROUGHPUT_UNITS,
            unit
        )));
    }

    Ok(Device {
        type_code: a.string_or_default(DeviceField::TypeCode)?,
        throughput: a.uint(DeviceField::Throughput)?,
        throughput_unit,
        package_code: a.string_or_default(DeviceField::PackageCode)?,
        version: a.string_or_default(DeviceField::Version)?,
        byol: a.flag(DeviceField::Byol)?,
        purchase_order_number: a.string(DeviceField::PurchaseOrderNumber)?,
        term_length: a.term_length()?,
        order_reference: a.string(DeviceField::OrderReference)?,
        interface_count: a.uint(DeviceField::InterfaceCount)?,
        core_count: a.uint(DeviceField::CoreCount)?,
        self_managed: a.flag(DeviceField::SelfManaged)?,
        ..a.common()?
    })
}

/// Build the primary and optional secondary device from configuration
///
/// Performs no I/O. More than one `secondary_device` block is a
/// configuration error.
pub fn expand_device_pair(attrs: &HashMap<String, Value>) -> ProviderResult<DevicePair> {
    let primary = expand_primary(attrs)?;

    let field = DeviceField::SecondaryDevice;
    let secondary = optional_block(field.attr(), attrs.get(field.attr()))
        .map_err(|e| ProviderError::configuration(e.to_string()))?
        .map(|block| Attrs::new(field.attr(), block).common())
        .transpose()?;

    Ok(DevicePair { primary, secondary })
}

fn put_string(attrs: &mut HashMap<String, Value>, field: DeviceField, value: Option<&str>) {
    if let Some(v) = value {
        attrs.insert(field.attr().to_string(), Value::String(v.to_string()));
    }
}

fn put_uint(attrs: &mut HashMap<String, Value>, field: DeviceField, value: Option<u32>) {
    if let Some(v) = value {
        attrs.insert(field.attr().to_string(), Value::Int(i64::from(v)));
    }
}

fn put(attrs: &mut HashMap<String, Value>, field: DeviceField, value: Value) {
    attrs.insert(field.attr().to_string(), value);
}

fn interfaces_value(interfaces: &[DeviceInterface]) -> Value {
    Value::List(
        interfaces
            .iter()
            .map(|i| {
                let entries = [
                    (InterfaceField::Id, Value::Int(i.id)),
                    (InterfaceField::Name, Value::from(i.name.as_str())),
                    (InterfaceField::Status, Value::from(i.status.as_str())),
                    (
                        InterfaceField::OperationalStatus,
                        Value::from(i.operational_status.as_str()),
                    ),
                    (InterfaceField::MacAddress, Value::from(i.mac_address.as_str())),
                    (InterfaceField::IpAddress, Value::from(i.ip_address.as_str())),
                    (InterfaceField::AssignedType, Value::from(i.assigned_type.as_str())),
                    (InterfaceField::Type, Value::from(i.kind.as_str())),
                ];
                Value::Map(
                    entries
                        .into_iter()
                        .map(|(k, v)| (k.attr().to_string(), v))
                        .collect(),
                )
            })
            .collect(),
    )
}

fn user_key_value(key: Option<&UserPublicKey>) -> Value {
    Value::List(
        key.into_iter()
            .map(|k| {
                Value::Map(HashMap::from([
                    (
                        UserKeyField::Username.attr().to_string(),
                        Value::from(k.username.as_str()),
                    ),
                    (
                        UserKeyField::KeyName.attr().to_string(),
                        Value::from(k.key_name.as_str()),
                    ),
                ]))
            })
            .collect(),
    )
}

/// Attributes present on both the primary and the secondary block
fn flatten_common(device: &Device, attrs: &mut HashMap<String, Value>) {
    put_string(attrs, DeviceField::Uuid, device.uuid.as_deref());
    put(attrs, DeviceField::Name, Value::from(device.name.as_str()));
    put_string(
        attrs,
        DeviceField::Status,
        device.status.as_ref().map(DeviceStatus::as_str),
    );
    put(
        attrs,
        DeviceField::LicenseStatus,
        Value::from(device.license_status.as_str()),
    );
    put(attrs, DeviceField::MetroCode, Value::from(device.metro_code.as_str()));
    put_string(attrs, DeviceField::Ibx, device.ibx.as_deref());
    put_string(attrs, DeviceField::Region, device.region.as_deref());
    put_string(attrs, DeviceField::Hostname, device.hostname.as_deref());
    put_string(attrs, DeviceField::LicenseToken, device.license_token());
    put_string(attrs, DeviceField::LicenseFileId, device.license_file_id());
    put_string(attrs, DeviceField::AclTemplateId, device.acl_template_id.as_deref());
    put_string(attrs, DeviceField::SshIpAddress, device.ssh_ip_address.as_deref());
    put_string(attrs, DeviceField::SshIpFqdn, device.ssh_ip_fqdn.as_deref());
    put_string(attrs, DeviceField::AccountNumber, device.account_number.as_deref());
    put(
        attrs,
        DeviceField::Notifications,
        Value::List(
            device
                .notifications
                .iter()
                .map(|n| Value::from(n.as_str()))
                .collect(),
        ),
    );
    put_string(
        attrs,
        DeviceField::RedundancyType,
        device.redundancy_type.as_ref().map(RedundancyType::as_str),
    );
    put_string(attrs, DeviceField::RedundantId, device.redundant_id.as_deref());
    put_uint(attrs, DeviceField::AdditionalBandwidth, device.additional_bandwidth);
    put(attrs, DeviceField::Interfaces, interfaces_value(&device.interfaces));
    put(
        attrs,
        DeviceField::VendorConfiguration,
        Value::Map(
            device
                .vendor_configuration
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                .collect(),
        ),
    );
    put(
        attrs,
        DeviceField::SshKey,
        user_key_value(device.user_public_key.as_ref()),
    );
}

fn carry_license_file(
    from: Option<&HashMap<String, Value>>,
    attrs: &mut HashMap<String, Value>,
) {
    let key = DeviceField::LicenseFile.attr();
    if let Some(value) = from.and_then(|f| f.get(key)) {
        attrs.insert(key.to_string(), value.clone());
    }
}

/// Mirror remote devices into an attribute set
///
/// The local license file path is unknown to the remote system, so it is
/// carried over from `desired` for both devices.
pub fn flatten_device_pair(
    primary: &Device,
    secondary: Option<&Device>,
    desired: Option<&HashMap<String, Value>>,
) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    flatten_common(primary, &mut attrs);
    put(&mut attrs, DeviceField::TypeCode, Value::from(primary.type_code.as_str()));
    put_uint(&mut attrs, DeviceField::Throughput, primary.throughput);
    put_string(&mut attrs, DeviceField::ThroughputUnit, primary.throughput_unit.as_deref());
    put(&mut attrs, DeviceField::PackageCode, Value::from(primary.package_code.as_str()));
    put(&mut attrs, DeviceField::Version, Value::from(primary.version.as_str()));
    put(&mut attrs, DeviceField::Byol, Value::Bool(primary.byol));
    put_string(
        &mut attrs,
        DeviceField::PurchaseOrderNumber,
        primary.purchase_order_number.as_deref(),
    );
    put_uint(
        &mut attrs,
        DeviceField::TermLength,
        primary.term_length.map(TermLength::months),
    );
    put_string(&mut attrs, DeviceField::OrderReference, primary.order_reference.as_deref());
    put_uint(&mut attrs, DeviceField::InterfaceCount, primary.interface_count);
    put_uint(&mut attrs, DeviceField::CoreCount, primary.core_count);
    put(&mut attrs, DeviceField::SelfManaged, Value::Bool(primary.self_managed));
    carry_license_file(desired, &mut attrs);

    if let Some(secondary) = secondary {
        let mut block = HashMap::new();
        flatten_common(secondary, &mut block);
        let field = DeviceField::SecondaryDevice;
        let desired_block = desired
            .and_then(|d| optional_block(field.attr(), d.get(field.attr())).ok())
            .flatten();
        carry_license_file(desired_block, &mut block);
        put(&mut attrs, field, Value::List(vec![Value::Map(block)]));
    }

    attrs
}
