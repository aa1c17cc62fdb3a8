//! Update reconciliation
//!
//! Only a handful of device fields can be changed in place. This module
//! detects changes to those fields between the last applied state and the
//! desired configuration, turns them into one partial update request per
//! device and decides which changes need to be waited on.

use std::collections::{BTreeSet, HashMap};

use log::warn;
use netedge_core::differ::{AttributeDiff, is_zero, single_block};
use netedge_core::provider::{ProviderError, ProviderResult};
use netedge_core::resource::Value;
use netedge_core::waiter::WaitError;

use crate::client::{DeviceUpdateRequest, NeClient};
use crate::config::ProviderConfig;
use crate::device::TermLength;
use crate::schema::DeviceField;
use crate::waits::{AclTemplateRefresh, acl_template_waiter};

/// Device fields that can be updated in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutableField {
    Name,
    TermLength,
    Notifications,
    AdditionalBandwidth,
    AclTemplateId,
}

impl MutableField {
    pub const fn field(self) -> DeviceField {
        match self {
            MutableField::Name => DeviceField::Name,
            MutableField::TermLength => DeviceField::TermLength,
            MutableField::Notifications => DeviceField::Notifications,
            MutableField::AdditionalBandwidth => DeviceField::AdditionalBandwidth,
            MutableField::AclTemplateId => DeviceField::AclTemplateId,
        }
    }
}

pub const SUPPORTED_CHANGES: [MutableField; 5] = [
    MutableField::Name,
    MutableField::TermLength,
    MutableField::Notifications,
    MutableField::AdditionalBandwidth,
    MutableField::AclTemplateId,
];

/// New value of one mutable field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceChange {
    Name(String),
    TermLength(TermLength),
    Notifications(Vec<String>),
    AdditionalBandwidth(u32),
    /// Empty id detaches the current template
    AclTemplateId(String),
}

impl DeviceChange {
    /// Typed change from a desired value; an absent value stands for the zero value
    fn from_value(field: MutableField, value: Option<&Value>) -> ProviderResult<Self> {
        let attr = field.field().attr();
        let mismatch = |expected: &str, found: &Value| {
            ProviderError::configuration(format!(
                "{} must be {}, got {}",
                attr,
                expected,
                found.type_name()
            ))
        };

        match field {
            MutableField::Name | MutableField::AclTemplateId => {
                let text = match value {
                    None => String::new(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => return Err(mismatch("a string", other)),
                };
                Ok(if field == MutableField::Name {
                    DeviceChange::Name(text)
                } else {
                    DeviceChange::AclTemplateId(text)
                })
            }
            MutableField::TermLength => {
                let months = match value {
                    Some(Value::Int(i)) => *i,
                    None => 0,
                    Some(other) => return Err(mismatch("a number", other)),
                };
                u32::try_from(months)
                    .ok()
                    .and_then(TermLength::new)
                    .map(DeviceChange::TermLength)
                    .ok_or_else(|| {
                        ProviderError::configuration(format!(
                            "{} must be one of {:?}, got {}",
                            attr,
                            TermLength::ALLOWED,
                            months
                        ))
                    })
            }
            MutableField::Notifications => {
                let items = match value {
                    None => return Ok(DeviceChange::Notifications(Vec::new())),
                    Some(Value::List(items)) => items,
                    Some(other) => return Err(mismatch("a list of strings", other)),
                };
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(s.clone()),
                        other => Err(mismatch("a list of strings", other)),
                    })
                    .collect::<ProviderResult<Vec<_>>>()
                    .map(DeviceChange::Notifications)
            }
            MutableField::AdditionalBandwidth => match value {
                None => Ok(DeviceChange::AdditionalBandwidth(0)),
                Some(Value::Int(i)) => u32::try_from(*i)
                    .map(DeviceChange::AdditionalBandwidth)
                    .map_err(|_| {
                        ProviderError::configuration(format!(
                            "{} must be a non-negative number, got {}",
                            attr, i
                        ))
                    }),
                Some(other) => Err(mismatch("a number", other)),
            },
        }
    }
}

/// Changes of the primary device's top-level attributes
pub fn primary_changes(
    supported: &[MutableField],
    diff: &AttributeDiff<'_>,
) -> ProviderResult<Vec<DeviceChange>> {
    supported
        .iter()
        .filter(|field| {
            let attr = field.field().attr();
            if !diff.has_change(attr) {
                return false;
            }
            let (prior, desired) = diff.get_change(attr);
            !same_value(**field, prior, desired)
        })
        .map(|field| DeviceChange::from_value(*field, diff.get(field.field().attr())))
        .collect()
}

fn set_value(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !is_zero(v))
}

/// Recipients of a notification list, or `None` when it holds non-strings
fn recipients(value: Option<&Value>) -> Option<BTreeSet<&str>> {
    match value {
        None => Some(BTreeSet::new()),
        Some(Value::List(items)) => items.iter().map(Value::as_str).collect(),
        Some(_) => None,
    }
}

/// Whether two values of `field` are equal; notifications are an unordered set
fn same_value(field: MutableField, a: Option<&Value>, b: Option<&Value>) -> bool {
    if field == MutableField::Notifications
        && let (Some(a), Some(b)) = (recipients(a), recipients(b))
    {
        return a == b;
    }
    set_value(a) == set_value(b)
}

/// Changes inside the secondary device block
///
/// Both snapshots must hold exactly one block; a malformed snapshot is
/// logged and yields no changes.
pub fn secondary_changes(
    supported: &[MutableField],
    diff: &AttributeDiff<'_>,
) -> ProviderResult<Vec<DeviceChange>> {
    let name = DeviceField::SecondaryDevice.attr();
    if !diff.has_change(name) {
        return Ok(Vec::new());
    }

    let (prior, desired) = diff.get_change(name);
    let prior = match single_block(name, prior) {
        Ok(block) => block,
        Err(e) => {
            warn!("could not read previous {} configuration: {}", name, e);
            return Ok(Vec::new());
        }
    };
    let desired: &HashMap<String, Value> = match single_block(name, desired) {
        Ok(block) => block,
        Err(e) => {
            warn!("could not read desired {} configuration: {}", name, e);
            return Ok(Vec::new());
        }
    };

    supported
        .iter()
        .filter(|field| {
            let attr = field.field().attr();
            !same_value(**field, prior.get(attr), desired.get(attr))
        })
        .map(|field| DeviceChange::from_value(*field, desired.get(field.field().attr())))
        .collect()
}

/// Send one partial update carrying the given changes
///
/// An empty change set issues no call.
pub async fn apply_changes(
    client: &dyn NeClient,
    uuid: &str,
    changes: &[DeviceChange],
) -> ProviderResult<()> {
    let request = changes
        .iter()
        .cloned()
        .fold(DeviceUpdateRequest::new(uuid), |request, change| match change {
            DeviceChange::Name(name) => request.with_device_name(name),
            DeviceChange::TermLength(term) => request.with_term_length(term),
            DeviceChange::Notifications(list) => request.with_notifications(list),
            DeviceChange::AdditionalBandwidth(bw) => request.with_additional_bandwidth(bw),
            DeviceChange::AclTemplateId(id) => request.with_acl_template(id),
        });
    if request.is_empty() {
        return Ok(());
    }

    client.update_device(&request).await.map_err(|e| {
        ProviderError::new(format!("error updating network device {}", uuid)).with_cause(e)
    })
}

/// Remote transition triggered by an applied change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChangeWait {
    AclTemplate { template_id: String },
}

impl StateChangeWait {
    pub async fn wait(&self, client: &dyn NeClient, config: &ProviderConfig) -> Result<(), WaitError> {
        match self {
            StateChangeWait::AclTemplate { template_id } => {
                acl_template_waiter(template_id, config)
                    .wait(&AclTemplateRefresh::new(client, template_id))
                    .await?;
            }
        }
        Ok(())
    }
}

/// Waits required after applying `changes`
///
/// Only attaching an ACL template is waited on; detaching is not.
pub fn state_change_waits(changes: &[DeviceChange]) -> Vec<StateChangeWait> {
    changes
        .iter()
        .filter_map(|change| match change {
            DeviceChange::AclTemplateId(id) if !id.is_empty() => Some(StateChangeWait::AclTemplate {
                template_id: id.clone(),
            }),
            _ => None,
        })
        .collect()
}
