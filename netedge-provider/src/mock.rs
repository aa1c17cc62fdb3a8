//! Scripted in-memory provisioning API for tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{
    ApiError, ApiResult, ApplicationError, DeviceUpdateRequest, LicenseUpload, NeClient,
};
use crate::device::{AclTemplateStatus, Device, DeviceStatus, LicenseStatus};

/// One recorded client call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateDevice(Device),
    CreateRedundantDevice(Device, Device),
    GetDevice(String),
    UpdateDevice(DeviceUpdateRequest),
    DeleteDevice(String),
    UploadLicenseFile(LicenseUpload),
    GetAclTemplateStatus(String),
}

/// Operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    Get,
    Update,
    Delete,
    Upload,
}

/// Device in the given states, as returned by `get_device`
pub fn device_in(uuid: &str, status: DeviceStatus, license_status: LicenseStatus) -> Device {
    Device {
        uuid: Some(uuid.to_string()),
        name: format!("{}-name", uuid),
        status: Some(status),
        license_status,
        ..Default::default()
    }
}

pub fn not_found() -> ApiError {
    ApiError::rest(
        404,
        vec![ApplicationError::new("IC-LD-NOT-FOUND", "device not found")],
    )
}

#[derive(Default)]
struct Script {
    devices: HashMap<String, VecDeque<Device>>,
    acl_states: HashMap<String, VecDeque<AclTemplateStatus>>,
    created_ids: VecDeque<String>,
    upload_ids: VecDeque<String>,
    failures: HashMap<(Op, String), ApiError>,
    calls: Vec<Call>,
}

/// Replays scripted responses; the last scripted state of a device or
/// template repeats once the queue is drained
pub struct MockClient {
    script: Mutex<Script>,
}

/// Pop the next scripted value, keeping the last one in place
fn next<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

impl MockClient {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            script: Mutex::new(Script::default()),
        }
    }

    pub fn with_device_states(self, uuid: &str, states: Vec<Device>) -> Self {
        self.lock().devices.insert(uuid.to_string(), states.into());
        self
    }

    pub fn with_acl_states(self, template_id: &str, states: Vec<AclTemplateStatus>) -> Self {
        self.lock()
            .acl_states
            .insert(template_id.to_string(), states.into());
        self
    }

    /// Ids handed out by `create_device` and `create_redundant_device`, in order
    pub fn with_created_ids(self, ids: &[&str]) -> Self {
        self.lock()
            .created_ids
            .extend(ids.iter().map(|id| id.to_string()));
        self
    }

    pub fn with_upload_ids(self, ids: &[&str]) -> Self {
        self.lock()
            .upload_ids
            .extend(ids.iter().map(|id| id.to_string()));
        self
    }

    /// Fail `op` on the given device; creates and uploads use an empty key
    pub fn with_failure(self, op: Op, key: &str, error: ApiError) -> Self {
        self.lock().failures.insert((op, key.to_string()), error);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn uploads(&self) -> Vec<LicenseUpload> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::UploadLicenseFile(upload) => Some(upload.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    fn record(&self, call: Call, op: Op, key: &str) -> Result<std::sync::MutexGuard<'_, Script>, ApiError> {
        let mut script = self.lock();
        script.calls.push(call);
        if let Some(error) = script.failures.get(&(op, key.to_string())).cloned() {
            return Err(error);
        }
        Ok(script)
    }

    fn created_id(script: &mut Script) -> ApiResult<String> {
        script
            .created_ids
            .pop_front()
            .ok_or_else(|| ApiError::Transport("no device id scripted".into()))
    }
}

#[async_trait]
impl NeClient for MockClient {
    async fn create_device(&self, device: &Device) -> ApiResult<String> {
        let mut script = self.record(Call::CreateDevice(device.clone()), Op::Create, "")?;
        Self::created_id(&mut script)
    }

    async fn create_redundant_device(
        &self,
        primary: &Device,
        secondary: &Device,
    ) -> ApiResult<(String, String)> {
        let call = Call::CreateRedundantDevice(primary.clone(), secondary.clone());
        let mut script = self.record(call, Op::Create, "")?;
        let primary_id = Self::created_id(&mut script)?;
        let secondary_id = Self::created_id(&mut script)?;
        Ok((primary_id, secondary_id))
    }

    async fn get_device(&self, uuid: &str) -> ApiResult<Device> {
        let mut script = self.record(Call::GetDevice(uuid.to_string()), Op::Get, uuid)?;
        script
            .devices
            .get_mut(uuid)
            .and_then(next)
            .ok_or_else(not_found)
    }

    async fn update_device(&self, request: &DeviceUpdateRequest) -> ApiResult<()> {
        let uuid = request.uuid.clone();
        self.record(Call::UpdateDevice(request.clone()), Op::Update, &uuid)?;
        Ok(())
    }

    async fn delete_device(&self, uuid: &str) -> ApiResult<()> {
        self.record(Call::DeleteDevice(uuid.to_string()), Op::Delete, uuid)?;
        Ok(())
    }

    async fn upload_license_file(&self, upload: &LicenseUpload) -> ApiResult<String> {
        let mut script = self.record(Call::UploadLicenseFile(upload.clone()), Op::Upload, "")?;
        script
            .upload_ids
            .pop_front()
            .ok_or_else(|| ApiError::Transport("no file id scripted".into()))
    }

    async fn get_acl_template_status(&self, template_id: &str) -> ApiResult<AclTemplateStatus> {
        let call = Call::GetAclTemplateStatus(template_id.to_string());
        let mut script = self.record(call, Op::Get, template_id)?;
        script
            .acl_states
            .get_mut(template_id)
            .and_then(next)
            .ok_or_else(not_found)
    }
}
