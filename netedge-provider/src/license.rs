//! License file upload for bring-your-own-license devices
//!
//! License files must be uploaded before a BYOL device can be created; the
//! returned file handles are referenced by the creation request.

use std::path::Path;

use log::debug;
use netedge_core::provider::{ProviderError, ProviderResult};
use tokio::io::AsyncReadExt;

use crate::client::{DEVICE_LICENSE_MODE_BYOL, DEVICE_MANAGEMENT_TYPE_SELF, LicenseUpload, NeClient};
use crate::device::{DevicePair, License};

/// Upload license files of a BYOL pair and record the file handles
///
/// Does nothing unless the primary is BYOL and names a license file. The
/// secondary is uploaded only when it names its own file.
pub async fn upload_licenses(client: &dyn NeClient, pair: &mut DevicePair) -> ProviderResult<()> {
    let primary = &mut pair.primary;
    let Some(path) = primary.license_file.clone().filter(|_| primary.byol) else {
        return Ok(());
    };

    let type_code = primary.type_code.clone();
    let file_id = upload_license_file(client, &path, &primary.metro_code, &type_code)
        .await
        .map_err(|e| {
            e.context(format!(
                "error uploading primary device license file {}",
                path.display()
            ))
        })?;
    primary.license = Some(License::FileId(file_id));

    let Some(secondary) = pair.secondary.as_mut() else {
        return Ok(());
    };
    let Some(path) = secondary.license_file.clone() else {
        return Ok(());
    };
    let file_id = upload_license_file(client, &path, &secondary.metro_code, &type_code)
        .await
        .map_err(|e| {
            e.context(format!(
                "error uploading secondary device license file {}",
                path.display()
            ))
        })?;
    secondary.license = Some(License::FileId(file_id));

    Ok(())
}

async fn read_license_file(path: &Path) -> ProviderResult<Vec<u8>> {
    let io_error =
        |e| ProviderError::io(format!("could not read license file {}", path.display()), e);

    // the handle is dropped, and the file closed, when this scope ends
    let mut file = tokio::fs::File::open(path).await.map_err(io_error)?;
    let mut content = Vec::new();
    file.read_to_end(&mut content).await.map_err(io_error)?;
    Ok(content)
}

/// Upload one license file, returning the remote file handle
pub async fn upload_license_file(
    client: &dyn NeClient,
    path: &Path,
    metro_code: &str,
    type_code: &str,
) -> ProviderResult<String> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ProviderError::configuration(format!(
                "license file path {} has no file name",
                path.display()
            ))
        })?;
    let content = read_license_file(path).await?;

    debug!(
        "uploading license file {} ({} bytes) for {} in {}",
        file_name,
        content.len(),
        type_code,
        metro_code
    );
    let upload = LicenseUpload {
        metro_code: metro_code.to_string(),
        type_code: type_code.to_string(),
        management_mode: DEVICE_MANAGEMENT_TYPE_SELF.to_string(),
        license_mode: DEVICE_LICENSE_MODE_BYOL.to_string(),
        file_name,
        content,
    };
    client
        .upload_license_file(&upload)
        .await
        .map_err(|e| ProviderError::new("license file upload failed").with_cause(e))
}
