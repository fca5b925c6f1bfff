//! RAM disk provisioning via `hdiutil` and `diskutil`.
//!
//! Provisioning is idempotent: when the mount point already exists the
//! volume is assumed to be live and neither tool is invoked.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Serialize;
use tokio::process::Command;

use ramstage_core::{DeviceId, StagingPlan, ToolPaths, Volume, VolumeName};

use crate::error::{provision_failed, SessionError};

/// Make sure the volume described by `plan` is mounted.
pub async fn ensure(
    tools: &ToolPaths,
    filesystem: &str,
    plan: &StagingPlan,
) -> Result<Volume, SessionError> {
    validate_label(&plan.volume_name)?;

    if tokio::fs::try_exists(&plan.mount_point).await.unwrap_or(false) {
        tracing::info!(
            mount_point = %plan.mount_point.display(),
            "RAM disk already mounted; reusing it",
        );
        return Ok(Volume {
            name: plan.volume_name.clone(),
            mount_point: plan.mount_point.clone(),
            device: None,
        });
    }

    let device = attach_ram_device(&tools.hdiutil, plan.capacity_blocks).await?;
    erase_volume(&tools.diskutil, filesystem, &plan.volume_name, &device).await?;

    if !tokio::fs::try_exists(&plan.mount_point).await.unwrap_or(false) {
        tracing::warn!(
            mount_point = %plan.mount_point.display(),
            %device,
            "volume formatted but mount point is not visible yet",
        );
    }

    tracing::info!(
        %device,
        mount_point = %plan.mount_point.display(),
        capacity_mb = plan.capacity_mb(),
        "RAM disk provisioned",
    );
    Ok(Volume {
        name: plan.volume_name.clone(),
        mount_point: plan.mount_point.clone(),
        device: Some(device),
    })
}

/// `hdiutil attach -nomount ram://<blocks>`; the device is the first stdout line.
async fn attach_ram_device(hdiutil: &Path, blocks: u64) -> Result<DeviceId, SessionError> {
    let image = format!("ram://{blocks}");
    let stdout = run_tool(hdiutil, &["attach", "-nomount", image.as_str()]).await?;
    let device = stdout
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .ok_or_else(|| provision_failed("hdiutil printed no device identifier"))?;
    tracing::debug!(device, blocks, "RAM device attached");
    Ok(DeviceId::from(device))
}

/// `diskutil erasevolume <fs> <label> <device>`.
async fn erase_volume(
    diskutil: &Path,
    filesystem: &str,
    label: &VolumeName,
    device: &DeviceId,
) -> Result<(), SessionError> {
    run_tool(
        diskutil,
        &["erasevolume", filesystem, label.0.as_str(), device.0.as_str()],
    )
    .await
    .map(|_| ())
}

async fn run_tool(program: &Path, args: &[&str]) -> Result<String, SessionError> {
    tracing::debug!(program = %program.display(), ?args, "running");
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|err| provision_failed(format!("failed to run {}: {err}", program.display())))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(provision_failed(format!(
            "{} exited with {}: {}",
            program.display(),
            output.status,
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// The label becomes a path component under the mount root and a tool argument.
fn validate_label(name: &VolumeName) -> Result<(), SessionError> {
    let label = name.0.as_str();
    if label.is_empty() || label.contains('/') || label.starts_with('-') || label == ".." {
        return Err(provision_failed(format!("invalid volume name {label:?}")));
    }
    Ok(())
}

/// Observed state of the staging volume, for `ramstage status`.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeStatus {
    pub volume_name: VolumeName,
    pub mount_point: PathBuf,
    pub mounted: bool,
    /// `None` when the profile could not be resolved.
    pub staged_path: Option<PathBuf>,
    pub staged_present: bool,
}

pub fn probe(volume_name: &VolumeName, mount_point: &Path, staged: Option<&Path>) -> VolumeStatus {
    VolumeStatus {
        volume_name: volume_name.clone(),
        mount_point: mount_point.to_path_buf(),
        mounted: mount_point.is_dir(),
        staged_path: staged.map(Path::to_path_buf),
        staged_present: staged.is_some_and(Path::is_dir),
    }
}
