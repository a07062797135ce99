//! FUSE mounting of the API tree
//!
//! # Architecture
//!
//! - `ApiFs`: `fuser::Filesystem` implementation driving a `NamespaceRouter`
//! - `InodeTable`: inode ↔ path mapping
//! - `MountHandle`: keeps a background mount alive until unmounted

mod api_fs;
mod inode_table;

use std::path::Path;

use fuser::{BackgroundSession, MountOption};

pub use api_fs::{errno, ApiFs};
pub use inode_table::InodeTable;

use crate::config::MountConfig;

/// Kernel mount options for `config`
pub fn mount_options(config: &MountConfig) -> Vec<MountOption> {
    let mut options = vec![
        MountOption::FSName(config.fs_name.clone()),
        MountOption::Subtype("apifs".to_string()),
        MountOption::NoDev,
        MountOption::NoSuid,
        MountOption::NoExec,
    ];
    if config.allow_other {
        options.push(MountOption::AllowOther);
    }
    if config.auto_unmount {
        options.push(MountOption::AutoUnmount);
    }
    options
}

/// Mount `fs` at `mountpoint` on a background thread
pub fn spawn_mount(
    fs: ApiFs,
    mountpoint: &Path,
    config: &MountConfig,
) -> std::io::Result<MountHandle> {
    let session = fuser::spawn_mount2(fs, mountpoint, &mount_options(config))?;
    tracing::info!("mounted on {}", mountpoint.display());
    Ok(MountHandle { session })
}

/// Handle that must be kept as long as the filesystem must
/// remain mounted.
pub struct MountHandle {
    session: BackgroundSession,
}

impl MountHandle {
    /// Unmount the filesystem and wait for the session thread to stop
    pub fn unmount(self) {
        let Self { session } = self;
        session.join();
        tracing::info!("unmounted");
    }
}
