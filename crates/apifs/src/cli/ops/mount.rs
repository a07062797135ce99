use std::path::PathBuf;

use clap::Args;
use owo_colors::OwoColorize;

use apifs::fuse::{spawn_mount, ApiFs};

use crate::cli::op::{Op, OpContext, RouterError};

#[derive(Args, Debug, Clone)]
pub struct Mount {
    /// Directory to mount on
    pub mountpoint: PathBuf,

    /// Unmount automatically when the process exits
    #[arg(long)]
    pub auto_unmount: bool,

    /// Let other users access the mount
    #[arg(long)]
    pub allow_other: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error(transparent)]
    Router(#[from] RouterError),
    #[error("{0}: not a directory")]
    NotADirectory(String),
    #[error("mount failed: {0}")]
    Mount(#[source] std::io::Error),
    #[error("waiting for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}

impl Op for Mount {
    type Error = MountError;
    type Output = String;

    fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        if !self.mountpoint.is_dir() {
            return Err(MountError::NotADirectory(
                self.mountpoint.display().to_string(),
            ));
        }

        let mut mount_config = ctx.config.mount.clone();
        mount_config.auto_unmount |= self.auto_unmount;
        mount_config.allow_other |= self.allow_other;

        let fs = ApiFs::new(ctx.router()?);
        let handle =
            spawn_mount(fs, &self.mountpoint, &mount_config).map_err(MountError::Mount)?;

        println!(
            "{} {} {}",
            "Mounted".green().bold(),
            self.mountpoint.display().bold(),
            "(Ctrl-C to unmount)".dimmed()
        );
        ctx.runtime
            .block_on(tokio::signal::ctrl_c())
            .map_err(MountError::Signal)?;
        handle.unmount();

        Ok(format!("Unmounted {}", self.mountpoint.display()))
    }
}
