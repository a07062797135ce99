use std::fmt;

use clap::Args;
use comfy_table::Table;

use apifs::vfs::{normalize_path, ApiNode};
use apifs::FsError;

use crate::cli::op::{Op, OpContext, RouterError};

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Directory to list (defaults to the root)
    #[arg(default_value = "/")]
    pub path: String,
}

#[derive(Debug)]
pub struct LsEntry {
    pub name: String,
    pub is_dir: bool,
    pub writable: bool,
}

#[derive(Debug)]
pub struct LsOutput {
    pub path: String,
    pub entries: Vec<LsEntry>,
}

impl fmt::Display for LsOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "{} is empty", self.path);
        }

        let mut table = Table::new();
        table.set_header(vec!["TYPE", "NAME", "MODE"]);
        for entry in &self.entries {
            let (kind, mode) = match (entry.is_dir, entry.writable) {
                (true, _) => ("dir", "r-x"),
                (false, true) => ("file", "rw-"),
                (false, false) => ("file", "r--"),
            };
            table.add_row(vec![kind, entry.name.as_str(), mode]);
        }
        write!(f, "{table}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error(transparent)]
    Router(#[from] RouterError),
    #[error("{0}: not a directory")]
    NotADirectory(String),
    #[error("{0}")]
    Fs(#[from] FsError),
}

impl Op for Ls {
    type Error = LsError;
    type Output = LsOutput;

    fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let router = ctx.router()?;
        let path = normalize_path(&self.path);
        if !router.is_directory(&path)? {
            return Err(LsError::NotADirectory(path));
        }

        let entries = router
            .entries(&path)?
            .into_iter()
            .map(|name| {
                let child = if path == "/" {
                    format!("/{name}")
                } else {
                    format!("{path}/{name}")
                };
                Ok(LsEntry {
                    is_dir: router.is_directory(&child)?,
                    writable: router.can_write(&child)?,
                    name,
                })
            })
            .collect::<Result<Vec<_>, FsError>>()?;

        Ok(LsOutput { path, entries })
    }
}
