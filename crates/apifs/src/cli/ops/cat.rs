use std::fmt;

use clap::Args;

use apifs::vfs::{normalize_path, ApiNode};
use apifs::FsError;

use crate::cli::op::{Op, OpContext, RouterError};

#[derive(Args, Debug, Clone)]
pub struct Cat {
    /// Object path, e.g. /customers/CU123
    pub path: String,

    /// Print the stored compact JSON instead of pretty-printing it
    #[arg(long)]
    pub raw: bool,
}

#[derive(Debug)]
pub struct CatOutput {
    pub content: String,
}

impl fmt::Display for CatOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatError {
    #[error(transparent)]
    Router(#[from] RouterError),
    #[error("{0}: is a directory")]
    IsADirectory(String),
    #[error("{0}")]
    Fs(#[from] FsError),
}

impl Op for Cat {
    type Error = CatError;
    type Output = CatOutput;

    fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let router = ctx.router()?;
        let path = normalize_path(&self.path);
        if router.is_directory(&path)? {
            return Err(CatError::IsADirectory(path));
        }

        let bytes = router.read(&path)?;
        let content = match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(value) if !self.raw => {
                serde_json::to_string_pretty(&value).map_err(FsError::Parse)?
            }
            _ => String::from_utf8_lossy(&bytes).into_owned(),
        };

        Ok(CatOutput { content })
    }
}
