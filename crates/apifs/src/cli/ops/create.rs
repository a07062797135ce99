use clap::Args;
use owo_colors::OwoColorize;

use apifs::vfs::{normalize_path, ApiNode, CREATE_FILE};
use apifs::FsError;

use crate::cli::op::{Op, OpContext, RouterError};

/// Create an object by writing to `<collection>/_create`
#[derive(Args, Debug, Clone)]
pub struct Create {
    /// Collection to create the object in
    pub collection: String,

    /// Object parameters as a JSON object
    pub params: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error(transparent)]
    Router(#[from] RouterError),
    #[error("{0}")]
    Fs(#[from] FsError),
}

impl Op for Create {
    type Error = CreateError;
    type Output = String;

    fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let router = ctx.router()?;
        let path = normalize_path(&format!("{}/{}", self.collection, CREATE_FILE));
        router.write(&path, self.params.as_bytes())?;
        Ok(format!("{} via {}", "Created".green(), path.bold()))
    }
}
