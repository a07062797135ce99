use std::fmt::Display;
use std::path::PathBuf;

use anyhow::Context;
use tokio::runtime::Runtime;

use apifs::config::{Config, Environment};
use apifs::{ApiError, NamespaceRouter};

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("no access token: pass --access-token or set GC_ACCESS_TOKEN")]
    MissingToken,
    #[error("API client error: {0}")]
    Api(#[from] ApiError),
}

/// Everything a subcommand needs, built once from the global flags
pub struct OpContext {
    pub config: Config,
    access_token: Option<String>,
    pub runtime: Runtime,
}

impl OpContext {
    pub fn new(
        config_path: Option<PathBuf>,
        access_token: Option<String>,
        environment: Option<Environment>,
        base_url: Option<String>,
    ) -> anyhow::Result<Self> {
        let mut config = Config::load(config_path.as_deref()).context("loading config")?;
        if let Some(environment) = environment {
            config.api.environment = environment;
        }
        if base_url.is_some() {
            config.api.base_url = base_url;
        }
        config.validate().context("validating config")?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("apifs-http")
            .build()
            .context("starting async runtime")?;

        Ok(Self {
            config,
            access_token,
            runtime,
        })
    }

    /// Router over the configured collections
    ///
    /// Must be called, and the router used, outside of `self.runtime`.
    pub fn router(&self) -> Result<NamespaceRouter, RouterError> {
        let token = self
            .access_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or(RouterError::MissingToken)?;
        Ok(apifs::build_router(
            &self.config,
            token,
            self.runtime.handle().clone(),
        )?)
    }
}

pub trait Op {
    type Error: std::error::Error + Send + Sync + 'static;
    type Output: Display;

    fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

/// Build a `Command` subcommand enum from `(Variant, OpType)` pairs, along
/// with the `OpOutput` / `OpError` enums that collect each op's results.
#[macro_export]
macro_rules! command_enum {
    ($($(#[$meta:meta])* ($variant:ident, $ty:ty)),* $(,)?) => {
        #[derive(clap::Subcommand, Debug, Clone)]
        pub enum Command {
            $($(#[$meta])* $variant($ty),)*
        }

        pub enum OpOutput {
            $($(#[$meta])* $variant(<$ty as $crate::cli::op::Op>::Output),)*
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($(#[$meta])* OpOutput::$variant(output) => write!(f, "{output}"),)*
                }
            }
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $($(#[$meta])* #[error(transparent)] $variant(<$ty as $crate::cli::op::Op>::Error),)*
        }

        impl $crate::cli::op::Op for Command {
            type Error = OpError;
            type Output = OpOutput;

            fn execute(
                &self,
                ctx: &$crate::cli::op::OpContext,
            ) -> Result<Self::Output, Self::Error> {
                match self {
                    $($(#[$meta])* Command::$variant(op) => op
                        .execute(ctx)
                        .map(OpOutput::$variant)
                        .map_err(OpError::$variant),)*
                }
            }
        }
    };
}
