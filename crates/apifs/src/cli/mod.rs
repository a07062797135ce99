pub mod op;
pub mod ops;

use std::path::PathBuf;

use clap::Parser;

use apifs::config::Environment;

crate::command_enum! {
    #[cfg(feature = "fuse")]
    (Mount, ops::Mount),
    (Ls, ops::Ls),
    (Cat, ops::Cat),
    (Create, ops::Create),
}

#[derive(Parser, Debug)]
#[command(name = "apifs", version, about = "Browse a remote resource API as a filesystem")]
pub struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, env = "APIFS_CONFIG")]
    pub config: Option<PathBuf>,

    /// API access token
    #[arg(long, global = true, env = "GC_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// API environment, overriding the config file
    #[arg(long, global = true, env = "GC_ENVIRONMENT")]
    pub environment: Option<Environment>,

    /// API base URL, overriding the environment's
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}
