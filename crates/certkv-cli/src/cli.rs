use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "certkv",
    about = "certkv: interactive shell over an in-memory certificate store",
    version,
)]
pub struct Cli {
    /// TOML file with storage settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Upper bound on lock and unlock waits, overriding the config file
    #[arg(long)]
    pub lock_timeout_secs: Option<u64>,
}

/// One line typed into the shell.
#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
pub struct Line {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a value (remaining words joined by spaces)
    Store(StoreArgs),
    /// Print the value at a key
    Load(KeyArgs),
    /// Delete a key and everything under it
    Delete(KeyArgs),
    /// Report whether a key exists
    Exists(KeyArgs),
    /// List keys under a prefix
    List(ListArgs),
    /// Show metadata for a key
    Stat(StatArgs),
    /// Wait for and take the lock on a key
    Lock(LockArgs),
    /// Take the lock on a key only if it is free
    TryLock(KeyArgs),
    /// Wait for and release the lock on a key
    Unlock(LockArgs),
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(Args)]
pub struct KeyArgs {
    pub key: String,
}

#[derive(Args)]
pub struct StoreArgs {
    pub key: String,
    #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
    pub value: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Directory to list; the root when omitted
    pub prefix: Option<String>,
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Args)]
pub struct StatArgs {
    pub key: String,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct LockArgs {
    pub key: String,
    /// Give up after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}
