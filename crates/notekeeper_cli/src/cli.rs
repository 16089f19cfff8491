use clap::{Args, Parser, Subcommand};
use notekeeper_core::Role;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Clone, Debug, Eq, Parser, PartialEq)]
#[command(version, about = "Role-aware note store")]
pub struct Cli {
    /// TOML configuration file; `NOTEKEEPER_*` variables override it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, Eq, PartialEq, Subcommand)]
pub enum Command {
    /// Answers newline-delimited JSON RPC requests from stdin.
    Serve,
    /// Manages local identities.
    #[command(subcommand)]
    User(UserCommand),
    /// Prints core health and version.
    Ping,
}

#[derive(Clone, Debug, Eq, PartialEq, Subcommand)]
pub enum UserCommand {
    Add(AddUserArgs),
    List,
    /// Removes a user and, with it, every note they own.
    Remove {
        id: Uuid,
    },
}

#[derive(Args, Clone, Debug, Eq, PartialEq)]
pub struct AddUserArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, default_value_t = Role::Member)]
    pub role: Role,
}
