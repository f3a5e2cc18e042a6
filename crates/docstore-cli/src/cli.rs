use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use docstore_types::ObjectType;

#[derive(Parser)]
#[command(
    name = "docstore",
    about = "Typed, versioned JSON documents in a blob bucket",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Storage config file (TOML)
    #[arg(short, long, global = true, default_value = "docstore.toml")]
    pub config: PathBuf,

    /// Principal recorded as `lastModifiedBy` on writes
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the configured bucket if it is missing
    Init,
    /// Store a JSON document read from a file or stdin
    Put(PutArgs),
    /// Print the current version of a document
    Get(ObjectArgs),
    /// Delete a document
    Delete(ObjectArgs),
    /// List the documents of a type with their modification times
    List(TypeArgs),
    /// Print the history of a document, newest first
    Versions(VersionsArgs),
    /// Print the last-modified marker of a type
    LastModified(TypeArgs),
    /// List the known object types
    Types,
}

#[derive(Args)]
pub struct TypeArgs {
    pub object_type: ObjectType,
}

#[derive(Args)]
pub struct ObjectArgs {
    pub object_type: ObjectType,
    pub key: String,
}

#[derive(Args)]
pub struct PutArgs {
    pub object_type: ObjectType,
    pub key: String,
    /// Read the document from this file instead of stdin
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct VersionsArgs {
    pub object_type: ObjectType,
    pub key: String,
    #[arg(short = 'n', long, default_value = "20")]
    pub max: usize,
}
