use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "restmcp")]
#[command(author, version, about = "Expose REST endpoints as MCP tools", long_about = None)]
pub struct Cli {
    /// Settings file (defaults to config/$CONFIG_ENV, then environment)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve newline-delimited JSON-RPC over stdin/stdout
    Serve,

    /// List the registered tools
    Tools {
        /// Print full input schemas as JSON
        #[arg(long)]
        schema: bool,

        /// Include parameter details for every tool
        #[arg(short, long)]
        verbose: bool,
    },

    /// Invoke a single tool and print the response envelope
    Call {
        name: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,

        /// Request id to use
        #[arg(long, default_value = "1")]
        id: String,
    },
}
