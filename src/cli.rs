// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands, their arguments, and the global output flags.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lamina")]
#[command(about = "Blue-green build and deployment for custom-runtime cloud functions")]
#[command(version)]
pub struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file to use instead of discovering one in the current directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new lamina.yml configuration file
    Init {
        /// Executable product to deploy
        #[arg(long)]
        product: Option<String>,

        /// Function name, defaults to the product name
        #[arg(long)]
        function: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// List the executable products of the project
    Products,

    /// Build and package products without deploying
    Build {
        /// Only this product (defined in config)
        #[arg(short, long)]
        product: Option<String>,
    },

    /// Build, publish, verify, and cut over configured functions
    Deploy {
        /// Only this product (defined in config)
        #[arg(short, long)]
        product: Option<String>,

        /// Deploy an existing archive instead of building; requires --product
        #[arg(long, requires = "product")]
        archive: Option<PathBuf>,
    },

    /// Invoke a deployed function and check the response
    Invoke {
        /// Product whose function to invoke (defined in config)
        #[arg(short, long)]
        product: Option<String>,

        /// Version number or alias; defaults to the configured alias
        #[arg(long)]
        qualifier: Option<String>,

        /// Payload file; defaults to the configured verify payload
        #[arg(long)]
        payload: Option<PathBuf>,
    },
}
