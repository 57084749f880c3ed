use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate and transform the raw model export into the processed dataset
    Dataset {
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
    },
    /// Render the chart set from the processed dataset
    Charts {
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        #[arg(short, long, default_value_t = false)]
        parallel: bool,

        /// Chart names to render; overrides the configured selection
        charts: Vec<String>,
    },
}

impl Args {
    pub fn command(&self) -> &Command {
        &self.command
    }
}
