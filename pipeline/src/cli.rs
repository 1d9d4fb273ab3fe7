//! Command-line arguments for the `pipeline` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::PipelineConfig;
use crate::types::{PipelineError, Result};

#[derive(Parser, Debug, Clone)]
#[command(name = "pipeline")]
#[command(about = "Village development approval pipeline")]
#[command(version)]
pub struct Args {
    /// Pipeline configuration file (YAML)
    #[arg(long, env = "PIPELINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the indicator catalog as JSON
    Catalog,

    /// Score a sheet of indicator answers
    Score {
        /// YAML map of indicator id to option index
        #[arg(long)]
        sheet: PathBuf,

        /// Override the configured eligibility threshold
        #[arg(long)]
        threshold: Option<u32>,
    },

    /// Replay a scripted scenario against a fresh pipeline
    Replay {
        #[arg(long)]
        script: PathBuf,
    },
}

impl Args {
    /// Load the configuration file, or defaults when none is given.
    pub fn load_config(&self) -> Result<PipelineConfig> {
        match &self.config {
            Some(path) => {
                let yaml = std::fs::read_to_string(path).map_err(|e| {
                    PipelineError::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                PipelineConfig::from_yaml(&yaml)
            }
            None => Ok(PipelineConfig::default()),
        }
    }
}
