use crate::config::toml_config::EngineConfig;
use crate::utils::error::{EngineError, Result};
use crate::utils::validation::{validate_path, validate_positive_number, Validate};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "peer-engine")]
#[command(about = "Randomize student groups and peer-review assignments")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, help = "Path to TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, global = true, help = "Directory the assignment snapshot is written to")]
    pub output_path: Option<String>,

    #[arg(long, global = true, help = "Fixed seed for a reproducible result")]
    pub seed: Option<u64>,

    #[arg(long, global = true, help = "Print the result without saving it")]
    pub dry_run: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Split the roster into groups
    Groups {
        #[command(flatten)]
        roster: RosterArgs,

        #[arg(long)]
        group_size: Option<usize>,
    },
    /// Assign reviewers to every submission
    Reviews {
        #[command(flatten)]
        roster: RosterArgs,

        #[arg(long)]
        reviews_per_submission: Option<usize>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct RosterArgs {
    #[arg(long, conflicts_with = "students", help = "CSV file with id,name columns")]
    pub roster: Option<String>,

    #[arg(long, value_delimiter = ',', help = "Comma separated student ids")]
    pub students: Vec<u64>,
}

impl CliConfig {
    pub fn roster_args(&self) -> &RosterArgs {
        match &self.command {
            Command::Groups { roster, .. } | Command::Reviews { roster, .. } => roster,
        }
    }

    /// 命令列參數覆蓋 TOML 設定
    pub fn apply_to(&self, config: &mut EngineConfig) {
        if let Some(seed) = self.seed {
            config.engine.seed = Some(seed);
        }
        if let Some(path) = &self.output_path {
            config.output.path = path.clone();
        }
        match &self.command {
            Command::Groups {
                group_size: Some(size),
                ..
            } => config.engine.default_group_size = Some(*size),
            Command::Reviews {
                reviews_per_submission: Some(count),
                ..
            } => config.engine.default_reviews_per_submission = Some(*count),
            _ => {}
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        let roster = self.roster_args();
        match &roster.roster {
            Some(path) => validate_path("roster", path)?,
            None if roster.students.is_empty() => {
                return Err(EngineError::MissingConfigError {
                    field: "roster or students".to_string(),
                })
            }
            None => {}
        }

        if let Some(path) = &self.output_path {
            validate_path("output_path", path)?;
        }

        match &self.command {
            Command::Groups {
                group_size: Some(size),
                ..
            } => validate_positive_number("group_size", *size, 1)?,
            Command::Reviews {
                reviews_per_submission: Some(count),
                ..
            } => validate_positive_number("reviews_per_submission", *count, 1)?,
            _ => {}
        }

        Ok(())
    }
}
