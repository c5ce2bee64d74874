//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a load scenario against the platform
    Run {
        /// Scenario name (see `stampede scenarios` for the list)
        #[arg(long, value_name = "NAME")]
        scenario: String,
    },

    /// List the available scenario names
    Scenarios,

    /// Provision platform data needed by the scenarios
    Provision {
        #[command(subcommand)]
        provision_cmd: ProvisionCommands,
    },

    /// Generate seed data files locally
    Seed {
        #[command(subcommand)]
        seed_cmd: SeedCommands,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ProvisionCommands {
    /// Join missing seed users into their community group and approve them
    Members {
        /// Community number to fill (1-based)
        #[arg(long, value_name = "N", default_value = "1")]
        community_index: u32,

        /// Expected member count (defaults to the configured seed user count)
        #[arg(long, value_name = "N")]
        count: Option<u32>,
    },

    /// Publish seed posts into one or more communities
    Content {
        /// First community number to fill (1-based)
        #[arg(long, value_name = "N", default_value = "1")]
        community_index: u32,

        /// How many consecutive communities to fill
        #[arg(long, value_name = "N", default_value = "1")]
        count: u32,
    },

    /// Pair generated quizzes with published posts and write quiz CSV tables
    Quizzes {
        /// Group id whose timeline provides the posts
        #[arg(long, value_name = "ID")]
        group_id: String,

        /// Number of quizzes to generate
        #[arg(long, value_name = "N", default_value = "20")]
        count: usize,

        /// Directory for the quiz CSV tables
        #[arg(long, value_name = "PATH", default_value = "seed-data")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum SeedCommands {
    /// Write the seed user roster as a CSV file
    Export {
        /// Output file path
        #[arg(long, value_name = "PATH", default_value = "seed-data/users.csv")]
        out: PathBuf,

        /// Number of users to export (defaults to the configured seed user count)
        #[arg(long, value_name = "N")]
        count: Option<u32>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_scenario() {
        let cli = Cli::try_parse_from(["stampede", "run", "--scenario", "newsfeed"])
            .expect("run should parse");
        match cli.command {
            Some(Commands::Run { scenario }) => assert_eq!(scenario, "newsfeed"),
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_parse_provision_members_defaults() {
        let cli = Cli::try_parse_from(["stampede", "provision", "members"])
            .expect("provision members should parse");
        match cli.command {
            Some(Commands::Provision {
                provision_cmd: ProvisionCommands::Members {
                    community_index,
                    count,
                },
            }) => {
                assert_eq!(community_index, 1);
                assert!(count.is_none());
            }
            _ => panic!("expected provision members command"),
        }
    }

    #[test]
    fn test_parse_global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["stampede", "scenarios", "--config", "stampede.yaml"])
            .expect("global flag should parse anywhere");
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("stampede.yaml")));
    }

    #[test]
    fn test_parse_quizzes_requires_group_id() {
        let result = Cli::try_parse_from(["stampede", "provision", "quizzes"]);
        assert!(result.is_err());
    }
}
