//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// ResearchDesk - terminal client for the account research agent
#[derive(Parser)]
#[command(
    name = "rd",
    about = "Chat with the account research agent and browse its plans",
    version = env!("GIT_DESCRIBE"),
    after_help = after_help()
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Agent base URL, overrides the config file
    #[arg(short = 'u', long = "agent-url", global = true, value_name = "URL")]
    pub agent_url: Option<String>,

    /// Subcommand to execute; without one the TUI starts
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the agent's current state
    Status {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List generated account plans
    Plans {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print one plan's markdown
    Plan {
        /// Plan filename as listed by `rd plans`
        filename: String,
    },

    /// Send one message and print the reply
    Chat {
        /// Message text
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Ask the agent to rewrite one section of the current plan
    Edit {
        /// Section name
        section: String,

        /// Edit instructions
        #[arg(required = true, num_args = 1..)]
        instructions: Vec<String>,
    },

    /// Check the agent service health
    Health,

    /// Inspect or clear the agent's research cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },

    /// Show client logs
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,
    },
}

/// Research cache subcommands
#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Show cached companies
    Status,

    /// Drop all cached research
    Clear,
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("researchdesk")
        .join("logs")
        .join("researchdesk.log");
    debug!(?path, "get_log_path: returning path");
    path
}

fn after_help() -> String {
    format!("Logs are written to: {}", get_log_path().display())
}

/// Output format for status/plans commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse_logs_lines() {
        let cli = Cli::parse_from(["rd", "-l", "debug", "logs", "-n", "20"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Some(Command::Logs { lines: 20 })));
    }

    #[test]
    fn test_cli_parse_no_command() {
        let cli = Cli::parse_from(["rd"]);
        assert!(cli.command.is_none());
        assert!(cli.agent_url.is_none());
    }

    #[test]
    fn test_cli_parse_status_json() {
        let cli = Cli::parse_from(["rd", "status", "--format", "json"]);
        assert!(matches!(
            cli.command,
            Some(Command::Status {
                format: OutputFormat::Json
            })
        ));
    }

    #[test]
    fn test_cli_parse_chat_joins_words() {
        let cli = Cli::parse_from(["rd", "chat", "Research", "Tesla"]);
        if let Some(Command::Chat { message }) = cli.command {
            assert_eq!(message.join(" "), "Research Tesla");
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_edit() {
        let cli = Cli::parse_from(["rd", "edit", "overview", "make", "it", "shorter"]);
        if let Some(Command::Edit { section, instructions }) = cli.command {
            assert_eq!(section, "overview");
            assert_eq!(instructions.join(" "), "make it shorter");
        } else {
            panic!("Expected Edit command");
        }
    }

    #[test]
    fn test_cli_parse_cache_clear() {
        let cli = Cli::parse_from(["rd", "cache", "clear"]);
        assert!(matches!(
            cli.command,
            Some(Command::Cache {
                command: CacheCommand::Clear
            })
        ));
    }

    #[test]
    fn test_cli_chat_requires_message() {
        assert!(Cli::try_parse_from(["rd", "chat"]).is_err());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from([
            "rd",
            "plans",
            "-c",
            "/path/to/config.yml",
            "--agent-url",
            "http://agent:8000",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.yml")));
        assert_eq!(cli.agent_url.as_deref(), Some("http://agent:8000"));
    }

    #[test]
    fn test_log_path() {
        assert!(get_log_path().ends_with("researchdesk/logs/researchdesk.log"));
    }
}
