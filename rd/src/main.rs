//! ResearchDesk - terminal client for the account research agent
//!
//! CLI entry point: launches the TUI or runs one-shot agent commands.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use researchdesk::agent::{AgentService, create_client};
use researchdesk::cli::{CacheCommand, Cli, Command, OutputFormat, get_log_path};
use researchdesk::config::Config;
use researchdesk::controller::{ConversationController, SendOutcome};
use researchdesk::session::EntryKind;
use researchdesk::tui;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("researchdesk")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    // Append so `rd logs` and concurrent runs never wipe an earlier session
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("researchdesk.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(url) = cli.agent_url {
        debug!(%url, "main: agent URL overridden on the command line");
        config.agent.base_url = url;
    }

    // Reading logs needs no agent
    if let Some(Command::Logs { lines }) = cli.command {
        return cmd_logs(lines);
    }

    let agent = create_client(&config.agent).context("Failed to create agent client")?;
    info!(base_url = %config.agent.base_url, "ResearchDesk connected to agent");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Status { format }) => cmd_status(agent, format).await,
        Some(Command::Plans { format }) => cmd_plans(agent, format).await,
        Some(Command::Plan { filename }) => cmd_plan(agent, &filename).await,
        Some(Command::Chat { message }) => cmd_chat(agent, &message.join(" ")).await,
        Some(Command::Edit { section, instructions }) => cmd_edit(agent, &section, &instructions.join(" ")).await,
        Some(Command::Health) => cmd_health(agent).await,
        Some(Command::Cache { command }) => cmd_cache(agent, command).await,
        Some(Command::Logs { .. }) => Ok(()),
        None => {
            debug!("main: no command specified, launching TUI");
            tui::run(&config, agent).await
        }
    }
}

/// Show the agent's lifecycle state
async fn cmd_status(agent: Arc<dyn AgentService>, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_status: called");
    let status = agent.status().await.context("Failed to fetch agent status")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Text => {
            println!("State:   {}", status.state.display_label().bold());
            if let Some(company) = &status.current_company {
                println!("Company: {}", company.cyan());
            }
            if let Some(message) = &status.status {
                println!("Status:  {}", message);
            }
        }
    }
    Ok(())
}

/// List generated plans
async fn cmd_plans(agent: Arc<dyn AgentService>, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_plans: called");
    let reply = agent.list_plans().await.context("Failed to fetch plans")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reply.plans)?),
        OutputFormat::Text => {
            if reply.plans.is_empty() {
                println!("No plans generated yet");
                return Ok(());
            }
            for plan in &reply.plans {
                println!("{:<24} {:<18} {}", plan.company.bold(), plan.timestamp, plan.filename.dimmed());
            }
        }
    }
    Ok(())
}

/// Print one plan's markdown
async fn cmd_plan(agent: Arc<dyn AgentService>, filename: &str) -> Result<()> {
    debug!(%filename, "cmd_plan: called");
    let reply = agent
        .plan_content(filename)
        .await
        .context(format!("Failed to fetch plan {}", filename))?;
    println!("{}", reply.content);
    Ok(())
}

/// Send one message through a conversation session and print the reply
async fn cmd_chat(agent: Arc<dyn AgentService>, message: &str) -> Result<()> {
    debug!(%message, "cmd_chat: called");
    let mut controller = ConversationController::new(agent);
    let start = controller.state().transcript().len();

    match controller.send_message(message) {
        SendOutcome::Sent => {}
        SendOutcome::Empty => return Err(eyre::eyre!("Message is empty")),
        outcome => return Err(eyre::eyre!("Message not sent: {:?}", outcome)),
    }
    controller.settle().await;

    let result = print_new_entries(&controller, start + 1);
    controller.shutdown();
    result
}

/// Request a section edit and print the agent's answer
async fn cmd_edit(agent: Arc<dyn AgentService>, section: &str, instructions: &str) -> Result<()> {
    debug!(%section, %instructions, "cmd_edit: called");
    let mut controller = ConversationController::new(agent);
    let start = controller.state().transcript().len();

    match controller.edit_plan_section(section, instructions) {
        SendOutcome::Sent => {}
        SendOutcome::Empty => return Err(eyre::eyre!("Section and instructions are required")),
        outcome => return Err(eyre::eyre!("Edit not sent: {:?}", outcome)),
    }
    controller.settle().await;

    let result = print_new_entries(&controller, start);
    controller.shutdown();
    result
}

fn print_new_entries(controller: &ConversationController, from: usize) -> Result<()> {
    for entry in controller.state().transcript().iter().skip(from) {
        match entry.kind {
            EntryKind::Agent => println!("{}", entry.content),
            EntryKind::Error => return Err(eyre::eyre!("{}", entry.content)),
            EntryKind::User => {}
        }
    }
    Ok(())
}

async fn cmd_health(agent: Arc<dyn AgentService>) -> Result<()> {
    debug!("cmd_health: called");
    let health = agent.health().await.context("Agent health check failed")?;
    let icon = if health.status == "healthy" {
        "\u{2713}".green()
    } else {
        "\u{2717}".red()
    };
    match &health.timestamp {
        Some(ts) => println!("{} {} ({})", icon, health.status, ts),
        None => println!("{} {}", icon, health.status),
    }
    Ok(())
}

async fn cmd_cache(agent: Arc<dyn AgentService>, command: CacheCommand) -> Result<()> {
    debug!(?command, "cmd_cache: called");
    match command {
        CacheCommand::Status => {
            let cache = agent.cache_status().await.context("Failed to fetch cache status")?;
            println!("Cached companies: {}", cache.cache_size);
            for company in &cache.cached_companies {
                println!("  {}", company);
            }
        }
        CacheCommand::Clear => {
            let reply = agent.clear_cache().await.context("Failed to clear cache")?;
            let message = reply.message.as_deref().unwrap_or("Cache cleared");
            if reply.success {
                println!("{} {}", "\u{2713}".green(), message);
            } else {
                println!("{} {}", "\u{2717}".red(), message);
            }
        }
    }
    Ok(())
}

/// Show the last lines of the client log
fn cmd_logs(lines: usize) -> Result<()> {
    debug!(lines, "cmd_logs: called");
    let log_path = get_log_path();

    if !log_path.exists() {
        debug!(?log_path, "cmd_logs: log file does not exist");
        println!("No log file found at: {}", log_path.display());
        return Ok(());
    }

    let file = fs::File::open(&log_path).context("Failed to open log file")?;
    let reader = BufReader::new(file);
    let all_lines: Vec<String> = reader.lines().map_while(Result::ok).collect();

    let start = all_lines.len().saturating_sub(lines);
    for line in &all_lines[start..] {
        println!("{}", line);
    }

    Ok(())
}
