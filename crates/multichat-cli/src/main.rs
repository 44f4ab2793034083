//! Command-line interface for multichat
//!
//! # Usage
//!
//! ```bash
//! # Keys are read from the environment or a .env file
//! export OPENAI_API_KEY=... GROQ_API_KEY=... GOOGLE_API_KEY=...
//!
//! multichat ask "Explain ownership in one sentence"
//! multichat ask --providers openai,gemini --json "Hello"
//! multichat chat --primary llama
//! ```

mod chat;
mod render;

use anyhow::Context;
use clap::{Parser, Subcommand};
use multichat_fanout::{DispatchError, Dispatcher, PrimaryPolicy};
use multichat_utils::AppConfig;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "multichat")]
#[command(about = "Compare chat providers side by side", long_about = None)]
struct Cli {
    /// JSON configuration file (defaults to the built-in providers)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one prompt to every selected provider
    Ask {
        /// The prompt
        prompt: String,

        /// Providers to query (comma separated); all configured when omitted
        #[arg(short, long, value_delimiter = ',')]
        providers: Vec<String>,

        /// Print the result map as JSON
        #[arg(long)]
        json: bool,

        /// Overall deadline in seconds
        #[arg(long)]
        deadline: Option<u64>,
    },

    /// Interactive conversation with every selected provider
    Chat {
        /// Providers to query (comma separated); all configured when omitted
        #[arg(short, long, value_delimiter = ',')]
        providers: Vec<String>,

        /// Provider priority for the reply kept in history (comma separated)
        #[arg(long, value_delimiter = ',')]
        primary: Vec<String>,

        /// Overall deadline in seconds
        #[arg(long)]
        deadline: Option<u64>,
    },

    /// List configured providers and whether they can be used
    Providers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.log_json {
        multichat_utils::init_tracing_json();
    } else {
        multichat_utils::init_tracing();
    }

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    info!(providers = config.providers.len(), "Configuration loaded");

    match cli.command {
        Command::Ask {
            prompt,
            providers,
            json,
            deadline,
        } => {
            apply_deadline(&mut config, deadline);
            let dispatcher = Dispatcher::from_config(&config);

            match dispatcher.dispatch(&prompt, &[], providers.as_slice()).await {
                Ok(results) if json => {
                    println!("{}", serde_json::to_string_pretty(&results)?);
                }
                Ok(results) => {
                    render::print_results(&results, &config);
                    println!("{}", render::comparison_table(&results, &config));
                }
                Err(e) => {
                    render::print_dispatch_error(&e, &config);
                    let code = match e {
                        DispatchError::TotalUnavailable { .. } => 2,
                        DispatchError::EmptyPrompt => 1,
                    };
                    std::process::exit(code);
                }
            }
        }

        Command::Chat {
            providers,
            primary,
            deadline,
        } => {
            apply_deadline(&mut config, deadline);
            let dispatcher = Dispatcher::from_config(&config);

            let priority = if primary.is_empty() {
                config.priority.clone()
            } else {
                primary
            };
            let policy = PrimaryPolicy::FirstSuccessIn(priority);

            chat::run(&dispatcher, &config, &providers, &policy).await?;
        }

        Command::Providers => {
            let dispatcher = Dispatcher::from_config(&config);
            println!("{}", render::provider_table(&dispatcher, &config));
        }
    }

    Ok(())
}

fn apply_deadline(config: &mut AppConfig, deadline: Option<u64>) {
    if let Some(secs) = deadline.filter(|secs| *secs > 0) {
        config.deadline_secs = Some(secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from([
            "multichat",
            "ask",
            "--providers",
            "openai,gemini",
            "--deadline",
            "10",
            "hello there",
        ]);

        match cli.command {
            Command::Ask {
                prompt,
                providers,
                json,
                deadline,
            } => {
                assert_eq!(prompt, "hello there");
                assert_eq!(providers, vec!["openai", "gemini"]);
                assert!(!json);
                assert_eq!(deadline, Some(10));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_apply_deadline_ignores_zero() {
        let mut config = AppConfig::default();
        apply_deadline(&mut config, Some(0));
        assert!(config.deadline_secs.is_none());

        apply_deadline(&mut config, Some(15));
        assert_eq!(config.deadline_secs, Some(15));
    }
}
