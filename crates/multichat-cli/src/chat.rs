//! Interactive multi-provider chat loop

use crate::render;
use multichat_fanout::{Conversation, Dispatcher, PrimaryPolicy};
use multichat_utils::AppConfig;
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

const HELP: &str = "\
Commands:
  /history  - show the conversation kept for follow-ups
  /clear    - forget the conversation
  /help     - show this help
  /quit     - exit";

/// One line of user input
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Prompt(&'a str),
    History,
    Clear,
    Help,
    Quit,
    Unknown(&'a str),
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        Some(match line {
            "/history" => Self::History,
            "/clear" => Self::Clear,
            "/help" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            command if command.starts_with('/') => Self::Unknown(command),
            prompt => Self::Prompt(prompt),
        })
    }
}

/// Run the chat loop until `/quit` or end of input
pub async fn run(
    dispatcher: &Dispatcher,
    config: &AppConfig,
    requested: &[String],
    policy: &PrimaryPolicy,
) -> anyhow::Result<()> {
    let mut conversation = Conversation::new(config.max_history);

    let available = dispatcher.available_ids();
    println!("multichat: {} provider(s) ready", available.len());
    for (id, reason) in dispatcher.unavailable() {
        println!("  {id}: {reason}");
    }
    println!("{HELP}\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("you> ");
        stdout.flush()?;

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                continue;
            }
        }

        let Some(input) = Input::parse(&line) else {
            continue;
        };

        match input {
            Input::Quit => {
                println!("Goodbye!");
                break;
            }
            Input::Help => println!("{HELP}\n"),
            Input::Clear => {
                conversation.clear();
                println!("Conversation cleared.\n");
            }
            Input::History => print_history(&conversation),
            Input::Unknown(command) => println!("Unknown command {command}; try /help\n"),
            Input::Prompt(prompt) => {
                match dispatcher
                    .dispatch(prompt, conversation.turns(), requested)
                    .await
                {
                    Ok(results) => {
                        render::print_results(&results, config);
                        println!("{}", render::comparison_table(&results, config));

                        match conversation.record_exchange(prompt, &results, policy) {
                            Some(primary) => info!(%primary, "Reply kept for follow-ups"),
                            None => warn!("No successful reply; only the prompt was kept"),
                        }
                        println!();
                    }
                    Err(e) => render::print_dispatch_error(&e, config),
                }
            }
        }
    }

    Ok(())
}

fn print_history(conversation: &Conversation) {
    if conversation.is_empty() {
        println!("(no history)\n");
        return;
    }

    for turn in conversation.turns() {
        println!("{}: {}", turn.role.label(), turn.content);
    }
    println!(
        "({} of {} turns kept)\n",
        conversation.len(),
        conversation.max_turns()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(Input::parse("   \n"), None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Input::parse("/quit\n"), Some(Input::Quit));
        assert_eq!(Input::parse("/exit"), Some(Input::Quit));
        assert_eq!(Input::parse("/clear"), Some(Input::Clear));
        assert_eq!(Input::parse(" /history "), Some(Input::History));
        assert_eq!(Input::parse("/help"), Some(Input::Help));
        assert_eq!(Input::parse("/model x"), Some(Input::Unknown("/model x")));
    }

    #[test]
    fn test_parse_prompt_is_trimmed() {
        assert_eq!(
            Input::parse("  what is rust?\n"),
            Some(Input::Prompt("what is rust?"))
        );
    }
}
