use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use thiserror::Error;

use crate::cli::{self, Cli, Commands};
use crate::config::ConfigStore;
use crate::error::Result;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),
}

/// Split a command line into tokens, honoring single and double quotes so a
/// quoted substring stays one token even when it contains spaces. Splitting
/// naively on whitespace is exactly the bug this exists to fix: it shreds
/// prompts like `generate "a sunset over mountains"`.
pub fn tokenize(line: &str) -> std::result::Result<Vec<String>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None => match ch {
                '"' | '\'' => {
                    quote = Some(ch);
                    in_token = true;
                }
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
        }
    }

    if let Some(q) = quote {
        return Err(TokenizeError::UnterminatedQuote(q));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Read-eval loop: each line is tokenized and dispatched through the same
/// clap command tree as the outer CLI. Tokenization and command errors are
/// reported and the loop continues; only `exit`, `quit`, or end-of-input
/// terminate it.
pub async fn run(store: &mut ConfigStore) -> Result<()> {
    println!("{}", "Leonardo AI interactive shell".green().bold());
    println!("Type 'help' for available commands, 'exit' to quit.");
    println!("Using profile: {}", store.active_profile().cyan());

    let mut editor = DefaultEditor::new()
        .map_err(|e| crate::error::LeonardoError::Config(format!("could not start shell: {}", e)))?;

    loop {
        let line = match editor.readline("[leonardo]> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("{}", "Exiting shell.".green());
                break;
            }
            Err(e) => {
                log::error!("Readline error: {}", e);
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(trimmed);

        match trimmed {
            "exit" | "quit" => {
                println!("{}", "Exiting shell.".green());
                break;
            }
            "help" => {
                print_help();
                continue;
            }
            _ => {}
        }

        let tokens = match tokenize(trimmed) {
            Ok(tokens) => tokens,
            Err(e) => {
                eprintln!("{} {}", "Error parsing command:".red(), e);
                continue;
            }
        };
        if tokens.is_empty() {
            continue;
        }

        let argv = std::iter::once("leonardo".to_string()).chain(tokens);
        let parsed = match <Cli as clap::Parser>::try_parse_from(argv) {
            Ok(parsed) => parsed,
            Err(e) => {
                // clap renders its own usage message
                eprintln!("{}", e);
                continue;
            }
        };

        if matches!(parsed.command, Commands::Shell) {
            eprintln!("{}", "Already inside the shell.".yellow());
            continue;
        }

        if let Err(e) = cli::execute(parsed.command, store).await {
            eprintln!("{} {}", "Error:".red(), e);
        }
    }

    Ok(())
}

fn print_help() {
    println!("{}", "Available commands:".cyan().bold());
    println!("  generate PROMPT [--phoenix] [--alchemy] ...   Generate images from a prompt");
    println!("  status GENERATION_ID                          Check a generation's status");
    println!("  estimate --width W --height H --num N         Estimate generation cost");
    println!("  models [--all]                                List available models");
    println!("  user                                          Show account information");
    println!("  usage                                         Show API token usage");
    println!("  configure [--api-key KEY] [--profile NAME]    Store an API key");
    println!("  profiles                                      List configured profiles");
    println!("  use-profile NAME                              Switch the active profile");
    println!("  delete-profile NAME                           Remove a profile");
    println!("  exit                                          Leave the shell");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_prompt_is_one_token() {
        let tokens = tokenize(r#"generate "a sunset over mountains""#).unwrap();
        assert_eq!(tokens, vec!["generate", "a sunset over mountains"]);
    }

    #[test]
    fn single_quotes_work_too() {
        let tokens = tokenize("generate 'a quiet lake' --alchemy").unwrap();
        assert_eq!(tokens, vec!["generate", "a quiet lake", "--alchemy"]);
    }

    #[test]
    fn unterminated_quote_is_an_error_not_a_crash() {
        let err = tokenize(r#"generate "a sunset"#).unwrap_err();
        assert_eq!(err, TokenizeError::UnterminatedQuote('"'));
    }

    #[test]
    fn adjacent_quoted_and_bare_text_merge() {
        let tokens = tokenize(r#"generate pre"mid dle"post"#).unwrap();
        assert_eq!(tokens, vec!["generate", "premid dlepost"]);
    }

    #[test]
    fn empty_quotes_yield_an_empty_token() {
        let tokens = tokenize(r#"configure --api-key """#).unwrap();
        assert_eq!(tokens, vec!["configure", "--api-key", ""]);
    }

    #[test]
    fn whitespace_only_input_yields_nothing() {
        assert_eq!(tokenize("   ").unwrap(), Vec::<String>::new());
        assert_eq!(tokenize("").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn flags_and_values_split_normally() {
        let tokens = tokenize("estimate --width 512 --height 768 --num 2").unwrap();
        assert_eq!(
            tokens,
            vec!["estimate", "--width", "512", "--height", "768", "--num", "2"]
        );
    }
}
