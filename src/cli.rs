//! Command-line interface parsing for the word of the day CLI
//!
//! This module handles parsing of CLI arguments using clap, applying flag
//! overrides on top of the loaded configuration, and rendering results.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgAction, Parser, Subcommand};
use thiserror::Error;

use crate::config::Config;
use crate::data::{WordOfTheDay, WordProvider};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified provider name is not recognized
    #[error("Invalid provider: '{0}'. Valid providers: random-word-api, vercel")]
    InvalidProvider(String),

    /// A line typed in the REPL is not a known command
    #[error("Unknown command: '{0}'. Commands: get, refresh, clear, help, quit")]
    UnknownCommand(String),
}

/// Word of the day - a random word with its dictionary definitions
#[derive(Parser, Debug)]
#[command(name = "wotd")]
#[command(about = "Fetch the word of the day and its definitions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to a TOML config file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Random word provider to use
    ///
    /// Valid providers: random-word-api, vercel
    #[arg(long, global = true, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Base URL of the random word API
    #[arg(long, global = true, value_name = "URL")]
    pub random_word_url: Option<String>,

    /// Base URL of the dictionary API
    #[arg(long, global = true, value_name = "URL")]
    pub dictionary_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// What to do once the service is built
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Print the word of the day (default)
    Get,
    /// Discard any cached word and fetch a new one
    Refresh,
    /// Read commands from stdin against one long-lived service
    Repl,
}

impl Cli {
    /// The subcommand to run, `get` when none was given
    pub fn selected_command(&self) -> Command {
        self.command.unwrap_or(Command::Get)
    }

    /// Applies flag overrides on top of file and environment configuration
    pub fn apply_overrides(&self, config: &mut Config) -> Result<(), CliError> {
        if let Some(provider) = &self.provider {
            config.word_provider = parse_provider_arg(provider)?;
        }
        if let Some(url) = &self.random_word_url {
            config.random_word_url = Some(url.clone());
        }
        if let Some(url) = &self.dictionary_url {
            config.dictionary_url = url.clone();
        }
        Ok(())
    }
}

/// Parses a provider string argument into a WordProvider.
///
/// # Arguments
/// * `s` - The provider string from CLI
///
/// # Returns
/// * `Ok(WordProvider)` if the string matches a known provider
/// * `Err(CliError::InvalidProvider)` if the string doesn't match
pub fn parse_provider_arg(s: &str) -> Result<WordProvider, CliError> {
    WordProvider::from_str(s).map_err(|_| CliError::InvalidProvider(s.to_string()))
}

/// Log filter directive for a `-v` count, used when `RUST_LOG` is unset
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "warn,wotd=info",
        2 => "warn,wotd=debug",
        _ => "trace",
    }
}

/// A command typed at the REPL prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Get,
    Refresh,
    Clear,
    Help,
    Quit,
}

/// Parses one REPL input line
///
/// Returns `Ok(None)` for blank lines.
pub fn parse_repl_line(line: &str) -> Result<Option<ReplCommand>, CliError> {
    let command = match line.trim().to_lowercase().as_str() {
        "" => return Ok(None),
        "get" | "g" => ReplCommand::Get,
        "refresh" | "r" => ReplCommand::Refresh,
        "clear" | "c" => ReplCommand::Clear,
        "help" | "h" | "?" => ReplCommand::Help,
        "quit" | "q" | "exit" => ReplCommand::Quit,
        other => return Err(CliError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

/// Renders a result for the terminal
pub fn render_text(result: &WordOfTheDay) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", result.word);

    if result.definitions.is_empty() {
        let _ = writeln!(out, "  No definitions found.");
    }
    for (i, definition) in result.definitions.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. ({}) {}",
            i + 1,
            definition.part_of_speech,
            definition.definition
        );
    }

    if result.degraded {
        let reason = result.error.as_deref().unwrap_or("upstream unavailable");
        let _ = writeln!(out, "  [fallback: {}]", reason);
    }
    out
}

/// Renders a result as text or pretty JSON
pub fn render(result: &WordOfTheDay, json: bool) -> Result<String, serde_json::Error> {
    if json {
        Ok(serde_json::to_string_pretty(result)? + "\n")
    } else {
        Ok(render_text(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Definition, Word};

    fn lumen() -> WordOfTheDay {
        WordOfTheDay::new(
            Word::new("lumen").unwrap(),
            vec![
                Definition::new("a unit of luminous flux", "noun"),
                Definition::new("the cavity of a tubular organ", "noun"),
            ],
        )
    }

    #[test]
    fn test_parse_provider_arg() {
        assert_eq!(
            parse_provider_arg("random-word-api").unwrap(),
            WordProvider::RandomWordApi
        );
        assert_eq!(parse_provider_arg("vercel").unwrap(), WordProvider::Vercel);
    }

    #[test]
    fn test_parse_provider_arg_invalid() {
        let result = parse_provider_arg("invalid");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid provider"));
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["wotd"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.selected_command(), Command::Get);
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_parse_subcommands() {
        assert_eq!(Cli::parse_from(["wotd", "get"]).selected_command(), Command::Get);
        assert_eq!(Cli::parse_from(["wotd", "refresh"]).selected_command(), Command::Refresh);
        assert_eq!(Cli::parse_from(["wotd", "repl"]).selected_command(), Command::Repl);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["wotd", "refresh", "--json", "-vv", "--provider", "vercel"]);
        assert_eq!(cli.selected_command(), Command::Refresh);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.provider.as_deref(), Some("vercel"));
    }

    #[test]
    fn test_apply_overrides() {
        let cli = Cli::parse_from([
            "wotd",
            "--provider",
            "vercel",
            "--random-word-url",
            "http://words.local/api",
            "--dictionary-url",
            "http://dict.local",
        ]);
        let mut config = Config::default();

        cli.apply_overrides(&mut config).unwrap();

        assert_eq!(config.word_provider, WordProvider::Vercel);
        assert_eq!(config.random_word_url.as_deref(), Some("http://words.local/api"));
        assert_eq!(config.dictionary_url, "http://dict.local");
    }

    #[test]
    fn test_apply_overrides_leaves_config_alone_without_flags() {
        let cli = Cli::parse_from(["wotd"]);
        let mut config = Config::default();

        cli.apply_overrides(&mut config).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_apply_overrides_invalid_provider() {
        let cli = Cli::parse_from(["wotd", "--provider", "wordnik"]);
        let mut config = Config::default();

        assert!(matches!(
            cli.apply_overrides(&mut config),
            Err(CliError::InvalidProvider(p)) if p == "wordnik"
        ));
    }

    #[test]
    fn test_log_filter_levels() {
        assert_eq!(log_filter(0), "warn");
        assert_eq!(log_filter(1), "warn,wotd=info");
        assert_eq!(log_filter(2), "warn,wotd=debug");
        assert_eq!(log_filter(7), "trace");
    }

    #[test]
    fn test_parse_repl_line() {
        assert_eq!(parse_repl_line("get").unwrap(), Some(ReplCommand::Get));
        assert_eq!(parse_repl_line("  REFRESH ").unwrap(), Some(ReplCommand::Refresh));
        assert_eq!(parse_repl_line("c").unwrap(), Some(ReplCommand::Clear));
        assert_eq!(parse_repl_line("?").unwrap(), Some(ReplCommand::Help));
        assert_eq!(parse_repl_line("exit").unwrap(), Some(ReplCommand::Quit));
        assert_eq!(parse_repl_line("   ").unwrap(), None);
        assert!(matches!(
            parse_repl_line("dance"),
            Err(CliError::UnknownCommand(c)) if c == "dance"
        ));
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&lumen());
        assert_eq!(
            text,
            "lumen\n  1. (noun) a unit of luminous flux\n  2. (noun) the cavity of a tubular organ\n"
        );
    }

    #[test]
    fn test_render_text_without_definitions() {
        let result = WordOfTheDay::new(Word::new("xyzzyplugh").unwrap(), vec![]);
        let text = render_text(&result);
        assert!(text.starts_with("xyzzyplugh\n"));
        assert!(text.contains("No definitions found."));
    }

    #[test]
    fn test_render_text_marks_fallback() {
        let text = render_text(&crate::service::fallback());
        assert!(text.starts_with("fallback\n"));
        assert!(text.contains("[fallback: Failed to fetch data from external APIs]"));
    }

    #[test]
    fn test_render_json() {
        let json = render(&lumen(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["word"], "lumen");
        assert_eq!(value["definitions"][1]["partOfSpeech"], "noun");
        assert!(value.get("degraded").is_none());
    }
}
