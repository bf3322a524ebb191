//! Integration tests for CLI argument handling
//!
//! Covers flag parsing and the startup errors that must happen before any
//! network request is made.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_wotd"))
        .args(args)
        .env_remove("WOTD_RANDOM_WORD_URL")
        .env_remove("WOTD_DICTIONARY_URL")
        .env_remove("WOTD_WORD_PROVIDER")
        .output()
        .expect("Failed to execute wotd")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("wotd"), "Help should mention wotd");
    assert!(stdout.contains("refresh"), "Help should list the refresh command");
    assert!(stdout.contains("--json"), "Help should mention --json flag");
}

#[test]
fn test_invalid_provider_prints_error_and_exits() {
    let output = run_cli(&["--provider", "wordnik"]);
    assert!(
        !output.status.success(),
        "Expected invalid provider to fail"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("wordnik"),
        "Should print error message about invalid provider: {}",
        stderr
    );
}

#[test]
fn test_invalid_dictionary_url_exits_with_error() {
    let output = run_cli(&["get", "--dictionary-url", "not a url"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("dictionary_url"),
        "Should name the invalid setting: {}",
        stderr
    );
}

#[test]
fn test_missing_config_file_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.toml");

    let output = run_cli(&["--config", missing.to_str().unwrap()]);

    assert!(!output.status.success());
}

#[test]
fn test_unknown_subcommand_is_rejected() {
    let output = run_cli(&["dance"]);
    assert!(!output.status.success());
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use wotd::cli::{parse_provider_arg, Cli, Command};
    use wotd::data::WordProvider;

    #[test]
    fn test_cli_no_args_defaults_to_get() {
        let cli = Cli::parse_from(["wotd"]);
        assert_eq!(cli.selected_command(), Command::Get);
        assert!(cli.provider.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_repl_with_config() {
        let cli = Cli::parse_from(["wotd", "--config", "/tmp/wotd.toml", "repl"]);
        assert_eq!(cli.selected_command(), Command::Repl);
        assert_eq!(cli.config.unwrap().to_str(), Some("/tmp/wotd.toml"));
    }

    #[test]
    fn test_cli_verbose_is_counted() {
        let cli = Cli::parse_from(["wotd", "-vvv"]);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_parse_provider_is_case_insensitive() {
        assert_eq!(parse_provider_arg("VERCEL").unwrap(), WordProvider::Vercel);
        assert_eq!(
            parse_provider_arg("Random-Word-API").unwrap(),
            WordProvider::RandomWordApi
        );
    }

    #[test]
    fn test_cli_rejects_unknown_flag() {
        assert!(Cli::try_parse_from(["wotd", "--plan"]).is_err());
    }
}
