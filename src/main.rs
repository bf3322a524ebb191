//! Word of the day CLI
//!
//! Prints a random English word with its dictionary definitions. Results are
//! cached for a day within a running process; `wotd repl` keeps one service
//! alive so the cache can be observed across commands.

use std::io::Write;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use wotd::cli::{self, Cli, Command, ReplCommand};
use wotd::config::Config;
use wotd::data::WordOfTheDay;
use wotd::service::WordOfTheDayService;

const REPL_HELP: &str = "Commands:
  get      show the word of the day (cached)
  refresh  discard the cached word and fetch a new one
  clear    discard the cached word
  help     show this message
  quit     exit";

/// Sends logs to stderr so stdout stays clean for results
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli::log_filter(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_result(result: &WordOfTheDay, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let rendered = cli::render(result, json)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Reads commands from stdin until `quit` or end of input
async fn run_repl(service: &WordOfTheDayService, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match cli::parse_repl_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("{}", err);
                continue;
            }
        };

        debug!(?command, "repl command");
        match command {
            ReplCommand::Get => print_result(&service.get_word_of_the_day().await, json)?,
            ReplCommand::Refresh => print_result(&service.refresh().await, json)?,
            ReplCommand::Clear => {
                service.clear_cache().await;
                println!("Cache cleared.");
            }
            ReplCommand::Help => println!("{}", REPL_HELP),
            ReplCommand::Quit => break,
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config)?;
    let service = WordOfTheDayService::from_config(&config)?;

    match cli.selected_command() {
        Command::Get => {
            let result = service.get_word_of_the_day().await;
            if result.degraded {
                warn!("served fallback word of the day");
            }
            print_result(&result, cli.json)?;
        }
        Command::Refresh => print_result(&service.refresh().await, cli.json)?,
        Command::Repl => run_repl(&service, cli.json).await?,
    }

    Ok(())
}
