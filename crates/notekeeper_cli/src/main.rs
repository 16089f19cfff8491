//! `notekeeper` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration, start logging and open the note store.
//! - Route subcommands; `serve` speaks newline-delimited JSON over stdio.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Command};
use log::{error, info};
use notekeeper_core::{core_version, init_logging, ping, AppConfig};
use notekeeper_rpc::{open_store, serve_lines};
use std::error::Error;
use std::io::{self, Write};
use std::process::exit;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("event=cli_exit module=cli status=error error={err}");
        eprintln!("notekeeper: {err}");
        exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if cli.command == Command::Ping {
        println!("notekeeper_core ping={}", ping());
        println!("notekeeper_core version={}", core_version());
        return Ok(());
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config.log_level, &config.log_dir.to_string_lossy())?;
    info!(
        "event=cli_start module=cli status=ok version={} db_path={}",
        core_version(),
        config.db_path.display()
    );
    let conn = open_store(&config.db_path)?;

    match cli.command {
        Command::Serve => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            serve_lines(&conn, stdin.lock(), stdout.lock())?;
        }
        Command::User(command) => {
            let mut stdout = io::stdout().lock();
            commands::run_user_command(&conn, command, &mut stdout)?;
            stdout.flush()?;
        }
        Command::Ping => {}
    }
    Ok(())
}
