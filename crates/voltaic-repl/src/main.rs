//! Voltaic interactive shell.

mod command;
mod error;
mod output;
mod persist;
mod session;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use session::{Flow, Session};

#[derive(Parser)]
#[command(name = "voltaic")]
#[command(about = "An interactive SPICE-style simulator for lumped linear circuits", long_about = None)]
#[command(version)]
struct Cli {
    /// Saved command file to replay before entering the shell
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut session = Session::new();

    println!("Voltaic circuit simulator (DC, AC & transient). Type 'help' for usage.");

    if let Some(path) = &cli.input {
        let lines = persist::load(path)?;
        match session.replay(&lines) {
            Ok(()) => println!("Loaded circuit from {}", path.display()),
            Err(e) => eprintln!("Error replaying {}: {e}", path.display()),
        }
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break, // EOF
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match session.execute_line(line) {
            Ok(Flow::Exit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    Ok(())
}
