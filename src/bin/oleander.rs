use std::{fs, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};

use oleander::{Interpreter, Repl, Result};

#[derive(Parser)]
#[command(author, version, about = "Oleander language interpreter")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one or more Oleander scripts in a single interpreter session
    Run {
        #[arg(required = true)]
        scripts: Vec<PathBuf>,
    },
    /// Start an interactive REPL session
    Repl,
    /// Evaluate a snippet of Oleander code and print its value
    Eval { source: String },
}

fn main() -> ExitCode {
    let args = Args::parse();
    let result = match args.command.unwrap_or(Command::Repl) {
        Command::Run { scripts } => run_scripts(scripts),
        Command::Repl => Repl::new().run(),
        Command::Eval { source } => {
            let mut interpreter = Interpreter::new();
            interpreter
                .run("<eval>", &source)
                .map(|value| println!("{value}"))
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Scripts share one interpreter, so globals defined by an earlier script
/// are visible to the ones that follow.
fn run_scripts(scripts: Vec<PathBuf>) -> Result<()> {
    let mut interpreter = Interpreter::new();
    for script in scripts {
        let source = fs::read_to_string(&script)?;
        interpreter.run(&script.to_string_lossy(), &source)?;
    }
    Ok(())
}
