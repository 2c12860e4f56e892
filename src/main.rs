use log::LevelFilter;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as ReplResult};
use simple_logger::SimpleLogger;
use std::process::ExitCode;

use mainau::{parse, parse_interactive, DiagnosticSink, Error, Interpreter, Session};

const REPL_ORIGIN: &str = "repl-session";

fn main() -> Result<ExitCode, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let verbose = args.iter().any(|arg| arg == "--verbose");
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    SimpleLogger::new()
        .with_level(level)
        .init()
        .map_err(|err| err.to_string())?;

    match args.iter().find(|arg| !arg.starts_with("--")) {
        Some(filename) => run_script(filename, verbose),
        None => {
            run_repl(verbose).map_err(|err| format!("{err}"))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Checks a script: parsing only, every diagnostic is printed.
fn run_script(filename: &str, verbose: bool) -> Result<ExitCode, String> {
    let source = std::fs::read_to_string(filename)
        .map_err(|err| format!("Could not read {filename}: {err}"))?;
    let mut sink = DiagnosticSink::new(&source, filename);
    let program = match parse(&source, &mut sink) {
        Ok(program) => program,
        // rendered by the sink already
        Err(Error::Halt(_)) => return Ok(ExitCode::FAILURE),
        Err(err) => return Err(format!("{filename}: {err}")),
    };
    if verbose {
        println!("\nParsed result:\n{program:#?}");
    }
    if sink.count() == 0 {
        return Ok(ExitCode::SUCCESS);
    }
    sink.flush();
    Ok(ExitCode::FAILURE)
}

fn run_repl(verbose: bool) -> ReplResult<()> {
    let mut rl = DefaultEditor::new()?;
    let session = Session::new(None);
    #[cfg(feature = "with-file-history")]
    if rl.load_history("history.txt").is_err() {
        println!("No previous history.");
    }
    println!("Mainau Repl! v{}", env!("CARGO_PKG_VERSION"));
    loop {
        let readline = rl.readline(">> ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() || line == "exit" {
                    println!("Goodbye!");
                    break;
                }
                rl.add_history_entry(line)?;
                if !evaluate_line(line, &session, verbose) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    #[cfg(feature = "with-file-history")]
    rl.save_history("history.txt")?;
    Ok(())
}

/// Runs one line against the session. Returns `false` once a fatal
/// diagnostic has ended the session.
fn evaluate_line(line: &str, session: &Session, verbose: bool) -> bool {
    let mut sink = DiagnosticSink::new(line, REPL_ORIGIN);
    let program = match parse_interactive(line, &mut sink) {
        Ok(program) => program,
        Err(_) => return false,
    };
    if verbose {
        println!("{program:#?}");
    }
    // a program with syntax errors is not evaluated
    if sink.count() > 0 {
        sink.flush();
        return true;
    }
    let value = match Interpreter::new(&mut sink).evaluate_program(&program, session) {
        Ok(value) => value,
        Err(_) => return false,
    };
    sink.flush();
    println!("{value}");
    true
}
