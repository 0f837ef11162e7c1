// ABOUTME: Driver binary: batch script execution and an interactive REPL

use clap::Parser;
use palisp::config;
use palisp::error::Error;
use palisp::interp::Interp;
use palisp::port::Port;
use palisp::reader;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

/// Symbolic language runtime with first-class continuations
#[derive(Parser, Debug)]
#[command(name = "palisp")]
#[command(version = config::VERSION)]
#[command(about = "A small symbolic language runtime in the Lisp tradition")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Evaluate FORM before the script or REPL (can be repeated)
    #[arg(long = "expr", value_name = "FORM", action = clap::ArgAction::Append)]
    exprs: Vec<String>,
}

fn main() {
    let args = CliArgs::parse();
    let mut interp = Interp::new();

    for form in &args.exprs {
        if let Err(e) = run_source(&mut interp, form) {
            fatal(&mut interp, &e);
        }
    }

    if let Some(path) = args.script {
        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                let err = Error::Io(format!("cannot read script file {}: {}", path.display(), e));
                fatal(&mut interp, &err);
            }
        };
        if let Err(e) = run_source(&mut interp, &source) {
            fatal(&mut interp, &e);
        }
        return;
    }

    repl(&mut interp);
}

/// Read, evaluate, and echo every form in `source` through the current
/// output port.
fn run_source(interp: &mut Interp, source: &str) -> Result<(), Error> {
    let port = Rc::new(RefCell::new(Port::from_str(source)));
    while let Some(expr) = reader::read(&port, &mut interp.symbols)? {
        let value = interp.eval(expr)?;
        let line = format!("{}\n", value);
        interp.output.borrow_mut().write_all(line.as_bytes())?;
    }
    Ok(())
}

/// Write the diagnostic to the current error port and exit non-zero.
fn fatal(interp: &mut Interp, err: &Error) -> ! {
    let diagnostic = format!("{}\n", err);
    let _ = interp.errout.borrow_mut().write_all(diagnostic.as_bytes());
    std::process::exit(1);
}

fn repl(interp: &mut Interp) {
    let editor_config = Config::builder().auto_add_history(true).build();
    let mut rl = match DefaultEditor::with_config(editor_config) {
        Ok(rl) => rl,
        Err(e) => {
            let err = Error::Io(format!("failed to initialize REPL: {}", e));
            fatal(interp, &err);
        }
    };
    let _ = rl.load_history(config::HISTORY_FILE);

    println!("{}", config::WELCOME_MESSAGE);
    println!("{}", config::WELCOME_SUBTITLE);

    loop {
        match rl.readline(config::PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "(quit)" || line == "(exit)" {
                    break;
                }
                match run_source(interp, line) {
                    Ok(()) => {}
                    Err(e @ Error::Internal(_)) => fatal(interp, &e),
                    Err(e) => {
                        let diagnostic = format!("{}\n", e);
                        let _ = interp.errout.borrow_mut().write_all(diagnostic.as_bytes());
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }

    let _ = rl.save_history(config::HISTORY_FILE);
}
