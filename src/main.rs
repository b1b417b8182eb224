use anyhow::Result;
use argh::FromArgs;
use buildcon::Interpreter;
use buildcon::config::Settings;
use buildcon::console::TermConsole;
use simplelog::{ColorChoice, Config as LogConfig, LevelFilter, TermLogger, TerminalMode};
use std::path::Path;

const PROMPT: &str = "build> ";

#[derive(FromArgs)]
/// Interactive console for client-data extraction builds.
struct Args {
    /// settings file to use instead of the default location
    #[argh(option, short = 'c')]
    config: Option<String>,

    /// log diagnostics and report failures with the full error chain
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// run a single input line and exit
    #[argh(option, short = 'e')]
    exec: Option<String>,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    TermLogger::init(
        level,
        LogConfig::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let mut settings = Settings::load(args.config.as_deref().map(Path::new))?;
    if args.verbose {
        settings.verbose_errors = true;
    }

    let mut interpreter = Interpreter::new(settings, Box::new(TermConsole::new()?))?;
    match args.exec {
        Some(line) => interpreter.run_line(&line),
        None => interpreter.repl(PROMPT)?,
    }
    Ok(())
}
