use clap::{CommandFactory, Parser as CParser};
use ippcode_parse::parser::{ParseError, ParseResult};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code for anything wrong with the command line
const EXIT_BAD_ARGS: u8 = 10;

#[derive(CParser)]
#[command(name = "parse")]
#[command(about = "IPPcode22 source analyzer")]
#[command(
    long_about = "Reads IPPcode22 source from standard input, checks it for lexical and \
                  syntax errors and writes its XML representation to standard output."
)]
#[command(disable_help_flag = true)]
struct Args {
    /// Print this help
    #[arg(long)]
    help: bool,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            tracing::error!("invalid arguments, see `parse --help`");
            eprint!("{e}");
            return ExitCode::from(EXIT_BAD_ARGS);
        }
    };

    if args.help {
        // `--help` is only valid on its own, clap already refused anything else
        return match Args::command().print_long_help() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("{e}");
                ExitCode::from(ParseError::Output(e).exit_code())
            }
        };
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> ParseResult<()> {
    // Nothing reaches stdout unless the whole input parsed
    let program = ippcode_parse::parse(io::stdin().lock())?;

    program
        .write_xml(io::stdout().lock())
        .map_err(ParseError::Output)
}
