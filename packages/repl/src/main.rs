use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use vtyang_repl::host::{StdioHost, TerminalHost};
use vtyang_repl::io::{ExitReason, IoError, IoHost};
use vtyang_repl::{ReplCore, Session, SessionConfig};

/// vtyang - YANG-driven configuration shell
#[derive(Parser, Debug)]
#[command(name = "vtyang")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of compiled YANG modules (repeatable)
    #[arg(short, long = "yang", default_value = "./yang")]
    yang: Vec<PathBuf>,

    /// Directory for the running config and commit history
    #[arg(short, long = "run-path")]
    run_path: Option<PathBuf>,

    /// Mirror commits onto the management daemon at this socket
    #[arg(long)]
    mgmtd: Option<PathBuf>,

    /// Run these commands and exit instead of starting the shell (repeatable)
    #[arg(short, long)]
    command: Vec<String>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Force vi editing mode
    #[arg(long, conflicts_with = "emacs")]
    vi: bool,

    /// Force emacs editing mode
    #[arg(long)]
    emacs: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.vi {
        std::env::set_var("VTYANG_EDIT_MODE", "vi");
    } else if args.emacs {
        std::env::set_var("VTYANG_EDIT_MODE", "emacs");
    }

    if let Err(e) = init_logging(&args) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(args: &Args) -> std::io::Result<()> {
    let default = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &args.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

/// Returns whether the run ended cleanly.
fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let run_dir = match args.run_path {
        Some(dir) => dir,
        None => default_run_dir()?,
    };
    let mut config = SessionConfig::new(args.yang, run_dir);
    config.mgmtd = args.mgmtd;

    let session = Session::open(&config)?;
    tracing::info!(
        modules = session.schema().modules().len(),
        run_dir = %config.run_dir.display(),
        "session opened"
    );
    let mut core = ReplCore::new(session);

    if !args.command.is_empty() {
        let mut host = StdioHost::stdin();
        let reason = core.run_commands(&args.command, &mut host)?;
        return Ok(core.failures() == 0 && !matches!(reason, ExitReason::Fatal(_)));
    }

    let reason = if std::io::stdin().is_terminal() {
        let mut host = TerminalHost::new(core.session())?;
        interactive(&mut core, &mut host)?
    } else {
        let mut host = StdioHost::stdin();
        let reason = core.run(&mut host)?;
        if core.failures() > 0 {
            return Ok(false);
        }
        reason
    };
    Ok(!matches!(reason, ExitReason::Fatal(_)))
}

fn interactive(core: &mut ReplCore, host: &mut impl IoHost) -> Result<ExitReason, IoError> {
    let reason = core.run(host)?;
    if reason == ExitReason::UserExit {
        println!("Goodbye!");
    }
    Ok(reason)
}

fn default_run_dir() -> Result<PathBuf, String> {
    dirs::data_local_dir()
        .map(|dir| dir.join("vtyang"))
        .ok_or_else(|| "cannot determine a default run path; pass --run-path".to_string())
}
