mod settings;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, error, info};

use mailsrs::{Srs, SrsError};
use settings::Settings;

type Op = fn(&Srs, &str) -> Result<String, SrsError>;

#[derive(Parser, Debug)]
#[command(author, version, about = "Sender Rewriting Scheme for forwarding mail relays", long_about = None)]
struct Args {
    /// JSON file with any of: secret, secret_file, domain, hash_length, max_age_days, separator
    #[arg(long, env = "SRS_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rewrite sender addresses into the relay domain
    Forward {
        /// Addresses to rewrite; read from stdin, one per line, when omitted
        addresses: Vec<String>,
    },
    /// Recover original addresses from rewritten ones
    Reverse {
        /// Addresses to reverse; read from stdin, one per line, when omitted
        addresses: Vec<String>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();

    let srs = match build_engine(&args) {
        Ok(srs) => srs,
        Err(e) => {
            error!("[main] configuration error: {:#}", e);
            return ExitCode::from(2);
        }
    };

    let (name, addresses, op) = match &args.command {
        Command::Forward { addresses } => ("forward", addresses.as_slice(), Srs::forward as Op),
        Command::Reverse { addresses } => ("reverse", addresses.as_slice(), Srs::reverse as Op),
    };

    info!("[main] mailsrs starting, command={}, domain={}", name, srs.config().domain());

    let stdin = io::stdin();
    let stdout = io::stdout();
    match run(&srs, name, addresses, op, stdin.lock(), stdout.lock()) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failures) => {
            info!("[main] {} finished with {} failed address(es)", name, failures);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("[main] {} failed: {:#}", name, e);
            ExitCode::FAILURE
        }
    }
}

fn build_engine(args: &Args) -> Result<Srs> {
    let mut settings = args.settings.clone();
    if let Some(path) = &args.config {
        settings = settings.or(settings::load_file(path)?);
    }
    let config = settings.into_config()?;
    debug!("[main] resolved {:?}", config);
    Ok(Srs::new(config))
}

/// Apply `op` to every address, or to every non-blank line of `input` when no
/// addresses are given, and write one result line each to `out`. Returns the
/// number of addresses that failed.
fn run<R: BufRead, W: Write>(
    srs: &Srs,
    name: &str,
    addresses: &[String],
    op: Op,
    input: R,
    mut out: W,
) -> Result<usize> {
    let mut failures = 0;

    let mut handle = |address: &str| -> Result<()> {
        let written = match op(srs, address) {
            Ok(rewritten) => {
                debug!("[main] {} {} -> {}", name, address, rewritten);
                writeln!(out, "{}", rewritten)
            }
            Err(e) => {
                error!("[main] {} {}: {}", name, address, e);
                failures += 1;
                writeln!(out, "ERROR {}", e)
            }
        };
        written.context("failed to write output")
    };

    if addresses.is_empty() {
        debug!("[main] reading addresses from stdin");
        for line in input.lines() {
            let line = line.context("failed to read from stdin")?;
            let address = line.trim();
            if address.is_empty() {
                continue;
            }
            handle(address)?;
        }
    } else {
        for address in addresses {
            handle(address)?;
        }
    }

    drop(handle);
    out.flush().context("failed to flush output")?;
    Ok(failures)
}
