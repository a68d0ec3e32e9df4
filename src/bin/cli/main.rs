//! CLI tool for aligning package payloads.

mod commands;
mod exit_codes;

use clap::Parser;
use std::path::PathBuf;

use exit_codes::ExitCode;

/// Repack a .deb so every file starts on a 4096-byte block boundary
#[derive(Parser)]
#[command(name = "debalign")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Input package (defaults to standard input)
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Output package (defaults to standard output, which must be a seekable file)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Report progress
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Do not insert the _data-pad member ahead of the payload
    #[arg(long)]
    no_pad: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::BadArgs
            } else {
                ExitCode::Success
            };
            let _ = e.print();
            std::process::exit(code.code());
        }
    };

    let level = if cli.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let exit_code = commands::repack(&commands::RepackConfig {
        input: cli.input.as_deref(),
        output: cli.output.as_deref(),
        verbose: cli.verbose,
        pad_data_member: !cli.no_pad,
    });

    std::process::exit(exit_code.code());
}
