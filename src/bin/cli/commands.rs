//! Command implementation for the CLI tool.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use debalign::{RepackOptions, repack as repack_package};

use crate::exit_codes::{ExitCode, error_to_exit_code};

/// Configuration for the repack command.
pub struct RepackConfig<'a> {
    pub input: Option<&'a Path>,
    pub output: Option<&'a Path>,
    pub verbose: bool,
    pub pad_data_member: bool,
}

/// Repack command implementation
pub fn repack(config: &RepackConfig<'_>) -> ExitCode {
    let input: Box<dyn Read> = match config.input {
        Some(path) => match File::open(path) {
            Ok(f) => Box::new(f),
            Err(e) => {
                eprintln!("Error opening {}: {}", path.display(), e);
                return ExitCode::IoError;
            }
        },
        None => Box::new(io::stdin().lock()),
    };

    let output = match config.output {
        Some(path) => File::create(path),
        None => stdout_file(),
    };
    let mut output = match output {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening output: {}", e);
            return ExitCode::IoError;
        }
    };

    let options = RepackOptions::new()
        .verbose(config.verbose)
        .pad_data_member(config.pad_data_member);

    match repack_package(input, &mut output, options) {
        Ok(summary) => {
            log::info!(
                "{} members copied, {} files aligned, data member {} -> {} bytes",
                summary.copied_members,
                summary.aligned_entries,
                summary.declared_size,
                summary.final_size
            );
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            error_to_exit_code(&e)
        }
    }
}

/// Duplicates standard output as a file so it can be seeked and extended.
#[cfg(unix)]
fn stdout_file() -> io::Result<File> {
    use std::os::fd::AsFd;
    let fd = io::stdout().as_fd().try_clone_to_owned()?;
    Ok(File::from(fd))
}

/// Duplicates standard output as a file so it can be seeked and extended.
#[cfg(windows)]
fn stdout_file() -> io::Result<File> {
    use std::os::windows::io::AsHandle;
    let handle = io::stdout().as_handle().try_clone_to_owned()?;
    Ok(File::from(handle))
}
