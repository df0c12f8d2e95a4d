//! A command line tool for converting the main data set of a DICOM file
//! into a JSON metadata document.
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use clap::Parser;
use dcm2json::{convert_file, FormatOptions, RootLayout};

/// Exit code for when an error emerged while converting the DICOM file.
const ERROR_CONVERT: i32 = -2;
/// Exit code for when an error emerged while writing the output.
const ERROR_WRITE: i32 = -3;

/// Convert DICOM data set metadata to JSON
#[derive(Debug, Parser)]
#[command(version)]
struct App {
    /// The DICOM file to convert
    file: PathBuf,
    /// Print the document on a single line, without indentation
    #[arg(short, long)]
    compact: bool,
    /// Emit the document root as an array of single-element objects
    #[arg(long)]
    list: bool,
    /// Elide the values of elements larger than this many bytes
    #[arg(long, default_value_t = 1024)]
    max_bytes: usize,
    /// Write the document to a file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn report<E>(err: E)
where
    E: std::error::Error,
{
    eprintln!("[ERROR] {}", err);
    if let Some(source) = err.source() {
        eprintln!();
        eprintln!("Caused by:");
        for (i, e) in std::iter::successors(Some(source), |e| e.source()).enumerate() {
            eprintln!("   {}: {}", i, e);
        }
    }
}

fn main() {
    let App {
        file,
        compact,
        list,
        max_bytes,
        output,
    } = App::parse();

    let mut options = FormatOptions::new();
    options.pretty(!compact).max_value_bytes(max_bytes);
    if list {
        options.layout(RootLayout::List);
    }

    let json = convert_file(&file, &options).unwrap_or_else(|e| {
        report(e);
        std::process::exit(ERROR_CONVERT);
    });

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, json + "\n") {
                report(e);
                std::process::exit(ERROR_WRITE);
            }
        }
        None => {
            let stdout = std::io::stdout();
            let mut stdout = stdout.lock();
            match writeln!(stdout, "{}", json) {
                Err(ref e) if e.kind() == ErrorKind::BrokenPipe => {
                    // handle broken pipe separately with a no-op
                }
                Err(e) => {
                    report(e);
                    std::process::exit(ERROR_WRITE);
                }
                _ => {} // all good
            }
        }
    }
}
