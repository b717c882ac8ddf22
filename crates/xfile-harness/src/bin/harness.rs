//! CLI entrypoint for the xfile stream harness.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use xfile_core::StreamConfig;
use xfile_harness::{LogEmitter, StreamRunner};

/// Buffered file stream tooling.
#[derive(Debug, Parser)]
#[command(name = "xfile-harness")]
#[command(about = "Drive buffered file streams from the command line")]
struct Cli {
    /// Write structured JSONL events to this file.
    #[arg(long, global = true)]
    log: Option<PathBuf>,
    /// Read buffer capacity in bytes (overrides XFILE_CHUNK_SIZE).
    #[arg(long, global = true)]
    chunk_size: Option<usize>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every line of a file.
    Lines {
        #[arg(long)]
        path: String,
        /// Open mode (`r`, `r+`, `rb`, ...).
        #[arg(long, default_value = "r")]
        mode: String,
        /// Prefix each line with its number.
        #[arg(long)]
        number: bool,
    },
    /// Copy a file to stdout through fixed-size reads.
    Read {
        #[arg(long)]
        path: String,
        /// Bytes requested per read call.
        #[arg(long, default_value_t = 4096)]
        chunk: usize,
    },
    /// Print the detected line ending of a file.
    Detect {
        #[arg(long)]
        path: String,
    },
    /// Render a printf-style template and write it to a file.
    Write {
        #[arg(long)]
        path: String,
        #[arg(long, default_value = "w")]
        mode: String,
        #[arg(long)]
        template: String,
        /// Template argument; repeat for each directive.
        #[arg(long = "arg")]
        args: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = StreamConfig::from_env();
    if let Some(size) = cli.chunk_size {
        config = config.with_chunk_size(size);
    }
    let mut runner = StreamRunner::new(config);
    if let Some(path) = &cli.log {
        let run_id = format!("run-{}", std::process::id());
        runner = runner.with_log(LogEmitter::to_file(path, "xfile", &run_id)?);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Lines { path, mode, number } => {
            runner.lines(&path, &mode, number, &mut out)?;
        }
        Command::Read { path, chunk } => {
            let summary = runner.copy(&path, chunk, &mut out)?;
            eprintln!("read {} bytes from {path}", summary.bytes);
        }
        Command::Detect { path } => {
            let ending = runner.detect(&path)?;
            writeln!(out, "{ending}")?;
        }
        Command::Write {
            path,
            mode,
            template,
            args,
        } => {
            let summary = runner.write(&path, &mode, &template, &args)?;
            eprintln!("wrote {} bytes to {path}", summary.bytes);
        }
    }
    out.flush()?;

    if let Some(path) = &cli.log
        && runner.finish()?.is_some()
    {
        eprintln!("Structured log written to {}", path.display());
    }
    Ok(())
}
