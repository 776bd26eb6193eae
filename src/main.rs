//! Purpose: `seqlog` demo entry point exercising the writer backends.
//! Role: Binary crate root; parses args, runs a timed write loop, reports size.
//! Invariants: The library never installs a tracing subscriber; only here.
//! Invariants: All log mutation goes through `api::Writer` (registry + locks).
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use seqlog::core::bytesize::format_byte_size;
use seqlog::{BackendKind, Writer};

#[derive(Debug, Parser)]
#[command(name = "seqlog", about = "Append payloads to a log and report throughput")]
struct Cli {
    /// Log file path (ignored by the memory backend)
    path: PathBuf,

    /// Backend kind: memory, file, or mmap
    #[arg(long, default_value = "mmap")]
    kind: BackendKind,

    /// Number of payloads to append
    #[arg(long, default_value_t = 10_000)]
    count: u64,

    /// Payload length in bytes
    #[arg(long, default_value_t = 500)]
    len: usize,

    /// Soft size ceiling in bytes; 0 means unbounded
    #[arg(long, default_value_t = 0)]
    limit: u64,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let mut writer = match Writer::open(cli.kind, &cli.path) {
        Ok(writer) => writer,
        Err(err) => {
            eprintln!("seqlog: {err}");
            process::exit(1);
        }
    };
    writer.set_limit(cli.limit);

    let payload = vec![b'1'; cli.len];
    let start = Instant::now();
    let mut failed = 0u64;
    for _ in 0..cli.count {
        if !writer.write(&payload) {
            failed += 1;
        }
    }
    writer.flush();
    let elapsed = start.elapsed();

    println!(
        "{} backend: {} writes of {} in {:?}, {} failed, size {}",
        cli.kind,
        cli.count,
        format_byte_size(cli.len as u64),
        elapsed,
        failed,
        format_byte_size(writer.size()),
    );
    writer.close();
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
