//! parlex command-line driver
//!
//! Runs the whole pipeline over a text file: tokenize, build the
//! codebook, encode, archive to disk, then read the archive back,
//! decode and render the restored text next to the input. Three run
//! modes select the concurrency discipline: sequential, parallel with
//! barrier-synchronized partitions, or parallel with the
//! work-stealing scheduler driving the encode pass.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use log::info;
use thiserror::Error;

use parlex_core::codec::storage::{self, StorageError};
use parlex_core::codec::tokenizer::TokenizeError;
use parlex_core::codec::{decode, encode, par_decode, par_encode, steal_encode, tokenize_file};
use parlex_core::{Archive, Codebook};

const USAGE: &str = "\
Usage: parlex <input> s
       parlex <input> p <threads> [--steal]

  <input>    text file to compress and restore
  s          run the sequential pipeline
  p          run the parallel pipeline with <threads> workers (>= 2)
  --steal    drive the encode pass with the work-stealing scheduler
";

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Sequential,
    Parallel { threads: usize, steal: bool },
}

#[derive(Debug)]
struct Job {
    input: PathBuf,
    mode: Mode,
}

fn parse_args(args: &[String]) -> Result<Job, CliError> {
    let usage = |message: &str| CliError::Usage(message.to_string());

    let (input, rest) = args
        .split_first()
        .ok_or_else(|| usage("missing input file"))?;
    let (mode, rest) = rest
        .split_first()
        .ok_or_else(|| usage("missing mode (s or p)"))?;

    let mode = match mode.as_str() {
        "s" => {
            if !rest.is_empty() {
                return Err(usage("sequential mode takes no further arguments"));
            }
            Mode::Sequential
        }
        "p" => {
            let (threads, rest) = rest
                .split_first()
                .ok_or_else(|| usage("parallel mode needs a thread count"))?;
            let threads: usize = threads
                .parse()
                .map_err(|_| usage("thread count must be an integer"))?;
            if threads < 2 {
                return Err(usage("parallel mode needs at least 2 threads"));
            }
            let steal = match rest {
                [] => false,
                [flag] if flag == "--steal" => true,
                _ => return Err(usage("unrecognized trailing arguments")),
            };
            Mode::Parallel { threads, steal }
        }
        other => return Err(usage(&format!("unknown mode {other:?}"))),
    };

    Ok(Job {
        input: PathBuf::from(input),
        mode,
    })
}

fn run(job: &Job) -> Result<(), CliError> {
    let archive_path = job.input.with_extension("plx");
    let output_path = job.input.with_extension("out.txt");

    let tokens = tokenize_file(&job.input)?;
    let codebook = Codebook::build(&tokens);
    info!(
        "{}: {} tokens, {} distinct",
        job.input.display(),
        tokens.len(),
        codebook.len()
    );

    let encoded = match job.mode {
        Mode::Sequential => encode(&tokens, &codebook),
        Mode::Parallel { threads, steal } => {
            if steal {
                steal_encode(&tokens, &codebook, threads)
            } else {
                par_encode(&tokens, &codebook, threads)
            }
        }
    };
    let archive = Archive { encoded, codebook };
    let bytes = archive.save(&archive_path)?;
    info!("wrote {} ({bytes} bytes)", archive_path.display());

    let archive = Archive::load(&archive_path)?;
    let decoded = match job.mode {
        Mode::Sequential => decode(&archive.encoded, &archive.codebook),
        Mode::Parallel { threads, .. } => par_decode(&archive.encoded, &archive.codebook, threads),
    };
    storage::write_text(&output_path, &decoded)?;
    info!("restored {}", output_path.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let start = Instant::now();

    let args: Vec<String> = env::args().skip(1).collect();
    let job = match parse_args(&args) {
        Ok(job) => job,
        Err(err) => {
            eprintln!("{err}\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = run(&job) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    println!("{:.2}", start.elapsed().as_secs_f64());
    ExitCode::SUCCESS
}
