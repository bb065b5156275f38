//! mcdbctl
//!
//! Command-line tool for building, inspecting and querying containers.

use std::ffi::{OsStr, OsString};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use mcdb::make::input::make_file;
use mcdb::tools::{self, Keep, Seq};
#[cfg(not(unix))]
use mcdb::McdbError;
use mcdb::{Config, Mcdb};

/// Exit status for "key not found", as scripts expect from cdbget
const EXIT_NOT_FOUND: i32 = 100;

/// mcdb command-line tool
#[derive(Parser, Debug)]
#[command(name = "mcdbctl")]
#[command(about = "Build, dump and query constant databases")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a container from make-format input
    Make {
        /// Container to create or replace
        db: PathBuf,

        /// Input file, or "-" for stdin
        input: String,
    },

    /// Print every record in make format
    Dump {
        db: PathBuf,
    },

    /// Verify the index and print probe-distance statistics
    Stats {
        db: PathBuf,
    },

    /// Print the value stored under a key
    Get {
        db: PathBuf,

        /// Raw key bytes; need not be UTF-8
        key: OsString,

        /// Which duplicate to print: a 0-based index, or "all"
        #[arg(default_value_t = Seq::default())]
        seq: Seq,
    },

    /// Remove duplicate keys in place
    Uniq {
        db: PathBuf,

        /// Which value of a duplicated key to keep
        #[arg(value_enum, default_value_t = KeepArg::First)]
        keep: KeepArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KeepArg {
    First,
    Last,
}

impl From<KeepArg> for Keep {
    fn from(k: KeepArg) -> Self {
        match k {
            KeepArg::First => Keep::First,
            KeepArg::Last => Keep::Last,
        }
    }
}

/// What a command accomplished, beyond plain success
enum Outcome {
    Done,
    NotFound,
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let config = Config::default();

    match run(args.command, &config) {
        Ok(Outcome::Done) => {}
        Ok(Outcome::NotFound) => process::exit(EXIT_NOT_FOUND),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}

fn run(command: Commands, config: &Config) -> mcdb::Result<Outcome> {
    match command {
        Commands::Make { db, input } => {
            let source = (input != "-").then(|| Path::new(&input));
            let summary = make_file(source, &db, config)?;
            info!(db = %db.display(), records = summary.records, size = summary.size, "built");
            Ok(Outcome::Done)
        }

        Commands::Dump { db } => {
            let db = Mcdb::open_with(&db, config)?;
            let mut out = BufWriter::new(io::stdout().lock());
            tools::dump(&db, &mut out)?;
            Ok(Outcome::Done)
        }

        Commands::Stats { db } => {
            let db = Mcdb::open_with(&db, config)?;
            let stats = tools::stats(&db)?;
            print!("{}", stats);
            Ok(Outcome::Done)
        }

        Commands::Get { db, key, seq } => {
            let db = Mcdb::open_with(&db, config)?;
            let key = key_bytes(&key)?;
            let mut out = BufWriter::new(io::stdout().lock());
            if tools::get(&db, &key, seq, &mut out)? {
                Ok(Outcome::Done)
            } else {
                Ok(Outcome::NotFound)
            }
        }

        Commands::Uniq { db, keep } => {
            let rebuilt = tools::uniq(&db, keep.into(), config)?;
            info!(db = %db.display(), rebuilt, "uniq");
            Ok(Outcome::Done)
        }
    }
}

#[cfg(unix)]
fn key_bytes(key: &OsStr) -> mcdb::Result<Vec<u8>> {
    use std::os::unix::ffi::OsStrExt;

    Ok(key.as_bytes().to_vec())
}

#[cfg(not(unix))]
fn key_bytes(key: &OsStr) -> mcdb::Result<Vec<u8>> {
    key.to_str()
        .map(|k| k.as_bytes().to_vec())
        .ok_or_else(|| McdbError::Value(format!("key is not valid UTF-8: {:?}", key)))
}
