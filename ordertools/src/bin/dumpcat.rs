use anyhow::{bail, Result};
use argh::FromArgs;
use either::{Left, Right};
use std::fs;
use std::io::{stdin, stdout, BufReader, Write};

use ordertools::de::{self, RecordFormat, TagReader};
use ordertools::ser;

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

#[derive(Debug, FromArgs, Clone)]
/// Decode binary tag records (optionally zstd compressed, by the .zst
/// extension) and print tab-separated (channel, time) detector events to
/// standard output. Tagger markers are left out.
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// read the legacy 16-byte dump records instead of stream records
    #[argh(switch)]
    pub dump: bool,
    /// with no input or when input is '-', read from standard input
    #[argh(positional)]
    pub input: Vec<String>,
}

fn main() -> Result<()> {
    let args: CliArgs = argh::from_env();
    if args.version {
        let stdout = stdout();
        let mut stdout = stdout.lock();
        writeln!(
            stdout,
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            GIT_VERSION,
        )?;
        return Ok(())
    }

    // Collect inputs
    let mut inputs = Vec::new();
    if args.input.is_empty() {
        inputs.push(Left(()));
    } else {
        let mut contains_stdin = false;
        for i in args.input {
            if i == "-" {
                if contains_stdin {
                    bail!("cannot specify '-' for stdin twice");
                }
                contains_stdin = true;
                inputs.push(Left(()));
            } else {
                match fs::metadata(&i) {
                    Ok(m) if m.is_file() => inputs.push(Right(i)),
                    Ok(_) => bail!("{} is not a file", &i),
                    Err(e) => bail!(e),
                }
            }
        }
    }

    let format = if args.dump { RecordFormat::Dump } else { RecordFormat::Stream };
    let stdout = stdout();
    let stdout = stdout.lock();
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_writer(stdout);

    for i in inputs {
        let chunks = match i {
            Left(()) => Left(TagReader::new(BufReader::new(stdin().lock()), format)),
            Right(path) => Right(de::open(path, format)?),
        };
        for chunk in chunks {
            ser::tsv(&mut wtr, &chunk?)?;
        }
    }
    wtr.flush()?;
    Ok(())
}
