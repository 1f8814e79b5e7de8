use anyhow::{bail, Result};
use argh::FromArgs;
use either::{Left, Right};
use std::fs::{self, File};
use std::io::{stdin, stdout, BufReader, BufWriter, Read, Write};

use ordertools::de::{self, RecordFormat};
use ordertools::ser;

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

#[derive(Debug, FromArgs, Clone)]
/// Encode time tags stored as tab-separated (channel, time) values to
/// binary tag records. Note: on Windows -o must be specified as the
/// encoded data is not valid UTF-8 and thus cannot be written to stdout.
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// write the legacy 16-byte dump records instead of stream records
    #[argh(switch)]
    pub dump: bool,
    /// file to write output to (writes to standard output by default)
    #[argh(option, short = 'o')]
    pub out: Option<String>,
    /// with no input or when input is '-', read from standard input
    #[argh(positional)]
    pub input: Vec<String>,
}

fn encode(rdr: impl Read, wtr: &mut impl Write, format: RecordFormat) -> Result<()> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_reader(rdr);
    let tags = de::tsv(&mut rdr)?;
    ser::records(wtr, &tags, format)?;
    Ok(())
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
    let mut wtr: Box<dyn Write> = match args.out {
        None => Box::new(stdout.lock()),
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
    };

    for i in inputs {
        match i {
            Left(()) => encode(stdin().lock(), &mut wtr, format)?,
            Right(path) => encode(BufReader::new(File::open(path)?), &mut wtr, format)?,
        }
    }
    wtr.flush()?;
    Ok(())
}
