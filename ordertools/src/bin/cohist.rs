//! `cohist -c 1 -c 3 -c 4 --binwidth 500 mydata.dat`
//!
//! Replay a file of binary tag records through a coincidence counter and
//! print the histogram as tab-separated (bucket, count) rows.

use anyhow::{bail, Result};
use argh::FromArgs;
use either::{Left, Right};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{stdin, stdout, BufReader, Write};

use ordertools::cfg::Run;
use ordertools::counter::{Engine, Params};
use ordertools::de::{self, BoxedRead, RecordFormat, TagReader};
use ordertools::hist::Mode;
use ordertools::meas::Measurement;
use ordertools::source::Chunks;
use ordertools::{bit, ChannelId};

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

#[derive(Debug, FromArgs, Clone)]
/// Count the coincidence-order (or coincidence-pattern) histogram of a
/// tag record file. With no input or when input is '-', read from
/// standard input.
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// run file declaring the counter; overrides the counter flags
    #[argh(option)]
    pub config: Option<String>,
    /// channel to monitor, repeat for every channel
    #[argh(option, short = 'c')]
    pub channel: Vec<ChannelId>,
    /// coincidence window in tagger time units
    #[argh(option, default = "1000")]
    pub binwidth: i64,
    /// trigger channel, for trigger-gated counting
    #[argh(option, short = 't')]
    pub trigger: Option<ChannelId>,
    /// histogram exact channel patterns instead of coincidence orders
    #[argh(switch, short = 'p')]
    pub pattern: bool,
    /// open a virtual trigger window at time 0
    #[argh(switch)]
    pub synthetic_start: bool,
    /// input uses the legacy 16-byte dump records
    #[argh(switch)]
    pub dump: bool,
    /// records read per chunk
    #[argh(option, default = "1024")]
    pub chunk_size: usize,
    /// tag record file
    #[argh(positional)]
    pub input: Option<String>,
}

/// Byte progress: a bar when the input length is known, otherwise a
/// spinner that ticks on its own
fn progress(len: Option<u64>) -> ProgressBar {
    match len {
        Some(len) => {
            let pb = ProgressBar::new(len);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{bar:40} {bytes}/{total_bytes} ({eta})"),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(ProgressStyle::default_spinner().template("{spinner} {bytes} read"));
            pb.enable_steady_tick(100);
            pb
        }
    }
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

    let run = match &args.config {
        Some(path) => {
            let rdr = BufReader::new(File::open(path)?);
            let run: Run = serde_json::from_reader(rdr)?;
            run
        }
        None => {
            if args.channel.is_empty() {
                bail!("no channels given, use -c or --config");
            }
            let mut run = Run::new(Params {
                channels: args.channel.clone(),
                binwidth: args.binwidth,
                trigger: args.trigger,
                mode: if args.pattern { Mode::Pattern } else { Mode::Order },
                synthetic_start: args.synthetic_start,
            });
            run.format = if args.dump { RecordFormat::Dump } else { RecordFormat::Stream };
            run.chunk_size = args.chunk_size;
            run
        }
    };

    let input = match args.input.as_deref().or(run.input.as_ref().and_then(|p| p.to_str())) {
        None | Some("-") => Left(()),
        Some(path) => match fs::metadata(path) {
            Ok(m) if m.is_file() => Right((path.to_string(), m.len())),
            Ok(_) => bail!("{} is not a file", path),
            Err(e) => bail!(e),
        },
    };

    let (mut reader, pb): (TagReader<BoxedRead>, ProgressBar) = match input {
        Left(()) => (
            TagReader::new(Box::new(BufReader::new(stdin())), run.format),
            progress(None),
        ),
        Right((path, len)) => (de::open(&path, run.format)?, progress(Some(len))),
    };

    let meas = Measurement::new(Engine::new(&run.params)?);
    meas.init(&mut reader)?;
    meas.start()?;
    let record_size = run.format.record_size() as u64;
    for chunk in Chunks::new(reader, run.chunk_size) {
        let chunk = chunk?;
        if let (Some(first), Some(last)) = (chunk.first(), chunk.last()) {
            meas.feed(&chunk, first.time, last.time)?;
        }
        pb.inc(chunk.len() as u64 * record_size);
    }
    meas.stop()?;
    pb.finish_and_clear();

    let n = run.params.channels.len();
    let labels: Vec<String> = match run.params.mode {
        Mode::Order => meas.index().iter().map(|i| i.to_string()).collect(),
        Mode::Pattern => bit::pattern_labels(n),
    };

    let stdout = stdout();
    let stdout = stdout.lock();
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_writer(stdout);
    ordertools::ser::histogram_tsv(&mut wtr, &labels, &meas.snapshot())?;
    Ok(())
}
