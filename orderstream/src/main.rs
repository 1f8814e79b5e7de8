use anyhow::{bail, Result};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{stdout, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use ordertools::cfg::{Run, RunRecord};
use ordertools::counter::{Engine, Params};
use ordertools::de;
use ordertools::meas::Measurement;

use orderstream::backend::{self, Replay, TestSignal};
use orderstream::{controller, timer, CliArgs};

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

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

    tracing_subscriber::fmt::init();

    let (mut run, cfg_path) = match &args.config {
        Some(p) => {
            let rdr = BufReader::new(File::open(p)?);
            let run: Run = serde_json::from_reader(rdr)?;
            (run, Some(PathBuf::from(p)))
        }
        None => {
            if args.channel.is_empty() {
                bail!("no channels given, use --channel or --config");
            }
            let mut params = Params::new(&args.channel, args.binwidth);
            params.trigger = args.trigger;
            (Run::new(params), None)
        }
    };
    if let Some(s) = args.seconds {
        run.limit = Some(Duration::from_secs(s));
    }
    let tick = Duration::from_millis(args.tick_rate);

    let meas = Arc::new(Measurement::new(Engine::new(&run.params)?));
    let (tx, rx) = flume::bounded(64);
    let backend = match args.replay.map(PathBuf::from).or_else(|| run.input.clone()) {
        Some(path) => {
            info!("replaying {}", path.display());
            let mut b = Replay::new(de::open(&path, run.format)?, run.chunk_size);
            meas.init(&mut b)?;
            meas.start()?;
            backend::spawn(b, tx)
        }
        None => {
            info!("test signal at {} events per tick", args.rate);
            let binwidth = run.params.binwidth;
            let mut b = TestSignal::new(args.rate, binwidth, binwidth / 2, tick);
            meas.init(&mut b)?;
            meas.start()?;
            backend::spawn(b, tx)
        }
    };

    let (shutdown_tx, shutdown_rx) = flume::bounded(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })?;

    let timestamp = Local::now();
    let (stop_tx, stop_rx) = flume::bounded(1);
    let snapshots = timer::main(meas.clone(), tick, stop_rx);

    let chunks = controller::main(&*meas, &rx, &shutdown_rx, run.limit)?;
    drop(rx);
    let _ = stop_tx.send(());
    if snapshots.join().is_err() {
        bail!("snapshot thread panicked");
    }
    match backend.join() {
        Ok(res) => res?,
        Err(_) => bail!("backend thread panicked"),
    }
    info!("processed {} chunks", chunks);

    run.timestamp = Some(timestamp);
    let (counts, stats) = meas.snapshot_with_stats();
    let record = RunRecord {
        index: meas.index().to_vec(),
        counts,
        stats,
        run,
    };
    let json_record = serde_json::to_string_pretty(&record)?;

    match cfg_path {
        Some(cfg_path) => {
            let rcd_path = orderstream::record_path(&cfg_path, &timestamp);
            let f = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&rcd_path)?;
            let mut wtr = BufWriter::new(f);
            wtr.write_all(json_record.as_bytes())?;
            wtr.flush()?;
            info!("saved {}", rcd_path.display());
        }
        None => {
            let stdout = stdout();
            let mut stdout = stdout.lock();
            writeln!(stdout, "{}", json_record)?;
        }
    }

    Ok(())
}
