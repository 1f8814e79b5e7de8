//! `checkrun myrun.json`
//!
//! Parse `myrun.json` and build the counter it declares. No output and an
//! exit code of 0 indicates success.

use anyhow::{Context, Result};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use ordertools::cfg::Run;
use ordertools::counter::Engine;

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: checkrun <run.json>")?;
    let rdr = BufReader::new(File::open(&path)?);
    let run: Run = serde_json::from_reader(rdr)?;
    Engine::new(&run.params).with_context(|| format!("invalid params in {}", path.display()))?;
    Ok(())
}
