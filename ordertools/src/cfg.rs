//! Configuration tools: formats for declaring and recording runs

use chrono::{offset::Local, DateTime};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::counter::{Params, Stats};
use crate::de::{RecordFormat, DEFAULT_CHUNK_SIZE};

/// Run specification for both declaring and recording runs in JSON files.
///
/// ## Declaring a run
///
/// Only `params` is required. It names the monitored channels, the window
/// width in tagger time units, and optionally a trigger channel (which
/// selects the trigger-gated counter) and the histogram mode:
///
/// ```json
/// {
///     "name": "three detectors",
///     "params": { "channels": [1, 3, 4], "binwidth": 500, "mode": "pattern" },
///     "limit": "10s"
/// }
/// ```
///
/// `limit` is parsed as in [humantime](https://docs.rs/humantime/), e.g.
/// `15days 2min 2s`, and bounds live runs. `input` and `format` describe the
/// tag file used for replay.
///
/// ## Recording a run
///
/// A finished run is written as a `RunRecord`: the declaration with its
/// `timestamp` filled in, plus the histogram and counter statistics.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Run {
    #[serde(default)]
    pub name:           String,
    pub timestamp:      Option<DateTime<Local>>,
    pub params:         Params,
    #[serde(default)]
    pub format:         RecordFormat,
    #[serde(default = "default_chunk_size")]
    pub chunk_size:     usize,
    pub input:          Option<PathBuf>,
    #[serde(default, with = "humantime_serde")]
    pub limit:          Option<Duration>,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Run {
    pub fn new(params: Params) -> Self {
        Run {
            name:       String::new(),
            timestamp:  None,
            params,
            format:     RecordFormat::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            input:      None,
            limit:      None,
        }
    }
}

/// Result of a run, with the histogram as (label, count) columns
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RunRecord {
    pub run:        Run,
    pub index:      Vec<usize>,
    pub counts:     Vec<u64>,
    pub stats:      Stats,
}
