pub mod backend;
pub mod controller;
pub mod timer;

use argh::FromArgs;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::path::{Path, PathBuf};

use ordertools::{ChannelId, Tag};

#[derive(Debug, FromArgs, Clone)]
/// Live coincidence-order measurement, fed by a replayed tag file or by a
/// built-in test signal
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// run file declaring the counter (the record is saved next to it)
    #[argh(option, short = 'c')]
    pub config: Option<String>,
    /// channel to monitor when no run file is given, repeat for every channel
    #[argh(option)]
    pub channel: Vec<ChannelId>,
    /// coincidence window in tagger time units when no run file is given
    #[argh(option, default = "1000")]
    pub binwidth: i64,
    /// trigger channel when no run file is given
    #[argh(option, short = 't')]
    pub trigger: Option<ChannelId>,
    /// replay this tag record file instead of the test signal
    #[argh(option, short = 'r')]
    pub replay: Option<String>,
    /// tick rate of the test signal and the snapshot log, in ms
    #[argh(option, default = "250")]
    pub tick_rate: u64,
    /// mean test signal events per tick
    #[argh(option, default = "10000")]
    pub rate: usize,
    /// stop after this many seconds, overriding the run limit
    #[argh(option, short = 's')]
    pub seconds: Option<u64>,
}

/// Messages from the backend thread to the controller
pub enum Event {
    Chunk(Vec<Tag>),
    /// The backend has no more data
    Done,
}

/// Path of the run record saved next to `cfg_path`, named after the run
/// file stem and the start time with millisecond resolution
pub fn record_path<Tz>(cfg_path: &Path, timestamp: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut rcd_name = cfg_path
        .file_stem()
        .unwrap_or_else(|| std::ffi::OsStr::new("run"))
        .to_string_lossy()
        .to_string();
    rcd_name.push('_');
    rcd_name.push_str(&timestamp.format("%F_%H-%M-%S%.3f").to_string());
    rcd_name.push_str(".json");
    cfg_path.with_file_name(rcd_name)
}
