//! Free-running and trigger-gated coincidence counters

use serde::{Deserialize, Serialize};

use crate::chan::ChannelMap;
use crate::hist::{Histogram, Mode};
use crate::window::{FreeRunning, Gate, Gated};
use crate::{ChannelId, Error, Tag, FLUSH_WINDOWS, MAX_PATTERN_CHANNELS};

/// Parameters shared by both counter flavors
///
/// # Parameters
///    - channels: Channel numbers to monitor, in register order
///    - binwidth: Coincidence window length in timestamp units
///    - trigger: If set, only this channel opens windows
///    - mode: Resolve closures into coincidence orders or exact patterns
///    - synthetic_start: Open a virtual trigger window at time 0 on start
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub channels: Vec<ChannelId>,
    pub binwidth: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<ChannelId>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub synthetic_start: bool,
}

impl Params {
    /// Free-running order histogram over `channels`
    pub fn new(channels: &[ChannelId], binwidth: i64) -> Self {
        Params {
            channels: channels.to_vec(),
            binwidth,
            trigger: None,
            mode: Mode::Order,
            synthetic_start: false,
        }
    }

    fn channel_map(&self) -> Result<ChannelMap, Error> {
        if self.binwidth <= 0 {
            return Err(Error::InvalidBinwidth(self.binwidth));
        }
        let map = ChannelMap::new(&self.channels)?;
        if self.mode == Mode::Pattern && map.len() > MAX_PATTERN_CHANNELS {
            return Err(Error::PatternTooWide(map.len(), MAX_PATTERN_CHANNELS));
        }
        Ok(map)
    }
}

/// Bookkeeping of a counter since it was last cleared.
///
/// `closures + outside` always equals the histogram total.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Detector events seen, monitored or not
    pub events: u64,
    /// Detector events on channels that are not monitored
    pub unmonitored: u64,
    /// Tagger markers (overflows, errors, missed events)
    pub skipped: u64,
    /// Window closures recorded in the histogram
    pub closures: u64,
    /// Trigger-gated events after their window closed
    pub outside: u64,
    /// Timestamp of the last detector event
    pub last_time: Option<i64>,
}

impl Stats {
    /// Timestamp of the stop-flush tag
    fn flush_time(&self, binwidth: i64) -> i64 {
        self.last_time
            .unwrap_or(0)
            .saturating_add(FLUSH_WINDOWS.saturating_mul(binwidth))
    }
}

/// The processing interface driven by a `meas::Measurement`
pub trait Counter {
    fn channels(&self) -> &[ChannelId];
    /// Bucket labels of the histogram
    fn index(&self) -> Vec<usize>;
    /// Called on every transition into the running phase
    fn start(&mut self);
    fn process(&mut self, tags: &[Tag]);
    /// Close any window still open by processing a virtual tag well after
    /// the last seen event
    fn flush(&mut self);
    fn clear(&mut self);
    fn histogram(&self) -> &Histogram;
    fn stats(&self) -> &Stats;
}

/// Skip markers and unmonitored channels, returning the register index
#[inline(always)]
fn admit(map: &ChannelMap, stats: &mut Stats, tag: &Tag) -> Option<usize> {
    if !tag.is_event() {
        stats.skipped += 1;
        return None;
    }
    debug_assert!(
        stats.last_time.map_or(true, |t| t <= tag.time),
        "tag at {} arrived after {:?}",
        tag.time,
        stats.last_time,
    );
    stats.last_time = Some(tag.time);
    stats.events += 1;
    let idx = map.index_of(tag.channel);
    if idx.is_none() {
        stats.unmonitored += 1;
    }
    idx
}

/// Every monitored channel opens its own window; a closing window reports
/// the channels that fired within it.
#[derive(Clone, Debug)]
pub struct FreeRunningCounter {
    map: ChannelMap,
    tracker: FreeRunning,
    mode: Mode,
    hist: Histogram,
    stats: Stats,
}

impl FreeRunningCounter {
    pub fn new(params: &Params) -> Result<Self, Error> {
        let map = params.channel_map()?;
        let n = map.len();
        Ok(FreeRunningCounter {
            map,
            tracker: FreeRunning::new(n, params.binwidth),
            mode: params.mode,
            hist: Histogram::new(params.mode.bins(n)),
            stats: Stats::default(),
        })
    }

    #[inline(always)]
    fn step(&mut self, idx: usize, time: i64) {
        if let Some(mask) = self.tracker.advance(idx, time) {
            let bucket = self.mode.bucket(mask);
            if bucket > 0 {
                self.hist.increment(bucket);
                self.stats.closures += 1;
            }
        }
    }
}

impl Counter for FreeRunningCounter {
    fn channels(&self) -> &[ChannelId] {
        self.map.channels()
    }

    fn index(&self) -> Vec<usize> {
        self.mode.index(self.map.len())
    }

    fn start(&mut self) {}

    fn process(&mut self, tags: &[Tag]) {
        for tag in tags {
            if let Some(idx) = admit(&self.map, &mut self.stats, tag) {
                self.step(idx, tag.time);
            }
        }
    }

    fn flush(&mut self) {
        // The flush tag goes to the first configured channel
        let time = self.stats.flush_time(self.tracker.binwidth());
        self.step(0, time);
        self.tracker.discard(0);
    }

    fn clear(&mut self) {
        self.tracker.clear();
        self.hist.clear();
        self.stats = Stats::default();
    }

    fn histogram(&self) -> &Histogram {
        &self.hist
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

/// Only the trigger channel opens (and reopens) the shared window. Other
/// channels mark the open window, or land in bucket 0 when they fire after
/// it closed.
#[derive(Clone, Debug)]
pub struct TriggeredCounter {
    map: ChannelMap,
    tracker: Gated,
    mode: Mode,
    hist: Histogram,
    stats: Stats,
    synthetic_start: bool,
    started: bool,
    /// The open window was opened by the synthetic start tag
    synthetic_open: bool,
}

impl TriggeredCounter {
    pub fn new(params: &Params, trigger: ChannelId) -> Result<Self, Error> {
        let map = params.channel_map()?;
        let trigger_idx = map
            .index_of(trigger)
            .ok_or(Error::UnknownTrigger(trigger))?;
        let n = map.len();
        Ok(TriggeredCounter {
            map,
            tracker: Gated::new(trigger_idx, params.binwidth),
            mode: params.mode,
            hist: Histogram::new(params.mode.bins(n)),
            stats: Stats::default(),
            synthetic_start: params.synthetic_start,
            started: false,
            synthetic_open: false,
        })
    }

    pub fn trigger(&self) -> ChannelId {
        self.map.channels()[self.tracker.trigger()]
    }

    #[inline(always)]
    fn step(&mut self, idx: usize, time: i64) {
        match self.tracker.advance(idx, time) {
            Gate::Closed(mask) => {
                // A synthetic window holding only the trigger is no coincidence
                let synthetic = std::mem::replace(&mut self.synthetic_open, false);
                if synthetic && mask == 1 << self.tracker.trigger() {
                    return;
                }
                self.hist.increment(self.mode.bucket(mask));
                self.stats.closures += 1;
            }
            Gate::Outside => {
                self.hist.increment(0);
                self.stats.outside += 1;
            }
            Gate::Opened | Gate::Inside | Gate::Idle => {}
        }
    }
}

impl Counter for TriggeredCounter {
    fn channels(&self) -> &[ChannelId] {
        self.map.channels()
    }

    fn index(&self) -> Vec<usize> {
        self.mode.index(self.map.len())
    }

    fn start(&mut self) {
        if self.synthetic_start && !self.started {
            let trigger = self.tracker.trigger();
            self.step(trigger, 0);
            self.synthetic_open = true;
        }
        self.started = true;
    }

    fn process(&mut self, tags: &[Tag]) {
        for tag in tags {
            if let Some(idx) = admit(&self.map, &mut self.stats, tag) {
                self.step(idx, tag.time);
            }
        }
    }

    fn flush(&mut self) {
        let time = self.stats.flush_time(self.tracker.binwidth());
        let trigger = self.tracker.trigger();
        self.step(trigger, time);
        self.tracker.discard();
        self.synthetic_open = false;
    }

    fn clear(&mut self) {
        self.tracker.clear();
        self.hist.clear();
        self.stats = Stats::default();
        self.started = false;
        self.synthetic_open = false;
    }

    fn histogram(&self) -> &Histogram {
        &self.hist
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

/// Either counter flavor, chosen by `Params::trigger`
#[derive(Clone, Debug)]
pub enum Engine {
    FreeRunning(FreeRunningCounter),
    Triggered(TriggeredCounter),
}

impl Engine {
    pub fn new(params: &Params) -> Result<Self, Error> {
        Ok(match params.trigger {
            Some(trigger) => Engine::Triggered(TriggeredCounter::new(params, trigger)?),
            None => Engine::FreeRunning(FreeRunningCounter::new(params)?),
        })
    }
}

macro_rules! dispatch {
    ($self:ident, $c:ident => $e:expr) => {
        match $self {
            Engine::FreeRunning($c) => $e,
            Engine::Triggered($c) => $e,
        }
    };
}

impl Counter for Engine {
    fn channels(&self) -> &[ChannelId] {
        dispatch!(self, c => c.channels())
    }

    fn index(&self) -> Vec<usize> {
        dispatch!(self, c => c.index())
    }

    fn start(&mut self) {
        dispatch!(self, c => c.start())
    }

    #[inline]
    fn process(&mut self, tags: &[Tag]) {
        dispatch!(self, c => c.process(tags))
    }

    fn flush(&mut self) {
        dispatch!(self, c => c.flush())
    }

    fn clear(&mut self) {
        dispatch!(self, c => c.clear())
    }

    fn histogram(&self) -> &Histogram {
        dispatch!(self, c => c.histogram())
    }

    fn stats(&self) -> &Stats {
        dispatch!(self, c => c.stats())
    }
}

/// Build a histogram in a single batch pass over chunks of tags, flushing
/// the windows left open at the end of the data.
pub fn histogram<I>(chunks: I, params: &Params) -> Result<Vec<u64>, Error>
where
    I: IntoIterator<Item = Result<Vec<Tag>, Error>>,
{
    let mut engine = Engine::new(params)?;
    engine.start();
    for chunk in chunks {
        engine.process(&chunk?);
    }
    engine.flush();
    Ok(engine.histogram().counts().to_vec())
}
