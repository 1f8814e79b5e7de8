//! Streaming coincidence-order counting for time tag data.
//!
//! Tags arrive in chronological order, either pushed in chunks by a live
//! backend or replayed from a file, and every window closure is resolved into
//! a histogram bucket: the number of distinct channels that co-fired (order
//! histogram) or the exact channel pattern (pattern histogram).

pub mod bit;
pub mod cfg;
pub mod chan;
pub mod counter;
pub mod de;
pub mod error;
pub mod hist;
pub mod meas;
pub mod ser;
pub mod source;
pub mod window;

pub use error::Error;

/// External channel number, as reported by the tagger
pub type ChannelId = i32;

/// The basic representation of a tagged event
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub struct Tag {
    /// Counter in time units from arbitrary offset
    pub time: i64,
    /// Channel of the event
    pub channel: ChannelId,
    /// Detector event or tagger-internal marker
    pub kind: TagKind,
}

/// Record types emitted by the tagger. Only `TimeTag` is a detector click.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub enum TagKind {
    TimeTag,
    Error,
    OverflowBegin,
    OverflowEnd,
    MissedEvents,
}

impl TagKind {
    /// Decode the raw `type` field of a stream record
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => TagKind::TimeTag,
            2 => TagKind::OverflowBegin,
            3 => TagKind::OverflowEnd,
            4 => TagKind::MissedEvents,
            _ => TagKind::Error,
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            TagKind::TimeTag => 0,
            TagKind::Error => 1,
            TagKind::OverflowBegin => 2,
            TagKind::OverflowEnd => 3,
            TagKind::MissedEvents => 4,
        }
    }
}

impl Tag {
    /// A detector click on `channel` at `time`
    #[inline]
    pub fn event(channel: ChannelId, time: i64) -> Self {
        Tag { time, channel, kind: TagKind::TimeTag }
    }

    #[inline]
    pub fn is_event(&self) -> bool {
        self.kind == TagKind::TimeTag
    }
}

/// Coincidence registers are 32-bit masks, one bit per monitored channel
pub const MAX_CHANNELS: usize = 32;
/// Pattern histograms hold `2^n` counters
pub const MAX_PATTERN_CHANNELS: usize = 24;
/// Distance of the stop-flush tag past the last seen tag, in binwidths
pub const FLUSH_WINDOWS: i64 = 10;
