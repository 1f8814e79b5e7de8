use std::io;
use thiserror::Error as ThisError;

use crate::meas::Phase;
use crate::ChannelId;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("No channels configured.")]
    NoChannels,
    #[error("{0} channels configured, at most {1} fit in a coincidence register.")]
    TooManyChannels(usize, usize),
    #[error("Channel {0} is configured twice.")]
    DuplicateChannel(ChannelId),
    #[error("Trigger channel {0} is not one of the configured channels.")]
    UnknownTrigger(ChannelId),
    #[error("Binwidth must be positive, got {0}.")]
    InvalidBinwidth(i64),
    #[error("Pattern histogram over {0} channels is too large, at most {1} are supported.")]
    PatternTooWide(usize, usize),
    #[error("Cannot {0} a measurement in phase {1:?}.")]
    Phase(&'static str, Phase),
    #[error("Trailing {0} bytes do not form a complete record.")]
    TruncatedRecord(usize),
    #[error("IO error.")]
    IOError(#[from] io::Error),
}
