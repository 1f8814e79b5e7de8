//! Tag sources in the style of the tagger's file reader
//!
//! A `ChunkSource` hands out column-oriented blocks of tags on request,
//! `Chunks` turns it into the chunk iterator consumed by the counters.

use itertools::izip;
use std::io::BufRead;

use crate::de::TagReader;
use crate::{ChannelId, Error, Tag, TagKind};

/// One block of tags, stored column by column
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagBlock {
    pub overflows: Vec<u32>,
    pub timestamps: Vec<i64>,
    pub channels: Vec<ChannelId>,
}

impl TagBlock {
    pub fn size(&self) -> usize {
        self.timestamps.len()
    }

    pub fn get_overflows(&self) -> &[u32] {
        &self.overflows
    }

    pub fn get_timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn get_channels(&self) -> &[ChannelId] {
        &self.channels
    }

    /// Rows of the block as tags; a nonzero overflow marks a non-event
    pub fn to_tags(&self) -> Vec<Tag> {
        izip!(&self.overflows, &self.timestamps, &self.channels)
            .map(|(&overflow, &time, &channel)| Tag {
                time,
                channel,
                kind: if overflow > 0 {
                    TagKind::OverflowBegin
                } else {
                    TagKind::TimeTag
                },
            })
            .collect()
    }
}

impl From<&[Tag]> for TagBlock {
    fn from(tags: &[Tag]) -> Self {
        TagBlock {
            overflows: tags.iter().map(|t| (!t.is_event()) as u32).collect(),
            timestamps: tags.iter().map(|t| t.time).collect(),
            channels: tags.iter().map(|t| t.channel).collect(),
        }
    }
}

pub trait ChunkSource {
    fn has_data(&mut self) -> bool;
    /// Up to `n` tags; fewer at the end of the data
    fn get_data(&mut self, n: usize) -> Result<TagBlock, Error>;
}

impl<R: BufRead> ChunkSource for TagReader<R> {
    fn has_data(&mut self) -> bool {
        TagReader::has_data(self)
    }

    fn get_data(&mut self, n: usize) -> Result<TagBlock, Error> {
        Ok(TagBlock::from(&self.read_chunk(n)?[..]))
    }
}

/// Iterate a `ChunkSource` in chunks of `chunk_size` tags
pub struct Chunks<S: ChunkSource> {
    source: S,
    chunk_size: usize,
    failed: bool,
}

impl<S: ChunkSource> Chunks<S> {
    pub fn new(source: S, chunk_size: usize) -> Self {
        Chunks {
            source,
            chunk_size: chunk_size.max(1),
            failed: false,
        }
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: ChunkSource> Iterator for Chunks<S> {
    type Item = Result<Vec<Tag>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.source.has_data() {
            return None;
        }
        match self.source.get_data(self.chunk_size) {
            Ok(block) if block.size() == 0 => None,
            Ok(block) => Some(Ok(block.to_tags())),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
