//! Deserialization of time tags from binary record files and `.tsv`

use anyhow::Context;
use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use zstd::stream;

use crate::meas::Subscriber;
use crate::{ChannelId, Error, Tag, TagKind};

const MAX_RECORD_SIZE: usize = 20;
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Fixed-layout little-endian tag records, packed without padding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// `{overflow: u32, channel: i32, time: i64}`, from the legacy dump
    Dump,
    /// `{type: u32, overflow: u32, channel: i32, time: i64}`, as streamed live
    Stream,
}

impl Default for RecordFormat {
    fn default() -> Self {
        RecordFormat::Stream
    }
}

impl RecordFormat {
    pub fn record_size(self) -> usize {
        match self {
            RecordFormat::Dump => 16,
            RecordFormat::Stream => 20,
        }
    }

    /// Decode one record; `raw` must be exactly `record_size()` bytes
    #[inline]
    pub fn decode(self, raw: &[u8]) -> Tag {
        match self {
            RecordFormat::Dump => {
                let overflow = LittleEndian::read_u32(&raw[0..4]);
                Tag {
                    channel: LittleEndian::read_i32(&raw[4..8]) as ChannelId,
                    time: LittleEndian::read_i64(&raw[8..16]),
                    kind: if overflow > 0 {
                        TagKind::OverflowBegin
                    } else {
                        TagKind::TimeTag
                    },
                }
            }
            RecordFormat::Stream => Tag {
                kind: TagKind::from_raw(LittleEndian::read_u32(&raw[0..4])),
                channel: LittleEndian::read_i32(&raw[8..12]) as ChannelId,
                time: LittleEndian::read_i64(&raw[12..20]),
            },
        }
    }
}

/// Sequential reader of binary tag records, yielding chunks of tags.
///
/// A trailing partial record is reported as `Error::TruncatedRecord`; after
/// any error the iterator is exhausted.
pub struct TagReader<R: BufRead> {
    rdr: R,
    format: RecordFormat,
    chunk_size: usize,
    records: u64,
    failed: bool,
}

impl<R: BufRead> TagReader<R> {
    pub fn new(rdr: R, format: RecordFormat) -> Self {
        TagReader {
            rdr,
            format,
            chunk_size: DEFAULT_CHUNK_SIZE,
            records: 0,
            failed: false,
        }
    }

    /// Number of records per chunk when used as an iterator
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    /// Records decoded so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// True unless the underlying reader is exhausted. A read error counts
    /// as data, so that the next read reports it.
    pub fn has_data(&mut self) -> bool {
        if self.failed {
            return false;
        }
        match self.rdr.fill_buf() {
            Ok(buf) => !buf.is_empty(),
            Err(_) => true,
        }
    }

    fn read_record(&mut self) -> Result<Option<Tag>, Error> {
        let size = self.format.record_size();
        let mut raw = [0u8; MAX_RECORD_SIZE];
        let mut filled = 0;
        while filled < size {
            match self.rdr.read(&mut raw[filled..size]) {
                Ok(0) => break,
                Ok(k) => filled += k,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        match filled {
            0 => Ok(None),
            k if k < size => Err(Error::TruncatedRecord(k)),
            _ => {
                self.records += 1;
                Ok(Some(self.format.decode(&raw[..size])))
            }
        }
    }

    /// Read up to `n` tags; an empty chunk means the end of the data
    pub fn read_chunk(&mut self, n: usize) -> Result<Vec<Tag>, Error> {
        let mut tags = Vec::with_capacity(n);
        while tags.len() < n {
            match self.read_record() {
                Ok(Some(tag)) => tags.push(tag),
                Ok(None) => break,
                Err(e) => {
                    self.failed = true;
                    return Err(e);
                }
            }
        }
        Ok(tags)
    }
}

impl<R: BufRead> Iterator for TagReader<R> {
    type Item = Result<Vec<Tag>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.read_chunk(self.chunk_size) {
            Ok(tags) if tags.is_empty() => None,
            res => Some(res),
        }
    }
}

/// Files always carry every channel
impl<R: BufRead> Subscriber for TagReader<R> {
    fn register_channel(&mut self, _channel: ChannelId) {}
}

/// Reader type behind files opened with `open`
pub type BoxedRead = Box<dyn BufRead + Send>;

/// Open a record file, decompressing it on the fly if it ends in `.zst`
pub fn open(path: impl AsRef<Path>, format: RecordFormat) -> Result<TagReader<BoxedRead>, Error> {
    let path = path.as_ref();
    let f = File::open(path)?;
    let rdr: BoxedRead = match path.extension() {
        Some(ext) if ext == "zst" => Box::new(BufReader::new(stream::read::Decoder::new(f)?)),
        _ => Box::new(BufReader::new(f)),
    };
    Ok(TagReader::new(rdr, format))
}

/// Deserialize all records from a reader at once
pub fn records(rdr: impl Read, format: RecordFormat) -> Result<Vec<Tag>, Error> {
    let mut tags = Vec::new();
    for chunk in TagReader::new(BufReader::new(rdr), format) {
        tags.extend(chunk?);
    }
    Ok(tags)
}

/// Deserialize detector events from tab-separated values (channel, time).
pub fn tsv(rdr: &mut csv::Reader<impl Read>) -> anyhow::Result<Vec<Tag>> {
    let mut tags: Vec<Tag> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let channel = record.get(0).context("missing channel column")?;
        let time = record.get(1).context("missing time column")?;
        tags.push(Tag::event(channel.parse::<ChannelId>()?, time.parse::<i64>()?));
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_stream_record() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&2u32.to_le_bytes());
        raw.extend_from_slice(&7u32.to_le_bytes());
        raw.extend_from_slice(&(-3i32).to_le_bytes());
        raw.extend_from_slice(&123_456_789_012i64.to_le_bytes());
        let tag = RecordFormat::Stream.decode(&raw);
        assert_eq!(tag, Tag { time: 123_456_789_012, channel: -3, kind: TagKind::OverflowBegin });
    }

    #[test]
    fn decode_dump_record() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&0u32.to_le_bytes());
        raw.extend_from_slice(&4i32.to_le_bytes());
        raw.extend_from_slice(&99i64.to_le_bytes());
        assert_eq!(RecordFormat::Dump.decode(&raw), Tag::event(4, 99));
        raw[0] = 1;
        assert!(!RecordFormat::Dump.decode(&raw).is_event());
    }

    #[test]
    fn truncated_record() {
        let raw = vec![0u8; 16 + 5];
        let mut rdr = TagReader::new(&raw[..], RecordFormat::Dump);
        assert!(rdr.has_data());
        assert!(matches!(rdr.next(), Some(Err(Error::TruncatedRecord(5)))));
        assert!(rdr.next().is_none());
        assert!(!rdr.has_data());
    }

    #[test]
    fn tsv_tags() {
        let data = "1\t100\n3\t250\n";
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b'\t')
            .from_reader(data.as_bytes());
        let tags = tsv(&mut rdr).unwrap();
        assert_eq!(tags, vec![Tag::event(1, 100), Tag::event(3, 250)]);
    }

    #[test]
    fn tsv_missing_time_column() {
        let data = "1\n3\n";
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b'\t')
            .from_reader(data.as_bytes());
        let err = tsv(&mut rdr).unwrap_err();
        assert_eq!(err.to_string(), "missing time column");
    }
}
