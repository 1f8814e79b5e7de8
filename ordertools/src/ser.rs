//! Serialization of time tags and histograms

use anyhow::Result;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

use crate::de::RecordFormat;
use crate::{Error, Tag};

/// Serialize tags as binary records. Markers written in the dump format
/// only keep the fact that they are not detector events.
pub fn records(wtr: &mut impl Write, tags: &[Tag], format: RecordFormat) -> Result<(), Error> {
    for tag in tags {
        match format {
            RecordFormat::Dump => {
                wtr.write_u32::<LittleEndian>(if tag.is_event() { 0 } else { 1 })?;
            }
            RecordFormat::Stream => {
                wtr.write_u32::<LittleEndian>(tag.kind.to_raw())?;
                wtr.write_u32::<LittleEndian>(0)?;
            }
        }
        wtr.write_i32::<LittleEndian>(tag.channel)?;
        wtr.write_i64::<LittleEndian>(tag.time)?;
    }
    Ok(())
}

/// Serialize tags to tab-separated values (channel, time).
pub fn tsv(wtr: &mut csv::Writer<impl Write>, tags: &[Tag]) -> Result<()> {
    for tag in tags.iter().filter(|t| t.is_event()) {
        wtr.write_record(&[tag.channel.to_string(), tag.time.to_string()])?;
    }
    Ok(())
}

/// Serialize a histogram as tab-separated (label, count) rows
pub fn histogram_tsv(
    wtr: &mut csv::Writer<impl Write>,
    labels: &[String],
    counts: &[u64],
) -> Result<()> {
    for (label, count) in labels.iter().zip(counts) {
        wtr.write_record(&[label.as_str(), count.to_string().as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}
