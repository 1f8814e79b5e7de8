//! Mapping from external channel numbers to dense register indices

use std::collections::HashMap;

use crate::{ChannelId, Error, MAX_CHANNELS};

/// Largest channel-number span served by the direct lookup table
const MAX_TABLE_SPAN: i64 = 4096;
const NO_INDEX: u8 = u8::MAX;

#[derive(Clone, Debug)]
enum Lookup {
    /// `slots[ch - offset]` holds the index, or `NO_INDEX`
    Table { offset: ChannelId, slots: Vec<u8> },
    Hash(HashMap<ChannelId, u8>),
}

/// Bijection between the configured channels, e.g. `[1, 3, 4]`, and the
/// register indices `0..n` in configuration order.
#[derive(Clone, Debug)]
pub struct ChannelMap {
    channels: Vec<ChannelId>,
    lookup: Lookup,
}

impl ChannelMap {
    pub fn new(channels: &[ChannelId]) -> Result<Self, Error> {
        if channels.is_empty() {
            return Err(Error::NoChannels);
        }
        if channels.len() > MAX_CHANNELS {
            return Err(Error::TooManyChannels(channels.len(), MAX_CHANNELS));
        }
        for (i, ch) in channels.iter().enumerate() {
            if channels[..i].contains(ch) {
                return Err(Error::DuplicateChannel(*ch));
            }
        }

        let min = *channels.iter().min().unwrap_or(&0);
        let max = *channels.iter().max().unwrap_or(&0);
        let span = max as i64 - min as i64 + 1;
        let lookup = if span <= MAX_TABLE_SPAN {
            let mut slots = vec![NO_INDEX; span as usize];
            for (i, &ch) in channels.iter().enumerate() {
                slots[(ch - min) as usize] = i as u8;
            }
            Lookup::Table { offset: min, slots }
        } else {
            Lookup::Hash(
                channels
                    .iter()
                    .enumerate()
                    .map(|(i, &ch)| (ch, i as u8))
                    .collect(),
            )
        };

        Ok(ChannelMap {
            channels: channels.to_vec(),
            lookup,
        })
    }

    /// Register index of `ch`, or `None` if the channel is not monitored
    #[inline(always)]
    pub fn index_of(&self, ch: ChannelId) -> Option<usize> {
        match &self.lookup {
            Lookup::Table { offset, slots } => {
                let slot = (ch as i64 - *offset as i64) as usize;
                match slots.get(slot) {
                    Some(&i) if i != NO_INDEX => Some(i as usize),
                    _ => None,
                }
            }
            Lookup::Hash(hm) => hm.get(&ch).map(|&i| i as usize),
        }
    }

    pub fn channel_of(&self, idx: usize) -> Option<ChannelId> {
        self.channels.get(idx).copied()
    }

    pub fn channels(&self) -> &[ChannelId] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
