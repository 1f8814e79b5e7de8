//! Tag backends: a replayed record file or a pseudo-random test signal

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::BufRead;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

use ordertools::de::TagReader;
use ordertools::meas::Subscriber;
use ordertools::{ChannelId, Tag};

use crate::Event;

pub trait Backend: Subscriber + Send + 'static {
    /// Next chunk of tags, `None` once the backend is exhausted
    fn read_tags(&mut self) -> Result<Option<Vec<Tag>>>;
}

/// Replays a record file as fast as the controller consumes it
pub struct Replay<R: BufRead> {
    rdr: TagReader<R>,
    chunk_size: usize,
}

impl<R: BufRead> Replay<R> {
    pub fn new(rdr: TagReader<R>, chunk_size: usize) -> Self {
        Replay { rdr, chunk_size }
    }
}

impl<R: BufRead> Subscriber for Replay<R> {
    fn register_channel(&mut self, channel: ChannelId) {
        self.rdr.register_channel(channel)
    }
}

impl<R: BufRead + Send + 'static> Backend for Replay<R> {
    fn read_tags(&mut self) -> Result<Option<Vec<Tag>>> {
        let tags = self.rdr.read_chunk(self.chunk_size)?;
        Ok(if tags.is_empty() { None } else { Some(tags) })
    }
}

/// Uncorrelated clicks on the subscribed channels, paced by the tick rate.
/// A third of the clicks are followed by a partner click on another channel
/// within `spread` time units, so that higher orders show up.
pub struct TestSignal {
    channels: Vec<ChannelId>,
    rng: StdRng,
    time: i64,
    rate: usize,
    spacing: i64,
    spread: i64,
    tick: Duration,
}

impl TestSignal {
    pub fn new(rate: usize, spacing: i64, spread: i64, tick: Duration) -> Self {
        TestSignal {
            channels: Vec::new(),
            rng: StdRng::from_entropy(),
            time: 0,
            rate,
            spacing: spacing.max(1),
            spread: spread.max(1),
            tick,
        }
    }
}

impl Subscriber for TestSignal {
    fn register_channel(&mut self, channel: ChannelId) {
        self.channels.push(channel);
    }
}

impl Backend for TestSignal {
    fn read_tags(&mut self) -> Result<Option<Vec<Tag>>> {
        thread::sleep(self.tick);
        if self.channels.is_empty() {
            return Ok(Some(Vec::new()));
        }
        let mut tags = Vec::with_capacity(self.rate * 4 / 3);
        for _ in 0..self.rate {
            self.time += self.rng.gen_range(1..=2 * self.spacing);
            let a = self.rng.gen_range(0..self.channels.len());
            tags.push(Tag::event(self.channels[a], self.time));
            if self.channels.len() > 1 && self.rng.gen_ratio(1, 3) {
                let b = (a + self.rng.gen_range(1..self.channels.len())) % self.channels.len();
                self.time += self.rng.gen_range(0..self.spread);
                tags.push(Tag::event(self.channels[b], self.time));
            }
        }
        Ok(Some(tags))
    }
}

/// Run `backend` on its own thread, pushing chunks to the controller until
/// the backend is exhausted or the controller hangs up
pub fn spawn(mut backend: impl Backend, tx: flume::Sender<Event>) -> JoinHandle<Result<()>> {
    thread::spawn(move || {
        let mut chunks = 0u64;
        loop {
            match backend.read_tags() {
                Ok(Some(tags)) => {
                    if tx.send(Event::Chunk(tags)).is_err() {
                        debug!("controller hung up after {} chunks", chunks);
                        return Ok(());
                    }
                    chunks += 1;
                }
                Ok(None) => {
                    info!("backend exhausted after {} chunks", chunks);
                    let _ = tx.send(Event::Done);
                    return Ok(());
                }
                Err(e) => {
                    warn!("backend failed: {}", e);
                    let _ = tx.send(Event::Done);
                    return Err(e);
                }
            }
        }
    })
}
