//! Measurement lifecycle: `Created -> Initialized -> Running -> Stopped`
//!
//! A `Measurement` owns one counter behind a mutex. The backend thread feeds
//! chunks while readers take snapshots concurrently; both go through the
//! same lock, so a snapshot never observes a half-processed chunk and never
//! holds the lock longer than a copy of the counters.

use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::counter::{Counter, Stats};
use crate::{ChannelId, Error, Tag};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Created,
    Initialized,
    Running,
    Stopped,
}

/// A source of tags that only transfers the channels it was asked for
pub trait Subscriber {
    fn register_channel(&mut self, channel: ChannelId);
}

struct Inner<C> {
    counter: C,
    phase: Phase,
}

pub struct Measurement<C: Counter> {
    inner: Mutex<Inner<C>>,
    index: Vec<usize>,
}

impl<C: Counter> Measurement<C> {
    pub fn new(counter: C) -> Self {
        let index = counter.index();
        Measurement {
            inner: Mutex::new(Inner {
                counter,
                phase: Phase::Created,
            }),
            index,
        }
    }

    /// Zero all state and subscribe the backend to every monitored channel
    pub fn init(&self, backend: &mut impl Subscriber) -> Result<(), Error> {
        let mut inner = self.inner.lock();
        match inner.phase {
            Phase::Created | Phase::Stopped => {
                inner.counter.clear();
                for &ch in inner.counter.channels() {
                    backend.register_channel(ch);
                }
                inner.phase = Phase::Initialized;
                debug!("subscribed channels {:?}", inner.counter.channels());
                Ok(())
            }
            phase => Err(Error::Phase("initialize", phase)),
        }
    }

    pub fn start(&self) -> Result<(), Error> {
        let mut inner = self.inner.lock();
        match inner.phase {
            Phase::Initialized | Phase::Stopped => {
                inner.counter.start();
                inner.phase = Phase::Running;
                info!("measurement started");
                Ok(())
            }
            phase => Err(Error::Phase("start", phase)),
        }
    }

    /// Process one chunk of tags. The chunk is only borrowed for this call.
    pub fn feed(&self, chunk: &[Tag], begin_time: i64, end_time: i64) -> Result<(), Error> {
        let mut inner = self.inner.lock();
        if inner.phase != Phase::Running {
            return Err(Error::Phase("feed", inner.phase));
        }
        trace!("chunk of {} tags, {}..{}", chunk.len(), begin_time, end_time);
        inner.counter.process(chunk);
        Ok(())
    }

    /// Flush the open windows and freeze the histogram for reading.
    /// Stopping a measurement that is not running does nothing.
    pub fn stop(&self) -> Result<(), Error> {
        let mut inner = self.inner.lock();
        if inner.phase == Phase::Running {
            inner.counter.flush();
            inner.phase = Phase::Stopped;
            info!(
                "measurement stopped after {} events, {} closures",
                inner.counter.stats().events,
                inner.counter.stats().closures,
            );
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<(), Error> {
        let mut inner = self.inner.lock();
        if inner.phase == Phase::Running {
            return Err(Error::Phase("clear", inner.phase));
        }
        inner.counter.clear();
        Ok(())
    }

    /// Copy of the histogram counters
    pub fn snapshot(&self) -> Vec<u64> {
        self.inner.lock().counter.histogram().counts().to_vec()
    }

    /// Bucket labels; fixed at construction, so no lock is taken
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    pub fn phase(&self) -> Phase {
        self.inner.lock().phase
    }

    pub fn stats(&self) -> Stats {
        *self.inner.lock().counter.stats()
    }

    /// Histogram copy and statistics taken under one guard
    pub fn snapshot_with_stats(&self) -> (Vec<u64>, Stats) {
        let inner = self.inner.lock();
        (
            inner.counter.histogram().counts().to_vec(),
            *inner.counter.stats(),
        )
    }

    pub fn into_counter(self) -> C {
        self.inner.into_inner().counter
    }
}
