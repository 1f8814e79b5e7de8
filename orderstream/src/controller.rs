use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use ordertools::counter::Counter;
use ordertools::meas::Measurement;

use crate::Event;

enum Next {
    Event(Event),
    Hangup,
    Shutdown,
}

/// Feed chunks from the backend into a running measurement until the
/// backend is done, `limit` has elapsed, or a message (or hangup) arrives on
/// `shutdown`, then stop the measurement. Returns the number of chunks
/// processed.
pub fn main<C: Counter>(
    meas: &Measurement<C>,
    rx: &flume::Receiver<Event>,
    shutdown: &flume::Receiver<()>,
    limit: Option<Duration>,
) -> Result<u64> {
    let deadline = limit.map(|l| Instant::now() + l);
    let mut chunks = 0u64;
    loop {
        let selector = flume::Selector::new()
            .recv(shutdown, |_| Next::Shutdown)
            .recv(rx, |event| match event {
                Ok(event) => Next::Event(event),
                Err(_) => Next::Hangup,
            });
        let next = match deadline {
            Some(d) => match selector.wait_deadline(d) {
                Ok(next) => next,
                Err(_) => {
                    info!("run limit reached");
                    break;
                }
            },
            None => selector.wait(),
        };
        match next {
            Next::Event(Event::Chunk(tags)) => {
                if let (Some(first), Some(last)) = (tags.first(), tags.last()) {
                    meas.feed(&tags, first.time, last.time)?;
                }
                chunks += 1;
            }
            Next::Event(Event::Done) => {
                debug!("backend done");
                break;
            }
            Next::Hangup => break,
            Next::Shutdown => {
                info!("shutdown signal received");
                break;
            }
        }
    }
    meas.stop()?;
    Ok(chunks)
}
