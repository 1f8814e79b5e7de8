use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::info;

use ordertools::counter::Counter;
use ordertools::meas::Measurement;

/// Log a snapshot of the histogram every `period` until told to stop
pub fn main<C: Counter + Send + 'static>(
    meas: Arc<Measurement<C>>,
    period: Duration,
    stop: flume::Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Err(flume::RecvTimeoutError::Timeout) = stop.recv_timeout(period) {
            let (counts, stats) = meas.snapshot_with_stats();
            info!(
                "events={} recorded={} histogram={:?}",
                stats.events,
                stats.closures + stats.outside,
                counts,
            );
        }
    })
}
