use std::sync::Arc;
use std::thread;

use ordertools::bit;
use ordertools::counter::{self, Counter, Engine, Params};
use ordertools::hist::Mode;
use ordertools::meas::{Measurement, Phase, Subscriber};
use ordertools::ChannelId;

mod common;

use common::{chunked, events, synthetic};

struct Nothing;

impl Subscriber for Nothing {
    fn register_channel(&mut self, _channel: ChannelId) {}
}

fn triggered(channels: &[ChannelId], binwidth: i64, trigger: ChannelId) -> Params {
    let mut p = Params::new(channels, binwidth);
    p.trigger = Some(trigger);
    p
}

#[test]
fn two_channel_pair_then_single() {
    let m = Measurement::new(Engine::new(&Params::new(&[0, 1], 1000)).unwrap());
    m.init(&mut Nothing).unwrap();
    m.start().unwrap();
    m.feed(&events(&[(0, 0), (1, 500), (0, 2000)]), 0, 2000).unwrap();
    assert_eq!(m.snapshot(), vec![0, 0, 1]);
    m.stop().unwrap();
    assert_eq!(m.phase(), Phase::Stopped);
    assert_eq!(m.snapshot(), vec![0, 1, 1]);
    assert_eq!(m.index(), &[0, 1, 2]);
}

#[test]
fn free_running_upper_bound_is_exclusive() {
    let p = Params::new(&[1, 2, 3], 1000);
    let h = counter::histogram(vec![Ok(events(&[(1, 0), (2, 1000), (3, 1500)]))], &p).unwrap();
    assert_eq!(h, vec![0, 1, 1, 0]);
}

#[test]
fn triggered_upper_bound_is_inclusive() {
    let p = triggered(&[1, 2, 3], 1000, 1);
    let h = counter::histogram(vec![Ok(events(&[(1, 0), (2, 1000)]))], &p).unwrap();
    assert_eq!(h, vec![0, 0, 1, 0]);

    let h = counter::histogram(vec![Ok(events(&[(1, 0), (2, 1001)]))], &p).unwrap();
    assert_eq!(h, vec![1, 1, 0, 0]);
}

#[test]
fn triggered_events_without_open_window() {
    // Before the first trigger nothing is counted;
    // an event past the end of the window lands in bucket 0
    let p = triggered(&[1, 2], 1000, 1);
    let h = counter::histogram(vec![Ok(events(&[(2, 10), (1, 100), (2, 2000)]))], &p).unwrap();
    assert_eq!(h, vec![1, 1, 0]);
}

#[test]
fn pattern_histogram_labels_channels() {
    let mut p = Params::new(&[1, 2, 3], 1000);
    p.mode = Mode::Pattern;
    let h = counter::histogram(vec![Ok(events(&[(1, 0), (3, 200), (2, 5000)]))], &p).unwrap();
    assert_eq!(h.len(), 8);
    assert_eq!(h[0b101], 1);
    assert_eq!(h[0b010], 1);
    assert_eq!(h.iter().sum::<u64>(), 2);
    assert_eq!(bit::pattern_label(0b101, 3), "101");
}

/// The order histogram is the pattern histogram summed by popcount
fn assert_order_matches_pattern(mut params: Params) {
    let tags = synthetic(7, 20_000, &params.channels, 400);
    params.mode = Mode::Order;
    let order = counter::histogram(chunked(&tags, 1000), &params).unwrap();
    params.mode = Mode::Pattern;
    let pattern = counter::histogram(chunked(&tags, 1000), &params).unwrap();

    let mut folded = vec![0u64; order.len()];
    for (mask, &count) in pattern.iter().enumerate() {
        folded[bit::order(mask as u32)] += count;
    }
    assert_eq!(order, folded);
    assert!(order.iter().sum::<u64>() > 0);
}

#[test]
fn order_matches_pattern_free_running() {
    assert_order_matches_pattern(Params::new(&[1, 2, 5, 8], 1000));
}

#[test]
fn order_matches_pattern_triggered() {
    assert_order_matches_pattern(triggered(&[1, 2, 5, 8], 1000, 5));
}

#[test]
fn chunking_does_not_change_the_histogram() {
    for params in [Params::new(&[0, 1, 2], 500), triggered(&[0, 1, 2], 500, 0)] {
        let tags = synthetic(11, 10_000, &[0, 1, 2, 3], 300);
        let whole = counter::histogram(chunked(&tags, tags.len()), &params).unwrap();
        for size in [1, 7, 1024] {
            assert_eq!(counter::histogram(chunked(&tags, size), &params).unwrap(), whole);
        }
    }
}

#[test]
fn total_is_closures_plus_outside() {
    for params in [Params::new(&[0, 1, 2], 500), triggered(&[0, 1, 2], 500, 1)] {
        let tags = synthetic(3, 10_000, &[0, 1, 2, 3], 250);
        let mut engine = Engine::new(&params).unwrap();
        engine.start();
        engine.process(&tags);
        engine.flush();
        let stats = engine.stats();
        assert_eq!(engine.histogram().total(), stats.closures + stats.outside);
        assert_eq!(stats.skipped + stats.events, tags.len() as u64);
        assert!(stats.unmonitored > 0);
        assert_eq!(stats.last_time, tags.iter().filter(|t| t.is_event()).map(|t| t.time).last());
    }
}

#[test]
fn clear_then_replay_is_identical() {
    let tags = synthetic(5, 5_000, &[1, 2, 3], 500);
    let m = Measurement::new(Engine::new(&triggered(&[1, 2, 3], 800, 2)).unwrap());
    let mut runs = Vec::new();
    for _ in 0..2 {
        m.init(&mut Nothing).unwrap();
        m.start().unwrap();
        for chunk in tags.chunks(333) {
            m.feed(chunk, chunk[0].time, chunk[chunk.len() - 1].time).unwrap();
        }
        m.stop().unwrap();
        runs.push((m.snapshot(), m.stats()));
    }
    assert_eq!(runs[0], runs[1]);
}

#[test]
fn windows_closed_by_one_tag_are_merged() {
    // Windows of 1 and 2 both close when 3 fires: one closure of order 2
    // is recorded instead of one closure per window
    let p = Params::new(&[1, 2, 3], 1000);
    let mut engine = Engine::new(&p).unwrap();
    engine.start();
    engine.process(&events(&[(1, 0), (2, 500), (3, 1600)]));
    assert_eq!(engine.histogram().counts(), &[0, 0, 1, 0]);
    assert_eq!(engine.stats().closures, 1);
}

#[test]
fn snapshots_taken_while_feeding_never_tear() {
    let tags = synthetic(9, 50_000, &[0, 1, 2, 3], 300);
    let m = Arc::new(Measurement::new(Engine::new(&Params::new(&[0, 1, 2], 500)).unwrap()));
    m.init(&mut Nothing).unwrap();
    m.start().unwrap();

    let reader = {
        let m = Arc::clone(&m);
        thread::spawn(move || {
            let mut totals = Vec::new();
            while m.phase() == Phase::Running {
                let (counts, stats) = m.snapshot_with_stats();
                let total: u64 = counts.iter().sum();
                assert_eq!(total, stats.closures + stats.outside);
                totals.push(total);
            }
            totals
        })
    };

    for chunk in tags.chunks(256) {
        m.feed(chunk, chunk[0].time, chunk[chunk.len() - 1].time).unwrap();
    }
    m.stop().unwrap();
    let totals = reader.join().unwrap();

    let last: u64 = m.snapshot().iter().sum();
    assert!(totals.windows(2).all(|w| w[0] <= w[1]));
    assert!(totals.iter().all(|&t| t <= last));
}
