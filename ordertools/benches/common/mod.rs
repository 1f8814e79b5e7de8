#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ordertools::{ChannelId, Tag};

/// Chronological detector events spread uniformly over `channels`
pub fn load_test_data(n: usize, channels: &[ChannelId], spacing: i64) -> Vec<Tag> {
    let mut rng = StdRng::seed_from_u64(0x7a66);
    let mut time = 0i64;
    (0..n)
        .map(|_| {
            time += rng.gen_range(0..2 * spacing);
            Tag::event(channels[rng.gen_range(0..channels.len())], time)
        })
        .collect()
}
