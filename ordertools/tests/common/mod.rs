#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ordertools::{ChannelId, Tag, TagKind};

pub fn events(v: &[(ChannelId, i64)]) -> Vec<Tag> {
    v.iter().map(|&(ch, t)| Tag::event(ch, t)).collect()
}

/// Reproducible stream of chronological tags on `channels`, with mean
/// spacing `spacing` and the occasional tagger marker mixed in
pub fn synthetic(seed: u64, n: usize, channels: &[ChannelId], spacing: i64) -> Vec<Tag> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut time = 0i64;
    let mut tags = Vec::with_capacity(n);
    for _ in 0..n {
        time += rng.gen_range(0..2 * spacing);
        let channel = channels[rng.gen_range(0..channels.len())];
        let kind = if rng.gen_ratio(1, 100) {
            TagKind::OverflowBegin
        } else {
            TagKind::TimeTag
        };
        tags.push(Tag { time, channel, kind });
    }
    tags
}

/// Split `tags` into chunks of at most `size`
pub fn chunked(tags: &[Tag], size: usize) -> Vec<Result<Vec<Tag>, ordertools::Error>> {
    tags.chunks(size).map(|c| Ok(c.to_vec())).collect()
}
