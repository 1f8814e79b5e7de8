use std::time::Duration;

use ordertools::cfg::{Run, RunRecord};
use ordertools::counter::{Params, Stats};
use ordertools::de::RecordFormat;
use ordertools::hist::Mode;

#[test]
fn serde_roundtrip() {
    let mut params = Params::new(&[1, 3, 4], 500);
    params.trigger = Some(1);
    params.synthetic_start = true;
    let mut run = Run::new(params);
    run.name = String::from("test_run_serde");
    run.limit = Some(Duration::from_secs(90));
    run.format = RecordFormat::Dump;
    let record = RunRecord {
        run,
        index: vec![0, 1, 2, 3],
        counts: vec![5, 4, 3, 2],
        stats: Stats::default(),
    };
    let ser = serde_json::to_string(&record).unwrap();
    let de: RunRecord = serde_json::from_str(&ser).unwrap();
    assert_eq!(record, de);
}

#[test]
fn de_simple() {
    let x = r#"{
        "name": "three detectors",
        "params": { "channels": [1, 3, 4], "binwidth": 500, "mode": "pattern" },
        "limit": "1min 10s"
    }"#;
    let run: Run = serde_json::from_str(x).unwrap();
    assert_eq!(run.params.channels, vec![1, 3, 4]);
    assert_eq!(run.params.mode, Mode::Pattern);
    assert_eq!(run.params.trigger, None);
    assert!(!run.params.synthetic_start);
    assert_eq!(run.format, RecordFormat::Stream);
    assert_eq!(run.chunk_size, 1024);
    assert_eq!(run.limit, Some(Duration::from_secs(70)));
}

#[test]
fn de_minimal() {
    let run: Run = serde_json::from_str(r#"{"params": {"channels": [0], "binwidth": 1}}"#).unwrap();
    assert_eq!(run, Run::new(Params::new(&[0], 1)));
}
