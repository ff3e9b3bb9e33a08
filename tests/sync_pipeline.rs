use approx::assert_abs_diff_eq;

use dtw_align_rs::{
    AdjustConfig, AlignError, AlignerConfig, AlignmentInput, DtwAlgorithm, DtwConfig, Fragment,
    SyncAlignerBuilder, SyncMap,
};

const SAMPLE_RATE: u32 = 16_000;

fn tone(seconds: f64, freq: f64) -> Vec<f64> {
    let len = (seconds * SAMPLE_RATE as f64) as usize;
    (0..len)
        .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / SAMPLE_RATE as f64).sin() * 0.5)
        .collect()
}

/// Three distinct tones standing in for three spoken fragments.
fn three_fragment_input() -> AlignmentInput {
    let mut samples = tone(1.0, 220.0);
    samples.extend(tone(1.0, 440.0));
    samples.extend(tone(1.0, 880.0));
    AlignmentInput {
        sample_rate_hz: SAMPLE_RATE,
        synth_samples: samples.clone(),
        samples,
        fragments: vec![
            Fragment::new("f001", "the first fragment", 1.0),
            Fragment::new("f002", "the second fragment", 1.0),
            Fragment::new("f003", "the third fragment", 1.0),
        ],
    }
}

fn assert_contiguous(map: &SyncMap) {
    for w in map.fragments.windows(2) {
        assert_eq!(
            w[0].interval.end, w[1].interval.begin,
            "gap between {} and {}",
            w[0].id, w[1].id
        );
    }
}

#[test]
fn identical_waves_align_fragments_at_their_anchors() {
    let input = three_fragment_input();
    let map = SyncAlignerBuilder::new(AlignerConfig::default())
        .build()
        .unwrap()
        .align(&input)
        .unwrap();

    let regular: Vec<_> = map.regular_fragments().collect();
    assert_eq!(regular.len(), 3);
    assert_eq!(regular[0].id, "f001");
    // an identical pair of waves yields a diagonal path, so fragment
    // begins land within one window shift of the synthesized anchors
    assert_abs_diff_eq!(regular[1].interval.begin, 1.0, epsilon = 0.080);
    assert_abs_diff_eq!(regular[2].interval.begin, 2.0, epsilon = 0.080);
    assert_contiguous(&map);
}

#[test]
fn output_covers_the_whole_recording() {
    let input = three_fragment_input();
    let map = SyncAlignerBuilder::new(AlignerConfig::default())
        .build()
        .unwrap()
        .align(&input)
        .unwrap();
    let audio_length = input.samples.len() as f64 / SAMPLE_RATE as f64;
    assert_eq!(map.fragments.first().unwrap().interval.begin, 0.0);
    assert_eq!(map.fragments.last().unwrap().interval.end, audio_length);
    assert_contiguous(&map);
}

#[test]
fn alignment_is_deterministic() {
    let input = three_fragment_input();
    let aligner = SyncAlignerBuilder::new(AlignerConfig::default())
        .build()
        .unwrap();
    let first = aligner.align(&input).unwrap();
    let second = aligner.align(&input).unwrap();
    assert_eq!(first, second);
}

#[test]
fn exact_and_margin_agree_when_the_band_is_wide_enough() {
    let input = three_fragment_input();
    let exact = SyncAlignerBuilder::new(AlignerConfig {
        dtw: DtwConfig {
            algorithm: DtwAlgorithm::Exact,
            ..DtwConfig::default()
        },
        ..AlignerConfig::default()
    })
    .build()
    .unwrap()
    .align(&input)
    .unwrap();

    // 1 s of margin is 50 frames at the default 40 ms shift: narrower
    // than the 74-frame synth sequence, so this runs the banded
    // algorithm rather than falling back to exact
    let margin = SyncAlignerBuilder::new(AlignerConfig {
        dtw: DtwConfig {
            algorithm: DtwAlgorithm::Margin,
            margin: 1.0,
            ..DtwConfig::default()
        },
        ..AlignerConfig::default()
    })
    .build()
    .unwrap()
    .align(&input)
    .unwrap();

    assert_eq!(exact, margin);
}

#[test]
fn empty_audio_is_an_invalid_audio_error() {
    let mut input = three_fragment_input();
    input.samples.clear();
    let err = SyncAlignerBuilder::new(AlignerConfig::default())
        .build()
        .unwrap()
        .align(&input)
        .unwrap_err();
    assert!(matches!(err, AlignError::InvalidAudio { .. }));
}

#[test]
fn rate_adjustment_preserves_contiguity() {
    let mut input = three_fragment_input();
    // make the middle fragment far too dense for its interval
    input.fragments[1].text = "x".repeat(200);
    let config = AlignerConfig {
        adjust: AdjustConfig {
            algorithm: "rate".to_string(),
            value: Some(14.0),
            ..AdjustConfig::default()
        },
        ..AlignerConfig::default()
    };
    let map = SyncAlignerBuilder::new(config)
        .build()
        .unwrap()
        .align(&input)
        .unwrap();
    assert_eq!(map.regular_fragments().count(), 3);
    assert_contiguous(&map);
}

#[test]
fn percent_zero_matches_auto_output() {
    let input = three_fragment_input();
    let auto = SyncAlignerBuilder::new(AlignerConfig::default())
        .build()
        .unwrap()
        .align(&input)
        .unwrap();
    let percent_zero = SyncAlignerBuilder::new(AlignerConfig {
        adjust: AdjustConfig {
            algorithm: "percent".to_string(),
            value: Some(0.0),
            ..AdjustConfig::default()
        },
        ..AlignerConfig::default()
    })
    .build()
    .unwrap()
    .align(&input)
    .unwrap();
    assert_eq!(auto, percent_zero);
}

#[test]
fn config_round_trips_through_json() {
    let json = r#"{
        "mfcc": { "window_length": 0.100, "window_shift": 0.040 },
        "dtw": { "algorithm": "margin", "margin": 10.0 },
        "adjust": { "algorithm": "offset", "value": 0.1 }
    }"#;
    let config: AlignerConfig = serde_json::from_str(json).unwrap();
    let map = SyncAlignerBuilder::new(config)
        .build()
        .unwrap()
        .align(&three_fragment_input())
        .unwrap();
    assert_eq!(map.regular_fragments().count(), 3);
    assert_contiguous(&map);
}
