//! Siren controller tests

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::*;
use crate::config::SirenConfig;
use crate::error::ErrorKind;
use crate::output::SinkPurpose;
use crate::testing::RecordingOutput;
use crate::waveform::SirenWaveform;

/// Default block: 44100 / 20 samples
const BLOCK: Duration = Duration::from_millis(50);

fn controller(output: &Arc<RecordingOutput>) -> SirenController {
    SirenController::new(output.clone(), SirenConfig::default())
}

fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    done()
}

#[test]
fn test_stop_on_idle_is_noop() {
    let output = Arc::new(RecordingOutput::new());
    let mut siren = controller(&output);

    assert_eq!(siren.stop(), SirenStop::Stopped);
    assert_eq!(siren.stop(), SirenStop::Stopped);
    assert!(!siren.is_playing());
    assert!(siren.mode().is_none());
    assert!(siren.last_session().is_none());
    assert!(output.sinks().is_empty());
}

#[test]
fn test_single_session_plays_and_stops_within_one_block() {
    let output = Arc::new(RecordingOutput::new());
    let mut siren = controller(&output);

    assert_eq!(siren.start(SirenMode::Single).unwrap(), SirenStart::Playing);
    assert!(siren.is_playing());
    assert_eq!(siren.mode(), Some(SirenMode::Single));

    // Three full segments plus one block of margin
    let per_segment = siren.config().waveform().samples_per_segment() as usize;
    assert!(output.wait_for_samples(per_segment * 3 + 2205, Duration::from_secs(5)));

    let stop_called = Instant::now();
    assert_eq!(siren.stop(), SirenStop::Stopped);
    let stop_took = stop_called.elapsed();
    assert!(stop_took < BLOCK * 4, "stop took {stop_took:?}");
    assert!(!siren.is_playing());

    let sinks = output.sinks();
    assert_eq!(sinks.len(), 1);
    assert_eq!(sinks[0].purpose, SinkPurpose::Alert);
    assert_eq!(sinks[0].sample_rate, 44_100);
    assert_eq!(sinks[0].close_count, 1);
    let closed_at = sinks[0].closed_at.unwrap();
    assert!(closed_at.duration_since(stop_called) < BLOCK * 4);
    assert_eq!(output.open_now(), 0);

    let summary = siren.last_session().unwrap();
    assert_eq!(summary.exit, ExitReason::Stopped);
    assert!(summary.segment_switches >= 3);
    assert_eq!(summary.sinks_closed, 1);
    assert_eq!(summary.samples_written as usize, sinks[0].samples_written());
}

#[test]
fn test_start_same_mode_reports_already_playing() {
    let output = Arc::new(RecordingOutput::new());
    let mut siren = controller(&output);

    assert_eq!(siren.start(SirenMode::Single).unwrap(), SirenStart::Playing);
    assert_eq!(
        siren.start(SirenMode::Single).unwrap(),
        SirenStart::AlreadyPlaying
    );
    assert_eq!(output.sinks().len(), 1);

    siren.stop();
}

#[test]
fn test_mode_switch_releases_previous_sinks_first() {
    let output = Arc::new(RecordingOutput::new());
    let mut siren = controller(&output);

    siren.start(SirenMode::Single).unwrap();
    assert!(output.wait_for_samples(1, Duration::from_secs(2)));
    assert_eq!(siren.start(SirenMode::Dual).unwrap(), SirenStart::Playing);
    assert_eq!(siren.mode(), Some(SirenMode::Dual));

    let sinks = output.sinks();
    assert_eq!(sinks.len(), 3);
    assert_eq!(sinks[0].close_count, 1);
    assert!(sinks[0].closed_at.unwrap() <= sinks[1].opened_at);
    assert_eq!(sinks[1].purpose, SinkPurpose::InCall);
    assert_eq!(sinks[2].purpose, SinkPurpose::Ringer);
    assert_eq!(output.max_concurrent_open(), 2);
    assert_eq!(output.max_concurrent_same_purpose(), 1);

    siren.stop();
    assert_eq!(output.open_now(), 0);
}

#[test]
fn test_dual_mode_writes_identical_blocks() {
    let output = Arc::new(RecordingOutput::new());
    let mut siren = controller(&output);

    siren.start(SirenMode::Dual).unwrap();
    assert!(output.wait_for_samples(2205 * 5, Duration::from_secs(5)));
    siren.stop();

    let sinks = output.sinks();
    assert_eq!(sinks.len(), 2);
    assert!(sinks[0].blocks.len() >= 5);
    assert_eq!(sinks[0].blocks, sinks[1].blocks);
    assert!(sinks.iter().all(|s| s.close_count == 1));
}

#[test]
fn test_init_failure_leaves_controller_idle() {
    let output = Arc::new(RecordingOutput::new().fail_open(SinkPurpose::Alert));
    let mut siren = controller(&output);

    let err = siren.start(SirenMode::Single).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Init);
    assert!(!siren.is_playing());
    assert!(siren.mode().is_none());
    assert!(output.sinks().is_empty());
}

#[test]
fn test_dual_secondary_failure_closes_primary() {
    let output = Arc::new(RecordingOutput::new().fail_open(SinkPurpose::Ringer));
    let mut siren = controller(&output);

    let err = siren.start(SirenMode::Dual).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Init);
    assert!(!siren.is_playing());

    let sinks = output.sinks();
    assert_eq!(sinks.len(), 1);
    assert_eq!(sinks[0].purpose, SinkPurpose::InCall);
    assert_eq!(sinks[0].close_count, 1);
    assert!(sinks[0].blocks.is_empty());
    assert_eq!(output.open_now(), 0);
}

#[test]
fn test_invalid_buffer_size_rejects_start() {
    let output = Arc::new(RecordingOutput::new().with_min_buffer_len(0));
    let mut siren = controller(&output);

    let err = siren.start(SirenMode::Single).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Init);
    assert!(output.sinks().is_empty());
}

#[test]
fn test_configured_block_len_is_used_above_minimum() {
    let output = Arc::new(RecordingOutput::new());
    let config = SirenConfig {
        block_len: 4096,
        ..Default::default()
    };
    let mut siren = SirenController::new(output.clone(), config);

    siren.start(SirenMode::Single).unwrap();
    assert!(output.wait_for_samples(4096, Duration::from_secs(2)));
    siren.stop();

    let sinks = output.sinks();
    assert!(sinks[0].blocks.iter().all(|b| b.len() == 4096));
}

#[test]
fn test_write_failure_self_terminates_session() {
    let output = Arc::new(RecordingOutput::new().fail_writes_after(SinkPurpose::Alert, 3));
    let mut siren = controller(&output);

    assert_eq!(siren.start(SirenMode::Single).unwrap(), SirenStart::Playing);
    assert!(wait_until(Duration::from_secs(2), || !siren.is_playing()));

    let sinks = output.sinks();
    assert_eq!(sinks[0].blocks.len(), 3);
    assert_eq!(sinks[0].close_count, 1);
    assert_eq!(output.open_now(), 0);

    // Unreaped session still reports its mode until stopped
    assert_eq!(siren.mode(), Some(SirenMode::Single));
    assert_eq!(siren.stop(), SirenStop::Stopped);
    assert!(matches!(
        siren.last_session().unwrap().exit,
        ExitReason::WriteFailed(_)
    ));
}

#[test]
fn test_restart_after_write_failure() {
    let output = Arc::new(RecordingOutput::new().fail_writes_after(SinkPurpose::Alert, 1));
    let mut siren = controller(&output);

    siren.start(SirenMode::Single).unwrap();
    assert!(wait_until(Duration::from_secs(2), || !siren.is_playing()));

    // Same mode, but the old session is dead: a fresh one is opened
    assert_eq!(siren.start(SirenMode::Single).unwrap(), SirenStart::Playing);
    assert_eq!(output.sinks().len(), 2);
    siren.stop();
}

#[test]
fn test_secondary_write_failure_stops_both_sinks() {
    let output = Arc::new(RecordingOutput::new().fail_writes_after(SinkPurpose::Ringer, 2));
    let mut siren = controller(&output);

    siren.start(SirenMode::Dual).unwrap();
    assert!(wait_until(Duration::from_secs(2), || !siren.is_playing()));

    let sinks = output.sinks();
    assert_eq!(sinks[0].blocks.len(), 3);
    assert_eq!(sinks[1].blocks.len(), 2);
    assert!(sinks.iter().all(|s| s.close_count == 1));
    siren.stop();
}

#[test]
fn test_each_session_restarts_waveform() {
    let output = Arc::new(RecordingOutput::new());
    let mut siren = controller(&output);

    for _ in 0..2 {
        siren.start(SirenMode::Single).unwrap();
        assert!(wait_until(Duration::from_secs(2), || {
            output.sinks().last().map(|s| !s.blocks.is_empty()).unwrap_or(false)
        }));
        siren.stop();
    }

    let sinks = output.sinks();
    let mut expected = vec![0i16; sinks[0].blocks[0].len()];
    SirenWaveform::new(siren.config().waveform()).fill(&mut expected);
    assert_eq!(sinks[0].blocks[0], expected);
    assert_eq!(sinks[1].blocks[0], expected);
}

#[test]
fn test_rapid_restarts_never_overlap_sinks() {
    let output = Arc::new(RecordingOutput::new());
    let mut siren = controller(&output);

    for i in 0..10 {
        let mode = if i % 2 == 0 {
            SirenMode::Single
        } else {
            SirenMode::Dual
        };
        siren.start(mode).unwrap();
        if i % 3 == 0 {
            siren.stop();
        }
    }
    siren.stop();

    assert!(output.max_concurrent_open() <= 2);
    assert_eq!(output.max_concurrent_same_purpose(), 1);
    assert_eq!(output.open_now(), 0);
    assert!(output.sinks().iter().all(|s| s.close_count == 1));
}

#[test]
fn test_drop_stops_session() {
    let output = Arc::new(RecordingOutput::new());
    {
        let mut siren = controller(&output);
        siren.start(SirenMode::Dual).unwrap();
    }
    assert_eq!(output.open_now(), 0);
    assert!(output.sinks().iter().all(|s| s.close_count == 1));
}
