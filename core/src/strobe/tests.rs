//! Strobe controller tests

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::*;
use crate::error::{AlertError, ErrorKind};
use crate::testing::RecordingTorch;

const PERIOD: Duration = Duration::from_millis(80);

fn strobe(torch: &Arc<RecordingTorch>) -> StrobeController {
    StrobeController::new(torch.clone(), PERIOD).unwrap()
}

#[test]
fn test_pulses_toggle_and_stop_switches_off() {
    let torch = Arc::new(RecordingTorch::new());
    let mut strobe = strobe(&torch);

    assert_eq!(strobe.start().unwrap(), StrobeStart::Started);
    assert!(strobe.is_strobing());
    thread::sleep(Duration::from_millis(500));
    assert_eq!(strobe.stop(), StrobeStop::Stopped);
    assert!(!strobe.is_strobing());

    let levels = torch.levels();
    assert_eq!(levels.last(), Some(&false));

    // One pulse right away, then one per period
    let pulses = &levels[..levels.len() - 1];
    assert!(
        (4..=9).contains(&pulses.len()),
        "{} pulses in 500ms",
        pulses.len()
    );
    for (i, &on) in pulses.iter().enumerate() {
        assert_eq!(on, i % 2 == 0, "pulse {i}");
    }
}

#[test]
fn test_pulses_follow_period() {
    let torch = Arc::new(RecordingTorch::new());
    let mut strobe = strobe(&torch);

    strobe.start().unwrap();
    thread::sleep(Duration::from_millis(650));
    strobe.stop();

    let commands = torch.commands();
    let pulses = &commands[..commands.len() - 1];
    assert!(pulses.len() >= 5);
    for pair in pulses.windows(2) {
        let gap = pair[1].at.duration_since(pair[0].at);
        assert!(
            gap >= PERIOD - Duration::from_millis(15) && gap <= PERIOD + Duration::from_millis(60),
            "gap {gap:?}"
        );
    }
}

#[test]
fn test_no_pulses_after_stop() {
    let torch = Arc::new(RecordingTorch::new());
    let mut strobe = strobe(&torch);

    strobe.start().unwrap();
    thread::sleep(Duration::from_millis(200));
    strobe.stop();
    let after_stop = torch.commands().len();

    thread::sleep(PERIOD * 4);
    assert_eq!(torch.commands().len(), after_stop);
    assert_eq!(torch.last_level(), Some(false));
}

#[test]
fn test_stop_always_ends_with_off() {
    let torch = Arc::new(RecordingTorch::new());
    let mut strobe = strobe(&torch);

    for wait_ms in [0u64, 10, 45, 90, 130] {
        strobe.start().unwrap();
        thread::sleep(Duration::from_millis(wait_ms));
        strobe.stop();
        assert_eq!(torch.last_level(), Some(false), "after {wait_ms}ms");
    }
}

#[test]
fn test_unavailable_torch_is_not_supported() {
    let torch = Arc::new(RecordingTorch::unavailable());
    let mut strobe = strobe(&torch);

    assert_eq!(
        strobe.start().unwrap(),
        StrobeStart::NotSupportedOrAlreadyStrobing
    );
    assert!(!strobe.is_strobing());
    thread::sleep(PERIOD * 2);
    assert!(torch.commands().is_empty());

    // Nothing to switch off either
    assert_eq!(strobe.stop(), StrobeStop::Stopped);
    assert!(torch.commands().is_empty());
}

#[test]
fn test_start_while_strobing_is_rejected() {
    let torch = Arc::new(RecordingTorch::new());
    let mut strobe = strobe(&torch);

    assert_eq!(strobe.start().unwrap(), StrobeStart::Started);
    assert_eq!(
        strobe.start().unwrap(),
        StrobeStart::NotSupportedOrAlreadyStrobing
    );
    thread::sleep(Duration::from_millis(300));
    strobe.stop();

    // A second loop would double the toggle rate and break alternation
    let levels = torch.levels();
    let pulses = &levels[..levels.len() - 1];
    assert!(pulses.len() <= 6);
    for (i, &on) in pulses.iter().enumerate() {
        assert_eq!(on, i % 2 == 0);
    }
}

#[test]
fn test_capability_query_error_is_returned() {
    let torch = Arc::new(
        RecordingTorch::new().failing_list(AlertError::PermissionFailure("camera".into())),
    );
    let mut strobe = strobe(&torch);

    let err = strobe.start().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);
    assert!(!strobe.is_strobing());
}

#[test]
fn test_torch_failure_ends_pulse_loop() {
    let torch = Arc::new(RecordingTorch::new().fail_after(3));
    let mut strobe = strobe(&torch);

    assert_eq!(strobe.start().unwrap(), StrobeStart::Started);

    let deadline = Instant::now() + Duration::from_secs(2);
    while strobe.is_strobing() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert!(!strobe.is_strobing());
    assert_eq!(torch.levels(), vec![true, false, true]);

    // The off command fails too; stop still succeeds
    assert_eq!(strobe.stop(), StrobeStop::Stopped);
}

#[test]
fn test_stop_on_idle_switches_torch_off() {
    let torch = Arc::new(RecordingTorch::new());
    let mut strobe = strobe(&torch);

    assert_eq!(strobe.stop(), StrobeStop::Stopped);
    assert_eq!(strobe.stop(), StrobeStop::Stopped);
    assert_eq!(torch.levels(), vec![false, false]);
    assert!(!strobe.is_strobing());
}

#[test]
fn test_restart_after_stop() {
    let torch = Arc::new(RecordingTorch::new());
    let mut strobe = strobe(&torch);

    strobe.start().unwrap();
    thread::sleep(Duration::from_millis(100));
    strobe.stop();
    let first = torch.commands().len();

    assert_eq!(strobe.start().unwrap(), StrobeStart::Started);
    thread::sleep(Duration::from_millis(100));
    strobe.stop();

    let levels = torch.levels();
    assert!(levels.len() > first);
    // Each session starts from "off", so its first pulse is "on"
    assert!(levels[first]);
}

#[test]
fn test_uses_first_listed_device() {
    let torch = Arc::new(RecordingTorch::with_devices(&["back", "front"]));
    let mut strobe = strobe(&torch);

    strobe.start().unwrap();
    thread::sleep(Duration::from_millis(100));
    strobe.stop();

    let commands = torch.commands();
    assert!(commands.len() >= 2);
    assert!(commands.iter().all(|c| c.device == "back"));
    assert_eq!(torch.last_level(), Some(false));
}
