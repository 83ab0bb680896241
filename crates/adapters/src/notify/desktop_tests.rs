// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn with_program(program: &str) -> DesktopNotifyAdapter {
    DesktopNotifyAdapter {
        program: program.to_string(),
        ..DesktopNotifyAdapter::default()
    }
}

fn sample() -> Notification {
    Notification::new("Medication reminder", "Morning pills", "08:00")
}

#[test]
fn args_carry_tag_hints_and_text_last() {
    let adapter = DesktopNotifyAdapter::new("kusuri");
    let args = adapter.build_args(&sample());

    assert!(args.contains(&"--app-name=kusuri".to_string()));
    assert!(args.contains(&"--hint=string:x-canonical-private-synchronous:08:00".to_string()));
    assert!(args.contains(&"--icon=./icon-192.png".to_string()));
    assert!(args.contains(&"--urgency=normal".to_string()));

    let n = args.len();
    assert_eq!(args[n - 2], "Medication reminder");
    assert_eq!(args[n - 1], "Morning pills");
}

#[test]
fn require_interaction_maps_to_critical_urgency() {
    let adapter = DesktopNotifyAdapter::default();
    let args = adapter.build_args(&Notification {
        require_interaction: true,
        ..sample()
    });
    assert!(args.contains(&"--urgency=critical".to_string()));
}

#[test]
fn empty_icon_is_omitted() {
    let adapter = DesktopNotifyAdapter::default();
    let args = adapter.build_args(&Notification {
        icon: String::new(),
        ..sample()
    });
    assert!(!args.iter().any(|a| a.starts_with("--icon")));
}

#[tokio::test]
async fn missing_program_is_a_failure() {
    let adapter = with_program("/nonexistent/notify-send");
    let err = adapter.show(&sample()).await.unwrap_err();
    assert!(matches!(err, NotifyError::Failed(_)), "{err}");
}

#[tokio::test]
async fn nonzero_exit_is_a_failure() {
    let adapter = with_program("false");
    assert!(adapter.show(&sample()).await.is_err());
}
