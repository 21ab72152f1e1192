use std::time::{Duration, Instant};

use energy_scoreboard::state::{apply_delta, AppState, Delta, Toast, ToastKind};

#[test]
fn toast_fades_then_expires() {
    let toast = Toast::new(ToastKind::Info, "x");
    let born = toast.created;

    assert!(!toast.is_fading(born));
    assert!(!toast.is_expired(born));

    let fading = born + Duration::from_millis(3_100);
    assert!(toast.is_fading(fading));
    assert!(!toast.is_expired(fading));

    let gone = born + Duration::from_millis(3_400);
    assert!(toast.is_expired(gone));
}

#[test]
fn prune_drops_expired_toasts_only() {
    let mut state = AppState::new();
    state.push_toast(ToastKind::Info, "old");
    state.push_toast(ToastKind::Info, "fresh");
    state.toasts[0].created = Instant::now() - Duration::from_secs(4);

    state.prune_toasts(Instant::now());

    assert_eq!(state.toasts.len(), 1);
    assert_eq!(state.toasts[0].text, "fresh");
}

#[test]
fn toast_queue_is_bounded() {
    let mut state = AppState::new();
    for i in 0..10 {
        state.push_toast(ToastKind::Info, format!("toast {i}"));
    }
    assert_eq!(state.toasts.len(), 6);
    assert_eq!(state.toasts[0].text, "toast 4");
}

#[test]
fn score_report_delta_mutates_state_and_toasts() {
    let mut state = AppState::new();
    state.create_team("Alpha").expect("create");

    apply_delta(
        &mut state,
        Delta::ScoreReport {
            team: "Alpha".to_string(),
            game: "викторина".to_string(),
            points: 25,
        },
    );

    assert_eq!(state.team_score("Alpha"), 25);
    let toast = state.toasts.back().expect("success toast");
    assert_eq!(toast.kind, ToastKind::Success);
    assert!(toast.text.contains("Alpha"));
    assert!(toast.text.contains("25"));
    assert!(toast.text.contains("викторина"));
    assert!(state.logs.iter().any(|l| l.starts_with("[INFO] Score:")));
}

#[test]
fn score_report_for_unknown_team_changes_nothing_visible() {
    let mut state = AppState::new();
    state.create_team("Alpha").expect("create");
    state.clear_dirty();

    apply_delta(
        &mut state,
        Delta::ScoreReport {
            team: "Ghost".to_string(),
            game: "викторина".to_string(),
            points: 25,
        },
    );

    assert_eq!(state.team_score("Alpha"), 0);
    assert!(state.game_results.is_empty());
    assert!(state.toasts.is_empty());
    assert!(!state.dirty_teams && !state.dirty_results);
}

#[test]
fn log_delta_lands_in_the_console_ring() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::Log("[INFO] hello".to_string()));
    assert_eq!(state.logs.back().map(String::as_str), Some("[INFO] hello"));
}
