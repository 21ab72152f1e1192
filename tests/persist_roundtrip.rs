use std::fs;
use std::path::PathBuf;

use energy_scoreboard::persist;
use energy_scoreboard::state::AppState;

fn temp_store(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "energy_scoreboard_test_{}_{tag}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn roundtrip_preserves_logical_state() {
    let dir = temp_store("roundtrip");

    let mut state = AppState::new();
    state.create_team("Альфа").expect("create");
    state.create_team("Бета").expect("create");
    assert!(state.record_score("Альфа", "викторина", 20));
    assert!(state.record_score("Бета", "викторина", 50));
    assert!(state.record_score("Альфа", "кроссворд", 15));
    state.select_team("Альфа");
    persist::flush(&dir, &mut state);
    assert!(!state.dirty_teams && !state.dirty_results && !state.dirty_selection);

    let mut reloaded = AppState::new();
    persist::load_into_state(&dir, &mut reloaded).expect("load");

    assert_eq!(reloaded.teams, state.teams);
    assert_eq!(reloaded.game_results, state.game_results);
    assert_eq!(reloaded.current_team, "Альфа");
    assert_eq!(reloaded.selected, 1);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_store_yields_empty_defaults() {
    let dir = temp_store("missing");

    let mut state = AppState::new();
    persist::load_into_state(&dir, &mut state).expect("absent store is fine");

    assert!(state.teams.is_empty());
    assert!(state.game_results.is_empty());
    assert_eq!(state.current_team, "");
}

#[test]
fn malformed_teams_store_fails_load() {
    let dir = temp_store("malformed");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("energyTeams.json"), "{not json").expect("write");

    let mut state = AppState::new();
    assert!(persist::load_into_state(&dir, &mut state).is_err());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn selection_key_is_stored_as_a_raw_string() {
    let dir = temp_store("selection");

    let mut state = AppState::new();
    state.create_team("Alpha").expect("create");
    persist::flush(&dir, &mut state);

    let raw = fs::read_to_string(dir.join("currentEnergyTeam")).expect("read");
    assert_eq!(raw, "Alpha");

    // A selection written by another process is taken verbatim, without
    // revalidation against the registry.
    fs::write(dir.join("currentEnergyTeam"), "Ghost").expect("write");
    let mut reloaded = AppState::new();
    persist::load_into_state(&dir, &mut reloaded).expect("load");
    assert_eq!(reloaded.current_team, "Ghost");
    assert_eq!(reloaded.selected, 0);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn flush_writes_only_dirty_stores() {
    let dir = temp_store("clean");

    let mut state = AppState::new();
    state.create_team("Alpha").expect("create");
    state.clear_dirty();
    persist::flush(&dir, &mut state);

    // Nothing was dirty, so nothing (not even the directory) was written.
    assert!(!dir.exists());
}

#[test]
fn score_updates_flush_both_registry_and_ledger() {
    let dir = temp_store("score_flush");

    let mut state = AppState::new();
    state.create_team("Alpha").expect("create");
    persist::flush(&dir, &mut state);

    assert!(state.record_score("Alpha", "quiz1", 10));
    assert!(state.dirty_teams);
    assert!(state.dirty_results);
    persist::flush(&dir, &mut state);

    let mut reloaded = AppState::new();
    persist::load_into_state(&dir, &mut reloaded).expect("load");
    assert_eq!(reloaded.team_score("Alpha"), 10);
    assert_eq!(reloaded.game_results["quiz1"]["Alpha"], 10);

    let _ = fs::remove_dir_all(&dir);
}
