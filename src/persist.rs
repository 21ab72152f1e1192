use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::state::{AppState, GameResults, Team};

const STORE_DIR: &str = "energy_scoreboard";

// Storage keys, one file per key. Key names are kept stable so data written
// by earlier builds keeps loading.
const TEAMS_KEY: &str = "energyTeams.json";
const SELECTION_KEY: &str = "currentEnergyTeam";
const RESULTS_KEY: &str = "energyGameResults.json";

/// Loads teams, current selection, and the game ledger from `dir`. Missing
/// files yield empty defaults; a file that exists but cannot be read or
/// parsed is a startup failure.
pub fn load_into_state(dir: &Path, state: &mut AppState) -> Result<()> {
    let teams_path = dir.join(TEAMS_KEY);
    if teams_path.exists() {
        let raw = fs::read_to_string(&teams_path)
            .with_context(|| format!("reading {}", teams_path.display()))?;
        state.teams = serde_json::from_str::<Vec<Team>>(&raw)
            .with_context(|| format!("parsing {}", teams_path.display()))?;
    }

    let results_path = dir.join(RESULTS_KEY);
    if results_path.exists() {
        let raw = fs::read_to_string(&results_path)
            .with_context(|| format!("reading {}", results_path.display()))?;
        state.game_results = serde_json::from_str::<GameResults>(&raw)
            .with_context(|| format!("parsing {}", results_path.display()))?;
    }

    // The selection key holds a raw string, not JSON. The persisted name is
    // not revalidated against the registry.
    let selection_path = dir.join(SELECTION_KEY);
    if selection_path.exists() {
        let raw = fs::read_to_string(&selection_path)
            .with_context(|| format!("reading {}", selection_path.display()))?;
        state.current_team = raw.trim_end_matches('\n').to_string();
    }

    state.selected = match state
        .teams
        .iter()
        .position(|t| t.name == state.current_team)
    {
        Some(idx) => idx + 1,
        None => 0,
    };
    state.clear_dirty();
    Ok(())
}

/// Writes stores marked dirty and clears the flags. Write failures are not
/// surfaced; in-memory state may then diverge from disk.
pub fn flush(dir: &Path, state: &mut AppState) {
    if state.dirty_teams {
        save_teams(dir, state);
        state.dirty_teams = false;
    }
    if state.dirty_results {
        save_results(dir, state);
        state.dirty_results = false;
    }
    if state.dirty_selection {
        save_selection(dir, state);
        state.dirty_selection = false;
    }
}

pub fn save_teams(dir: &Path, state: &AppState) {
    if let Ok(json) = serde_json::to_string(&state.teams) {
        write_key(dir, TEAMS_KEY, &json);
    }
}

pub fn save_results(dir: &Path, state: &AppState) {
    if let Ok(json) = serde_json::to_string(&state.game_results) {
        write_key(dir, RESULTS_KEY, &json);
    }
}

pub fn save_selection(dir: &Path, state: &AppState) {
    write_key(dir, SELECTION_KEY, &state.current_team);
}

fn write_key(dir: &Path, key: &str, value: &str) {
    let _ = fs::create_dir_all(dir);
    let path = dir.join(key);
    let tmp = dir.join(format!("{key}.tmp"));
    if fs::write(&tmp, value).is_ok() {
        let _ = fs::rename(&tmp, &path);
    }
}

/// Resolves the storage directory: explicit override, then XDG data home,
/// then ~/.local/share.
pub fn store_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("ENERGY_STORE_DIR") {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    if let Ok(base) = std::env::var("XDG_DATA_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(STORE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(STORE_DIR),
    )
}
