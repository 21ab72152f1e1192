use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How long a toast stays fully visible, and how long the fade tail lasts.
pub const TOAST_SECS: u64 = 3;
pub const TOAST_FADE_MS: u64 = 300;

const MAX_TOASTS: usize = 6;
const MAX_LOGS: usize = 200;

/// A registered team. Field names follow the serialized records in the
/// `energyTeams` store, so previously written data loads unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub games_played: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-game ledger: game id -> team name -> last score recorded for that
/// pair. Kept alongside the cumulative totals, not derived from them.
pub type GameResults = HashMap<String, HashMap<String, i64>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    EmptyName,
    DuplicateName(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::EmptyName => write!(f, "Введите название команды!"),
            RegistryError::DuplicateName(_) => write!(f, "Такая команда уже существует!"),
        }
    }
}

impl std::error::Error for RegistryError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub text: String,
    pub created: Instant,
}

impl Toast {
    pub fn new(kind: ToastKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            created: Instant::now(),
        }
    }

    /// Inside the fade tail but not yet removable.
    pub fn is_fading(&self, now: Instant) -> bool {
        self.age(now) >= Duration::from_secs(TOAST_SECS) && !self.is_expired(now)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.age(now) >= Duration::from_secs(TOAST_SECS) + Duration::from_millis(TOAST_FADE_MS)
    }

    fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    TeamList,
    NameInput,
}

/// One row of the team selector. Row 0 is always the "no selection"
/// placeholder; team rows index into `AppState::teams`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorRow {
    NoSelection,
    Team(usize),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub teams: Vec<Team>,
    pub current_team: String,
    pub game_results: GameResults,

    // Stores touched since the last flush.
    pub dirty_teams: bool,
    pub dirty_results: bool,
    pub dirty_selection: bool,

    pub focus: Focus,
    pub selected: usize,
    pub name_input: String,
    pub results_overlay: bool,
    pub results_scroll: u16,
    pub help_overlay: bool,
    pub toasts: VecDeque<Toast>,
    pub logs: VecDeque<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            teams: Vec::new(),
            current_team: String::new(),
            game_results: HashMap::new(),
            dirty_teams: false,
            dirty_results: false,
            dirty_selection: false,
            focus: Focus::TeamList,
            selected: 0,
            name_input: String::new(),
            results_overlay: false,
            results_scroll: 0,
            help_overlay: false,
            toasts: VecDeque::with_capacity(MAX_TOASTS),
            logs: VecDeque::with_capacity(MAX_LOGS),
        }
    }

    /// Registers a new team and makes it the current selection. The typed-in
    /// name is validated after trimming; the registry is left untouched on
    /// failure so the input can be corrected.
    pub fn create_team(&mut self, raw_name: &str) -> Result<String, RegistryError> {
        let name = raw_name.trim().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.teams.iter().any(|t| t.name == name) {
            return Err(RegistryError::DuplicateName(name));
        }

        self.teams.push(Team {
            name: name.clone(),
            score: 0,
            games_played: Vec::new(),
            created_at: Utc::now(),
        });
        self.dirty_teams = true;
        self.select_team(&name);
        Ok(name)
    }

    /// Sets the current selection. Empty string means "none". No existence
    /// check: a stale persisted selection stays until the user changes it.
    pub fn select_team(&mut self, name: &str) {
        self.current_team = name.to_string();
        self.dirty_selection = true;
        self.selected = match self.teams.iter().position(|t| t.name == name) {
            Some(idx) => idx + 1,
            None => 0,
        };
    }

    /// Records a game result. Unknown teams are ignored entirely: nothing is
    /// mutated, no store is marked dirty, and `false` comes back.
    ///
    /// Re-recording a (team, game) pair overwrites the ledger entry but adds
    /// to the cumulative total again; `games_played` keeps the game once.
    pub fn record_score(&mut self, team_name: &str, game_id: &str, points: i64) -> bool {
        let Some(team) = self.teams.iter_mut().find(|t| t.name == team_name) else {
            return false;
        };

        self.game_results
            .entry(game_id.to_string())
            .or_default()
            .insert(team_name.to_string(), points);

        team.score += points;
        if !team.games_played.iter().any(|g| g == game_id) {
            team.games_played.push(game_id.to_string());
        }

        self.dirty_teams = true;
        self.dirty_results = true;
        true
    }

    /// Cumulative score, 0 for unknown teams. Never mutates.
    pub fn team_score(&self, team_name: &str) -> i64 {
        self.teams
            .iter()
            .find(|t| t.name == team_name)
            .map(|t| t.score)
            .unwrap_or(0)
    }

    /// Teams ordered by score descending. The sort is stable over the
    /// insertion-ordered registry, so equal scores keep creation order.
    pub fn standings(&self) -> Vec<&Team> {
        let mut rows: Vec<&Team> = self.teams.iter().collect();
        rows.sort_by(|a, b| b.score.cmp(&a.score));
        rows
    }

    pub fn selector_rows(&self) -> Vec<SelectorRow> {
        let mut rows = Vec::with_capacity(self.teams.len() + 1);
        rows.push(SelectorRow::NoSelection);
        for idx in 0..self.teams.len() {
            rows.push(SelectorRow::Team(idx));
        }
        rows
    }

    pub fn selector_label(&self, row: SelectorRow) -> String {
        match row {
            SelectorRow::NoSelection => "Выберите команду...".to_string(),
            SelectorRow::Team(idx) => match self.teams.get(idx) {
                Some(team) => format!("{} - {} баллов", team.name, team.score),
                None => String::new(),
            },
        }
    }

    pub fn banner_line(&self) -> String {
        if self.current_team.is_empty() {
            "Команда не выбрана".to_string()
        } else {
            format!(
                "Текущая команда: {} {} баллов",
                self.current_team,
                self.team_score(&self.current_team)
            )
        }
    }

    pub fn select_next(&mut self) {
        let total = self.selector_rows().len();
        self.selected = (self.selected + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.selector_rows().len();
        if self.selected == 0 {
            self.selected = total - 1;
        } else {
            self.selected -= 1;
        }
    }

    /// Applies the selector row under the cursor as the current selection.
    pub fn activate_selected(&mut self) {
        match self.selector_rows().get(self.selected) {
            Some(SelectorRow::NoSelection) => self.select_team(""),
            Some(SelectorRow::Team(idx)) => {
                if let Some(name) = self.teams.get(*idx).map(|t| t.name.clone()) {
                    self.select_team(&name);
                }
            }
            None => {}
        }
    }

    pub fn push_toast(&mut self, kind: ToastKind, text: impl Into<String>) {
        self.toasts.push_back(Toast::new(kind, text));
        while self.toasts.len() > MAX_TOASTS {
            self.toasts.pop_front();
        }
    }

    pub fn prune_toasts(&mut self, now: Instant) {
        self.toasts.retain(|t| !t.is_expired(now));
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn clear_dirty(&mut self) {
        self.dirty_teams = false;
        self.dirty_results = false;
        self.dirty_selection = false;
    }
}

/// Updates pushed by a provider thread into the UI loop.
#[derive(Debug, Clone)]
pub enum Delta {
    ScoreReport {
        team: String,
        game: String,
        points: i64,
    },
    Log(String),
}

/// Requests sent from the UI loop to a provider thread.
#[derive(Debug, Clone)]
pub enum ProviderCommand {
    SimulateGame { teams: Vec<String> },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::ScoreReport { team, game, points } => {
            if state.record_score(&team, &game, points) {
                state.push_toast(
                    ToastKind::Success,
                    format!("{team} получила {points} баллов в игре \"{game}\"!"),
                );
                state.push_log(format!("[INFO] Score: {team} +{points} ({game})"));
            } else {
                // Reports for unregistered teams are dropped without touching
                // the registry, the ledger, or the stores.
                state.push_log(format!("[WARN] Score report for unknown team \"{team}\""));
            }
        }
        Delta::Log(line) => state.push_log(line),
    }
}
