use std::collections::VecDeque;
use std::env;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::predict::{self, MatchPrediction, Side, TeamStatistics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeagueMode {
    SerieA,
    LaLiga,
    Bundesliga,
    Ligue1,
    PremierLeague,
    Brasileirao,
}

impl LeagueMode {
    pub const ALL: [LeagueMode; 6] = [
        LeagueMode::SerieA,
        LeagueMode::LaLiga,
        LeagueMode::Bundesliga,
        LeagueMode::Ligue1,
        LeagueMode::PremierLeague,
        LeagueMode::Brasileirao,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Matches,
    History,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamEntry {
    pub name: String,
    pub stats: TeamStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: String,
    pub league: LeagueMode,
    pub kickoff: DateTime<Utc>,
    pub home: TeamEntry,
    pub away: TeamEntry,
}

impl Fixture {
    pub fn team(&self, side: Side) -> &TeamEntry {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    pub fn title(&self) -> String {
        format!("{} x {}", self.home.name, self.away.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchView {
    pub fixture: Fixture,
    pub prediction: MatchPrediction,
}

impl MatchView {
    pub fn from_fixture(fixture: Fixture) -> Self {
        let prediction = predict::predict_match(&fixture.home.stats, &fixture.away.stats);
        Self {
            fixture,
            prediction,
        }
    }

    pub fn id(&self) -> &str {
        &self.fixture.id
    }

    pub fn suggestion_text(&self) -> String {
        let s = &self.prediction.suggestion;
        format!(
            "{} {} ({}%)",
            self.fixture.team(s.team).name,
            predict::market_label(s.market),
            s.probability
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub saved_at: DateTime<Utc>,
    pub match_id: String,
    pub view: MatchView,
}

#[derive(Debug, Clone, Default)]
pub struct ExportStatus {
    pub path: Option<String>,
    pub rows: usize,
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub matches: Vec<MatchView>,
    pub league_mode: LeagueMode,
    pub query: String,
    pub search_active: bool,
    pub selected: usize,
    pub history: Vec<HistoryEntry>,
    pub history_selected: usize,
    pub view: View,
    pub loading: bool,
    pub help_overlay: bool,
    pub last_export: ExportStatus,
    pub logs: VecDeque<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        let league_mode = env::var("SCOUT_LEAGUE")
            .ok()
            .and_then(|raw| league_from_key(&raw))
            .unwrap_or(LeagueMode::SerieA);
        Self::with_league(league_mode)
    }

    pub fn with_league(league_mode: LeagueMode) -> Self {
        Self {
            matches: Vec::new(),
            league_mode,
            query: String::new(),
            search_active: false,
            selected: 0,
            history: Vec::new(),
            history_selected: 0,
            view: View::Matches,
            loading: false,
            help_overlay: false,
            last_export: ExportStatus::default(),
            logs: VecDeque::new(),
        }
    }

    pub fn filtered_matches(&self) -> Vec<&MatchView> {
        let query = self.query.to_lowercase();
        self.matches
            .iter()
            .filter(|m| m.fixture.league == self.league_mode)
            .filter(|m| {
                query.is_empty()
                    || m.fixture.home.name.to_lowercase().contains(&query)
                    || m.fixture.away.name.to_lowercase().contains(&query)
            })
            .collect()
    }

    pub fn selected_match(&self) -> Option<&MatchView> {
        self.filtered_matches().get(self.selected).copied()
    }

    pub fn selected_match_id(&self) -> Option<String> {
        self.selected_match().map(|m| m.id().to_string())
    }

    pub fn selected_history(&self) -> Option<&HistoryEntry> {
        self.history.get(self.history_selected)
    }

    pub fn cycle_league_mode(&mut self) {
        let idx = league_index(self.league_mode);
        self.league_mode = LeagueMode::ALL[(idx + 1) % LeagueMode::ALL.len()];
        self.selected = 0;
    }

    pub fn cycle_league_mode_back(&mut self) {
        let idx = league_index(self.league_mode);
        let len = LeagueMode::ALL.len();
        self.league_mode = LeagueMode::ALL[(idx + len - 1) % len];
        self.selected = 0;
    }

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            View::Matches => View::History,
            View::History => View::Matches,
        };
    }

    pub fn select_next(&mut self) {
        match self.view {
            View::Matches => {
                let total = self.filtered_matches().len();
                if total > 0 && self.selected + 1 < total {
                    self.selected += 1;
                }
            }
            View::History => {
                if self.history_selected + 1 < self.history.len() {
                    self.history_selected += 1;
                }
            }
        }
    }

    pub fn select_prev(&mut self) {
        match self.view {
            View::Matches => self.selected = self.selected.saturating_sub(1),
            View::History => self.history_selected = self.history_selected.saturating_sub(1),
        }
    }

    pub fn clamp_selection(&mut self) {
        let total = self.filtered_matches().len();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }

    pub fn begin_search(&mut self) {
        self.search_active = true;
    }

    pub fn end_search(&mut self) {
        self.search_active = false;
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.query.push(ch);
        self.selected = 0;
    }

    pub fn pop_search_char(&mut self) {
        self.query.pop();
        self.selected = 0;
    }

    pub fn clear_search(&mut self) {
        self.query.clear();
        self.search_active = false;
        self.selected = 0;
    }

    /// Snapshots the selected match at the front of the history.
    pub fn save_selected_to_history(&mut self, now: DateTime<Utc>) -> bool {
        let Some(view) = self.selected_match().cloned() else {
            self.push_log("[INFO] No match selected to save");
            return false;
        };
        self.push_log(format!("[INFO] Saved {} to history", view.fixture.title()));
        self.history.insert(
            0,
            HistoryEntry {
                saved_at: now,
                match_id: view.fixture.id.clone(),
                view,
            },
        );
        self.history_selected = 0;
        true
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetFixtures(Vec<Fixture>),
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    Refresh,
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetFixtures(fixtures) => {
            let selected_id = state.selected_match_id();
            state.matches = fixtures.into_iter().map(MatchView::from_fixture).collect();
            state.loading = false;

            let position = selected_id.and_then(|id| {
                state
                    .filtered_matches()
                    .iter()
                    .position(|m| m.id() == id)
            });
            match position {
                Some(idx) => state.selected = idx,
                None => state.clamp_selection(),
            }
            let count = state.matches.len();
            state.push_log(format!("[INFO] Loaded {count} matches"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

fn league_index(mode: LeagueMode) -> usize {
    LeagueMode::ALL
        .iter()
        .position(|m| *m == mode)
        .unwrap_or(0)
}

pub fn league_label(mode: LeagueMode) -> &'static str {
    match mode {
        LeagueMode::SerieA => "Serie A (Italy)",
        LeagueMode::LaLiga => "La Liga (Spain)",
        LeagueMode::Bundesliga => "Bundesliga (Germany)",
        LeagueMode::Ligue1 => "Ligue 1 (France)",
        LeagueMode::PremierLeague => "Premier League (England)",
        LeagueMode::Brasileirao => "Serie A (Brazil)",
    }
}

pub fn league_key(mode: LeagueMode) -> &'static str {
    match mode {
        LeagueMode::SerieA => "italy-serie-a",
        LeagueMode::LaLiga => "spain-laliga",
        LeagueMode::Bundesliga => "germany-bundesliga",
        LeagueMode::Ligue1 => "france-ligue1",
        LeagueMode::PremierLeague => "england-premier",
        LeagueMode::Brasileirao => "brazil-serie-a",
    }
}

pub fn league_from_key(raw: &str) -> Option<LeagueMode> {
    let key = raw.trim().to_lowercase();
    LeagueMode::ALL
        .into_iter()
        .find(|mode| league_key(*mode) == key)
}
