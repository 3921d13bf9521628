use chrono::{TimeZone, Utc};

use scout_predict::feed::{StatSource, generate_fixtures};
use scout_predict::predict::{Side, TeamStatistics};
use scout_predict::state::{
    AppState, Delta, Fixture, LeagueMode, TeamEntry, View, apply_delta, league_from_key,
    league_key,
};

struct FixedStats;

impl StatSource for FixedStats {
    fn team_stats(&mut self, side: Side) -> TeamStatistics {
        match side {
            Side::Home => TeamStatistics::new(3.5, 3.5, 1.5),
            Side::Away => TeamStatistics::new(6.5, 2.0, 2.2),
        }
    }
}

fn fixture(id: &str, league: LeagueMode, home: &str, away: &str) -> Fixture {
    Fixture {
        id: id.to_string(),
        league,
        kickoff: Utc.with_ymd_and_hms(2025, 9, 14, 18, 0, 0).unwrap(),
        home: TeamEntry {
            name: home.to_string(),
            stats: TeamStatistics::new(4.0, 3.0, 1.2),
        },
        away: TeamEntry {
            name: away.to_string(),
            stats: TeamStatistics::new(3.0, 4.0, 1.8),
        },
    }
}

fn loaded_state() -> AppState {
    let mut state = AppState::with_league(LeagueMode::SerieA);
    apply_delta(
        &mut state,
        Delta::SetFixtures(vec![
            fixture("1", LeagueMode::SerieA, "Juventus", "Torino"),
            fixture("2", LeagueMode::SerieA, "Inter", "Milan"),
            fixture("3", LeagueMode::LaLiga, "Real Madrid", "Atletico"),
            fixture("4", LeagueMode::SerieA, "Roma", "Lazio"),
        ]),
    );
    state
}

#[test]
fn set_fixtures_computes_predictions_and_clears_loading() {
    let mut state = AppState::with_league(LeagueMode::SerieA);
    state.loading = true;
    let now = Utc.with_ymd_and_hms(2025, 9, 14, 12, 0, 0).unwrap();
    apply_delta(
        &mut state,
        Delta::SetFixtures(generate_fixtures(&mut FixedStats, 6, now)),
    );

    assert!(!state.loading);
    assert_eq!(state.matches.len(), 36);
    let first = &state.matches[0];
    assert_eq!(first.fixture.id, "1");
    assert_eq!(first.fixture.home.name, "Team italy_1");
    assert_eq!(first.fixture.away.name, "Team italy_2");
    assert_eq!(first.prediction.home.corner35, 50);
    assert_eq!(first.prediction.away.corner35, 98);
    assert_eq!(first.suggestion_text(), "Team italy_2 +3.5 corners (98%)");
    assert!(state.logs.back().is_some_and(|l| l.contains("36 matches")));
}

#[test]
fn generated_slate_uses_league_prefixes_and_day_offsets() {
    let now = Utc.with_ymd_and_hms(2025, 9, 14, 12, 0, 0).unwrap();
    let fixtures = generate_fixtures(&mut FixedStats, 3, now);
    assert_eq!(fixtures.len(), 18);
    assert_eq!(fixtures[0].kickoff, now - chrono::Duration::days(1));
    assert_eq!(fixtures[2].kickoff, now + chrono::Duration::days(1));
    assert_eq!(fixtures[3].league, LeagueMode::LaLiga);
    assert_eq!(fixtures[3].id, "4");
    assert_eq!(fixtures[3].home.name, "Team spain_1");
    assert_eq!(fixtures[17].away.name, "Team brazil_6");
}

#[test]
fn filter_applies_league_and_case_insensitive_query() {
    let mut state = loaded_state();
    assert_eq!(state.filtered_matches().len(), 3);

    for ch in "MIL".chars() {
        state.push_search_char(ch);
    }
    let filtered = state.filtered_matches();
    let ids: Vec<&str> = filtered.iter().map(|m| m.id()).collect();
    assert_eq!(ids, vec!["2"]);

    state.clear_search();
    state.cycle_league_mode();
    assert_eq!(state.league_mode, LeagueMode::LaLiga);
    let filtered = state.filtered_matches();
    let ids: Vec<&str> = filtered.iter().map(|m| m.id()).collect();
    assert_eq!(ids, vec!["3"]);
}

#[test]
fn query_whitespace_is_part_of_the_search() {
    let mut state = loaded_state();
    for ch in "a ".chars() {
        state.push_search_char(ch);
    }
    assert!(state.filtered_matches().is_empty());

    state.clear_search();
    for ch in "inter ".chars() {
        state.push_search_char(ch);
    }
    assert!(state.filtered_matches().is_empty());
    state.pop_search_char();
    assert_eq!(state.selected_match_id().as_deref(), Some("2"));
}

#[test]
fn query_with_no_hits_leaves_nothing_selected() {
    let mut state = loaded_state();
    for ch in "zzz".chars() {
        state.push_search_char(ch);
    }
    assert!(state.filtered_matches().is_empty());
    assert!(state.selected_match().is_none());
    state.pop_search_char();
    state.pop_search_char();
    state.pop_search_char();
    assert_eq!(state.filtered_matches().len(), 3);
}

#[test]
fn league_cycle_wraps_both_ways() {
    let mut state = AppState::with_league(LeagueMode::SerieA);
    state.cycle_league_mode_back();
    assert_eq!(state.league_mode, LeagueMode::Brasileirao);
    state.cycle_league_mode();
    assert_eq!(state.league_mode, LeagueMode::SerieA);
    for _ in 0..LeagueMode::ALL.len() {
        state.cycle_league_mode();
    }
    assert_eq!(state.league_mode, LeagueMode::SerieA);
}

#[test]
fn selection_stays_within_filtered_list() {
    let mut state = loaded_state();
    state.select_next();
    state.select_next();
    state.select_next();
    state.select_next();
    assert_eq!(state.selected, 2);
    assert_eq!(state.selected_match_id().as_deref(), Some("4"));
    state.select_prev();
    assert_eq!(state.selected_match_id().as_deref(), Some("2"));
}

#[test]
fn refresh_keeps_selected_match_by_id() {
    let mut state = loaded_state();
    state.select_next();
    assert_eq!(state.selected_match_id().as_deref(), Some("2"));

    apply_delta(
        &mut state,
        Delta::SetFixtures(vec![
            fixture("4", LeagueMode::SerieA, "Roma", "Lazio"),
            fixture("2", LeagueMode::SerieA, "Inter", "Milan"),
        ]),
    );
    assert_eq!(state.selected, 1);
    assert_eq!(state.selected_match_id().as_deref(), Some("2"));
}

#[test]
fn refresh_clamps_selection_when_match_disappears() {
    let mut state = loaded_state();
    state.select_next();
    state.select_next();
    apply_delta(
        &mut state,
        Delta::SetFixtures(vec![fixture("9", LeagueMode::SerieA, "Napoli", "Genoa")]),
    );
    assert_eq!(state.selected, 0);
    assert_eq!(state.selected_match_id().as_deref(), Some("9"));
}

#[test]
fn history_is_newest_first() {
    let mut state = loaded_state();
    let t1 = Utc.with_ymd_and_hms(2025, 9, 14, 12, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2025, 9, 14, 12, 5, 0).unwrap();

    assert!(state.save_selected_to_history(t1));
    state.select_next();
    assert!(state.save_selected_to_history(t2));

    assert_eq!(state.history.len(), 2);
    assert_eq!(state.history[0].match_id, "2");
    assert_eq!(state.history[0].saved_at, t2);
    assert_eq!(state.history[1].match_id, "1");
    assert_eq!(state.history[0].view.prediction, state.matches[1].prediction);
}

#[test]
fn saving_with_empty_filter_is_a_no_op() {
    let mut state = AppState::with_league(LeagueMode::Ligue1);
    assert!(!state.save_selected_to_history(Utc::now()));
    assert!(state.history.is_empty());
    assert!(state.logs.back().is_some_and(|l| l.starts_with("[INFO]")));
}

#[test]
fn history_view_moves_its_own_cursor() {
    let mut state = loaded_state();
    state.save_selected_to_history(Utc::now());
    state.select_next();
    state.save_selected_to_history(Utc::now());

    state.toggle_view();
    assert_eq!(state.view, View::History);
    let before = state.selected;
    state.select_next();
    assert_eq!(state.history_selected, 1);
    assert_eq!(state.selected, before);
    state.select_next();
    assert_eq!(state.history_selected, 1);
}

#[test]
fn log_delta_is_capped() {
    let mut state = AppState::with_league(LeagueMode::SerieA);
    for i in 0..250 {
        apply_delta(&mut state, Delta::Log(format!("[INFO] line {i}")));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("[INFO] line 50"));
}

#[test]
fn league_keys_round_trip() {
    for mode in LeagueMode::ALL {
        assert_eq!(league_from_key(league_key(mode)), Some(mode));
    }
    assert_eq!(league_from_key(" England-Premier "), Some(LeagueMode::PremierLeague));
    assert_eq!(league_from_key("mls"), None);
}
