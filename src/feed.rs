use std::env;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::predict::{RecentMatch, Side, TeamStatistics};
use crate::state::{Delta, Fixture, LeagueMode, ProviderCommand, TeamEntry, league_key};

pub const DEFAULT_MATCHES_PER_LEAGUE: usize = 6;

/// Where team statistics come from. The mock provider draws them at random;
/// tests plug in fixed numbers.
pub trait StatSource {
    fn team_stats(&mut self, side: Side) -> TeamStatistics;
}

pub struct RandomStats<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomStats<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomStats<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> StatSource for RandomStats<R> {
    fn team_stats(&mut self, side: Side) -> TeamStatistics {
        // Away sides are drawn from slightly weaker ranges.
        let (corners_for, corners_against, cards_for) = match side {
            Side::Home => ((2.5, 6.5), (2.0, 5.0), (0.8, 2.2)),
            Side::Away => ((2.0, 6.0), (2.0, 5.5), (0.7, 2.0)),
        };
        let rng = &mut self.rng;
        let avg_corners_for = random_avg(rng, corners_for);
        let avg_corners_against = random_avg(rng, corners_against);
        let avg_cards_for = random_avg(rng, cards_for);
        let last_five = (0..5)
            .map(|_| RecentMatch {
                corners: rng.gen_range(0..8),
                cards: rng.gen_range(0..4),
            })
            .collect();
        TeamStatistics {
            avg_corners_for,
            avg_corners_against,
            avg_cards_for,
            last_five,
        }
    }
}

fn random_avg(rng: &mut impl Rng, (min, max): (f64, f64)) -> f64 {
    let raw = rng.gen_range(min..max);
    (raw * 100.0).round() / 100.0
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub matches_per_league: usize,
    pub seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            matches_per_league: DEFAULT_MATCHES_PER_LEAGUE,
            seed: None,
        }
    }
}

impl FeedConfig {
    pub fn from_env() -> Self {
        let matches_per_league = env::var("SCOUT_MATCHES_PER_LEAGUE")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_MATCHES_PER_LEAGUE)
            .clamp(1, 20);
        let seed = env::var("SCOUT_SEED")
            .ok()
            .and_then(|val| val.trim().parse::<u64>().ok());
        Self {
            matches_per_league,
            seed,
        }
    }
}

/// Builds a full slate: `per_league` fixtures for every league, ids counting
/// up from "1", kickoffs spread from yesterday onwards.
pub fn generate_fixtures(
    source: &mut impl StatSource,
    per_league: usize,
    now: DateTime<Utc>,
) -> Vec<Fixture> {
    let mut fixtures = Vec::with_capacity(LeagueMode::ALL.len() * per_league);
    let mut next_id = 1usize;
    for league in LeagueMode::ALL {
        let prefix = team_prefix(league);
        for i in 0..per_league {
            let kickoff = now + ChronoDuration::days(i as i64 - 1);
            fixtures.push(Fixture {
                id: next_id.to_string(),
                league,
                kickoff,
                home: TeamEntry {
                    name: format!("Team {prefix}_{}", i * 2 + 1),
                    stats: source.team_stats(Side::Home),
                },
                away: TeamEntry {
                    name: format!("Team {prefix}_{}", i * 2 + 2),
                    stats: source.team_stats(Side::Away),
                },
            });
            next_id += 1;
        }
    }
    fixtures
}

fn team_prefix(league: LeagueMode) -> &'static str {
    let key = league_key(league);
    key.split('-').next().unwrap_or(key)
}

pub fn spawn_mock_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    let config = FeedConfig::from_env();
    thread::spawn(move || {
        let mut source = match config.seed {
            Some(seed) => {
                let _ = tx.send(Delta::Log(format!("[INFO] Mock feed seeded with {seed}")));
                RandomStats::seeded(seed)
            }
            None => RandomStats::from_entropy(),
        };

        publish(&mut source, &config, &tx);

        // Exits once the UI drops its command sender.
        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ProviderCommand::Refresh => publish(&mut source, &config, &tx),
            }
        }
    });
}

fn publish(source: &mut impl StatSource, config: &FeedConfig, tx: &Sender<Delta>) {
    let fixtures = generate_fixtures(source, config.matches_per_league, Utc::now());
    let _ = tx.send(Delta::SetFixtures(fixtures));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_stats_stay_in_ranges() {
        let mut source = RandomStats::seeded(7);
        for _ in 0..200 {
            let home = source.team_stats(Side::Home);
            assert!((2.5..=6.5).contains(&home.avg_corners_for));
            assert!((2.0..=5.0).contains(&home.avg_corners_against));
            assert!((0.8..=2.2).contains(&home.avg_cards_for));
            assert_eq!(home.last_five.len(), 5);
            assert!(home.last_five.iter().all(|m| m.corners < 8 && m.cards < 4));

            let away = source.team_stats(Side::Away);
            assert!((2.0..=6.0).contains(&away.avg_corners_for));
            assert!((2.0..=5.5).contains(&away.avg_corners_against));
            assert!((0.7..=2.0).contains(&away.avg_cards_for));
        }
    }

    #[test]
    fn averages_have_two_decimals() {
        let mut source = RandomStats::seeded(11);
        let stats = source.team_stats(Side::Home);
        let scaled = stats.avg_corners_for * 100.0;
        assert!((scaled - scaled.round()).abs() < 1e-6);
    }

    #[test]
    fn same_seed_same_slate() {
        let now = Utc::now();
        let a = generate_fixtures(&mut RandomStats::seeded(42), 2, now);
        let b = generate_fixtures(&mut RandomStats::seeded(42), 2, now);
        assert_eq!(a, b);
    }
}
