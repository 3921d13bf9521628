use serde::{Deserialize, Serialize};

const CORNER35_LINE: f64 = 3.5;
const CORNER45_LINE: f64 = 4.5;
const CARDS15_LINE: f64 = 1.5;

const CORNER35_BASE: f64 = 50.0;
const CORNER45_BASE: f64 = 40.0;
const CARDS15_BASE: f64 = 35.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentMatch {
    pub corners: u8,
    pub cards: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStatistics {
    pub avg_corners_for: f64,
    pub avg_corners_against: f64,
    pub avg_cards_for: f64,
    // Display only; the scoring below never reads it.
    #[serde(default)]
    pub last_five: Vec<RecentMatch>,
}

impl TeamStatistics {
    pub fn new(avg_corners_for: f64, avg_corners_against: f64, avg_cards_for: f64) -> Self {
        Self {
            avg_corners_for,
            avg_corners_against,
            avg_cards_for,
            last_five: Vec::new(),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.avg_corners_for.is_finite()
            && self.avg_corners_against.is_finite()
            && self.avg_cards_for.is_finite()
    }
}

/// Per-team market probabilities, whole percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketProbabilities {
    pub corner35: u8,
    pub corner45: u8,
    pub cards15: u8,
}

impl MarketProbabilities {
    pub fn get(&self, market: Market) -> u8 {
        match market {
            Market::Corner35 => self.corner35,
            Market::Corner45 => self.corner45,
            Market::Cards15 => self.cards15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    Corner35,
    Corner45,
    Cards15,
}

impl Market {
    pub const ALL: [Market; 3] = [Market::Corner35, Market::Corner45, Market::Cards15];

    /// Clamp band `(min, max)` the market's probability is kept inside.
    pub fn band(self) -> (f64, f64) {
        match self {
            Market::Corner35 => (5.0, 98.0),
            Market::Corner45 => (3.0, 97.0),
            Market::Cards15 => (2.0, 96.0),
        }
    }
}

pub fn market_label(market: Market) -> &'static str {
    match market {
        Market::Corner35 => "+3.5 corners",
        Market::Corner45 => "+4.5 corners",
        Market::Cards15 => "+1.5 cards",
    }
}

pub fn side_label(side: Side) -> &'static str {
    match side {
        Side::Home => "home",
        Side::Away => "away",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub team: Side,
    pub market: Market,
    pub probability: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPrediction {
    pub home: MarketProbabilities,
    pub away: MarketProbabilities,
    pub suggestion: Opportunity,
}

impl MatchPrediction {
    pub fn for_side(&self, side: Side) -> &MarketProbabilities {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }
}

/// Maps one team's averages to its corner and card market probabilities.
///
/// Each market starts from a baseline anchored at its line (50% at 3.5
/// corners, 40% at 4.5 corners, 35% at 1.5 cards) and is shifted linearly by
/// the distance from that line; the corner markets also move with the team's
/// net corner dominance. Results are clamped to the market band and rounded
/// to the nearest whole percent, halves away from zero.
///
/// Inputs must be finite. Out-of-range averages are fine: the clamp is what
/// bounds the output.
pub fn compute_market_probabilities(stats: &TeamStatistics) -> MarketProbabilities {
    debug_assert!(stats.is_finite(), "non-finite team statistics: {stats:?}");

    let corner_bias = stats.avg_corners_for - stats.avg_corners_against;

    let corner35_score = (stats.avg_corners_for - CORNER35_LINE) * 12.0 + corner_bias * 6.0;
    let corner45_score = (stats.avg_corners_for - CORNER45_LINE) * 12.0 + corner_bias * 5.0;
    let cards_score = (stats.avg_cards_for - CARDS15_LINE) * 25.0 + stats.avg_cards_for * 8.0;

    MarketProbabilities {
        corner35: to_percent(CORNER35_BASE + corner35_score, Market::Corner35),
        corner45: to_percent(CORNER45_BASE + corner45_score, Market::Corner45),
        cards15: to_percent(CARDS15_BASE + cards_score, Market::Cards15),
    }
}

fn to_percent(raw: f64, market: Market) -> u8 {
    let (lo, hi) = market.band();
    raw.clamp(lo, hi).round() as u8
}

/// All six team/market candidates, best first. Ties keep the fixed order
/// home before away, then corner35, corner45, cards15.
pub fn rank_opportunities(
    home: &MarketProbabilities,
    away: &MarketProbabilities,
) -> Vec<Opportunity> {
    let mut items: Vec<Opportunity> = [(Side::Home, home), (Side::Away, away)]
        .into_iter()
        .flat_map(|(team, probs)| {
            Market::ALL.into_iter().map(move |market| Opportunity {
                team,
                market,
                probability: probs.get(market),
            })
        })
        .collect();
    // `sort_by` is stable, which is what keeps the tie order.
    items.sort_by(|a, b| b.probability.cmp(&a.probability));
    items
}

pub fn pick_best_opportunity(home: &MarketProbabilities, away: &MarketProbabilities) -> Opportunity {
    let mut best = Opportunity {
        team: Side::Home,
        market: Market::Corner35,
        probability: home.corner35,
    };
    for (team, probs) in [(Side::Home, home), (Side::Away, away)] {
        for market in Market::ALL {
            let probability = probs.get(market);
            if probability > best.probability {
                best = Opportunity {
                    team,
                    market,
                    probability,
                };
            }
        }
    }
    best
}

pub fn predict_match(home: &TeamStatistics, away: &TeamStatistics) -> MatchPrediction {
    let home = compute_market_probabilities(home);
    let away = compute_market_probabilities(away);
    let suggestion = pick_best_opportunity(&home, &away);
    MatchPrediction {
        home,
        away,
        suggestion,
    }
}
