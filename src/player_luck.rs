use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::finishing::{FinishingBadge, FinishingDeltas, classify_with_psxg};
use crate::state::{PlayerStats, Position};
use crate::team_analysis::round_dp;
use crate::team_luck::clean_sheet_luck;

// Under three full matches the sample says nothing.
const MIN_SAMPLE_MINUTES: u32 = 270;

/// Size of the served player feed.
pub const FEED_LIMIT: usize = 30;
// Non-scorers stay in the feed only above this much xG.
const FEED_MIN_XG: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LuckVerdict {
    Buy,
    Hold,
    Trap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

fn due_a_haul(luck: f64) -> bool {
    luck <= -1.5
}

fn undervalued(luck: f64) -> bool {
    luck <= -0.5
}

fn regression_risk(luck: f64) -> bool {
    luck >= 1.5
}

fn sell_high(luck: f64) -> bool {
    luck >= 0.5
}

/// Step bands on luck score. BUY rows are upper bounds, TRAP rows lower bounds; the first hit
/// wins, so the extreme band of each side must come before the mild one.
struct LuckBand {
    verdict: LuckVerdict,
    label: &'static str,
    applies: fn(f64) -> bool,
}

const LUCK_BANDS: &[LuckBand] = &[
    LuckBand {
        verdict: LuckVerdict::Buy,
        label: "DUE A HAUL",
        applies: due_a_haul,
    },
    LuckBand {
        verdict: LuckVerdict::Buy,
        label: "UNDERVALUED",
        applies: undervalued,
    },
    LuckBand {
        verdict: LuckVerdict::Trap,
        label: "REGRESSION RISK",
        applies: regression_risk,
    },
    LuckBand {
        verdict: LuckVerdict::Trap,
        label: "SELL HIGH",
        applies: sell_high,
    },
];

const HOLD_LABEL: &str = "FAIR VALUE";

/// Goals minus xG, two decimals.
pub fn luck_score(actual_goals: u32, xg: f64) -> f64 {
    round_dp(f64::from(actual_goals) - xg, 2)
}

pub fn verdict(luck: f64) -> (LuckVerdict, &'static str) {
    LUCK_BANDS
        .iter()
        .find(|band| (band.applies)(luck))
        .map(|band| (band.verdict, band.label))
        .unwrap_or((LuckVerdict::Hold, HOLD_LABEL))
}

pub fn differential_value(luck: f64) -> f64 {
    round_dp((luck.abs() * 25.0).min(100.0), 1)
}

/// Unlucky players trend toward a haul; lucky ones away from it.
pub fn haul_potential(luck: f64) -> f64 {
    let swing = luck.abs() * 20.0;
    let value = if luck < 0.0 {
        (50.0 + swing).min(100.0)
    } else {
        (50.0 - swing).max(0.0)
    };
    round_dp(value, 1)
}

pub fn trap_indicator(luck: f64) -> f64 {
    let swing = luck.abs() * 20.0;
    let value = if luck > 0.0 {
        (50.0 + swing).min(100.0)
    } else {
        (50.0 - swing).max(0.0)
    };
    round_dp(value, 1)
}

pub fn risk_level(actual_goals: u32, xg: f64, minutes: u32) -> RiskLevel {
    if minutes < MIN_SAMPLE_MINUTES {
        return RiskLevel::Low;
    }
    let delta = (f64::from(actual_goals) - xg).abs();
    if delta >= 4.0 {
        RiskLevel::Critical
    } else if delta >= 2.5 {
        RiskLevel::High
    } else if delta >= 1.0 {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

/// Badge from goal and xG volume alone, for providers without post-shot data.
pub fn volume_badge(actual_goals: u32, xg: f64, minutes: u32) -> FinishingBadge {
    if minutes < MIN_SAMPLE_MINUTES {
        return FinishingBadge::Fair;
    }
    let goals = f64::from(actual_goals);
    let delta = goals - xg;
    let ratio = if xg > 0.0 { delta / xg } else { 0.0 };

    if delta <= -2.0 || (xg >= 3.0 && ratio <= -0.4) {
        FinishingBadge::Siege
    } else if delta >= 3.0 || (xg >= 2.0 && ratio >= 0.5) {
        FinishingBadge::Sniper
    } else if goals >= 3.0 && xg < 1.0 {
        FinishingBadge::Mirage
    } else if xg < 1.0 && actual_goals == 0 && minutes >= 900 {
        FinishingBadge::Wasteful
    } else {
        FinishingBadge::Fair
    }
}

pub fn player_badge(stats: &PlayerStats) -> FinishingBadge {
    match stats.psxg {
        Some(psxg) if psxg != 0.0 => classify_with_psxg(&FinishingDeltas::new(
            f64::from(stats.actual_goals),
            stats.xg,
            psxg,
        )),
        _ => volume_badge(stats.actual_goals, stats.xg, stats.minutes_played),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLuckData {
    pub id: u32,
    pub name: String,
    pub team: String,
    pub position: Option<Position>,
    pub price: f64,
    pub actual_goals: u32,
    #[serde(rename = "xG")]
    pub xg: f64,
    pub minutes_played: u32,
    pub luck_score: f64,
    pub verdict: LuckVerdict,
    pub verdict_label: String,
    pub differential_value: f64,
    pub haul_potential: f64,
    pub trap_indicator: f64,
    pub risk_level: RiskLevel,
    pub finishing_badge: FinishingBadge,
    /// Keepers and defenders only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean_sheet_luck: Option<f64>,
}

pub fn player_luck(stats: &PlayerStats) -> PlayerLuckData {
    let luck = luck_score(stats.actual_goals, stats.xg);
    let (verdict, label) = verdict(luck);
    PlayerLuckData {
        id: stats.id,
        name: stats.name.clone(),
        team: stats.team.clone(),
        position: stats.position,
        price: stats.price,
        actual_goals: stats.actual_goals,
        xg: round_dp(stats.xg, 2),
        minutes_played: stats.minutes_played,
        luck_score: luck,
        verdict,
        verdict_label: label.to_string(),
        differential_value: differential_value(luck),
        haul_potential: haul_potential(luck),
        trap_indicator: trap_indicator(luck),
        risk_level: risk_level(stats.actual_goals, stats.xg, stats.minutes_played),
        finishing_badge: player_badge(stats),
        clean_sheet_luck: player_clean_sheet_luck(stats),
    }
}

pub fn player_clean_sheet_luck(stats: &PlayerStats) -> Option<f64> {
    match stats.position {
        Some(Position::Goalkeeper | Position::Defender) => Some(clean_sheet_luck(
            stats.clean_sheets,
            stats.xgc,
            stats.minutes_played / 90,
        )),
        _ => None,
    }
}

/// Players worth classifying: some minutes, and either a goal or real xG. Top scorers first,
/// capped at `limit`.
pub fn relevant_players(players: &[PlayerStats], limit: usize) -> Vec<PlayerStats> {
    let mut picked: Vec<PlayerStats> = players
        .iter()
        .filter(|p| p.minutes_played > 0)
        .filter(|p| p.actual_goals > 0 || p.xg > FEED_MIN_XG)
        .cloned()
        .collect();
    picked.sort_by(|a, b| b.actual_goals.cmp(&a.actual_goals));
    picked.truncate(limit);
    picked
}

pub fn luck_for_all(players: &[PlayerStats]) -> Vec<PlayerLuckData> {
    players.iter().map(player_luck).collect()
}

/// Unluckiest BUY players first.
pub fn top_buys(players: &[PlayerLuckData], limit: usize) -> Vec<PlayerLuckData> {
    let mut buys: Vec<PlayerLuckData> = players
        .iter()
        .filter(|p| p.verdict == LuckVerdict::Buy)
        .cloned()
        .collect();
    buys.sort_by(|a, b| {
        a.luck_score
            .partial_cmp(&b.luck_score)
            .unwrap_or(Ordering::Equal)
    });
    buys.truncate(limit);
    buys
}

/// Luckiest TRAP players first.
pub fn top_traps(players: &[PlayerLuckData], limit: usize) -> Vec<PlayerLuckData> {
    let mut traps: Vec<PlayerLuckData> = players
        .iter()
        .filter(|p| p.verdict == LuckVerdict::Trap)
        .cloned()
        .collect();
    traps.sort_by(|a, b| {
        b.luck_score
            .partial_cmp(&a.luck_score)
            .unwrap_or(Ordering::Equal)
    });
    traps.truncate(limit);
    traps
}

/// Keepers and defenders by clean-sheet luck, luckiest first.
pub fn clean_sheet_leaders(players: &[PlayerLuckData]) -> Vec<PlayerLuckData> {
    let mut rows: Vec<PlayerLuckData> = players
        .iter()
        .filter(|p| p.clean_sheet_luck.is_some())
        .cloned()
        .collect();
    rows.sort_by(|a, b| {
        b.clean_sheet_luck
            .partial_cmp(&a.clean_sheet_luck)
            .unwrap_or(Ordering::Equal)
    });
    rows
}
