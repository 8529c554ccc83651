use serde::{Deserialize, Serialize};

use crate::finishing::{FinishingBadge, finishing_badge};
use crate::state::TeamStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EfficiencyStatus {
    CriticalOver,
    RunningHot,
    Sustainable,
    Cold,
    CriticalValue,
}

impl EfficiencyStatus {
    /// Buckets on goals - xG. Strict `>` on the top edge, inclusive everywhere else.
    pub fn from_delta(delta: f64) -> Self {
        if delta > 6.0 {
            EfficiencyStatus::CriticalOver
        } else if delta >= 2.0 {
            EfficiencyStatus::RunningHot
        } else if delta >= -2.0 {
            EfficiencyStatus::Sustainable
        } else if delta >= -6.0 {
            EfficiencyStatus::Cold
        } else {
            EfficiencyStatus::CriticalValue
        }
    }

    pub fn is_hot(self) -> bool {
        matches!(
            self,
            EfficiencyStatus::CriticalOver | EfficiencyStatus::RunningHot
        )
    }

    pub fn is_cold(self) -> bool {
        matches!(self, EfficiencyStatus::Cold | EfficiencyStatus::CriticalValue)
    }

    pub fn badge_label(self) -> &'static str {
        match self {
            EfficiencyStatus::CriticalOver => "CRIT OVER",
            EfficiencyStatus::RunningHot => "HEATING UP",
            EfficiencyStatus::Sustainable => "FAIR VALUE",
            EfficiencyStatus::Cold => "COLD",
            EfficiencyStatus::CriticalValue => "EXTREME VAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketVerdict {
    Dominant,
    Overheated,
    PrimeBuy,
    Critical,
    Stable,
    Fragile,
}

impl MarketVerdict {
    pub fn label(self) -> &'static str {
        match self {
            MarketVerdict::Dominant => "DOMINANT",
            MarketVerdict::Overheated => "OVERHEATED",
            MarketVerdict::PrimeBuy => "PRIME BUY",
            MarketVerdict::Critical => "CRITICAL",
            MarketVerdict::Stable => "STABLE",
            MarketVerdict::Fragile => "FRAGILE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChanceGrade {
    Elite,
    Good,
    Average,
    Poor,
    Broken,
}

impl ChanceGrade {
    pub fn from_xg_per_match(xg: f64) -> Self {
        if xg >= 2.0 {
            ChanceGrade::Elite
        } else if xg >= 1.5 {
            ChanceGrade::Good
        } else if xg >= 1.0 {
            ChanceGrade::Average
        } else if xg >= 0.5 {
            ChanceGrade::Poor
        } else {
            ChanceGrade::Broken
        }
    }
}

/// Colour band for the sustainability gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SustainabilityBand {
    Strong,
    Steady,
    Weak,
}

impl SustainabilityBand {
    pub fn from_score(score: u8) -> Self {
        if score > 75 {
            SustainabilityBand::Strong
        } else if score >= 45 {
            SustainabilityBand::Steady
        } else {
            SustainabilityBand::Weak
        }
    }
}

/// Coarse predicates the verdict table is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerdictInputs {
    pub elite: bool,
    pub good: bool,
    pub weak: bool,
    pub hot: bool,
    pub cold: bool,
}

impl VerdictInputs {
    pub fn new(score: u8, status: EfficiencyStatus) -> Self {
        Self {
            elite: score > 80,
            good: score > 60,
            weak: score < 40,
            hot: status.is_hot(),
            cold: status.is_cold(),
        }
    }
}

pub struct VerdictRule {
    pub verdict: MarketVerdict,
    pub applies: fn(&VerdictInputs) -> bool,
}

fn elite_and_hot(p: &VerdictInputs) -> bool {
    p.elite && p.hot
}

fn weak_and_hot(p: &VerdictInputs) -> bool {
    p.weak && p.hot
}

fn any_hot(p: &VerdictInputs) -> bool {
    p.hot
}

fn good_and_cold(p: &VerdictInputs) -> bool {
    p.good && p.cold
}

fn weak_and_cold(p: &VerdictInputs) -> bool {
    p.weak && p.cold
}

fn good(p: &VerdictInputs) -> bool {
    p.good
}

/// First match wins; anything unmatched is FRAGILE. The bands overlap (elite is also good),
/// so reordering these rows changes results.
pub const MARKET_VERDICT_RULES: &[VerdictRule] = &[
    VerdictRule {
        verdict: MarketVerdict::Dominant,
        applies: elite_and_hot,
    },
    VerdictRule {
        verdict: MarketVerdict::Critical,
        applies: weak_and_hot,
    },
    VerdictRule {
        verdict: MarketVerdict::Overheated,
        applies: any_hot,
    },
    VerdictRule {
        verdict: MarketVerdict::PrimeBuy,
        applies: good_and_cold,
    },
    VerdictRule {
        verdict: MarketVerdict::Critical,
        applies: weak_and_cold,
    },
    VerdictRule {
        verdict: MarketVerdict::Stable,
        applies: good,
    },
];

pub fn market_verdict(score: u8, status: EfficiencyStatus) -> MarketVerdict {
    let inputs = VerdictInputs::new(score, status);
    MARKET_VERDICT_RULES
        .iter()
        .find(|rule| (rule.applies)(&inputs))
        .map(|rule| rule.verdict)
        .unwrap_or(MarketVerdict::Fragile)
}

/// +1.5 net xG/90 maps to the top of the scale, 0 to 50, -1.5 to the bottom.
pub fn sustainability_score(net_xg_per90: f64) -> u8 {
    if !net_xg_per90.is_finite() {
        return 50;
    }
    let raw = ((net_xg_per90 + 1.5) / 3.0) * 100.0;
    raw.round().clamp(0.0, 99.0) as u8
}

pub fn insight_note(status: EfficiencyStatus, verdict: MarketVerdict) -> &'static str {
    match status {
        EfficiencyStatus::CriticalOver => {
            "Performance is statistically unsustainable. Selling recommended."
        }
        EfficiencyStatus::RunningHot => "Finishing is elite right now, but monitor closely.",
        EfficiencyStatus::Cold => "Conversion is below expected. Watch for positive regression.",
        EfficiencyStatus::CriticalValue => {
            "Creating great chances but suffering bad luck. High probability of haul."
        }
        EfficiencyStatus::Sustainable if verdict == MarketVerdict::Stable => {
            "Performance aligns with underlying metrics. Low volatility expected."
        }
        EfficiencyStatus::Sustainable => {
            "Metrics reflect true performance level. No significant regression expected."
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamAnalysis {
    pub team_id: u32,
    pub team_name: String,
    pub sustainability_score: u8,
    pub efficiency_status: EfficiencyStatus,
    pub efficiency_delta: f64,
    #[serde(rename = "netXGPer90")]
    pub net_xg_per90: f64,
    pub market_verdict: MarketVerdict,
    pub chance_grade: ChanceGrade,
    pub insight_note: String,
    pub finishing_badge: FinishingBadge,
    #[serde(rename = "hasPSxGData")]
    pub has_psxg_data: bool,
}

pub fn analyze(stats: &TeamStats) -> TeamAnalysis {
    let matches = f64::from(stats.matches_played);
    let per_match = |value: f64| if matches > 0.0 { value / matches } else { 0.0 };

    let net_xg_per90 = per_match(stats.xg_for - stats.xg_against);
    let xg_per_match = per_match(stats.xg_for);
    let goals_for = f64::from(stats.goals_for);
    let efficiency_delta = goals_for - stats.xg_for;

    let score = sustainability_score(net_xg_per90);
    let status = EfficiencyStatus::from_delta(efficiency_delta);
    let verdict = market_verdict(score, status);

    TeamAnalysis {
        team_id: stats.team_id,
        team_name: stats.name.clone(),
        sustainability_score: score,
        efficiency_status: status,
        efficiency_delta: round_dp(efficiency_delta, 1),
        net_xg_per90: round_dp(net_xg_per90, 2),
        market_verdict: verdict,
        chance_grade: ChanceGrade::from_xg_per_match(xg_per_match),
        insight_note: insight_note(status, verdict).to_string(),
        finishing_badge: finishing_badge(goals_for, stats.xg_for, stats.psxg),
        has_psxg_data: stats.psxg.is_some_and(|p| p != 0.0),
    }
}

pub fn analyze_all(teams: &[TeamStats]) -> Vec<TeamAnalysis> {
    teams.iter().map(analyze).collect()
}

pub(crate) fn round_dp(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
