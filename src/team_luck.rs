use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::state::TeamStats;
use crate::team_analysis::round_dp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttackVerdict {
    TargetAttackers,
    AvoidAttackers,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefenseVerdict {
    BuyDefense,
    AvoidDefense,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Quadrant {
    DoubleValue,
    GoalChaser,
    CleanSheetChaser,
    Avoid,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call<V> {
    pub verdict: V,
    pub label: &'static str,
    pub description: &'static str,
}

/// Negative attacking luck means goals are owed.
pub fn attack_call(luck: f64) -> Call<AttackVerdict> {
    let (verdict, label, description) = if luck <= -3.0 {
        (
            AttackVerdict::TargetAttackers,
            "EXPLOSIVE",
            "Significantly underperforming xG. Attackers are due goals - high upside.",
        )
    } else if luck <= -1.0 {
        (
            AttackVerdict::TargetAttackers,
            "VALUE BUY",
            "Slightly underperforming xG. Good value in attack.",
        )
    } else if luck >= 3.0 {
        (
            AttackVerdict::AvoidAttackers,
            "COOLDOWN",
            "Significantly overperforming xG. Scoring unsustainably - regression likely.",
        )
    } else if luck >= 1.0 {
        (
            AttackVerdict::AvoidAttackers,
            "OVERHEATED",
            "Slightly overperforming xG. Finishing luck may run out.",
        )
    } else {
        (
            AttackVerdict::Neutral,
            "STABLE",
            "Attack performing as expected. No significant edge.",
        )
    };
    Call {
        verdict,
        label,
        description,
    }
}

/// Positive defensive luck means the side has conceded more than its chances allowed.
pub fn defense_call(luck: f64) -> Call<DefenseVerdict> {
    let (verdict, label, description) = if luck >= 3.0 {
        (
            DefenseVerdict::BuyDefense,
            "BUY DIP",
            "Conceding cheap goals. Defense undervalued - clean sheets incoming.",
        )
    } else if luck >= 1.0 {
        (
            DefenseVerdict::BuyDefense,
            "UNDERVALUED",
            "Slightly unlucky defensively. Good value in defenders/keepers.",
        )
    } else if luck <= -3.0 {
        (
            DefenseVerdict::AvoidDefense,
            "FRAGILE",
            "Keepers saving them. Defense overvalued - regression likely.",
        )
    } else if luck <= -1.0 {
        (
            DefenseVerdict::AvoidDefense,
            "RISKY",
            "Slightly overperforming defensively. Clean sheet odds may drop.",
        )
    } else {
        (
            DefenseVerdict::Neutral,
            "STABLE",
            "Defense performing as expected. No significant edge.",
        )
    };
    Call {
        verdict,
        label,
        description,
    }
}

pub fn quadrant(attack: AttackVerdict, defense: DefenseVerdict) -> Quadrant {
    match (attack, defense) {
        (AttackVerdict::TargetAttackers, DefenseVerdict::BuyDefense) => Quadrant::DoubleValue,
        (AttackVerdict::TargetAttackers, _) => Quadrant::GoalChaser,
        (_, DefenseVerdict::BuyDefense) => Quadrant::CleanSheetChaser,
        (AttackVerdict::AvoidAttackers, DefenseVerdict::AvoidDefense) => Quadrant::Avoid,
        _ => Quadrant::Neutral,
    }
}

/// Clean sheets kept minus those a Poisson model of the conceded xG expects.
///
/// A side conceding `λ` xG per match keeps a clean sheet with probability `e^-λ`, so the
/// expectation over `matches` is `matches * e^(-xgc / matches)`. Zero matches is zero luck.
pub fn clean_sheet_luck(clean_sheets: u32, xgc: f64, matches: u32) -> f64 {
    if matches == 0 {
        return 0.0;
    }
    let matches = f64::from(matches);
    let expected = matches * (-xgc / matches).exp();
    round_dp(f64::from(clean_sheets) - expected, 2)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamLuck {
    pub team_id: u32,
    pub team_name: String,
    pub attacking_luck: f64,
    pub attack_verdict: AttackVerdict,
    pub attack_label: String,
    pub attack_description: String,
    pub defensive_luck: f64,
    pub defense_verdict: DefenseVerdict,
    pub defense_label: String,
    pub defense_description: String,
    pub clean_sheet_luck: f64,
    pub quadrant: Quadrant,
}

pub fn team_luck(stats: &TeamStats) -> TeamLuck {
    let attacking_luck = round_dp(f64::from(stats.goals_for) - stats.xg_for, 2);
    let defensive_luck = round_dp(f64::from(stats.goals_against) - stats.xg_against, 2);
    let attack = attack_call(attacking_luck);
    let defense = defense_call(defensive_luck);

    TeamLuck {
        team_id: stats.team_id,
        team_name: stats.name.clone(),
        attacking_luck,
        attack_verdict: attack.verdict,
        attack_label: attack.label.to_string(),
        attack_description: attack.description.to_string(),
        defensive_luck,
        defense_verdict: defense.verdict,
        defense_label: defense.label.to_string(),
        defense_description: defense.description.to_string(),
        clean_sheet_luck: clean_sheet_luck(stats.clean_sheets, stats.xg_against, stats.matches_played),
        quadrant: quadrant(attack.verdict, defense.verdict),
    }
}

pub fn luck_for_all(teams: &[TeamStats]) -> Vec<TeamLuck> {
    teams.iter().map(team_luck).collect()
}

pub fn in_quadrant(teams: &[TeamLuck], wanted: Quadrant) -> Vec<TeamLuck> {
    teams.iter().filter(|t| t.quadrant == wanted).cloned().collect()
}

pub fn sort_by_attacking_value(teams: &mut [TeamLuck]) {
    teams.sort_by(|a, b| {
        a.attacking_luck
            .partial_cmp(&b.attacking_luck)
            .unwrap_or(Ordering::Equal)
    });
}

/// Most clean sheets above expectation first.
pub fn sort_by_clean_sheet_luck(teams: &mut [TeamLuck]) {
    teams.sort_by(|a, b| {
        b.clean_sheet_luck
            .partial_cmp(&a.clean_sheet_luck)
            .unwrap_or(Ordering::Equal)
    });
}

pub fn sort_by_defensive_value(teams: &mut [TeamLuck]) {
    teams.sort_by(|a, b| {
        b.defensive_luck
            .partial_cmp(&a.defensive_luck)
            .unwrap_or(Ordering::Equal)
    });
}
