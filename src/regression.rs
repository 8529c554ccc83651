//! League-relative regression risk. The probability and significance fields are fixed heuristic
//! formulas over a z-score, not a fitted model.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::state::TeamStats;
use crate::team_analysis::round_dp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerformanceStatus {
    Overperforming,
    Underperforming,
    AsExpected,
}

impl PerformanceStatus {
    pub fn from_variance(variance: f64) -> Self {
        if variance > 3.0 {
            PerformanceStatus::Overperforming
        } else if variance < -3.0 {
            PerformanceStatus::Underperforming
        } else {
            PerformanceStatus::AsExpected
        }
    }
}

/// Piecewise map of variance onto 0..=100. Each band owns a slice of the scale.
pub fn risk_score(variance: f64) -> u8 {
    let score = if variance > 5.0 {
        (90.0 + (variance - 5.0) * 2.0).min(100.0)
    } else if variance > 3.0 {
        70.0 + ((variance - 3.0) / 2.0) * 19.0
    } else if variance > 1.0 {
        40.0 + ((variance - 1.0) / 2.0) * 29.0
    } else if variance > 0.0 {
        20.0 + variance * 19.0
    } else if variance > -3.0 {
        10.0 + ((variance + 3.0) / 3.0) * 9.0
    } else {
        (10.0 + variance).max(0.0)
    };
    score.round().clamp(0.0, 100.0) as u8
}

pub fn risk_category(score: u8) -> RiskCategory {
    match score {
        90.. => RiskCategory::Critical,
        70..=89 => RiskCategory::High,
        40..=69 => RiskCategory::Moderate,
        _ => RiskCategory::Low,
    }
}

pub fn regression_probability(variance: f64, z_score: f64) -> f64 {
    let base = if variance <= 0.0 {
        0.1
    } else {
        (0.3 + variance / 10.0).min(0.9)
    };
    let significance = (z_score.abs() / 2.0).min(1.0);
    round_dp(base * (0.7 + 0.3 * significance), 3)
}

/// Standard normal CDF via the Abramowitz-Stegun erf approximation (|err| < 1.5e-7).
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

pub fn two_tailed_p(z: f64) -> f64 {
    (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0)
}

/// z-scores against the slice mean with the sample standard deviation. Zero when the spread
/// is degenerate.
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    if values.len() < 2 {
        return vec![0.0; values.len()];
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = var.sqrt();
    if std <= f64::EPSILON || !std.is_finite() {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - mean) / std).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionRow {
    pub team_id: u32,
    pub team_name: String,
    pub variance: f64,
    pub z_score: f64,
    pub p_value: f64,
    pub significant: bool,
    pub risk_score: u8,
    pub risk_category: RiskCategory,
    pub regression_probability: f64,
    pub status: PerformanceStatus,
}

/// Regression view of a league, keyed on goals minus xG. Sorted by risk, highest first.
pub fn analyze_league(teams: &[TeamStats]) -> Vec<RegressionRow> {
    let variances: Vec<f64> = teams
        .iter()
        .map(|t| f64::from(t.goals_for) - t.xg_for)
        .collect();
    let zs = z_scores(&variances);

    let mut rows: Vec<RegressionRow> = teams
        .iter()
        .zip(variances.iter().zip(zs.iter()))
        .map(|(team, (&variance, &z))| {
            let score = risk_score(variance);
            let p_value = two_tailed_p(z);
            RegressionRow {
                team_id: team.team_id,
                team_name: team.name.clone(),
                variance: round_dp(variance, 2),
                z_score: round_dp(z, 3),
                p_value: round_dp(p_value, 4),
                significant: p_value < 0.05,
                risk_score: score,
                risk_category: risk_category(score),
                regression_probability: regression_probability(variance, z),
                status: PerformanceStatus::from_variance(variance),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.risk_score.cmp(&a.risk_score).then_with(|| {
            b.variance
                .partial_cmp(&a.variance)
                .unwrap_or(Ordering::Equal)
        })
    });
    rows
}
