use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishingBadge {
    /// Good chances, keepers saving everything.
    Siege,
    Sniper,
    Fair,
    Wasteful,
    /// Goals far above a tiny xG base.
    Mirage,
}

impl FinishingBadge {
    pub fn label(self) -> &'static str {
        match self {
            FinishingBadge::Siege => "SIEGE",
            FinishingBadge::Sniper => "SNIPER",
            FinishingBadge::Fair => "FAIR",
            FinishingBadge::Wasteful => "WASTEFUL",
            FinishingBadge::Mirage => "MIRAGE",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FinishingBadge::Siege => "Creating quality chances but can't convert. Goals are coming.",
            FinishingBadge::Sniper => "Elite finishing skill. Taking AND making great chances.",
            FinishingBadge::Fair => "Performing as expected. No significant edge.",
            FinishingBadge::Wasteful => "Poor shot selection. Taking bad chances.",
            FinishingBadge::Mirage => "Results are an illusion. High goals vs Low xG. Sell.",
        }
    }
}

/// The three deltas the post-shot rules look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishingDeltas {
    pub xg: f64,
    /// goals - xG: overall luck.
    pub goal_delta: f64,
    /// PSxG - xG: shot quality.
    pub psxg_delta: f64,
    /// goals - PSxG: finishing skill.
    pub finishing_delta: f64,
}

impl FinishingDeltas {
    pub fn new(goals: f64, xg: f64, psxg: f64) -> Self {
        Self {
            xg,
            goal_delta: goals - xg,
            psxg_delta: psxg - xg,
            finishing_delta: goals - psxg,
        }
    }
}

pub struct FinishingRule {
    pub badge: FinishingBadge,
    pub applies: fn(&FinishingDeltas) -> bool,
}

fn is_siege(d: &FinishingDeltas) -> bool {
    d.psxg_delta >= -2.0 && d.finishing_delta <= -5.0
}

fn is_sniper(d: &FinishingDeltas) -> bool {
    d.psxg_delta >= 3.0 && d.finishing_delta >= 0.0
}

fn is_wasteful(d: &FinishingDeltas) -> bool {
    d.psxg_delta <= -5.0 && d.finishing_delta.abs() <= 3.0
}

fn is_mirage(d: &FinishingDeltas) -> bool {
    d.xg <= 15.0 && d.goal_delta >= 5.0
}

/// Evaluated top to bottom, first match wins. Order is load-bearing: a statline can satisfy
/// several predicates at once.
pub const FINISHING_RULES: &[FinishingRule] = &[
    FinishingRule {
        badge: FinishingBadge::Siege,
        applies: is_siege,
    },
    FinishingRule {
        badge: FinishingBadge::Sniper,
        applies: is_sniper,
    },
    FinishingRule {
        badge: FinishingBadge::Wasteful,
        applies: is_wasteful,
    },
    FinishingRule {
        badge: FinishingBadge::Mirage,
        applies: is_mirage,
    },
];

pub fn classify_with_psxg(deltas: &FinishingDeltas) -> FinishingBadge {
    FINISHING_RULES
        .iter()
        .find(|rule| (rule.applies)(deltas))
        .map(|rule| rule.badge)
        .unwrap_or(FinishingBadge::Fair)
}

/// PSxG-based badge, or FAIR when the provider has no post-shot data. A zero PSxG is a
/// missing value, not a measurement.
pub fn finishing_badge(goals: f64, xg: f64, psxg: Option<f64>) -> FinishingBadge {
    match psxg {
        Some(psxg) if psxg != 0.0 => classify_with_psxg(&FinishingDeltas::new(goals, xg, psxg)),
        _ => FinishingBadge::Fair,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniper_beats_mirage_when_both_match() {
        let d = FinishingDeltas::new(14.0, 8.0, 12.0);
        assert!(is_sniper(&d));
        assert!(is_mirage(&d));
        assert_eq!(classify_with_psxg(&d), FinishingBadge::Sniper);
    }

    #[test]
    fn siege_beats_mirage_when_both_match() {
        // psxg_delta 11, finishing_delta -5, goal_delta 6 on 4 xG
        let d = FinishingDeltas::new(10.0, 4.0, 15.0);
        assert!(is_siege(&d));
        assert!(is_mirage(&d));
        assert_eq!(classify_with_psxg(&d), FinishingBadge::Siege);
    }

    #[test]
    fn no_psxg_is_fair() {
        assert_eq!(finishing_badge(30.0, 10.0, None), FinishingBadge::Fair);
    }

    #[test]
    fn zero_psxg_counts_as_missing() {
        // read as real values these would be WASTEFUL and MIRAGE
        assert_eq!(finishing_badge(2.0, 8.0, Some(0.0)), FinishingBadge::Fair);
        assert_eq!(finishing_badge(30.0, 10.0, Some(0.0)), FinishingBadge::Fair);
        assert_eq!(finishing_badge(14.0, 8.0, Some(12.0)), FinishingBadge::Sniper);
    }
}
