use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use crate::finishing::FinishingBadge;
use crate::fpl_payload::{Bootstrap, dataset_from_bootstrap};
use crate::state::{FplDataset, TeamStats};

const TEAM_NAMES: [(&str, &str); 20] = [
    ("Arsenal", "ARS"),
    ("Aston Villa", "AVL"),
    ("Bournemouth", "BOU"),
    ("Brentford", "BRE"),
    ("Brighton", "BHA"),
    ("Burnley", "BUR"),
    ("Chelsea", "CHE"),
    ("Crystal Palace", "CRY"),
    ("Everton", "EVE"),
    ("Fulham", "FUL"),
    ("Leeds", "LEE"),
    ("Liverpool", "LIV"),
    ("Man City", "MCI"),
    ("Man Utd", "MUN"),
    ("Newcastle", "NEW"),
    ("Nott'm Forest", "NFO"),
    ("Sunderland", "SUN"),
    ("Spurs", "TOT"),
    ("West Ham", "WHU"),
    ("Wolves", "WOL"),
];

// Squad shape per team: (element_type, count).
const SQUAD: [(u32, usize); 4] = [(1, 2), (2, 10), (3, 10), (4, 8)];
const MATCHES: u32 = 20;

/// A crafted team together with the finishing badge it is built to trigger.
#[derive(Debug, Clone)]
pub struct DemoTeam {
    pub stats: TeamStats,
    pub expected_badge: FinishingBadge,
    pub reason: &'static str,
}

fn demo_team(
    team_id: u32,
    name: &str,
    goals: (u32, u32),
    xg: (f64, f64),
    psxg: f64,
    expected_badge: FinishingBadge,
    reason: &'static str,
) -> DemoTeam {
    DemoTeam {
        stats: TeamStats {
            team_id,
            name: name.to_string(),
            goals_for: goals.0,
            goals_against: goals.1,
            xg_for: xg.0,
            xg_against: xg.1,
            matches_played: MATCHES,
            clean_sheets: 0,
            psxg: Some(psxg),
        },
        expected_badge,
        reason,
    }
}

/// One team per finishing badge, with post-shot numbers filled in.
pub fn demo_teams() -> Vec<DemoTeam> {
    vec![
        demo_team(
            901,
            "Wolves",
            (10, 18),
            (20.0, 15.0),
            19.5,
            FinishingBadge::Siege,
            "Shots on target match the chances, keepers are stopping everything",
        ),
        demo_team(
            902,
            "Man City",
            (36, 12),
            (30.0, 10.0),
            35.0,
            FinishingBadge::Sniper,
            "Placement lifts shot quality well above xG and they convert it",
        ),
        demo_team(
            903,
            "Chelsea",
            (22, 20),
            (22.5, 19.0),
            22.0,
            FinishingBadge::Fair,
            "Goals, xG and PSxG all within a goal of each other",
        ),
        demo_team(
            904,
            "Man Utd",
            (14, 22),
            (25.0, 18.0),
            15.0,
            FinishingBadge::Wasteful,
            "Good positions, poor strikes: PSxG ten goals under xG",
        ),
        demo_team(
            905,
            "Luton",
            (20, 30),
            (10.0, 28.0),
            11.0,
            FinishingBadge::Mirage,
            "Twice the goals their chances justify",
        ),
    ]
}

pub fn demo_team_stats() -> Vec<TeamStats> {
    demo_teams().into_iter().map(|t| t.stats).collect()
}

/// Deterministic bootstrap-shaped payload: 20 teams, 600 players. Decimal fields are strings,
/// as upstream sends them.
pub fn synthetic_bootstrap(seed: u64) -> Value {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut teams = Vec::with_capacity(TEAM_NAMES.len());
    let mut elements = Vec::new();
    let mut next_id = 1u32;

    for (idx, (name, short)) in TEAM_NAMES.iter().enumerate() {
        let team_id = idx as u32 + 1;
        teams.push(json!({ "id": team_id, "name": name, "short_name": short }));

        let team_xga: f64 = rng.gen_range(14.0..36.0);
        let conceded = (team_xga + rng.gen_range(-6.0..6.0)).max(0.0).round() as u32;
        let mut starters_left = 11;

        for (element_type, count) in SQUAD {
            for slot in 0..count {
                let first_choice = slot == 0 || (element_type != 1 && slot < 4);
                let minutes: u32 = if first_choice {
                    rng.gen_range(1500..=MATCHES * 90)
                } else {
                    rng.gen_range(0..1200)
                };
                let xg_rate = match element_type {
                    4 => rng.gen_range(0.15..0.65),
                    3 => rng.gen_range(0.05..0.35),
                    2 => rng.gen_range(0.0..0.08),
                    _ => 0.0,
                };
                let xg = xg_rate * f64::from(minutes) / 90.0;
                let goals = (xg + rng.gen_range(-2.5..3.0)).max(0.0).round() as u32;
                let xgc = if first_choice && starters_left > 0 {
                    starters_left -= 1;
                    team_xga
                } else {
                    0.0
                };
                let clean_sheets = if element_type <= 2 && xgc > 0.0 {
                    let played = f64::from(minutes) / 90.0;
                    (played * (-team_xga / f64::from(MATCHES)).exp()).round() as u32
                } else {
                    0
                };
                let (goals_conceded, element_goals) = if element_type == 1 && slot == 0 {
                    (conceded, 0)
                } else {
                    (0, goals)
                };

                elements.push(json!({
                    "id": next_id,
                    "web_name": format!("{short} Player {next_id}"),
                    "team": team_id,
                    "element_type": element_type,
                    "now_cost": rng.gen_range(40..=140),
                    "minutes": minutes,
                    "goals_scored": element_goals,
                    "goals_conceded": goals_conceded,
                    "clean_sheets": clean_sheets,
                    "expected_goals": format!("{xg:.2}"),
                    "expected_goals_conceded": format!("{xgc:.2}"),
                }));
                next_id += 1;
            }
        }
    }

    json!({
        "events": [
            { "id": 20, "is_current": true, "is_next": false },
            { "id": 21, "is_current": false, "is_next": true },
        ],
        "teams": teams,
        "elements": elements,
    })
}

pub fn synthetic_bootstrap_json(seed: u64) -> String {
    synthetic_bootstrap(seed).to_string()
}

pub fn synthetic_dataset(seed: u64) -> anyhow::Result<FplDataset> {
    let boot: Bootstrap = serde_json::from_value(synthetic_bootstrap(seed))?;
    Ok(dataset_from_bootstrap(&boot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finishing::finishing_badge;

    #[test]
    fn demo_teams_hit_their_badges() {
        for team in demo_teams() {
            let s = &team.stats;
            assert_eq!(
                finishing_badge(f64::from(s.goals_for), s.xg_for, s.psxg),
                team.expected_badge,
                "{}",
                s.name
            );
        }
    }

    #[test]
    fn synthetic_payload_is_complete_and_seeded() {
        let a = synthetic_bootstrap_json(7);
        let b = synthetic_bootstrap_json(7);
        assert_eq!(a, b);

        let ds = synthetic_dataset(7).unwrap();
        assert_eq!(ds.team_count, 20);
        assert_eq!(ds.player_count, 600);
        assert!(ds.completeness.is_complete());
        assert_eq!(ds.gameweek, 20);
    }
}
