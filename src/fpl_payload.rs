use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::FetchError;
use crate::state::{Completeness, FplDataset, PlayerStats, Position, TeamStats};

pub const EXPECTED_TEAMS: usize = 20;
pub const MIN_PLAYERS: usize = 500;

const DEFAULT_MATCHES: u32 = 10;
const KEEPER_MIN_MINUTES: u32 = 450;

#[derive(Debug, Clone, Deserialize)]
pub struct Bootstrap {
    #[serde(default)]
    pub events: Vec<BootstrapEvent>,
    #[serde(default)]
    pub teams: Vec<BootstrapTeam>,
    #[serde(default)]
    pub elements: Vec<BootstrapElement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapEvent {
    pub id: u32,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub is_next: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapTeam {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub short_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapElement {
    pub id: u32,
    #[serde(default)]
    pub web_name: String,
    pub team: u32,
    #[serde(default)]
    pub element_type: u32,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub now_cost: f64,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub minutes: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub goals_scored: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub goals_conceded: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub clean_sheets: u32,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub expected_goals: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub expected_goals_conceded: f64,
}

impl Bootstrap {
    pub fn completeness(&self) -> Completeness {
        let teams = self.teams.len();
        let players = self.elements.len();
        if teams == EXPECTED_TEAMS && players > MIN_PLAYERS {
            Completeness::Complete
        } else {
            Completeness::Partial { teams, players }
        }
    }

    pub fn current_gameweek(&self) -> u32 {
        self.events
            .iter()
            .find(|e| e.is_current)
            .or_else(|| self.events.iter().find(|e| e.is_next))
            .map(|e| e.id)
            .unwrap_or(1)
    }
}

/// Parse and shape-check the dataset body. Anything that cannot feed the classifiers is
/// `Malformed`; a thin-but-usable payload parses and reports `Partial` completeness.
pub fn parse_bootstrap_json(raw: &str) -> Result<Bootstrap, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(FetchError::Malformed("empty body".to_string()));
    }
    let boot: Bootstrap = serde_json::from_str(trimmed)
        .map_err(|err| FetchError::Malformed(format!("invalid bootstrap json: {err}")))?;
    if boot.teams.is_empty() {
        return Err(FetchError::Malformed("payload has no teams".to_string()));
    }
    if boot.elements.is_empty() {
        return Err(FetchError::Malformed("payload has no players".to_string()));
    }
    Ok(boot)
}

pub fn parse_dataset_json(raw: &str) -> Result<FplDataset, FetchError> {
    let boot = parse_bootstrap_json(raw)?;
    Ok(dataset_from_bootstrap(&boot))
}

pub fn dataset_from_bootstrap(boot: &Bootstrap) -> FplDataset {
    let team_names: HashMap<u32, &str> = boot
        .teams
        .iter()
        .map(|t| (t.id, t.name.as_str()))
        .collect();

    let players: Vec<PlayerStats> = boot
        .elements
        .iter()
        .map(|el| PlayerStats {
            id: el.id,
            name: el.web_name.clone(),
            team: team_names
                .get(&el.team)
                .copied()
                .unwrap_or("Unknown")
                .to_string(),
            team_id: el.team,
            position: Position::from_element_type(el.element_type),
            price: el.now_cost / 10.0,
            actual_goals: el.goals_scored,
            xg: el.expected_goals,
            minutes_played: el.minutes,
            clean_sheets: el.clean_sheets,
            xgc: el.expected_goals_conceded,
            psxg: None,
        })
        .collect();

    let teams = boot
        .teams
        .iter()
        .map(|team| aggregate_team(team, &boot.elements))
        .collect();

    FplDataset {
        teams,
        players,
        gameweek: boot.current_gameweek(),
        team_count: boot.teams.len(),
        player_count: boot.elements.len(),
        completeness: boot.completeness(),
    }
}

fn aggregate_team(team: &BootstrapTeam, elements: &[BootstrapElement]) -> TeamStats {
    let squad: Vec<&BootstrapElement> = elements.iter().filter(|el| el.team == team.id).collect();

    let goals_for = squad.iter().map(|el| el.goals_scored).sum();
    let xg_for: f64 = squad.iter().map(|el| el.expected_goals).sum();
    // Every outfield starter carries the team's xGC; /11 approximates a team total.
    let xg_against = squad.iter().map(|el| el.expected_goals_conceded).sum::<f64>() / 11.0;

    let clean_sheets = squad
        .iter()
        .filter(|el| el.element_type == 1 || el.element_type == 2)
        .map(|el| el.clean_sheets)
        .max()
        .unwrap_or(0);

    let keeper = squad
        .iter()
        .filter(|el| el.element_type == 1)
        .max_by_key(|el| el.minutes);
    let (goals_against, matches_played) = match keeper {
        Some(gk) if gk.minutes > KEEPER_MIN_MINUTES => (gk.goals_conceded, gk.minutes / 90),
        Some(gk) => (gk.goals_conceded, DEFAULT_MATCHES),
        None => (0, DEFAULT_MATCHES),
    };

    TeamStats {
        team_id: team.id,
        name: team.name.clone(),
        goals_for,
        goals_against,
        xg_for,
        xg_against,
        matches_played,
        clean_sheets,
        psxg: None,
    }
}

// The upstream sends decimals as strings ("1.25") and occasionally nulls.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value).unwrap_or(0.0))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value)
        .filter(|v| *v >= 0.0)
        .map(|v| v.round() as u32)
        .unwrap_or(0))
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_numbers_accept_strings_and_nulls() {
        assert_eq!(value_to_f64(&Value::String("1.25".into())), Some(1.25));
        assert_eq!(value_to_f64(&Value::String("abc".into())), None);
        assert_eq!(value_to_f64(&Value::Null), None);
        assert_eq!(value_to_f64(&serde_json::json!(3)), Some(3.0));
    }

    #[test]
    fn gameweek_prefers_current_then_next() {
        let boot: Bootstrap = serde_json::from_str(
            r#"{"events":[{"id":4,"is_next":true},{"id":3,"is_current":true}],"teams":[],"elements":[]}"#,
        )
        .unwrap();
        assert_eq!(boot.current_gameweek(), 3);

        let boot: Bootstrap =
            serde_json::from_str(r#"{"events":[{"id":7,"is_next":true}]}"#).unwrap();
        assert_eq!(boot.current_gameweek(), 7);

        let boot: Bootstrap = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(boot.current_gameweek(), 1);
    }
}
