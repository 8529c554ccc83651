use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "GK")]
    Goalkeeper,
    #[serde(rename = "DEF")]
    Defender,
    #[serde(rename = "MID")]
    Midfielder,
    #[serde(rename = "FWD")]
    Forward,
}

impl Position {
    pub fn from_element_type(id: u32) -> Option<Self> {
        match id {
            1 => Some(Position::Goalkeeper),
            2 => Some(Position::Defender),
            3 => Some(Position::Midfielder),
            4 => Some(Position::Forward),
            _ => None,
        }
    }

    pub fn short(self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }
}

/// Aggregate season numbers for one team. Immutable input to the classifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub team_id: u32,
    pub name: String,
    pub goals_for: u32,
    pub goals_against: u32,
    #[serde(rename = "xGFor")]
    pub xg_for: f64,
    #[serde(rename = "xGAgainst")]
    pub xg_against: f64,
    pub matches_played: u32,
    /// Best clean-sheet count among the team's keepers and defenders.
    #[serde(default)]
    pub clean_sheets: u32,
    // Post-shot xG, only some providers have it.
    #[serde(default, rename = "PSxG", skip_serializing_if = "Option::is_none")]
    pub psxg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub id: u32,
    pub name: String,
    pub team: String,
    pub team_id: u32,
    pub position: Option<Position>,
    /// Millions.
    pub price: f64,
    pub actual_goals: u32,
    #[serde(rename = "xG")]
    pub xg: f64,
    pub minutes_played: u32,
    #[serde(default)]
    pub clean_sheets: u32,
    #[serde(default, rename = "xGC")]
    pub xgc: f64,
    #[serde(default, rename = "PSxG", skip_serializing_if = "Option::is_none")]
    pub psxg: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Completeness {
    Complete,
    Partial { teams: usize, players: usize },
}

impl Completeness {
    pub fn is_complete(self) -> bool {
        matches!(self, Completeness::Complete)
    }
}

/// Validated, typed snapshot of the upstream dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FplDataset {
    pub teams: Vec<TeamStats>,
    pub players: Vec<PlayerStats>,
    pub gameweek: u32,
    pub team_count: usize,
    pub player_count: usize,
    pub completeness: Completeness,
}

impl FplDataset {
    pub fn team(&self, team_id: u32) -> Option<&TeamStats> {
        self.teams.iter().find(|t| t.team_id == team_id)
    }
}
