mod common;

use common::read_fixture;
use fpl_axiom::error::FetchError;
use fpl_axiom::fpl_payload::{parse_bootstrap_json, parse_dataset_json};
use fpl_axiom::state::{Completeness, Position};

#[test]
fn parses_partial_bootstrap_fixture() {
    let raw = read_fixture("bootstrap_partial.json");
    let ds = parse_dataset_json(&raw).expect("fixture should parse");

    assert_eq!(ds.gameweek, 4);
    assert_eq!(ds.team_count, 2);
    assert_eq!(ds.player_count, 7);
    assert_eq!(
        ds.completeness,
        Completeness::Partial {
            teams: 2,
            players: 7
        }
    );
}

#[test]
fn maps_player_rows() {
    let ds = parse_dataset_json(&read_fixture("bootstrap_partial.json")).unwrap();

    let saka = ds.players.iter().find(|p| p.name == "Saka").unwrap();
    assert_eq!(saka.team, "Arsenal");
    assert_eq!(saka.position, Some(Position::Midfielder));
    assert_eq!(saka.price, 10.0);
    assert_eq!(saka.xg, 3.2);
    assert_eq!(saka.actual_goals, 5);

    // null expected_goals reads as zero
    let jackson = ds.players.iter().find(|p| p.name == "Jackson").unwrap();
    assert_eq!(jackson.xg, 0.0);

    let orphan = ds.players.iter().find(|p| p.id == 7).unwrap();
    assert_eq!(orphan.team, "Unknown");
    assert_eq!(orphan.position, None);
}

#[test]
fn aggregates_team_rows() {
    let ds = parse_dataset_json(&read_fixture("bootstrap_partial.json")).unwrap();

    let arsenal = ds.team(1).unwrap();
    assert_eq!(arsenal.goals_for, 6);
    assert!((arsenal.xg_for - 4.0).abs() < 1e-9);
    assert!((arsenal.xg_against - 27.0 / 11.0).abs() < 1e-9);
    assert_eq!(arsenal.goals_against, 8);
    assert_eq!(arsenal.matches_played, 10);

    // keeper under 450 minutes: conceded still counts, matches fall back to the default
    let chelsea = ds.team(2).unwrap();
    assert_eq!(chelsea.goals_for, 9);
    assert_eq!(chelsea.goals_against, 5);
    assert_eq!(chelsea.matches_played, 10);
    assert!(chelsea.psxg.is_none());
}

#[test]
fn reads_clean_sheets_for_players_and_teams() {
    let ds = parse_dataset_json(&read_fixture("bootstrap_partial.json")).unwrap();

    let raya = ds.players.iter().find(|p| p.name == "Raya").unwrap();
    assert_eq!(raya.clean_sheets, 3);
    assert_eq!(raya.xgc, 9.5);

    // best of keepers and defenders
    assert_eq!(ds.team(1).unwrap().clean_sheets, 4);
    assert_eq!(ds.team(2).unwrap().clean_sheets, 1);
}

fn one_keeper_payload(minutes: u32) -> String {
    format!(
        r#"{{"events":[{{"id":1,"is_current":true}}],
            "teams":[{{"id":1,"name":"Arsenal"}}],
            "elements":[{{"id":1,"web_name":"Raya","team":1,"element_type":1,"now_cost":55,
                "minutes":{minutes},"goals_scored":0,"goals_conceded":4,
                "expected_goals":"0.00","expected_goals_conceded":"5.00"}}]}}"#
    )
}

#[test]
fn keeper_needs_more_than_450_minutes_to_set_matches() {
    let at_cutoff = parse_dataset_json(&one_keeper_payload(450)).unwrap();
    assert_eq!(at_cutoff.team(1).unwrap().matches_played, 10);

    let past_cutoff = parse_dataset_json(&one_keeper_payload(540)).unwrap();
    assert_eq!(past_cutoff.team(1).unwrap().matches_played, 6);
    assert_eq!(past_cutoff.team(1).unwrap().goals_against, 4);
}

#[test]
fn rejects_malformed_payloads() {
    for raw in ["", "   ", "null", "{not json", "[1,2,3]"] {
        let err = parse_bootstrap_json(raw).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)), "{raw:?} -> {err:?}");
    }

    let err = parse_bootstrap_json(&read_fixture("bootstrap_no_teams.json")).unwrap_err();
    assert_eq!(err, FetchError::Malformed("payload has no teams".to_string()));

    let err = parse_bootstrap_json(r#"{"teams":[{"id":1,"name":"A"}],"elements":[]}"#).unwrap_err();
    assert_eq!(err, FetchError::Malformed("payload has no players".to_string()));
}

#[test]
fn synthetic_payload_is_complete() {
    let raw = fpl_axiom::demo_data::synthetic_bootstrap_json(3);
    let boot = parse_bootstrap_json(&raw).unwrap();
    assert_eq!(boot.completeness(), Completeness::Complete);
}
