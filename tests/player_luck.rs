mod common;

use common::read_fixture;
use fpl_axiom::demo_data::synthetic_dataset;
use fpl_axiom::finishing::FinishingBadge;
use fpl_axiom::fpl_payload::parse_dataset_json;
use fpl_axiom::player_luck::{
    FEED_LIMIT, LuckVerdict, RiskLevel, clean_sheet_leaders, luck_for_all, player_luck,
    relevant_players, top_buys, top_traps, verdict,
};
use fpl_axiom::state::{PlayerStats, Position};

fn player(id: u32, goals: u32, xg: f64, minutes: u32) -> PlayerStats {
    PlayerStats {
        id,
        name: format!("Player {id}"),
        team: "Test FC".to_string(),
        team_id: 1,
        position: Some(Position::Forward),
        price: 7.5,
        actual_goals: goals,
        xg,
        minutes_played: minutes,
        clean_sheets: 0,
        xgc: 0.0,
        psxg: None,
    }
}

#[test]
fn lucky_striker_is_a_regression_trap() {
    let row = player_luck(&player(1, 15, 12.5, 1800));

    assert_eq!(row.luck_score, 2.5);
    assert_eq!(row.verdict, LuckVerdict::Trap);
    assert_eq!(row.verdict_label, "REGRESSION RISK");
    assert_eq!(row.differential_value, 62.5);
    assert_eq!(row.haul_potential, 0.0);
    assert_eq!(row.trap_indicator, 100.0);
    assert_eq!(row.risk_level, RiskLevel::High);
    assert_eq!(row.finishing_badge, FinishingBadge::Fair);
}

#[test]
fn unlucky_forward_is_due_a_haul() {
    let row = player_luck(&player(2, 3, 6.1, 1600));
    assert_eq!(row.luck_score, -3.1);
    assert_eq!(row.verdict, LuckVerdict::Buy);
    assert_eq!(row.verdict_label, "DUE A HAUL");
    assert_eq!(row.finishing_badge, FinishingBadge::Siege);
}

#[test]
fn zero_psxg_falls_back_to_the_volume_badge() {
    let mut stats = player(3, 3, 6.1, 1600);
    stats.psxg = Some(0.0);
    assert_eq!(player_luck(&stats).finishing_badge, FinishingBadge::Siege);

    // xG 10, PSxG 13, 14 goals: elite placement and conversion
    let mut stats = player(4, 14, 10.0, 1600);
    stats.psxg = Some(13.0);
    assert_eq!(player_luck(&stats).finishing_badge, FinishingBadge::Sniper);
}

#[test]
fn verdict_never_moves_toward_buy_as_luck_rises() {
    fn rank(v: LuckVerdict) -> u8 {
        match v {
            LuckVerdict::Buy => 0,
            LuckVerdict::Hold => 1,
            LuckVerdict::Trap => 2,
        }
    }

    let mut previous = rank(LuckVerdict::Buy);
    for step in -400..=400 {
        let luck = f64::from(step) / 100.0;
        let (v, label) = verdict(luck);
        assert!(rank(v) >= previous, "luck {luck} -> {label}");
        previous = rank(v);
    }
}

#[test]
fn serialized_row_uses_camel_case() {
    let row = player_luck(&player(9, 4, 3.0, 900));
    let json = serde_json::to_value(&row).unwrap();
    assert_eq!(json["xG"], 3.0);
    assert_eq!(json["luckScore"], 1.0);
    assert_eq!(json["verdict"], "TRAP");
    assert_eq!(json["verdictLabel"], "SELL HIGH");
    assert_eq!(json["finishingBadge"], "FAIR");
}

#[test]
fn top_lists_are_filtered_sorted_and_capped() {
    let players = vec![
        player(1, 2, 2.6, 900),  // -0.6 buy
        player(2, 1, 4.0, 900),  // -3.0 buy
        player(3, 6, 4.0, 900),  // +2.0 trap
        player(4, 5, 4.4, 900),  // +0.6 trap
        player(5, 3, 3.1, 900),  // hold
        player(6, 9, 4.5, 900),  // +4.5 trap
    ];
    let rows = luck_for_all(&players);

    let buys = top_buys(&rows, 10);
    let ids: Vec<u32> = buys.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![2, 1]);

    let traps = top_traps(&rows, 2);
    let ids: Vec<u32> = traps.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![6, 3]);
}

#[test]
fn synthetic_squads_produce_every_verdict() {
    let ds = synthetic_dataset(7).unwrap();
    let rows = luck_for_all(&ds.players);
    assert_eq!(rows.len(), ds.players.len());
    for row in &rows {
        assert!((0.0..=100.0).contains(&row.differential_value));
        assert!((0.0..=100.0).contains(&row.haul_potential));
        assert!((0.0..=100.0).contains(&row.trap_indicator));
    }
    assert!(rows.iter().any(|r| r.verdict == LuckVerdict::Buy));
    assert!(rows.iter().any(|r| r.verdict == LuckVerdict::Hold));
}

#[test]
fn feed_drops_benchwarmers_and_ranks_by_goals() {
    let players = vec![
        player(1, 0, 0.0, 0),    // never played
        player(2, 0, 0.4, 600),  // no goals, little xG
        player(3, 0, 2.2, 900),  // no goals, real xG
        player(4, 6, 4.0, 1200),
        player(5, 2, 0.0, 0),    // goals but no minutes
        player(6, 9, 7.5, 1500),
    ];

    let ids: Vec<u32> = relevant_players(&players, FEED_LIMIT)
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![6, 4, 3]);

    let capped = relevant_players(&players, 2);
    assert_eq!(capped.len(), 2);
    assert_eq!(capped[0].id, 6);
}

#[test]
fn synthetic_feed_is_capped() {
    let ds = synthetic_dataset(7).unwrap();
    let feed = relevant_players(&ds.players, FEED_LIMIT);
    assert_eq!(feed.len(), FEED_LIMIT);
    assert!(feed.iter().all(|p| p.minutes_played > 0));
    for pair in feed.windows(2) {
        assert!(pair[0].actual_goals >= pair[1].actual_goals);
    }
}

#[test]
fn clean_sheet_luck_for_keepers_and_defenders() {
    let ds = parse_dataset_json(&read_fixture("bootstrap_partial.json")).unwrap();
    let rows = luck_for_all(&ds.players);
    let by_name = |name: &str| rows.iter().find(|r| r.name == name).unwrap();

    // ten matches at 0.95 xGC each: 3.87 expected
    assert_eq!(by_name("Raya").clean_sheet_luck, Some(-0.87));
    assert_eq!(by_name("Saliba").clean_sheet_luck, Some(0.13));
    assert_eq!(by_name("Sanchez").clean_sheet_luck, Some(-0.47));
    assert_eq!(by_name("Saka").clean_sheet_luck, None);
    assert_eq!(by_name("Jackson").clean_sheet_luck, None);

    let json = serde_json::to_value(by_name("Saliba")).unwrap();
    assert_eq!(json["cleanSheetLuck"], 0.13);
    let json = serde_json::to_value(by_name("Saka")).unwrap();
    assert!(json.get("cleanSheetLuck").is_none());

    let names: Vec<String> = clean_sheet_leaders(&rows).into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["Saliba", "Sanchez", "Raya"]);
}
