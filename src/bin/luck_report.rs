use anyhow::{Result, anyhow};
use clap::Parser;

use fpl_axiom::app::AppContext;
use fpl_axiom::config::{self, Config};
use fpl_axiom::demo_data;
use fpl_axiom::logging;
use fpl_axiom::player_luck::{
    FEED_LIMIT, PlayerLuckData, clean_sheet_leaders, luck_for_all, relevant_players, top_buys,
    top_traps,
};
use fpl_axiom::regression::analyze_league;
use fpl_axiom::state::FplDataset;
use fpl_axiom::team_analysis::analyze_all;
use fpl_axiom::team_luck::{
    self, Quadrant, in_quadrant, sort_by_attacking_value, sort_by_clean_sheet_luck,
    sort_by_defensive_value,
};

/// Print team verdicts and the luckiest / unluckiest players.
#[derive(Debug, Parser)]
#[command(name = "luck_report")]
struct Args {
    /// Use the seeded offline dataset instead of the live API.
    #[arg(long)]
    demo: bool,

    /// Seed for --demo.
    #[arg(long, default_value_t = 26)]
    seed: u64,

    /// Players to list per side.
    #[arg(long, default_value_t = 10)]
    top: usize,
}

fn main() -> Result<()> {
    config::load_dotenv();
    let args = Args::parse();
    let cfg = Config::from_env()?;
    logging::init(&cfg);

    let dataset = if args.demo {
        let mut ds = demo_data::synthetic_dataset(args.seed)?;
        ds.teams.extend(demo_data::demo_team_stats());
        println!("source: demo (seed {})", args.seed);
        ds
    } else {
        let ctx = AppContext::from_config(cfg)?;
        let acquired = ctx
            .controller
            .fetch()
            .map_err(|err| anyhow!("no data: {err}"))?;
        println!(
            "source: {} via {:?}{}",
            acquired.mode.as_str(),
            acquired.strategy,
            if acquired.stale { " (stale)" } else { "" }
        );
        (*acquired.data).clone()
    };

    print_report(&dataset, args.top);
    Ok(())
}

fn print_report(ds: &FplDataset, top: usize) {
    println!(
        "gameweek {} | {} teams | {} players\n",
        ds.gameweek, ds.team_count, ds.player_count
    );

    println!(
        "{:<16} {:>5} {:>7} {:>7}  {:<14} {:<11} {:<8} {:<8}",
        "TEAM", "SCORE", "DELTA", "NET/90", "STATUS", "VERDICT", "CHANCES", "BADGE"
    );
    let mut teams = analyze_all(&ds.teams);
    teams.sort_by(|a, b| b.sustainability_score.cmp(&a.sustainability_score));
    for t in &teams {
        println!(
            "{:<16} {:>5} {:>7.1} {:>7.2}  {:<14} {:<11} {:<8} {:<8}",
            t.team_name,
            t.sustainability_score,
            t.efficiency_delta,
            t.net_xg_per90,
            t.efficiency_status.badge_label(),
            t.market_verdict.label(),
            format!("{:?}", t.chance_grade),
            t.finishing_badge.label(),
        );
    }

    println!("\nattack luck (most owed first)");
    let mut luck = team_luck::luck_for_all(&ds.teams);
    sort_by_attacking_value(&mut luck);
    for t in luck.iter().take(5) {
        println!(
            "  {:<16} {:>6.2}  {:<11} {:?}",
            t.team_name, t.attacking_luck, t.attack_label, t.quadrant
        );
    }

    println!("\ndefence luck (most owed first)");
    sort_by_defensive_value(&mut luck);
    for t in luck.iter().take(5) {
        println!(
            "  {:<16} {:>6.2}  {}",
            t.team_name, t.defensive_luck, t.defense_label
        );
    }

    println!("\nclean-sheet luck (luckiest first)");
    sort_by_clean_sheet_luck(&mut luck);
    for t in luck.iter().take(5) {
        println!("  {:<16} {:>+6.2}", t.team_name, t.clean_sheet_luck);
    }

    let double: Vec<String> = in_quadrant(&luck, Quadrant::DoubleValue)
        .into_iter()
        .map(|t| t.team_name)
        .collect();
    if !double.is_empty() {
        println!("\ndouble value: {}", double.join(", "));
    }

    println!("\nregression risk");
    for row in analyze_league(&ds.teams).iter().take(5) {
        println!(
            "  {:<16} {:>3} {:<9} p={:.3} prob={:.3}",
            row.team_name,
            row.risk_score,
            format!("{:?}", row.risk_category),
            row.p_value,
            row.regression_probability
        );
    }

    let players = luck_for_all(&relevant_players(&ds.players, FEED_LIMIT));
    println!("\nBUY");
    print_players(&top_buys(&players, top));
    println!("\nTRAP");
    print_players(&top_traps(&players, top));

    let keepers = clean_sheet_leaders(&luck_for_all(&ds.players));
    println!("\nCLEAN SHEETS");
    if keepers.is_empty() {
        println!("  (none)");
    }
    for p in keepers.iter().take(top) {
        println!(
            "  {:<22} {:<16} {:<3} {:>+6.2}",
            p.name,
            p.team,
            p.position.map(|pos| pos.short()).unwrap_or("-"),
            p.clean_sheet_luck.unwrap_or_default(),
        );
    }
}

fn print_players(rows: &[PlayerLuckData]) {
    if rows.is_empty() {
        println!("  (none)");
        return;
    }
    for p in rows {
        println!(
            "  {:<22} {:<16} {:<3} {:>5.1}m {:>3}g {:>6.2}xG {:>+6.2}  {:<15} {}",
            p.name,
            p.team,
            p.position.map(|pos| pos.short()).unwrap_or("-"),
            p.price,
            p.actual_goals,
            p.xg,
            p.luck_score,
            p.verdict_label,
            p.finishing_badge.label(),
        );
    }
}
