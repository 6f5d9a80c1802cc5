#![deny(warnings)]

//! Headless CLI that plays a full beer game and prints the results.

use anyhow::{bail, Context, Result};
use beer_core::{AiProfile, Role};
use beer_runtime::{RoundRecord, Setup, Simulation};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    player: Option<Option<Role>>,
    rounds: Option<u32>,
    seed: Option<u64>,
    ai: Vec<(Role, AiProfile)>,
    random_ai: bool,
    json: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next().map(PathBuf::from),
            "--player" => {
                let v = it.next().context("--player needs a role or 'none'")?;
                args.player = Some(if v == "none" { None } else { Some(v.parse()?) });
            }
            "--rounds" => args.rounds = it.next().and_then(|s| s.parse().ok()),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--ai" => {
                let v = it.next().context("--ai needs ROLE=PROFILE")?;
                let (role, profile) = v.split_once('=').context("--ai needs ROLE=PROFILE")?;
                args.ai.push((role.parse()?, profile.parse()?));
            }
            "--random-ai" => args.random_ai = true,
            "--json" => args.json = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

fn build_setup(args: &Args) -> Result<Setup> {
    let mut setup = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_yaml::from_str::<Setup>(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => Setup::with_player(Role::Retailer),
    };
    if let Some(player) = args.player {
        setup.player = player;
    }
    if let Some(rounds) = args.rounds {
        setup.config.total_rounds = rounds;
    }
    if let Some(seed) = args.seed {
        setup.config.rng_seed = seed;
    }
    if args.random_ai {
        let mut rng = ChaCha8Rng::seed_from_u64(setup.config.rng_seed);
        setup = setup.random_profiles(&mut rng);
    }
    for &(role, profile) in &args.ai {
        setup = setup.profile(role, profile);
    }
    Ok(setup)
}

/// Scripted player: ship everything owed, order what was demanded.
fn play_scripted_round(sim: &mut Simulation, player: Role) -> Result<bool> {
    let state = sim.role(player);
    let ship = state.total_need().min(state.inventory);
    let order = state.current_demand;
    sim.confirm_shipping(i64::from(ship))?;
    sim.confirm_ordering(i64::from(order))?;
    Ok(sim.finish_round()?)
}

fn print_history(history: &[RoundRecord], role: Role) {
    println!("{} ({role})", role.name());
    println!(
        "{:>5} {:>8} {:>9} {:>7} {:>9} {:>7} {:>8}",
        "week", "received", "inventory", "shipped", "backorder", "ordered", "cost"
    );
    for record in history {
        let line = record.for_role(role);
        println!(
            "{:>5} {:>8} {:>9} {:>7} {:>9} {:>7} {:>8}",
            record.round,
            line.received,
            line.inventory,
            line.shipped,
            line.backorder,
            line.ordered,
            line.cost
        );
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let setup = build_setup(&args)?;
    info!(player = ?setup.player, profiles = ?setup.ai_profiles, "starting CLI");

    let mut sim = Simulation::initialize(setup)?;
    match sim.player() {
        Some(player) => loop {
            if play_scripted_round(&mut sim, player)? {
                break;
            }
            sim.start_round()?;
        },
        None => sim.run_to_completion()?,
    }

    if args.json {
        let out = serde_json::json!({
            "history": sim.history(),
            "scores": sim.final_scores(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let shown: Vec<Role> = match sim.player() {
        Some(player) => vec![player],
        None => Role::ALL.to_vec(),
    };
    for role in shown {
        print_history(sim.history(), role);
        println!();
    }
    println!("Final scores");
    for (rank, score) in sim.final_scores().iter().enumerate() {
        println!(
            "{:>2}. {:<18} cost {:>8} | backorder {:>4}{}",
            rank + 1,
            score.name,
            score.total_cost,
            score.final_backorder,
            if score.is_player { " (you)" } else { "" }
        );
    }
    Ok(())
}
