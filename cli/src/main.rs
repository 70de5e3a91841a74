use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chunkfall_core::{
    Contest, ContestConfig, FinishedEvent, ImageFormat, PositionFilter, Step,
    first_step_per_submitter,
};
use clap::Parser;
use futures_executor::block_on;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Simulates a reveal contest with random players and exports every round as
/// an image.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Contest configuration (TOML)
    #[arg(short, long)]
    config: PathBuf,

    /// Number of submissions to simulate, stops early once finished
    #[arg(short, long, default_value_t = 10)]
    rounds: u32,

    /// Players stepping in each round
    #[arg(short, long, default_value_t = 8)]
    players: u32,

    /// Steps each player proposes per round, only the first one is kept
    #[arg(short, long, default_value_t = 1)]
    max_steps: usize,

    /// Where the images are written
    #[arg(short, long, default_value = "out")]
    out: PathBuf,

    /// Force a seed instead of random, overrides the configured one
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();
    log::debug!("args: {:?}", args);

    let source = fs::read_to_string(&args.config)
        .with_context(|| format!("reading {}", args.config.display()))?;
    let mut config = ContestConfig::from_toml_str(&source)?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let mut rng = match config.seed {
        Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(1)),
        None => SmallRng::from_os_rng(),
    };

    let mut contest = Contest::new(config)?;
    contest.on_finished(|event: &FinishedEvent| {
        log::info!(
            "Contest finished at {} with snapshot #{}",
            event.finished_at,
            event.snapshot
        );
    });
    export(&contest, &args.out, "initial")?;

    for round in 1..=args.rounds {
        if contest.is_finished() {
            break;
        }

        let mut steps = Vec::new();
        for player in 0..args.players {
            let count = rng.random_range(1..=args.max_steps.max(1));
            steps.extend(
                contest
                    .engine()
                    .sample_positions(count, PositionFilter::Any, &mut rng)
                    .into_iter()
                    .map(|position| Step::new(player, position)),
            );
        }

        let submission = contest.submit_steps(first_step_per_submitter(steps));
        log::info!(
            "Round {}: {} resolved, {} rejected, {} chunks still open",
            round,
            submission.resolved.len(),
            submission.rejected.len(),
            contest.engine().open_count()
        );
        export(&contest, &args.out, &format!("round_{}", round))?;
    }

    for stats in contest.bank_stats() {
        log::info!(
            "Prize {}: {} claimed, {} remaining of {}",
            stats.prize.id,
            stats.claimed,
            stats.remaining,
            stats.assigned
        );
    }
    Ok(())
}

fn export(contest: &Contest, out: &Path, name: &str) -> anyhow::Result<()> {
    block_on(contest.export_image_file(out, name, ImageFormat::Png))
        .with_context(|| format!("exporting {}", name))?;
    Ok(())
}
