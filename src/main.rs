use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use flapneat::frontend::{Frontend, GifFrontend, HeadlessFrontend, TerminalFrontend};
use flapneat::training::load_genome;
use flapneat::{FlapConfig, Trainer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FrontendKind {
    /// No rendering, no input
    Headless,
    /// Live view in the terminal
    Terminal,
    /// Record generations as animated GIFs
    Gif,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to ./flapneat.ron when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Generations to evolve
    #[arg(long)]
    generations: Option<usize>,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = FrontendKind::Headless)]
    frontend: FrontendKind,

    /// Directory for the winner genome, statistics and GIFs
    #[arg(long)]
    output: Option<PathBuf>,

    /// Play yourself (terminal frontend only)
    #[arg(long, conflicts_with = "replay")]
    play: bool,

    /// Fly a saved genome instead of training
    #[arg(long)]
    replay: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = FlapConfig::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(generations) = args.generations {
        config.run.max_generations = generations;
    }
    if args.seed.is_some() {
        config.run.seed = args.seed;
    }
    if let Some(output) = args.output {
        config.run.output_dir = output;
    }

    if args.play && args.frontend != FrontendKind::Terminal {
        anyhow::bail!("--play needs the terminal frontend (--frontend terminal)");
    }

    let mut trainer = Trainer::new(config)?;

    let settings = trainer.config();
    let mut frontend: Box<dyn Frontend> = match args.frontend {
        FrontendKind::Headless => Box::new(HeadlessFrontend),
        FrontendKind::Terminal => Box::new(
            TerminalFrontend::new(&settings.game).context("Failed to set up the terminal")?,
        ),
        FrontendKind::Gif => Box::new(GifFrontend::new(&settings.game, &settings.run)?),
    };

    if args.play {
        let best = trainer.play(frontend.as_mut())?;
        drop(frontend);
        log::info!("Best score: {best}");
        return Ok(());
    }

    if let Some(path) = args.replay {
        let genome = load_genome(&path)?;
        let (report, fitness) = trainer.replay(&genome, frontend.as_mut())?;
        drop(frontend);
        log::info!(
            "Genome {} scored {} with fitness {fitness:.1} ({:?} after {} ticks)",
            genome.key,
            report.score,
            report.termination,
            report.ticks
        );
        return Ok(());
    }

    log::info!("Starting flapneat");
    let generations = trainer.config().run.max_generations;
    let show_progress = args.frontend != FrontendKind::Terminal;
    let outcome = trainer.evolve(frontend.as_mut(), generations, show_progress)?;
    drop(frontend);

    if outcome.interrupted() {
        log::info!("Quit requested, exiting");
        return Ok(());
    }

    if let Some(best) = &outcome.summary.best {
        log::info!(
            "Best genome {} (fitness {:.1}, size {:?}) after {} generations",
            best.key,
            best.fitness.unwrap_or_default(),
            best.size(),
            outcome.summary.generations
        );
    }
    let output_dir = trainer.config().run.output_dir.clone();
    if let Some(path) = trainer.save_outcome(&outcome, &output_dir)? {
        log::info!("Winner written to {}", path.display());
    }
    Ok(())
}
