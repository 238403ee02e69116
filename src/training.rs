//! Training driver
//!
//! Wires the configuration, sprites, RNG, a frontend and the NEAT population
//! together: every generation of genomes becomes one simulated generation of
//! agents.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use crate::config::{FlapConfig, GameConfig};
use crate::frontend::Frontend;
use crate::neat::{
    FeedForwardNetwork, Genome, GenomeId, LogReporter, NeatConfig, Population, Reporter,
    RunSummary, StatisticsReporter, StopReason,
};
use crate::render::SpriteSet;
use crate::simulation::{
    GenerationReport, GenerationSimulator, HumanController, Participant, RunContext, Termination,
};

pub const WINNER_FILE: &str = "winner.ron";
pub const STATISTICS_FILE: &str = "fitness.csv";

/// Result of an evolution run
pub struct TrainingOutcome {
    pub summary: RunSummary,
    pub statistics: StatisticsReporter,
}

impl TrainingOutcome {
    /// The player quit before the run finished
    pub fn interrupted(&self) -> bool {
        self.summary.stop == StopReason::Interrupted
    }
}

pub struct Trainer {
    config: FlapConfig,
    sprites: SpriteSet,
    seed: u64,
    rng: Xoshiro256StarStar,
}

impl Trainer {
    /// Load sprites and seed the RNG (from `run.seed`, or randomly)
    pub fn new(config: FlapConfig) -> Result<Self> {
        let sprites = SpriteSet::load_or_procedural(config.game.assets_dir.as_deref())
            .context("Failed to load sprites")?;
        Ok(Self::with_sprites(config, sprites))
    }

    pub fn with_sprites(config: FlapConfig, sprites: SpriteSet) -> Self {
        let seed = config.run.seed.unwrap_or_else(|| rand::rng().random());
        log::info!("Using seed {seed}");
        Self {
            config,
            sprites,
            seed,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &FlapConfig {
        &self.config
    }

    pub fn sprites(&self) -> &SpriteSet {
        &self.sprites
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn progress_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .map(|style| style.progress_chars("█▓░"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    /// Evolve networks for up to `generations` generations
    ///
    /// With `show_progress` a bar tracks generations and the optimizer's
    /// reports are printed above it; otherwise they are suppressed so a
    /// full-screen frontend is not disturbed.
    pub fn evolve(
        &mut self,
        frontend: &mut dyn Frontend,
        generations: usize,
        show_progress: bool,
    ) -> Result<TrainingOutcome> {
        let Self {
            config,
            sprites,
            rng,
            ..
        } = self;

        let pb = if show_progress {
            let pb = ProgressBar::new(generations as u64);
            pb.set_style(Self::progress_style());
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };
        pb.println(format!(
            "Starting training: {} generations, population {}",
            generations, config.neat.pop_size
        ));

        let mut population = Population::new(
            config.neat.clone(),
            Xoshiro256StarStar::seed_from_u64(rng.random()),
        );
        let mut log_reporter = LogReporter::new(false).with_progress(pb.clone());
        let mut statistics = StatisticsReporter::new();

        let mut reporters: [&mut dyn Reporter; 2] = [&mut log_reporter, &mut statistics];

        let game = &config.game;
        let mut generation = population.generation;
        let mut failure = None;
        let summary = population.run(
            |genomes, neat| {
                let context = RunContext {
                    generation,
                    ai_playing: true,
                };
                generation += 1;
                let evaluated = evaluate_genomes(
                    game,
                    sprites,
                    genomes,
                    neat,
                    context,
                    &mut *frontend,
                    &mut *rng,
                );
                match evaluated {
                    Ok(report) if report.termination == Termination::QuitRequested => {
                        ControlFlow::Break(())
                    }
                    Ok(_) => ControlFlow::Continue(()),
                    Err(e) => {
                        failure = Some(e);
                        ControlFlow::Break(())
                    }
                }
            },
            Some(generations),
            &mut reporters,
        );

        if let Some(e) = failure {
            pb.abandon();
            return Err(e);
        }
        let summary = summary.context("Evolution failed")?;
        let message = match summary.stop {
            StopReason::FitnessThreshold => "Fitness threshold reached",
            StopReason::GenerationLimit => "Generation limit reached",
            StopReason::Interrupted => "Quit requested",
        };
        pb.finish_with_message(message);

        Ok(TrainingOutcome {
            summary,
            statistics,
        })
    }

    /// Write the winner genome and per-generation statistics to `dir`
    pub fn save_outcome(&self, outcome: &TrainingOutcome, dir: &Path) -> Result<Option<PathBuf>> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        let csv = dir.join(STATISTICS_FILE);
        outcome
            .statistics
            .write_csv(&csv)
            .with_context(|| format!("Failed to write {}", csv.display()))?;

        let Some(winner) = &outcome.summary.best else {
            return Ok(None);
        };
        let path = dir.join(WINNER_FILE);
        save_genome(winner, &path)?;
        Ok(Some(path))
    }

    /// One human-controlled agent per round until the player quits
    ///
    /// Returns the best score reached.
    pub fn play(&mut self, frontend: &mut dyn Frontend) -> Result<u32> {
        let mut best = 0;
        let mut round = 0;
        loop {
            let mut fitness = 0.0;
            let participants = vec![Participant::new(
                0,
                &self.config.game,
                &mut fitness,
                Box::new(HumanController),
            )];
            let context = RunContext {
                generation: round,
                ai_playing: false,
            };
            let report = run_generation(
                &self.config.game,
                &self.sprites,
                participants,
                context,
                frontend,
                &mut self.rng,
            )?;
            best = best.max(report.score);
            log::info!("Round {round}: score {} (best {best})", report.score);
            if report.termination == Termination::QuitRequested {
                return Ok(best);
            }
            round += 1;
        }
    }

    /// Fly a single saved genome
    pub fn replay(
        &mut self,
        genome: &Genome,
        frontend: &mut dyn Frontend,
    ) -> Result<(GenerationReport, f64)> {
        let network = FeedForwardNetwork::create(genome, &self.config.neat.genome)
            .with_context(|| format!("Genome {} has no valid network", genome.key))?;
        let mut fitness = 0.0;
        let participants = vec![Participant::new(
            genome.key,
            &self.config.game,
            &mut fitness,
            Box::new(network),
        )];
        let context = RunContext {
            generation: 0,
            ai_playing: true,
        };
        let report = run_generation(
            &self.config.game,
            &self.sprites,
            participants,
            context,
            frontend,
            &mut self.rng,
        )?;
        Ok((report, fitness))
    }
}

/// Build one agent per genome, reset fitness and fly the generation
fn evaluate_genomes<R: Rng + ?Sized>(
    game: &GameConfig,
    sprites: &SpriteSet,
    genomes: &mut [(GenomeId, Genome)],
    neat: &NeatConfig,
    context: RunContext,
    frontend: &mut dyn Frontend,
    rng: &mut R,
) -> Result<GenerationReport> {
    let mut networks = Vec::with_capacity(genomes.len());
    for (id, genome) in genomes.iter() {
        let network = FeedForwardNetwork::create(genome, &neat.genome)
            .with_context(|| format!("Genome {id} has no valid network"))?;
        networks.push(network);
    }

    let participants = genomes
        .iter_mut()
        .zip(networks)
        .map(|((id, genome), network)| {
            let fitness = genome.fitness.insert(0.0);
            Participant::new(*id, game, fitness, Box::new(network))
        })
        .collect();

    run_generation(game, sprites, participants, context, frontend, rng)
}

fn run_generation<R: Rng + ?Sized>(
    game: &GameConfig,
    sprites: &SpriteSet,
    participants: Vec<Participant<'_>>,
    context: RunContext,
    frontend: &mut dyn Frontend,
    rng: &mut R,
) -> Result<GenerationReport> {
    log::debug!(
        "Generation {} starts with {} agents",
        context.generation,
        participants.len()
    );
    frontend.begin_generation(&context);
    let report = GenerationSimulator::new(game, sprites, context, participants, rng).run(frontend);
    frontend.finish_generation(&report)?;
    if report.termination == Termination::FitnessThreshold {
        log::info!(
            "Generation {} reached the fitness threshold after {} ticks",
            context.generation,
            report.ticks
        );
    }
    Ok(report)
}

pub fn save_genome(genome: &Genome, path: &Path) -> Result<()> {
    let text = ron::ser::to_string_pretty(genome, ron::ser::PrettyConfig::default())
        .context("Failed to serialize genome")?;
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn load_genome(path: &Path) -> Result<Genome> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    ron::from_str(&text).with_context(|| format!("Failed to parse genome {}", path.display()))
}
