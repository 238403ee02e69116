//! The generational evolution loop

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use rand::Rng;

use super::config::NeatConfig;
use super::genome::{Genome, GenomeId, InnovationTracker};
use super::reporter::Reporter;
use super::reproduction::Reproduction;
use super::species::SpeciesSet;
use crate::error::NeatError;

/// Why [`Population::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The fitness criterion reached the threshold
    FitnessThreshold,
    /// The requested number of generations ran
    GenerationLimit,
    /// The fitness function asked to stop
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Fittest genome seen during the run
    pub best: Option<Genome>,
    /// Generations evaluated during this call
    pub generations: usize,
    pub stop: StopReason,
}

/// A population of genomes plus the state needed to evolve it
pub struct Population<R: Rng> {
    pub config: NeatConfig,
    pub population: BTreeMap<GenomeId, Genome>,
    pub species: SpeciesSet,
    pub generation: usize,
    pub best_genome: Option<Genome>,
    reproduction: Reproduction,
    tracker: InnovationTracker,
    rng: R,
}

impl<R: Rng> Population<R> {
    /// Create and speciate an initial population of `config.pop_size` genomes
    pub fn new(config: NeatConfig, mut rng: R) -> Self {
        let highest_output = config.genome.num_outputs as i64 - 1;
        let mut tracker = InnovationTracker::new(highest_output);
        let mut reproduction = Reproduction::new();
        let population = reproduction.create_new(&config, config.pop_size, &mut tracker, &mut rng);
        let mut species = SpeciesSet::new();
        species.speciate(&config, &population, 0);

        Self {
            config,
            population,
            species,
            generation: 0,
            best_genome: None,
            reproduction,
            tracker,
            rng,
        }
    }

    /// Evolve for up to `generations` generations (unbounded when `None`)
    ///
    /// `fitness_fn` receives every genome of the current generation and must
    /// set each genome's `fitness`. Returning `ControlFlow::Break` ends the
    /// run after the current generation without breeding a new one.
    pub fn run<F>(
        &mut self,
        mut fitness_fn: F,
        generations: Option<usize>,
        reporters: &mut [&mut dyn Reporter],
    ) -> Result<RunSummary, NeatError>
    where
        F: FnMut(&mut [(GenomeId, Genome)], &NeatConfig) -> ControlFlow<()>,
    {
        if self.population.is_empty() {
            return Err(NeatError::EmptyPopulation);
        }

        let mut evaluated = 0usize;
        while generations.map_or(true, |n| evaluated < n) {
            evaluated += 1;
            for r in reporters.iter_mut() {
                r.start_generation(self.generation);
            }

            let mut batch: Vec<(GenomeId, Genome)> =
                std::mem::take(&mut self.population).into_iter().collect();
            let flow = fitness_fn(&mut batch, &self.config);
            self.population = batch.into_iter().collect();

            if let ControlFlow::Break(()) = flow {
                self.track_best();
                return Ok(self.summary(evaluated, StopReason::Interrupted));
            }

            if let Some((&id, _)) = self.population.iter().find(|(_, g)| g.fitness.is_none()) {
                return Err(NeatError::MissingFitness(id));
            }

            let best = self.track_best().ok_or(NeatError::EmptyPopulation)?;
            for r in reporters.iter_mut() {
                r.post_evaluate(&self.config, &self.population, &self.species, &best);
            }

            if !self.config.no_fitness_termination {
                let reduced = self
                    .config
                    .fitness_criterion
                    .reduce(self.population.values().filter_map(|g| g.fitness));
                if let Some(value) = reduced {
                    if self
                        .config
                        .fitness_criterion
                        .meets(value, self.config.fitness_threshold)
                    {
                        for r in reporters.iter_mut() {
                            r.found_solution(&self.config, self.generation, &best);
                        }
                        return Ok(self.summary(evaluated, StopReason::FitnessThreshold));
                    }
                }
            }

            let offspring = self.reproduction.reproduce(
                &self.config,
                &mut self.species,
                &self.population,
                self.generation,
                &mut self.tracker,
                &mut self.rng,
            );
            for &(sid, size) in &offspring.stagnant {
                for r in reporters.iter_mut() {
                    r.species_stagnant(sid, size);
                }
            }
            self.population = offspring.population;

            if self.species.is_empty() || self.population.is_empty() {
                for r in reporters.iter_mut() {
                    r.complete_extinction();
                }
                if !self.config.reset_on_extinction {
                    return Err(NeatError::CompleteExtinction);
                }
                self.population = self.reproduction.create_new(
                    &self.config,
                    self.config.pop_size,
                    &mut self.tracker,
                    &mut self.rng,
                );
            }

            self.species
                .speciate(&self.config, &self.population, self.generation);
            for r in reporters.iter_mut() {
                r.end_generation(&self.config, &self.population, &self.species);
            }
            self.tracker.end_generation();
            self.generation += 1;
        }

        if self.config.no_fitness_termination {
            if let Some(best) = &self.best_genome {
                for r in reporters.iter_mut() {
                    r.found_solution(&self.config, self.generation, best);
                }
            }
        }
        Ok(self.summary(evaluated, StopReason::GenerationLimit))
    }

    /// Update `best_genome` from the current population and return this
    /// generation's best
    fn track_best(&mut self) -> Option<Genome> {
        let best = self
            .population
            .values()
            .filter(|g| g.fitness.is_some())
            .max_by(|a, b| {
                a.fitness
                    .unwrap_or(f64::MIN)
                    .total_cmp(&b.fitness.unwrap_or(f64::MIN))
            })?
            .clone();
        let improved = match &self.best_genome {
            Some(current) => best.fitness > current.fitness,
            None => true,
        };
        if improved {
            self.best_genome = Some(best.clone());
        }
        Some(best)
    }

    fn summary(&self, generations: usize, stop: StopReason) -> RunSummary {
        RunSummary {
            best: self.best_genome.clone(),
            generations,
            stop,
        }
    }
}
