//! Offspring allocation and breeding

use std::collections::BTreeMap;

use rand::prelude::IndexedRandom;
use rand::Rng;

use super::config::{FitnessCriterion, NeatConfig};
use super::genome::{Genome, GenomeId, InnovationTracker};
use super::species::{SpeciesId, SpeciesSet};
use super::stagnation;

/// Result of one reproduction step
#[derive(Debug, Default)]
pub struct Offspring {
    pub population: BTreeMap<GenomeId, Genome>,
    /// Species removed for stagnation, with their size
    pub stagnant: Vec<(SpeciesId, usize)>,
}

/// Breeds the next generation and hands out genome ids
#[derive(Debug, Clone)]
pub struct Reproduction {
    next_genome: GenomeId,
}

impl Default for Reproduction {
    fn default() -> Self {
        Self { next_genome: 1 }
    }
}

impl Reproduction {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> GenomeId {
        let id = self.next_genome;
        self.next_genome += 1;
        id
    }

    /// `count` freshly initialised genomes
    pub fn create_new<R: Rng + ?Sized>(
        &mut self,
        config: &NeatConfig,
        count: usize,
        tracker: &mut InnovationTracker,
        rng: &mut R,
    ) -> BTreeMap<GenomeId, Genome> {
        (0..count)
            .map(|_| {
                let mut genome = Genome::new(self.next_id());
                genome.configure_new(&config.genome, tracker, rng);
                (genome.key, genome)
            })
            .collect()
    }

    /// Produce the next generation from the evaluated `population`
    ///
    /// Returns an empty population when every species was stagnant.
    pub fn reproduce<R: Rng + ?Sized>(
        &mut self,
        config: &NeatConfig,
        species_set: &mut SpeciesSet,
        population: &BTreeMap<GenomeId, Genome>,
        generation: usize,
        tracker: &mut InnovationTracker,
        rng: &mut R,
    ) -> Offspring {
        let mut offspring = Offspring::default();
        let verdicts = stagnation::update(&config.stagnation, species_set, population, generation);

        let mut remaining: Vec<SpeciesId> = Vec::new();
        let mut all_fitnesses: Vec<f64> = Vec::new();
        for verdict in verdicts {
            let species = &species_set.species[&verdict.species];
            if verdict.stagnant {
                offspring
                    .stagnant
                    .push((verdict.species, species.members.len()));
            } else {
                all_fitnesses.extend(species.member_fitnesses(population));
                remaining.push(verdict.species);
            }
        }

        if remaining.is_empty() || all_fitnesses.is_empty() {
            species_set.species.clear();
            return offspring;
        }

        let min_fitness = all_fitnesses.iter().copied().fold(f64::INFINITY, f64::min);
        let max_fitness = all_fitnesses
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let fitness_range = (max_fitness - min_fitness).max(1.0);

        let mut adjusted = Vec::with_capacity(remaining.len());
        let mut previous_sizes = Vec::with_capacity(remaining.len());
        remaining.retain(|sid| species_set.species.contains_key(sid));
        for sid in &remaining {
            let Some(species) = species_set.species.get_mut(sid) else {
                continue;
            };
            let mean = FitnessCriterion::Mean
                .reduce(species.member_fitnesses(population))
                .unwrap_or(min_fitness);
            let af = (mean - min_fitness) / fitness_range;
            species.adjusted_fitness = Some(af);
            adjusted.push(af);
            previous_sizes.push(species.members.len());
        }

        let repro = &config.reproduction;
        let min_species_size = repro.min_species_size.max(repro.elitism);
        let spawn_amounts = compute_spawn(
            &adjusted,
            &previous_sizes,
            config.pop_size,
            min_species_size,
        );

        let mut kept = BTreeMap::new();
        for (spawn, sid) in spawn_amounts.into_iter().zip(remaining) {
            let Some(mut species) = species_set.species.remove(&sid) else {
                continue;
            };
            let mut spawn = spawn.max(repro.elitism);

            let mut old_members: Vec<&Genome> = species
                .members
                .iter()
                .filter_map(|id| population.get(id))
                .collect();
            species.members.clear();
            kept.insert(sid, species);
            old_members.sort_by(|a, b| {
                b.fitness
                    .unwrap_or(f64::MIN)
                    .total_cmp(&a.fitness.unwrap_or(f64::MIN))
            });

            for elite in old_members.iter().take(repro.elitism) {
                offspring.population.insert(elite.key, (*elite).clone());
                spawn -= 1;
            }
            if spawn == 0 {
                continue;
            }

            let cutoff = (repro.survival_threshold * old_members.len() as f64).ceil() as usize;
            old_members.truncate(cutoff.max(2));

            for _ in 0..spawn {
                let (Some(parent1), Some(parent2)) =
                    (old_members.choose(rng), old_members.choose(rng))
                else {
                    break;
                };
                let mut child = Genome::new(self.next_id());
                child.configure_crossover(parent1, parent2, rng);
                child.mutate(&config.genome, tracker, rng);
                offspring.population.insert(child.key, child);
            }
        }
        species_set.species = kept;

        offspring
    }
}

/// Number of offspring each species gets next generation
///
/// Species move halfway from their previous size towards their
/// fitness-proportional share, then all amounts are normalised to `pop_size`.
pub fn compute_spawn(
    adjusted_fitness: &[f64],
    previous_sizes: &[usize],
    pop_size: usize,
    min_species_size: usize,
) -> Vec<usize> {
    let af_sum: f64 = adjusted_fitness.iter().sum();

    let raw: Vec<i64> = adjusted_fitness
        .iter()
        .zip(previous_sizes)
        .map(|(&af, &previous)| {
            let share = if af_sum > 0.0 {
                (af / af_sum * pop_size as f64).max(min_species_size as f64)
            } else {
                min_species_size as f64
            };
            let delta = (share - previous as f64) * 0.5;
            let rounded = delta.round() as i64;
            let mut spawn = previous as i64;
            if rounded != 0 {
                spawn += rounded;
            } else if delta > 0.0 {
                spawn += 1;
            } else if delta < 0.0 {
                spawn -= 1;
            }
            spawn
        })
        .collect();

    let total: i64 = raw.iter().sum();
    let norm = if total > 0 {
        pop_size as f64 / total as f64
    } else {
        1.0
    };
    raw.into_iter()
        .map(|n| {
            ((n as f64 * norm).round().max(0.0) as usize).max(min_species_size)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    #[test]
    fn test_compute_spawn_sums_near_pop_size() {
        let spawn = compute_spawn(&[0.2, 0.8], &[25, 25], 50, 2);
        assert_eq!(spawn.len(), 2);
        assert!(spawn[1] > spawn[0]);
        let total: usize = spawn.iter().sum();
        assert!((48..=52).contains(&total), "total {total}");
    }

    #[test]
    fn test_compute_spawn_respects_min_species_size() {
        let spawn = compute_spawn(&[0.0, 1.0], &[2, 48], 50, 2);
        assert!(spawn[0] >= 2);
    }

    #[test]
    fn test_compute_spawn_zero_fitness_falls_back_to_min_size() {
        let spawn = compute_spawn(&[0.0, 0.0], &[10, 10], 20, 2);
        assert_eq!(spawn, vec![10, 10]);
    }

    #[test]
    fn test_reproduce_keeps_elites_and_population_size() {
        let config = NeatConfig::default();
        let mut rng = Xoshiro256StarStar::seed_from_u64(11);
        let mut tracker = InnovationTracker::new(0);
        let mut reproduction = Reproduction::new();
        let mut population =
            reproduction.create_new(&config, config.pop_size, &mut tracker, &mut rng);
        for (id, genome) in population.iter_mut() {
            genome.fitness = Some(*id as f64);
        }
        let mut species = SpeciesSet::new();
        species.speciate(&config, &population, 0);

        let offspring = reproduction.reproduce(
            &config,
            &mut species,
            &population,
            0,
            &mut tracker,
            &mut rng,
        );
        assert!(offspring.stagnant.is_empty());
        assert!(offspring.population.contains_key(&(config.pop_size as GenomeId)));

        let size = offspring.population.len();
        assert!(size >= config.pop_size - 5 && size <= config.pop_size + 10, "size {size}");
        // New ids continue after the initial population
        assert!(offspring
            .population
            .keys()
            .any(|&id| id > config.pop_size as GenomeId));
    }
}
