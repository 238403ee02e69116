//! Species stagnation tracking

use std::collections::BTreeMap;

use super::config::StagnationConfig;
use super::genome::{Genome, GenomeId};
use super::species::{SpeciesId, SpeciesSet};

/// Verdict for one species after a generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagnationVerdict {
    pub species: SpeciesId,
    pub fitness: f64,
    pub stagnant: bool,
}

/// Update species fitness history and flag species that stopped improving
///
/// Verdicts are returned worst species first. The `species_elitism` best
/// species are never flagged, and flagging stops once only that many
/// non-stagnant species would remain.
pub fn update(
    config: &StagnationConfig,
    species_set: &mut SpeciesSet,
    population: &BTreeMap<GenomeId, Genome>,
    generation: usize,
) -> Vec<StagnationVerdict> {
    let mut scored = Vec::with_capacity(species_set.len());
    for (&sid, species) in species_set.species.iter_mut() {
        let previous = species
            .fitness_history
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let fitness = species
            .reduced_fitness(config.species_fitness_func, population)
            .unwrap_or(f64::NEG_INFINITY);
        species.fitness = Some(fitness);
        species.fitness_history.push(fitness);
        species.adjusted_fitness = None;
        if fitness > previous {
            species.last_improved = generation;
        }
        scored.push((sid, fitness, generation - species.last_improved));
    }

    scored.sort_by(|a, b| a.1.total_cmp(&b.1));

    let total = scored.len();
    let mut non_stagnant = total;
    scored
        .into_iter()
        .enumerate()
        .map(|(idx, (sid, fitness, stagnant_time))| {
            let mut stagnant = false;
            if non_stagnant > config.species_elitism {
                stagnant = stagnant_time >= config.max_stagnation;
            }
            if total - idx <= config.species_elitism {
                stagnant = false;
            }
            if stagnant {
                non_stagnant -= 1;
            }
            StagnationVerdict {
                species: sid,
                fitness,
                stagnant,
            }
        })
        .collect()
}
