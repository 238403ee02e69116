//! Speciation by genomic distance
//!
//! Each species keeps a representative genome. Every generation the closest
//! genome to each old representative becomes the new one, and the remaining
//! genomes join the nearest representative within the compatibility
//! threshold or found a new species.

use std::collections::{BTreeMap, BTreeSet};

use ahash::HashMap;

use super::config::{FitnessCriterion, NeatConfig};
use super::genome::{Genome, GenomeId};

pub type SpeciesId = u64;

#[derive(Debug, Clone)]
pub struct Species {
    pub key: SpeciesId,
    /// Generation the species was founded in
    pub created: usize,
    pub last_improved: usize,
    pub representative: Genome,
    pub members: Vec<GenomeId>,
    pub fitness: Option<f64>,
    pub adjusted_fitness: Option<f64>,
    pub fitness_history: Vec<f64>,
}

impl Species {
    fn new(key: SpeciesId, generation: usize, representative: Genome) -> Self {
        Self {
            key,
            created: generation,
            last_improved: generation,
            representative,
            members: Vec::new(),
            fitness: None,
            adjusted_fitness: None,
            fitness_history: Vec::new(),
        }
    }

    /// Fitness values of the members present in `population`
    pub fn member_fitnesses<'a>(
        &'a self,
        population: &'a BTreeMap<GenomeId, Genome>,
    ) -> impl Iterator<Item = f64> + 'a {
        self.members
            .iter()
            .filter_map(|id| population.get(id))
            .filter_map(|g| g.fitness)
    }

    /// Reduce member fitnesses with `criterion`
    pub fn reduced_fitness(
        &self,
        criterion: FitnessCriterion,
        population: &BTreeMap<GenomeId, Genome>,
    ) -> Option<f64> {
        criterion.reduce(self.member_fitnesses(population))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpeciesSet {
    pub species: BTreeMap<SpeciesId, Species>,
    genome_to_species: HashMap<GenomeId, SpeciesId>,
    next_key: SpeciesId,
}

impl SpeciesSet {
    pub fn new() -> Self {
        Self {
            next_key: 1,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn species_of(&self, genome: GenomeId) -> Option<SpeciesId> {
        self.genome_to_species.get(&genome).copied()
    }

    /// Partition `population` into species
    pub fn speciate(
        &mut self,
        config: &NeatConfig,
        population: &BTreeMap<GenomeId, Genome>,
        generation: usize,
    ) {
        let threshold = config.species.compatibility_threshold;
        let genome_config = &config.genome;
        let mut unspeciated: BTreeSet<GenomeId> = population.keys().copied().collect();

        // Closest remaining genome to each old representative
        let mut representatives: BTreeMap<SpeciesId, GenomeId> = BTreeMap::new();
        let mut members: BTreeMap<SpeciesId, Vec<GenomeId>> = BTreeMap::new();
        for (&sid, species) in &self.species {
            let closest = unspeciated
                .iter()
                .map(|id| {
                    (
                        species.representative.distance(&population[id], genome_config),
                        *id,
                    )
                })
                .min_by(|a, b| a.0.total_cmp(&b.0));
            if let Some((_, id)) = closest {
                unspeciated.remove(&id);
                representatives.insert(sid, id);
                members.insert(sid, vec![id]);
            }
        }

        for id in unspeciated {
            let genome = &population[&id];
            let nearest = representatives
                .iter()
                .map(|(&sid, rep)| {
                    (genome.distance(&population[rep], genome_config), sid)
                })
                .filter(|(d, _)| *d < threshold)
                .min_by(|a, b| a.0.total_cmp(&b.0));
            match nearest {
                Some((_, sid)) => members.entry(sid).or_default().push(id),
                None => {
                    let sid = self.next_key;
                    self.next_key += 1;
                    representatives.insert(sid, id);
                    members.insert(sid, vec![id]);
                }
            }
        }

        self.genome_to_species.clear();
        let mut species = BTreeMap::new();
        for (sid, rep) in representatives {
            let mut entry = self.species.remove(&sid).unwrap_or_else(|| {
                Species::new(sid, generation, population[&rep].clone())
            });
            entry.representative = population[&rep].clone();
            entry.members = members.remove(&sid).unwrap_or_default();
            for &id in &entry.members {
                self.genome_to_species.insert(id, sid);
            }
            species.insert(sid, entry);
        }
        self.species = species;
    }
}
