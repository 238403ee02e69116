//! Progress reporting hooks for the evolution loop

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use indicatif::ProgressBar;
use web_time::Instant;

use super::config::NeatConfig;
use super::genome::{Genome, GenomeId};
use super::species::{SpeciesId, SpeciesSet};

/// Observer of a [`Population`](super::Population) run
///
/// Every hook has an empty default so reporters only implement what they
/// care about.
pub trait Reporter {
    fn start_generation(&mut self, _generation: usize) {}

    fn end_generation(
        &mut self,
        _config: &NeatConfig,
        _population: &BTreeMap<GenomeId, Genome>,
        _species: &SpeciesSet,
    ) {
    }

    fn post_evaluate(
        &mut self,
        _config: &NeatConfig,
        _population: &BTreeMap<GenomeId, Genome>,
        _species: &SpeciesSet,
        _best: &Genome,
    ) {
    }

    fn complete_extinction(&mut self) {}

    fn found_solution(&mut self, _config: &NeatConfig, _generation: usize, _best: &Genome) {}

    fn species_stagnant(&mut self, _species: SpeciesId, _size: usize) {}
}

fn mean_stdev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Writes per-generation summaries through `log`, or above a progress bar
pub struct LogReporter {
    show_species_detail: bool,
    progress: Option<ProgressBar>,
    generation: usize,
    generation_start: Option<Instant>,
    generation_times: Vec<f64>,
    extinctions: usize,
}

impl LogReporter {
    pub fn new(show_species_detail: bool) -> Self {
        Self {
            show_species_detail,
            progress: None,
            generation: 0,
            generation_start: None,
            generation_times: Vec::new(),
            extinctions: 0,
        }
    }

    /// Route output through `pb.println` and tick the bar once per evaluated
    /// generation
    pub fn with_progress(mut self, pb: ProgressBar) -> Self {
        self.progress = Some(pb);
        self
    }

    fn emit(&self, msg: String) {
        match &self.progress {
            Some(pb) => pb.println(msg),
            None => log::info!("{msg}"),
        }
    }
}

impl Reporter for LogReporter {
    fn start_generation(&mut self, generation: usize) {
        self.generation = generation;
        self.emit(format!("****** Running generation {generation} ******"));
        self.generation_start = Some(Instant::now());
    }

    fn end_generation(
        &mut self,
        _config: &NeatConfig,
        population: &BTreeMap<GenomeId, Genome>,
        species: &SpeciesSet,
    ) {
        self.emit(format!(
            "Population of {} members in {} species",
            population.len(),
            species.len()
        ));
        if self.show_species_detail {
            self.emit("   ID   age  size   fitness   adj fit  stag".to_string());
            for s in species.species.values() {
                let age = self.generation.saturating_sub(s.created);
                let fitness = s.fitness.map_or("--".to_string(), |f| format!("{f:.1}"));
                let adjusted = s
                    .adjusted_fitness
                    .map_or("--".to_string(), |f| format!("{f:.3}"));
                let stagnation = self.generation.saturating_sub(s.last_improved);
                self.emit(format!(
                    "{:>5} {:>5} {:>5} {:>9} {:>9} {:>5}",
                    s.key,
                    age,
                    s.members.len(),
                    fitness,
                    adjusted,
                    stagnation
                ));
            }
        }
        self.emit(format!("Total extinctions: {}", self.extinctions));

        if let Some(start) = self.generation_start.take() {
            let elapsed = start.elapsed().as_secs_f64();
            self.generation_times.push(elapsed);
            let recent = &self.generation_times[self.generation_times.len().saturating_sub(10)..];
            let average = recent.iter().sum::<f64>() / recent.len() as f64;
            self.emit(format!(
                "Generation time: {elapsed:.3} sec ({average:.3} average)"
            ));
        }
    }

    fn post_evaluate(
        &mut self,
        _config: &NeatConfig,
        population: &BTreeMap<GenomeId, Genome>,
        species: &SpeciesSet,
        best: &Genome,
    ) {
        let fitnesses: Vec<f64> = population.values().filter_map(|g| g.fitness).collect();
        let (mean, stdev) = mean_stdev(&fitnesses);
        self.emit(format!(
            "Population's average fitness: {mean:.5} stdev: {stdev:.5}"
        ));
        let (nodes, connections) = best.size();
        let species_id = species
            .species_of(best.key)
            .map_or("--".to_string(), |sid| sid.to_string());
        self.emit(format!(
            "Best fitness: {:.5} - size: ({nodes}, {connections}) - species {species_id} - id {}",
            best.fitness.unwrap_or_default(),
            best.key
        ));
        if let Some(pb) = &self.progress {
            pb.set_message(format!("best {:.1}", best.fitness.unwrap_or_default()));
            pb.inc(1);
        }
    }

    fn complete_extinction(&mut self) {
        self.extinctions += 1;
        self.emit("All species extinct.".to_string());
    }

    fn found_solution(&mut self, _config: &NeatConfig, generation: usize, best: &Genome) {
        let (nodes, connections) = best.size();
        self.emit(format!(
            "Best individual in generation {generation} meets fitness threshold - complexity: ({nodes}, {connections})"
        ));
    }

    fn species_stagnant(&mut self, species: SpeciesId, size: usize) {
        self.emit(format!(
            "Species {species} with {size} members is stagnated: removing it"
        ));
    }
}

/// Fitness summary of one generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationStats {
    pub best: f64,
    pub mean: f64,
    pub stdev: f64,
    pub species: usize,
}

/// Collects per-generation fitness statistics for later inspection
#[derive(Debug, Clone, Default)]
pub struct StatisticsReporter {
    pub most_fit_genomes: Vec<Genome>,
    pub generations: Vec<GenerationStats>,
    /// Member count per species, one map per generation
    pub species_sizes: Vec<BTreeMap<SpeciesId, usize>>,
}

impl StatisticsReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fittest genome seen in any generation
    pub fn best_genome(&self) -> Option<&Genome> {
        self.most_fit_genomes.iter().max_by(|a, b| {
            a.fitness
                .unwrap_or(f64::MIN)
                .total_cmp(&b.fitness.unwrap_or(f64::MIN))
        })
    }

    pub fn fitness_mean(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.mean).collect()
    }

    pub fn fitness_stdev(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.stdev).collect()
    }

    /// Write `generation,best,mean,stdev,species` rows
    pub fn write_csv(&self, path: &Path) -> std::io::Result<()> {
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        writeln!(file, "generation,best,mean,stdev,species")?;
        for (generation, stats) in self.generations.iter().enumerate() {
            writeln!(
                file,
                "{generation},{},{},{},{}",
                stats.best, stats.mean, stats.stdev, stats.species
            )?;
        }
        file.flush()
    }
}

impl Reporter for StatisticsReporter {
    fn post_evaluate(
        &mut self,
        _config: &NeatConfig,
        population: &BTreeMap<GenomeId, Genome>,
        species: &SpeciesSet,
        best: &Genome,
    ) {
        self.most_fit_genomes.push(best.clone());

        let fitnesses: Vec<f64> = population.values().filter_map(|g| g.fitness).collect();
        let (mean, stdev) = mean_stdev(&fitnesses);
        self.generations.push(GenerationStats {
            best: best.fitness.unwrap_or_default(),
            mean,
            stdev,
            species: species.len(),
        });
        self.species_sizes.push(
            species
                .species
                .iter()
                .map(|(&sid, s)| (sid, s.members.len()))
                .collect(),
        );
    }
}
