use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use flapneat::neat::{FeedForwardNetwork, Genome, InnovationTracker, NeatConfig};
use flapneat::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

fn genomes(config: &NeatConfig, count: usize) -> Vec<Genome> {
    let mut tracker = InnovationTracker::new(config.genome.num_outputs as i64 - 1);
    let mut rng = Xoshiro256StarStar::seed_from_u64(7);
    (0..count as u64)
        .map(|key| {
            let mut genome = Genome::new(key);
            genome.configure_new(&config.genome, &mut tracker, &mut rng);
            genome
        })
        .collect()
}

fn headless_generation(c: &mut Criterion) {
    let config = FlapConfig::default();
    let sprites = SpriteSet::procedural();
    let population = genomes(&config.neat, config.neat.pop_size);

    c.bench_function("headless_generation_50_agents", |b| {
        b.iter_batched(
            || {
                population
                    .iter()
                    .map(|g| {
                        FeedForwardNetwork::create(g, &config.neat.genome).unwrap()
                    })
                    .collect::<Vec<_>>()
            },
            |networks| {
                let mut rng = Xoshiro256StarStar::seed_from_u64(11);
                let mut fitness = vec![0.0; networks.len()];
                let participants = fitness
                    .iter_mut()
                    .zip(networks)
                    .enumerate()
                    .map(|(i, (f, net))| {
                        Participant::new(i as u64, &config.game, f, Box::new(net))
                    })
                    .collect();
                let context = RunContext {
                    generation: 0,
                    ai_playing: true,
                };
                GenerationSimulator::new(&config.game, &sprites, context, participants, &mut rng)
                    .run(&mut HeadlessFrontend)
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, headless_generation);
criterion_main!(benches);
