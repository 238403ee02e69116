use flapneat::frontend::{GifFrontend, HeadlessFrontend};
use flapneat::neat::StopReason;
use flapneat::render::SpriteSet;
use flapneat::training::{load_genome, STATISTICS_FILE, WINNER_FILE};
use flapneat::{FlapConfig, Trainer};

fn config(seed: u64) -> FlapConfig {
    let mut config = FlapConfig::default();
    config.neat.pop_size = 10;
    config.run.seed = Some(seed);
    config
}

#[test]
fn test_training_writes_winner_and_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let mut trainer = Trainer::with_sprites(config(21), SpriteSet::procedural());
    let outcome = trainer.evolve(&mut HeadlessFrontend, 3, false).unwrap();
    assert!(!outcome.interrupted());
    assert!(outcome.summary.generations <= 3);

    let winner_path = trainer
        .save_outcome(&outcome, dir.path())
        .unwrap()
        .expect("a best genome exists after evaluation");
    assert_eq!(winner_path, dir.path().join(WINNER_FILE));

    let winner = load_genome(&winner_path).unwrap();
    let best = outcome.summary.best.as_ref().unwrap();
    assert_eq!(winner.key, best.key);
    assert_eq!(winner.fitness, best.fitness);

    let csv = std::fs::read_to_string(dir.path().join(STATISTICS_FILE)).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("generation,best,mean,stdev,species"));
    assert_eq!(lines.count(), outcome.summary.generations);
}

#[test]
fn test_same_seed_same_evolution() {
    let run = |seed| {
        let mut config = config(seed);
        config.neat.fitness_threshold = f64::MAX;
        let mut trainer = Trainer::with_sprites(config, SpriteSet::procedural());
        let outcome = trainer.evolve(&mut HeadlessFrontend, 2, false).unwrap();
        assert_eq!(outcome.summary.stop, StopReason::GenerationLimit);
        outcome
            .statistics
            .generations
            .iter()
            .map(|g| g.best)
            .collect::<Vec<f64>>()
    };
    assert_eq!(run(33), run(33));
}

#[test]
fn test_gif_frontend_records_first_generation() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(5);
    config.neat.pop_size = 4;
    config.run.output_dir = dir.path().to_path_buf();
    config.run.gif_frame_interval = 10;
    config.run.gif_generation_interval = 0;
    // Short generations keep the capture small
    config.game.termination_fitness = 3.0;

    let mut frontend = GifFrontend::new(&config.game, &config.run).unwrap();
    let mut trainer = Trainer::with_sprites(config, SpriteSet::procedural());
    trainer.evolve(&mut frontend, 2, false).unwrap();

    let gif = std::fs::read(dir.path().join("generation_0000.gif")).unwrap();
    assert_eq!(&gif[..6], b"GIF89a");
    assert!(!dir.path().join("generation_0001.gif").exists());
}
