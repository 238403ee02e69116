use flapneat::prelude::*;
use flapneat::render::SceneView;
use flapneat::simulation::{from_fn, Observation, TickInput};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

fn context() -> RunContext {
    RunContext {
        generation: 0,
        ai_playing: true,
    }
}

/// Jumps whenever the agent sinks more than `offset` below the gap-center
fn hover(gap_center: f64, offset: f64) -> Box<dyn Controller> {
    Box::new(from_fn(move |obs: &Observation| {
        if obs.y > gap_center + offset {
            1.0
        } else {
            0.0
        }
    }))
}

fn never_jump() -> Box<dyn Controller> {
    Box::new(from_fn(|_: &Observation| 0.0))
}

/// Counts presented frames and never quits
#[derive(Default)]
struct CountingFrontend {
    presented: usize,
    last_score: u32,
}

impl Frontend for CountingFrontend {
    fn poll(&mut self) -> TickInput {
        TickInput::default()
    }

    fn present(&mut self, view: &SceneView) {
        self.presented += 1;
        self.last_score = view.score;
    }
}

/// Quits on the given poll
struct QuitAfter(usize);

impl Frontend for QuitAfter {
    fn poll(&mut self) -> TickInput {
        if self.0 == 0 {
            return TickInput {
                quit: true,
                jump: false,
            };
        }
        self.0 -= 1;
        TickInput::default()
    }

    fn present(&mut self, _view: &SceneView) {}
}

#[test]
fn test_falling_agent_hits_the_ground() {
    let config = GameConfig::default();
    let sprites = SpriteSet::procedural();
    let mut rng = Xoshiro256StarStar::seed_from_u64(1);
    let mut fitness = 0.0;
    let participants = vec![Participant::new(1, &config, &mut fitness, never_jump())];

    let report = GenerationSimulator::new(&config, &sprites, context(), participants, &mut rng)
        .run(&mut HeadlessFrontend);

    assert_eq!(report.termination, Termination::AllEliminated);
    // Bottom edge passes y = 730 on the 23rd tick
    assert_eq!(report.ticks, 23);
    assert_eq!(report.score, 0);
    assert_eq!(report.alive, 0);
    assert!((fitness - 2.3).abs() < 1e-9);
}

#[test]
fn test_hovering_agent_passes_one_obstacle() {
    let config = GameConfig::default();
    let sprites = SpriteSet::procedural();
    let mut rng = Xoshiro256StarStar::seed_from_u64(2);
    let mut fitness = 0.0;
    {
        let participants = vec![Participant::new(
            1,
            &config,
            &mut fitness,
            hover(300.0, 115.0),
        )];
        let sim = GenerationSimulator::new(&config, &sprites, context(), participants, &mut rng);
        let params = sim.obstacle_params();
        let mut sim = sim.with_obstacles(vec![Obstacle::with_gap_center(700.0, 300.0, params)]);

        for _ in 0..95 {
            assert_eq!(sim.step(TickInput::default()), None);
        }
        assert_eq!(sim.score(), 0);
        assert_eq!(sim.obstacles().len(), 1);

        // 96th tick: the obstacle's left edge slips behind the agent
        assert_eq!(sim.step(TickInput::default()), None);
        assert_eq!(sim.score(), 1);
        assert!(sim.obstacles()[0].passed);
        assert_eq!(sim.obstacles().len(), 2);
        assert_eq!(sim.obstacles()[0].x, 220.0);
        // The new obstacle does not move on the tick it appears
        assert_eq!(sim.obstacles()[1].x, config.spawn_obstacle_x);
        assert!(!sim.obstacles()[1].passed);
        assert!((*sim.participants()[0].fitness - 14.6).abs() < 1e-9);

        // Clear of the first obstacle and nowhere near the second
        for _ in 0..54 {
            assert_eq!(sim.step(TickInput::default()), None);
        }
        assert_eq!(sim.score(), 1);
        assert_eq!(sim.participants().len(), 1);
    }
    assert!((fitness - 20.0).abs() < 1e-9);
}

#[test]
fn test_collision_removes_only_the_colliding_agent() {
    let config = GameConfig::default();
    let sprites = SpriteSet::procedural();
    let mut rng = Xoshiro256StarStar::seed_from_u64(3);
    let mut survivor = 0.0;
    let mut crasher = 0.0;
    {
        let participants = vec![
            Participant::new(10, &config, &mut crasher, hover(300.0, 40.0)),
            Participant::new(20, &config, &mut survivor, hover(300.0, 115.0)),
        ];
        let sim = GenerationSimulator::new(&config, &sprites, context(), participants, &mut rng);
        let params = sim.obstacle_params();
        let mut sim = sim.with_obstacles(vec![Obstacle::with_gap_center(700.0, 300.0, params)]);

        for _ in 0..81 {
            sim.step(TickInput::default());
        }
        assert_eq!(sim.participants().len(), 2);

        // Hovering too high, the first agent clips the upper barrier
        sim.step(TickInput::default());
        let ids: Vec<u64> = sim.participants().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![20]);

        for _ in 0..20 {
            sim.step(TickInput::default());
        }
        assert_eq!(sim.score(), 1);
    }
    // The removed agent keeps what it earned before the crash; the survivor
    // also got the pass reward
    assert!((crasher - 8.2).abs() < 1e-9);
    assert!((survivor - (10.2 + 5.0)).abs() < 1e-9);
}

#[test]
fn test_agents_colliding_together_are_all_removed() {
    let config = GameConfig::default();
    let sprites = SpriteSet::procedural();
    let mut rng = Xoshiro256StarStar::seed_from_u64(7);
    let mut fitness = vec![0.0; 3];
    {
        let participants = fitness
            .iter_mut()
            .enumerate()
            .map(|(i, f)| {
                let offset = if i < 2 { 40.0 } else { 115.0 };
                Participant::new(i as u64, &config, f, hover(300.0, offset))
            })
            .collect();
        let sim = GenerationSimulator::new(&config, &sprites, context(), participants, &mut rng);
        let params = sim.obstacle_params();
        let mut sim = sim.with_obstacles(vec![Obstacle::with_gap_center(700.0, 300.0, params)]);

        for _ in 0..81 {
            sim.step(TickInput::default());
        }
        assert_eq!(sim.participants().len(), 3);

        // Neighbours in the list clip the barrier on the same tick
        sim.step(TickInput::default());
        let ids: Vec<u64> = sim.participants().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2]);
    }
    assert!((fitness[0] - 8.2).abs() < 1e-9);
    assert!((fitness[1] - 8.2).abs() < 1e-9);
}

#[test]
fn test_colliding_agent_still_passes_the_obstacle() {
    let config = GameConfig::default();
    let sprites = SpriteSet::procedural();
    let mut rng = Xoshiro256StarStar::seed_from_u64(8);
    let mut crasher = 0.0;
    let mut survivor = 0.0;
    {
        let mut high = Participant::new(1, &config, &mut crasher, never_jump());
        high.agent.y = 100.0;
        let participants = vec![
            high,
            Participant::new(2, &config, &mut survivor, never_jump()),
        ];
        let sim = GenerationSimulator::new(&config, &sprites, context(), participants, &mut rng);
        let params = sim.obstacle_params();
        // Already left of the agents, opening between y = 300 and 500
        let mut sim = sim.with_obstacles(vec![Obstacle::with_gap_center(225.0, 300.0, params)]);

        assert_eq!(sim.step(TickInput::default()), None);
        let ids: Vec<u64> = sim.participants().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2]);
        assert!(sim.obstacles()[0].passed);
        assert_eq!(sim.obstacles().len(), 2);
        assert_eq!(sim.score(), 1);
    }
    // The pass reward only reaches agents that are still active
    assert!((crasher - 0.1).abs() < 1e-9);
    assert!((survivor - 5.1).abs() < 1e-9);
}

#[test]
fn test_agents_leaving_the_play_area_together_are_all_removed() {
    let config = GameConfig::default();
    let sprites = SpriteSet::procedural();
    let mut rng = Xoshiro256StarStar::seed_from_u64(9);
    let mut fitness = vec![0.0; 3];
    let participants = fitness
        .iter_mut()
        .enumerate()
        .map(|(i, f)| {
            let controller = if i < 2 {
                never_jump()
            } else {
                hover(300.0, 115.0)
            };
            Participant::new(i as u64, &config, f, controller)
        })
        .collect();
    let mut sim = GenerationSimulator::new(&config, &sprites, context(), participants, &mut rng);

    for _ in 0..22 {
        sim.step(TickInput::default());
    }
    assert_eq!(sim.participants().len(), 3);

    sim.step(TickInput::default());
    let ids: Vec<u64> = sim.participants().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![2]);
}

#[test]
fn test_fitness_threshold_stops_before_presenting() {
    let config = GameConfig {
        termination_fitness: 4.95,
        ..GameConfig::default()
    };
    let sprites = SpriteSet::procedural();
    let mut rng = Xoshiro256StarStar::seed_from_u64(4);
    let mut fitness = 0.0;
    let participants = vec![Participant::new(
        1,
        &config,
        &mut fitness,
        hover(300.0, 115.0),
    )];
    let mut frontend = CountingFrontend::default();

    let report = GenerationSimulator::new(&config, &sprites, context(), participants, &mut rng)
        .run(&mut frontend);

    assert_eq!(report.termination, Termination::FitnessThreshold);
    assert_eq!(report.ticks, 50);
    assert_eq!(report.alive, 1);
    assert_eq!(frontend.presented, 49);
}

#[test]
fn test_quit_request_ends_the_generation() {
    let config = GameConfig::default();
    let sprites = SpriteSet::procedural();
    let mut rng = Xoshiro256StarStar::seed_from_u64(5);
    let mut fitness = 0.0;
    let participants = vec![Participant::new(
        1,
        &config,
        &mut fitness,
        hover(300.0, 115.0),
    )];

    let report = GenerationSimulator::new(&config, &sprites, context(), participants, &mut rng)
        .run(&mut QuitAfter(10));

    assert_eq!(report.termination, Termination::QuitRequested);
    assert_eq!(report.ticks, 10);
    assert_eq!(report.alive, 1);
}

#[test]
fn test_random_generations_keep_invariants() {
    let config = GameConfig::default();
    let sprites = SpriteSet::procedural();

    for seed in 0..8u64 {
        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        let mut fitness = vec![0.0; 12];
        let controllers: Vec<Box<dyn Controller>> = (0..12u64)
            .map(|i| {
                let mut jitter = Xoshiro256StarStar::seed_from_u64(seed * 100 + i);
                Box::new(from_fn(move |_: &Observation| jitter.random::<f64>() * 0.6))
                    as Box<dyn Controller>
            })
            .collect();
        let participants = fitness
            .iter_mut()
            .zip(controllers)
            .enumerate()
            .map(|(i, (f, c))| Participant::new(i as u64, &config, f, c))
            .collect();
        let mut sim =
            GenerationSimulator::new(&config, &sprites, context(), participants, &mut rng);

        let mut previous: Vec<(u64, f64)> = Vec::new();
        let mut score = 0;
        for _ in 0..2000 {
            let done = sim.step(TickInput::default());
            let current: Vec<(u64, f64)> = sim
                .participants()
                .iter()
                .map(|p| (p.id, *p.fitness))
                .collect();

            if !previous.is_empty() {
                assert!(current.len() <= previous.len());
                for (id, fit) in &current {
                    let before = previous.iter().find(|(pid, _)| pid == id);
                    let (_, before) = before.expect("agents never reappear");
                    assert!(fit > before, "fitness grows every tick");
                }
            }
            assert!(sim.score() >= score);
            score = sim.score();

            // Obstacles stay ordered left to right
            let xs: Vec<f32> = sim.obstacles().iter().map(|o| o.x).collect();
            assert!(xs.windows(2).all(|w| w[0] < w[1]));

            previous = current;
            if done.is_some() {
                break;
            }
        }
    }
}

#[test]
fn test_every_pass_spawns_exactly_one_obstacle() {
    let config = GameConfig::default();
    let sprites = SpriteSet::procedural();
    let mut rng = Xoshiro256StarStar::seed_from_u64(6);
    let mut fitness = vec![0.0; 3];
    let participants = fitness
        .iter_mut()
        .enumerate()
        .map(|(i, f)| {
            Participant::new(i as u64, &config, f, hover(300.0, 115.0))
        })
        .collect();
    let sim = GenerationSimulator::new(&config, &sprites, context(), participants, &mut rng);
    let params = sim.obstacle_params();
    let mut sim = sim.with_obstacles(vec![Obstacle::with_gap_center(700.0, 300.0, params)]);

    for _ in 0..96 {
        sim.step(TickInput::default());
    }
    // Three agents pass together but only one obstacle appears
    assert_eq!(sim.score(), 1);
    assert_eq!(sim.obstacles().len(), 2);
    assert_eq!(sim.participants().len(), 3);
    for p in sim.participants() {
        assert!((*p.fitness - 14.6).abs() < 1e-9);
    }
}
