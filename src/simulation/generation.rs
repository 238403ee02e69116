//! One generation of agents flying through the obstacle stream

use rand::Rng;

use super::controller::{Controller, Observation, TickInput};
use crate::config::GameConfig;
use crate::entity::{Agent, AgentPhysics, Ground, Obstacle, ObstacleParams};
use crate::frontend::Frontend;
use crate::render::{SceneView, SpriteSet};

/// Per-generation state owned by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    pub generation: usize,
    /// False when a human is playing
    pub ai_playing: bool,
}

/// Why a generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    AllEliminated,
    FitnessThreshold,
    QuitRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationReport {
    pub termination: Termination,
    /// Ticks fully simulated
    pub ticks: u64,
    pub score: u32,
    /// Agents still active when the generation stopped
    pub alive: usize,
}

/// An active agent bound to its fitness accumulator and decision function
pub struct Participant<'f> {
    /// Identifier of the genome (or player) behind this agent
    pub id: u64,
    pub agent: Agent,
    pub fitness: &'f mut f64,
    pub controller: Box<dyn Controller + 'f>,
}

impl<'f> Participant<'f> {
    /// Participant with an agent at the configured start position
    pub fn new(
        id: u64,
        config: &GameConfig,
        fitness: &'f mut f64,
        controller: Box<dyn Controller + 'f>,
    ) -> Self {
        Self {
            id,
            agent: Agent::new(
                config.agent_start_x,
                config.agent_start_y,
                AgentPhysics::from(config),
            ),
            fitness,
            controller,
        }
    }
}

/// Runs the per-tick protocol until the generation terminates
pub struct GenerationSimulator<'a, 'f, R: Rng + ?Sized> {
    config: &'a GameConfig,
    sprites: &'a SpriteSet,
    context: RunContext,
    participants: Vec<Participant<'f>>,
    obstacles: Vec<Obstacle>,
    obstacle_params: ObstacleParams,
    ground: Ground,
    score: u32,
    tick: u64,
    rng: &'a mut R,
}

impl<'a, 'f, R: Rng + ?Sized> GenerationSimulator<'a, 'f, R> {
    pub fn new(
        config: &'a GameConfig,
        sprites: &'a SpriteSet,
        context: RunContext,
        participants: Vec<Participant<'f>>,
        rng: &'a mut R,
    ) -> Self {
        let obstacle_params = ObstacleParams::new(config, sprites);
        let first = Obstacle::new(config.first_obstacle_x, obstacle_params, &mut *rng);
        Self {
            config,
            sprites,
            context,
            participants,
            obstacles: vec![first],
            obstacle_params,
            ground: Ground::new(
                config.ground_y,
                sprites.ground_width() as f32,
                config.ground_speed,
            ),
            score: 0,
            tick: 0,
            rng,
        }
    }

    /// Replace the starting obstacle stream
    pub fn with_obstacles(mut self, obstacles: Vec<Obstacle>) -> Self {
        self.obstacles = obstacles;
        self
    }

    pub fn obstacle_params(&self) -> ObstacleParams {
        self.obstacle_params
    }

    pub fn participants(&self) -> &[Participant<'f>] {
        &self.participants
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn ground(&self) -> &Ground {
        &self.ground
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Drive the generation with `frontend` supplying input and showing frames
    pub fn run(&mut self, frontend: &mut dyn Frontend) -> GenerationReport {
        loop {
            let input = frontend.poll();
            if let Some(termination) = self.step(input) {
                let report = self.report(termination);
                log::debug!(
                    "Generation {} ended after {} ticks: {:?}, score {}",
                    self.context.generation,
                    report.ticks,
                    report.termination,
                    report.score
                );
                return report;
            }
            frontend.present(&self.view());
        }
    }

    pub fn report(&self, termination: Termination) -> GenerationReport {
        GenerationReport {
            termination,
            ticks: self.tick,
            score: self.score,
            alive: self.participants.len(),
        }
    }

    /// Snapshot for rendering
    pub fn view(&self) -> SceneView<'_> {
        SceneView {
            sprites: self.sprites,
            agents: self.participants.iter().map(|p| &p.agent).collect(),
            obstacles: &self.obstacles,
            ground: &self.ground,
            score: self.score,
            generation: self.context.generation,
            ai_playing: self.context.ai_playing,
            tick: self.tick,
        }
    }

    /// Advance one tick; returns the termination reason once the generation ends
    pub fn step(&mut self, input: TickInput) -> Option<Termination> {
        if input.quit {
            return Some(Termination::QuitRequested);
        }
        if self.participants.is_empty() {
            return Some(Termination::AllEliminated);
        }

        let reference = self.reference_obstacle();
        for participant in &mut self.participants {
            let agent = &mut participant.agent;
            agent.advance_tick();
            *participant.fitness += self.config.survival_reward;

            let floor = self.config.ground_y as f64;
            let (gap_center, bottom) = reference.unwrap_or((floor, floor));
            let observation = Observation::new(agent.y as f64, gap_center, bottom);
            if participant.controller.decide(&observation, &input) > self.config.jump_threshold {
                agent.jump();
            }
        }

        self.ground.advance_tick();

        let spawn = self.sweep_obstacles();
        if spawn {
            self.score += 1;
            let obstacle = Obstacle::new(
                self.config.spawn_obstacle_x,
                self.obstacle_params,
                &mut *self.rng,
            );
            self.obstacles.push(obstacle);
            for participant in &mut self.participants {
                *participant.fitness += self.config.pass_reward;
            }
            log::debug!("Obstacle passed, score {}", self.score);
        }

        self.obstacles.retain(|o| !o.is_offscreen());

        let floor = self.config.ground_y;
        let agent_height = self.sprites.agent_height() as f32;
        self.participants.retain(|p| {
            let out = p.agent.y + agent_height > floor || p.agent.y < 0.0;
            if out {
                log::trace!("Agent {} left the play area", p.id);
            }
            !out
        });

        self.tick += 1;

        let threshold = self.config.termination_fitness;
        if self.participants.iter().any(|p| *p.fitness >= threshold) {
            return Some(Termination::FitnessThreshold);
        }
        None
    }

    /// (gap-center, lower barrier top) of the obstacle agents react to
    fn reference_obstacle(&self) -> Option<(f64, f64)> {
        let lead = self.participants.first()?;
        let mut index = 0;
        if let [first, _, ..] = self.obstacles.as_slice() {
            if lead.agent.x > first.x + first.width() {
                index = 1;
            }
        }
        self.obstacles
            .get(index)
            .map(|o| (o.gap_center as f64, o.bottom as f64))
    }

    /// Collision and pass checks, then obstacle motion; returns true if a
    /// new obstacle should spawn
    fn sweep_obstacles(&mut self) -> bool {
        let mut spawn = false;
        let sprites = self.sprites;

        for obstacle in &mut self.obstacles {
            let mut hit = Vec::with_capacity(self.participants.len());
            for participant in &self.participants {
                hit.push(obstacle.collides_with(&participant.agent, sprites));
                if !obstacle.passed && participant.agent.x > obstacle.x {
                    obstacle.passed = true;
                    spawn = true;
                }
            }

            if hit.contains(&true) {
                let mut flags = hit.into_iter();
                self.participants.retain(|p| {
                    let collided = flags.next().unwrap_or(false);
                    if collided {
                        log::trace!("Agent {} hit an obstacle", p.id);
                    }
                    !collided
                });
            }

            obstacle.advance_tick();
        }

        spawn
    }
}
