#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Orchestration boundary between a render loop and the simulation.
//!
//! A [`Session`] owns the authoritative world together with the pure
//! systems and exposes the per-frame `advance(dt)` entry point plus the
//! player-facing actions: placement, selling, fusion, and wave start. The
//! entire pipeline of one frame — tick, targeting, firing — completes
//! inside a single `advance` call, so callers on any scheduler observe
//! consistent state between frames.

use std::time::Duration;

use gem_defence_core::{
    Command, CombatTuning, EnemyView, Event, FusionRecipe, GamePhase, GemCatalog, GemTypeId,
    GridCell, GridSpec, Path, ProjectileView, TowerId, TowerTarget, TowerView,
};
use gem_defence_system_fusion::{check_fusion, Fusion, FusionMatch};
use gem_defence_system_targeting::Targeting;
use gem_defence_system_wave_generation::WaveGeneration;
use gem_defence_world::{self as world, query, World};

/// Slowest supported game-speed scalar.
const MIN_GAME_SPEED: f32 = 0.25;
/// Fastest supported game-speed scalar.
const MAX_GAME_SPEED: f32 = 8.0;

/// Everything needed to boot a session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Board description to play on.
    pub spec: GridSpec,
    /// Gem-type catalog supplied by the content store.
    pub catalog: GemCatalog,
    /// Fusion rules supplied by the content store.
    pub recipes: Vec<FusionRecipe>,
    /// Combat tuning in force for the whole session.
    pub tuning: CombatTuning,
    /// Seed driving wave generation, crit rolls, and fusion donor draws.
    pub seed: u64,
}

impl Default for SessionConfig {
    /// Offline configuration backed by the built-in content catalog.
    fn default() -> Self {
        Self {
            spec: GridSpec::default(),
            catalog: GemCatalog::builtin(),
            recipes: gem_defence_core::builtin_recipes(),
            tuning: CombatTuning::default(),
            seed: 0,
        }
    }
}

/// Snapshot bundle returned to the render loop after each frame.
#[derive(Clone, Debug)]
pub struct FrameReport {
    /// Events emitted while processing the frame, in order.
    pub events: Vec<Event>,
    /// Lifecycle phase after the frame.
    pub phase: GamePhase,
    /// Live enemies after the frame.
    pub enemies: EnemyView,
    /// Placed towers after the frame.
    pub towers: TowerView,
    /// In-flight projectiles after the frame.
    pub projectiles: ProjectileView,
    /// Score after the frame.
    pub score: u32,
    /// Lives after the frame.
    pub lives: u32,
    /// One-based number of the current (or next) wave.
    pub wave: u32,
}

/// Live game session owning the world and every pure system.
#[derive(Debug)]
pub struct Session {
    world: World,
    targeting: Targeting,
    generation: WaveGeneration,
    fusion: Fusion,
    recipes: Vec<FusionRecipe>,
    previous_wave_health: u32,
    game_speed: f32,
    targets: Vec<TowerTarget>,
}

impl Session {
    /// Boots a session from the provided configuration.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let world = World::new(config.spec, config.catalog, config.tuning, config.seed);
        Self {
            world,
            targeting: Targeting::new(),
            generation: WaveGeneration::new(config.seed),
            fusion: Fusion::new(config.seed),
            recipes: config.recipes,
            previous_wave_health: 0,
            game_speed: 1.0,
            targets: Vec::new(),
        }
    }

    /// Requests placement of a provisional tower.
    pub fn place_gem(&mut self, gem: GemTypeId, cell: GridCell) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::PlaceGem { gem, cell }, &mut events);
        events
    }

    /// Requests removal of a placed tower.
    pub fn sell_tower(&mut self, tower: TowerId) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::SellTower { tower }, &mut events);
        events
    }

    /// Generates the next wave and launches it.
    ///
    /// `keep` names the one provisional tower that survives confirmation.
    /// When no route exists the world refuses the start and the rejection
    /// event is returned with all placement state unchanged.
    pub fn start_wave(&mut self, keep: Option<TowerId>) -> Vec<Event> {
        let wave = query::wave(&self.world);
        let global_resistance = query::tuning(&self.world).default_global_resistance;
        let plan = self.generation.generate(
            wave,
            query::catalog(&self.world),
            self.previous_wave_health,
            global_resistance,
        );

        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::BeginWave {
                keep,
                enemies: plan.enemies,
            },
            &mut events,
        );

        if events
            .iter()
            .any(|event| matches!(event, Event::WaveStarted { .. }))
        {
            self.previous_wave_health = plan.health;
        }
        events
    }

    /// Reports whether (and how) the provided tower can fuse right now.
    #[must_use]
    pub fn fusion_options(&self, tower: TowerId) -> Option<FusionMatch> {
        check_fusion(tower, &self.recipes, &query::tower_view(&self.world))
    }

    /// Commits a fusion on the provided tower, if one is available.
    pub fn fuse_tower(&mut self, tower: TowerId) -> Vec<Event> {
        let towers = query::tower_view(&self.world);
        let Some(plan) = self.fusion.plan(tower, &self.recipes, &towers) else {
            return Vec::new();
        };

        let mut events = Vec::new();
        world::apply(&mut self.world, Command::ApplyFusion { plan }, &mut events);
        events
    }

    /// Adjusts the scalar applied to wall-clock frame deltas.
    pub fn set_game_speed(&mut self, speed: f32) {
        self.game_speed = speed.clamp(MIN_GAME_SPEED, MAX_GAME_SPEED);
    }

    /// Scalar currently applied to wall-clock frame deltas.
    #[must_use]
    pub fn game_speed(&self) -> f32 {
        self.game_speed
    }

    /// Runs one frame: tick, targeting, and firing, in that order.
    ///
    /// Outside the wave phase the delta is discarded entirely, so pausing
    /// in preparation or lingering on the game-over screen never produces
    /// a catch-up spike when the simulation resumes.
    pub fn advance(&mut self, dt: Duration) -> FrameReport {
        let mut events = Vec::new();

        if query::phase(&self.world) == GamePhase::Wave {
            let scaled = dt.mul_f32(self.game_speed);
            world::apply(&mut self.world, Command::Tick { dt: scaled }, &mut events);

            let towers = query::tower_view(&self.world);
            let enemies = query::enemy_view(&self.world);
            let mut targets = std::mem::take(&mut self.targets);
            self.targeting
                .handle(query::phase(&self.world), &towers, &enemies, &mut targets);
            for target in &targets {
                world::apply(
                    &mut self.world,
                    Command::FireProjectile {
                        tower: target.tower,
                        target: target.enemy,
                    },
                    &mut events,
                );
            }
            self.targets = targets;
        }

        FrameReport {
            phase: query::phase(&self.world),
            enemies: query::enemy_view(&self.world),
            towers: query::tower_view(&self.world),
            projectiles: query::projectile_view(&self.world),
            score: query::score(&self.world),
            lives: query::lives(&self.world),
            wave: query::wave(&self.world),
            events,
        }
    }

    /// Resets the board for a fresh game.
    ///
    /// Enemy identifiers keep counting: the generator outlives the reset.
    pub fn new_game(&mut self) -> Vec<Event> {
        let spec = query::grid_spec(&self.world).clone();
        self.previous_wave_health = 0;
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::ConfigureGrid { spec }, &mut events);
        events
    }

    /// Fusion rules the session was configured with.
    #[must_use]
    pub fn recipes(&self) -> &[FusionRecipe] {
        &self.recipes
    }

    /// Lifecycle phase the world is currently in.
    #[must_use]
    pub fn phase(&self) -> GamePhase {
        query::phase(&self.world)
    }

    /// Lives the player has left.
    #[must_use]
    pub fn lives(&self) -> u32 {
        query::lives(&self.world)
    }

    /// Score accumulated so far.
    #[must_use]
    pub fn score(&self) -> u32 {
        query::score(&self.world)
    }

    /// One-based number of the current (or next) wave.
    #[must_use]
    pub fn wave(&self) -> u32 {
        query::wave(&self.world)
    }

    /// Current spawn-to-goal route, if one exists.
    #[must_use]
    pub fn route(&self) -> Option<&Path> {
        query::route(&self.world)
    }

    /// Placed towers, captured as an immutable view.
    #[must_use]
    pub fn towers(&self) -> TowerView {
        query::tower_view(&self.world)
    }

    /// Live enemies, captured as an immutable view.
    #[must_use]
    pub fn enemies(&self) -> EnemyView {
        query::enemy_view(&self.world)
    }

    /// Board description the session plays on.
    #[must_use]
    pub fn grid_spec(&self) -> &GridSpec {
        query::grid_spec(&self.world)
    }
}
