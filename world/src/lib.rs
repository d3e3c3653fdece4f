#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative game state management for Gem Defence.
//!
//! The world owns every mutable entity — towers, enemies, projectiles,
//! lives, score — and changes only through [`apply`]. Systems and adapters
//! read immutable snapshots via the [`query`] module and never touch the
//! state directly, which keeps the per-tick pipeline deterministic for a
//! fixed command sequence and seed.

use std::collections::BTreeMap;
use std::time::Duration;

use gem_defence_core::{
    Command, EffectKind, EffectSet, EnemyId, EnemySpawn, Event, FusionError, FusionPlan,
    GamePhase, GemCatalog, GemTypeId, GridCell, GridSpec, Path, PlacementError, ProjectileId,
    RemovalError, TowerId, WaveStartError,
};
use gem_defence_system_combat::{HitExpansion, PendingHit};
use gem_defence_system_pathfinding::plan_route;
use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

mod tick;
mod towers;

use towers::TowerRegistry;

pub use gem_defence_core::CombatTuning;

/// Represents the authoritative Gem Defence world state.
#[derive(Debug)]
pub struct World {
    pub(crate) spec: GridSpec,
    pub(crate) catalog: GemCatalog,
    pub(crate) tuning: CombatTuning,
    pub(crate) phase: GamePhase,
    pub(crate) route: Option<Path>,
    pub(crate) towers: TowerRegistry,
    pub(crate) enemies: BTreeMap<EnemyId, Enemy>,
    pub(crate) projectiles: Vec<Projectile>,
    pub(crate) pending_hits: Vec<PendingHit>,
    pub(crate) expanded_hits: Vec<PendingHit>,
    pub(crate) expansion: HitExpansion,
    pub(crate) lives: u32,
    pub(crate) score: u32,
    pub(crate) wave: u32,
    pub(crate) clear_delay: Option<Duration>,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) next_projectile_id: u64,
}

impl World {
    /// Creates a world ready for the first preparation phase.
    ///
    /// The seed drives every in-world random draw (currently crit rolls),
    /// so identical command sequences replay identically.
    #[must_use]
    pub fn new(spec: GridSpec, catalog: GemCatalog, tuning: CombatTuning, seed: u64) -> Self {
        let route = plan_route(&spec, &std::collections::HashSet::new());
        let lives = tuning.starting_lives;
        Self {
            spec,
            catalog,
            tuning,
            phase: GamePhase::Preparing,
            route,
            towers: TowerRegistry::new(),
            enemies: BTreeMap::new(),
            projectiles: Vec::new(),
            pending_hits: Vec::new(),
            expanded_hits: Vec::new(),
            expansion: HitExpansion::new(),
            lives,
            score: 0,
            wave: 1,
            clear_delay: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_projectile_id: 0,
        }
    }

    fn allocate_projectile_id(&mut self) -> ProjectileId {
        let id = ProjectileId::new(self.next_projectile_id);
        self.next_projectile_id += 1;
        id
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) glyph: char,
    pub(crate) speed: f32,
    pub(crate) max_health: f32,
    pub(crate) health: f32,
    pub(crate) reward: u32,
    pub(crate) resistances: [GemTypeId; 2],
    pub(crate) global_resistance: f32,
    pub(crate) path_index: f32,
    pub(crate) status: StatusState,
}

impl Enemy {
    fn from_spawn(spawn: &EnemySpawn) -> Self {
        Self {
            id: spawn.id,
            glyph: spawn.glyph,
            speed: spawn.speed,
            max_health: spawn.max_health,
            health: spawn.max_health,
            reward: spawn.reward,
            resistances: spawn.resistances,
            global_resistance: spawn.global_resistance,
            path_index: spawn.path_index,
            status: StatusState::default(),
        }
    }
}

/// Countdown timers for the stacking status effects on one enemy.
///
/// Repeat applications refresh a timer instead of extending it; burn also
/// re-caches its damage per second from the triggering hit.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct StatusState {
    pub(crate) slow: Duration,
    pub(crate) poison: Duration,
    pub(crate) stun: Duration,
    pub(crate) burn: Duration,
    pub(crate) burn_dps: f32,
}

#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) position: Vec2,
    pub(crate) target: EnemyId,
    pub(crate) damage: f32,
    pub(crate) effects: EffectSet,
    pub(crate) source: GemTypeId,
    pub(crate) spread: f32,
}

/// Applies the provided command to the world, mutating state
/// deterministically and appending the resulting events.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { spec } => configure_grid(world, spec, out_events),
        Command::PlaceGem { gem, cell } => place_gem(world, gem, cell, out_events),
        Command::SellTower { tower } => sell_tower(world, tower, out_events),
        Command::BeginWave { keep, enemies } => begin_wave(world, keep, enemies, out_events),
        Command::Tick { dt } => tick::run(world, dt, out_events),
        Command::FireProjectile { tower, target } => fire_projectile(world, tower, target, out_events),
        Command::ApplyFusion { plan } => apply_fusion(world, plan, out_events),
    }
}

fn configure_grid(world: &mut World, spec: GridSpec, out_events: &mut Vec<Event>) {
    world.route = plan_route(&spec, &std::collections::HashSet::new());
    world.spec = spec;
    world.towers.clear();
    world.enemies.clear();
    world.projectiles.clear();
    world.pending_hits.clear();
    world.lives = world.tuning.starting_lives;
    world.score = 0;
    world.wave = 1;
    world.clear_delay = None;

    if world.phase != GamePhase::Preparing {
        world.phase = GamePhase::Preparing;
        out_events.push(Event::PhaseChanged {
            phase: GamePhase::Preparing,
        });
    }
}

fn place_gem(world: &mut World, gem: GemTypeId, cell: GridCell, out_events: &mut Vec<Event>) {
    let reject = |reason| Event::PlacementRejected { gem, cell, reason };

    if world.phase != GamePhase::Preparing {
        out_events.push(reject(PlacementError::InvalidPhase));
        return;
    }
    if !world.spec.contains(cell) {
        out_events.push(reject(PlacementError::OutOfBounds));
        return;
    }
    if world.spec.is_zone(cell) {
        out_events.push(reject(PlacementError::ReservedZone));
        return;
    }
    if world.towers.occupant(cell).is_some() {
        out_events.push(reject(PlacementError::Occupied));
        return;
    }
    let Some(gem_type) = world.catalog.get(gem).cloned() else {
        out_events.push(reject(PlacementError::UnknownGem));
        return;
    };

    // Probe the route with the candidate cell before committing anything.
    let mut obstacles = world.towers.obstacle_cells();
    let _ = obstacles.insert(cell);
    let Some(route) = plan_route(&world.spec, &obstacles) else {
        out_events.push(reject(PlacementError::PathBlocked));
        return;
    };

    let tower = world.towers.place(cell, &gem_type);
    world.route = Some(route);
    out_events.push(Event::GemPlaced { tower, gem, cell });
}

fn sell_tower(world: &mut World, tower: TowerId, out_events: &mut Vec<Event>) {
    if world.phase != GamePhase::Preparing {
        out_events.push(Event::SaleRejected {
            tower,
            reason: RemovalError::InvalidPhase,
        });
        return;
    }

    if world.towers.remove(tower).is_none() {
        out_events.push(Event::SaleRejected {
            tower,
            reason: RemovalError::MissingTower,
        });
        return;
    }

    world.route = plan_route(&world.spec, &world.towers.obstacle_cells());
    out_events.push(Event::TowerSold { tower });
}

fn begin_wave(
    world: &mut World,
    keep: Option<TowerId>,
    enemies: Vec<EnemySpawn>,
    out_events: &mut Vec<Event>,
) {
    if world.phase != GamePhase::Preparing {
        out_events.push(Event::WaveStartRejected {
            reason: WaveStartError::InvalidPhase,
        });
        return;
    }

    world.route = plan_route(&world.spec, &world.towers.obstacle_cells());
    if world.route.is_none() {
        out_events.push(Event::WaveStartRejected {
            reason: WaveStartError::PathBlocked,
        });
        return;
    }

    // At most one provisional tower survives confirmation with its stats;
    // the rest downgrade to the damage-less base gem.
    let base = world.catalog.base_gem().cloned();
    for tower in world.towers.iter_mut() {
        if !tower.provisional {
            continue;
        }
        tower.provisional = false;
        if Some(tower.id) == keep {
            continue;
        }
        match &base {
            Some(base_gem) => tower.socket(base_gem),
            None => tower.damage = 0.0,
        }
    }

    let count = enemies.len() as u32;
    for spawn in &enemies {
        let _ = world.enemies.insert(spawn.id, Enemy::from_spawn(spawn));
    }

    world.clear_delay = None;
    world.phase = GamePhase::Wave;
    out_events.push(Event::WaveStarted {
        wave: world.wave,
        enemies: count,
    });
    out_events.push(Event::PhaseChanged {
        phase: GamePhase::Wave,
    });
}

fn fire_projectile(world: &mut World, tower: TowerId, target: EnemyId, out_events: &mut Vec<Event>) {
    if world.phase != GamePhase::Wave {
        return;
    }

    // Stale firing commands race with deaths and sales; dropping them
    // silently mirrors how vanished projectile targets are handled.
    let Some(state) = world.towers.get(tower) else {
        return;
    };
    if state.damage <= 0.0 {
        return;
    }
    let interval = world
        .tuning
        .effective_fire_interval(state.fire_interval, state.effects.contains(EffectKind::Fast));
    if state.cooldown < interval {
        return;
    }
    let Some(enemy) = world.enemies.get(&target) else {
        return;
    };
    if enemy.path_index < 0.0 {
        return;
    }
    let Some(route) = world.route.as_ref() else {
        return;
    };

    let origin = world.spec.cell_center(state.cell);
    if origin.distance(route.sample(enemy.path_index)) > state.range {
        return;
    }

    let damage = state.damage;
    let effects = state.effects;
    let source = state.gem;
    let count = if effects.contains(EffectKind::Rapid) {
        world.tuning.rapid_count.max(1)
    } else {
        1
    };
    let arc = world.tuning.rapid_arc;

    for slot in 0..count {
        let spread = if count == 1 {
            0.0
        } else {
            arc * (slot as f32 / (count - 1) as f32 - 0.5)
        };
        let id = world.allocate_projectile_id();
        world.projectiles.push(Projectile {
            id,
            position: origin,
            target,
            damage,
            effects,
            source,
            spread,
        });
    }

    if let Some(state) = world.towers.get_mut(tower) {
        state.cooldown = Duration::ZERO;
    }
    out_events.push(Event::ProjectilesFired {
        tower,
        target,
        count,
    });
}

fn apply_fusion(world: &mut World, plan: FusionPlan, out_events: &mut Vec<Event>) {
    let reject = |reason| Event::FusionRejected {
        tower: plan.tower,
        reason,
    };

    if world.phase != GamePhase::Preparing {
        out_events.push(reject(FusionError::InvalidPhase));
        return;
    }
    if world.towers.get(plan.tower).is_none() {
        out_events.push(reject(FusionError::MissingTower));
        return;
    }
    let Some(result_gem) = world.catalog.get(plan.result).cloned() else {
        out_events.push(reject(FusionError::UnknownGem));
        return;
    };

    let base = world.catalog.base_gem().cloned();
    let mut downgraded = Vec::with_capacity(plan.downgrade.len());
    for donor in &plan.downgrade {
        if *donor == plan.tower {
            continue;
        }
        let Some(state) = world.towers.get_mut(*donor) else {
            continue;
        };
        match &base {
            Some(base_gem) => state.socket(base_gem),
            None => state.damage = 0.0,
        }
        downgraded.push(*donor);
    }

    if let Some(state) = world.towers.get_mut(plan.tower) {
        state.socket(&result_gem);
    }

    out_events.push(Event::FusionApplied {
        tower: plan.tower,
        result: plan.result,
        downgraded,
    });
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::HashSet;

    use gem_defence_core::{
        CombatTuning, EffectKind, EnemySnapshot, EnemyView, GamePhase, GemCatalog, GridCell,
        GridSpec, Path, ProjectileSnapshot, ProjectileView, StatusSnapshot, TowerId,
        TowerSnapshot, TowerView,
    };
    use glam::Vec2;

    use super::World;

    /// Lifecycle phase the world is currently in.
    #[must_use]
    pub fn phase(world: &World) -> GamePhase {
        world.phase
    }

    /// Lives the player has left.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// Score accumulated so far.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.score
    }

    /// One-based number of the current (or next) wave.
    #[must_use]
    pub fn wave(world: &World) -> u32 {
        world.wave
    }

    /// Provides read-only access to the board description.
    #[must_use]
    pub fn grid_spec(world: &World) -> &GridSpec {
        &world.spec
    }

    /// Provides read-only access to the content catalog the world holds.
    #[must_use]
    pub fn catalog(world: &World) -> &GemCatalog {
        &world.catalog
    }

    /// Provides read-only access to the combat tuning in force.
    #[must_use]
    pub fn tuning(world: &World) -> &CombatTuning {
        &world.tuning
    }

    /// Current spawn-to-goal route, if one exists.
    #[must_use]
    pub fn route(world: &World) -> Option<&Path> {
        world.route.as_ref()
    }

    /// Cells currently occupied by towers.
    #[must_use]
    pub fn obstacle_cells(world: &World) -> HashSet<GridCell> {
        world.towers.obstacle_cells()
    }

    /// Identifier of the tower occupying the provided cell, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: GridCell) -> Option<TowerId> {
        world.towers.occupant(cell)
    }

    /// Captures a read-only view of all live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots: Vec<EnemySnapshot> = world
            .enemies
            .values()
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                path_index: enemy.path_index,
                position: world
                    .route
                    .as_ref()
                    .map_or(Vec2::ZERO, |route| route.sample(enemy.path_index)),
                health: enemy.health,
                max_health: enemy.max_health,
                speed: enemy.speed,
                reward: enemy.reward,
                glyph: enemy.glyph,
                resistances: enemy.resistances,
                global_resistance: enemy.global_resistance,
                status: StatusSnapshot {
                    slow: enemy.status.slow,
                    poison: enemy.status.poison,
                    stun: enemy.status.stun,
                    burn: enemy.status.burn,
                    burn_dps: enemy.status.burn_dps,
                },
            })
            .collect();
        EnemyView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of all placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        let snapshots: Vec<TowerSnapshot> = world
            .towers
            .iter()
            .map(|state| {
                let interval = world.tuning.effective_fire_interval(
                    state.fire_interval,
                    state.effects.contains(EffectKind::Fast),
                );
                TowerSnapshot {
                    id: state.id,
                    cell: state.cell,
                    position: world.spec.cell_center(state.cell),
                    gem: state.gem,
                    damage: state.damage,
                    fire_interval: state.fire_interval,
                    range: state.range,
                    effects: state.effects,
                    provisional: state.provisional,
                    ready: state.damage > 0.0 && state.cooldown >= interval,
                }
            })
            .collect();
        TowerView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of all in-flight projectiles.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        let snapshots: Vec<ProjectileSnapshot> = world
            .projectiles
            .iter()
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                position: projectile.position,
                target: projectile.target,
                damage: projectile.damage,
                effects: projectile.effects,
                source: projectile.source,
                spread: projectile.spread,
            })
            .collect();
        ProjectileView::from_snapshots(snapshots)
    }
}
