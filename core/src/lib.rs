#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gem Defence simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! presentation adapters to react to deterministically. Systems consume
//! immutable snapshot views and respond exclusively with new command
//! batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod content;
mod grid;
mod tuning;
mod views;

pub use content::{
    builtin_recipes, EffectKind, EffectSet, FusionRecipe, GemCatalog, GemType, GemTypeId,
};
pub use grid::{GridCell, GridSpec, Path, ZoneRect, CHECKPOINT_COUNT};
pub use tuning::CombatTuning;
pub use views::{
    EnemySnapshot, EnemySpawn, EnemyView, FusionPlan, ProjectileSnapshot, ProjectileView,
    StatusSnapshot, TowerSnapshot, TowerTarget, TowerView,
};

/// Unique identifier assigned to a placed tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an enemy.
///
/// Identifiers come from a monotonically increasing counter owned by the
/// wave generator and are never reused, not even across games.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u64);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Unique identifier assigned to an in-flight projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u64);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Lifecycle phase the simulation is currently in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Between waves: towers may be placed, sold, and fused.
    Preparing,
    /// A wave is running: the tick pipeline advances the board.
    Wave,
    /// Lives ran out; the state is terminal.
    GameOver,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the board layout and resets all derived state.
    ConfigureGrid {
        /// Board description to install.
        spec: GridSpec,
    },
    /// Requests placement of a provisional tower holding the given gem.
    PlaceGem {
        /// Gem type to socket into the new tower.
        gem: GemTypeId,
        /// Cell the tower should occupy.
        cell: GridCell,
    },
    /// Requests removal of an existing tower.
    SellTower {
        /// Identifier of the tower targeted for removal.
        tower: TowerId,
    },
    /// Confirms placements and launches the next wave.
    BeginWave {
        /// Provisional tower the player chose to keep, if any.
        keep: Option<TowerId>,
        /// Enemies generated for the wave, ids pre-allocated.
        enemies: Vec<EnemySpawn>,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Simulated time elapsed since the previous tick, already scaled
        /// by the session's game-speed factor.
        dt: Duration,
    },
    /// Requests that a ready tower fire at the selected enemy.
    FireProjectile {
        /// Tower expected to fire.
        tower: TowerId,
        /// Enemy the shot is aimed at.
        target: EnemyId,
    },
    /// Executes a fusion decision produced by the fusion system.
    ApplyFusion {
        /// Upgrade-and-downgrade plan to apply atomically.
        plan: FusionPlan,
    },
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// Towers can only be placed during the preparation phase.
    InvalidPhase,
    /// The requested cell lies outside the grid bounds.
    OutOfBounds,
    /// The requested cell belongs to the spawn, goal, or a checkpoint zone.
    ReservedZone,
    /// Another tower already occupies the requested cell.
    Occupied,
    /// The gem type is not present in the content catalog.
    UnknownGem,
    /// The placement would leave enemies without any route to the goal.
    PathBlocked,
}

/// Reasons a tower sale request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// Towers can only be sold during the preparation phase.
    InvalidPhase,
    /// No tower with the provided identifier exists.
    MissingTower,
}

/// Reasons a wave start request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveStartError {
    /// Waves can only start from the preparation phase.
    InvalidPhase,
    /// No route from spawn to goal currently exists.
    PathBlocked,
}

/// Reasons a fusion request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FusionError {
    /// Fusions can only run during the preparation phase.
    InvalidPhase,
    /// The selected tower id is not present in the tower list.
    MissingTower,
    /// The recipe's result gem is missing from the content catalog.
    UnknownGem,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the simulation entered a new lifecycle phase.
    PhaseChanged {
        /// Phase that became active after processing commands.
        phase: GamePhase,
    },
    /// Confirms that a provisional tower was placed.
    GemPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Gem type socketed into the tower.
        gem: GemTypeId,
        /// Cell the tower occupies.
        cell: GridCell,
    },
    /// Reports that a tower placement request was rejected.
    PlacementRejected {
        /// Gem type requested for placement.
        gem: GemTypeId,
        /// Cell provided in the placement request.
        cell: GridCell,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower was removed from the board.
    TowerSold {
        /// Identifier of the tower that was removed.
        tower: TowerId,
    },
    /// Reports that a tower sale request was rejected.
    SaleRejected {
        /// Identifier of the tower targeted for removal.
        tower: TowerId,
        /// Specific reason the sale failed.
        reason: RemovalError,
    },
    /// Confirms that a wave was launched.
    WaveStarted {
        /// One-based number of the wave that started.
        wave: u32,
        /// Number of enemies installed for the wave.
        enemies: u32,
    },
    /// Reports that a wave start request was refused.
    WaveStartRejected {
        /// Specific reason the wave could not start.
        reason: WaveStartError,
    },
    /// Confirms that a tower fired at an enemy.
    ProjectilesFired {
        /// Tower that fired.
        tower: TowerId,
        /// Enemy the shot is aimed at.
        target: EnemyId,
        /// Number of projectiles spawned; more than one for rapid fans.
        count: u32,
    },
    /// Reports damage applied to an enemy during resolution.
    HitLanded {
        /// Enemy that absorbed the hit.
        enemy: EnemyId,
        /// Damage dealt after crit and resistance.
        damage: f32,
        /// Whether the hit's crit roll succeeded.
        crit: bool,
    },
    /// Confirms that an enemy's health reached zero.
    EnemyDied {
        /// Identifier of the killed enemy.
        enemy: EnemyId,
        /// Reward granted; the score increases by ten times this value.
        reward: u32,
    },
    /// Reports that an enemy walked off the end of the route.
    EnemyReachedGoal {
        /// Identifier of the escaping enemy.
        enemy: EnemyId,
        /// Lives remaining after the breach.
        lives_left: u32,
    },
    /// Announces that the last enemy of the running wave is gone.
    WaveCleared {
        /// One-based number of the wave that was cleared.
        wave: u32,
    },
    /// Confirms that a fusion plan was executed.
    FusionApplied {
        /// Tower whose gem was upgraded in place.
        tower: TowerId,
        /// Gem type the tower now holds.
        result: GemTypeId,
        /// Towers downgraded to the base gem as fusion fuel.
        downgraded: Vec<TowerId>,
    },
    /// Reports that a fusion request was refused without state changes.
    FusionRejected {
        /// Tower named in the rejected plan.
        tower: TowerId,
        /// Specific reason the fusion failed.
        reason: FusionError,
    },
    /// Announces that lives ran out and the state became terminal.
    GameOver {
        /// Final score at the moment the last life was lost.
        score: u32,
    },
}
