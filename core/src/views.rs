//! Immutable snapshot and view types systems consume instead of world state.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{EffectSet, EnemyId, GemTypeId, GridCell, ProjectileId, TowerId};

/// Remaining status-effect timers captured for a single enemy.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StatusSnapshot {
    /// Time left on the slow effect.
    pub slow: Duration,
    /// Time left on the poison effect.
    pub poison: Duration,
    /// Time left on the stun effect.
    pub stun: Duration,
    /// Time left on the burn effect.
    pub burn: Duration,
    /// Damage per second the burn effect is currently dealing.
    pub burn_dps: f32,
}

impl StatusSnapshot {
    /// Reports whether the enemy is currently slowed.
    #[must_use]
    pub fn slowed(&self) -> bool {
        !self.slow.is_zero()
    }

    /// Reports whether the enemy is currently stunned.
    #[must_use]
    pub fn stunned(&self) -> bool {
        !self.stun.is_zero()
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Fractional route index; negative while still queued off-board.
    pub path_index: f32,
    /// Interpolated world position along the route.
    pub position: Vec2,
    /// Remaining health. Fractional values arise from damage over time.
    pub health: f32,
    /// Health the enemy spawned with.
    pub max_health: f32,
    /// Movement speed in cells per second, before status modifiers.
    pub speed: f32,
    /// Score currency granted when the enemy dies.
    pub reward: u32,
    /// Display glyph shared by the enemy's wave.
    pub glyph: char,
    /// Gem types the enemy resists.
    pub resistances: [GemTypeId; 2],
    /// Flat resistance applied against every hit.
    pub global_resistance: f32,
    /// Remaining status-effect timers.
    pub status: StatusSnapshot,
}

impl EnemySnapshot {
    /// Reports whether the enemy has entered the board and can be targeted.
    #[must_use]
    pub fn on_path(&self) -> bool {
        self.path_index >= 0.0
    }
}

/// Read-only snapshot describing all live enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic id order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a snapshot by enemy identifier.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Grid cell the tower occupies.
    pub cell: GridCell,
    /// World-space center of the tower's cell.
    pub position: Vec2,
    /// Gem type currently socketed in the tower.
    pub gem: GemTypeId,
    /// Damage dealt per projectile.
    pub damage: f32,
    /// Base interval between consecutive shots.
    pub fire_interval: Duration,
    /// Targeting range in world units.
    pub range: f32,
    /// Capabilities carried by the tower's hits.
    pub effects: EffectSet,
    /// Whether the tower is still awaiting wave-start confirmation.
    pub provisional: bool,
    /// Whether the tower's cooldown has elapsed and it may fire.
    pub ready: bool,
}

/// Read-only snapshot describing all placed towers.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic id order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a snapshot by tower identifier.
    #[must_use]
    pub fn get(&self, id: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of an in-flight projectile.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile by the world.
    pub id: ProjectileId,
    /// Current world position.
    pub position: Vec2,
    /// Enemy the projectile is homing toward.
    pub target: EnemyId,
    /// Damage carried by the projectile.
    pub damage: f32,
    /// Capabilities applied when the projectile lands.
    pub effects: EffectSet,
    /// Gem type of the firing tower, used for resistance lookups.
    pub source: GemTypeId,
    /// Remaining fan-out deflection for rapid shots, in radians.
    pub spread: f32,
}

/// Read-only snapshot describing all in-flight projectiles.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic id order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ProjectileSnapshot> {
        self.snapshots
    }
}

/// Firing assignment produced by the targeting system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerTarget {
    /// Tower ready to fire.
    pub tower: TowerId,
    /// Enemy selected for the shot.
    pub enemy: EnemyId,
}

/// Seed describing one enemy of a generated wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    /// Identifier pre-allocated by the wave generator.
    pub id: EnemyId,
    /// Display glyph shared by the wave.
    pub glyph: char,
    /// Movement speed in cells per second.
    pub speed: f32,
    /// Health the enemy enters the board with.
    pub max_health: f32,
    /// Score currency granted on death.
    pub reward: u32,
    /// Gem types the enemy resists.
    pub resistances: [GemTypeId; 2],
    /// Flat resistance applied against every hit.
    pub global_resistance: f32,
    /// Starting route index; negative values stagger the entrance.
    pub path_index: f32,
}

/// Executable fusion decision produced by the fusion system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionPlan {
    /// Tower whose gem is upgraded in place.
    pub tower: TowerId,
    /// Gem type the tower ends up with.
    pub result: GemTypeId,
    /// Towers sacrificed into the damage-less base gem; at most two.
    pub downgrade: Vec<TowerId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enemy(id: u64, path_index: f32) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            path_index,
            position: Vec2::ZERO,
            health: 10.0,
            max_health: 10.0,
            speed: 1.0,
            reward: 5,
            glyph: '\u{1F47E}',
            resistances: [GemTypeId::new(1), GemTypeId::new(2)],
            global_resistance: 0.1,
            status: StatusSnapshot::default(),
        }
    }

    #[test]
    fn enemy_view_sorts_and_finds_by_id() {
        let view = EnemyView::from_snapshots(vec![enemy(7, 0.0), enemy(2, 0.0), enemy(5, 0.0)]);
        let ids: Vec<u64> = view.iter().map(|snapshot| snapshot.id.get()).collect();
        assert_eq!(ids, vec![2, 5, 7]);
        assert!(view.get(EnemyId::new(5)).is_some());
        assert!(view.get(EnemyId::new(4)).is_none());
    }

    #[test]
    fn queued_enemies_are_not_on_path() {
        assert!(!enemy(1, -2.5).on_path());
        assert!(enemy(1, 0.0).on_path());
    }
}
