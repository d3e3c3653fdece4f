//! Authoritative tower state management utilities.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use gem_defence_core::{EffectSet, GemType, GemTypeId, GridCell, TowerId};

/// Mutable state of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Cell the tower occupies.
    pub(crate) cell: GridCell,
    /// Gem type currently socketed in the tower.
    pub(crate) gem: GemTypeId,
    /// Damage dealt per projectile.
    pub(crate) damage: f32,
    /// Base interval between consecutive shots.
    pub(crate) fire_interval: Duration,
    /// Targeting range in world units.
    pub(crate) range: f32,
    /// Capabilities carried by the tower's hits.
    pub(crate) effects: EffectSet,
    /// Whether the tower still awaits wave-start confirmation.
    pub(crate) provisional: bool,
    /// Time accumulated toward the next shot.
    pub(crate) cooldown: Duration,
}

impl TowerState {
    /// Overwrites the gameplay fields with another gem type's stats.
    ///
    /// Identity and position are preserved; the cooldown restarts so a
    /// freshly rewritten tower does not fire out of cadence.
    pub(crate) fn socket(&mut self, gem: &GemType) {
        self.gem = gem.id();
        self.damage = gem.damage();
        self.fire_interval = gem.fire_interval();
        self.range = gem.range();
        self.effects = gem.effects();
        self.cooldown = Duration::ZERO;
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: u32,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: 0,
        }
    }

    /// Places a provisional tower holding the provided gem type.
    pub(crate) fn place(&mut self, cell: GridCell, gem: &GemType) -> TowerId {
        let id = TowerId::new(self.next_tower_id);
        self.next_tower_id += 1;

        let mut state = TowerState {
            id,
            cell,
            gem: gem.id(),
            damage: 0.0,
            fire_interval: Duration::ZERO,
            range: 0.0,
            effects: EffectSet::EMPTY,
            provisional: true,
            cooldown: Duration::ZERO,
        };
        state.socket(gem);

        let _ = self.entries.insert(id, state);
        id
    }

    /// Removes a tower, returning its final state if it existed.
    pub(crate) fn remove(&mut self, id: TowerId) -> Option<TowerState> {
        self.entries.remove(&id)
    }

    /// Looks up a tower by identifier.
    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    /// Looks up a tower mutably by identifier.
    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    /// Identifier of the tower occupying the provided cell, if any.
    pub(crate) fn occupant(&self, cell: GridCell) -> Option<TowerId> {
        self.entries
            .values()
            .find(|state| state.cell == cell)
            .map(|state| state.id)
    }

    /// Iterates over the towers in ascending id order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    /// Iterates mutably over the towers in ascending id order.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }

    /// Cells currently occupied by towers, used as pathfinding obstacles.
    pub(crate) fn obstacle_cells(&self) -> HashSet<GridCell> {
        self.entries.values().map(|state| state.cell).collect()
    }

    /// Removes every tower while keeping the identifier counter running.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gem_defence_core::GemCatalog;

    #[test]
    fn placed_towers_copy_the_gem_stats() {
        let catalog = GemCatalog::builtin();
        let ruby = catalog.get(GemTypeId::new(1)).expect("builtin ruby");
        let mut registry = TowerRegistry::new();

        let id = registry.place(GridCell::new(3, 4), ruby);
        let state = registry.get(id).expect("tower exists");

        assert_eq!(state.gem, ruby.id());
        assert_eq!(state.damage, ruby.damage());
        assert_eq!(state.fire_interval, ruby.fire_interval());
        assert!(state.provisional);
        assert_eq!(state.cooldown, Duration::ZERO);
    }

    #[test]
    fn identifiers_keep_counting_after_removal() {
        let catalog = GemCatalog::builtin();
        let ruby = catalog.get(GemTypeId::new(1)).expect("builtin ruby");
        let mut registry = TowerRegistry::new();

        let first = registry.place(GridCell::new(1, 1), ruby);
        assert!(registry.remove(first).is_some());
        let second = registry.place(GridCell::new(1, 1), ruby);

        assert_ne!(first, second);
        assert!(second > first);
    }

    #[test]
    fn occupant_reports_the_owning_tower() {
        let catalog = GemCatalog::builtin();
        let ruby = catalog.get(GemTypeId::new(1)).expect("builtin ruby");
        let mut registry = TowerRegistry::new();

        let id = registry.place(GridCell::new(5, 6), ruby);

        assert_eq!(registry.occupant(GridCell::new(5, 6)), Some(id));
        assert_eq!(registry.occupant(GridCell::new(6, 5)), None);
    }

    #[test]
    fn socket_rewrites_stats_but_not_identity() {
        let catalog = GemCatalog::builtin();
        let ruby = catalog.get(GemTypeId::new(1)).expect("builtin ruby");
        let prism = catalog.get(GemTypeId::new(10)).expect("builtin prism");
        let mut registry = TowerRegistry::new();

        let id = registry.place(GridCell::new(2, 2), ruby);
        let state = registry.get_mut(id).expect("tower exists");
        state.cooldown = Duration::from_millis(400);
        state.socket(prism);

        assert_eq!(state.id, id);
        assert_eq!(state.cell, GridCell::new(2, 2));
        assert_eq!(state.gem, prism.id());
        assert_eq!(state.damage, prism.damage());
        assert_eq!(state.cooldown, Duration::ZERO);
    }
}
