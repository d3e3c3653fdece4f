#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fusion rule evaluation and plan construction.
//!
//! The system answers two questions: is a given tower currently fusable,
//! and — if the player commits — which other towers get sacrificed. The
//! world executes the resulting [`FusionPlan`] atomically.

use gem_defence_core::{FusionPlan, FusionRecipe, TowerId, TowerView};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Number of other towers consumed as fusion fuel.
const DONOR_COUNT: usize = 2;

/// Recipe matched against the current board for a specific tower.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FusionMatch {
    recipe: FusionRecipe,
    eligible: Vec<TowerId>,
}

impl FusionMatch {
    /// Recipe that fired for the selected tower.
    #[must_use]
    pub fn recipe(&self) -> &FusionRecipe {
        &self.recipe
    }

    /// Other placed towers whose type participates in the recipe.
    #[must_use]
    pub fn eligible(&self) -> &[TowerId] {
        &self.eligible
    }
}

/// Finds the first recipe the provided tower can currently fuse with.
///
/// A recipe fires when the tower's own gem type appears in its required
/// list and the count of all placed towers with required types — the
/// selected tower included — reaches the recipe's minimum.
#[must_use]
pub fn check_fusion(
    tower: TowerId,
    recipes: &[FusionRecipe],
    towers: &TowerView,
) -> Option<FusionMatch> {
    let selected = towers.get(tower)?;

    for recipe in recipes {
        if !recipe.requires(selected.gem) {
            continue;
        }

        let mut matching = 0_u32;
        let mut eligible = Vec::new();
        for snapshot in towers.iter() {
            if !recipe.requires(snapshot.gem) {
                continue;
            }
            matching += 1;
            if snapshot.id != tower {
                eligible.push(snapshot.id);
            }
        }

        if matching >= recipe.min_count() {
            return Some(FusionMatch {
                recipe: recipe.clone(),
                eligible,
            });
        }
    }

    None
}

/// Fusion system owning the RNG used for donor selection.
#[derive(Debug)]
pub struct Fusion {
    rng: ChaCha8Rng,
}

impl Fusion {
    /// Creates a fusion system seeded for deterministic donor draws.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Builds an executable plan for the provided tower, if it is fusable.
    ///
    /// Two donors are drawn uniformly from the eligible set; when fewer
    /// than two other matching towers exist, only those available are
    /// sacrificed and the fusion still proceeds.
    pub fn plan(
        &mut self,
        tower: TowerId,
        recipes: &[FusionRecipe],
        towers: &TowerView,
    ) -> Option<FusionPlan> {
        let matched = check_fusion(tower, recipes, towers)?;

        let mut downgrade: Vec<TowerId> = matched
            .eligible()
            .choose_multiple(&mut self.rng, DONOR_COUNT)
            .copied()
            .collect();
        downgrade.sort_unstable();

        Some(FusionPlan {
            tower,
            result: matched.recipe().result(),
            downgrade,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gem_defence_core::{EffectSet, GemTypeId, GridCell, TowerSnapshot};
    use glam::Vec2;
    use std::time::Duration;

    fn tower(id: u32, gem: u32) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            cell: GridCell::new(id, 0),
            position: Vec2::ZERO,
            gem: GemTypeId::new(gem),
            damage: 10.0,
            fire_interval: Duration::from_millis(900),
            range: 100.0,
            effects: EffectSet::EMPTY,
            provisional: false,
            ready: false,
        }
    }

    fn recipe() -> FusionRecipe {
        FusionRecipe::new(vec![GemTypeId::new(1), GemTypeId::new(2)], 3, GemTypeId::new(10))
    }

    #[test]
    fn matches_when_enough_required_towers_are_placed() {
        let towers =
            TowerView::from_snapshots(vec![tower(1, 1), tower(2, 2), tower(3, 1), tower(4, 5)]);

        let matched =
            check_fusion(TowerId::new(1), &[recipe()], &towers).expect("fusion must match");

        assert_eq!(matched.recipe().result(), GemTypeId::new(10));
        assert_eq!(matched.eligible(), &[TowerId::new(2), TowerId::new(3)]);
    }

    #[test]
    fn rejects_towers_whose_type_is_not_required() {
        let towers = TowerView::from_snapshots(vec![tower(1, 5), tower(2, 1), tower(3, 2)]);
        assert!(check_fusion(TowerId::new(1), &[recipe()], &towers).is_none());
    }

    #[test]
    fn rejects_when_the_board_is_below_the_minimum() {
        let towers = TowerView::from_snapshots(vec![tower(1, 1), tower(2, 2)]);
        assert!(check_fusion(TowerId::new(1), &[recipe()], &towers).is_none());
    }

    #[test]
    fn rejects_unknown_tower_ids() {
        let towers = TowerView::from_snapshots(vec![tower(1, 1), tower(2, 2), tower(3, 1)]);
        assert!(check_fusion(TowerId::new(99), &[recipe()], &towers).is_none());
    }

    #[test]
    fn plan_preserves_the_selected_tower_and_caps_donors() {
        let towers = TowerView::from_snapshots(vec![
            tower(1, 1),
            tower(2, 2),
            tower(3, 1),
            tower(4, 2),
            tower(5, 1),
        ]);

        let plan = Fusion::new(7)
            .plan(TowerId::new(3), &[recipe()], &towers)
            .expect("plan must exist");

        assert_eq!(plan.tower, TowerId::new(3));
        assert_eq!(plan.result, GemTypeId::new(10));
        assert_eq!(plan.downgrade.len(), 2);
        assert!(!plan.downgrade.contains(&TowerId::new(3)));
        for donor in &plan.downgrade {
            assert!(
                [1, 2, 4, 5].contains(&donor.get()),
                "donor {donor:?} not drawn from the eligible set"
            );
        }
    }

    #[test]
    fn plan_accepts_a_single_available_donor() {
        let towers = TowerView::from_snapshots(vec![tower(1, 1), tower(2, 2), tower(3, 5)]);
        let recipe = FusionRecipe::new(
            vec![GemTypeId::new(1), GemTypeId::new(2)],
            2,
            GemTypeId::new(10),
        );

        let plan = Fusion::new(3)
            .plan(TowerId::new(1), &[recipe], &towers)
            .expect("plan must exist");

        assert_eq!(plan.downgrade, vec![TowerId::new(2)]);
    }

    #[test]
    fn donor_draws_replay_for_the_same_seed() {
        let towers = TowerView::from_snapshots(vec![
            tower(1, 1),
            tower(2, 2),
            tower(3, 1),
            tower(4, 2),
            tower(5, 1),
        ]);

        let plan_a = Fusion::new(11).plan(TowerId::new(1), &[recipe()], &towers);
        let plan_b = Fusion::new(11).plan(TowerId::new(1), &[recipe()], &towers);
        assert_eq!(plan_a, plan_b);
    }

    #[test]
    fn empty_recipe_list_never_matches() {
        let towers = TowerView::from_snapshots(vec![tower(1, 1)]);
        assert!(check_fusion(TowerId::new(1), &[], &towers).is_none());
        assert!(Fusion::new(1).plan(TowerId::new(1), &[], &towers).is_none());
    }
}
