#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Effect resolver: the damage pipeline and hit expansion.
//!
//! Collisions queue [`PendingHit`] values during projectile advancement and
//! the world resolves them in one batch per tick. Expansion (splash and
//! chain arcs) runs against a frozen snapshot of enemy positions taken at
//! the start of the batch, so every secondary hit sees the same board state
//! regardless of resolution order.

use gem_defence_core::{CombatTuning, EffectKind, EffectSet, EnemyId, GemTypeId};
use glam::Vec2;
use rand::Rng;

/// Damage event queued by a projectile collision, not yet applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingHit {
    /// Enemy the hit is aimed at.
    pub target: EnemyId,
    /// Damage before crit and resistance.
    pub damage: f32,
    /// Capabilities carried by the hit.
    pub effects: EffectSet,
    /// Gem type of the firing tower, used for resistance lookups.
    pub source: GemTypeId,
}

/// Frozen per-enemy state the resolver reads during a batch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetProfile {
    /// Enemy the profile describes.
    pub id: EnemyId,
    /// Interpolated world position at the start of the batch.
    pub position: Vec2,
    /// Gem types the enemy resists.
    pub resistances: [GemTypeId; 2],
    /// Flat resistance applied against every hit.
    pub global_resistance: f32,
}

/// Status effects a resolved hit wants applied to its target.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StatusApplication {
    /// Refresh the slow timer.
    pub slow: bool,
    /// Refresh the poison timer.
    pub poison: bool,
    /// Refresh the stun timer.
    pub stun: bool,
    /// Refresh the burn timer and replace its cached damage per second.
    pub burn_dps: Option<f32>,
}

/// Final damage and side effects of a single resolved hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitOutcome {
    /// Damage to subtract from the target's health. Never negative.
    pub damage: f32,
    /// Whether the crit roll succeeded.
    pub crit: bool,
    /// Status refreshes to apply regardless of lethality.
    pub statuses: StatusApplication,
}

/// Resolves one landed hit against a target profile.
///
/// The order is fixed: the crit roll scales the damage first, then the
/// combined resistance mitigates it. Status timers refresh rather than
/// stack, and burn recomputes its cached damage per second from the
/// post-crit damage on every application.
pub fn resolve_hit<R: Rng>(
    hit: &PendingHit,
    target: &TargetProfile,
    tuning: &CombatTuning,
    rng: &mut R,
) -> HitOutcome {
    let mut damage = hit.damage;
    let mut crit = false;

    if hit.effects.contains(EffectKind::Crit) && rng.gen::<f32>() < tuning.crit_chance {
        damage *= tuning.crit_multiplier;
        crit = true;
    }

    let resistance = total_resistance(hit.effects, hit.source, target, tuning);
    let mitigated = (damage * (1.0 - resistance)).max(0.0);

    let statuses = StatusApplication {
        slow: hit.effects.contains(EffectKind::Slow),
        poison: hit.effects.contains(EffectKind::Poison),
        stun: hit.effects.contains(EffectKind::Stun),
        burn_dps: hit
            .effects
            .contains(EffectKind::Burn)
            .then(|| damage * tuning.burn_fraction),
    };

    HitOutcome {
        damage: mitigated,
        crit,
        statuses,
    }
}

/// Combined resistance fraction for a hit against a target, in `[0, 1]`.
///
/// Magic penetration reduces only the elemental component; the global
/// resistance is untouched.
#[must_use]
pub fn total_resistance(
    effects: EffectSet,
    source: GemTypeId,
    target: &TargetProfile,
    tuning: &CombatTuning,
) -> f32 {
    let mut elemental = if target.resistances.contains(&source) {
        tuning.elemental_resistance
    } else {
        0.0
    };

    if elemental > 0.0 && effects.contains(EffectKind::Magic) {
        elemental *= 1.0 - tuning.magic_penetration;
    }

    (target.global_resistance + elemental).clamp(0.0, 1.0)
}

/// Expands primary hits into splash and chain secondaries.
///
/// Scratch buffers persist across ticks to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct HitExpansion {
    chained: Vec<EnemyId>,
}

impl HitExpansion {
    /// Creates a new expansion helper with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expands each primary hit in order, appending to `out`.
    ///
    /// For every primary: the primary itself, splash hits on every other
    /// profiled enemy within the splash radius, then chain bounces walking
    /// to the nearest not-yet-hit enemy. Secondaries keep the damage-
    /// relevant tags but drop aoe/chain/rapid so they never expand again.
    pub fn expand(
        &mut self,
        primaries: &[PendingHit],
        field: &[TargetProfile],
        tuning: &CombatTuning,
        cell_length: f32,
        out: &mut Vec<PendingHit>,
    ) {
        out.clear();
        out.reserve(primaries.len());

        let aoe_radius_sq = {
            let radius = tuning.aoe_radius_cells * cell_length;
            radius * radius
        };
        let chain_range_sq = {
            let range = tuning.chain_range_cells * cell_length;
            range * range
        };

        for primary in primaries {
            out.push(*primary);

            let Some(origin) = profile_for(field, primary.target) else {
                continue;
            };
            let secondary_effects = primary
                .effects
                .without(EffectKind::Aoe)
                .without(EffectKind::Chain)
                .without(EffectKind::Rapid);

            if primary.effects.contains(EffectKind::Aoe) {
                for profile in field {
                    if profile.id == primary.target {
                        continue;
                    }
                    if origin.position.distance_squared(profile.position) > aoe_radius_sq {
                        continue;
                    }
                    out.push(PendingHit {
                        target: profile.id,
                        damage: primary.damage * tuning.aoe_damage_multiplier,
                        effects: secondary_effects,
                        source: primary.source,
                    });
                }
            }

            if primary.effects.contains(EffectKind::Chain) {
                self.chain_from(
                    origin,
                    primary,
                    secondary_effects,
                    field,
                    tuning,
                    chain_range_sq,
                    out,
                );
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn chain_from(
        &mut self,
        origin: &TargetProfile,
        primary: &PendingHit,
        effects: EffectSet,
        field: &[TargetProfile],
        tuning: &CombatTuning,
        chain_range_sq: f32,
        out: &mut Vec<PendingHit>,
    ) {
        self.chained.clear();
        self.chained.push(primary.target);

        let mut position = origin.position;
        let mut damage = primary.damage;

        for _ in 0..tuning.chain_max_bounces {
            damage *= 1.0 - tuning.chain_falloff;

            let mut next: Option<(&TargetProfile, f32)> = None;
            for profile in field {
                if self.chained.contains(&profile.id) {
                    continue;
                }
                let distance_sq = position.distance_squared(profile.position);
                if distance_sq > chain_range_sq {
                    continue;
                }
                let closer = match next {
                    Some((held, best)) => {
                        distance_sq < best || (distance_sq == best && profile.id < held.id)
                    }
                    None => true,
                };
                if closer {
                    next = Some((profile, distance_sq));
                }
            }

            let Some((bounce, _)) = next else {
                break;
            };

            out.push(PendingHit {
                target: bounce.id,
                damage,
                effects,
                source: primary.source,
            });
            self.chained.push(bounce.id);
            position = bounce.position;
        }
    }
}

fn profile_for(field: &[TargetProfile], id: EnemyId) -> Option<&TargetProfile> {
    field.iter().find(|profile| profile.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const RED: GemTypeId = GemTypeId::new(1);
    const BLUE: GemTypeId = GemTypeId::new(2);
    const GREEN: GemTypeId = GemTypeId::new(3);

    fn profile(id: u64, position: Vec2) -> TargetProfile {
        TargetProfile {
            id: EnemyId::new(id),
            position,
            resistances: [RED, BLUE],
            global_resistance: 0.1,
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(1)
    }

    #[test]
    fn elemental_resistance_stacks_on_global() {
        let hit = PendingHit {
            target: EnemyId::new(1),
            damage: 100.0,
            effects: EffectSet::EMPTY,
            source: RED,
        };
        let target = profile(1, Vec2::ZERO);
        let outcome = resolve_hit(&hit, &target, &CombatTuning::default(), &mut rng());

        assert!(!outcome.crit);
        assert!((outcome.damage - 70.0).abs() < 1e-4);
    }

    #[test]
    fn magic_penetration_halves_only_the_elemental_component() {
        let hit = PendingHit {
            target: EnemyId::new(1),
            damage: 100.0,
            effects: EffectSet::EMPTY.with(EffectKind::Magic),
            source: RED,
        };
        let target = profile(1, Vec2::ZERO);
        let outcome = resolve_hit(&hit, &target, &CombatTuning::default(), &mut rng());

        assert!((outcome.damage - 80.0).abs() < 1e-4);
    }

    #[test]
    fn magic_against_unresisted_source_changes_nothing() {
        let hit = PendingHit {
            target: EnemyId::new(1),
            damage: 100.0,
            effects: EffectSet::EMPTY.with(EffectKind::Magic),
            source: GREEN,
        };
        let target = profile(1, Vec2::ZERO);
        let outcome = resolve_hit(&hit, &target, &CombatTuning::default(), &mut rng());

        assert!((outcome.damage - 90.0).abs() < 1e-4);
    }

    #[test]
    fn crit_multiplies_before_resistance() {
        let mut tuning = CombatTuning::default();
        tuning.crit_chance = 1.0;
        let hit = PendingHit {
            target: EnemyId::new(1),
            damage: 100.0,
            effects: EffectSet::EMPTY.with(EffectKind::Crit),
            source: RED,
        };
        let target = profile(1, Vec2::ZERO);
        let outcome = resolve_hit(&hit, &target, &tuning, &mut rng());

        assert!(outcome.crit);
        assert!((outcome.damage - 140.0).abs() < 1e-4);
    }

    #[test]
    fn crit_never_fires_at_zero_chance() {
        let mut tuning = CombatTuning::default();
        tuning.crit_chance = 0.0;
        let hit = PendingHit {
            target: EnemyId::new(1),
            damage: 100.0,
            effects: EffectSet::EMPTY.with(EffectKind::Crit),
            source: GREEN,
        };
        let target = profile(1, Vec2::ZERO);
        let outcome = resolve_hit(&hit, &target, &tuning, &mut rng());

        assert!(!outcome.crit);
        assert!((outcome.damage - 90.0).abs() < 1e-4);
    }

    #[test]
    fn resistance_is_clamped_to_the_unit_interval() {
        let hit = PendingHit {
            target: EnemyId::new(1),
            damage: 100.0,
            effects: EffectSet::EMPTY,
            source: RED,
        };
        let mut target = profile(1, Vec2::ZERO);
        target.global_resistance = 5.0;

        let tuning = CombatTuning::default();
        let resistance = total_resistance(hit.effects, hit.source, &target, &tuning);
        assert!((0.0..=1.0).contains(&resistance));

        let outcome = resolve_hit(&hit, &target, &tuning, &mut rng());
        assert!(outcome.damage >= 0.0);
        assert_eq!(outcome.damage, 0.0);
    }

    #[test]
    fn burn_caches_post_crit_damage_per_second() {
        let mut tuning = CombatTuning::default();
        tuning.crit_chance = 1.0;
        let hit = PendingHit {
            target: EnemyId::new(1),
            damage: 100.0,
            effects: EffectSet::EMPTY.with(EffectKind::Burn).with(EffectKind::Crit),
            source: GREEN,
        };
        let target = profile(1, Vec2::ZERO);
        let outcome = resolve_hit(&hit, &target, &tuning, &mut rng());

        assert_eq!(outcome.statuses.burn_dps, Some(50.0));
        assert!(outcome.statuses.burn_dps.is_some());
        assert!(!outcome.statuses.slow);
    }

    #[test]
    fn status_flags_follow_the_effect_set() {
        let hit = PendingHit {
            target: EnemyId::new(1),
            damage: 10.0,
            effects: EffectSet::parse("slow,poison,stun"),
            source: GREEN,
        };
        let target = profile(1, Vec2::ZERO);
        let outcome = resolve_hit(&hit, &target, &CombatTuning::default(), &mut rng());

        assert!(outcome.statuses.slow);
        assert!(outcome.statuses.poison);
        assert!(outcome.statuses.stun);
        assert_eq!(outcome.statuses.burn_dps, None);
    }

    #[test]
    fn splash_hits_neighbors_at_reduced_damage() {
        let tuning = CombatTuning::default();
        let field = [
            profile(1, Vec2::new(0.0, 0.0)),
            profile(2, Vec2::new(32.0, 0.0)),
            profile(3, Vec2::new(500.0, 0.0)),
        ];
        let primary = PendingHit {
            target: EnemyId::new(1),
            damage: 40.0,
            effects: EffectSet::EMPTY.with(EffectKind::Aoe),
            source: GREEN,
        };

        let mut expansion = HitExpansion::new();
        let mut out = Vec::new();
        expansion.expand(&[primary], &field, &tuning, 32.0, &mut out);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0], primary);
        assert_eq!(out[1].target, EnemyId::new(2));
        assert!((out[1].damage - 20.0).abs() < 1e-4);
        assert!(!out[1].effects.contains(EffectKind::Aoe));
    }

    #[test]
    fn chain_bounces_to_nearest_unvisited_enemies_with_falloff() {
        let tuning = CombatTuning::default();
        let field = [
            profile(1, Vec2::new(0.0, 0.0)),
            profile(2, Vec2::new(64.0, 0.0)),
            profile(3, Vec2::new(128.0, 0.0)),
            profile(4, Vec2::new(192.0, 0.0)),
            profile(5, Vec2::new(256.0, 0.0)),
        ];
        let primary = PendingHit {
            target: EnemyId::new(1),
            damage: 100.0,
            effects: EffectSet::EMPTY.with(EffectKind::Chain),
            source: GREEN,
        };

        let mut expansion = HitExpansion::new();
        let mut out = Vec::new();
        expansion.expand(&[primary], &field, &tuning, 32.0, &mut out);

        // Primary plus three bounces; the falloff compounds per bounce.
        assert_eq!(out.len(), 4);
        let targets: Vec<u64> = out.iter().map(|hit| hit.target.get()).collect();
        assert_eq!(targets, vec![1, 2, 3, 4]);
        assert!((out[1].damage - 70.0).abs() < 1e-4);
        assert!((out[2].damage - 49.0).abs() < 1e-4);
        assert!((out[3].damage - 34.3).abs() < 1e-3);
        assert!(out.iter().all(|hit| !hit.effects.contains(EffectKind::Chain)));
    }

    #[test]
    fn chain_stops_when_no_enemy_is_in_arc_range() {
        let tuning = CombatTuning::default();
        let field = [
            profile(1, Vec2::new(0.0, 0.0)),
            profile(2, Vec2::new(2_000.0, 0.0)),
        ];
        let primary = PendingHit {
            target: EnemyId::new(1),
            damage: 100.0,
            effects: EffectSet::EMPTY.with(EffectKind::Chain),
            source: GREEN,
        };

        let mut expansion = HitExpansion::new();
        let mut out = Vec::new();
        expansion.expand(&[primary], &field, &tuning, 32.0, &mut out);

        assert_eq!(out.len(), 1);
    }

    #[test]
    fn vanished_primary_target_skips_expansion() {
        let tuning = CombatTuning::default();
        let field = [profile(2, Vec2::new(10.0, 0.0))];
        let primary = PendingHit {
            target: EnemyId::new(1),
            damage: 100.0,
            effects: EffectSet::EMPTY.with(EffectKind::Aoe).with(EffectKind::Chain),
            source: GREEN,
        };

        let mut expansion = HitExpansion::new();
        let mut out = Vec::new();
        expansion.expand(&[primary], &field, &tuning, 32.0, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0], primary);
    }
}
