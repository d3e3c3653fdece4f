//! Per-tick simulation pipeline executed by `Command::Tick`.
//!
//! The four steps run in a fixed order inside one tick: enemy advancement,
//! projectile advancement (which only queues hits), batch damage
//! resolution, and cooldown accrual. Nothing outside this module mutates
//! enemies or projectiles while a tick is in flight, so every step sees a
//! consistent board.

use std::time::Duration;

use gem_defence_core::{CombatTuning, EffectKind, EnemyId, Event, GamePhase};
use gem_defence_system_combat::{resolve_hit, PendingHit, StatusApplication, TargetProfile};
use glam::Vec2;

use crate::{StatusState, World};

/// Per-second decay rate of a rapid projectile's fan-out deflection.
const SPREAD_DECAY_RATE: f32 = 4.0;

pub(crate) fn run(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    if world.phase != GamePhase::Wave {
        return;
    }

    out_events.push(Event::TimeAdvanced { dt });

    advance_enemies(world, dt, out_events);
    if world.lives == 0 {
        world.phase = GamePhase::GameOver;
        world.projectiles.clear();
        world.pending_hits.clear();
        out_events.push(Event::GameOver { score: world.score });
        out_events.push(Event::PhaseChanged {
            phase: GamePhase::GameOver,
        });
        return;
    }

    advance_projectiles(world, dt);
    resolve_damage(world, out_events);
    accrue_cooldowns(world, dt);
    finish_wave_when_clear(world, dt, out_events);
}

/// Step 1: status timers, movement, damage over time, and removals.
fn advance_enemies(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    let Some(route) = world.route.as_ref() else {
        return;
    };
    let route_len = route.len() as f32;
    let dt_secs = dt.as_secs_f32();

    let mut killed: Vec<(EnemyId, u32)> = Vec::new();
    let mut escaped: Vec<EnemyId> = Vec::new();

    for enemy in world.enemies.values_mut() {
        let status = &mut enemy.status;
        status.slow = status.slow.saturating_sub(dt);
        status.poison = status.poison.saturating_sub(dt);
        status.stun = status.stun.saturating_sub(dt);
        status.burn = status.burn.saturating_sub(dt);

        if status.stun.is_zero() {
            let factor = if status.slow.is_zero() {
                1.0
            } else {
                world.tuning.slow_factor
            };
            enemy.path_index += enemy.speed * factor * dt_secs;
        }

        if !status.poison.is_zero() {
            enemy.health -= world.tuning.poison_dps * dt_secs;
        }
        if !status.burn.is_zero() {
            enemy.health -= status.burn_dps * dt_secs;
        }

        if enemy.health <= 0.0 {
            killed.push((enemy.id, enemy.reward));
        } else if enemy.path_index >= route_len {
            escaped.push(enemy.id);
        }
    }

    for (id, reward) in killed {
        let _ = world.enemies.remove(&id);
        world.score = world.score.saturating_add(reward.saturating_mul(10));
        out_events.push(Event::EnemyDied { enemy: id, reward });
    }

    for id in escaped {
        let _ = world.enemies.remove(&id);
        world.lives = world.lives.saturating_sub(1);
        out_events.push(Event::EnemyReachedGoal {
            enemy: id,
            lives_left: world.lives,
        });
    }
}

/// Step 2: homing movement and collision queueing.
///
/// Collisions never apply damage directly; they queue pending hits so the
/// whole tick resolves against one snapshot in step 3. Projectiles whose
/// target vanished are discarded silently.
fn advance_projectiles(world: &mut World, dt: Duration) {
    let Some(route) = world.route.as_ref() else {
        world.projectiles.clear();
        return;
    };

    let dt_secs = dt.as_secs_f32();
    let speed = world.spec.cells_to_world(world.tuning.projectile_speed_cells);
    let hit_radius = world
        .spec
        .cells_to_world(world.tuning.projectile_hit_radius_cells);
    let spread_decay = (1.0 - SPREAD_DECAY_RATE * dt_secs).clamp(0.0, 1.0);

    let mut projectiles = std::mem::take(&mut world.projectiles);
    projectiles.retain_mut(|projectile| {
        let Some(enemy) = world.enemies.get(&projectile.target) else {
            return false;
        };

        let target = route.sample(enemy.path_index);
        let to_target = target - projectile.position;
        let distance = to_target.length();
        let step = speed * dt_secs;

        if distance <= hit_radius || step >= distance {
            world.pending_hits.push(PendingHit {
                target: projectile.target,
                damage: projectile.damage,
                effects: projectile.effects,
                source: projectile.source,
            });
            return false;
        }

        let direction = Vec2::from_angle(projectile.spread).rotate(to_target / distance);
        projectile.position += direction * step;
        projectile.spread *= spread_decay;
        true
    });
    world.projectiles = projectiles;
}

/// Step 3: batch expansion and application of all queued hits.
fn resolve_damage(world: &mut World, out_events: &mut Vec<Event>) {
    if world.pending_hits.is_empty() {
        return;
    }
    let Some(route) = world.route.as_ref() else {
        world.pending_hits.clear();
        return;
    };

    let field: Vec<TargetProfile> = world
        .enemies
        .values()
        .map(|enemy| TargetProfile {
            id: enemy.id,
            position: route.sample(enemy.path_index),
            resistances: enemy.resistances,
            global_resistance: enemy.global_resistance,
        })
        .collect();

    let primaries = std::mem::take(&mut world.pending_hits);
    let mut expanded = std::mem::take(&mut world.expanded_hits);
    world.expansion.expand(
        &primaries,
        &field,
        &world.tuning,
        world.spec.cell_length(),
        &mut expanded,
    );

    let mut killed: Vec<EnemyId> = Vec::new();
    for hit in &expanded {
        let Some(enemy) = world.enemies.get_mut(&hit.target) else {
            continue;
        };
        // A kill suppresses every later hit against the same id this batch.
        if enemy.health <= 0.0 {
            continue;
        }

        let profile = TargetProfile {
            id: enemy.id,
            position: route.sample(enemy.path_index),
            resistances: enemy.resistances,
            global_resistance: enemy.global_resistance,
        };
        let outcome = resolve_hit(hit, &profile, &world.tuning, &mut world.rng);

        enemy.health -= outcome.damage;
        apply_statuses(&mut enemy.status, outcome.statuses, &world.tuning);
        out_events.push(Event::HitLanded {
            enemy: enemy.id,
            damage: outcome.damage,
            crit: outcome.crit,
        });

        if enemy.health <= 0.0 {
            killed.push(enemy.id);
        }
    }

    for id in killed {
        if let Some(enemy) = world.enemies.remove(&id) {
            world.score = world
                .score
                .saturating_add(enemy.reward.saturating_mul(10));
            out_events.push(Event::EnemyDied {
                enemy: id,
                reward: enemy.reward,
            });
        }
    }

    let mut primaries = primaries;
    primaries.clear();
    world.pending_hits = primaries;
    world.expanded_hits = expanded;
}

fn apply_statuses(status: &mut StatusState, applied: StatusApplication, tuning: &CombatTuning) {
    if applied.slow {
        status.slow = tuning.slow_duration;
    }
    if applied.poison {
        status.poison = tuning.poison_duration;
    }
    if applied.stun {
        status.stun = tuning.stun_duration;
    }
    if let Some(dps) = applied.burn_dps {
        status.burn = tuning.burn_duration;
        status.burn_dps = dps;
    }
}

/// Step 4: firing-cadence accumulators for every armed tower.
fn accrue_cooldowns(world: &mut World, dt: Duration) {
    let tuning = &world.tuning;
    for tower in world.towers.iter_mut() {
        if tower.damage <= 0.0 {
            continue;
        }
        let interval =
            tuning.effective_fire_interval(tower.fire_interval, tower.effects.contains(EffectKind::Fast));
        tower.cooldown = (tower.cooldown.saturating_add(dt)).min(interval);
    }
}

/// Step 5: clear-delay countdown back to the preparation phase.
fn finish_wave_when_clear(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    if !world.enemies.is_empty() {
        world.clear_delay = None;
        return;
    }

    let remaining = world
        .clear_delay
        .unwrap_or(world.tuning.wave_clear_delay)
        .saturating_sub(dt);

    if remaining.is_zero() {
        world.clear_delay = None;
        world.projectiles.clear();
        world.pending_hits.clear();
        out_events.push(Event::WaveCleared { wave: world.wave });
        world.wave = world.wave.saturating_add(1);
        world.phase = GamePhase::Preparing;
        out_events.push(Event::PhaseChanged {
            phase: GamePhase::Preparing,
        });
    } else {
        world.clear_delay = Some(remaining);
    }
}
