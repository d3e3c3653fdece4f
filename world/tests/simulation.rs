use std::collections::HashMap;
use std::time::Duration;

use gem_defence_core::{
    Command, CombatTuning, EnemyId, Event, GamePhase, GemCatalog, GemTypeId, GridCell, GridSpec,
};
use gem_defence_system_targeting::Targeting;
use gem_defence_system_wave_generation::WaveGeneration;
use gem_defence_world::{self as world, query, World};

const FRAME: Duration = Duration::from_millis(50);

fn place_near_route(world: &mut World, gem: GemTypeId, route_index: usize) -> gem_defence_core::TowerId {
    let route = query::route(world).expect("route").clone();
    let spec = query::grid_spec(world).clone();
    let anchor = route.cells()[route_index];
    let cell = (0..spec.columns())
        .flat_map(|x| (0..spec.rows()).map(move |y| GridCell::new(x, y)))
        .find(|cell| {
            cell.manhattan_distance(anchor) == 1
                && !spec.is_zone(*cell)
                && !route.cells().contains(cell)
                && query::tower_at(world, *cell).is_none()
        })
        .expect("free cell next to the route");

    let mut events = Vec::new();
    world::apply(world, Command::PlaceGem { gem, cell }, &mut events);
    match events.as_slice() {
        [Event::GemPlaced { tower, .. }] => *tower,
        other => panic!("expected GemPlaced, got {other:?}"),
    }
}

/// One frame of the orchestrated loop: tick, then let ready towers fire.
fn advance_frame(world: &mut World, targeting: &mut Targeting) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt: FRAME }, &mut events);

    let mut targets = Vec::new();
    targeting.handle(
        query::phase(world),
        &query::tower_view(world),
        &query::enemy_view(world),
        &mut targets,
    );
    for target in targets {
        world::apply(
            world,
            Command::FireProjectile {
                tower: target.tower,
                target: target.enemy,
            },
            &mut events,
        );
    }
    events
}

#[test]
fn towers_whittle_down_a_generated_wave() {
    let mut world = World::new(
        GridSpec::default(),
        GemCatalog::builtin(),
        CombatTuning::default(),
        7,
    );
    let mut generation = WaveGeneration::new(7);
    let mut targeting = Targeting::new();

    for index in [4, 8, 12, 16, 20, 24] {
        let _ = place_near_route(&mut world, GemTypeId::new(1), index);
    }

    let plan = generation.generate(1, query::catalog(&world), 0, 0.1);
    let keep = query::tower_view(&world).iter().next().map(|tower| tower.id);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::BeginWave {
            keep,
            enemies: plan.enemies,
        },
        &mut events,
    );
    assert_eq!(query::phase(&world), GamePhase::Wave);

    let mut health_log: HashMap<EnemyId, f32> = HashMap::new();
    let mut kills = 0;
    let mut damage_events = 0;

    for _ in 0..4_000 {
        let events = advance_frame(&mut world, &mut targeting);

        for event in &events {
            match event {
                Event::HitLanded { damage, .. } => {
                    assert!(*damage >= 0.0, "damage must never be negative");
                    damage_events += 1;
                }
                Event::EnemyDied { .. } => kills += 1,
                _ => {}
            }
        }

        // Health is monotonically non-increasing for every surviving enemy.
        for enemy in query::enemy_view(&world).iter() {
            if let Some(previous) = health_log.insert(enemy.id, enemy.health) {
                assert!(
                    enemy.health <= previous + 1e-3,
                    "enemy {:?} health rose from {previous} to {}",
                    enemy.id,
                    enemy.health
                );
            }
        }

        if query::phase(&world) != GamePhase::Wave {
            break;
        }
    }

    assert!(damage_events > 0, "towers never landed a hit");
    assert!(kills > 0, "towers never killed anything");
    // Kills award reward * 10 each; the generated wave-1 reward is 6.
    assert_eq!(query::score(&world), kills as u32 * 60);
}

#[test]
fn a_single_kept_tower_cannot_stop_wave_escapes() {
    let mut world = World::new(
        GridSpec::default(),
        GemCatalog::builtin(),
        CombatTuning::default(),
        3,
    );
    let mut generation = WaveGeneration::new(3);

    let plan = generation.generate(1, query::catalog(&world), 0, 0.1);
    let enemy_count = plan.enemies.len() as u32;
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::BeginWave {
            keep: None,
            enemies: plan.enemies,
        },
        &mut events,
    );

    let starting_lives = query::lives(&world);
    let mut breaches = 0;
    for _ in 0..20_000 {
        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick { dt: FRAME }, &mut events);
        breaches += events
            .iter()
            .filter(|event| matches!(event, Event::EnemyReachedGoal { .. }))
            .count() as u32;
        if query::phase(&world) != GamePhase::Wave {
            break;
        }
    }

    let lost = breaches.min(starting_lives);
    assert_eq!(query::lives(&world), starting_lives - lost);
    assert!(
        breaches == enemy_count || query::phase(&world) == GamePhase::GameOver,
        "every undamaged enemy must either escape or exhaust the lives"
    );
    assert_eq!(query::score(&world), 0);
}
