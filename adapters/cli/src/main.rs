#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for the Gem Defence simulation.
//!
//! Boots a session from a JSON content catalog (falling back to the
//! built-in one), rebuilds a shared gem layout one placement per wave —
//! matching the in-game rule that only a single new gem survives each
//! wave start — and prints per-wave summaries while the simulation runs
//! at an accelerated game speed.

mod catalog;
mod layout_transfer;

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use gem_defence_core::{
    builtin_recipes, Event, FusionRecipe, GamePhase, GemCatalog, GemTypeId, GridCell, TowerId,
};
use gem_defence_session::{Session, SessionConfig};
use layout_transfer::{GemLayoutSnapshot, GemPlacement};

/// Wall-clock frame delta fed into the session each iteration.
const FRAME: Duration = Duration::from_millis(50);
/// Upper bound on frames per wave, guarding against a stalled simulation.
const MAX_FRAMES_PER_WAVE: u32 = 100_000;

#[derive(Debug, Parser)]
#[command(name = "gem-defence", about = "Headless Gem Defence simulation runner")]
struct Args {
    /// Number of waves to simulate before stopping.
    #[arg(long, default_value_t = 5)]
    waves: u32,
    /// Seed for wave generation, crit rolls, and fusion donor draws.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Game-speed scalar applied to every frame delta.
    #[arg(long, default_value_t = 4.0)]
    speed: f32,
    /// JSON content catalog; the built-in catalog is used when absent or
    /// unreadable.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Gem layout share string to rebuild, as printed by --print-layout.
    #[arg(long)]
    layout: Option<String>,
    /// Print the final board as a shareable layout string.
    #[arg(long)]
    print_layout: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (catalog, recipes) = load_content(args.catalog.as_deref());
    let droppable: Vec<GemTypeId> = catalog
        .iter()
        .filter(|gem| gem.droppable())
        .map(|gem| gem.id())
        .collect();

    let mut session = Session::new(SessionConfig {
        catalog,
        recipes,
        seed: args.seed,
        ..SessionConfig::default()
    });
    session.set_game_speed(args.speed);

    let mut placements = match &args.layout {
        Some(encoded) => {
            let snapshot =
                GemLayoutSnapshot::decode(encoded).context("invalid --layout string")?;
            let spec = session.grid_spec();
            anyhow::ensure!(
                snapshot.columns == spec.columns() && snapshot.rows == spec.rows(),
                "layout was built for a {}x{} board, this one is {}x{}",
                snapshot.columns,
                snapshot.rows,
                spec.columns(),
                spec.rows(),
            );
            VecDeque::from(snapshot.gems)
        }
        None => default_placements(&session, &droppable, args.waves),
    };

    for _ in 0..args.waves {
        if session.phase() == GamePhase::GameOver {
            break;
        }

        let keep = place_next(&mut session, &mut placements);
        let wave = session.wave();
        let events = session.start_wave(keep);
        let enemy_count = events
            .iter()
            .find_map(|event| match event {
                Event::WaveStarted { enemies, .. } => Some(*enemies),
                _ => None,
            })
            .with_context(|| format!("wave {wave} refused to start: {events:?}"))?;

        let summary = run_wave(&mut session)?;
        println!(
            "wave {wave:>2}: {enemy_count:>2} enemies, {:>2} kills, {:>2} leaks, score {:>6}, lives {:>2}",
            summary.kills,
            summary.leaks,
            session.score(),
            session.lives(),
        );
    }

    match session.phase() {
        GamePhase::GameOver => println!("game over with final score {}", session.score()),
        _ => println!(
            "survived to wave {} with score {} and {} lives",
            session.wave(),
            session.score(),
            session.lives()
        ),
    }

    if args.print_layout {
        println!("layout {}", export_layout(&session).encode());
    }

    Ok(())
}

fn load_content(path: Option<&Path>) -> (GemCatalog, Vec<FusionRecipe>) {
    let Some(path) = path else {
        return (GemCatalog::builtin(), builtin_recipes());
    };

    match catalog::load(path) {
        Ok(content) => content,
        Err(error) => {
            eprintln!("warning: {error}; falling back to the built-in catalog");
            (GemCatalog::builtin(), builtin_recipes())
        }
    }
}

/// Plans one placement per wave, hugging the route at spread-out anchors.
fn default_placements(
    session: &Session,
    droppable: &[GemTypeId],
    waves: u32,
) -> VecDeque<GemPlacement> {
    let mut placements = VecDeque::new();
    if droppable.is_empty() {
        return placements;
    }

    let Some(route) = session.route() else {
        return placements;
    };
    let spec = session.grid_spec().clone();
    let cells = route.cells().to_vec();
    let mut claimed: HashSet<GridCell> = HashSet::new();

    for slot in 0..waves {
        let anchor = cells[(4 + 6 * slot as usize) % cells.len()];
        let candidate = (0..spec.columns())
            .flat_map(|x| (0..spec.rows()).map(move |y| GridCell::new(x, y)))
            .find(|cell| {
                cell.manhattan_distance(anchor) == 1
                    && !spec.is_zone(*cell)
                    && !cells.contains(cell)
                    && !claimed.contains(cell)
            });

        if let Some(cell) = candidate {
            let _ = claimed.insert(cell);
            placements.push_back(GemPlacement {
                gem: droppable[slot as usize % droppable.len()],
                cell,
            });
        }
    }

    placements
}

/// Places the next queued gem, reporting the tower to keep at wave start.
fn place_next(session: &mut Session, queue: &mut VecDeque<GemPlacement>) -> Option<TowerId> {
    let placement = queue.pop_front()?;
    let events = session.place_gem(placement.gem, placement.cell);
    for event in &events {
        match event {
            Event::GemPlaced { tower, .. } => return Some(*tower),
            Event::PlacementRejected { reason, .. } => {
                eprintln!(
                    "warning: placement of gem {} at ({}, {}) rejected: {reason:?}",
                    placement.gem.get(),
                    placement.cell.x(),
                    placement.cell.y()
                );
            }
            _ => {}
        }
    }
    None
}

struct WaveSummary {
    kills: u32,
    leaks: u32,
}

fn run_wave(session: &mut Session) -> anyhow::Result<WaveSummary> {
    let mut summary = WaveSummary { kills: 0, leaks: 0 };
    let mut frames = 0;

    while session.phase() == GamePhase::Wave {
        let report = session.advance(FRAME);
        for event in &report.events {
            match event {
                Event::EnemyDied { .. } => summary.kills += 1,
                Event::EnemyReachedGoal { .. } => summary.leaks += 1,
                _ => {}
            }
        }

        frames += 1;
        anyhow::ensure!(
            frames < MAX_FRAMES_PER_WAVE,
            "wave stalled after {frames} frames"
        );
    }

    Ok(summary)
}

fn export_layout(session: &Session) -> GemLayoutSnapshot {
    let spec = session.grid_spec();
    GemLayoutSnapshot {
        columns: spec.columns(),
        rows: spec.rows(),
        gems: session
            .towers()
            .iter()
            .map(|tower| GemPlacement {
                gem: tower.gem,
                cell: tower.cell,
            })
            .collect(),
    }
}
