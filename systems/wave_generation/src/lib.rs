#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic procedural wave generation.
//!
//! Every wave draws its parameters from a `ChaCha8Rng` seeded through a
//! SHA-256 derivation of the global seed and the wave number, so a given
//! seed always produces the same campaign regardless of how many games were
//! played in between. Enemy identifiers come from a counter owned by the
//! generator and are never reused, not even across games.

use gem_defence_core::{EnemyId, EnemySpawn, GemCatalog, GemTypeId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Spacing between staggered enemies, in route cells.
const SPAWN_STAGGER: f32 = 2.5;

/// Display glyphs a wave's archetype is drawn from.
const WAVE_GLYPHS: [char; 8] = [
    '\u{1F47E}', // alien monster
    '\u{1FAB2}', // beetle
    '\u{1F41B}', // bug
    '\u{1F982}', // scorpion
    '\u{1F577}', // spider
    '\u{1F41C}', // ant
    '\u{1F997}', // cricket
    '\u{1F987}', // bat
];

/// Fully parameterized wave ready to hand to the world.
#[derive(Clone, Debug, PartialEq)]
pub struct WavePlan {
    /// One-based wave number the plan was generated for.
    pub wave: u32,
    /// Enemies composing the wave, entrance-staggered and id-stamped.
    pub enemies: Vec<EnemySpawn>,
    /// Per-enemy health chosen for the wave; feed back into the next call
    /// as `previous_health` to keep difficulty monotonic.
    pub health: u32,
}

/// Wave generator owning the global seed and the enemy id counter.
#[derive(Debug)]
pub struct WaveGeneration {
    global_seed: u64,
    next_enemy_id: u64,
}

impl WaveGeneration {
    /// Creates a generator for the provided global seed.
    #[must_use]
    pub fn new(global_seed: u64) -> Self {
        Self {
            global_seed,
            next_enemy_id: 0,
        }
    }

    /// Generates the enemies for a wave.
    ///
    /// Total for any wave number and catalog: a degenerate catalog merely
    /// yields enemies whose resistance tags match nothing. `previous_health`
    /// is the health returned by the previous call (zero for the first
    /// wave); the result never regresses below it.
    pub fn generate(
        &mut self,
        wave: u32,
        catalog: &GemCatalog,
        previous_health: u32,
        global_resistance: f32,
    ) -> WavePlan {
        let mut rng = ChaCha8Rng::seed_from_u64(derive_wave_seed(self.global_seed, wave));
        let latents = sample_latents(&mut rng, catalog);
        self.compose(wave, &latents, previous_health, global_resistance)
    }

    fn compose(
        &mut self,
        wave: u32,
        latents: &WaveLatents,
        previous_health: u32,
        global_resistance: f32,
    ) -> WavePlan {
        let speed = wave_speed(wave, latents.speed_multiplier);
        let health = wave_health(wave, latents.speed_multiplier, previous_health);
        let reward = 5 + wave;

        let mut enemies = Vec::with_capacity(latents.count as usize);
        for slot in 0..latents.count {
            enemies.push(EnemySpawn {
                id: self.allocate_id(),
                glyph: latents.glyph,
                speed,
                max_health: health as f32,
                reward,
                resistances: latents.resistances,
                global_resistance,
                path_index: -(slot as f32) * SPAWN_STAGGER,
            });
        }

        WavePlan {
            wave,
            enemies,
            health,
        }
    }

    fn allocate_id(&mut self) -> EnemyId {
        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id += 1;
        id
    }
}

#[derive(Clone, Copy, Debug)]
struct WaveLatents {
    count: u32,
    glyph: char,
    resistances: [GemTypeId; 2],
    speed_multiplier: f64,
}

fn sample_latents(rng: &mut ChaCha8Rng, catalog: &GemCatalog) -> WaveLatents {
    let count = rng.gen_range(10..=20);
    let glyph = WAVE_GLYPHS[rng.gen_range(0..WAVE_GLYPHS.len())];
    let resistances = sample_resistances(rng, catalog);
    let speed_multiplier = rng.gen_range(0.75..=2.0);

    WaveLatents {
        count,
        glyph,
        resistances,
        speed_multiplier,
    }
}

/// Draws two distinct elemental tags from the catalog's non-base gems.
///
/// Catalogs with fewer than two elemental gems degrade gracefully: a single
/// candidate is doubled up, and an empty candidate list falls back to the
/// zero id, which no elemental lookup ever matches against a base gem hit.
fn sample_resistances(rng: &mut ChaCha8Rng, catalog: &GemCatalog) -> [GemTypeId; 2] {
    let candidates = catalog.elemental_ids();
    match candidates.len() {
        0 => [GemTypeId::new(0); 2],
        1 => [candidates[0]; 2],
        len => {
            let first = rng.gen_range(0..len);
            let mut second = rng.gen_range(0..len - 1);
            if second >= first {
                second += 1;
            }
            [candidates[first], candidates[second]]
        }
    }
}

fn wave_speed(wave: u32, multiplier: f64) -> f32 {
    ((0.4 + f64::from(wave) * 0.06) * multiplier) as f32
}

/// Per-enemy health for the wave, with the monotonic difficulty guard.
///
/// Fast waves are deliberately squishier: the base health scales with
/// `2.5 - multiplier`, so the speed draw trades durability for pace.
fn wave_health(wave: u32, multiplier: f64, previous_health: u32) -> u32 {
    let base = (60.0 + f64::from(wave) * 30.0) * (2.5 - multiplier);
    let health = base.floor().max(0.0) as u32;
    if health <= previous_health {
        previous_health
            .saturating_add(20)
            .saturating_add(wave.saturating_mul(8))
    } else {
        health
    }
}

fn derive_wave_seed(global_seed: u64, wave: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(wave.to_le_bytes());
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}
