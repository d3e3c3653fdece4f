//! Content-store records: gem types, fusion recipes, and effect tags.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Unique identifier assigned to a gem type by the content store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GemTypeId(u32);

impl GemTypeId {
    /// Creates a new gem type identifier with the provided numeric value.
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

/// Capability carried by a gem or an individual hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Halves the target's movement speed for a fixed duration.
    Slow,
    /// Applies damage over time at a fixed rate.
    Poison,
    /// Freezes the target in place for a fixed duration.
    Stun,
    /// Applies damage over time derived from the triggering hit.
    Burn,
    /// Shortens the firing interval of the carrying tower.
    Fast,
    /// Penetrates part of the target's elemental resistance.
    Magic,
    /// Splashes reduced damage onto nearby enemies.
    Aoe,
    /// Fires a fan of projectiles instead of a single one.
    Rapid,
    /// Grants a chance to multiply the hit's damage.
    Crit,
    /// Arcs to further enemies with decaying damage.
    Chain,
}

impl EffectKind {
    /// Every effect kind in declaration order.
    pub const ALL: [EffectKind; 10] = [
        Self::Slow,
        Self::Poison,
        Self::Stun,
        Self::Burn,
        Self::Fast,
        Self::Magic,
        Self::Aoe,
        Self::Rapid,
        Self::Crit,
        Self::Chain,
    ];

    /// Content-store tag spelling for the effect.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Poison => "poison",
            Self::Stun => "stun",
            Self::Burn => "burn",
            Self::Fast => "fast",
            Self::Magic => "magic",
            Self::Aoe => "aoe",
            Self::Rapid => "rapid",
            Self::Crit => "crit",
            Self::Chain => "chain",
        }
    }

    /// Parses a single content-store tag, if recognized.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag.trim())
    }

    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// Finite set of [`EffectKind`] values stored as a bitmask.
///
/// The content store ships effect tags as comma-joined strings; they are
/// parsed into this set once and queried with constant-time membership
/// checks afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectSet(u16);

impl EffectSet {
    /// Set containing no effects.
    pub const EMPTY: EffectSet = EffectSet(0);

    /// Returns a copy of the set with the provided effect included.
    #[must_use]
    pub const fn with(self, kind: EffectKind) -> Self {
        Self(self.0 | kind.bit())
    }

    /// Returns a copy of the set with the provided effect removed.
    #[must_use]
    pub const fn without(self, kind: EffectKind) -> Self {
        Self(self.0 & !kind.bit())
    }

    /// Reports whether the set carries the provided effect.
    #[must_use]
    pub const fn contains(self, kind: EffectKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Reports whether the set carries no effects at all.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Parses a comma-joined tag string such as `"slow,crit"`.
    ///
    /// Unrecognized tags are skipped so stale content records degrade to
    /// fewer capabilities instead of failing to load.
    #[must_use]
    pub fn parse(tags: &str) -> Self {
        let mut set = Self::EMPTY;
        for tag in tags.split(',') {
            if let Some(kind) = EffectKind::from_tag(tag) {
                set = set.with(kind);
            }
        }
        set
    }

    /// Iterates over the effects contained in the set, in declaration order.
    pub fn iter(self) -> impl Iterator<Item = EffectKind> {
        EffectKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }

    /// Renders the set back into the content store's comma-joined spelling.
    #[must_use]
    pub fn to_tags(self) -> String {
        let tags: Vec<&str> = self.iter().map(EffectKind::tag).collect();
        tags.join(",")
    }
}

/// Static gem-type record owned by the content store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GemType {
    id: GemTypeId,
    name: String,
    damage: f32,
    fire_interval: Duration,
    range: f32,
    effects: EffectSet,
    droppable: bool,
    base: bool,
}

impl GemType {
    /// Creates a gem-type record with explicit field values.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: GemTypeId,
        name: impl Into<String>,
        damage: f32,
        fire_interval: Duration,
        range: f32,
        effects: EffectSet,
        droppable: bool,
        base: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            damage,
            fire_interval,
            range,
            effects,
            droppable,
            base,
        }
    }

    /// Identifier assigned by the content store.
    #[must_use]
    pub const fn id(&self) -> GemTypeId {
        self.id
    }

    /// Display name of the gem.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Damage dealt per projectile.
    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.damage
    }

    /// Interval between consecutive shots.
    #[must_use]
    pub const fn fire_interval(&self) -> Duration {
        self.fire_interval
    }

    /// Targeting range in world units.
    #[must_use]
    pub const fn range(&self) -> f32 {
        self.range
    }

    /// Capabilities carried by the gem's hits.
    #[must_use]
    pub const fn effects(&self) -> EffectSet {
        self.effects
    }

    /// Reports whether the gem can appear as a random drop.
    #[must_use]
    pub const fn droppable(&self) -> bool {
        self.droppable
    }

    /// Reports whether this is the damage-less base gem.
    #[must_use]
    pub const fn is_base(&self) -> bool {
        self.base
    }
}

/// Read-only gem-type catalog keyed by identifier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GemCatalog {
    entries: BTreeMap<GemTypeId, GemType>,
}

impl GemCatalog {
    /// Builds a catalog from the provided gem-type records.
    ///
    /// Later records silently replace earlier ones with the same id, which
    /// mirrors how the content store overwrites rows on re-upload.
    #[must_use]
    pub fn from_types(types: Vec<GemType>) -> Self {
        let mut entries = BTreeMap::new();
        for gem in types {
            let _ = entries.insert(gem.id(), gem);
        }
        Self { entries }
    }

    /// Looks up a gem type by identifier.
    #[must_use]
    pub fn get(&self, id: GemTypeId) -> Option<&GemType> {
        self.entries.get(&id)
    }

    /// First gem flagged as the base type, if the catalog carries one.
    #[must_use]
    pub fn base_gem(&self) -> Option<&GemType> {
        self.entries.values().find(|gem| gem.is_base())
    }

    /// Identifiers of every non-base gem, in ascending id order.
    ///
    /// Wave generation draws elemental resistance tags from this list.
    #[must_use]
    pub fn elemental_ids(&self) -> Vec<GemTypeId> {
        self.entries
            .values()
            .filter(|gem| !gem.is_base())
            .map(GemType::id)
            .collect()
    }

    /// Iterates over the catalog entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &GemType> {
        self.entries.values()
    }

    /// Number of gem types stored in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the catalog holds no gem types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Catalog used when no content store is reachable.
    #[must_use]
    pub fn builtin() -> Self {
        let ms = Duration::from_millis;
        Self::from_types(vec![
            GemType::new(
                GemTypeId::new(0),
                "Rough Stone",
                0.0,
                ms(1_000),
                0.0,
                EffectSet::EMPTY,
                false,
                true,
            ),
            GemType::new(
                GemTypeId::new(1),
                "Ruby",
                25.0,
                ms(900),
                120.0,
                EffectSet::EMPTY.with(EffectKind::Crit),
                true,
                false,
            ),
            GemType::new(
                GemTypeId::new(2),
                "Sapphire",
                15.0,
                ms(800),
                110.0,
                EffectSet::EMPTY.with(EffectKind::Slow),
                true,
                false,
            ),
            GemType::new(
                GemTypeId::new(3),
                "Emerald",
                12.0,
                ms(850),
                110.0,
                EffectSet::EMPTY.with(EffectKind::Poison),
                true,
                false,
            ),
            GemType::new(
                GemTypeId::new(4),
                "Topaz",
                18.0,
                ms(1_100),
                100.0,
                EffectSet::EMPTY.with(EffectKind::Stun),
                true,
                false,
            ),
            GemType::new(
                GemTypeId::new(5),
                "Amethyst",
                20.0,
                ms(950),
                130.0,
                EffectSet::EMPTY.with(EffectKind::Magic),
                true,
                false,
            ),
            GemType::new(
                GemTypeId::new(6),
                "Opal",
                22.0,
                ms(1_200),
                100.0,
                EffectSet::EMPTY.with(EffectKind::Aoe),
                true,
                false,
            ),
            GemType::new(
                GemTypeId::new(7),
                "Diamond",
                10.0,
                ms(700),
                140.0,
                EffectSet::EMPTY.with(EffectKind::Rapid).with(EffectKind::Fast),
                true,
                false,
            ),
            GemType::new(
                GemTypeId::new(8),
                "Obsidian",
                24.0,
                ms(1_000),
                125.0,
                EffectSet::EMPTY.with(EffectKind::Chain),
                true,
                false,
            ),
            GemType::new(
                GemTypeId::new(9),
                "Amber",
                16.0,
                ms(900),
                115.0,
                EffectSet::EMPTY.with(EffectKind::Burn),
                true,
                false,
            ),
            GemType::new(
                GemTypeId::new(10),
                "Storm Prism",
                40.0,
                ms(1_100),
                135.0,
                EffectSet::EMPTY.with(EffectKind::Aoe).with(EffectKind::Chain),
                false,
                false,
            ),
            GemType::new(
                GemTypeId::new(11),
                "Inferno Heart",
                45.0,
                ms(950),
                125.0,
                EffectSet::EMPTY.with(EffectKind::Crit).with(EffectKind::Burn),
                false,
                false,
            ),
            GemType::new(
                GemTypeId::new(12),
                "Glacial Venom",
                30.0,
                ms(850),
                120.0,
                EffectSet::EMPTY
                    .with(EffectKind::Slow)
                    .with(EffectKind::Poison),
                false,
                false,
            ),
        ])
    }
}

/// Rule describing how placed gems merge into an upgraded gem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionRecipe {
    required: Vec<GemTypeId>,
    min_count: u32,
    result: GemTypeId,
}

impl FusionRecipe {
    /// Creates a fusion rule from its required types, threshold, and result.
    #[must_use]
    pub const fn new(required: Vec<GemTypeId>, min_count: u32, result: GemTypeId) -> Self {
        Self {
            required,
            min_count,
            result,
        }
    }

    /// Gem types that participate in the fusion.
    #[must_use]
    pub fn required(&self) -> &[GemTypeId] {
        &self.required
    }

    /// Minimum number of placed matching towers needed to fuse.
    #[must_use]
    pub const fn min_count(&self) -> u32 {
        self.min_count
    }

    /// Gem type produced by the fusion.
    #[must_use]
    pub const fn result(&self) -> GemTypeId {
        self.result
    }

    /// Reports whether the provided gem type participates in the recipe.
    #[must_use]
    pub fn requires(&self, gem: GemTypeId) -> bool {
        self.required.contains(&gem)
    }
}

/// Fusion rules used when no content store is reachable.
#[must_use]
pub fn builtin_recipes() -> Vec<FusionRecipe> {
    vec![
        FusionRecipe::new(vec![GemTypeId::new(6), GemTypeId::new(8)], 3, GemTypeId::new(10)),
        FusionRecipe::new(vec![GemTypeId::new(1), GemTypeId::new(9)], 3, GemTypeId::new(11)),
        FusionRecipe::new(vec![GemTypeId::new(2), GemTypeId::new(3)], 3, GemTypeId::new(12)),
    ]
}
