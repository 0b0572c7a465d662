//! Procedural item generation.
//!
//! A generator turns a category into an [`ItemDraft`]: name, description
//! and flags. It knows nothing about the weight ledger. The caller decides
//! whether generation is allowed (it is not while the zone is sinking),
//! converts the draft into an [`Item`] and issues the `create` event.
//!
//! # Rolls
//!
//! - Artwork rolls `0..=20`: 19 and 20 are cursed, 10 and below are
//!   masterpieces, everything else is ordinary.
//! - Ice cream has a 40% chance of a second flavor, candy 30%.
//! - The itemator rolls `0..=7`: talisman (0-2), artwork (3), book (4),
//!   poem (5) or garment (6-7).

use ballast_types::{Item, ItemCategory, ItemFlags, ItemId, WeightClass};
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use crate::words;

/// Percent chance an ice cream gets a second flavor.
pub const ICE_CREAM_SWIRL_PERCENT: u32 = 40;

/// Percent chance a candy gets a second flavor.
pub const CANDY_SWIRL_PERCENT: u32 = 30;

/// Generated item text and flags, not yet tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    /// Short display name.
    pub name: String,
    /// Inspection text.
    pub description: String,
    /// Item category.
    pub category: ItemCategory,
    /// Initial flags.
    pub flags: ItemFlags,
    /// Crafting provenance, if any.
    pub provenance: Option<String>,
}

impl ItemDraft {
    /// Turn the draft into a full-weight item with a fresh identity.
    pub fn into_item(self) -> Item {
        Item {
            id: ItemId::new(),
            name: self.name,
            description: self.description,
            category: self.category,
            weight_class: WeightClass::Regular,
            flags: self.flags,
            material: None,
            provenance: self.provenance,
        }
    }
}

/// Outcome of the artwork tier roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtTier {
    /// A masterful piece. Weighs half and is announced to the zone.
    Masterpiece,
    /// An ordinary piece.
    Normal,
    /// An unspeakable anathema.
    Cursed,
}

impl ArtTier {
    /// Map a roll in `0..=20` to a tier.
    pub const fn from_roll(roll: u32) -> Self {
        if roll >= 19 {
            Self::Cursed
        } else if roll <= 10 {
            Self::Masterpiece
        } else {
            Self::Normal
        }
    }
}

/// Roll an artwork tier.
pub fn roll_art_tier(rng: &mut dyn RngCore) -> ArtTier {
    ArtTier::from_roll(rng.random_range(0..=20))
}

/// Map an itemator roll in `0..=7` to a category.
pub const fn itemator_category(roll: u32) -> ItemCategory {
    match roll {
        0..=2 => ItemCategory::Talisman,
        3 => ItemCategory::Artwork,
        4 => ItemCategory::Book,
        5 => ItemCategory::Poem,
        _ => ItemCategory::Garment,
    }
}

/// Roll the category an itemator produces.
pub fn roll_itemator_category(rng: &mut dyn RngCore) -> ItemCategory {
    itemator_category(rng.random_range(0..=7))
}

/// Source of item text.
///
/// Implementations must be deterministic for a given RNG state so tests
/// can seed them.
pub trait ItemGenerator: Send + Sync {
    /// Generate an item of the given category.
    fn generate(&self, category: ItemCategory, rng: &mut dyn RngCore) -> ItemDraft;

    /// Generate an artwork of a fixed tier.
    fn artwork(&self, tier: ArtTier, rng: &mut dyn RngCore) -> ItemDraft;
}

/// The default generator, backed by small embedded word lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogGenerator;

impl CatalogGenerator {
    /// Create the generator.
    pub const fn new() -> Self {
        Self
    }
}

impl ItemGenerator for CatalogGenerator {
    fn generate(&self, category: ItemCategory, rng: &mut dyn RngCore) -> ItemDraft {
        match category {
            ItemCategory::Artwork => {
                let tier = roll_art_tier(rng);
                self.artwork(tier, rng)
            }
            ItemCategory::Garment => garment(rng),
            ItemCategory::Book => book(rng),
            ItemCategory::Poem => poem(rng),
            ItemCategory::Cheese => cheese(rng),
            ItemCategory::IceCream => ice_cream(rng),
            ItemCategory::Candy => candy(rng),
            ItemCategory::Talisman => talisman(rng, ItemCategory::Talisman),
            ItemCategory::Material | ItemCategory::Misc => talisman(rng, ItemCategory::Misc),
        }
    }

    fn artwork(&self, tier: ArtTier, rng: &mut dyn RngCore) -> ItemDraft {
        let color = pick(rng, words::COLORS);
        let substance = pick(rng, words::SUBSTANCES);
        let adjective = pick(rng, words::ADJECTIVES);
        let artwork = pick(rng, words::ARTWORKS);
        let title = format!(
            "{} {}",
            title_case(pick(rng, words::ART_TITLES)),
            title_case(pick(rng, words::ART_TITLES_TWO))
        );
        let skill = pick(rng, words::SKILLS);
        let verb = pick(rng, words::ART_VERBS);
        let theme = pick(rng, words::THEMES);

        let mut flags = ItemFlags::default();
        let description = match tier {
            ArtTier::Cursed => {
                flags.cursed = true;
                format!(
                    "'{title}': An unspeakable anathema {artwork} forged in {color} {substance}. \
                     It embodies profane {skill} as it {verb} {theme}."
                )
            }
            ArtTier::Masterpiece => {
                flags.masterpiece = true;
                format!(
                    "'{title}': {} piece of {artwork} created from {color} {substance}. \
                     It's a masterful work of {skill} as it {verb} {theme}.",
                    with_article(adjective)
                )
            }
            ArtTier::Normal => format!(
                "'{title}': {} example of {artwork} rendered in {color} {substance}. \
                 {title} displays considerable {skill} as it {verb} {theme}.",
                with_article(adjective)
            ),
        };

        ItemDraft {
            name: title,
            description,
            category: ItemCategory::Artwork,
            flags,
            provenance: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Category templates
// ---------------------------------------------------------------------------

fn talisman(rng: &mut dyn RngCore, category: ItemCategory) -> ItemDraft {
    let color = pick(rng, words::COLORS);
    let substance = pick(rng, words::SUBSTANCES);
    let adjective = pick(rng, words::ADJECTIVES);
    let name = pick(rng, words::TALISMANS);
    ItemDraft {
        name: String::from(name),
        description: format!("{} {name} made of {color} {substance}.", with_article(adjective)),
        category,
        flags: ItemFlags::default(),
        provenance: None,
    }
}

fn garment(rng: &mut dyn RngCore) -> ItemDraft {
    let color = pick(rng, words::COLORS);
    let clothing = pick(rng, words::CLOTHES);
    ItemDraft {
        name: String::from(clothing),
        description: format!("{} {clothing}.", with_article(color)),
        category: ItemCategory::Garment,
        flags: ItemFlags::default(),
        provenance: None,
    }
}

fn book(rng: &mut dyn RngCore) -> ItemDraft {
    let adjective = pick(rng, words::SCIFI_WORDS);
    let subject = pick(rng, words::TALISMANS);
    let color = pick(rng, words::COLORS);
    let title = title_case(&format!("the {adjective} {subject}"));
    ItemDraft {
        name: format!("{color} book"),
        description: format!("A book of science fiction titled '{title}'. ROCKETS! ROCKETS! ROCKETS!"),
        category: ItemCategory::Book,
        flags: ItemFlags::default(),
        provenance: None,
    }
}

fn poem(rng: &mut dyn RngCore) -> ItemDraft {
    let thing = pick(rng, words::ART_TITLES_TWO);
    let name = title_case(&format!("ode to {thing}"));
    ItemDraft {
        description: format!("A chapbook of poetry. The first page reads '{name}'."),
        name,
        category: ItemCategory::Poem,
        flags: ItemFlags::default(),
        provenance: None,
    }
}

fn cheese(rng: &mut dyn RngCore) -> ItemDraft {
    let name = pick(rng, words::CHEESE_NAMES);
    let texture = pick(rng, words::CHEESE_TEXTURES);
    let flavor = pick(rng, words::CHEESE_FLAVORS);
    let color = pick(rng, words::CHEESE_COLORS);
    let age = pick(rng, words::CHEESE_AGES);
    ItemDraft {
        name: format!("{name} cheese"),
        description: format!(
            "A wheel of {age} {name} cheese, {color} in hue. The paste is {texture}. It tastes {flavor}."
        ),
        category: ItemCategory::Cheese,
        flags: edible(),
        provenance: None,
    }
}

fn ice_cream(rng: &mut dyn RngCore) -> ItemDraft {
    let first = pick(rng, words::FLAVORS);
    let style = pick(rng, words::ICE_CREAM_STYLES);
    let color = pick(rng, words::COLORS);
    let (name, description) = match second_flavor(rng, first, ICE_CREAM_SWIRL_PERCENT) {
        Some(second) => (
            format!("{first} and {second} {style}"),
            format!(
                "A generous scoop of {first} and {second} {style}, swirled together in a \
                 {color} bowl. It's already starting to melt."
            ),
        ),
        None => (
            format!("{first} {style}"),
            format!("A generous scoop of {first} {style} in a {color} bowl. It's already starting to melt."),
        ),
    };
    ItemDraft {
        name,
        description,
        category: ItemCategory::IceCream,
        flags: edible(),
        provenance: None,
    }
}

fn candy(rng: &mut dyn RngCore) -> ItemDraft {
    let first = pick(rng, words::FLAVORS);
    let color = pick(rng, words::COLORS);
    let form = pick(rng, words::CANDY_FORMS);
    let (name, description) = match second_flavor(rng, first, CANDY_SWIRL_PERCENT) {
        Some(second) => (
            format!("{first} and {second} {form}"),
            format!("A {first} and {second} {form}, wrapped in {color} paper. It smells intensely sweet."),
        ),
        None => (
            format!("{first} {form}"),
            format!("A {first} {form} in a {color} wrapper. It glistens under the light."),
        ),
    };
    ItemDraft {
        name,
        description,
        category: ItemCategory::Candy,
        flags: edible(),
        provenance: None,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const fn edible() -> ItemFlags {
    ItemFlags {
        displayed: false,
        masterpiece: false,
        cursed: false,
        edible: true,
    }
}

/// Roll for a second flavor distinct from the first.
fn second_flavor(rng: &mut dyn RngCore, first: &str, percent: u32) -> Option<&'static str> {
    if rng.random_range(0..100) >= percent {
        return None;
    }
    let others: Vec<&'static str> = words::FLAVORS
        .iter()
        .copied()
        .filter(|flavor| *flavor != first)
        .collect();
    others.choose(rng).copied()
}

fn pick(rng: &mut dyn RngCore, list: &'static [&'static str]) -> &'static str {
    list.choose(rng).copied().unwrap_or("thing")
}

/// Prefix with "A" or "An". Plurals are only capitalized.
fn with_article(word: &str) -> String {
    match word.chars().next() {
        None => String::from("One thing"),
        Some(_) if word.ends_with('s') => title_first(word),
        Some(first) if "aeiouAEIOU".contains(first) => format!("An {word}"),
        Some(_) => format!("A {word}"),
    }
}

fn title_first(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn title_case(text: &str) -> String {
    text.split(' ').map(title_first).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn art_roll_bands() {
        assert_eq!(ArtTier::from_roll(0), ArtTier::Masterpiece);
        assert_eq!(ArtTier::from_roll(10), ArtTier::Masterpiece);
        assert_eq!(ArtTier::from_roll(11), ArtTier::Normal);
        assert_eq!(ArtTier::from_roll(18), ArtTier::Normal);
        assert_eq!(ArtTier::from_roll(19), ArtTier::Cursed);
        assert_eq!(ArtTier::from_roll(20), ArtTier::Cursed);
    }

    #[test]
    fn itemator_roll_bands() {
        let rolled: Vec<ItemCategory> = (0..=7).map(itemator_category).collect();
        assert_eq!(
            rolled,
            vec![
                ItemCategory::Talisman,
                ItemCategory::Talisman,
                ItemCategory::Talisman,
                ItemCategory::Artwork,
                ItemCategory::Book,
                ItemCategory::Poem,
                ItemCategory::Garment,
                ItemCategory::Garment,
            ]
        );
    }

    #[test]
    fn artwork_tiers_set_flags() {
        let mut rng = StdRng::seed_from_u64(7);
        let catalog = CatalogGenerator::new();

        let cursed = catalog.artwork(ArtTier::Cursed, &mut rng);
        assert!(cursed.flags.cursed);
        assert!(!cursed.flags.masterpiece);
        assert!(cursed.description.contains("anathema"));

        let master = catalog.artwork(ArtTier::Masterpiece, &mut rng);
        assert!(master.flags.masterpiece);
        assert!(master.description.contains("masterful"));

        let normal = catalog.artwork(ArtTier::Normal, &mut rng);
        assert_eq!(normal.flags, ItemFlags::default());
    }

    #[test]
    fn food_is_edible() {
        let mut rng = StdRng::seed_from_u64(11);
        let catalog = CatalogGenerator::new();
        for category in [ItemCategory::Cheese, ItemCategory::IceCream, ItemCategory::Candy] {
            let draft = catalog.generate(category, &mut rng);
            assert!(draft.flags.edible);
            assert_eq!(draft.category, category);
        }
        let scarf = catalog.generate(ItemCategory::Garment, &mut rng);
        assert!(!scarf.flags.edible);
    }

    #[test]
    fn swirls_never_repeat_a_flavor() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            if let Some(second) = second_flavor(&mut rng, "vanilla", 100) {
                assert_ne!(second, "vanilla");
            }
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let catalog = CatalogGenerator::new();
        let a = catalog.generate(ItemCategory::IceCream, &mut StdRng::seed_from_u64(42));
        let b = catalog.generate(ItemCategory::IceCream, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn drafts_become_full_weight_items() {
        let mut rng = StdRng::seed_from_u64(5);
        let item = CatalogGenerator::new()
            .generate(ItemCategory::Talisman, &mut rng)
            .into_item();
        assert_eq!(item.weight_class, WeightClass::Regular);
        assert!(item.material.is_none());
    }

    #[test]
    fn articles() {
        assert_eq!(with_article("ornate"), "An ornate");
        assert_eq!(with_article("tiny"), "A tiny");
        assert_eq!(with_article("pearls"), "Pearls");
        assert_eq!(title_case("ode to tide"), "Ode To Tide");
    }
}
