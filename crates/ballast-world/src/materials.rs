//! Raw materials stocked by each workshop station.
//!
//! Every station dispenses four or five materials. Each material carries a
//! handful of flavor words that the workbench weaves into the provenance
//! line of whatever it is combined into.

use ballast_types::{Item, ItemCategory, ItemFlags, ItemId, MaterialTag, Station, WeightClass};
use rand::RngCore;
use rand::seq::IndexedRandom;

use crate::error::WorldError;

/// One dispensable raw material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialSpec {
    /// Name used by `dispense` and in provenance lines.
    pub name: &'static str,
    /// Description given to the dispensed item.
    pub description: &'static str,
    /// Adjectives drawn on when the material is crafted.
    pub flavor_words: &'static [&'static str],
}

const fn spec(
    name: &'static str,
    description: &'static str,
    flavor_words: &'static [&'static str],
) -> MaterialSpec {
    MaterialSpec {
        name,
        description,
        flavor_words,
    }
}

const TEXTILE: &[MaterialSpec] = &[
    spec(
        "silk thread",
        "A spool of luminous silk thread, fine as spider web.",
        &["silken", "gossamer", "lustrous thread"],
    ),
    spec(
        "raw cotton",
        "A dense bale of unbleached raw cotton.",
        &["cotton", "woven", "soft-spun"],
    ),
    spec(
        "synthetic fiber",
        "A coil of iridescent synthetic fiber, slightly warm to the touch.",
        &["synthetic", "shimmering", "polymer-woven"],
    ),
    spec(
        "iridescent yarn",
        "A skein of yarn that shifts color as it catches the light.",
        &["iridescent", "color-shifting", "prismatic yarn"],
    ),
];

const GLAZIER: &[MaterialSpec] = &[
    spec(
        "blown glass",
        "A delicate globe of hand-blown glass, still warm.",
        &["blown glass", "translucent", "vitreous"],
    ),
    spec(
        "stained pane",
        "A small pane of deeply colored stained glass.",
        &["stained glass", "jewel-toned", "cathedral-bright"],
    ),
    spec(
        "glass bead",
        "A handful of tiny glass beads in assorted colors.",
        &["beaded", "glass-studded", "bead-encrusted"],
    ),
    spec(
        "crystal rod",
        "A smooth rod of clear crystal, cold to the touch.",
        &["crystal", "clear-spun", "rod-shaped"],
    ),
    spec(
        "fiber optic extrusion",
        "A flexible length of thin glass thread.",
        &["fiber optic"],
    ),
];

const WAX: &[MaterialSpec] = &[
    spec(
        "beeswax block",
        "A golden block of beeswax, faintly fragrant.",
        &["beeswax", "honey-golden", "wax-sealed"],
    ),
    spec(
        "paraffin sheet",
        "A translucent sheet of smooth paraffin wax.",
        &["paraffin", "waxy", "translucent"],
    ),
    spec(
        "scented wax",
        "A cake of wax infused with an unidentifiable but pleasant scent.",
        &["scented", "aromatic", "perfumed wax"],
    ),
    spec(
        "resin pellet",
        "A handful of amber resin pellets, hard as stone.",
        &["resin-coated", "amber", "lacquered"],
    ),
];

const CLAY: &[MaterialSpec] = &[
    spec(
        "polyclay slab",
        "A slab of polyclay in a marbled pattern of earth tones.",
        &["polyclay", "marbled", "earth-toned"],
    ),
    spec(
        "terracotta lump",
        "A warm lump of terracotta clay, ready to be shaped.",
        &["terracotta", "clay-fired", "earthen"],
    ),
    spec(
        "porcelain slip",
        "A sealed vessel of liquid porcelain, bone white.",
        &["porcelain", "bone-white", "ceramic"],
    ),
    spec(
        "ceramic dust",
        "A pouch of fine ceramic dust that glitters faintly.",
        &["ceramic", "dust-glazed", "kiln-born"],
    ),
];

const MILK: &[MaterialSpec] = &[
    spec(
        "protein curd",
        "A dense block of protein curd, slightly rubbery.",
        &["protein-rich", "curd-formed", "bio-dense"],
    ),
    spec(
        "bioplastic film",
        "A flexible sheet of bioplastic with a milky sheen.",
        &["bioplastic", "milky", "bio-formed"],
    ),
    spec(
        "casein powder",
        "A bag of fine white casein powder.",
        &["casein", "powdered", "milk-derived"],
    ),
    spec(
        "fermented culture",
        "A sealed jar of bubbling fermented culture. It smells... alive.",
        &["fermented", "living", "culture-grown"],
    ),
];

const CANDY: &[MaterialSpec] = &[
    spec(
        "sugar glass",
        "A pane of sugar glass, perfectly transparent and brittle.",
        &["sugar glass", "crystalline", "candy-bright"],
    ),
    spec(
        "caramel strand",
        "A long strand of spun caramel, golden and sticky.",
        &["caramel", "golden-spun", "toffee-laced"],
    ),
    spec(
        "cocoa butter",
        "A smooth disk of cocoa butter with a rich chocolate scent.",
        &["cocoa-infused", "chocolate", "rich"],
    ),
    spec(
        "candy lacquer",
        "A tin of glossy candy lacquer in an alarming shade of red.",
        &["lacquered", "candy-coated", "glossy"],
    ),
];

/// Flavor word used when a material has none on record.
pub const FALLBACK_FLAVOR: &str = "unusual";

/// Every material a station stocks.
pub const fn materials(station: Station) -> &'static [MaterialSpec] {
    match station {
        Station::Textile => TEXTILE,
        Station::Glazier => GLAZIER,
        Station::Wax => WAX,
        Station::Clay => CLAY,
        Station::Milk => MILK,
        Station::Candy => CANDY,
    }
}

/// Name of the machinery behind a station, as printed on its sign.
pub const fn station_name(station: Station) -> &'static str {
    match station {
        Station::Textile => "Textile megaspools",
        Station::Glazier => "Glazier workshop",
        Station::Wax => "Wax extruders",
        Station::Clay => "Polyclay intubators",
        Station::Milk => "Milk vats",
        Station::Candy => "Confectionary tanks",
    }
}

/// Look up a material by name (case-insensitive).
pub fn find(station: Station, name: &str) -> Result<&'static MaterialSpec, WorldError> {
    let wanted = name.trim();
    materials(station)
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| WorldError::UnknownMaterial {
            station,
            material: String::from(wanted),
        })
}

/// Flavor words for the material behind a tag, if the station stocks it.
pub fn flavor_words(tag: &MaterialTag) -> &'static [&'static str] {
    match find(tag.station, &tag.material) {
        Ok(spec) => spec.flavor_words,
        Err(_) => &[],
    }
}

/// Pick one flavor word for a tagged material.
pub fn pick_flavor(tag: Option<&MaterialTag>, rng: &mut dyn RngCore) -> &'static str {
    tag.map(flavor_words)
        .and_then(|words| words.choose(rng).copied())
        .unwrap_or(FALLBACK_FLAVOR)
}

/// Build a fresh raw-material item for a station's material.
pub fn raw_item(station: Station, spec: &MaterialSpec) -> Item {
    Item {
        id: ItemId::new(),
        name: String::from(spec.name),
        description: String::from(spec.description),
        category: ItemCategory::Material,
        weight_class: WeightClass::RawMaterial,
        flags: ItemFlags::default(),
        material: Some(MaterialTag {
            station,
            material: String::from(spec.name),
        }),
        provenance: None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn every_station_stocks_four_or_five_materials() {
        for station in Station::ALL {
            let count = materials(station).len();
            assert!((4..=5).contains(&count), "{station:?} stocks {count}");
            for spec in materials(station) {
                assert!(!spec.flavor_words.is_empty());
            }
        }
    }

    #[test]
    fn find_ignores_case_and_padding() {
        let spec = find(Station::Glazier, "  Crystal Rod ").unwrap();
        assert_eq!(spec.name, "crystal rod");
    }

    #[test]
    fn unknown_material_is_rejected() {
        let err = find(Station::Milk, "silk thread").unwrap_err();
        assert!(matches!(err, WorldError::UnknownMaterial { station: Station::Milk, .. }));
    }

    #[test]
    fn raw_items_weigh_a_third() {
        let spec = find(Station::Wax, "beeswax block").unwrap();
        let item = raw_item(Station::Wax, spec);
        assert!(item.is_material());
        assert_eq!(item.effective_weight(), Decimal::new(33, 2));
        assert_eq!(flavor_words(item.material.as_ref().unwrap()).len(), 3);
    }
}
