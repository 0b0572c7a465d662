//! The workbench: two raw materials in, one finished item out.
//!
//! # Design
//!
//! Each station owns a weighted output table. Same-station combinations
//! roll that station's table; cross-station combinations first pick one of
//! the two stations' tables at random. The chosen category is handed to the
//! [`ItemGenerator`], so artwork still goes through the ordinary tier roll.
//! A same-station artwork that is neither cursed nor already a masterpiece
//! gets a second, 50% chance of being promoted to a masterpiece.
//!
//! The workbench is pure: it validates the inputs and returns a
//! [`CraftOutcome`]. Destroying the inputs and creating the result is the
//! caller's job, issued as one ledger batch.

use ballast_types::{Item, ItemCategory, ItemId, Station};
use rand::{Rng, RngCore};
use tracing::debug;

use crate::error::{CraftError, Incompatibility};
use crate::fixtures::Combiner;
use crate::generator::{ArtTier, ItemGenerator};
use crate::materials::pick_flavor;
use crate::table::WeightedTable;

/// Percent chance a same-station artwork is promoted to a masterpiece.
pub const SAME_STATION_MASTERPIECE_PERCENT: u32 = 50;

const TEXTILE_OUTPUTS: WeightedTable<ItemCategory> = WeightedTable::new(&[
    (ItemCategory::Garment, 75),
    (ItemCategory::Talisman, 15),
    (ItemCategory::Artwork, 10),
]);

const GLAZIER_OUTPUTS: WeightedTable<ItemCategory> =
    WeightedTable::new(&[(ItemCategory::Artwork, 70), (ItemCategory::Talisman, 30)]);

const WAX_OUTPUTS: WeightedTable<ItemCategory> = WeightedTable::new(&[
    (ItemCategory::Talisman, 65),
    (ItemCategory::Artwork, 25),
    (ItemCategory::Poem, 10),
]);

const CLAY_OUTPUTS: WeightedTable<ItemCategory> =
    WeightedTable::new(&[(ItemCategory::Artwork, 70), (ItemCategory::Talisman, 30)]);

const MILK_OUTPUTS: WeightedTable<ItemCategory> = WeightedTable::new(&[
    (ItemCategory::Cheese, 45),
    (ItemCategory::IceCream, 45),
    (ItemCategory::Talisman, 10),
]);

const CANDY_OUTPUTS: WeightedTable<ItemCategory> = WeightedTable::new(&[
    (ItemCategory::Candy, 80),
    (ItemCategory::Talisman, 10),
    (ItemCategory::Artwork, 10),
]);

/// The weighted output table owned by a station.
pub const fn output_table(station: Station) -> WeightedTable<ItemCategory> {
    match station {
        Station::Textile => TEXTILE_OUTPUTS,
        Station::Glazier => GLAZIER_OUTPUTS,
        Station::Wax => WAX_OUTPUTS,
        Station::Clay => CLAY_OUTPUTS,
        Station::Milk => MILK_OUTPUTS,
        Station::Candy => CANDY_OUTPUTS,
    }
}

/// Choose the output category for a pair of stations.
pub fn pick_output(first: Station, second: Station, rng: &mut dyn RngCore) -> ItemCategory {
    let station = if first == second || rng.random_range(0..2_u32) == 0 {
        first
    } else {
        second
    };
    output_table(station)
        .roll(rng)
        .unwrap_or(ItemCategory::Talisman)
}

/// A validated combination, ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftOutcome {
    /// The finished item.
    pub item: Item,
    /// The two inputs to destroy.
    pub consumed: [ItemId; 2],
    /// Both inputs came from the same station.
    pub same_station: bool,
    /// The result was promoted by the same-station bonus.
    pub promoted: bool,
}

/// The crafting fixture.
#[derive(Debug, Clone, Copy, Default)]
pub struct Workbench;

impl Workbench {
    /// Create a workbench.
    pub const fn new() -> Self {
        Self
    }
}

fn station_of(item: &Item) -> Result<Station, CraftError> {
    item.material
        .as_ref()
        .filter(|_| item.is_material())
        .map(|tag| tag.station)
        .ok_or(CraftError::IncompatibleMaterials {
            item: item.id,
            reason: Incompatibility::NotAMaterial,
        })
}

impl Combiner for Workbench {
    fn combine(
        &self,
        first: &Item,
        second: &Item,
        catalog: &dyn ItemGenerator,
        rng: &mut dyn RngCore,
    ) -> Result<CraftOutcome, CraftError> {
        if first.id == second.id {
            return Err(CraftError::IncompatibleMaterials {
                item: first.id,
                reason: Incompatibility::SameItem,
            });
        }
        let first_station = station_of(first)?;
        let second_station = station_of(second)?;
        let same_station = first_station == second_station;

        let category = pick_output(first_station, second_station, rng);
        let mut draft = catalog.generate(category, rng);

        let mut promoted = false;
        if same_station
            && category == ItemCategory::Artwork
            && !draft.flags.cursed
            && !draft.flags.masterpiece
            && rng.random_range(0..100) < SAME_STATION_MASTERPIECE_PERCENT
        {
            draft = catalog.artwork(ArtTier::Masterpiece, rng);
            promoted = true;
        }

        let provenance = format!(
            "Crafted from {} {} and {} {}.",
            pick_flavor(first.material.as_ref(), rng),
            first.name,
            pick_flavor(second.material.as_ref(), rng),
            second.name,
        );
        draft.description = format!("{} {provenance}", draft.description);
        draft.provenance = Some(provenance);

        debug!(
            first = %first_station.label(),
            second = %second_station.label(),
            category = category.label(),
            masterpiece = draft.flags.masterpiece,
            promoted,
            "Combined materials"
        );

        Ok(CraftOutcome {
            item: draft.into_item(),
            consumed: [first.id, second.id],
            same_station,
            promoted,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::generator::CatalogGenerator;
    use crate::materials::{find, raw_item};

    fn material(station: Station, name: &str) -> Item {
        raw_item(station, find(station, name).unwrap())
    }

    #[test]
    fn every_station_table_sums_to_one_hundred() {
        for station in Station::ALL {
            assert_eq!(output_table(station).total_weight(), 100);
        }
    }

    #[test]
    fn same_station_uses_its_own_table() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let category = pick_output(Station::Milk, Station::Milk, &mut rng);
            assert!(matches!(
                category,
                ItemCategory::Cheese | ItemCategory::IceCream | ItemCategory::Talisman
            ));
        }
    }

    #[test]
    fn cross_station_draws_from_either_table() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut saw_food = false;
        let mut saw_garment = false;
        for _ in 0..400 {
            let category = pick_output(Station::Milk, Station::Textile, &mut rng);
            saw_food |= matches!(category, ItemCategory::Cheese | ItemCategory::IceCream);
            saw_garment |= category == ItemCategory::Garment;
            assert!(
                !matches!(category, ItemCategory::Candy | ItemCategory::Poem | ItemCategory::Book),
                "unexpected category {category:?}"
            );
        }
        assert!(saw_food && saw_garment);
    }

    #[test]
    fn combine_consumes_both_and_adds_provenance() {
        let mut rng = StdRng::seed_from_u64(9);
        let silk = material(Station::Textile, "silk thread");
        let cotton = material(Station::Textile, "raw cotton");
        let outcome = Workbench::new()
            .combine(&silk, &cotton, &CatalogGenerator::new(), &mut rng)
            .unwrap();

        assert_eq!(outcome.consumed, [silk.id, cotton.id]);
        assert!(outcome.same_station);
        let provenance = outcome.item.provenance.as_deref().unwrap();
        assert!(provenance.starts_with("Crafted from "));
        assert!(provenance.contains("silk thread"));
        assert!(provenance.contains("raw cotton"));
        assert!(outcome.item.description.ends_with(provenance));
        assert!(!outcome.item.is_material());
    }

    #[test]
    fn same_station_artwork_is_promoted_sometimes() {
        let catalog = CatalogGenerator::new();
        let glass = material(Station::Glazier, "blown glass");
        let rod = material(Station::Glazier, "crystal rod");
        let mut promoted = 0_u32;
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = Workbench::new().combine(&glass, &rod, &catalog, &mut rng).unwrap();
            if outcome.promoted {
                promoted = promoted.saturating_add(1);
                assert!(outcome.item.flags.masterpiece);
                assert!(!outcome.item.flags.cursed);
            }
        }
        assert!(promoted > 0);
    }

    #[test]
    fn rejects_non_materials_and_self_combination() {
        let mut rng = StdRng::seed_from_u64(4);
        let catalog = CatalogGenerator::new();
        let wax = material(Station::Wax, "scented wax");
        let trinket = catalog.generate(ItemCategory::Talisman, &mut rng).into_item();

        let err = Workbench::new().combine(&wax, &trinket, &catalog, &mut rng).unwrap_err();
        assert_eq!(
            err,
            CraftError::IncompatibleMaterials {
                item: trinket.id,
                reason: Incompatibility::NotAMaterial,
            }
        );

        let err = Workbench::new().combine(&wax, &wax, &catalog, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            CraftError::IncompatibleMaterials { reason: Incompatibility::SameItem, .. }
        ));
    }
}
