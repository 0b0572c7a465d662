//! Fresh-zone layout: the rooms, shelves and counters a new zone opens with.
//!
//! Only used when there is no snapshot to restore; a restored zone keeps the
//! shelves and shops it had.

use ballast_core::topology::StaticTopology;
use ballast_core::zone::Zone;
use ballast_types::ShopKind;

/// Rooms and fixtures installed on a fresh zone.
const MARKET_HALL: &str = "Market hall";
const GALLERY: &str = "Gallery";
const SHELVES: [(&str, &str); 3] = [
    (GALLERY, "the long oak shelf"),
    (GALLERY, "the glass cabinet"),
    (MARKET_HALL, "the window ledge"),
];
const SHOPS: [ShopKind; 3] = [ShopKind::Boutique, ShopKind::Food, ShopKind::General];

/// What [`install`] put in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Installed {
    /// Display shelves installed.
    pub shelves: usize,
    /// Shop counters installed.
    pub shops: usize,
}

/// Add the fresh-zone rooms to `topology` and their fixtures to `zone`.
pub async fn install(zone: &Zone, topology: &StaticTopology) -> Installed {
    let market = topology.add_room(MARKET_HALL);
    let gallery = topology.add_room(GALLERY);

    for (room, name) in SHELVES {
        let room = if room == GALLERY { gallery } else { market };
        zone.add_shelf(room, name).await;
    }
    for kind in SHOPS {
        zone.add_shop(kind, market).await;
    }

    Installed {
        shelves: SHELVES.len(),
        shops: SHOPS.len(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ballast_core::config::ZoneConfig;
    use ballast_core::topology::Topology;
    use ballast_events::EventBus;
    use ballast_world::CatalogGenerator;

    use super::*;

    #[tokio::test]
    async fn fresh_zone_gets_every_counter() {
        let topology = Arc::new(StaticTopology::new("KonMarie Temple", "Welcome area"));
        let zone = Zone::new(
            ZoneConfig::default(),
            topology.clone(),
            Arc::new(CatalogGenerator::new()),
            Arc::new(EventBus::default()),
        );

        let installed = install(&zone, &topology).await;
        assert_eq!(installed, Installed { shelves: 3, shops: 3 });
        assert_eq!(zone.shelves().await.len(), 3);

        let shops = zone.shops().await;
        assert!(shops.iter().any(|shop| shop.kind == ShopKind::General));
        assert!(shops.iter().all(|shop| topology.room_name(shop.room) == MARKET_HALL));
    }
}
