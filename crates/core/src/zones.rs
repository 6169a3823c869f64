//! Delivery zone table.
//!
//! Zones are fixed at build time: the shop delivers within roughly 15 km and
//! charges a flat fee per distance bucket. The table is never edited at
//! runtime.

use serde::Serialize;

use crate::types::Rupiah;

/// Zone ID for collecting the order at the shop.
pub const PICKUP_ZONE_ID: &str = "pickup";

/// Zone suggested when an area matches no keyword.
pub const FARTHEST_ZONE_ID: &str = "zone3";

/// Minimum number of characters before an area lookup is attempted.
const MIN_AREA_QUERY_CHARS: usize = 3;

/// A shipping-distance bucket with a flat delivery fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryZone {
    /// Stable identifier (`pickup`, `zone1`, ...).
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Distance range shown to the customer.
    pub distance_label: &'static str,
    /// Short description.
    pub description: &'static str,
    /// Fee charged when free shipping does not apply.
    pub flat_cost: Rupiah,
    /// Area names used to suggest this zone.
    pub area_keywords: &'static [&'static str],
}

impl DeliveryZone {
    /// Returns `true` for the in-store pickup zone.
    #[must_use]
    pub fn is_pickup(&self) -> bool {
        self.id == PICKUP_ZONE_ID
    }

    fn matches_area(&self, needle: &str) -> bool {
        self.area_keywords.iter().any(|keyword| {
            let keyword = keyword.to_lowercase();
            keyword.contains(needle) || needle.contains(&keyword)
        })
    }
}

/// All delivery zones, nearest first.
pub static DELIVERY_ZONES: [DeliveryZone; 4] = [
    DeliveryZone {
        id: PICKUP_ZONE_ID,
        name: "Ambil di Toko",
        distance_label: "0 km",
        description: "Gratis",
        flat_cost: Rupiah::ZERO,
        area_keywords: &["Toko Roti Alcary"],
    },
    DeliveryZone {
        id: "zone1",
        name: "Zona 1",
        distance_label: "0-3 km",
        description: "Sekitar toko",
        flat_cost: Rupiah::new(8_000),
        area_keywords: &[
            "Pusat Kota",
            "Mall Central",
            "Kelurahan A",
            "Kelurahan B",
            "Pasar Utama",
            "Sekolah Negeri 1",
        ],
    },
    DeliveryZone {
        id: "zone2",
        name: "Zona 2",
        distance_label: "3-7 km",
        description: "Dalam kota",
        flat_cost: Rupiah::new(12_000),
        area_keywords: &[
            "Perumahan X",
            "Kelurahan C",
            "Kelurahan D",
            "Terminal Bus",
            "Rumah Sakit Umum",
            "Mall Pinggiran",
        ],
    },
    DeliveryZone {
        id: FARTHEST_ZONE_ID,
        name: "Zona 3",
        distance_label: "7-15 km",
        description: "Pinggiran kota",
        flat_cost: Rupiah::new(18_000),
        area_keywords: &[
            "Kecamatan Y",
            "Perumahan Z",
            "Kampus ABC",
            "Industri Area",
            "Desa Terdekat",
            "Area Perbatasan",
        ],
    },
];

/// Look up a zone by ID.
#[must_use]
pub fn find_zone(zone_id: &str) -> Option<&'static DeliveryZone> {
    DELIVERY_ZONES.iter().find(|zone| zone.id == zone_id)
}

/// Suggest a zone for a free-text area or address.
///
/// Matching is a case-insensitive substring test in both directions against
/// each zone's keywords; the first matching zone wins. An input with no match
/// falls back to the farthest zone, and input shorter than three characters
/// yields `None`. The result is only a hint for the customer, who may pick a
/// different zone.
///
/// ```rust
/// use alcary_core::suggest_zone_for_area;
///
/// assert_eq!(suggest_zone_for_area("mall central").map(|z| z.id), Some("zone1"));
/// assert_eq!(suggest_zone_for_area("Jl. Antah Berantah").map(|z| z.id), Some("zone3"));
/// assert!(suggest_zone_for_area("ab").is_none());
/// ```
#[must_use]
pub fn suggest_zone_for_area(area: &str) -> Option<&'static DeliveryZone> {
    let needle = area.trim().to_lowercase();
    if needle.chars().count() < MIN_AREA_QUERY_CHARS {
        return None;
    }

    DELIVERY_ZONES
        .iter()
        .find(|zone| zone.matches_area(&needle))
        .or_else(|| find_zone(FARTHEST_ZONE_ID))
}
