//! Data module - listing CSV loading, parsing and filtering

mod filter;
mod loader;
mod parse;
mod processor;

pub use filter::{filter_properties, NumRange, ParkingChoice, SearchFilters, ANY, HOUSE_TYPES};
pub use loader::{get_city_options, load_listings, write_csv, LoaderError};
pub use parse::{normalize_special_value, parse_layout, IntRange};
pub use processor::{ListingProcessor, ProcessorError};

/// Column names: `SRC_*` come from the listing CSV, the rest are derived.
pub mod columns {
    pub const SRC_TYPE: &str = "類型";
    pub const SRC_PRICE: &str = "總價";
    pub const SRC_AGE: &str = "屋齡";
    pub const SRC_AREA: &str = "建坪";
    pub const SRC_LAYOUT: &str = "格局";
    pub const SRC_FLOOR: &str = "樓層";
    pub const SRC_PARKING: &str = "車位";

    pub const ROOMS: &str = "rooms";
    pub const LIVING_ROOMS: &str = "living_rooms";
    pub const BATHROOMS: &str = "bathrooms";
    pub const FLOOR: &str = "floor";
    pub const FLOOR_MAX: &str = "floor_max";
    pub const TOTAL_FLOORS: &str = "total_floors";
    pub const PRICE: &str = "price";
    pub const AGE: &str = "age";
    pub const AREA: &str = "area";
    pub const HAS_PARKING: &str = "has_parking";

    /// Derived columns hidden from the results table.
    pub const DERIVED: &[&str] = &[
        ROOMS,
        LIVING_ROOMS,
        BATHROOMS,
        FLOOR,
        FLOOR_MAX,
        TOTAL_FLOORS,
        PRICE,
        AGE,
        AREA,
        HAS_PARKING,
    ];
}
