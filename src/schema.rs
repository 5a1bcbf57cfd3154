//! Static declaration of every recognized feed file: ordered column
//! lists with declared types, requiredness and key membership.
//!
//! This table drives the row parser and replaces any runtime schema
//! inspection; adding a column is a one-line change here.

use crate::fields::{FieldType, INTEGER, NON_NEGATIVE_INTEGER, POSITIVE_INTEGER};
use lazy_static::lazy_static;
use rustc_hash::FxHashMap;

/// One declared column of a feed file.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub field_type: FieldType,
    /// A value must be present on every row. Requiredness that depends
    /// on other fields (e.g. stop names by location type) is enforced
    /// by the entity builders instead.
    pub required: bool,
    /// Part of the file's primary key
    pub is_key: bool,
}

const fn req(name: &'static str, field_type: FieldType) -> Column {
    Column {
        name,
        field_type,
        required: true,
        is_key: false,
    }
}

const fn opt(name: &'static str, field_type: FieldType) -> Column {
    Column {
        name,
        field_type,
        required: false,
        is_key: false,
    }
}

const fn key(name: &'static str, field_type: FieldType) -> Column {
    Column {
        name,
        field_type,
        required: true,
        is_key: true,
    }
}

const fn opt_key(name: &'static str, field_type: FieldType) -> Column {
    Column {
        name,
        field_type,
        required: false,
        is_key: true,
    }
}

/// The declared shape of one feed file.
#[derive(Debug, Clone, Copy)]
pub struct FileSchema {
    pub file_name: &'static str,
    /// The feed is unusable without this file
    pub required_file: bool,
    pub columns: &'static [Column],
}

impl FileSchema {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn required_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.required)
    }
}

pub const AGENCY_FILE: &str = "agency.txt";
pub const STOPS_FILE: &str = "stops.txt";
pub const ROUTES_FILE: &str = "routes.txt";
pub const TRIPS_FILE: &str = "trips.txt";
pub const STOP_TIMES_FILE: &str = "stop_times.txt";
pub const CALENDAR_FILE: &str = "calendar.txt";
pub const CALENDAR_DATES_FILE: &str = "calendar_dates.txt";
pub const SHAPES_FILE: &str = "shapes.txt";
pub const FREQUENCIES_FILE: &str = "frequencies.txt";
pub const TRANSFERS_FILE: &str = "transfers.txt";
pub const FARE_ATTRIBUTES_FILE: &str = "fare_attributes.txt";
pub const FARE_RULES_FILE: &str = "fare_rules.txt";
pub const FEED_INFO_FILE: &str = "feed_info.txt";
pub const PATHWAYS_FILE: &str = "pathways.txt";
pub const LEVELS_FILE: &str = "levels.txt";
pub const ATTRIBUTIONS_FILE: &str = "attributions.txt";
pub const TRANSLATIONS_FILE: &str = "translations.txt";

/// Canonical processing order: files that others reference come first,
/// so the repository merge sees parents before children.
pub const FILE_ORDER: &[&str] = &[
    AGENCY_FILE,
    LEVELS_FILE,
    STOPS_FILE,
    ROUTES_FILE,
    CALENDAR_FILE,
    CALENDAR_DATES_FILE,
    SHAPES_FILE,
    TRIPS_FILE,
    STOP_TIMES_FILE,
    FREQUENCIES_FILE,
    TRANSFERS_FILE,
    PATHWAYS_FILE,
    FARE_ATTRIBUTES_FILE,
    FARE_RULES_FILE,
    FEED_INFO_FILE,
    ATTRIBUTIONS_FILE,
    TRANSLATIONS_FILE,
];

static AGENCY: FileSchema = FileSchema {
    file_name: AGENCY_FILE,
    required_file: true,
    columns: &[
        opt_key("agency_id", FieldType::Text),
        req("agency_name", FieldType::Text),
        req("agency_url", FieldType::Url),
        req("agency_timezone", FieldType::Timezone),
        opt("agency_lang", FieldType::LanguageCode),
        opt("agency_phone", FieldType::Phone),
        opt("agency_fare_url", FieldType::Url),
        opt("agency_email", FieldType::Email),
    ],
};

static STOPS: FileSchema = FileSchema {
    file_name: STOPS_FILE,
    required_file: true,
    columns: &[
        key("stop_id", FieldType::Text),
        opt("stop_code", FieldType::Text),
        // required for stops, stations and entrances; builder-enforced
        opt("stop_name", FieldType::Text),
        opt("stop_desc", FieldType::Text),
        opt("stop_lat", FieldType::Latitude),
        opt("stop_lon", FieldType::Longitude),
        opt("zone_id", FieldType::Text),
        opt("stop_url", FieldType::Url),
        opt("location_type", FieldType::Enum),
        opt("parent_station", FieldType::Text),
        opt("stop_timezone", FieldType::Timezone),
        opt("wheelchair_boarding", FieldType::Enum),
        opt("level_id", FieldType::Text),
        opt("platform_code", FieldType::Text),
    ],
};

static ROUTES: FileSchema = FileSchema {
    file_name: ROUTES_FILE,
    required_file: true,
    columns: &[
        key("route_id", FieldType::Text),
        opt("agency_id", FieldType::Text),
        opt("route_short_name", FieldType::Text),
        opt("route_long_name", FieldType::Text),
        opt("route_desc", FieldType::Text),
        req("route_type", FieldType::Enum),
        opt("route_url", FieldType::Url),
        opt("route_color", FieldType::Color),
        opt("route_text_color", FieldType::Color),
        opt("route_sort_order", NON_NEGATIVE_INTEGER),
        opt("continuous_pickup", FieldType::Enum),
        opt("continuous_drop_off", FieldType::Enum),
    ],
};

static TRIPS: FileSchema = FileSchema {
    file_name: TRIPS_FILE,
    required_file: true,
    columns: &[
        req("route_id", FieldType::Text),
        req("service_id", FieldType::Text),
        key("trip_id", FieldType::Text),
        opt("trip_headsign", FieldType::Text),
        opt("trip_short_name", FieldType::Text),
        opt("direction_id", FieldType::Enum),
        opt("block_id", FieldType::Text),
        opt("shape_id", FieldType::Text),
        opt("wheelchair_accessible", FieldType::Enum),
        opt("bikes_allowed", FieldType::Enum),
    ],
};

static STOP_TIMES: FileSchema = FileSchema {
    file_name: STOP_TIMES_FILE,
    required_file: true,
    columns: &[
        key("trip_id", FieldType::Text),
        opt("arrival_time", FieldType::Time),
        opt("departure_time", FieldType::Time),
        // exactly one of stop_id / location_group_id / location_id;
        // builder-enforced
        opt("stop_id", FieldType::Text),
        opt("location_group_id", FieldType::Text),
        opt("location_id", FieldType::Text),
        key("stop_sequence", NON_NEGATIVE_INTEGER),
        opt("stop_headsign", FieldType::Text),
        opt("pickup_type", FieldType::Enum),
        opt("drop_off_type", FieldType::Enum),
        opt("continuous_pickup", FieldType::Enum),
        opt("continuous_drop_off", FieldType::Enum),
        opt("shape_dist_traveled", FieldType::NonNegativeFloat),
        opt("timepoint", FieldType::Enum),
    ],
};

static CALENDAR: FileSchema = FileSchema {
    file_name: CALENDAR_FILE,
    required_file: false,
    columns: &[
        key("service_id", FieldType::Text),
        req("monday", FieldType::Enum),
        req("tuesday", FieldType::Enum),
        req("wednesday", FieldType::Enum),
        req("thursday", FieldType::Enum),
        req("friday", FieldType::Enum),
        req("saturday", FieldType::Enum),
        req("sunday", FieldType::Enum),
        req("start_date", FieldType::Date),
        req("end_date", FieldType::Date),
    ],
};

static CALENDAR_DATES: FileSchema = FileSchema {
    file_name: CALENDAR_DATES_FILE,
    required_file: false,
    columns: &[
        key("service_id", FieldType::Text),
        key("date", FieldType::Date),
        req("exception_type", FieldType::Enum),
    ],
};

static SHAPES: FileSchema = FileSchema {
    file_name: SHAPES_FILE,
    required_file: false,
    columns: &[
        key("shape_id", FieldType::Text),
        req("shape_pt_lat", FieldType::Latitude),
        req("shape_pt_lon", FieldType::Longitude),
        key("shape_pt_sequence", NON_NEGATIVE_INTEGER),
        opt("shape_dist_traveled", FieldType::NonNegativeFloat),
    ],
};

static FREQUENCIES: FileSchema = FileSchema {
    file_name: FREQUENCIES_FILE,
    required_file: false,
    columns: &[
        key("trip_id", FieldType::Text),
        key("start_time", FieldType::Time),
        req("end_time", FieldType::Time),
        req("headway_secs", POSITIVE_INTEGER),
        opt("exact_times", FieldType::Enum),
    ],
};

static TRANSFERS: FileSchema = FileSchema {
    file_name: TRANSFERS_FILE,
    required_file: false,
    columns: &[
        key("from_stop_id", FieldType::Text),
        key("to_stop_id", FieldType::Text),
        req("transfer_type", FieldType::Enum),
        opt("min_transfer_time", NON_NEGATIVE_INTEGER),
    ],
};

static FARE_ATTRIBUTES: FileSchema = FileSchema {
    file_name: FARE_ATTRIBUTES_FILE,
    required_file: false,
    columns: &[
        key("fare_id", FieldType::Text),
        req("price", FieldType::NonNegativeFloat),
        req("currency_type", FieldType::CurrencyCode),
        req("payment_method", FieldType::Enum),
        opt("transfers", FieldType::Enum),
        opt("agency_id", FieldType::Text),
        opt("transfer_duration", NON_NEGATIVE_INTEGER),
    ],
};

static FARE_RULES: FileSchema = FileSchema {
    file_name: FARE_RULES_FILE,
    required_file: false,
    columns: &[
        key("fare_id", FieldType::Text),
        opt_key("route_id", FieldType::Text),
        opt_key("origin_id", FieldType::Text),
        opt_key("destination_id", FieldType::Text),
        opt_key("contains_id", FieldType::Text),
    ],
};

static FEED_INFO: FileSchema = FileSchema {
    file_name: FEED_INFO_FILE,
    required_file: false,
    columns: &[
        req("feed_publisher_name", FieldType::Text),
        req("feed_publisher_url", FieldType::Url),
        req("feed_lang", FieldType::LanguageCode),
        opt("default_lang", FieldType::LanguageCode),
        opt("feed_start_date", FieldType::Date),
        opt("feed_end_date", FieldType::Date),
        opt("feed_version", FieldType::Text),
        opt("feed_contact_email", FieldType::Email),
        opt("feed_contact_url", FieldType::Url),
    ],
};

static PATHWAYS: FileSchema = FileSchema {
    file_name: PATHWAYS_FILE,
    required_file: false,
    columns: &[
        key("pathway_id", FieldType::Text),
        req("from_stop_id", FieldType::Text),
        req("to_stop_id", FieldType::Text),
        req("pathway_mode", FieldType::Enum),
        req("is_bidirectional", FieldType::Enum),
        opt("length", FieldType::NonNegativeFloat),
        opt("traversal_time", POSITIVE_INTEGER),
        opt("stair_count", INTEGER),
        opt("max_slope", FieldType::Float),
        opt("min_width", FieldType::NonNegativeFloat),
        opt("signposted_as", FieldType::Text),
        opt("reversed_signposted_as", FieldType::Text),
    ],
};

static LEVELS: FileSchema = FileSchema {
    file_name: LEVELS_FILE,
    required_file: false,
    columns: &[
        key("level_id", FieldType::Text),
        req("level_index", FieldType::Float),
        opt("level_name", FieldType::Text),
    ],
};

static ATTRIBUTIONS: FileSchema = FileSchema {
    file_name: ATTRIBUTIONS_FILE,
    required_file: false,
    columns: &[
        opt_key("attribution_id", FieldType::Text),
        opt("agency_id", FieldType::Text),
        opt("route_id", FieldType::Text),
        opt("trip_id", FieldType::Text),
        req("organization_name", FieldType::Text),
        opt("is_producer", FieldType::Enum),
        opt("is_operator", FieldType::Enum),
        opt("is_authority", FieldType::Enum),
        opt("attribution_url", FieldType::Url),
        opt("attribution_email", FieldType::Email),
        opt("attribution_phone", FieldType::Phone),
    ],
};

static TRANSLATIONS: FileSchema = FileSchema {
    file_name: TRANSLATIONS_FILE,
    required_file: false,
    columns: &[
        key("table_name", FieldType::Text),
        key("field_name", FieldType::Text),
        key("language", FieldType::LanguageCode),
        req("translation", FieldType::Text),
        opt_key("record_id", FieldType::Text),
        opt_key("record_sub_id", FieldType::Text),
        opt_key("field_value", FieldType::Text),
    ],
};

lazy_static! {
    static ref SCHEMAS: FxHashMap<&'static str, &'static FileSchema> = {
        let mut map = FxHashMap::default();
        for schema in [
            &AGENCY,
            &STOPS,
            &ROUTES,
            &TRIPS,
            &STOP_TIMES,
            &CALENDAR,
            &CALENDAR_DATES,
            &SHAPES,
            &FREQUENCIES,
            &TRANSFERS,
            &FARE_ATTRIBUTES,
            &FARE_RULES,
            &FEED_INFO,
            &PATHWAYS,
            &LEVELS,
            &ATTRIBUTIONS,
            &TRANSLATIONS,
        ] {
            map.insert(schema.file_name, schema);
        }
        map
    };
}

/// Looks up the declared schema of a feed file.
pub fn schema_for(file_name: &str) -> Option<&'static FileSchema> {
    SCHEMAS.get(file_name).copied()
}

/// The files without which the feed is unusable.
pub fn required_files() -> impl Iterator<Item = &'static FileSchema> {
    FILE_ORDER
        .iter()
        .filter_map(|name| schema_for(name))
        .filter(|schema| schema.required_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_ordered_file_has_a_schema() {
        for name in FILE_ORDER {
            assert!(schema_for(name).is_some(), "missing schema for {}", name);
        }
    }

    #[test]
    fn required_files_are_the_core_five() {
        let names: Vec<&str> = required_files().map(|s| s.file_name).collect();
        assert_eq!(
            names,
            vec![
                AGENCY_FILE,
                STOPS_FILE,
                ROUTES_FILE,
                TRIPS_FILE,
                STOP_TIMES_FILE
            ]
        );
    }

    #[test]
    fn keyed_columns_are_declared() {
        let schema = schema_for(STOP_TIMES_FILE).unwrap();
        let keys: Vec<&str> = schema
            .columns
            .iter()
            .filter(|c| c.is_key)
            .map(|c| c.name)
            .collect();
        assert_eq!(keys, vec!["trip_id", "stop_sequence"]);
    }
}
