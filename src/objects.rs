//! Typed entities built from validated rows.
//!
//! One struct per file kind. Entities are immutable once inserted into
//! the repository; every entity remembers the 1-based row it was built
//! from so referential notices can point back at the source line.

pub use crate::enums::*;
use chrono::{Datelike, NaiveDate, Weekday};
use rgb::RGB8;

use std::fmt;

/// Objects that have a single-field identifier implement this trait.
///
/// Those identifiers are technical and should not be shown to travellers.
pub trait Id {
    /// Identifier of the object
    fn id(&self) -> &str;
}

/// General information about an agency running the network.
#[derive(Debug, Clone, Default)]
pub struct Agency {
    /// Optional in feeds with a single agency
    pub id: Option<String>,
    pub name: String,
    pub url: String,
    pub timezone: String,
    pub lang: Option<String>,
    pub phone: Option<String>,
    pub fare_url: Option<String>,
    pub email: Option<String>,
    pub row: u64,
}

impl Id for Agency {
    fn id(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Agency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The fields shared by every kind of location in `stops.txt`.
#[derive(Debug, Clone, Default)]
pub struct LocationFields {
    pub id: String,
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub zone_id: Option<String>,
    pub url: Option<String>,
    pub parent_station: Option<String>,
    pub timezone: Option<String>,
    pub wheelchair_boarding: Availability,
    pub level_id: Option<String>,
    pub platform_code: Option<String>,
    pub row: u64,
}

/// A location from `stops.txt`, tagged by its `location_type`.
///
/// The variants carry the same field set but different construction
/// rules (a station must not have a parent, a boarding area must) and
/// different roles in the hierarchy checks.
#[derive(Debug, Clone)]
pub enum Stop {
    StopOrPlatform(LocationFields),
    Station(LocationFields),
    Entrance(LocationFields),
    GenericNode(LocationFields),
    BoardingArea(LocationFields),
}

impl Stop {
    pub fn fields(&self) -> &LocationFields {
        match self {
            Stop::StopOrPlatform(f)
            | Stop::Station(f)
            | Stop::Entrance(f)
            | Stop::GenericNode(f)
            | Stop::BoardingArea(f) => f,
        }
    }

    pub fn location_type(&self) -> LocationType {
        match self {
            Stop::StopOrPlatform(_) => LocationType::StopOrPlatform,
            Stop::Station(_) => LocationType::Station,
            Stop::Entrance(_) => LocationType::Entrance,
            Stop::GenericNode(_) => LocationType::GenericNode,
            Stop::BoardingArea(_) => LocationType::BoardingArea,
        }
    }

    /// The location type a declared parent must have, or `None` when
    /// declaring a parent is forbidden.
    pub fn expected_parent_type(&self) -> Option<LocationType> {
        match self {
            Stop::Station(_) => None,
            Stop::BoardingArea(_) => Some(LocationType::StopOrPlatform),
            _ => Some(LocationType::Station),
        }
    }

    pub fn parent_station(&self) -> Option<&str> {
        self.fields().parent_station.as_deref()
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.fields().latitude, self.fields().longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn row(&self) -> u64 {
        self.fields().row
    }
}

impl Id for Stop {
    fn id(&self) -> &str {
        &self.fields().id
    }
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.fields().name.as_deref().unwrap_or(""))
    }
}

/// A commercial line. There can be various stop sequences for one line.
#[derive(Debug, Clone, Default)]
pub struct Route {
    pub id: String,
    pub agency_id: Option<String>,
    /// Short, abstract identifier like "32" or "Green"
    pub short_name: Option<String>,
    /// Descriptive name, often including the destination
    pub long_name: Option<String>,
    pub description: Option<String>,
    pub route_type: RouteType,
    pub url: Option<String>,
    pub color: Option<RGB8>,
    pub text_color: Option<RGB8>,
    pub sort_order: Option<u32>,
    pub continuous_pickup: ContinuousPickupDropOff,
    pub continuous_drop_off: ContinuousPickupDropOff,
    pub row: u64,
}

impl Id for Route {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.long_name, &self.short_name) {
            (Some(long), _) if !long.is_empty() => write!(f, "{}", long),
            (_, Some(short)) => write!(f, "{}", short),
            _ => write!(f, "{}", self.id),
        }
    }
}

/// A vehicle following a sequence of stop times on certain days.
#[derive(Debug, Clone, Default)]
pub struct Trip {
    pub id: String,
    pub route_id: String,
    pub service_id: String,
    pub headsign: Option<String>,
    pub short_name: Option<String>,
    pub direction: Option<DirectionType>,
    /// Trips sharing a block are operated by the same vehicle
    pub block_id: Option<String>,
    pub shape_id: Option<String>,
    pub wheelchair_accessible: Availability,
    pub bikes_allowed: BikesAllowedType,
    pub row: u64,
}

impl Id for Trip {
    fn id(&self) -> &str {
        &self.id
    }
}

/// The moment a vehicle running on a trip serves a stop.
#[derive(Debug, Clone, Default)]
pub struct StopTime {
    pub trip_id: String,
    /// Absent times are interpolated by consumers
    pub arrival_time: Option<u32>,
    pub departure_time: Option<u32>,
    pub stop_id: Option<String>,
    pub location_group_id: Option<String>,
    pub location_id: Option<String>,
    /// Must increase along the trip but need not be consecutive
    pub stop_sequence: u32,
    pub headsign: Option<String>,
    pub pickup_type: PickupDropOffType,
    pub drop_off_type: PickupDropOffType,
    pub continuous_pickup: ContinuousPickupDropOff,
    pub continuous_drop_off: ContinuousPickupDropOff,
    pub shape_dist_traveled: Option<f64>,
    pub timepoint: TimepointType,
    pub row: u64,
}

/// On which weekdays, between two dates, a service runs.
#[derive(Debug, Clone, Default)]
pub struct Calendar {
    pub service_id: String,
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
    pub start_date: NaiveDate,
    /// Included in the interval
    pub end_date: NaiveDate,
    pub row: u64,
}

impl Id for Calendar {
    fn id(&self) -> &str {
        &self.service_id
    }
}

impl Calendar {
    /// Returns true if the service runs on that day of the week.
    pub fn valid_weekday(&self, date: NaiveDate) -> bool {
        match date.weekday() {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }
}

/// A specific date added to or removed from a service.
#[derive(Debug, Clone)]
pub struct CalendarDate {
    pub service_id: String,
    pub date: NaiveDate,
    pub exception: Exception,
    pub row: u64,
}

/// A single geographical point describing the shape of a trip.
#[derive(Debug, Clone, Default)]
pub struct ShapePoint {
    pub shape_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Increases along the trip but need not be consecutive
    pub sequence: u32,
    pub dist_traveled: Option<f64>,
    pub row: u64,
}

/// A period during which a trip runs on a headway instead of a fixed
/// timetable.
#[derive(Debug, Clone, Default)]
pub struct Frequency {
    pub trip_id: String,
    pub start_time: u32,
    pub end_time: u32,
    pub headway_secs: u32,
    pub exact_times: ExactTimes,
    pub row: u64,
}

/// A connection between two stops.
#[derive(Debug, Clone, Default)]
pub struct Transfer {
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub transfer_type: TransferType,
    /// Seconds needed to make the transfer
    pub min_transfer_time: Option<u32>,
    pub row: u64,
}

/// One possible fare.
#[derive(Debug, Clone, Default)]
pub struct FareAttribute {
    pub id: String,
    pub price: f64,
    pub currency: String,
    pub payment_method: Option<PaymentMethod>,
    pub transfers: Transfers,
    pub agency_id: Option<String>,
    pub transfer_duration: Option<u32>,
    pub row: u64,
}

impl Id for FareAttribute {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Associates a fare with a route or zone pattern.
#[derive(Debug, Clone, Default)]
pub struct FareRule {
    pub fare_id: String,
    pub route_id: Option<String>,
    pub origin_id: Option<String>,
    pub destination_id: Option<String>,
    pub contains_id: Option<String>,
    pub row: u64,
}

/// Metadata about the feed itself. At most one row.
#[derive(Debug, Clone, Default)]
pub struct FeedInfo {
    pub publisher_name: String,
    pub publisher_url: String,
    pub lang: String,
    pub default_lang: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub version: Option<String>,
    pub contact_email: Option<String>,
    pub contact_url: Option<String>,
    pub row: u64,
}

impl fmt::Display for FeedInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.publisher_name)
    }
}

/// An edge of the station graph: walkway, stairs, elevator…
#[derive(Debug, Clone, Default)]
pub struct Pathway {
    pub id: String,
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub mode: PathwayMode,
    pub is_bidirectional: PathwayDirection,
    pub length: Option<f64>,
    pub traversal_time: Option<u32>,
    /// Negative counts go down
    pub stair_count: Option<i64>,
    pub max_slope: Option<f64>,
    pub min_width: Option<f64>,
    pub signposted_as: Option<String>,
    pub reversed_signposted_as: Option<String>,
    pub row: u64,
}

impl Id for Pathway {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A level of a station. The same level can be shared by unlinked
/// stations.
#[derive(Debug, Clone, Default)]
pub struct Level {
    pub id: String,
    pub index: f64,
    pub name: Option<String>,
    pub row: u64,
}

impl Id for Level {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Credits the organizations behind parts of the feed.
#[derive(Debug, Clone, Default)]
pub struct Attribution {
    pub id: Option<String>,
    pub agency_id: Option<String>,
    pub route_id: Option<String>,
    pub trip_id: Option<String>,
    pub organization_name: String,
    pub is_producer: AttributionRole,
    pub is_operator: AttributionRole,
    pub is_authority: AttributionRole,
    pub url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub row: u64,
}

/// A translated value for a field of another table.
#[derive(Debug, Clone, Default)]
pub struct Translation {
    pub table_name: String,
    pub field_name: String,
    pub language: String,
    pub translation: String,
    pub record_id: Option<String>,
    pub record_sub_id: Option<String>,
    pub field_value: Option<String>,
    pub row: u64,
}
