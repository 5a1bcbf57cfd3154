//! Enumerated field values.
//!
//! Many GTFS columns are integers that actually enumerate a closed set
//! of values. Each gets a Rust enum with an `Unknown` escape variant so
//! an out-of-set code is preserved (and reported) instead of rejected.

/// Mapping between an integer cell value and its typed enum, shared by
/// every enumerated column so the builders can stay generic.
pub trait CodedEnum: Sized {
    fn from_code(code: i64) -> Self;
    /// True when the code was not part of the specification set
    fn is_unknown(&self) -> bool;
}

macro_rules! coded_enum {
    ($($name:ty),+ $(,)?) => {
        $(impl CodedEnum for $name {
            fn from_code(code: i64) -> Self {
                <$name>::from_code(code)
            }
            fn is_unknown(&self) -> bool {
                <$name>::is_unknown(self)
            }
        })+
    };
}

coded_enum!(
    LocationType,
    RouteType,
    PickupDropOffType,
    ContinuousPickupDropOff,
    TimepointType,
    Availability,
    Exception,
    DirectionType,
    BikesAllowedType,
    PaymentMethod,
    ExactTimes,
    Transfers,
    TransferType,
    PathwayMode,
    PathwayDirection,
    AttributionRole,
);

/// Describes the kind of a stop row. `location_type` in `stops.txt`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum LocationType {
    /// A location where passengers board or disembark from a transit
    /// vehicle; called a platform when it has a parent station
    #[default]
    StopOrPlatform,
    /// A physical structure or area that contains one or more platforms
    Station,
    /// A location where passengers can enter or exit a station from the
    /// street
    Entrance,
    /// A location within a station used to link pathways
    GenericNode,
    /// A specific location on a platform where passengers can board
    /// and/or alight
    BoardingArea,
    /// An out-of-specification value
    Unknown(i64),
}

impl LocationType {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => LocationType::StopOrPlatform,
            1 => LocationType::Station,
            2 => LocationType::Entrance,
            3 => LocationType::GenericNode,
            4 => LocationType::BoardingArea,
            other => LocationType::Unknown(other),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, LocationType::Unknown(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            LocationType::StopOrPlatform => "stop",
            LocationType::Station => "station",
            LocationType::Entrance => "entrance",
            LocationType::GenericNode => "generic node",
            LocationType::BoardingArea => "boarding area",
            LocationType::Unknown(_) => "unknown",
        }
    }
}

/// Describes the kind of transportation used on a route. Extended
/// route types are folded onto the base set by their hundreds digit.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RouteType {
    Tramway,
    Subway,
    Rail,
    #[default]
    Bus,
    Ferry,
    CableCar,
    Gondola,
    Funicular,
    Coach,
    Air,
    Taxi,
    Unknown(i64),
}

impl RouteType {
    pub fn from_code(code: i64) -> Self {
        let hundreds = code / 100;
        match (code, hundreds) {
            (0, _) | (_, 9) => RouteType::Tramway,
            (1, _) | (_, 4) => RouteType::Subway,
            (2, _) | (_, 1) => RouteType::Rail,
            (3, _) | (_, 7) | (_, 8) => RouteType::Bus,
            (4, _) | (_, 10) | (_, 12) => RouteType::Ferry,
            (5, _) => RouteType::CableCar,
            (6, _) | (_, 13) => RouteType::Gondola,
            (7, _) | (_, 14) => RouteType::Funicular,
            (_, 2) => RouteType::Coach,
            (_, 11) => RouteType::Air,
            (_, 15) => RouteType::Taxi,
            _ => RouteType::Unknown(code),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, RouteType::Unknown(_))
    }
}

/// Whether a traveller can board or alight at a stop time.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum PickupDropOffType {
    /// Regularly scheduled pickup or drop off (default when empty)
    #[default]
    Regular,
    NotAvailable,
    ArrangeByPhone,
    CoordinateWithDriver,
    Unknown(i64),
}

impl PickupDropOffType {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => PickupDropOffType::Regular,
            1 => PickupDropOffType::NotAvailable,
            2 => PickupDropOffType::ArrangeByPhone,
            3 => PickupDropOffType::CoordinateWithDriver,
            other => PickupDropOffType::Unknown(other),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, PickupDropOffType::Unknown(_))
    }
}

/// Whether a rider can board or alight anywhere along the travel path.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum ContinuousPickupDropOff {
    Continuous,
    /// No continuous stopping (default when empty)
    #[default]
    NotAvailable,
    ArrangeByPhone,
    CoordinateWithDriver,
    Unknown(i64),
}

impl ContinuousPickupDropOff {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => ContinuousPickupDropOff::Continuous,
            1 => ContinuousPickupDropOff::NotAvailable,
            2 => ContinuousPickupDropOff::ArrangeByPhone,
            3 => ContinuousPickupDropOff::CoordinateWithDriver,
            other => ContinuousPickupDropOff::Unknown(other),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ContinuousPickupDropOff::Unknown(_))
    }
}

/// Whether times at a stop are strictly adhered to or approximate.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum TimepointType {
    Approximate,
    #[default]
    Exact,
    Unknown(i64),
}

impl TimepointType {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => TimepointType::Approximate,
            1 => TimepointType::Exact,
            other => TimepointType::Unknown(other),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TimepointType::Unknown(_))
    }
}

/// Generic availability marker (wheelchair boarding/accessibility).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Availability {
    #[default]
    InformationNotAvailable,
    Available,
    NotAvailable,
    Unknown(i64),
}

impl Availability {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Availability::InformationNotAvailable,
            1 => Availability::Available,
            2 => Availability::NotAvailable,
            other => Availability::Unknown(other),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Availability::Unknown(_))
    }
}

/// Whether a calendar date adds or removes service for that day.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Exception {
    Added,
    Deleted,
    Unknown(i64),
}

impl Exception {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Exception::Added,
            2 => Exception::Deleted,
            other => Exception::Unknown(other),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Exception::Unknown(_))
    }
}

/// Direction of travel for a trip, display only.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DirectionType {
    Outbound,
    Inbound,
    Unknown(i64),
}

impl DirectionType {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => DirectionType::Outbound,
            1 => DirectionType::Inbound,
            other => DirectionType::Unknown(other),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, DirectionType::Unknown(_))
    }
}

/// Whether bikes are allowed on a trip.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum BikesAllowedType {
    #[default]
    NoBikeInfo,
    AtLeastOneBike,
    NoBikesAllowed,
    Unknown(i64),
}

impl BikesAllowedType {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => BikesAllowedType::NoBikeInfo,
            1 => BikesAllowedType::AtLeastOneBike,
            2 => BikesAllowedType::NoBikesAllowed,
            other => BikesAllowedType::Unknown(other),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, BikesAllowedType::Unknown(_))
    }
}

/// Where a fare can be paid.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
    Aboard,
    PreBoarding,
    Unknown(i64),
}

impl PaymentMethod {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => PaymentMethod::Aboard,
            1 => PaymentMethod::PreBoarding,
            other => PaymentMethod::Unknown(other),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, PaymentMethod::Unknown(_))
    }
}

/// Whether a frequency entry describes exact or purely headway-based
/// service.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum ExactTimes {
    #[default]
    FrequencyBased,
    ScheduleBased,
    Unknown(i64),
}

impl ExactTimes {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => ExactTimes::FrequencyBased,
            1 => ExactTimes::ScheduleBased,
            other => ExactTimes::Unknown(other),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ExactTimes::Unknown(_))
    }
}

/// How many transfers a fare permits. Absent means unlimited.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Transfers {
    #[default]
    Unlimited,
    NoTransfer,
    UniqueTransfer,
    TwoTransfers,
    Unknown(i64),
}

impl Transfers {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Transfers::NoTransfer,
            1 => Transfers::UniqueTransfer,
            2 => Transfers::TwoTransfers,
            other => Transfers::Unknown(other),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Transfers::Unknown(_))
    }
}

/// Kind of connection between two stops.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum TransferType {
    #[default]
    Recommended,
    Timed,
    MinTime,
    Impossible,
    Unknown(i64),
}

impl TransferType {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => TransferType::Recommended,
            1 => TransferType::Timed,
            2 => TransferType::MinTime,
            3 => TransferType::Impossible,
            other => TransferType::Unknown(other),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TransferType::Unknown(_))
    }
}

/// Kind of pathway between two locations of a station.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum PathwayMode {
    #[default]
    Walkway,
    Stairs,
    MovingSidewalk,
    Escalator,
    Elevator,
    /// Crosses into an area where proof of payment is required
    FareGate,
    /// Exits an area where proof of payment is required
    ExitGate,
    Unknown(i64),
}

impl PathwayMode {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => PathwayMode::Walkway,
            2 => PathwayMode::Stairs,
            3 => PathwayMode::MovingSidewalk,
            4 => PathwayMode::Escalator,
            5 => PathwayMode::Elevator,
            6 => PathwayMode::FareGate,
            7 => PathwayMode::ExitGate,
            other => PathwayMode::Unknown(other),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, PathwayMode::Unknown(_))
    }
}

/// Whether a pathway can be used in both directions.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum PathwayDirection {
    #[default]
    Unidirectional,
    Bidirectional,
    Unknown(i64),
}

impl PathwayDirection {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => PathwayDirection::Unidirectional,
            1 => PathwayDirection::Bidirectional,
            other => PathwayDirection::Unknown(other),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, PathwayDirection::Unknown(_))
    }
}

/// Yes/no flag on attribution roles.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum AttributionRole {
    #[default]
    No,
    Yes,
    Unknown(i64),
}

impl AttributionRole {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => AttributionRole::No,
            1 => AttributionRole::Yes,
            other => AttributionRole::Unknown(other),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, AttributionRole::Unknown(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extended_route_types_fold_to_base_kinds() {
        assert_eq!(RouteType::from_code(3), RouteType::Bus);
        assert_eq!(RouteType::from_code(700), RouteType::Bus);
        assert_eq!(RouteType::from_code(200), RouteType::Coach);
        assert_eq!(RouteType::from_code(1100), RouteType::Air);
        assert_eq!(RouteType::from_code(42), RouteType::Unknown(42));
    }

    #[test]
    fn out_of_set_codes_are_preserved() {
        assert_eq!(LocationType::from_code(9), LocationType::Unknown(9));
        assert!(LocationType::from_code(9).is_unknown());
        assert_eq!(Exception::from_code(3), Exception::Unknown(3));
        assert_eq!(PathwayMode::from_code(0), PathwayMode::Unknown(0));
    }
}
