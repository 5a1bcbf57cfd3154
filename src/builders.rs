//! Per-kind entity construction.
//!
//! The builder consumes a [ParsedEntity], applies required-field and
//! row-local cross-field rules, and yields a [BuildResult]: the typed
//! entity, or the full list of violations found on the row. It never
//! stops at the first problem; every defect of a row is surfaced in
//! one pass.

use crate::enums::CodedEnum;
use crate::fields::FieldValue;
use crate::notice::{Notice, NoticeContainer, Severity};
use crate::objects::*;
use crate::row_parser::ParsedEntity;

pub const MISSING_REQUIRED_FIELD: &str = "missing_required_field";
pub const UNEXPECTED_ENUM_VALUE: &str = "unexpected_enum_value";
pub const FORBIDDEN_FIELD_COMBINATION: &str = "forbidden_field_combination";
pub const MISSING_MIN_TRANSFER_TIME: &str = "missing_min_transfer_time";
pub const TIMEPOINT_WITHOUT_TIME: &str = "timepoint_without_time";
pub const ATTRIBUTION_WITHOUT_ROLE: &str = "attribution_without_role";

/// Outcome of building one entity.
///
/// Exactly one variant holds data: a `Built` value satisfies every
/// required-field and range constraint of its kind, a `Rejected` row
/// carries each violation that was found.
#[derive(Debug)]
pub enum BuildResult<E> {
    Built(E),
    Rejected(Vec<Notice>),
}

impl<E> BuildResult<E> {
    pub fn built(self) -> Option<E> {
        match self {
            BuildResult::Built(e) => Some(e),
            BuildResult::Rejected(_) => None,
        }
    }
}

/// Reusable construction state. One instance per worker task; `clear`
/// is called between rows so the violation buffer keeps its
/// allocation across the hot loop.
#[derive(Debug, Default)]
pub struct EntityBuilder {
    violations: Vec<Notice>,
}

impl EntityBuilder {
    pub fn new() -> Self {
        EntityBuilder::default()
    }

    pub fn clear(&mut self) {
        self.violations.clear();
    }

    fn violation(&mut self, notice: Notice) {
        self.violations.push(notice);
    }

    fn missing(&mut self, e: &ParsedEntity, field: &'static str) {
        self.violation(
            Notice::new(MISSING_REQUIRED_FIELD, Severity::Error)
                .field("filename", e.file_name)
                .field("csvRowNumber", e.row_number)
                .field("fieldName", field),
        );
    }

    fn finish<E>(&mut self, entity: E) -> BuildResult<E> {
        if self.violations.is_empty() {
            BuildResult::Built(entity)
        } else {
            BuildResult::Rejected(std::mem::take(&mut self.violations))
        }
    }

    // Typed getters. The `required_*` family records a violation when
    // the field is absent and lets the caller keep checking the rest
    // of the row.

    fn required_text(&mut self, e: &ParsedEntity, field: &'static str) -> Option<String> {
        match e.get(field).and_then(FieldValue::as_text) {
            Some(s) => Some(s.to_owned()),
            None => {
                self.missing(e, field);
                None
            }
        }
    }

    fn optional_text(&self, e: &ParsedEntity, field: &str) -> Option<String> {
        e.get(field).and_then(FieldValue::as_text).map(str::to_owned)
    }

    fn required_date(
        &mut self,
        e: &ParsedEntity,
        field: &'static str,
    ) -> Option<chrono::NaiveDate> {
        match e.get(field).and_then(FieldValue::as_date) {
            Some(d) => Some(d),
            None => {
                self.missing(e, field);
                None
            }
        }
    }

    fn optional_date(&self, e: &ParsedEntity, field: &str) -> Option<chrono::NaiveDate> {
        e.get(field).and_then(FieldValue::as_date)
    }

    fn required_time(&mut self, e: &ParsedEntity, field: &'static str) -> Option<u32> {
        match e.get(field).and_then(FieldValue::as_time) {
            Some(t) => Some(t),
            None => {
                self.missing(e, field);
                None
            }
        }
    }

    fn optional_time(&self, e: &ParsedEntity, field: &str) -> Option<u32> {
        e.get(field).and_then(FieldValue::as_time)
    }

    fn required_float(&mut self, e: &ParsedEntity, field: &'static str) -> Option<f64> {
        match e.get(field).and_then(FieldValue::as_float) {
            Some(f) => Some(f),
            None => {
                self.missing(e, field);
                None
            }
        }
    }

    fn optional_float(&self, e: &ParsedEntity, field: &str) -> Option<f64> {
        e.get(field).and_then(FieldValue::as_float)
    }

    fn required_u32(&mut self, e: &ParsedEntity, field: &'static str) -> Option<u32> {
        match e.get(field).and_then(FieldValue::as_integer) {
            Some(i) => Some(i as u32),
            None => {
                self.missing(e, field);
                None
            }
        }
    }

    fn optional_u32(&self, e: &ParsedEntity, field: &str) -> Option<u32> {
        e.get(field).and_then(FieldValue::as_integer).map(|i| i as u32)
    }

    fn optional_integer(&self, e: &ParsedEntity, field: &str) -> Option<i64> {
        e.get(field).and_then(FieldValue::as_integer)
    }

    fn optional_color(&self, e: &ParsedEntity, field: &str) -> Option<rgb::RGB8> {
        e.get(field).and_then(FieldValue::as_color)
    }

    /// An enumerated field with a default for the empty cell. An
    /// out-of-set code is preserved as the `Unknown` variant and
    /// reported, but does not reject the row.
    fn optional_enum<T: CodedEnum + Default>(
        &self,
        e: &ParsedEntity,
        field: &'static str,
        notices: &mut NoticeContainer,
    ) -> T {
        match e.get(field).and_then(FieldValue::as_enum_code) {
            None => T::default(),
            Some(code) => self.checked_enum(e, field, code, notices),
        }
    }

    fn required_enum<T: CodedEnum>(
        &mut self,
        e: &ParsedEntity,
        field: &'static str,
        notices: &mut NoticeContainer,
    ) -> Option<T> {
        match e.get(field).and_then(FieldValue::as_enum_code) {
            None => {
                self.missing(e, field);
                None
            }
            Some(code) => Some(self.checked_enum(e, field, code, notices)),
        }
    }

    fn checked_enum<T: CodedEnum>(
        &self,
        e: &ParsedEntity,
        field: &'static str,
        code: i64,
        notices: &mut NoticeContainer,
    ) -> T {
        let value = T::from_code(code);
        if value.is_unknown() {
            notices.push(
                Notice::new(UNEXPECTED_ENUM_VALUE, Severity::Warning)
                    .field("filename", e.file_name)
                    .field("csvRowNumber", e.row_number)
                    .field("fieldName", field)
                    .field("fieldValue", code),
            );
        }
        value
    }

    /// A required 0/1 flag. Any other code is a violation.
    fn required_bool(&mut self, e: &ParsedEntity, field: &'static str) -> Option<bool> {
        match e.get(field).and_then(FieldValue::as_enum_code) {
            Some(0) => Some(false),
            Some(1) => Some(true),
            Some(code) => {
                self.violation(
                    Notice::new(UNEXPECTED_ENUM_VALUE, Severity::Error)
                        .field("filename", e.file_name)
                        .field("csvRowNumber", e.row_number)
                        .field("fieldName", field)
                        .field("fieldValue", code),
                );
                None
            }
            None => {
                self.missing(e, field);
                None
            }
        }
    }

    // One build function per entity kind.

    pub fn build_agency(
        &mut self,
        e: &ParsedEntity,
        _notices: &mut NoticeContainer,
    ) -> BuildResult<Agency> {
        self.clear();
        let name = self.required_text(e, "agency_name");
        let url = self.required_text(e, "agency_url");
        let timezone = self.required_text(e, "agency_timezone");
        let agency = Agency {
            id: self.optional_text(e, "agency_id"),
            name: name.unwrap_or_default(),
            url: url.unwrap_or_default(),
            timezone: timezone.unwrap_or_default(),
            lang: self.optional_text(e, "agency_lang"),
            phone: self.optional_text(e, "agency_phone"),
            fare_url: self.optional_text(e, "agency_fare_url"),
            email: self.optional_text(e, "agency_email"),
            row: e.row_number,
        };
        self.finish(agency)
    }

    pub fn build_stop(
        &mut self,
        e: &ParsedEntity,
        notices: &mut NoticeContainer,
    ) -> BuildResult<Stop> {
        self.clear();
        let id = self.required_text(e, "stop_id");
        // An out-of-set location_type falls back to a plain stop, the
        // same fallback the code 0 default gives.
        let location_type: LocationType = self.optional_enum(e, "location_type", notices);
        let location_type = match location_type {
            LocationType::Unknown(_) => LocationType::StopOrPlatform,
            other => other,
        };

        let needs_name_and_position = matches!(
            location_type,
            LocationType::StopOrPlatform | LocationType::Station | LocationType::Entrance
        );
        let name = self.optional_text(e, "stop_name");
        let latitude = self.optional_float(e, "stop_lat");
        let longitude = self.optional_float(e, "stop_lon");
        if needs_name_and_position {
            if name.is_none() {
                self.missing(e, "stop_name");
            }
            if latitude.is_none() {
                self.missing(e, "stop_lat");
            }
            if longitude.is_none() {
                self.missing(e, "stop_lon");
            }
        }

        let parent_station = self.optional_text(e, "parent_station");
        let parent_required = matches!(
            location_type,
            LocationType::Entrance | LocationType::GenericNode | LocationType::BoardingArea
        );
        if parent_required && parent_station.is_none() {
            self.missing(e, "parent_station");
        }

        let fields = LocationFields {
            id: id.unwrap_or_default(),
            code: self.optional_text(e, "stop_code"),
            name,
            description: self.optional_text(e, "stop_desc"),
            latitude,
            longitude,
            zone_id: self.optional_text(e, "zone_id"),
            url: self.optional_text(e, "stop_url"),
            parent_station,
            timezone: self.optional_text(e, "stop_timezone"),
            wheelchair_boarding: self.optional_enum(e, "wheelchair_boarding", notices),
            level_id: self.optional_text(e, "level_id"),
            platform_code: self.optional_text(e, "platform_code"),
            row: e.row_number,
        };
        let stop = match location_type {
            LocationType::Station => Stop::Station(fields),
            LocationType::Entrance => Stop::Entrance(fields),
            LocationType::GenericNode => Stop::GenericNode(fields),
            LocationType::BoardingArea => Stop::BoardingArea(fields),
            _ => Stop::StopOrPlatform(fields),
        };
        self.finish(stop)
    }

    pub fn build_route(
        &mut self,
        e: &ParsedEntity,
        notices: &mut NoticeContainer,
    ) -> BuildResult<Route> {
        self.clear();
        let id = self.required_text(e, "route_id");
        let route_type: Option<RouteType> = self.required_enum(e, "route_type", notices);
        let route = Route {
            id: id.unwrap_or_default(),
            agency_id: self.optional_text(e, "agency_id"),
            short_name: self.optional_text(e, "route_short_name"),
            long_name: self.optional_text(e, "route_long_name"),
            description: self.optional_text(e, "route_desc"),
            route_type: route_type.unwrap_or_default(),
            url: self.optional_text(e, "route_url"),
            color: self.optional_color(e, "route_color"),
            text_color: self.optional_color(e, "route_text_color"),
            sort_order: self.optional_u32(e, "route_sort_order"),
            continuous_pickup: self.optional_enum(e, "continuous_pickup", notices),
            continuous_drop_off: self.optional_enum(e, "continuous_drop_off", notices),
            row: e.row_number,
        };
        self.finish(route)
    }

    pub fn build_trip(
        &mut self,
        e: &ParsedEntity,
        notices: &mut NoticeContainer,
    ) -> BuildResult<Trip> {
        self.clear();
        let id = self.required_text(e, "trip_id");
        let route_id = self.required_text(e, "route_id");
        let service_id = self.required_text(e, "service_id");
        let direction = e
            .get("direction_id")
            .and_then(FieldValue::as_enum_code)
            .map(|code| self.checked_enum(e, "direction_id", code, notices));
        let trip = Trip {
            id: id.unwrap_or_default(),
            route_id: route_id.unwrap_or_default(),
            service_id: service_id.unwrap_or_default(),
            headsign: self.optional_text(e, "trip_headsign"),
            short_name: self.optional_text(e, "trip_short_name"),
            direction,
            block_id: self.optional_text(e, "block_id"),
            shape_id: self.optional_text(e, "shape_id"),
            wheelchair_accessible: self.optional_enum(e, "wheelchair_accessible", notices),
            bikes_allowed: self.optional_enum(e, "bikes_allowed", notices),
            row: e.row_number,
        };
        self.finish(trip)
    }

    pub fn build_stop_time(
        &mut self,
        e: &ParsedEntity,
        notices: &mut NoticeContainer,
    ) -> BuildResult<StopTime> {
        self.clear();
        let trip_id = self.required_text(e, "trip_id");
        let stop_sequence = self.required_u32(e, "stop_sequence");
        let stop_id = self.optional_text(e, "stop_id");
        let location_group_id = self.optional_text(e, "location_group_id");
        let location_id = self.optional_text(e, "location_id");

        // A stop time serves exactly one location reference.
        let references = [&stop_id, &location_group_id, &location_id]
            .iter()
            .filter(|r| r.is_some())
            .count();
        if references == 0 {
            self.missing(e, "stop_id");
        } else if references > 1 {
            self.violation(
                Notice::new(FORBIDDEN_FIELD_COMBINATION, Severity::Error)
                    .field("filename", e.file_name)
                    .field("csvRowNumber", e.row_number)
                    .field(
                        "fieldNames",
                        "stop_id, location_group_id, location_id",
                    ),
            );
        }

        let arrival_time = self.optional_time(e, "arrival_time");
        let departure_time = self.optional_time(e, "departure_time");
        let timepoint: TimepointType = self.optional_enum(e, "timepoint", notices);
        if e.has("timepoint")
            && timepoint == TimepointType::Exact
            && (arrival_time.is_none() || departure_time.is_none())
        {
            notices.push(
                Notice::new(TIMEPOINT_WITHOUT_TIME, Severity::Warning)
                    .field("filename", e.file_name)
                    .field("csvRowNumber", e.row_number),
            );
        }

        let stop_time = StopTime {
            trip_id: trip_id.unwrap_or_default(),
            arrival_time,
            departure_time,
            stop_id,
            location_group_id,
            location_id,
            stop_sequence: stop_sequence.unwrap_or_default(),
            headsign: self.optional_text(e, "stop_headsign"),
            pickup_type: self.optional_enum(e, "pickup_type", notices),
            drop_off_type: self.optional_enum(e, "drop_off_type", notices),
            continuous_pickup: self.optional_enum(e, "continuous_pickup", notices),
            continuous_drop_off: self.optional_enum(e, "continuous_drop_off", notices),
            shape_dist_traveled: self.optional_float(e, "shape_dist_traveled"),
            timepoint,
            row: e.row_number,
        };
        self.finish(stop_time)
    }

    pub fn build_calendar(
        &mut self,
        e: &ParsedEntity,
        _notices: &mut NoticeContainer,
    ) -> BuildResult<Calendar> {
        self.clear();
        let service_id = self.required_text(e, "service_id");
        let monday = self.required_bool(e, "monday");
        let tuesday = self.required_bool(e, "tuesday");
        let wednesday = self.required_bool(e, "wednesday");
        let thursday = self.required_bool(e, "thursday");
        let friday = self.required_bool(e, "friday");
        let saturday = self.required_bool(e, "saturday");
        let sunday = self.required_bool(e, "sunday");
        let start_date = self.required_date(e, "start_date");
        let end_date = self.required_date(e, "end_date");
        let calendar = Calendar {
            service_id: service_id.unwrap_or_default(),
            monday: monday.unwrap_or_default(),
            tuesday: tuesday.unwrap_or_default(),
            wednesday: wednesday.unwrap_or_default(),
            thursday: thursday.unwrap_or_default(),
            friday: friday.unwrap_or_default(),
            saturday: saturday.unwrap_or_default(),
            sunday: sunday.unwrap_or_default(),
            start_date: start_date.unwrap_or_default(),
            end_date: end_date.unwrap_or_default(),
            row: e.row_number,
        };
        self.finish(calendar)
    }

    pub fn build_calendar_date(
        &mut self,
        e: &ParsedEntity,
        notices: &mut NoticeContainer,
    ) -> BuildResult<CalendarDate> {
        self.clear();
        let service_id = self.required_text(e, "service_id");
        let date = self.required_date(e, "date");
        let exception: Option<Exception> = self.required_enum(e, "exception_type", notices);
        let calendar_date = CalendarDate {
            service_id: service_id.unwrap_or_default(),
            date: date.unwrap_or_default(),
            exception: exception.unwrap_or(Exception::Added),
            row: e.row_number,
        };
        self.finish(calendar_date)
    }

    pub fn build_shape_point(
        &mut self,
        e: &ParsedEntity,
        _notices: &mut NoticeContainer,
    ) -> BuildResult<ShapePoint> {
        self.clear();
        let shape_id = self.required_text(e, "shape_id");
        let latitude = self.required_float(e, "shape_pt_lat");
        let longitude = self.required_float(e, "shape_pt_lon");
        let sequence = self.required_u32(e, "shape_pt_sequence");
        let point = ShapePoint {
            shape_id: shape_id.unwrap_or_default(),
            latitude: latitude.unwrap_or_default(),
            longitude: longitude.unwrap_or_default(),
            sequence: sequence.unwrap_or_default(),
            dist_traveled: self.optional_float(e, "shape_dist_traveled"),
            row: e.row_number,
        };
        self.finish(point)
    }

    pub fn build_frequency(
        &mut self,
        e: &ParsedEntity,
        notices: &mut NoticeContainer,
    ) -> BuildResult<Frequency> {
        self.clear();
        let trip_id = self.required_text(e, "trip_id");
        let start_time = self.required_time(e, "start_time");
        let end_time = self.required_time(e, "end_time");
        let headway_secs = self.required_u32(e, "headway_secs");
        let frequency = Frequency {
            trip_id: trip_id.unwrap_or_default(),
            start_time: start_time.unwrap_or_default(),
            end_time: end_time.unwrap_or_default(),
            headway_secs: headway_secs.unwrap_or_default(),
            exact_times: self.optional_enum(e, "exact_times", notices),
            row: e.row_number,
        };
        self.finish(frequency)
    }

    pub fn build_transfer(
        &mut self,
        e: &ParsedEntity,
        notices: &mut NoticeContainer,
    ) -> BuildResult<Transfer> {
        self.clear();
        let from_stop_id = self.required_text(e, "from_stop_id");
        let to_stop_id = self.required_text(e, "to_stop_id");
        let transfer_type: Option<TransferType> = self.required_enum(e, "transfer_type", notices);
        let min_transfer_time = self.optional_u32(e, "min_transfer_time");
        if transfer_type == Some(TransferType::MinTime) && min_transfer_time.is_none() {
            notices.push(
                Notice::new(MISSING_MIN_TRANSFER_TIME, Severity::Warning)
                    .field("filename", e.file_name)
                    .field("csvRowNumber", e.row_number),
            );
        }
        let transfer = Transfer {
            from_stop_id: from_stop_id.unwrap_or_default(),
            to_stop_id: to_stop_id.unwrap_or_default(),
            transfer_type: transfer_type.unwrap_or_default(),
            min_transfer_time,
            row: e.row_number,
        };
        self.finish(transfer)
    }

    pub fn build_fare_attribute(
        &mut self,
        e: &ParsedEntity,
        notices: &mut NoticeContainer,
    ) -> BuildResult<FareAttribute> {
        self.clear();
        let id = self.required_text(e, "fare_id");
        let price = self.required_float(e, "price");
        let currency = self.required_text(e, "currency_type");
        let payment_method: Option<PaymentMethod> =
            self.required_enum(e, "payment_method", notices);
        // absent transfers means unlimited, not zero
        let transfers = match e.get("transfers").and_then(FieldValue::as_enum_code) {
            None => Transfers::Unlimited,
            Some(code) => self.checked_enum(e, "transfers", code, notices),
        };
        let fare = FareAttribute {
            id: id.unwrap_or_default(),
            price: price.unwrap_or_default(),
            currency: currency.unwrap_or_default(),
            payment_method,
            transfers,
            agency_id: self.optional_text(e, "agency_id"),
            transfer_duration: self.optional_u32(e, "transfer_duration"),
            row: e.row_number,
        };
        self.finish(fare)
    }

    pub fn build_fare_rule(
        &mut self,
        e: &ParsedEntity,
        _notices: &mut NoticeContainer,
    ) -> BuildResult<FareRule> {
        self.clear();
        let fare_id = self.required_text(e, "fare_id");
        let rule = FareRule {
            fare_id: fare_id.unwrap_or_default(),
            route_id: self.optional_text(e, "route_id"),
            origin_id: self.optional_text(e, "origin_id"),
            destination_id: self.optional_text(e, "destination_id"),
            contains_id: self.optional_text(e, "contains_id"),
            row: e.row_number,
        };
        self.finish(rule)
    }

    pub fn build_feed_info(
        &mut self,
        e: &ParsedEntity,
        _notices: &mut NoticeContainer,
    ) -> BuildResult<FeedInfo> {
        self.clear();
        let publisher_name = self.required_text(e, "feed_publisher_name");
        let publisher_url = self.required_text(e, "feed_publisher_url");
        let lang = self.required_text(e, "feed_lang");
        let info = FeedInfo {
            publisher_name: publisher_name.unwrap_or_default(),
            publisher_url: publisher_url.unwrap_or_default(),
            lang: lang.unwrap_or_default(),
            default_lang: self.optional_text(e, "default_lang"),
            start_date: self.optional_date(e, "feed_start_date"),
            end_date: self.optional_date(e, "feed_end_date"),
            version: self.optional_text(e, "feed_version"),
            contact_email: self.optional_text(e, "feed_contact_email"),
            contact_url: self.optional_text(e, "feed_contact_url"),
            row: e.row_number,
        };
        self.finish(info)
    }

    pub fn build_pathway(
        &mut self,
        e: &ParsedEntity,
        notices: &mut NoticeContainer,
    ) -> BuildResult<Pathway> {
        self.clear();
        let id = self.required_text(e, "pathway_id");
        let from_stop_id = self.required_text(e, "from_stop_id");
        let to_stop_id = self.required_text(e, "to_stop_id");
        let mode: Option<PathwayMode> = self.required_enum(e, "pathway_mode", notices);
        let is_bidirectional: Option<PathwayDirection> =
            self.required_enum(e, "is_bidirectional", notices);
        let pathway = Pathway {
            id: id.unwrap_or_default(),
            from_stop_id: from_stop_id.unwrap_or_default(),
            to_stop_id: to_stop_id.unwrap_or_default(),
            mode: mode.unwrap_or_default(),
            is_bidirectional: is_bidirectional.unwrap_or_default(),
            length: self.optional_float(e, "length"),
            traversal_time: self.optional_u32(e, "traversal_time"),
            stair_count: self.optional_integer(e, "stair_count"),
            max_slope: self.optional_float(e, "max_slope"),
            min_width: self.optional_float(e, "min_width"),
            signposted_as: self.optional_text(e, "signposted_as"),
            reversed_signposted_as: self.optional_text(e, "reversed_signposted_as"),
            row: e.row_number,
        };
        self.finish(pathway)
    }

    pub fn build_level(
        &mut self,
        e: &ParsedEntity,
        _notices: &mut NoticeContainer,
    ) -> BuildResult<Level> {
        self.clear();
        let id = self.required_text(e, "level_id");
        let index = self.required_float(e, "level_index");
        let level = Level {
            id: id.unwrap_or_default(),
            index: index.unwrap_or_default(),
            name: self.optional_text(e, "level_name"),
            row: e.row_number,
        };
        self.finish(level)
    }

    pub fn build_attribution(
        &mut self,
        e: &ParsedEntity,
        notices: &mut NoticeContainer,
    ) -> BuildResult<Attribution> {
        self.clear();
        let organization_name = self.required_text(e, "organization_name");
        let is_producer: AttributionRole = self.optional_enum(e, "is_producer", notices);
        let is_operator: AttributionRole = self.optional_enum(e, "is_operator", notices);
        let is_authority: AttributionRole = self.optional_enum(e, "is_authority", notices);
        if is_producer != AttributionRole::Yes
            && is_operator != AttributionRole::Yes
            && is_authority != AttributionRole::Yes
        {
            // The entity is still usable, so this does not reject.
            notices.push(
                Notice::new(ATTRIBUTION_WITHOUT_ROLE, Severity::Error)
                    .field("filename", e.file_name)
                    .field("csvRowNumber", e.row_number),
            );
        }
        let attribution = Attribution {
            id: self.optional_text(e, "attribution_id"),
            agency_id: self.optional_text(e, "agency_id"),
            route_id: self.optional_text(e, "route_id"),
            trip_id: self.optional_text(e, "trip_id"),
            organization_name: organization_name.unwrap_or_default(),
            is_producer,
            is_operator,
            is_authority,
            url: self.optional_text(e, "attribution_url"),
            email: self.optional_text(e, "attribution_email"),
            phone: self.optional_text(e, "attribution_phone"),
            row: e.row_number,
        };
        self.finish(attribution)
    }

    pub fn build_translation(
        &mut self,
        e: &ParsedEntity,
        _notices: &mut NoticeContainer,
    ) -> BuildResult<Translation> {
        self.clear();
        let table_name = self.required_text(e, "table_name");
        let field_name = self.required_text(e, "field_name");
        let language = self.required_text(e, "language");
        let translation = self.required_text(e, "translation");
        let record_id = self.optional_text(e, "record_id");
        let field_value = self.optional_text(e, "field_value");

        // Rows are matched either by record id or by field value, never
        // both; feed_info rows need neither.
        let targets_feed_info = table_name.as_deref() == Some("feed_info");
        if record_id.is_some() && field_value.is_some() {
            self.violation(
                Notice::new(FORBIDDEN_FIELD_COMBINATION, Severity::Error)
                    .field("filename", e.file_name)
                    .field("csvRowNumber", e.row_number)
                    .field("fieldNames", "record_id, field_value"),
            );
        } else if !targets_feed_info && record_id.is_none() && field_value.is_none() {
            self.missing(e, "record_id");
        }

        let translation = Translation {
            table_name: table_name.unwrap_or_default(),
            field_name: field_name.unwrap_or_default(),
            language: language.unwrap_or_default(),
            translation: translation.unwrap_or_default(),
            record_id,
            record_sub_id: self.optional_text(e, "record_sub_id"),
            field_value,
            row: e.row_number,
        };
        self.finish(translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeContainer;
    use crate::row_parser::{RawRow, RowParser};
    use crate::schema;

    fn parse(
        file: &str,
        header: &[&str],
        values: &[&str],
        row_number: u64,
        notices: &mut NoticeContainer,
    ) -> ParsedEntity {
        let schema = schema::schema_for(file).unwrap();
        let header: Vec<String> = header.iter().map(|s| s.to_string()).collect();
        let parser = RowParser::new(schema, &header, notices);
        parser.parse(
            &RawRow::new(values.iter().map(|s| s.to_string()).collect(), row_number),
            notices,
        )
    }

    #[test]
    fn well_formed_row_round_trips() {
        let mut notices = NoticeContainer::default();
        let parsed = parse(
            schema::TRIPS_FILE,
            &["route_id", "service_id", "trip_id", "block_id", "direction_id"],
            &["r1", "weekday", "t1", "b1", "0"],
            2,
            &mut notices,
        );
        let mut builder = EntityBuilder::new();
        let trip = builder
            .build_trip(&parsed, &mut notices)
            .built()
            .expect("trip should build");
        assert_eq!(trip.id, "t1");
        assert_eq!(trip.route_id, "r1");
        assert_eq!(trip.service_id, "weekday");
        assert_eq!(trip.block_id.as_deref(), Some("b1"));
        assert_eq!(trip.direction, Some(DirectionType::Outbound));
        assert_eq!(notices.total(), 0);
    }

    #[test]
    fn every_violation_is_reported_in_one_pass() {
        let mut notices = NoticeContainer::default();
        // trip_id and service_id both absent
        let parsed = parse(
            schema::TRIPS_FILE,
            &["route_id", "service_id", "trip_id"],
            &["r1", "", ""],
            3,
            &mut notices,
        );
        let mut builder = EntityBuilder::new();
        match builder.build_trip(&parsed, &mut notices) {
            BuildResult::Rejected(violations) => {
                assert_eq!(violations.len(), 2);
                assert!(violations
                    .iter()
                    .all(|n| n.code == MISSING_REQUIRED_FIELD));
            }
            BuildResult::Built(_) => panic!("trip with missing ids must be rejected"),
        }
    }

    #[test]
    fn stop_requiredness_follows_location_type() {
        let mut notices = NoticeContainer::default();
        let header = &["stop_id", "stop_name", "stop_lat", "stop_lon", "location_type", "parent_station"];
        let mut builder = EntityBuilder::new();

        // generic node without coordinates but with a parent: fine
        let parsed = parse(
            schema::STOPS_FILE,
            header,
            &["n1", "", "", "", "3", "station1"],
            2,
            &mut notices,
        );
        assert!(builder.build_stop(&parsed, &mut notices).built().is_some());

        // plain stop missing coordinates: rejected
        let parsed = parse(
            schema::STOPS_FILE,
            header,
            &["s1", "Central", "", "", "0", ""],
            3,
            &mut notices,
        );
        match builder.build_stop(&parsed, &mut notices) {
            BuildResult::Rejected(violations) => assert_eq!(violations.len(), 2),
            BuildResult::Built(_) => panic!("stop without coordinates must be rejected"),
        }

        // boarding area without a parent: rejected
        let parsed = parse(
            schema::STOPS_FILE,
            header,
            &["b1", "", "", "", "4", ""],
            4,
            &mut notices,
        );
        match builder.build_stop(&parsed, &mut notices) {
            BuildResult::Rejected(violations) => {
                assert!(violations.iter().any(|n| n.context["fieldName"] == "parent_station"));
            }
            BuildResult::Built(_) => panic!("boarding area without parent must be rejected"),
        }
    }

    #[test]
    fn stop_time_needs_exactly_one_location_reference() {
        let mut notices = NoticeContainer::default();
        let header = &["trip_id", "stop_sequence", "stop_id", "location_id"];
        let mut builder = EntityBuilder::new();

        let parsed = parse(
            schema::STOP_TIMES_FILE,
            header,
            &["t1", "1", "s1", "loc1"],
            2,
            &mut notices,
        );
        match builder.build_stop_time(&parsed, &mut notices) {
            BuildResult::Rejected(violations) => {
                assert!(violations
                    .iter()
                    .any(|n| n.code == FORBIDDEN_FIELD_COMBINATION));
            }
            BuildResult::Built(_) => panic!("two location references must be rejected"),
        }

        let parsed = parse(
            schema::STOP_TIMES_FILE,
            header,
            &["t1", "1", "s1", ""],
            3,
            &mut notices,
        );
        assert!(builder
            .build_stop_time(&parsed, &mut notices)
            .built()
            .is_some());
    }

    #[test]
    fn unknown_enum_code_warns_but_builds() {
        let mut notices = NoticeContainer::default();
        let parsed = parse(
            schema::TRIPS_FILE,
            &["route_id", "service_id", "trip_id", "bikes_allowed"],
            &["r1", "s1", "t1", "7"],
            2,
            &mut notices,
        );
        let mut builder = EntityBuilder::new();
        let trip = builder
            .build_trip(&parsed, &mut notices)
            .built()
            .expect("unknown enum must not reject");
        assert_eq!(trip.bikes_allowed, BikesAllowedType::Unknown(7));
        assert_eq!(notices.count_of(UNEXPECTED_ENUM_VALUE), 1);
    }

    #[test]
    fn calendar_flags_must_be_binary() {
        let mut notices = NoticeContainer::default();
        let header = &[
            "service_id", "monday", "tuesday", "wednesday", "thursday", "friday",
            "saturday", "sunday", "start_date", "end_date",
        ];
        let parsed = parse(
            schema::CALENDAR_FILE,
            header,
            &["s1", "1", "1", "1", "1", "1", "0", "2", "20240101", "20241231"],
            2,
            &mut notices,
        );
        let mut builder = EntityBuilder::new();
        match builder.build_calendar(&parsed, &mut notices) {
            BuildResult::Rejected(violations) => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].code, UNEXPECTED_ENUM_VALUE);
            }
            BuildResult::Built(_) => panic!("sunday=2 must be rejected"),
        }
    }
}
