//! In-memory store of built entities, indexed by each kind's declared
//! key.
//!
//! Insertion is first-seen-wins: a second entity under the same key is
//! rejected and handed back so the caller can emit a duplicate notice
//! pointing at both rows. Once a file's pass is over the store is only
//! ever read; the cross validators get ordered and grouped views here
//! instead of re-sorting on every rule.

use crate::objects::*;
use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::collections::BTreeMap;

type FareRuleKey = (
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);
type TranslationKey = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
);

/// All entities of one feed, keyed and grouped for cross validation.
#[derive(Debug, Default)]
pub struct FeedRepository {
    agencies: Vec<Agency>,
    agencies_by_id: FxHashMap<String, usize>,
    stops: FxHashMap<String, Stop>,
    routes: FxHashMap<String, Route>,
    trips: FxHashMap<String, Trip>,
    trips_by_block: FxHashMap<String, Vec<String>>,
    stop_times: FxHashMap<String, BTreeMap<u32, StopTime>>,
    calendars: FxHashMap<String, Calendar>,
    calendar_dates: FxHashMap<String, BTreeMap<NaiveDate, CalendarDate>>,
    shape_points: FxHashMap<String, BTreeMap<u32, ShapePoint>>,
    frequencies: FxHashMap<String, BTreeMap<u32, Frequency>>,
    transfers: FxHashMap<(String, String), Transfer>,
    fare_attributes: FxHashMap<String, FareAttribute>,
    fare_rules: FxHashMap<FareRuleKey, FareRule>,
    feed_info: Option<FeedInfo>,
    pathways: FxHashMap<String, Pathway>,
    levels: FxHashMap<String, Level>,
    attributions: Vec<Attribution>,
    attributions_by_id: FxHashMap<String, usize>,
    translations: FxHashMap<TranslationKey, Translation>,
}

impl FeedRepository {
    pub fn new() -> Self {
        FeedRepository::default()
    }

    // Insertions. Each returns the previously stored entity when the
    // key is already taken; the new entity is dropped in that case.

    pub fn insert_agency(&mut self, agency: Agency) -> Option<&Agency> {
        if let Some(id) = agency.id.clone() {
            match self.agencies_by_id.entry(id) {
                Entry::Occupied(o) => return Some(&self.agencies[*o.get()]),
                Entry::Vacant(v) => {
                    v.insert(self.agencies.len());
                }
            }
        }
        self.agencies.push(agency);
        None
    }

    pub fn insert_stop(&mut self, stop: Stop) -> Option<&Stop> {
        match self.stops.entry(stop.fields().id.clone()) {
            Entry::Occupied(o) => Some(o.into_mut()),
            Entry::Vacant(v) => {
                v.insert(stop);
                None
            }
        }
    }

    pub fn insert_route(&mut self, route: Route) -> Option<&Route> {
        match self.routes.entry(route.id.clone()) {
            Entry::Occupied(o) => Some(o.into_mut()),
            Entry::Vacant(v) => {
                v.insert(route);
                None
            }
        }
    }

    pub fn insert_trip(&mut self, trip: Trip) -> Option<&Trip> {
        match self.trips.entry(trip.id.clone()) {
            Entry::Occupied(o) => Some(o.into_mut()),
            Entry::Vacant(v) => {
                if let Some(block_id) = &trip.block_id {
                    self.trips_by_block
                        .entry(block_id.clone())
                        .or_default()
                        .push(trip.id.clone());
                }
                v.insert(trip);
                None
            }
        }
    }

    pub fn insert_stop_time(&mut self, stop_time: StopTime) -> Option<&StopTime> {
        let by_sequence = self.stop_times.entry(stop_time.trip_id.clone()).or_default();
        match by_sequence.entry(stop_time.stop_sequence) {
            std::collections::btree_map::Entry::Occupied(o) => Some(o.into_mut()),
            std::collections::btree_map::Entry::Vacant(v) => {
                v.insert(stop_time);
                None
            }
        }
    }

    pub fn insert_calendar(&mut self, calendar: Calendar) -> Option<&Calendar> {
        match self.calendars.entry(calendar.service_id.clone()) {
            Entry::Occupied(o) => Some(o.into_mut()),
            Entry::Vacant(v) => {
                v.insert(calendar);
                None
            }
        }
    }

    pub fn insert_calendar_date(&mut self, date: CalendarDate) -> Option<&CalendarDate> {
        let by_date = self.calendar_dates.entry(date.service_id.clone()).or_default();
        match by_date.entry(date.date) {
            std::collections::btree_map::Entry::Occupied(o) => Some(o.into_mut()),
            std::collections::btree_map::Entry::Vacant(v) => {
                v.insert(date);
                None
            }
        }
    }

    pub fn insert_shape_point(&mut self, point: ShapePoint) -> Option<&ShapePoint> {
        let by_sequence = self.shape_points.entry(point.shape_id.clone()).or_default();
        match by_sequence.entry(point.sequence) {
            std::collections::btree_map::Entry::Occupied(o) => Some(o.into_mut()),
            std::collections::btree_map::Entry::Vacant(v) => {
                v.insert(point);
                None
            }
        }
    }

    pub fn insert_frequency(&mut self, frequency: Frequency) -> Option<&Frequency> {
        let by_start = self.frequencies.entry(frequency.trip_id.clone()).or_default();
        match by_start.entry(frequency.start_time) {
            std::collections::btree_map::Entry::Occupied(o) => Some(o.into_mut()),
            std::collections::btree_map::Entry::Vacant(v) => {
                v.insert(frequency);
                None
            }
        }
    }

    pub fn insert_transfer(&mut self, transfer: Transfer) -> Option<&Transfer> {
        let key = (transfer.from_stop_id.clone(), transfer.to_stop_id.clone());
        match self.transfers.entry(key) {
            Entry::Occupied(o) => Some(o.into_mut()),
            Entry::Vacant(v) => {
                v.insert(transfer);
                None
            }
        }
    }

    pub fn insert_fare_attribute(&mut self, fare: FareAttribute) -> Option<&FareAttribute> {
        match self.fare_attributes.entry(fare.id.clone()) {
            Entry::Occupied(o) => Some(o.into_mut()),
            Entry::Vacant(v) => {
                v.insert(fare);
                None
            }
        }
    }

    pub fn insert_fare_rule(&mut self, rule: FareRule) -> Option<&FareRule> {
        let key = (
            rule.fare_id.clone(),
            rule.route_id.clone(),
            rule.origin_id.clone(),
            rule.destination_id.clone(),
            rule.contains_id.clone(),
        );
        match self.fare_rules.entry(key) {
            Entry::Occupied(o) => Some(o.into_mut()),
            Entry::Vacant(v) => {
                v.insert(rule);
                None
            }
        }
    }

    pub fn insert_feed_info(&mut self, info: FeedInfo) -> Option<&FeedInfo> {
        if self.feed_info.is_some() {
            return self.feed_info.as_ref();
        }
        self.feed_info = Some(info);
        None
    }

    pub fn insert_pathway(&mut self, pathway: Pathway) -> Option<&Pathway> {
        match self.pathways.entry(pathway.id.clone()) {
            Entry::Occupied(o) => Some(o.into_mut()),
            Entry::Vacant(v) => {
                v.insert(pathway);
                None
            }
        }
    }

    pub fn insert_level(&mut self, level: Level) -> Option<&Level> {
        match self.levels.entry(level.id.clone()) {
            Entry::Occupied(o) => Some(o.into_mut()),
            Entry::Vacant(v) => {
                v.insert(level);
                None
            }
        }
    }

    pub fn insert_attribution(&mut self, attribution: Attribution) -> Option<&Attribution> {
        if let Some(id) = attribution.id.clone() {
            match self.attributions_by_id.entry(id) {
                Entry::Occupied(o) => return Some(&self.attributions[*o.get()]),
                Entry::Vacant(v) => {
                    v.insert(self.attributions.len());
                }
            }
        }
        self.attributions.push(attribution);
        None
    }

    pub fn insert_translation(&mut self, translation: Translation) -> Option<&Translation> {
        let key = (
            translation.table_name.clone(),
            translation.field_name.clone(),
            translation.language.clone(),
            translation.record_id.clone(),
            translation.record_sub_id.clone(),
            translation.field_value.clone(),
        );
        match self.translations.entry(key) {
            Entry::Occupied(o) => Some(o.into_mut()),
            Entry::Vacant(v) => {
                v.insert(translation);
                None
            }
        }
    }

    // Read views.

    pub fn agencies(&self) -> &[Agency] {
        &self.agencies
    }

    pub fn agency(&self, id: &str) -> Option<&Agency> {
        self.agencies_by_id.get(id).map(|i| &self.agencies[*i])
    }

    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.values()
    }

    pub fn stop(&self, id: &str) -> Option<&Stop> {
        self.stops.get(id)
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.get(id)
    }

    pub fn trips(&self) -> impl Iterator<Item = &Trip> {
        self.trips.values()
    }

    pub fn trip(&self, id: &str) -> Option<&Trip> {
        self.trips.get(id)
    }

    /// Trip ids per block, in insertion order.
    pub fn blocks(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.trips_by_block.iter()
    }

    /// Stop times of one trip, ordered by ascending stop_sequence.
    pub fn stop_times_for(&self, trip_id: &str) -> Option<&BTreeMap<u32, StopTime>> {
        self.stop_times.get(trip_id)
    }

    pub fn trips_with_stop_times(
        &self,
    ) -> impl Iterator<Item = (&String, &BTreeMap<u32, StopTime>)> {
        self.stop_times.iter()
    }

    pub fn calendar(&self, service_id: &str) -> Option<&Calendar> {
        self.calendars.get(service_id)
    }

    pub fn calendars(&self) -> impl Iterator<Item = &Calendar> {
        self.calendars.values()
    }

    pub fn calendar_dates_for(
        &self,
        service_id: &str,
    ) -> Option<&BTreeMap<NaiveDate, CalendarDate>> {
        self.calendar_dates.get(service_id)
    }

    /// True when a service id is defined by either calendar file.
    pub fn service_exists(&self, service_id: &str) -> bool {
        self.calendars.contains_key(service_id) || self.calendar_dates.contains_key(service_id)
    }

    pub fn has_services(&self) -> bool {
        !self.calendars.is_empty() || !self.calendar_dates.is_empty()
    }

    /// Shape points of one shape, ordered by ascending sequence.
    pub fn shape_points_for(&self, shape_id: &str) -> Option<&BTreeMap<u32, ShapePoint>> {
        self.shape_points.get(shape_id)
    }

    pub fn shapes(&self) -> impl Iterator<Item = (&String, &BTreeMap<u32, ShapePoint>)> {
        self.shape_points.iter()
    }

    pub fn shape_exists(&self, shape_id: &str) -> bool {
        self.shape_points.contains_key(shape_id)
    }

    /// Frequencies of one trip, ordered by ascending start_time.
    pub fn frequencies_for(&self, trip_id: &str) -> Option<&BTreeMap<u32, Frequency>> {
        self.frequencies.get(trip_id)
    }

    pub fn trips_with_frequencies(
        &self,
    ) -> impl Iterator<Item = (&String, &BTreeMap<u32, Frequency>)> {
        self.frequencies.iter()
    }

    pub fn transfers(&self) -> impl Iterator<Item = &Transfer> {
        self.transfers.values()
    }

    pub fn fare_attribute(&self, id: &str) -> Option<&FareAttribute> {
        self.fare_attributes.get(id)
    }

    pub fn fare_attributes(&self) -> impl Iterator<Item = &FareAttribute> {
        self.fare_attributes.values()
    }

    pub fn fare_rules(&self) -> impl Iterator<Item = &FareRule> {
        self.fare_rules.values()
    }

    pub fn feed_info(&self) -> Option<&FeedInfo> {
        self.feed_info.as_ref()
    }

    pub fn pathways(&self) -> impl Iterator<Item = &Pathway> {
        self.pathways.values()
    }

    pub fn level_exists(&self, id: &str) -> bool {
        self.levels.contains_key(id)
    }

    pub fn levels(&self) -> impl Iterator<Item = &Level> {
        self.levels.values()
    }

    pub fn attributions(&self) -> &[Attribution] {
        &self.attributions
    }

    pub fn translations(&self) -> impl Iterator<Item = &Translation> {
        self.translations.values()
    }
}
