//! Interval overlap detection: frequencies within a trip, and trips
//! sharing a block.

use crate::fields::format_time;
use crate::notice::{Notice, NoticeContainer, Severity};
use crate::options::ValidationOptions;
use crate::repository::FeedRepository;
use crate::schema::{FREQUENCIES_FILE, TRIPS_FILE};
use crate::validators::Validator;
use chrono::{Duration, NaiveDate};
use log::info;
use rustc_hash::{FxHashMap, FxHashSet};

pub const OVERLAPPING_FREQUENCIES: &str = "overlapping_frequencies";
pub const BLOCK_TRIPS_WITH_OVERLAPPING_STOP_TIMES: &str =
    "block_trips_with_overlapping_stop_times";

/// Half-open interval intersection: touching intervals do not overlap.
fn intervals_overlap(a_start: u32, a_end: u32, b_start: u32, b_end: u32) -> bool {
    a_start < b_end && b_start < a_end
}

pub struct FrequencyOverlapValidator;

impl Validator for FrequencyOverlapValidator {
    fn name(&self) -> &'static str {
        "frequency_overlap"
    }

    fn validate(
        &self,
        repo: &FeedRepository,
        _options: &ValidationOptions,
        notices: &mut NoticeContainer,
    ) {
        info!("validating frequency overlaps");
        for (trip_id, frequencies) in repo.trips_with_frequencies() {
            // n is small per trip; a pairwise scan is fine
            let valid: Vec<_> = frequencies
                .values()
                .filter(|f| f.start_time < f.end_time)
                .collect();
            for (index, a) in valid.iter().enumerate() {
                for b in &valid[index + 1..] {
                    if intervals_overlap(a.start_time, a.end_time, b.start_time, b.end_time) {
                        notices.push(
                            Notice::new(OVERLAPPING_FREQUENCIES, Severity::Error)
                                .field("filename", FREQUENCIES_FILE)
                                .field("tripId", trip_id.as_str())
                                .field("csvRowNumber", a.row)
                                .field("startTime", format_time(a.start_time))
                                .field("endTime", format_time(a.end_time))
                                .field("otherCsvRowNumber", b.row)
                                .field("otherStartTime", format_time(b.start_time))
                                .field("otherEndTime", format_time(b.end_time)),
                        );
                    }
                }
            }
        }
    }
}

pub struct BlockOverlapValidator;

impl Validator for BlockOverlapValidator {
    fn name(&self) -> &'static str {
        "block_overlap"
    }

    fn validate(
        &self,
        repo: &FeedRepository,
        _options: &ValidationOptions,
        notices: &mut NoticeContainer,
    ) {
        info!("validating block overlaps");
        let mut day_sets: FxHashMap<&str, FxHashSet<NaiveDate>> = FxHashMap::default();

        for (block_id, trip_ids) in repo.blocks() {
            if trip_ids.len() < 2 {
                continue;
            }
            // One service interval per trip: [first arrival, last
            // departure), skipped when either edge time is absent.
            let mut spans: Vec<(&str, u32, u32, &str)> = Vec::with_capacity(trip_ids.len());
            for trip_id in trip_ids {
                let trip = match repo.trip(trip_id) {
                    Some(trip) => trip,
                    None => continue,
                };
                let stop_times = match repo.stop_times_for(trip_id) {
                    Some(times) if !times.is_empty() => times,
                    _ => continue,
                };
                let first_arrival = stop_times.values().next().and_then(|st| st.arrival_time);
                let last_departure = stop_times.values().last().and_then(|st| st.departure_time);
                if let (Some(start), Some(end)) = (first_arrival, last_departure) {
                    if start < end {
                        spans.push((trip_id, start, end, &trip.service_id));
                    }
                }
            }

            for (index, a) in spans.iter().enumerate() {
                for b in &spans[index + 1..] {
                    if !intervals_overlap(a.1, a.2, b.1, b.2) {
                        continue;
                    }
                    if !services_share_a_day(repo, &mut day_sets, a.3, b.3) {
                        continue;
                    }
                    notices.push(
                        Notice::new(BLOCK_TRIPS_WITH_OVERLAPPING_STOP_TIMES, Severity::Error)
                            .field("filename", TRIPS_FILE)
                            .field("blockId", block_id.as_str())
                            .field("tripIdA", a.0)
                            .field("serviceIdA", a.3)
                            .field("intervalA", format!(
                                "{}-{}",
                                format_time(a.1),
                                format_time(a.2)
                            ))
                            .field("tripIdB", b.0)
                            .field("serviceIdB", b.3)
                            .field("intervalB", format!(
                                "{}-{}",
                                format_time(b.1),
                                format_time(b.2)
                            )),
                    );
                }
            }
        }
    }
}

/// Two trips can only conflict on a day where both services operate.
fn services_share_a_day<'r>(
    repo: &'r FeedRepository,
    cache: &mut FxHashMap<&'r str, FxHashSet<NaiveDate>>,
    service_a: &'r str,
    service_b: &'r str,
) -> bool {
    if service_a == service_b {
        return !operating_days(repo, cache, service_a).is_empty();
    }
    // compute both first so the cache borrows don't overlap
    operating_days(repo, cache, service_a);
    operating_days(repo, cache, service_b);
    let days_a = &cache[service_a];
    let days_b = &cache[service_b];
    !days_a.is_disjoint(days_b)
}

/// Expands one service into its set of operating days: the calendar
/// weekday range, minus removed dates, plus added dates.
fn operating_days<'r, 'c>(
    repo: &'r FeedRepository,
    cache: &'c mut FxHashMap<&'r str, FxHashSet<NaiveDate>>,
    service_id: &'r str,
) -> &'c FxHashSet<NaiveDate> {
    if !cache.contains_key(service_id) {
        let mut days = FxHashSet::default();
        if let Some(calendar) = repo.calendar(service_id) {
            let mut date = calendar.start_date;
            while date <= calendar.end_date {
                if calendar.valid_weekday(date) {
                    days.insert(date);
                }
                date = date + Duration::days(1);
            }
        }
        if let Some(dates) = repo.calendar_dates_for(service_id) {
            for exception in dates.values() {
                match exception.exception {
                    crate::objects::Exception::Added => {
                        days.insert(exception.date);
                    }
                    crate::objects::Exception::Deleted => {
                        days.remove(&exception.date);
                    }
                    crate::objects::Exception::Unknown(_) => {}
                }
            }
        }
        cache.insert(service_id, days);
    }
    &cache[service_id]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::parse_time;
    use crate::objects::*;
    use chrono::NaiveDate;

    fn frequency(trip: &str, start: &str, end: &str, row: u64) -> Frequency {
        Frequency {
            trip_id: trip.to_owned(),
            start_time: parse_time(start).unwrap(),
            end_time: parse_time(end).unwrap(),
            headway_secs: 600,
            row,
            ..Frequency::default()
        }
    }

    #[test]
    fn overlapping_windows_yield_one_notice() {
        let mut repo = FeedRepository::new();
        repo.insert_frequency(frequency("t1", "06:00:00", "10:00:00", 2));
        repo.insert_frequency(frequency("t1", "09:00:00", "12:00:00", 3));

        let mut notices = NoticeContainer::default();
        FrequencyOverlapValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(OVERLAPPING_FREQUENCIES), 1);
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        let mut repo = FeedRepository::new();
        repo.insert_frequency(frequency("t1", "06:00:00", "10:00:00", 2));
        repo.insert_frequency(frequency("t1", "10:00:00", "12:00:00", 3));

        let mut notices = NoticeContainer::default();
        FrequencyOverlapValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(OVERLAPPING_FREQUENCIES), 0);
    }

    #[test]
    fn degenerate_windows_are_skipped() {
        let mut repo = FeedRepository::new();
        repo.insert_frequency(frequency("t1", "10:00:00", "06:00:00", 2));
        repo.insert_frequency(frequency("t1", "07:00:00", "08:00:00", 3));

        let mut notices = NoticeContainer::default();
        FrequencyOverlapValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(OVERLAPPING_FREQUENCIES), 0);
    }

    fn weekday_calendar(service: &str) -> Calendar {
        Calendar {
            service_id: service.to_owned(),
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            ..Calendar::default()
        }
    }

    fn block_trip(id: &str, block: &str, service: &str) -> Trip {
        Trip {
            id: id.to_owned(),
            route_id: "r1".to_owned(),
            service_id: service.to_owned(),
            block_id: Some(block.to_owned()),
            ..Trip::default()
        }
    }

    fn span(repo: &mut FeedRepository, trip: &str, start: &str, end: &str) {
        repo.insert_stop_time(StopTime {
            trip_id: trip.to_owned(),
            stop_sequence: 1,
            stop_id: Some("s1".into()),
            arrival_time: parse_time(start),
            departure_time: parse_time(start),
            ..StopTime::default()
        });
        repo.insert_stop_time(StopTime {
            trip_id: trip.to_owned(),
            stop_sequence: 2,
            stop_id: Some("s2".into()),
            arrival_time: parse_time(end),
            departure_time: parse_time(end),
            ..StopTime::default()
        });
    }

    #[test]
    fn same_service_block_overlap_is_flagged() {
        let mut repo = FeedRepository::new();
        repo.insert_calendar(weekday_calendar("wk"));
        repo.insert_trip(block_trip("t1", "b1", "wk"));
        repo.insert_trip(block_trip("t2", "b1", "wk"));
        span(&mut repo, "t1", "08:00:00", "09:00:00");
        span(&mut repo, "t2", "08:30:00", "09:30:00");

        let mut notices = NoticeContainer::default();
        BlockOverlapValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(
            notices.count_of(BLOCK_TRIPS_WITH_OVERLAPPING_STOP_TIMES),
            1
        );
    }

    #[test]
    fn disjoint_services_do_not_conflict() {
        let mut repo = FeedRepository::new();
        repo.insert_calendar(weekday_calendar("wk"));
        // weekend-only service via calendar_dates
        repo.insert_calendar_date(CalendarDate {
            service_id: "sat".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(), // a Saturday
            exception: Exception::Added,
            row: 2,
        });
        repo.insert_trip(block_trip("t1", "b1", "wk"));
        repo.insert_trip(block_trip("t2", "b1", "sat"));
        span(&mut repo, "t1", "08:00:00", "09:00:00");
        span(&mut repo, "t2", "08:30:00", "09:30:00");

        let mut notices = NoticeContainer::default();
        BlockOverlapValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(
            notices.count_of(BLOCK_TRIPS_WITH_OVERLAPPING_STOP_TIMES),
            0
        );
    }

    #[test]
    fn sequential_trips_in_a_block_are_fine() {
        let mut repo = FeedRepository::new();
        repo.insert_calendar(weekday_calendar("wk"));
        repo.insert_trip(block_trip("t1", "b1", "wk"));
        repo.insert_trip(block_trip("t2", "b1", "wk"));
        span(&mut repo, "t1", "08:00:00", "09:00:00");
        // starts exactly when the first ends: half-open, no overlap
        span(&mut repo, "t2", "09:00:00", "10:00:00");

        let mut notices = NoticeContainer::default();
        BlockOverlapValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(
            notices.count_of(BLOCK_TRIPS_WITH_OVERLAPPING_STOP_TIMES),
            0
        );
    }
}
