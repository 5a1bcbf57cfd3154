//! Ordering rules on paired dates and times.

use crate::fields::format_time;
use crate::notice::{Notice, NoticeContainer, Severity};
use crate::options::ValidationOptions;
use crate::repository::FeedRepository;
use crate::schema::{CALENDAR_FILE, FEED_INFO_FILE, FREQUENCIES_FILE, STOP_TIMES_FILE};
use crate::validators::Validator;
use log::info;

pub const START_AND_END_DATE_OUT_OF_ORDER: &str = "start_and_end_date_out_of_order";
pub const START_AND_END_TIME_OUT_OF_ORDER: &str = "start_and_end_time_out_of_order";
pub const STOP_TIME_DEPARTURE_BEFORE_ARRIVAL: &str = "stop_time_departure_before_arrival";
pub const STOP_TIME_ARRIVAL_BEFORE_PREVIOUS_DEPARTURE: &str =
    "stop_time_arrival_before_previous_departure";
pub const MISSING_TRIP_EDGE_TIME: &str = "missing_trip_edge_time";

pub struct TemporalOrderingValidator;

impl Validator for TemporalOrderingValidator {
    fn name(&self) -> &'static str {
        "temporal_ordering"
    }

    fn validate(
        &self,
        repo: &FeedRepository,
        _options: &ValidationOptions,
        notices: &mut NoticeContainer,
    ) {
        info!("validating temporal ordering");
        self.check_calendars(repo, notices);
        self.check_feed_info(repo, notices);
        self.check_frequencies(repo, notices);
        self.check_stop_times(repo, notices);
    }
}

impl TemporalOrderingValidator {
    fn check_calendars(&self, repo: &FeedRepository, notices: &mut NoticeContainer) {
        for calendar in repo.calendars() {
            if calendar.end_date < calendar.start_date {
                notices.push(
                    Notice::new(START_AND_END_DATE_OUT_OF_ORDER, Severity::Error)
                        .field("filename", CALENDAR_FILE)
                        .field("csvRowNumber", calendar.row)
                        .field("serviceId", calendar.service_id.as_str())
                        .field("startDate", calendar.start_date.format("%Y%m%d").to_string())
                        .field("endDate", calendar.end_date.format("%Y%m%d").to_string()),
                );
            }
        }
    }

    fn check_feed_info(&self, repo: &FeedRepository, notices: &mut NoticeContainer) {
        let info = match repo.feed_info() {
            Some(info) => info,
            None => return,
        };
        if let (Some(start), Some(end)) = (info.start_date, info.end_date) {
            if end < start {
                notices.push(
                    Notice::new(START_AND_END_DATE_OUT_OF_ORDER, Severity::Error)
                        .field("filename", FEED_INFO_FILE)
                        .field("csvRowNumber", info.row)
                        .field("startDate", start.format("%Y%m%d").to_string())
                        .field("endDate", end.format("%Y%m%d").to_string()),
                );
            }
        }
    }

    fn check_frequencies(&self, repo: &FeedRepository, notices: &mut NoticeContainer) {
        for (trip_id, frequencies) in repo.trips_with_frequencies() {
            for frequency in frequencies.values() {
                if frequency.end_time < frequency.start_time {
                    notices.push(
                        Notice::new(START_AND_END_TIME_OUT_OF_ORDER, Severity::Error)
                            .field("filename", FREQUENCIES_FILE)
                            .field("csvRowNumber", frequency.row)
                            .field("tripId", trip_id.as_str())
                            .field("startTime", format_time(frequency.start_time))
                            .field("endTime", format_time(frequency.end_time)),
                    );
                }
            }
        }
    }

    fn check_stop_times(&self, repo: &FeedRepository, notices: &mut NoticeContainer) {
        for (trip_id, stop_times) in repo.trips_with_stop_times() {
            let mut previous: Option<(u32, u32)> = None; // (sequence, departure)
            for (sequence, stop_time) in stop_times {
                if let (Some(arrival), Some(departure)) =
                    (stop_time.arrival_time, stop_time.departure_time)
                {
                    if departure < arrival {
                        notices.push(
                            Notice::new(STOP_TIME_DEPARTURE_BEFORE_ARRIVAL, Severity::Error)
                                .field("filename", STOP_TIMES_FILE)
                                .field("csvRowNumber", stop_time.row)
                                .field("tripId", trip_id.as_str())
                                .field("stopSequence", *sequence)
                                .field("arrivalTime", format_time(arrival))
                                .field("departureTime", format_time(departure)),
                        );
                    }
                }
                if let (Some((previous_sequence, previous_departure)), Some(arrival)) =
                    (previous, stop_time.arrival_time)
                {
                    if arrival < previous_departure {
                        notices.push(
                            Notice::new(
                                STOP_TIME_ARRIVAL_BEFORE_PREVIOUS_DEPARTURE,
                                Severity::Error,
                            )
                            .field("filename", STOP_TIMES_FILE)
                            .field("csvRowNumber", stop_time.row)
                            .field("tripId", trip_id.as_str())
                            .field("previousStopSequence", previous_sequence)
                            .field("stopSequence", *sequence)
                            .field("previousDepartureTime", format_time(previous_departure))
                            .field("arrivalTime", format_time(arrival)),
                        );
                    }
                }
                if let Some(departure) = stop_time.departure_time {
                    previous = Some((*sequence, departure));
                }
            }

            // First and last stop of a trip anchor the timetable and
            // must carry both times.
            let mut edges = vec![stop_times.values().next()];
            if stop_times.len() > 1 {
                edges.push(stop_times.values().last());
            }
            for stop_time in edges.into_iter().flatten() {
                for (field, value) in [
                    ("arrival_time", stop_time.arrival_time),
                    ("departure_time", stop_time.departure_time),
                ] {
                    if value.is_none() {
                        notices.push(
                            Notice::new(MISSING_TRIP_EDGE_TIME, Severity::Error)
                                .field("filename", STOP_TIMES_FILE)
                                .field("csvRowNumber", stop_time.row)
                                .field("tripId", trip_id.as_str())
                                .field("stopSequence", stop_time.stop_sequence)
                                .field("fieldName", field),
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::parse_time;
    use crate::objects::*;

    fn stop_time(trip: &str, seq: u32, arrival: &str, departure: &str, row: u64) -> StopTime {
        StopTime {
            trip_id: trip.to_owned(),
            stop_sequence: seq,
            arrival_time: parse_time(arrival),
            departure_time: parse_time(departure),
            stop_id: Some(format!("s{}", seq)),
            row,
            ..StopTime::default()
        }
    }

    #[test]
    fn backwards_arrival_is_flagged_once_with_both_sequences() {
        let mut repo = FeedRepository::new();
        repo.insert_stop_time(stop_time("t1", 1, "07:00:00", "07:00:00", 2));
        repo.insert_stop_time(stop_time("t1", 2, "06:59:00", "07:05:00", 3));

        let mut notices = NoticeContainer::default();
        TemporalOrderingValidator.validate(&repo, &ValidationOptions::default(), &mut notices);

        assert_eq!(
            notices.count_of(STOP_TIME_ARRIVAL_BEFORE_PREVIOUS_DEPARTURE),
            1
        );
        let notice = &notices.notices_for(STOP_TIME_ARRIVAL_BEFORE_PREVIOUS_DEPARTURE)[0];
        assert_eq!(notice.context["previousStopSequence"], 1);
        assert_eq!(notice.context["stopSequence"], 2);
        assert_eq!(notice.context["previousDepartureTime"], "07:00:00");
        assert_eq!(notice.context["arrivalTime"], "06:59:00");
    }

    #[test]
    fn departure_before_arrival_on_one_row() {
        let mut repo = FeedRepository::new();
        repo.insert_stop_time(stop_time("t1", 1, "07:10:00", "07:05:00", 2));

        let mut notices = NoticeContainer::default();
        TemporalOrderingValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(STOP_TIME_DEPARTURE_BEFORE_ARRIVAL), 1);
    }

    #[test]
    fn interior_stops_may_omit_times_but_edges_may_not() {
        let mut repo = FeedRepository::new();
        repo.insert_stop_time(stop_time("t1", 1, "07:00:00", "07:00:00", 2));
        repo.insert_stop_time(StopTime {
            trip_id: "t1".into(),
            stop_sequence: 2,
            stop_id: Some("s2".into()),
            row: 3,
            ..StopTime::default()
        });
        repo.insert_stop_time(stop_time("t1", 3, "07:20:00", "07:21:00", 4));

        let mut notices = NoticeContainer::default();
        TemporalOrderingValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(MISSING_TRIP_EDGE_TIME), 0);

        // now truncate the trip so the untimed row becomes the edge
        let mut repo = FeedRepository::new();
        repo.insert_stop_time(stop_time("t2", 1, "07:00:00", "07:00:00", 2));
        repo.insert_stop_time(StopTime {
            trip_id: "t2".into(),
            stop_sequence: 2,
            stop_id: Some("s2".into()),
            row: 3,
            ..StopTime::default()
        });
        let mut notices = NoticeContainer::default();
        TemporalOrderingValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        // both arrival and departure missing on the last stop
        assert_eq!(notices.count_of(MISSING_TRIP_EDGE_TIME), 2);
    }

    #[test]
    fn calendar_range_must_be_ordered() {
        use chrono::NaiveDate;
        let mut repo = FeedRepository::new();
        repo.insert_calendar(Calendar {
            service_id: "s1".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            row: 2,
            ..Calendar::default()
        });

        let mut notices = NoticeContainer::default();
        TemporalOrderingValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(START_AND_END_DATE_OUT_OF_ORDER), 1);
    }
}
