//! Coordinate sanity, stop-to-shape distance and travel speed checks.

use crate::geomath::{distance_meters, distance_to_polyline_meters, polyline};
use crate::notice::{Notice, NoticeContainer, Severity};
use crate::objects::Id;
use crate::options::ValidationOptions;
use crate::repository::FeedRepository;
use crate::schema::{SHAPES_FILE, STOPS_FILE, STOP_TIMES_FILE};
use crate::validators::Validator;
use log::info;

pub const POINT_NEAR_ORIGIN: &str = "point_near_origin";
pub const POINT_NEAR_POLE: &str = "point_near_pole";
pub const STOP_TOO_FAR_FROM_TRIP_SHAPE: &str = "stop_too_far_from_trip_shape";
pub const FAST_TRAVEL_BETWEEN_STOPS: &str = "fast_travel_between_stops";

const NEAR_ORIGIN_DEGREES: f64 = 1.0;
const NEAR_POLE_LATITUDE: f64 = 89.9;

/// Flags coordinates that are technically in range but cannot be real:
/// within a degree of (0, 0), or on top of a pole.
pub struct CoordinateSanityValidator;

impl Validator for CoordinateSanityValidator {
    fn name(&self) -> &'static str {
        "coordinate_sanity"
    }

    fn validate(
        &self,
        repo: &FeedRepository,
        _options: &ValidationOptions,
        notices: &mut NoticeContainer,
    ) {
        info!("validating coordinate sanity");
        for stop in repo.stops() {
            if let Some((lat, lon)) = stop.coordinates() {
                check_point(STOPS_FILE, stop.id(), stop.row(), lat, lon, notices);
            }
        }
        for (shape_id, points) in repo.shapes() {
            for point in points.values() {
                check_point(
                    SHAPES_FILE,
                    shape_id,
                    point.row,
                    point.latitude,
                    point.longitude,
                    notices,
                );
            }
        }
    }
}

fn check_point(
    file: &'static str,
    id: &str,
    row: u64,
    lat: f64,
    lon: f64,
    notices: &mut NoticeContainer,
) {
    if lat.abs() <= NEAR_ORIGIN_DEGREES && lon.abs() <= NEAR_ORIGIN_DEGREES {
        notices.push(
            Notice::new(POINT_NEAR_ORIGIN, Severity::Error)
                .field("filename", file)
                .field("csvRowNumber", row)
                .field("entityId", id)
                .field("latitude", lat)
                .field("longitude", lon),
        );
    }
    if lat.abs() > NEAR_POLE_LATITUDE {
        notices.push(
            Notice::new(POINT_NEAR_POLE, Severity::Error)
                .field("filename", file)
                .field("csvRowNumber", row)
                .field("entityId", id)
                .field("latitude", lat)
                .field("longitude", lon),
        );
    }
}

/// Checks that every stop served by a trip lies within a buffer of the
/// trip's shape polyline.
pub struct StopShapeDistanceValidator;

impl Validator for StopShapeDistanceValidator {
    fn name(&self) -> &'static str {
        "stop_shape_distance"
    }

    fn validate(
        &self,
        repo: &FeedRepository,
        options: &ValidationOptions,
        notices: &mut NoticeContainer,
    ) {
        info!("validating stop distance to trip shapes");
        for trip in repo.trips() {
            let shape_id = match &trip.shape_id {
                Some(id) => id,
                None => continue,
            };
            let points = match repo.shape_points_for(shape_id) {
                Some(points) if !points.is_empty() => points,
                _ => continue,
            };
            let stop_times = match repo.stop_times_for(&trip.id) {
                Some(times) => times,
                None => continue,
            };
            let line = polyline(
                points
                    .values()
                    .map(|p| (p.latitude, p.longitude)),
            );
            for stop_time in stop_times.values() {
                let stop = match stop_time.stop_id.as_deref().and_then(|id| repo.stop(id)) {
                    Some(stop) => stop,
                    None => continue,
                };
                let (lat, lon) = match stop.coordinates() {
                    Some(coords) => coords,
                    None => continue,
                };
                let distance = match distance_to_polyline_meters(lat, lon, &line) {
                    Some(d) => d,
                    None => continue,
                };
                if distance > options.shape_buffer_meters {
                    notices.push(
                        Notice::new(STOP_TOO_FAR_FROM_TRIP_SHAPE, Severity::Warning)
                            .field("filename", STOP_TIMES_FILE)
                            .field("csvRowNumber", stop_time.row)
                            .field("tripId", trip.id.as_str())
                            .field("shapeId", shape_id.as_str())
                            .field("stopId", stop.id())
                            .field("stopSequence", stop_time.stop_sequence)
                            .field("distanceMeters", distance.round())
                            .field("bufferMeters", options.shape_buffer_meters),
                    );
                }
            }
        }
    }
}

/// Flags implausible travel speed between consecutive stops of a trip.
///
/// Stops sharing identical times contribute distance but no duration;
/// that distance is accumulated and attributed to the next segment with
/// a real duration instead of dividing by zero.
pub struct TravelSpeedValidator;

impl Validator for TravelSpeedValidator {
    fn name(&self) -> &'static str {
        "travel_speed"
    }

    fn validate(
        &self,
        repo: &FeedRepository,
        options: &ValidationOptions,
        notices: &mut NoticeContainer,
    ) {
        info!("validating travel speed between stops");
        let max_speed_ms = options.max_travel_speed_kmh / 3.6;

        for (trip_id, stop_times) in repo.trips_with_stop_times() {
            let mut prev_departure: Option<u32> = None;
            let mut prev_coords: Option<(f64, f64)> = None;
            let mut accumulated_distance = 0.0;
            let mut accumulated_sequences: Vec<u32> = Vec::new();

            for (sequence, stop_time) in stop_times {
                let stop = match stop_time.stop_id.as_deref().and_then(|id| repo.stop(id)) {
                    Some(stop) => stop,
                    None => continue,
                };
                let (lat, lon) = match stop.coordinates() {
                    Some(coords) => coords,
                    None => continue,
                };
                let distance = prev_coords
                    .map(|(prev_lat, prev_lon)| distance_meters(prev_lat, prev_lon, lat, lon))
                    .unwrap_or(0.0);

                let mut same_arrival_and_departure = false;
                if let (Some(departure), Some(arrival)) = (prev_departure, stop_time.arrival_time)
                {
                    same_arrival_and_departure = arrival == departure;
                    if same_arrival_and_departure {
                        accumulated_distance += distance;
                    } else if arrival > departure {
                        let duration = (arrival - departure) as f64;
                        let speed = (distance + accumulated_distance) / duration;
                        if speed > max_speed_ms {
                            accumulated_sequences.push(*sequence);
                            notices.push(
                                Notice::new(FAST_TRAVEL_BETWEEN_STOPS, Severity::Error)
                                    .field("filename", STOP_TIMES_FILE)
                                    .field("tripId", trip_id.as_str())
                                    .field("speedKmh", (speed * 3.6).round())
                                    .field(
                                        "stopSequences",
                                        accumulated_sequences
                                            .iter()
                                            .map(|s| s.to_string())
                                            .collect::<Vec<_>>()
                                            .join(","),
                                    ),
                            );
                        }
                    }
                }

                if !same_arrival_and_departure {
                    accumulated_distance = 0.0;
                    accumulated_sequences.clear();
                }
                prev_departure = stop_time.departure_time;
                prev_coords = Some((lat, lon));
                accumulated_sequences.push(*sequence);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::parse_time;
    use crate::objects::*;

    fn stop_at(id: &str, lat: f64, lon: f64) -> Stop {
        Stop::StopOrPlatform(LocationFields {
            id: id.to_owned(),
            latitude: Some(lat),
            longitude: Some(lon),
            ..LocationFields::default()
        })
    }

    fn timed_stop(trip: &str, seq: u32, stop: &str, arrival: &str, departure: &str) -> StopTime {
        StopTime {
            trip_id: trip.to_owned(),
            stop_sequence: seq,
            stop_id: Some(stop.to_owned()),
            arrival_time: parse_time(arrival),
            departure_time: parse_time(departure),
            row: seq as u64 + 1,
            ..StopTime::default()
        }
    }

    #[test]
    fn near_origin_and_near_pole_points_are_flagged() {
        let mut repo = FeedRepository::new();
        repo.insert_stop(stop_at("zero", 0.1, -0.2));
        repo.insert_stop(stop_at("pole", 89.95, 10.0));
        repo.insert_stop(stop_at("ok", 45.5, -73.5));

        let mut notices = NoticeContainer::default();
        CoordinateSanityValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(POINT_NEAR_ORIGIN), 1);
        assert_eq!(notices.count_of(POINT_NEAR_POLE), 1);
    }

    #[test]
    fn stop_far_from_shape_is_flagged() {
        let mut repo = FeedRepository::new();
        // shape runs straight along latitude 45.0
        for (i, lon) in [-73.0, -72.9, -72.8].iter().enumerate() {
            repo.insert_shape_point(ShapePoint {
                shape_id: "sh1".into(),
                latitude: 45.0,
                longitude: *lon,
                sequence: i as u32,
                row: i as u64 + 1,
                ..ShapePoint::default()
            });
        }
        repo.insert_stop(stop_at("near", 45.0001, -72.9));
        repo.insert_stop(stop_at("far", 45.02, -72.9)); // ~2.2 km off
        repo.insert_trip(Trip {
            id: "t1".into(),
            route_id: "r1".into(),
            service_id: "s1".into(),
            shape_id: Some("sh1".into()),
            ..Trip::default()
        });
        repo.insert_stop_time(timed_stop("t1", 1, "near", "08:00:00", "08:00:00"));
        repo.insert_stop_time(timed_stop("t1", 2, "far", "08:10:00", "08:10:00"));

        let mut notices = NoticeContainer::default();
        StopShapeDistanceValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(STOP_TOO_FAR_FROM_TRIP_SHAPE), 1);
        let notice = &notices.notices_for(STOP_TOO_FAR_FROM_TRIP_SHAPE)[0];
        assert_eq!(notice.context["stopId"], "far");
    }

    #[test]
    fn implausible_speed_is_flagged() {
        let mut repo = FeedRepository::new();
        // ~111 km apart, one minute travel time
        repo.insert_stop(stop_at("a", 45.0, -73.0));
        repo.insert_stop(stop_at("b", 46.0, -73.0));
        repo.insert_stop_time(timed_stop("t1", 1, "a", "08:00:00", "08:00:00"));
        repo.insert_stop_time(timed_stop("t1", 2, "b", "08:01:00", "08:01:30"));

        let mut notices = NoticeContainer::default();
        TravelSpeedValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(FAST_TRAVEL_BETWEEN_STOPS), 1);
    }

    #[test]
    fn zero_duration_segments_accumulate_instead_of_dividing() {
        let mut repo = FeedRepository::new();
        repo.insert_stop(stop_at("a", 45.0, -73.0));
        repo.insert_stop(stop_at("b", 45.05, -73.0));
        repo.insert_stop(stop_at("c", 45.1, -73.0));
        // b shares its times with a's departure; distance a->b->c is
        // spread over the 10 minute a->c window: ~11 km in 10 min, fine
        repo.insert_stop_time(timed_stop("t1", 1, "a", "08:00:00", "08:00:00"));
        repo.insert_stop_time(timed_stop("t1", 2, "b", "08:00:00", "08:00:00"));
        repo.insert_stop_time(timed_stop("t1", 3, "c", "08:10:00", "08:10:00"));

        let mut notices = NoticeContainer::default();
        TravelSpeedValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(FAST_TRAVEL_BETWEEN_STOPS), 0);
    }

    #[test]
    fn sane_speed_is_silent() {
        let mut repo = FeedRepository::new();
        repo.insert_stop(stop_at("a", 45.0, -73.0));
        repo.insert_stop(stop_at("b", 45.01, -73.0)); // ~1.1 km
        repo.insert_stop_time(timed_stop("t1", 1, "a", "08:00:00", "08:00:00"));
        repo.insert_stop_time(timed_stop("t1", 2, "b", "08:05:00", "08:05:30"));

        let mut notices = NoticeContainer::default();
        TravelSpeedValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(FAST_TRAVEL_BETWEEN_STOPS), 0);
    }
}
