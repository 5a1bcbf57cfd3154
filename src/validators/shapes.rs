//! Monotonicity of `shape_dist_traveled` along shapes and stop times.

use crate::notice::{Notice, NoticeContainer, Severity};
use crate::options::ValidationOptions;
use crate::repository::FeedRepository;
use crate::schema::{SHAPES_FILE, STOP_TIMES_FILE};
use crate::validators::Validator;
use log::info;

pub const DECREASING_OR_EQUAL_SHAPE_DISTANCE: &str = "decreasing_or_equal_shape_distance";
pub const DECREASING_OR_EQUAL_STOP_TIME_DISTANCE: &str = "decreasing_or_equal_stop_time_distance";

pub struct IncreasingDistanceValidator;

impl Validator for IncreasingDistanceValidator {
    fn name(&self) -> &'static str {
        "increasing_distance"
    }

    fn validate(
        &self,
        repo: &FeedRepository,
        _options: &ValidationOptions,
        notices: &mut NoticeContainer,
    ) {
        info!("validating shape distance monotonicity");
        for (shape_id, points) in repo.shapes() {
            let mut previous: Option<(u32, f64)> = None; // sequence, distance
            for point in points.values() {
                let distance = match point.dist_traveled {
                    Some(d) => d,
                    None => continue,
                };
                if let Some((prev_sequence, prev_distance)) = previous {
                    if distance <= prev_distance {
                        notices.push(
                            Notice::new(DECREASING_OR_EQUAL_SHAPE_DISTANCE, Severity::Error)
                                .field("filename", SHAPES_FILE)
                                .field("csvRowNumber", point.row)
                                .field("shapeId", shape_id.as_str())
                                .field("prevShapePtSequence", prev_sequence)
                                .field("shapePtSequence", point.sequence)
                                .field("prevShapeDistTraveled", prev_distance)
                                .field("shapeDistTraveled", distance),
                        );
                    }
                }
                previous = Some((point.sequence, distance));
            }
        }

        for (trip_id, stop_times) in repo.trips_with_stop_times() {
            let mut previous: Option<(u32, f64)> = None;
            for stop_time in stop_times.values() {
                let distance = match stop_time.shape_dist_traveled {
                    Some(d) => d,
                    None => continue,
                };
                if let Some((prev_sequence, prev_distance)) = previous {
                    if distance <= prev_distance {
                        notices.push(
                            Notice::new(DECREASING_OR_EQUAL_STOP_TIME_DISTANCE, Severity::Error)
                                .field("filename", STOP_TIMES_FILE)
                                .field("csvRowNumber", stop_time.row)
                                .field("tripId", trip_id.as_str())
                                .field("prevStopSequence", prev_sequence)
                                .field("stopSequence", stop_time.stop_sequence)
                                .field("prevShapeDistTraveled", prev_distance)
                                .field("shapeDistTraveled", distance),
                        );
                    }
                }
                previous = Some((stop_time.stop_sequence, distance));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::*;

    fn point(shape: &str, seq: u32, dist: Option<f64>, row: u64) -> ShapePoint {
        ShapePoint {
            shape_id: shape.to_owned(),
            latitude: 45.0,
            longitude: -73.0,
            sequence: seq,
            dist_traveled: dist,
            row,
        }
    }

    #[test]
    fn decreasing_shape_distance_is_flagged() {
        let mut repo = FeedRepository::new();
        repo.insert_shape_point(point("sh1", 1, Some(0.0), 2));
        repo.insert_shape_point(point("sh1", 2, Some(2.5), 3));
        repo.insert_shape_point(point("sh1", 3, Some(1.0), 4));

        let mut notices = NoticeContainer::default();
        IncreasingDistanceValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(DECREASING_OR_EQUAL_SHAPE_DISTANCE), 1);
        let notice = &notices.notices_for(DECREASING_OR_EQUAL_SHAPE_DISTANCE)[0];
        assert_eq!(notice.context["prevShapePtSequence"], 2);
        assert_eq!(notice.context["shapePtSequence"], 3);
    }

    #[test]
    fn gaps_without_distance_are_tolerated() {
        let mut repo = FeedRepository::new();
        repo.insert_shape_point(point("sh1", 1, Some(0.0), 2));
        repo.insert_shape_point(point("sh1", 2, None, 3));
        repo.insert_shape_point(point("sh1", 3, Some(5.0), 4));

        let mut notices = NoticeContainer::default();
        IncreasingDistanceValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.total(), 0);
    }

    #[test]
    fn equal_stop_time_distance_is_flagged() {
        let mut repo = FeedRepository::new();
        for (seq, dist) in [(1u32, 0.0), (2, 3.0), (3, 3.0)] {
            repo.insert_stop_time(StopTime {
                trip_id: "t1".into(),
                stop_sequence: seq,
                stop_id: Some(format!("s{}", seq)),
                shape_dist_traveled: Some(dist),
                row: seq as u64 + 1,
                ..StopTime::default()
            });
        }

        let mut notices = NoticeContainer::default();
        IncreasingDistanceValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(DECREASING_OR_EQUAL_STOP_TIME_DISTANCE), 1);
    }
}
