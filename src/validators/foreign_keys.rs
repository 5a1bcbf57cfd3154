//! Foreign key existence checks, driven by one edge table.

use crate::notice::{Notice, NoticeContainer, Severity};
use crate::options::ValidationOptions;
use crate::repository::FeedRepository;
use crate::schema::*;
use crate::validators::Validator;
use log::info;

pub const FOREIGN_KEY_VIOLATION: &str = "foreign_key_violation";

/// One referential edge: where the references come from, which parent
/// view resolves them, and when the check is meaningful at all.
struct Edge {
    child_file: &'static str,
    child_field: &'static str,
    parent_file: &'static str,
    parent_field: &'static str,
    /// `(referenced id, child row)` pairs with a non-empty reference
    refs: fn(&FeedRepository) -> Vec<(String, u64)>,
    exists: fn(&FeedRepository, &str) -> bool,
    /// False skips the edge entirely, e.g. when the optional parent
    /// file is absent and every reference would be noise.
    applies: fn(&FeedRepository) -> bool,
}

fn always(_: &FeedRepository) -> bool {
    true
}

static EDGES: &[Edge] = &[
    Edge {
        child_file: STOP_TIMES_FILE,
        child_field: "trip_id",
        parent_file: TRIPS_FILE,
        parent_field: "trip_id",
        refs: |r| {
            r.trips_with_stop_times()
                .flat_map(|(trip_id, times)| {
                    times.values().map(move |st| (trip_id.clone(), st.row))
                })
                .collect()
        },
        exists: |r, id| r.trip(id).is_some(),
        applies: always,
    },
    Edge {
        child_file: STOP_TIMES_FILE,
        child_field: "stop_id",
        parent_file: STOPS_FILE,
        parent_field: "stop_id",
        refs: |r| {
            r.trips_with_stop_times()
                .flat_map(|(_, times)| times.values())
                .filter_map(|st| st.stop_id.clone().map(|id| (id, st.row)))
                .collect()
        },
        exists: |r, id| r.stop(id).is_some(),
        applies: always,
    },
    Edge {
        child_file: TRIPS_FILE,
        child_field: "route_id",
        parent_file: ROUTES_FILE,
        parent_field: "route_id",
        refs: |r| {
            r.trips()
                .map(|t| (t.route_id.clone(), t.row))
                .collect()
        },
        exists: |r, id| r.route(id).is_some(),
        applies: always,
    },
    Edge {
        child_file: TRIPS_FILE,
        child_field: "service_id",
        parent_file: CALENDAR_FILE,
        parent_field: "service_id",
        refs: |r| {
            r.trips()
                .map(|t| (t.service_id.clone(), t.row))
                .collect()
        },
        exists: FeedRepository::service_exists,
        applies: FeedRepository::has_services,
    },
    Edge {
        child_file: TRIPS_FILE,
        child_field: "shape_id",
        parent_file: SHAPES_FILE,
        parent_field: "shape_id",
        refs: |r| {
            r.trips()
                .filter_map(|t| t.shape_id.clone().map(|id| (id, t.row)))
                .collect()
        },
        exists: FeedRepository::shape_exists,
        applies: |r| r.shapes().next().is_some(),
    },
    Edge {
        child_file: ROUTES_FILE,
        child_field: "agency_id",
        parent_file: AGENCY_FILE,
        parent_field: "agency_id",
        refs: |r| {
            r.routes()
                .filter_map(|route| route.agency_id.clone().map(|id| (id, route.row)))
                .collect()
        },
        exists: |r, id| r.agency(id).is_some(),
        applies: |r| !r.agencies().is_empty(),
    },
    Edge {
        child_file: FREQUENCIES_FILE,
        child_field: "trip_id",
        parent_file: TRIPS_FILE,
        parent_field: "trip_id",
        refs: |r| {
            r.trips_with_frequencies()
                .flat_map(|(trip_id, frequencies)| {
                    frequencies.values().map(move |f| (trip_id.clone(), f.row))
                })
                .collect()
        },
        exists: |r, id| r.trip(id).is_some(),
        applies: always,
    },
    Edge {
        child_file: TRANSFERS_FILE,
        child_field: "from_stop_id",
        parent_file: STOPS_FILE,
        parent_field: "stop_id",
        refs: |r| {
            r.transfers()
                .map(|t| (t.from_stop_id.clone(), t.row))
                .collect()
        },
        exists: |r, id| r.stop(id).is_some(),
        applies: always,
    },
    Edge {
        child_file: TRANSFERS_FILE,
        child_field: "to_stop_id",
        parent_file: STOPS_FILE,
        parent_field: "stop_id",
        refs: |r| {
            r.transfers()
                .map(|t| (t.to_stop_id.clone(), t.row))
                .collect()
        },
        exists: |r, id| r.stop(id).is_some(),
        applies: always,
    },
    Edge {
        child_file: PATHWAYS_FILE,
        child_field: "from_stop_id",
        parent_file: STOPS_FILE,
        parent_field: "stop_id",
        refs: |r| {
            r.pathways()
                .map(|p| (p.from_stop_id.clone(), p.row))
                .collect()
        },
        exists: |r, id| r.stop(id).is_some(),
        applies: always,
    },
    Edge {
        child_file: PATHWAYS_FILE,
        child_field: "to_stop_id",
        parent_file: STOPS_FILE,
        parent_field: "stop_id",
        refs: |r| {
            r.pathways()
                .map(|p| (p.to_stop_id.clone(), p.row))
                .collect()
        },
        exists: |r, id| r.stop(id).is_some(),
        applies: always,
    },
    Edge {
        child_file: STOPS_FILE,
        child_field: "parent_station",
        parent_file: STOPS_FILE,
        parent_field: "stop_id",
        refs: |r| {
            r.stops()
                .filter_map(|s| {
                    s.parent_station()
                        .map(|parent| (parent.to_owned(), s.row()))
                })
                .collect()
        },
        exists: |r, id| r.stop(id).is_some(),
        applies: always,
    },
    Edge {
        child_file: STOPS_FILE,
        child_field: "level_id",
        parent_file: LEVELS_FILE,
        parent_field: "level_id",
        refs: |r| {
            r.stops()
                .filter_map(|s| {
                    s.fields()
                        .level_id
                        .clone()
                        .map(|id| (id, s.row()))
                })
                .collect()
        },
        exists: FeedRepository::level_exists,
        applies: |r| r.levels().next().is_some(),
    },
    Edge {
        child_file: FARE_RULES_FILE,
        child_field: "fare_id",
        parent_file: FARE_ATTRIBUTES_FILE,
        parent_field: "fare_id",
        refs: |r| {
            r.fare_rules()
                .map(|rule| (rule.fare_id.clone(), rule.row))
                .collect()
        },
        exists: |r, id| r.fare_attribute(id).is_some(),
        applies: always,
    },
    Edge {
        child_file: FARE_RULES_FILE,
        child_field: "route_id",
        parent_file: ROUTES_FILE,
        parent_field: "route_id",
        refs: |r| {
            r.fare_rules()
                .filter_map(|rule| rule.route_id.clone().map(|id| (id, rule.row)))
                .collect()
        },
        exists: |r, id| r.route(id).is_some(),
        applies: always,
    },
    Edge {
        child_file: ATTRIBUTIONS_FILE,
        child_field: "agency_id",
        parent_file: AGENCY_FILE,
        parent_field: "agency_id",
        refs: |r| {
            r.attributions()
                .iter()
                .filter_map(|a| a.agency_id.clone().map(|id| (id, a.row)))
                .collect()
        },
        exists: |r, id| r.agency(id).is_some(),
        applies: always,
    },
    Edge {
        child_file: ATTRIBUTIONS_FILE,
        child_field: "route_id",
        parent_file: ROUTES_FILE,
        parent_field: "route_id",
        refs: |r| {
            r.attributions()
                .iter()
                .filter_map(|a| a.route_id.clone().map(|id| (id, a.row)))
                .collect()
        },
        exists: |r, id| r.route(id).is_some(),
        applies: always,
    },
    Edge {
        child_file: ATTRIBUTIONS_FILE,
        child_field: "trip_id",
        parent_file: TRIPS_FILE,
        parent_field: "trip_id",
        refs: |r| {
            r.attributions()
                .iter()
                .filter_map(|a| a.trip_id.clone().map(|id| (id, a.row)))
                .collect()
        },
        exists: |r, id| r.trip(id).is_some(),
        applies: always,
    },
];

pub struct ForeignKeyValidator;

impl Validator for ForeignKeyValidator {
    fn name(&self) -> &'static str {
        "foreign_keys"
    }

    fn validate(
        &self,
        repo: &FeedRepository,
        _options: &ValidationOptions,
        notices: &mut NoticeContainer,
    ) {
        info!("validating foreign keys");
        for edge in EDGES {
            if !(edge.applies)(repo) {
                continue;
            }
            for (id, row) in (edge.refs)(repo) {
                if !(edge.exists)(repo, &id) {
                    notices.push(
                        Notice::new(FOREIGN_KEY_VIOLATION, Severity::Error)
                            .field("filename", edge.child_file)
                            .field("fieldName", edge.child_field)
                            .field("referencedFilename", edge.parent_file)
                            .field("referencedFieldName", edge.parent_field)
                            .field("fieldValue", id.as_str())
                            .field("csvRowNumber", row),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::*;

    #[test]
    fn stop_time_with_unknown_trip_is_flagged_once() {
        let mut repo = FeedRepository::new();
        repo.insert_stop(Stop::StopOrPlatform(LocationFields {
            id: "s1".into(),
            ..LocationFields::default()
        }));
        repo.insert_stop_time(StopTime {
            trip_id: "ghost".into(),
            stop_id: Some("s1".into()),
            stop_sequence: 1,
            row: 2,
            ..StopTime::default()
        });

        let mut notices = NoticeContainer::default();
        ForeignKeyValidator.validate(&repo, &ValidationOptions::default(), &mut notices);

        assert_eq!(notices.count_of(FOREIGN_KEY_VIOLATION), 1);
        let notice = &notices.notices_for(FOREIGN_KEY_VIOLATION)[0];
        assert_eq!(notice.context["filename"], "stop_times.txt");
        assert_eq!(notice.context["referencedFilename"], "trips.txt");
        assert_eq!(notice.context["fieldValue"], "ghost");
    }

    #[test]
    fn service_references_are_skipped_without_calendar_files() {
        let mut repo = FeedRepository::new();
        repo.insert_route(Route {
            id: "r1".into(),
            ..Route::default()
        });
        repo.insert_trip(Trip {
            id: "t1".into(),
            route_id: "r1".into(),
            service_id: "weekday".into(),
            ..Trip::default()
        });

        let mut notices = NoticeContainer::default();
        ForeignKeyValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        // no calendar.txt or calendar_dates.txt present: nothing to
        // resolve against, so no violation either
        assert_eq!(notices.count_of(FOREIGN_KEY_VIOLATION), 0);
    }

    #[test]
    fn resolved_references_are_silent() {
        let mut repo = FeedRepository::new();
        repo.insert_route(Route {
            id: "r1".into(),
            ..Route::default()
        });
        repo.insert_trip(Trip {
            id: "t1".into(),
            route_id: "r1".into(),
            service_id: "weekday".into(),
            ..Trip::default()
        });
        repo.insert_calendar(Calendar {
            service_id: "weekday".into(),
            ..Calendar::default()
        });

        let mut notices = NoticeContainer::default();
        ForeignKeyValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(FOREIGN_KEY_VIOLATION), 0);
    }
}
