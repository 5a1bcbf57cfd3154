//! Stop/station nesting rules and attribute inheritance.

use crate::notice::{Notice, NoticeContainer, Severity};
use crate::objects::{Availability, Id, Stop};
use crate::options::ValidationOptions;
use crate::repository::FeedRepository;
use crate::schema::STOPS_FILE;
use crate::validators::Validator;
use log::info;
use rustc_hash::FxHashMap;

pub const STATION_WITH_PARENT_STATION: &str = "station_with_parent_station";
pub const WRONG_PARENT_LOCATION_TYPE: &str = "wrong_parent_location_type";

pub struct StopHierarchyValidator;

impl Validator for StopHierarchyValidator {
    fn name(&self) -> &'static str {
        "stop_hierarchy"
    }

    fn validate(
        &self,
        repo: &FeedRepository,
        _options: &ValidationOptions,
        notices: &mut NoticeContainer,
    ) {
        info!("validating stop hierarchy");
        // One pass to group children under their declared parent; the
        // map is only used for the type checks below but mirrors how
        // consumers resolve the hierarchy.
        let mut children: FxHashMap<&str, Vec<&Stop>> = FxHashMap::default();
        for stop in repo.stops() {
            if let Some(parent) = stop.parent_station() {
                children.entry(parent).or_default().push(stop);
            }
        }

        for (parent_id, group) in &children {
            let parent = match repo.stop(parent_id) {
                Some(parent) => parent,
                // unresolvable parents are foreign key violations,
                // reported elsewhere
                None => continue,
            };
            for child in group {
                match child.expected_parent_type() {
                    None => {
                        notices.push(
                            Notice::new(STATION_WITH_PARENT_STATION, Severity::Error)
                                .field("filename", STOPS_FILE)
                                .field("csvRowNumber", child.row())
                                .field("stopId", child.id())
                                .field("parentStation", parent.id()),
                        );
                    }
                    Some(expected) if parent.location_type() != expected => {
                        notices.push(
                            Notice::new(WRONG_PARENT_LOCATION_TYPE, Severity::Error)
                                .field("filename", STOPS_FILE)
                                .field("csvRowNumber", child.row())
                                .field("stopId", child.id())
                                .field("locationType", child.location_type().label())
                                .field("parentStation", parent.id())
                                .field("parentLocationType", parent.location_type().label())
                                .field("expectedLocationType", expected.label()),
                        );
                    }
                    Some(_) => {}
                }
            }
        }
    }
}

/// Wheelchair boarding of a stop, inheriting the parent's value when
/// the stop itself carries no information.
pub fn effective_wheelchair_boarding(repo: &FeedRepository, stop: &Stop) -> Availability {
    match stop.fields().wheelchair_boarding {
        Availability::InformationNotAvailable => stop
            .parent_station()
            .and_then(|parent| repo.stop(parent))
            .map(|parent| parent.fields().wheelchair_boarding)
            .unwrap_or(Availability::InformationNotAvailable),
        own => own,
    }
}

/// Timezone of a stop, inheriting the parent's when absent.
pub fn effective_timezone<'a>(repo: &'a FeedRepository, stop: &'a Stop) -> Option<&'a str> {
    stop.fields().timezone.as_deref().or_else(|| {
        stop.parent_station()
            .and_then(|parent| repo.stop(parent))
            .and_then(|parent| parent.fields().timezone.as_deref())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::LocationFields;

    fn stop(id: &str, parent: Option<&str>, row: u64) -> LocationFields {
        LocationFields {
            id: id.to_owned(),
            parent_station: parent.map(str::to_owned),
            row,
            ..LocationFields::default()
        }
    }

    #[test]
    fn platform_under_station_is_fine() {
        let mut repo = FeedRepository::new();
        repo.insert_stop(Stop::Station(stop("station1", None, 2)));
        repo.insert_stop(Stop::StopOrPlatform(stop("p1", Some("station1"), 3)));

        let mut notices = NoticeContainer::default();
        StopHierarchyValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.total(), 0);
    }

    #[test]
    fn platform_under_platform_is_flagged() {
        let mut repo = FeedRepository::new();
        repo.insert_stop(Stop::StopOrPlatform(stop("p1", None, 2)));
        repo.insert_stop(Stop::StopOrPlatform(stop("p2", Some("p1"), 3)));

        let mut notices = NoticeContainer::default();
        StopHierarchyValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(WRONG_PARENT_LOCATION_TYPE), 1);
    }

    #[test]
    fn boarding_area_expects_a_platform_parent() {
        let mut repo = FeedRepository::new();
        repo.insert_stop(Stop::Station(stop("station1", None, 2)));
        repo.insert_stop(Stop::StopOrPlatform(stop("p1", Some("station1"), 3)));
        repo.insert_stop(Stop::BoardingArea(stop("b1", Some("p1"), 4)));
        repo.insert_stop(Stop::BoardingArea(stop("b2", Some("station1"), 5)));

        let mut notices = NoticeContainer::default();
        StopHierarchyValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(WRONG_PARENT_LOCATION_TYPE), 1);
        let notice = &notices.notices_for(WRONG_PARENT_LOCATION_TYPE)[0];
        assert_eq!(notice.context["stopId"], "b2");
    }

    #[test]
    fn station_must_not_declare_a_parent() {
        let mut repo = FeedRepository::new();
        repo.insert_stop(Stop::Station(stop("station1", None, 2)));
        repo.insert_stop(Stop::Station(stop("station2", Some("station1"), 3)));

        let mut notices = NoticeContainer::default();
        StopHierarchyValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(STATION_WITH_PARENT_STATION), 1);
    }

    #[test]
    fn wheelchair_boarding_is_inherited_when_absent() {
        let mut repo = FeedRepository::new();
        let mut station = stop("station1", None, 2);
        station.wheelchair_boarding = Availability::Available;
        repo.insert_stop(Stop::Station(station));
        repo.insert_stop(Stop::StopOrPlatform(stop("p1", Some("station1"), 3)));
        let mut own = stop("p2", Some("station1"), 4);
        own.wheelchair_boarding = Availability::NotAvailable;
        repo.insert_stop(Stop::StopOrPlatform(own));

        let inherited = effective_wheelchair_boarding(&repo, repo.stop("p1").unwrap());
        assert_eq!(inherited, Availability::Available);
        // an explicit value wins over the parent's
        let explicit = effective_wheelchair_boarding(&repo, repo.stop("p2").unwrap());
        assert_eq!(explicit, Availability::NotAvailable);
    }

    #[test]
    fn timezone_is_inherited_when_absent() {
        let mut repo = FeedRepository::new();
        let mut station = stop("station1", None, 2);
        station.timezone = Some("America/Montreal".to_owned());
        repo.insert_stop(Stop::Station(station));
        repo.insert_stop(Stop::StopOrPlatform(stop("p1", Some("station1"), 3)));

        let timezone = effective_timezone(&repo, repo.stop("p1").unwrap());
        assert_eq!(timezone, Some("America/Montreal"));
    }
}
