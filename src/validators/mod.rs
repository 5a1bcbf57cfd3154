//! Cross-referential validation rules.
//!
//! Each validator is a pure reader of the populated repository: it
//! emits notices and touches nothing. Validators are independent of
//! each other and run in any order; a rule whose inputs are absent
//! (missing optional file) silently skips instead of failing.

pub mod agencies;
pub mod foreign_keys;
pub mod geospatial;
pub mod hierarchy;
pub mod overlaps;
pub mod routes;
pub mod shapes;
pub mod temporal;

use crate::notice::NoticeContainer;
use crate::options::ValidationOptions;
use crate::repository::FeedRepository;

/// One cross-file validation rule family.
pub trait Validator: Sync + Send {
    fn name(&self) -> &'static str;
    fn validate(
        &self,
        repo: &FeedRepository,
        options: &ValidationOptions,
        notices: &mut NoticeContainer,
    );
}

/// Every registered validator, in declaration order. The runner may
/// execute them in parallel; order carries no meaning.
pub fn all() -> Vec<Box<dyn Validator>> {
    vec![
        Box::new(foreign_keys::ForeignKeyValidator),
        Box::new(hierarchy::StopHierarchyValidator),
        Box::new(temporal::TemporalOrderingValidator),
        Box::new(overlaps::FrequencyOverlapValidator),
        Box::new(overlaps::BlockOverlapValidator),
        Box::new(geospatial::CoordinateSanityValidator),
        Box::new(geospatial::StopShapeDistanceValidator),
        Box::new(geospatial::TravelSpeedValidator),
        Box::new(routes::RouteNameValidator),
        Box::new(routes::RouteColorContrastValidator),
        Box::new(shapes::IncreasingDistanceValidator),
        Box::new(agencies::AgencyConsistencyValidator),
    ]
}
