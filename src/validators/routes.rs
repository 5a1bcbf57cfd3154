//! Route naming and color rules.

use crate::fields::format_color;
use crate::notice::{Notice, NoticeContainer, Severity};
use crate::options::ValidationOptions;
use crate::repository::FeedRepository;
use crate::schema::ROUTES_FILE;
use crate::validators::Validator;
use log::info;
use rgb::RGB8;
use rustc_hash::FxHashMap;

pub const ROUTE_SHORT_AND_LONG_NAME_MISSING: &str = "route_short_and_long_name_missing";
pub const SAME_NAME_AND_DESCRIPTION_FOR_ROUTE: &str = "same_name_and_description_for_route";
pub const DUPLICATE_ROUTE_NAME_COMBINATION: &str = "duplicate_route_name_combination";
pub const INSUFFICIENT_ROUTE_COLOR_CONTRAST: &str = "insufficient_route_color_contrast";

pub struct RouteNameValidator;

impl Validator for RouteNameValidator {
    fn name(&self) -> &'static str {
        "route_names"
    }

    fn validate(
        &self,
        repo: &FeedRepository,
        _options: &ValidationOptions,
        notices: &mut NoticeContainer,
    ) {
        info!("validating route names");
        let mut seen_names: FxHashMap<(String, String), u64> = FxHashMap::default();

        for route in repo.routes() {
            let short = route.short_name.as_deref().unwrap_or("");
            let long = route.long_name.as_deref().unwrap_or("");

            if short.is_empty() && long.is_empty() {
                notices.push(
                    Notice::new(ROUTE_SHORT_AND_LONG_NAME_MISSING, Severity::Error)
                        .field("filename", ROUTES_FILE)
                        .field("csvRowNumber", route.row)
                        .field("routeId", route.id.as_str()),
                );
            }

            if let Some(description) = &route.description {
                if !description.is_empty()
                    && (description.eq_ignore_ascii_case(short)
                        || description.eq_ignore_ascii_case(long))
                {
                    notices.push(
                        Notice::new(SAME_NAME_AND_DESCRIPTION_FOR_ROUTE, Severity::Warning)
                            .field("filename", ROUTES_FILE)
                            .field("csvRowNumber", route.row)
                            .field("routeId", route.id.as_str())
                            .field("routeDesc", description.as_str()),
                    );
                }
            }

            if !short.is_empty() || !long.is_empty() {
                match seen_names.insert((short.to_owned(), long.to_owned()), route.row) {
                    Some(first_row) => {
                        notices.push(
                            Notice::new(DUPLICATE_ROUTE_NAME_COMBINATION, Severity::Warning)
                                .field("filename", ROUTES_FILE)
                                .field("csvRowNumber", route.row)
                                .field("routeId", route.id.as_str())
                                .field("routeShortName", short)
                                .field("routeLongName", long)
                                .field("otherCsvRowNumber", first_row),
                        );
                    }
                    None => {}
                }
            }
        }
    }
}

pub struct RouteColorContrastValidator;

impl Validator for RouteColorContrastValidator {
    fn name(&self) -> &'static str {
        "route_color_contrast"
    }

    fn validate(
        &self,
        repo: &FeedRepository,
        _options: &ValidationOptions,
        notices: &mut NoticeContainer,
    ) {
        info!("validating route color contrast");
        for route in repo.routes() {
            // only judged when the feed states both colors explicitly
            let (color, text_color) = match (route.color, route.text_color) {
                (Some(color), Some(text_color)) => (color, text_color),
                _ => continue,
            };
            let ratio = contrast_ratio(color, text_color);
            if ratio < 4.5 {
                notices.push(
                    Notice::new(INSUFFICIENT_ROUTE_COLOR_CONTRAST, Severity::Warning)
                        .field("filename", ROUTES_FILE)
                        .field("csvRowNumber", route.row)
                        .field("routeId", route.id.as_str())
                        .field("routeColor", format_color(color))
                        .field("routeTextColor", format_color(text_color))
                        .field("contrastRatio", (ratio * 100.0).round() / 100.0),
                );
            }
        }
    }
}

fn luminance(color: RGB8) -> f64 {
    0.2126 * color.r as f64 + 0.7152 * color.g as f64 + 0.0722 * color.b as f64
}

fn contrast_ratio(a: RGB8, b: RGB8) -> f64 {
    let (brightest, darkest) = if luminance(a) >= luminance(b) {
        (luminance(a), luminance(b))
    } else {
        (luminance(b), luminance(a))
    };
    (brightest + 0.05) / (darkest + 0.05)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Route;

    fn route(id: &str, short: &str, long: &str, row: u64) -> Route {
        Route {
            id: id.to_owned(),
            short_name: (!short.is_empty()).then(|| short.to_owned()),
            long_name: (!long.is_empty()).then(|| long.to_owned()),
            row,
            ..Route::default()
        }
    }

    #[test]
    fn nameless_route_is_flagged() {
        let mut repo = FeedRepository::new();
        repo.insert_route(route("r1", "", "", 2));

        let mut notices = NoticeContainer::default();
        RouteNameValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(ROUTE_SHORT_AND_LONG_NAME_MISSING), 1);
    }

    #[test]
    fn duplicated_name_combination_is_flagged_once() {
        let mut repo = FeedRepository::new();
        repo.insert_route(route("r1", "7", "Main Street", 2));
        repo.insert_route(route("r2", "7", "Main Street", 3));

        let mut notices = NoticeContainer::default();
        RouteNameValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(DUPLICATE_ROUTE_NAME_COMBINATION), 1);
    }

    #[test]
    fn description_matching_the_name_is_flagged() {
        let mut repo = FeedRepository::new();
        let mut r = route("r1", "7", "Main Street", 2);
        r.description = Some("Main Street".to_owned());
        repo.insert_route(r);

        let mut notices = NoticeContainer::default();
        RouteNameValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(SAME_NAME_AND_DESCRIPTION_FOR_ROUTE), 1);
    }

    #[test]
    fn low_contrast_colors_are_flagged() {
        let mut repo = FeedRepository::new();
        let mut bad = route("r1", "7", "Main Street", 2);
        bad.color = Some(RGB8::new(0x20, 0x20, 0x20));
        bad.text_color = Some(RGB8::new(0x30, 0x30, 0x30));
        repo.insert_route(bad);
        let mut good = route("r2", "8", "Elm Street", 3);
        good.color = Some(RGB8::new(0xFF, 0xFF, 0xFF));
        good.text_color = Some(RGB8::new(0x00, 0x00, 0x00));
        repo.insert_route(good);

        let mut notices = NoticeContainer::default();
        RouteColorContrastValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(INSUFFICIENT_ROUTE_COLOR_CONTRAST), 1);
        let notice = &notices.notices_for(INSUFFICIENT_ROUTE_COLOR_CONTRAST)[0];
        assert_eq!(notice.context["routeId"], "r1");
    }
}
