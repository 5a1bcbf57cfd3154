//! Consistency rules across agencies and the feed metadata.

use crate::notice::{Notice, NoticeContainer, Severity};
use crate::options::ValidationOptions;
use crate::repository::FeedRepository;
use crate::schema::{AGENCY_FILE, FEED_INFO_FILE};
use crate::validators::Validator;
use log::info;
use rustc_hash::FxHashSet;

pub const AGENCIES_WITH_DIFFERENT_TIMEZONES: &str = "agencies_with_different_timezones";
pub const FEED_LANG_AND_AGENCY_LANG_MISMATCH: &str = "feed_lang_and_agency_lang_mismatch";

pub struct AgencyConsistencyValidator;

impl Validator for AgencyConsistencyValidator {
    fn name(&self) -> &'static str {
        "agency_consistency"
    }

    fn validate(
        &self,
        repo: &FeedRepository,
        _options: &ValidationOptions,
        notices: &mut NoticeContainer,
    ) {
        info!("validating agency consistency");

        let timezones: FxHashSet<&str> = repo
            .agencies()
            .iter()
            .map(|a| a.timezone.as_str())
            .filter(|tz| !tz.is_empty())
            .collect();
        if timezones.len() > 1 {
            let mut list: Vec<&str> = timezones.into_iter().collect();
            list.sort_unstable();
            notices.push(
                Notice::new(AGENCIES_WITH_DIFFERENT_TIMEZONES, Severity::Error)
                    .field("filename", AGENCY_FILE)
                    .field("timezones", list.join(", ")),
            );
        }

        if let Some(info) = repo.feed_info() {
            // "mul" declares a multilingual feed and matches anything
            if info.lang != "mul" {
                for agency in repo.agencies() {
                    if let Some(lang) = &agency.lang {
                        if !lang.eq_ignore_ascii_case(&info.lang) {
                            notices.push(
                                Notice::new(FEED_LANG_AND_AGENCY_LANG_MISMATCH, Severity::Warning)
                                    .field("filename", FEED_INFO_FILE)
                                    .field("csvRowNumber", agency.row)
                                    .field("agencyName", agency.name.as_str())
                                    .field("agencyLang", lang.as_str())
                                    .field("feedLang", info.lang.as_str()),
                            );
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Agency, FeedInfo};

    fn agency(name: &str, timezone: &str, lang: Option<&str>, row: u64) -> Agency {
        Agency {
            id: Some(name.to_owned()),
            name: name.to_owned(),
            timezone: timezone.to_owned(),
            lang: lang.map(str::to_owned),
            row,
            ..Agency::default()
        }
    }

    #[test]
    fn mixed_timezones_are_flagged_once() {
        let mut repo = FeedRepository::new();
        repo.insert_agency(agency("A", "America/Montreal", None, 2));
        repo.insert_agency(agency("B", "Europe/Paris", None, 3));

        let mut notices = NoticeContainer::default();
        AgencyConsistencyValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(AGENCIES_WITH_DIFFERENT_TIMEZONES), 1);
    }

    #[test]
    fn shared_timezone_is_silent() {
        let mut repo = FeedRepository::new();
        repo.insert_agency(agency("A", "America/Montreal", None, 2));
        repo.insert_agency(agency("B", "America/Montreal", None, 3));

        let mut notices = NoticeContainer::default();
        AgencyConsistencyValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.total(), 0);
    }

    #[test]
    fn agency_lang_against_feed_lang() {
        let mut repo = FeedRepository::new();
        repo.insert_agency(agency("A", "America/Montreal", Some("fr"), 2));
        repo.insert_agency(agency("B", "America/Montreal", Some("en"), 3));
        repo.insert_feed_info(FeedInfo {
            publisher_name: "pub".into(),
            publisher_url: "https://pub.example.com".into(),
            lang: "fr".into(),
            row: 2,
            ..FeedInfo::default()
        });

        let mut notices = NoticeContainer::default();
        AgencyConsistencyValidator.validate(&repo, &ValidationOptions::default(), &mut notices);
        assert_eq!(notices.count_of(FEED_LANG_AND_AGENCY_LANG_MISMATCH), 1);
        let notice = &notices.notices_for(FEED_LANG_AND_AGENCY_LANG_MISMATCH)[0];
        assert_eq!(notice.context["agencyName"], "B");
    }
}
