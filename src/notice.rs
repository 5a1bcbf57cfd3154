//! Diagnostic model: severity-tagged notices and the container that
//! accumulates them over one validation run.
//!
//! One rule violation is one [Notice]: a stable code, a severity and a
//! context payload describing the offending file/row/field/entity.
//! There is deliberately no type per rule; the code string is the
//! identity used for grouping and export.

use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// How severe a notice is. `Error` means the feed is non-functional,
/// `Warning` is a quality issue, `Info` is informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Which channel a notice belongs to.
///
/// `System` notices describe faults of the validation run itself (I/O
/// failures, worker panics) and are kept apart from feed-content
/// feedback. They are always `Error` severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NoticeOrigin {
    Validation,
    System,
}

/// One structured diagnostic. Immutable once pushed into a container.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub code: &'static str,
    pub severity: Severity,
    pub origin: NoticeOrigin,
    pub context: Map<String, Value>,
}

impl Notice {
    pub fn new(code: &'static str, severity: Severity) -> Self {
        Notice {
            code,
            severity,
            origin: NoticeOrigin::Validation,
            context: Map::new(),
        }
    }

    /// A notice on the system channel; always an error.
    pub fn system(code: &'static str) -> Self {
        Notice {
            code,
            severity: Severity::Error,
            origin: NoticeOrigin::System,
            context: Map::new(),
        }
    }

    /// Attaches one context field, chainable.
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_owned(), value.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity >= Severity::Error
    }
}

#[derive(Debug)]
struct CodeBucket {
    severity: Severity,
    origin: NoticeOrigin,
    total: usize,
    samples: Vec<Notice>,
}

/// Append-only accumulator of every notice found during one run.
///
/// Retains up to `max_per_code` notices of one code in detail; the
/// excess is counted but not stored, which bounds memory on feeds that
/// trip one rule millions of times.
#[derive(Debug)]
pub struct NoticeContainer {
    max_per_code: usize,
    total: usize,
    info_count: usize,
    warning_count: usize,
    error_count: usize,
    by_code: FxHashMap<&'static str, CodeBucket>,
}

pub const DEFAULT_MAX_PER_CODE: usize = 100;

impl Default for NoticeContainer {
    fn default() -> Self {
        NoticeContainer::with_max_per_code(DEFAULT_MAX_PER_CODE)
    }
}

impl NoticeContainer {
    pub fn with_max_per_code(max_per_code: usize) -> Self {
        NoticeContainer {
            max_per_code,
            total: 0,
            info_count: 0,
            warning_count: 0,
            error_count: 0,
            by_code: FxHashMap::default(),
        }
    }

    pub fn push(&mut self, notice: Notice) {
        self.total += 1;
        match notice.severity {
            Severity::Info => self.info_count += 1,
            Severity::Warning => self.warning_count += 1,
            Severity::Error => self.error_count += 1,
        }
        let bucket = self
            .by_code
            .entry(notice.code)
            .or_insert_with(|| CodeBucket {
                severity: notice.severity,
                origin: notice.origin,
                total: 0,
                samples: Vec::new(),
            });
        bucket.total += 1;
        if bucket.samples.len() < self.max_per_code {
            bucket.samples.push(notice);
        }
    }

    pub fn extend(&mut self, notices: impl IntoIterator<Item = Notice>) {
        for notice in notices {
            self.push(notice);
        }
    }

    /// Folds another container into this one. Used to merge the
    /// per-task buffers at the end of the parallel phases; ordering of
    /// notices across files is not guaranteed.
    pub fn merge(&mut self, other: NoticeContainer) {
        for (code, bucket) in other.by_code {
            let overflow = bucket.total - bucket.samples.len();
            for notice in bucket.samples {
                self.push(notice);
            }
            if overflow > 0 {
                // Notices past the donor's cap carry no payload but
                // must still be counted.
                self.total += overflow;
                match bucket.severity {
                    Severity::Info => self.info_count += overflow,
                    Severity::Warning => self.warning_count += overflow,
                    Severity::Error => self.error_count += overflow,
                }
                let merged = self.by_code.entry(code).or_insert_with(|| CodeBucket {
                    severity: bucket.severity,
                    origin: bucket.origin,
                    total: 0,
                    samples: Vec::new(),
                });
                merged.total += overflow;
            }
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Info => self.info_count,
            Severity::Warning => self.warning_count,
            Severity::Error => self.error_count,
        }
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn has(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    /// Total observed count for one code, overflow included.
    pub fn count_of(&self, code: &str) -> usize {
        self.by_code.get(code).map(|b| b.total).unwrap_or(0)
    }

    /// The retained notices of one code, at most `max_per_code`.
    pub fn notices_for(&self, code: &str) -> &[Notice] {
        self.by_code
            .get(code)
            .map(|b| b.samples.as_slice())
            .unwrap_or(&[])
    }

    /// All distinct codes observed, sorted for deterministic output.
    pub fn codes(&self) -> Vec<&'static str> {
        let mut codes: Vec<&'static str> = self.by_code.keys().copied().collect();
        codes.sort_unstable();
        codes
    }

    /// Serializes the container as the report artifact: one entry per
    /// code with the total count and up to `max_per_code` sample
    /// context payloads.
    pub fn export_json(&self) -> Value {
        let mut notices = Vec::with_capacity(self.by_code.len());
        for code in self.codes() {
            let bucket = &self.by_code[code];
            notices.push(serde_json::json!({
                "code": code,
                "severity": bucket.severity,
                "origin": bucket.origin,
                "totalNotices": bucket.total,
                "sampleNotices": bucket
                    .samples
                    .iter()
                    .map(|n| Value::Object(n.context.clone()))
                    .collect::<Vec<_>>(),
            }));
        }
        serde_json::json!({ "notices": notices })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Notice::new("x", Severity::Error).is_error());
        assert!(!Notice::new("x", Severity::Warning).is_error());
    }

    #[test]
    fn caps_retained_notices_but_counts_all() {
        let mut container = NoticeContainer::with_max_per_code(2);
        for row in 0..5 {
            container.push(Notice::new("dup", Severity::Error).field("csvRowNumber", row));
        }
        assert_eq!(container.total(), 5);
        assert_eq!(container.count_of("dup"), 5);
        assert_eq!(container.notices_for("dup").len(), 2);
        assert_eq!(container.error_count(), 5);
    }

    #[test]
    fn merge_accumulates_counts() {
        let mut a = NoticeContainer::default();
        a.push(Notice::new("one", Severity::Warning));
        let mut b = NoticeContainer::default();
        b.push(Notice::new("one", Severity::Warning));
        b.push(Notice::system("io_fault"));
        a.merge(b);
        assert_eq!(a.total(), 3);
        assert_eq!(a.count_of("one"), 2);
        assert_eq!(a.count(Severity::Warning), 2);
        assert_eq!(a.count(Severity::Error), 1);
    }

    #[test]
    fn export_groups_by_code() {
        let mut container = NoticeContainer::default();
        container.push(
            Notice::new("invalid_row_length", Severity::Error)
                .field("headerCount", 5)
                .field("rowLength", 3),
        );
        let exported = container.export_json();
        let notices = exported["notices"].as_array().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0]["code"], "invalid_row_length");
        assert_eq!(notices[0]["totalNotices"], 1);
        assert_eq!(notices[0]["sampleNotices"][0]["headerCount"], 5);
    }
}
