//! Converts one raw CSV row into a map of typed field values.
//!
//! A cell that cannot be parsed yields a notice and is left absent from
//! the result; the row itself is never dropped here. Requiredness is
//! the entity builders' business, with one exception: header-level
//! problems (missing required columns) are reported when the parser is
//! built, once per file.

use crate::fields::{parse_field, FieldValue};
use crate::notice::{Notice, NoticeContainer, Severity};
use crate::schema::FileSchema;
use rustc_hash::FxHashMap;

pub const INVALID_ROW_LENGTH: &str = "invalid_row_length";
pub const INVALID_FIELD_VALUE: &str = "invalid_field_value";
pub const LEADING_OR_TRAILING_WHITESPACE: &str = "leading_or_trailing_whitespace";
pub const INVALID_CHARACTERS: &str = "invalid_characters";
pub const MISSING_REQUIRED_COLUMN: &str = "missing_required_column";
pub const DUPLICATED_COLUMN: &str = "duplicated_column";
pub const UNKNOWN_COLUMN: &str = "unknown_column";

/// One tokenized row as handed over by the row provider.
#[derive(Debug, Clone)]
pub struct RawRow {
    /// Field values in header order
    pub values: Vec<String>,
    /// 1-based data row index within the source file
    pub row_number: u64,
}

impl RawRow {
    pub fn new(values: Vec<String>, row_number: u64) -> Self {
        RawRow { values, row_number }
    }
}

/// The typed outcome of parsing one row. Every field present has
/// passed type parsing; invalid cells are simply absent.
#[derive(Debug, Clone)]
pub struct ParsedEntity {
    pub file_name: &'static str,
    pub row_number: u64,
    /// Value of the file's first key column, when present
    pub entity_id: Option<String>,
    fields: FxHashMap<&'static str, FieldValue>,
}

impl ParsedEntity {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parses the cells of one file's rows as values of their declared
/// types.
///
/// Built once per file from the schema and the observed header; header
/// diagnostics (missing required columns, duplicated or unknown
/// columns) are emitted at construction time.
pub struct RowParser {
    schema: &'static FileSchema,
    /// Declared column -> position in the observed header
    positions: Vec<Option<usize>>,
    header_len: usize,
    missing_required: bool,
}

impl RowParser {
    pub fn new(
        schema: &'static FileSchema,
        header: &[String],
        notices: &mut NoticeContainer,
    ) -> Self {
        let mut seen: FxHashMap<&str, usize> = FxHashMap::default();
        for (index, name) in header.iter().enumerate() {
            if let Some(first) = seen.insert(name.as_str(), index) {
                notices.push(
                    Notice::new(DUPLICATED_COLUMN, Severity::Error)
                        .field("filename", schema.file_name)
                        .field("fieldName", name.as_str())
                        .field("firstIndex", first as u64)
                        .field("secondIndex", index as u64),
                );
            }
            if schema.column(name).is_none() {
                notices.push(
                    Notice::new(UNKNOWN_COLUMN, Severity::Info)
                        .field("filename", schema.file_name)
                        .field("fieldName", name.as_str())
                        .field("index", index as u64),
                );
            }
        }

        let mut missing_required = false;
        let positions = schema
            .columns
            .iter()
            .map(|column| {
                let position = header.iter().position(|h| h == column.name);
                if position.is_none() && column.required {
                    missing_required = true;
                    notices.push(
                        Notice::new(MISSING_REQUIRED_COLUMN, Severity::Error)
                            .field("filename", schema.file_name)
                            .field("fieldName", column.name),
                    );
                }
                position
            })
            .collect();

        RowParser {
            schema,
            positions,
            header_len: header.len(),
            missing_required,
        }
    }

    /// True when a required column is absent from the header; the
    /// caller skips the file's row loop in that case.
    pub fn missing_required_columns(&self) -> bool {
        self.missing_required
    }

    /// Parses one row. Always returns an entity; everything wrong with
    /// the row lands in `notices`.
    pub fn parse(&self, row: &RawRow, notices: &mut NoticeContainer) -> ParsedEntity {
        if row.values.len() != self.header_len {
            notices.push(
                Notice::new(INVALID_ROW_LENGTH, Severity::Error)
                    .field("filename", self.schema.file_name)
                    .field("csvRowNumber", row.row_number)
                    .field("headerCount", self.header_len as u64)
                    .field("rowLength", row.values.len() as u64),
            );
        }

        let mut entity = ParsedEntity {
            file_name: self.schema.file_name,
            row_number: row.row_number,
            entity_id: None,
            fields: FxHashMap::default(),
        };

        for (column, position) in self.schema.columns.iter().zip(&self.positions) {
            let raw = match position.and_then(|i| row.values.get(i)) {
                Some(value) => value.as_str(),
                None => continue,
            };
            if raw.is_empty() {
                continue;
            }

            let trimmed = raw.trim();
            if trimmed.len() != raw.len() {
                notices.push(
                    Notice::new(LEADING_OR_TRAILING_WHITESPACE, Severity::Warning)
                        .field("filename", self.schema.file_name)
                        .field("csvRowNumber", row.row_number)
                        .field("fieldName", column.name)
                        .field("fieldValue", raw),
                );
            }
            if trimmed.is_empty() {
                continue;
            }

            if has_invalid_characters(trimmed) {
                // Key and required fields feed lookups downstream, so a
                // mangled value there is an error; elsewhere it only
                // degrades display text.
                let severity = if column.is_key || column.required {
                    Severity::Error
                } else {
                    Severity::Warning
                };
                notices.push(
                    Notice::new(INVALID_CHARACTERS, severity)
                        .field("filename", self.schema.file_name)
                        .field("csvRowNumber", row.row_number)
                        .field("fieldName", column.name)
                        .field("fieldValue", trimmed),
                );
            }

            match parse_field(column.field_type, trimmed) {
                Some(value) => {
                    if column.is_key && entity.entity_id.is_none() {
                        if let FieldValue::Text(id) = &value {
                            entity.entity_id = Some(id.clone());
                        }
                    }
                    entity.fields.insert(column.name, value);
                }
                None => {
                    notices.push(
                        Notice::new(INVALID_FIELD_VALUE, Severity::Error)
                            .field("filename", self.schema.file_name)
                            .field("csvRowNumber", row.row_number)
                            .field("fieldName", column.name)
                            .field("fieldValue", trimmed)
                            .field("expectedType", column.field_type.name()),
                    );
                }
            }
        }

        entity
    }
}

/// Replacement characters betray an encoding fault upstream; other
/// control characters never belong in a feed cell.
fn has_invalid_characters(value: &str) -> bool {
    value
        .chars()
        .any(|c| c == '\u{FFFD}' || (c.is_control() && c != '\t'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeContainer;
    use crate::schema;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn short_row_yields_one_row_length_notice() {
        let schema = schema::schema_for(schema::TRIPS_FILE).unwrap();
        let mut notices = NoticeContainer::default();
        let parser = RowParser::new(
            schema,
            &header(&["route_id", "service_id", "trip_id", "block_id", "shape_id"]),
            &mut notices,
        );
        let row = RawRow::new(vec!["r1".into(), "s1".into(), "t1".into()], 2);
        let entity = parser.parse(&row, &mut notices);

        assert_eq!(notices.count_of(INVALID_ROW_LENGTH), 1);
        let notice = &notices.notices_for(INVALID_ROW_LENGTH)[0];
        assert_eq!(notice.context["headerCount"], 5);
        assert_eq!(notice.context["rowLength"], 3);
        // the columns that are present are still parsed
        assert_eq!(entity.get("trip_id").unwrap().as_text(), Some("t1"));
        assert_eq!(entity.entity_id.as_deref(), Some("t1"));
    }

    #[test]
    fn invalid_cell_is_reported_and_absent() {
        let schema = schema::schema_for(schema::STOPS_FILE).unwrap();
        let mut notices = NoticeContainer::default();
        let parser = RowParser::new(
            schema,
            &header(&["stop_id", "stop_name", "stop_lat", "stop_lon"]),
            &mut notices,
        );
        let row = RawRow::new(
            vec!["s1".into(), "Central".into(), "not-a-number".into(), "2.37".into()],
            4,
        );
        let entity = parser.parse(&row, &mut notices);

        assert!(entity.get("stop_lat").is_none());
        assert_eq!(entity.get("stop_lon").unwrap().as_float(), Some(2.37));
        assert_eq!(notices.count_of(INVALID_FIELD_VALUE), 1);
        let notice = &notices.notices_for(INVALID_FIELD_VALUE)[0];
        assert_eq!(notice.context["fieldName"], "stop_lat");
        assert_eq!(notice.context["expectedType"], "latitude");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed_and_reported() {
        let schema = schema::schema_for(schema::AGENCY_FILE).unwrap();
        let mut notices = NoticeContainer::default();
        let parser = RowParser::new(
            schema,
            &header(&["agency_name", "agency_url", "agency_timezone"]),
            &mut notices,
        );
        let row = RawRow::new(
            vec![
                " Metro ".into(),
                "https://metro.example.com".into(),
                "America/Montreal".into(),
            ],
            2,
        );
        let entity = parser.parse(&row, &mut notices);

        assert_eq!(entity.get("agency_name").unwrap().as_text(), Some("Metro"));
        assert_eq!(notices.count_of(LEADING_OR_TRAILING_WHITESPACE), 1);
    }

    #[test]
    fn missing_required_column_is_flagged_at_header_time() {
        let schema = schema::schema_for(schema::TRIPS_FILE).unwrap();
        let mut notices = NoticeContainer::default();
        let parser = RowParser::new(schema, &header(&["route_id", "trip_id"]), &mut notices);
        assert!(parser.missing_required_columns());
        assert_eq!(notices.count_of(MISSING_REQUIRED_COLUMN), 1); // service_id
    }

    #[test]
    fn replacement_character_is_reported_but_kept() {
        let schema = schema::schema_for(schema::STOPS_FILE).unwrap();
        let mut notices = NoticeContainer::default();
        let parser = RowParser::new(schema, &header(&["stop_id", "stop_desc"]), &mut notices);
        let row = RawRow::new(vec!["s1".into(), "Caf\u{FFFD}".into()], 2);
        let entity = parser.parse(&row, &mut notices);

        assert_eq!(notices.count_of(INVALID_CHARACTERS), 1);
        assert_eq!(
            notices.notices_for(INVALID_CHARACTERS)[0].severity,
            Severity::Warning
        );
        assert_eq!(
            entity.get("stop_desc").unwrap().as_text(),
            Some("Caf\u{FFFD}")
        );
    }
}
