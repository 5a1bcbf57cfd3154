//! Orchestration of one validation run.
//!
//! Phase one walks every recognized file in parallel, one worker per
//! file: rows are parsed and built into per-task buffers so no shared
//! state is touched while workers run. A barrier separates that from
//! the merge into the repository (where duplicate keys surface) and
//! from cross validation, which itself fans out over the read-only
//! repository. A panicking worker is caught at its task boundary and
//! becomes a system notice; the run carries on without that file.

use crate::builders::{BuildResult, EntityBuilder};
use crate::error::Error;
use crate::notice::{Notice, NoticeContainer, Severity};
use crate::objects::*;
use crate::options::ValidationOptions;
use crate::relationships::expand_exclusions;
use crate::repository::FeedRepository;
use crate::row_parser::{RawRow, RowParser};
use crate::schema::{self, FileSchema, FILE_ORDER};
use crate::validators;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::io::Read;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

pub const CANNOT_CONSTRUCT_DATA_PROVIDER: &str = "cannot_construct_data_provider";
pub const RUNTIME_FAULT: &str = "runtime_fault";
pub const MISSING_REQUIRED_FILE: &str = "missing_required_file";
pub const ROW_LIMIT_EXCEEDED: &str = "row_limit_exceeded";
pub const DUPLICATE_KEY: &str = "duplicate_key";

/// One file's tokenized rows plus its header, as supplied by the
/// external row provider.
pub trait RowSource {
    fn headers(&self) -> &[String];
    /// The next row, or `Ok(None)` at end of file.
    fn next_row(&mut self) -> Result<Option<RawRow>, Error>;
}

/// Hands out a [RowSource] per declared file name.
pub trait RowSourceProvider: Sync {
    /// `Ok(None)` when the file is absent from the feed; `Err` when it
    /// exists but cannot be served.
    fn open(&self, file_name: &str) -> Result<Option<Box<dyn RowSource + '_>>, Error>;
}

/// Adapter over the csv crate: flexible row lengths, UTF-8 BOM
/// tolerated.
pub struct CsvRowSource {
    headers: Vec<String>,
    reader: csv::Reader<Box<dyn Read + Send>>,
    record: csv::StringRecord,
    file_name: String,
    row_number: u64,
}

impl CsvRowSource {
    pub fn from_reader(
        reader: impl Read + Send + 'static,
        file_name: &str,
    ) -> Result<Self, Error> {
        let mut reader = reader;
        let mut prefix = Vec::with_capacity(3);
        reader
            .by_ref()
            .take(3)
            .read_to_end(&mut prefix)
            .map_err(|e| Error::NamedFileIO {
                file_name: file_name.to_owned(),
                source: Box::new(e),
            })?;
        if prefix == [0xEFu8, 0xBB, 0xBF] {
            prefix.clear();
        }
        let chained: Box<dyn Read + Send> =
            Box::new(std::io::Cursor::new(prefix).chain(reader));

        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(chained);
        let headers = csv_reader
            .headers()
            .map_err(|e| Error::CSVError {
                file_name: file_name.to_owned(),
                source: e,
            })?
            .iter()
            .map(|h| h.trim().to_owned())
            .collect();

        Ok(CsvRowSource {
            headers,
            reader: csv_reader,
            record: csv::StringRecord::new(),
            file_name: file_name.to_owned(),
            row_number: 1, // header is row 1
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("invalid_file_name")
            .to_owned();
        let file = std::fs::File::open(path).map_err(|e| Error::NamedFileIO {
            file_name: file_name.clone(),
            source: Box::new(e),
        })?;
        CsvRowSource::from_reader(file, &file_name)
    }
}

impl RowSource for CsvRowSource {
    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn next_row(&mut self) -> Result<Option<RawRow>, Error> {
        // Reuse one pre-allocated record across the whole file.
        let more = self
            .reader
            .read_record(&mut self.record)
            .map_err(|e| Error::CSVError {
                file_name: self.file_name.clone(),
                source: e,
            })?;
        if !more {
            return Ok(None);
        }
        self.row_number += 1;
        let values = self.record.iter().map(str::to_owned).collect();
        Ok(Some(RawRow::new(values, self.row_number)))
    }
}

/// Serves the `.txt` files of an unpacked feed directory.
pub struct DirectoryRowSourceProvider {
    directory: PathBuf,
}

impl DirectoryRowSourceProvider {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        DirectoryRowSourceProvider {
            directory: directory.into(),
        }
    }
}

impl RowSourceProvider for DirectoryRowSourceProvider {
    fn open(&self, file_name: &str) -> Result<Option<Box<dyn RowSource + '_>>, Error> {
        let path = self.directory.join(file_name);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Box::new(CsvRowSource::from_path(&path)?)))
    }
}

/// In-memory provider, mostly for tests and embedding.
#[derive(Default)]
pub struct MemoryRowSourceProvider {
    files: rustc_hash::FxHashMap<String, (Vec<String>, Vec<Vec<String>>)>,
}

impl MemoryRowSourceProvider {
    pub fn new() -> Self {
        MemoryRowSourceProvider::default()
    }

    pub fn with_file(mut self, file_name: &str, headers: &[&str], rows: &[&[&str]]) -> Self {
        self.files.insert(
            file_name.to_owned(),
            (
                headers.iter().map(|h| h.to_string()).collect(),
                rows.iter()
                    .map(|row| row.iter().map(|v| v.to_string()).collect())
                    .collect(),
            ),
        );
        self
    }
}

struct MemoryRowSource {
    headers: Vec<String>,
    rows: std::vec::IntoIter<Vec<String>>,
    row_number: u64,
}

impl RowSource for MemoryRowSource {
    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn next_row(&mut self) -> Result<Option<RawRow>, Error> {
        match self.rows.next() {
            Some(values) => {
                self.row_number += 1;
                Ok(Some(RawRow::new(values, self.row_number)))
            }
            None => Ok(None),
        }
    }
}

impl RowSourceProvider for MemoryRowSourceProvider {
    fn open(&self, file_name: &str) -> Result<Option<Box<dyn RowSource + '_>>, Error> {
        Ok(self.files.get(file_name).map(|(headers, rows)| {
            Box::new(MemoryRowSource {
                headers: headers.clone(),
                rows: rows.clone().into_iter(),
                row_number: 1,
            }) as Box<dyn RowSource>
        }))
    }
}

/// Everything one worker task built from its file. Only the slice
/// matching the task's file kind is populated.
#[derive(Default)]
struct FileBuffer {
    agencies: Vec<Agency>,
    stops: Vec<Stop>,
    routes: Vec<Route>,
    trips: Vec<Trip>,
    stop_times: Vec<StopTime>,
    calendars: Vec<Calendar>,
    calendar_dates: Vec<CalendarDate>,
    shape_points: Vec<ShapePoint>,
    frequencies: Vec<Frequency>,
    transfers: Vec<Transfer>,
    fare_attributes: Vec<FareAttribute>,
    fare_rules: Vec<FareRule>,
    feed_infos: Vec<FeedInfo>,
    pathways: Vec<Pathway>,
    levels: Vec<Level>,
    attributions: Vec<Attribution>,
    translations: Vec<Translation>,
}

struct FileOutcome {
    file_name: &'static str,
    buffer: FileBuffer,
    notices: NoticeContainer,
}

/// The result of one run: every notice found, plus the best-effort
/// repository built from the valid rows.
pub struct ValidationReport {
    pub notices: NoticeContainer,
    pub repository: FeedRepository,
}

/// Ties a row source provider to the validation pipeline.
pub struct FeedValidator<'p, P: RowSourceProvider> {
    provider: &'p P,
    options: ValidationOptions,
}

impl<'p, P: RowSourceProvider> FeedValidator<'p, P> {
    pub fn new(provider: &'p P, options: ValidationOptions) -> Self {
        FeedValidator { provider, options }
    }

    pub fn run(&self) -> ValidationReport {
        let excluded = expand_exclusions(
            self.options.excluded_files.iter().map(String::as_str),
        );
        if !excluded.is_empty() {
            info!("excluding {} file(s) from the run", excluded.len());
        }
        let files: Vec<&'static str> = FILE_ORDER
            .iter()
            .copied()
            .filter(|name| !excluded.contains(name))
            .collect();

        // Phase 1: one task per file, nothing shared but the provider.
        let mut outcomes: Vec<FileOutcome> = files
            .par_iter()
            .map(|file_name| self.process_file(*file_name))
            .collect();

        // Barrier passed: merge buffers in canonical order so parents
        // land before the entities that reference them.
        let mut notices = NoticeContainer::with_max_per_code(self.options.max_notices_per_code);
        let mut repository = FeedRepository::new();
        for outcome in &mut outcomes {
            let buffer = std::mem::take(&mut outcome.buffer);
            merge_buffer(&mut repository, outcome.file_name, buffer, &mut notices);
        }
        for outcome in outcomes {
            notices.merge(outcome.notices);
        }

        // Phase 2: cross validation over the now-complete repository.
        let validator_notices: Vec<NoticeContainer> = validators::all()
            .par_iter()
            .map(|validator| {
                let mut local =
                    NoticeContainer::with_max_per_code(self.options.max_notices_per_code);
                let result = catch_unwind(AssertUnwindSafe(|| {
                    validator.validate(&repository, &self.options, &mut local);
                }));
                if let Err(panic) = result {
                    warn!("validator {} failed: {:?}", validator.name(), panic_text(&panic));
                    local.push(
                        Notice::system(RUNTIME_FAULT)
                            .field("context", validator.name())
                            .field("fault", panic_text(&panic)),
                    );
                }
                local
            })
            .collect();
        for local in validator_notices {
            notices.merge(local);
        }

        info!(
            "validation finished: {} notice(s), {} error(s)",
            notices.total(),
            notices.error_count()
        );
        ValidationReport {
            notices,
            repository,
        }
    }

    fn process_file(&self, file_name: &'static str) -> FileOutcome {
        let mut notices = NoticeContainer::with_max_per_code(self.options.max_notices_per_code);
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut buffer = FileBuffer::default();
            self.read_file(file_name, &mut buffer, &mut notices);
            buffer
        }));
        match result {
            Ok(buffer) => FileOutcome {
                file_name,
                buffer,
                notices,
            },
            Err(panic) => {
                warn!("worker for {} failed: {}", file_name, panic_text(&panic));
                notices.push(
                    Notice::system(RUNTIME_FAULT)
                        .field("context", file_name)
                        .field("fault", panic_text(&panic)),
                );
                FileOutcome {
                    file_name,
                    // entities of the failed file are simply absent
                    buffer: FileBuffer::default(),
                    notices,
                }
            }
        }
    }

    fn read_file(
        &self,
        file_name: &'static str,
        buffer: &mut FileBuffer,
        notices: &mut NoticeContainer,
    ) {
        let file_schema = match schema::schema_for(file_name) {
            Some(s) => s,
            None => return,
        };
        let mut source = match self.provider.open(file_name) {
            Ok(Some(source)) => source,
            Ok(None) => {
                if file_schema.required_file {
                    notices.push(
                        Notice::new(MISSING_REQUIRED_FILE, Severity::Error)
                            .field("filename", file_name),
                    );
                }
                return;
            }
            Err(error) => {
                notices.push(
                    Notice::system(CANNOT_CONSTRUCT_DATA_PROVIDER)
                        .field("filename", file_name)
                        .field("fault", error.to_string()),
                );
                return;
            }
        };

        let parser = RowParser::new(file_schema, source.headers(), notices);
        if parser.missing_required_columns() {
            // the file's structure is broken; its rows would only
            // produce noise downstream
            return;
        }

        let mut builder = EntityBuilder::new();
        let mut rows_read: u64 = 0;
        loop {
            let row = match source.next_row() {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(error) => {
                    notices.push(
                        Notice::system(CANNOT_CONSTRUCT_DATA_PROVIDER)
                            .field("filename", file_name)
                            .field("fault", error.to_string()),
                    );
                    break;
                }
            };
            if rows_read >= self.options.max_rows_per_file {
                notices.push(
                    Notice::new(ROW_LIMIT_EXCEEDED, Severity::Warning)
                        .field("filename", file_name)
                        .field("maxRows", self.options.max_rows_per_file),
                );
                break;
            }
            rows_read += 1;

            let parsed = parser.parse(&row, notices);
            build_row(file_schema, &parsed, &mut builder, buffer, notices);
        }
        debug!("{}: {} row(s) read", file_name, rows_read);
    }
}

fn build_row(
    file_schema: &FileSchema,
    parsed: &crate::row_parser::ParsedEntity,
    builder: &mut EntityBuilder,
    buffer: &mut FileBuffer,
    notices: &mut NoticeContainer,
) {
    match file_schema.file_name {
        schema::AGENCY_FILE => {
            push_built(builder.build_agency(parsed, notices), &mut buffer.agencies, notices)
        }
        schema::STOPS_FILE => {
            push_built(builder.build_stop(parsed, notices), &mut buffer.stops, notices)
        }
        schema::ROUTES_FILE => {
            push_built(builder.build_route(parsed, notices), &mut buffer.routes, notices)
        }
        schema::TRIPS_FILE => {
            push_built(builder.build_trip(parsed, notices), &mut buffer.trips, notices)
        }
        schema::STOP_TIMES_FILE => push_built(
            builder.build_stop_time(parsed, notices),
            &mut buffer.stop_times,
            notices,
        ),
        schema::CALENDAR_FILE => push_built(
            builder.build_calendar(parsed, notices),
            &mut buffer.calendars,
            notices,
        ),
        schema::CALENDAR_DATES_FILE => push_built(
            builder.build_calendar_date(parsed, notices),
            &mut buffer.calendar_dates,
            notices,
        ),
        schema::SHAPES_FILE => push_built(
            builder.build_shape_point(parsed, notices),
            &mut buffer.shape_points,
            notices,
        ),
        schema::FREQUENCIES_FILE => push_built(
            builder.build_frequency(parsed, notices),
            &mut buffer.frequencies,
            notices,
        ),
        schema::TRANSFERS_FILE => push_built(
            builder.build_transfer(parsed, notices),
            &mut buffer.transfers,
            notices,
        ),
        schema::FARE_ATTRIBUTES_FILE => push_built(
            builder.build_fare_attribute(parsed, notices),
            &mut buffer.fare_attributes,
            notices,
        ),
        schema::FARE_RULES_FILE => push_built(
            builder.build_fare_rule(parsed, notices),
            &mut buffer.fare_rules,
            notices,
        ),
        schema::FEED_INFO_FILE => push_built(
            builder.build_feed_info(parsed, notices),
            &mut buffer.feed_infos,
            notices,
        ),
        schema::PATHWAYS_FILE => push_built(
            builder.build_pathway(parsed, notices),
            &mut buffer.pathways,
            notices,
        ),
        schema::LEVELS_FILE => {
            push_built(builder.build_level(parsed, notices), &mut buffer.levels, notices)
        }
        schema::ATTRIBUTIONS_FILE => push_built(
            builder.build_attribution(parsed, notices),
            &mut buffer.attributions,
            notices,
        ),
        schema::TRANSLATIONS_FILE => push_built(
            builder.build_translation(parsed, notices),
            &mut buffer.translations,
            notices,
        ),
        _ => {}
    }
}

fn push_built<E>(result: BuildResult<E>, out: &mut Vec<E>, notices: &mut NoticeContainer) {
    match result {
        BuildResult::Built(entity) => out.push(entity),
        BuildResult::Rejected(violations) => notices.extend(violations),
    }
}

fn duplicate_notice(
    file_name: &'static str,
    key_fields: &'static str,
    key_value: String,
    first_row: u64,
    row: u64,
) -> Notice {
    Notice::new(DUPLICATE_KEY, Severity::Error)
        .field("filename", file_name)
        .field("fieldNames", key_fields)
        .field("fieldValues", key_value)
        .field("firstCsvRowNumber", first_row)
        .field("csvRowNumber", row)
}

fn merge_buffer(
    repo: &mut FeedRepository,
    file_name: &'static str,
    buffer: FileBuffer,
    notices: &mut NoticeContainer,
) {
    for agency in buffer.agencies {
        let (row, key) = (agency.row, agency.id.clone().unwrap_or_default());
        if let Some(previous) = repo.insert_agency(agency) {
            notices.push(duplicate_notice(file_name, "agency_id", key, previous.row, row));
        }
    }
    for stop in buffer.stops {
        let (row, key) = (stop.row(), stop.fields().id.clone());
        if let Some(previous) = repo.insert_stop(stop) {
            notices.push(duplicate_notice(file_name, "stop_id", key, previous.row(), row));
        }
    }
    for route in buffer.routes {
        let (row, key) = (route.row, route.id.clone());
        if let Some(previous) = repo.insert_route(route) {
            notices.push(duplicate_notice(file_name, "route_id", key, previous.row, row));
        }
    }
    for trip in buffer.trips {
        let (row, key) = (trip.row, trip.id.clone());
        if let Some(previous) = repo.insert_trip(trip) {
            notices.push(duplicate_notice(file_name, "trip_id", key, previous.row, row));
        }
    }
    for stop_time in buffer.stop_times {
        let (row, key) = (
            stop_time.row,
            format!("{}, {}", stop_time.trip_id, stop_time.stop_sequence),
        );
        if let Some(previous) = repo.insert_stop_time(stop_time) {
            notices.push(duplicate_notice(
                file_name,
                "trip_id, stop_sequence",
                key,
                previous.row,
                row,
            ));
        }
    }
    for calendar in buffer.calendars {
        let (row, key) = (calendar.row, calendar.service_id.clone());
        if let Some(previous) = repo.insert_calendar(calendar) {
            notices.push(duplicate_notice(file_name, "service_id", key, previous.row, row));
        }
    }
    for date in buffer.calendar_dates {
        let (row, key) = (
            date.row,
            format!("{}, {}", date.service_id, date.date.format("%Y%m%d")),
        );
        if let Some(previous) = repo.insert_calendar_date(date) {
            notices.push(duplicate_notice(
                file_name,
                "service_id, date",
                key,
                previous.row,
                row,
            ));
        }
    }
    for point in buffer.shape_points {
        let (row, key) = (
            point.row,
            format!("{}, {}", point.shape_id, point.sequence),
        );
        if let Some(previous) = repo.insert_shape_point(point) {
            notices.push(duplicate_notice(
                file_name,
                "shape_id, shape_pt_sequence",
                key,
                previous.row,
                row,
            ));
        }
    }
    for frequency in buffer.frequencies {
        let (row, key) = (
            frequency.row,
            format!(
                "{}, {}",
                frequency.trip_id,
                crate::fields::format_time(frequency.start_time)
            ),
        );
        if let Some(previous) = repo.insert_frequency(frequency) {
            notices.push(duplicate_notice(
                file_name,
                "trip_id, start_time",
                key,
                previous.row,
                row,
            ));
        }
    }
    for transfer in buffer.transfers {
        let (row, key) = (
            transfer.row,
            format!("{}, {}", transfer.from_stop_id, transfer.to_stop_id),
        );
        if let Some(previous) = repo.insert_transfer(transfer) {
            notices.push(duplicate_notice(
                file_name,
                "from_stop_id, to_stop_id",
                key,
                previous.row,
                row,
            ));
        }
    }
    for fare in buffer.fare_attributes {
        let (row, key) = (fare.row, fare.id.clone());
        if let Some(previous) = repo.insert_fare_attribute(fare) {
            notices.push(duplicate_notice(file_name, "fare_id", key, previous.row, row));
        }
    }
    for rule in buffer.fare_rules {
        let (row, key) = (rule.row, rule.fare_id.clone());
        if let Some(previous) = repo.insert_fare_rule(rule) {
            notices.push(duplicate_notice(
                file_name,
                "fare_id, route_id, origin_id, destination_id, contains_id",
                key,
                previous.row,
                row,
            ));
        }
    }
    for info in buffer.feed_infos {
        let row = info.row;
        if let Some(previous) = repo.insert_feed_info(info) {
            notices.push(duplicate_notice(
                file_name,
                "feed_publisher_name",
                String::new(),
                previous.row,
                row,
            ));
        }
    }
    for pathway in buffer.pathways {
        let (row, key) = (pathway.row, pathway.id.clone());
        if let Some(previous) = repo.insert_pathway(pathway) {
            notices.push(duplicate_notice(file_name, "pathway_id", key, previous.row, row));
        }
    }
    for level in buffer.levels {
        let (row, key) = (level.row, level.id.clone());
        if let Some(previous) = repo.insert_level(level) {
            notices.push(duplicate_notice(file_name, "level_id", key, previous.row, row));
        }
    }
    for attribution in buffer.attributions {
        let (row, key) = (attribution.row, attribution.id.clone().unwrap_or_default());
        if let Some(previous) = repo.insert_attribution(attribution) {
            notices.push(duplicate_notice(
                file_name,
                "attribution_id",
                key,
                previous.row,
                row,
            ));
        }
    }
    for translation in buffer.translations {
        let (row, key) = (
            translation.row,
            format!(
                "{}, {}, {}",
                translation.table_name, translation.field_name, translation.language
            ),
        );
        if let Some(previous) = repo.insert_translation(translation) {
            notices.push(duplicate_notice(
                file_name,
                "table_name, field_name, language, record_id, record_sub_id, field_value",
                key,
                previous.row,
                row,
            ));
        }
    }
}

fn panic_text(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_owned()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unidentified panic".to_owned()
    }
}

/// Convenience entry point: validates an unpacked feed directory.
pub fn validate_directory(
    directory: impl Into<PathBuf>,
    options: ValidationOptions,
) -> Result<ValidationReport, Error> {
    let directory = directory.into();
    if !directory.is_dir() {
        return Err(Error::NotADirectory(directory.display().to_string()));
    }
    let provider = DirectoryRowSourceProvider::new(directory);
    Ok(FeedValidator::new(&provider, options).run())
}
