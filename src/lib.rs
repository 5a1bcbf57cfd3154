/*! Validates [GTFS](https://gtfs.org/) feeds against structural, type and cross-file
consistency rules.

A feed is a set of CSV files referencing each other by key. This crate parses
each file's rows into typed entities, indexes them in an in-memory repository
and then runs a battery of cross-referential checks (foreign keys, stop
hierarchy, temporal ordering, interval overlaps, geospatial plausibility).
Nothing fails fast: every problem found becomes a [Notice] with a stable code
and a severity, collected in a [NoticeContainer] and exported as one JSON
report at the end.

```no_run
use feedlint::{validate_directory, ValidationOptions};

let report = validate_directory("path/to/feed", ValidationOptions::default())?;
println!("{}", report.notices.export_json());
# Ok::<(), feedlint::Error>(())
```

## Design decisions

### Notices, not errors

Malformed cells, rejected rows and broken references are data about the feed,
not faults of the run. They never abort processing; the remaining rows and
files are still validated and the repository holds the best-effort model built
from what was valid. Only orchestration faults (unreadable file, worker panic)
use the separate system channel, and even those do not stop sibling workers.

### Data-driven schemas

The recognized files, their columns, declared types and keys live in one
static table ([schema]). The row parser and the entity builders are generic
over it; adding a column is a table edit, not new code.

### One pass per row

A builder accumulates every violation found on a row before deciding success
or failure, so a row with three problems yields three notices in one run, not
one per run.
*/

mod builders;
pub mod error;
mod fields;
mod geomath;
mod notice;
mod objects;
mod options;
mod relationships;
mod repository;
mod row_parser;
pub mod schema;
mod runner;
pub mod validators;

mod enums;


pub use builders::{BuildResult, EntityBuilder};
pub use error::Error;
pub use fields::{FieldType, FieldValue};
pub use notice::{Notice, NoticeContainer, NoticeOrigin, Severity};
pub use objects::*;
pub use options::ValidationOptions;
pub use relationships::{expand_exclusions, reachable_from};
pub use repository::FeedRepository;
pub use row_parser::{ParsedEntity, RawRow, RowParser};
pub use runner::{
    validate_directory, CsvRowSource, DirectoryRowSourceProvider, FeedValidator,
    MemoryRowSourceProvider, RowSource, RowSourceProvider, ValidationReport,
};
