//! Knobs of one validation run.

/// Tunable limits and thresholds. The defaults match common feed
/// practice; every method is chainable.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Rows processed per file before the rest is dropped with a
    /// notice. Bounds total work on pathological archives.
    pub max_rows_per_file: u64,
    /// Notices of one code retained in detail; the excess is counted
    /// only.
    pub max_notices_per_code: usize,
    /// A stop further than this from its trip's shape is flagged.
    pub shape_buffer_meters: f64,
    /// Travel between consecutive stops faster than this is flagged.
    pub max_travel_speed_kmh: f64,
    /// Files excluded by the user; expanded through the dependency
    /// tree before the run.
    pub excluded_files: Vec<String>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            max_rows_per_file: 2_000_000,
            max_notices_per_code: crate::notice::DEFAULT_MAX_PER_CODE,
            shape_buffer_meters: 100.0,
            max_travel_speed_kmh: 150.0,
            excluded_files: Vec::new(),
        }
    }
}

impl ValidationOptions {
    /// Caps how many rows of one file are processed (default: 2M).
    pub fn max_rows_per_file(mut self, max: u64) -> Self {
        self.max_rows_per_file = max;
        self
    }

    /// Caps how many notices per code keep their payload (default: 100).
    pub fn max_notices_per_code(mut self, max: usize) -> Self {
        self.max_notices_per_code = max;
        self
    }

    /// Sets the stop-to-shape buffer in meters (default: 100).
    pub fn shape_buffer_meters(mut self, meters: f64) -> Self {
        self.shape_buffer_meters = meters;
        self
    }

    /// Sets the travel speed ceiling in km/h (default: 150).
    pub fn max_travel_speed_kmh(mut self, kmh: f64) -> Self {
        self.max_travel_speed_kmh = kmh;
        self
    }

    /// Excludes a file (and, transitively, its dependents) from the run.
    pub fn exclude_file(mut self, file_name: impl Into<String>) -> Self {
        self.excluded_files.push(file_name.into());
        self
    }
}
