//! Module for the error management
use thiserror::Error;

/// An error raised by the orchestration layer itself, as opposed to a
/// problem found in the feed data (those are reported as notices).
#[derive(Error, Debug)]
pub enum Error {
    /// A mandatory file is not present in the feed
    #[error("could not find file {0}")]
    MissingFile(String),
    /// A file name is not part of the GTFS specification
    #[error("{0} is not a recognized feed file")]
    UnknownFile(String),
    /// The given path to the feed is not a directory
    #[error("could not read feed: {0} is not a directory")]
    NotADirectory(String),
    /// Generic Input/Output error while reading a file
    #[error("impossible to read file")]
    IO(#[from] std::io::Error),
    /// Impossible to read a file
    #[error("impossible to read '{file_name}'")]
    NamedFileIO {
        /// The file name that could not be read
        file_name: String,
        /// The initial error that caused the unability to read the file
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Impossible to read a CSV file
    #[error("impossible to read csv file '{file_name}'")]
    CSVError {
        /// File name that could not be parsed as CSV
        file_name: String,
        /// The initial error by the csv library
        #[source]
        source: csv::Error,
    },
}
