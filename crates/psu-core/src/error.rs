//! Error type shared by the survey and spatial pipelines.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PsuError {
    /// An expected column is absent from a survey table (schema drift).
    #[error("{country}: no source column for `{code}`")]
    MissingColumn { country: String, code: String },

    /// More than one source column normalizes to the same canonical code.
    #[error("{country}: `{code}` matches {count} source columns")]
    AmbiguousColumn {
        country: String,
        code: String,
        count: usize,
    },

    /// A column appended to a table does not have one cell per row.
    #[error("column `{name}` has {got} cells, table has {expected} rows")]
    ColumnLength {
        name: String,
        got: usize,
        expected: usize,
    },

    #[error("{}: no header row", .0.display())]
    EmptyTable(PathBuf),

    #[error("unknown country `{0}`")]
    UnknownCountry(String),

    #[error("no ethnic power ranking defined for `{0}`")]
    MissingRanking(String),

    /// A required external dataset (file, staged collection) does not exist.
    #[error("missing dataset: {}", .0.display())]
    MissingDataset(PathBuf),

    #[error("collection `{collection}` has no images in [{start}, {end})")]
    EmptyCollection {
        collection: String,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("no time step for {year}-{month:02} in rainfall series")]
    MissingTimeStep { year: i32, month: u32 },

    #[error("rainfall series too short: need {needed} steps from index {start}, have {len}")]
    ShortSeries {
        start: usize,
        needed: usize,
        len: usize,
    },

    #[error("malformed rainfall series: {0}")]
    MalformedSeries(String),

    #[error("grid mismatch: expected {expected:?}, got {got:?}")]
    GridMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("anomaly needs at least {needed} composites, got {got}")]
    TooFewComposites { needed: usize, got: usize },

    #[error("invalid geometry: {0}")]
    Geometry(String),

    #[error("GeoTIFF {}: {message}", path.display())]
    Raster { path: PathBuf, message: String },

    #[error("degenerate event set: {0}")]
    DegenerateEvents(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Tiff(#[from] tiff::TiffError),

    #[error(transparent)]
    Xlsx(#[from] calamine::XlsxError),
}

pub type Result<T> = std::result::Result<T, PsuError>;
