use thiserror::Error;

/// Failures that abort a single ingest. The dataset is left untouched.
///
/// A missing start marker is not an error: the extractor returns `None` and
/// the upload is skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("export is not valid UTF-8: {0}")]
    InvalidUtf8(String),
    #[error("team block for {team} starts at line {start} but no \"{marker}\" line follows")]
    MissingEndMarker {
        team: String,
        start: usize,
        marker: &'static str,
    },
    #[error("team block has no header row")]
    MissingHeader,
    #[error("export has {lines} line(s); match name and date lines are missing")]
    MissingPreamble { lines: usize },
}

/// Failures that replace one view. The other view still renders.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("column '{0}' is not present in the data")]
    MissingColumn(String),
    #[error("cannot convert Time value '{value}' for {player} to a duration")]
    UnparseableTime { player: String, value: String },
}
