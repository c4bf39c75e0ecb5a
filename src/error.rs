use thiserror::Error;

/// Why a single InterProScan row was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum HitError {
    #[error("expected at least {expected} tab-separated columns, found {found}")]
    TooFewColumns { expected: usize, found: usize },
    #[error("empty protein identifier")]
    EmptyIdentifier,
    #[error("unparseable e-value {0:?}")]
    BadEvalue(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum GenbankError {
    #[error("line {line}: record does not start with LOCUS")]
    MissingLocus { line: usize },
    #[error("line {line}: record is not terminated by //")]
    Unterminated { line: usize },
    #[error("line {line}: qualifier continuation outside of a feature")]
    OrphanQualifier { line: usize },
    #[error("bad location {0:?}")]
    BadLocation(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum BlastError {
    #[error("expected at least 12 tab-separated columns, found {0}")]
    TooFewColumns(usize),
    #[error("column {column} ({name}): cannot parse {value:?}")]
    BadNumber {
        column: usize,
        name: &'static str,
        value: String,
    },
}
