//! InterProScan TSV output (no header, one match per line).

use crate::error::HitError;
use crate::files::open_reader;
use anyhow::{Context, Result};
use log::warn;
use std::io::BufRead;
use std::path::Path;

const PROTEIN_COLUMN: usize = 0;
const ANALYSIS_COLUMN: usize = 3;
const SIGNATURE_COLUMN: usize = 4;
const DESCRIPTION_COLUMN: usize = 5;
const EVALUE_COLUMN: usize = 8;
pub const MIN_COLUMNS: usize = EVALUE_COLUMN + 1;

const MISSING: &str = "-";

/// E-value as written in the file plus its numeric value.
#[derive(Debug, Clone, PartialEq)]
pub struct Evalue {
    pub text: String,
    pub value: f64,
}

impl Evalue {
    /// Accepts plain floats as well as `1e-10` / `1.96E-18`.
    pub fn parse(text: &str) -> Result<Self, HitError> {
        let trimmed = text.trim();
        match trimmed.to_ascii_lowercase().parse::<f64>() {
            Ok(value) if !value.is_nan() => Ok(Evalue {
                text: trimmed.to_string(),
                value,
            }),
            _ => Err(HitError::BadEvalue(trimmed.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterproHit {
    pub protein_id: String,
    pub locus: String,
    pub analysis: String,
    pub signature: String,
    /// `None` when InterProScan reported `-`.
    pub description: Option<String>,
    pub evalue: Option<Evalue>,
}

impl InterproHit {
    pub fn parse_line(line: &str) -> Result<Self, HitError> {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
        if fields.len() < MIN_COLUMNS {
            return Err(HitError::TooFewColumns {
                expected: MIN_COLUMNS,
                found: fields.len(),
            });
        }
        let protein_id = fields[PROTEIN_COLUMN].trim();
        if protein_id.is_empty() {
            return Err(HitError::EmptyIdentifier);
        }
        let optional = |idx: usize| {
            let v = fields[idx].trim();
            (v != MISSING && !v.is_empty()).then(|| v.to_string())
        };
        let evalue = optional(EVALUE_COLUMN)
            .map(|text| Evalue::parse(&text))
            .transpose()?;

        Ok(InterproHit {
            protein_id: protein_id.to_string(),
            locus: locus_of(protein_id).to_string(),
            analysis: fields[ANALYSIS_COLUMN].trim().to_string(),
            signature: fields[SIGNATURE_COLUMN].trim().to_string(),
            description: optional(DESCRIPTION_COLUMN),
            evalue,
        })
    }
}

/// Locus tag from a `prefix:locus` protein id; ids without a colon are the locus.
pub fn locus_of(protein_id: &str) -> &str {
    protein_id.rsplit(':').next().unwrap_or(protein_id)
}

/// Parses every row, logging and dropping the ones that do not fit.
pub fn read_hits_reader<R: BufRead>(reader: R, source: &str) -> Result<Vec<InterproHit>> {
    let mut hits = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {} of {}", idx + 1, source))?;
        if line.trim().is_empty() {
            continue;
        }
        match InterproHit::parse_line(&line) {
            Ok(hit) => hits.push(hit),
            Err(e) => warn!("{}: line {}: {}; skipping", source, idx + 1, e),
        }
    }
    Ok(hits)
}

pub fn read_hits(path: &Path) -> Result<Vec<InterproHit>> {
    let reader = open_reader(path)?;
    read_hits_reader(reader, &path.display().to_string())
}
