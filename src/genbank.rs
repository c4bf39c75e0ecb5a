//! GenBank flat-file records.
//!
//! Only the feature table is modelled in detail. Header sections, the
//! `ORIGIN` block and anything between the features and the sequence are kept
//! as raw lines, so a record that nobody edits is written back exactly as it
//! was read. A feature is re-rendered in canonical GenBank layout only after
//! its qualifiers have been borrowed mutably.

use crate::error::GenbankError;
use crate::files::open_reader;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::Path;

const QUALIFIER_INDENT: usize = 21;
const LINE_WIDTH: usize = 79;
const QUALIFIER_WIDTH: usize = LINE_WIDTH - QUALIFIER_INDENT;

#[derive(Debug, Clone, PartialEq)]
pub struct Qualifier {
    pub key: String,
    pub value: Option<String>,
    pub quoted: bool,
}

impl Qualifier {
    pub fn quoted(key: &str, value: &str) -> Self {
        Qualifier {
            key: key.to_string(),
            value: Some(value.to_string()),
            quoted: true,
        }
    }

    /// A value written without quotes, e.g. `/colour=6` or `/codon_start=1`.
    pub fn bare(key: &str, value: &str) -> Self {
        Qualifier {
            key: key.to_string(),
            value: Some(value.to_string()),
            quoted: false,
        }
    }

    pub fn flag(key: &str) -> Self {
        Qualifier {
            key: key.to_string(),
            value: None,
            quoted: false,
        }
    }

    fn render(&self) -> String {
        match (&self.value, self.quoted) {
            (None, _) => format!("/{}", self.key),
            (Some(v), true) => format!("/{}=\"{}\"", self.key, v.replace('"', "\"\"")),
            (Some(v), false) => format!("/{}={}", self.key, v),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Feature {
    pub kind: String,
    pub location: String,
    qualifiers: Vec<Qualifier>,
    raw: Option<Vec<String>>,
}

impl PartialEq for Feature {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.location == other.location
            && self.qualifiers == other.qualifiers
    }
}

impl Feature {
    pub fn new(kind: &str, location: &str) -> Self {
        Feature {
            kind: kind.to_string(),
            location: location.to_string(),
            qualifiers: Vec::new(),
            raw: None,
        }
    }

    #[cfg(test)]
    pub fn with_qualifiers(mut self, qualifiers: Vec<Qualifier>) -> Self {
        self.qualifiers = qualifiers;
        self.raw = None;
        self
    }

    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }

    /// Mutable access; the feature is re-rendered on write from here on.
    pub fn qualifiers_mut(&mut self) -> &mut Vec<Qualifier> {
        self.raw = None;
        &mut self.qualifiers
    }

    pub fn set_qualifiers(&mut self, qualifiers: Vec<Qualifier>) {
        self.raw = None;
        self.qualifiers = qualifiers;
    }

    pub fn is_modified(&self) -> bool {
        self.raw.is_none()
    }

    pub fn is_cds(&self) -> bool {
        self.kind == "CDS"
    }

    #[cfg(test)]
    pub fn has(&self, key: &str) -> bool {
        self.qualifiers.iter().any(|q| q.key == key)
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.qualifiers
            .iter()
            .filter(|q| q.key == key)
            .find_map(|q| q.value.as_deref())
    }

    pub fn values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.qualifiers
            .iter()
            .filter(move |q| q.key == key)
            .filter_map(|q| q.value.as_deref())
    }

    pub fn locus_tag(&self) -> Option<&str> {
        self.first("locus_tag")
    }

    pub fn parse_location(&self) -> Result<Location, GenbankError> {
        Location::parse(&self.location)
    }

    fn write_to(&self, out: &mut dyn Write) -> std::io::Result<()> {
        if let Some(lines) = &self.raw {
            for line in lines {
                writeln!(out, "{}", line)?;
            }
            return Ok(());
        }
        let mut location_lines = wrap_location(&self.location).into_iter();
        let first = location_lines.next().unwrap_or_default();
        if self.kind.len() < QUALIFIER_INDENT - 5 {
            writeln!(out, "     {:<16}{}", self.kind, first)?;
        } else {
            writeln!(out, "     {} {}", self.kind, first)?;
        }
        for line in location_lines {
            writeln!(out, "{:indent$}{}", "", line, indent = QUALIFIER_INDENT)?;
        }
        for qualifier in &self.qualifiers {
            for line in wrap_text(&qualifier.render(), QUALIFIER_WIDTH) {
                writeln!(out, "{:indent$}{}", "", line, indent = QUALIFIER_INDENT)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub header: Vec<String>,
    pub features_header: Option<String>,
    pub features: Vec<Feature>,
    pub trailer: Vec<String>,
    pub origin: Vec<String>,
    pub sequence: Vec<u8>,
}

impl Record {
    fn header_value(&self, keyword: &str) -> Option<&str> {
        self.header
            .iter()
            .find(|l| l.split_whitespace().next() == Some(keyword))
            .and_then(|l| l.split_whitespace().nth(1))
    }

    pub fn name(&self) -> &str {
        self.header_value("LOCUS").unwrap_or("")
    }

    /// VERSION accession, falling back to ACCESSION and then the LOCUS name.
    pub fn id(&self) -> &str {
        self.header_value("VERSION")
            .or_else(|| self.header_value("ACCESSION"))
            .unwrap_or_else(|| self.name())
    }

    pub fn cds(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(|f| f.is_cds())
    }

    pub fn cds_mut(&mut self) -> impl Iterator<Item = &mut Feature> {
        self.features.iter_mut().filter(|f| f.is_cds())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
    Mixed,
}

/// Parsed feature location. Coordinates are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Span { start: usize, end: usize },
    Complement(Box<Location>),
    Join(Vec<Location>),
}

impl Location {
    pub fn parse(text: &str) -> Result<Location, GenbankError> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        parse_location(&compact).ok_or_else(|| GenbankError::BadLocation(text.to_string()))
    }

    pub fn start(&self) -> usize {
        match self {
            Location::Span { start, .. } => *start,
            Location::Complement(inner) => inner.start(),
            Location::Join(parts) => parts.iter().map(|p| p.start()).min().unwrap_or(0),
        }
    }

    pub fn end(&self) -> usize {
        match self {
            Location::Span { end, .. } => *end,
            Location::Complement(inner) => inner.end(),
            Location::Join(parts) => parts.iter().map(|p| p.end()).max().unwrap_or(0),
        }
    }

    pub fn strand(&self) -> Strand {
        match self {
            Location::Span { .. } => Strand::Forward,
            Location::Complement(inner) => match inner.strand() {
                Strand::Forward => Strand::Reverse,
                Strand::Reverse => Strand::Forward,
                Strand::Mixed => Strand::Mixed,
            },
            Location::Join(parts) => {
                let mut strands = parts.iter().map(|p| p.strand());
                let first = strands.next().unwrap_or(Strand::Forward);
                if strands.all(|s| s == first) {
                    first
                } else {
                    Strand::Mixed
                }
            }
        }
    }

    /// Cuts this location out of `seq`; `None` if any part lies outside it.
    pub fn extract(&self, seq: &[u8]) -> Option<Vec<u8>> {
        match self {
            Location::Span { start, end } => {
                if *start == 0 || start > end || *end > seq.len() {
                    return None;
                }
                Some(seq[start - 1..*end].to_vec())
            }
            Location::Complement(inner) => inner.extract(seq).map(|s| reverse_complement(&s)),
            Location::Join(parts) => {
                let mut out = Vec::new();
                for part in parts {
                    out.extend(part.extract(seq)?);
                }
                Some(out)
            }
        }
    }
}

fn parse_location(s: &str) -> Option<Location> {
    if let Some(inner) = strip_call(s, "complement") {
        return parse_location(inner).map(|l| Location::Complement(Box::new(l)));
    }
    if let Some(inner) = strip_call(s, "join").or_else(|| strip_call(s, "order")) {
        let parts = split_top_level(inner)
            .into_iter()
            .map(parse_location)
            .collect::<Option<Vec<_>>>()?;
        if parts.is_empty() {
            return None;
        }
        return Some(Location::Join(parts));
    }
    let bound = |v: &str| -> Option<usize> { v.trim_start_matches(['<', '>']).parse().ok() };
    if let Some((a, b)) = s.split_once("..") {
        return Some(Location::Span {
            start: bound(a)?,
            end: bound(b)?,
        });
    }
    if let Some((a, _)) = s.split_once('^') {
        let site = bound(a)?;
        return Some(Location::Span {
            start: site,
            end: site,
        });
    }
    let site = bound(s)?;
    Some(Location::Span {
        start: site,
        end: site,
    })
}

fn strip_call<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?.strip_prefix('(')?.strip_suffix(')')
}

fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut begin = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[begin..i]);
                begin = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[begin..]);
    parts
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| {
            let c = match b.to_ascii_uppercase() {
                b'A' => b'T',
                b'T' | b'U' => b'A',
                b'C' => b'G',
                b'G' => b'C',
                b'R' => b'Y',
                b'Y' => b'R',
                b'K' => b'M',
                b'M' => b'K',
                b'B' => b'V',
                b'V' => b'B',
                b'D' => b'H',
                b'H' => b'D',
                other => other,
            };
            if b.is_ascii_lowercase() {
                c.to_ascii_lowercase()
            } else {
                c
            }
        })
        .collect()
}

/// Greedy word wrap; words longer than `width` are split hard.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = text;
    while rest.chars().count() > width {
        let cut = rest
            .char_indices()
            .nth(width)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if rest[cut..].starts_with(' ') {
            lines.push(rest[..cut].to_string());
            rest = &rest[cut + 1..];
        } else if let Some(space) = rest[..cut].rfind(' ').filter(|&i| i > 0) {
            lines.push(rest[..space].to_string());
            rest = &rest[space + 1..];
        } else {
            lines.push(rest[..cut].to_string());
            rest = &rest[cut..];
        }
    }
    lines.push(rest.to_string());
    lines
}

fn wrap_location(location: &str) -> Vec<String> {
    if location.len() <= QUALIFIER_WIDTH {
        return vec![location.to_string()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    for piece in location.split_inclusive(',') {
        if !current.is_empty() && current.len() + piece.len() > QUALIFIER_WIDTH {
            lines.push(std::mem::take(&mut current));
        }
        current.push_str(piece);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[derive(PartialEq)]
enum Section {
    Header,
    Features,
    Trailer,
    Origin,
}

struct FeatureBuilder {
    feature: Feature,
    raw: Vec<String>,
    open_quote: bool,
}

impl FeatureBuilder {
    fn finish(mut self) -> Feature {
        for q in self.feature.qualifiers.iter_mut() {
            if q.quoted {
                if let Some(v) = q.value.as_mut() {
                    *v = v.replace("\"\"", "\"");
                }
            }
        }
        self.feature.raw = Some(self.raw);
        self.feature
    }

    fn push_qualifier_line(&mut self, content: &str) {
        let body = &content[1..];
        let (key, value) = match body.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (body, None),
        };
        let qualifier = match value {
            None => Qualifier::flag(key),
            Some(v) if v.starts_with('"') => {
                let inner = &v[1..];
                self.open_quote = !closes_quote(inner);
                let text = if self.open_quote {
                    inner
                } else {
                    &inner[..inner.len() - 1]
                };
                Qualifier::quoted(key, text)
            }
            Some(v) => Qualifier::bare(key, v),
        };
        self.feature.qualifiers.push(qualifier);
    }

    fn push_continuation(&mut self, content: &str) {
        let Some(last) = self.feature.qualifiers.last_mut() else {
            self.feature.location.push_str(content);
            return;
        };
        let piece = if last.quoted && self.open_quote {
            self.open_quote = !closes_quote(content);
            if self.open_quote {
                content
            } else {
                &content[..content.len() - 1]
            }
        } else {
            content
        };
        let value = last.value.get_or_insert_with(String::new);
        if last.key != "translation" && !value.is_empty() && !piece.is_empty() {
            value.push(' ');
        }
        value.push_str(piece);
    }
}

/// True when `text` ends in an unescaped closing quote.
fn closes_quote(text: &str) -> bool {
    let trailing = text.bytes().rev().take_while(|&b| b == b'"').count();
    trailing % 2 == 1
}

pub fn parse_genbank_reader<R: BufRead>(reader: R) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut current: Option<Record> = None;
    let mut section = Section::Header;
    let mut builder: Option<FeatureBuilder> = None;
    let mut last_line = 0;

    for (idx, line) in reader.lines().enumerate() {
        let mut line = line.with_context(|| format!("reading line {}", idx + 1))?;
        if line.ends_with('\r') {
            line.pop();
        }
        let line_no = idx + 1;
        last_line = line_no;

        let Some(record) = current.as_mut() else {
            if line.trim().is_empty() {
                continue;
            }
            if !line.starts_with("LOCUS") {
                return Err(GenbankError::MissingLocus { line: line_no }.into());
            }
            current = Some(Record {
                header: vec![line],
                features_header: None,
                features: Vec::new(),
                trailer: Vec::new(),
                origin: Vec::new(),
                sequence: Vec::new(),
            });
            section = Section::Header;
            continue;
        };

        if line.starts_with("//") {
            if let Some(b) = builder.take() {
                record.features.push(b.finish());
            }
            if let Some(done) = current.take() {
                records.push(done);
            }
            continue;
        }

        if section == Section::Features {
            let indent = line.len() - line.trim_start().len();
            if line.trim().is_empty() {
                if let Some(b) = builder.as_mut() {
                    b.raw.push(line);
                }
                continue;
            }
            if indent >= QUALIFIER_INDENT {
                let Some(b) = builder.as_mut() else {
                    return Err(GenbankError::OrphanQualifier { line: line_no }.into());
                };
                let content = line.trim().to_string();
                if content.starts_with('/') && !b.open_quote {
                    b.push_qualifier_line(&content);
                } else {
                    b.push_continuation(&content);
                }
                b.raw.push(line);
                continue;
            }
            if indent > 0 {
                if let Some(b) = builder.take() {
                    record.features.push(b.finish());
                }
                let body = line.trim_start();
                let (kind, location) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
                builder = Some(FeatureBuilder {
                    feature: Feature::new(kind, location.trim()),
                    raw: vec![line],
                    open_quote: false,
                });
                continue;
            }
            if let Some(b) = builder.take() {
                record.features.push(b.finish());
            }
            section = Section::Trailer;
        }

        match section {
            Section::Header => {
                if line.starts_with("FEATURES") {
                    record.features_header = Some(line);
                    section = Section::Features;
                } else if line.starts_with("ORIGIN") {
                    record.origin.push(line);
                    section = Section::Origin;
                } else {
                    record.header.push(line);
                }
            }
            Section::Trailer => {
                if line.starts_with("ORIGIN") {
                    record.origin.push(line);
                    section = Section::Origin;
                } else {
                    record.trailer.push(line);
                }
            }
            Section::Origin => {
                record
                    .sequence
                    .extend(line.bytes().filter(|b| b.is_ascii_alphabetic()));
                record.origin.push(line);
            }
            Section::Features => unreachable!("feature lines are consumed above"),
        }
    }

    if current.is_some() {
        return Err(GenbankError::Unterminated { line: last_line }.into());
    }
    Ok(records)
}

pub fn parse_genbank(path: &Path) -> Result<Vec<Record>> {
    let reader = open_reader(path)?;
    parse_genbank_reader(reader).with_context(|| format!("parsing GenBank file {}", path.display()))
}

pub fn write_genbank(records: &[Record], out: &mut dyn Write) -> Result<()> {
    for record in records {
        for line in &record.header {
            writeln!(out, "{}", line)?;
        }
        if let Some(line) = &record.features_header {
            writeln!(out, "{}", line)?;
        } else if !record.features.is_empty() {
            writeln!(out, "FEATURES             Location/Qualifiers")?;
        }
        for feature in &record.features {
            feature.write_to(out)?;
        }
        for line in record.trailer.iter().chain(record.origin.iter()) {
            writeln!(out, "{}", line)?;
        }
        writeln!(out, "//")?;
    }
    Ok(())
}
