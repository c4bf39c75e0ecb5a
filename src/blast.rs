//! BLAST/tBLASTx tabular hits (`-outfmt 6`) and lookup of the CDS they touch.

use crate::error::BlastError;
use crate::genbank::{Record, Strand};
use log::warn;

const MIN_COLUMNS: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct BlastHit {
    pub query: String,
    pub subject: String,
    pub pident: f64,
    pub length: usize,
    pub qstart: usize,
    pub qend: usize,
    pub sstart: usize,
    pub send: usize,
    pub evalue: String,
    pub bitscore: String,
}

fn number<T: std::str::FromStr>(
    fields: &[&str],
    column: usize,
    name: &'static str,
) -> Result<T, BlastError> {
    fields[column]
        .trim()
        .parse()
        .map_err(|_| BlastError::BadNumber {
            column,
            name,
            value: fields[column].to_string(),
        })
}

impl BlastHit {
    pub fn parse_line(line: &str) -> Result<Self, BlastError> {
        let fields: Vec<&str> = line.trim_end().split('\t').collect();
        if fields.len() < MIN_COLUMNS {
            return Err(BlastError::TooFewColumns(fields.len()));
        }
        Ok(BlastHit {
            query: fields[0].to_string(),
            subject: fields[1].to_string(),
            pident: number(&fields, 2, "pident")?,
            length: number(&fields, 3, "length")?,
            qstart: number(&fields, 6, "qstart")?,
            qend: number(&fields, 7, "qend")?,
            sstart: number(&fields, 8, "sstart")?,
            send: number(&fields, 9, "send")?,
            evalue: fields[10].trim().to_string(),
            bitscore: fields[11].trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CdsSpan {
    pub product: String,
    pub start: usize,
    pub end: usize,
    pub complement: bool,
    pub locus: String,
    pub aa_length: usize,
}

impl CdsSpan {
    fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos <= self.end
    }

    fn describe(&self) -> String {
        format!(
            "\n\t{} \n\tlength: {} \n\t{}-{} \n\t{} \n\t{}",
            self.product,
            self.aa_length,
            self.start,
            self.end,
            if self.complement { "complement" } else { "forward" },
            self.locus
        )
    }
}

#[derive(Debug, PartialEq)]
pub enum Placement<'a> {
    /// Both ends fall in the same CDS.
    Within(&'a CdsSpan),
    /// The ends fall in different CDS, or one of them in none.
    Spanning {
        start: Option<&'a CdsSpan>,
        end: Option<&'a CdsSpan>,
    },
    Outside,
}

impl Placement<'_> {
    pub fn describe(&self) -> Option<String> {
        let not_found = || "\n\tnot found".to_string();
        match self {
            Placement::Within(span) => Some(format!("\nhit started and ended in {}\n", span.describe())),
            Placement::Spanning { start, end } => {
                let describe = |span: &Option<&CdsSpan>| span.map(CdsSpan::describe).unwrap_or_else(not_found);
                Some(format!(
                    "\nhit started in {}\nhit ended in {}\n",
                    describe(start),
                    describe(end)
                ))
            }
            Placement::Outside => None,
        }
    }
}

/// CDS coordinates of one genome, in file order.
#[derive(Debug, Default)]
pub struct FeatureIndex {
    spans: Vec<CdsSpan>,
}

impl FeatureIndex {
    pub fn from_records(records: &[Record]) -> Self {
        let mut spans = Vec::new();
        for record in records {
            for feature in record.cds() {
                let location = match feature.parse_location() {
                    Ok(location) => location,
                    Err(e) => {
                        warn!("{}: {}; skipping CDS", record.name(), e);
                        continue;
                    }
                };
                let mut product = feature.first("product").unwrap_or("unknown").to_string();
                if let Some(extra) = feature.first("interpro_product") {
                    product.push_str(" | ");
                    product.push_str(extra);
                }
                spans.push(CdsSpan {
                    product,
                    start: location.start(),
                    end: location.end(),
                    complement: location.strand() == Strand::Reverse,
                    locus: feature.locus_tag().unwrap_or("unknown").to_string(),
                    aa_length: feature.first("translation").map_or(0, |t| t.chars().count()),
                });
            }
        }
        FeatureIndex { spans }
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    fn first_containing(&self, pos: usize) -> Option<usize> {
        self.spans.iter().position(|s| s.contains(pos))
    }

    pub fn locate(&self, from: usize, to: usize) -> Placement<'_> {
        match (self.first_containing(from), self.first_containing(to)) {
            (None, None) => Placement::Outside,
            (Some(a), Some(b)) if a == b => Placement::Within(&self.spans[a]),
            (a, b) => Placement::Spanning {
                start: a.map(|i| &self.spans[i]),
                end: b.map(|i| &self.spans[i]),
            },
        }
    }
}

/// Drops the suffixes the other subcommands add to genome file names.
pub fn genome_label(file_name: &str) -> String {
    file_name
        .replace(".gbk", "")
        .replace("_colour", "")
        .replace("_NEW", "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genbank::tests::sample_records;

    #[test]
    fn parses_outfmt6() {
        let hit = BlastHit::parse_line(
            "q1\ts1\t98.50\t120\t2\t0\t1\t360\t1000\t1359\t1e-50\t250\t400\t500",
        )
        .unwrap();
        assert_eq!(hit.length, 120);
        assert_eq!((hit.qstart, hit.qend, hit.sstart, hit.send), (1, 360, 1000, 1359));
        assert!((hit.pident - 98.5).abs() < 1e-9);
        assert_eq!(hit.evalue, "1e-50");
    }

    #[test]
    fn rejects_short_or_garbled_rows() {
        assert_eq!(
            BlastHit::parse_line("a\tb\tc"),
            Err(BlastError::TooFewColumns(3))
        );
        assert!(matches!(
            BlastHit::parse_line("q\ts\tx\t1\t0\t0\t1\t2\t3\t4\t1e-5\t9"),
            Err(BlastError::BadNumber { column: 2, .. })
        ));
    }

    #[test]
    fn locates_hits_against_cds() {
        let index = FeatureIndex::from_records(&sample_records());
        assert_eq!(index.len(), 2);

        match index.locate(5, 20) {
            Placement::Within(span) => {
                assert_eq!(span.locus, "PA1_0001");
                assert_eq!(span.aa_length, 10);
                assert!(!span.complement);
            }
            other => panic!("unexpected {:?}", other),
        }

        match index.locate(25, 45) {
            Placement::Spanning { start, end } => {
                assert_eq!(start.unwrap().locus, "PA1_0001");
                assert_eq!(end.unwrap().locus, "PA1_0002");
                assert!(end.unwrap().complement);
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            index.locate(35, 45),
            Placement::Spanning { start: None, end: Some(_) }
        ));
        assert_eq!(index.locate(100, 110), Placement::Outside);
    }

    #[test]
    fn descriptions_follow_the_report_layout() {
        let index = FeatureIndex::from_records(&sample_records());
        let text = index.locate(5, 20).describe().unwrap();
        assert_eq!(
            text,
            "\nhit started and ended in \n\thypothetical protein \n\tlength: 10 \n\t1-30 \n\tforward \n\tPA1_0001\n"
        );
        assert!(index.locate(100, 110).describe().is_none());
    }

    #[test]
    fn one_sided_hits_report_the_missing_end() {
        let index = FeatureIndex::from_records(&sample_records());
        assert_eq!(
            index.locate(35, 45).describe().unwrap(),
            "\nhit started in \n\tnot found\nhit ended in \n\tterminase large subunit with a rather long product description that wraps \n\tlength: 10 \n\t40-69 \n\tcomplement \n\tPA1_0002\n"
        );
    }

    #[test]
    fn labels_strip_pipeline_suffixes() {
        assert_eq!(genome_label("PA-1_NEW_colour.gbk"), "PA-1");
    }
}
