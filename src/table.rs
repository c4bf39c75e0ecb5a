//! Plain tables: the first `<table>` of an HTML report, and headed TSV files.

use anyhow::{Context, Result};
use regex::Regex;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h.trim() == name)
    }

    /// Rows whose `column` parses as a number strictly greater than `threshold`.
    pub fn rows_above(&self, column: usize, threshold: f64) -> Vec<&Vec<String>> {
        self.rows
            .iter()
            .filter(|row| {
                row.get(column)
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .is_some_and(|v| v > threshold)
            })
            .collect()
    }

    pub fn read_tsv<R: BufRead>(reader: R) -> Result<Table> {
        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(line) => split_tsv(&line.context("reading TSV header")?),
            None => return Ok(Table::default()),
        };
        let mut rows = Vec::new();
        for (idx, line) in lines.enumerate() {
            let line = line.with_context(|| format!("reading TSV line {}", idx + 2))?;
            if line.trim().is_empty() {
                continue;
            }
            rows.push(split_tsv(&line));
        }
        Ok(Table { header, rows })
    }

    pub fn write_tsv(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{}", self.header.join("\t"))?;
        for row in &self.rows {
            writeln!(out, "{}", row.join("\t"))?;
        }
        Ok(())
    }
}

fn split_tsv(line: &str) -> Vec<String> {
    line.trim_end_matches('\r')
        .split('\t')
        .map(str::to_string)
        .collect()
}

/// Pulls the first table out of an HTML document.
pub struct HtmlTableParser {
    table: Regex,
    row: Regex,
    cell: Regex,
    tag: Regex,
    space: Regex,
}

impl HtmlTableParser {
    pub fn new() -> Result<Self> {
        Ok(HtmlTableParser {
            table: Regex::new(r"(?is)<table\b[^>]*>(.*?)</table\s*>")?,
            row: Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr\s*>")?,
            cell: Regex::new(r"(?is)<(t[hd])\b[^>]*>(.*?)</t[hd]\s*>")?,
            tag: Regex::new(r"(?s)<[^>]*>")?,
            space: Regex::new(r"\s+")?,
        })
    }

    /// `None` when the document has no table.
    ///
    /// The header is the first row made only of `<th>` cells, or the first
    /// row when there is none.
    pub fn first_table(&self, html: &str) -> Option<Table> {
        let body = self.table.captures(html)?.get(1)?.as_str();
        let mut rows: Vec<(bool, Vec<String>)> = Vec::new();
        for row in self.row.captures_iter(body) {
            let Some(inner) = row.get(1) else { continue };
            let mut all_headers = true;
            let mut cells = Vec::new();
            for cell in self.cell.captures_iter(inner.as_str()) {
                all_headers &= cell[1].eq_ignore_ascii_case("th");
                cells.push(self.cell_text(&cell[2]));
            }
            if !cells.is_empty() {
                rows.push((all_headers, cells));
            }
        }
        if rows.is_empty() {
            return None;
        }
        let header_idx = rows.iter().position(|(is_header, _)| *is_header).unwrap_or(0);
        let header = rows.remove(header_idx).1;
        Some(Table {
            header,
            rows: rows
                .into_iter()
                .filter(|(is_header, _)| !is_header)
                .map(|(_, cells)| cells)
                .collect(),
        })
    }

    fn cell_text(&self, raw: &str) -> String {
        let stripped = self.tag.replace_all(raw, " ");
        let decoded = decode_entities(&stripped);
        self.space.replace_all(decoded.trim(), " ").into_owned()
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const REPORT: &str = r#"<html><body>
<h1>PhageDPO</h1>
<table class="dataframe" border="1">
  <thead>
    <tr style="text-align: right;"><th>Protein</th><th>model DPO Prediction (%)</th></tr>
  </thead>
  <tbody>
    <tr><td>PA1_0042 <b>tail</b>
        spike</td><td>97.5</td></tr>
    <tr><td>PA1_0007 &amp; co</td><td>12.0</td></tr>
  </tbody>
</table>
<table><tr><th>ignored</th></tr></table>
</body></html>"#;

    #[test]
    fn extracts_first_table() {
        let table = HtmlTableParser::new().unwrap().first_table(REPORT).unwrap();
        assert_eq!(table.header, vec!["Protein", "model DPO Prediction (%)"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["PA1_0042 tail spike".to_string(), "97.5".to_string()],
                vec!["PA1_0007 & co".to_string(), "12.0".to_string()],
            ]
        );
    }

    #[test]
    fn headerless_table_uses_first_row() {
        let html = "<TABLE><TR><TD>a</TD><TD>b</TD></TR><TR><TD>1</TD><TD>2</TD></TR></TABLE>";
        let table = HtmlTableParser::new().unwrap().first_table(html).unwrap();
        assert_eq!(table.header, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn no_table_is_none() {
        assert!(HtmlTableParser::new()
            .unwrap()
            .first_table("<p>nothing here</p>")
            .is_none());
    }

    #[test]
    fn tsv_threshold_filter() {
        let text = "Protein\tmodel DPO Prediction (%)\nA\t97.5\nB\t85.0\nC\tn/a\nD\t85.1\n";
        let table = Table::read_tsv(Cursor::new(text)).unwrap();
        let column = table.column("model DPO Prediction (%)").unwrap();
        let kept: Vec<&str> = table
            .rows_above(column, 85.0)
            .iter()
            .map(|r| r[0].as_str())
            .collect();
        assert_eq!(kept, vec!["A", "D"]);
        assert_eq!(table.column("missing"), None);
    }
}
