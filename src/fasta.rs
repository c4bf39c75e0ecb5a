use anyhow::Result;
use std::io::Write;

pub const LINE_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct FastaRecord {
    pub id: String,
    pub description: String,
    pub seq: Vec<u8>,
}

impl FastaRecord {
    /// The description alone when it already starts with the id.
    pub fn header(&self) -> String {
        if self.description.is_empty() {
            self.id.clone()
        } else if self.description.split_whitespace().next() == Some(self.id.as_str()) {
            self.description.clone()
        } else {
            format!("{} {}", self.id, self.description)
        }
    }
}

pub fn write_fasta(record: &FastaRecord, out: &mut dyn Write) -> Result<()> {
    writeln!(out, ">{}", record.header())?;
    for chunk in record.seq.chunks(LINE_WIDTH) {
        out.write_all(chunk)?;
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_sixty_columns() {
        let record = FastaRecord {
            id: "PA1_0001".to_string(),
            description: "PA1_0001 portal protein PA-1.1".to_string(),
            seq: vec![b'A'; 130],
        };
        let mut buf = Vec::new();
        write_fasta(&record, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ">PA1_0001 portal protein PA-1.1");
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[3].len(), 10);
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn header_prepends_id_when_needed() {
        let record = FastaRecord {
            id: "x".to_string(),
            description: "some protein".to_string(),
            seq: Vec::new(),
        };
        assert_eq!(record.header(), "x some protein");
    }
}
