use crate::blast::{genome_label, BlastHit, FeatureIndex};
use crate::files::{ensure_dir, open_output, open_reader, uncompressed_name};
use crate::genbank::parse_genbank;
use anyhow::{Context, Result};
use log::{info, warn};
use std::io::{BufRead, Write};
use std::path::Path;

pub const REPORT_NAME: &str = "SUMMARY_tsv_gbk_retreive_results.txt";

pub struct RetrieveConfig<'a> {
    pub input_tsv: &'a Path,
    pub gbk1: &'a Path,
    pub gbk2: &'a Path,
    pub output_folder: &'a Path,
}

struct Genome {
    label: String,
    index: FeatureIndex,
}

impl Genome {
    fn load(path: &Path) -> Result<Genome> {
        let records = parse_genbank(path)?;
        let index = FeatureIndex::from_records(&records);
        if index.is_empty() {
            warn!("no CDS in {}; every hit against it is reported as not found", path.display());
        } else {
            info!("indexed {} CDS from {}", index.len(), path.display());
        }
        Ok(Genome {
            label: genome_label(&uncompressed_name(path)),
            index,
        })
    }
}

pub fn run(cfg: &RetrieveConfig) -> Result<()> {
    ensure_dir(cfg.output_folder)?;
    let first = Genome::load(cfg.gbk1)?;
    let second = Genome::load(cfg.gbk2)?;

    let out_path = cfg.output_folder.join(REPORT_NAME);
    let mut out = open_output(&out_path)?;
    let reader = open_reader(cfg.input_tsv)?;
    let mut reported = 0;
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading {} line {}", cfg.input_tsv.display(), idx + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let hit = match BlastHit::parse_line(&line) {
            Ok(hit) => hit,
            Err(e) => {
                warn!("{} line {}: {}; skipping", cfg.input_tsv.display(), idx + 1, e);
                continue;
            }
        };
        write_hit(idx + 1, &hit, &first, &second, &mut *out)?;
        reported += 1;
    }
    out.flush()?;
    info!("reported {} hits to {}", reported, out_path.display());
    Ok(())
}

fn coords(from: usize, to: usize) -> String {
    format!("('{}', '{}')", from, to)
}

fn write_hit(
    number: usize,
    hit: &BlastHit,
    first: &Genome,
    second: &Genome,
    out: &mut dyn Write,
) -> Result<()> {
    let query = first.index.locate(hit.qstart, hit.qend).describe();
    let subject = second.index.locate(hit.sstart, hit.send).describe();
    match (query, subject) {
        (Some(query), Some(subject)) => {
            write!(
                out,
                "\n******************************\nHit {}:\n\thit length: {}\n\tpercent identity: {:?}\n\tevalue: {}\n******************************\n\n",
                number, hit.length, hit.pident, hit.evalue
            )?;
            write!(out, "for {}: \n\tcoords: {}", first.label, coords(hit.qstart, hit.qend))?;
            writeln!(out, "{}", query)?;
            write!(out, "for {}: \n\tcoords: {}", second.label, coords(hit.sstart, hit.send))?;
            writeln!(out, "{}", subject)?;
        }
        _ => writeln!(
            out,
            "\nCoordinates {} or {} not found in respective gbk file coords.",
            coords(hit.qstart, hit.qend),
            coords(hit.sstart, hit.send)
        )?,
    }
    writeln!(out, "{}", "-".repeat(50))?;
    Ok(())
}
