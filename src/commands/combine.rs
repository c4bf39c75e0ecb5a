use crate::besthit::{select_top_hits, BestHit, Thresholds};
use crate::classify::{Classification, Placeholders};
use crate::files::{ensure_dir, file_name, files_with_suffix, open_output, subdirectories};
use crate::genbank::{parse_genbank, write_genbank};
use crate::interpro::read_hits;
use crate::merge::merge_records;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

const TOP_HITS_SOURCE: &str = "InterproScan";

pub struct CombineConfig<'a> {
    pub interpro_folder: &'a Path,
    pub prefix: &'a str,
    pub sphae_folder: &'a Path,
    pub output_folder: &'a Path,
    pub thresholds: Thresholds,
    pub placeholders: &'a Placeholders,
}

pub fn run(cfg: &CombineConfig) -> Result<()> {
    let out_root = cfg.output_folder.join(format!("{}_combined", cfg.prefix));
    ensure_dir(&out_root)?;

    let mut combined = 0;
    for genome_dir in subdirectories(cfg.sphae_folder)? {
        let genome = file_name(&genome_dir);
        match combine_genome(cfg, &genome_dir, &genome, &out_root) {
            Ok(true) => combined += 1,
            Ok(false) => {}
            Err(e) => warn!("{}: {:#}; skipping", genome, e),
        }
    }
    info!("combined {} genomes into {}", combined, out_root.display());
    Ok(())
}

/// `Ok(false)` when the genome has no GenBank file or no InterProScan result.
fn combine_genome(cfg: &CombineConfig, genome_dir: &Path, genome: &str, out_root: &Path) -> Result<bool> {
    let Some(gbk_path) = [format!("{}.gbk", genome), format!("{}.gbk.gz", genome)]
        .into_iter()
        .map(|name| genome_dir.join(name))
        .find(|path| path.is_file())
    else {
        warn!("GenBank file not found: {}", genome_dir.join(format!("{}.gbk", genome)).display());
        return Ok(false);
    };
    let Some(interpro_path) = find_interpro_tsv(cfg.interpro_folder, genome)? else {
        warn!("no InterProScan results found for {}; skipping", genome);
        return Ok(false);
    };
    info!("processing {} with {}", gbk_path.display(), interpro_path.display());

    let hits = read_hits(&interpro_path)?;
    info!("found {} InterProScan rows for {}", hits.len(), genome);
    let top_hits = select_top_hits(&hits, &cfg.thresholds);

    let mut records = parse_genbank(&gbk_path)?;
    let classification = merge_records(&mut records, &top_hits, cfg.placeholders);
    if !classification.is_partition() {
        warn!("{}: repeated or missing locus tags; counts are per CDS", genome);
    }

    let rewritten = records
        .iter()
        .flat_map(|r| r.cds())
        .filter(|f| f.is_modified())
        .count();
    debug!("{}: {} CDS rewritten", genome, rewritten);

    let out_dir = out_root.join(genome);
    ensure_dir(&out_dir)?;

    let new_gbk = out_dir.join(format!("{}_NEW.gbk", genome));
    let mut out = open_output(&new_gbk)?;
    write_genbank(&records, &mut *out).with_context(|| format!("writing {}", new_gbk.display()))?;
    out.flush()?;

    let summary_path = out_dir.join(format!("{}_NEW_summary.txt", genome));
    let mut out = open_output(&summary_path)?;
    write_summary(genome, &classification, &mut *out)?;
    out.flush()?;

    let tsv_path = out_dir.join(format!("{}_NEW_top_interpro_hits.tsv", genome));
    let mut out = open_output(&tsv_path)?;
    write_top_hits(&top_hits, &mut *out)?;
    out.flush()?;

    info!(
        "{}: {} CDS, {} newly annotated, {} still hypothetical",
        genome,
        classification.all.len(),
        classification.secondary_only.len(),
        classification.hypothetical.len()
    );
    Ok(true)
}

/// Last `.tsv` inside the InterProScan output directory of the genome.
///
/// Directories named `G` or `G` plus a separator (`G_interpro`, `G.faa`) win;
/// a bare prefix match like `G0` is only used when there is none of those.
pub fn find_interpro_tsv(interpro_folder: &Path, genome: &str) -> Result<Option<PathBuf>> {
    let mut exact = None;
    let mut prefixed = None;
    for dir in subdirectories(interpro_folder)? {
        let name = file_name(&dir);
        let Some(rest) = name.strip_prefix(genome) else {
            continue;
        };
        let Some(last) = files_with_suffix(&dir, ".tsv")?.pop() else {
            continue;
        };
        if rest.chars().next().map_or(true, |c| !c.is_ascii_alphanumeric()) {
            exact = Some(last);
        } else {
            prefixed = Some(last);
        }
    }
    if exact.is_none() && prefixed.is_some() {
        warn!("no InterProScan directory named exactly after {}; using a prefix match", genome);
    }
    Ok(exact.or(prefixed))
}

pub fn write_summary(genome: &str, c: &Classification, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Summary for {}:", genome)?;
    writeln!(out, "Total CDS: {}", c.all.len())?;
    writeln!(out, "Annotated by InterProScan: {}", c.secondary_annotated())?;
    writeln!(out, "Annotated by SPHAE: {}", c.primary_annotated())?;
    writeln!(out, "Annotated by just InterProScan (NEW): {}", c.secondary_only.len())?;
    writeln!(out, "Annotated by just SPHAE: {}", c.primary_only.len())?;
    writeln!(out, "Annotated by both InterProScan and SPHAE: {}", c.both.len())?;
    writeln!(
        out,
        "Fully hypothetical (no SPHAE or Interpro hits): {}",
        c.hypothetical.len()
    )?;
    writeln!(out, "\nNewly annotated CDS:")?;
    for (locus, product) in &c.secondary_only {
        writeln!(out, "\t{} -> {}", locus, product)?;
    }
    Ok(())
}

pub fn write_top_hits(hits: &BTreeMap<String, BestHit>, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Locus\tProduct\tE-value\tSource")?;
    for (locus, hit) in hits {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            locus, hit.description, hit.evalue.text, TOP_HITS_SOURCE
        )?;
    }
    Ok(())
}
