use crate::colour::{colour_feature, coloured_file_name, ColourScheme};
use crate::files::{ensure_dir, find_gbk_paths, open_output, uncompressed_name};
use crate::genbank::{parse_genbank, write_genbank};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

pub struct ColourConfig<'a> {
    pub input_folder: &'a Path,
    pub prefix: &'a str,
    pub output_folder: &'a Path,
    pub scheme: &'a ColourScheme,
}

pub fn run(cfg: &ColourConfig) -> Result<()> {
    let out_dir = cfg.output_folder.join("colour_notes_added");
    ensure_dir(&out_dir)?;

    let gbk_paths = find_gbk_paths(cfg.input_folder, cfg.prefix)?;
    for gbk in &gbk_paths {
        if let Err(e) = colour_file(gbk, &out_dir, cfg.scheme) {
            warn!("{}: {:#}; skipping", gbk.display(), e);
        }
    }
    Ok(())
}

fn colour_file(gbk: &Path, out_dir: &Path, scheme: &ColourScheme) -> Result<()> {
    let mut records = parse_genbank(gbk)?;
    let mut functions = BTreeSet::new();
    for record in records.iter_mut() {
        for feature in record.cds_mut() {
            match colour_feature(feature, scheme) {
                Some(function) => {
                    functions.insert(function);
                }
                None => debug!(
                    "{}: no /function, left as is",
                    feature.locus_tag().unwrap_or("unknown")
                ),
            }
        }
    }

    let out_path = out_dir.join(coloured_file_name(&uncompressed_name(gbk)));
    let mut out = open_output(&out_path)?;
    write_genbank(&records, &mut *out).with_context(|| format!("writing {}", out_path.display()))?;
    out.flush()?;

    info!("finished {} -> {}", gbk.display(), out_path.display());
    for function in &functions {
        if scheme.colour_of(function).is_none() {
            info!("  function category: {} (no colour)", function);
        } else {
            info!("  function category: {}", function);
        }
    }
    Ok(())
}
