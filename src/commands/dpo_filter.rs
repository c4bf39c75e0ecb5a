use crate::files::{ensure_dir, file_name, files_with_suffix, open_output, open_reader};
use crate::table::Table;
use anyhow::Result;
use log::{info, warn};
use std::io::Write;
use std::path::Path;

pub const PREDICTION_COLUMN: &str = "model DPO Prediction (%)";
pub const DEFAULT_THRESHOLD: f64 = 85.0;

pub struct DpoFilterConfig<'a> {
    pub tsv_folder: &'a Path,
    pub output_folder: &'a Path,
    pub threshold: f64,
}

pub fn run(cfg: &DpoFilterConfig) -> Result<()> {
    let out_dir = cfg.output_folder.join(file_name(cfg.tsv_folder));
    ensure_dir(&out_dir)?;

    for tsv in files_with_suffix(cfg.tsv_folder, ".tsv")? {
        let table = match open_reader(&tsv).and_then(Table::read_tsv) {
            Ok(table) => table,
            Err(e) => {
                warn!("{}: {:#}; skipping", tsv.display(), e);
                continue;
            }
        };
        let Some(column) = table.column(PREDICTION_COLUMN) else {
            warn!("column '{}' not found in {}; skipping", PREDICTION_COLUMN, tsv.display());
            continue;
        };

        let kept = Table {
            header: table.header.clone(),
            rows: table
                .rows_above(column, cfg.threshold)
                .into_iter()
                .cloned()
                .collect(),
        };
        let stem = file_name(&tsv).trim_end_matches(".tsv").to_string();
        let out_path = out_dir.join(format!("{}_top_DPO.tsv", stem));
        let mut out = open_output(&out_path)?;
        kept.write_tsv(&mut *out)?;
        out.flush()?;
        info!(
            "{}: kept {} of {} rows above {}",
            file_name(&tsv),
            kept.rows.len(),
            table.rows.len(),
            cfg.threshold
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn keeps_rows_strictly_above_threshold() {
        let root = tempfile::tempdir().unwrap();
        let tsvs = root.path().join("dpo_tsv");
        fs::create_dir_all(&tsvs).unwrap();
        fs::write(
            tsvs.join("PA-1.tsv"),
            "Protein\tmodel DPO Prediction (%)\nA\t97.5\nB\t85.0\nC\t85.01\n",
        )
        .unwrap();
        fs::write(tsvs.join("broken.tsv"), "Protein\tscore\nA\t99\n").unwrap();
        let out = root.path().join("out");

        run(&DpoFilterConfig {
            tsv_folder: &tsvs,
            output_folder: &out,
            threshold: DEFAULT_THRESHOLD,
        })
        .unwrap();

        assert_eq!(
            fs::read_to_string(out.join("dpo_tsv/PA-1_top_DPO.tsv")).unwrap(),
            "Protein\tmodel DPO Prediction (%)\nA\t97.5\nC\t85.01\n"
        );
        assert!(!out.join("dpo_tsv/broken_top_DPO.tsv").exists());
    }
}
