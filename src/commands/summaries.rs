use crate::files::{file_name, files_with_suffix, open_output, subdirectories};
use anyhow::{Context, Result};
use log::{info, warn};
use std::fs;
use std::io::Write;
use std::path::Path;

pub const OUTPUT_NAME: &str = "allsummaries.txt";

pub struct SummariesConfig<'a> {
    pub input_folder: &'a Path,
    pub prefix: &'a str,
}

pub fn run(cfg: &SummariesConfig) -> Result<()> {
    let out_path = cfg.input_folder.join(OUTPUT_NAME);
    let mut out = open_output(&out_path)?;
    let mut count = 0;

    for dir in subdirectories(cfg.input_folder)? {
        let dir_name = file_name(&dir);
        if !dir_name.starts_with(cfg.prefix) {
            continue;
        }
        for summary in files_with_suffix(&dir, "_summary.txt")? {
            let contents = match fs::read_to_string(&summary) {
                Ok(contents) => contents,
                Err(e) => {
                    warn!("{}: {}; skipping", summary.display(), e);
                    continue;
                }
            };
            writeln!(out, "Contents of {} from {}:", file_name(&summary), dir_name)?;
            writeln!(out, "{}", contents)?;
            count += 1;
        }
    }
    out.flush()
        .with_context(|| format!("writing {}", out_path.display()))?;
    info!("collected {} summaries into {}", count, out_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_prefixed_summaries() {
        let root = tempfile::tempdir().unwrap();
        let input = root.path();
        fs::create_dir_all(input.join("PA-2")).unwrap();
        fs::create_dir_all(input.join("PA-1")).unwrap();
        fs::create_dir_all(input.join("KA-1")).unwrap();
        fs::write(input.join("PA-1/PA-1_NEW_summary.txt"), "one\n").unwrap();
        fs::write(input.join("PA-2/PA-2_NEW_summary.txt"), "two\n").unwrap();
        fs::write(input.join("PA-2/notes.txt"), "ignored\n").unwrap();
        fs::write(input.join("KA-1/KA-1_NEW_summary.txt"), "other\n").unwrap();

        run(&SummariesConfig {
            input_folder: input,
            prefix: "PA",
        })
        .unwrap();

        assert_eq!(
            fs::read_to_string(input.join(OUTPUT_NAME)).unwrap(),
            "Contents of PA-1_NEW_summary.txt from PA-1:\none\n\n\
             Contents of PA-2_NEW_summary.txt from PA-2:\ntwo\n\n"
        );
    }
}
