use crate::files::{ensure_dir, file_name, files_with_suffix, open_output, open_reader, subdirectories};
use crate::table::HtmlTableParser;
use anyhow::{Context, Result};
use log::{info, warn};
use std::io::{Read, Write};
use std::path::Path;

pub struct DpoHtmlConfig<'a> {
    pub results_folder: &'a Path,
    pub output_folder: &'a Path,
}

pub fn run(cfg: &DpoHtmlConfig) -> Result<()> {
    let out_dir = cfg.output_folder.join(file_name(cfg.results_folder));
    ensure_dir(&out_dir)?;
    let parser = HtmlTableParser::new()?;

    let mut converted = 0;
    for dir in subdirectories(cfg.results_folder)? {
        let name = file_name(&dir);
        for html in files_with_suffix(&dir, ".html")? {
            let out_path = out_dir.join(format!("{}.tsv", name));
            match convert(&parser, &html, &out_path) {
                Ok(true) => {
                    info!("{} -> {}", html.display(), out_path.display());
                    converted += 1;
                }
                Ok(false) => warn!("no table in {}; skipping", html.display()),
                Err(e) => warn!("{}: {:#}; skipping", html.display(), e),
            }
        }
    }
    info!("converted {} PhageDPO reports", converted);
    Ok(())
}

fn convert(parser: &HtmlTableParser, html: &Path, out_path: &Path) -> Result<bool> {
    let mut text = String::new();
    open_reader(html)?
        .read_to_string(&mut text)
        .with_context(|| format!("reading {}", html.display()))?;
    let Some(table) = parser.first_table(&text) else {
        return Ok(false);
    };
    let mut out = open_output(out_path)?;
    table.write_tsv(&mut *out)?;
    out.flush()?;
    Ok(true)
}
