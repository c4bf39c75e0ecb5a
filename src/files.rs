use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use log::{info, warn};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Opens a text input, decompressing it when the name ends in `.gz`.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("creating directory {}", path.display()))
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Entries of `dir` sorted by name; unreadable entries are dropped.
pub fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("listing {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();
    Ok(entries)
}

pub fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect())
}

pub fn files_with_suffix(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter(|p| p.is_file() && file_name(p).ends_with(suffix))
        .collect())
}

/// The file name with a trailing `.gz` removed.
pub fn uncompressed_name(path: &Path) -> String {
    let name = file_name(path);
    match name.strip_suffix(".gz") {
        Some(plain) => plain.to_string(),
        None => name,
    }
}

/// File name without `.gbk` or `.gbk.gz`.
pub fn gbk_stem(path: &Path) -> String {
    let name = uncompressed_name(path);
    match name.strip_suffix(".gbk") {
        Some(stem) => stem.to_string(),
        None => name,
    }
}

fn is_prefixed_gbk(path: &Path, prefix: &str) -> bool {
    path.is_file() && file_name(path).starts_with(prefix) && uncompressed_name(path).ends_with(".gbk")
}

/// `<prefix>*.gbk` directly under `root`; if there are none, the whole tree.
pub fn find_gbk_paths(root: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let flat: Vec<PathBuf> = sorted_entries(root)?
        .into_iter()
        .filter(|p| is_prefixed_gbk(p, prefix))
        .collect();
    if !flat.is_empty() {
        info!("found {} .gbk files in {} (flat search)", flat.len(), root.display());
        return Ok(flat);
    }

    let mut found = Vec::new();
    walk(root, prefix, &mut found)?;
    found.sort();
    if found.is_empty() {
        warn!(
            "no .gbk files starting with '{}' found in {} (flat or recursive)",
            prefix,
            root.display()
        );
    } else {
        info!(
            "no flat matches; recursive search found {} under {}",
            found.len(),
            root.display()
        );
    }
    Ok(found)
}

fn walk(dir: &Path, prefix: &str, found: &mut Vec<PathBuf>) -> Result<()> {
    for path in sorted_entries(dir)? {
        if path.is_dir() {
            walk(&path, prefix, found)?;
        } else if is_prefixed_gbk(&path, prefix) {
            found.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Read;

    pub(crate) fn write_gz(path: &Path, text: &str) {
        let mut enc = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        enc.write_all(text.as_bytes()).unwrap();
        enc.finish().unwrap();
    }

    #[test]
    fn flat_matches_win_over_recursive_ones() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("PA-2.gbk"), "").unwrap();
        fs::write(dir.path().join("KA-1.gbk"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/PA-1.gbk"), "").unwrap();

        let found = find_gbk_paths(dir.path(), "PA-").unwrap();
        assert_eq!(found, vec![dir.path().join("PA-2.gbk")]);
    }

    #[test]
    fn falls_back_to_recursive_search() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/PA-9.gbk"), "").unwrap();
        fs::write(dir.path().join("a/PA-1.gbk"), "").unwrap();
        fs::write(dir.path().join("a/PA-1.txt"), "").unwrap();

        let found = find_gbk_paths(dir.path(), "PA-").unwrap();
        assert_eq!(
            found,
            vec![dir.path().join("a/PA-1.gbk"), dir.path().join("a/b/PA-9.gbk")]
        );
        assert!(find_gbk_paths(dir.path(), "KA-").unwrap().is_empty());
    }

    #[test]
    fn gz_inputs_are_decompressed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.txt.gz");
        write_gz(&path, "hello\nworld\n");

        let mut text = String::new();
        open_reader(&path).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "hello\nworld\n");
    }

    #[test]
    fn compressed_gbk_files_are_discovered() {
        let dir = tempfile::tempdir().unwrap();
        write_gz(&dir.path().join("PA-1.gbk.gz"), "");
        fs::write(dir.path().join("PA-2.gbk"), "").unwrap();
        fs::write(dir.path().join("PA-3.fasta.gz"), "").unwrap();

        let found = find_gbk_paths(dir.path(), "PA-").unwrap();
        assert_eq!(
            found,
            vec![dir.path().join("PA-1.gbk.gz"), dir.path().join("PA-2.gbk")]
        );
        assert_eq!(gbk_stem(&found[0]), "PA-1");
        assert_eq!(gbk_stem(&found[1]), "PA-2");
        assert_eq!(uncompressed_name(&found[0]), "PA-1.gbk");
    }
}
