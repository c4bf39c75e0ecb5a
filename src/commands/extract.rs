use crate::classify::Placeholders;
use crate::fasta::{write_fasta, FastaRecord};
use crate::files::{ensure_dir, find_gbk_paths, gbk_stem, open_output};
use crate::genbank::{parse_genbank, Feature, Record};
use crate::merge::SECONDARY_PRODUCT_KEY;
use anyhow::{Context, Result};
use log::{info, warn};
use std::io::Write;
use std::path::Path;

pub struct ExtractConfig<'a> {
    pub genomes_folder: &'a Path,
    pub prefix: &'a str,
    pub output_folder: &'a Path,
    pub protein: bool,
    pub placeholders: &'a Placeholders,
}

pub fn run(cfg: &ExtractConfig) -> Result<()> {
    let out_dir = cfg.output_folder.join(cfg.prefix);
    ensure_dir(&out_dir)?;
    let extension = if cfg.protein { "faa" } else { "fasta" };

    for gbk in find_gbk_paths(cfg.genomes_folder, cfg.prefix)? {
        let out_path = out_dir.join(format!("{}.{}", gbk_stem(&gbk), extension));
        match extract_file(&gbk, &out_path, cfg) {
            Ok(n) => info!("wrote {} CDS from {} to {}", n, gbk.display(), out_path.display()),
            Err(e) => warn!("{}: {:#}; skipping", gbk.display(), e),
        }
    }
    Ok(())
}

fn extract_file(gbk: &Path, out_path: &Path, cfg: &ExtractConfig) -> Result<usize> {
    let records = parse_genbank(gbk)?;
    let mut out = open_output(out_path)?;
    let mut written = 0;
    for record in &records {
        for feature in record.cds() {
            let Some(fasta) = cds_record(record, feature, cfg) else {
                continue;
            };
            write_fasta(&fasta, &mut *out)
                .with_context(|| format!("writing {}", out_path.display()))?;
            written += 1;
        }
    }
    out.flush()?;
    Ok(written)
}

/// Product to report: the SPHAE one, or the InterProScan one behind a placeholder.
pub fn description(feature: &Feature, placeholders: &Placeholders) -> String {
    match feature.first("product") {
        Some(product) if !placeholders.contains(product) => product.to_string(),
        _ => feature
            .first(SECONDARY_PRODUCT_KEY)
            .unwrap_or("hypothetical protein")
            .to_string(),
    }
}

fn cds_record(record: &Record, feature: &Feature, cfg: &ExtractConfig) -> Option<FastaRecord> {
    let locus = feature.locus_tag().unwrap_or("unknown");
    let seq = if cfg.protein {
        match feature.first("translation") {
            Some(t) => t.as_bytes().to_vec(),
            None => {
                warn!("{}: no translation; skipping", locus);
                return None;
            }
        }
    } else {
        let location = match feature.parse_location() {
            Ok(location) => location,
            Err(e) => {
                warn!("{}: {}; skipping", locus, e);
                return None;
            }
        };
        match location.extract(&record.sequence) {
            Some(mut seq) => {
                seq.make_ascii_uppercase();
                seq
            }
            None => {
                warn!("{}: location outside the {} bp sequence; skipping", locus, record.sequence.len());
                return None;
            }
        }
    };
    Some(FastaRecord {
        id: locus.to_string(),
        description: format!("{} {}", description(feature, cfg.placeholders), record.id()),
        seq,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genbank::tests::SAMPLE;
    use crate::files::tests::write_gz;
    use crate::genbank::Qualifier;
    use std::fs;

    fn extract(protein: bool) -> String {
        let root = tempfile::tempdir().unwrap();
        let genomes = root.path().join("genomes");
        fs::create_dir_all(&genomes).unwrap();
        fs::write(genomes.join("PA-1.gbk"), SAMPLE).unwrap();
        let out = root.path().join("out");
        let placeholders = Placeholders::default();
        run(&ExtractConfig {
            genomes_folder: &genomes,
            prefix: "PA",
            output_folder: &out,
            protein,
            placeholders: &placeholders,
        })
        .unwrap();
        let name = if protein { "PA/PA-1.faa" } else { "PA/PA-1.fasta" };
        fs::read_to_string(out.join(name)).unwrap()
    }

    #[test]
    fn nucleotide_cds_with_reverse_complement() {
        let text = extract(false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ">PA1_0001 hypothetical protein PA-1.1");
        assert_eq!(lines[1], "ATGAAAAAACTGCTGGCGGTGAGCGCGGCG");
        assert_eq!(
            lines[2],
            ">PA1_0002 terminase large subunit with a rather long product description that wraps PA-1.1"
        );
        // complement(40..69) of the sample sequence
        assert_eq!(lines[3], "CGCAAAATGGCTGGCGTGGTCTGAAGTAAT");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn compressed_genomes_get_plain_output_names() {
        let root = tempfile::tempdir().unwrap();
        let genomes = root.path().join("genomes");
        fs::create_dir_all(&genomes).unwrap();
        write_gz(&genomes.join("PA-1.gbk.gz"), SAMPLE);
        let out = root.path().join("out");
        let placeholders = Placeholders::default();
        run(&ExtractConfig {
            genomes_folder: &genomes,
            prefix: "PA",
            output_folder: &out,
            protein: true,
            placeholders: &placeholders,
        })
        .unwrap();
        let text = fs::read_to_string(out.join("PA/PA-1.faa")).unwrap();
        assert!(text.starts_with(">PA1_0001 hypothetical protein PA-1.1\nMKKLLAVSAA\n"));
    }

    #[test]
    fn protein_mode_uses_translations() {
        let text = extract(true);
        assert_eq!(
            text.lines().filter(|l| !l.starts_with('>')).collect::<Vec<_>>(),
            vec!["MKKLLAVSAA", "MSTPQRWLLK"]
        );
    }

    #[test]
    fn placeholder_products_fall_back_to_interpro() {
        let placeholders = Placeholders::default();
        let feature = Feature::new("CDS", "1..9").with_qualifiers(vec![
            Qualifier::quoted("product", "hypothetical protein | GGDEF domain"),
            Qualifier::quoted("interpro_product", "GGDEF domain"),
        ]);
        assert_eq!(
            description(&feature, &placeholders),
            "hypothetical protein | GGDEF domain"
        );

        let feature = Feature::new("CDS", "1..9").with_qualifiers(vec![
            Qualifier::quoted("product", "Hypothetical Protein"),
            Qualifier::quoted("interpro_product", "GGDEF domain"),
        ]);
        assert_eq!(description(&feature, &placeholders), "GGDEF domain");

        let bare = Feature::new("CDS", "1..9");
        assert_eq!(description(&bare, &placeholders), "hypothetical protein");
    }
}
