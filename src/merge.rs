//! Folding best InterProScan hits back into SPHAE GenBank records.

use crate::besthit::BestHit;
use crate::classify::{classify, Classification, Placeholders};
use crate::genbank::{Feature, Qualifier, Record};
use std::collections::BTreeMap;

pub const SECONDARY_SOURCE: &str = "InterProScan";
pub const SECONDARY_PRODUCT_KEY: &str = "interpro_product";
pub const PRODUCT_SEPARATOR: &str = " | ";

const DEFAULT_PRODUCT: &str = "hypothetical protein";

/// Adds the secondary description to a CDS.
///
/// A placeholder `/product` gets the description appended; a real one is left
/// alone. In both cases `/interpro_product` is inserted right after
/// `/product` and the source name is added to `/source`. Nothing else moves.
pub fn annotate_feature(feature: &mut Feature, secondary: &str, placeholders: &Placeholders) {
    let old = std::mem::take(feature.qualifiers_mut());
    let mut rewritten = Vec::with_capacity(old.len() + 2);
    let mut inserted = false;

    for mut qualifier in old {
        if qualifier.key == "product" && !inserted {
            if let Some(value) = qualifier.value.as_mut() {
                if placeholders.contains(value) {
                    *value = format!("{}{}{}", value, PRODUCT_SEPARATOR, secondary);
                }
            }
            rewritten.push(qualifier);
            rewritten.push(Qualifier::quoted(SECONDARY_PRODUCT_KEY, secondary));
            inserted = true;
        } else {
            rewritten.push(qualifier);
        }
    }
    if !inserted {
        rewritten.push(Qualifier::quoted(SECONDARY_PRODUCT_KEY, secondary));
    }

    match rewritten.iter_mut().find(|q| q.key == "source") {
        Some(source) => {
            let merged = match source.value.as_deref() {
                Some(v) if !v.is_empty() => format!("{}, {}", v, SECONDARY_SOURCE),
                _ => SECONDARY_SOURCE.to_string(),
            };
            source.value = Some(merged);
            source.quoted = true;
        }
        None => rewritten.push(Qualifier::quoted("source", SECONDARY_SOURCE)),
    }

    feature.set_qualifiers(rewritten);
}

/// Rewrites every CDS with a best hit and classifies all CDS loci.
///
/// Loci are classified on the products as read, before any rewrite.
pub fn merge_records(
    records: &mut [Record],
    hits: &BTreeMap<String, BestHit>,
    placeholders: &Placeholders,
) -> Classification {
    let loci: Vec<(String, String)> = records
        .iter()
        .flat_map(|r| r.cds())
        .map(|f| {
            (
                f.locus_tag().unwrap_or_default().to_string(),
                f.first("product").unwrap_or(DEFAULT_PRODUCT).to_string(),
            )
        })
        .collect();
    let descriptions: BTreeMap<String, String> = hits
        .iter()
        .map(|(locus, hit)| (locus.clone(), hit.description.clone()))
        .collect();
    let classification = classify(
        loci.iter().map(|(l, p)| (l.as_str(), p.as_str())),
        &descriptions,
        placeholders,
    );

    for feature in records.iter_mut().flat_map(|r| r.cds_mut()) {
        let Some(hit) = hits.get(feature.locus_tag().unwrap_or_default()) else {
            continue;
        };
        annotate_feature(feature, &hit.description, placeholders);
    }
    classification
}
