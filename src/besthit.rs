//! Reduction of InterProScan matches to one best hit per locus.

use crate::interpro::{Evalue, InterproHit};
use std::collections::BTreeMap;

pub const MIN_EVALUE: f64 = 1e-10;
pub const NEXT_BEST_EVALUE: f64 = 1e-15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Hits above this e-value are dropped.
    pub max_evalue: f64,
    /// A more specific runner-up replaces the best hit only at or below this
    /// e-value. `None` promotes it regardless.
    pub promotion_evalue: Option<f64>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            max_evalue: MIN_EVALUE,
            promotion_evalue: Some(NEXT_BEST_EVALUE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BestHit {
    pub locus: String,
    pub description: String,
    pub evalue: Evalue,
}

impl BestHit {
    fn from_hit(hit: &InterproHit) -> Option<Self> {
        Some(BestHit {
            locus: hit.locus.clone(),
            description: hit.description.clone()?,
            evalue: hit.evalue.clone()?,
        })
    }
}

/// Best hit per locus, keyed and ordered by locus tag.
pub fn select_top_hits(hits: &[InterproHit], thresholds: &Thresholds) -> BTreeMap<String, BestHit> {
    let mut groups: BTreeMap<String, Vec<BestHit>> = BTreeMap::new();
    for hit in hits {
        let Some(candidate) = BestHit::from_hit(hit) else {
            continue;
        };
        if candidate.evalue.value > thresholds.max_evalue {
            continue;
        }
        groups
            .entry(candidate.locus.clone())
            .or_default()
            .push(candidate);
    }

    groups
        .into_iter()
        .filter_map(|(locus, group)| pick_best(group, thresholds).map(|best| (locus, best)))
        .collect()
}

fn lowest_evalue(group: &[BestHit]) -> Option<usize> {
    group
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.evalue.value.total_cmp(&b.evalue.value))
        .map(|(idx, _)| idx)
}

/// Lowest e-value wins, unless the runner-up is a longer description that
/// contains the winner's and still clears the promotion threshold.
fn pick_best(mut group: Vec<BestHit>, thresholds: &Thresholds) -> Option<BestHit> {
    let best = group.remove(lowest_evalue(&group)?);
    let Some(next_idx) = lowest_evalue(&group) else {
        return Some(best);
    };
    let next = &group[next_idx];
    let more_specific = next.description.len() > best.description.len()
        && next.description.contains(best.description.as_str());
    let confident = thresholds
        .promotion_evalue
        .map_or(true, |limit| next.evalue.value <= limit);
    if more_specific && confident {
        Some(group.swap_remove(next_idx))
    } else {
        Some(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpro::tests::row;

    fn hit(locus: &str, description: &str, evalue: &str) -> InterproHit {
        InterproHit::parse_line(&row(&format!("PA-1:{locus}"), description, evalue)).unwrap()
    }

    #[test]
    fn prefers_more_specific_runner_up() {
        let hits = vec![
            hit("L1", "GGDEF", "1e-20"),
            hit("L1", "GGDEF diguanylate cyclase", "1e-16"),
        ];
        let top = select_top_hits(&hits, &Thresholds::default());
        assert_eq!(top["L1"].description, "GGDEF diguanylate cyclase");
        assert_eq!(top["L1"].evalue.text, "1e-16");
    }

    #[test]
    fn runner_up_above_promotion_limit_is_ignored() {
        let hits = vec![
            hit("L1", "GGDEF", "1e-20"),
            hit("L1", "GGDEF diguanylate cyclase", "1e-12"),
        ];
        let top = select_top_hits(&hits, &Thresholds::default());
        assert_eq!(top["L1"].description, "GGDEF");

        let lenient = Thresholds {
            promotion_evalue: None,
            ..Thresholds::default()
        };
        let top = select_top_hits(&hits, &lenient);
        assert_eq!(top["L1"].description, "GGDEF diguanylate cyclase");
    }

    #[test]
    fn only_the_runner_up_is_considered() {
        let hits = vec![
            hit("L1", "kinase", "1e-30"),
            hit("L1", "phosphatase", "1e-25"),
            hit("L1", "kinase domain protein", "1e-20"),
        ];
        let top = select_top_hits(&hits, &Thresholds::default());
        assert_eq!(top["L1"].description, "kinase");
    }

    #[test]
    fn equal_descriptions_do_not_promote() {
        let hits = vec![hit("L1", "tail fiber", "1e-30"), hit("L1", "tail fiber", "1e-40")];
        let top = select_top_hits(&hits, &Thresholds::default());
        assert_eq!(top["L1"].evalue.text, "1e-40");
    }

    #[test]
    fn ties_keep_the_first_row() {
        let hits = vec![hit("L1", "first", "1e-30"), hit("L1", "second", "1e-30")];
        let top = select_top_hits(&hits, &Thresholds::default());
        assert_eq!(top["L1"].description, "first");
    }

    #[test]
    fn filters_missing_and_weak_hits() {
        let hits = vec![
            hit("L1", "-", "1e-30"),
            hit("L2", "portal", "-"),
            hit("L3", "capsid", "1e-9"),
            hit("L4", "holin", "1e-10"),
        ];
        let top = select_top_hits(&hits, &Thresholds::default());
        assert_eq!(top.keys().collect::<Vec<_>>(), vec!["L4"]);
    }

    #[test]
    fn empty_input_gives_no_hits() {
        assert!(select_top_hits(&[], &Thresholds::default()).is_empty());
    }

    #[test]
    fn output_is_sorted_by_locus_regardless_of_input_order() {
        let hits = vec![
            hit("L3", "c", "1e-30"),
            hit("L1", "a", "1e-30"),
            hit("L2", "b", "1e-30"),
            hit("L1", "a2", "1e-40"),
        ];
        let top = select_top_hits(&hits, &Thresholds::default());
        assert_eq!(top.keys().collect::<Vec<_>>(), vec!["L1", "L2", "L3"]);
        assert_eq!(top["L1"].description, "a2");
    }

    #[test]
    fn never_returns_hits_above_the_cutoff() {
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };
        let words = ["GGDEF", "GGDEF domain", "lysin", "lysin A", "portal", "-"];
        for _ in 0..200 {
            let hits: Vec<InterproHit> = (0..(next() % 20))
                .map(|_| {
                    let locus = format!("L{}", next() % 5);
                    let desc = words[(next() % words.len() as u64) as usize];
                    let evalue = format!("{}e-{}", 1 + next() % 9, next() % 30);
                    hit(&locus, desc, &evalue)
                })
                .collect();
            for best in select_top_hits(&hits, &Thresholds::default()).values() {
                assert!(best.evalue.value <= MIN_EVALUE);
                assert!(hits.iter().any(|h| h.locus == best.locus
                    && h.description.as_deref() == Some(best.description.as_str())));
            }
        }
    }
}
