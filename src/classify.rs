use std::collections::{BTreeMap, HashSet};

pub const DEFAULT_PLACEHOLDERS: [&str; 2] = ["hypothetical protein", "unknown function"];

/// Product strings that mean "no known function", compared case-insensitively.
#[derive(Debug, Clone)]
pub struct Placeholders {
    products: Vec<String>,
}

impl Default for Placeholders {
    fn default() -> Self {
        Placeholders::new(DEFAULT_PLACEHOLDERS)
    }
}

impl Placeholders {
    pub fn new<I, S>(products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Placeholders {
            products: products
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    pub fn contains(&self, product: &str) -> bool {
        let lower = product.trim().to_lowercase();
        self.products.iter().any(|p| *p == lower)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Both pipelines have a real annotation.
    Both,
    /// Only the domain search annotates a placeholder product; new annotation.
    SecondaryOnly,
    /// Only the gene-calling pipeline annotates it.
    PrimaryOnly,
    /// Neither does.
    Hypothetical,
}

impl Category {
    pub fn of(has_secondary_hit: bool, primary_is_placeholder: bool) -> Category {
        match (has_secondary_hit, primary_is_placeholder) {
            (true, false) => Category::Both,
            (true, true) => Category::SecondaryOnly,
            (false, false) => Category::PrimaryOnly,
            (false, true) => Category::Hypothetical,
        }
    }
}

/// Every CDS of a genome sorted into exactly one [`Category`], in file order.
///
/// Entries are per CDS, so repeated locus tags are counted each time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub all: Vec<String>,
    pub both: Vec<String>,
    /// Newly annotated loci with the secondary description that annotated them.
    pub secondary_only: Vec<(String, String)>,
    pub primary_only: Vec<String>,
    pub hypothetical: Vec<String>,
}

impl Classification {
    pub fn record(&mut self, locus: &str, category: Category, secondary: Option<&str>) {
        self.all.push(locus.to_string());
        match category {
            Category::Both => self.both.push(locus.to_string()),
            Category::SecondaryOnly => {
                self.secondary_only
                    .push((locus.to_string(), secondary.unwrap_or_default().to_string()));
            }
            Category::PrimaryOnly => self.primary_only.push(locus.to_string()),
            Category::Hypothetical => self.hypothetical.push(locus.to_string()),
        }
    }

    /// Loci with a secondary hit.
    pub fn secondary_annotated(&self) -> usize {
        self.both.len() + self.secondary_only.len()
    }

    /// Loci whose primary product is not a placeholder.
    pub fn primary_annotated(&self) -> usize {
        self.both.len() + self.primary_only.len()
    }

    /// Category sizes add up to the number of CDS seen.
    #[cfg(test)]
    pub fn counts_add_up(&self) -> bool {
        self.both.len() + self.secondary_only.len() + self.primary_only.len() + self.hypothetical.len()
            == self.all.len()
    }

    /// True when the four categories cover `all` with no locus in two of them.
    /// Fails when locus tags repeat.
    pub fn is_partition(&self) -> bool {
        let members: Vec<&String> = self
            .both
            .iter()
            .chain(self.secondary_only.iter().map(|(locus, _)| locus))
            .chain(self.primary_only.iter())
            .chain(self.hypothetical.iter())
            .collect();
        let unique: HashSet<&String> = members.iter().copied().collect();
        let all: HashSet<&String> = self.all.iter().collect();
        unique.len() == members.len() && unique == all
    }
}

/// Classifies `(locus, primary product)` pairs against the loci that have a
/// secondary hit.
pub fn classify<'a, I>(
    loci: I,
    secondary: &BTreeMap<String, String>,
    placeholders: &Placeholders,
) -> Classification
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = Classification::default();
    for (locus, product) in loci {
        let hit = secondary.get(locus).map(String::as_str);
        let category = Category::of(hit.is_some(), placeholders.contains(product));
        out.record(locus, category, hit);
    }
    out
}
