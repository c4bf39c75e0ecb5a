//! Artemis/Easyfig style `/colour` and `/note` qualifiers from `/function`.
//!
//! Colour indices:
//!
//! | idx | colour         | idx | colour         |
//! |-----|----------------|-----|----------------|
//! | 0   | white          | 9   | light sky blue |
//! | 1   | dark grey      | 10  | orange         |
//! | 2   | red            | 11  | brown          |
//! | 3   | green          | 12  | pale pink      |
//! | 4   | blue           | 13  | light grey     |
//! | 5   | cyan           | 14  | black          |
//! | 6   | magenta        | 15  | mid red        |
//! | 7   | yellow         | 16  | light red      |
//! | 8   | pale green     | 17  | pink           |

use crate::genbank::{Feature, Qualifier};

/// Function category → colour index. Built once and handed to the rewrite.
#[derive(Debug, Clone)]
pub struct ColourScheme {
    colours: Vec<(String, u8)>,
}

impl Default for ColourScheme {
    fn default() -> Self {
        ColourScheme::new([
            ("head and packaging", 6),
            ("transcription regulation", 7),
            ("other", 9),
            ("lysis", 4),
            ("unknown function", 5),
            ("connector", 2),
            ("tail", 3),
            ("DNA, RNA and nucleotide metabolism", 17),
            ("moron, auxiliary metabolic gene and host takeover", 10),
        ])
    }
}

impl ColourScheme {
    pub fn new<'a, I>(colours: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, u8)>,
    {
        ColourScheme {
            colours: colours
                .into_iter()
                .map(|(function, colour)| (function.to_string(), colour))
                .collect(),
        }
    }

    pub fn colour_of(&self, function: &str) -> Option<u8> {
        self.colours
            .iter()
            .find(|(f, _)| f == function)
            .map(|(_, c)| *c)
    }
}

/// Copies `/function` into `/note` and assigns `/colour`.
///
/// Returns the first function value, or `None` when the feature has no
/// `/function` and was left untouched.
pub fn colour_feature(feature: &mut Feature, scheme: &ColourScheme) -> Option<String> {
    let functions: Vec<String> = feature.values("function").map(str::to_string).collect();
    let primary = functions.first()?.clone();

    let mut notes: Vec<String> = feature.values("note").map(str::to_string).collect();
    for function in &functions {
        if !notes.contains(function) {
            notes.push(function.clone());
        }
    }
    let colour = scheme.colour_of(&primary);

    let old = std::mem::take(feature.qualifiers_mut());
    let mut rewritten = Vec::with_capacity(old.len() + notes.len() + 1);
    let mut placed = false;
    for qualifier in old {
        match qualifier.key.as_str() {
            "function" if !placed => {
                rewritten.extend(functions.iter().map(|f| Qualifier::quoted("function", f)));
                rewritten.extend(notes.iter().map(|n| Qualifier::quoted("note", n)));
                if let Some(c) = colour {
                    rewritten.push(Qualifier::bare("colour", &c.to_string()));
                }
                placed = true;
            }
            "function" | "note" => {}
            "colour" if colour.is_some() => {}
            _ => rewritten.push(qualifier),
        }
    }
    feature.set_qualifiers(rewritten);
    Some(primary)
}

/// `X_NEW.gbk` → `X_colour.gbk`, otherwise `X.gbk` → `X_colour.gbk`.
pub fn coloured_file_name(name: &str) -> String {
    if name.contains("_NEW") {
        name.replace("_NEW", "_colour")
    } else {
        name.replace(".gbk", "_colour.gbk")
    }
}
