//! Naming conventions for remote entity types.
//!
//! A remote service is addressed by the plural, kebab-cased name of the type
//! it owns: `ExampleRemoteModel` lives at `example-remote-models`.

use convert_case::{Case, Casing};

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("ox", "oxen"),
];

const UNCOUNTABLE: &[&str] = &[
    "data",
    "equipment",
    "fish",
    "information",
    "metadata",
    "news",
    "series",
    "sheep",
    "species",
];

/// Pluralizes the last word of an English identifier.
///
/// Works on `snake_case`, `kebab-case` and `CamelCase` input; only the final
/// word changes and its leading capital is preserved.
///
/// Words ending in `-lf`/`-rf` take `-ves` (`shelf`, `scarf`); other `-f`
/// words just take `-s` (`roof`, `chief`). A single `z` after a vowel is
/// doubled (`quizzes`).
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let split = last_word_start(word);
    let (head, tail) = word.split_at(split);
    let lower = tail.to_lowercase();

    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }

    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == lower) {
        return format!("{head}{}", match_capital(tail, plural));
    }

    let doubles_z = lower.ends_with('z') && !lower.ends_with("zz") && penultimate_is_vowel(&lower);
    let plural_tail = if doubles_z {
        format!("{tail}zes")
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        format!("{tail}es")
    } else if lower.ends_with('y') && !penultimate_is_vowel(&lower) {
        format!("{}ies", &tail[..tail.len() - 1])
    } else if lower.ends_with("fe") && !lower.ends_with("ffe") {
        format!("{}ves", &tail[..tail.len() - 2])
    } else if lower.ends_with("lf") || lower.ends_with("rf") {
        format!("{}ves", &tail[..tail.len() - 1])
    } else {
        format!("{tail}s")
    };

    format!("{head}{plural_tail}")
}

/// Derives the service name for a type: its base name pluralized and kebab-cased.
///
/// Any module path (`crate::models::Shop`) is dropped first.
pub fn derive_plural_name(type_name: &str) -> String {
    let base = type_name.rsplit("::").next().unwrap_or(type_name);
    pluralize(base).to_case(Case::Kebab)
}

fn last_word_start(word: &str) -> usize {
    let mut start = 0;
    let mut prev: Option<char> = None;
    for (idx, ch) in word.char_indices() {
        match prev {
            Some(p) if matches!(p, '_' | '-' | ' ') => start = idx,
            Some(p) if ch.is_uppercase() && !p.is_uppercase() => start = idx,
            _ => {}
        }
        prev = Some(ch);
    }
    start
}

fn penultimate_is_vowel(lower: &str) -> bool {
    let mut chars = lower.chars().rev();
    chars.next();
    matches!(chars.next(), Some('a' | 'e' | 'i' | 'o' | 'u'))
}

fn match_capital(original: &str, replacement: &str) -> String {
    match original.chars().next() {
        Some(first) if first.is_uppercase() => {
            let mut chars = replacement.chars();
            match chars.next() {
                Some(r) => r.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
        _ => replacement.to_string(),
    }
}
