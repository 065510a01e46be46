use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::MatchPolicy;

/// Classification of a filename as a canonical dump or a derived edit.
/// Advisory only: it feeds match confidence, it never filters candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Canonical,
    Hack,
    Mod,
    Prototype,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub base: String,
    pub region: Option<String>,
    pub variant: Variant,
}

lazy_static! {
    // (...) [...] {...} annotation groups carrying region/language/dump tags
    static ref ANNOTATION: Regex =
        Regex::new(r"\(([^)]*)\)|\[([^\]]*)\]|\{([^}]*)\}").unwrap();
    // A 1-4 character alphanumeric extension after the final dot. Anything
    // longer (or containing spaces) is part of the title, not an extension.
    static ref EXTENSION: Regex = Regex::new(r"\.[0-9A-Za-z]{1,4}$").unwrap();
    static ref VERSION_SUFFIX: Regex =
        Regex::new(r"(?i)\s+(?:v\d+(?:\.\d+)*|rev\s*[0-9A-Za-z])$").unwrap();
    static ref VERSION_TOKEN: Regex = Regex::new(r"(?i)^v\d+(?:\.\d+)*$").unwrap();
    // GoodTools-style codes: [h], [h1], [p2] mark hacks/pirates, [t], [T+Eng]
    // mark translations
    static ref HACK_CODE: Regex = Regex::new(r"(?i)^[hp]\d*[a-z]?$").unwrap();
    static ref TRANS_CODE: Regex = Regex::new(r"(?i)^t(?:[+-].*)?\d*$").unwrap();
}

const REGION_TOKENS: &[(&str, &str)] = &[
    ("usa", "USA"),
    ("us", "USA"),
    ("u", "USA"),
    ("japan", "Japan"),
    ("jp", "Japan"),
    ("j", "Japan"),
    ("europe", "Europe"),
    ("eu", "Europe"),
    ("e", "Europe"),
    ("world", "World"),
    ("w", "World"),
    ("asia", "Asia"),
    ("a", "Asia"),
    ("korea", "Korea"),
    ("k", "Korea"),
    ("china", "China"),
    ("brazil", "Brazil"),
];

const HACK_KEYWORDS: &[&str] = &[
    "hack", "hacked", "pirate", "unlicensed", "unl", "bootleg", "homebrew",
];
const MOD_KEYWORDS: &[&str] = &["mod", "translation", "trans", "patch", "patched"];
const PROTOTYPE_KEYWORDS: &[&str] = &["proto", "prototype", "beta", "sample", "demo", "alpha"];

/// Reduces raw filenames to a comparable base name and classifies the
/// region and variant tags found along the way. Total (any input yields a
/// valid output) and idempotent on its own base names.
pub struct NameNormalizer {
    region_tokens: Vec<(String, String)>,
    hack_keywords: Vec<String>,
    mod_keywords: Vec<String>,
    prototype_keywords: Vec<String>,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        NameNormalizer::from_policy(&MatchPolicy::default())
    }
}

impl NameNormalizer {
    /// Built-in token tables extended by the policy's configured extras.
    pub fn from_policy(policy: &MatchPolicy) -> Self {
        let mut region_tokens: Vec<(String, String)> = REGION_TOKENS
            .iter()
            .map(|(token, canonical)| (token.to_string(), canonical.to_string()))
            .collect();
        for (token, canonical) in &policy.region_tokens {
            region_tokens.push((token.to_lowercase(), canonical.clone()));
        }

        let extend = |builtin: &[&str], extra: &[String]| -> Vec<String> {
            builtin
                .iter()
                .map(|k| k.to_string())
                .chain(extra.iter().map(|k| k.to_lowercase()))
                .collect()
        };

        NameNormalizer {
            region_tokens,
            hack_keywords: extend(HACK_KEYWORDS, &policy.hack_keywords),
            mod_keywords: extend(MOD_KEYWORDS, &policy.mod_keywords),
            prototype_keywords: extend(PROTOTYPE_KEYWORDS, &policy.prototype_keywords),
        }
    }

    pub fn normalize(&self, raw: &str) -> Normalized {
        let mut region: Option<String> = None;
        let mut variant: Option<Variant> = None;

        let stem = EXTENSION.replace(raw.trim(), "").into_owned();

        // Annotation groups carry the region and most variant markers; read
        // them before stripping. First recognized region token wins. Region
        // codes only count inside parentheses; bracket groups hold dump
        // codes, where "[a]" is an alternate version, not Asia.
        for caps in ANNOTATION.captures_iter(&stem) {
            let parenthesized = caps.get(1).is_some();
            let inner = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or("");
            for token in inner.split(',') {
                let token = token.trim().to_lowercase();
                if token.is_empty() {
                    continue;
                }
                if parenthesized && region.is_none() {
                    if let Some(canonical) = self.region_for(&token) {
                        region = Some(canonical);
                        continue;
                    }
                }
                if variant.is_none() {
                    variant = self.classify_annotation(&token);
                }
            }
        }

        let mut name = ANNOTATION.replace_all(&stem, "").into_owned();

        if VERSION_SUFFIX.is_match(&name) {
            name = VERSION_SUFFIX.replace(&name, "").into_owned();
            variant = variant.or(Some(Variant::Hack));
        }

        // Bare keywords ("Hack", "Translation") anywhere in the remaining
        // words classify but are kept in the base, matching how catalogs
        // name such entries.
        if variant.is_none() {
            for word in name.split_whitespace() {
                let word = word
                    .trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase();
                if let Some(found) = self.classify_keyword(&word) {
                    variant = Some(found);
                    break;
                }
            }
        }

        let base = name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .trim_matches(|c: char| matches!(c, ' ' | '-' | '_'))
            .to_string();

        let variant = variant.unwrap_or(if base.is_empty() {
            Variant::Unknown
        } else {
            Variant::Canonical
        });

        Normalized {
            base,
            region,
            variant,
        }
    }

    fn region_for(&self, token: &str) -> Option<String> {
        self.region_tokens
            .iter()
            .find(|(candidate, _)| candidate == token)
            .map(|(_, canonical)| canonical.clone())
    }

    fn classify_annotation(&self, token: &str) -> Option<Variant> {
        if HACK_CODE.is_match(token) || VERSION_TOKEN.is_match(token) {
            return Some(Variant::Hack);
        }
        if TRANS_CODE.is_match(token) {
            return Some(Variant::Mod);
        }
        for word in token.split_whitespace() {
            if let Some(variant) = self.classify_keyword(word) {
                return Some(variant);
            }
        }
        None
    }

    fn classify_keyword(&self, word: &str) -> Option<Variant> {
        if self.prototype_keywords.iter().any(|k| k == word) {
            Some(Variant::Prototype)
        } else if self.mod_keywords.iter().any(|k| k == word) {
            Some(Variant::Mod)
        } else if self.hack_keywords.iter().any(|k| k == word) {
            Some(Variant::Hack)
        } else {
            None
        }
    }
}

/// Lowercased alphanumeric word tokens, used for candidate pre-filtering and
/// the token-overlap guard in similarity scoring.
pub fn word_tokens(s: &str) -> Vec<String> {
    s.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}
