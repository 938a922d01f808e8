//! English pluralization the way Rails inflects table names.

use once_cell::sync::Lazy;
use regex::Regex;

/// Words that are their own plural
const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
];

/// Singular to plural rules, most specific first. The first rule that
/// matches is applied.
static PLURAL_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        // irregular
        ("(m)ove$", "${1}oves"),
        ("(s)ex$", "${1}exes"),
        ("(c)hild$", "${1}hildren"),
        ("(m)an$", "${1}en"),
        ("(p)erson$", "${1}eople"),
        // regular
        ("(quiz)$", "${1}zes"),
        ("^(ox)$", "${1}en"),
        ("([m|l])ouse$", "${1}ice"),
        ("(matr|vert|ind)ix|ex$", "${1}ices"),
        ("(x|ch|ss|sh)$", "${1}es"),
        ("([^aeiouy]|qu)y$", "${1}ies"),
        ("(hive)$", "${1}s"),
        ("(?:([^f])fe|([lr])f)$", "${1}${2}ves"),
        ("sis$", "ses"),
        ("([ti])um$", "${1}a"),
        ("(buffal|tomat)o$", "${1}oes"),
        ("(bu)s$", "${1}ses"),
        ("(alias|status)$", "${1}es"),
        ("(octop|vir)us$", "${1}i"),
        ("(ax|test)is$", "${1}es"),
        ("s$", "s"),
        ("$", "s"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(&format!("(?i){}", pattern)).unwrap(), replacement))
    .collect()
});

pub fn is_uncountable(word: &str) -> bool {
    UNCOUNTABLE.iter().any(|w| w.eq_ignore_ascii_case(word))
}

/// Plural form of `word`, e.g. `category` -> `categories`
pub fn pluralize(word: &str) -> String {
    if is_uncountable(word) {
        return word.to_string();
    }
    PLURAL_RULES
        .iter()
        .find(|(re, _)| re.is_match(word))
        .map(|(re, replacement)| re.replace_all(word, *replacement).into_owned())
        .unwrap_or_else(|| word.to_string())
}
