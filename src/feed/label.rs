//! Canonical display form for free-text changelog labels.

/// The five named references a feed may leave escaped inside label text.
const HTML_ENTITIES: [(&str, char); 5] = [
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&#39;", '\''),
];

/// Fixed spelling for words that plain title-casing would get wrong.
/// Keys are lowercase.
fn canonical_form(lowercase: &str) -> Option<&'static str> {
    match lowercase {
        "github" => Some("GitHub"),
        "api" => Some("API"),
        "apis" => Some("APIs"),
        "oauth" => Some("OAuth"),
        "saml" => Some("SAML"),
        "cli" => Some("CLI"),
        "ci" => Some("CI"),
        "cd" => Some("CD"),
        "cicd" => Some("CI/CD"),
        _ => None,
    }
}

/// Title-cases a changelog label, keeping known acronyms and product names
/// in their canonical spelling.
///
/// HTML entities listed in [`HTML_ENTITIES`] are decoded first, then the
/// label is split on whitespace and every word is either replaced by its
/// canonical form or capitalized with the rest lowercased. Words are joined
/// with single spaces.
///
/// # Examples
///
/// ```
/// use changelog_issues::feed::normalize_label_case;
///
/// assert_eq!(normalize_label_case("github api integration"), "GitHub API Integration");
/// assert_eq!(normalize_label_case("security &amp; compliance"), "Security & Compliance");
/// ```
pub fn normalize_label_case(label: &str) -> String {
    decode_entities(label)
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let lower = word.to_lowercase();
    if let Some(canonical) = canonical_form(&lower) {
        return canonical.to_string();
    }

    // Interior capitals are lowercased too ("macOS" -> "Macos")
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Replaces each of [`HTML_ENTITIES`] in turn, `&amp;` first, so a label
/// escaped twice (`&amp;lt;`) still decodes to its character.
fn decode_entities(input: &str) -> String {
    HTML_ENTITIES
        .iter()
        .fold(input.to_string(), |text, (entity, ch)| {
            if text.contains(*entity) {
                text.replace(*entity, &ch.to_string())
            } else {
                text
            }
        })
}
