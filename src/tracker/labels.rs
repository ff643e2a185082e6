/// Deterministic label color: six lowercase hex digits derived from the name.
///
/// Uses the 32-bit `hash * 31 + code_unit` string hash over UTF-16 code
/// units, so a given label always gets the same color.
pub fn label_color(name: &str) -> String {
    let hash = name.encode_utf16().fold(0i32, |hash, unit| {
        i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    });
    format!("{:06x}", hash.unsigned_abs() % 0xff_ffff)
}

/// Base label first, then the entry's category labels; blanks and
/// duplicates are dropped, order is kept.
pub fn collect_labels<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for label in candidates.into_iter().flatten() {
        let label = label.trim();
        if !label.is_empty() && !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    }
    labels
}
