use std::path::Path;

/// Characters replaced with a space when deriving an output name.
/// Windows-reserved path characters plus `-` and `_`, which tend to come
/// from broadcast recorders and make titles hard to read.
const REPLACED_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|', '-', '_'];

/// Derive the canonical output stem for a raw source filename.
///
/// Strips the extension component, replaces every reserved character with a
/// space, then collapses whitespace runs and trims the ends. Deterministic
/// and total: every input maps to exactly one output, which may be empty
/// when the name consists only of replaced characters.
pub fn canonical_stem(raw_name: &str) -> String {
    let stem = Path::new(raw_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let replaced: String = stem
        .chars()
        .map(|c| if REPLACED_CHARS.contains(&c) { ' ' } else { c })
        .collect();

    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
