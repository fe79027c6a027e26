//! Placeholder substitution for reference parameters.
//!
//! A query may embed `${NAME}` to splice in the current value of parameter
//! `NAME`. The value is inserted verbatim; quoting is up to the query author.

pub fn placeholder(ref_name: &str) -> String {
    format!("${{{ref_name}}}")
}

/// Replaces every `${ref_name}` in `query` with `ref_value`. Must run before
/// the query is evaluated.
pub fn substitute(query: &str, ref_name: &str, ref_value: &str) -> String {
    if ref_name.is_empty() {
        return query.to_string();
    }
    query.replace(&placeholder(ref_name), ref_value)
}

/// Names of all `${...}` placeholders in `query`, in order of appearance.
pub fn placeholder_names(query: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = query;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = &after[..end];
        if !name.is_empty() && !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
        rest = &after[end + 1..];
    }
    names
}
