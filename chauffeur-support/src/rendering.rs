//! Text rendering utilities for human-friendly diagnostics.
//!
//! Provides helpers to format resolution chains, type names,
//! and close-match suggestions for command names.

/// Renders a resolution chain as a readable string.
///
/// # Examples
/// ```
/// use chauffeur_support::rendering::render_chain;
///
/// let chain = vec!["PublishDeliverable", "PackageWriter", "Settings"];
/// let rendered = render_chain(&chain);
/// assert_eq!(rendered, "PublishDeliverable → PackageWriter → Settings");
/// ```
pub fn render_chain<S: AsRef<str>>(chain: &[S]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Renders a list of names as `a, b, c`, or `(none)` when empty.
///
/// ```
/// use chauffeur_support::rendering::render_names;
///
/// assert_eq!(render_names(&["pub", "p"]), "pub, p");
/// assert_eq!(render_names::<&str>(&[]), "(none)");
/// ```
pub fn render_names<S: AsRef<str>>(names: &[S]) -> String {
    if names.is_empty() {
        return "(none)".to_string();
    }
    names
        .iter()
        .map(|name| name.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use chauffeur_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::deliverables::PublishDeliverable");
/// assert_eq!(short, "PublishDeliverable");
///
/// let short = shorten_type_name("alloc::rc::Rc<dyn my_app::io::Output>");
/// assert_eq!(short, "Rc<dyn Output>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut current_segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                current_segment.clear();
            }
            '<' | '>' | ',' | ' ' | '&' => {
                result.push_str(&current_segment);
                result.push(ch);
                current_segment.clear();
            }
            _ => {
                current_segment.push(ch);
            }
        }
    }

    result.push_str(&current_segment);
    result
}

/// Levenshtein distance between two strings, counted in chars.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

/// Checks whether two names are "close enough" to be a likely typo.
///
/// Allows one edit per three characters of the longer name, and at least one.
pub fn is_close(a: &str, b: &str) -> bool {
    let longest = a.chars().count().max(b.chars().count());
    edit_distance(a, b) <= (longest / 3).max(1)
}

/// Suggests registered names that look like the requested one.
///
/// Names that extend the request score highest, then near-typos
/// (see [`is_close`]), closer typos first.
/// Comparison is case-insensitive; the original spelling is returned.
///
/// ```
/// use chauffeur_support::rendering::suggest_similar;
///
/// let known = ["publish", "pub", "rollback", "unknown"];
/// let suggestions = suggest_similar("publsh", &known, 2);
/// assert_eq!(suggestions, vec!["publish".to_string()]);
/// ```
pub fn suggest_similar(requested: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    if requested_lower.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();
            if name_lower == requested_lower {
                return None;
            }

            if name_lower.starts_with(&requested_lower) {
                return Some((name, 100));
            }

            if is_close(&requested_lower, &name_lower) {
                let distance = edit_distance(&requested_lower, &name_lower);
                return Some((name, 90usize.saturating_sub(distance * 10)));
            }

            None
        })
        .collect();

    // stable: ties keep the caller's order
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}
