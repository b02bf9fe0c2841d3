//! String-level path algorithms that never touch the filesystem.

use std::path::{Component, MAIN_SEPARATOR, MAIN_SEPARATOR_STR, Path, is_separator};

/// Splits off the volume prefix (`C:`, `\\server\share`) of a path.
///
/// Hosts without volumes always return an empty prefix.
pub(crate) fn split_volume(path: &str) -> (&str, &str) {
    match Path::new(path).components().next() {
        Some(Component::Prefix(prefix)) => {
            let len = prefix.as_os_str().len();
            path.split_at(len)
        }
        _ => ("", path),
    }
}

fn components(rest: &str) -> impl Iterator<Item = &str> {
    rest.split(is_separator).filter(|c| !c.is_empty())
}

fn assemble(volume: &str, rooted: bool, parts: &[&str]) -> String {
    let mut result = String::from(volume);
    if rooted {
        result.push(MAIN_SEPARATOR);
    }
    result.push_str(&parts.join(MAIN_SEPARATOR_STR));
    result
}

/// Cleans a joined path the way a catfile does: separator runs collapse,
/// `.` components and trailing separators are dropped, `..` is kept.
pub(crate) fn tidy(path: &str) -> String {
    let (volume, rest) = split_volume(path);
    let rooted = rest.starts_with(is_separator);
    let parts: Vec<&str> = components(rest).filter(|c| *c != ".").collect();
    if parts.is_empty() && !rooted && !rest.is_empty() {
        return format!("{}.", volume);
    }
    assemble(volume, rooted, &parts)
}

/// Lexical normalization: like [`tidy`] but also folds `..` into its parent.
///
/// `..` directly below the root is dropped, leading `..` of a relative path
/// is kept, and an empty result becomes `.`.
pub(crate) fn normalize(path: &str) -> String {
    let (volume, rest) = split_volume(path);
    let rooted = rest.starts_with(is_separator);
    let mut parts: Vec<&str> = Vec::new();
    for component in components(rest) {
        match component {
            "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    if parts.is_empty() && !rooted {
        return format!("{}.", volume);
    }
    assemble(volume, rooted, &parts)
}

/// Splits a path after its last separator.
///
/// Returns `(volume, directory, file)`; the directory keeps its trailing
/// separator so the three parts concatenate back to the input.
pub(crate) fn split(path: &str) -> (&str, &str, &str) {
    let (volume, rest) = split_volume(path);
    match rest.rfind(is_separator) {
        Some(idx) => {
            // separators are single-byte on every host
            let (directory, file) = rest.split_at(idx + 1);
            (volume, directory, file)
        }
        None => (volume, "", rest),
    }
}

/// POSIX `dirname`: everything before the last component, ignoring
/// trailing separators.
pub(crate) fn dirname(path: &str) -> String {
    let (volume, rest) = split_volume(path);
    if rest.is_empty() {
        return if volume.is_empty() {
            ".".to_string()
        } else {
            volume.to_string()
        };
    }
    let trimmed = rest.trim_end_matches(is_separator);
    if trimmed.is_empty() {
        return format!("{}{}", volume, MAIN_SEPARATOR);
    }
    match trimmed.rfind(is_separator) {
        None if volume.is_empty() => ".".to_string(),
        None => volume.to_string(),
        Some(idx) => {
            let parent = trimmed[..idx].trim_end_matches(is_separator);
            if parent.is_empty() {
                format!("{}{}", volume, MAIN_SEPARATOR)
            } else {
                format!("{}{}", volume, parent)
            }
        }
    }
}
