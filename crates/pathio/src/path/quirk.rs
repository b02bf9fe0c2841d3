use tracing::trace;

/* 📖 # Why is the leading-slash correction a strategy object?

Only one host needs the correction: Cygwin, where the forward-slash path
library reads a leading `//` as the start of a network share. Instead of
checking the target OS inside every path operation, `PathUtils` is built once
with the strategy for its host and calls it unconditionally. Tests can build a
`PathUtils` with either strategy regardless of where they run.
*/

/// Pre-processing applied to path segments before they are joined.
pub trait PathQuirk: std::fmt::Debug + Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns the corrected segment list.
    fn correct_segments(&self, segments: Vec<String>) -> Vec<String>;
}

/// Identity strategy used on every host without a path quirk.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoQuirk;

impl PathQuirk for NoQuirk {
    fn name(&self) -> &'static str {
        "none"
    }

    fn correct_segments(&self, segments: Vec<String>) -> Vec<String> {
        segments
    }
}

/// Leading-slash recount for hosts that treat `//` as a share marker.
///
/// Leading blank segments each count as one slash and are consumed, as are
/// the leading slashes of the first non-blank segment. A tally of exactly two
/// is rebuilt with a single leading slash; any other tally is rebuilt with
/// that many slashes.
///
/// [`PathUtils::join_path`](crate::PathUtils::join_path) collapses separator
/// runs afterwards, so a joined path never keeps `///`. The two-versus-three
/// slash distinction is only visible in the output of
/// [`correct_segments`](PathQuirk::correct_segments).
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadingSlashQuirk;

impl PathQuirk for LeadingSlashQuirk {
    fn name(&self) -> &'static str {
        "leading-slash"
    }

    fn correct_segments(&self, mut segments: Vec<String>) -> Vec<String> {
        let Some(first) = segments.iter().position(|s| !s.trim().is_empty()) else {
            return segments;
        };
        let mut rest = segments.split_off(first);
        let head = rest.remove(0);
        let stripped = head.trim_start_matches('/');
        let tally = first + (head.len() - stripped.len());
        let prefix = if tally == 2 {
            "/".to_string()
        } else {
            "/".repeat(tally)
        };
        trace!(tally, prefix = %prefix, "recounted leading slashes");

        rest.insert(0, format!("{}{}", prefix, stripped));
        rest
    }
}
