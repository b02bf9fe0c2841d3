use std::fs;
use std::io;
use std::path::{MAIN_SEPARATOR, MAIN_SEPARATOR_STR, Path, PathBuf, is_separator};
use std::sync::Arc;

use pathio_base::{PathioError, PathioResult};
use tracing::{debug, instrument};

use super::lexical;
use super::quirk::{LeadingSlashQuirk, NoQuirk, PathQuirk};

/// Volume, directory and file name of a path, as returned by
/// [`PathUtils::split_path`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathParts {
    /// Drive or share prefix; always empty on hosts without volumes.
    pub volume: String,
    /// Everything up to and including the last separator.
    pub directory: String,
    /// Final component; empty when the path ends in a separator.
    pub file: String,
}

impl PathParts {
    /// Concatenates the parts back into a single path.
    pub fn recombine(&self) -> String {
        format!("{}{}{}", self.volume, self.directory, self.file)
    }
}

/// Path joining, normalization and resolution.
///
/// Holds the [`PathQuirk`] strategy for the host. Cloning is cheap.
///
/// ```
/// use pathio::PathUtils;
///
/// let paths = PathUtils::for_host();
/// # #[cfg(unix)]
/// assert_eq!(paths.join_path(&["a", "b", "c.txt"]), "a/b/c.txt");
/// ```
#[derive(Debug, Clone)]
pub struct PathUtils {
    quirk: Arc<dyn PathQuirk>,
}

impl PathUtils {
    /// Picks the quirk strategy for the host this crate was compiled for.
    pub fn for_host() -> Self {
        if cfg!(target_os = "cygwin") {
            Self::with_quirk(LeadingSlashQuirk)
        } else {
            Self::with_quirk(NoQuirk)
        }
    }

    pub fn with_quirk(quirk: impl PathQuirk) -> Self {
        Self {
            quirk: Arc::new(quirk),
        }
    }

    /// Name of the active quirk strategy.
    pub fn quirk_name(&self) -> &'static str {
        self.quirk.name()
    }

    fn prepare<S: AsRef<str>>(&self, segments: &[S]) -> String {
        let owned = segments.iter().map(|s| s.as_ref().to_string()).collect();
        self.quirk.correct_segments(owned).join(MAIN_SEPARATOR_STR)
    }

    /// Joins segments with the host separator.
    ///
    /// Separator runs collapse, `.` components and a trailing separator are
    /// dropped. `..` is kept. A segment starting with a separator does not
    /// discard the segments before it.
    pub fn join_path<S: AsRef<str>>(&self, segments: &[S]) -> String {
        lexical::tidy(&self.prepare(segments))
    }

    /// Joins segments and folds `.`/`..` components without touching the
    /// filesystem.
    pub fn canonicalize<S: AsRef<str>>(&self, segments: &[S]) -> String {
        lexical::normalize(&self.prepare(segments))
    }

    /// Joins segments and splits the result into volume, directory and file.
    pub fn split_path<S: AsRef<str>>(&self, segments: &[S]) -> PathParts {
        let joined = self.join_path(segments);
        let (volume, directory, file) = lexical::split(&joined);
        PathParts {
            volume: volume.to_string(),
            directory: directory.to_string(),
            file: file.to_string(),
        }
    }

    /// Everything but the final component of `path`.
    pub fn dirname(&self, path: &str) -> String {
        lexical::dirname(path)
    }

    /// Absolute path with symlinks and `.`/`..` resolved, or `None` if the
    /// joined path does not exist.
    #[instrument(skip(self, segments), fields(path = tracing::field::Empty))]
    pub fn resolve_real_path<S: AsRef<str>>(
        &self,
        segments: &[S],
    ) -> PathioResult<Option<String>> {
        let joined = self.join_path(segments);
        tracing::Span::current().record("path", joined.as_str());
        let path = Path::new(&joined);
        if joined.is_empty() || !path.exists() {
            debug!("path does not exist");
            return Ok(None);
        }
        match fs::canonicalize(path) {
            Ok(resolved) => {
                let resolved = utf8_path(resolved)?;
                debug!(resolved = %resolved, "resolved real path");
                Ok(Some(resolved))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("path vanished before it could be resolved");
                Ok(None)
            }
            Err(e) => Err(Box::new(PathioError::file_error(path, e))),
        }
    }

    /// Absolute path whose directory part is resolved but whose final
    /// component is taken as given and may not exist.
    ///
    /// The directory part (or the current directory when there is none) must
    /// exist.
    #[instrument(skip(self, segments), fields(path = tracing::field::Empty))]
    pub fn resolve_path_unverified<S: AsRef<str>>(&self, segments: &[S]) -> PathioResult<String> {
        let parts = self.split_path(segments);
        tracing::Span::current().record("path", parts.recombine().as_str());
        let directory = format!("{}{}", parts.volume, parts.directory);

        // `..` is left for the filesystem so it applies after symlinks
        let base = if directory.is_empty() {
            std::env::current_dir().map_err(|e| Box::new(PathioError::file_error(".", e)))?
        } else {
            PathBuf::from(lexical::tidy(&directory))
        };
        let resolved = fs::canonicalize(&base)
            .map_err(|e| Box::new(PathioError::file_error(&base, e)))?;
        let mut resolved = utf8_path(resolved)?;
        debug!(directory = %resolved, file = %parts.file, "resolved directory part");

        if !parts.file.is_empty() {
            if !resolved.ends_with(is_separator) {
                resolved.push(MAIN_SEPARATOR);
            }
            resolved.push_str(&parts.file);
        }
        Ok(resolved)
    }
}

fn utf8_path(path: PathBuf) -> PathioResult<String> {
    path.into_os_string().into_string().map_err(|raw| {
        Box::new(PathioError::message(format!(
            "Resolved path is not valid UTF-8: {}",
            raw.to_string_lossy()
        )))
    })
}

impl Default for PathUtils {
    fn default() -> Self {
        Self::for_host()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths() -> PathUtils {
        PathUtils::with_quirk(NoQuirk)
    }

    fn dir_str(dir: &TempDir) -> String {
        dir.path().to_string_lossy().into_owned()
    }

    #[test]
    fn test_for_host_quirk() {
        let expected = if cfg!(target_os = "cygwin") {
            "leading-slash"
        } else {
            "none"
        };
        assert_eq!(PathUtils::for_host().quirk_name(), expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_join_path() {
        let paths = paths();
        assert_eq!(paths.join_path(&["a", "b", "c.txt"]), "a/b/c.txt");
        assert_eq!(paths.join_path(&["a/", "/b", "./c"]), "a/b/c");
        assert_eq!(paths.join_path(&["", "usr", "lib"]), "/usr/lib");
        assert_eq!(paths.join_path(&["a", "..", "b"]), "a/../b");
        assert_eq!(paths.join_path(vec!["x".to_string(), "y".to_string()].as_slice()), "x/y");
    }

    #[cfg(unix)]
    #[test]
    fn test_join_path_with_quirk() {
        let paths = PathUtils::with_quirk(LeadingSlashQuirk);
        assert_eq!(paths.quirk_name(), "leading-slash");
        assert_eq!(paths.join_path(&["", "", "share", "file"]), "/share/file");
        assert_eq!(paths.join_path(&["a", "b"]), "a/b");
    }

    #[cfg(unix)]
    #[test]
    fn test_canonicalize() {
        let paths = paths();
        assert_eq!(paths.canonicalize(&["a/./b", "..", "c.txt"]), "a/c.txt");
        assert_eq!(paths.canonicalize(&["/", "..", "etc"]), "/etc");
        assert_eq!(paths.canonicalize(&["..", "x"]), "../x");
        assert_eq!(paths.canonicalize(&["a", ".."]), ".");
    }

    #[cfg(unix)]
    #[test]
    fn test_split_path() {
        let paths = paths();
        assert_eq!(
            paths.split_path(&["a", "b", "c.txt"]),
            PathParts {
                volume: String::new(),
                directory: "a/b/".to_string(),
                file: "c.txt".to_string(),
            }
        );
        let parts = paths.split_path(&["c.txt"]);
        assert_eq!(parts.directory, "");
        assert_eq!(parts.file, "c.txt");
        assert_eq!(parts.recombine(), "c.txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_dirname() {
        assert_eq!(paths().dirname("a/b/c.txt"), "a/b");
    }

    #[test]
    fn test_resolve_real_path_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let result = paths()
            .resolve_real_path(&[dir_str(&dir).as_str(), "no", "such", "file.txt"])
            .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_resolve_real_path_empty_is_none() {
        let empty: [&str; 0] = [];
        assert_eq!(paths().resolve_real_path(&empty).unwrap(), None);
    }

    #[test]
    fn test_resolve_real_path_existing() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("file.txt"), "x").unwrap();

        let resolved = paths()
            .resolve_real_path(&[dir_str(&dir).as_str(), "sub", "..", "file.txt"])
            .unwrap()
            .unwrap();
        let expected = fs::canonicalize(dir.path().join("file.txt")).unwrap();
        assert_eq!(Path::new(&resolved), expected);
        assert!(Path::new(&resolved).is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_real_path_follows_symlinks() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("target")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("target"), dir.path().join("link")).unwrap();

        let resolved = paths()
            .resolve_real_path(&[dir_str(&dir).as_str(), "link"])
            .unwrap()
            .unwrap();
        let expected = fs::canonicalize(dir.path().join("target")).unwrap();
        assert_eq!(Path::new(&resolved), expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_real_path_dangling_symlink_is_none() {
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("link")).unwrap();

        let resolved = paths()
            .resolve_real_path(&[dir_str(&dir).as_str(), "link"])
            .unwrap();
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_resolve_path_unverified_keeps_missing_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let resolved = paths()
            .resolve_path_unverified(&[dir_str(&dir).as_str(), "sub", "..", "new.txt"])
            .unwrap();
        let expected = fs::canonicalize(dir.path()).unwrap().join("new.txt");
        assert_eq!(Path::new(&resolved), expected);
    }

    #[test]
    fn test_resolve_path_unverified_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = paths()
            .resolve_path_unverified(&[dir_str(&dir).as_str(), "missing", "new.txt"])
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            pathio_base::ErrorKind::FileError { .. }
        ));
    }

    #[test]
    fn test_resolve_path_unverified_without_directory_uses_cwd() {
        let resolved = paths().resolve_path_unverified(&["not-here.txt"]).unwrap();
        let expected = fs::canonicalize(std::env::current_dir().unwrap())
            .unwrap()
            .join("not-here.txt");
        assert_eq!(Path::new(&resolved), expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_path_unverified_follows_symlink_before_parent() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a").join("b")).unwrap();
        fs::write(dir.path().join("a").join("f.txt"), "x").unwrap();
        std::os::unix::fs::symlink(dir.path().join("a").join("b"), dir.path().join("link"))
            .unwrap();
        let base = dir_str(&dir);
        let segments = [base.as_str(), "link", "..", "f.txt"];

        let unverified = paths().resolve_path_unverified(&segments).unwrap();
        let real = paths().resolve_real_path(&segments).unwrap();
        let expected = fs::canonicalize(dir.path().join("a").join("f.txt")).unwrap();
        assert_eq!(Path::new(&unverified), expected);
        assert_eq!(real.as_deref(), Some(unverified.as_str()));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_resolve_non_utf8_target_is_error() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let target = dir.path().join(OsStr::from_bytes(b"caf\xE9"));
        fs::create_dir(&target).unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("link")).unwrap();
        let base = dir_str(&dir);

        let err = paths().resolve_real_path(&[base.as_str(), "link"]).unwrap_err();
        assert!(err.to_string().starts_with("Resolved path is not valid UTF-8"), "{}", err);
        let err = paths()
            .resolve_path_unverified(&[base.as_str(), "link", "new.txt"])
            .unwrap_err();
        assert!(err.to_string().starts_with("Resolved path is not valid UTF-8"), "{}", err);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_path_unverified_below_root() {
        let resolved = paths().resolve_path_unverified(&["/", "pathio-missing"]).unwrap();
        assert_eq!(resolved, "/pathio-missing");
    }
}
