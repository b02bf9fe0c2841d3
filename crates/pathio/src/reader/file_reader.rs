use std::fs::File;

use pathio_base::{ErrorKind, PathioError, PathioResult, ResultExt, SettingsHandle};
use tracing::{debug, instrument};

use super::handle::FileHandle;
use crate::Charset;

/// How [`FileReader::open_for_read`] decodes the opened file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// `<` or `r`: decode with the configured charset.
    Text,
    /// `<:raw` or `rb`: every byte becomes one char (Latin-1).
    Raw,
}

impl OpenMode {
    pub fn parse(mode: &str) -> Option<Self> {
        match mode.trim() {
            "<" | "r" => Some(OpenMode::Text),
            "<:raw" | "rb" => Some(OpenMode::Raw),
            _ => None,
        }
    }
}

/// Opens and reads files, taking the charset from injected settings.
///
/// The `charset` setting is looked up on every open, never cached.
#[derive(Debug, Clone, Default)]
pub struct FileReader {
    settings: SettingsHandle,
}

impl FileReader {
    pub fn new(settings: SettingsHandle) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    /// Opens `filename` for reading in `mode` and applies the current charset.
    ///
    /// A failed open is reported as [`ErrorKind::IoError`] carrying the OS
    /// message, the mode and the filename.
    #[instrument(skip(self))]
    pub fn open_for_read(&self, mode: &str, filename: &str) -> PathioResult<FileHandle> {
        let io_error = |message: String| {
            Box::new(PathioError::new(ErrorKind::IoError {
                message,
                mode: mode.to_string(),
                filename: filename.to_string(),
            }))
        };
        let open_mode = OpenMode::parse(mode).ok_or_else(|| io_error("unsupported mode".into()))?;
        let file = File::open(filename).map_err(|e| io_error(e.to_string()))?;

        let charset = match open_mode {
            OpenMode::Text => Charset::from_name(&self.settings.charset())
                .with_context(|| format!("opening '{}'", filename))?,
            OpenMode::Raw => Charset::Latin1,
        };
        debug!(%charset, "opened file for reading");
        Ok(FileHandle::from_reader(filename, file, charset))
    }

    /// Lines of `filename`, or `None` when no filename is given.
    #[instrument(skip(self))]
    pub fn read_file_lines(&self, filename: Option<&str>) -> PathioResult<Option<Vec<String>>> {
        let Some(filename) = filename.filter(|name| !name.is_empty()) else {
            return Ok(None);
        };
        let mut handle = self.open_for_read("<", filename)?;
        super::read_lines(&mut handle).map(Some)
    }

    /// Content of `filename` as one string, or `None` when no filename is
    /// given.
    #[instrument(skip(self))]
    pub fn read_file_text(&self, filename: Option<&str>) -> PathioResult<Option<String>> {
        let Some(filename) = filename.filter(|name| !name.is_empty()) else {
            return Ok(None);
        };
        let mut handle = self.open_for_read("<", filename)?;
        super::read_text(&mut handle).map(Some)
    }
}
