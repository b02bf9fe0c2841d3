//! Path joining, normalization and resolution, plus line-oriented file
//! reading with a configurable charset.
//!
//! ```no_run
//! use pathio::{FileReader, PathUtils, SettingsHandle, TomlSettings};
//!
//! # fn main() -> pathio::PathioResult<()> {
//! let paths = PathUtils::for_host();
//! let settings = TomlSettings::parse("charset = \"latin1\"")?;
//! let reader = FileReader::new(SettingsHandle::new(settings));
//!
//! let file = paths.join_path(&["data", "names.txt"]);
//! let names = reader.read_file_lines(Some(&file))?.unwrap_or_default();
//! # let _ = names;
//! # Ok(())
//! # }
//! ```

mod charset;
pub mod path;
pub mod reader;

pub use charset::Charset;
pub use path::{LeadingSlashQuirk, NoQuirk, PathParts, PathQuirk, PathUtils};
pub use reader::{FileHandle, FileReader, OpenMode, read_all, read_lines, read_text};

pub use pathio_base::{
    EnvSettings, ErrorKind, LayeredSettings, MapSettings, PathioError, PathioResult, ResultExt,
    SettingsHandle, SettingsSource, TomlSettings,
};
