/* 📖 # Why have pathio_base as a separate library?
pathio_base holds what every part of pathio shares: the error type, tracing
setup and the settings lookup. Keeping it apart from the path and reader code
means embedders can implement `SettingsSource` without depending on the rest.
*/

pub mod error;
pub mod settings;
pub mod tracing;

pub use error::{ErrorKind, PathioError, PathioResult, ResultExt};
pub use settings::{
    EnvSettings, LayeredSettings, MapSettings, SettingsHandle, SettingsSource, TomlSettings,
};
