mod file_reader;
mod handle;

pub use file_reader::{FileReader, OpenMode};
pub use handle::FileHandle;

use pathio_base::PathioResult;
use tracing::{debug, instrument};

/// Reads every remaining line of `handle`, then closes it.
///
/// The handle is closed whether or not reading succeeded; a later read on it
/// fails with `HandleClosed`.
#[instrument(skip(handle), fields(name = %handle.name()))]
pub fn read_all(handle: &mut FileHandle) -> PathioResult<Vec<String>> {
    let mut lines = Vec::new();
    let result = loop {
        match handle.read_line() {
            Ok(Some(line)) => lines.push(line),
            Ok(None) => break Ok(lines),
            Err(e) => break Err(e),
        }
    };
    handle.close();
    debug!(ok = result.is_ok(), "read all lines");
    result
}

/// All remaining lines, each with its terminator. Closes the handle.
pub fn read_lines(handle: &mut FileHandle) -> PathioResult<Vec<String>> {
    read_all(handle)
}

/// All remaining content as one string. Closes the handle.
pub fn read_text(handle: &mut FileHandle) -> PathioResult<String> {
    read_all(handle).map(|lines| lines.concat())
}
