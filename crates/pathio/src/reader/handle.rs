use std::fmt;
use std::io::{self, BufRead, BufReader, Read};

use pathio_base::{ErrorKind, PathioError, PathioResult};
use tracing::trace;

use crate::Charset;

/* 📖 # Why does a closed FileHandle stay around?

A full-content read must close the handle even when it fails part way. The
handle therefore owns its reader in an `Option` and closing drops it, while
the handle itself stays with the caller. Any later read reports
`HandleClosed` instead of silently returning nothing.
*/

/// Open file (or any byte reader) decoded line by line with a [`Charset`].
///
/// Dropping the handle closes it.
pub struct FileHandle {
    name: String,
    charset: Charset,
    reader: Option<Box<dyn BufRead + Send>>,
    lines_read: usize,
}

impl FileHandle {
    /// Wraps an already-open reader. `name` is used in error messages.
    pub fn from_reader(
        name: impl Into<String>,
        reader: impl Read + Send + 'static,
        charset: Charset,
    ) -> Self {
        Self {
            name: name.into(),
            charset,
            reader: Some(Box::new(BufReader::new(reader))),
            lines_read: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Number of lines returned so far.
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    /// Closes the handle. Returns `false` if it was already closed.
    pub fn close(&mut self) -> bool {
        let was_open = self.reader.take().is_some();
        if was_open {
            trace!(name = %self.name, lines = self.lines_read, "closed handle");
        }
        was_open
    }

    /// Reads the next line including its terminator, or `None` at the end.
    pub fn read_line(&mut self) -> PathioResult<Option<String>> {
        let Some(reader) = self.reader.as_mut() else {
            return Err(Box::new(PathioError::new(ErrorKind::HandleClosed {
                name: self.name.clone(),
            })));
        };

        let mut bytes = Vec::new();
        read_raw_line(reader, self.charset.newline(), &mut bytes)
            .map_err(|e| Box::new(PathioError::file_error(&self.name, e)))?;
        if bytes.is_empty() {
            return Ok(None);
        }

        self.lines_read += 1;
        let line = self.charset.decode(&bytes).ok_or_else(|| {
            Box::new(PathioError::new(ErrorKind::Decode {
                name: self.name.clone(),
                charset: self.charset.name().to_string(),
                line: self.lines_read,
            }))
        })?;
        Ok(Some(line))
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("name", &self.name)
            .field("charset", &self.charset)
            .field("closed", &self.is_closed())
            .field("lines_read", &self.lines_read)
            .finish()
    }
}

/// Appends bytes up to and including the next `newline` code unit.
///
/// Multi-byte code units are read whole, so a `0x0A` byte inside another
/// unit does not end the line. A truncated final unit is kept as is.
fn read_raw_line(
    reader: &mut Box<dyn BufRead + Send>,
    newline: &[u8],
    buf: &mut Vec<u8>,
) -> io::Result<()> {
    if let [byte] = newline {
        reader.read_until(*byte, buf)?;
        return Ok(());
    }
    let mut unit = vec![0u8; newline.len()];
    loop {
        let filled = read_unit(reader, &mut unit)?;
        buf.extend_from_slice(&unit[..filled]);
        if filled < unit.len() || unit == newline {
            return Ok(());
        }
    }
}

fn read_unit(reader: &mut Box<dyn BufRead + Send>, unit: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < unit.len() {
        match reader.read(&mut unit[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
