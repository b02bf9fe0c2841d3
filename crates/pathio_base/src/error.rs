use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use tracing_error::{SpanTrace, SpanTraceStatus};

/* 📖 # Why a custom error type and not anyhow/thiserror?

The errors of this library are part of its API: callers match on an `IoError`
to learn which file and mode failed, and on `HandleClosed` to detect use after
a full read. A hand-written enum keeps those variants explicit, and the
wrapper struct adds the context stack and the span trace without pulling in
further dependencies.
*/

/// Error variants that can occur in pathio operations.
#[derive(Debug)]
pub enum ErrorKind {
    /// Opening a file for reading failed.
    IoError {
        message: String,
        mode: String,
        filename: String,
    },

    /// Any other filesystem operation failed
    FileError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Bytes could not be decoded in the configured charset
    Decode {
        name: String,
        charset: String,
        line: usize,
    },

    /// The configured charset name is not known
    UnknownCharset { name: String },

    /// A read was attempted on a handle that has already been closed
    HandleClosed { name: String },

    /// Catch-all for other errors with a message
    Message { message: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::IoError {
                message,
                mode,
                filename,
            } => write!(f, "Can't open '{}' with mode '{}': {}", filename, mode, message),
            ErrorKind::FileError { path, source } => {
                write!(f, "File error at {}: {}", path.display(), source)
            }
            ErrorKind::Decode {
                name,
                charset,
                line,
            } => write!(f, "Cannot decode line {} of '{}' as {}", line, name, charset),
            ErrorKind::UnknownCharset { name } => write!(f, "Unknown charset '{}'", name),
            ErrorKind::HandleClosed { name } => {
                write!(f, "Read attempted on closed handle '{}'", name)
            }
            ErrorKind::Message { message } => write!(f, "{}", message),
        }
    }
}

/* 📖 # Why separate ErrorKind and PathioError?

ErrorKind holds the structural variant callers pattern match on. PathioError
wraps it with everything collected while the error travels up: context
strings, an optional cause and the span trace captured at creation time.
*/

/// Error type wrapping an [`ErrorKind`] with context, cause and span trace.
pub struct PathioError {
    kind: ErrorKind,
    context: Vec<String>,
    cause: Option<Box<PathioError>>,
    span_trace: SpanTrace,
}

impl PathioError {
    /// Creates a new error from an ErrorKind, capturing the current span trace.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            cause: None,
            span_trace: SpanTrace::capture(),
        }
    }

    /// Creates a free-form message error.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    /// Creates a filesystem error for the given path.
    pub fn file_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::new(ErrorKind::FileError {
            path: path.into(),
            source,
        })
    }

    /// Attaches context to an error.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Records another error as the cause of this one.
    pub fn caused_by(mut self, cause: PathioError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the attached context strings, oldest first.
    pub fn get_context(&self) -> &[String] {
        &self.context
    }

    /// Returns the span trace captured when the error was created.
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        writeln!(f, "{}", self.kind)?;
        let entries = self.context.len() + usize::from(self.cause.is_some());
        for (i, ctx) in self.context.iter().enumerate() {
            let connector = if i + 1 == entries { "└─" } else { "├─" };
            writeln!(f, "{}{} {}", indent, connector, ctx)?;
        }
        if let Some(cause) = &self.cause {
            write!(f, "{}└─ cause: ", indent)?;
            cause.fmt_tree(f, &format!("{}   ", indent))?;
        }
        Ok(())
    }
}

impl StdError for PathioError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::FileError { source, .. } => Some(source),
            _ => self
                .cause
                .as_deref()
                .map(|cause| cause as &(dyn StdError + 'static)),
        }
    }
}

impl fmt::Display for PathioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ctx in &self.context {
            write!(f, "{}: ", ctx)?;
        }
        write!(f, "{}", self.kind)
    }
}

impl fmt::Debug for PathioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, "")?;
        if self.span_trace.status() == SpanTraceStatus::CAPTURED {
            let trace = self.span_trace.to_string();
            if !trace.trim().is_empty() {
                writeln!(f, "Trace: {}", trace)?;
            }
        }
        Ok(())
    }
}

/// Standard result type for pathio operations.
///
/// The error is boxed to keep the `Ok` path small.
pub type PathioResult<T> = std::result::Result<T, Box<PathioError>>;

/// Extension trait for attaching context to results during propagation.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    fn context(self, context: impl Into<String>) -> PathioResult<T>;

    /// Attaches context using lazy evaluation.
    /// Context is only evaluated if the result is an error.
    fn with_context<F>(self, f: F) -> PathioResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for PathioResult<T> {
    fn context(self, context: impl Into<String>) -> PathioResult<T> {
        self.map_err(|err| Box::new((*err).context(context)))
    }

    fn with_context<F>(self, f: F) -> PathioResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new((*err).with_context(f)))
    }
}

/// Builds a boxed message error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        Box::new($crate::PathioError::message(format!($($arg)*)))
    };
}

/// Returns early with a boxed message error built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::err!($($arg)*))
    };
}
