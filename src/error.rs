use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::result;

/// A type alias for `Result<T, csvmap::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when building or querying a CSV reader.
///
/// Errors fall into two families. Construction errors (see
/// [`is_construction`](Error::is_construction)) happen while a byte source is
/// being opened. Shape errors (see [`is_shape`](Error::is_shape)) are
/// reported by queries on a reader that already exists.
///
/// Note that parsing itself never fails. Malformed quoting always resolves to
/// *some* split, and is only visible as a shape error from `valid`.
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    /// A crate private constructor for `Error`.
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    pub(crate) fn io<P: AsRef<Path>>(path: P, err: io::Error) -> Error {
        Error::new(ErrorKind::Io { path: Some(path.as_ref().to_path_buf()), err })
    }

    /// Return the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwrap this error into its underlying type.
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns true if this error occurred while constructing a reader.
    pub fn is_construction(&self) -> bool {
        match *self.0 {
            ErrorKind::Io { .. } | ErrorKind::Empty { .. } => true,
            _ => false,
        }
    }

    /// Returns true if this error was reported by a shape or content query.
    ///
    /// This includes every query against a detached reader.
    pub fn is_shape(&self) -> bool {
        match *self.0 {
            ErrorKind::UnequalLengths { .. } | ErrorKind::Detached => true,
            _ => false,
        }
    }
}

/// The specific type of an error.
#[derive(Debug)]
pub enum ErrorKind {
    /// The source could not be opened or memory mapped.
    Io {
        /// The path of the source, when it came from the file system.
        path: Option<PathBuf>,
        /// The underlying I/O error.
        err: io::Error,
    },
    /// The source had no bytes at all.
    ///
    /// An empty source is rejected up front rather than reported as a table
    /// with zero rows, so that it cannot be mistaken for a failed mapping.
    Empty {
        /// The path of the source, when it came from the file system.
        path: Option<PathBuf>,
    },
    /// A row was found whose number of fields differs from the first row.
    UnequalLengths {
        /// The number of fields in the first row.
        expected_len: u64,
        /// The 1-based index of the offending row.
        row: u64,
        /// The number of fields in the offending row.
        len: u64,
    },
    /// The reader's byte source has been moved out with
    /// [`Reader::take`](crate::Reader::take).
    Detached,
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::new(ErrorKind::Io { path: None, err })
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        io::Error::new(io::ErrorKind::Other, err)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self.0 {
            ErrorKind::Io { ref err, .. } => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::Io { path: None, ref err } => err.fmt(f),
            ErrorKind::Io { path: Some(ref path), ref err } => {
                write!(f, "CSV error: {}: {}", path.display(), err)
            }
            ErrorKind::Empty { path: None } => {
                write!(f, "CSV error: source is empty")
            }
            ErrorKind::Empty { path: Some(ref path) } => {
                write!(f, "CSV error: {}: file is empty", path.display())
            }
            ErrorKind::UnequalLengths { expected_len, row, len } => write!(
                f,
                "CSV shape error: row {}: found row with {} fields, \
                 but the first row has {} fields",
                row, len, expected_len
            ),
            ErrorKind::Detached => write!(
                f,
                "CSV shape error: reader has no source (it was moved out)"
            ),
        }
    }
}
