use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Module Errors
/// - [`Error::Malformed`] - A module refers to something that does not exist
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::Serialization`] - The module container could not be encoded or decoded
///
/// ## Entry Selection Errors
/// - [`Error::EntryNotFound`] - No type matches the entry designator
/// - [`Error::AmbiguousEntryName`] - More than one type matches the entry designator
/// - [`Error::MissingEntryPoint`] - Neither a read nor a write method was requested
///
/// ## Extraction Errors
/// - [`Error::SymbolUnresolved`] - A reference in the closure cannot be resolved
/// - [`Error::Unrecoverable`] - Every requested entry point failed
/// - [`Error::StructuralWriteFailure`] - The finished module could not be validated or written
///
/// # Examples
///
/// ```rust,no_run
/// use dotslice::{file, Error};
///
/// match file::load("Game.dll") {
///     Ok(module) => println!("Loaded {}", module.name),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed module: {} ({}:{})", message, file, line);
///     }
///     Err(Error::FileError(io_err)) => eprintln!("I/O error: {}", io_err),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The module is damaged and could not be processed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// The module container could not be encoded or decoded.
    #[error("Invalid module container - {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),

    /// A type, method or field referenced from the closure could not be resolved.
    ///
    /// Aborts cloning of the owning method. The extractor reacts by dropping the entry point
    /// whose closure contained the reference, if another entry point remains.
    #[error("Unresolved symbol - {0}")]
    SymbolUnresolved(String),

    /// No type of the source module matches the entry designator.
    #[error("Entry type not found - {0}")]
    EntryNotFound(String),

    /// More than one type of the source module ends with the entry designator.
    #[error("Entry type name '{name}' is ambiguous, candidates: {}", candidates.join(", "))]
    AmbiguousEntryName {
        /// The designator as given
        name: String,
        /// Full names of every matching type
        candidates: Vec<String>,
    },

    /// Neither a read nor a write entry point was requested.
    #[error("At least one of the read and write entry points is required")]
    MissingEntryPoint,

    /// Every requested entry point failed to extract.
    #[error("No entry point could be extracted: {}", failures.join("; "))]
    Unrecoverable {
        /// One message per failed entry point
        failures: Vec<String>,
    },

    /// The finished module failed validation or could not be written.
    #[error("Failed to write module - {0}")]
    StructuralWriteFailure(String),
}
