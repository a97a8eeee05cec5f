use thiserror::Error;

/// The generic error type covering every failure this library can return.
///
/// Analysis runs only fail at initialization: a malformed taint
/// configuration, unknown analysis options, or an ill-formed program
/// model abort before the fixed point starts. Per-statement resolution
/// failures during an analysis are logged and elided instead of being
/// surfaced here, and lattice-invariant violations are programming
/// defects that assert-fail in debug builds.
#[derive(Error, Debug)]
pub enum Error {
    /// The taint configuration is unreadable or malformed.
    ///
    /// Raised while loading or resolving a taint configuration, for
    /// example when a named class, method, or type does not exist in
    /// the program under analysis. Aborts the run.
    #[error("invalid taint configuration: {0}")]
    Config(String),

    /// File I/O error while reading a configuration file.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// YAML parsing error in a configuration file.
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An analysis option value was not understood.
    ///
    /// The associated string is the offending option value, e.g. an
    /// unknown pointer-analysis variant id.
    #[error("unrecognized analysis option: {0}")]
    Options(String),

    /// The program model is ill-formed.
    ///
    /// Raised by [`crate::ir::ProgramBuilder::finish`] when the model
    /// cannot be sealed, e.g. a statement references a variable of
    /// another method, a branch target is out of range, or no entry
    /// method was designated.
    #[error("ill-formed program: {0}")]
    Ir(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
