use thiserror::Error;

/// Errors reported by the public entry points.
///
/// All preconditions are validated once at entry; the recursive search and
/// the worker threads never raise errors themselves.
#[derive(Error, Debug)]
pub enum GridCodeError {
    /// Module matrices or buffers have the wrong rank or size.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// A lattice basis is not invertible.
    #[error("singular lattice basis (determinant {0:e})")]
    SingularMatrix(f64),

    /// The domain dimension exceeds the vertex enumerator's bit counter.
    #[error("{0} dimensions exceed the vertex enumerator limit")]
    TooManyDimensions(usize),

    /// The external quit flag was raised during the computation.
    ///
    /// The flag is cleared before this is returned, so the engine can be
    /// driven again from a long-lived host.
    #[error("interrupted by external quit signal")]
    Interrupted,
}
