//! Crate-wide error type.

/// Errors reported by the scheduler and its front-ends.
///
/// Infeasibility is never an error: every strategy degrades to a best-effort
/// pick instead. Failure states of individual tasks are carried by their
/// [`TaskFlags`](`crate::task::TaskFlags`).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A strategy was invoked on an empty ready set.
    #[error("ready set is empty")]
    EmptyReadySet,

    /// No strategy is registered under the given name.
    #[error("unknown scheduling strategy `{0}`")]
    UnknownStrategy(String),

    /// A scenario description could not be used.
    #[error("invalid scenario: {0}")]
    Scenario(String),

    /// A scenario file could not be parsed.
    #[error("malformed scenario file")]
    Toml(#[from] toml::de::Error)
}

pub type Result<T> = std::result::Result<T, Error>;
