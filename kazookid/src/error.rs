use thiserror::Error;

/// Generic error type, used for faults raised by configured [calls][crate::Call] and by
/// [functions][crate::Function] stored in properties.
pub type StdError = anyhow::Error;

/// Generic result type.
pub type StdResult<T> = anyhow::Result<T>;

/// Errors raised by a [Substitute][crate::Substitute] itself.
///
/// Faults configured with [raises][crate::Call::raises] are not part of this enum: they are
/// returned as is inside a [StdError] so the caller can `downcast_ref` them to their own type.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubstituteError {
    /// Indexed read of an absent key while no default is configured.
    #[error("key {0} is not present in the substitute mapping and no default is configured")]
    MissingKey(String),

    /// The member holds a property that is not a function.
    #[error("member `{0}` holds a property that can not be invoked")]
    NotCallable(String),

    /// The value is of a kind that is not a function.
    #[error("value of kind `{0}` can not be invoked")]
    NotInvocable(&'static str),

    /// The member needs a positional argument that was not given.
    #[error("member `{name}` expects a positional argument at index {index}")]
    MissingArgument {
        /// Member name
        name: String,
        /// Index of the missing positional argument
        index: usize,
    },

    /// The call handle outlived the substitute that created it.
    #[error("member `{0}` belongs to a substitute that has been dropped")]
    Detached(String),
}
