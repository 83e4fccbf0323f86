use std::ops::Deref;

use slog::debug;

use crate::{StdError, StdResult, Substitute, SubstituteBuilder};

/// A [Substitute] for resources acquired through a scoped protocol.
///
/// The context is the acquired resource: [enter][Self::enter] hands back the same double and
/// [exit][Self::exit] never suppresses a failure raised inside the scope.
///
/// ```
/// use kazookid::{args, Context};
///
/// let connection = Context::new();
/// connection
///     .scope(|connection| connection.invoke("query", args!["select 1"]))
///     .unwrap();
///
/// assert!(connection.call("query").was_called());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    substitute: Substitute,
}

impl Context {
    /// Create a context with the default configuration and no logs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the scope: returns the context itself.
    pub fn enter(&self) -> Context {
        debug!(self.substitute.logger(), "Enter context");
        self.clone()
    }

    /// Exit the scope, given the failure that ended it if any.
    ///
    /// Always returns `false`: the failure, if any, must be propagated.
    pub fn exit(&self, error: Option<&StdError>) -> bool {
        debug!(self.substitute.logger(), "Exit context"; "failed" => error.is_some());
        false
    }

    /// Run `body` between [enter][Self::enter] and [exit][Self::exit] and return its result
    /// untouched.
    pub fn scope<T, F>(&self, body: F) -> StdResult<T>
    where
        F: FnOnce(&Context) -> StdResult<T>,
    {
        let context = self.enter();
        let result = body(&context);
        self.exit(result.as_ref().err());

        result
    }
}

impl Deref for Context {
    type Target = Substitute;

    fn deref(&self) -> &Self::Target {
        &self.substitute
    }
}

impl From<Substitute> for Context {
    fn from(substitute: Substitute) -> Self {
        Self { substitute }
    }
}

impl SubstituteBuilder {
    /// Build a [Context] instead of a bare substitute.
    pub fn build_context(self) -> Context {
        Context::from(self.build())
    }
}
