#![warn(missing_docs)]

//! Substitutes are test doubles that can be handed to code under test in place of its real
//! collaborators.
//!
//! See: <http://xunitpatterns.com/>
//!
//! Provide:
//! - A [Substitute] that records every invocation made on its members (Test Spy) and supplies
//!   pre-configured [return values][Call::returns], [faults][Call::raises], iteration
//!   [sequences][Substitute::yields] and mapping-like data (Test Stub).
//! - A [Context] for doubles acquired through a scoped, "with"-style protocol.
//! - A dynamically typed [Value] able to carry any payload a test wants to stub.
//!
//! # Test Spy
//!
//! ```
//! use kazookid::{args, Substitute};
//!
//! let engine = Substitute::new();
//! engine.invoke("render", args!["frame"]).unwrap();
//!
//! assert!(engine.call("render").was_called());
//! assert!(engine.call("render").was_called_with(args!["frame"]));
//! assert!(!engine.call("shutdown").was_called());
//! ```
//!
//! # Test Stub
//!
//! ```
//! use kazookid::{args, Substitute, Value};
//!
//! let substitute = Substitute::new();
//! substitute.set_property("value", 5);
//! substitute.call("method").returns(1);
//!
//! assert_eq!(Some(Value::Int(5)), substitute.property("value"));
//! assert_eq!(Value::Int(1), substitute.invoke("method", args![]).unwrap());
//! ```

mod call;
mod configuration;
mod context;
mod error;
mod iteration;
mod logging;
mod mapping;
mod substitute;
mod value;

#[cfg(test)]
pub(crate) mod test;

pub use call::Call;
pub use configuration::{FaultRecording, SubstituteConfiguration};
pub use context::Context;
pub use error::{StdError, StdResult, SubstituteError};
pub use iteration::{Traversal, Yields};
pub use logging::LoggerExtensions;
pub use substitute::{Member, Substitute, SubstituteBuilder, WeakSubstitute, pretend};
pub use value::{Arguments, Function, Value};

/// Name of the member that exposes the iteration sequence of a [Substitute] instead of a [Call].
pub const YIELDS_MEMBER: &str = "yields";

/// Name of the member that doubles as a mapping read when it has no configured return value.
pub const GET_MEMBER: &str = "get";
