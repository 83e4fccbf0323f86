use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use slog::{Logger, debug};

use crate::substitute::SubstituteInner;
use crate::{
    Arguments, FaultRecording, GET_MEMBER, StdError, StdResult, SubstituteError, Value,
};

type FaultFactory = Rc<dyn Fn() -> StdError>;

#[derive(Default)]
struct Stub {
    returns: Option<Value>,
    fault: Option<FaultFactory>,
}

struct CallInner {
    name: String,
    owner: Weak<SubstituteInner>,
    stub: RefCell<Stub>,
    logger: Logger,
}

/// Intercepts the invocations of one member of a [Substitute][crate::Substitute].
///
/// A `Call` is a handle: every handle obtained for the same name on the same substitute shares
/// its configuration, and all of them read the history kept by the substitute.
#[derive(Clone)]
pub struct Call {
    inner: Rc<CallInner>,
}

impl Call {
    pub(crate) fn new(name: &str, owner: Weak<SubstituteInner>, logger: Logger) -> Self {
        Self {
            inner: Rc::new(CallInner {
                name: name.to_string(),
                owner,
                stub: RefCell::new(Stub::default()),
                logger,
            }),
        }
    }

    /// Name of the intercepted member.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Return `value` from every subsequent invocation, whatever the arguments.
    ///
    /// Replaces any previously configured return value.
    pub fn returns<T: Into<Value>>(&self, value: T) -> &Self {
        let value = value.into();
        debug!(self.inner.logger, "Configure return value"; "value" => ?value);
        self.inner.stub.borrow_mut().returns = Some(value);
        self
    }

    /// Raise a fresh `E::default()` from every subsequent invocation.
    pub fn raises<E>(&self) -> &Self
    where
        E: std::error::Error + Default + Send + Sync + 'static,
    {
        self.raises_with(E::default)
    }

    /// Raise the fault built by `factory` from every subsequent invocation.
    ///
    /// The factory runs once per invocation. Replaces any previously configured fault.
    pub fn raises_with<E, F>(&self, factory: F) -> &Self
    where
        E: Into<StdError>,
        F: Fn() -> E + 'static,
    {
        debug!(self.inner.logger, "Configure fault");
        let fault: FaultFactory = Rc::new(move || -> StdError { factory().into() });
        self.inner.stub.borrow_mut().fault = Some(fault);
        self
    }

    /// Invoke the member.
    ///
    /// The configured fault takes precedence over the configured return value. Without
    /// either, the `get` member reads the substitute mapping (see
    /// [SubstituteConfiguration::map_style_get][crate::SubstituteConfiguration::map_style_get]),
    /// every other member returns [Value::None].
    pub fn invoke<A: Into<Arguments>>(&self, arguments: A) -> StdResult<Value> {
        let arguments = arguments.into();
        let owner = self.owner()?;
        let (returns, fault) = {
            let stub = self.inner.stub.borrow();
            (stub.returns.clone(), stub.fault.clone())
        };

        if let Some(fault) = fault {
            if owner.configuration().fault_recording == FaultRecording::RecordThenRaise {
                owner.record(&self.inner.name, arguments);
            }
            debug!(self.inner.logger, "Raise configured fault");
            return Err(fault());
        }

        debug!(self.inner.logger, "Invoked"; "arguments" => ?arguments);
        owner.record(&self.inner.name, arguments.clone());

        match returns {
            Some(value) => Ok(value),
            None if self.inner.name == GET_MEMBER && owner.configuration().map_style_get => {
                owner.read_mapping(&self.inner.name, &arguments)
            }
            None => Ok(Value::None),
        }
    }

    /// Check if the member was invoked at least once.
    pub fn was_called(&self) -> bool {
        self.call_count() > 0
    }

    /// Check if the member was invoked exactly `times` times.
    pub fn was_called_times(&self, times: usize) -> bool {
        self.call_count() == times
    }

    /// Check if one of the recorded invocations had the same positional arguments.
    ///
    /// Keyword arguments are ignored.
    pub fn was_called_with<A: Into<Arguments>>(&self, arguments: A) -> bool {
        let expected = arguments.into();
        self.with_history(|history| {
            history
                .iter()
                .any(|recorded| recorded.positional() == expected.positional())
        })
    }

    /// Check if one of the recorded invocations had the same positional and keyword arguments.
    pub fn was_called_with_kwargs<A: Into<Arguments>>(&self, arguments: A) -> bool {
        let expected = arguments.into();
        self.with_history(|history| history.contains(&expected))
    }

    /// Positional arguments of the recorded invocations.
    ///
    /// Each invocation is [unpacked][Arguments::unpack]. With exactly one invocation its
    /// unpacked arguments are returned as is, otherwise a sequence with one item per invocation
    /// is returned (empty if the member was never invoked).
    pub fn args(&self) -> Value {
        self.with_history(|history| match history {
            [single] => single.unpack(),
            many => Value::Seq(many.iter().map(Arguments::unpack).collect()),
        })
    }

    /// Number of recorded invocations.
    pub fn call_count(&self) -> usize {
        self.with_history(|history| history.len())
    }

    /// All the recorded invocations, oldest first.
    pub fn history(&self) -> Vec<Arguments> {
        self.with_history(|history| history.to_vec())
    }

    /// The most recent invocation.
    pub fn last_call(&self) -> Option<Arguments> {
        self.with_history(|history| history.last().cloned())
    }

    fn owner(&self) -> Result<Rc<SubstituteInner>, SubstituteError> {
        self.inner
            .owner
            .upgrade()
            .ok_or_else(|| SubstituteError::Detached(self.inner.name.clone()))
    }

    fn with_history<R>(&self, read: impl FnOnce(&[Arguments]) -> R) -> R {
        match self.inner.owner.upgrade() {
            Some(owner) => owner.with_history(&self.inner.name, read),
            None => read(&[]),
        }
    }
}

impl PartialEq for Call {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("name", &self.inner.name)
            .field("call_count", &self.call_count())
            .finish()
    }
}
