use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};

use anyhow::Context;
use slog::{Logger, debug, warn};

use crate::logging::discard_logger;
use crate::mapping::Mapping;
use crate::{
    Arguments, Call, LoggerExtensions, StdResult, SubstituteConfiguration,
    SubstituteError, Traversal, Value, YIELDS_MEMBER, Yields,
};

#[derive(Default)]
struct SubstituteState {
    calls: HashMap<String, Vec<Arguments>>,
    handlers: HashMap<String, Call>,
    properties: HashMap<String, Value>,
    mapping: Mapping,
}

pub(crate) struct SubstituteInner {
    state: RefCell<SubstituteState>,
    yields: Yields,
    configuration: SubstituteConfiguration,
    logger: Logger,
}

impl SubstituteInner {
    pub(crate) fn configuration(&self) -> &SubstituteConfiguration {
        &self.configuration
    }

    pub(crate) fn record(&self, name: &str, arguments: Arguments) {
        self.state
            .borrow_mut()
            .calls
            .entry(name.to_string())
            .or_default()
            .push(arguments);
    }

    pub(crate) fn with_history<R>(&self, name: &str, read: impl FnOnce(&[Arguments]) -> R) -> R {
        let state = self.state.borrow();
        read(state.calls.get(name).map(Vec::as_slice).unwrap_or_default())
    }

    /// Read the mapping the way `get(key, default)` does: the stored value, else the given
    /// default, else [Value::None].
    pub(crate) fn read_mapping(&self, name: &str, arguments: &Arguments) -> StdResult<Value> {
        let key = arguments
            .arg(0)
            .ok_or_else(|| SubstituteError::MissingArgument {
                name: name.to_string(),
                index: 0,
            })?;
        let fallback = arguments
            .arg(1)
            .or_else(|| arguments.kwarg("default"))
            .cloned();

        Ok(self.state.borrow().mapping.get_or(key, fallback))
    }
}

/// What a member name resolves to, see [Substitute::member].
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// Value assigned with [Substitute::set_property]
    Property(Value),

    /// The iteration sequence, for the reserved [yields][crate::YIELDS_MEMBER] name
    Iterator(Yields),

    /// The call interceptor of that name
    Call(Call),
}

impl Member {
    /// The call interceptor, if the member resolved to one.
    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Member::Call(call) => Some(call),
            _ => None,
        }
    }

    /// The property value, if the member resolved to one.
    pub fn as_property(&self) -> Option<&Value> {
        match self {
            Member::Property(value) => Some(value),
            _ => None,
        }
    }
}

/// A test double standing in for any collaborator.
///
/// # Test Spy
///
/// Test spies capture indirect output: every invocation of a member is recorded and can be
/// checked afterward through its [Call].
///
/// # Test Stub
///
/// Test stubs feed indirect input into the system under test: [properties][Self::set_property],
/// [return values][Call::returns], [faults][Call::raises], an iteration
/// [sequence][Self::yields] and [mapping][Self::set_item] data.
///
/// Member names live in two namespaces consulted in a fixed order: properties first, then call
/// interceptors (see [member][Self::member]).
///
/// `Substitute` is a handle: clones share the same double. It is neither `Send` nor `Sync`.
///
/// A double that stores a strong handle to itself, in a property, a return value or a
/// [Function] closure, is never dropped. Capture a [WeakSubstitute] instead, see
/// [downgrade][Self::downgrade].
///
/// [Function]: crate::Function
#[derive(Clone)]
pub struct Substitute {
    inner: Rc<SubstituteInner>,
}

impl Substitute {
    /// Create a substitute with the default configuration and no logs.
    pub fn new() -> Self {
        SubstituteBuilder::new().build()
    }

    /// Start building a substitute.
    pub fn builder() -> SubstituteBuilder {
        SubstituteBuilder::new()
    }

    /// Create a substitute and configure it in a dedicated block.
    ///
    /// ```
    /// use kazookid::{args, Substitute, Value};
    ///
    /// let engine = Substitute::configure(|engine| {
    ///     engine.call("fps").returns(60);
    ///     engine.set_property("name", "test engine");
    /// });
    /// assert_eq!(Value::Int(60), engine.invoke("fps", args![]).unwrap());
    /// ```
    pub fn configure(setup: impl FnOnce(&Substitute)) -> Self {
        SubstituteBuilder::new().configure(setup)
    }

    /// Settings of this substitute.
    pub fn configuration(&self) -> &SubstituteConfiguration {
        &self.inner.configuration
    }

    pub(crate) fn logger(&self) -> &Logger {
        &self.inner.logger
    }

    /// Get the call interceptor for `name`, creating it on first use.
    ///
    /// Every call with the same name returns a handle to the same interceptor. Properties are not
    /// consulted: use it to configure a member or query its history.
    ///
    /// [member][Self::member] and [invoke][Self::invoke] never reach an interceptor whose name is
    /// assigned as a property or is the reserved [yields][crate::YIELDS_MEMBER] name, so its
    /// configuration has no effect there.
    pub fn call(&self, name: &str) -> Call {
        self.inner
            .state
            .borrow_mut()
            .handlers
            .entry(name.to_string())
            .or_insert_with(|| {
                if name == YIELDS_MEMBER {
                    warn!(
                        self.inner.logger,
                        "Call interceptor is shadowed by the iteration sequence";
                        "member" => name
                    );
                }
                Call::new(
                    name,
                    Rc::downgrade(&self.inner),
                    self.inner.logger.new_with_member_name(name),
                )
            })
            .clone()
    }

    /// Resolve a member name.
    ///
    /// Consults, in order: the properties, the reserved [yields][crate::YIELDS_MEMBER] name,
    /// then the call interceptors (creating one on first use).
    pub fn member(&self, name: &str) -> Member {
        if let Some(value) = self.property(name) {
            return Member::Property(value);
        }
        if name == YIELDS_MEMBER {
            return Member::Iterator(self.iterator());
        }

        Member::Call(self.call(name))
    }

    /// Invoke a member, resolved like [member][Self::member] does.
    ///
    /// - a [function][Value::Function] property is called with the arguments, other properties
    ///   fail with [SubstituteError::NotCallable],
    /// - the reserved iteration name replaces the sequence with its first positional argument,
    /// - otherwise the [Call] is invoked and recorded.
    pub fn invoke<A: Into<Arguments>>(&self, name: &str, arguments: A) -> StdResult<Value> {
        let arguments = arguments.into();

        match self.member(name) {
            Member::Property(Value::Function(function)) => {
                debug!(self.inner.logger, "Invoke function property"; "member" => name);
                function.call(&arguments)
            }
            Member::Property(_) => Err(SubstituteError::NotCallable(name.to_string()).into()),
            Member::Iterator(yields) => {
                match arguments.arg(0) {
                    Some(Value::Seq(items)) => yields.set(items.clone()),
                    Some(item) => yields.set([item.clone()]),
                    None => {
                        return Err(SubstituteError::MissingArgument {
                            name: name.to_string(),
                            index: 0,
                        }
                        .into());
                    }
                }
                Ok(Value::None)
            }
            Member::Call(call) => call.invoke(arguments),
        }
    }

    /// Assign a property, it shadows any call interceptor of the same name.
    ///
    /// Storing a strong handle to this substitute, directly or captured by a [Function], keeps
    /// it alive forever: capture [downgrade][Self::downgrade] instead.
    ///
    /// [Function]: crate::Function
    pub fn set_property<T: Into<Value>>(&self, name: &str, value: T) {
        debug!(self.inner.logger, "Assign property"; "member" => name);
        self.inner
            .state
            .borrow_mut()
            .properties
            .insert(name.to_string(), value.into());
    }

    /// Value of a property, if assigned.
    pub fn property(&self, name: &str) -> Option<Value> {
        self.inner.state.borrow().properties.get(name).cloned()
    }

    /// Check if a property is assigned.
    pub fn has_property(&self, name: &str) -> bool {
        self.inner.state.borrow().properties.contains_key(name)
    }

    /// Store `value` under `key` in the mapping.
    pub fn set_item<K: Into<Value>, T: Into<Value>>(&self, key: K, value: T) {
        let key = key.into();
        debug!(self.inner.logger, "Set mapping item"; "key" => ?key);
        self.inner
            .state
            .borrow_mut()
            .mapping
            .insert(key, value.into());
    }

    /// Read the value stored under `key`, or the default configured with
    /// [set_default][Self::set_default].
    pub fn get_item<K: Into<Value>>(&self, key: K) -> Result<Value, SubstituteError> {
        self.inner.state.borrow().mapping.get(&key.into())
    }

    /// Configure the value returned by [get_item][Self::get_item] for absent keys.
    pub fn set_default<T: Into<Value>>(&self, value: T) {
        let value = value.into();
        debug!(self.inner.logger, "Set mapping default"; "default" => ?value);
        self.inner.state.borrow_mut().mapping.set_default(value);
    }

    /// Check if a value is stored under `key` in the mapping.
    pub fn contains_key<K: Into<Value>>(&self, key: K) -> bool {
        self.inner.state.borrow().mapping.contains_key(&key.into())
    }

    /// Replace the sequence produced when iterating over this substitute.
    pub fn yields<I, T>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.inner.yields.set(items);
    }

    /// The iteration sequence, shared with this substitute.
    pub fn iterator(&self) -> Yields {
        self.inner.yields.clone()
    }

    /// Start a new traversal of the iteration sequence.
    pub fn iter(&self) -> Traversal {
        self.inner.yields.iter()
    }

    /// Recorded invocations of a member, oldest first.
    pub fn history(&self, name: &str) -> Vec<Arguments> {
        self.inner.with_history(name, <[Arguments]>::to_vec)
    }

    /// Names of the members invoked at least once, sorted.
    pub fn invoked_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.state.borrow().calls.keys().cloned().collect();
        names.sort();
        names
    }

    /// The whole history as json, keyed by member name.
    pub fn history_snapshot(&self) -> StdResult<serde_json::Value> {
        let state = self.inner.state.borrow();
        let calls: BTreeMap<&String, &Vec<Arguments>> = state.calls.iter().collect();

        serde_json::to_value(calls).with_context(|| "Could not serialize the substitute history")
    }

    /// Check if both handles point to the same substitute.
    pub fn ptr_eq(&self, other: &Substitute) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Create a handle that does not keep this substitute alive.
    ///
    /// ```
    /// use kazookid::{args, Function, Substitute, Value};
    ///
    /// let substitute = Substitute::new();
    /// let this = substitute.downgrade();
    /// substitute.set_property(
    ///     "delegate",
    ///     Function::new(move |arguments| match this.upgrade() {
    ///         Some(substitute) => substitute.invoke("target", arguments.clone()),
    ///         None => Ok(Value::None),
    ///     }),
    /// );
    ///
    /// substitute.invoke("delegate", args![1]).unwrap();
    /// assert!(substitute.call("target").was_called_with(args![1]));
    /// ```
    pub fn downgrade(&self) -> WeakSubstitute {
        WeakSubstitute {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

/// Non-owning handle to a [Substitute], see [Substitute::downgrade].
#[derive(Clone)]
pub struct WeakSubstitute {
    inner: Weak<SubstituteInner>,
}

impl WeakSubstitute {
    /// The substitute, if it is still alive.
    pub fn upgrade(&self) -> Option<Substitute> {
        self.inner.upgrade().map(|inner| Substitute { inner })
    }
}

impl fmt::Debug for WeakSubstitute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakSubstitute")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Default for Substitute {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Substitute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Substitute");
        match self.inner.state.try_borrow() {
            Ok(state) => {
                let mut invoked: Vec<&String> = state.calls.keys().collect();
                invoked.sort();
                let mut properties: Vec<&String> = state.properties.keys().collect();
                properties.sort();
                debug
                    .field("invoked", &invoked)
                    .field("properties", &properties)
                    .finish()
            }
            Err(_) => debug.finish_non_exhaustive(),
        }
    }
}

impl IntoIterator for &Substitute {
    type Item = Value;
    type IntoIter = Traversal;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Pretend a value exists: create a fresh [Substitute] to stand in for it.
pub fn pretend() -> Substitute {
    Substitute::new()
}

/// Builder of [Substitute].
#[derive(Default)]
pub struct SubstituteBuilder {
    configuration: SubstituteConfiguration,
    logger: Option<Logger>,
}

impl SubstituteBuilder {
    /// Create a builder with the default configuration and no logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given configuration.
    pub fn with_configuration(mut self, configuration: SubstituteConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Log to the given logger.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Build the substitute.
    pub fn build(self) -> Substitute {
        let logger = self
            .logger
            .unwrap_or_else(discard_logger)
            .new_with_component_name::<Substitute>();

        Substitute {
            inner: Rc::new(SubstituteInner {
                state: RefCell::new(SubstituteState::default()),
                yields: Yields::default(),
                configuration: self.configuration,
                logger,
            }),
        }
    }

    /// Build the substitute and configure it with `setup`.
    pub fn configure(self, setup: impl FnOnce(&Substitute)) -> Substitute {
        let substitute = self.build();
        setup(&substitute);
        substitute
    }
}
