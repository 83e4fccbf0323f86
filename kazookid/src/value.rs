use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Serialize, Serializer};

use crate::{StdResult, Substitute, SubstituteError};

/// Any payload a test may want to stub, store in a property or pass as an argument.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    None,

    /// Boolean
    Bool(bool),

    /// Integer
    Int(i64),

    /// Floating point number
    Float(f64),

    /// String
    Str(String),

    /// Ordered sequence, used for both tuples and lists
    Seq(Vec<Value>),

    /// Invokable closure
    Function(Function),

    /// Nested test double, a strong handle
    Substitute(Substitute),

    /// Arbitrary rust payload, compared by identity
    Opaque(Rc<dyn Any>),
}

impl Value {
    /// Wrap an arbitrary rust value, it can be retrieved using [downcast_ref][Self::downcast_ref].
    pub fn opaque<T: Any>(payload: T) -> Self {
        Value::Opaque(Rc::new(payload))
    }

    /// Build a sequence from anything that yields values.
    pub fn seq<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Seq(_) => "seq",
            Value::Function(_) => "function",
            Value::Substitute(_) => "substitute",
            Value::Opaque(_) => "opaque",
        }
    }

    /// Check if this is the absent value.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Get the boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the integer payload, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the floating point payload, if any.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Get the items of a sequence, if any.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(values) => Some(values),
            _ => None,
        }
    }

    /// Get the nested substitute, if any.
    pub fn as_substitute(&self) -> Option<&Substitute> {
        match self {
            Value::Substitute(substitute) => Some(substitute),
            _ => None,
        }
    }

    /// Borrow the payload of an [opaque][Value::Opaque] value as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(payload) => payload.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Invoke the value, only [functions][Value::Function] can be invoked.
    pub fn call(&self, arguments: &Arguments) -> StdResult<Value> {
        match self {
            Value::Function(function) => function.call(arguments),
            other => Err(SubstituteError::NotInvocable(other.kind()).into()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value:?}"),
            Value::Str(value) => write!(f, "{value:?}"),
            Value::Seq(values) => f.debug_list().entries(values).finish(),
            Value::Function(function) => fmt::Debug::fmt(function, f),
            Value::Substitute(substitute) => fmt::Debug::fmt(substitute, f),
            Value::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Substitute(a), Value::Substitute(b)) => a.ptr_eq(b),
            (Value::Opaque(a), Value::Opaque(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_int() == Some(*other)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::None => serializer.serialize_none(),
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::Int(value) => serializer.serialize_i64(*value),
            Value::Float(value) => serializer.serialize_f64(*value),
            Value::Str(value) => serializer.serialize_str(value),
            Value::Seq(values) => values.serialize(serializer),
            Value::Function(_) => serializer.serialize_str("<function>"),
            Value::Substitute(_) => serializer.serialize_str("<substitute>"),
            Value::Opaque(_) => serializer.serialize_str("<opaque>"),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::None
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::seq(values)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::None, Into::into)
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

impl From<Substitute> for Value {
    fn from(substitute: Substitute) -> Self {
        Value::Substitute(substitute)
    }
}

macro_rules! impl_from_tuple {
    ($($name:ident $item:ident),+) => {
        impl<$($name: Into<Value>),+> From<($($name,)+)> for Value {
            fn from(($($item,)+): ($($name,)+)) -> Self {
                Value::Seq(vec![$($item.into()),+])
            }
        }
    };
}

impl_from_tuple!(A a, B b);
impl_from_tuple!(A a, B b, C c);
impl_from_tuple!(A a, B b, C c, D d);

/// A closure that can be stored in a [Value] and invoked like a method.
///
/// A closure capturing a [Substitute] that stores it keeps that substitute alive forever.
/// Capture a [WeakSubstitute][crate::WeakSubstitute] to reach back to its own double.
#[derive(Clone)]
pub struct Function(Rc<dyn Fn(&Arguments) -> StdResult<Value>>);

impl Function {
    /// Wrap the given closure.
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(&Arguments) -> StdResult<Value> + 'static,
    {
        Self(Rc::new(function))
    }

    /// Invoke the closure.
    pub fn call(&self, arguments: &Arguments) -> StdResult<Value> {
        (self.0)(arguments)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Function(..)")
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Positional and keyword arguments of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Arguments {
    #[serde(rename = "args")]
    positional: Vec<Value>,
    #[serde(rename = "kwargs")]
    keywords: BTreeMap<String, Value>,
}

impl Arguments {
    /// Create an empty set of arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn with_arg<T: Into<Value>>(mut self, value: T) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument, replacing any previous one with the same name.
    pub fn with_kwarg<K: Into<String>, T: Into<Value>>(mut self, name: K, value: T) -> Self {
        self.keywords.insert(name.into(), value.into());
        self
    }

    /// Positional arguments, in order.
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Keyword arguments.
    pub fn keywords(&self) -> &BTreeMap<String, Value> {
        &self.keywords
    }

    /// Positional argument at `index`.
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Keyword argument named `name`.
    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.keywords.get(name)
    }

    /// Check if there is neither positional nor keyword arguments.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keywords.is_empty()
    }

    /// Collapse the positional arguments: a single one is returned as is, otherwise they are
    /// returned as a sequence. Keyword arguments are ignored.
    pub fn unpack(&self) -> Value {
        match self.positional.as_slice() {
            [single] => single.clone(),
            many => Value::Seq(many.to_vec()),
        }
    }
}

impl From<()> for Arguments {
    fn from(_: ()) -> Self {
        Self::new()
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(positional: Vec<Value>) -> Self {
        Self {
            positional,
            keywords: BTreeMap::new(),
        }
    }
}

/// Build [Arguments][crate::Arguments] from positional values, optionally followed by keyword
/// values after a semicolon.
///
/// ```
/// use kazookid::{args, Value};
///
/// let arguments = args!["hello", 1; retries = 3];
/// assert_eq!(Some(&Value::Int(1)), arguments.arg(1));
/// assert_eq!(Some(&Value::Int(3)), arguments.kwarg("retries"));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Arguments::new()
    };
    (; $($key:ident = $kwarg:expr),+ $(,)?) => {
        $crate::Arguments::new()$(.with_kwarg(stringify!($key), $kwarg))+
    };
    ($($arg:expr),+ $(,)? $(; $($key:ident = $kwarg:expr),+ $(,)?)?) => {
        $crate::Arguments::new()$(.with_arg($arg))+$($(.with_kwarg(stringify!($key), $kwarg))+)?
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_single_positional_argument_as_scalar() {
        assert_eq!(Value::from("x"), args!["x"].unpack());
    }

    #[test]
    fn unpack_many_positional_arguments_as_sequence() {
        assert_eq!(Value::from(("x", "y")), args!["x", "y"].unpack());
        assert_eq!(Value::Seq(vec![]), args![].unpack());
    }

    #[test]
    fn unpack_ignores_keyword_arguments() {
        assert_eq!(Value::from("x"), args!["x"; verbose = true].unpack());
        assert_eq!(Value::Seq(vec![]), args![; verbose = true].unpack());
    }

    #[test]
    fn args_macro_builds_positional_and_keyword_arguments() {
        let arguments = args!["a", 2, 3.5; name = "n", flag = false];

        assert_eq!(
            &[Value::from("a"), Value::Int(2), Value::Float(3.5)],
            arguments.positional()
        );
        assert_eq!(Some(&Value::from("n")), arguments.kwarg("name"));
        assert_eq!(Some(&Value::Bool(false)), arguments.kwarg("flag"));
        assert!(args![].is_empty());
    }

    #[test]
    fn functions_and_opaque_values_are_compared_by_identity() {
        let function = Function::new(|_| Ok(Value::None));
        let same_function = Value::Function(function.clone());
        let other_function = Value::Function(Function::new(|_| Ok(Value::None)));
        assert_eq!(Value::Function(function), same_function);
        assert_ne!(same_function, other_function);

        let opaque = Value::opaque(vec![1u8, 2]);
        assert_eq!(opaque.clone(), opaque);
        assert_ne!(Value::opaque(vec![1u8, 2]), opaque);
        assert_eq!(Some(&vec![1u8, 2]), opaque.downcast_ref::<Vec<u8>>());
        assert_eq!(None, opaque.downcast_ref::<String>());
    }

    #[test]
    fn call_a_function_value() {
        let double = Value::from(Function::new(|arguments| {
            let number = arguments.arg(0).and_then(Value::as_int).unwrap_or_default();
            Ok(Value::Int(number * 2))
        }));

        assert_eq!(Value::Int(42), double.call(&args![21]).unwrap());
    }

    #[test]
    fn calling_a_non_function_value_fails() {
        let error = Value::Int(1).call(&args![]).unwrap_err();

        assert_eq!(
            Some(&SubstituteError::NotInvocable("int")),
            error.downcast_ref::<SubstituteError>()
        );
        assert_eq!("value of kind `int` can not be invoked", error.to_string());
    }

    #[test]
    fn serialize_values_and_arguments_as_json() {
        let callback = Function::new(|_| Ok(Value::None));
        let arguments = args!["a", vec![1, 2], Value::None; callback = callback];

        let json = serde_json::to_value(&arguments).unwrap();

        assert_eq!(
            serde_json::json!({
                "args": ["a", [1, 2], null],
                "kwargs": { "callback": "<function>" }
            }),
            json
        );
    }

    #[test]
    fn convert_options_and_tuples() {
        assert_eq!(Value::None, Value::from(None::<i32>));
        assert_eq!(Value::Int(3), Value::from(Some(3)));
        assert_eq!(
            Value::Seq(vec![Value::Int(1), Value::from("b"), Value::Bool(true)]),
            Value::from((1, "b", true))
        );
        assert!(Value::from("text") == "text");
        assert!(Value::Int(7) == 7);
    }
}
