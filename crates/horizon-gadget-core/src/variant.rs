//! Variant values crossing the native/script boundary.
//!
//! A [`Variant`] is a closed tagged union. Every native value handed to a
//! script engine, and every script value handed back, travels as a
//! `Variant`. The kind is always available through
//! [`Variant::variant_type`], and conversions between representable kinds
//! never partially succeed: they either produce a complete value or `None`.
//!
//! # Conversion rules
//!
//! | From \ To | Bool | Int64 | Double | String |
//! |-----------|------|-------|--------|--------|
//! | Bool      | same | 0 / 1 | 0 / 1  | `"true"` / `"false"` |
//! | Int64     | `!= 0` | same | exact-ish | decimal |
//! | Double    | `!= 0`, NaN is false | truncated if finite | same | shortest form |
//! | String    | `"true"`/`"false"` (any case), numeric truthiness, empty is false | parsed | parsed | same |
//!
//! Number parsing is locale independent.
//!
//! # Native values
//!
//! [`FromVariant`] and [`IntoVariant`] connect native Rust types to
//! variant kinds. They drive argument conversion in the callable layer.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::callable::{Callable, CallableRef};
use crate::scriptable::ScriptableRef;

/// The kind of value a [`Variant`] holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariantType {
    /// No value.
    Void,
    /// A boolean.
    Bool,
    /// A 64-bit signed integer.
    Int64,
    /// A double precision float.
    Double,
    /// A UTF-8 string.
    String,
    /// A reference to a scriptable object.
    Scriptable,
    /// A reference to a callable.
    Callable,
    /// A point in time.
    Date,
    /// Any kind. Only meaningful in type declarations.
    Any,
}

impl VariantType {
    /// The canonical upper-case name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Void => "VOID",
            Self::Bool => "BOOL",
            Self::Int64 => "INT64",
            Self::Double => "DOUBLE",
            Self::String => "STRING",
            Self::Scriptable => "SCRIPTABLE",
            Self::Callable => "SLOT",
            Self::Date => "DATE",
            Self::Any => "ANY",
        }
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A point in time stored as milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(u64);

impl Date {
    /// Create a date from milliseconds since the Unix epoch.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the Unix epoch.
    pub const fn millis(self) -> u64 {
        self.0
    }

    /// Convert from a UTC timestamp. Dates before the epoch clamp to zero.
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(u64::try_from(datetime.timestamp_millis()).unwrap_or(0))
    }

    /// Convert to a UTC timestamp.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }

    /// Parse an RFC 3339 timestamp.
    pub fn parse(text: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|datetime| Self::from_datetime(datetime.with_timezone(&Utc)))
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(datetime) => f.write_str(&datetime.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => write!(f, "{}", self.0),
        }
    }
}

/// A dynamically typed value.
///
/// Equality is numeric across `Int64` and `Double`, textual for strings,
/// and by identity for scriptable and callable references. Ordering is
/// defined for numbers, strings and dates only.
#[derive(Clone, Default)]
pub enum Variant {
    /// No value.
    #[default]
    Void,
    /// A boolean.
    Bool(bool),
    /// A 64-bit signed integer.
    Int64(i64),
    /// A double precision float.
    Double(f64),
    /// A UTF-8 string.
    String(String),
    /// A possibly null reference to a scriptable object.
    Scriptable(Option<ScriptableRef>),
    /// A possibly null reference to a callable.
    Callable(Option<CallableRef>),
    /// A point in time.
    Date(Date),
    /// The "any type" marker. Never a real call argument.
    Any,
}

impl Variant {
    /// The kind of this value.
    pub fn variant_type(&self) -> VariantType {
        match self {
            Self::Void => VariantType::Void,
            Self::Bool(_) => VariantType::Bool,
            Self::Int64(_) => VariantType::Int64,
            Self::Double(_) => VariantType::Double,
            Self::String(_) => VariantType::String,
            Self::Scriptable(_) => VariantType::Scriptable,
            Self::Callable(_) => VariantType::Callable,
            Self::Date(_) => VariantType::Date,
            Self::Any => VariantType::Any,
        }
    }

    /// The zero value of a kind, used when a call cannot produce a value.
    pub fn default_of(kind: VariantType) -> Self {
        match kind {
            VariantType::Void | VariantType::Any => Self::Void,
            VariantType::Bool => Self::Bool(false),
            VariantType::Int64 => Self::Int64(0),
            VariantType::Double => Self::Double(0.0),
            VariantType::String => Self::String(String::new()),
            VariantType::Scriptable => Self::Scriptable(None),
            VariantType::Callable => Self::Callable(None),
            VariantType::Date => Self::Date(Date::default()),
        }
    }

    /// The prototype value describing a declared kind.
    ///
    /// Same as [`default_of`](Self::default_of), except that `Any` maps to
    /// the [`Variant::Any`] marker so callers can tell "declared as any"
    /// apart from "declared as void".
    pub fn prototype_of(kind: VariantType) -> Self {
        match kind {
            VariantType::Any => Self::Any,
            other => Self::default_of(other),
        }
    }

    /// Whether this is [`Variant::Void`].
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The scriptable payload, if this is a non-null scriptable reference.
    pub fn as_scriptable(&self) -> Option<&ScriptableRef> {
        match self {
            Self::Scriptable(Some(s)) => Some(s),
            _ => None,
        }
    }

    /// The callable payload, if this is a non-null callable reference.
    pub fn as_callable(&self) -> Option<&CallableRef> {
        match self {
            Self::Callable(Some(c)) => Some(c),
            _ => None,
        }
    }

    /// Convert to a boolean.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Self::Void => Some(false),
            Self::Bool(b) => Some(*b),
            Self::Int64(i) => Some(*i != 0),
            Self::Double(d) => Some(*d != 0.0 && !d.is_nan()),
            Self::String(s) => string_to_bool(s),
            Self::Scriptable(s) => Some(s.is_some()),
            Self::Callable(c) => Some(c.is_some()),
            Self::Date(_) | Self::Any => None,
        }
    }

    /// Convert to a 64-bit integer. Doubles are truncated toward zero.
    pub fn to_int64(&self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Int64(i) => Some(*i),
            Self::Double(d) => double_to_int64(*d),
            Self::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| parse_double(s).and_then(double_to_int64))
            }
            Self::Date(date) => i64::try_from(date.millis()).ok(),
            Self::Void | Self::Scriptable(_) | Self::Callable(_) | Self::Any => None,
        }
    }

    /// Convert to a double.
    pub fn to_double(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int64(i) => Some(*i as f64),
            Self::Double(d) => Some(*d),
            Self::String(s) => parse_double(s),
            Self::Date(date) => Some(date.millis() as f64),
            Self::Void | Self::Scriptable(_) | Self::Callable(_) | Self::Any => None,
        }
    }

    /// Convert to a string.
    pub fn to_string_value(&self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Int64(i) => Some(i.to_string()),
            Self::Double(d) => Some(d.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::Date(date) => Some(date.to_string()),
            Self::Void | Self::Scriptable(_) | Self::Callable(_) | Self::Any => None,
        }
    }

    /// Convert to a date. Numbers are read as milliseconds since the epoch,
    /// strings as RFC 3339 timestamps or millisecond counts.
    pub fn to_date(&self) -> Option<Date> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Int64(i) => u64::try_from(*i).ok().map(Date::from_millis),
            Self::Double(d) => double_to_int64(*d)
                .and_then(|i| u64::try_from(i).ok())
                .map(Date::from_millis),
            Self::String(s) => Date::parse(s).or_else(|| {
                s.trim().parse::<u64>().ok().map(Date::from_millis)
            }),
            _ => None,
        }
    }

    /// Convert this value to `kind`.
    ///
    /// Returns `None` without side effects when the conversion is not
    /// representable. Converting to [`VariantType::Any`] is the identity.
    pub fn convert_to(&self, kind: VariantType) -> Option<Variant> {
        match kind {
            VariantType::Any => Some(self.clone()),
            VariantType::Void => Some(Self::Void),
            VariantType::Bool => self.to_bool().map(Self::Bool),
            VariantType::Int64 => self.to_int64().map(Self::Int64),
            VariantType::Double => self.to_double().map(Self::Double),
            VariantType::String => self.to_string_value().map(Self::String),
            VariantType::Date => self.to_date().map(Self::Date),
            VariantType::Scriptable => match self {
                Self::Scriptable(s) => Some(Self::Scriptable(s.clone())),
                Self::Void => Some(Self::Scriptable(None)),
                _ => None,
            },
            VariantType::Callable => match self {
                Self::Callable(c) => Some(Self::Callable(c.clone())),
                Self::Void => Some(Self::Callable(None)),
                _ => None,
            },
        }
    }

    /// The canonical diagnostic form, for example `INT64:42`.
    pub fn print(&self) -> String {
        match self {
            Self::Void => "VOID".to_string(),
            Self::Bool(b) => format!("BOOL:{b}"),
            Self::Int64(i) => format!("INT64:{i}"),
            Self::Double(d) => format!("DOUBLE:{d}"),
            Self::String(s) => format!("STRING:{s}"),
            Self::Scriptable(Some(s)) => format!("SCRIPTABLE:{:#x}", s.class_id()),
            Self::Scriptable(None) => "SCRIPTABLE:NULL".to_string(),
            Self::Callable(Some(c)) => format!("SLOT:{}", describe_callable(c.as_ref())),
            Self::Callable(None) => "SLOT:NULL".to_string(),
            Self::Date(date) => format!("DATE:{}", date.millis()),
            Self::Any => "ANY".to_string(),
        }
    }
}

fn describe_callable(callable: &dyn Callable) -> String {
    if !callable.has_metadata() {
        return "dynamic".to_string();
    }
    let args: Vec<&str> = callable.arg_types().iter().map(|t| t.name()).collect();
    format!("{}({})", callable.return_type(), args.join(","))
}

fn string_to_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("false") {
        Some(false)
    } else if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else {
        parse_double(s).map(|d| d != 0.0)
    }
}

fn parse_double(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|d| d.is_finite())
}

fn double_to_int64(d: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if d.is_finite() && d >= i64::MIN as f64 && d < i64::MAX as f64 {
        Some(d.trunc() as i64)
    } else {
        None
    }
}

fn same_ref<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
        (None, None) => true,
        _ => false,
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Void, Self::Void) | (Self::Any, Self::Any) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int64(a), Self::Int64(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::Int64(i), Self::Double(d)) | (Self::Double(d), Self::Int64(i)) => {
                *i as f64 == *d
            }
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Scriptable(a), Self::Scriptable(b)) => same_ref(a, b),
            (Self::Callable(a), Self::Callable(b)) => same_ref(a, b),
            _ => false,
        }
    }
}

impl PartialOrd for Variant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int64(a), Self::Int64(b)) => Some(a.cmp(b)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (a, b) if is_numeric(a) && is_numeric(b) => {
                a.to_double()?.partial_cmp(&b.to_double()?)
            }
            _ => None,
        }
    }
}

fn is_numeric(v: &Variant) -> bool {
    matches!(v, Variant::Int64(_) | Variant::Double(_))
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.print())
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.print())
    }
}

/// A native type that can be extracted from a [`Variant`].
///
/// Extraction converts first, so `i32::from_variant(&Variant::from("12"))`
/// yields `Some(12)`.
pub trait FromVariant: Sized {
    /// The declared kind of this type in callable signatures.
    const VARIANT_TYPE: VariantType;

    /// Convert a variant into this type.
    fn from_variant(value: &Variant) -> Option<Self>;
}

/// A native type that can be wrapped in a [`Variant`].
pub trait IntoVariant {
    /// The declared kind of this type in callable signatures.
    const VARIANT_TYPE: VariantType;

    /// Wrap this value.
    fn into_variant(self) -> Variant;
}

macro_rules! impl_integer_variant {
    ($($ty:ty),*) => {$(
        impl FromVariant for $ty {
            const VARIANT_TYPE: VariantType = VariantType::Int64;

            fn from_variant(value: &Variant) -> Option<Self> {
                value.to_int64().and_then(|i| <$ty>::try_from(i).ok())
            }
        }

        impl IntoVariant for $ty {
            const VARIANT_TYPE: VariantType = VariantType::Int64;

            fn into_variant(self) -> Variant {
                Variant::Int64(i64::try_from(self).unwrap_or(i64::MAX))
            }
        }

        impl From<$ty> for Variant {
            fn from(value: $ty) -> Self {
                value.into_variant()
            }
        }
    )*};
}

impl_integer_variant!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_float_variant {
    ($($ty:ty),*) => {$(
        impl FromVariant for $ty {
            const VARIANT_TYPE: VariantType = VariantType::Double;

            fn from_variant(value: &Variant) -> Option<Self> {
                value.to_double().map(|d| d as $ty)
            }
        }

        impl IntoVariant for $ty {
            const VARIANT_TYPE: VariantType = VariantType::Double;

            fn into_variant(self) -> Variant {
                Variant::Double(f64::from(self))
            }
        }

        impl From<$ty> for Variant {
            fn from(value: $ty) -> Self {
                value.into_variant()
            }
        }
    )*};
}

impl_float_variant!(f32, f64);

impl FromVariant for bool {
    const VARIANT_TYPE: VariantType = VariantType::Bool;

    fn from_variant(value: &Variant) -> Option<Self> {
        value.to_bool()
    }
}

impl IntoVariant for bool {
    const VARIANT_TYPE: VariantType = VariantType::Bool;

    fn into_variant(self) -> Variant {
        Variant::Bool(self)
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Variant::Bool(value)
    }
}

/// Characters travel as their code point, the way scripts see them.
impl FromVariant for char {
    const VARIANT_TYPE: VariantType = VariantType::Int64;

    fn from_variant(value: &Variant) -> Option<Self> {
        if let Variant::String(s) = value {
            let mut chars = s.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                return Some(c);
            }
        }
        value
            .to_int64()
            .and_then(|i| u32::try_from(i).ok())
            .and_then(char::from_u32)
    }
}

impl IntoVariant for char {
    const VARIANT_TYPE: VariantType = VariantType::Int64;

    fn into_variant(self) -> Variant {
        Variant::Int64(i64::from(u32::from(self)))
    }
}

impl From<char> for Variant {
    fn from(value: char) -> Self {
        value.into_variant()
    }
}

impl FromVariant for String {
    const VARIANT_TYPE: VariantType = VariantType::String;

    fn from_variant(value: &Variant) -> Option<Self> {
        value.to_string_value()
    }
}

impl IntoVariant for String {
    const VARIANT_TYPE: VariantType = VariantType::String;

    fn into_variant(self) -> Variant {
        Variant::String(self)
    }
}

impl IntoVariant for &str {
    const VARIANT_TYPE: VariantType = VariantType::String;

    fn into_variant(self) -> Variant {
        Variant::String(self.to_string())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::String(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::String(value.to_string())
    }
}

impl FromVariant for Date {
    const VARIANT_TYPE: VariantType = VariantType::Date;

    fn from_variant(value: &Variant) -> Option<Self> {
        value.to_date()
    }
}

impl IntoVariant for Date {
    const VARIANT_TYPE: VariantType = VariantType::Date;

    fn into_variant(self) -> Variant {
        Variant::Date(self)
    }
}

impl From<Date> for Variant {
    fn from(value: Date) -> Self {
        Variant::Date(value)
    }
}

impl FromVariant for Variant {
    const VARIANT_TYPE: VariantType = VariantType::Any;

    fn from_variant(value: &Variant) -> Option<Self> {
        Some(value.clone())
    }
}

impl IntoVariant for Variant {
    const VARIANT_TYPE: VariantType = VariantType::Any;

    fn into_variant(self) -> Variant {
        self
    }
}

impl IntoVariant for () {
    const VARIANT_TYPE: VariantType = VariantType::Void;

    fn into_variant(self) -> Variant {
        Variant::Void
    }
}

impl FromVariant for Option<ScriptableRef> {
    const VARIANT_TYPE: VariantType = VariantType::Scriptable;

    fn from_variant(value: &Variant) -> Option<Self> {
        match value.convert_to(VariantType::Scriptable)? {
            Variant::Scriptable(s) => Some(s),
            _ => None,
        }
    }
}

impl IntoVariant for Option<ScriptableRef> {
    const VARIANT_TYPE: VariantType = VariantType::Scriptable;

    fn into_variant(self) -> Variant {
        Variant::Scriptable(self)
    }
}

impl IntoVariant for ScriptableRef {
    const VARIANT_TYPE: VariantType = VariantType::Scriptable;

    fn into_variant(self) -> Variant {
        Variant::Scriptable(Some(self))
    }
}

impl From<ScriptableRef> for Variant {
    fn from(value: ScriptableRef) -> Self {
        Variant::Scriptable(Some(value))
    }
}

impl FromVariant for Option<CallableRef> {
    const VARIANT_TYPE: VariantType = VariantType::Callable;

    fn from_variant(value: &Variant) -> Option<Self> {
        match value.convert_to(VariantType::Callable)? {
            Variant::Callable(c) => Some(c),
            _ => None,
        }
    }
}

impl IntoVariant for Option<CallableRef> {
    const VARIANT_TYPE: VariantType = VariantType::Callable;

    fn into_variant(self) -> Variant {
        Variant::Callable(self)
    }
}

impl IntoVariant for CallableRef {
    const VARIANT_TYPE: VariantType = VariantType::Callable;

    fn into_variant(self) -> Variant {
        Variant::Callable(Some(self))
    }
}

impl From<CallableRef> for Variant {
    fn from(value: CallableRef) -> Self {
        Variant::Callable(Some(value))
    }
}

/// A call result that keeps a script-owned object alive while it is held.
///
/// Constructing a `ResultVariant` attaches the referenced scriptable object
/// (if any); dropping it detaches, releasing a reference counted object
/// whose count falls to zero. [`into_inner`](Self::into_inner) hands the
/// value on without triggering a release.
pub struct ResultVariant {
    value: Variant,
}

impl ResultVariant {
    /// Wrap a value, attaching its scriptable payload.
    pub fn new(value: Variant) -> Self {
        if let Variant::Scriptable(Some(object)) = &value {
            object.attach();
        }
        Self { value }
    }

    /// The wrapped value.
    pub fn v(&self) -> &Variant {
        &self.value
    }

    /// Take the wrapped value, transferring the reference to the caller.
    pub fn into_inner(mut self) -> Variant {
        let value = std::mem::take(&mut self.value);
        if let Variant::Scriptable(Some(object)) = &value {
            object.detach(true);
        }
        value
    }
}

impl Drop for ResultVariant {
    fn drop(&mut self) {
        if let Variant::Scriptable(Some(object)) = &self.value {
            object.detach(false);
        }
    }
}

impl fmt::Debug for ResultVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResultVariant").field(&self.value).finish()
    }
}
