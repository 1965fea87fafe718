//! Callables: type-describing wrappers around invokable targets.
//!
//! A [`Callable`] is an immutable calling target that knows its own
//! signature. Script marshallers query [`Callable::arg_types`] and
//! [`Callable::return_type`] to validate a call before anything native
//! runs, then convert each argument and invoke.
//!
//! # Binding kinds
//!
//! | Constructor | Target |
//! |-------------|--------|
//! | [`function_slot`] | a free function (or a non-capturing closure) |
//! | [`method_slot`] | a method taking `&T` on a weakly held object |
//! | [`mut_method_slot`] | a method taking `&mut T` on a weakly held `Mutex<T>` |
//! | [`functor_slot`] | a closure with captured state |
//! | [`bound_function_slot`], [`bound_method_slot`], [`bound_functor_slot`], [`bind_trailing`] | any of the above with the last argument fixed |
//! | [`slot_proxy`], [`slot_proxy_with_signature`] | another callable, forwarded unchanged |
//! | [`with_default_args`] | another callable, annotated with default values |
//! | [`dynamic_slot`] | a metadata-less target such as a script function |
//!
//! Arity is taken from the target's Rust signature, so every callable can
//! answer its metadata queries without executing anything.
//!
//! # Example
//!
//! ```
//! use horizon_gadget_core::{function_slot, Variant, VariantType};
//!
//! fn scale(value: f64, factor: i32) -> f64 {
//!     value * f64::from(factor)
//! }
//!
//! let slot = function_slot(scale);
//! assert_eq!(slot.arg_types(), &[VariantType::Double, VariantType::Int64]);
//! assert_eq!(slot.return_type(), VariantType::Double);
//!
//! let result = slot.call(&[Variant::from("1.5"), Variant::from(4)]);
//! assert_eq!(*result.v(), Variant::Double(6.0));
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{CallError, CallResult};
use crate::logging::targets;
use crate::property::Property;
use crate::variant::{FromVariant, IntoVariant, ResultVariant, Variant, VariantType};

/// A shared, type-erased callable.
pub type CallableRef = Arc<dyn Callable>;

/// An invokable target with runtime type metadata.
pub trait Callable: Send + Sync + 'static {
    /// Invoke the target, reporting argument and conversion failures.
    fn invoke(&self, args: &[Variant]) -> CallResult<Variant>;

    /// The declared return type.
    fn return_type(&self) -> VariantType;

    /// The declared argument types, in order.
    fn arg_types(&self) -> &[VariantType];

    /// The declared argument count.
    fn arg_count(&self) -> usize {
        self.arg_types().len()
    }

    /// Default argument values, one per argument. A `Void` entry marks a
    /// required argument. Defaults are informational: [`call`](Self::call)
    /// never fills them in.
    fn default_args(&self) -> Option<&[Variant]> {
        None
    }

    /// Whether the metadata queries describe the target. Dynamic targets
    /// accept any argument list and return `false`.
    fn has_metadata(&self) -> bool {
        true
    }

    /// Upcast for equality checks.
    fn as_any(&self) -> &dyn Any;

    /// Compare with another callable of the same binding kind.
    ///
    /// Callables of different concrete kinds never compare equal.
    fn eq_callable(&self, other: &dyn Callable) -> bool;

    /// Invoke the target.
    ///
    /// # Panics
    ///
    /// Panics if the target has metadata and `args.len()` differs from
    /// [`arg_count`](Self::arg_count). Other failures are logged and yield
    /// the zero value of the declared return type.
    fn call(&self, args: &[Variant]) -> ResultVariant {
        if self.has_metadata() {
            assert_eq!(
                args.len(),
                self.arg_count(),
                "callable invoked with the wrong number of arguments"
            );
        }
        match self.invoke(args) {
            Ok(value) => ResultVariant::new(value),
            Err(err) => {
                tracing::error!(target: targets::SLOT, %err, "call failed");
                ResultVariant::new(Variant::default_of(self.return_type()))
            }
        }
    }
}

impl PartialEq for dyn Callable {
    fn eq(&self, other: &Self) -> bool {
        self.eq_callable(other)
    }
}

impl fmt::Debug for dyn Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("return_type", &self.return_type())
            .field("arg_types", &self.arg_types())
            .field("has_metadata", &self.has_metadata())
            .finish()
    }
}

fn check_arg_count(expected: usize, args: &[Variant]) -> CallResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(CallError::ArgumentCount {
            expected,
            got: args.len(),
        })
    }
}

fn convert_arg<T: FromVariant>(args: &[Variant], index: usize) -> CallResult<T> {
    let value = &args[index];
    T::from_variant(value).ok_or(CallError::ArgumentType {
        index,
        expected: T::VARIANT_TYPE,
        got: value.variant_type(),
    })
}

/// A native function whose signature is known at compile time.
///
/// `Marker` is the function pointer type `fn(A1, .., An) -> R` and only
/// serves to select the arity.
pub trait NativeFunction<Marker>: Send + Sync + 'static {
    /// The native return type.
    type Output: IntoVariant;

    /// The declared argument types.
    fn arg_types() -> Vec<VariantType>;

    /// Convert `args` and call. `args` must already have the right length.
    fn apply(&self, args: &[Variant]) -> CallResult<Self::Output>;
}

/// A method taking `&T` whose signature is known at compile time.
pub trait NativeMethod<T, Marker>: Send + Sync + 'static {
    /// The native return type.
    type Output: IntoVariant;

    /// The declared argument types, receiver excluded.
    fn arg_types() -> Vec<VariantType>;

    /// Convert `args` and call on `receiver`.
    fn apply(&self, receiver: &T, args: &[Variant]) -> CallResult<Self::Output>;
}

/// A method taking `&mut T` whose signature is known at compile time.
pub trait NativeMutMethod<T, Marker>: Send + Sync + 'static {
    /// The native return type.
    type Output: IntoVariant;

    /// The declared argument types, receiver excluded.
    fn arg_types() -> Vec<VariantType>;

    /// Convert `args` and call on `receiver`.
    fn apply(&self, receiver: &mut T, args: &[Variant]) -> CallResult<Self::Output>;
}

macro_rules! impl_native_targets {
    ($($arg:ident => $value:ident @ $index:tt),*) => {
        impl<Func, Ret, $($arg,)*> NativeFunction<fn($($arg),*) -> Ret> for Func
        where
            Func: Fn($($arg),*) -> Ret + Send + Sync + 'static,
            Ret: IntoVariant,
            $($arg: FromVariant,)*
        {
            type Output = Ret;

            fn arg_types() -> Vec<VariantType> {
                vec![$(<$arg as FromVariant>::VARIANT_TYPE),*]
            }

            #[allow(unused_variables)]
            fn apply(&self, args: &[Variant]) -> CallResult<Ret> {
                $(let $value: $arg = convert_arg(args, $index)?;)*
                Ok((self)($($value),*))
            }
        }

        impl<Func, Target, Ret, $($arg,)*> NativeMethod<Target, fn($($arg),*) -> Ret> for Func
        where
            Func: Fn(&Target, $($arg),*) -> Ret + Send + Sync + 'static,
            Ret: IntoVariant,
            $($arg: FromVariant,)*
        {
            type Output = Ret;

            fn arg_types() -> Vec<VariantType> {
                vec![$(<$arg as FromVariant>::VARIANT_TYPE),*]
            }

            #[allow(unused_variables)]
            fn apply(&self, receiver: &Target, args: &[Variant]) -> CallResult<Ret> {
                $(let $value: $arg = convert_arg(args, $index)?;)*
                Ok((self)(receiver, $($value),*))
            }
        }

        impl<Func, Target, Ret, $($arg,)*> NativeMutMethod<Target, fn($($arg),*) -> Ret> for Func
        where
            Func: Fn(&mut Target, $($arg),*) -> Ret + Send + Sync + 'static,
            Ret: IntoVariant,
            $($arg: FromVariant,)*
        {
            type Output = Ret;

            fn arg_types() -> Vec<VariantType> {
                vec![$(<$arg as FromVariant>::VARIANT_TYPE),*]
            }

            #[allow(unused_variables)]
            fn apply(&self, receiver: &mut Target, args: &[Variant]) -> CallResult<Ret> {
                $(let $value: $arg = convert_arg(args, $index)?;)*
                Ok((self)(receiver, $($value),*))
            }
        }
    };
}

impl_native_targets!();
impl_native_targets!(A1 => a1 @ 0);
impl_native_targets!(A1 => a1 @ 0, A2 => a2 @ 1);
impl_native_targets!(A1 => a1 @ 0, A2 => a2 @ 1, A3 => a3 @ 2);
impl_native_targets!(A1 => a1 @ 0, A2 => a2 @ 1, A3 => a3 @ 2, A4 => a4 @ 3);
impl_native_targets!(A1 => a1 @ 0, A2 => a2 @ 1, A3 => a3 @ 2, A4 => a4 @ 3, A5 => a5 @ 4);
impl_native_targets!(
    A1 => a1 @ 0, A2 => a2 @ 1, A3 => a3 @ 2, A4 => a4 @ 3, A5 => a5 @ 4, A6 => a6 @ 5
);
impl_native_targets!(
    A1 => a1 @ 0, A2 => a2 @ 1, A3 => a3 @ 2, A4 => a4 @ 3, A5 => a5 @ 4, A6 => a6 @ 5,
    A7 => a7 @ 6
);
impl_native_targets!(
    A1 => a1 @ 0, A2 => a2 @ 1, A3 => a3 @ 2, A4 => a4 @ 3, A5 => a5 @ 4, A6 => a6 @ 5,
    A7 => a7 @ 6, A8 => a8 @ 7
);
impl_native_targets!(
    A1 => a1 @ 0, A2 => a2 @ 1, A3 => a3 @ 2, A4 => a4 @ 3, A5 => a5 @ 4, A6 => a6 @ 5,
    A7 => a7 @ 6, A8 => a8 @ 7, A9 => a9 @ 8
);

/// A callable bound to a free function.
///
/// Two function slots are equal when they wrap the same function item or
/// the same non-capturing closure. Slots built from different closures
/// never compare equal, and a slot built from a function pointer only
/// equals itself.
pub struct FunctionSlot<F, M> {
    function: F,
    arg_types: Vec<VariantType>,
    _marker: PhantomData<fn() -> M>,
}

impl<F, M> FunctionSlot<F, M>
where
    F: NativeFunction<M>,
    M: 'static,
{
    /// Wrap `function`.
    pub fn new(function: F) -> Self {
        Self {
            function,
            arg_types: F::arg_types(),
            _marker: PhantomData,
        }
    }
}

impl<F, M> Callable for FunctionSlot<F, M>
where
    F: NativeFunction<M>,
    M: 'static,
{
    fn invoke(&self, args: &[Variant]) -> CallResult<Variant> {
        check_arg_count(self.arg_types.len(), args)?;
        Ok(self.function.apply(args)?.into_variant())
    }

    fn return_type(&self) -> VariantType {
        <F::Output as IntoVariant>::VARIANT_TYPE
    }

    fn arg_types(&self) -> &[VariantType] {
        &self.arg_types
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_callable(&self, other: &dyn Callable) -> bool {
        // A zero-sized function type names exactly one function.
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|other| size_of::<F>() == 0 || std::ptr::eq(self, other))
    }
}

/// A callable bound to a closure with captured state.
///
/// Closures have no value equality, so a functor slot only equals itself.
pub struct FunctorSlot<F, M> {
    functor: F,
    arg_types: Vec<VariantType>,
    _marker: PhantomData<fn() -> M>,
}

impl<F, M> FunctorSlot<F, M>
where
    F: NativeFunction<M>,
    M: 'static,
{
    /// Wrap `functor`, taking it by value.
    pub fn new(functor: F) -> Self {
        Self {
            functor,
            arg_types: F::arg_types(),
            _marker: PhantomData,
        }
    }
}

impl<F, M> Callable for FunctorSlot<F, M>
where
    F: NativeFunction<M>,
    M: 'static,
{
    fn invoke(&self, args: &[Variant]) -> CallResult<Variant> {
        check_arg_count(self.arg_types.len(), args)?;
        Ok(self.functor.apply(args)?.into_variant())
    }

    fn return_type(&self) -> VariantType {
        <F::Output as IntoVariant>::VARIANT_TYPE
    }

    fn arg_types(&self) -> &[VariantType] {
        &self.arg_types
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_callable(&self, other: &dyn Callable) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|other| std::ptr::eq(self, other))
    }
}

/// A callable bound to a `&T` method of a weakly held object.
///
/// The slot does not keep the receiver alive; invoking it after the
/// receiver is dropped fails with [`CallError::ReceiverDropped`]. This lets
/// an object register its own methods without creating a reference cycle.
pub struct MethodSlot<T, F, M> {
    receiver: Weak<T>,
    method: F,
    arg_types: Vec<VariantType>,
    _marker: PhantomData<fn() -> M>,
}

impl<T, F, M> Callable for MethodSlot<T, F, M>
where
    T: Send + Sync + 'static,
    F: NativeMethod<T, M>,
    M: 'static,
{
    fn invoke(&self, args: &[Variant]) -> CallResult<Variant> {
        check_arg_count(self.arg_types.len(), args)?;
        let receiver = self.receiver.upgrade().ok_or(CallError::ReceiverDropped)?;
        Ok(self.method.apply(&receiver, args)?.into_variant())
    }

    fn return_type(&self) -> VariantType {
        <F::Output as IntoVariant>::VARIANT_TYPE
    }

    fn arg_types(&self) -> &[VariantType] {
        &self.arg_types
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_callable(&self, other: &dyn Callable) -> bool {
        other.as_any().downcast_ref::<Self>().is_some_and(|other| {
            Weak::ptr_eq(&self.receiver, &other.receiver)
                && (size_of::<F>() == 0 || std::ptr::eq(self, other))
        })
    }
}

/// A callable bound to a `&mut T` method of a weakly held `Mutex<T>`.
///
/// The mutex is held for the duration of the call, so the method must not
/// re-enter the same object through another slot.
pub struct MutMethodSlot<T, F, M> {
    receiver: Weak<Mutex<T>>,
    method: F,
    arg_types: Vec<VariantType>,
    _marker: PhantomData<fn() -> M>,
}

impl<T, F, M> Callable for MutMethodSlot<T, F, M>
where
    T: Send + 'static,
    F: NativeMutMethod<T, M>,
    M: 'static,
{
    fn invoke(&self, args: &[Variant]) -> CallResult<Variant> {
        check_arg_count(self.arg_types.len(), args)?;
        let receiver = self.receiver.upgrade().ok_or(CallError::ReceiverDropped)?;
        let mut guard = receiver.lock();
        Ok(self.method.apply(&mut guard, args)?.into_variant())
    }

    fn return_type(&self) -> VariantType {
        <F::Output as IntoVariant>::VARIANT_TYPE
    }

    fn arg_types(&self) -> &[VariantType] {
        &self.arg_types
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_callable(&self, other: &dyn Callable) -> bool {
        other.as_any().downcast_ref::<Self>().is_some_and(|other| {
            Weak::ptr_eq(&self.receiver, &other.receiver)
                && (size_of::<F>() == 0 || std::ptr::eq(self, other))
        })
    }
}

/// A callable with its last argument fixed at construction time.
///
/// The visible arity is one less than the target's.
pub struct BoundSlot {
    target: CallableRef,
    bound: Variant,
    arg_types: Vec<VariantType>,
}

impl BoundSlot {
    /// Bind the trailing argument of `target` to `bound`.
    ///
    /// # Panics
    ///
    /// Panics if `target` has no metadata or takes no arguments.
    pub fn new(target: CallableRef, bound: Variant) -> Self {
        assert!(
            target.has_metadata() && target.arg_count() > 0,
            "only callables with at least one declared argument can be bound"
        );
        let types = target.arg_types();
        let arg_types = types[..types.len() - 1].to_vec();
        Self {
            target,
            bound,
            arg_types,
        }
    }

    /// The fixed trailing argument.
    pub fn bound_value(&self) -> &Variant {
        &self.bound
    }
}

impl Callable for BoundSlot {
    fn invoke(&self, args: &[Variant]) -> CallResult<Variant> {
        check_arg_count(self.arg_types.len(), args)?;
        let mut full = Vec::with_capacity(args.len() + 1);
        full.extend_from_slice(args);
        full.push(self.bound.clone());
        self.target.invoke(&full)
    }

    fn return_type(&self) -> VariantType {
        self.target.return_type()
    }

    fn arg_types(&self) -> &[VariantType] {
        &self.arg_types
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_callable(&self, other: &dyn Callable) -> bool {
        other.as_any().downcast_ref::<Self>().is_some_and(|other| {
            *self.target == *other.target && self.bound == other.bound
        })
    }
}

/// A callable that forwards to another callable under a declared signature.
///
/// Used to give a dynamically typed target, such as a script function,
/// a static signature. Arguments are forwarded unchanged. The target's
/// result is converted to the declared return type; when that is not
/// possible, [`invoke`](Callable::invoke) fails with
/// [`CallError::ReturnType`] and [`call`](Callable::call) logs the failure
/// and yields the declared type's zero value.
pub struct SlotProxy {
    target: CallableRef,
    return_type: VariantType,
    arg_types: Vec<VariantType>,
}

impl SlotProxy {
    /// The wrapped callable.
    pub fn target(&self) -> &CallableRef {
        &self.target
    }
}

impl Callable for SlotProxy {
    fn invoke(&self, args: &[Variant]) -> CallResult<Variant> {
        check_arg_count(self.arg_types.len(), args)?;
        let result = self.target.invoke(args)?;
        match self.return_type {
            VariantType::Void => Ok(Variant::Void),
            declared => result
                .convert_to(declared)
                .ok_or(CallError::ReturnType {
                    expected: declared,
                    got: result.variant_type(),
                }),
        }
    }

    fn return_type(&self) -> VariantType {
        self.return_type
    }

    fn arg_types(&self) -> &[VariantType] {
        &self.arg_types
    }

    fn default_args(&self) -> Option<&[Variant]> {
        self.target.default_args()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_callable(&self, other: &dyn Callable) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|other| *self.target == *other.target)
    }
}

/// A callable annotated with default argument values.
pub struct DefaultArgsSlot {
    target: CallableRef,
    defaults: Vec<Variant>,
}

impl Callable for DefaultArgsSlot {
    fn invoke(&self, args: &[Variant]) -> CallResult<Variant> {
        self.target.invoke(args)
    }

    fn return_type(&self) -> VariantType {
        self.target.return_type()
    }

    fn arg_types(&self) -> &[VariantType] {
        self.target.arg_types()
    }

    fn default_args(&self) -> Option<&[Variant]> {
        Some(&self.defaults)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_callable(&self, other: &dyn Callable) -> bool {
        other.as_any().downcast_ref::<Self>().is_some_and(|other| {
            *self.target == *other.target && self.defaults == other.defaults
        })
    }
}

/// A callable without metadata that accepts any argument list.
///
/// This is the shape of a function value supplied by a script engine.
pub struct DynamicSlot<F> {
    function: F,
}

impl<F> Callable for DynamicSlot<F>
where
    F: Fn(&[Variant]) -> Variant + Send + Sync + 'static,
{
    fn invoke(&self, args: &[Variant]) -> CallResult<Variant> {
        Ok((self.function)(args))
    }

    fn return_type(&self) -> VariantType {
        VariantType::Any
    }

    fn arg_types(&self) -> &[VariantType] {
        &[]
    }

    fn has_metadata(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_callable(&self, other: &dyn Callable) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|other| std::ptr::eq(self, other))
    }
}

/// Wrap a free function.
pub fn function_slot<F, M>(function: F) -> CallableRef
where
    F: NativeFunction<M>,
    M: 'static,
{
    Arc::new(FunctionSlot::new(function))
}

/// Wrap a closure, capturing it by value.
pub fn functor_slot<F, M>(functor: F) -> CallableRef
where
    F: NativeFunction<M>,
    M: 'static,
{
    Arc::new(FunctorSlot::new(functor))
}

/// Wrap a `&T` method of a weakly held object.
pub fn method_slot<T, F, M>(receiver: &Weak<T>, method: F) -> CallableRef
where
    T: Send + Sync + 'static,
    F: NativeMethod<T, M>,
    M: 'static,
{
    Arc::new(MethodSlot {
        receiver: receiver.clone(),
        method,
        arg_types: F::arg_types(),
        _marker: PhantomData,
    })
}

/// Wrap a `&mut T` method of a weakly held `Mutex<T>`.
pub fn mut_method_slot<T, F, M>(receiver: &Weak<Mutex<T>>, method: F) -> CallableRef
where
    T: Send + 'static,
    F: NativeMutMethod<T, M>,
    M: 'static,
{
    Arc::new(MutMethodSlot {
        receiver: receiver.clone(),
        method,
        arg_types: F::arg_types(),
        _marker: PhantomData,
    })
}

/// Fix the trailing argument of any callable.
pub fn bind_trailing(target: CallableRef, bound: impl IntoVariant) -> CallableRef {
    Arc::new(BoundSlot::new(target, bound.into_variant()))
}

/// Wrap a free function with its last argument fixed.
pub fn bound_function_slot<F, M>(function: F, bound: impl IntoVariant) -> CallableRef
where
    F: NativeFunction<M>,
    M: 'static,
{
    bind_trailing(function_slot(function), bound)
}

/// Wrap a closure with its last argument fixed.
pub fn bound_functor_slot<F, M>(functor: F, bound: impl IntoVariant) -> CallableRef
where
    F: NativeFunction<M>,
    M: 'static,
{
    bind_trailing(functor_slot(functor), bound)
}

/// Wrap a `&T` method with its last argument fixed.
pub fn bound_method_slot<T, F, M>(
    receiver: &Weak<T>,
    method: F,
    bound: impl IntoVariant,
) -> CallableRef
where
    T: Send + Sync + 'static,
    F: NativeMethod<T, M>,
    M: 'static,
{
    bind_trailing(method_slot(receiver, method), bound)
}

/// Forward to `target` under its own signature.
///
/// # Panics
///
/// Panics if `target` has no metadata; use [`slot_proxy_with_signature`].
pub fn slot_proxy(target: CallableRef) -> CallableRef {
    assert!(
        target.has_metadata(),
        "a proxy over a dynamic target needs an explicit signature"
    );
    let return_type = target.return_type();
    let arg_types = target.arg_types().to_vec();
    slot_proxy_with_signature(target, return_type, arg_types)
}

/// Forward to `target` under a declared signature.
pub fn slot_proxy_with_signature(
    target: CallableRef,
    return_type: VariantType,
    arg_types: Vec<VariantType>,
) -> CallableRef {
    Arc::new(SlotProxy {
        target,
        return_type,
        arg_types,
    })
}

/// Attach default argument values to `target`.
///
/// # Panics
///
/// Panics if `defaults` does not have one entry per argument.
pub fn with_default_args(target: CallableRef, defaults: Vec<Variant>) -> CallableRef {
    assert_eq!(
        defaults.len(),
        target.arg_count(),
        "one default value is needed per argument"
    );
    Arc::new(DefaultArgsSlot { target, defaults })
}

/// Wrap a metadata-less function of the raw argument list.
pub fn dynamic_slot<F>(function: F) -> CallableRef
where
    F: Fn(&[Variant]) -> Variant + Send + Sync + 'static,
{
    Arc::new(DynamicSlot { function })
}

/// A getter that always returns `value`.
pub fn fixed_getter_slot<T>(value: T) -> CallableRef
where
    T: IntoVariant + Clone + Send + Sync + 'static,
{
    functor_slot(move || value.clone())
}

/// A getter reading `property`.
pub fn property_getter_slot<T>(property: &Arc<Property<T>>) -> CallableRef
where
    T: IntoVariant + Clone + Send + Sync + 'static,
{
    let property = Arc::clone(property);
    functor_slot(move || property.get())
}

/// A setter writing `property`.
pub fn property_setter_slot<T>(property: &Arc<Property<T>>) -> CallableRef
where
    T: FromVariant + Clone + PartialEq + Send + Sync + 'static,
{
    let property = Arc::clone(property);
    functor_slot(move |value: T| {
        property.set(value);
    })
}
