//! Core systems for Horizon Gadget.
//!
//! This crate provides the calling convention shared by the gadget host and
//! the script engines it embeds:
//!
//! - **Variant**: the tagged value crossing the native/script boundary
//! - **Callable**: type-describing wrappers around native functions,
//!   methods and closures of any arity
//! - **Signal**: multicast connection points holding callables
//! - **Property**: value cells backing script-visible properties
//! - **Scriptable objects**: property bags with methods, constants,
//!   signals, prototype delegation and dynamic members
//!
//! # Callable Example
//!
//! ```
//! use horizon_gadget_core::{function_slot, Variant, VariantType};
//!
//! fn describe(count: i32, label: String) -> String {
//!     format!("{count} {label}")
//! }
//!
//! let slot = function_slot(describe);
//! assert_eq!(slot.arg_count(), 2);
//! assert_eq!(slot.return_type(), VariantType::String);
//!
//! let result = slot.call(&[Variant::from(3), Variant::from("apples")]);
//! assert_eq!(*result.v(), Variant::from("3 apples"));
//! ```
//!
//! # Signal Example
//!
//! ```
//! use horizon_gadget_core::{functor_slot, Signal, Variant, VariantType};
//!
//! let value_changed = Signal::with_signature(VariantType::Void, vec![VariantType::Int64]);
//! let id = value_changed
//!     .connect(functor_slot(|value: i64| println!("value changed to {value}")))
//!     .expect("compatible handler");
//!
//! value_changed.emit(&[Variant::from(42)]);
//! value_changed.disconnect(id);
//! ```

mod callable;
mod error;
pub mod logging;
mod property;
mod scriptable;
pub mod signal;
pub mod strings;
mod variant;

pub use callable::{
    BoundSlot, Callable, CallableRef, DefaultArgsSlot, DynamicSlot, FunctionSlot, FunctorSlot,
    MethodSlot, MutMethodSlot, NativeFunction, NativeMethod, NativeMutMethod, SlotProxy,
    bind_trailing, bound_function_slot, bound_functor_slot, bound_method_slot, dynamic_slot,
    fixed_getter_slot, function_slot, functor_slot, method_slot, mut_method_slot,
    property_getter_slot, property_setter_slot, slot_proxy, slot_proxy_with_signature,
    with_default_args,
};
pub use error::{CallError, CallResult, PropertyError, PropertyResult};
pub use logging::{PerfSpan, TreeFormatOptions, TreeStyle};
pub use property::Property;
pub use scriptable::{
    ClassId, OwnershipPolicy, PropertyId, PropertyInfo, Scriptable, ScriptableHelper,
    ScriptableRef,
};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use strings::{gadget_str_cmp, gadget_str_eq, name_key};
pub use variant::{Date, FromVariant, IntoVariant, ResultVariant, Variant, VariantType};

static_assertions::assert_impl_all!(Variant: Send, Sync, Clone);
static_assertions::assert_impl_all!(Signal: Send, Sync);
static_assertions::assert_impl_all!(ScriptableHelper: Send, Sync);
static_assertions::assert_impl_all!(Property<f64>: Send, Sync);
