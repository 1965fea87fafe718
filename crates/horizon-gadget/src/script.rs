//! The boundary to an embedded script engine.
//!
//! The host never runs script itself. An engine implements
//! [`ScriptContext`] and hands back its function values as callables;
//! [`wrap_script_function`] gives such a value the signature native code
//! expects.

use horizon_gadget_core::{CallableRef, ScriptableRef, Variant, VariantType, slot_proxy_with_signature};

/// A script engine instance bound to one view.
pub trait ScriptContext: Send + Sync {
    /// Compile `script` into a function value. `filename` and `row` locate
    /// the source for engine diagnostics. Returns `None` on a syntax error.
    fn compile(&self, script: &str, filename: &str, row: usize) -> Option<CallableRef>;

    /// Run `script` immediately.
    fn execute(&self, script: &str, filename: &str, row: usize);

    /// Expose a native object under a global name.
    fn set_global(&self, name: &str, object: ScriptableRef) -> bool;

    /// Expose a native constructor under a global name.
    fn register_class(&self, name: &str, constructor: CallableRef) -> bool;

    /// Read a global value, `Void` when undefined.
    fn get_global(&self, _name: &str) -> Variant {
        Variant::Void
    }
}

/// Give a script function value a native signature.
///
/// The engine's callable usually carries no metadata; the returned proxy
/// reports `return_type` and `arg_types` and converts results to the
/// declared type.
pub fn wrap_script_function(
    function: CallableRef,
    return_type: VariantType,
    arg_types: Vec<VariantType>,
) -> CallableRef {
    slot_proxy_with_signature(function, return_type, arg_types)
}
