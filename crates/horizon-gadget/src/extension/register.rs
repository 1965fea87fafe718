//! Registrars that hand a module the object it extends.

use horizon_gadget_core::Scriptable;

use super::ExtensionModule;
use crate::element::ElementFactory;
use crate::script::ScriptContext;

/// Runs one registration entry point of a module.
pub trait ExtensionRegister {
    /// Returns `false` if the module lacks the entry point or it failed.
    fn register_extension(&self, extension: &dyn ExtensionModule) -> bool;
}

/// Registers element classes into a factory.
pub struct ElementExtensionRegister<'a> {
    factory: &'a ElementFactory,
}

impl<'a> ElementExtensionRegister<'a> {
    pub fn new(factory: &'a ElementFactory) -> Self {
        Self { factory }
    }
}

impl ExtensionRegister for ElementExtensionRegister<'_> {
    fn register_extension(&self, extension: &dyn ExtensionModule) -> bool {
        extension.register_element_extension(self.factory)
    }
}

/// Registers script bindings into a script context.
pub struct ScriptExtensionRegister<'a> {
    context: &'a dyn ScriptContext,
}

impl<'a> ScriptExtensionRegister<'a> {
    pub fn new(context: &'a dyn ScriptContext) -> Self {
        Self { context }
    }
}

impl ExtensionRegister for ScriptExtensionRegister<'_> {
    fn register_extension(&self, extension: &dyn ExtensionModule) -> bool {
        extension.register_script_extension(self.context)
    }
}

/// Registers members on the framework object scripts see.
pub struct FrameworkExtensionRegister<'a> {
    framework: &'a dyn Scriptable,
}

impl<'a> FrameworkExtensionRegister<'a> {
    pub fn new(framework: &'a dyn Scriptable) -> Self {
        Self { framework }
    }
}

impl ExtensionRegister for FrameworkExtensionRegister<'_> {
    fn register_extension(&self, extension: &dyn ExtensionModule) -> bool {
        extension.register_framework_extension(self.framework)
    }
}

/// Fans one registration out to several registrars.
///
/// Every registrar runs; the result is `true` if any of them succeeded.
#[derive(Default)]
pub struct MultipleExtensionRegisterWrapper<'a> {
    registers: Vec<&'a dyn ExtensionRegister>,
}

impl<'a> MultipleExtensionRegisterWrapper<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_extension_register(&mut self, register: &'a dyn ExtensionRegister) {
        self.registers.push(register);
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}

impl ExtensionRegister for MultipleExtensionRegisterWrapper<'_> {
    fn register_extension(&self, extension: &dyn ExtensionModule) -> bool {
        self.registers
            .iter()
            .fold(false, |any, register| register.register_extension(extension) || any)
    }
}
