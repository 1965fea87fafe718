//! Scriptable objects: native objects exposed to the dynamic world.
//!
//! A [`Scriptable`] object is a property bag with four disjoint kinds of
//! named members, all registered on its [`ScriptableHelper`]:
//!
//! - properties, a getter and/or setter [`Callable`] pair
//! - methods, a [`Callable`] exposed as a function value
//! - constants, a fixed [`Variant`]
//! - signals, a [`Signal`] whose script-visible value is the current handler
//!
//! Names resolve through [`Scriptable::property_info`], which yields a
//! [`PropertyId`] that later reads and writes reuse without another lookup.
//! A name that misses the static registry goes to the dynamic property
//! handler (if any) and then to the prototype object (if any). The
//! prototype is held weakly and is never owned.
//!
//! # Example
//!
//! ```
//! use std::any::Any;
//! use std::sync::Arc;
//! use horizon_gadget_core::{
//!     property_getter_slot, property_setter_slot, ClassId, Property, Scriptable,
//!     ScriptableHelper, Variant,
//! };
//!
//! struct Gauge {
//!     helper: ScriptableHelper,
//! }
//!
//! impl Scriptable for Gauge {
//!     fn scriptable_helper(&self) -> &ScriptableHelper {
//!         &self.helper
//!     }
//!     fn class_id(&self) -> ClassId {
//!         0x4a1c_7d0e_5b93_2f68
//!     }
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//! }
//!
//! let level = Arc::new(Property::new(0.5_f64));
//! let gauge = Gauge { helper: ScriptableHelper::new() };
//! gauge.scriptable_helper().register_property(
//!     "level",
//!     Some(property_getter_slot(&level)),
//!     Some(property_setter_slot(&level)),
//! );
//!
//! assert!(gauge.set_property_by_name("level", Variant::from("0.75")));
//! assert_eq!(gauge.get_property_by_name("level"), Some(Variant::Double(0.75)));
//! ```

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::callable::{CallableRef, property_getter_slot, property_setter_slot};
use crate::error::{PropertyError, PropertyResult};
use crate::logging::targets;
use crate::property::Property;
use crate::signal::{ConnectionId, Signal};
use crate::variant::{FromVariant, IntoVariant, Variant, VariantType};

/// A shared, type-erased scriptable object.
pub type ScriptableRef = Arc<dyn Scriptable>;

/// A 64-bit class identifier used for runtime type checks.
pub type ClassId = u64;

/// Who is responsible for destroying a scriptable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnershipPolicy {
    /// Owned by native code; script references never release it.
    NativeOwned,
    /// Owned by native code until the first script reference, after which
    /// it becomes script owned.
    NativeTransferable,
    /// Reference counted by the dynamic world and released when the count
    /// reaches zero.
    ScriptOwned,
}

/// Opaque handle produced by a name lookup.
///
/// Ids are stable while the object is unmodified: looking up the same name
/// twice yields the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyId {
    /// A registered property, method or signal. `depth` counts the
    /// prototype hops between the queried object and the owner.
    Registered {
        /// Slot in the owner's registry.
        index: u32,
        /// Number of prototype hops.
        depth: u8,
    },
    /// A constant; its value is the lookup's prototype value.
    Constant,
    /// A property served by a dynamic handler; access it by name.
    Dynamic,
}

/// The result of [`Scriptable::property_info`].
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    /// Handle for [`Scriptable::get_property`] and [`Scriptable::set_property`].
    pub id: PropertyId,
    /// A value of the declared kind. For methods this is the method
    /// callable; for constants and dynamic properties it is the value.
    pub prototype: Variant,
    /// Whether the name denotes a method.
    pub is_method: bool,
}

impl PropertyInfo {
    /// The declared kind of the property.
    pub fn kind(&self) -> VariantType {
        self.prototype.variant_type()
    }
}

/// A native object with named script-visible members.
pub trait Scriptable: Send + Sync + 'static {
    /// The registry holding this object's members.
    fn scriptable_helper(&self) -> &ScriptableHelper;

    /// The concrete class id.
    fn class_id(&self) -> ClassId;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Whether this object is of class `class_id` or derives from it.
    fn is_instance_of(&self, class_id: ClassId) -> bool {
        self.class_id() == class_id
    }

    /// The current ownership policy.
    fn ownership_policy(&self) -> OwnershipPolicy {
        self.scriptable_helper().ownership_policy()
    }

    /// Record a new script reference.
    fn attach(&self) -> OwnershipPolicy {
        self.scriptable_helper().attach()
    }

    /// Drop a script reference. Returns `true` when the object was released.
    fn detach(&self, transient: bool) -> bool {
        self.scriptable_helper().detach(transient)
    }

    /// Resolve `name` to a property id.
    fn property_info(&self, name: &str) -> Option<PropertyInfo> {
        self.scriptable_helper().property_info(name)
    }

    /// Read a property by id. Failures are logged and yield `Void`.
    fn get_property(&self, id: PropertyId) -> Variant {
        self.scriptable_helper().get_property(id)
    }

    /// Write a property by id. Failures are logged and leave the value
    /// unchanged.
    fn set_property(&self, id: PropertyId, value: Variant) -> bool {
        self.scriptable_helper().set_property(id, value)
    }

    /// Read a property, method, constant or dynamic property by name.
    fn get_property_by_name(&self, name: &str) -> Option<Variant> {
        let info = self.property_info(name)?;
        match info.id {
            PropertyId::Constant | PropertyId::Dynamic => Some(info.prototype),
            _ if info.is_method => Some(info.prototype),
            id => Some(self.get_property(id)),
        }
    }

    /// Write a property by name, routing dynamic names to their handler.
    fn set_property_by_name(&self, name: &str, value: Variant) -> bool {
        let helper = self.scriptable_helper();
        match self.property_info(name) {
            Some(PropertyInfo {
                id: PropertyId::Dynamic,
                ..
            }) => helper.set_dynamic_property(name, value),
            Some(PropertyInfo {
                id: PropertyId::Constant,
                ..
            }) => {
                tracing::warn!(target: targets::PROPERTY, name, "cannot assign to a constant");
                false
            }
            Some(info) => self.set_property(info.id, value),
            None => helper.set_dynamic_property(name, value),
        }
    }

    /// Read an integer-indexed element through the array handler.
    fn get_property_by_index(&self, index: i64) -> Option<Variant> {
        self.scriptable_helper().get_indexed(index)
    }

    /// Write an integer-indexed element through the array handler.
    fn set_property_by_index(&self, index: i64, value: Variant) -> bool {
        self.scriptable_helper().set_indexed(index, value)
    }

    /// Call `visit` with every statically registered name of this object
    /// and its prototype chain. Stops and returns `false` when `visit`
    /// returns `false`.
    fn enumerate_properties(&self, visit: &mut dyn FnMut(&str, &PropertyInfo) -> bool) -> bool {
        let mut seen = HashSet::new();
        self.scriptable_helper().enumerate(0, &mut seen, visit)
    }
}

impl dyn Scriptable {
    /// Downcast to a concrete scriptable type.
    pub fn downcast_ref<T: Scriptable>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for dyn Scriptable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scriptable")
            .field("class_id", &format_args!("{:#x}", self.class_id()))
            .field("ownership", &self.ownership_policy())
            .finish()
    }
}

/// Storage for one named member.
#[derive(Clone)]
enum Entry {
    Property {
        getter: Option<CallableRef>,
        setter: Option<CallableRef>,
        prototype: Variant,
    },
    Method(CallableRef),
    Constant(Variant),
    Signal(Arc<SignalEntry>),
}

impl Entry {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Property { .. } => "property",
            Self::Method(_) => "method",
            Self::Constant(_) => "constant",
            Self::Signal(_) => "signal",
        }
    }
}

struct SignalEntry {
    signal: Arc<Signal>,
    handler: Mutex<Option<ConnectionId>>,
}

impl SignalEntry {
    fn current_handler(&self) -> Variant {
        let handler = *self.handler.lock();
        Variant::Callable(handler.and_then(|id| self.signal.slot(id)))
    }

    fn replace_handler(&self, handler: Option<CallableRef>) -> bool {
        let mut current = self.handler.lock();
        if let Some(old) = current.take() {
            self.signal.disconnect(old);
        }
        match handler {
            Some(slot) => match self.signal.connect(slot) {
                Some(id) => {
                    *current = Some(id);
                    true
                }
                None => false,
            },
            None => true,
        }
    }
}

#[derive(Default)]
struct Registry {
    entries: Vec<(String, Entry)>,
    by_name: HashMap<String, u32>,
}

impl Registry {
    fn insert(&mut self, name: &str, entry: Entry) {
        if let Some(&index) = self.by_name.get(name) {
            tracing::debug!(
                target: targets::SCRIPTABLE,
                name,
                previous = self.entries[index as usize].1.kind_name(),
                "overwriting registered member"
            );
            self.entries[index as usize].1 = entry;
            return;
        }
        let index = self.entries.len() as u32;
        self.entries.push((name.to_string(), entry));
        self.by_name.insert(name.to_string(), index);
    }

    fn get(&self, index: u32) -> Option<(&str, &Entry)> {
        self.entries
            .get(index as usize)
            .map(|(name, entry)| (name.as_str(), entry))
    }
}

/// Getter and setter pair serving names or indices outside the static
/// registry.
#[derive(Clone)]
struct DynamicHandler {
    getter: CallableRef,
    setter: Option<CallableRef>,
}

/// Member registry, prototype link and ownership state of a scriptable
/// object.
///
/// Registration takes `&self` so members can be registered after the
/// object has been placed behind an `Arc`. Callables are cloned out of the
/// registry before they run, so getters and setters may re-enter the
/// object.
pub struct ScriptableHelper {
    registry: RwLock<Registry>,
    prototype: RwLock<Option<Weak<dyn Scriptable>>>,
    array_handler: RwLock<Option<DynamicHandler>>,
    dynamic_handler: RwLock<Option<DynamicHandler>>,
    ownership: Mutex<OwnershipPolicy>,
    ref_count: AtomicUsize,
    on_reference_change: Signal,
}

impl Default for ScriptableHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptableHelper {
    /// Create a helper for a natively owned object.
    pub fn new() -> Self {
        Self::with_ownership(OwnershipPolicy::NativeOwned)
    }

    /// Create a helper with the given ownership policy.
    pub fn with_ownership(ownership: OwnershipPolicy) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            prototype: RwLock::new(None),
            array_handler: RwLock::new(None),
            dynamic_handler: RwLock::new(None),
            ownership: Mutex::new(ownership),
            ref_count: AtomicUsize::new(0),
            on_reference_change: Signal::with_signature(
                VariantType::Void,
                vec![VariantType::Int64, VariantType::Int64],
            ),
        }
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Register a property. A missing setter makes it read only, a missing
    /// getter write only.
    ///
    /// Registering an existing name replaces the member and keeps its id.
    ///
    /// # Panics
    ///
    /// Panics if both `getter` and `setter` are `None`, or if a setter with
    /// metadata does not take exactly one argument.
    pub fn register_property(
        &self,
        name: &str,
        getter: Option<CallableRef>,
        setter: Option<CallableRef>,
    ) {
        assert!(
            getter.is_some() || setter.is_some(),
            "a property needs a getter or a setter"
        );
        if let Some(setter) = setter.as_ref().filter(|s| s.has_metadata()) {
            assert_eq!(setter.arg_count(), 1, "a property setter takes one argument");
        }
        let kind = match (&getter, &setter) {
            (Some(getter), _) if getter.has_metadata() => getter.return_type(),
            (_, Some(setter)) if setter.has_metadata() => setter.arg_types()[0],
            _ => VariantType::Any,
        };
        self.registry.write().insert(
            name,
            Entry::Property {
                getter,
                setter,
                prototype: Variant::prototype_of(kind),
            },
        );
    }

    /// Register a read/write property backed by `property`.
    pub fn register_simple_property<T>(&self, name: &str, property: &Arc<Property<T>>)
    where
        T: FromVariant + IntoVariant + Clone + PartialEq + Send + Sync + 'static,
    {
        self.register_property(
            name,
            Some(property_getter_slot(property)),
            Some(property_setter_slot(property)),
        );
    }

    /// Register a read-only property backed by `property`.
    pub fn register_readonly_simple_property<T>(&self, name: &str, property: &Arc<Property<T>>)
    where
        T: IntoVariant + Clone + Send + Sync + 'static,
    {
        self.register_property(name, Some(property_getter_slot(property)), None);
    }

    /// Register a method.
    pub fn register_method(&self, name: &str, method: CallableRef) {
        self.registry.write().insert(name, Entry::Method(method));
    }

    /// Register a constant.
    pub fn register_constant(&self, name: &str, value: impl IntoVariant) {
        self.registry
            .write()
            .insert(name, Entry::Constant(value.into_variant()));
    }

    /// Register a signal. Its script-visible value is the handler assigned
    /// through this name.
    pub fn register_signal(&self, name: &str, signal: &Arc<Signal>) {
        self.registry.write().insert(
            name,
            Entry::Signal(Arc::new(SignalEntry {
                signal: Arc::clone(signal),
                handler: Mutex::new(None),
            })),
        );
    }

    /// Set the object that failed lookups delegate to.
    pub fn set_prototype(&self, prototype: Option<&ScriptableRef>) {
        *self.prototype.write() = prototype.map(Arc::downgrade);
    }

    /// The prototype object, if set and still alive.
    pub fn prototype(&self) -> Option<ScriptableRef> {
        self.prototype.read().as_ref().and_then(Weak::upgrade)
    }

    /// Serve integer-indexed access.
    ///
    /// `getter` takes an `INT64` index and returns `Void` for indices out of
    /// range; `setter` takes the index and a value and returns a `BOOL`.
    pub fn set_array_handler(&self, getter: CallableRef, setter: Option<CallableRef>) {
        *self.array_handler.write() = Some(DynamicHandler { getter, setter });
    }

    /// Serve names missing from the static registry.
    ///
    /// `getter` takes the name and returns `Void` for unknown names;
    /// `setter` takes the name and a value and returns a `BOOL`.
    pub fn set_dynamic_property_handler(&self, getter: CallableRef, setter: Option<CallableRef>) {
        *self.dynamic_handler.write() = Some(DynamicHandler { getter, setter });
    }

    // -------------------------------------------------------------------------
    // Lookup and access
    // -------------------------------------------------------------------------

    /// Resolve `name` through the registry, the dynamic handler and the
    /// prototype, in that order.
    pub fn property_info(&self, name: &str) -> Option<PropertyInfo> {
        if let Some(info) = self.static_info(name) {
            return Some(info);
        }
        if let Some(value) = self.get_dynamic(name) {
            return Some(PropertyInfo {
                id: PropertyId::Dynamic,
                prototype: value,
                is_method: false,
            });
        }
        let prototype = self.prototype()?;
        let mut info = prototype.property_info(name)?;
        if let PropertyId::Registered { index, depth } = info.id {
            info.id = PropertyId::Registered {
                index,
                depth: depth.saturating_add(1),
            };
        }
        Some(info)
    }

    fn static_info(&self, name: &str) -> Option<PropertyInfo> {
        let registry = self.registry.read();
        let index = *registry.by_name.get(name)?;
        let (_, entry) = registry.get(index)?;
        let registered = PropertyId::Registered { index, depth: 0 };
        let info = match entry {
            Entry::Property { prototype, .. } => PropertyInfo {
                id: registered,
                prototype: prototype.clone(),
                is_method: false,
            },
            Entry::Method(method) => PropertyInfo {
                id: registered,
                prototype: Variant::Callable(Some(Arc::clone(method))),
                is_method: true,
            },
            Entry::Constant(value) => PropertyInfo {
                id: PropertyId::Constant,
                prototype: value.clone(),
                is_method: false,
            },
            Entry::Signal(_) => PropertyInfo {
                id: registered,
                prototype: Variant::Callable(None),
                is_method: false,
            },
        };
        Some(info)
    }

    /// Read a property by id, logging failures.
    pub fn get_property(&self, id: PropertyId) -> Variant {
        self.try_get_property(id).unwrap_or_else(|err| {
            tracing::warn!(target: targets::PROPERTY, %err, "property read failed");
            Variant::Void
        })
    }

    /// Read a property by id.
    pub fn try_get_property(&self, id: PropertyId) -> PropertyResult<Variant> {
        let (index, depth) = match id {
            PropertyId::Registered { index, depth } => (index, depth),
            PropertyId::Constant => return Err(not_accessible(id, "constant")),
            PropertyId::Dynamic => return Err(not_accessible(id, "dynamic property")),
        };
        if depth > 0 {
            let prototype = self.prototype().ok_or_else(|| not_found(id))?;
            return prototype
                .scriptable_helper()
                .try_get_property(PropertyId::Registered {
                    index,
                    depth: depth - 1,
                });
        }

        let (name, entry) = self.entry(index).ok_or_else(|| not_found(id))?;
        match entry {
            Entry::Property {
                getter: Some(getter),
                ..
            } => Ok(getter.invoke(&[])?),
            Entry::Property { getter: None, .. } => Err(PropertyError::WriteOnly { name }),
            Entry::Signal(signal) => Ok(signal.current_handler()),
            other => Err(PropertyError::NotAccessible {
                name,
                kind: other.kind_name(),
            }),
        }
    }

    /// Write a property by id, logging failures.
    pub fn set_property(&self, id: PropertyId, value: Variant) -> bool {
        match self.try_set_property(id, value) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(target: targets::PROPERTY, %err, "property write failed");
                false
            }
        }
    }

    /// Write a property by id.
    ///
    /// The value is converted to the declared kind first; an unconvertible
    /// value is rejected and the property keeps its value.
    pub fn try_set_property(&self, id: PropertyId, value: Variant) -> PropertyResult<()> {
        let (index, depth) = match id {
            PropertyId::Registered { index, depth } => (index, depth),
            PropertyId::Constant => return Err(not_accessible(id, "constant")),
            PropertyId::Dynamic => return Err(not_accessible(id, "dynamic property")),
        };
        if depth > 0 {
            let prototype = self.prototype().ok_or_else(|| not_found(id))?;
            let forwarded = PropertyId::Registered {
                index,
                depth: depth - 1,
            };
            return prototype
                .scriptable_helper()
                .try_set_property(forwarded, value);
        }

        let (name, entry) = self.entry(index).ok_or_else(|| not_found(id))?;
        match entry {
            Entry::Property {
                setter: Some(setter),
                prototype,
                ..
            } => {
                let kind = if setter.has_metadata() {
                    setter.arg_types()[0]
                } else {
                    prototype.variant_type()
                };
                let converted = value.convert_to(kind).ok_or(PropertyError::TypeMismatch {
                    name,
                    expected: kind,
                    got: value.variant_type(),
                })?;
                setter.invoke(&[converted])?;
                Ok(())
            }
            Entry::Property { setter: None, .. } => Err(PropertyError::ReadOnly { name }),
            Entry::Signal(signal) => match value {
                Variant::Void | Variant::Callable(None) => {
                    signal.replace_handler(None);
                    Ok(())
                }
                Variant::Callable(Some(handler)) => {
                    if signal.replace_handler(Some(handler)) {
                        Ok(())
                    } else {
                        Err(PropertyError::TypeMismatch {
                            name,
                            expected: VariantType::Callable,
                            got: VariantType::Callable,
                        })
                    }
                }
                other => Err(PropertyError::TypeMismatch {
                    name,
                    expected: VariantType::Callable,
                    got: other.variant_type(),
                }),
            },
            other => Err(PropertyError::NotAccessible {
                name,
                kind: other.kind_name(),
            }),
        }
    }

    fn entry(&self, index: u32) -> Option<(String, Entry)> {
        self.registry
            .read()
            .get(index)
            .map(|(name, entry)| (name.to_string(), entry.clone()))
    }

    /// Read a dynamic property of this object (not its prototype).
    pub fn get_dynamic(&self, name: &str) -> Option<Variant> {
        let handler = self.dynamic_handler.read().clone()?;
        let value = handler.getter.call(&[Variant::from(name)]).into_inner();
        (!value.is_void()).then_some(value)
    }

    /// Write a dynamic property, falling back to the prototype when this
    /// object's handler does not know the name.
    pub fn set_dynamic_property(&self, name: &str, value: Variant) -> bool {
        let handler = self.dynamic_handler.read().clone();
        if let Some(DynamicHandler {
            setter: Some(setter),
            ..
        }) = handler
        {
            let accepted = setter
                .call(&[Variant::from(name), value.clone()])
                .v()
                .to_bool()
                .unwrap_or(false);
            if accepted {
                return true;
            }
        }
        if self.get_dynamic(name).is_none() {
            if let Some(prototype) = self.prototype() {
                return prototype.set_property_by_name(name, value);
            }
        }
        tracing::warn!(target: targets::PROPERTY, name, "no writable property with this name");
        false
    }

    /// Read through the array handler.
    pub fn get_indexed(&self, index: i64) -> Option<Variant> {
        let handler = self.array_handler.read().clone()?;
        let value = handler.getter.call(&[Variant::Int64(index)]).into_inner();
        (!value.is_void()).then_some(value)
    }

    /// Write through the array handler.
    pub fn set_indexed(&self, index: i64, value: Variant) -> bool {
        let setter = self
            .array_handler
            .read()
            .as_ref()
            .and_then(|handler| handler.setter.clone());
        match setter {
            Some(setter) => setter
                .call(&[Variant::Int64(index), value])
                .v()
                .to_bool()
                .unwrap_or(false),
            None => false,
        }
    }

    fn enumerate(
        &self,
        depth: u8,
        seen: &mut HashSet<String>,
        visit: &mut dyn FnMut(&str, &PropertyInfo) -> bool,
    ) -> bool {
        let names: Vec<String> = self
            .registry
            .read()
            .entries
            .iter()
            .map(|(name, _)| name.clone())
            .collect();
        for name in names {
            if !seen.insert(name.clone()) {
                continue;
            }
            let Some(mut info) = self.static_info(&name) else {
                continue;
            };
            if let PropertyId::Registered { index, .. } = info.id {
                info.id = PropertyId::Registered { index, depth };
            }
            if !visit(&name, &info) {
                return false;
            }
        }
        match self.prototype() {
            Some(prototype) => {
                prototype
                    .scriptable_helper()
                    .enumerate(depth.saturating_add(1), seen, visit)
            }
            None => true,
        }
    }

    // -------------------------------------------------------------------------
    // Ownership
    // -------------------------------------------------------------------------

    /// The current ownership policy.
    pub fn ownership_policy(&self) -> OwnershipPolicy {
        *self.ownership.lock()
    }

    /// The number of script references.
    pub fn ref_count(&self) -> usize {
        self.ref_count.load(Ordering::SeqCst)
    }

    /// Emitted with `(ref_count, change)` before every count change.
    pub fn on_reference_change(&self) -> &Signal {
        &self.on_reference_change
    }

    /// Record a script reference.
    ///
    /// A native owned object keeps its policy and count. A transferable
    /// object becomes script owned on its first reference.
    pub fn attach(&self) -> OwnershipPolicy {
        let policy = {
            let mut ownership = self.ownership.lock();
            if *ownership == OwnershipPolicy::NativeTransferable {
                *ownership = OwnershipPolicy::ScriptOwned;
            }
            *ownership
        };
        if policy == OwnershipPolicy::NativeOwned {
            return policy;
        }
        let count = self.ref_count.load(Ordering::SeqCst);
        self.on_reference_change
            .emit(&[Variant::from(count), Variant::Int64(1)]);
        self.ref_count.fetch_add(1, Ordering::SeqCst);
        policy
    }

    /// Drop a script reference.
    ///
    /// Returns `true` when a script owned object lost its last reference
    /// and `transient` is `false`. A transient detach hands the reference
    /// on without releasing the object.
    pub fn detach(&self, transient: bool) -> bool {
        if self.ownership_policy() == OwnershipPolicy::NativeOwned {
            return false;
        }
        let count = self.ref_count.load(Ordering::SeqCst);
        if count == 0 {
            tracing::warn!(target: targets::SCRIPTABLE, "detach without a matching attach");
            return false;
        }
        self.on_reference_change
            .emit(&[Variant::from(count), Variant::Int64(-1)]);
        let remaining = self.ref_count.fetch_sub(1, Ordering::SeqCst) - 1;
        let released = remaining == 0 && !transient;
        if released {
            tracing::trace!(target: targets::SCRIPTABLE, "last script reference released");
        }
        released
    }
}

fn not_found(id: PropertyId) -> PropertyError {
    PropertyError::NotFound {
        name: format!("{id:?}"),
    }
}

fn not_accessible(id: PropertyId, kind: &'static str) -> PropertyError {
    PropertyError::NotAccessible {
        name: format!("{id:?}"),
        kind,
    }
}
