//! Realm: the heap plus the host operations that run against it.
//!
//! The realm plays the interpreter's role for the object model: `[[Get]]`
//! invokes accessors with the receiver, `[[Set]]` dispatches to setters or
//! writes data slots, and `[[Call]]`/`[[Construct]]` run native function
//! bodies.  Facades need nothing beyond these operations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capability_probe::PrototypeToolkit;
use crate::config::{AssignmentMode, EngineConfig};
use crate::error::ProxyError;
use crate::event::FacadeEvent;
use crate::facade::FacadeKind;
use crate::function::{ConstructBehavior, FunctionObject};
use crate::object_model::{JsValue, ObjectHandle, ObjectHeap, PropertyDescriptor, PropertyKey};

/// Well-known objects every realm starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub object_prototype: ObjectHandle,
    pub function_prototype: ObjectHandle,
    pub array_prototype: ObjectHandle,
    /// `this` for plain calls made without a receiver.
    pub global: ObjectHandle,
}

/// Bookkeeping for a facade created in this realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacadeInfo {
    pub id: u64,
    pub kind: FacadeKind,
}

#[derive(Debug)]
pub struct Realm {
    heap: ObjectHeap,
    intrinsics: Intrinsics,
    prototypes: PrototypeToolkit,
    config: EngineConfig,
    proxy_constructor: Option<ObjectHandle>,
    facades: BTreeMap<ObjectHandle, FacadeInfo>,
    next_facade_id: u64,
    events: Vec<FacadeEvent>,
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

impl Realm {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let mut heap = ObjectHeap::new();
        let object_prototype = heap.alloc(None);
        let function_prototype = heap.alloc(Some(object_prototype));
        let array_prototype = heap.alloc(Some(object_prototype));
        let global = heap.alloc(Some(object_prototype));
        Self {
            heap,
            intrinsics: Intrinsics {
                object_prototype,
                function_prototype,
                array_prototype,
                global,
            },
            prototypes: PrototypeToolkit::probe(&config.environment),
            config,
            proxy_constructor: None,
            facades: BTreeMap::new(),
            next_facade_id: 0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut ObjectHeap {
        &mut self.heap
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    pub fn prototypes(&self) -> &PrototypeToolkit {
        &self.prototypes
    }

    pub fn global(&self) -> JsValue {
        JsValue::Object(self.intrinsics.global)
    }

    // -- Allocation ---------------------------------------------------------

    /// `{}`.
    pub fn new_object(&mut self) -> ObjectHandle {
        self.heap.alloc(Some(self.intrinsics.object_prototype))
    }

    /// Object literal with enumerable, writable data properties.
    pub fn object_from_entries<'a>(
        &mut self,
        entries: impl IntoIterator<Item = (&'a str, JsValue)>,
    ) -> Result<ObjectHandle, ProxyError> {
        let obj = self.new_object();
        for (key, value) in entries {
            self.heap
                .define_property(obj, PropertyKey::from(key), PropertyDescriptor::data(value))?;
        }
        Ok(obj)
    }

    /// Array literal.
    pub fn new_array(&mut self, items: Vec<JsValue>) -> Result<ObjectHandle, ProxyError> {
        let arr = self.heap.alloc_array(Some(self.intrinsics.array_prototype));
        for (i, item) in (0u32..).zip(items) {
            self.heap
                .define_property(arr, PropertyKey::from(i), PropertyDescriptor::data(item))?;
        }
        Ok(arr)
    }

    /// Read `0..length` from an array-like value through `[[Get]]`.
    pub fn array_elements(&mut self, value: &JsValue) -> Result<Vec<JsValue>, ProxyError> {
        if value.is_nullish() {
            return Ok(Vec::new());
        }
        let len = self.get(value, "length")?.as_int().unwrap_or(0).max(0);
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        (0..len).map(|i| self.get(value, i)).collect()
    }

    /// Install a native function with its `name` and, for ordinary
    /// constructors, a fresh `prototype` object.
    pub fn alloc_function(&mut self, function: FunctionObject) -> Result<ObjectHandle, ProxyError> {
        let name = JsValue::Str(function.name.clone());
        let ordinary = matches!(function.construct, ConstructBehavior::Ordinary);
        let f = self
            .heap
            .alloc_function(Some(self.intrinsics.function_prototype), function);
        self.heap.define_property(
            f,
            PropertyKey::from("name"),
            PropertyDescriptor::Data {
                value: name,
                writable: false,
                enumerable: false,
                configurable: true,
            },
        )?;
        if ordinary {
            let proto = self.new_object();
            self.heap.define_property(
                proto,
                PropertyKey::from("constructor"),
                PropertyDescriptor::hidden(JsValue::Object(f)),
            )?;
            self.heap.define_property(
                f,
                PropertyKey::from("prototype"),
                PropertyDescriptor::Data {
                    value: JsValue::Object(proto),
                    writable: true,
                    enumerable: false,
                    configurable: false,
                },
            )?;
        }
        Ok(f)
    }

    /// A plain (non-constructible) native function.
    pub fn new_function(
        &mut self,
        name: &str,
        body: impl Fn(&mut Realm, &JsValue, &[JsValue]) -> Result<JsValue, ProxyError> + 'static,
    ) -> Result<ObjectHandle, ProxyError> {
        self.alloc_function(FunctionObject::new(
            name,
            body,
            ConstructBehavior::NotConstructor,
        ))
    }

    /// A native function usable with both call and construct.
    pub fn new_constructor(
        &mut self,
        name: &str,
        body: impl Fn(&mut Realm, &JsValue, &[JsValue]) -> Result<JsValue, ProxyError> + 'static,
    ) -> Result<ObjectHandle, ProxyError> {
        self.alloc_function(FunctionObject::new(name, body, ConstructBehavior::Ordinary))
    }

    // -- Host operations ----------------------------------------------------

    /// `[[Get]]`, invoking getters with `target` as receiver.
    pub fn get(&mut self, target: &JsValue, key: impl Into<PropertyKey>) -> Result<JsValue, ProxyError> {
        let key = key.into();
        let handle = match target {
            JsValue::Object(h) => *h,
            v if v.is_nullish() => {
                return Err(ProxyError::NullishBase {
                    value: v.to_string(),
                    key: key.to_string(),
                });
            }
            _ => return Ok(JsValue::Undefined),
        };
        match self.heap.find_property(handle, &key)? {
            None => Ok(JsValue::Undefined),
            Some((_, PropertyDescriptor::Data { value, .. })) => Ok(value),
            Some((_, PropertyDescriptor::Accessor { get, .. })) => match get {
                Some(getter) => self.call(&JsValue::Object(getter), target, &[]),
                None => Ok(JsValue::Undefined),
            },
        }
    }

    /// `[[Set]]`: `Ok(false)` when the write had no effect.
    pub fn set(
        &mut self,
        target: &JsValue,
        key: impl Into<PropertyKey>,
        value: JsValue,
    ) -> Result<bool, ProxyError> {
        let key = key.into();
        let handle = match target {
            JsValue::Object(h) => *h,
            v if v.is_nullish() => {
                return Err(ProxyError::NullishBase {
                    value: v.to_string(),
                    key: key.to_string(),
                });
            }
            _ => return Ok(false),
        };
        match self.heap.find_property(handle, &key)? {
            Some((_, PropertyDescriptor::Accessor { set, .. })) => match set {
                Some(setter) => {
                    self.call(&JsValue::Object(setter), target, &[value])?;
                    Ok(true)
                }
                None => Ok(false),
            },
            Some((_, desc)) if !desc.is_writable() => Ok(false),
            Some((owner, _)) if owner == handle => Ok(self.heap.write_data(handle, &key, value)?),
            _ => Ok(self
                .heap
                .define_property(handle, key, PropertyDescriptor::data(value))?),
        }
    }

    /// Assignment expression semantics: `[[Set]]` plus the configured
    /// reaction to a write that had no effect.
    pub fn assign(
        &mut self,
        target: &JsValue,
        key: impl Into<PropertyKey>,
        value: JsValue,
    ) -> Result<(), ProxyError> {
        let key = key.into();
        let done = self.set(target, &key, value)?;
        if !done && self.config.assignment_mode == AssignmentMode::Strict {
            return Err(ProxyError::AssignmentRejected {
                key: key.to_string(),
                target: target.to_string(),
            });
        }
        Ok(())
    }

    /// `[[Call]]`.
    pub fn call(
        &mut self,
        callee: &JsValue,
        this: &JsValue,
        args: &[JsValue],
    ) -> Result<JsValue, ProxyError> {
        let body = callee
            .as_object()
            .and_then(|h| self.heap.function(h))
            .map(|f| f.call.clone())
            .ok_or_else(|| ProxyError::NotAFunction {
                value: callee.to_string(),
            })?;
        body(self, this, args)
    }

    /// `[[Construct]]`.
    pub fn construct(&mut self, callee: &JsValue, args: &[JsValue]) -> Result<JsValue, ProxyError> {
        let not_a_constructor = || ProxyError::NotAConstructor {
            value: callee.to_string(),
        };
        let behavior = callee
            .as_object()
            .and_then(|h| self.heap.function(h))
            .map(|f| f.construct.clone())
            .ok_or_else(not_a_constructor)?;
        match behavior {
            ConstructBehavior::NotConstructor => Err(not_a_constructor()),
            ConstructBehavior::Native(body) => body(self, args),
            ConstructBehavior::Ordinary => {
                let proto = match self.get(callee, "prototype")? {
                    JsValue::Object(p) => p,
                    _ => self.intrinsics.object_prototype,
                };
                let instance = JsValue::Object(self.heap.alloc(Some(proto)));
                let result = self.call(callee, &instance, args)?;
                Ok(if result.is_object() { result } else { instance })
            }
        }
    }

    pub fn is_callable(&self, value: &JsValue) -> bool {
        value.as_object().is_some_and(|h| self.heap.is_callable(h))
    }

    pub fn is_constructor(&self, value: &JsValue) -> bool {
        value.as_object().is_some_and(|h| self.heap.is_constructor(h))
    }

    pub fn is_array(&self, value: &JsValue) -> bool {
        value.as_object().is_some_and(|h| self.heap.is_array(h))
    }

    /// `Object.keys`.
    pub fn own_keys(&self, value: &JsValue) -> Result<Vec<PropertyKey>, ProxyError> {
        match value.as_object() {
            Some(h) => Ok(self.heap.keys(h)?),
            None => Ok(Vec::new()),
        }
    }

    /// `Object.getOwnPropertyNames`.
    pub fn own_property_names(&self, value: &JsValue) -> Result<Vec<PropertyKey>, ProxyError> {
        match value.as_object() {
            Some(h) => Ok(self.heap.get_own_property_names(h)?),
            None => Ok(Vec::new()),
        }
    }

    /// `key in value`.
    pub fn has_property(&self, value: &JsValue, key: impl Into<PropertyKey>) -> Result<bool, ProxyError> {
        match value.as_object() {
            Some(h) => Ok(self.heap.has_property(h, &key.into())?),
            None => Ok(false),
        }
    }

    /// Native prototype read, independent of the probed toolkit.
    pub fn get_prototype_of(&self, value: &JsValue) -> Result<Option<ObjectHandle>, ProxyError> {
        match value.as_object() {
            Some(h) => Ok(self.heap.get_prototype_of(h)?),
            None => Ok(None),
        }
    }

    /// `Object.seal`; primitives pass through untouched.
    pub fn seal(&mut self, value: &JsValue) -> Result<(), ProxyError> {
        if let Some(h) = value.as_object() {
            self.heap.seal(h)?;
        }
        Ok(())
    }

    /// `Object.isSealed`; primitives count as sealed.
    pub fn is_sealed(&self, value: &JsValue) -> Result<bool, ProxyError> {
        match value.as_object() {
            Some(h) => Ok(self.heap.is_sealed(h)?),
            None => Ok(true),
        }
    }

    pub fn is_extensible(&self, value: &JsValue) -> Result<bool, ProxyError> {
        match value.as_object() {
            Some(h) => Ok(self.heap.is_extensible(h)?),
            None => Ok(false),
        }
    }

    // -- Facade bookkeeping -------------------------------------------------

    pub(crate) fn reserve_facade_id(&mut self) -> u64 {
        let id = self.next_facade_id;
        self.next_facade_id += 1;
        id
    }

    pub(crate) fn register_facade(&mut self, handle: ObjectHandle, info: FacadeInfo) {
        self.facades.insert(handle, info);
    }

    /// Kind of facade `value` is, or `None` for ordinary values.
    pub fn facade_kind(&self, value: &JsValue) -> Option<FacadeKind> {
        self.facade_info(value).map(|info| info.kind)
    }

    pub fn facade_info(&self, value: &JsValue) -> Option<FacadeInfo> {
        value.as_object().and_then(|h| self.facades.get(&h).copied())
    }

    pub(crate) fn cached_proxy_constructor(&self) -> Option<ObjectHandle> {
        self.proxy_constructor
    }

    pub(crate) fn cache_proxy_constructor(&mut self, handle: ObjectHandle) {
        self.proxy_constructor = Some(handle);
    }

    // -- Audit log ----------------------------------------------------------

    pub(crate) fn record_event(&mut self, event: FacadeEvent) {
        if self.config.audit_enabled {
            self.events.push(event);
        }
    }

    pub(crate) fn trace_id(&self) -> &str {
        &self.config.trace_id
    }

    pub fn events(&self) -> &[FacadeEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<FacadeEvent> {
        std::mem::take(&mut self.events)
    }
}
