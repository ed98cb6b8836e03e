//! Host object model: property descriptors, prototype chains, and sealing.
//!
//! This is the substrate that facades are built from.  It offers exactly the
//! primitives an ES5-era host exposes:
//!
//! - **Property descriptors**: data vs accessor, configurable/enumerable/writable
//! - **Prototype chains**: `[[Prototype]]` internal slot with bounded traversal
//! - **Object integrity**: seal and extensibility
//! - **Enumeration**: own names, own enumerable keys, `for...in` order
//!
//! Facades themselves are ordinary objects whose own properties are accessor
//! pairs; there is no exotic proxy object in the heap.
//!
//! `BTreeMap`/`BTreeSet` for deterministic ordering.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::function::FunctionObject;

// ---------------------------------------------------------------------------
// PropertyKey
// ---------------------------------------------------------------------------

/// A string property key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyKey(String);

impl PropertyKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical array index (`"0"`, `"17"`, never `"01"`).
    pub fn array_index(&self) -> Option<u32> {
        let s = self.0.as_str();
        if s.is_empty() || (s.len() > 1 && s.starts_with('0')) {
            return None;
        }
        s.parse::<u32>().ok().filter(|n| *n != u32::MAX)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&String> for PropertyKey {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

impl From<&PropertyKey> for PropertyKey {
    fn from(k: &PropertyKey) -> Self {
        k.clone()
    }
}

impl From<u32> for PropertyKey {
    fn from(n: u32) -> Self {
        Self(n.to_string())
    }
}

// ---------------------------------------------------------------------------
// ObjectHandle
// ---------------------------------------------------------------------------

/// Opaque handle referencing an object on the managed heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHandle(pub u32);

// ---------------------------------------------------------------------------
// JsValue
// ---------------------------------------------------------------------------

/// Runtime value.  Functions are objects; callability lives on the heap.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JsValue {
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Object(ObjectHandle),
}

impl JsValue {
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            Self::Object(h) => Some(*h),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// ToBoolean.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Str(s) => !s.is_empty(),
            Self::Object(_) => true,
        }
    }

    /// SameValue comparison.
    pub fn same_value(&self, other: &Self) -> bool {
        self == other
    }
}

impl From<i64> for JsValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<ObjectHandle> for JsValue {
    fn from(h: ObjectHandle) -> Self {
        Self::Object(h)
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Object(h) => write!(f, "[object#{}]", h.0),
        }
    }
}

// ---------------------------------------------------------------------------
// PropertyDescriptor
// ---------------------------------------------------------------------------

/// Property descriptor.  Accessor halves reference function objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyDescriptor {
    /// Data descriptor: has `value` and `writable`.
    Data {
        value: JsValue,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    /// Accessor descriptor: has `get` and/or `set`.
    Accessor {
        get: Option<ObjectHandle>,
        set: Option<ObjectHandle>,
        enumerable: bool,
        configurable: bool,
    },
}

impl PropertyDescriptor {
    /// Create a default data descriptor (writable, enumerable, configurable).
    pub fn data(value: JsValue) -> Self {
        Self::Data {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Writable, non-enumerable, configurable: the shape of built-in slots.
    pub fn hidden(value: JsValue) -> Self {
        Self::Data {
            value,
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    pub fn is_configurable(&self) -> bool {
        match self {
            Self::Data { configurable, .. } | Self::Accessor { configurable, .. } => *configurable,
        }
    }

    pub fn is_enumerable(&self) -> bool {
        match self {
            Self::Data { enumerable, .. } | Self::Accessor { enumerable, .. } => *enumerable,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data { .. })
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self, Self::Accessor { .. })
    }

    /// Get the value if this is a data descriptor.
    pub fn value(&self) -> Option<&JsValue> {
        match self {
            Self::Data { value, .. } => Some(value),
            Self::Accessor { .. } => None,
        }
    }

    /// Is this a data descriptor with writable=true?
    pub fn is_writable(&self) -> bool {
        match self {
            Self::Data { writable, .. } => *writable,
            Self::Accessor { .. } => false,
        }
    }

    pub fn getter(&self) -> Option<ObjectHandle> {
        match self {
            Self::Accessor { get, .. } => *get,
            Self::Data { .. } => None,
        }
    }

    pub fn setter(&self) -> Option<ObjectHandle> {
        match self {
            Self::Accessor { set, .. } => *set,
            Self::Data { .. } => None,
        }
    }

    pub fn set_non_configurable(&mut self) {
        match self {
            Self::Data { configurable, .. } | Self::Accessor { configurable, .. } => {
                *configurable = false;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ObjectError
// ---------------------------------------------------------------------------

/// Errors from object model operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectError {
    /// Object not found in the heap.
    ObjectNotFound(ObjectHandle),
    /// Prototype chain cycle detected.
    PrototypeCycleDetected,
    /// Maximum prototype chain depth exceeded.
    PrototypeChainTooDeep { depth: u32, max: u32 },
    /// `[[DefineOwnProperty]]` returned false.
    DefineRejected { key: PropertyKey },
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectNotFound(h) => write!(f, "object#{} not found", h.0),
            Self::PrototypeCycleDetected => write!(f, "TypeError: prototype chain cycle detected"),
            Self::PrototypeChainTooDeep { depth, max } => {
                write!(
                    f,
                    "TypeError: prototype chain depth {depth} exceeds max {max}"
                )
            }
            Self::DefineRejected { key } => write!(f, "TypeError: Cannot define property: {key}"),
        }
    }
}

impl std::error::Error for ObjectError {}

// ---------------------------------------------------------------------------
// OrdinaryObject
// ---------------------------------------------------------------------------

/// Maximum prototype chain depth to prevent runaway walks.
const MAX_PROTOTYPE_CHAIN_DEPTH: u32 = 1024;

/// Structural class of an object; fixed at allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    Object,
    Array,
    Function,
}

/// An ordinary object with internal slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdinaryObject {
    /// `[[Prototype]]` internal slot (None means end of chain).
    pub prototype: Option<ObjectHandle>,
    /// `[[Extensible]]` internal slot.
    pub extensible: bool,
    pub properties: BTreeMap<PropertyKey, PropertyDescriptor>,
    pub class: ObjectClass,
    /// Is this object callable (i.e. a function)?
    pub callable: bool,
    /// Is this object a constructor?
    pub constructable: bool,
}

impl Default for OrdinaryObject {
    fn default() -> Self {
        Self {
            prototype: None,
            extensible: true,
            properties: BTreeMap::new(),
            class: ObjectClass::Object,
            callable: false,
            constructable: false,
        }
    }
}

impl OrdinaryObject {
    pub fn with_prototype(proto: Option<ObjectHandle>) -> Self {
        Self {
            prototype: proto,
            ..Self::default()
        }
    }

    pub fn get_own_property(&self, key: &PropertyKey) -> Option<&PropertyDescriptor> {
        self.properties.get(key)
    }

    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.properties.contains_key(key)
    }

    /// `[[DefineOwnProperty]](P, Desc)`: define or update a property.
    ///
    /// Returns `false` if rejected (non-configurable conflict or a new key on a
    /// non-extensible object).
    pub fn define_own_property(&mut self, key: PropertyKey, desc: PropertyDescriptor) -> bool {
        if let Some(current) = self.properties.get(&key) {
            if !current.is_configurable() {
                if desc.is_configurable() {
                    return false;
                }
                if desc.is_enumerable() != current.is_enumerable() {
                    return false;
                }
                if current.is_data() != desc.is_data() {
                    return false;
                }
                if let (
                    PropertyDescriptor::Data {
                        writable: current_w,
                        value: current_v,
                        ..
                    },
                    PropertyDescriptor::Data {
                        writable: new_w,
                        value: new_v,
                        ..
                    },
                ) = (current, &desc)
                    && !current_w
                    && (*new_w || !current_v.same_value(new_v))
                {
                    return false;
                }
                if current.is_accessor()
                    && (current.getter() != desc.getter() || current.setter() != desc.setter())
                {
                    return false;
                }
            }
        } else if !self.extensible {
            return false;
        }

        let index = key.array_index();
        self.properties.insert(key, desc);
        if self.class == ObjectClass::Array
            && let Some(index) = index
        {
            self.grow_length(index);
        }
        true
    }

    /// Array `length` tracks the highest defined index.
    fn grow_length(&mut self, index: u32) {
        let wanted = i64::from(index) + 1;
        if let Some(PropertyDescriptor::Data {
            value, writable, ..
        }) = self.properties.get_mut(&PropertyKey::from("length"))
            && *writable
            && value.as_int().is_some_and(|n| n < wanted)
        {
            *value = JsValue::Int(wanted);
        }
    }

    /// `[[OwnPropertyKeys]]()`: integer indices (numeric order), then the
    /// remaining names.
    pub fn own_property_keys(&self) -> Vec<PropertyKey> {
        let mut int_keys: Vec<(u32, PropertyKey)> = Vec::new();
        let mut str_keys: Vec<PropertyKey> = Vec::new();

        for key in self.properties.keys() {
            match key.array_index() {
                Some(n) => int_keys.push((n, key.clone())),
                None => str_keys.push(key.clone()),
            }
        }

        int_keys.sort_by_key(|(n, _)| *n);
        let mut result: Vec<PropertyKey> = int_keys.into_iter().map(|(_, k)| k).collect();
        result.extend(str_keys);
        result
    }

    /// `Object.seal` semantics: own keys fixed, values stay writable.
    pub fn seal(&mut self) {
        self.extensible = false;
        for desc in self.properties.values_mut() {
            desc.set_non_configurable();
        }
    }

    pub fn is_sealed(&self) -> bool {
        !self.extensible && self.properties.values().all(|d| !d.is_configurable())
    }
}

// ---------------------------------------------------------------------------
// ObjectHeap
// ---------------------------------------------------------------------------

/// Arena of objects plus the native behavior of the callable ones.
#[derive(Debug, Default)]
pub struct ObjectHeap {
    objects: Vec<OrdinaryObject>,
    functions: BTreeMap<ObjectHandle, FunctionObject>,
}

impl ObjectHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new ordinary object with the given prototype.
    pub fn alloc(&mut self, proto: Option<ObjectHandle>) -> ObjectHandle {
        self.alloc_object(OrdinaryObject::with_prototype(proto))
    }

    /// Allocate an array with an own `length` of zero.
    pub fn alloc_array(&mut self, proto: Option<ObjectHandle>) -> ObjectHandle {
        let mut obj = OrdinaryObject::with_prototype(proto);
        obj.class = ObjectClass::Array;
        obj.properties.insert(
            PropertyKey::from("length"),
            PropertyDescriptor::Data {
                value: JsValue::Int(0),
                writable: true,
                enumerable: false,
                configurable: false,
            },
        );
        self.alloc_object(obj)
    }

    /// Allocate a function object backed by `function`.
    pub fn alloc_function(
        &mut self,
        proto: Option<ObjectHandle>,
        function: FunctionObject,
    ) -> ObjectHandle {
        let mut obj = OrdinaryObject::with_prototype(proto);
        obj.class = ObjectClass::Function;
        obj.callable = true;
        obj.constructable = function.is_constructor();
        let handle = self.alloc_object(obj);
        self.functions.insert(handle, function);
        handle
    }

    fn alloc_object(&mut self, obj: OrdinaryObject) -> ObjectHandle {
        let handle = ObjectHandle(self.objects.len() as u32);
        self.objects.push(obj);
        handle
    }

    pub fn get(&self, handle: ObjectHandle) -> Result<&OrdinaryObject, ObjectError> {
        self.objects
            .get(handle.0 as usize)
            .ok_or(ObjectError::ObjectNotFound(handle))
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Result<&mut OrdinaryObject, ObjectError> {
        self.objects
            .get_mut(handle.0 as usize)
            .ok_or(ObjectError::ObjectNotFound(handle))
    }

    /// Native behavior of a function object.
    pub fn function(&self, handle: ObjectHandle) -> Option<&FunctionObject> {
        self.functions.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn is_callable(&self, handle: ObjectHandle) -> bool {
        self.get(handle).is_ok_and(|o| o.callable)
    }

    pub fn is_constructor(&self, handle: ObjectHandle) -> bool {
        self.get(handle).is_ok_and(|o| o.constructable)
    }

    pub fn is_array(&self, handle: ObjectHandle) -> bool {
        self.get(handle).is_ok_and(|o| o.class == ObjectClass::Array)
    }

    /// Walk the prototype chain starting at `handle` (inclusive), bounded by
    /// depth and cycle detection.
    fn walk_chain<T>(
        &self,
        handle: ObjectHandle,
        mut visit: impl FnMut(ObjectHandle, &OrdinaryObject) -> Option<T>,
    ) -> Result<Option<T>, ObjectError> {
        let mut current = Some(handle);
        let mut depth: u32 = 0;
        let mut visited = BTreeSet::new();

        while let Some(h) = current {
            if depth > MAX_PROTOTYPE_CHAIN_DEPTH {
                return Err(ObjectError::PrototypeChainTooDeep {
                    depth,
                    max: MAX_PROTOTYPE_CHAIN_DEPTH,
                });
            }
            if !visited.insert(h) {
                return Err(ObjectError::PrototypeCycleDetected);
            }
            let obj = self.get(h)?;
            if let Some(found) = visit(h, obj) {
                return Ok(Some(found));
            }
            current = obj.prototype;
            depth += 1;
        }
        Ok(None)
    }

    /// Locate `key` along the chain: the owning object and its descriptor.
    pub fn find_property(
        &self,
        handle: ObjectHandle,
        key: &PropertyKey,
    ) -> Result<Option<(ObjectHandle, PropertyDescriptor)>, ObjectError> {
        self.walk_chain(handle, |h, o| o.get_own_property(key).map(|d| (h, d.clone())))
    }

    /// `[[HasProperty]](O, P)`: walks the prototype chain.
    pub fn has_property(&self, handle: ObjectHandle, key: &PropertyKey) -> Result<bool, ObjectError> {
        Ok(self.find_property(handle, key)?.is_some())
    }

    pub fn has_own(&self, handle: ObjectHandle, key: &PropertyKey) -> Result<bool, ObjectError> {
        Ok(self.get(handle)?.has_own_property(key))
    }

    /// Is `ancestor` on the prototype chain of `handle` (excluding itself)?
    pub fn inherits_from(
        &self,
        handle: ObjectHandle,
        ancestor: ObjectHandle,
    ) -> Result<bool, ObjectError> {
        let Some(start) = self.get(handle)?.prototype else {
            return Ok(false);
        };
        Ok(self
            .walk_chain(start, |h, _| (h == ancestor).then_some(()))?
            .is_some())
    }

    pub fn get_own_property_descriptor(
        &self,
        handle: ObjectHandle,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, ObjectError> {
        Ok(self.get(handle)?.get_own_property(key).cloned())
    }

    /// `Object.defineProperty(O, P, Desc)`.
    pub fn define_property(
        &mut self,
        handle: ObjectHandle,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> Result<bool, ObjectError> {
        Ok(self.get_mut(handle)?.define_own_property(key, desc))
    }

    /// Overwrite the value of an existing writable data property.
    pub fn write_data(
        &mut self,
        handle: ObjectHandle,
        key: &PropertyKey,
        new_value: JsValue,
    ) -> Result<bool, ObjectError> {
        match self.get_mut(handle)?.properties.get_mut(key) {
            Some(PropertyDescriptor::Data {
                value, writable, ..
            }) if *writable => {
                *value = new_value;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// `Object.getOwnPropertyNames(O)`: enumerable or not.
    pub fn get_own_property_names(
        &self,
        handle: ObjectHandle,
    ) -> Result<Vec<PropertyKey>, ObjectError> {
        Ok(self.get(handle)?.own_property_keys())
    }

    /// `Object.keys(O)`: enumerable own keys.
    pub fn keys(&self, handle: ObjectHandle) -> Result<Vec<PropertyKey>, ObjectError> {
        let obj = self.get(handle)?;
        Ok(obj
            .own_property_keys()
            .into_iter()
            .filter(|k| obj.properties.get(k).is_some_and(|d| d.is_enumerable()))
            .collect())
    }

    /// `for...in` enumeration: walk the chain, collect enumerable keys,
    /// skipping shadowed ones.
    pub fn for_in_keys(&self, handle: ObjectHandle) -> Result<Vec<PropertyKey>, ObjectError> {
        let mut result = Vec::new();
        let mut seen = BTreeSet::<PropertyKey>::new();
        self.walk_chain(handle, |_, o| {
            for k in o.own_property_keys() {
                if !seen.insert(k.clone()) {
                    continue;
                }
                if o.properties.get(&k).is_some_and(|d| d.is_enumerable()) {
                    result.push(k);
                }
            }
            None::<()>
        })?;
        Ok(result)
    }

    pub fn get_prototype_of(
        &self,
        handle: ObjectHandle,
    ) -> Result<Option<ObjectHandle>, ObjectError> {
        Ok(self.get(handle)?.prototype)
    }

    /// `Object.setPrototypeOf(O, proto)`.  `Ok(false)` when `O` is
    /// non-extensible and `proto` differs from the current prototype.
    pub fn set_prototype_of(
        &mut self,
        handle: ObjectHandle,
        proto: Option<ObjectHandle>,
    ) -> Result<bool, ObjectError> {
        if let Some(p) = proto {
            let closes_cycle = p == handle || self.inherits_from(p, handle)?;
            if closes_cycle {
                return Err(ObjectError::PrototypeCycleDetected);
            }
        }

        let obj = self.get_mut(handle)?;
        if obj.prototype == proto {
            return Ok(true);
        }
        if !obj.extensible {
            return Ok(false);
        }
        obj.prototype = proto;
        Ok(true)
    }

    pub fn is_extensible(&self, handle: ObjectHandle) -> Result<bool, ObjectError> {
        Ok(self.get(handle)?.extensible)
    }

    pub fn seal(&mut self, handle: ObjectHandle) -> Result<(), ObjectError> {
        self.get_mut(handle)?.seal();
        Ok(())
    }

    pub fn is_sealed(&self, handle: ObjectHandle) -> Result<bool, ObjectError> {
        Ok(self.get(handle)?.is_sealed())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PropertyKey {
        PropertyKey::from(s)
    }

    fn int_val(n: i64) -> JsValue {
        JsValue::Int(n)
    }

    // -- PropertyKey -------------------------------------------------------

    #[test]
    fn array_index_is_canonical() {
        assert_eq!(key("0").array_index(), Some(0));
        assert_eq!(key("42").array_index(), Some(42));
        assert_eq!(key("042").array_index(), None);
        assert_eq!(key("-1").array_index(), None);
        assert_eq!(key("length").array_index(), None);
        assert_eq!(key("").array_index(), None);
    }

    #[test]
    fn js_value_truthiness() {
        assert!(!JsValue::Undefined.truthy());
        assert!(!JsValue::Null.truthy());
        assert!(!JsValue::Bool(false).truthy());
        assert!(!int_val(0).truthy());
        assert!(!JsValue::from("").truthy());
        assert!(int_val(-3).truthy());
        assert!(JsValue::from("x").truthy());
        assert!(JsValue::Object(ObjectHandle(0)).truthy());
    }

    #[test]
    fn js_value_display() {
        assert_eq!(JsValue::Undefined.to_string(), "undefined");
        assert_eq!(int_val(-7).to_string(), "-7");
        assert_eq!(JsValue::Object(ObjectHandle(3)).to_string(), "[object#3]");
    }

    // -- OrdinaryObject ----------------------------------------------------

    #[test]
    fn define_on_non_extensible_rejects_new_key() {
        let mut obj = OrdinaryObject {
            extensible: false,
            ..Default::default()
        };
        assert!(!obj.define_own_property(key("x"), PropertyDescriptor::data(int_val(1))));
        assert!(obj.properties.is_empty());
    }

    #[test]
    fn non_configurable_accessor_cannot_be_rewired() {
        let mut obj = OrdinaryObject::default();
        let original = PropertyDescriptor::Accessor {
            get: Some(ObjectHandle(1)),
            set: None,
            enumerable: true,
            configurable: false,
        };
        assert!(obj.define_own_property(key("x"), original.clone()));
        let rewired = PropertyDescriptor::Accessor {
            get: Some(ObjectHandle(2)),
            set: None,
            enumerable: true,
            configurable: false,
        };
        assert!(!obj.define_own_property(key("x"), rewired));
        assert!(obj.define_own_property(key("x"), original));
    }

    #[test]
    fn non_writable_value_is_pinned() {
        let mut obj = OrdinaryObject::default();
        let pinned = PropertyDescriptor::Data {
            value: int_val(1),
            writable: false,
            enumerable: true,
            configurable: false,
        };
        assert!(obj.define_own_property(key("x"), pinned));
        assert!(!obj.define_own_property(
            key("x"),
            PropertyDescriptor::Data {
                value: int_val(2),
                writable: false,
                enumerable: true,
                configurable: false,
            }
        ));
    }

    #[test]
    fn seal_keeps_values_writable() {
        let mut obj = OrdinaryObject::default();
        obj.define_own_property(key("a"), PropertyDescriptor::data(int_val(1)));
        obj.seal();
        assert!(obj.is_sealed());
        assert!(obj.get_own_property(&key("a")).unwrap().is_writable());
    }

    #[test]
    fn own_keys_put_indices_first() {
        let mut obj = OrdinaryObject::default();
        for k in ["b", "10", "a", "2"] {
            obj.define_own_property(key(k), PropertyDescriptor::data(JsValue::Null));
        }
        let keys: Vec<String> = obj
            .own_property_keys()
            .into_iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, vec!["2", "10", "a", "b"]);
    }

    // -- ObjectHeap --------------------------------------------------------

    #[test]
    fn array_length_follows_defined_indices() {
        let mut heap = ObjectHeap::new();
        let arr = heap.alloc_array(None);
        heap.define_property(arr, key("0"), PropertyDescriptor::data(int_val(5)))
            .unwrap();
        heap.define_property(arr, key("3"), PropertyDescriptor::data(int_val(6)))
            .unwrap();
        let len = heap.get_own_property_descriptor(arr, &key("length")).unwrap();
        assert_eq!(len.unwrap().value(), Some(&int_val(4)));
        assert!(heap.is_array(arr));
    }

    #[test]
    fn for_in_walks_chain_and_skips_shadowed() {
        let mut heap = ObjectHeap::new();
        let proto = heap.alloc(None);
        heap.define_property(proto, key("shared"), PropertyDescriptor::data(int_val(1)))
            .unwrap();
        heap.define_property(proto, key("inherited"), PropertyDescriptor::data(int_val(2)))
            .unwrap();
        heap.define_property(proto, key("hidden"), PropertyDescriptor::hidden(int_val(3)))
            .unwrap();
        let child = heap.alloc(Some(proto));
        heap.define_property(child, key("shared"), PropertyDescriptor::hidden(int_val(9)))
            .unwrap();
        heap.define_property(child, key("own"), PropertyDescriptor::data(int_val(4)))
            .unwrap();

        let keys = heap.for_in_keys(child).unwrap();
        assert_eq!(keys, vec![key("own"), key("inherited")]);
    }

    #[test]
    fn find_property_reports_owner() {
        let mut heap = ObjectHeap::new();
        let proto = heap.alloc(None);
        heap.define_property(proto, key("x"), PropertyDescriptor::data(int_val(1)))
            .unwrap();
        let child = heap.alloc(Some(proto));
        let (owner, desc) = heap.find_property(child, &key("x")).unwrap().unwrap();
        assert_eq!(owner, proto);
        assert_eq!(desc.value(), Some(&int_val(1)));
        assert!(heap.find_property(child, &key("y")).unwrap().is_none());
    }

    #[test]
    fn set_prototype_rejects_cycles() {
        let mut heap = ObjectHeap::new();
        let a = heap.alloc(None);
        let b = heap.alloc(Some(a));
        assert_eq!(
            heap.set_prototype_of(a, Some(b)),
            Err(ObjectError::PrototypeCycleDetected)
        );
        assert_eq!(
            heap.set_prototype_of(a, Some(a)),
            Err(ObjectError::PrototypeCycleDetected)
        );
    }

    #[test]
    fn set_prototype_on_sealed_object_only_accepts_current() {
        let mut heap = ObjectHeap::new();
        let p1 = heap.alloc(None);
        let p2 = heap.alloc(None);
        let obj = heap.alloc(Some(p1));
        heap.seal(obj).unwrap();
        assert_eq!(heap.set_prototype_of(obj, Some(p1)), Ok(true));
        assert_eq!(heap.set_prototype_of(obj, Some(p2)), Ok(false));
    }

    #[test]
    fn inherits_from_excludes_self() {
        let mut heap = ObjectHeap::new();
        let root = heap.alloc(None);
        let mid = heap.alloc(Some(root));
        let leaf = heap.alloc(Some(mid));
        assert!(heap.inherits_from(leaf, root).unwrap());
        assert!(!heap.inherits_from(root, root).unwrap());
        assert!(!heap.inherits_from(root, leaf).unwrap());
    }

    #[test]
    fn missing_handle_is_reported() {
        let heap = ObjectHeap::new();
        assert_eq!(
            heap.get(ObjectHandle(9)).err(),
            Some(ObjectError::ObjectNotFound(ObjectHandle(9)))
        );
        assert!(!heap.is_callable(ObjectHandle(9)));
    }

    #[test]
    fn write_data_respects_writable() {
        let mut heap = ObjectHeap::new();
        let obj = heap.alloc(None);
        heap.define_property(
            obj,
            key("ro"),
            PropertyDescriptor::Data {
                value: int_val(1),
                writable: false,
                enumerable: true,
                configurable: true,
            },
        )
        .unwrap();
        heap.define_property(obj, key("rw"), PropertyDescriptor::data(int_val(1)))
            .unwrap();
        assert!(!heap.write_data(obj, &key("ro"), int_val(2)).unwrap());
        assert!(heap.write_data(obj, &key("rw"), int_val(2)).unwrap());
        assert!(!heap.write_data(obj, &key("missing"), int_val(2)).unwrap());
    }
}
