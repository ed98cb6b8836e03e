//! Trap set validation.
//!
//! A caller handler is an arbitrary object.  Validation snapshots it into a
//! [`HandlerRecord`] with exactly four optional slots, rejecting any other
//! enumerable key.  The facade only ever reads the record, so mutating the
//! handler object afterwards changes nothing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProxyError;
use crate::function::{ConstructBehavior, FunctionObject, arg};
use crate::object_model::{JsValue, ObjectHandle, PropertyDescriptor, PropertyKey};
use crate::realm::Realm;

/// The four supported intercept points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrapKind {
    Get,
    Set,
    Apply,
    Construct,
}

impl TrapKind {
    pub const ALL: [TrapKind; 4] = [Self::Get, Self::Set, Self::Apply, Self::Construct];

    pub fn name(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Apply => "apply",
            Self::Construct => "construct",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for TrapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validated, copied trap set.  Each slot holds a callable heap object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRecord {
    /// The handler value as supplied; used as `this` for trap calls.
    pub source: JsValue,
    pub get: Option<ObjectHandle>,
    pub set: Option<ObjectHandle>,
    pub apply: Option<ObjectHandle>,
    pub construct: Option<ObjectHandle>,
}

impl HandlerRecord {
    pub fn trap(&self, kind: TrapKind) -> Option<ObjectHandle> {
        match kind {
            TrapKind::Get => self.get,
            TrapKind::Set => self.set,
            TrapKind::Apply => self.apply,
            TrapKind::Construct => self.construct,
        }
    }

    fn slot_mut(&mut self, kind: TrapKind) -> &mut Option<ObjectHandle> {
        match kind {
            TrapKind::Get => &mut self.get,
            TrapKind::Set => &mut self.set,
            TrapKind::Apply => &mut self.apply,
            TrapKind::Construct => &mut self.construct,
        }
    }

    /// Traps present, in canonical order.
    pub fn installed(&self) -> Vec<TrapKind> {
        TrapKind::ALL
            .into_iter()
            .filter(|k| self.trap(*k).is_some())
            .collect()
    }
}

/// Validate `handler` and copy its traps.
///
/// Walks every enumerable key reachable on the handler (own and inherited).
/// A callable handler doubles as its own `apply` trap.
pub fn validate_handler(realm: &mut Realm, handler: &JsValue) -> Result<HandlerRecord, ProxyError> {
    let Some(handle) = handler.as_object() else {
        return Err(ProxyError::NonObjectOperand);
    };

    let mut record = HandlerRecord {
        source: handler.clone(),
        get: None,
        set: None,
        apply: None,
        construct: None,
    };

    let keys = realm.heap().for_in_keys(handle)?;
    for key in keys {
        let Some(kind) = TrapKind::from_name(key.as_str()) else {
            return Err(ProxyError::UnsupportedTrap {
                trap: key.to_string(),
            });
        };
        let value = realm.get(handler, &key)?;
        *record.slot_mut(kind) = match value {
            JsValue::Object(trap) if realm.heap().is_callable(trap) => Some(trap),
            v if !v.truthy() => None,
            _ => return Err(ProxyError::TrapNotCallable { trap: kind }),
        };
    }

    if realm.heap().is_callable(handle) {
        record.apply = Some(handle);
    }

    Ok(record)
}

// ---------------------------------------------------------------------------
// HandlerBuilder
// ---------------------------------------------------------------------------

type GetTrapFn = dyn Fn(&mut Realm, &JsValue, &PropertyKey, &JsValue) -> Result<JsValue, ProxyError>;
type SetTrapFn =
    dyn Fn(&mut Realm, &JsValue, &PropertyKey, &JsValue, &JsValue) -> Result<bool, ProxyError>;
type ApplyTrapFn = dyn Fn(&mut Realm, &JsValue, &JsValue, &[JsValue]) -> Result<JsValue, ProxyError>;
type ConstructTrapFn = dyn Fn(&mut Realm, &JsValue, &[JsValue]) -> Result<JsValue, ProxyError>;

enum Entry {
    Get(Box<GetTrapFn>),
    Set(Box<SetTrapFn>),
    Apply(Box<ApplyTrapFn>),
    Construct(Box<ConstructTrapFn>),
    Raw(JsValue),
}

/// Builds a handler object from Rust closures.
///
/// The result is a plain heap object whose properties are native functions,
/// indistinguishable from a handler assembled by hand.
#[derive(Default)]
pub struct HandlerBuilder {
    entries: Vec<(String, Entry)>,
}

impl HandlerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `get(target, key, receiver)`.
    pub fn get<F>(mut self, trap: F) -> Self
    where
        F: Fn(&mut Realm, &JsValue, &PropertyKey, &JsValue) -> Result<JsValue, ProxyError>
            + 'static,
    {
        self.entries.push(("get".into(), Entry::Get(Box::new(trap))));
        self
    }

    /// `set(target, key, value, receiver)`; the boolean is the success flag.
    pub fn set<F>(mut self, trap: F) -> Self
    where
        F: Fn(&mut Realm, &JsValue, &PropertyKey, &JsValue, &JsValue) -> Result<bool, ProxyError>
            + 'static,
    {
        self.entries.push(("set".into(), Entry::Set(Box::new(trap))));
        self
    }

    /// `apply(target, this, args)`.
    pub fn apply<F>(mut self, trap: F) -> Self
    where
        F: Fn(&mut Realm, &JsValue, &JsValue, &[JsValue]) -> Result<JsValue, ProxyError> + 'static,
    {
        self.entries.push(("apply".into(), Entry::Apply(Box::new(trap))));
        self
    }

    /// `construct(target, args)`.
    pub fn construct<F>(mut self, trap: F) -> Self
    where
        F: Fn(&mut Realm, &JsValue, &[JsValue]) -> Result<JsValue, ProxyError> + 'static,
    {
        self.entries
            .push(("construct".into(), Entry::Construct(Box::new(trap))));
        self
    }

    /// Arbitrary property, e.g. an unsupported trap name.
    pub fn raw(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.entries.push((name.into(), Entry::Raw(value)));
        self
    }

    pub fn build(self, realm: &mut Realm) -> Result<JsValue, ProxyError> {
        let handler = realm.new_object();
        for (name, entry) in self.entries {
            let value = match entry {
                Entry::Raw(value) => value,
                Entry::Get(trap) => native(realm, &name, move |realm, _, args| {
                    let key = key_arg(args, 1);
                    trap(realm, &arg(args, 0), &key, &arg(args, 2))
                })?,
                Entry::Set(trap) => native(realm, &name, move |realm, _, args| {
                    let key = key_arg(args, 1);
                    trap(realm, &arg(args, 0), &key, &arg(args, 2), &arg(args, 3)).map(JsValue::Bool)
                })?,
                Entry::Apply(trap) => native(realm, &name, move |realm, _, args| {
                    let list = realm.array_elements(&arg(args, 2))?;
                    trap(realm, &arg(args, 0), &arg(args, 1), &list)
                })?,
                Entry::Construct(trap) => native(realm, &name, move |realm, _, args| {
                    let list = realm.array_elements(&arg(args, 1))?;
                    trap(realm, &arg(args, 0), &list)
                })?,
            };
            realm.heap_mut().define_property(
                handler,
                PropertyKey::from(name),
                PropertyDescriptor::data(value),
            )?;
        }
        Ok(JsValue::Object(handler))
    }
}

fn native(
    realm: &mut Realm,
    name: &str,
    body: impl Fn(&mut Realm, &JsValue, &[JsValue]) -> Result<JsValue, ProxyError> + 'static,
) -> Result<JsValue, ProxyError> {
    let f = realm.alloc_function(FunctionObject::new(
        name,
        body,
        ConstructBehavior::NotConstructor,
    ))?;
    Ok(JsValue::Object(f))
}

fn key_arg(args: &[JsValue], i: usize) -> PropertyKey {
    match arg(args, i) {
        JsValue::Str(s) => PropertyKey::from(s),
        other => PropertyKey::from(other.to_string()),
    }
}
