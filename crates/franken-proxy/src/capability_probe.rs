//! Capability probing for the three prototype primitives.
//!
//! Hosts differ in which of "create with prototype", "read prototype" and
//! "write prototype" they ship natively.  [`PrototypeToolkit::probe`] picks a
//! strategy for each once, from an [`EnvironmentProfile`], and the facade
//! builder only ever talks to the toolkit.

use serde::{Deserialize, Serialize};

use crate::error::ProxyError;
use crate::function::{ConstructBehavior, FunctionObject};
use crate::object_model::{JsValue, ObjectHandle, PropertyKey};
use crate::realm::Realm;

/// Which native object-model primitives the host provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentProfile {
    /// `Object.create`.
    pub native_object_create: bool,
    /// `Object.getPrototypeOf`.
    pub native_get_prototype_of: bool,
    /// `Object.setPrototypeOf`.
    pub native_set_prototype_of: bool,
    /// `__proto__` accessor inherited from `Object.prototype`.
    pub dunder_proto: bool,
    /// `{__proto__: null}` literals produce null-prototype objects.
    pub null_proto_literals: bool,
}

impl Default for EnvironmentProfile {
    fn default() -> Self {
        Self::modern()
    }
}

impl EnvironmentProfile {
    pub fn modern() -> Self {
        Self {
            native_object_create: true,
            native_get_prototype_of: true,
            native_set_prototype_of: true,
            dunder_proto: true,
            null_proto_literals: true,
        }
    }

    /// Only the `__proto__` accessor is available.
    pub fn legacy_dunder() -> Self {
        Self {
            native_object_create: false,
            native_get_prototype_of: false,
            native_set_prototype_of: false,
            dunder_proto: true,
            null_proto_literals: true,
        }
    }

    /// No prototype primitives at all.
    pub fn legacy_bare() -> Self {
        Self {
            native_object_create: false,
            native_get_prototype_of: false,
            native_set_prototype_of: false,
            dunder_proto: false,
            null_proto_literals: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateStrategy {
    Native,
    /// `{__proto__: proto}` literal.
    ProtoLiteral,
    /// `T.prototype = proto; new T()`; cannot produce null-prototype objects.
    ConstructorShim,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtoAccess {
    Native,
    /// Through `__proto__`, which only objects inheriting from
    /// `Object.prototype` carry.
    DunderAccessor,
    /// Reads yield null, writes report failure.
    Unavailable,
}

/// The probed primitive set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrototypeToolkit {
    pub create: CreateStrategy,
    pub read: ProtoAccess,
    pub write: ProtoAccess,
    null_proto_objects: bool,
}

impl Default for PrototypeToolkit {
    fn default() -> Self {
        Self::probe(&EnvironmentProfile::modern())
    }
}

impl PrototypeToolkit {
    pub fn probe(env: &EnvironmentProfile) -> Self {
        let create = if env.native_object_create {
            CreateStrategy::Native
        } else if env.null_proto_literals {
            CreateStrategy::ProtoLiteral
        } else {
            CreateStrategy::ConstructorShim
        };
        let access = |native: bool| {
            if native {
                ProtoAccess::Native
            } else if env.dunder_proto {
                ProtoAccess::DunderAccessor
            } else {
                ProtoAccess::Unavailable
            }
        };
        Self {
            create,
            read: access(env.native_get_prototype_of),
            write: access(env.native_set_prototype_of),
            null_proto_objects: env.native_object_create || env.null_proto_literals,
        }
    }

    pub fn can_create_null_proto_objects(&self) -> bool {
        self.null_proto_objects
    }

    /// Create an object whose prototype is `proto` (an object or null).
    pub fn create(&self, realm: &mut Realm, proto: &JsValue) -> Result<ObjectHandle, ProxyError> {
        let proto = validate_proto(proto)?;
        match self.create {
            CreateStrategy::Native | CreateStrategy::ProtoLiteral => Ok(realm.heap_mut().alloc(proto)),
            CreateStrategy::ConstructorShim => {
                let Some(proto) = proto else {
                    return Err(ProxyError::PrimitiveUnavailable(
                        "Native Object.create is required to create objects with null prototype"
                            .to_string(),
                    ));
                };
                let shim = realm.alloc_function(FunctionObject::new(
                    "T",
                    |_, _, _| Ok(JsValue::Undefined),
                    ConstructBehavior::Ordinary,
                ))?;
                realm.heap_mut().write_data(
                    shim,
                    &PropertyKey::from("prototype"),
                    JsValue::Object(proto),
                )?;
                let instance = realm.construct(&JsValue::Object(shim), &[])?;
                instance.as_object().ok_or_else(|| ProxyError::NotAConstructor {
                    value: "T".to_string(),
                })
            }
        }
    }

    /// Read the prototype of `handle`.
    pub fn get_prototype_of(
        &self,
        realm: &Realm,
        handle: ObjectHandle,
    ) -> Result<Option<ObjectHandle>, ProxyError> {
        match self.read {
            ProtoAccess::Native => Ok(realm.heap().get_prototype_of(handle)?),
            ProtoAccess::DunderAccessor => {
                if has_dunder(realm, handle)? {
                    Ok(realm.heap().get_prototype_of(handle)?)
                } else {
                    Ok(None)
                }
            }
            ProtoAccess::Unavailable => Ok(None),
        }
    }

    /// Write the prototype of `handle`.  `Ok(false)` means the host could not
    /// do it; callers fall back instead of failing.
    pub fn set_prototype_of(
        &self,
        realm: &mut Realm,
        handle: ObjectHandle,
        proto: &JsValue,
    ) -> Result<bool, ProxyError> {
        let proto = validate_proto(proto)?;
        match self.write {
            ProtoAccess::Native => Ok(realm.heap_mut().set_prototype_of(handle, proto)?),
            ProtoAccess::DunderAccessor => {
                if has_dunder(realm, handle)? {
                    Ok(realm.heap_mut().set_prototype_of(handle, proto)?)
                } else {
                    Ok(false)
                }
            }
            ProtoAccess::Unavailable => Ok(false),
        }
    }
}

fn validate_proto(proto: &JsValue) -> Result<Option<ObjectHandle>, ProxyError> {
    match proto {
        JsValue::Null => Ok(None),
        JsValue::Object(h) => Ok(Some(*h)),
        other => Err(ProxyError::InvalidPrototype {
            value: other.to_string(),
        }),
    }
}

fn has_dunder(realm: &Realm, handle: ObjectHandle) -> Result<bool, ProxyError> {
    let object_prototype = realm.intrinsics().object_prototype;
    Ok(handle == object_prototype || realm.heap().inherits_from(handle, object_prototype)?)
}
