//! Facade construction and the per-property accessor pairs.
//!
//! A facade is an ordinary object (or array, or function) whose own
//! properties mirror the target's own property names one-for-one.  Each
//! mirrored name is an accessor pair that routes through the handler's
//! `get`/`set` traps or falls back to the target.  Both target and facade
//! are sealed once wiring is done, so the mirrored name set is final.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::AssignmentMode;
use crate::dispatcher;
use crate::error::ProxyError;
use crate::event::{FacadeEvent, FacadeEventKind};
use crate::function::arg;
use crate::handler::{TrapKind, validate_handler};
use crate::object_model::{JsValue, ObjectError, ObjectHandle, PropertyDescriptor, PropertyKey};
use crate::realm::{FacadeInfo, Realm};
use crate::revocation::FacadeCore;

/// Shape of a facade, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacadeKind {
    /// Plain object sharing the target's prototype.
    Record,
    /// Array-shaped; for array targets.
    Array,
    /// Callable and constructible; for function targets.
    Dispatcher,
}

impl fmt::Display for FacadeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Record => "record",
            Self::Array => "array",
            Self::Dispatcher => "dispatcher",
        };
        f.write_str(name)
    }
}

/// Build a facade over `target`, recording the outcome in the audit log.
pub(crate) fn build_facade(
    realm: &mut Realm,
    target: &JsValue,
    handler: &JsValue,
) -> Result<Rc<FacadeCore>, ProxyError> {
    let result = wire_facade(realm, target, handler);
    let event = match &result {
        Ok(core) => FacadeEvent::pass(realm.trace_id(), FacadeEventKind::Construct)
            .with_facade(core.id(), core.kind()),
        Err(err) => FacadeEvent::fail(realm.trace_id(), FacadeEventKind::Construct, err),
    };
    realm.record_event(event);
    result
}

fn wire_facade(
    realm: &mut Realm,
    target: &JsValue,
    handler: &JsValue,
) -> Result<Rc<FacadeCore>, ProxyError> {
    let (Some(target_handle), true) = (target.as_object(), handler.is_object()) else {
        return Err(ProxyError::NonObjectOperand);
    };
    let record = validate_handler(realm, handler)?;
    let has_get_trap = record.get.is_some();

    let toolkit = *realm.prototypes();
    let proto = toolkit.get_prototype_of(realm, target_handle)?;
    let proto_value = proto.map_or(JsValue::Null, JsValue::Object);

    let kind = if realm.heap().is_callable(target_handle) {
        FacadeKind::Dispatcher
    } else if realm.heap().is_array(target_handle) {
        FacadeKind::Array
    } else {
        FacadeKind::Record
    };
    let id = realm.reserve_facade_id();
    let core = Rc::new(FacadeCore::new(id, kind, target_handle, record));

    let facade = match kind {
        FacadeKind::Dispatcher => dispatcher::alloc_dispatcher(realm, &core, target_handle)?,
        FacadeKind::Array => {
            let array_prototype = realm.intrinsics().array_prototype;
            realm.heap_mut().alloc_array(Some(array_prototype))
        }
        FacadeKind::Record => {
            if toolkit.can_create_null_proto_objects() || proto.is_some() {
                toolkit.create(realm, &proto_value)?
            } else {
                realm.new_object()
            }
        }
    };
    core.bind_facade(facade);

    // Own names of the target, snapshotted once.
    let mut wired = BTreeSet::new();
    for name in realm.heap().get_own_property_names(target_handle)? {
        if kind != FacadeKind::Record && realm.heap().has_property(facade, &name)? {
            continue;
        }
        let enumerable = realm
            .heap()
            .get_own_property_descriptor(target_handle, &name)?
            .is_some_and(|d| d.is_enumerable());
        define_accessor(realm, &core, facade, &name, enumerable, true)?;
        wired.insert(name);
    }

    let prototype_ok = match kind {
        FacadeKind::Record => true,
        FacadeKind::Array | FacadeKind::Dispatcher => {
            proto.is_some() && toolkit.set_prototype_of(realm, facade, &proto_value)?
        }
    };

    if has_get_trap || !prototype_ok {
        for name in realm.heap().for_in_keys(target_handle)? {
            if wired.contains(&name) || realm.heap().has_own(facade, &name)? {
                continue;
            }
            define_accessor(realm, &core, facade, &name, false, false)?;
        }
    }

    realm.heap_mut().seal(target_handle)?;
    realm.heap_mut().seal(facade)?;
    realm.register_facade(facade, FacadeInfo { id, kind });
    Ok(core)
}

/// Install the accessor pair for `name` on `facade`.  Inherited names get a
/// getter only.
fn define_accessor(
    realm: &mut Realm,
    core: &Rc<FacadeCore>,
    facade: ObjectHandle,
    name: &PropertyKey,
    enumerable: bool,
    with_setter: bool,
) -> Result<(), ProxyError> {
    let getter = {
        let core = Rc::clone(core);
        let name = name.clone();
        realm.new_function(&format!("get {name}"), move |realm, _, _| {
            trapped_get(realm, &core, &name)
        })?
    };
    let setter = if with_setter {
        let core = Rc::clone(core);
        let name = name.clone();
        let f = realm.new_function(&format!("set {name}"), move |realm, _, args| {
            trapped_set(realm, &core, &name, arg(args, 0))?;
            Ok(JsValue::Undefined)
        })?;
        Some(f)
    } else {
        None
    };
    let defined = realm.heap_mut().define_property(
        facade,
        name.clone(),
        PropertyDescriptor::Accessor {
            get: Some(getter),
            set: setter,
            enumerable,
            configurable: false,
        },
    )?;
    if !defined {
        return Err(ObjectError::DefineRejected { key: name.clone() }.into());
    }
    Ok(())
}

fn trapped_get(realm: &mut Realm, core: &FacadeCore, name: &PropertyKey) -> Result<JsValue, ProxyError> {
    let target = JsValue::Object(core.check(realm, TrapKind::Get)?);
    let handler = core.handler();
    match handler.get {
        Some(trap) => realm.call(
            &JsValue::Object(trap),
            &handler.source,
            &[target, JsValue::Str(name.to_string()), core.facade()],
        ),
        None => realm.get(&target, name),
    }
}

fn trapped_set(
    realm: &mut Realm,
    core: &FacadeCore,
    name: &PropertyKey,
    value: JsValue,
) -> Result<(), ProxyError> {
    let target = JsValue::Object(core.check(realm, TrapKind::Set)?);
    let handler = core.handler();
    match handler.set {
        Some(trap) => {
            let status = realm.call(
                &JsValue::Object(trap),
                &handler.source,
                &[target, JsValue::Str(name.to_string()), value, core.facade()],
            )?;
            if !status.truthy() && realm.config().assignment_mode == AssignmentMode::Strict {
                return Err(ProxyError::SetTrapRejected {
                    key: name.to_string(),
                });
            }
            Ok(())
        }
        None => realm.assign(&target, name, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability_probe::EnvironmentProfile;
    use crate::config::EngineConfig;
    use crate::handler::{HandlerBuilder, HandlerRecord};

    fn record(realm: &mut Realm, entries: Vec<(&str, JsValue)>) -> JsValue {
        JsValue::Object(realm.object_from_entries(entries).unwrap())
    }

    fn empty_handler(realm: &mut Realm) -> JsValue {
        JsValue::Object(realm.new_object())
    }

    #[test]
    fn record_facade_mirrors_own_names() {
        let mut realm = Realm::new();
        let target = record(&mut realm, vec![("a", JsValue::Int(1)), ("b", JsValue::Int(2))]);
        let handler = empty_handler(&mut realm);
        let core = build_facade(&mut realm, &target, &handler).unwrap();
        let facade = core.facade();
        assert_eq!(core.kind(), FacadeKind::Record);
        assert_eq!(realm.own_keys(&facade).unwrap(), realm.own_keys(&target).unwrap());
        assert_eq!(realm.get(&facade, "a").unwrap(), JsValue::Int(1));
    }

    #[test]
    fn record_facade_shares_target_prototype() {
        let mut realm = Realm::new();
        let proto = record(&mut realm, vec![("shared", JsValue::Bool(true))]);
        let target = JsValue::Object(realm.heap_mut().alloc(proto.as_object()));
        let handler = empty_handler(&mut realm);
        let facade = build_facade(&mut realm, &target, &handler).unwrap().facade();
        assert_eq!(realm.get_prototype_of(&facade).unwrap(), proto.as_object());
        assert_eq!(realm.get(&facade, "shared").unwrap(), JsValue::Bool(true));
    }

    #[test]
    fn non_enumerable_names_stay_non_enumerable() {
        let mut realm = Realm::new();
        let target = record(&mut realm, vec![("visible", JsValue::Int(1))]);
        realm
            .heap_mut()
            .define_property(
                target.as_object().unwrap(),
                PropertyKey::from("hidden"),
                PropertyDescriptor::hidden(JsValue::Int(2)),
            )
            .unwrap();
        let handler = empty_handler(&mut realm);
        let facade = build_facade(&mut realm, &target, &handler).unwrap().facade();
        assert_eq!(realm.own_keys(&facade).unwrap(), vec![PropertyKey::from("visible")]);
        assert_eq!(realm.own_property_names(&facade).unwrap().len(), 2);
        assert_eq!(realm.get(&facade, "hidden").unwrap(), JsValue::Int(2));
    }

    #[test]
    fn array_facade_is_array_shaped() {
        let mut realm = Realm::new();
        let target = JsValue::Object(
            realm
                .new_array(vec![JsValue::Int(10), JsValue::Int(20)])
                .unwrap(),
        );
        let handler = empty_handler(&mut realm);
        let core = build_facade(&mut realm, &target, &handler).unwrap();
        let facade = core.facade();
        assert_eq!(core.kind(), FacadeKind::Array);
        assert!(realm.is_array(&facade));
        assert_eq!(realm.get(&facade, "length").unwrap(), JsValue::Int(2));
        assert_eq!(realm.get(&facade, 1u32).unwrap(), JsValue::Int(20));
        assert_eq!(
            realm.get_prototype_of(&facade).unwrap(),
            Some(realm.intrinsics().array_prototype)
        );
    }

    #[test]
    fn get_trap_receives_target_name_and_facade() {
        let mut realm = Realm::new();
        let target = record(&mut realm, vec![("k", JsValue::Int(1))]);
        let expected_target = target.clone();
        let handler = HandlerBuilder::new()
            .get(move |_, t, key, receiver| {
                assert_eq!(*t, expected_target);
                assert!(receiver.is_object());
                Ok(JsValue::Str(format!("trapped:{key}")))
            })
            .build(&mut realm)
            .unwrap();
        let facade = build_facade(&mut realm, &target, &handler).unwrap().facade();
        assert_eq!(realm.get(&facade, "k").unwrap(), JsValue::from("trapped:k"));
    }

    #[test]
    fn default_setter_writes_through() {
        let mut realm = Realm::new();
        let target = record(&mut realm, vec![("k", JsValue::Int(1))]);
        let handler = empty_handler(&mut realm);
        let facade = build_facade(&mut realm, &target, &handler).unwrap().facade();
        realm.assign(&facade, "k", JsValue::Int(9)).unwrap();
        assert_eq!(realm.get(&target, "k").unwrap(), JsValue::Int(9));
    }

    #[test]
    fn falsish_set_trap_depends_on_assignment_mode() {
        let run = |mode: AssignmentMode| {
            let mut realm =
                Realm::with_config(EngineConfig::default().with_assignment_mode(mode));
            let target = record(&mut realm, vec![("k", JsValue::Int(1))]);
            let handler = HandlerBuilder::new()
                .set(|_, _, _, _, _| Ok(false))
                .build(&mut realm)
                .unwrap();
            let facade = build_facade(&mut realm, &target, &handler).unwrap().facade();
            realm.assign(&facade, "k", JsValue::Int(2))
        };
        assert!(run(AssignmentMode::Sloppy).is_ok());
        assert_eq!(
            run(AssignmentMode::Strict).unwrap_err(),
            ProxyError::SetTrapRejected { key: "k".into() }
        );
    }

    #[test]
    fn get_trap_exposes_inherited_enumerable_names() {
        let mut realm = Realm::new();
        let proto = record(&mut realm, vec![("inherited", JsValue::Int(1))]);
        let target = JsValue::Object(realm.heap_mut().alloc(proto.as_object()));
        realm.set(&target, "own", JsValue::Int(2)).unwrap();
        let handler = HandlerBuilder::new()
            .get(|_, _, key, _| Ok(JsValue::Str(key.to_string())))
            .build(&mut realm)
            .unwrap();
        let facade = build_facade(&mut realm, &target, &handler).unwrap().facade();
        let facade_handle = facade.as_object().unwrap();
        assert!(realm
            .heap()
            .has_own(facade_handle, &PropertyKey::from("inherited"))
            .unwrap());
        assert_eq!(realm.get(&facade, "inherited").unwrap(), JsValue::from("inherited"));
        // Inherited names stay out of Object.keys.
        assert_eq!(realm.own_keys(&facade).unwrap(), vec![PropertyKey::from("own")]);
    }

    #[test]
    fn inherited_names_have_no_setter() {
        let mut realm = Realm::new();
        let proto = record(&mut realm, vec![("inherited", JsValue::Int(1))]);
        let target = JsValue::Object(realm.heap_mut().alloc(proto.as_object()));
        let handler = HandlerBuilder::new()
            .get(|realm, t, key, _| realm.get(t, key))
            .build(&mut realm)
            .unwrap();
        let facade = build_facade(&mut realm, &target, &handler).unwrap().facade();
        assert!(!realm.set(&facade, "inherited", JsValue::Int(5)).unwrap());
        assert_eq!(realm.get(&proto, "inherited").unwrap(), JsValue::Int(1));
    }

    #[test]
    fn target_and_facade_are_sealed() {
        let mut realm = Realm::new();
        let target = record(&mut realm, vec![("k", JsValue::Int(1))]);
        let handler = empty_handler(&mut realm);
        let facade = build_facade(&mut realm, &target, &handler).unwrap().facade();
        assert!(realm.is_sealed(&target).unwrap());
        assert!(realm.is_sealed(&facade).unwrap());
        assert!(!realm.set(&facade, "extra", JsValue::Int(1)).unwrap());
        assert!(!realm.has_property(&facade, "extra").unwrap());
    }

    #[test]
    fn non_object_operands_fail_before_mutation() {
        let mut realm = Realm::new();
        let target = record(&mut realm, vec![("k", JsValue::Int(1))]);
        let before = realm.heap().len();
        let err = build_facade(&mut realm, &target, &JsValue::Int(1)).unwrap_err();
        assert_eq!(err, ProxyError::NonObjectOperand);
        let err = build_facade(&mut realm, &JsValue::from("s"), &target).unwrap_err();
        assert_eq!(err, ProxyError::NonObjectOperand);
        assert_eq!(realm.heap().len(), before);
        assert!(!realm.is_sealed(&target).unwrap());
    }

    #[test]
    fn unsupported_trap_fails_before_mutation() {
        let mut realm = Realm::new();
        let target = record(&mut realm, vec![("k", JsValue::Int(1))]);
        let handler = HandlerBuilder::new()
            .raw("has", JsValue::Null)
            .build(&mut realm)
            .unwrap();
        let err = build_facade(&mut realm, &target, &handler).unwrap_err();
        assert_eq!(err, ProxyError::UnsupportedTrap { trap: "has".into() });
        assert!(!realm.is_sealed(&target).unwrap());
    }

    #[test]
    fn bare_environment_uses_plain_record_for_null_prototype_target() {
        let mut realm = Realm::with_config(
            EngineConfig::default().with_environment(EnvironmentProfile::legacy_bare()),
        );
        let target = JsValue::Object(realm.heap_mut().alloc(None));
        realm.set(&target, "k", JsValue::Int(3)).unwrap();
        let handler = empty_handler(&mut realm);
        let facade = build_facade(&mut realm, &target, &handler).unwrap().facade();
        assert_eq!(
            realm.get_prototype_of(&facade).unwrap(),
            Some(realm.intrinsics().object_prototype)
        );
        assert_eq!(realm.get(&facade, "k").unwrap(), JsValue::Int(3));
    }

    #[test]
    fn rejected_accessor_definition_is_an_error() {
        let mut realm = Realm::new();
        let target = realm.new_object();
        let record = HandlerRecord {
            source: JsValue::Object(realm.new_object()),
            get: None,
            set: None,
            apply: None,
            construct: None,
        };
        let core = Rc::new(FacadeCore::new(1, FacadeKind::Record, target, record));
        let facade = realm.new_object();
        core.bind_facade(facade);
        realm.heap_mut().seal(facade).unwrap();

        let name = PropertyKey::from("late");
        let err = define_accessor(&mut realm, &core, facade, &name, true, true).unwrap_err();
        assert_eq!(err, ProxyError::Object(ObjectError::DefineRejected { key: name }));
        assert!(realm.own_property_names(&JsValue::Object(facade)).unwrap().is_empty());
    }

    #[test]
    fn construction_is_audited() {
        let mut realm = Realm::new();
        let target = record(&mut realm, vec![]);
        let handler = empty_handler(&mut realm);
        let core = build_facade(&mut realm, &target, &handler).unwrap();
        let _ = build_facade(&mut realm, &JsValue::Null, &handler);
        let events = realm.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].facade_id, Some(core.id()));
        assert_eq!(events[0].facade_kind, Some(FacadeKind::Record));
        assert_eq!(events[1].error_code.as_deref(), Some("FE-PROXY-0002"));
    }

    #[test]
    fn facade_kind_is_registered() {
        let mut realm = Realm::new();
        let target = record(&mut realm, vec![]);
        let handler = empty_handler(&mut realm);
        let facade = build_facade(&mut realm, &target, &handler).unwrap().facade();
        assert_eq!(realm.facade_kind(&facade), Some(FacadeKind::Record));
        assert_eq!(realm.facade_kind(&target), None);
        assert_eq!(FacadeKind::Dispatcher.to_string(), "dispatcher");
    }
}
