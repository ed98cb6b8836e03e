//! Call and construct paths of dispatcher facades.
//!
//! A function target gets a function-shaped facade with two separate
//! native entry points.  The host decides which one runs (`[[Call]]` vs
//! `[[Construct]]`), so the facade never guesses from its receiver.

use std::rc::Rc;

use crate::error::ProxyError;
use crate::function::{ConstructBehavior, FunctionObject, NativeConstruct};
use crate::handler::TrapKind;
use crate::object_model::{JsValue, ObjectHandle, PropertyDescriptor, PropertyKey};
use crate::realm::Realm;
use crate::revocation::FacadeCore;

/// Allocate the dispatcher function for `core`.  It carries the target's
/// `name` and its own `prototype` slot, like any constructible function.
pub(crate) fn alloc_dispatcher(
    realm: &mut Realm,
    core: &Rc<FacadeCore>,
    target: ObjectHandle,
) -> Result<ObjectHandle, ProxyError> {
    let name = match realm
        .heap()
        .get_own_property_descriptor(target, &PropertyKey::from("name"))?
    {
        Some(PropertyDescriptor::Data {
            value: JsValue::Str(name),
            ..
        }) => name,
        _ => String::new(),
    };

    let call_core = Rc::clone(core);
    let construct_core = Rc::clone(core);
    let construct: NativeConstruct = Rc::new(move |realm: &mut Realm, args: &[JsValue]| {
        dispatch_construct(realm, &construct_core, args)
    });
    let dispatcher = realm.alloc_function(FunctionObject::new(
        name,
        move |realm, this, args| dispatch_call(realm, &call_core, this, args),
        ConstructBehavior::Native(construct),
    ))?;

    let prototype = realm.new_object();
    realm.heap_mut().define_property(
        prototype,
        PropertyKey::from("constructor"),
        PropertyDescriptor::hidden(JsValue::Object(dispatcher)),
    )?;
    realm.heap_mut().define_property(
        dispatcher,
        PropertyKey::from("prototype"),
        PropertyDescriptor::Data {
            value: JsValue::Object(prototype),
            writable: true,
            enumerable: false,
            configurable: false,
        },
    )?;
    Ok(dispatcher)
}

/// `facade(...args)`: the `apply` trap as `(target, this, args)`, or a
/// plain call of the target with the original `this`.
fn dispatch_call(
    realm: &mut Realm,
    core: &FacadeCore,
    this: &JsValue,
    args: &[JsValue],
) -> Result<JsValue, ProxyError> {
    let target = JsValue::Object(core.check(realm, TrapKind::Apply)?);
    let handler = core.handler();
    match handler.apply {
        Some(trap) => {
            let list = JsValue::Object(realm.new_array(args.to_vec())?);
            realm.call(
                &JsValue::Object(trap),
                &handler.source,
                &[target, this.clone(), list],
            )
        }
        None => realm.call(&target, this, args),
    }
}

/// `new facade(...args)`: the `construct` trap as `(target, args)`, or a
/// direct construction of the target.
fn dispatch_construct(
    realm: &mut Realm,
    core: &FacadeCore,
    args: &[JsValue],
) -> Result<JsValue, ProxyError> {
    let target = JsValue::Object(core.check(realm, TrapKind::Construct)?);
    let handler = core.handler();
    match handler.construct {
        Some(trap) => {
            let list = JsValue::Object(realm.new_array(args.to_vec())?);
            realm.call(&JsValue::Object(trap), &handler.source, &[target, list])
        }
        None => realm.construct(&target, args),
    }
}
