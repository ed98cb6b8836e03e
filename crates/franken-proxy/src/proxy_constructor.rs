//! The host-visible `Proxy` constructor and the Rust entry points.

use std::rc::Rc;

use crate::error::ProxyError;
use crate::facade::build_facade;
use crate::function::{ConstructBehavior, FunctionObject, NativeConstruct, arg};
use crate::object_model::{JsValue, ObjectHandle, PropertyDescriptor, PropertyKey};
use crate::realm::Realm;
use crate::revocation::{RevocableProxy, alloc_revoke_function};

impl Realm {
    /// `new Proxy(target, handler)`.
    pub fn new_proxy(&mut self, target: &JsValue, handler: &JsValue) -> Result<JsValue, ProxyError> {
        Ok(build_facade(self, target, handler)?.facade())
    }

    /// `Proxy.revocable(target, handler)`: the facade plus the function that
    /// revokes it.
    pub fn revocable_proxy(
        &mut self,
        target: &JsValue,
        handler: &JsValue,
    ) -> Result<RevocableProxy, ProxyError> {
        let core = build_facade(self, target, handler)?;
        let revoke = alloc_revoke_function(self, &core)?;
        Ok(RevocableProxy::new(core, revoke))
    }

    /// The `Proxy` function object, also reachable as `Proxy` on the global
    /// object.  Installed on first use.
    pub fn proxy_constructor(&mut self) -> Result<JsValue, ProxyError> {
        if let Some(ctor) = self.cached_proxy_constructor() {
            return Ok(JsValue::Object(ctor));
        }
        let ctor = install_proxy_constructor(self)?;
        self.cache_proxy_constructor(ctor);
        Ok(JsValue::Object(ctor))
    }
}

fn install_proxy_constructor(realm: &mut Realm) -> Result<ObjectHandle, ProxyError> {
    let construct: NativeConstruct = Rc::new(|realm: &mut Realm, args: &[JsValue]| {
        realm.new_proxy(&arg(args, 0), &arg(args, 1))
    });
    let ctor = realm.alloc_function(FunctionObject::new(
        "Proxy",
        |_, _, _| Err(ProxyError::ConstructorRequiresNew),
        ConstructBehavior::Native(construct),
    ))?;

    let revocable = realm.new_function("revocable", |realm, _, args| {
        let pair = realm.revocable_proxy(&arg(args, 0), &arg(args, 1))?;
        let result = realm.object_from_entries([("proxy", pair.proxy), ("revoke", pair.revoke)])?;
        Ok(JsValue::Object(result))
    })?;
    realm.heap_mut().define_property(
        ctor,
        PropertyKey::from("revocable"),
        PropertyDescriptor::hidden(JsValue::Object(revocable)),
    )?;

    let global = realm.intrinsics().global;
    realm.heap_mut().define_property(
        global,
        PropertyKey::from("Proxy"),
        PropertyDescriptor::hidden(JsValue::Object(ctor)),
    )?;
    Ok(ctor)
}
