//! Per-facade shared state and the one-shot revoke function.
//!
//! Every accessor and dispatcher path of a facade holds an `Rc` to the same
//! [`FacadeCore`].  Revoking flips its flag and drops the target handle, so
//! each trapped operation afterwards fails with a revocation error naming
//! the operation.

use std::cell::{Cell, OnceCell, RefCell};
use std::rc::Rc;

use crate::error::ProxyError;
use crate::event::{FacadeEvent, FacadeEventKind};
use crate::facade::FacadeKind;
use crate::handler::{HandlerRecord, TrapKind};
use crate::object_model::{JsValue, ObjectHandle};
use crate::realm::Realm;

#[derive(Debug)]
pub struct FacadeCore {
    id: u64,
    kind: FacadeKind,
    target: RefCell<Option<ObjectHandle>>,
    handler: HandlerRecord,
    facade: OnceCell<ObjectHandle>,
    revoked: Cell<bool>,
}

impl FacadeCore {
    pub(crate) fn new(id: u64, kind: FacadeKind, target: ObjectHandle, handler: HandlerRecord) -> Self {
        Self {
            id,
            kind,
            target: RefCell::new(Some(target)),
            handler,
            facade: OnceCell::new(),
            revoked: Cell::new(false),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> FacadeKind {
        self.kind
    }

    pub fn handler(&self) -> &HandlerRecord {
        &self.handler
    }

    pub(crate) fn bind_facade(&self, facade: ObjectHandle) {
        // Bound once, right after allocation.
        let _ = self.facade.set(facade);
    }

    /// The facade object, as passed to traps as the receiver.
    pub fn facade(&self) -> JsValue {
        self.facade
            .get()
            .map_or(JsValue::Undefined, |h| JsValue::Object(*h))
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.get()
    }

    /// Gate for every trapped operation: the live target, or a revocation
    /// error naming `trap`.
    pub(crate) fn check(&self, realm: &mut Realm, trap: TrapKind) -> Result<ObjectHandle, ProxyError> {
        match *self.target.borrow() {
            Some(target) if !self.revoked.get() => return Ok(target),
            _ => {}
        }
        let err = ProxyError::Revoked { trap };
        let event = FacadeEvent::fail(realm.trace_id(), FacadeEventKind::RevokedAccess, &err)
            .with_facade(self.id, self.kind)
            .with_trap(trap);
        realm.record_event(event);
        Err(err)
    }

    /// Returns `false` when already revoked.
    pub(crate) fn revoke(&self, realm: &mut Realm) -> bool {
        if self.revoked.replace(true) {
            return false;
        }
        self.target.borrow_mut().take();
        let event = FacadeEvent::pass(realm.trace_id(), FacadeEventKind::Revoke)
            .with_facade(self.id, self.kind);
        realm.record_event(event);
        true
    }
}

/// Zero-argument function object that revokes `core`.
pub(crate) fn alloc_revoke_function(
    realm: &mut Realm,
    core: &Rc<FacadeCore>,
) -> Result<ObjectHandle, ProxyError> {
    let core = Rc::clone(core);
    realm.new_function("revoke", move |realm, _, _| {
        core.revoke(realm);
        Ok(JsValue::Undefined)
    })
}

/// A facade paired with its revoke function.
#[derive(Debug, Clone)]
pub struct RevocableProxy {
    pub proxy: JsValue,
    pub revoke: JsValue,
    core: Rc<FacadeCore>,
}

impl RevocableProxy {
    pub(crate) fn new(core: Rc<FacadeCore>, revoke: ObjectHandle) -> Self {
        Self {
            proxy: core.facade(),
            revoke: JsValue::Object(revoke),
            core,
        }
    }

    /// Invoke the revoke function, exactly as host code would.
    pub fn revoke(&self, realm: &mut Realm) -> Result<(), ProxyError> {
        realm.call(&self.revoke, &JsValue::Undefined, &[])?;
        Ok(())
    }

    pub fn is_revoked(&self) -> bool {
        self.core.is_revoked()
    }

    pub fn facade_id(&self) -> u64 {
        self.core.id()
    }
}
