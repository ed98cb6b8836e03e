//! Native function objects.
//!
//! A function object is an ordinary heap object plus a [`FunctionObject`]
//! entry in the heap's behavior table.  Calls and constructions are two
//! separate operations; nothing inspects `this` to guess which one happened.

use std::fmt;
use std::rc::Rc;

use crate::error::ProxyError;
use crate::object_model::JsValue;
use crate::realm::Realm;

/// `[[Call]]` body: `(realm, this, arguments)`.
pub type NativeCall = Rc<dyn Fn(&mut Realm, &JsValue, &[JsValue]) -> Result<JsValue, ProxyError>>;

/// Custom `[[Construct]]` body: `(realm, arguments)`.
pub type NativeConstruct = Rc<dyn Fn(&mut Realm, &[JsValue]) -> Result<JsValue, ProxyError>>;

/// How a function object responds to construction.
#[derive(Clone)]
pub enum ConstructBehavior {
    /// Constructing it fails with "not a constructor".
    NotConstructor,
    /// Allocate an instance from the `prototype` property, run the call body
    /// with it as `this`, prefer an object returned by the body.
    Ordinary,
    /// Fully custom construction.
    Native(NativeConstruct),
}

/// Native behavior attached to a callable heap object.
#[derive(Clone)]
pub struct FunctionObject {
    pub name: String,
    pub call: NativeCall,
    pub construct: ConstructBehavior,
}

impl FunctionObject {
    pub fn new(
        name: impl Into<String>,
        call: impl Fn(&mut Realm, &JsValue, &[JsValue]) -> Result<JsValue, ProxyError> + 'static,
        construct: ConstructBehavior,
    ) -> Self {
        Self {
            name: name.into(),
            call: Rc::new(call),
            construct,
        }
    }

    pub fn is_constructor(&self) -> bool {
        !matches!(self.construct, ConstructBehavior::NotConstructor)
    }
}

impl fmt::Debug for FunctionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let construct = match self.construct {
            ConstructBehavior::NotConstructor => "none",
            ConstructBehavior::Ordinary => "ordinary",
            ConstructBehavior::Native(_) => "native",
        };
        f.debug_struct("FunctionObject")
            .field("name", &self.name)
            .field("construct", &construct)
            .finish_non_exhaustive()
    }
}

/// Argument `i`, or `undefined` when the caller passed fewer.
pub fn arg(args: &[JsValue], i: usize) -> JsValue {
    args.get(i).cloned().unwrap_or(JsValue::Undefined)
}
