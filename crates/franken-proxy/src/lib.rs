#![forbid(unsafe_code)]

//! Interceptable facades over an ES-style object model.
//!
//! A facade wraps a target object or function so that property reads,
//! property writes, calls and constructions go through caller-supplied
//! `get`/`set`/`apply`/`construct` traps, falling back to the target when a
//! trap is absent.  Facades are assembled from ordinary object-model
//! primitives (accessor properties, prototype links, sealing), whichever of
//! those the configured host environment provides.

pub mod capability_probe;
pub mod config;
mod dispatcher;
pub mod error;
pub mod event;
pub mod facade;
pub mod function;
pub mod handler;
pub mod object_model;
mod proxy_constructor;
pub mod realm;
pub mod revocation;

pub use capability_probe::{EnvironmentProfile, PrototypeToolkit};
pub use config::{AssignmentMode, EngineConfig};
pub use error::{ErrorCategory, ProxyError};
pub use event::{FacadeEvent, FacadeEventKind, Outcome};
pub use facade::FacadeKind;
pub use function::arg;
pub use handler::{HandlerBuilder, HandlerRecord, TrapKind, validate_handler};
pub use object_model::{JsValue, ObjectHandle, PropertyDescriptor, PropertyKey};
pub use realm::{FacadeInfo, Intrinsics, Realm};
pub use revocation::{FacadeCore, RevocableProxy};
