//! Structured audit events.
//!
//! Every facade construction (pass or fail), every revocation, and every
//! access denied by a revoked facade is recorded in the realm's audit log.
//! The log is in-memory and drained by the embedder.

use serde::{Deserialize, Serialize};

use crate::error::ProxyError;
use crate::facade::FacadeKind;
use crate::handler::TrapKind;

pub const COMPONENT: &str = "proxy_facade";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacadeEventKind {
    Construct,
    Revoke,
    RevokedAccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacadeEvent {
    pub trace_id: String,
    pub component: String,
    pub event: FacadeEventKind,
    pub outcome: Outcome,
    /// Sequence number of the facade within its realm, when one exists.
    pub facade_id: Option<u64>,
    pub facade_kind: Option<FacadeKind>,
    pub trap: Option<TrapKind>,
    pub error_code: Option<String>,
}

impl FacadeEvent {
    pub fn pass(trace_id: &str, event: FacadeEventKind) -> Self {
        Self {
            trace_id: trace_id.to_string(),
            component: COMPONENT.to_string(),
            event,
            outcome: Outcome::Pass,
            facade_id: None,
            facade_kind: None,
            trap: None,
            error_code: None,
        }
    }

    pub fn fail(trace_id: &str, event: FacadeEventKind, error: &ProxyError) -> Self {
        Self {
            outcome: Outcome::Fail,
            error_code: Some(error.error_code().to_string()),
            ..Self::pass(trace_id, event)
        }
    }

    pub fn with_facade(mut self, id: u64, kind: FacadeKind) -> Self {
        self.facade_id = Some(id);
        self.facade_kind = Some(kind);
        self
    }

    pub fn with_trap(mut self, trap: TrapKind) -> Self {
        self.trap = Some(trap);
        self
    }
}
