//! Error taxonomy for facade construction and trapped operations.

use serde::{Deserialize, Serialize};

use crate::handler::TrapKind;
use crate::object_model::{JsValue, ObjectError};

/// Coarse classification used by callers and the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad target/handler, or the constructor used without construction.
    InvalidArgument,
    /// Handler names a trap outside `get`/`set`/`apply`/`construct`.
    UnsupportedTrap,
    /// Calling or constructing something that cannot be called or constructed.
    Dispatch,
    /// Trapped operation on a revoked facade.
    Revocation,
    /// Assignment rejected under the strict assignment policy.
    Assignment,
    /// Property read or write on `null`/`undefined`.
    NullishAccess,
    /// Heap fault or unavailable host primitive.
    ObjectModel,
    /// A value thrown by caller-supplied code.
    Thrown,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyError {
    #[error("TypeError: Constructor Proxy requires 'new'")]
    ConstructorRequiresNew,
    #[error("TypeError: Cannot create proxy with a non-object as target or handler")]
    NonObjectOperand,
    #[error("TypeError: Proxy polyfill does not support trap '{trap}'")]
    UnsupportedTrap { trap: String },
    #[error("TypeError: trap '{trap}' is not a function")]
    TrapNotCallable { trap: TrapKind },
    #[error("TypeError: Object prototype may only be an Object or null: {value}")]
    InvalidPrototype { value: String },
    #[error("TypeError: {value} is not a function")]
    NotAFunction { value: String },
    #[error("TypeError: {value} is not a constructor")]
    NotAConstructor { value: String },
    #[error("TypeError: Cannot perform '{trap}' on a proxy that has been revoked")]
    Revoked { trap: TrapKind },
    #[error("TypeError: 'set' on proxy: trap returned falsish for property '{key}'")]
    SetTrapRejected { key: String },
    #[error("TypeError: Cannot assign to property '{key}' of {target}")]
    AssignmentRejected { key: String, target: String },
    #[error("TypeError: Cannot read properties of {value} (reading '{key}')")]
    NullishBase { value: String, key: String },
    #[error("SyntaxError: {0}")]
    PrimitiveUnavailable(String),
    #[error(transparent)]
    Object(#[from] ObjectError),
    #[error("Uncaught {0}")]
    Thrown(JsValue),
}

impl ProxyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConstructorRequiresNew
            | Self::NonObjectOperand
            | Self::TrapNotCallable { .. }
            | Self::InvalidPrototype { .. } => ErrorCategory::InvalidArgument,
            Self::UnsupportedTrap { .. } => ErrorCategory::UnsupportedTrap,
            Self::NotAFunction { .. } | Self::NotAConstructor { .. } => ErrorCategory::Dispatch,
            Self::Revoked { .. } => ErrorCategory::Revocation,
            Self::SetTrapRejected { .. } | Self::AssignmentRejected { .. } => {
                ErrorCategory::Assignment
            }
            Self::NullishBase { .. } => ErrorCategory::NullishAccess,
            Self::PrimitiveUnavailable(_) | Self::Object(_) => ErrorCategory::ObjectModel,
            Self::Thrown(_) => ErrorCategory::Thrown,
        }
    }

    /// Stable code recorded in audit events.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConstructorRequiresNew => "FE-PROXY-0001",
            Self::NonObjectOperand => "FE-PROXY-0002",
            Self::UnsupportedTrap { .. } => "FE-PROXY-0003",
            Self::TrapNotCallable { .. } => "FE-PROXY-0004",
            Self::InvalidPrototype { .. } => "FE-PROXY-0005",
            Self::NotAFunction { .. } => "FE-PROXY-0010",
            Self::NotAConstructor { .. } => "FE-PROXY-0011",
            Self::Revoked { .. } => "FE-PROXY-0020",
            Self::SetTrapRejected { .. } => "FE-PROXY-0030",
            Self::AssignmentRejected { .. } => "FE-PROXY-0031",
            Self::NullishBase { .. } => "FE-PROXY-0032",
            Self::PrimitiveUnavailable(_) => "FE-PROXY-0040",
            Self::Object(_) => "FE-PROXY-0041",
            Self::Thrown(_) => "FE-PROXY-0050",
        }
    }

    /// Caller code throwing a plain value.
    pub fn thrown(value: impl Into<JsValue>) -> Self {
        Self::Thrown(value.into())
    }
}
