use thiserror::Error;

use crate::{domain::request::Category, flows::FlowTransitionError, store::StoreError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    FlowTransition(#[from] FlowTransitionError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("dataset failure: {0}")]
    Data(String),
    #[error("upstream failure in {collaborator}: {message}")]
    Upstream { collaborator: String, message: String },
    #[error("agent contract violation in {category} ({reason_code}): {message}")]
    ContractViolation { category: Category, reason_code: &'static str, message: String },
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    pub fn upstream(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream { collaborator: collaborator.into(), message: message.into() }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::Domain(DomainError::InvalidInput(message.into()))
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::ContractViolation { .. })
    }
}

impl From<StoreError> for ApplicationError {
    fn from(value: StoreError) -> Self {
        Self::Data(value.to_string())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "An analysis service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(DomainError::InvalidInput(message)) => {
                Self::BadRequest { message, correlation_id }
            }
            ApplicationError::Data(message) => Self::ServiceUnavailable { message, correlation_id },
            error @ ApplicationError::Upstream { .. } => {
                Self::ServiceUnavailable { message: error.to_string(), correlation_id }
            }
            error @ (ApplicationError::ContractViolation { .. }
            | ApplicationError::Domain(DomainError::FlowTransition(_))
            | ApplicationError::Domain(DomainError::InvariantViolation(_))) => {
                Self::Internal { message: error.to_string(), correlation_id }
            }
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}
