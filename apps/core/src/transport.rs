use serde::{Deserialize, Serialize};

use crate::contract::{CoreRequest, CoreResponse};
use crate::core_service::{CoreService, ServiceError};
use crate::history_store::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
    InvalidRequest,
    NotFound,
    Parse,
    Io,
    Database,
    Config,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransportResponse {
    Ok { response: CoreResponse },
    Err { error: ErrorResponse },
}

impl ErrorResponse {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ErrorResponse {
    fn from(error: ServiceError) -> Self {
        let code = match &error {
            ServiceError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            ServiceError::Config(_) => ErrorCode::Config,
            ServiceError::Store(store) => match store {
                StoreError::NotFound(_) => ErrorCode::NotFound,
                StoreError::Parse(_) => ErrorCode::Parse,
                StoreError::Io { .. } => ErrorCode::Io,
                StoreError::Database(_) => ErrorCode::Database,
            },
        };
        Self::new(code, error.to_string())
    }
}

/// Runs one request; service failures become `status: err` with a stable code.
pub fn handle_request(service: &mut CoreService, request: CoreRequest) -> TransportResponse {
    service
        .handle_command(request)
        .map_or_else(
            |error| TransportResponse::Err {
                error: error.into(),
            },
            |response| TransportResponse::Ok { response },
        )
}

pub fn handle_json(service: &mut CoreService, payload: &str) -> String {
    let response = serde_json::from_str::<CoreRequest>(payload)
        .map(|request| handle_request(service, request))
        .unwrap_or_else(|error| TransportResponse::Err {
            error: ErrorResponse::new(ErrorCode::InvalidJson, error.to_string()),
        });

    serde_json::to_string(&response).expect("transport response should serialize")
}
