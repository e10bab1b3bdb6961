//! Response envelope.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use super::constants::*;
use super::payload::{put_section, PayloadReader};
use crate::error::{GridError, Result};
use crate::NodeId;

/// Outcome class of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseStatus {
    /// Success with a result.
    Success,
    /// Success with a "no value" outcome: missing key or a `false` answer.
    Absent,
    /// Failure that may go away when retried.
    RecoverableError,
    /// Failure that must be surfaced as is.
    FatalError,
}

impl ResponseStatus {
    /// Returns the wire value of this status.
    pub fn value(self) -> u8 {
        match self {
            Self::Success => STATUS_SUCCESS,
            Self::Absent => STATUS_ABSENT,
            Self::RecoverableError => STATUS_RECOVERABLE_ERROR,
            Self::FatalError => STATUS_FATAL_ERROR,
        }
    }

    /// Creates a status from its wire value.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            STATUS_SUCCESS => Some(Self::Success),
            STATUS_ABSENT => Some(Self::Absent),
            STATUS_RECOVERABLE_ERROR => Some(Self::RecoverableError),
            STATUS_FATAL_ERROR => Some(Self::FatalError),
            _ => None,
        }
    }

    /// Returns `true` for both success flavours.
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Success | Self::Absent)
    }
}

/// Structured error carried by a failed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescription {
    /// Error code, see the `ERROR_*` constants.
    pub code: i32,
    /// Server supplied description.
    pub message: String,
}

impl fmt::Display for ErrorDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// A node's answer to a [`Request`](super::Request).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    request_id: i64,
    status: ResponseStatus,
    payload: Bytes,
    error: Option<ErrorDescription>,
}

impl Response {
    /// Creates a successful response carrying `payload`.
    pub fn success(request_id: i64, payload: Bytes) -> Self {
        Self {
            request_id,
            status: ResponseStatus::Success,
            payload,
            error: None,
        }
    }

    /// Creates a successful response with no value.
    pub fn absent(request_id: i64) -> Self {
        Self {
            request_id,
            status: ResponseStatus::Absent,
            payload: Bytes::new(),
            error: None,
        }
    }

    /// Creates a successful boolean response: `true` is encoded as
    /// [`ResponseStatus::Success`], `false` as [`ResponseStatus::Absent`].
    pub fn flag(request_id: i64, value: bool) -> Self {
        if value {
            Self::success(request_id, Bytes::new())
        } else {
            Self::absent(request_id)
        }
    }

    /// Creates a failed response.
    pub fn error(request_id: i64, recoverable: bool, code: i32, message: impl Into<String>) -> Self {
        Self {
            request_id,
            status: if recoverable {
                ResponseStatus::RecoverableError
            } else {
                ResponseStatus::FatalError
            },
            payload: Bytes::new(),
            error: Some(ErrorDescription {
                code,
                message: message.into(),
            }),
        }
    }

    /// Returns the id of the request this response answers.
    pub fn request_id(&self) -> i64 {
        self.request_id
    }

    /// Returns the status.
    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    /// Returns the payload; empty unless the status is `Success`.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Consumes the response and returns its payload.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Returns the error description of a failed response.
    pub fn error_description(&self) -> Option<&ErrorDescription> {
        self.error.as_ref()
    }

    /// Returns `true` if the response carries a value or a `true` answer.
    pub fn is_present(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// Converts a failed response into the matching [`GridError`], passing
    /// successful responses through.
    pub fn into_result(self, node: Option<NodeId>) -> Result<Self> {
        match self.status {
            ResponseStatus::Success | ResponseStatus::Absent => Ok(self),
            status => {
                let recoverable = status == ResponseStatus::RecoverableError;
                let (code, message) = match self.error {
                    Some(e) => (e.code, e.message),
                    None => (ERROR_GENERIC, "error response without description".to_string()),
                };
                Err(GridError::from_response(code, message, recoverable, node))
            }
        }
    }

    /// Encodes this response into its wire form.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(
            RESPONSE_HEADER_SIZE + LENGTH_FIELD_SIZE * 2 + self.payload.len(),
        );
        buf.put_i64_le(self.request_id);
        buf.put_u8(self.status.value());

        match &self.error {
            Some(error) if !self.status.is_ok() => {
                buf.put_i32_le(error.code);
                put_section(&mut buf, error.message.as_bytes());
            }
            _ => put_section(&mut buf, &self.payload),
        }
        buf.freeze()
    }

    /// Decodes a response from its wire form.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = PayloadReader::new(data);
        let request_id = reader.i64()?;
        let status_value = reader.bytes(1)?[0];
        let status = ResponseStatus::from_value(status_value)
            .ok_or_else(|| GridError::Protocol(format!("unknown status: {status_value}")))?;

        if status.is_ok() {
            let payload = Bytes::copy_from_slice(reader.section()?);
            return Ok(Self {
                request_id,
                status,
                payload,
                error: None,
            });
        }

        let code = reader.i32()?;
        let message = String::from_utf8(reader.section()?.to_vec())
            .map_err(|e| GridError::Protocol(format!("invalid UTF-8 error message: {e}")))?;
        Ok(Self {
            request_id,
            status,
            payload: Bytes::new(),
            error: Some(ErrorDescription { code, message }),
        })
    }
}
