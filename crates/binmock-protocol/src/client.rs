//! Blocking client for the coordinator endpoint.
//!
//! Stub executables carry their own std-only client; this one serves Rust
//! callers such as the CLI and integration tests.

use std::net::SocketAddr;

use crate::error::TransportError;
use crate::request::InvocationRequest;
use crate::response::InvocationResponse;
use crate::INVOKE_PATH;

/// URL of the invoke endpoint for a coordinator address.
pub fn invoke_url(addr: SocketAddr) -> String {
    format!("http://{}{}", addr, INVOKE_PATH)
}

/// Send one invocation report and wait for the scripted response.
pub fn invoke(
    addr: SocketAddr,
    request: &InvocationRequest,
) -> Result<InvocationResponse, TransportError> {
    let payload = serde_json::to_value(request)?;
    let response = match ureq::post(&invoke_url(addr)).send_json(payload) {
        Ok(response) => response,
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }
        Err(ureq::Error::Transport(transport)) => {
            return Err(TransportError::ConnectionFailed(transport.to_string()));
        }
    };

    let body = response.into_string()?;
    Ok(serde_json::from_str(&body)?)
}
