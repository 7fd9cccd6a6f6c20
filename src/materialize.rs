//! Response materialization stages.
//!
//! Two optional stages layered on top of dispatch: draining the live
//! stream into one contiguous buffer, and decoding that buffer as JSON
//! with a raw-text fallback.

use bytes::BytesMut;
use futures_util::StreamExt;
use serde_json::Value;

use crate::error::ClientError;
use crate::types::{ResponseBody, ResponseEnvelope};

/// Drain a streaming body into one contiguous buffer.
///
/// Envelopes whose body is already materialized pass through untouched. A
/// stream error rejects the stage; no partial buffer is exposed.
pub async fn buffer_stage(envelope: ResponseEnvelope) -> Result<ResponseEnvelope, ClientError> {
    let ResponseEnvelope {
        status,
        headers,
        body,
    } = envelope;

    let body = match body {
        ResponseBody::Stream(response) => {
            let mut stream = response.bytes_stream();
            let mut buffer = BytesMut::new();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| ClientError::Transport(e.to_string()))?;
                buffer.extend_from_slice(&chunk);
            }
            ResponseBody::Bytes(buffer.freeze())
        }
        other => other,
    };

    Ok(ResponseEnvelope {
        status,
        headers,
        body,
    })
}

/// Decode a buffered body as JSON.
///
/// Bytes that do not parse become the raw text instead of an error; empty
/// or absent bodies pass through unchanged.
pub fn json_stage(envelope: ResponseEnvelope) -> ResponseEnvelope {
    let ResponseEnvelope {
        status,
        headers,
        body,
    } = envelope;

    let body = match body {
        ResponseBody::Bytes(bytes) if !bytes.is_empty() => {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(json) => ResponseBody::Json(json),
                Err(_) => ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned()),
            }
        }
        other => other,
    };

    ResponseEnvelope {
        status,
        headers,
        body,
    }
}
