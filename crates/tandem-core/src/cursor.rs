//! Opaque pagination tokens carrying an offset.
//!
//! A token is the base64 encoding of `{"offset": n}`. Decoding never fails:
//! anything that does not carry a non-negative integer offset reads as the
//! first page.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    offset: i64,
}

pub fn encode(offset: usize) -> String {
    let json = serde_json::json!({ "offset": offset }).to_string();
    STANDARD.encode(json)
}

pub fn decode(token: &str) -> usize {
    try_decode(token).unwrap_or(0)
}

fn try_decode(token: &str) -> Option<usize> {
    let bytes = STANDARD.decode(token.trim()).ok()?;
    let payload: Payload = serde_json::from_slice(&bytes).ok()?;
    usize::try_from(payload.offset).ok()
}
