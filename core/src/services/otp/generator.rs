//! Code and session token generation from the OS CSPRNG

use rand::{rngs::OsRng, Rng, RngCore};

/// Bytes of entropy in a session token (hex-encoded to twice as many chars)
const SESSION_TOKEN_BYTES: usize = 32;

/// Generate a zero-padded numeric code of `length` digits
///
/// `length` is clamped to 1..=18 so the range fits in a `u64`.
pub fn generate_code(length: usize) -> String {
    let length = length.clamp(1, 18);
    let upper = 10u64.pow(length as u32);
    let value = OsRng.gen_range(0..upper);
    format!("{:0width$}", value, width = length)
}

/// Generate an opaque session token
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
