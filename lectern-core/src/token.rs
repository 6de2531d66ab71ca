//! Opaque random tokens used for share links and block identifiers.

use rand::RngCore;

/// Number of random bytes behind each token; hex-encodes to twice as many characters.
const TOKEN_BYTES: usize = 8;

fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Mint the opaque token embedded in link-mode share URLs.
///
/// Every call produces a fresh token; issuing a new one invalidates any
/// previously shared link for the material.
pub fn share_token() -> String {
    random_token()
}

/// Mint a block identifier. Callers never supply these; incoming ids are
/// accepted only as reference keys.
pub fn block_id() -> String {
    random_token()
}
