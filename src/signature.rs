//! Webhook signature verification
//!
//! GitHub signs each delivery with an HMAC of the raw request body and puts
//! the result in a header shaped `<algorithm>=<hexdigest>`. The upstream
//! scheme uses SHA-1; no other algorithm is accepted.

use hex::decode as hex_decode;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::{RelayError, Result};

type HmacSha1 = Hmac<Sha1>;

/// Verify a webhook signature header against the raw request body.
///
/// Fails with `NoSignatureInfo` when no header was supplied, and with
/// `InvalidSignature` on a malformed header, an unsupported algorithm, or a
/// digest mismatch. The digest comparison runs in fixed time via
/// [`Mac::verify_slice`].
pub fn verify_signature(secret: &[u8], body: &[u8], signature_header: Option<&str>) -> Result<()> {
    let header = signature_header
        .ok_or_else(|| RelayError::NoSignatureInfo("no signature header found".to_string()))?;

    let (algorithm, digest) = header.split_once('=').ok_or(RelayError::InvalidSignature)?;
    if algorithm != "sha1" {
        return Err(RelayError::InvalidSignature);
    }

    let claimed = hex_decode(digest).map_err(|_| RelayError::InvalidSignature)?;

    let mut mac = HmacSha1::new_from_slice(secret).map_err(|_| RelayError::InvalidSignature)?;
    mac.update(body);
    mac.verify_slice(&claimed)
        .map_err(|_| RelayError::InvalidSignature)
}
