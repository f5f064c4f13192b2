/// Payment provider webhook signature verification
///
/// The provider sends a `Stripe-Signature` header of the form
///
/// ```text
/// t=1718000000,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd
/// ```
///
/// where `v1` is the hex HMAC-SHA256 of `"{t}.{raw body}"` keyed by the
/// endpoint secret. Several `v1` entries may be present while a secret is
/// being rolled; any one matching is enough. Events older than the tolerance
/// are rejected to limit replay.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Default replay window in seconds
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Error type for signature verification
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    /// Header missing or unparseable
    #[error("Malformed signature header")]
    MalformedHeader,

    /// No `v1` signature matched
    #[error("No signatures found matching the expected signature for payload")]
    Mismatch,

    /// Timestamp outside the tolerance window
    #[error("Timestamp outside the tolerance zone")]
    Expired,
}

struct ParsedHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<ParsedHeader, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(
                    value
                        .parse::<i64>()
                        .map_err(|_| SignatureError::MalformedHeader)?,
                );
            }
            "v1" => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    match timestamp {
        Some(timestamp) if !signatures.is_empty() => Ok(ParsedHeader {
            timestamp,
            signatures,
        }),
        _ => Err(SignatureError::MalformedHeader),
    }
}

fn mac_for(payload: &[u8], timestamp: i64, secret: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Computes the header value the provider would send for `payload`
pub fn sign(payload: &[u8], timestamp: i64, secret: &str) -> String {
    let signature = mac_for(payload, timestamp, secret).finalize().into_bytes();
    format!("t={},v1={}", timestamp, hex::encode(signature))
}

/// Verifies a signature header against the raw payload
///
/// `now` is the current Unix time in seconds.
pub fn verify(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let parsed = parse_header(header)?;

    let matched = parsed.signatures.iter().any(|candidate| {
        mac_for(payload, parsed.timestamp, secret)
            .verify_slice(candidate)
            .is_ok()
    });
    if !matched {
        return Err(SignatureError::Mismatch);
    }

    if now.abs_diff(parsed.timestamp) > tolerance_secs.unsigned_abs() {
        return Err(SignatureError::Expired);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const BODY: &[u8] = br#"{"id":"evt_1","type":"customer.subscription.deleted"}"#;

    #[test]
    fn test_sign_then_verify() {
        let header = sign(BODY, 1_700_000_000, SECRET);
        assert!(header.starts_with("t=1700000000,v1="));
        assert_eq!(verify(BODY, &header, SECRET, 1_700_000_010, DEFAULT_TOLERANCE_SECS), Ok(()));
    }

    #[test]
    fn test_verify_rejects_tampered_body() {
        let header = sign(BODY, 1_700_000_000, SECRET);
        let result = verify(b"{}", &header, SECRET, 1_700_000_000, DEFAULT_TOLERANCE_SECS);
        assert_eq!(result, Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let header = sign(BODY, 1_700_000_000, "whsec_other");
        let result = verify(BODY, &header, SECRET, 1_700_000_000, DEFAULT_TOLERANCE_SECS);
        assert_eq!(result, Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_verify_rejects_stale_timestamp() {
        let header = sign(BODY, 1_700_000_000, SECRET);
        let result = verify(BODY, &header, SECRET, 1_700_000_301, DEFAULT_TOLERANCE_SECS);
        assert_eq!(result, Err(SignatureError::Expired));
    }

    #[test]
    fn test_verify_rejects_extreme_timestamps() {
        for timestamp in [i64::MIN, i64::MAX] {
            let header = sign(BODY, timestamp, SECRET);
            let result = verify(BODY, &header, SECRET, 1_700_000_000, DEFAULT_TOLERANCE_SECS);
            assert_eq!(result, Err(SignatureError::Expired));
        }
    }

    #[test]
    fn test_verify_accepts_any_matching_v1() {
        let good = sign(BODY, 1_700_000_000, SECRET);
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t=1700000000,v1={},v0=ignored,v1={}", "ab".repeat(32), good_sig);

        assert_eq!(verify(BODY, &header, SECRET, 1_700_000_000, DEFAULT_TOLERANCE_SECS), Ok(()));
    }

    #[test]
    fn test_verify_rejects_malformed_headers() {
        for header in ["", "garbage", "t=abc,v1=00", "t=1700000000", "v1=00ff"] {
            assert_eq!(
                verify(BODY, header, SECRET, 1_700_000_000, DEFAULT_TOLERANCE_SECS),
                Err(SignatureError::MalformedHeader),
                "header {:?}",
                header
            );
        }
    }
}
