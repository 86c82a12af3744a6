//! Minimal SigV4 request signing for the Cost Explorer JSON API.
//!
//! Covers exactly the shape this crate sends: a POST to `/` with
//! `content-type`, `host`, `x-amz-date`, and `x-amz-target` headers and a
//! JSON body. Not a general-purpose signer.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "content-type;host;x-amz-date;x-amz-target";

/// Signer bound to one key pair and service scope.
pub struct Signer {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub service: String,
}

/// Headers to attach to a signed request.
pub struct SignedHeaders {
    pub amz_date: String,
    pub authorization: String,
}

impl Signer {
    /// Sign a POST to `/` on `host` with the given target and JSON payload.
    #[must_use]
    pub fn sign(
        &self,
        host: &str,
        amz_target: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> SignedHeaders {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();

        let canonical_headers = format!(
            "content-type:application/x-amz-json-1.1\nhost:{host}\nx-amz-date:{amz_date}\nx-amz-target:{amz_target}\n"
        );
        let canonical_request = format!(
            "POST\n/\n\n{canonical_headers}\n{SIGNED_HEADERS}\n{}",
            sha256_hex(payload)
        );

        let credential_scope = format!(
            "{date_stamp}/{}/{}/aws4_request",
            self.region, self.service
        );
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{credential_scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        let signing_key = self.derive_key(&date_stamp);
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        let authorization = format!(
            "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            self.access_key_id
        );

        SignedHeaders {
            amz_date,
            authorization,
        }
    }

    fn derive_key(&self, date_stamp: &str) -> Vec<u8> {
        let k_secret = format!("AWS4{}", self.secret_access_key);
        let k_date = hmac_sha256(k_secret.as_bytes(), date_stamp.as_bytes());
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, self.service.as_bytes());
        hmac_sha256(&k_service, b"aws4_request")
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC-SHA256 accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_signer() -> Signer {
        // The AWS SigV4 documentation example key pair
        Signer {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string(),
            region: "us-east-1".to_string(),
            service: "ce".to_string(),
        }
    }

    #[test]
    fn signature_is_deterministic_for_fixed_inputs() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        let signer = test_signer();
        let a = signer.sign("ce.us-east-1.amazonaws.com", "T.Op", b"{}", now);
        let b = signer.sign("ce.us-east-1.amazonaws.com", "T.Op", b"{}", now);
        assert_eq!(a.authorization, b.authorization);
        assert_eq!(a.amz_date, "20250610T120000Z");
    }

    #[test]
    fn signature_changes_with_payload() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        let signer = test_signer();
        let a = signer.sign("ce.us-east-1.amazonaws.com", "T.Op", b"{}", now);
        let b = signer.sign("ce.us-east-1.amazonaws.com", "T.Op", b"{\"x\":1}", now);
        assert_ne!(a.authorization, b.authorization);
    }

    #[test]
    fn authorization_carries_scope_and_signed_headers() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        let headers = test_signer().sign("ce.us-east-1.amazonaws.com", "T.Op", b"{}", now);
        assert!(headers.authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20250610/us-east-1/ce/aws4_request"));
        assert!(headers.authorization.contains(SIGNED_HEADERS));
    }
}
