use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Verifies gateway confirmation callbacks. The gateway signs
/// `order_id|payment_id` with a shared secret; we recompute the HMAC and
/// compare in constant time.
pub struct SignatureVerifier {
    secret: String,
}

impl SignatureVerifier {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let payload = format!("{}|{}", order_id, payment_id);

        let mut mac = match HmacSha256::new_from_slice(self.secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(payload.as_bytes());
        let expected = mac.finalize().into_bytes();

        let Ok(provided) = hex::decode(signature) else {
            return false;
        };

        expected.ct_eq(provided.as_slice()).into()
    }

    /// Produces the signature the gateway would send for a payload. Used by
    /// the seed binary and tests to fabricate valid callbacks.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        let payload = format!("{}|{}", order_id, payment_id);

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}
