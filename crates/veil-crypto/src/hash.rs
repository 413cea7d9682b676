use sha2::{Digest, Sha256};

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(data);
    h.finalize().into()
}

/// Envelope id: sha256 over the canonical serialization bytes.
pub fn event_id(canonical: &[u8]) -> [u8; 32] {
    sha256(canonical)
}
