use sha2::{Digest, Sha512};

// SHA-512 output length, also the size of the checksum component payload
pub const DIGEST_LEN: usize = 64;

// Keeps the sha2 Digest trait out of the callers
pub struct Checksum(Sha512);

impl Checksum {
    pub fn new() -> Checksum {
        Checksum(Sha512::new())
    }

    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    pub fn finalize(self) -> [u8; DIGEST_LEN] {
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&self.0.finalize());
        out
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Checksum::new()
    }
}
