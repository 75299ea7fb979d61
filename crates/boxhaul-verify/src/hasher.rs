use digest::Digest;

/// Minimal hasher interface for streaming verification.
pub trait Hasher: Send {
    /// Update the hash with new data.
    fn update(&mut self, data: &[u8]);

    /// Finalize and return the hash digest.
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

/// Generic hasher wrapper for any `digest::Digest` implementation.
/// Composes with `md-5`, `sha1` and `sha2` through the one trait family.
pub struct DigestHasher<D: Digest + Send>(D);

impl<D: Digest + Send> DigestHasher<D> {
    pub fn from_digest(digest: D) -> Self {
        Self(digest)
    }
}

impl<D: Digest + Send> Hasher for DigestHasher<D> {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_vec()
    }
}
