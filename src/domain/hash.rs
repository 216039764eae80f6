use sha2::{Digest, Sha256};

use super::Task;

/// Digest of the user-entered task fields.
///
/// Computed before auto-fill, so branch names synthesized at submit time never
/// influence it. Each field is trimmed and length-prefixed so that moving text
/// from one field to its neighbour changes the digest.
pub fn content_hash(task: &Task) -> String {
    let mut hasher = Sha256::new();
    for field in [
        task.repository.as_str(),
        task.source.as_str(),
        task.target.as_str(),
        task.title.as_str(),
        task.prompt.as_str(),
        task.context.as_str(),
        task.run_type.as_str(),
    ] {
        let normalized = field.trim();
        hasher.update((normalized.len() as u64).to_le_bytes());
        hasher.update(normalized.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Digest of raw file bytes, used for config-file identity checks.
pub fn bytes_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
