use rand::Rng;

/// Characters a public id is drawn from.
pub const PUBLIC_ID_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length used when configuration does not say otherwise.
pub const DEFAULT_ID_LENGTH: usize = 10;

/// Generate a uniformly random public id of `len` characters.
///
/// No uniqueness check happens here; the metadata store rejects duplicates
/// on insert and the caller retries with a fresh id.
pub fn generate_public_id<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(PUBLIC_ID_ALPHABET[rng.gen_range(0..PUBLIC_ID_ALPHABET.len())]))
        .collect()
}
