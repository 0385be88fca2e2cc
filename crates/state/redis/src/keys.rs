use burnbin_core::ContentHash;

/// `prefix:lock:name`
pub fn lock_key(prefix: &str, name: &str) -> String {
    format!("{prefix}:lock:{name}")
}

/// `prefix:paste:id`
pub fn paste_key(prefix: &str, id: &str) -> String {
    format!("{prefix}:paste:{id}")
}

/// `prefix:content:hash`
pub fn content_key(prefix: &str, hash: &ContentHash) -> String {
    format!("{prefix}:content:{hash}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_keys() {
        assert_eq!(lock_key("bb", "abc"), "bb:lock:abc");
        assert_eq!(paste_key("bb", "abc"), "bb:paste:abc");
        let hash = ContentHash::from_hex("ff00");
        assert_eq!(content_key("bb", &hash), "bb:content:ff00");
    }

    #[test]
    fn namespaces_do_not_overlap() {
        assert_ne!(lock_key("p", "x"), paste_key("p", "x"));
    }
}
