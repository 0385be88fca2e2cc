use burnbin_blob::BlobError;

/// Classify an AWS SDK error string into the appropriate [`BlobError`].
///
/// Timeouts and connection failures are told apart from service errors so
/// callers can log them differently.
pub fn classify_sdk_error(error_str: &str) -> BlobError {
    let lower = error_str.to_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        BlobError::Connection(format!("timed out: {error_str}"))
    } else if lower.contains("dispatch failure")
        || lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
    {
        BlobError::Connection(error_str.to_owned())
    } else {
        BlobError::Storage(error_str.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_connection() {
        assert!(matches!(
            classify_sdk_error("operation timed out"),
            BlobError::Connection(_)
        ));
    }

    #[test]
    fn dispatch_failure_is_connection() {
        assert!(matches!(
            classify_sdk_error("dispatch failure: io error"),
            BlobError::Connection(_)
        ));
    }

    #[test]
    fn access_denied_is_storage() {
        assert!(matches!(
            classify_sdk_error("AccessDenied: Access Denied"),
            BlobError::Storage(_)
        ));
    }
}
