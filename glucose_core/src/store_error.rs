//! Maps `Box<dyn Error>` from the store boundary to typed `GlucoseError`.
//!
//! `ReadingStore` implementations report failures as
//! `Box<dyn Error + Send + Sync>`; this module converts them to our typed
//! error enum, recognising our own `GlucoseError` when an adapter passes it
//! through unchanged.

use crate::error::GlucoseError;

/// Map a store-boundary error to a typed `GlucoseError`.
pub fn map_store_error(e: &(dyn std::error::Error + 'static)) -> GlucoseError {
    if let Some(ge) = e.downcast_ref::<GlucoseError>() {
        return ge.clone();
    }

    // Fallback: string-based detection
    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("conflict") || lower.contains("constraint") {
        GlucoseError::Conflict(s)
    } else {
        GlucoseError::Store(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_typed_errors_through() {
        let e = GlucoseError::InvalidInput("bad".into());
        assert_eq!(map_store_error(&e), e);
    }

    #[test]
    fn classifies_by_message() {
        let io = std::io::Error::other("UNIQUE constraint failed: glucose.timestamp");
        assert!(matches!(map_store_error(&io), GlucoseError::Conflict(_)));
        let io = std::io::Error::other("disk full");
        assert_eq!(
            map_store_error(&io),
            GlucoseError::Store("disk full".to_string())
        );
    }
}
