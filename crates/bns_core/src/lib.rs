pub mod context;
pub mod corpus;
pub mod error;
pub mod sanitize;

#[cfg(test)]
mod tests {
    use super::error::AppError;

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new("CORPUS_LOAD_FAILED", "corpus failed").with_retryable(false);
        assert_eq!(err.code, "CORPUS_LOAD_FAILED");
        assert_eq!(err.message, "corpus failed");
        assert_eq!(err.retryable, false);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn timeouts_and_unreachable_backends_are_recoverable() {
        for code in ["AI_BACKEND_UNREACHABLE", "AI_INDEX_TIMEOUT", "AI_GENERATION_TIMEOUT"] {
            assert!(AppError::new(code, "x").is_recoverable(), "{code}");
        }
        assert!(!AppError::new("CORPUS_KEY_NOT_FOUND", "x").is_recoverable());
    }

    #[test]
    fn display_includes_details_when_present() {
        let err = AppError::new("AI_INDEX_UNAVAILABLE", "Index missing").with_details("path=db");
        assert_eq!(err.to_string(), "[AI_INDEX_UNAVAILABLE] Index missing (path=db)");
    }
}
