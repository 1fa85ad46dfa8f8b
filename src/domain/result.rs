//! Result type alias for docanon

use super::errors::DocanonError;

/// Result type alias for docanon operations
///
/// # Examples
///
/// ```
/// use docanon::domain::result::Result;
/// use docanon::domain::errors::DocanonError;
///
/// fn failing_function() -> Result<()> {
///     Err(DocanonError::MalformedInput("empty selection".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, DocanonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
