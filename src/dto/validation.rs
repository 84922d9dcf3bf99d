//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::SESSION_CODE_LENGTH;

/// Validates that a join code is exactly 6 decimal digits.
///
/// # Examples
///
/// ```ignore
/// validate_session_code("483920") // Ok
/// validate_session_code("48392")  // Err - too short
/// validate_session_code("48392a") // Err - not a digit
/// ```
pub fn validate_session_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != SESSION_CODE_LENGTH {
        let mut err = ValidationError::new("session_code_length");
        err.message = Some(
            format!(
                "Session code must be exactly {SESSION_CODE_LENGTH} digits (got {})",
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("session_code_format");
        err.message = Some("Session code must contain only decimal digits".into());
        return Err(err);
    }

    Ok(())
}
