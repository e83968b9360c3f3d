//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a player name still has content once surrounding whitespace is removed.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("Robin")  // Ok
/// validate_player_name("   ")    // Err - blank
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("player_name_blank");
        err.message = Some("Player name must not be blank".into());
        return Err(err);
    }

    Ok(())
}

/// Validates an optional free-form field is not blank when it is present.
pub fn validate_optional_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank when provided".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_player_name_valid() {
        assert!(validate_player_name("Robin").is_ok());
        assert!(validate_player_name("  Maid Marian ").is_ok());
    }

    #[test]
    fn test_validate_player_name_blank() {
        assert!(validate_player_name("").is_err());
        assert!(validate_player_name(" \t\n").is_err());
    }

    #[test]
    fn test_validate_optional_not_blank() {
        assert!(validate_optional_not_blank("Adult").is_ok());
        assert!(validate_optional_not_blank("  ").is_err());
    }
}
