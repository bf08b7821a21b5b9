use crate::error::ApiError;
use regex::Regex;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
pub const PASSWORD_MIN_LENGTH: usize = 6;

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    let email_re =
        Regex::new(EMAIL_PATTERN).map_err(|e| ApiError::Internal(format!("Regex error: {e}")))?;
    if !email_re.is_match(email) {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {PASSWORD_MIN_LENGTH} characters long"
        )));
    }
    Ok(())
}

/// Absent and blank values are treated alike.
pub fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_is_checked() {
        assert!(validate_email("agent@example.com").is_ok());
        assert!(validate_email("agent@example").is_err());
        assert!(validate_email("agent example@x.com").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn blank_values_count_as_missing() {
        assert_eq!(present(Some("  ".to_string())), None);
        assert_eq!(present(Some(" Ann ".to_string())), Some("Ann".to_string()));
        assert_eq!(present(None), None);
    }
}
