//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Validate a person's display name
pub fn validate_name(name: &str) -> Result<(), String> {
    let name = name.trim();

    if name.is_empty() {
        return Err("Name is required".to_string());
    }

    if name.len() < 2 {
        return Err("Name must be at least 2 characters long".to_string());
    }

    if name.len() > 80 {
        return Err("Name must be at most 80 characters long".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_letter || !has_digit {
        return Err("Password must contain at least one letter and one digit".to_string());
    }

    Ok(())
}

/// Validate an optional phone number
pub fn validate_phone(phone: &str) -> Result<(), String> {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX.get_or_init(|| {
        Regex::new(r"^\+?[0-9 ().-]{7,20}$").expect("Failed to compile phone regex")
    });

    if !regex.is_match(phone) {
        return Err("Invalid phone number".to_string());
    }

    Ok(())
}

/// Validate an inquiry message body
pub fn validate_message(message: &str) -> Result<(), String> {
    let message = message.trim();

    if message.is_empty() {
        return Err("Message is required".to_string());
    }

    if message.len() > 2000 {
        return Err("Message must be at most 2000 characters long".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_bounds() {
        assert!(validate_name("Asha Rao").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(" a ").is_err());
        assert!(validate_name(&"x".repeat(81)).is_err());
    }

    #[test]
    fn email_format() {
        assert!(validate_email("student@example.com").is_ok());
        assert!(validate_email("a.b+c@sub.example.co").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
    }

    #[test]
    fn password_strength() {
        assert!(validate_password("correct1horse").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("short1").is_err());
        assert!(validate_password("allletters").is_err());
        assert!(validate_password("12345678").is_err());
    }

    #[test]
    fn phone_format() {
        assert!(validate_phone("+91 98765 43210").is_ok());
        assert!(validate_phone("(212) 555-0100").is_ok());
        assert!(validate_phone("123").is_err());
        assert!(validate_phone("call me").is_err());
    }

    #[test]
    fn message_bounds() {
        assert!(validate_message("Interested in the evening batch.").is_ok());
        assert!(validate_message("   ").is_err());
        assert!(validate_message(&"m".repeat(2001)).is_err());
    }
}
