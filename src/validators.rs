//! Input validation utilities for the auth core

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

// Compile regex patterns once at startup
static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    // Indian mobile numbers in +91 E.164 form, first digit 6-9
    Regex::new(r"^\+91[6-9]\d{9}$").expect("hardcoded phone regex is invalid - fix source code")
});

static PIN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4,6}$").expect("hardcoded PIN regex is invalid - fix source code")
});

static OTP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{6}$").expect("hardcoded OTP regex is invalid - fix source code")
});

static VPA_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._-]+@[a-zA-Z0-9.-]+$")
        .expect("hardcoded VPA regex is invalid - fix source code")
});

/// Validate phone number format (+91XXXXXXXXXX)
pub fn validate_phone_number(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

/// Validate transaction PIN format (4-6 numeric digits)
pub fn validate_pin(pin: &str) -> bool {
    PIN_REGEX.is_match(pin)
}

/// Validate OTP code format (exactly 6 numeric digits)
pub fn validate_otp_code(code: &str) -> bool {
    OTP_REGEX.is_match(code)
}

/// Validate virtual payment address format (handle@provider)
pub fn validate_vpa(vpa: &str) -> bool {
    !vpa.is_empty() && vpa.len() <= 254 && VPA_REGEX.is_match(vpa)
}

/// validator crate compatible custom validator for phone numbers
pub fn validate_phone_number_validator(phone: &str) -> Result<(), ValidationError> {
    if validate_phone_number(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone_number"))
    }
}

/// validator crate compatible custom validator for transaction PINs
pub fn validate_pin_validator(pin: &str) -> Result<(), ValidationError> {
    if validate_pin(pin) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_pin"))
    }
}

/// validator crate compatible custom validator for OTP codes
pub fn validate_otp_code_validator(code: &str) -> Result<(), ValidationError> {
    if validate_otp_code(code) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_otp"))
    }
}

/// validator crate compatible custom validator for VPAs
pub fn validate_vpa_validator(vpa: &str) -> Result<(), ValidationError> {
    if validate_vpa(vpa) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_vpa"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_phone_numbers() {
        assert!(validate_phone_number("+919876543210"));
        assert!(validate_phone_number("+916000000001"));
    }

    #[test]
    fn test_invalid_phone_numbers() {
        assert!(!validate_phone_number("9876543210"));
        assert!(!validate_phone_number("+915876543210")); // first digit must be 6-9
        assert!(!validate_phone_number("+91987654321")); // too short
        assert!(!validate_phone_number("+9198765432100")); // too long
        assert!(!validate_phone_number("+1 9876543210"));
    }

    #[test]
    fn test_pin_format() {
        assert!(validate_pin("1234"));
        assert!(validate_pin("123456"));
        assert!(!validate_pin("123"));
        assert!(!validate_pin("1234567"));
        assert!(!validate_pin("12a4"));
    }

    #[test]
    fn test_otp_format() {
        assert!(validate_otp_code("000000"));
        assert!(validate_otp_code("987654"));
        assert!(!validate_otp_code("98765"));
        assert!(!validate_otp_code("9876543"));
        assert!(!validate_otp_code("98765a"));
    }

    #[test]
    fn test_vpa_format() {
        assert!(validate_vpa("john.doe@bank"));
        assert!(validate_vpa("user_1@pay.co"));
        assert!(!validate_vpa("nohandle"));
        assert!(!validate_vpa("@bank"));
        assert!(!validate_vpa(""));
    }
}
