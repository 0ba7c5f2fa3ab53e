//! Validators for the fields shared by students and instructors. They are
//! plain functions so forms, importers and the record store all agree on the
//! same rules.

use crate::error::ValidationError;

/// Reject negative ages and hand back the value in the unsigned form the
/// models store.
pub fn validate_age(age: i64) -> Result<u32, ValidationError> {
    if age < 0 {
        return Err(ValidationError::NegativeAge { age });
    }
    u32::try_from(age).map_err(|_| ValidationError::AgeOutOfRange { age })
}

/// Minimal `local@domain` check: exactly one `@`, both halves non-empty and no
/// whitespace anywhere, including at the ends.
pub fn validate_email(email: &str) -> Result<&str, ValidationError> {
    let invalid = || ValidationError::InvalidEmail {
        email: email.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(email)
        }
        _ => Err(invalid()),
    }
}

/// Require a value that is not blank. The value is returned untouched; keys
/// are compared exactly as stored.
pub fn validate_required<'a>(
    field: &'static str,
    value: &'a str,
) -> Result<&'a str, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Blank { field })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_accepts_zero_and_positive() {
        assert_eq!(validate_age(0), Ok(0));
        assert_eq!(validate_age(42), Ok(42));
    }

    #[test]
    fn age_rejects_negative() {
        assert_eq!(
            validate_age(-1),
            Err(ValidationError::NegativeAge { age: -1 })
        );
    }

    #[test]
    fn age_rejects_values_beyond_u32() {
        let age = i64::from(u32::MAX) + 1;
        assert_eq!(
            validate_age(age),
            Err(ValidationError::AgeOutOfRange { age })
        );
    }

    #[test]
    fn email_accepts_simple_addresses() {
        assert_eq!(validate_email("ana@x.com"), Ok("ana@x.com"));
        assert_eq!(validate_email("bob@school"), Ok("bob@school"));
    }

    #[test]
    fn email_rejects_malformed_addresses() {
        for bad in ["", "ana", "@x.com", "ana@", "a@b@c", "an a@x.com", " ana@x.com"] {
            assert!(validate_email(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn required_keeps_value_and_rejects_blank() {
        assert_eq!(validate_required("Name", " Ana "), Ok(" Ana "));
        assert_eq!(
            validate_required("Name", "   "),
            Err(ValidationError::Blank { field: "Name" })
        );
    }
}
