//! Registration and passcode form state.
//!
//! Pure reducers: no I/O and no async. A front end feeds keystrokes in and
//! reads validation state out, then hands the finished value to the gateway.

use crate::types::{OtpVerification, Registration};
use crate::{MimirError, Result};

pub const MIN_USERNAME_CHARS: usize = 3;
pub const MIN_PASSWORD_CHARS: usize = 6;
pub const OTP_DIGITS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Username,
    Email,
    Password,
    ConfirmPassword,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Username,
        Field::Email,
        Field::Password,
        Field::ConfirmPassword,
    ];

    fn required_message(self) -> &'static str {
        match self {
            Field::Username => "Username is required",
            Field::Email => "Email is required",
            Field::Password => "Password is required",
            Field::ConfirmPassword => "Please confirm your password",
        }
    }
}

/// Validation state of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    /// Nothing entered yet.
    Empty,
    Invalid(&'static str),
    Valid,
}

impl FieldState {
    pub fn is_valid(self) -> bool {
        self == FieldState::Valid
    }
}

/// The four-field sign-up form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value of `field`.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Username => self.username = value,
            Field::Email => self.email = value,
            Field::Password => self.password = value,
            Field::ConfirmPassword => self.confirm_password = value,
        }
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Username => &self.username,
            Field::Email => &self.email,
            Field::Password => &self.password,
            Field::ConfirmPassword => &self.confirm_password,
        }
    }

    pub fn field_state(&self, field: Field) -> FieldState {
        let value = self.value(field);
        if value.trim().is_empty() {
            return FieldState::Empty;
        }
        let problem = match field {
            Field::Username if value.trim().chars().count() < MIN_USERNAME_CHARS => {
                Some("Username must be at least 3 characters")
            }
            Field::Email if !looks_like_email(value) => Some("Please enter a valid email"),
            Field::Password if value.chars().count() < MIN_PASSWORD_CHARS => {
                Some("Password must be at least 6 characters")
            }
            Field::ConfirmPassword if value != self.password => Some("Passwords do not match"),
            _ => None,
        };
        problem.map_or(FieldState::Valid, FieldState::Invalid)
    }

    /// Message to show under `field` once the user has touched it or tried
    /// to submit.
    pub fn error(&self, field: Field) -> Option<&'static str> {
        match self.field_state(field) {
            FieldState::Empty => Some(field.required_message()),
            FieldState::Invalid(message) => Some(message),
            FieldState::Valid => None,
        }
    }

    /// Every field error, in form order.
    pub fn errors(&self) -> Vec<(Field, &'static str)> {
        Field::ALL
            .into_iter()
            .filter_map(|field| self.error(field).map(|message| (field, message)))
            .collect()
    }

    /// Number of valid fields, for a progress indicator.
    pub fn completed_fields(&self) -> usize {
        Field::ALL
            .into_iter()
            .filter(|&field| self.field_state(field).is_valid())
            .count()
    }

    pub fn is_valid(&self) -> bool {
        self.completed_fields() == Field::ALL.len()
    }

    /// Request body for a valid form; otherwise the first field error.
    pub fn to_registration(&self) -> Result<Registration> {
        if let Some((_, message)) = self.errors().first() {
            return Err(MimirError::InvalidInput((*message).to_string()));
        }
        Ok(Registration {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

/// Same test as the pattern `\S+@\S+\.\S+` searched anywhere in `value`.
fn looks_like_email(value: &str) -> bool {
    value.char_indices().filter(|&(_, c)| c == '@').any(|(at, _)| {
        let has_local = value[..at]
            .chars()
            .next_back()
            .is_some_and(|c| !c.is_whitespace());
        let domain = value[at + 1..]
            .split(char::is_whitespace)
            .next()
            .unwrap_or("");
        has_local
            && domain
                .char_indices()
                .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
    })
}

/// Six-digit passcode entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpEntry {
    code: String,
}

impl OtpEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an edit of the whole field. Non-digits are dropped; input that
    /// would exceed six digits is ignored.
    pub fn input(&mut self, raw: &str) {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.len() <= OTP_DIGITS {
            self.code = digits;
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_complete(&self) -> bool {
        self.code.len() == OTP_DIGITS
    }

    /// Request body for `email` and the entered code.
    pub fn to_verification(&self, email: Option<&str>) -> Result<OtpVerification> {
        let email = email.map(str::trim).filter(|e| !e.is_empty()).ok_or_else(|| {
            MimirError::InvalidInput("Email not found. Please try registering again.".to_string())
        })?;
        if self.code.is_empty() {
            return Err(MimirError::InvalidInput(
                "Please enter the OTP code.".to_string(),
            ));
        }
        if !self.is_complete() {
            return Err(MimirError::InvalidInput(
                "Please enter a complete 6-digit code.".to_string(),
            ));
        }
        Ok(OtpVerification {
            email: email.to_string(),
            otp: self.code.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> RegistrationForm {
        let mut form = RegistrationForm::new();
        form.set(Field::Username, "ada");
        form.set(Field::Email, "ada@example.org");
        form.set(Field::Password, "analytical");
        form.set(Field::ConfirmPassword, "analytical");
        form
    }

    #[test]
    fn email_pattern() {
        assert!(looks_like_email("a@b.c"));
        assert!(looks_like_email("ada.lovelace@mail.example.org"));
        assert!(looks_like_email("see: a@b.c please"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.c"));
        assert!(!looks_like_email("a@.c"));
        assert!(!looks_like_email("a@b."));
        assert!(!looks_like_email("a @b.c"));
    }

    #[test]
    fn valid_form_builds_registration() {
        let form = filled();
        assert!(form.is_valid());
        assert_eq!(form.completed_fields(), 4);
        let registration = form.to_registration().unwrap();
        assert_eq!(registration.username, "ada");
        assert_eq!(registration.email, "ada@example.org");
    }

    #[test]
    fn field_rules() {
        let mut form = filled();
        form.set(Field::Username, "al");
        form.set(Field::Password, "short");
        assert_eq!(
            form.error(Field::Username),
            Some("Username must be at least 3 characters")
        );
        assert_eq!(
            form.error(Field::Password),
            Some("Password must be at least 6 characters")
        );
        assert_eq!(form.error(Field::ConfirmPassword), Some("Passwords do not match"));
        assert_eq!(form.completed_fields(), 1);
    }

    #[test]
    fn empty_fields_report_required() {
        let form = RegistrationForm::new();
        assert_eq!(form.field_state(Field::Email), FieldState::Empty);
        let errors = form.errors();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0], (Field::Username, "Username is required"));
        assert_eq!(errors[3], (Field::ConfirmPassword, "Please confirm your password"));
        assert!(matches!(
            form.to_registration(),
            Err(MimirError::InvalidInput(m)) if m == "Username is required"
        ));
    }

    #[test]
    fn otp_keeps_digits_up_to_six() {
        let mut otp = OtpEntry::new();
        otp.input("12a3");
        assert_eq!(otp.code(), "123");
        otp.input("1234567");
        assert_eq!(otp.code(), "123");
        otp.input("123456");
        assert!(otp.is_complete());
    }

    #[test]
    fn otp_verification_checks() {
        let mut otp = OtpEntry::new();
        assert!(matches!(
            otp.to_verification(None),
            Err(MimirError::InvalidInput(m)) if m.starts_with("Email not found")
        ));
        assert!(matches!(
            otp.to_verification(Some("a@b.c")),
            Err(MimirError::InvalidInput(m)) if m == "Please enter the OTP code."
        ));
        otp.input("123");
        assert!(matches!(
            otp.to_verification(Some("a@b.c")),
            Err(MimirError::InvalidInput(m)) if m == "Please enter a complete 6-digit code."
        ));
        otp.input("123456");
        let verification = otp.to_verification(Some(" a@b.c ")).unwrap();
        assert_eq!(verification.email, "a@b.c");
        assert_eq!(verification.otp, "123456");
    }
}
