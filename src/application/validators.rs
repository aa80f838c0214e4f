use validator::ValidateEmail;

use crate::app_error::FieldErrors;

pub const MAX_NAME_LEN: usize = 150;
pub const MAX_EMAIL_LEN: usize = 150;
pub const MIN_USERNAME_LEN: usize = 2;
pub const MAX_USERNAME_LEN: usize = 25;
pub const CODE_LEN: usize = 6;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Usernames are case-sensitive and limited to printable ASCII.
/// Rules:
/// - 2-25 characters
/// - ASCII only, no control characters
pub fn is_valid_username(username: &str) -> bool {
    (MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&username.len())
        && username.chars().all(|c| c.is_ascii() && !c.is_ascii_control())
}

/// One-time codes are exactly six ASCII digits.
pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

pub fn check_name(errors: &mut FieldErrors, name: &str) {
    if name.trim().is_empty() {
        errors.insert("name", "name is a required field");
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.insert(
            "name",
            format!("name must be a maximum of {MAX_NAME_LEN} characters in length"),
        );
    }
}

pub fn check_username(errors: &mut FieldErrors, username: &str) {
    if username.is_empty() {
        errors.insert("username", "username is a required field");
    } else if !username.is_ascii() || username.chars().any(|c| c.is_ascii_control()) {
        errors.insert("username", "username must contain only ascii characters");
    } else if !is_valid_username(username) {
        errors.insert(
            "username",
            format!(
                "username must be between {MIN_USERNAME_LEN} and {MAX_USERNAME_LEN} characters in length"
            ),
        );
    }
}

pub fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.trim().is_empty() {
        errors.insert("email", "email is a required field");
    } else if email.chars().count() > MAX_EMAIL_LEN {
        errors.insert(
            "email",
            format!("email must be a maximum of {MAX_EMAIL_LEN} characters in length"),
        );
    } else if !is_valid_email(email) {
        errors.insert("email", "email must be a valid email address");
    }
}

pub fn check_code(errors: &mut FieldErrors, field: &str, code: &str) {
    if code.is_empty() {
        errors.insert(field, format!("{field} is a required field"));
    } else if !is_valid_code(code) {
        errors.insert(field, format!("{field} must be {CODE_LEN} digits"));
    }
}
