pub mod app_error;
pub mod device;
pub mod email_templates;
pub mod jwt;
pub mod use_cases;
pub mod validators;
