pub mod account;
pub mod notification;
pub mod token_kind;
