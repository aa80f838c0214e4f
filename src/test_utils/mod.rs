//! Test utilities.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - In-memory implementations of every port for mocking Postgres, Redis and HTTP
//! - Builders wiring use cases and a full `AppState` onto those mocks

mod account_mocks;
mod app_state_builder;
mod auth_mocks;
mod factories;
mod notification_mocks;

pub use account_mocks::*;
pub use app_state_builder::*;
pub use auth_mocks::*;
pub use factories::*;
pub use notification_mocks::*;
