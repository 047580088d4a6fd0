//! API handlers for Loocate.
//!
//! Route handlers are grouped by concern: account registration, login and
//! session introspection, the password reset flow, and service health.

pub mod auth;
pub mod health;
pub mod root;
pub mod user_register;
