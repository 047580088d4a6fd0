//! Auth handlers and supporting modules.
//!
//! Login trades credentials for an HS256 session token; the reset flow
//! trades a mailed one-time link for a narrow password-change token. Raw
//! reset tokens are never stored, only their SHA-256 hash, and a new reset
//! request overwrites whatever token came before it.

pub(crate) mod login;
pub(crate) mod me;
pub(crate) mod password;
pub(crate) mod reset;
mod state;
pub(crate) mod storage;
pub(crate) mod token;
pub(crate) mod types;
pub(crate) mod utils;

pub use state::AuthConfig;
