//! Authentication Core Library
//!
//! Phone-number identity with transaction-PIN login for a payments backend:
//! OTP verification over SMS, JWT access/refresh pairs bound to server-side
//! sessions, and session-validated profile access.
//!
//! ## Modules
//!
//! - `config`: Environment-driven settings
//! - `db`: Store traits plus Postgres and in-memory implementations
//! - `error`: Error types
//! - `models`: Data models and request types
//! - `security`: PIN hashing and OTP code generation
//! - `services`: Business logic (auth, otp, token, sms)
//! - `telemetry`: Structured logging setup
//! - `validators`: Input validation
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod security;
pub mod services;
pub mod telemetry;
pub mod validators;

// Re-export commonly used types
pub use error::{AuthError, ErrorKind, Result};
pub use services::{AuthResult, AuthService, OtpService, TokenService};
