//! Service layer
//!
//! - [`OtpService`]: challenge lifecycle and SMS dispatch
//! - [`TokenService`]: JWT issuance bound to server-side sessions
//! - [`AuthService`]: the account flows, composed from the other two
pub mod auth;
pub mod otp;
pub mod sms;
pub mod token;

pub use auth::{AuthResult, AuthService};
pub use otp::{OtpOutcome, OtpSent, OtpService};
pub use sms::{LogSmsSender, SmsSender, SnsSmsSender};
pub use token::TokenService;
