//! Data models for identity, sessions, OTP challenges, and tokens
pub mod otp;
pub mod session;
pub mod token;
pub mod user;

pub use otp::{NewOtpChallenge, OtpChallenge, OtpPurpose, SendOtpRequest, VerifyOtpRequest};
pub use session::{NewSession, Session};
pub use token::{AccessClaims, RefreshClaims, TokenPair};
pub use user::{
    KycStatus, LoginRequest, NewAccount, NotificationSettings, RegisterRequest, ResetPinRequest,
    User, UserProfile, UserStatus, UserTier, Wallet, WalletType,
};
