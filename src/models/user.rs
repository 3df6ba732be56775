use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

/// Account status matching database user_status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "user_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    Active,
    Suspended,
    Blocked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Suspended => "SUSPENDED",
            UserStatus::Blocked => "BLOCKED",
        }
    }
}

/// KYC progress matching database kyc_status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "kyc_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum KycStatus {
    Pending,
    Verified,
    Rejected,
}

/// Account tier matching database user_tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "user_tier", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserTier {
    Basic,
    Premium,
}

impl UserTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserTier::Basic => "BASIC",
            UserTier::Premium => "PREMIUM",
        }
    }
}

/// User model - core identity entity
///
/// The phone number is the unique login key. The transaction-PIN hash is
/// stored on the preferences record, never here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub phone_number: String,
    pub email: Option<String>,
    pub name: String,
    pub status: UserStatus,
    pub kyc_status: KycStatus,
    pub tier: UserTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// Outward projection of a user. Built from [`User`], which never carries
/// credential material, so nothing has to be stripped here - the type system
/// keeps PIN hashes out of responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub phone_number: String,
    pub email: Option<String>,
    pub name: String,
    pub status: UserStatus,
    pub kyc_status: KycStatus,
    pub tier: UserTier,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            phone_number: user.phone_number,
            email: user.email,
            name: user.name,
            status: user.status,
            kyc_status: user.kyc_status,
            tier: user.tier,
            created_at: user.created_at,
        }
    }
}

/// Wallet type matching database wallet_type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "wallet_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum WalletType {
    Primary,
    Savings,
}

/// Wallet row created with the account. Balance is held in minor units
/// (paise) to avoid floating point.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub wallet_type: WalletType,
    pub vpa: String,
    pub balance_minor: i64,
    pub created_at: DateTime<Utc>,
}

/// Notification settings row created with the account
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub push_notifications: bool,
    pub transaction_alerts: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            push_notifications: true,
            transaction_alerts: true,
        }
    }
}

/// Fields required to open a new account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub phone_number: String,
    pub email: Option<String>,
    pub name: String,
    pub vpa: String,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "crate::validators::validate_phone_number_validator"))]
    pub phone_number: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(custom(function = "crate::validators::validate_pin_validator"))]
    pub pin: String,
    #[validate(custom(function = "crate::validators::validate_vpa_validator"))]
    pub vpa: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "crate::validators::validate_phone_number_validator"))]
    pub phone_number: String,
    #[validate(custom(function = "crate::validators::validate_pin_validator"))]
    pub pin: String,
    pub device_fingerprint: Option<String>,
}

/// PIN reset request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetPinRequest {
    #[validate(custom(function = "crate::validators::validate_pin_validator"))]
    pub current_pin: String,
    #[validate(custom(function = "crate::validators::validate_pin_validator"))]
    pub new_pin: String,
    #[validate(custom(function = "crate::validators::validate_pin_validator"))]
    pub confirm_pin: String,
}
