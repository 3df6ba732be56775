//! SMS delivery for OTP codes
//!
//! [`SnsSmsSender`] publishes transactional SMS through AWS SNS; the
//! [`LogSmsSender`] fallback writes the message to the log for local
//! development.
use crate::config::SmsSettings;
use crate::error::{AuthError, Result};
use async_trait::async_trait;
use aws_sdk_sns::Client as SnsClient;
use std::sync::Arc;
use tracing::{error, info, warn};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, phone_number: &str, message: &str) -> Result<()>;
}

/// Build the configured sender. The SNS client picks up credentials and
/// region from the standard AWS environment.
pub async fn sender_from_settings(settings: &SmsSettings) -> Arc<dyn SmsSender> {
    if settings.is_sns() {
        let aws_config =
            aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Arc::new(SnsSmsSender::new(
            SnsClient::new(&aws_config),
            settings.sender_id.clone(),
        ))
    } else {
        Arc::new(LogSmsSender)
    }
}

/// Mask phone number for logging
pub(crate) fn mask_phone(phone: &str) -> String {
    if phone.len() <= 4 {
        return "****".to_string();
    }
    let visible = &phone[phone.len() - 4..];
    format!("****{}", visible)
}

pub struct SnsSmsSender {
    client: SnsClient,
    sender_id: Option<String>,
}

impl SnsSmsSender {
    pub fn new(client: SnsClient, sender_id: Option<String>) -> Self {
        Self { client, sender_id }
    }
}

#[async_trait]
impl SmsSender for SnsSmsSender {
    async fn send(&self, phone_number: &str, message: &str) -> Result<()> {
        let mut publish = self
            .client
            .publish()
            .phone_number(phone_number)
            .message(message)
            .message_attributes(
                "AWS.SNS.SMS.SMSType",
                aws_sdk_sns::types::MessageAttributeValue::builder()
                    .data_type("String")
                    .string_value("Transactional")
                    .build()
                    .map_err(|e| {
                        AuthError::Internal(format!("Failed to build SMS attribute: {}", e))
                    })?,
            );
        if let Some(sender_id) = &self.sender_id {
            publish = publish.message_attributes(
                "AWS.SNS.SMS.SenderID",
                aws_sdk_sns::types::MessageAttributeValue::builder()
                    .data_type("String")
                    .string_value(sender_id)
                    .build()
                    .map_err(|e| {
                        AuthError::Internal(format!("Failed to build SMS attribute: {}", e))
                    })?,
            );
        }
        let result = publish.send().await;

        match result {
            Ok(output) => {
                info!(
                    phone = %mask_phone(phone_number),
                    message_id = ?output.message_id(),
                    "SMS sent successfully"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    phone = %mask_phone(phone_number),
                    error = %e,
                    "Failed to send SMS"
                );
                Err(AuthError::SmsDispatch(format!("Failed to send SMS: {}", e)))
            }
        }
    }
}

/// Development sender: writes the message to the log instead of dispatching
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send(&self, phone_number: &str, message: &str) -> Result<()> {
        warn!(
            phone = %mask_phone(phone_number),
            message = %message,
            "SMS provider not configured - message logged for development"
        );
        Ok(())
    }
}
