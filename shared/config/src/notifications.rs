//! Notification transport configuration
//!
//! The chat bot token, chat id, and mail credentials used to live hard-coded
//! next to the delivery code; they belong here instead so they can be rotated
//! without a rebuild.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Configuration shared by every notification channel
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NotificationsConfig {
    pub chat: ChatConfig,
    pub mail: MailConfig,

    /// Total delivery attempts per channel before giving up silently
    #[validate(range(min = 1, max = 10))]
    pub retry_count: u32,

    /// Timeout applied to each individual transport call
    #[validate(range(min = 1, max = 60))]
    pub transport_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatConfig {
    #[validate(length(min = 1))]
    pub bot_token: String,

    #[validate(length(min = 1))]
    pub chat_id: String,

    /// Delay between retry attempts on this channel
    #[validate(range(min = 1, max = 60))]
    pub backoff_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MailConfig {
    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1, max = 65535))]
    pub port: u16,

    #[validate(length(min = 1))]
    pub user: String,

    #[validate(length(min = 1))]
    pub password: String,

    #[validate(length(min = 1))]
    pub sender: String,

    #[validate(length(min = 1))]
    pub recipient: String,

    #[validate(range(min = 1, max = 60))]
    pub backoff_seconds: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            chat: ChatConfig {
                bot_token: "changeme".to_string(),
                chat_id: "changeme".to_string(),
                backoff_seconds: 1,
            },
            mail: MailConfig {
                host: "smtp.example.com".to_string(),
                port: 587,
                user: "alerts@example.com".to_string(),
                password: "changeme".to_string(),
                sender: "alerts@example.com".to_string(),
                recipient: "fraud-team@example.com".to_string(),
                backoff_seconds: 2,
            },
            retry_count: 3,
            transport_timeout_seconds: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn default_config_validates() {
        assert!(NotificationsConfig::default().validate().is_ok());
    }

    #[test]
    fn chat_backoff_differs_from_mail_backoff_by_default() {
        let cfg = NotificationsConfig::default();
        assert_eq!(cfg.chat.backoff_seconds, 1);
        assert_eq!(cfg.mail.backoff_seconds, 2);
    }
}
