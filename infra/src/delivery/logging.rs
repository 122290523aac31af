//! Delivery adapter that writes codes to the structured log instead of an
//! email or SMS provider. Used in development and staging deployments.

use async_trait::async_trait;
use uuid::Uuid;

use og_core::domain::entities::IdentifierType;
use og_core::domain::value_objects::Identifier;
use og_core::services::OtpDelivery;

/// Logs each delivery. The code itself is only logged when `expose_codes` is set.
#[derive(Debug, Clone, Default)]
pub struct LoggingOtpDelivery {
    expose_codes: bool,
}

impl LoggingOtpDelivery {
    pub fn new(expose_codes: bool) -> Self {
        Self { expose_codes }
    }

    pub fn exposes_codes(&self) -> bool {
        self.expose_codes
    }
}

#[async_trait]
impl OtpDelivery for LoggingOtpDelivery {
    async fn send_code(
        &self,
        identifier: &Identifier,
        code: &str,
        country_code: Option<&str>,
    ) -> Result<String, String> {
        let message_id = format!("log-{}", Uuid::new_v4());
        let channel = match identifier.kind() {
            IdentifierType::Email => "email",
            IdentifierType::Mobile => "sms",
        };

        if self.expose_codes {
            tracing::info!(
                identifier = %identifier.masked(),
                channel,
                country_code = country_code.unwrap_or(""),
                code,
                message_id = %message_id,
                "OTP delivery (log only)"
            );
        } else {
            tracing::info!(
                identifier = %identifier.masked(),
                channel,
                message_id = %message_id,
                "OTP delivery (log only)"
            );
        }
        Ok(message_id)
    }
}
