//! Delivery of issued codes to the user

use async_trait::async_trait;

use crate::domain::value_objects::Identifier;

/// Sends a plaintext code over email or SMS.
///
/// Implementations live outside the core. The OTP is already persisted when
/// this is called, so a delivery failure is recoverable through resend.
#[async_trait]
pub trait OtpDelivery: Send + Sync {
    /// Send `code` to `identifier`, returning a provider message id
    async fn send_code(
        &self,
        identifier: &Identifier,
        code: &str,
        country_code: Option<&str>,
    ) -> Result<String, String>;
}
