//! Configuration for the authentication service

/// Configuration for the authentication service
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    /// Country code stored for new mobile users when the client sends none
    pub default_country_code: String,
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            default_country_code: "+91".to_string(),
        }
    }
}
