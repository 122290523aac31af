//! Fixed-code test accounts for non-production environments

use std::collections::HashSet;

use og_shared::identifier;
use og_shared::{Environment, TestAccountConfig};

/// Decides which identifiers receive a fixed code instead of a random one.
///
/// Built once from configuration and injected into the services that need it.
/// Always inert in production, whatever the configuration says.
#[derive(Debug, Clone, Default)]
pub struct TestAccountPolicy {
    code: Option<String>,
    identifiers: HashSet<String>,
}

impl TestAccountPolicy {
    pub fn new(config: &TestAccountConfig, environment: Environment) -> Self {
        if !config.enabled {
            return Self::disabled();
        }

        if environment.is_production() {
            tracing::error!(
                event = "test_accounts_in_production",
                "Test accounts are enabled in production configuration; ignoring them"
            );
            return Self::disabled();
        }

        if !config.allowed_environments.contains(&environment) {
            tracing::info!(
                environment = %environment,
                "Test accounts are not allowed in this environment"
            );
            return Self::disabled();
        }

        let identifiers = config
            .identifiers
            .iter()
            .filter_map(|raw| identifier::classify(raw).map(|(_, normalized)| normalized))
            .collect::<HashSet<_>>();

        tracing::warn!(
            environment = %environment,
            accounts = identifiers.len(),
            "Fixed-code test accounts are active"
        );

        Self {
            code: Some(config.code.clone()),
            identifiers,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.code.is_some()
    }

    /// Whether the normalized identifier is a test account
    pub fn is_test_account(&self, identifier: &str) -> bool {
        self.code.is_some() && self.identifiers.contains(identifier)
    }

    /// Fixed code for a test account, `None` for everyone else
    pub fn code_for(&self, identifier: &str) -> Option<&str> {
        if self.is_test_account(identifier) {
            self.code.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TestAccountConfig {
        TestAccountConfig {
            enabled: true,
            code: "1234".to_string(),
            identifiers: vec!["ABC@gmail.com".to_string(), "123-456-7899".to_string()],
            allowed_environments: vec![Environment::Development, Environment::Staging],
        }
    }

    #[test]
    fn test_identifiers_are_normalized() {
        let policy = TestAccountPolicy::new(&config(), Environment::Development);
        assert_eq!(policy.code_for("abc@gmail.com"), Some("1234"));
        assert_eq!(policy.code_for("1234567899"), Some("1234"));
        assert_eq!(policy.code_for("someone@else.com"), None);
    }

    #[test]
    fn test_inert_in_production() {
        let mut cfg = config();
        cfg.allowed_environments.push(Environment::Production);
        let policy = TestAccountPolicy::new(&cfg, Environment::Production);
        assert!(!policy.is_active());
        assert_eq!(policy.code_for("abc@gmail.com"), None);
    }

    #[test]
    fn test_respects_allowed_environments_and_switch() {
        let mut cfg = config();
        cfg.allowed_environments = vec![Environment::Development];
        assert!(!TestAccountPolicy::new(&cfg, Environment::Staging).is_active());

        let mut off = config();
        off.enabled = false;
        assert!(!TestAccountPolicy::new(&off, Environment::Development).is_active());
    }
}
