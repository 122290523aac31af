//! Mock implementations for testing the authentication service

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::domain::value_objects::Identifier;
use crate::services::auth::OtpDelivery;

/// Records the last code sent to each identifier
#[derive(Default)]
pub struct MockDelivery {
    pub sent: Mutex<HashMap<String, Vec<String>>>,
    pub should_fail: AtomicBool,
}

impl MockDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    pub fn last_code(&self, identifier: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .get(identifier)
            .and_then(|codes| codes.last().cloned())
    }

    pub fn send_count(&self, identifier: &str) -> usize {
        self.sent.lock().unwrap().get(identifier).map_or(0, Vec::len)
    }
}

#[async_trait]
impl OtpDelivery for MockDelivery {
    async fn send_code(
        &self,
        identifier: &Identifier,
        code: &str,
        _country_code: Option<&str>,
    ) -> Result<String, String> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err("provider unavailable".to_string());
        }
        self.sent
            .lock()
            .unwrap()
            .entry(identifier.as_str().to_string())
            .or_default()
            .push(code.to_string());
        Ok(format!("mock-msg-{}", uuid::Uuid::new_v4()))
    }
}
