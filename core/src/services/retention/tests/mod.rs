//! Tests for retention policy, pre-flight and scheduler

mod preflight_tests;
