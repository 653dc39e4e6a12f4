// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn ordering_matches_spec() {
    assert!(Severity::Warning < Severity::Low);
    assert!(Severity::Low < Severity::Medium);
    assert!(Severity::Medium < Severity::High);
    assert!(Severity::High < Severity::Critical);
}

#[test]
fn is_at_least_high() {
    assert!(!Severity::Medium.is_at_least_high());
    assert!(Severity::High.is_at_least_high());
    assert!(Severity::Critical.is_at_least_high());
}
