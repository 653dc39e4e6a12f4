// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn decision_id_displays_as_raw_string() {
    let id = DecisionId::new("dec-1");
    assert_eq!(format!("{id}"), "dec-1");
}
