// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
#![no_main]

use flowdeck::graph::FlowGraph;
use flowdeck::types::Flow;
use flowdeck::validate::validate_flow;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary editor payloads must never panic the validator
    if let Ok(flow) = serde_json::from_slice::<Flow>(data) {
        let report = validate_flow(&flow);
        let graph = FlowGraph::from_flow(flow);
        let _ = graph.execution_order();
        let _ = graph.to_dot();
        if report.is_valid() {
            assert!(graph.execution_order().is_ok());
        }
    }
});
