//! Tests for the gated debug macro

use deeplinknow::dln_debug;

#[test]
fn test_dln_debug_expands_without_direct_tracing_import() {
    let enable_logs = true;
    let host = "deeplinknow.com";

    dln_debug!(enable_logs, host, "domain accepted");
    dln_debug!(false, count = 3, "never emitted");
}

