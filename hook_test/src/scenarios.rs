mod fingerprint;
mod install;
mod probe;
mod scan;

use crate::test_ctx::env_flag;

pub fn run_all() {
    run("fingerprint-hit", fingerprint::scenario_fingerprint_hit);
    run("signature-text", fingerprint::scenario_signature_text);
    run("resolve-overloads", fingerprint::scenario_resolve_overloads);
    run("custom-token-match", fingerprint::scenario_custom_token_match);
    run("match-pool", fingerprint::scenario_match_pool);
    run("scan-numbered", scan::scenario_scan_numbered_panels);
    run("scan-ambiguous", scan::scenario_scan_skips_ambiguous);
    run("scan-letter", scan::scenario_scan_letter_suffix);
    run("scan-predicate", scan::scenario_scan_predicate);
    run("scan-probe-limit", scan::scenario_scan_probe_limit);
    run("scan-reentrant", scan::scenario_scan_reentrant_rejected);
    run("scan-invalid", scan::scenario_scan_invalid_request);
    run("dispatch-kinds", install::scenario_dispatch_kinds);
    run("stacked-intercepts", install::scenario_stacked_intercepts);
    run("invalid-hook-spec", install::scenario_invalid_hook_spec);
    run("idempotent", install::scenario_idempotent_install);
    run("host-failure", install::scenario_host_failure);
    run("bulk", install::scenario_bulk_install);
    run("records-dump", install::scenario_records_dump);
    run("hit-any", probe::scenario_hit_any);
    run("find-component", probe::scenario_find_component);
    run("concurrent-install", install::scenario_concurrent_install);
    if env_flag("HOOK_TEST_STRESS") {
        run("concurrent-install-stress", || {
            for _ in 0..64 {
                install::scenario_concurrent_install();
            }
        });
    }
}

fn run(name: &str, scenario: impl Fn()) {
    println!("scenario: {name}");
    scenario();
}
