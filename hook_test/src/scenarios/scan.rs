use xsig_hook::{
    ClassFingerprint, MemberRef, Options, RECORD_ITEM_ERRNO, RECORD_ITEM_OP, ScanRequest, XHook,
    XHookErrno,
};

use crate::test_ctx::{
    AFTER_COUNT, BEFORE_COUNT, SimRuntime, counting_hook, ensure_ok, reset_counters,
};
use std::sync::atomic::Ordering;

pub fn scenario_scan_numbered_panels() {
    reset_counters();
    let hook = XHook::new(SimRuntime::app(), Options::default());
    let fingerprint = ensure_ok(
        ClassFingerprint::from_text(&["(Bundle)void"], &["Handler"]),
        "fingerprint parse",
    );
    let request = ensure_ok(
        ScanRequest::new("com.app.ui.Panel%d", 0, "(int)void"),
        "scan request",
    )
    .with_fingerprint(fingerprint);

    let hooked = ensure_ok(
        hook.scan_and_hook(&request, |_| true, &counting_hook()),
        "scan panels",
    );
    assert!(hooked, "Panel1 should be hooked");
    assert_eq!(
        hook.runtime().probes(),
        vec!["com.app.ui.Panel0", "com.app.ui.Panel1"],
        "scan must stop at first hooked class"
    );

    let member = MemberRef::method("b", &["int"]);
    assert!(hook.is_installed(&"com.app.ui.Panel1".to_string(), &member));
    assert_eq!(hook.runtime().invoke("com.app.ui.Panel1", &member, &[5]), 5);
    assert_eq!(BEFORE_COUNT.load(Ordering::Relaxed), 1);
    assert_eq!(AFTER_COUNT.load(Ordering::Relaxed), 1);
}

pub fn scenario_scan_skips_ambiguous() {
    let hook = XHook::new(SimRuntime::app(), Options::default());
    let request = ensure_ok(
        ScanRequest::new("com.app.ui.Panel%d", 2, "(int)void"),
        "scan request",
    );

    let hooked = ensure_ok(
        hook.scan_and_hook(&request, |_| true, &counting_hook()),
        "scan ambiguous",
    );
    assert!(!hooked, "Panel2 has two (int)void overloads");
    assert_eq!(
        hook.runtime().probes(),
        vec!["com.app.ui.Panel2", "com.app.ui.Panel3"]
    );
    assert_eq!(hook.runtime().registrations(), 0);

    let records = hook
        .get_records(RECORD_ITEM_OP | RECORD_ITEM_ERRNO)
        .expect("records missing");
    assert_eq!(
        records,
        format!(
            "HOOK,{},\nSCAN,{},\n",
            XHookErrno::AmbiguousMatch.as_i32(),
            XHookErrno::ClassNotFound.as_i32()
        )
    );
}

pub fn scenario_scan_letter_suffix() {
    let hook = XHook::new(SimRuntime::app(), Options::default());
    let request = ensure_ok(
        ScanRequest::new("com.app.util.%c", 'a', "(byte[],int)String"),
        "scan request",
    );

    let hooked = ensure_ok(
        hook.scan_and_hook(&request, |_| true, &counting_hook()),
        "scan letters",
    );
    assert!(hooked);
    assert_eq!(
        hook.runtime().probes(),
        vec!["com.app.util.a", "com.app.util.b"]
    );
}

pub fn scenario_scan_predicate() {
    let hook = XHook::new(SimRuntime::app(), Options::default());
    let request = ensure_ok(
        ScanRequest::new("com.app.ui.Panel%d", 0, "(Bundle)void"),
        "scan request",
    );

    // 附加条件排除前两个类，最终 hook Panel2
    let hooked = ensure_ok(
        hook.scan_and_hook(
            &request,
            |class| class.as_str() == "com.app.ui.Panel2",
            &counting_hook(),
        ),
        "scan predicate",
    );
    assert!(hooked);
    assert!(hook.is_installed(
        &"com.app.ui.Panel2".to_string(),
        &MemberRef::method("a", &["android.os.Bundle"])
    ));
    assert!(!hook.is_installed(
        &"com.app.ui.Panel0".to_string(),
        &MemberRef::method("a", &["android.os.Bundle"])
    ));
}

pub fn scenario_scan_probe_limit() {
    let hook = XHook::new(
        SimRuntime::app(),
        Options {
            max_probes: Some(1),
            ..Options::default()
        },
    );
    let request = ensure_ok(
        ScanRequest::new("com.app.ui.Panel%d", 0, "(int)void"),
        "scan request",
    );
    let hooked = ensure_ok(
        hook.scan_and_hook(&request, |_| true, &counting_hook()),
        "scan limited",
    );
    assert!(!hooked, "limit reached before Panel1");
    assert_eq!(hook.runtime().probes().len(), 1);

    hook.set_max_probes(None);
    let hooked = ensure_ok(
        hook.scan_and_hook(&request, |_| true, &counting_hook()),
        "scan unlimited",
    );
    assert!(hooked);
}

pub fn scenario_scan_reentrant_rejected() {
    let hook = XHook::new(SimRuntime::app(), Options::default());
    let request = ensure_ok(
        ScanRequest::new("com.app.util.%c", 'a', "(String)int"),
        "scan request",
    );

    let nested = std::cell::Cell::new(None);
    let hooked = ensure_ok(
        hook.scan_and_hook(
            &request,
            |_| {
                nested.set(Some(hook.scan_and_hook(&request, |_| true, &counting_hook())));
                true
            },
            &counting_hook(),
        ),
        "outer scan",
    );
    assert!(hooked);
    assert_eq!(nested.get(), Some(Err(XHookErrno::Reentrant)));
}

pub fn scenario_scan_invalid_request() {
    assert_eq!(
        ScanRequest::new("com.app.ui.Panel%d%d", 0, "()").err(),
        Some(XHookErrno::InvalidPattern)
    );
    assert_eq!(
        ScanRequest::new("com.app.util.%c", 1, "()").err(),
        Some(XHookErrno::InvalidPattern)
    );
    assert_eq!(
        ScanRequest::new("com.app.util.%c", 'a', "String").err(),
        Some(XHookErrno::InvalidSignature)
    );
    let padded = ensure_ok(ScanRequest::new("p.C%03d", 7, "()"), "padded pattern");
    assert_eq!(padded.name_for(padded.start()), "p.C007");
}
