use super::test_support::{FakeClass, FakeObject, FakeParam, FakeRuntime};
use crate::api::{
    ClassFingerprint, HookSpec, MemberRef, MethodSignature, Options, RECORD_ITEM_CLASS_NAME,
    RECORD_ITEM_ERRNO, RECORD_ITEM_OP, ScanRequest, XHook,
};
use crate::errno::Errno;
use std::rc::Rc;

fn session(runtime: FakeRuntime) -> XHook<FakeRuntime> {
    XHook::new(runtime, Options::default())
}

fn after_hook() -> HookSpec<FakeParam> {
    HookSpec::new().after(|param: &mut FakeParam| param.result = Some(1))
}

fn sig(text: &str) -> MethodSignature {
    MethodSignature::parse(text).unwrap()
}

fn panel(extra_method: Option<&str>) -> FakeClass {
    let class = FakeClass::default()
        .method("a", &["android.os.Bundle"], "void")
        .field("h", "android.os.Handler");
    match extra_method {
        Some(name) => class.method(name, &["int"], "void"),
        None => class,
    }
}

#[test]
fn scan_stops_at_first_hooked_class() {
    let runtime = FakeRuntime::default()
        .with_class("com.x.Panel0", FakeClass::default().method("a", &["long"], "void"))
        .with_class("com.x.Panel1", panel(Some("onValue")));
    let hook = session(runtime);
    let request = ScanRequest::new("com.x.Panel%d", 0, "(int)void")
        .unwrap()
        .with_fingerprint(ClassFingerprint::from_text(&["(Bundle)void"], &["Handler"]).unwrap());

    assert_eq!(hook.scan_and_hook(&request, |_| true, &after_hook()), Ok(true));
    assert_eq!(hook.runtime().loads(), vec!["com.x.Panel0", "com.x.Panel1"]);
    assert_eq!(
        hook.runtime().hooked(),
        vec![("com.x.Panel1".to_string(), "onValue(int)".to_string())]
    );
}

#[test]
fn absent_class_terminates_scan() {
    let runtime = FakeRuntime::default()
        .with_class("com.x.a", FakeClass::default())
        .with_class("com.x.c", panel(Some("z")));
    let hook = session(runtime);
    let request = ScanRequest::new("com.x.%c", 'a', "(int)void").unwrap();

    assert_eq!(hook.scan_and_hook(&request, |_| true, &after_hook()), Ok(false));
    // com.x.b 缺失，不会跳到 com.x.c
    assert_eq!(hook.runtime().loads(), vec!["com.x.a", "com.x.b"]);
    assert!(hook.runtime().hooked().is_empty());
}

#[test]
fn predicate_rejection_skips_to_next_suffix() {
    let runtime = FakeRuntime::default()
        .with_class("p.C1", panel(Some("x")))
        .with_class("p.C2", panel(Some("y")));
    let hook = session(runtime);
    let request = ScanRequest::new("p.C%d", 1, "(int)void").unwrap();

    let hooked = hook.scan_and_hook(&request, |class| class != "p.C1", &after_hook());
    assert_eq!(hooked, Ok(true));
    assert_eq!(
        hook.runtime().hooked(),
        vec![("p.C2".to_string(), "y(int)".to_string())]
    );
}

#[test]
fn unresolved_target_moves_on() {
    let runtime = FakeRuntime::default()
        .with_class("p.C0", panel(None))
        .with_class("p.C1", panel(Some("y")));
    let hook = session(runtime);
    let request = ScanRequest::new("p.C%d", 0, "(int)void").unwrap();

    assert_eq!(hook.scan_and_hook(&request, |_| true, &after_hook()), Ok(true));
    assert_eq!(hook.runtime().loads(), vec!["p.C0", "p.C1"]);
}

#[test]
fn probe_limit_bounds_scan() {
    let mut runtime = FakeRuntime::default();
    for idx in 0..10 {
        runtime = runtime.with_class(&format!("p.C{idx}"), FakeClass::default());
    }
    let hook = XHook::new(
        runtime,
        Options {
            max_probes: Some(3),
            ..Options::default()
        },
    );
    let request = ScanRequest::new("p.C%d", 0, "(int)void").unwrap();

    assert_eq!(hook.scan_and_hook(&request, |_| true, &after_hook()), Ok(false));
    assert_eq!(hook.runtime().loads().len(), 3);
    let records = hook.get_records(RECORD_ITEM_OP | RECORD_ITEM_ERRNO).unwrap();
    assert!(records.ends_with(&format!("SCAN,{},\n", Errno::ProbeLimit.as_i32())));
}

#[test]
fn scan_request_validates_inputs() {
    assert_eq!(
        ScanRequest::new("p.C%d", 0, "(int").map(|_| ()),
        Err(Errno::InvalidSignature)
    );
    assert_eq!(
        ScanRequest::new("p.C%c", 0, "()").map(|_| ()),
        Err(Errno::InvalidPattern)
    );
    assert_eq!(
        ScanRequest::new("p.C", 'a', "()").map(|_| ()),
        Err(Errno::InvalidPattern)
    );
    assert_eq!(
        ScanRequest::new("p.C%x", -1, "()").map(|_| ()),
        Err(Errno::InvalidPattern)
    );
    assert!(ScanRequest::new("p.C%d", -1, "()").is_ok());
}

#[test]
fn char_suffix_space_ends_scan() {
    let last = '\u{D7FE}';
    let runtime = FakeRuntime::default()
        .with_class(&format!("p.{last}"), FakeClass::default())
        .with_class("p.\u{D7FF}", FakeClass::default());
    let hook = session(runtime);
    let request = ScanRequest::new("p.%c", last, "(int)void").unwrap();

    assert_eq!(hook.scan_and_hook(&request, |_| true, &after_hook()), Ok(false));
    assert_eq!(hook.runtime().loads().len(), 2);
    let records = hook.get_records(RECORD_ITEM_OP | RECORD_ITEM_ERRNO).unwrap();
    assert!(records.ends_with(&format!("SCAN,{},\n", Errno::SuffixExhausted.as_i32())));
}

#[test]
fn int_suffix_overflow_ends_scan() {
    let runtime = FakeRuntime::default()
        .with_class(&format!("p.C{}", i64::MAX), FakeClass::default());
    let hook = session(runtime);
    let request = ScanRequest::new("p.C%d", i64::MAX, "(int)void").unwrap();

    assert_eq!(hook.scan_and_hook(&request, |_| true, &after_hook()), Ok(false));
    assert_eq!(hook.runtime().loads(), vec![format!("p.C{}", i64::MAX)]);
    let records = hook.get_records(RECORD_ITEM_OP | RECORD_ITEM_ERRNO).unwrap();
    assert!(records.ends_with(&format!("SCAN,{},\n", Errno::SuffixExhausted.as_i32())));
}

#[test]
fn ambiguous_overloads_install_nothing() {
    let runtime = FakeRuntime::default().with_class(
        "p.Two",
        FakeClass::default()
            .method("a", &["int"], "void")
            .method("b", &["int"], "void"),
    );
    let hook = session(runtime);
    let class = "p.Two".to_string();

    assert_eq!(hook.resolve_and_hook(&class, &sig("(int)void"), &after_hook()), Ok(false));
    assert!(hook.runtime().hooked().is_empty());
    let records = hook.get_records(RECORD_ITEM_ERRNO).unwrap();
    assert_eq!(records, format!("{},\n", Errno::AmbiguousMatch.as_i32()));
}

#[test]
fn no_match_installs_nothing() {
    let runtime = FakeRuntime::default().with_class("p.One", panel(None));
    let hook = session(runtime);
    let class = "p.One".to_string();

    assert!(hook.hit_method_param(&class, &sig("(int)void")).is_empty());
    assert_eq!(hook.resolve_and_hook(&class, &sig("(int)void"), &after_hook()), Ok(false));
    assert!(hook.runtime().hooked().is_empty());
}

#[test]
fn repeated_install_is_idempotent() {
    let runtime = FakeRuntime::default().with_class("p.One", panel(Some("x")));
    let hook = session(runtime);
    let class = "p.One".to_string();
    let target = sig("(int)void");
    let spec = after_hook();

    assert_eq!(hook.resolve_and_hook(&class, &target, &spec), Ok(true));
    assert_eq!(hook.resolve_and_hook(&class, &target, &spec.clone()), Ok(true));
    assert_eq!(hook.runtime().hooked().len(), 1);
    assert!(hook.is_installed(&class, &MemberRef::method("x", &["int"])));

    let records = hook.get_records(RECORD_ITEM_ERRNO).unwrap();
    assert_eq!(
        records,
        format!("{},\n{},\n", Errno::Ok.as_i32(), Errno::Dup.as_i32())
    );
}

#[test]
fn distinct_specs_on_one_member_all_reach_host() {
    let runtime = FakeRuntime::default().with_class("p.One", panel(Some("x")));
    let hook = session(runtime);
    let class = "p.One".to_string();
    let member = MemberRef::method("x", &["int"]);
    let before = HookSpec::new().before(|_: &mut FakeParam| {});
    let replace = HookSpec::new().replace(|param: &mut FakeParam| param.result = Some(0));

    assert_eq!(hook.hook_member(&class, &member, &before), Ok(()));
    assert_eq!(hook.hook_member(&class, &member, &replace), Ok(()));
    assert_eq!(hook.hook_member(&class, &member, &before), Ok(()));
    assert_eq!(hook.runtime().hooked().len(), 2);

    let records = hook.get_records(RECORD_ITEM_ERRNO).unwrap();
    assert_eq!(records, format!("0,\n0,\n{},\n", Errno::Dup.as_i32()));
}

#[test]
fn extended_spec_is_a_new_install() {
    let runtime = FakeRuntime::default().with_class(
        "p.View",
        FakeClass::default()
            .method("draw", &["int"], "void")
            .method("draw", &["long"], "void"),
    );
    let hook = session(runtime);
    let class = "p.View".to_string();
    let base = after_hook();
    let extended = base.clone().before(|_: &mut FakeParam| {});

    assert_eq!(hook.hook_all_methods(&class, "draw", &base), Ok(2));
    assert_eq!(hook.hook_all_methods(&class, "draw", &extended), Ok(2));
    assert_eq!(hook.hook_all_methods(&class, "draw", &extended.clone()), Ok(2));
    assert_eq!(hook.runtime().hooked().len(), 2);
}

#[test]
fn host_failure_reports_false_and_error() {
    let runtime = FakeRuntime {
        fail_hooks: true,
        ..FakeRuntime::default()
    }
    .with_class("p.One", panel(Some("x")));
    let hook = session(runtime);
    let class = "p.One".to_string();

    assert_eq!(hook.resolve_and_hook(&class, &sig("(int)void"), &after_hook()), Ok(false));
    assert_eq!(
        hook.hook_member(&class, &MemberRef::method("x", &["int"]), &after_hook()),
        Err(Errno::HookFailed)
    );
    assert!(!hook.is_installed(&class, &MemberRef::method("x", &["int"])));
}

#[test]
fn invalid_hook_spec_is_rejected() {
    let runtime = FakeRuntime::default().with_class("p.One", panel(Some("x")));
    let hook = session(runtime);
    let class = "p.One".to_string();
    let mixed = HookSpec::new()
        .before(|_: &mut FakeParam| {})
        .replace(|_: &mut FakeParam| {});

    assert_eq!(
        hook.resolve_and_hook(&class, &sig("(int)void"), &HookSpec::new()),
        Err(Errno::InvalidArg)
    );
    assert_eq!(
        hook.resolve_and_hook(&class, &sig("(int)void"), &mixed),
        Err(Errno::InvalidArg)
    );
}

#[test]
fn fingerprint_gates_hit_and_hook() {
    let runtime = FakeRuntime::default().with_class("p.One", panel(Some("x")));
    let hook = session(runtime);
    let class = "p.One".to_string();
    let wrong = ClassFingerprint::from_text(&[], &["Looper"]).unwrap();
    let right = ClassFingerprint::from_text(&["(Bundle)"], &["Handler"]).unwrap();

    assert!(!hook.hit_class(&class, &wrong));
    assert!(hook.hit_class(&class, &right));
    assert_eq!(
        hook.hit_and_hook_method(&class, &wrong, &sig("(int)void"), &after_hook()),
        Ok(false)
    );
    assert_eq!(
        hook.hit_and_hook_method(&class, &right, &sig("(int)void"), &after_hook()),
        Ok(true)
    );
}

#[test]
fn direct_and_bulk_hooks_bypass_resolution() {
    let runtime = FakeRuntime::default().with_class(
        "p.View",
        FakeClass::default()
            .method("<init>", &[], "void")
            .method("<init>", &["android.content.Context"], "void")
            .method("draw", &["int"], "void")
            .method("draw", &["long"], "void"),
    );
    let hook = session(runtime);
    let class = "p.View".to_string();
    let ctor = MemberRef::constructor(&["android.content.Context"]);
    let spec = after_hook();

    assert_eq!(hook.hook_member(&class, &ctor, &spec), Ok(()));
    assert_eq!(hook.hook_all_methods(&class, "draw", &spec), Ok(2));
    assert_eq!(hook.hook_all_constructors(&class, &spec), Ok(2));
    // 同一配置重复批量安装返回首次结果，不再调用宿主
    assert_eq!(hook.hook_all_methods(&class, "draw", &spec), Ok(2));
    assert_eq!(
        hook.runtime().hooked(),
        vec![
            ("p.View".to_string(), "<init>(android.content.Context)".to_string()),
            ("p.View".to_string(), "draw(*)".to_string()),
            ("p.View".to_string(), "<init>(*)".to_string()),
        ]
    );
}

#[test]
fn hit_any_is_predicate_gated() {
    let runtime = FakeRuntime::default()
        .with_class("p.Holder", FakeClass::default().field("a", "p.X").field("b", "p.Y").field("c", "p.X"))
        .with_class("p.X", FakeClass::default())
        .with_class("p.Y", FakeClass::default());
    let hook = session(runtime);
    let holder = FakeObject::with_fields(
        "p.Holder",
        &[
            ("a", FakeObject::new("p.X", 1)),
            ("b", FakeObject::new("p.Y", 2)),
            ("c", FakeObject::new("p.X", 3)),
        ],
    );

    let hit = hook.hit_any(&holder, &"p.X".to_string(), |value| value.tag == 3);
    assert_eq!(hit.map(|value| value.tag), Some(3));
    let first = hook.hit_any(&holder, &"p.X".to_string(), |_| true);
    assert_eq!(first.map(|value| value.tag), Some(1));
    assert!(hook.hit_any(&holder, &"p.Z".to_string(), |_| true).is_none());
}

#[test]
fn hit_any_follows_superclass_and_skips_null() {
    let runtime = FakeRuntime::default()
        .with_class("p.Holder", FakeClass::default().field("none", "p.Base").field("sub", "p.Base"))
        .with_class("p.Base", FakeClass::default())
        .with_class("p.Sub", FakeClass::default().extends("p.Base"));
    let hook = session(runtime);
    let holder = FakeObject::with_fields("p.Holder", &[("sub", FakeObject::new("p.Sub", 7))]);

    let hit = hook.hit_any(&holder, &"p.Base".to_string(), |_| true);
    assert_eq!(hit.map(|value| value.tag), Some(7));
}

#[test]
fn components_found_by_exact_type() {
    let runtime = FakeRuntime::default().with_class(
        "p.Holder",
        FakeClass::default()
            .field("a", "p.X")
            .field("b", "p.XY")
            .field("c", "p.X"),
    );
    let hook = session(runtime);
    let class = "p.Holder".to_string();
    let names: Vec<_> = hook
        .find_component_in_class(&class, "p.X")
        .into_iter()
        .map(|field| field.name)
        .collect();
    assert_eq!(names, vec!["a", "c"]);

    let holder = FakeObject::with_fields("p.Holder", &[("c", FakeObject::new("p.X", 9))]);
    let values = hook.find_component_in_object(&holder, "p.X");
    assert_eq!(values.len(), 1);
    assert!(Rc::ptr_eq(&values[0], &holder.fields["c"]));
}

#[test]
fn reentrant_install_from_predicate_is_rejected() {
    let runtime = FakeRuntime::default()
        .with_class("p.C0", panel(Some("x")))
        .with_class("p.One", panel(Some("x")));
    let hook = session(runtime);
    let request = ScanRequest::new("p.C%d", 0, "(int)void").unwrap();
    let inner = std::cell::Cell::new(None);

    let hooked = hook.scan_and_hook(
        &request,
        |_| {
            inner.set(Some(hook.resolve_and_hook(
                &"p.One".to_string(),
                &sig("(int)void"),
                &after_hook(),
            )));
            true
        },
        &after_hook(),
    );
    assert_eq!(hooked, Ok(true));
    assert_eq!(inner.get(), Some(Err(Errno::Reentrant)));
    assert_eq!(hook.runtime().hooked().len(), 1);
}

#[test]
fn records_can_be_disabled_and_dumped() {
    let runtime = FakeRuntime::default().with_class("p.One", panel(Some("x")));
    let hook = session(runtime);
    let class = "p.One".to_string();
    assert!(hook.get_recordable());

    hook.hook_member(&class, &MemberRef::method("x", &["int"]), &after_hook())
        .unwrap();
    let text = hook
        .get_records(RECORD_ITEM_OP | RECORD_ITEM_CLASS_NAME)
        .unwrap();
    assert_eq!(text, "HOOK,p.One,\n");
    assert_eq!(hook.dump_records(-1, RECORD_ITEM_OP), Errno::InvalidArg);

    hook.set_recordable(false);
    assert!(hook.get_records(RECORD_ITEM_OP).is_none());
    assert_eq!(hook.dump_records(-1, RECORD_ITEM_OP), Errno::Ok);
}

#[test]
fn hook_spec_dispatch_reports_presence() {
    let spec = HookSpec::new()
        .before(|param: &mut FakeParam| param.args[0] += 1)
        .after(|param: &mut FakeParam| param.result = Some(param.args[0] * 2));
    let mut param = FakeParam {
        args: vec![20],
        result: None,
    };
    assert!(spec.run_before(&mut param));
    assert!(!spec.run_replace(&mut param));
    assert!(spec.run_after(&mut param));
    assert_eq!(param.result, Some(42));
    assert_eq!(spec.validate(), Ok(()));
}
