use std::io::{Read, Seek, SeekFrom};
use std::os::fd::AsRawFd;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Barrier};

use xsig_hook::{
    ClassFingerprint, HookSpec, MemberRef, MethodSignature, Options, RECORD_ITEM_ALL,
    RECORD_ITEM_ERRNO, RECORD_ITEM_KIND, RECORD_ITEM_OP, XHook, XHookErrno,
};

use crate::test_ctx::{
    AFTER_COUNT, BEFORE_COUNT, REPLACE_COUNT, SimCall, SimRuntime, counting_hook, ensure_ok,
    env_usize, reset_counters,
};

const WIDGET: &str = "com.app.view.Widget";

pub fn scenario_dispatch_kinds() {
    reset_counters();
    let hook = XHook::new(SimRuntime::app(), Options::default());
    let widget = WIDGET.to_string();
    let draw_int = MemberRef::method("draw", &["int"]);
    let draw_pair = MemberRef::method("draw", &["int", "int"]);

    // before 改参数，after 改返回值
    let around = HookSpec::new()
        .before(|call: &mut SimCall| {
            BEFORE_COUNT.fetch_add(1, Ordering::Relaxed);
            call.args[0] *= 10;
        })
        .after(|call: &mut SimCall| {
            AFTER_COUNT.fetch_add(1, Ordering::Relaxed);
            call.result = call.result.map(|value| value + 1);
        });
    ensure_ok(hook.hook_member(&widget, &draw_int, &around), "hook draw(int)");
    assert_eq!(hook.runtime().invoke(WIDGET, &draw_int, &[4]), 41);

    let replace = HookSpec::new().replace(|call: &mut SimCall| {
        REPLACE_COUNT.fetch_add(1, Ordering::Relaxed);
        call.result = Some(-1);
    });
    ensure_ok(hook.hook_member(&widget, &draw_pair, &replace), "hook draw(int,int)");
    assert_eq!(hook.runtime().invoke(WIDGET, &draw_pair, &[1, 2]), -1);

    // 未 hook 的重载走原方法
    let draw_long = MemberRef::method("draw", &["long"]);
    assert_eq!(hook.runtime().invoke(WIDGET, &draw_long, &[1]), 1);

    assert_eq!(BEFORE_COUNT.load(Ordering::Relaxed), 1);
    assert_eq!(AFTER_COUNT.load(Ordering::Relaxed), 1);
    assert_eq!(REPLACE_COUNT.load(Ordering::Relaxed), 1);

    let kinds = hook.get_records(RECORD_ITEM_KIND).expect("records missing");
    assert_eq!(kinds, "before|after,\nreplace,\n");
}

pub fn scenario_stacked_intercepts() {
    reset_counters();
    let hook = XHook::new(SimRuntime::app(), Options::default());
    let widget = WIDGET.to_string();
    let draw_int = MemberRef::method("draw", &["int"]);
    let counting = counting_hook();
    let doubling = HookSpec::new().after(|call: &mut SimCall| {
        call.result = call.result.map(|value| value * 2);
    });

    // 不同配置叠加在同一成员上，同一配置重复安装不再注册
    ensure_ok(hook.hook_member(&widget, &draw_int, &counting), "hook counting");
    ensure_ok(hook.hook_member(&widget, &draw_int, &doubling), "hook doubling");
    ensure_ok(hook.hook_member(&widget, &draw_int, &counting.clone()), "hook counting again");
    assert_eq!(hook.runtime().registrations(), 2);

    assert_eq!(hook.runtime().invoke(WIDGET, &draw_int, &[3]), 6);
    assert_eq!(BEFORE_COUNT.load(Ordering::Relaxed), 1);
    assert_eq!(AFTER_COUNT.load(Ordering::Relaxed), 1);

    let records = hook.get_records(RECORD_ITEM_ERRNO).expect("records missing");
    assert_eq!(records, format!("0,\n0,\n{},\n", XHookErrno::Dup.as_i32()));
}

pub fn scenario_invalid_hook_spec() {
    let hook = XHook::new(SimRuntime::app(), Options::default());
    let widget = WIDGET.to_string();
    let draw_int = MemberRef::method("draw", &["int"]);
    let mixed = counting_hook().replace(|_: &mut SimCall| {});

    assert_eq!(
        hook.hook_member(&widget, &draw_int, &HookSpec::new()),
        Err(XHookErrno::InvalidArg)
    );
    assert_eq!(
        hook.hook_member(&widget, &draw_int, &mixed),
        Err(XHookErrno::InvalidArg)
    );
    assert_eq!(hook.runtime().registrations(), 0);
}

pub fn scenario_idempotent_install() {
    let hook = XHook::new(SimRuntime::app(), Options::default());
    let panel1 = "com.app.ui.Panel1".to_string();
    let fingerprint = ensure_ok(
        ClassFingerprint::from_text(&[], &["Handler"]),
        "fingerprint parse",
    );
    let target = ensure_ok(MethodSignature::parse("(int)void"), "target parse");
    let spec = counting_hook();

    for round in 0..3 {
        let hooked = ensure_ok(
            hook.hit_and_hook_method(&panel1, &fingerprint, &target, &spec),
            "hit and hook",
        );
        assert!(hooked, "round {round} should report hooked");
    }
    assert_eq!(hook.runtime().registrations(), 1, "host saw repeated install");

    let records = hook
        .get_records(RECORD_ITEM_ERRNO)
        .expect("records missing");
    let dup = XHookErrno::Dup.as_i32();
    assert_eq!(records, format!("0,\n{dup},\n{dup},\n"));
}

pub fn scenario_host_failure() {
    let hook = XHook::new(SimRuntime::rejecting(), Options::default());
    let widget = WIDGET.to_string();
    let target = ensure_ok(MethodSignature::parse("(long)void"), "target parse");

    let hooked = ensure_ok(
        hook.resolve_and_hook(&widget, &target, &counting_hook()),
        "resolve with failing host",
    );
    assert!(!hooked);
    assert_eq!(
        hook.hook_all_methods(&widget, "draw", &counting_hook()),
        Err(XHookErrno::HookFailed)
    );
    assert!(!hook.is_installed(&widget, &MemberRef::method("draw", &["long"])));

    // 宿主拒绝未声明的成员
    let healthy = XHook::new(SimRuntime::app(), Options::default());
    assert_eq!(
        healthy.hook_member(&widget, &MemberRef::method("paint", &[]), &counting_hook()),
        Err(XHookErrno::NoMatch)
    );
}

pub fn scenario_bulk_install() {
    reset_counters();
    let hook = XHook::new(SimRuntime::app(), Options::default());
    let widget = WIDGET.to_string();
    let spec = counting_hook();

    assert_eq!(ensure_ok(hook.hook_all_methods(&widget, "draw", &spec), "draw"), 3);
    assert_eq!(ensure_ok(hook.hook_all_constructors(&widget, &spec), "ctors"), 2);
    assert_eq!(ensure_ok(hook.hook_all_methods(&widget, "draw", &spec), "dup"), 3);
    assert_eq!(ensure_ok(hook.hook_all_methods(&widget, "paint", &spec), "none"), 0);
    assert_eq!(hook.runtime().registrations(), 2);

    hook.runtime().invoke(WIDGET, &MemberRef::method("draw", &["long"]), &[1]);
    hook.runtime()
        .invoke(WIDGET, &MemberRef::constructor(&["android.content.Context"]), &[]);
    assert_eq!(BEFORE_COUNT.load(Ordering::Relaxed), 2);
    assert_eq!(AFTER_COUNT.load(Ordering::Relaxed), 2);
}

pub fn scenario_records_dump() {
    let hook = XHook::new(SimRuntime::app(), Options::default());
    let widget = WIDGET.to_string();
    ensure_ok(
        hook.hook_member(&widget, &MemberRef::method("draw", &["int"]), &counting_hook()),
        "hook draw",
    );
    ensure_ok(hook.hook_all_constructors(&widget, &counting_hook()), "hook ctors");

    let path = std::env::temp_dir().join(format!("xsig_hook_records_{}.csv", std::process::id()));
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .read(true)
        .write(true)
        .open(&path)
        .expect("open records file");
    assert_eq!(hook.dump_records(file.as_raw_fd(), RECORD_ITEM_ALL), XHookErrno::Ok);

    let mut dumped = String::new();
    file.seek(SeekFrom::Start(0)).expect("seek records file");
    file.read_to_string(&mut dumped).expect("read records file");
    let _ = std::fs::remove_file(&path);

    let lines: Vec<&str> = dumped.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(",HOOK,com.app.view.Widget,\"draw(int)\",before|after,0,"));
    assert!(lines[1].contains(",HOOK_ALL,com.app.view.Widget,\"<init>(*)\",before|after,0,"));

    hook.set_recordable(false);
    assert!(hook.get_records(RECORD_ITEM_OP).is_none());
    assert_eq!(hook.dump_records(-1, RECORD_ITEM_OP), XHookErrno::Ok);
}

pub fn scenario_concurrent_install() {
    let hook = Arc::new(XHook::new(SimRuntime::app(), Options::default()));
    let worker_count = env_usize("HOOK_TEST_CONCURRENT_WORKERS", 16);
    let target = ensure_ok(MethodSignature::parse("(Bundle)void"), "target parse");
    let spec = counting_hook();

    let barrier = Arc::new(Barrier::new(worker_count));
    let mut workers = Vec::with_capacity(worker_count);
    for idx in 0..worker_count {
        let hook = Arc::clone(&hook);
        let barrier = Arc::clone(&barrier);
        let target = target.clone();
        let spec = spec.clone();
        workers.push(std::thread::spawn(move || {
            let class = format!("com.app.ui.Panel{}", idx % 3);
            barrier.wait();
            hook.resolve_and_hook(&class, &target, &spec)
        }));
    }
    for worker in workers {
        let hooked = worker.join().expect("worker panicked");
        assert_eq!(hooked, Ok(true));
    }

    let expected = worker_count.min(3);
    assert_eq!(
        hook.runtime().registrations(),
        expected,
        "each class must be registered exactly once"
    );
}
