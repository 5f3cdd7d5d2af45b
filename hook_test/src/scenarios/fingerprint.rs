use xsig_hook::{
    ClassFingerprint, FieldDescriptor, FieldSignature, MemberDescriptor, MethodDescriptor,
    MethodSignature, Options, Signature, XHook, XHookErrno, contains_token, match_all,
};

use crate::test_ctx::{SimRuntime, ensure_ok};

pub fn scenario_fingerprint_hit() {
    let hook = XHook::new(SimRuntime::app(), Options::default());
    let fingerprint = ensure_ok(
        ClassFingerprint::from_text(&["(Bundle)void", "(int,String)boolean"], &["Handler"]),
        "fingerprint parse",
    );

    let panel0 = "com.app.ui.Panel0".to_string();
    let panel1 = "com.app.ui.Panel1".to_string();
    let panel2 = "com.app.ui.Panel2".to_string();
    assert!(!hook.hit_class(&panel0, &fingerprint), "Panel0 has no Handler");
    assert!(hook.hit_class(&panel1, &fingerprint), "Panel1 should hit");
    assert!(!hook.hit_class(&panel2, &fingerprint), "Panel2 lacks (int,String)");

    assert!(hook.hit_class_by_fields(&panel2, &[FieldSignature::new("Handler")]));
    assert!(hook.hit_class_by_methods(&panel0, &[]), "empty list is vacuous");
    let empty = ClassFingerprint::default();
    assert!(empty.is_empty());
    assert!(hook.hit_class(&panel0, &empty));
}

pub fn scenario_signature_text() {
    let sig: MethodSignature = ensure_ok("(int, String)void".parse(), "signature parse");
    assert_eq!(sig.params, vec!["int", " String"], "tokens kept verbatim");
    assert_eq!(sig.ret, "void");

    let empty = ensure_ok(MethodSignature::parse("()"), "empty signature");
    assert!(empty.params.is_empty() && empty.ret.is_empty());

    for bad in ["int)void", "(int", ""] {
        assert_eq!(
            MethodSignature::parse(bad),
            Err(XHookErrno::InvalidSignature),
            "{bad} should be rejected"
        );
    }
}

pub fn scenario_resolve_overloads() {
    let hook = XHook::new(SimRuntime::app(), Options::default());
    let panel2 = "com.app.ui.Panel2".to_string();
    let target = ensure_ok(MethodSignature::parse("(int)void"), "target parse");

    let missing = ensure_ok(MethodSignature::parse("(double)void"), "missing parse");
    assert!(hook.hit_method_param(&panel2, &missing).is_empty());

    let resolved = hook.hit_method_param(&panel2, &target);
    assert_eq!(resolved.methods.len(), 2, "b(int) and e(int) both match");
    assert_eq!(resolved.single().err(), Some(XHookErrno::AmbiguousMatch));

    let panel1 = "com.app.ui.Panel1".to_string();
    let single = hook.hit_method_param(&panel1, &target);
    assert_eq!(ensure_ok(single.single(), "single overload").name, "b");
}

fn exact_token(type_name: &str, token: &str) -> bool {
    type_name == token || type_name.rsplit('.').next() == Some(token)
}

pub fn scenario_custom_token_match() {
    let options = Options {
        token_match: exact_token,
        ..Options::default()
    };
    let hook = XHook::new(SimRuntime::app(), options);
    let util_b = "com.app.util.b".to_string();

    // 子串匹配下 byte 会命中 byte[]，精确匹配不会
    let loose = ensure_ok(MethodSignature::parse("(byte,int)String"), "loose parse");
    assert!(!hook.hit_class_by_methods(&util_b, &[loose.clone()]));
    let strict = ensure_ok(MethodSignature::parse("(byte[],int)String"), "strict parse");
    assert!(hook.hit_class_by_methods(&util_b, &[strict]));

    let method = MethodDescriptor::new("b", &["byte[]", "int"], "java.lang.String");
    let candidates = [MemberDescriptor::Method(method)];
    assert!(match_all(&candidates, &[Signature::Method(loose)], contains_token));
}

pub fn scenario_match_pool() {
    let candidates = [
        MemberDescriptor::Field(FieldDescriptor::new("a", "android.os.Handler")),
        MemberDescriptor::Field(FieldDescriptor::new("b", "android.os.Handler")),
        MemberDescriptor::Method(MethodDescriptor::new("c", &["int"], "void")),
    ];
    let handler = Signature::Field(FieldSignature::new("Handler"));
    let two = [handler.clone(), handler.clone()];
    let three = [handler.clone(), handler.clone(), handler];

    assert!(match_all(&candidates, &two, contains_token), "two handlers consumed");
    assert!(!match_all(&candidates, &three, contains_token), "only two handlers");
    assert!(match_all(&[], &[], contains_token), "empty specs always hit");
}
