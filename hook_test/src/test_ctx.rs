use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use xsig_hook::{
    BulkTarget, ClassLoader, FieldDescriptor, HookBridge, HookSpec, MemberRef, MethodDescriptor,
    Reflection, XHookErrno,
};

pub static BEFORE_COUNT: AtomicUsize = AtomicUsize::new(0);
pub static AFTER_COUNT: AtomicUsize = AtomicUsize::new(0);
pub static REPLACE_COUNT: AtomicUsize = AtomicUsize::new(0);

// 模拟一个混淆后的应用：面板类按数字编号，工具类按字母编号
pub static APP_CLASSES: Lazy<BTreeMap<&'static str, SimClass>> = Lazy::new(|| {
    let mut classes = BTreeMap::new();
    classes.insert(
        "com.app.ui.Panel0",
        SimClass::default()
            .method("a", &["android.os.Bundle"], "void")
            .method("b", &["long"], "void")
            .field("c", "android.view.View"),
    );
    classes.insert(
        "com.app.ui.Panel1",
        SimClass::default()
            .method("a", &["android.os.Bundle"], "void")
            .method("b", &["int"], "void")
            .method("c", &["int", "java.lang.String"], "boolean")
            .field("d", "android.os.Handler"),
    );
    classes.insert(
        "com.app.ui.Panel2",
        SimClass::default()
            .method("a", &["android.os.Bundle"], "void")
            .method("b", &["int"], "void")
            .method("e", &["int"], "void")
            .field("d", "android.os.Handler"),
    );
    classes.insert(
        "com.app.util.a",
        SimClass::default().method("a", &["java.lang.String"], "int"),
    );
    classes.insert(
        "com.app.util.b",
        SimClass::default()
            .method("a", &["java.lang.String"], "int")
            .method("b", &["byte[]", "int"], "java.lang.String"),
    );
    classes.insert(
        "com.app.view.Widget",
        SimClass::default()
            .method("<init>", &[], "void")
            .method("<init>", &["android.content.Context"], "void")
            .method("draw", &["int"], "void")
            .method("draw", &["long"], "void")
            .method("draw", &["int", "int"], "void"),
    );
    classes.insert(
        "com.app.view.Holder",
        SimClass::default()
            .field("a", "com.app.view.Widget")
            .field("b", "com.app.view.Label")
            .field("c", "com.app.view.Widget")
            .field("d", "com.app.view.Widget"),
    );
    classes.insert("com.app.view.Label", SimClass::default());
    classes.insert(
        "com.app.view.FancyWidget",
        SimClass::default().extends("com.app.view.Widget"),
    );
    classes
});

// 宿主分发时传给拦截回调的调用上下文
#[derive(Debug, Default)]
pub struct SimCall {
    pub args: Vec<i64>,
    pub result: Option<i64>,
}

#[derive(Clone, Default)]
pub struct SimClass {
    pub superclass: Option<String>,
    pub methods: Vec<MethodDescriptor>,
    pub fields: Vec<FieldDescriptor>,
}

impl SimClass {
    pub fn method(mut self, name: &str, params: &[&str], ret: &str) -> Self {
        self.methods.push(MethodDescriptor::new(name, params, ret));
        self
    }

    pub fn field(mut self, name: &str, type_name: &str) -> Self {
        self.fields.push(FieldDescriptor::new(name, type_name));
        self
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }
}

#[derive(Debug)]
pub struct SimObject {
    pub class: String,
    pub tag: i32,
    pub fields: BTreeMap<String, Arc<SimObject>>,
}

impl SimObject {
    pub fn leaf(class: &str, tag: i32) -> Arc<Self> {
        Arc::new(Self {
            class: class.to_string(),
            tag,
            fields: BTreeMap::new(),
        })
    }

    pub fn holder(class: &str, fields: &[(&str, Arc<SimObject>)]) -> Arc<Self> {
        Arc::new(Self {
            class: class.to_string(),
            tag: 0,
            fields: fields
                .iter()
                .map(|(name, value)| (name.to_string(), Arc::clone(value)))
                .collect(),
        })
    }
}

struct InstalledHook {
    class_name: String,
    member: String,
    hook: HookSpec<SimCall>,
}

// 模拟宿主：类表、探测计数，以及按成员分发已注册的拦截
pub struct SimRuntime {
    classes: BTreeMap<String, SimClass>,
    probes: Mutex<Vec<String>>,
    registrations: AtomicUsize,
    installed: Mutex<Vec<InstalledHook>>,
    reject_hooks: bool,
}

impl SimRuntime {
    pub fn app() -> Self {
        Self {
            classes: APP_CLASSES
                .iter()
                .map(|(name, class)| (name.to_string(), class.clone()))
                .collect(),
            probes: Mutex::new(Vec::new()),
            registrations: AtomicUsize::new(0),
            installed: Mutex::new(Vec::new()),
            reject_hooks: false,
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject_hooks: true,
            ..Self::app()
        }
    }

    pub fn probes(&self) -> Vec<String> {
        self.probes.lock().expect("probes poisoned").clone()
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::Relaxed)
    }

    // 模拟一次被 hook 成员的调用：原方法返回参数之和
    // before 写入 result 时跳过原方法，replace 完全接管
    pub fn invoke(&self, class_name: &str, member: &MemberRef, args: &[i64]) -> i64 {
        let exact = member.to_string();
        let bulk = format!("{}(*)", member.name);
        let hooks: Vec<HookSpec<SimCall>> = self
            .installed
            .lock()
            .expect("installed poisoned")
            .iter()
            .filter(|entry| {
                entry.class_name == class_name && (entry.member == exact || entry.member == bulk)
            })
            .map(|entry| entry.hook.clone())
            .collect();

        let mut call = SimCall {
            args: args.to_vec(),
            result: None,
        };
        for hook in &hooks {
            hook.run_before(&mut call);
        }
        let replaced = hooks
            .iter()
            .filter(|hook| hook.is_replace())
            .any(|hook| hook.run_replace(&mut call));
        if !replaced && call.result.is_none() {
            call.result = Some(call.args.iter().sum());
        }
        for hook in &hooks {
            hook.run_after(&mut call);
        }
        call.result.unwrap_or_default()
    }

    fn register(&self, class_name: &str, member: String, hook: &HookSpec<SimCall>) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
        self.installed
            .lock()
            .expect("installed poisoned")
            .push(InstalledHook {
                class_name: class_name.to_string(),
                member,
                hook: hook.clone(),
            });
    }
}

impl ClassLoader for SimRuntime {
    type Class = String;

    fn load_class(&self, name: &str) -> Option<String> {
        self.probes
            .lock()
            .expect("probes poisoned")
            .push(name.to_string());
        self.classes.contains_key(name).then(|| name.to_string())
    }
}

impl Reflection for SimRuntime {
    type Object = Arc<SimObject>;

    fn class_name(&self, class: &String) -> String {
        class.clone()
    }

    fn declared_methods(&self, class: &String) -> Vec<MethodDescriptor> {
        self.classes
            .get(class)
            .map(|class| class.methods.clone())
            .unwrap_or_default()
    }

    fn declared_fields(&self, class: &String) -> Vec<FieldDescriptor> {
        self.classes
            .get(class)
            .map(|class| class.fields.clone())
            .unwrap_or_default()
    }

    fn superclass(&self, class: &String) -> Option<String> {
        self.classes.get(class).and_then(|class| class.superclass.clone())
    }

    fn class_of(&self, object: &Arc<SimObject>) -> String {
        object.class.clone()
    }

    fn field_value(&self, object: &Arc<SimObject>, field: &FieldDescriptor) -> Option<Arc<SimObject>> {
        object.fields.get(&field.name).cloned()
    }
}

impl HookBridge for SimRuntime {
    type Param = SimCall;

    fn hook_member(
        &self,
        class: &String,
        member: &MemberRef,
        hook: &HookSpec<SimCall>,
    ) -> Result<(), XHookErrno> {
        if self.reject_hooks {
            return Err(XHookErrno::HookFailed);
        }
        let declared = self.declared_methods(class).iter().any(|method| {
            method.name == member.name && method.param_types == member.param_types
        });
        if !declared {
            return Err(XHookErrno::NoMatch);
        }
        self.register(class, member.to_string(), hook);
        Ok(())
    }

    fn hook_all(
        &self,
        class: &String,
        target: &BulkTarget,
        hook: &HookSpec<SimCall>,
    ) -> Result<usize, XHookErrno> {
        if self.reject_hooks {
            return Err(XHookErrno::HookFailed);
        }
        let name = match target {
            BulkTarget::Methods(name) => name.as_str(),
            BulkTarget::Constructors => xsig_hook::CONSTRUCTOR_NAME,
        };
        let count = self
            .declared_methods(class)
            .iter()
            .filter(|method| method.name == name)
            .count();
        if count > 0 {
            self.register(class, format!("{name}(*)"), hook);
        }
        Ok(count)
    }
}

pub fn reset_counters() {
    BEFORE_COUNT.store(0, Ordering::Relaxed);
    AFTER_COUNT.store(0, Ordering::Relaxed);
    REPLACE_COUNT.store(0, Ordering::Relaxed);
}

pub fn counting_hook() -> HookSpec<SimCall> {
    HookSpec::new()
        .before(|_: &mut SimCall| {
            BEFORE_COUNT.fetch_add(1, Ordering::Relaxed);
        })
        .after(|_: &mut SimCall| {
            AFTER_COUNT.fetch_add(1, Ordering::Relaxed);
        })
}

pub fn ensure_ok<T>(result: Result<T, XHookErrno>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{what} failed: {err:?}"),
    }
}

pub fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}

pub fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
