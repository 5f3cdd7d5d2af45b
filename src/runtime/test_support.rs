// 单元测试用的内存宿主：类表、对象图和 hook 注册日志
use crate::api::{BulkTarget, FieldDescriptor, HookSpec, MemberRef, MethodDescriptor};
use crate::errno::Errno;
use crate::host::{ClassLoader, HookBridge, Reflection};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Clone, Default)]
pub(crate) struct FakeClass {
    pub(crate) superclass: Option<String>,
    pub(crate) methods: Vec<MethodDescriptor>,
    pub(crate) fields: Vec<FieldDescriptor>,
}

impl FakeClass {
    pub(crate) fn method(mut self, name: &str, params: &[&str], ret: &str) -> Self {
        self.methods.push(MethodDescriptor::new(name, params, ret));
        self
    }

    pub(crate) fn field(mut self, name: &str, type_name: &str) -> Self {
        self.fields.push(FieldDescriptor::new(name, type_name));
        self
    }

    pub(crate) fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }
}

#[derive(Debug)]
pub(crate) struct FakeObject {
    pub(crate) class: String,
    pub(crate) tag: i32,
    pub(crate) fields: BTreeMap<String, Rc<FakeObject>>,
}

impl FakeObject {
    pub(crate) fn new(class: &str, tag: i32) -> Rc<Self> {
        Rc::new(Self {
            class: class.to_string(),
            tag,
            fields: BTreeMap::new(),
        })
    }

    pub(crate) fn with_fields(class: &str, fields: &[(&str, Rc<FakeObject>)]) -> Rc<Self> {
        Rc::new(Self {
            class: class.to_string(),
            tag: 0,
            fields: fields
                .iter()
                .map(|(name, value)| (name.to_string(), Rc::clone(value)))
                .collect(),
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeParam {
    pub(crate) args: Vec<i64>,
    pub(crate) result: Option<i64>,
}

#[derive(Default)]
pub(crate) struct FakeRuntime {
    pub(crate) classes: BTreeMap<String, FakeClass>,
    pub(crate) loads: RefCell<Vec<String>>,
    pub(crate) hooked: RefCell<Vec<(String, String)>>,
    pub(crate) fail_hooks: bool,
}

impl FakeRuntime {
    pub(crate) fn with_class(mut self, name: &str, class: FakeClass) -> Self {
        self.classes.insert(name.to_string(), class);
        self
    }

    pub(crate) fn loads(&self) -> Vec<String> {
        self.loads.borrow().clone()
    }

    pub(crate) fn hooked(&self) -> Vec<(String, String)> {
        self.hooked.borrow().clone()
    }
}

impl ClassLoader for FakeRuntime {
    type Class = String;

    fn load_class(&self, name: &str) -> Option<String> {
        self.loads.borrow_mut().push(name.to_string());
        self.classes.contains_key(name).then(|| name.to_string())
    }
}

impl Reflection for FakeRuntime {
    type Object = Rc<FakeObject>;

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

    fn class_of(&self, object: &Rc<FakeObject>) -> String {
        object.class.clone()
    }

    fn field_value(&self, object: &Rc<FakeObject>, field: &FieldDescriptor) -> Option<Rc<FakeObject>> {
        object.fields.get(&field.name).cloned()
    }
}

impl HookBridge for FakeRuntime {
    type Param = FakeParam;

    fn hook_member(
        &self,
        class: &String,
        member: &MemberRef,
        _hook: &HookSpec<FakeParam>,
    ) -> Result<(), Errno> {
        if self.fail_hooks {
            return Err(Errno::HookFailed);
        }
        self.hooked
            .borrow_mut()
            .push((class.clone(), member.to_string()));
        Ok(())
    }

    fn hook_all(
        &self,
        class: &String,
        target: &BulkTarget,
        _hook: &HookSpec<FakeParam>,
    ) -> Result<usize, Errno> {
        if self.fail_hooks {
            return Err(Errno::HookFailed);
        }
        let methods = self.declared_methods(class);
        let count = match target {
            BulkTarget::Methods(name) => methods.iter().filter(|m| &m.name == name).count(),
            BulkTarget::Constructors => methods.iter().filter(|m| m.name == "<init>").count(),
        };
        self.hooked
            .borrow_mut()
            .push((class.clone(), target.member_label()));
        Ok(count)
    }
}
