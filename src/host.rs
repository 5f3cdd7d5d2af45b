// 宿主运行时接口：类加载、反射与 hook 注册均由宿主提供，本库只消费
use crate::api::{BulkTarget, FieldDescriptor, HookSpec, MemberRef, MethodDescriptor};
use crate::errno::Errno;

// 按全限定名加载类，不存在时返回 None
pub trait ClassLoader {
    type Class: Clone;

    fn load_class(&self, name: &str) -> Option<Self::Class>;
}

// 反射能力，产出中立的成员快照，不暴露宿主原生句柄
pub trait Reflection: ClassLoader {
    type Object: Clone;

    fn class_name(&self, class: &Self::Class) -> String;

    fn declared_methods(&self, class: &Self::Class) -> Vec<MethodDescriptor>;

    fn declared_fields(&self, class: &Self::Class) -> Vec<FieldDescriptor>;

    fn superclass(&self, class: &Self::Class) -> Option<Self::Class>;

    fn class_of(&self, object: &Self::Object) -> Self::Class;

    // 成员值为 null 时返回 None
    fn field_value(&self, object: &Self::Object, field: &FieldDescriptor) -> Option<Self::Object>;

    // 默认沿父类链按类名比较，宿主可替换为包含接口的判定
    fn is_assignable(&self, class: &Self::Class, target: &Self::Class) -> bool {
        let target_name = self.class_name(target);
        let mut current = Some(class.clone());
        while let Some(class) = current {
            if self.class_name(&class) == target_name {
                return true;
            }
            current = self.superclass(&class);
        }
        false
    }
}

// hook 注册，实际拦截机制与分发完全由宿主负责
pub trait HookBridge: Reflection {
    type Param;

    fn hook_member(
        &self,
        class: &Self::Class,
        member: &MemberRef,
        hook: &HookSpec<Self::Param>,
    ) -> Result<(), Errno>;

    // 返回实际 hook 的成员数
    fn hook_all(
        &self,
        class: &Self::Class,
        target: &BulkTarget,
        hook: &HookSpec<Self::Param>,
    ) -> Result<usize, Errno>;
}
