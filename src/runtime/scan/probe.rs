// 实例内组件查找：按成员变量的类型定位没有稳定名字的内部对象
use crate::api::FieldDescriptor;
use crate::host::Reflection;

use super::super::callback_ctx;

// 按声明顺序遍历成员，跳过 null，返回第一个类型可赋值给 target 且满足 predicate 的值
pub(crate) fn hit_any<R, F>(
    runtime: &R,
    object: &R::Object,
    target: &R::Class,
    predicate: F,
) -> Option<R::Object>
where
    R: Reflection,
    F: Fn(&R::Object) -> bool,
{
    let class = runtime.class_of(object);
    for field in runtime.declared_fields(&class) {
        let Some(value) = runtime.field_value(object, &field) else {
            continue;
        };
        if !runtime.is_assignable(&runtime.class_of(&value), target) {
            continue;
        }
        if callback_ctx::run_in_host_callback(|| predicate(&value)) {
            return Some(value);
        }
    }
    None
}

// 声明类型名与 type_name 完全相等的成员
pub(crate) fn find_component_in_class<R: Reflection>(
    runtime: &R,
    class: &R::Class,
    type_name: &str,
) -> Vec<FieldDescriptor> {
    runtime
        .declared_fields(class)
        .into_iter()
        .filter(|field| field.type_name == type_name)
        .collect()
}

pub(crate) fn find_component_in_object<R: Reflection>(
    runtime: &R,
    object: &R::Object,
    type_name: &str,
) -> Vec<R::Object> {
    let class = runtime.class_of(object);
    find_component_in_class(runtime, &class, type_name)
        .iter()
        .filter_map(|field| runtime.field_value(object, field))
        .collect()
}
