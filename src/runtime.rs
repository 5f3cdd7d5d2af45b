// runtime 模块入口，将内部子模块的功能统一暴露为 crate 级接口
// 所有会安装 hook 的入口先检查是否处于宿主回调中
use crate::api::{
    BulkTarget, ClassFingerprint, FieldDescriptor, FieldSignature, HookSpec, MatchResult,
    MemberRef, MethodSignature, ScanRequest,
};
use crate::errno::Errno;
use crate::host::{HookBridge, Reflection};
use crate::log;

mod callback_ctx;
mod pattern;
mod record;
mod rules;
mod scan;
mod state;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

pub(crate) use pattern::NamePattern;
pub(crate) use rules::{field_matches, method_matches, parse_method_signature};
pub(crate) use scan::{fingerprint_hit, match_all};
pub(crate) use state::SessionState;

pub(crate) fn hit_class<R: Reflection>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    fingerprint: &ClassFingerprint,
) -> bool {
    scan::hit_class(runtime, state, class, fingerprint)
}

pub(crate) fn hit_class_by_methods<R: Reflection>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    signatures: &[MethodSignature],
) -> bool {
    scan::hit_class_by_methods(runtime, state, class, signatures)
}

pub(crate) fn hit_class_by_fields<R: Reflection>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    signatures: &[FieldSignature],
) -> bool {
    scan::hit_class_by_fields(runtime, state, class, signatures)
}

pub(crate) fn hit_method_param<R: Reflection>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    target: &MethodSignature,
) -> MatchResult {
    scan::hit_method_param(runtime, state, class, target)
}

pub(crate) fn resolve_and_hook<R: HookBridge>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    target: &MethodSignature,
    hook: &HookSpec<R::Param>,
) -> Result<bool, Errno> {
    callback_ctx::reject_reentrant()?;
    scan::resolve_and_hook(runtime, state, class, target, hook)
}

pub(crate) fn hit_and_hook_method<R: HookBridge>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    fingerprint: &ClassFingerprint,
    target: &MethodSignature,
    hook: &HookSpec<R::Param>,
) -> Result<bool, Errno> {
    callback_ctx::reject_reentrant()?;
    hook.validate()?;
    if !scan::hit_class(runtime, state, class, fingerprint) {
        log::debug(format_args!(
            "{} fingerprint miss",
            runtime.class_name(class)
        ));
        return Ok(false);
    }
    scan::resolve_and_hook(runtime, state, class, target, hook)
}

pub(crate) fn scan_and_hook<R, F>(
    runtime: &R,
    state: &SessionState,
    request: &ScanRequest,
    predicate: F,
    hook: &HookSpec<R::Param>,
) -> Result<bool, Errno>
where
    R: HookBridge,
    F: Fn(&R::Class) -> bool,
{
    callback_ctx::reject_reentrant()?;
    scan::scan_and_hook(runtime, state, request, predicate, hook)
}

pub(crate) fn hook_member<R: HookBridge>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    member: &MemberRef,
    hook: &HookSpec<R::Param>,
) -> Result<(), Errno> {
    callback_ctx::reject_reentrant()?;
    scan::hook_member(runtime, state, class, member, hook)
}

pub(crate) fn hook_all<R: HookBridge>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    target: &BulkTarget,
    hook: &HookSpec<R::Param>,
) -> Result<usize, Errno> {
    callback_ctx::reject_reentrant()?;
    scan::hook_all(runtime, state, class, target, hook)
}

pub(crate) fn is_installed<R: HookBridge>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    member: &MemberRef,
) -> bool {
    scan::is_installed(runtime, state, class, member)
}

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
    scan::hit_any(runtime, object, target, predicate)
}

pub(crate) fn find_component_in_class<R: Reflection>(
    runtime: &R,
    class: &R::Class,
    type_name: &str,
) -> Vec<FieldDescriptor> {
    scan::find_component_in_class(runtime, class, type_name)
}

pub(crate) fn find_component_in_object<R: Reflection>(
    runtime: &R,
    object: &R::Object,
    type_name: &str,
) -> Vec<R::Object> {
    scan::find_component_in_object(runtime, object, type_name)
}
