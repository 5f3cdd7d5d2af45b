// hook 安装：按签名解析唯一目标方法、直接引用安装与批量安装
// 安装对宿主是全局且不可撤销的副作用，同一 (成员, 配置) 只向宿主注册一次
use crate::api::{BulkTarget, HookSpec, MemberRef, MethodSignature};
use crate::errno::Errno;
use crate::host::HookBridge;
use crate::log;

use super::super::callback_ctx;
use super::super::state::{InstallKey, RecordOp, SessionState};
use super::matcher;

fn kinds_label<P>(hook: &HookSpec<P>) -> String {
    hook.kinds()
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join("|")
}

// 宿主返回 Ok 码作为错误时归一为 HookFailed
fn normalize_host_err(err: Errno) -> Errno {
    if err.is_ok() { Errno::HookFailed } else { err }
}

// 恰好一个方法命中时安装并返回 true；零个或多个命中返回 false，不做猜测
pub(crate) fn resolve_and_hook<R: HookBridge>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    target: &MethodSignature,
    hook: &HookSpec<R::Param>,
) -> Result<bool, Errno> {
    hook.validate()?;
    let class_name = runtime.class_name(class);
    let resolved = matcher::hit_method_param(runtime, state, class, target);
    let method = match resolved.single() {
        Ok(method) => method,
        Err(err) => {
            log::debug(format_args!(
                "resolve {class_name} {target} status {:?} matched={}",
                err,
                resolved.methods.len()
            ));
            state.add_record(
                RecordOp::Member,
                err,
                &class_name,
                &target.to_string(),
                &kinds_label(hook),
            );
            return Ok(false);
        }
    };

    let member = MemberRef::from(method);
    match install_member(runtime, state, class, &class_name, &member, hook) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

pub(crate) fn hook_member<R: HookBridge>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    member: &MemberRef,
    hook: &HookSpec<R::Param>,
) -> Result<(), Errno> {
    hook.validate()?;
    let class_name = runtime.class_name(class);
    install_member(runtime, state, class, &class_name, member, hook)
}

// 检查 -> 宿主注册 -> 登记，整个过程持有 install_mutex
// 同一配置已装在该成员上时直接返回成功，记录 Dup，不再调用宿主
// 不同配置照常向宿主追加注册
fn install_member<R: HookBridge>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    class_name: &str,
    member: &MemberRef,
    hook: &HookSpec<R::Param>,
) -> Result<(), Errno> {
    let _install_guard = state.install_guard();
    let member_label = member.to_string();
    let kinds = kinds_label(hook);
    let key = InstallKey::new(class_name, &member_label);

    if state.installed_with(&key, hook.id()).is_some() {
        log::warn(format_args!("hook {class_name}.{member_label} already installed"));
        state.add_record(RecordOp::Member, Errno::Dup, class_name, &member_label, &kinds);
        return Ok(());
    }

    let result = callback_ctx::run_in_host_callback(|| runtime.hook_member(class, member, hook));
    match result {
        Ok(()) => {
            state.mark_installed(key, hook.id(), 1);
            state.add_record(RecordOp::Member, Errno::Ok, class_name, &member_label, &kinds);
            log::info(format_args!("hooked {class_name}.{member_label} [{kinds}]"));
            Ok(())
        }
        Err(err) => {
            let err = normalize_host_err(err);
            state.add_record(RecordOp::Member, err, class_name, &member_label, &kinds);
            log::error(format_args!(
                "hook {class_name}.{member_label} failed {:?}",
                err
            ));
            Err(err)
        }
    }
}

// 批量安装不经过签名解析，宿主返回实际 hook 的成员数
pub(crate) fn hook_all<R: HookBridge>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    target: &BulkTarget,
    hook: &HookSpec<R::Param>,
) -> Result<usize, Errno> {
    hook.validate()?;
    let _install_guard = state.install_guard();
    let class_name = runtime.class_name(class);
    let member_label = target.member_label();
    let kinds = kinds_label(hook);
    let key = InstallKey::new(&class_name, &member_label);

    if let Some(count) = state.installed_with(&key, hook.id()) {
        log::warn(format_args!("hook {class_name}.{member_label} already installed"));
        state.add_record(RecordOp::Bulk, Errno::Dup, &class_name, &member_label, &kinds);
        return Ok(count);
    }

    let result = callback_ctx::run_in_host_callback(|| runtime.hook_all(class, target, hook));
    match result {
        Ok(count) => {
            state.mark_installed(key, hook.id(), count);
            state.add_record(RecordOp::Bulk, Errno::Ok, &class_name, &member_label, &kinds);
            log::info(format_args!(
                "hooked {count} members {class_name}.{member_label} [{kinds}]"
            ));
            Ok(count)
        }
        Err(err) => {
            let err = normalize_host_err(err);
            state.add_record(RecordOp::Bulk, err, &class_name, &member_label, &kinds);
            log::error(format_args!(
                "hook {class_name}.{member_label} failed {:?}",
                err
            ));
            Err(err)
        }
    }
}

pub(crate) fn is_installed<R: HookBridge>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    member: &MemberRef,
) -> bool {
    let key = InstallKey::new(&runtime.class_name(class), &member.to_string());
    state.installed_count(&key).is_some()
}
