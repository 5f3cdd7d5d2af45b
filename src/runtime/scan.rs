// 候选类扫描核心：按模板逐个探测类名 -> 附加条件 -> 类特征 -> 解析并安装
use crate::api::{HookSpec, ScanRequest, Suffix};
use crate::errno::Errno;
use crate::host::HookBridge;
use crate::log;

use super::callback_ctx;
use super::pattern::next_suffix;
use super::state::{RecordOp, SessionState};

pub(crate) use apply::{hook_all, hook_member, is_installed, resolve_and_hook};
pub(crate) use matcher::{fingerprint_hit, match_all};
pub(crate) use matcher::{hit_class, hit_class_by_fields, hit_class_by_methods, hit_method_param};
pub(crate) use probe::{find_component_in_class, find_component_in_object, hit_any};

mod apply;
mod matcher;
mod probe;

// 单次扫描的终止原因
#[derive(Clone, Debug, Eq, PartialEq)]
enum ScanEnd {
    Hooked { class_name: String, probes: usize },
    Absent { class_name: String, probes: usize },
    ProbeLimit { probes: usize },
    Exhausted { probes: usize },
}

impl ScanEnd {
    fn status(&self) -> Errno {
        match self {
            Self::Hooked { .. } => Errno::Ok,
            Self::Absent { .. } => Errno::ClassNotFound,
            Self::ProbeLimit { .. } => Errno::ProbeLimit,
            Self::Exhausted { .. } => Errno::SuffixExhausted,
        }
    }
}

// 类不存在即终止向前搜索，不跳过；附加条件或特征不满足、解析失败时尝试下一个后缀
// 每次调用至多 hook 一个类，后缀单调递增，不会重复探测同一名字
pub(super) fn scan_and_hook<R, F>(
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
    hook.validate()?;
    let end = scan_loop(runtime, state, request, &predicate, hook)?;
    let (class_name, probes) = match &end {
        ScanEnd::Hooked { class_name, probes } | ScanEnd::Absent { class_name, probes } => {
            (class_name.as_str(), *probes)
        }
        ScanEnd::ProbeLimit { probes } | ScanEnd::Exhausted { probes } => {
            (request.pattern(), *probes)
        }
    };
    let status = end.status();
    log::debug(format_args!(
        "scan end pattern={} start={} class={} probes={} status={:?}",
        request.pattern(),
        request.start(),
        class_name,
        probes,
        status
    ));
    if matches!(end, ScanEnd::ProbeLimit { .. }) {
        log::warn(format_args!(
            "scan {} stopped after {probes} probes",
            request.pattern()
        ));
    }
    state.add_record(
        RecordOp::Scan,
        status,
        class_name,
        &request.target().to_string(),
        "",
    );
    Ok(matches!(end, ScanEnd::Hooked { .. }))
}

fn scan_loop<R, F>(
    runtime: &R,
    state: &SessionState,
    request: &ScanRequest,
    predicate: &F,
    hook: &HookSpec<R::Param>,
) -> Result<ScanEnd, Errno>
where
    R: HookBridge,
    F: Fn(&R::Class) -> bool,
{
    let max_probes = state.max_probes();
    let mut probes = 0usize;
    let mut suffix: Option<Suffix> = Some(request.start());

    while let Some(current) = suffix {
        if max_probes.is_some_and(|limit| probes >= limit) {
            return Ok(ScanEnd::ProbeLimit { probes });
        }
        probes += 1;
        suffix = next_suffix(current);

        let class_name = request.name_for(current);
        let loaded = callback_ctx::run_in_host_callback(|| runtime.load_class(&class_name));
        let Some(class) = loaded else {
            return Ok(ScanEnd::Absent { class_name, probes });
        };

        if !callback_ctx::run_in_host_callback(|| predicate(&class)) {
            log::debug(format_args!("scan {class_name} rejected by predicate"));
            continue;
        }
        if !hit_class(runtime, state, &class, request.fingerprint()) {
            log::debug(format_args!("scan {class_name} fingerprint miss"));
            continue;
        }
        if resolve_and_hook(runtime, state, &class, request.target(), hook)? {
            return Ok(ScanEnd::Hooked { class_name, probes });
        }
    }
    Ok(ScanEnd::Exhausted { probes })
}
