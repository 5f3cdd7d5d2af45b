// 结构匹配：签名池首次适配消耗，以及类特征与目标方法的判定
use crate::api::{
    ClassFingerprint, FieldDescriptor, FieldSignature, MatchResult, MethodDescriptor,
    MethodSignature, TokenMatchFn,
};
use crate::host::Reflection;

use super::super::rules::{field_matches, method_matches};
use super::super::state::SessionState;

// 候选成员按声明顺序，各自消耗池中第一条(下标最小)命中的签名
// 返回 (候选下标, 签名下标)，每个签名下标至多出现一次
// 首次适配而非最优二分匹配：当一个成员能同时命中多条签名时，可能消耗掉
// 另一个成员唯一能命中的签名，导致本可满足的组合判定失败
pub(crate) fn consume_first_fit<C, S, F>(candidates: &[C], specs: &[S], matches: F) -> Vec<(usize, usize)>
where
    F: Fn(&C, &S) -> bool,
{
    let mut pool: Vec<usize> = (0..specs.len()).collect();
    let mut consumed = Vec::with_capacity(specs.len());
    for (candidate_idx, candidate) in candidates.iter().enumerate() {
        if pool.is_empty() {
            break;
        }
        if let Some(pos) = pool
            .iter()
            .position(|&spec_idx| matches(candidate, &specs[spec_idx]))
        {
            consumed.push((candidate_idx, pool.remove(pos)));
        }
    }
    consumed
}

// 每条签名都被不同成员消耗时命中；空签名列表恒命中；成员数少于签名数直接失败
pub(crate) fn match_all<C, S, F>(candidates: &[C], specs: &[S], matches: F) -> bool
where
    F: Fn(&C, &S) -> bool,
{
    if specs.is_empty() {
        return true;
    }
    if candidates.len() < specs.len() {
        return false;
    }
    consume_first_fit(candidates, specs, matches).len() == specs.len()
}

pub(crate) fn methods_hit(
    methods: &[MethodDescriptor],
    signatures: &[MethodSignature],
    token_match: TokenMatchFn,
) -> bool {
    match_all(methods, signatures, |method, sig| {
        method_matches(method, sig, token_match)
    })
}

pub(crate) fn fields_hit(
    fields: &[FieldDescriptor],
    signatures: &[FieldSignature],
    token_match: TokenMatchFn,
) -> bool {
    match_all(fields, signatures, |field, sig| {
        field_matches(field, sig, token_match)
    })
}

// 两个维度互不依赖，均命中才算命中
pub(crate) fn fingerprint_hit(
    fingerprint: &ClassFingerprint,
    methods: &[MethodDescriptor],
    fields: &[FieldDescriptor],
    token_match: TokenMatchFn,
) -> bool {
    methods_hit(methods, &fingerprint.method_signatures, token_match)
        && fields_hit(fields, &fingerprint.field_signatures, token_match)
}

// 不消耗，收集全部命中 target 的方法
pub(crate) fn resolve_methods(
    methods: Vec<MethodDescriptor>,
    target: &MethodSignature,
    token_match: TokenMatchFn,
) -> MatchResult {
    MatchResult {
        methods: methods
            .into_iter()
            .filter(|method| method_matches(method, target, token_match))
            .collect(),
    }
}

// 空列表不触发反射查询
pub(crate) fn hit_class<R: Reflection>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    fingerprint: &ClassFingerprint,
) -> bool {
    if fingerprint.is_empty() {
        return true;
    }
    hit_class_by_methods(runtime, state, class, &fingerprint.method_signatures)
        && hit_class_by_fields(runtime, state, class, &fingerprint.field_signatures)
}

pub(crate) fn hit_class_by_methods<R: Reflection>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    signatures: &[MethodSignature],
) -> bool {
    if signatures.is_empty() {
        return true;
    }
    methods_hit(&runtime.declared_methods(class), signatures, state.token_match())
}

pub(crate) fn hit_class_by_fields<R: Reflection>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    signatures: &[FieldSignature],
) -> bool {
    if signatures.is_empty() {
        return true;
    }
    fields_hit(&runtime.declared_fields(class), signatures, state.token_match())
}

pub(crate) fn hit_method_param<R: Reflection>(
    runtime: &R,
    state: &SessionState,
    class: &R::Class,
    target: &MethodSignature,
) -> MatchResult {
    resolve_methods(runtime.declared_methods(class), target, state.token_match())
}
