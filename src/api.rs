use crate::errno::Errno;
use crate::host::HookBridge;
use crate::runtime;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

// 类型 token 的判定函数：type_name 为真实类型全限定名，token 为签名片段
pub type TokenMatchFn = fn(type_name: &str, token: &str) -> bool;

// 默认判定：子串包含，容忍部分混淆/重命名的类型名
// 注意短 token 可能误命中多个类型
pub fn contains_token(type_name: &str, token: &str) -> bool {
    type_name.contains(token)
}

// 操作记录字段掩码
pub const RECORD_ITEM_ALL: u32 = 0x3F;
pub const RECORD_ITEM_TIMESTAMP: u32 = 1 << 0;
pub const RECORD_ITEM_OP: u32 = 1 << 1;
pub const RECORD_ITEM_CLASS_NAME: u32 = 1 << 2;
pub const RECORD_ITEM_MEMBER: u32 = 1 << 3;
pub const RECORD_ITEM_KIND: u32 = 1 << 4;
pub const RECORD_ITEM_ERRNO: u32 = 1 << 5;

pub const DEFAULT_MAX_PROBES: usize = 4096;

// 一次反射得到的方法快照
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MethodDescriptor {
    pub name: String,
    pub param_types: Vec<String>,
    pub return_type: String,
}

impl MethodDescriptor {
    pub fn new(name: &str, param_types: &[&str], return_type: &str) -> Self {
        Self {
            name: name.to_string(),
            param_types: param_types.iter().map(|param| param.to_string()).collect(),
            return_type: return_type.to_string(),
        }
    }
}

// 一次反射得到的成员变量快照
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub type_name: String,
}

impl FieldDescriptor {
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MemberDescriptor {
    Method(MethodDescriptor),
    Field(FieldDescriptor),
}

// 方法形状：有序参数 token 加返回值 token，文本形式 (t1,t2,...)ret
// 每个 token 用会话的 TokenMatchFn 与真实全限定类型名比较
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MethodSignature {
    pub params: Vec<String>,
    pub ret: String,
}

impl MethodSignature {
    pub fn parse(text: &str) -> Result<Self, Errno> {
        runtime::parse_method_signature(text)
    }
}

impl FromStr for MethodSignature {
    type Err = Errno;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.params.join(","), self.ret)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldSignature {
    pub type_token: String,
}

impl FieldSignature {
    pub fn new(type_token: &str) -> Self {
        Self {
            type_token: type_token.to_string(),
        }
    }
}

impl fmt::Display for FieldSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_token)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Signature {
    Method(MethodSignature),
    Field(FieldSignature),
}

impl Signature {
    // 方法签名只匹配方法，成员签名只匹配成员变量
    pub fn matches(&self, member: &MemberDescriptor, token_match: TokenMatchFn) -> bool {
        match (self, member) {
            (Self::Method(sig), MemberDescriptor::Method(method)) => {
                runtime::method_matches(method, sig, token_match)
            }
            (Self::Field(sig), MemberDescriptor::Field(field)) => {
                runtime::field_matches(field, sig, token_match)
            }
            _ => false,
        }
    }
}

// 检查 candidates 是否能让 specs 中每条签名各自消耗一个不同的成员
pub fn match_all(
    candidates: &[MemberDescriptor],
    specs: &[Signature],
    token_match: TokenMatchFn,
) -> bool {
    runtime::match_all(candidates, specs, |member, spec| spec.matches(member, token_match))
}

// 识别名字未知的类所用的结构特征，任一侧为空列表时该侧恒满足
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClassFingerprint {
    pub method_signatures: Vec<MethodSignature>,
    pub field_signatures: Vec<FieldSignature>,
}

impl ClassFingerprint {
    pub fn new(
        method_signatures: Vec<MethodSignature>,
        field_signatures: Vec<FieldSignature>,
    ) -> Self {
        Self {
            method_signatures,
            field_signatures,
        }
    }

    // 从签名文本构造，方法签名格式错误时返回 InvalidSignature
    pub fn from_text(methods: &[&str], fields: &[&str]) -> Result<Self, Errno> {
        let method_signatures = methods
            .iter()
            .map(|text| MethodSignature::parse(text))
            .collect::<Result<Vec<_>, _>>()?;
        let field_signatures = fields.iter().map(|text| FieldSignature::new(text)).collect();
        Ok(Self::new(method_signatures, field_signatures))
    }

    pub fn is_empty(&self) -> bool {
        self.method_signatures.is_empty() && self.field_signatures.is_empty()
    }

    pub fn hit(
        &self,
        methods: &[MethodDescriptor],
        fields: &[FieldDescriptor],
        token_match: TokenMatchFn,
    ) -> bool {
        runtime::fingerprint_hit(self, methods, fields, token_match)
    }
}

// 签名命中的全部方法，安装 hook 时要求恰好一个
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MatchResult {
    pub methods: Vec<MethodDescriptor>,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn single(&self) -> Result<&MethodDescriptor, Errno> {
        match self.methods.as_slice() {
            [] => Err(Errno::NoMatch),
            [method] => Ok(method),
            _ => Err(Errno::AmbiguousMatch),
        }
    }
}

// 已知成员的直接引用，构造函数的 name 固定为 <init>
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct MemberRef {
    pub name: String,
    pub param_types: Vec<String>,
    pub is_constructor: bool,
}

pub const CONSTRUCTOR_NAME: &str = "<init>";

impl MemberRef {
    pub fn method(name: &str, param_types: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            param_types: param_types.iter().map(|param| param.to_string()).collect(),
            is_constructor: false,
        }
    }

    pub fn constructor(param_types: &[&str]) -> Self {
        Self {
            name: CONSTRUCTOR_NAME.to_string(),
            param_types: param_types.iter().map(|param| param.to_string()).collect(),
            is_constructor: true,
        }
    }
}

impl From<&MethodDescriptor> for MemberRef {
    fn from(method: &MethodDescriptor) -> Self {
        Self {
            name: method.name.clone(),
            param_types: method.param_types.clone(),
            is_constructor: false,
        }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.param_types.join(","))
    }
}

// 批量 hook 目标：同名方法的全部重载，或全部构造函数
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BulkTarget {
    Methods(String),
    Constructors,
}

impl BulkTarget {
    pub(crate) fn member_label(&self) -> String {
        match self {
            Self::Methods(name) => format!("{name}(*)"),
            Self::Constructors => format!("{CONSTRUCTOR_NAME}(*)"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InterceptKind {
    Before,
    After,
    Replace,
}

impl InterceptKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Replace => "replace",
        }
    }
}

pub type InterceptFn<P> = Arc<dyn Fn(&mut P) + Send + Sync>;

// 交给宿主的拦截配置，replace 独占返回值，不能与 before/after 同时存在
// id 标识一份配置，clone 保留 id，builder 每次修改都会换新 id
pub struct HookSpec<P> {
    id: u64,
    before: Option<InterceptFn<P>>,
    after: Option<InterceptFn<P>>,
    replace: Option<InterceptFn<P>>,
}

static NEXT_SPEC_ID: AtomicU64 = AtomicU64::new(1);

fn next_spec_id() -> u64 {
    NEXT_SPEC_ID.fetch_add(1, Ordering::Relaxed)
}

impl<P> Default for HookSpec<P> {
    fn default() -> Self {
        Self {
            id: next_spec_id(),
            before: None,
            after: None,
            replace: None,
        }
    }
}

impl<P> Clone for HookSpec<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            before: self.before.clone(),
            after: self.after.clone(),
            replace: self.replace.clone(),
        }
    }
}

impl<P> fmt::Debug for HookSpec<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSpec")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl<P> HookSpec<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before<F>(mut self, operation: F) -> Self
    where
        F: Fn(&mut P) + Send + Sync + 'static,
    {
        self.id = next_spec_id();
        self.before = Some(Arc::new(operation));
        self
    }

    pub fn after<F>(mut self, operation: F) -> Self
    where
        F: Fn(&mut P) + Send + Sync + 'static,
    {
        self.id = next_spec_id();
        self.after = Some(Arc::new(operation));
        self
    }

    pub fn replace<F>(mut self, operation: F) -> Self
    where
        F: Fn(&mut P) + Send + Sync + 'static,
    {
        self.id = next_spec_id();
        self.replace = Some(Arc::new(operation));
        self
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub fn kinds(&self) -> Vec<InterceptKind> {
        let mut kinds = Vec::new();
        if self.before.is_some() {
            kinds.push(InterceptKind::Before);
        }
        if self.after.is_some() {
            kinds.push(InterceptKind::After);
        }
        if self.replace.is_some() {
            kinds.push(InterceptKind::Replace);
        }
        kinds
    }

    pub fn is_replace(&self) -> bool {
        self.replace.is_some()
    }

    // 空配置或 replace 与 before/after 混用均视为参数错误
    pub fn validate(&self) -> Result<(), Errno> {
        let has_around = self.before.is_some() || self.after.is_some();
        match (has_around, self.replace.is_some()) {
            (false, false) => Err(Errno::InvalidArg),
            (true, true) => Err(Errno::InvalidArg),
            _ => Ok(()),
        }
    }

    // 宿主分发入口，返回对应拦截是否存在
    pub fn run_before(&self, param: &mut P) -> bool {
        run_intercept(self.before.as_ref(), param)
    }

    pub fn run_after(&self, param: &mut P) -> bool {
        run_intercept(self.after.as_ref(), param)
    }

    pub fn run_replace(&self, param: &mut P) -> bool {
        run_intercept(self.replace.as_ref(), param)
    }
}

fn run_intercept<P>(intercept: Option<&InterceptFn<P>>, param: &mut P) -> bool {
    match intercept {
        Some(operation) => {
            operation(param);
            true
        }
        None => false,
    }
}

// 类名后缀：字符按码点 +1 递增，整数按 +1 递增
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Suffix {
    Char(char),
    Int(i64),
}

impl From<char> for Suffix {
    fn from(value: char) -> Self {
        Self::Char(value)
    }
}

impl From<i64> for Suffix {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Suffix {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(value) => write!(f, "'{value}'"),
            Self::Int(value) => write!(f, "{value}"),
        }
    }
}

// 一次候选扫描：类名模板、起始后缀、类特征与要 hook 的目标方法签名
#[derive(Clone, Debug)]
pub struct ScanRequest {
    pub(crate) pattern: runtime::NamePattern,
    pub(crate) start: Suffix,
    pub(crate) fingerprint: ClassFingerprint,
    pub(crate) target: MethodSignature,
}

impl ScanRequest {
    // 模板或签名格式错误在构造时即报告
    pub fn new(pattern: &str, start: impl Into<Suffix>, target: &str) -> Result<Self, Errno> {
        let pattern = runtime::NamePattern::parse(pattern)?;
        let start = start.into();
        if !pattern.accepts(start) {
            return Err(Errno::InvalidPattern);
        }
        Ok(Self {
            pattern,
            start,
            fingerprint: ClassFingerprint::default(),
            target: MethodSignature::parse(target)?,
        })
    }

    pub fn with_fingerprint(mut self, fingerprint: ClassFingerprint) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn start(&self) -> Suffix {
        self.start
    }

    pub fn fingerprint(&self) -> &ClassFingerprint {
        &self.fingerprint
    }

    pub fn target(&self) -> &MethodSignature {
        &self.target
    }

    pub fn name_for(&self, suffix: Suffix) -> String {
        self.pattern.render(suffix)
    }
}

// 会话配置
#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub debug: bool,
    pub recordable: bool,
    // None 表示不限制探测次数
    pub max_probes: Option<usize>,
    pub token_match: TokenMatchFn,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            debug: false,
            recordable: true,
            max_probes: Some(DEFAULT_MAX_PROBES),
            token_match: contains_token,
        }
    }
}

// 单个宿主运行时上的 hook 会话
// 记住已安装的 (成员, 配置)，同一配置重复安装是幂等的，并保留安装审计记录
pub struct XHook<R: HookBridge> {
    runtime: R,
    state: runtime::SessionState,
}

impl<R: HookBridge> XHook<R> {
    pub fn new(runtime: R, options: Options) -> Self {
        crate::log::set_debug_enabled(options.debug);
        Self {
            runtime,
            state: runtime::SessionState::new(options),
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn hit_class(&self, class: &R::Class, fingerprint: &ClassFingerprint) -> bool {
        runtime::hit_class(&self.runtime, &self.state, class, fingerprint)
    }

    pub fn hit_class_by_methods(&self, class: &R::Class, signatures: &[MethodSignature]) -> bool {
        runtime::hit_class_by_methods(&self.runtime, &self.state, class, signatures)
    }

    pub fn hit_class_by_fields(&self, class: &R::Class, signatures: &[FieldSignature]) -> bool {
        runtime::hit_class_by_fields(&self.runtime, &self.state, class, signatures)
    }

    pub fn hit_method_param(&self, class: &R::Class, target: &MethodSignature) -> MatchResult {
        runtime::hit_method_param(&self.runtime, &self.state, class, target)
    }

    // 在类中解析唯一命中 target 的方法并安装 hook
    pub fn resolve_and_hook(
        &self,
        class: &R::Class,
        target: &MethodSignature,
        hook: &HookSpec<R::Param>,
    ) -> Result<bool, Errno> {
        runtime::resolve_and_hook(&self.runtime, &self.state, class, target, hook)
    }

    // 先校验类特征，再解析并安装
    pub fn hit_and_hook_method(
        &self,
        class: &R::Class,
        fingerprint: &ClassFingerprint,
        target: &MethodSignature,
        hook: &HookSpec<R::Param>,
    ) -> Result<bool, Errno> {
        runtime::hit_and_hook_method(&self.runtime, &self.state, class, fingerprint, target, hook)
    }

    // 按模板探测名称不确定的类，hook 第一个命中的类后停止
    pub fn scan_and_hook<F>(
        &self,
        request: &ScanRequest,
        predicate: F,
        hook: &HookSpec<R::Param>,
    ) -> Result<bool, Errno>
    where
        F: Fn(&R::Class) -> bool,
    {
        runtime::scan_and_hook(&self.runtime, &self.state, request, predicate, hook)
    }

    pub fn hook_member(
        &self,
        class: &R::Class,
        member: &MemberRef,
        hook: &HookSpec<R::Param>,
    ) -> Result<(), Errno> {
        runtime::hook_member(&self.runtime, &self.state, class, member, hook)
    }

    // 返回宿主实际 hook 的成员数
    pub fn hook_all_methods(
        &self,
        class: &R::Class,
        name: &str,
        hook: &HookSpec<R::Param>,
    ) -> Result<usize, Errno> {
        let target = BulkTarget::Methods(name.to_string());
        runtime::hook_all(&self.runtime, &self.state, class, &target, hook)
    }

    pub fn hook_all_constructors(
        &self,
        class: &R::Class,
        hook: &HookSpec<R::Param>,
    ) -> Result<usize, Errno> {
        runtime::hook_all(&self.runtime, &self.state, class, &BulkTarget::Constructors, hook)
    }

    pub fn is_installed(&self, class: &R::Class, member: &MemberRef) -> bool {
        runtime::is_installed(&self.runtime, &self.state, class, member)
    }

    // 在对象成员中查找第一个类型可赋值给 target 且满足 predicate 的实例
    pub fn hit_any<F>(&self, object: &R::Object, target: &R::Class, predicate: F) -> Option<R::Object>
    where
        F: Fn(&R::Object) -> bool,
    {
        runtime::hit_any(&self.runtime, object, target, predicate)
    }

    pub fn find_component_in_class(&self, class: &R::Class, type_name: &str) -> Vec<FieldDescriptor> {
        runtime::find_component_in_class(&self.runtime, class, type_name)
    }

    pub fn find_component_in_object(&self, object: &R::Object, type_name: &str) -> Vec<R::Object> {
        runtime::find_component_in_object(&self.runtime, object, type_name)
    }

    pub fn get_recordable(&self) -> bool {
        self.state.get_recordable()
    }

    pub fn set_recordable(&self, recordable: bool) {
        self.state.set_recordable(recordable)
    }

    pub fn set_max_probes(&self, max_probes: Option<usize>) {
        self.state.set_max_probes(max_probes)
    }

    pub fn get_records(&self, item_flags: u32) -> Option<String> {
        self.state.get_records(item_flags)
    }

    pub fn dump_records(&self, fd: i32, item_flags: u32) -> Errno {
        self.state.dump_records(fd, item_flags)
    }
}

pub fn get_version() -> String {
    crate::version::version_str_full()
}

pub fn get_version_code() -> u32 {
    crate::version::version()
}

pub fn set_debug(debug: bool) {
    crate::log::set_debug_enabled(debug)
}

pub fn get_debug() -> bool {
    crate::log::debug_enabled()
}
