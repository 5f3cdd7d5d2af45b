// 按结构签名定位类与方法并安装 hook
// 用参数、返回值与成员变量的类型 token 代替精确名字，容忍混淆与版本漂移
// 类加载、反射与 hook 注册由宿主运行时通过 host 中的 trait 提供

// 公共 API 层：签名、类特征、hook 配置与会话入口
mod api;
// 错误码定义
mod errno;
// 宿主运行时接口：类加载、反射与 hook 注册
pub mod host;
// 日志输出，Android 上使用 logcat
mod log;
// 运行时：签名解析、结构匹配、候选扫描与安装登记
mod runtime;
// 版本信息
mod version;

pub use api::{
    BulkTarget, CONSTRUCTOR_NAME, ClassFingerprint, DEFAULT_MAX_PROBES, FieldDescriptor,
    FieldSignature, HookSpec, InterceptFn, InterceptKind, MatchResult, MemberDescriptor,
    MemberRef, MethodDescriptor, MethodSignature, Options, RECORD_ITEM_ALL,
    RECORD_ITEM_CLASS_NAME, RECORD_ITEM_ERRNO, RECORD_ITEM_KIND, RECORD_ITEM_MEMBER,
    RECORD_ITEM_OP, RECORD_ITEM_TIMESTAMP, ScanRequest, Signature, Suffix, TokenMatchFn, XHook,
    contains_token, get_debug, get_version, get_version_code, match_all, set_debug,
};
pub use errno::Errno as XHookErrno;
pub use host::{ClassLoader, HookBridge, Reflection};
