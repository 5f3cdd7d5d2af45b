// 签名匹配与 hook 操作错误码，0 表示成功
#[repr(i32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Errno {
    Ok = 0,               // 成功
    InvalidArg = 1,       // 参数无效
    InvalidSignature = 2, // 签名文本格式错误
    InvalidPattern = 3,   // 类名模板格式错误
    ClassNotFound = 4,    // 类不存在
    NoMatch = 5,          // 没有成员命中签名
    AmbiguousMatch = 6,   // 多个成员命中签名
    HookFailed = 7,       // 宿主 hook 注册失败
    Dup = 8,              // 重复安装
    ProbeLimit = 9,       // 探测次数达到上限
    SuffixExhausted = 10, // 后缀空间耗尽
    Reentrant = 11,       // 在外部回调中调用，拒绝执行
    Unknown = 1001,       // 未知错误
}

impl Errno {
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<Errno> for i32 {
    fn from(value: Errno) -> Self {
        value as i32
    }
}
