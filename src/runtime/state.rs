// 会话状态：配置、已安装成员集合与审计记录
// core 保护可变状态，install_mutex 串行化 "检查 -> 宿主注册 -> 登记" 流程
use crate::api::{Options, TokenMatchFn};
use crate::errno::Errno;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use super::record;

// Mutex poison 恢复扩展，避免持锁线程 panic 后引发连锁 panic
pub(crate) trait MutexPoisonRecover<T> {
    fn lock_or_poison(&self) -> MutexGuard<'_, T>;
}

impl<T> MutexPoisonRecover<T> for Mutex<T> {
    fn lock_or_poison(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// 已安装 hook 的唯一标识：类名 + 成员标签
// 成员标签形如 name(p1,p2)、<init>(p1) 或批量的 name(*)
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub(super) struct InstallKey {
    pub(super) class_name: String,
    pub(super) member: String,
}

impl InstallKey {
    pub(super) fn new(class_name: &str, member: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            member: member.to_string(),
        }
    }
}

// 同一 key 上已注册的配置 id，以及宿主最近一次报告的成员数
#[derive(Clone, Debug, Default)]
pub(super) struct InstalledHooks {
    pub(super) count: usize,
    pub(super) spec_ids: Vec<u64>,
}

// 审计记录的操作类型
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum RecordOp {
    Member,
    Bulk,
    Scan,
}

// 单条审计记录
#[derive(Clone, Debug)]
pub(super) struct RecordEntry {
    pub(super) op: RecordOp,
    pub(super) ts_ms: u64,
    pub(super) status_code: i32,
    pub(super) class_name: String,
    pub(super) member: String,
    pub(super) kinds: String,
}

pub(super) struct CoreState {
    pub(super) recordable: bool,
    pub(super) max_probes: Option<usize>,
    pub(super) token_match: TokenMatchFn,
    pub(super) installed: BTreeMap<InstallKey, InstalledHooks>,
    pub(super) records: VecDeque<RecordEntry>,
}

pub(crate) struct SessionState {
    core: Mutex<CoreState>,
    install_mutex: Mutex<()>,
}

impl SessionState {
    pub(crate) fn new(options: Options) -> Self {
        Self {
            core: Mutex::new(CoreState {
                recordable: options.recordable,
                max_probes: options.max_probes,
                token_match: options.token_match,
                installed: BTreeMap::new(),
                records: VecDeque::new(),
            }),
            install_mutex: Mutex::new(()),
        }
    }

    pub(super) fn token_match(&self) -> TokenMatchFn {
        self.core.lock_or_poison().token_match
    }

    pub(super) fn max_probes(&self) -> Option<usize> {
        self.core.lock_or_poison().max_probes
    }

    pub(crate) fn set_max_probes(&self, max_probes: Option<usize>) {
        self.core.lock_or_poison().max_probes = max_probes;
    }

    pub(crate) fn get_recordable(&self) -> bool {
        self.core.lock_or_poison().recordable
    }

    pub(crate) fn set_recordable(&self, recordable: bool) {
        self.core.lock_or_poison().recordable = recordable;
    }

    pub(super) fn install_guard(&self) -> MutexGuard<'_, ()> {
        self.install_mutex.lock_or_poison()
    }

    pub(super) fn installed_count(&self, key: &InstallKey) -> Option<usize> {
        self.core
            .lock_or_poison()
            .installed
            .get(key)
            .map(|hooks| hooks.count)
    }

    // 同一配置已注册过时返回记录的成员数
    pub(super) fn installed_with(&self, key: &InstallKey, spec_id: u64) -> Option<usize> {
        self.core
            .lock_or_poison()
            .installed
            .get(key)
            .filter(|hooks| hooks.spec_ids.contains(&spec_id))
            .map(|hooks| hooks.count)
    }

    pub(super) fn mark_installed(&self, key: InstallKey, spec_id: u64, count: usize) {
        let mut core = self.core.lock_or_poison();
        let hooks = core.installed.entry(key).or_default();
        hooks.count = count;
        hooks.spec_ids.push(spec_id);
    }

    pub(super) fn add_record(
        &self,
        op: RecordOp,
        status: Errno,
        class_name: &str,
        member: &str,
        kinds: &str,
    ) {
        let mut core = self.core.lock_or_poison();
        record::add_record(&mut core, op, status.as_i32(), class_name, member, kinds);
    }

    pub(crate) fn get_records(&self, item_flags: u32) -> Option<String> {
        record::get_records_text(&self.core.lock_or_poison(), item_flags)
    }

    // 先在锁内格式化，再在锁外写 fd
    pub(crate) fn dump_records(&self, fd: i32, item_flags: u32) -> Errno {
        let Some(text) = self.get_records(item_flags) else {
            return Errno::Ok;
        };
        match record::dump_records_text(fd, &text) {
            Ok(()) => Errno::Ok,
            Err(err) => err,
        }
    }
}
