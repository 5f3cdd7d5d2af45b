// hook 安装审计记录的写入、格式化与导出
use crate::api::{
    RECORD_ITEM_CLASS_NAME, RECORD_ITEM_ERRNO, RECORD_ITEM_KIND, RECORD_ITEM_MEMBER,
    RECORD_ITEM_OP, RECORD_ITEM_TIMESTAMP,
};
use crate::errno::Errno;
use std::fmt::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use super::state::{CoreState, RecordEntry, RecordOp};

// 环形缓冲区上限，超出后淘汰最早的记录
const MAX_RECORDS: usize = 4096;

#[inline]
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

// recordable 关闭时静默丢弃，满时淘汰队首
pub(super) fn add_record(
    state: &mut CoreState,
    op: RecordOp,
    status_code: i32,
    class_name: &str,
    member: &str,
    kinds: &str,
) {
    if !state.recordable {
        return;
    }
    if state.records.len() >= MAX_RECORDS {
        state.records.pop_front();
    }
    state.records.push_back(RecordEntry {
        op,
        ts_ms: now_ms(),
        status_code,
        class_name: class_name.to_string(),
        member: member.to_string(),
        kinds: kinds.to_string(),
    });
}

fn op_name(op: RecordOp) -> &'static str {
    match op {
        RecordOp::Member => "HOOK",
        RecordOp::Bulk => "HOOK_ALL",
        RecordOp::Scan => "SCAN",
    }
}

// 按 item_flags 位掩码选择性输出字段，CSV 格式
fn format_entry(entry: &RecordEntry, item_flags: u32) -> String {
    let mut line = String::new();
    if item_flags & RECORD_ITEM_TIMESTAMP != 0 {
        let _ = write!(line, "{},", entry.ts_ms);
    }
    if item_flags & RECORD_ITEM_OP != 0 {
        let _ = write!(line, "{},", op_name(entry.op));
    }
    if item_flags & RECORD_ITEM_CLASS_NAME != 0 {
        let _ = write!(line, "{},", entry.class_name);
    }
    if item_flags & RECORD_ITEM_MEMBER != 0 {
        // 成员标签内含逗号，加引号保持列数稳定
        let _ = write!(line, "\"{}\",", entry.member);
    }
    if item_flags & RECORD_ITEM_KIND != 0 {
        let _ = write!(line, "{},", entry.kinds);
    }
    if item_flags & RECORD_ITEM_ERRNO != 0 {
        let _ = write!(line, "{},", entry.status_code);
    }
    line.push('\n');
    line
}

pub(super) fn get_records_text(state: &CoreState, item_flags: u32) -> Option<String> {
    if !state.recordable || state.records.is_empty() {
        return None;
    }
    let mut output = String::new();
    for entry in &state.records {
        output.push_str(&format_entry(entry, item_flags));
    }
    Some(output)
}

// 循环写入直到全部字节落盘，处理 short write
pub(super) fn dump_records_text(fd: i32, text: &str) -> Result<(), Errno> {
    if fd < 0 {
        return Err(Errno::InvalidArg);
    }
    let bytes = text.as_bytes();
    let mut offset = 0usize;
    while offset < bytes.len() {
        let written = unsafe {
            libc::write(
                fd,
                bytes[offset..].as_ptr() as *const libc::c_void,
                bytes.len() - offset,
            )
        };
        if written <= 0 {
            return Err(Errno::Unknown);
        }
        offset += written as usize;
    }
    Ok(())
}
