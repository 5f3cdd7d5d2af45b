use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

pub const LOG_DEBUG: i32 = 3;
pub const LOG_INFO: i32 = 4;
pub const LOG_WARN: i32 = 5;
pub const LOG_ERROR: i32 = 6;

#[cfg(target_os = "android")]
const LOG_TAG_ANDROID: &[u8] = b"xsig_hook\0";
#[cfg(not(target_os = "android"))]
const LOG_TAG: &str = "xsig_hook";

static LOG_PRIORITY: AtomicI32 = AtomicI32::new(LOG_WARN);

#[cfg(target_os = "android")]
#[link(name = "log")]
unsafe extern "C" {
    fn __android_log_write(prio: i32, tag: *const i8, text: *const i8) -> i32;
}

// 设置日志级别，启用时输出 DEBUG 及以上，禁用时仅输出 WARN 及以上
pub fn set_debug_enabled(enabled: bool) {
    let priority = if enabled { LOG_DEBUG } else { LOG_WARN };
    LOG_PRIORITY.store(priority, Ordering::SeqCst);
}

pub fn debug_enabled() -> bool {
    LOG_PRIORITY.load(Ordering::Relaxed) <= LOG_DEBUG
}

fn enabled(priority: i32) -> bool {
    LOG_PRIORITY.load(Ordering::Relaxed) <= priority
}

#[cfg(target_os = "android")]
fn write_log(priority: i32, args: fmt::Arguments) {
    if !enabled(priority) {
        return;
    }

    unsafe {
        let mut text = format!("{args}").into_bytes();
        for byte in &mut text {
            if *byte == 0 {
                *byte = b' ';
            }
        }
        text.push(0);

        __android_log_write(
            priority,
            LOG_TAG_ANDROID.as_ptr() as *const i8,
            text.as_ptr() as *const i8,
        );
    }
}

// 非 Android 目标写 stderr，单次 write 保证行不被其他线程打断
#[cfg(not(target_os = "android"))]
fn write_log(priority: i32, args: fmt::Arguments) {
    if !enabled(priority) {
        return;
    }
    emit_line(&format_line(priority, args));
}

#[cfg(not(target_os = "android"))]
fn format_line(priority: i32, args: fmt::Arguments) -> String {
    format!("{} {LOG_TAG}: {args}\n", level_char(priority))
}

#[cfg(all(not(target_os = "android"), not(test)))]
fn emit_line(text: &str) {
    let bytes = text.as_bytes();
    let mut offset = 0usize;
    while offset < bytes.len() {
        let written = unsafe {
            libc::write(
                libc::STDERR_FILENO,
                bytes[offset..].as_ptr() as *const libc::c_void,
                bytes.len() - offset,
            )
        };
        if written <= 0 {
            return;
        }
        offset += written as usize;
    }
}

// 测试构建走 eprint!，输出交给 libtest 捕获
#[cfg(all(not(target_os = "android"), test))]
fn emit_line(text: &str) {
    eprint!("{text}");
}

#[cfg(not(target_os = "android"))]
fn level_char(priority: i32) -> char {
    match priority {
        LOG_DEBUG => 'D',
        LOG_INFO => 'I',
        LOG_WARN => 'W',
        _ => 'E',
    }
}

pub(crate) fn info(args: fmt::Arguments) {
    write_log(LOG_INFO, args);
}

pub(crate) fn debug(args: fmt::Arguments) {
    write_log(LOG_DEBUG, args);
}

pub(crate) fn warn(args: fmt::Arguments) {
    write_log(LOG_WARN, args);
}

pub(crate) fn error(args: fmt::Arguments) {
    write_log(LOG_ERROR, args);
}
