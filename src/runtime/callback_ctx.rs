// 宿主回调上下文追踪：谓词、类加载和宿主 hook 注册都在此守卫内执行
// 线程局部深度计数器大于 0 时，安装类 API 直接拒绝，避免在 install_mutex 内重入
use crate::errno::Errno;
use std::cell::Cell;

thread_local! {
    static HOST_CALLBACK_DEPTH: Cell<u32> = const { Cell::new(0) };
}

pub(super) fn is_in_host_callback() -> bool {
    HOST_CALLBACK_DEPTH.with(|depth| depth.get() > 0)
}

pub(super) fn reject_reentrant() -> Result<(), Errno> {
    if is_in_host_callback() {
        return Err(Errno::Reentrant);
    }
    Ok(())
}

// RAII guard 保证 panic 展开时深度也能回退
pub(super) fn run_in_host_callback<R, F>(f: F) -> R
where
    F: FnOnce() -> R,
{
    struct DepthGuard;

    impl Drop for DepthGuard {
        fn drop(&mut self) {
            HOST_CALLBACK_DEPTH.with(|depth| {
                depth.set(depth.get().saturating_sub(1));
            });
        }
    }

    HOST_CALLBACK_DEPTH.with(|depth| depth.set(depth.get().saturating_add(1)));
    let _guard = DepthGuard;
    f()
}
