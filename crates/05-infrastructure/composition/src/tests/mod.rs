mod console_tests;
mod settings_tests;

use std::sync::Once;

static INIT: Once = Once::new();

/// 测试日志，只初始化一次
pub(crate) fn init_test_logger() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}
