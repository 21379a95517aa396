/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化全局日志订阅者
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。重复调用不会报错。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `max_concurrent`: 最大并发数
pub fn log_startup(max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 作业批量处理模式");
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录待处理文档数量
pub fn log_documents_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 份待处理的作业", total);
    info!("📋 最多同时处理 {} 份\n", max_concurrent);
}

/// 打印最终统计信息
///
/// # 参数
/// - `completed`: 处理完成数量
/// - `errored`: 进入 error 状态的数量
/// - `failed`: 未能创建或任务异常的数量
/// - `total`: 总数
pub fn print_final_stats(completed: usize, errored: usize, failed: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 完成: {}/{}", completed, total);
    info!("⚠️ 处理出错: {}", errored);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
