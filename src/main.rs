use anyhow::Result;
use homework_pipeline::config::log_warnings;
use homework_pipeline::utils::logging;
use homework_pipeline::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（警告留到日志初始化之后输出）
    let (config, warnings) = Config::load_with_warnings()?;

    // 初始化日志
    logging::init(config.verbose_logging);
    log_warnings(&warnings);

    // 初始化并运行应用
    App::initialize(config)?.run().await?;

    Ok(())
}
