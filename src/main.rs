//! Sora 控制台入口
//!
//! 初始化日志、加载配置、装配组件，然后在 stdin/stdout 上跑对话循环。

use anyhow::Context;
use sora::agent::create_agent_components;
use sora::config::load_config;
use sora::transport::run_console;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 控制台只有一个用户
const CONSOLE_USER: &str = "console";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖；写 stderr，避免和对话输出混在一起
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;

    let components = create_agent_components(&cfg);
    let out_dir = cfg.app.data_dir.join("outbox");

    run_console(&components, CONSOLE_USER, out_dir)
        .await
        .context("Console loop failed")?;

    Ok(())
}
