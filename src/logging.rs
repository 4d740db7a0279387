use tracing_subscriber::EnvFilter;

/// 日志过滤条件：优先使用 `RUST_LOG`，否则按 verbose 选择 info 或 debug
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "deep_research_rs=debug,info"
        } else {
            "info"
        })
    })
}

/// 安装全局日志订阅器，已安装时忽略
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_target(false)
        .try_init();
}
