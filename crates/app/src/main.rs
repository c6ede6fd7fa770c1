use std::path::PathBuf;
use std::sync::Arc;

use stockboard_api::server::{start_server, AppState};
use stockboard_core::common::time::RealTimeProvider;
use stockboard_core::config::AppConfig;
use stockboard_feed::yahoo::YahooProvider;
use stockboard_metrics::service::MetricsService;
use stockboard_store::system::SqliteSystemStore;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const CONFIG_FILE: &str = "config/default";
const ENV_PREFIX: &str = "STOCKBOARD";
const LOG_FILE_PREFIX: &str = "stockboard.log";

/// # Summary
/// 按优先级合并配置：内置默认值 < `config/default.toml` < `STOCKBOARD__*` 环境变量。
fn load_config() -> Result<AppConfig, config::ConfigError> {
    config::Config::builder()
        .add_source(config::Config::try_from(&AppConfig::default())?)
        .add_source(config::File::with_name(CONFIG_FILE).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

/// # Summary
/// 初始化全局日志。
///
/// # Logic
/// `RUST_LOG` 优先，否则使用配置中的级别。配置了 `logging.dir` 时额外按天滚动写文件，
/// 返回的 guard 必须存活到进程退出，否则缓冲中的日志会丢失。
fn init_logging(cfg: &AppConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.level));

    let (file_layer, guard) = match &cfg.logging.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化所有具体实现组件并通过 Arc<dyn Trait> 注入到 API 层。
///
/// # Logic
/// 1. 加载配置并初始化全局日志。
/// 2. 安装 rustls 加密后端 (reqwest 未绑定默认后端)。
/// 3. 实例化基础设施层（Yahoo 行情、SQLite 存储）。
/// 4. 构造指标服务并启动 HTTP 服务。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 配置与日志
    let app_config = load_config()?;
    let _log_guard = init_logging(&app_config);
    info!("Stockboard starting...");

    // 2. TLS 后端
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        tracing::warn!("rustls crypto provider already installed");
    }

    // 3. 基础设施层
    stockboard_store::config::set_root_dir(PathBuf::from(&app_config.database.data_dir));
    let system_store = Arc::new(SqliteSystemStore::new().await?);
    let feed = Arc::new(YahooProvider::new()?);

    // 4. 应用服务层
    let metrics = Arc::new(
        MetricsService::new(feed, Arc::new(RealTimeProvider), app_config.feed.history_years)
            .with_max_concurrency(app_config.feed.max_concurrency),
    );

    let bind_addr = app_config.bind_addr();
    let state = AppState {
        metrics,
        system_store,
        app_config: Arc::new(app_config),
    };

    start_server(state, &bind_addr).await
}
