use std::path::PathBuf;
use std::sync::OnceLock;

static ROOT_DIR: OnceLock<PathBuf> = OnceLock::new();

/// 设置存储层的数据根目录。
///
/// # Logic
/// 1. 尝试将指定的路径保存到全局静态变量中。
/// 2. 进程内只允许设置一次，重复设置会被忽略并记录警告。
///
/// # Arguments
/// * `path` - 存储数据的根目录路径，通常来自 `database.data_dir`。
pub fn set_root_dir(path: PathBuf) {
    if let Err(rejected) = ROOT_DIR.set(path) {
        tracing::warn!("Store root dir already set, ignoring {:?}", rejected);
    }
}

/// 获取当前配置的数据根目录，未设置时为 `data`。
pub(crate) fn get_root_dir() -> PathBuf {
    ROOT_DIR
        .get()
        .cloned()
        .unwrap_or_else(|| PathBuf::from("data"))
}
