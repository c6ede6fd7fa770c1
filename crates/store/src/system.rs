use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqlitePool, sqlite::{SqliteConnectOptions, SqlitePoolOptions}};
use std::fs;
use std::path::Path;
use stockboard_core::store::error::StoreError;
use stockboard_core::store::port::{Dashboard, SystemStore, User};
use tracing::info;

/// 默认系统数据库存储路径
const DEFAULT_SYSTEM_DB: &str = "app.db";

/// 看板行：(id, user_id, name, tickers_json, created_at, updated_at)
type DashboardRow = (String, String, String, String, DateTime<Utc>, DateTime<Utc>);

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn dashboard_from_row(r: DashboardRow) -> Result<Dashboard, StoreError> {
    let tickers: Vec<String> = serde_json::from_str(&r.3)
        .map_err(|e| StoreError::Corrupted(format!("dashboard {} tickers: {}", r.0, e)))?;
    Ok(Dashboard {
        id: r.0,
        user_id: r.1,
        name: r.2,
        tickers,
        created_at: r.4,
        updated_at: r.5,
    })
}

/// SystemStore 的 SQLite 实现。
///
/// # Summary
/// 在中心化的 SQLite 数据库 (`app.db`) 中管理用户与看板。
///
/// # Invariants
/// * 数据库结构在存储实例创建时初始化。
/// * 所有操作均通过共享的 `SqlitePool` 执行。
/// * 看板以 (`user_id`, `id`) 为主键，天然按用户隔离。
pub struct SqliteSystemStore {
    pool: SqlitePool,
}

impl SqliteSystemStore {
    /// 在全局配置的数据根目录下打开存储，见 `config::set_root_dir`。
    pub async fn new() -> Result<Self, StoreError> {
        Self::open(&crate::config::get_root_dir()).await
    }

    /// 创建新的 SqliteSystemStore 并初始化表结构。
    ///
    /// # Logic
    /// 1. 确保目录存在。
    /// 2. 配置 SQLite 连接选项，开启 `create_if_missing`。
    /// 3. 连接到数据库并执行 DDL 初始化系统表结构。
    ///
    /// # Arguments
    /// * `root` - 数据目录。
    ///
    /// # Returns
    /// * `Result<Self, StoreError>` - 存储实例 or 初始化错误。
    pub async fn open(root: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(root).map_err(|e| StoreError::InitError(e.to_string()))?;

        let db_path = root.join(DEFAULT_SYSTEM_DB);
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| StoreError::InitError(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at DATETIME NOT NULL
            );

            CREATE TABLE IF NOT EXISTS dashboards (
                user_id TEXT NOT NULL,
                id TEXT NOT NULL,
                name TEXT NOT NULL,
                tickers TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                PRIMARY KEY (user_id, id)
            );

            CREATE INDEX IF NOT EXISTS idx_dashboards_user_updated
                ON dashboards (user_id, updated_at);
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::InitError(e.to_string()))?;

        info!("System store opened at {:?}", db_path);
        Ok(Self { pool })
    }
}

#[async_trait]
impl SystemStore for SqliteSystemStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String, DateTime<Utc>)>(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| User {
            id: r.0,
            email: r.1,
            password_hash: r.2,
            created_at: r.3,
        }))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String, DateTime<Utc>)>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| User {
            id: r.0,
            email: r.1,
            password_hash: r.2,
            created_at: r.3,
        }))
    }

    /// # Summary
    /// 插入新用户。
    ///
    /// # Logic
    /// 依赖 `email` 列的 UNIQUE 约束判重，违反约束时返回 `StoreError::Conflict`。
    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(user.email.trim().to_lowercase())
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::Conflict(format!("user {} already exists", user.email)))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    /// # Summary
    /// 列出用户的全部看板。
    ///
    /// # Logic
    /// 按 `updated_at` 倒序查询，最近修改的排在最前。
    async fn list_dashboards(&self, user_id: &str) -> Result<Vec<Dashboard>, StoreError> {
        sqlx::query_as::<_, DashboardRow>(
            "SELECT id, user_id, name, tickers, created_at, updated_at FROM dashboards WHERE user_id = ? ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(dashboard_from_row)
        .collect()
    }

    async fn get_dashboard(&self, user_id: &str, id: &str) -> Result<Option<Dashboard>, StoreError> {
        sqlx::query_as::<_, DashboardRow>(
            "SELECT id, user_id, name, tickers, created_at, updated_at FROM dashboards WHERE user_id = ? AND id = ?",
        )
        .bind(user_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .map(dashboard_from_row)
        .transpose()
    }

    /// # Summary
    /// 保存或覆盖看板。
    ///
    /// # Logic
    /// `tickers` 以 JSON 数组形式存储以保留顺序，执行 `INSERT OR REPLACE`。
    async fn save_dashboard(&self, dashboard: &Dashboard) -> Result<(), StoreError> {
        let tickers = serde_json::to_string(&dashboard.tickers)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        sqlx::query(
            "INSERT OR REPLACE INTO dashboards (user_id, id, name, tickers, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&dashboard.user_id)
        .bind(&dashboard.id)
        .bind(&dashboard.name)
        .bind(tickers)
        .bind(dashboard.created_at)
        .bind(dashboard.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn delete_dashboard(&self, user_id: &str, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM dashboards WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}
