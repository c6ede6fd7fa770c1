use super::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 用户实体，代表系统的使用者。
///
/// # Invariants
/// - `id` 必须全局唯一。
/// - `email` 始终以小写形式保存，且全局唯一。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    // 用户唯一标识
    pub id: String,
    // 登录邮箱 (小写)
    pub email: String,
    // bcrypt 密码哈希
    pub password_hash: String,
    // 注册时间
    pub created_at: DateTime<Utc>,
}

/// # Summary
/// 看板实体：用户保存的一组具名股票代码。
///
/// # Invariants
/// - 归属于唯一的 `user_id`，所有读写都按用户隔离。
/// - `tickers` 保持用户添加顺序；存储层不做去重。
/// - 任何修改都必须刷新 `updated_at`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    // 看板唯一标识
    pub id: String,
    // 所属用户
    pub user_id: String,
    // 看板名称
    pub name: String,
    // 股票代码列表
    pub tickers: Vec<String>,
    // 创建时间
    pub created_at: DateTime<Utc>,
    // 最后修改时间
    pub updated_at: DateTime<Utc>,
}

impl Dashboard {
    /// 以当前时间创建新看板
    pub fn new(id: String, user_id: String, name: String, tickers: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            name,
            tickers,
            created_at: now,
            updated_at: now,
        }
    }

    /// 修改后刷新时间戳
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// # Summary
    /// 追加代码，已存在的代码会被跳过。
    ///
    /// # Returns
    /// 实际新增的数量。
    pub fn add_tickers(&mut self, tickers: &[String]) -> usize {
        let mut added = 0;
        for t in tickers {
            if !self.tickers.contains(t) {
                self.tickers.push(t.clone());
                added += 1;
            }
        }
        if added > 0 {
            self.touch();
        }
        added
    }

    /// 移除代码，返回是否有变更
    pub fn remove_ticker(&mut self, ticker: &str) -> bool {
        let before = self.tickers.len();
        self.tickers.retain(|t| t != ticker);
        let changed = self.tickers.len() != before;
        if changed {
            self.touch();
        }
        changed
    }
}

/// # Summary
/// 系统级数据存储接口，负责用户与看板的持久化。
///
/// # Invariants
/// - 看板的所有操作都必须携带 `user_id`，不同用户之间不可见。
#[async_trait]
pub trait SystemStore: Send + Sync {
    // --- 用户域 ---

    /// # Summary
    /// 根据 ID 获取用户信息。
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// # Summary
    /// 根据邮箱获取用户信息。
    ///
    /// # Logic
    /// 邮箱在查询前统一转为小写。
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// # Summary
    /// 注册新用户。
    ///
    /// # Returns
    /// 邮箱已存在时返回 `StoreError::Conflict`。
    async fn create_user(&self, user: &User) -> Result<(), StoreError>;

    // --- 看板域 ---

    /// # Summary
    /// 列出用户的全部看板。
    ///
    /// # Returns
    /// 按 `updated_at` 倒序排列的看板列表。
    async fn list_dashboards(&self, user_id: &str) -> Result<Vec<Dashboard>, StoreError>;

    /// # Summary
    /// 获取用户的指定看板。
    async fn get_dashboard(&self, user_id: &str, id: &str) -> Result<Option<Dashboard>, StoreError>;

    /// # Summary
    /// 保存看板 (Upsert)。
    ///
    /// # Logic
    /// 以 (`user_id`, `id`) 为键写入，已存在则整体覆盖。
    async fn save_dashboard(&self, dashboard: &Dashboard) -> Result<(), StoreError>;

    /// # Summary
    /// 删除看板。
    ///
    /// # Returns
    /// 是否真的删除了记录；不存在时返回 `Ok(false)`。
    async fn delete_dashboard(&self, user_id: &str, id: &str) -> Result<bool, StoreError>;
}
