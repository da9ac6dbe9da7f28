use serde::{Deserialize, Serialize};

/// `GET /dashboard/stats` 的聚合计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_books: u64,
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_news: u64,
    #[serde(default)]
    pub total_categories: u64,
    #[serde(default)]
    pub deactivated_books: u64,
    #[serde(default)]
    pub deactivated_users: u64,
}

impl DashboardStats {
    /// (标签, 数值) 卡片列表，按展示顺序
    pub fn cards(&self) -> [(&'static str, u64); 6] {
        [
            ("Total Books", self.total_books),
            ("Total Users", self.total_users),
            ("News Posts", self.total_news),
            ("Categories", self.total_categories),
            ("Deactivated Books", self.deactivated_books),
            ("Deactivated Users", self.deactivated_users),
        ]
    }

    pub fn active_books(&self) -> u64 {
        self.total_books.saturating_sub(self.deactivated_books)
    }

    pub fn active_users(&self) -> u64 {
        self.total_users.saturating_sub(self.deactivated_users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_counters_default_to_zero() {
        let stats: DashboardStats =
            serde_json::from_value(json!({ "total_books": 12, "deactivated_books": 2 })).unwrap();
        assert_eq!(stats.active_books(), 10);
        assert_eq!(stats.total_users, 0);
        assert_eq!(stats.cards()[0], ("Total Books", 12));
    }
}
