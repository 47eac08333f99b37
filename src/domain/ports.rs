use crate::domain::model::{GroupPolicy, Roster};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn default_group_size(&self) -> Option<usize>;
    fn default_reviews_per_submission(&self) -> Option<usize>;
    fn seed(&self) -> Option<u64>;
    fn group_policy(&self) -> GroupPolicy;
    fn output_path(&self) -> &str;
}

/// 名單來源由呼叫端提供 (CSV、資料庫等)，引擎本身只吃 id
#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn load_roster(&self) -> Result<Roster>;
}
