//! DatasetCatalog port - データセットのメタデータ取得
//!
//! 失敗してもランは止めない（列なしの縮退モードで続行）。判断はコーディネーター側。

use async_trait::async_trait;

use crate::domain::{DatasetInfo, RunError};

#[async_trait]
pub trait DatasetCatalog: Send + Sync {
    async fn dataset_info(&self, dataset_id: &str) -> Result<DatasetInfo, RunError>;
}
