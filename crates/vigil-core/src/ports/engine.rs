//! ValidationEngine port - 実際の検証を行う外部エンジン
//!
//! # 契約
//! - 1 回の呼び出し = 1 回の外部リクエスト（リトライはこの層ではしない）
//! - 戻り値は生の JSON。構造チェック（`checks` の有無）はコーディネーターが行う
//! - pause の影響を受けない。キャンセルされても呼び出し自体は中断されない

use async_trait::async_trait;

use crate::domain::RunError;

#[async_trait]
pub trait ValidationEngine: Send + Sync {
    async fn validate(
        &self,
        dataset_id: &str,
        target_column: Option<&str>,
    ) -> Result<serde_json::Value, RunError>;
}
