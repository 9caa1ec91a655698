use crate::domain::model::{ExtractedData, TransformResult};
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
    /// Base URL of the ANS accounting-statements portal.
    fn base_url(&self) -> &str;
    /// Quarter labels to ingest, e.g. "2024/3T".
    fn quarters(&self) -> &[String];
    /// Local batch files read through Storage instead of downloading.
    /// When non-empty, HTTP ingestion is skipped entirely.
    fn batch_files(&self) -> &[String];
    /// Operator registry: an http(s) URL or a Storage-relative path.
    fn registry_source(&self) -> &str;
    fn output_path(&self) -> &str;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractedData>;
    async fn transform(&self, data: ExtractedData) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
