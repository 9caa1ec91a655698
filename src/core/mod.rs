pub mod aggregate;
pub mod consolidate;
pub mod enrich;
pub mod etl;
pub mod pipeline;
pub mod report;
pub mod validator;

pub use crate::domain::model::{ExtractedData, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
