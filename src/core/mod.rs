pub mod etl;
pub mod mapping;
pub mod pipeline;

pub use crate::domain::model::{MergeResult, Record, SourceTables};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
