pub mod discover;
pub mod error;
pub mod export;
pub mod merge;
pub mod pipeline;
pub mod process;

pub use error::{ExtractError, PipelineError};
pub use merge::{merge, CombinedRow, CombinedTable, Summary};
pub use pipeline::{run, PipelineConfig};
pub use process::{Dataset, Demographic, Record};
