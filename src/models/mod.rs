pub mod codes;
pub mod enums;
pub mod reasons;
pub mod report;

pub use codes::*;
pub use enums::*;
pub use reasons::*;
pub use report::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid {field} value: {value}")]
    InvalidEnum { field: String, value: String },
}
