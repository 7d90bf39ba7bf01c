pub mod extraction;
pub mod coding;
pub mod processor;
