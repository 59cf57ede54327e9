//! Error type for YAML loading.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid YAML: {0}")]
    Scan(#[from] yaml_rust2::ScanError),
}
