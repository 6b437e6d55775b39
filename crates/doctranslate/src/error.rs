#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("Unsupported input type: {0}")]
    UnsupportedInputType(String),

    #[error("Invalid file: {0}")]
    InvalidFile(String),
}
