use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageRefError {
    #[error("Malformed image reference {reference}: {reason}")]
    MalformedReference {
        reference: String,
        reason: &'static str,
    },

    #[error("Image reference {reference} has registry {found}, expected {expected}")]
    RegistryMismatch {
        reference: String,
        expected: String,
        found: String,
    },

    #[error("Image reference {reference} does not start with prefix {prefix}/")]
    PrefixMismatch { reference: String, prefix: String },
}
