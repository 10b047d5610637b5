use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestoreError {
    /// The item does not match the typed object for `kind`. This includes
    /// items whose `apiVersion` differs from the one the object model supports,
    /// e.g. `extensions/v1beta1` Deployments.
    #[error("Failed to decode {kind} from restore item: {source}")]
    Deserialize {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {kind} into restore item: {source}")]
    Serialize {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported resource kind: {0}")]
    UnsupportedKind(String),
}
