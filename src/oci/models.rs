use std::fmt;

use serde::Serialize;

use super::error::ImageRefError;

/// Tag or digest trailing the image name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum ImageSuffix {
    None,
    Tag(String),
    /// Digest value, e.g. `sha256:abcd`
    Digest(String),
}

/// Image reference of the form `registry/namespace/name[:tag|@digest]`
/// pointing into a known registry.
///
/// Values are only built by [`LocalImageReference::parse`] and are never
/// modified afterwards; rewriting produces a new reference string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalImageReference {
    registry: String,
    namespace: String,
    name: String,
    suffix: ImageSuffix,
}

/// Returns true if `image` begins with `prefix` followed by `/`.
///
/// An empty prefix only matches references with a leading `/`.
pub fn has_image_ref_prefix(image: &str, prefix: &str) -> bool {
    image
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('/'))
}

impl LocalImageReference {
    /// Parse `image`, requiring its registry segment to equal `expected_registry`
    pub fn parse(image: &str, expected_registry: &str) -> Result<Self, ImageRefError> {
        let malformed = |reason| ImageRefError::MalformedReference {
            reference: image.to_string(),
            reason,
        };

        let segments: Vec<&str> = image.split('/').collect();
        let [registry, namespace, last] = segments[..] else {
            return Err(malformed("expected exactly three path segments"));
        };

        if registry != expected_registry {
            return Err(ImageRefError::RegistryMismatch {
                reference: image.to_string(),
                expected: expected_registry.to_string(),
                found: registry.to_string(),
            });
        }

        if last.matches('@').count() > 1 {
            return Err(malformed("more than one digest marker"));
        }
        if last.matches(':').count() > 1 {
            return Err(malformed("more than one tag marker"));
        }

        let (name, suffix) = if let Some((name, digest)) = last.split_once('@') {
            (name, ImageSuffix::Digest(digest.to_string()))
        } else if let Some((name, tag)) = last.split_once(':') {
            (name, ImageSuffix::Tag(tag.to_string()))
        } else {
            (last, ImageSuffix::None)
        };

        Ok(Self {
            registry: registry.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            suffix,
        })
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn suffix(&self) -> &ImageSuffix {
        &self.suffix
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.suffix {
            ImageSuffix::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn digest(&self) -> Option<&str> {
        match &self.suffix {
            ImageSuffix::Digest(digest) => Some(digest),
            _ => None,
        }
    }
}

impl fmt::Display for LocalImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.registry, self.namespace, self.name)?;
        match &self.suffix {
            ImageSuffix::None => Ok(()),
            ImageSuffix::Tag(tag) => write!(f, ":{}", tag),
            ImageSuffix::Digest(digest) => write!(f, "@{}", digest),
        }
    }
}
