use std::collections::BTreeMap;

use super::error::ImageRefError;
use super::models::has_image_ref_prefix;

/// Old namespace -> new namespace. Namespaces without an entry are kept.
pub type NamespaceMapping = BTreeMap<String, String>;

/// Replace the `old_prefix` of an image reference with `new_prefix`
///
/// The namespace segment following the prefix is translated through
/// `namespace_mapping`. Any digest is dropped from the result, since a
/// digest from the old registry cannot be trusted to resolve in the new one;
/// tags are kept.
///
/// # Errors
/// Returns [`ImageRefError::PrefixMismatch`] if `image` does not start with
/// `old_prefix` followed by `/`.
pub fn replace_image_ref_prefix(
    image: &str,
    old_prefix: &str,
    new_prefix: &str,
    namespace_mapping: &NamespaceMapping,
) -> Result<String, ImageRefError> {
    if !has_image_ref_prefix(image, old_prefix) {
        return Err(ImageRefError::PrefixMismatch {
            reference: image.to_string(),
            prefix: old_prefix.to_string(),
        });
    }

    let remainder = &image[old_prefix.len() + 1..];
    let mut rewritten = match remainder.split_once('/') {
        Some((namespace, rest)) => {
            let namespace = namespace_mapping
                .get(namespace)
                .map(String::as_str)
                .unwrap_or(namespace);
            format!("{}/{}/{}", new_prefix, namespace, rest)
        }
        None => format!("{}/{}", new_prefix, remainder),
    };

    if let Some(pos) = rewritten.find('@') {
        rewritten.truncate(pos);
    }

    Ok(rewritten)
}
