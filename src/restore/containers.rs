use k8s_openapi::api::core::v1::{Container, EphemeralContainer, PodSpec};
use tracing::debug;

use super::diagnostics::DiagnosticSink;
use crate::oci::{has_image_ref_prefix, replace_image_ref_prefix, NamespaceMapping};

/// A container specification with a mutable image reference
pub trait ContainerImage {
    fn container_name(&self) -> &str;
    fn image_mut(&mut self) -> Option<&mut String>;
}

impl ContainerImage for Container {
    fn container_name(&self) -> &str {
        &self.name
    }

    fn image_mut(&mut self) -> Option<&mut String> {
        self.image.as_mut()
    }
}

impl ContainerImage for EphemeralContainer {
    fn container_name(&self) -> &str {
        &self.name
    }

    fn image_mut(&mut self) -> Option<&mut String> {
        self.image.as_mut()
    }
}

/// Move container images from `old_registry` to `new_registry` in place
///
/// Images hosted outside `old_registry` are left alone. A rewrite failure is
/// reported to `sink` and leaves that container's image unchanged; the
/// remaining containers are still processed.
pub fn swap_container_images<C: ContainerImage>(
    containers: &mut [C],
    old_registry: &str,
    new_registry: &str,
    sink: &dyn DiagnosticSink,
    namespace_mapping: &NamespaceMapping,
) {
    for container in containers.iter_mut() {
        let name = container.container_name().to_string();
        let Some(image) = container.image_mut() else {
            continue;
        };
        if !has_image_ref_prefix(image, old_registry) {
            continue;
        }

        match replace_image_ref_prefix(image, old_registry, new_registry, namespace_mapping) {
            Ok(new_image) => {
                debug!(container = %name, from = %image, to = %new_image, "Rewrote container image");
                *image = new_image;
            }
            // Unreachable while the prefix check above matches the rewriter's own
            // check; a failed rewrite must still leave the image unchanged.
            Err(e) => {
                sink.warn(
                    "Failed to rewrite container image reference",
                    &[
                        ("container", name.as_str()),
                        ("image", image.as_str()),
                        ("error", e.to_string().as_str()),
                    ],
                );
            }
        }
    }
}

/// Apply [`swap_container_images`] to the init, regular and ephemeral
/// containers of a pod spec
pub fn swap_pod_spec_images(
    pod_spec: &mut PodSpec,
    old_registry: &str,
    new_registry: &str,
    sink: &dyn DiagnosticSink,
    namespace_mapping: &NamespaceMapping,
) {
    if let Some(init_containers) = pod_spec.init_containers.as_mut() {
        swap_container_images(init_containers, old_registry, new_registry, sink, namespace_mapping);
    }
    swap_container_images(
        &mut pod_spec.containers,
        old_registry,
        new_registry,
        sink,
        namespace_mapping,
    );
    if let Some(ephemeral_containers) = pod_spec.ephemeral_containers.as_mut() {
        swap_container_images(
            ephemeral_containers,
            old_registry,
            new_registry,
            sink,
            namespace_mapping,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restore::diagnostics::testing::RecordingSink;

    fn container(name: &str, image: Option<&str>) -> Container {
        Container {
            name: name.to_string(),
            image: image.map(str::to_string),
            ..Default::default()
        }
    }

    fn images(containers: &[Container]) -> Vec<Option<&str>> {
        containers.iter().map(|c| c.image.as_deref()).collect()
    }

    fn mapping(entries: &[(&str, &str)]) -> NamespaceMapping {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_swap_container_images() {
        let mut containers = vec![
            container("a", Some("foo/cat")),
            container("b", Some("foo/cat/y")),
            container("c", Some("foo/dog/x")),
            container("d", Some("boo/cat")),
        ];
        let sink = RecordingSink::default();

        swap_container_images(
            &mut containers,
            "foo",
            "bar",
            &sink,
            &mapping(&[("dog", "puppy"), ("cat", "kitten")]),
        );

        assert_eq!(
            images(&containers),
            vec![
                Some("bar/cat"),
                Some("bar/kitten/y"),
                Some("bar/puppy/x"),
                Some("boo/cat"),
            ]
        );
        assert!(sink.warnings.borrow().is_empty());
    }

    #[test]
    fn test_swap_container_images_leaves_other_registries() {
        let mut containers = vec![
            container("a", Some("food/cat")),
            container("b", Some("foo")),
            container("c", None),
            container("d", Some("docker.io/library/nginx@sha256:abc")),
        ];
        let before = containers.clone();
        let sink = RecordingSink::default();

        swap_container_images(&mut containers, "foo", "bar", &sink, &mapping(&[]));

        assert_eq!(containers, before);
        assert!(sink.warnings.borrow().is_empty());
    }

    #[test]
    fn test_swap_container_images_drops_digest_keeps_tag() {
        let mut containers = vec![
            container("a", Some("foo/ns/app@sha256:abc")),
            container("b", Some("foo/ns/app:v2")),
        ];
        let sink = RecordingSink::default();

        swap_container_images(&mut containers, "foo", "bar", &sink, &mapping(&[]));

        assert_eq!(images(&containers), vec![Some("bar/ns/app"), Some("bar/ns/app:v2")]);
    }

    #[test]
    fn test_swap_pod_spec_images_covers_all_container_kinds() {
        let mut pod_spec = PodSpec {
            init_containers: Some(vec![container("init", Some("foo/ns/init"))]),
            containers: vec![container("app", Some("foo/ns/app:1.0"))],
            ephemeral_containers: Some(vec![EphemeralContainer {
                name: "debug".to_string(),
                image: Some("foo/tools/debug".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        };
        let sink = RecordingSink::default();

        swap_pod_spec_images(&mut pod_spec, "foo", "bar", &sink, &mapping(&[("ns", "prod")]));

        assert_eq!(
            pod_spec.init_containers.as_ref().unwrap()[0].image.as_deref(),
            Some("bar/prod/init")
        );
        assert_eq!(pod_spec.containers[0].image.as_deref(), Some("bar/prod/app:1.0"));
        assert_eq!(
            pod_spec.ephemeral_containers.as_ref().unwrap()[0].image.as_deref(),
            Some("bar/tools/debug")
        );
    }
}
