/// Receives warnings raised while rewriting container images.
///
/// Callers pass a sink explicitly instead of relying on a global logger, so
/// embedding hosts can route warnings into their own reporting.
pub trait DiagnosticSink {
    /// Record a warning with structured context (key-value pairs)
    fn warn(&self, message: &str, context: &[(&'static str, &str)]);
}

/// Sink that forwards warnings to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, message: &str, context: &[(&'static str, &str)]) {
        // Structured fields keep image names out of the message text
        tracing::warn!(context = ?context, "{}", message);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::DiagnosticSink;
    use std::cell::RefCell;

    /// Sink that keeps every warning for assertions
    #[derive(Default)]
    pub struct RecordingSink {
        pub warnings: RefCell<Vec<(String, Vec<(&'static str, String)>)>>,
    }

    impl DiagnosticSink for RecordingSink {
        fn warn(&self, message: &str, context: &[(&'static str, &str)]) {
            self.warnings.borrow_mut().push((
                message.to_string(),
                context.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;

    #[test]
    fn test_recording_sink_keeps_context() {
        let sink = RecordingSink::default();
        let dyn_sink: &dyn DiagnosticSink = &sink;

        dyn_sink.warn(
            "Failed to rewrite container image reference",
            &[("container", "app"), ("image", "foo/cat")],
        );

        let warnings = sink.warnings.borrow();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].0, "Failed to rewrite container image reference");
        assert_eq!(
            warnings[0].1,
            vec![("container", "app".to_string()), ("image", "foo/cat".to_string())]
        );
    }

    #[test]
    fn test_tracing_sink_accepts_empty_context() {
        // No subscriber is installed; the event is dropped without panicking
        TracingSink.warn("warning without context", &[]);
        TracingSink.warn("warning with context", &[("image", "foo/cat")]);
    }
}
