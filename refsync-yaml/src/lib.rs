//! Format-preserving YAML document trees.
//!
//! Responsibilities:
//! - Parse one file's text into zero or more ordered documents of
//!   mapping/sequence/scalar nodes, each scalar retaining its raw source
//!   span, style and inline comment.
//! - Record targeted scalar replacements ([`Scalar::set`]).
//! - Re-emit the file ([`SourceFile::emit`]) by splicing replacements into
//!   the original text, so everything outside the replaced spans — comments,
//!   ordering, indentation, anchors, blank lines — is byte-identical.
//!
//! Decoding to a plain value tree and re-encoding would lose comments and
//! ordering; this crate instead treats the parsed tree as an index into the
//! original text and performs text surgery on exactly the nodes touched.

mod error;
mod node;
mod parser;

pub use error::{Error, Result};
pub use node::{Node, Scalar, ScalarStyle, Span};

/// One file's text plus its parsed documents.
#[derive(Debug, Clone)]
pub struct SourceFile {
    source: String,
    documents: Vec<Node>,
}

impl SourceFile {
    /// Parse a file's full text. Multiple `---`-separated documents are
    /// supported; extension-less manifests use the same grammar.
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let documents = parser::parse_documents(&source)?;
        Ok(Self { source, documents })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn documents(&self) -> &[Node] {
        &self.documents
    }

    pub fn documents_mut(&mut self) -> &mut [Node] {
        &mut self.documents
    }

    /// True once any scalar in any document has a pending replacement.
    pub fn is_modified(&self) -> bool {
        let mut edits = Vec::new();
        for doc in &self.documents {
            doc.collect_edits(&mut edits);
        }
        !edits.is_empty()
    }

    /// Serialize the file. With no pending replacements this returns the
    /// original text byte for byte; otherwise only the replaced scalar
    /// spans differ.
    pub fn emit(&self) -> String {
        let mut edits = Vec::new();
        for doc in &self.documents {
            doc.collect_edits(&mut edits);
        }
        edits.sort_by_key(|(span, _)| span.start);

        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for (span, replacement) in edits {
            out.push_str(&self.source[cursor..span.start]);
            out.push_str(replacement);
            cursor = span.end();
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MANIFEST: &str = "\
# top-level comment
apiVersion: batch/v1beta1
kind: CronJob
metadata:
  name: foo   # trailing comment
  namespace: bar

spec:
  schedule: \"*/5 * * * *\"
  image: image:v1.0.0 # marker lives here
";

    fn set_scalars(file: &mut SourceFile, old: &str, new: &str) {
        for doc in file.documents_mut() {
            doc.visit_scalars_mut(&mut |scalar| {
                if scalar.value() == old {
                    scalar.set(new);
                }
            });
        }
    }

    #[test]
    fn unmodified_tree_round_trips_exactly() {
        let file = SourceFile::parse(MANIFEST).unwrap();
        assert_eq!(file.emit(), MANIFEST);
        assert!(!file.is_modified());
    }

    #[test]
    fn multi_document_files_round_trip() {
        let text = "---\na: 1\n---\n# second doc\nb: 2\n";
        let file = SourceFile::parse(text).unwrap();
        assert_eq!(file.documents().len(), 2);
        assert_eq!(file.emit(), text);
    }

    #[test]
    fn anchors_and_aliases_round_trip() {
        let text = "defaults: &defaults\n  replicas: 2\nprod:\n  <<: *defaults\n  replicas: 3\n";
        let file = SourceFile::parse(text).unwrap();
        assert_eq!(file.emit(), text);
    }

    #[test]
    fn block_scalars_round_trip() {
        let text = "script: |\n  echo one\n  echo two\nafter: done\n";
        let file = SourceFile::parse(text).unwrap();
        assert_eq!(file.emit(), text);
    }

    #[test]
    fn replacing_a_scalar_touches_only_its_span() {
        let mut file = SourceFile::parse(MANIFEST).unwrap();
        set_scalars(&mut file, "image:v1.0.0", "index.repo.fake/updated:v1.0.1");
        assert!(file.is_modified());
        assert_eq!(
            file.emit(),
            MANIFEST.replace("image:v1.0.0", "index.repo.fake/updated:v1.0.1")
        );
    }

    #[test]
    fn replacement_preserves_quoting_style() {
        let mut file = SourceFile::parse("tag: \"v1\" # setter\nother: 'v1'\n").unwrap();
        set_scalars(&mut file, "v1", "v1.0.1");
        assert_eq!(file.emit(), "tag: \"v1.0.1\" # setter\nother: 'v1.0.1'\n");
    }

    #[test]
    fn replacement_after_non_ascii_content_lands_on_the_right_bytes() {
        let text = "# café ☕ manifest\nimage: old # setter\n";
        let mut file = SourceFile::parse(text).unwrap();
        set_scalars(&mut file, "old", "new");
        assert_eq!(file.emit(), "# café ☕ manifest\nimage: new # setter\n");
    }

    #[test]
    fn replacing_an_anchored_scalar_keeps_the_anchor() {
        let mut file = SourceFile::parse("tag: &tag v1\ncopy: *tag\n").unwrap();
        set_scalars(&mut file, "v1", "v2");
        assert_eq!(file.emit(), "tag: &tag v2\ncopy: *tag\n");
    }

    #[test]
    fn inline_comments_attach_to_the_value_scalar() {
        let file = SourceFile::parse("image: image:v1.0.0 # {\"$imagepolicy\": \"ns:p\"}\n").unwrap();
        let doc = &file.documents()[0];
        let value = doc.get("image").and_then(Node::as_scalar).unwrap();
        assert_eq!(value.comment(), Some("# {\"$imagepolicy\": \"ns:p\"}"));

        // The key scalar on the same line carries no comment.
        let Node::Mapping(entries) = doc else {
            panic!("expected mapping");
        };
        let key = entries[0].0.as_scalar().unwrap();
        assert_eq!(key.comment(), None);
    }

    #[test]
    fn invalid_yaml_is_a_parse_error() {
        assert!(SourceFile::parse("foo: [unclosed\n").is_err());
    }

    #[test]
    fn mutated_output_is_still_semantically_valid_yaml() {
        let mut file = SourceFile::parse(MANIFEST).unwrap();
        set_scalars(&mut file, "image:v1.0.0", "index.repo.fake/updated:v1.0.1");

        let value: serde_yaml::Value = serde_yaml::from_str(&file.emit()).unwrap();
        assert_eq!(
            value["spec"]["image"],
            serde_yaml::Value::from("index.repo.fake/updated:v1.0.1")
        );
        assert_eq!(value["metadata"]["name"], serde_yaml::Value::from("foo"));
    }
}
