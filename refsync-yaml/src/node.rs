//! Node tree retained alongside the original text.

/// Byte range of a node's raw text within the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Scalar presentation style in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    /// Literal (`|`) or folded (`>`) block scalar. Block scalars span
    /// multiple lines and are never substitution targets.
    Block,
}

/// A scalar node: decoded value, presentation style, the byte span of its
/// raw text, and the inline comment on the same line, if any.
#[derive(Debug, Clone)]
pub struct Scalar {
    value: String,
    style: ScalarStyle,
    span: Span,
    comment: Option<String>,
    replacement: Option<String>,
}

impl Scalar {
    pub(crate) fn new(
        value: String,
        style: ScalarStyle,
        span: Span,
        comment: Option<String>,
    ) -> Self {
        Self {
            value,
            style,
            span,
            comment,
            replacement: None,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn style(&self) -> ScalarStyle {
        self.style
    }

    /// The comment attached on the scalar's line, starting at `#`.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Replace this scalar's text, re-rendered in its original style.
    /// Quoted styles are re-quoted; block scalars are left untouched
    /// (they cannot carry inline markers).
    pub fn set(&mut self, new_value: &str) {
        let raw = match self.style {
            ScalarStyle::Plain => new_value.to_string(),
            ScalarStyle::SingleQuoted => format!("'{}'", new_value.replace('\'', "''")),
            ScalarStyle::DoubleQuoted => {
                format!("\"{}\"", new_value.replace('\\', "\\\\").replace('"', "\\\""))
            }
            ScalarStyle::Block => return,
        };
        self.replacement = Some(raw);
        self.value = new_value.to_string();
    }

    pub fn is_modified(&self) -> bool {
        self.replacement.is_some()
    }
}

/// One node of a parsed document.
#[derive(Debug, Clone)]
pub enum Node {
    /// Ordered key/value entries.
    Mapping(Vec<(Node, Node)>),
    Sequence(Vec<Node>),
    Scalar(Scalar),
    /// An `*anchor` alias. Aliases are preserved verbatim and never
    /// rewritten.
    Alias(Span),
}

impl Node {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// The scalar string value, if this node is a scalar.
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().map(Scalar::value)
    }

    /// Look up a mapping value by scalar key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Mapping(entries) => entries
                .iter()
                .find_map(|(k, v)| (k.as_str() == Some(key)).then_some(v)),
            _ => None,
        }
    }

    /// Visit every scalar depth-first in document order, keys before
    /// values.
    pub fn visit_scalars_mut(&mut self, f: &mut dyn FnMut(&mut Scalar)) {
        match self {
            Node::Scalar(s) => f(s),
            Node::Sequence(items) => {
                for item in items {
                    item.visit_scalars_mut(f);
                }
            }
            Node::Mapping(entries) => {
                for (key, value) in entries {
                    key.visit_scalars_mut(f);
                    value.visit_scalars_mut(f);
                }
            }
            Node::Alias(_) => {}
        }
    }

    pub(crate) fn collect_edits<'a>(&'a self, edits: &mut Vec<(Span, &'a str)>) {
        match self {
            Node::Scalar(s) => {
                if let Some(replacement) = &s.replacement {
                    edits.push((s.span, replacement));
                }
            }
            Node::Sequence(items) => {
                for item in items {
                    item.collect_edits(edits);
                }
            }
            Node::Mapping(entries) => {
                for (key, value) in entries {
                    key.collect_edits(edits);
                    value.collect_edits(edits);
                }
            }
            Node::Alias(_) => {}
        }
    }
}
