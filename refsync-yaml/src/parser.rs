//! Event-driven tree builder over `yaml_rust2`'s marked parser.

use crate::node::{Node, Scalar, ScalarStyle, Span};
use crate::Result;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Parse every document in `source`, in order.
pub(crate) fn parse_documents(source: &str) -> Result<Vec<Node>> {
    let mut parser = Parser::new_from_str(source);
    let mut builder = TreeBuilder::new(source);
    parser.load(&mut builder, true)?;
    Ok(builder.documents)
}

/// `Marker` positions count characters; spans are byte ranges. This table
/// maps one to the other so earlier non-ASCII content cannot skew spans.
struct CharIndex {
    offsets: Vec<usize>,
}

impl CharIndex {
    fn new(source: &str) -> Self {
        let mut offsets: Vec<usize> = source.char_indices().map(|(b, _)| b).collect();
        offsets.push(source.len());
        Self { offsets }
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.offsets
            .get(char_index)
            .or(self.offsets.last())
            .copied()
            .unwrap_or(0)
    }
}

/// A partially built container node.
enum Frame {
    Sequence(Vec<Node>),
    Mapping(Vec<(Node, Option<Node>)>),
}

struct TreeBuilder<'a> {
    source: &'a str,
    chars: CharIndex,
    stack: Vec<Frame>,
    root: Option<Node>,
    documents: Vec<Node>,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: CharIndex::new(source),
            stack: Vec::new(),
            root: None,
            documents: Vec::new(),
        }
    }

    fn push_complete(&mut self, node: Node) {
        let Some(frame) = self.stack.last_mut() else {
            self.root = Some(node);
            return;
        };
        match frame {
            Frame::Sequence(items) => items.push(node),
            Frame::Mapping(entries) => {
                if let Some((_, value)) = entries.last_mut()
                    && value.is_none()
                {
                    *value = Some(node);
                } else {
                    // A completed entry (or none at all) means this node
                    // starts a new key.
                    entries.push((node, None));
                }
            }
        }
    }

    fn scalar_node(&self, value: String, style: TScalarStyle, marker: Marker) -> Node {
        let style = match style {
            TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
            TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
            TScalarStyle::Literal | TScalarStyle::Folded => ScalarStyle::Block,
            _ => ScalarStyle::Plain,
        };
        let start = self.chars.byte_offset(marker.index());

        // Null/empty scalars are synthesized by the parser and their mark
        // is not the position of any source text; give them an inert span.
        if style != ScalarStyle::Block && value.is_empty() {
            let span = Span { start, len: 0 };
            return Node::Scalar(Scalar::new(value, style, span, None));
        }

        let span = raw_scalar_span(self.source, start, &value, style);
        let comment = if style == ScalarStyle::Block {
            None
        } else {
            inline_comment(self.source, span.end())
        };
        Node::Scalar(Scalar::new(value, style, span, comment))
    }
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        match ev {
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart => {}

            Event::DocumentEnd => {
                if let Some(root) = self.root.take() {
                    self.documents.push(root);
                }
            }

            Event::Scalar(value, style, _anchor_id, _tag) => {
                let node = self.scalar_node(value, style, marker);
                self.push_complete(node);
            }

            Event::SequenceStart(_anchor_id, _tag) => {
                self.stack.push(Frame::Sequence(Vec::new()));
            }

            Event::SequenceEnd => {
                let Some(Frame::Sequence(items)) = self.stack.pop() else {
                    panic!("SequenceEnd without SequenceStart");
                };
                self.push_complete(Node::Sequence(items));
            }

            Event::MappingStart(_anchor_id, _tag) => {
                self.stack.push(Frame::Mapping(Vec::new()));
            }

            Event::MappingEnd => {
                let Some(Frame::Mapping(entries)) = self.stack.pop() else {
                    panic!("MappingEnd without MappingStart");
                };
                let entries = entries
                    .into_iter()
                    .map(|(key, value)| {
                        let value = value.expect("mapping entry without value");
                        (key, value)
                    })
                    .collect();
                self.push_complete(Node::Mapping(entries));
            }

            Event::Alias(_anchor_id) => {
                let start = self.chars.byte_offset(marker.index());
                self.push_complete(Node::Alias(Span { start, len: 0 }));
            }
        }
    }
}

/// Byte span of a scalar's raw source text, starting at the parser's mark.
fn raw_scalar_span(source: &str, mut start: usize, value: &str, style: ScalarStyle) -> Span {
    let bytes = source.as_bytes();

    // The mark may land on a preceding anchor or tag token (`&a`, `!!str`);
    // those are indicator characters a scalar cannot begin with, so skip
    // them. The anchor must stay out of the span or a rewrite would eat it.
    while start < bytes.len() && (bytes[start] == b'&' || bytes[start] == b'!') {
        while start < bytes.len() && !bytes[start].is_ascii_whitespace() {
            start += 1;
        }
        while start < bytes.len() && (bytes[start] == b' ' || bytes[start] == b'\t') {
            start += 1;
        }
    }

    match style {
        ScalarStyle::DoubleQuoted => {
            let mut i = start + 1;
            while i < bytes.len() {
                match bytes[i] {
                    b'\\' => i += 2,
                    b'"' => {
                        i += 1;
                        break;
                    }
                    _ => i += 1,
                }
            }
            Span {
                start,
                len: i.min(bytes.len()) - start,
            }
        }
        ScalarStyle::SingleQuoted => {
            let mut i = start + 1;
            while i < bytes.len() {
                if bytes[i] == b'\'' {
                    if bytes.get(i + 1) == Some(&b'\'') {
                        i += 2;
                    } else {
                        i += 1;
                        break;
                    }
                } else {
                    i += 1;
                }
            }
            Span {
                start,
                len: i.min(bytes.len()) - start,
            }
        }
        ScalarStyle::Block => Span { start, len: 0 },
        ScalarStyle::Plain => {
            // Single-line plain scalars appear verbatim in the source.
            if source[start..].starts_with(value) {
                return Span {
                    start,
                    len: value.len(),
                };
            }
            // Fall back to the rest of the line, minus any trailing
            // comment and whitespace.
            let rest = &source[start..];
            let line = &rest[..rest.find('\n').unwrap_or(rest.len())];
            let content = match line.find(" #").or_else(|| line.find("\t#")) {
                Some(i) => &line[..i],
                None => line,
            };
            Span {
                start,
                len: content.trim_end().len(),
            }
        }
    }
}

/// The comment on the same line as a span ending at `end`, if the rest of
/// the line is nothing but that comment.
fn inline_comment(source: &str, end: usize) -> Option<String> {
    let rest = source.get(end..)?;
    let line = &rest[..rest.find('\n').unwrap_or(rest.len())];
    let trimmed = line.trim_start_matches([' ', '\t']).trim_end();
    trimmed.starts_with('#').then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spans(source: &str) -> Vec<(String, String)> {
        let docs = parse_documents(source).unwrap();
        let mut out = Vec::new();
        for mut doc in docs {
            doc.visit_scalars_mut(&mut |scalar| {
                out.push((
                    scalar.value().to_string(),
                    scalar.comment().unwrap_or_default().to_string(),
                ));
            });
        }
        out
    }

    #[test]
    fn scalars_arrive_in_document_order() {
        let observed = spans("a: 1\nb:\n- x\n- y\n");
        let values: Vec<&str> = observed.iter().map(|(v, _)| v.as_str()).collect();
        assert_eq!(values, ["a", "1", "b", "x", "y"]);
    }

    #[test]
    fn comment_attaches_to_the_last_scalar_on_the_line() {
        let observed = spans("image: repo:v1 # setter\n");
        assert_eq!(
            observed,
            [
                ("image".to_string(), String::new()),
                ("repo:v1".to_string(), "# setter".to_string()),
            ]
        );
    }

    #[test]
    fn quoted_spans_cover_the_quotes() {
        let source = "a: \"v: 1\" # c\n";
        let span = raw_scalar_span(source, 3, "v: 1", ScalarStyle::DoubleQuoted);
        assert_eq!(&source[span.start..span.end()], "\"v: 1\"");
    }

    #[test]
    fn single_quoted_span_handles_escaped_quotes() {
        let source = "a: 'it''s' # c\n";
        let span = raw_scalar_span(source, 3, "it's", ScalarStyle::SingleQuoted);
        assert_eq!(&source[span.start..span.end()], "'it''s'");
    }

    #[test]
    fn plain_span_falls_back_to_line_scan() {
        // Value differing from the raw text forces the fallback path.
        let source = "a: some value   # c\n";
        let span = raw_scalar_span(source, 3, "normalized", ScalarStyle::Plain);
        assert_eq!(&source[span.start..span.end()], "some value");
    }

    #[test]
    fn char_index_converts_after_multibyte_chars() {
        let source = "# ☕\nkey: val\n";
        let index = CharIndex::new(source);
        // '☕' occupies one char but three bytes.
        let char_pos = source.chars().take_while(|c| *c != 'k').count();
        assert_eq!(index.byte_offset(char_pos), source.find("key").unwrap());
    }

    #[test]
    fn empty_documents_are_skipped() {
        assert!(parse_documents("").unwrap().is_empty());
    }
}
