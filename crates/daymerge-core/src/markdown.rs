//! Markdown document model and front-matter stripping
//!
//! The pipeline only needs three things from a markdown parser: split a
//! document into metadata blocks and body, drop one kind of metadata block,
//! and write the result back out. [`DocumentParser`] captures exactly that,
//! so a full CommonMark parser can replace [`FrontmatterParser`] without
//! touching image resolution.

/// Kind of front-matter block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    /// `---` fenced YAML
    Yaml,
    /// `+++` fenced TOML
    Toml,
}

impl MetadataKind {
    pub fn fence(&self) -> &'static str {
        match self {
            MetadataKind::Yaml => "---",
            MetadataKind::Toml => "+++",
        }
    }

    fn from_fence(line: &str) -> Option<Self> {
        match line {
            "---" => Some(MetadataKind::Yaml),
            "+++" => Some(MetadataKind::Toml),
            _ => None,
        }
    }
}

/// Top-level node of a parsed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Front matter, without its fences
    Metadata { kind: MetadataKind, raw: String },
    /// Everything that is not front matter, verbatim
    Body(String),
}

/// Parsed markdown document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    /// A document with no front matter
    pub fn from_body(body: impl Into<String>) -> Self {
        Document {
            blocks: vec![Block::Body(body.into())],
        }
    }

    /// Remove every metadata block of `kind`, returning how many were removed
    pub fn strip_metadata(&mut self, kind: MetadataKind) -> usize {
        let before = self.blocks.len();
        self.blocks
            .retain(|block| !matches!(block, Block::Metadata { kind: k, .. } if *k == kind));
        before - self.blocks.len()
    }
}

/// Parse/serialize capability used by the pipeline
pub trait DocumentParser: Send + Sync {
    fn parse(&self, text: &str) -> Document;
    fn serialize(&self, doc: &Document) -> String;
}

/// Line-based parser that recognizes a single fenced block at the top of
/// the document and keeps the body verbatim.
///
/// The opening fence must be the first line; an unclosed fence means the
/// document has no front matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontmatterParser;

impl DocumentParser for FrontmatterParser {
    fn parse(&self, text: &str) -> Document {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut lines = text.split_inclusive('\n');

        let Some(first) = lines.next() else {
            return Document::from_body(text);
        };
        let Some(kind) = MetadataKind::from_fence(first.trim_end()) else {
            return Document::from_body(text);
        };

        let mut offset = first.len();
        for line in lines {
            if line.trim_end() == kind.fence() {
                let raw = text[first.len()..offset].trim_end_matches(['\r', '\n']);
                let body = &text[offset + line.len()..];
                return Document {
                    blocks: vec![
                        Block::Metadata {
                            kind,
                            raw: raw.to_string(),
                        },
                        Block::Body(body.to_string()),
                    ],
                };
            }
            offset += line.len();
        }

        Document::from_body(text)
    }

    fn serialize(&self, doc: &Document) -> String {
        let mut out = String::new();
        for block in &doc.blocks {
            match block {
                Block::Metadata { kind, raw } => {
                    out.push_str(kind.fence());
                    out.push('\n');
                    if !raw.is_empty() {
                        out.push_str(raw);
                        out.push('\n');
                    }
                    out.push_str(kind.fence());
                    out.push('\n');
                }
                Block::Body(body) => {
                    let body = body.trim_start_matches(['\r', '\n']).trim_end();
                    if !body.is_empty() {
                        out.push_str(body);
                        out.push('\n');
                    }
                }
            }
        }
        out
    }
}

/// Parse `text`, drop its `kind` front matter and serialize the rest
pub fn strip_front_matter(parser: &dyn DocumentParser, text: &str, kind: MetadataKind) -> String {
    let mut doc = parser.parse(text);
    let removed = doc.strip_metadata(kind);
    if removed > 0 {
        tracing::trace!(removed, fence = kind.fence(), "stripped front matter");
    }
    parser.serialize(&doc)
}
