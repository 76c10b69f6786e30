//! Image reference extraction

use std::ops::Range;

use regex::Regex;

/// Syntax a reference was written in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceSyntax {
    /// `![caption](path)`
    Markdown { caption: String },
    /// `![[path]]`
    Wiki,
}

/// One embedded image found in a note body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Target path with `|` display parameters removed and whitespace trimmed
    pub original_path: String,
    /// The matched markdown, verbatim
    pub raw_span: String,
    /// Byte range of `raw_span` in the scanned text
    pub range: Range<usize>,
    pub syntax: ReferenceSyntax,
}

impl ImageReference {
    /// Last path component of the target
    pub fn base_name(&self) -> &str {
        self.original_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.original_path)
    }

    /// Targets that are not local files and are never resolved
    pub fn is_remote(&self) -> bool {
        let lower = self.original_path.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:")
    }
}

/// Finds image references in markdown text
pub trait ReferenceExtractor: Send + Sync {
    /// References in document order, non-overlapping
    fn extract(&self, text: &str) -> Vec<ImageReference>;
}

/// Regex-based extractor for the two supported syntaxes
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    markdown: Regex,
    wiki: Regex,
}

impl RegexExtractor {
    pub fn new() -> Self {
        Self {
            markdown: Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("valid regex"),
            wiki: Regex::new(r"!\[\[([^\]]+)\]\]").expect("valid regex"),
        }
    }
}

impl Default for RegexExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceExtractor for RegexExtractor {
    fn extract(&self, text: &str) -> Vec<ImageReference> {
        let mut refs = Vec::new();

        for cap in self.markdown.captures_iter(text) {
            let Some(whole) = cap.get(0) else { continue };
            refs.push(ImageReference {
                original_path: clean_path(&cap[2]),
                raw_span: whole.as_str().to_string(),
                range: whole.range(),
                syntax: ReferenceSyntax::Markdown {
                    caption: cap[1].to_string(),
                },
            });
        }

        for cap in self.wiki.captures_iter(text) {
            let Some(whole) = cap.get(0) else { continue };
            refs.push(ImageReference {
                original_path: clean_path(&cap[1]),
                raw_span: whole.as_str().to_string(),
                range: whole.range(),
                syntax: ReferenceSyntax::Wiki,
            });
        }

        refs.sort_by_key(|r| r.range.start);

        let mut end = 0;
        refs.retain(|r| {
            if r.original_path.is_empty() || r.range.start < end {
                return false;
            }
            end = r.range.end;
            true
        });
        refs
    }
}

/// Drop `|`-delimited display parameters (`photo.png|300`) and trim
fn clean_path(raw: &str) -> String {
    raw.split('|').next().unwrap_or_default().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<ImageReference> {
        RegexExtractor::new().extract(text)
    }

    #[test]
    fn test_markdown_reference() {
        let text = "Before ![A cat](images/cat.png) after";
        let refs = extract(text);

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].original_path, "images/cat.png");
        assert_eq!(refs[0].raw_span, "![A cat](images/cat.png)");
        assert_eq!(&text[refs[0].range.clone()], refs[0].raw_span);
        assert_eq!(
            refs[0].syntax,
            ReferenceSyntax::Markdown {
                caption: "A cat".to_string()
            }
        );
    }

    #[test]
    fn test_wiki_reference_with_size_hint() {
        let refs = extract("![[MyPhoto.png|300]]");

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].original_path, "MyPhoto.png");
        assert_eq!(refs[0].raw_span, "![[MyPhoto.png|300]]");
        assert_eq!(refs[0].syntax, ReferenceSyntax::Wiki);
    }

    #[test]
    fn test_markdown_path_parameters_are_stripped() {
        let refs = extract("![x]( shot.png | 200x100 )");
        assert_eq!(refs[0].original_path, "shot.png");
    }

    #[test]
    fn test_mixed_references_in_document_order() {
        let text = "![[b.png]]\n\n![first](a.png)\n![[c.jpg]]";
        let paths: Vec<_> = extract(text).into_iter().map(|r| r.original_path).collect();
        assert_eq!(paths, vec!["b.png", "a.png", "c.jpg"]);
    }

    #[test]
    fn test_empty_caption_allowed() {
        let refs = extract("![](Pasted image 20250314.png)");
        assert_eq!(refs[0].original_path, "Pasted image 20250314.png");
        assert_eq!(
            refs[0].syntax,
            ReferenceSyntax::Markdown {
                caption: String::new()
            }
        );
    }

    #[test]
    fn test_plain_links_are_not_images() {
        assert!(extract("[doc](file.pdf) and [[Other Note]]").is_empty());
    }

    #[test]
    fn test_duplicate_references_are_kept_separately() {
        let refs = extract("![[a.png]] and ![[a.png]]");
        assert_eq!(refs.len(), 2);
        assert!(refs[0].range.end <= refs[1].range.start);
    }

    #[test]
    fn test_base_name_and_remote() {
        let refs = extract("![x](../shots/2025/pic.final.png) ![y](https://example.com/a.png)");
        assert_eq!(refs[0].base_name(), "pic.final.png");
        assert!(!refs[0].is_remote());
        assert!(refs[1].is_remote());
    }
}
