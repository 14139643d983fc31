//! Markdown block model for assistant replies.
//!
//! Replies are parsed into a small set of blocks the view knows how to style.
//! Anything outside that set (tables, raw HTML, images, footnotes) is flattened
//! to plain text inside the nearest block, so parsing never fails.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

/// Deepest heading level that gets its own style; deeper headings reuse it.
pub const MAX_HEADING_LEVEL: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Code(String),
    Emphasis(String),
    Strong(String),
    Strikethrough(String),
    Link { text: String, url: String },
    LineBreak,
}

impl Inline {
    pub fn plain_text(&self) -> &str {
        match self {
            Self::Text(text)
            | Self::Code(text)
            | Self::Emphasis(text)
            | Self::Strong(text)
            | Self::Strikethrough(text)
            | Self::Link { text, .. } => text,
            Self::LineBreak => "\n",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading {
        level: u8,
        inlines: Vec<Inline>,
    },
    List {
        /// First number of an ordered list, `None` for bullets.
        start: Option<u64>,
        items: Vec<Vec<Block>>,
    },
    BlockQuote(Vec<Block>),
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    Rule,
}

impl Block {
    /// Text content with all structure removed.
    pub fn plain_text(&self) -> String {
        match self {
            Self::Paragraph(inlines) | Self::Heading { inlines, .. } => inline_text(inlines),
            Self::List { items, .. } => items
                .iter()
                .map(|item| blocks_text(item))
                .collect::<Vec<_>>()
                .join("\n"),
            Self::BlockQuote(blocks) => blocks_text(blocks),
            Self::CodeBlock { code, .. } => code.clone(),
            Self::Rule => String::new(),
        }
    }
}

fn inline_text(inlines: &[Inline]) -> String {
    inlines.iter().map(Inline::plain_text).collect()
}

fn blocks_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(Block::plain_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Per-element style overrides for rendered replies.
///
/// Sizes are multiples of the base text size; spacing is in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkdownStyle {
    pub heading_scale: [f32; MAX_HEADING_LEVEL as usize],
    pub code_scale: f32,
    pub block_gap: f32,
    pub item_gap: f32,
    pub list_indent: f32,
    pub quote_border_width: f32,
    pub quote_padding: f32,
    pub code_block_padding: f32,
}

impl Default for MarkdownStyle {
    fn default() -> Self {
        Self {
            heading_scale: [1.125, 1.0, 0.875],
            code_scale: 0.75,
            block_gap: 8.0,
            item_gap: 4.0,
            list_indent: 16.0,
            quote_border_width: 2.0,
            quote_padding: 16.0,
            code_block_padding: 8.0,
        }
    }
}

impl MarkdownStyle {
    pub fn heading_scale(&self, level: u8) -> f32 {
        let index = level.clamp(1, MAX_HEADING_LEVEL) as usize - 1;
        self.heading_scale[index]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineStyle {
    Emphasis,
    Strong,
    Strikethrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpaqueKind {
    Row,
    Cell,
    Other,
}

#[derive(Debug)]
enum Frame {
    Root(Vec<Block>),
    Paragraph(Vec<Inline>),
    Heading {
        level: u8,
        inlines: Vec<Inline>,
    },
    BlockQuote(Vec<Block>),
    List {
        start: Option<u64>,
        items: Vec<Vec<Block>>,
    },
    Item {
        blocks: Vec<Block>,
        inlines: Vec<Inline>,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    Styled {
        style: InlineStyle,
        text: String,
    },
    Link {
        url: String,
        text: String,
    },
    /// Inline element without a dedicated style, kept as plain text.
    Plain(String),
    /// Block element without a dedicated style.
    Opaque {
        kind: OpaqueKind,
        blocks: Vec<Block>,
        inlines: Vec<Inline>,
    },
}

impl Frame {
    fn opaque(kind: OpaqueKind) -> Self {
        Self::Opaque {
            kind,
            blocks: Vec::new(),
            inlines: Vec::new(),
        }
    }

    fn open(tag: Tag<'_>) -> Self {
        match tag {
            Tag::Paragraph => Self::Paragraph(Vec::new()),
            Tag::Heading { level, .. } => Self::Heading {
                level: (level as u8).clamp(1, MAX_HEADING_LEVEL),
                inlines: Vec::new(),
            },
            Tag::BlockQuote(_) => Self::BlockQuote(Vec::new()),
            Tag::CodeBlock(kind) => Self::CodeBlock {
                language: match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string)
                        .filter(|language| !language.is_empty()),
                    CodeBlockKind::Indented => None,
                },
                code: String::new(),
            },
            Tag::List(start) => Self::List {
                start,
                items: Vec::new(),
            },
            Tag::Item => Self::Item {
                blocks: Vec::new(),
                inlines: Vec::new(),
            },
            Tag::Emphasis => Self::Styled {
                style: InlineStyle::Emphasis,
                text: String::new(),
            },
            Tag::Strong => Self::Styled {
                style: InlineStyle::Strong,
                text: String::new(),
            },
            Tag::Strikethrough => Self::Styled {
                style: InlineStyle::Strikethrough,
                text: String::new(),
            },
            Tag::Link { dest_url, .. } => Self::Link {
                url: dest_url.to_string(),
                text: String::new(),
            },
            Tag::Image { .. } => Self::Plain(String::new()),
            Tag::TableHead | Tag::TableRow => Self::opaque(OpaqueKind::Row),
            Tag::TableCell => Self::opaque(OpaqueKind::Cell),
            _ => Self::opaque(OpaqueKind::Other),
        }
    }
}

fn push_text_inline(inlines: &mut Vec<Inline>, inline: Inline) {
    if let (Some(Inline::Text(last)), Inline::Text(next)) = (inlines.last_mut(), &inline) {
        last.push_str(next);
        return;
    }
    inlines.push(inline);
}

fn flush_inlines(blocks: &mut Vec<Block>, inlines: &mut Vec<Inline>) {
    if inlines.is_empty() {
        return;
    }
    blocks.push(Block::Paragraph(std::mem::take(inlines)));
}

struct Builder {
    stack: Vec<Frame>,
}

impl Builder {
    fn new() -> Self {
        Self {
            stack: vec![Frame::Root(Vec::new())],
        }
    }

    fn top(&mut self) -> &mut Frame {
        // The root frame is never popped, so the stack is never empty.
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn push_inline(&mut self, inline: Inline) {
        match self.top() {
            Frame::Paragraph(inlines)
            | Frame::Heading { inlines, .. }
            | Frame::Item { inlines, .. }
            | Frame::Opaque { inlines, .. } => push_text_inline(inlines, inline),
            Frame::Styled { text, .. } | Frame::Link { text, .. } | Frame::Plain(text) => {
                text.push_str(inline.plain_text())
            }
            Frame::CodeBlock { code, .. } => code.push_str(inline.plain_text()),
            Frame::Root(blocks) | Frame::BlockQuote(blocks) => {
                blocks.push(Block::Paragraph(vec![inline]))
            }
            Frame::List { items, .. } => items.push(vec![Block::Paragraph(vec![inline])]),
        }
    }

    fn push_block(&mut self, block: Block) {
        match self.top() {
            Frame::Root(blocks) | Frame::BlockQuote(blocks) => blocks.push(block),
            Frame::Item { blocks, inlines } | Frame::Opaque { blocks, inlines, .. } => {
                flush_inlines(blocks, inlines);
                blocks.push(block);
            }
            Frame::List { items, .. } => items.push(vec![block]),
            Frame::Paragraph(inlines) | Frame::Heading { inlines, .. } => {
                push_text_inline(inlines, Inline::Text(block.plain_text()))
            }
            Frame::Styled { text, .. } | Frame::Link { text, .. } | Frame::Plain(text) => {
                text.push_str(&block.plain_text())
            }
            Frame::CodeBlock { code, .. } => code.push_str(&block.plain_text()),
        }
    }

    fn close(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };

        match frame {
            Frame::Root(_) => {}
            Frame::Paragraph(inlines) => {
                if !inlines.is_empty() {
                    self.push_block(Block::Paragraph(inlines));
                }
            }
            Frame::Heading { level, inlines } => self.push_block(Block::Heading { level, inlines }),
            Frame::BlockQuote(blocks) => self.push_block(Block::BlockQuote(blocks)),
            Frame::List { start, items } => self.push_block(Block::List { start, items }),
            Frame::Item {
                mut blocks,
                mut inlines,
            } => {
                flush_inlines(&mut blocks, &mut inlines);
                if let Frame::List { items, .. } = self.top() {
                    items.push(blocks);
                } else {
                    for block in blocks {
                        self.push_block(block);
                    }
                }
            }
            Frame::CodeBlock { language, mut code } => {
                if code.ends_with('\n') {
                    code.pop();
                }
                self.push_block(Block::CodeBlock { language, code });
            }
            Frame::Styled { style, text } => self.push_inline(match style {
                InlineStyle::Emphasis => Inline::Emphasis(text),
                InlineStyle::Strong => Inline::Strong(text),
                InlineStyle::Strikethrough => Inline::Strikethrough(text),
            }),
            Frame::Link { url, text } => self.push_inline(Inline::Link { text, url }),
            Frame::Plain(text) => self.push_inline(Inline::Text(text)),
            Frame::Opaque {
                kind: OpaqueKind::Cell,
                inlines,
                ..
            } => {
                if let Frame::Opaque {
                    inlines: row_inlines,
                    ..
                } = self.top()
                {
                    if !row_inlines.is_empty() {
                        push_text_inline(row_inlines, Inline::Text(" | ".to_string()));
                    }
                }
                for inline in inlines {
                    self.push_inline(inline);
                }
            }
            Frame::Opaque {
                mut blocks,
                mut inlines,
                ..
            } => {
                flush_inlines(&mut blocks, &mut inlines);
                for block in blocks {
                    self.push_block(block);
                }
            }
        }
    }

    fn finish(mut self) -> Vec<Block> {
        while self.stack.len() > 1 {
            self.close();
        }
        match self.stack.pop() {
            Some(Frame::Root(blocks)) => blocks,
            _ => Vec::new(),
        }
    }
}

/// Parses a reply into renderable blocks.
pub fn parse(markdown: &str) -> Vec<Block> {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut builder = Builder::new();

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(tag) => builder.stack.push(Frame::open(tag)),
            Event::End(_) => builder.close(),
            Event::Text(text) => builder.push_inline(Inline::Text(text.to_string())),
            Event::Code(code) => builder.push_inline(Inline::Code(code.to_string())),
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                builder.push_inline(Inline::Code(math.to_string()))
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                builder.push_inline(Inline::Text(html.trim_end_matches('\n').to_string()))
            }
            Event::SoftBreak => builder.push_inline(Inline::Text(" ".to_string())),
            Event::HardBreak => builder.push_inline(Inline::LineBreak),
            Event::Rule => builder.push_block(Block::Rule),
            Event::TaskListMarker(checked) => builder.push_inline(Inline::Text(
                if checked { "[x] " } else { "[ ] " }.to_string(),
            )),
            Event::FootnoteReference(label) => {
                builder.push_inline(Inline::Text(format!("[{label}]")))
            }
        }
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Inline {
        Inline::Text(value.to_string())
    }

    fn paragraph(value: &str) -> Block {
        Block::Paragraph(vec![text(value)])
    }

    #[test]
    fn empty_input_has_no_blocks() {
        assert!(parse("").is_empty());
        assert!(parse("   \n\n").is_empty());
    }

    #[test]
    fn paragraphs_and_inline_styles() {
        let blocks = parse("Hello **big** `x` *soft*\nline\n\nSecond");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![
                    text("Hello "),
                    Inline::Strong("big".to_string()),
                    text(" "),
                    Inline::Code("x".to_string()),
                    text(" "),
                    Inline::Emphasis("soft".to_string()),
                    text(" line"),
                ]),
                paragraph("Second"),
            ]
        );
    }

    #[test]
    fn headings_are_capped_at_three_levels() {
        let blocks = parse("# One\n## Two\n#### Four");
        let levels = blocks
            .iter()
            .map(|block| match block {
                Block::Heading { level, .. } => *level,
                other => panic!("unexpected block {other:?}"),
            })
            .collect::<Vec<_>>();
        assert_eq!(levels, vec![1, 2, 3]);
    }

    #[test]
    fn ordered_and_nested_lists() {
        let blocks = parse("3. three\n4. four\n   - inner");
        assert_eq!(
            blocks,
            vec![Block::List {
                start: Some(3),
                items: vec![
                    vec![paragraph("three")],
                    vec![
                        paragraph("four"),
                        Block::List {
                            start: None,
                            items: vec![vec![paragraph("inner")]],
                        },
                    ],
                ],
            }]
        );
    }

    #[test]
    fn quotes_and_fenced_code() {
        let blocks = parse("> quoted\n\n```rust\nfn main() {}\n```");
        assert_eq!(
            blocks,
            vec![
                Block::BlockQuote(vec![paragraph("quoted")]),
                Block::CodeBlock {
                    language: Some("rust".to_string()),
                    code: "fn main() {}".to_string(),
                },
            ]
        );
    }

    #[test]
    fn unterminated_fence_still_yields_code() {
        let blocks = parse("```\nlet x = 1;\n");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                language: None,
                code: "let x = 1;".to_string(),
            }]
        );
    }

    #[test]
    fn tables_degrade_to_plain_rows() {
        let blocks = parse("| a | b |\n|---|---|\n| 1 | 2 |");
        assert_eq!(blocks, vec![paragraph("a | b"), paragraph("1 | 2")]);
    }

    #[test]
    fn raw_html_is_kept_as_text() {
        let blocks = parse("<div>hi</div>");
        assert_eq!(blocks, vec![paragraph("<div>hi</div>")]);
    }

    #[test]
    fn links_keep_their_target() {
        let blocks = parse("see [docs](https://example.com)");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("see "),
                Inline::Link {
                    text: "docs".to_string(),
                    url: "https://example.com".to_string(),
                },
            ])]
        );
    }

    #[test]
    fn heading_scale_clamps_level() {
        let style = MarkdownStyle::default();
        assert_eq!(style.heading_scale(0), style.heading_scale[0]);
        assert_eq!(style.heading_scale(6), style.heading_scale[2]);
    }
}
