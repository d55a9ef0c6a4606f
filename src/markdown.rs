use pulldown_cmark::{Event, Parser, Tag};

/// Flat block structure of a generated article, enough for the article view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(u8, String),
    Paragraph(String),
    Quote(String),
    ListItem(String),
    Rule,
}

pub fn blocks(markdown: &str) -> Vec<Block> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut quote_depth = 0usize;
    let mut item_depth = 0usize;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::BlockQuote) => quote_depth += 1,
            Event::End(Tag::BlockQuote) => quote_depth = quote_depth.saturating_sub(1),
            Event::Start(Tag::Item) => {
                // Text of the parent item ends where a nested item starts.
                if item_depth > 0 {
                    push_text(&mut out, Block::ListItem, &mut buf);
                }
                item_depth += 1;
                buf.clear();
            }
            Event::End(Tag::Item) => {
                push_text(&mut out, Block::ListItem, &mut buf);
                item_depth = item_depth.saturating_sub(1);
            }
            Event::Start(Tag::Heading(..)) | Event::Start(Tag::CodeBlock(_)) => buf.clear(),
            Event::End(Tag::Heading(level, ..)) => {
                let text = buf.trim().to_string();
                buf.clear();
                if !text.is_empty() {
                    out.push(Block::Heading(level as u8, text));
                }
            }
            Event::End(Tag::CodeBlock(_)) => push_text(&mut out, Block::Paragraph, &mut buf),
            Event::Start(Tag::Paragraph) => {
                if item_depth == 0 {
                    buf.clear();
                } else if !buf.is_empty() {
                    buf.push('\n');
                }
            }
            Event::End(Tag::Paragraph) => {
                if item_depth > 0 {
                    continue;
                }
                if quote_depth > 0 {
                    push_text(&mut out, Block::Quote, &mut buf);
                } else {
                    push_text(&mut out, Block::Paragraph, &mut buf);
                }
            }
            Event::Text(text) | Event::Code(text) => buf.push_str(&text),
            Event::SoftBreak | Event::HardBreak => buf.push('\n'),
            Event::Rule => out.push(Block::Rule),
            _ => {}
        }
    }

    if !buf.trim().is_empty() {
        out.push(Block::Paragraph(buf.trim().to_string()));
    }
    out
}

fn push_text(out: &mut Vec<Block>, make: fn(String) -> Block, buf: &mut String) {
    let text = buf.trim().to_string();
    buf.clear();
    if !text.is_empty() {
        out.push(make(text));
    }
}
