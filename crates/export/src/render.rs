//! Render engine contract and the plain-text reference renderer.

use crate::document::{Block, PortfolioDocument};
use crate::error::Result;

/// Turns a paginated portfolio into output bytes. PDF and other layout
/// engines live outside this crate and plug in here.
pub trait PortfolioRenderer {
    fn render(&self, document: &PortfolioDocument) -> Result<Vec<u8>>;
}

/// Reference renderer producing UTF-8 text, one form feed per page break.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextRenderer;

impl PlainTextRenderer {
    fn render_block(block: &Block, out: &mut String) {
        match block {
            Block::Banner { title, subtitle } => {
                out.push_str(title);
                out.push('\n');
                out.push_str(subtitle);
                out.push_str("\n\n");
            }
            Block::SectionHeading(text) => {
                out.push_str(text);
                out.push('\n');
            }
            Block::FieldTable(rows) => {
                for (label, value) in rows {
                    out.push_str(&format!("{}: {}\n", label, value));
                }
                out.push('\n');
            }
            Block::Paragraph(text) => {
                out.push_str(text);
                out.push_str("\n\n");
            }
            Block::Link { label, .. } => {
                out.push_str(label);
                out.push('\n');
            }
            Block::Table { header, rows } => {
                out.push_str(&header.join(" | "));
                out.push('\n');
                for row in rows {
                    out.push_str(&row.join(" | "));
                    out.push('\n');
                }
                out.push('\n');
            }
            Block::Entry {
                title,
                lines,
                link,
                image,
            } => {
                out.push_str(title);
                out.push('\n');
                if image.is_some() {
                    out.push_str("[certificate image]\n");
                }
                for line in lines {
                    out.push_str(line);
                    out.push('\n');
                }
                if let Some((label, url)) = link {
                    out.push_str(&format!("{}: {}\n", label, url));
                }
                out.push('\n');
            }
        }
    }
}

impl PortfolioRenderer for PlainTextRenderer {
    fn render(&self, document: &PortfolioDocument) -> Result<Vec<u8>> {
        let mut out = String::new();
        for (index, page) in document.pages.iter().enumerate() {
            if index > 0 {
                out.push('\u{000C}');
            }
            for block in &page.blocks {
                Self::render_block(block, &mut out);
            }
            out.push_str(&document.footer_line(index));
            out.push('\n');
        }
        Ok(out.into_bytes())
    }
}
