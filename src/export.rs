use anyhow::{Context, Result};
use pulldown_cmark::{html, Parser};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::{self, Kind};
use crate::prompts::ARTICLE_FALLBACK_TITLE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// HTML that word processors open as a document.
    Word,
    PlainText,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Word => "doc",
            ExportFormat::PlainText => "txt",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Word => "application/msword",
            ExportFormat::PlainText => "text/plain;charset=utf-8",
        }
    }
}

pub fn file_name(report_title: &str, format: ExportFormat) -> String {
    let cleaned: String = report_title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let title = if cleaned.is_empty() {
        ARTICLE_FALLBACK_TITLE
    } else {
        cleaned.as_str()
    };
    format!("【深度專題】{}.{}", title, format.extension())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn word_document(report_title: &str, article: &str) -> String {
    let mut body = String::new();
    html::push_html(&mut body, Parser::new(article));

    format!(
        "<html xmlns:o='urn:schemas-microsoft-com:office:office' \
xmlns:w='urn:schemas-microsoft-com:office:word' \
xmlns='http://www.w3.org/TR/REC-html40'>\
<head><meta charset='utf-8'><title>{}</title>\
<style>body {{ font-family: 'Microsoft JhengHei', 'PingFang TC', serif; line-height: 1.8; }}\
blockquote {{ border-left: 4px solid #a16207; padding-left: 12px; color: #444; }}</style>\
</head><body>{}</body></html>",
        escape_html(report_title),
        body
    )
}

pub fn render(report_title: &str, article: &str, format: ExportFormat) -> String {
    match format {
        ExportFormat::Word => word_document(report_title, article),
        ExportFormat::PlainText => article.to_string(),
    }
}

pub fn write_article(
    dir: &Path,
    report_title: &str,
    article: &str,
    format: ExportFormat,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;
    let path = dir.join(file_name(report_title, format));
    fs::write(&path, render(report_title, article, format))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    logging::log_with(
        Kind::Export,
        format!("Saved {} ({})", path.display(), format.mime_type()),
    );
    Ok(path)
}
