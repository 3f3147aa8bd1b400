use scraper::{Html, Selector};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Text,
    Markdown,
    Json,
    Unsupported,
}

pub fn detect_content_kind(mime_type: &str, filename: Option<&str>) -> ContentKind {
    let mime = mime_type.split(';').next().unwrap_or("").trim().to_lowercase();
    match mime.as_str() {
        "text/html" => ContentKind::Html,
        "text/plain" => ContentKind::Text,
        "text/markdown" => ContentKind::Markdown,
        "application/json" => ContentKind::Json,
        _ => {
            if let Some(name) = filename {
                let ext = Path::new(name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_lowercase();
                match ext.as_str() {
                    "html" | "htm" => ContentKind::Html,
                    "txt" => ContentKind::Text,
                    "md" | "markdown" => ContentKind::Markdown,
                    "json" => ContentKind::Json,
                    _ => ContentKind::Unsupported,
                }
            } else {
                ContentKind::Unsupported
            }
        }
    }
}

pub fn extract_utf8(bytes: &[u8]) -> Result<String, std::string::FromUtf8Error> {
    String::from_utf8(bytes.to_vec())
}

/// Strips tags from an HTML document, dropping `script`/`style` content and collapsing
/// whitespace runs the way a reader would see the rendered page.
pub fn html_to_text(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("title").unwrap();
    let title = document
        .select(&title_selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let body_selector = Selector::parse("body").unwrap();
    let root = document
        .select(&body_selector)
        .next()
        .unwrap_or_else(|| document.root_element());

    let noise = Selector::parse("script, style, noscript").unwrap();
    let noise_text: Vec<String> = root
        .select(&noise)
        .map(|el| el.text().collect::<String>())
        .collect();

    let mut raw = root.text().collect::<String>();
    for chunk in &noise_text {
        if !chunk.is_empty() {
            raw = raw.replace(chunk.as_str(), " ");
        }
    }

    let collapsed: String = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (title, collapsed)
}
