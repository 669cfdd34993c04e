use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Tags to completely remove (including all children).
const REMOVE_TAGS: &[&str] = &["script", "style", "noscript"];

/// Class of the wrapper the site puts around an article's featured images.
const IMAGE_WRAP_CLASS: &str = "artigo-img-wrap";

/// A cleaned article plus the featured images pulled out of it.
pub struct PreparedArticle {
    doc: Html,
    pub images: Vec<String>,
}

impl PreparedArticle {
    /// The cleaned `<article>` element, ready for classification.
    pub fn root(&self) -> Option<ElementRef<'_>> {
        self.doc
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "article")
    }
}

/// Locate the article node in a full page and clean it up.
///
/// Returns `None` when the page has no node matching `article_selector`.
/// Featured-image wrappers directly under the article are removed and their
/// image URLs (made absolute against `site_base`) are returned in document
/// order; empty top-level paragraphs are dropped; scripts, styles and
/// comments are dropped anywhere.
pub fn prepare_article(
    page: &Html,
    article_selector: &Selector,
    site_base: &Url,
) -> Option<PreparedArticle> {
    let article = page.select(article_selector).next()?;

    let mut images = Vec::new();
    let mut body = String::new();

    for child in article.children() {
        if let Some(el) = ElementRef::wrap(child) {
            if el.value().classes().any(|c| c == IMAGE_WRAP_CLASS) {
                if let Some(src) = first_image_src(el) {
                    match site_base.join(src.trim()) {
                        Ok(url) => images.push(url.to_string()),
                        Err(_) => tracing::debug!(src, "skipping unresolvable image src"),
                    }
                }
                continue;
            }
            if el.value().name() == "p" && is_blank_element(el) {
                continue;
            }
        }
        serialize_node(&child, &mut body);
    }

    let doc = Html::parse_fragment(&format!("<article>{body}</article>"));
    Some(PreparedArticle { doc, images })
}

fn first_image_src(el: ElementRef<'_>) -> Option<&str> {
    el.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "img")
        .find_map(|img| img.value().attr("src"))
        .filter(|src| !src.trim().is_empty())
}

fn is_blank_element(el: ElementRef<'_>) -> bool {
    el.text().all(|t| t.trim().is_empty())
}

/// Recursively serialize the node tree, skipping unwanted tags and comments.
fn serialize_node(node: &NodeRef<Node>, out: &mut String) {
    match node.value() {
        Node::Element(el) => {
            let tag = el.name();
            if REMOVE_TAGS.contains(&tag) {
                return;
            }

            out.push('<');
            out.push_str(tag);
            for (attr, val) in el.attrs() {
                out.push(' ');
                out.push_str(attr);
                out.push_str("=\"");
                escape_attr(val, out);
                out.push('"');
            }
            if is_void_element(tag) {
                out.push_str(" />");
            } else {
                out.push('>');
                for child in node.children() {
                    serialize_node(&child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
        Node::Text(text) => {
            // Re-escape so decoded entities are not re-read as markup.
            for ch in text.text.chars() {
                match ch {
                    '&' => out.push_str("&amp;"),
                    '<' => out.push_str("&lt;"),
                    '>' => out.push_str("&gt;"),
                    _ => out.push(ch),
                }
            }
        }
        Node::Document | Node::Fragment => {
            for child in node.children() {
                serialize_node(&child, out);
            }
        }
        Node::Comment(_) | Node::ProcessingInstruction(_) | Node::Doctype(_) => {}
    }
}

fn escape_attr(val: &str, out: &mut String) {
    for ch in val.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}
