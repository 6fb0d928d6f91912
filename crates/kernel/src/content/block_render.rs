//! Review rendering.
//!
//! Two layers:
//! - `render` projects a review body into presentation nodes, one per block,
//!   lazily and in body order
//! - `render_html` turns a whole review (hero metadata plus body) into the
//!   detail page markup
//!
//! Rendering is total: blocks of a kind this build does not know become an
//! "unknown content" node instead of an error.

use serde::Serialize;

use crate::content::block::Block;
use crate::content::rating::{RatingBand, format_rating};
use crate::models::Review;

/// Shown when a review has no author name.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Alt text for images without a caption.
const DEFAULT_IMAGE_ALT: &str = "Review image";

/// One rendered unit of a review body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum PresentationNode<'a> {
    SectionHeading {
        text: &'a str,
    },
    Text {
        text: &'a str,
    },
    Figure {
        address: &'a str,
        caption: Option<&'a str>,
    },
    /// Placeholder for a block kind this build cannot display.
    Unknown {
        kind: &'a str,
    },
}

impl<'a> From<&'a Block> for PresentationNode<'a> {
    fn from(block: &'a Block) -> Self {
        match block {
            Block::Header { text } => PresentationNode::SectionHeading { text: text.as_str() },
            Block::Paragraph { text } => PresentationNode::Text { text: text.as_str() },
            Block::Image { address, caption } => PresentationNode::Figure {
                address: address.as_str(),
                caption: caption.as_deref(),
            },
            Block::Unknown(raw) => PresentationNode::Unknown {
                kind: raw.kind.as_str(),
            },
        }
    }
}

/// A rendered review body. Iterating it again starts from the first block.
#[derive(Debug, Clone, Copy)]
pub struct RenderedBody<'a> {
    blocks: &'a [Block],
}

impl<'a> RenderedBody<'a> {
    pub fn iter(&self) -> Nodes<'a> {
        Nodes {
            blocks: self.blocks.iter(),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl<'a> IntoIterator for RenderedBody<'a> {
    type Item = PresentationNode<'a>;
    type IntoIter = Nodes<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the presentation nodes of a body.
#[derive(Debug, Clone)]
pub struct Nodes<'a> {
    blocks: std::slice::Iter<'a, Block>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = PresentationNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.blocks.next().map(PresentationNode::from)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.blocks.size_hint()
    }
}

impl ExactSizeIterator for Nodes<'_> {}

/// Project a review body into presentation nodes.
pub fn render(review: &Review) -> RenderedBody<'_> {
    RenderedBody {
        blocks: &review.content,
    }
}

/// Render the full review detail page.
pub fn render_html(review: &Review) -> String {
    let mut html = String::from("<article class=\"review\">");
    html.push_str(&render_hero(review));

    html.push_str("<div class=\"review-content-body\">");
    let body = render(review);
    if body.is_empty() {
        html.push_str("<p class=\"review-empty\">This review has no detailed content.</p>");
    } else {
        for node in body {
            html.push_str(&render_node(node));
        }
    }
    html.push_str("</div></article>");
    html
}

/// Render a single presentation node.
pub fn render_node(node: PresentationNode<'_>) -> String {
    match node {
        PresentationNode::SectionHeading { text } => {
            format!("<h2 class=\"review-section-header\">{}</h2>", html_escape(text))
        }
        PresentationNode::Text { text } => {
            format!("<p class=\"review-paragraph\">{}</p>", html_escape(text))
        }
        PresentationNode::Figure { address, caption } => render_figure(address, caption),
        PresentationNode::Unknown { .. } => {
            "<div class=\"review-unknown\">Unknown content</div>".to_string()
        }
    }
}

fn render_hero(review: &Review) -> String {
    let mut html = match review.cover_image.as_deref().filter(|u| is_safe_url(u)) {
        Some(cover) => format!(
            "<header class=\"review-hero\" style=\"background-image: url('{}')\">",
            html_escape(cover)
        ),
        None => "<header class=\"review-hero\">".to_string(),
    };

    html.push_str(&format!("<h1>{}</h1>", html_escape(&review.title)));
    if let Some(subtitle) = review.subtitle.as_deref().filter(|s| !s.is_empty()) {
        html.push_str(&format!(
            "<p class=\"subtitle\">{}</p>",
            html_escape(subtitle)
        ));
    }

    let author = review
        .author
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or(ANONYMOUS_AUTHOR);
    html.push_str(&format!(
        "<div class=\"meta-info\"><span>By <strong>{}</strong></span>",
        html_escape(author)
    ));
    if let Some(created) = review.created_at {
        html.push_str(&format!(
            "<span> &bull; </span><time datetime=\"{}\">{}</time>",
            created.to_rfc3339(),
            created.format("%-d %B %Y")
        ));
    }
    html.push_str("</div>");

    let band = RatingBand::for_rating(review.rating);
    html.push_str(&format!(
        "<div class=\"rating-badge\" style=\"background-color: {}\">{}</div>",
        band.color(),
        format_rating(review.rating)
    ));
    html.push_str("</header>");
    html
}

/// Render an image block with a figure/figcaption wrapper.
fn render_figure(address: &str, caption: Option<&str>) -> String {
    let mut html = String::from("<figure class=\"review-image-container\">");
    if is_safe_url(address) {
        let alt = caption.unwrap_or(DEFAULT_IMAGE_ALT);
        html.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\">",
            html_escape(address),
            html_escape(alt)
        ));
    }
    if let Some(caption) = caption {
        html.push_str(&format!(
            "<figcaption class=\"image-caption\">{}</figcaption>",
            html_escape(caption)
        ));
    }
    html.push_str("</figure>");
    html
}

/// Asset addresses must be http(s) or site-relative.
fn is_safe_url(url: &str) -> bool {
    let trimmed = url.trim();
    trimmed.starts_with("https://")
        || trimmed.starts_with("http://")
        || (trimmed.starts_with('/') && !trimmed.starts_with("//"))
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
