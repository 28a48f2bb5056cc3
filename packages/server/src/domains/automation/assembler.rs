//! Final-content assembly: weaving uploaded images into generated
//! HTML.
//!
//! Articles are treated as flowing text split on blank lines; pages
//! are split on their h2-h4 headings so images land between sections.
//! In both variants the image for placement i is the i-th uploaded
//! image (ordinal pairing, not position pairing), and out-of-range or
//! unmatched placements are dropped silently.

use lazy_static::lazy_static;
use regex::Regex;

use super::job::UploadedImage;
use super::metadata::Placement;

lazy_static! {
    static ref SECTION_HEADING: Regex = Regex::new(r"(?is)<h[2-4][^>]*>.*?</h[2-4]>").unwrap();
    static ref SECTION_OPENING: Regex = Regex::new(r"(?i)<h[2-4][^>]*>").unwrap();
}

/// Insert images between paragraphs of an article.
pub fn assemble_article(content: &str, images: &[UploadedImage], placements: &[Placement]) -> String {
    let mut paragraphs: Vec<String> = content.split("\n\n").map(str::to_string).collect();

    // Descending position order so earlier insertions don't shift the
    // indices of later ones.
    for (ordinal, placement) in sorted_descending(placements) {
        let Some(image) = images.get(ordinal) else {
            continue;
        };
        if placement.position < paragraphs.len() {
            paragraphs.insert(placement.position + 1, figure_html(image, None));
        }
    }

    paragraphs.join("\n\n")
}

/// Insert images between sections of a page. Sections are the spans
/// between h2-h4 headings; the headings themselves count as units, as
/// do the (possibly empty) spans before the first and after the last
/// heading.
pub fn assemble_page(content: &str, images: &[UploadedImage], placements: &[Placement]) -> String {
    let mut sections = split_sections(content);

    for (ordinal, placement) in sorted_descending(placements) {
        let Some(image) = images.get(ordinal) else {
            continue;
        };
        if placement.position < sections.len() {
            let size_class = size_class(placement.size.as_deref());
            sections.insert(
                placement.position + 1,
                figure_html(image, Some(size_class)),
            );
        }
    }

    sections.join("")
}

/// Number of units the even fallback distribution spreads images
/// across for an article: blank-line-separated paragraphs.
pub fn article_unit_count(content: &str) -> usize {
    content.split("\n\n").count()
}

/// Fallback unit count for a page: one more than the number of
/// opening h2-h4 tags. Coarser than the assembly split, which also
/// counts the headings themselves.
pub fn page_unit_count(content: &str) -> usize {
    SECTION_OPENING.find_iter(content).count() + 1
}

/// Split keeping the heading delimiters as their own units. Empty
/// spans between adjacent headings (and at either end) are kept so
/// positions stay aligned with what the split produced.
fn split_sections(content: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut last = 0;
    for m in SECTION_HEADING.find_iter(content) {
        sections.push(content[last..m.start()].to_string());
        sections.push(m.as_str().to_string());
        last = m.end();
    }
    sections.push(content[last..].to_string());
    sections
}

/// Placements tagged with their original ordinal, sorted by position
/// descending.
fn sorted_descending(placements: &[Placement]) -> Vec<(usize, &Placement)> {
    let mut tagged: Vec<(usize, &Placement)> = placements.iter().enumerate().collect();
    tagged.sort_by(|a, b| b.1.position.cmp(&a.1.position));
    tagged
}

fn size_class(size: Option<&str>) -> &'static str {
    match size {
        Some("full-width") => "size-full",
        Some("half-width") => "size-medium",
        _ => "size-thumbnail",
    }
}

fn figure_html(image: &UploadedImage, size_class: Option<&str>) -> String {
    let class = match size_class {
        Some(size) => format!("wp-block-image {}", size),
        None => "wp-block-image".to_string(),
    };
    format!(
        "\n\n<figure class=\"{class}\">\n  <img src=\"{url}\" alt=\"{prompt}\" class=\"wp-image-{id}\" />\n  <figcaption>{prompt}</figcaption>\n</figure>\n\n",
        class = class,
        url = image.media_url,
        prompt = image.prompt,
        id = image.media_id,
    )
}
