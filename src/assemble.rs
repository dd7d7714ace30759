//! Markdown assembly: stitch per-page OCR output into one document.
//!
//! The OCR service returns one Markdown fragment per physical page. Figures
//! inside a page are not inlined by the service; instead the fragment contains
//! a placeholder image tag whose alt text and target both equal the image id,
//! conventionally `![img-0.jpeg](img-0.jpeg)`, and the page carries a side
//! list of image records mapping each id to a data-URI-ready base64 payload.
//!
//! This module resolves those placeholders and joins the pages. It is the one
//! piece of first-party logic in the crate, so it is kept pure and isolated:
//! no I/O, no shared state, no failure paths.
//!
//! ## Substitution is literal, by design
//!
//! The match is an exact-string replace of `![id](id)`, not a structural
//! Markdown parse and not regex-escaped. An id containing Markdown-special
//! characters could in principle under- or over-match. This mirrors what the
//! OCR provider actually emits (opaque generated ids) and keeps the pass
//! trivially auditable. Callers depend only on the function contracts here,
//! so a structural-parse implementation could be substituted later without
//! touching them.

use crate::api::OcrPage;
use std::collections::BTreeMap;
use tracing::debug;

/// Replace image placeholders in one page's Markdown with their payloads.
///
/// For every id in `images`, each literal occurrence of `![id](id)` in
/// `markdown` becomes `![id](payload)`.
///
/// * Ids in the mapping that never appear in the text are ignored.
/// * Placeholders naming an id absent from the mapping pass through
///   untouched.
/// * Running the function again on its own output is a no-op once no
///   placeholder matching a mapped id remains.
///
/// A `BTreeMap` keeps iteration order stable, so the pass is deterministic
/// for any input.
pub fn resolve_page_images(markdown: &str, images: &BTreeMap<String, String>) -> String {
    let mut resolved = markdown.to_string();
    for (id, payload) in images {
        let placeholder = format!("![{id}]({id})");
        let replacement = format!("![{id}]({payload})");
        resolved = resolved.replace(&placeholder, &replacement);
    }
    resolved
}

/// Combine the Markdown of all pages, resolving each page's placeholders
/// against that page's own image records.
///
/// Pages are joined with exactly one blank line (`"\n\n"`); an empty page
/// list produces an empty string. Image records are scoped per page, so an
/// id reused on two pages resolves to each page's own payload. Within a
/// page, a duplicated id takes the last record's payload.
///
/// Image records without a payload (inline images not requested) are
/// skipped, which leaves their placeholders intact in the output.
pub fn assemble(pages: &[OcrPage]) -> String {
    let mut fragments: Vec<String> = Vec::with_capacity(pages.len());

    for page in pages {
        let mut images: BTreeMap<String, String> = BTreeMap::new();
        for img in &page.images {
            if let Some(ref payload) = img.image_base64 {
                images.insert(img.id.clone(), payload.clone());
            }
        }
        debug!(
            "Assembling page {}: {} chars, {} inline images",
            page.index,
            page.markdown.len(),
            images.len()
        );
        fragments.push(resolve_page_images(&page.markdown, &images));
    }

    fragments.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{OcrImage, OcrPage};

    fn page(index: usize, markdown: &str, images: &[(&str, &str)]) -> OcrPage {
        OcrPage {
            index,
            markdown: markdown.to_string(),
            images: images
                .iter()
                .map(|(id, payload)| OcrImage {
                    id: id.to_string(),
                    image_base64: Some(payload.to_string()),
                    ..OcrImage::default()
                })
                .collect(),
            dimensions: None,
        }
    }

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn single_placeholder_resolved() {
        let pages = vec![page(0, "![a](a)", &[("a", "DATA1")])];
        assert_eq!(assemble(&pages), "![a](DATA1)");
    }

    #[test]
    fn cross_page_ids_do_not_leak() {
        let pages = vec![
            page(0, "X ![img](img)", &[("img", "P1")]),
            page(1, "Y ![img](img)", &[("img", "P2")]),
        ];
        assert_eq!(assemble(&pages), "X ![img](P1)\n\nY ![img](P2)");
    }

    #[test]
    fn empty_document_yields_empty_string() {
        assert_eq!(assemble(&[]), "");
    }

    #[test]
    fn unused_mapping_entries_change_nothing() {
        let pages = vec![page(0, "no images here", &[("unused", "P")])];
        assert_eq!(assemble(&pages), "no images here");
    }

    #[test]
    fn empty_mapping_returns_markdown_unchanged() {
        let md = "# Title\n\n![orphan](orphan)";
        assert_eq!(resolve_page_images(md, &BTreeMap::new()), md);
    }

    #[test]
    fn unmapped_placeholder_passes_through() {
        let md = "![known](known) and ![missing](missing)";
        let out = resolve_page_images(md, &map(&[("known", "B64")]));
        assert_eq!(out, "![known](B64) and ![missing](missing)");
    }

    #[test]
    fn every_occurrence_is_replaced() {
        let md = "![fig](fig) text ![fig](fig)";
        let out = resolve_page_images(md, &map(&[("fig", "DATA")]));
        assert_eq!(out, "![fig](DATA) text ![fig](DATA)");
    }

    #[test]
    fn resolution_is_idempotent_once_resolved() {
        let images = map(&[("fig", "data:image/png;base64,AAAA")]);
        let once = resolve_page_images("![fig](fig)", &images);
        let twice = resolve_page_images(&once, &images);
        assert_eq!(once, twice);
    }

    #[test]
    fn assemble_is_deterministic() {
        let pages = vec![
            page(0, "![a](a) ![b](b)", &[("b", "B"), ("a", "A")]),
            page(1, "tail", &[]),
        ];
        assert_eq!(assemble(&pages), assemble(&pages));
        assert_eq!(assemble(&pages), "![a](A) ![b](B)\n\ntail");
    }

    #[test]
    fn duplicate_ids_within_page_last_write_wins() {
        let pages = vec![page(0, "![img](img)", &[("img", "FIRST"), ("img", "SECOND")])];
        assert_eq!(assemble(&pages), "![img](SECOND)");
    }

    #[test]
    fn page_order_is_preserved() {
        let pages = vec![page(0, "one", &[]), page(1, "two", &[]), page(2, "three", &[])];
        assert_eq!(assemble(&pages), "one\n\ntwo\n\nthree");
    }

    #[test]
    fn records_without_payload_leave_placeholder_intact() {
        let pages = vec![OcrPage {
            index: 0,
            markdown: "![img-0](img-0)".into(),
            images: vec![OcrImage {
                id: "img-0".into(),
                image_base64: None,
                ..OcrImage::default()
            }],
            dimensions: None,
        }];
        assert_eq!(assemble(&pages), "![img-0](img-0)");
    }

    #[test]
    fn alt_only_and_target_only_mentions_are_not_placeholders() {
        // The placeholder pattern requires alt and target to both equal the id.
        let md = "![caption](fig) and ![fig](real.png)";
        let out = resolve_page_images(md, &map(&[("fig", "DATA")]));
        assert_eq!(out, md);
    }
}
