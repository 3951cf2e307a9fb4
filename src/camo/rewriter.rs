//! Content rewriting.
//!
//! # Responsibilities
//! - Extract image sources once per content body
//! - Build one proxied URL per extracted source, in the same order
//! - Substitute every literal occurrence of each source with its proxied URL
//!
//! # Design Decisions
//! - Substitution is a single left-to-right pass over one automaton built
//!   from all sources; inserted proxied URLs are never re-scanned
//! - Identical sources map to the same proxied URL (many-to-one)
//! - Sources that are not absolute http(s) URLs are left untouched

use aho_corasick::{AhoCorasick, MatchKind};

use crate::camo::extractor::extract_image_urls;
use crate::camo::link::LinkBuilder;
use crate::camo::types::ImageReference;

/// Result of a rewrite pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub content: String,
    /// Number of extracted image sources that were proxied.
    pub images: usize,
}

/// Replaces image sources in rendered content with proxied URLs.
#[derive(Debug, Clone)]
pub struct ContentRewriter {
    links: LinkBuilder,
}

impl ContentRewriter {
    pub fn new(links: LinkBuilder) -> Self {
        Self { links }
    }

    pub fn links(&self) -> &LinkBuilder {
        &self.links
    }

    pub fn rewrite(&self, content: &str) -> Rewrite {
        let sources = extract_image_urls(content);
        if sources.is_empty() {
            return Rewrite {
                content: content.to_string(),
                images: 0,
            };
        }

        let mut images = 0;
        let mut replacements: Vec<(String, String)> = Vec::with_capacity(sources.len());
        for source in sources {
            // Sources are attribute text; undo the one entity a URL commonly carries.
            let image = match ImageReference::parse(source.replace("&amp;", "&").trim()) {
                Ok(image) => image,
                Err(e) => {
                    tracing::trace!(source = %source, error = %e, "Leaving image source as-is");
                    continue;
                }
            };

            images += 1;
            if replacements.iter().all(|(from, _)| *from != source) {
                let proxied = self.links.build(&image).html();
                replacements.push((source, proxied));
            }
        }

        Rewrite {
            content: replace_all(content, &replacements),
            images,
        }
    }
}

/// Single-pass multi-pattern replacement. At each position the earliest
/// match wins; ties go to the longest pattern.
fn replace_all(content: &str, replacements: &[(String, String)]) -> String {
    let (from, to): (Vec<&str>, Vec<&str>) = replacements
        .iter()
        .filter(|(from, _)| !from.is_empty())
        .map(|(from, to)| (from.as_str(), to.as_str()))
        .unzip();
    if from.is_empty() {
        return content.to_string();
    }

    match AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(&from)
    {
        Ok(automaton) => automaton.replace_all(content, &to),
        Err(e) => {
            tracing::warn!(error = %e, patterns = from.len(), "Could not build source matcher; content left as-is");
            content.to_string()
        }
    }
}
