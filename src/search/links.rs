use serde::Serialize;

pub const MIN_TOP_K: u8 = 5;
pub const MAX_TOP_K: u8 = 20;
pub const DEFAULT_TOP_K: u8 = 10;

/// Candidate source URLs, PDFs first, at most top-K entries.
/// Duplicates from the provider are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LinkSet(Vec<String>);

impl LinkSet {
    /// Stable partition into PDF and non-PDF links, PDFs first, then truncation to `top_k`.
    pub fn rank(links: Vec<String>, top_k: usize) -> Self {
        let (mut ranked, others): (Vec<_>, Vec<_>) = links.into_iter().partition(|u| is_pdf(u));
        ranked.extend(others);
        ranked.truncate(top_k);
        Self(ranked)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// True when the URL path ends in `.pdf`, ignoring case and any query string.
pub fn is_pdf(link: &str) -> bool {
    match url::Url::parse(link) {
        Ok(parsed) => ends_with_pdf(parsed.path()),
        Err(_) => ends_with_pdf(link),
    }
}

fn ends_with_pdf(s: &str) -> bool {
    s.len() >= 4
        && s.is_char_boundary(s.len() - 4)
        && s[s.len() - 4..].eq_ignore_ascii_case(".pdf")
}
