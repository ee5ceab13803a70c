//! Row clustering of positioned text.

use super::text::TextFragment;
use crate::extract::tokens::{merge_detached_percent, tokenize_fragment, Token};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Fragments sharing a rounded baseline, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRow {
    pub y: i64,
    pub fragments: Vec<TextFragment>,
}

impl TextRow {
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn tokens(&self) -> Vec<Token> {
        merge_detached_percent(
            self.fragments
                .iter()
                .flat_map(|f| tokenize_fragment(&f.text)),
        )
    }

    /// Unsigned counts of the row, in reading order.
    pub fn integers(&self) -> Vec<u64> {
        self.tokens().iter().filter_map(Token::as_integer).collect()
    }
}

/// Groups fragments into visual rows, top of the page first.
pub fn cluster_rows(fragments: &[TextFragment]) -> Vec<TextRow> {
    let mut rows: BTreeMap<i64, Vec<TextFragment>> = BTreeMap::new();
    for fragment in fragments {
        rows.entry(fragment.y.round() as i64)
            .or_default()
            .push(fragment.clone());
    }

    rows.into_iter()
        .rev()
        .map(|(y, mut fragments)| {
            fragments.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
            TextRow { y, fragments }
        })
        .collect()
}
