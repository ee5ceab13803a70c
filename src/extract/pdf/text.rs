//! Positioned text from PDF content streams.
//!
//! Only the text-positioning operators are interpreted; glyph widths are not
//! known, so consecutive show operators without a move share an origin.
//! Strings are decoded as UTF-16BE when they carry a byte-order mark and as
//! Latin-1 otherwise. Fonts with custom CID encodings come out garbled.

use crate::error::CollectError;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object};

/// A run of text and the user-space origin it was drawn at.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// TJ adjustments beyond this many thousandths of an em are word gaps.
const WORD_GAP: f64 = 200.0;

fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn matrix(operands: &[Object]) -> Option<Matrix> {
    let values: Vec<f64> = operands.iter().filter_map(number).collect();
    values.try_into().ok()
}

fn decode_text(bytes: &[u8]) -> String {
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[derive(Debug)]
struct TextState {
    ctm: Matrix,
    saved: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    leading: f64,
}

impl TextState {
    fn new() -> Self {
        Self {
            ctm: IDENTITY,
            saved: Vec::new(),
            tm: IDENTITY,
            tlm: IDENTITY,
            leading: 0.0,
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.tlm = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn origin(&self) -> (f64, f64) {
        let m = multiply(&self.tm, &self.ctm);
        (m[4], m[5])
    }

    fn emit(&self, text: String, fragments: &mut Vec<TextFragment>) {
        if text.trim().is_empty() {
            return;
        }
        let (x, y) = self.origin();
        fragments.push(TextFragment { text, x, y });
    }
}

/// Interprets one content stream into positioned fragments, in drawing order.
pub fn fragments(operations: &[Operation]) -> Vec<TextFragment> {
    let mut state = TextState::new();
    let mut fragments = Vec::new();

    for op in operations {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "q" => state.saved.push(state.ctm),
            "Q" => {
                if let Some(ctm) = state.saved.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = matrix(operands) {
                    state.ctm = multiply(&m, &state.ctm);
                }
            }
            "BT" => {
                state.tm = IDENTITY;
                state.tlm = IDENTITY;
            }
            "Tm" => {
                if let Some(m) = matrix(operands) {
                    state.tm = m;
                    state.tlm = m;
                }
            }
            "Td" | "TD" => {
                if let [tx, ty] = operands {
                    let (Some(tx), Some(ty)) = (number(tx), number(ty)) else {
                        continue;
                    };
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.move_line(tx, ty);
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    state.leading = leading;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    state.emit(decode_text(bytes), &mut fragments);
                }
            }
            "'" => {
                state.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    state.emit(decode_text(bytes), &mut fragments);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    state.emit(decode_text(bytes), &mut fragments);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let mut text = String::new();
                    for item in items {
                        match item {
                            Object::String(bytes, _) => text.push_str(&decode_text(bytes)),
                            other => {
                                if number(other).is_some_and(|adjust| adjust < -WORD_GAP) {
                                    text.push(' ');
                                }
                            }
                        }
                    }
                    state.emit(text, &mut fragments);
                }
            }
            _ => {}
        }
    }
    fragments
}

/// Loads a PDF and returns the fragments of every page, in page order.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<Vec<TextFragment>>, CollectError> {
    let document = Document::load_mem(bytes)
        .map_err(|e| CollectError::structure(format!("unreadable PDF: {}", e)))?;

    let mut pages = Vec::new();
    for (number, page_id) in document.get_pages() {
        let content = document.get_page_content(page_id).map_err(|e| {
            CollectError::structure(format!("unreadable content on page {}: {}", number, e))
        })?;
        let content = Content::decode(&content).map_err(|e| {
            CollectError::structure(format!("undecodable content on page {}: {}", number, e))
        })?;
        pages.push(fragments(&content.operations));
    }
    tracing::trace!(pages = pages.len(), "Extracted PDF text");
    Ok(pages)
}
