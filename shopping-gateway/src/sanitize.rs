// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Item sanitization
//!
//! Escape, trim and truncate submitted items before they leave the process.
//! The pipeline is idempotent: an `&` that already starts one of the
//! entities we emit is kept as-is, and truncation never splits an entity.

use serde_json::Value;

/// Maximum length of a forwarded item, in characters.
pub const MAX_ITEM_CHARS: usize = 100;

/// Entities produced by [`escape_html`].
const ENTITIES: &[&str] = &["&amp;", "&lt;", "&gt;", "&quot;", "&#39;"];

/// Escape `< > & " '` to entity form without double-escaping.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for (idx, ch) in input.char_indices() {
        match ch {
            '&' => {
                let rest = &input[idx..];
                if ENTITIES.iter().any(|e| rest.starts_with(e)) {
                    out.push('&');
                } else {
                    out.push_str("&amp;");
                }
            }
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }

    out
}

/// Cut `input` to at most `max_chars` characters.
///
/// Input must already be escaped: every `&` starts an entity, so an `&` with
/// no `;` after it at the cut point is a split entity and is dropped whole.
fn truncate_escaped(input: &str, max_chars: usize) -> &str {
    let cut = match input.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => byte_idx,
        None => return input,
    };
    let head = &input[..cut];

    match head.rfind('&') {
        Some(amp) if !head[amp..].contains(';') => &head[..amp],
        _ => head,
    }
}

/// Sanitize a single item. Returns `None` when nothing survives.
pub fn sanitize_item(raw: &str) -> Option<String> {
    let escaped = escape_html(raw);
    let trimmed = escaped.trim();
    let truncated = truncate_escaped(trimmed, MAX_ITEM_CHARS).trim_end();

    if truncated.is_empty() {
        None
    } else {
        Some(truncated.to_string())
    }
}

/// Sanitize a submitted item list.
///
/// Non-string elements and items that end up empty are dropped; the relative
/// order of the rest is preserved.
pub fn sanitize_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .filter_map(sanitize_item)
        .collect()
}
