// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Default catalog of pre-offered shopping items.

/// Items offered before any customization, in display order.
pub const DEFAULT_ITEMS: &[&str] = &[
    "牛乳",
    "卵",
    "食パン",
    "米",
    "納豆",
    "豆腐",
    "バナナ",
    "玉ねぎ",
    "トイレットペーパー",
    "洗剤",
];

/// Case-sensitive membership test against [`DEFAULT_ITEMS`].
pub fn is_default_item(item: &str) -> bool {
    DEFAULT_ITEMS.contains(&item)
}
