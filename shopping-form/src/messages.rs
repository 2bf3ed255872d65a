// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use std::fmt;
use std::str::FromStr;

/// User-facing message table.
#[derive(Debug)]
pub struct Messages {
    /// Submit attempted with nothing selected
    pub select_or_add: &'static str,
    /// Submission accepted
    pub sent: &'static str,
    /// Prefix for server-reported errors
    pub error_prefix: &'static str,
    /// Fallback when the server gave no message
    pub server_error: &'static str,
    /// Network failure
    pub send_failed: &'static str,
}

const JA: Messages = Messages {
    select_or_add: "アイテムを選択するか追加してください",
    sent: "送信完了",
    error_prefix: "エラー: ",
    server_error: "サーバーエラーが発生しました",
    send_failed: "送信に失敗しました",
};

const EN: Messages = Messages {
    select_or_add: "Please select or add items",
    sent: "Sent",
    error_prefix: "Error: ",
    server_error: "A server error occurred",
    send_failed: "Failed to send",
};

/// Supported UI languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Ja,
    En,
}

impl Locale {
    pub fn messages(self) -> &'static Messages {
        match self {
            Locale::Ja => &JA,
            Locale::En => &EN,
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ja" | "ja-jp" => Ok(Locale::Ja),
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::Ja => f.write_str("ja"),
            Locale::En => f.write_str("en"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locale() {
        assert_eq!("ja".parse::<Locale>().unwrap(), Locale::Ja);
        assert_eq!("EN-us".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn test_default_is_japanese() {
        assert_eq!(Locale::default().messages().sent, "送信完了");
    }
}
