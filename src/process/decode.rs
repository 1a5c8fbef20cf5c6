// src/process/decode.rs
use encoding_rs::WINDOWS_1252;
use tracing::debug;

/// One way of turning raw report bytes into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    /// Strict UTF-8; a leading byte-order mark is dropped.
    Utf8,
    /// Windows-1252, the superset browsers use for "latin-1".
    Windows1252,
    /// UTF-8 with invalid sequences replaced by U+FFFD.
    LossyUtf8,
}

/// Strategies in the order they are tried. The last one cannot fail.
pub const DECODE_CHAIN: [DecodeStrategy; 3] = [
    DecodeStrategy::Utf8,
    DecodeStrategy::Windows1252,
    DecodeStrategy::LossyUtf8,
];

impl DecodeStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            DecodeStrategy::Utf8 => "utf-8",
            DecodeStrategy::Windows1252 => "windows-1252",
            DecodeStrategy::LossyUtf8 => "utf-8 (lossy)",
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            DecodeStrategy::Utf8 => std::str::from_utf8(bytes)
                .ok()
                .map(|s| s.strip_prefix('\u{feff}').unwrap_or(s).to_string()),
            DecodeStrategy::Windows1252 => WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|cow| cow.into_owned()),
            DecodeStrategy::LossyUtf8 => Some(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

/// Run `bytes` through [`DECODE_CHAIN`] and return the first success along
/// with the strategy that produced it.
pub fn decode_with(bytes: &[u8], chain: &[DecodeStrategy]) -> Option<(String, DecodeStrategy)> {
    chain.iter().find_map(|strategy| {
        let text = strategy.decode(bytes);
        if text.is_none() {
            debug!(strategy = strategy.name(), "decode failed, trying next");
        }
        text.map(|t| (t, *strategy))
    })
}

/// Decode report bytes. Never fails; at worst some characters are replaced.
pub fn decode_text(bytes: &[u8]) -> (String, DecodeStrategy) {
    decode_with(bytes, &DECODE_CHAIN).unwrap_or_else(|| {
        (
            String::from_utf8_lossy(bytes).into_owned(),
            DecodeStrategy::LossyUtf8,
        )
    })
}
