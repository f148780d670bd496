//! Ticker extraction from free text.
//!
//! A ticker is written inline as `$` followed by one to five uppercase ASCII
//! letters (`$AAPL`). Lowercase symbols are not tickers.

use std::sync::LazyLock;

use regex::Regex;

/// Longest accepted symbol.
pub const MAX_TICKER_LEN: usize = 5;

static TICKER_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\$([A-Z]{1,5})").expect("ticker pattern is valid"));

/// Extract tickers from `text`, without the `$`, deduplicated in order of
/// first appearance.
///
/// ```
/// use tradingmind_core::tickers::extract_tickers;
///
/// let tickers = extract_tickers("$AAPL up, $aapl down, $MSFT flat, $AAPL again");
/// assert_eq!(tickers, ["AAPL", "MSFT"]);
/// ```
pub fn extract_tickers(text: &str) -> Vec<String> {
  let mut tickers: Vec<String> = Vec::new();
  for cap in TICKER_PATTERN.captures_iter(text) {
    let symbol = &cap[1];
    if !tickers.iter().any(|t| t == symbol) {
      tickers.push(symbol.to_owned());
    }
  }
  tickers
}

/// Whether `symbol` is a well-formed ticker (without the `$`).
pub fn is_ticker(symbol: &str) -> bool {
  (1..=MAX_TICKER_LEN).contains(&symbol.len())
    && symbol.bytes().all(|b| b.is_ascii_uppercase())
}

/// Drop malformed symbols and duplicates, keeping first-seen order.
pub fn sanitize(tickers: Vec<String>) -> Vec<String> {
  let mut out: Vec<String> = Vec::with_capacity(tickers.len());
  for t in tickers {
    if is_ticker(&t) && !out.contains(&t) {
      out.push(t);
    }
  }
  out
}
