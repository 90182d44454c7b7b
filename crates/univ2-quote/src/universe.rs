//! Token universe loading.
//!
//! The universe is a JSON document:
//!
//! ```json
//! { "tokens": [ { "address": "0x…", "symbol": "USDC", "decimals": 6, "blockchain": "ethereum" } ] }
//! ```
//!
//! Files ending in `.yaml` or `.yml` hold the same shape as YAML:
//!
//! ```yaml
//! tokens:
//!   - address: "0x…"
//!     symbol: USDC
//!     decimals: 6
//!     blockchain: ethereum
//! ```

use eyre::{bail, Result, WrapErr};
use serde::Deserialize;
use std::path::Path;

use crate::types::TokenDescriptor;

#[derive(Debug, Deserialize)]
struct TokenList {
    tokens: Vec<TokenDescriptor>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenListFormat {
    Json,
    Yaml,
}

impl TokenListFormat {
    /// Pick the format from the file extension. Anything but `.yaml`/`.yml`
    /// is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                TokenListFormat::Yaml
            }
            _ => TokenListFormat::Json,
        }
    }
}

/// Read and parse the token list at `path`.
pub fn load_token_universe(path: impl AsRef<Path>) -> Result<Vec<TokenDescriptor>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read token list {}", path.display()))?;
    let format = TokenListFormat::from_path(path);
    let tokens = parse_token_universe_as(&contents, format)
        .wrap_err_with(|| format!("invalid token list {}", path.display()))?;
    tracing::debug!(path = %path.display(), ?format, tokens = tokens.len(), "token universe loaded");
    Ok(tokens)
}

/// Parse a JSON token list document.
pub fn parse_token_universe(contents: &str) -> Result<Vec<TokenDescriptor>> {
    parse_token_universe_as(contents, TokenListFormat::Json)
}

pub fn parse_token_universe_as(
    contents: &str,
    format: TokenListFormat,
) -> Result<Vec<TokenDescriptor>> {
    let list: TokenList = match format {
        TokenListFormat::Json => {
            serde_json::from_str(contents).wrap_err("failed to parse token list JSON")?
        }
        TokenListFormat::Yaml => {
            serde_yaml::from_str(contents).wrap_err("failed to parse token list YAML")?
        }
    };
    if list.tokens.is_empty() {
        bail!("token list contains no tokens");
    }
    Ok(list.tokens)
}
