//! Region header parsing
//!
//! Region columns carry a two-line header: the region code on the first line
//! and a human-readable name on the following line(s), e.g.
//! `"CZ010\nHlavní město Praha"`.

use thiserror::Error;

/// Why a header could not be split into code and name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// No line break separates the code from the name
    #[error("no line break between region code and name")]
    MissingLineBreak,

    /// The first line is blank
    #[error("region code is empty")]
    EmptyCode,
}

/// A parsed region header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionHeader {
    /// Region code (NUTS), used as the column key
    pub code: String,
    /// Display name, lines joined with single spaces
    pub name: String,
}

/// Split a raw two-line header into region code and display name.
///
/// The first line, trimmed, is the code. Remaining non-blank lines are trimmed
/// and joined with a single space. `\r\n` line endings are accepted.
///
/// # Errors
///
/// - [`HeaderError::MissingLineBreak`] if `raw` contains no `\n`
/// - [`HeaderError::EmptyCode`] if the first line is blank
///
/// # Examples
/// ```
/// use agedist_core::parse_region_header;
///
/// let header = parse_region_header("CZ010\nHlavní město\nPraha").unwrap();
/// assert_eq!(header.code, "CZ010");
/// assert_eq!(header.name, "Hlavní město Praha");
/// ```
pub fn parse_region_header(raw: &str) -> Result<RegionHeader, HeaderError> {
    let (first, rest) = raw.split_once('\n').ok_or(HeaderError::MissingLineBreak)?;

    let code = first.trim();
    if code.is_empty() {
        return Err(HeaderError::EmptyCode);
    }

    let name = rest
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(RegionHeader {
        code: code.to_string(),
        name,
    })
}

/// Fallback for headers that do not split: the whole text becomes the code.
pub fn whole_text_header(raw: &str) -> RegionHeader {
    RegionHeader {
        code: raw.trim().to_string(),
        name: String::new(),
    }
}
