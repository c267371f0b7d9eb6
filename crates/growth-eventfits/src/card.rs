//! FITS header cards: 80-byte keyword records grouped in 2880-byte blocks.

use crate::error::{Error, Result};

/// FITS block size in bytes.
pub const BLOCK_SIZE: usize = 2880;

/// FITS card (keyword record) size in bytes.
pub const CARD_SIZE: usize = 80;

/// Number of cards that fit in a single block.
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// Round `num_bytes` up to a whole number of blocks.
pub const fn padded_byte_len(num_bytes: usize) -> usize {
    num_bytes.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

/// A parsed header value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Logical(bool),
    Integer(i64),
    Float(f64),
    String(String),
    ComplexInt(i64, i64),
    ComplexFloat(f64, f64),
}

impl Value {
    /// Numeric value, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Convert to the JSON representation used in event metadata.
    /// Complex values become `[re, im]`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Logical(b) => Json::Bool(*b),
            Value::Integer(n) => Json::from(*n),
            Value::Float(f) => Json::from(*f),
            Value::String(s) => Json::String(s.clone()),
            Value::ComplexInt(re, im) => Json::from(vec![*re, *im]),
            Value::ComplexFloat(re, im) => Json::from(vec![*re, *im]),
        }
    }
}

/// One header card.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Keyword with trailing spaces removed.
    pub keyword: String,
    pub value: Option<Value>,
    pub comment: Option<String>,
}

impl Card {
    pub fn is_end(&self) -> bool {
        self.keyword == "END"
    }

    /// COMMENT, HISTORY and blank-keyword cards.
    pub fn is_commentary(&self) -> bool {
        matches!(self.keyword.as_str(), "COMMENT" | "HISTORY" | "")
    }
}

/// Parse a single 80-byte card.
pub fn parse_card(bytes: &[u8; CARD_SIZE]) -> Result<Card> {
    let raw_keyword = &bytes[..8];
    if !raw_keyword
        .iter()
        .all(|b| matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b' ' | b'-' | b'_'))
    {
        return Err(Error::InvalidKeyword);
    }
    let keyword = std::str::from_utf8(raw_keyword)
        .map_err(|_| Error::InvalidKeyword)?
        .trim_end()
        .to_string();

    let mut card = Card {
        keyword,
        value: None,
        comment: None,
    };
    if card.is_end() {
        return Ok(card);
    }

    let has_value = !card.is_commentary() && bytes[8] == b'=' && bytes[9] == b' ';
    if has_value {
        let (value, comment) = parse_value_field(&bytes[10..]);
        card.value = value;
        card.comment = comment;
    } else {
        let text = String::from_utf8_lossy(&bytes[8..]);
        let text = text.trim_end();
        if !text.is_empty() {
            card.comment = Some(text.to_string());
        }
    }
    Ok(card)
}

/// Parse the 70-byte value field into a value and an optional comment.
fn parse_value_field(field: &[u8]) -> (Option<Value>, Option<String>) {
    let text = String::from_utf8_lossy(field);
    let text = text.trim_start();

    if let Some(rest) = text.strip_prefix('\'') {
        let (s, remainder) = take_quoted(rest);
        return (Some(Value::String(s)), comment_after(remainder));
    }

    let (value_text, comment) = match text.find('/') {
        Some(idx) => (&text[..idx], comment_after(&text[idx..])),
        None => (text, None),
    };
    (parse_scalar(value_text.trim()), comment)
}

/// Read a quoted string body (opening quote already consumed). A doubled
/// quote is a literal quote. Returns the trimmed string and what follows the
/// closing quote.
fn take_quoted(rest: &str) -> (String, &str) {
    let mut value = String::new();
    let mut chars = rest.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if matches!(chars.peek(), Some((_, '\''))) {
                value.push('\'');
                chars.next();
            } else {
                return (value.trim_end().to_string(), &rest[i + 1..]);
            }
        } else {
            value.push(c);
        }
    }
    (value.trim_end().to_string(), "")
}

fn comment_after(remainder: &str) -> Option<String> {
    let idx = remainder.find('/')?;
    let comment = remainder[idx + 1..].trim();
    (!comment.is_empty()).then(|| comment.to_string())
}

fn parse_scalar(text: &str) -> Option<Value> {
    match text {
        "" => return None,
        "T" => return Some(Value::Logical(true)),
        "F" => return Some(Value::Logical(false)),
        _ => {}
    }

    if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        let (re, im) = inner.split_once(',')?;
        let (re, im) = (re.trim(), im.trim());
        if let (Ok(re), Ok(im)) = (re.parse::<i64>(), im.parse::<i64>()) {
            return Some(Value::ComplexInt(re, im));
        }
        return Some(Value::ComplexFloat(parse_float(re)?, parse_float(im)?));
    }

    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::Integer(n));
    }
    parse_float(text).map(Value::Float)
}

/// Parse a float, accepting the FITS `D` exponent.
fn parse_float(s: &str) -> Option<f64> {
    s.replace(['D', 'd'], "E").parse().ok()
}

/// Parse header blocks from the start of `data` up to and including the END
/// card. Returns the cards (END excluded) and the header length in bytes.
pub fn parse_header(data: &[u8]) -> Result<(Vec<Card>, usize)> {
    // Only whole blocks are scanned.
    let whole_blocks = data.len() / BLOCK_SIZE * BLOCK_SIZE;
    let mut cards = Vec::new();
    for (i, chunk) in data[..whole_blocks].chunks_exact(CARD_SIZE).enumerate() {
        let bytes: &[u8; CARD_SIZE] = chunk.try_into().map_err(|_| Error::UnexpectedEof)?;
        let card = parse_card(bytes)?;
        if card.is_end() {
            let blocks = i / CARDS_PER_BLOCK + 1;
            return Ok((cards, blocks * BLOCK_SIZE));
        }
        cards.push(card);
    }
    Err(Error::UnexpectedEof)
}
