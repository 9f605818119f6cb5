//! Header cards: 80-byte keyword records grouped in 2880-byte blocks.

use crate::error::{FitsError, Result};

/// FITS logical record size.
pub const BLOCK_SIZE: usize = 2880;

/// Size of one header card.
pub const CARD_SIZE: usize = 80;

/// Round `len` up to a whole number of blocks.
pub fn padded_len(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

/// [`padded_len`], or `None` when the padded length does not fit in `usize`.
pub fn checked_padded_len(len: usize) -> Option<usize> {
    len.checked_next_multiple_of(BLOCK_SIZE)
}

/// A header value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Logical(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Ordered keyword/value list of one HDU.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    cards: Vec<(String, Value)>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a card. Keywords longer than eight characters are truncated.
    pub fn push(&mut self, keyword: &str, value: Value) -> &mut Self {
        let keyword: String = keyword.chars().take(8).collect::<String>().to_ascii_uppercase();
        self.cards.push((keyword, value));
        self
    }

    pub fn get(&self, keyword: &str) -> Option<&Value> {
        self.cards.iter().find(|(k, _)| k == keyword).map(|(_, v)| v)
    }

    pub fn get_int(&self, keyword: &str) -> Option<i64> {
        match self.get(keyword)? {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn get_float(&self, keyword: &str) -> Option<f64> {
        match self.get(keyword)? {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn get_text(&self, keyword: &str) -> Option<&str> {
        match self.get(keyword)? {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_logical(&self, keyword: &str) -> Option<bool> {
        match self.get(keyword)? {
            Value::Logical(b) => Some(*b),
            _ => None,
        }
    }

    pub fn require_int(&self, keyword: &str) -> Result<i64> {
        self.get_int(keyword)
            .ok_or_else(|| FitsError::MissingKeyword(keyword.to_string()))
    }

    /// Required non-negative integer, e.g. an axis length.
    pub fn require_size(&self, keyword: &str) -> Result<usize> {
        let value = self.require_int(keyword)?;
        to_size(keyword, value)
    }

    /// Optional non-negative integer.
    pub fn get_size(&self, keyword: &str) -> Result<Option<usize>> {
        self.get_int(keyword).map(|v| to_size(keyword, v)).transpose()
    }

    /// Decode a header starting at `offset`.
    ///
    /// Returns the header and the offset of the first byte after its padded
    /// block sequence.
    pub fn parse(bytes: &[u8], offset: usize) -> Result<(Header, usize)> {
        let mut header = Header::new();
        let mut pos = offset;

        loop {
            let card = bytes
                .get(pos..pos + CARD_SIZE)
                .ok_or(FitsError::UnexpectedEof("header"))?;
            pos += CARD_SIZE;

            let keyword = std::str::from_utf8(&card[..8])
                .map_err(|_| FitsError::invalid_header("non-ASCII keyword"))?
                .trim_end();

            if keyword == "END" {
                break;
            }
            if keyword.is_empty() || card[8..10] != *b"= " {
                // COMMENT, HISTORY, blank cards
                continue;
            }

            let field = String::from_utf8_lossy(&card[10..]);
            header.cards.push((keyword.to_string(), parse_value(keyword, &field)?));
        }

        let consumed = pos - offset;
        Ok((header, offset + padded_len(consumed)))
    }

    /// Encode as a sequence of padded blocks, terminated by `END`.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(padded_len((self.cards.len() + 1) * CARD_SIZE));
        for (keyword, value) in &self.cards {
            out.extend_from_slice(&format_card(keyword, value));
        }
        let mut end = [b' '; CARD_SIZE];
        end[..3].copy_from_slice(b"END");
        out.extend_from_slice(&end);
        out.resize(padded_len(out.len()), b' ');
        out
    }
}

fn to_size(keyword: &str, value: i64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| FitsError::invalid_header(format!("{} = {} must not be negative", keyword, value)))
}

fn parse_value(keyword: &str, field: &str) -> Result<Value> {
    let field = field.trim_start();

    if let Some(rest) = field.strip_prefix('\'') {
        // Quoted string; '' is an escaped quote.
        let mut text = String::new();
        let mut chars = rest.chars().peekable();
        loop {
            match chars.next() {
                Some('\'') if chars.peek() == Some(&'\'') => {
                    chars.next();
                    text.push('\'');
                }
                Some('\'') => break,
                Some(c) => text.push(c),
                None => {
                    return Err(FitsError::invalid_header(format!(
                        "unterminated string for {}",
                        keyword
                    )))
                }
            }
        }
        return Ok(Value::Text(text.trim_end().to_string()));
    }

    let value_part = match field.find('/') {
        Some(idx) => field[..idx].trim(),
        None => field.trim(),
    };

    match value_part {
        "T" => return Ok(Value::Logical(true)),
        "F" => return Ok(Value::Logical(false)),
        _ => {}
    }

    if let Ok(i) = value_part.parse::<i64>() {
        return Ok(Value::Integer(i));
    }
    if let Ok(f) = value_part.replace(['D', 'd'], "E").parse::<f64>() {
        return Ok(Value::Float(f));
    }

    Err(FitsError::invalid_header(format!(
        "cannot parse value of {}: '{}'",
        keyword, value_part
    )))
}

fn format_card(keyword: &str, value: &Value) -> [u8; CARD_SIZE] {
    let mut card = [b' '; CARD_SIZE];
    let kw = keyword.as_bytes();
    card[..kw.len().min(8)].copy_from_slice(&kw[..kw.len().min(8)]);
    card[8] = b'=';
    card[9] = b' ';

    let text = match value {
        Value::Text(s) => {
            // Fixed-format strings are at least eight characters inside quotes.
            format!("'{:<8}'", s.replace('\'', "''"))
        }
        Value::Logical(b) => format!("{:>20}", if *b { "T" } else { "F" }),
        Value::Integer(i) => format!("{:>20}", i),
        Value::Float(f) => format!("{:>20}", format_float(*f)),
    };
    let bytes = text.as_bytes();
    let len = bytes.len().min(CARD_SIZE - 10);
    card[10..10 + len].copy_from_slice(&bytes[..len]);
    card
}

fn format_float(f: f64) -> String {
    let s = format!("{:E}", f);
    // Rust prints "1E0" for 1.0; FITS readers want a decimal point.
    match s.split_once('E') {
        Some((mantissa, exp)) if !mantissa.contains('.') => format!("{}.0E{}", mantissa, exp),
        _ => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(text: &str) -> Vec<u8> {
        let mut c = text.as_bytes().to_vec();
        c.resize(CARD_SIZE, b' ');
        c
    }

    fn block(cards: &[&str]) -> Vec<u8> {
        let mut out: Vec<u8> = cards.iter().flat_map(|c| card(c)).collect();
        out.resize(padded_len(out.len()), b' ');
        out
    }

    #[test]
    fn test_padded_len() {
        assert_eq!(padded_len(0), 0);
        assert_eq!(padded_len(1), BLOCK_SIZE);
        assert_eq!(padded_len(BLOCK_SIZE), BLOCK_SIZE);
        assert_eq!(padded_len(BLOCK_SIZE + 1), 2 * BLOCK_SIZE);
    }

    #[test]
    fn test_checked_padded_len() {
        assert_eq!(checked_padded_len(1), Some(BLOCK_SIZE));
        assert_eq!(checked_padded_len(usize::MAX), None);
    }

    #[test]
    fn test_size_keywords() {
        let mut header = Header::new();
        header
            .push("NAXIS1", Value::Integer(16))
            .push("NAXIS2", Value::Integer(-3));
        assert_eq!(header.require_size("NAXIS1").unwrap(), 16);
        assert!(matches!(header.require_size("NAXIS2"), Err(FitsError::InvalidHeader(_))));
        assert!(matches!(header.require_size("NAXIS3"), Err(FitsError::MissingKeyword(_))));
        assert_eq!(header.get_size("PCOUNT").unwrap(), None);
    }

    #[test]
    fn test_parse_value_kinds() {
        let bytes = block(&[
            "SIMPLE  =                    T / conforms",
            "BITPIX  =                  -32",
            "BSCALE  =              1.5D+00",
            "ORDERING= 'NESTED  '           / pixel ordering",
            "OBJECT  = 'it''s   '",
            "COMMENT   free text, ignored",
            "END",
        ]);
        let (header, next) = Header::parse(&bytes, 0).unwrap();

        assert_eq!(next, BLOCK_SIZE);
        assert_eq!(header.get_logical("SIMPLE"), Some(true));
        assert_eq!(header.get_int("BITPIX"), Some(-32));
        assert_eq!(header.get_float("BSCALE"), Some(1.5));
        assert_eq!(header.get_text("ORDERING"), Some("NESTED"));
        assert_eq!(header.get_text("OBJECT"), Some("it's"));
        assert!(header.get("COMMENT").is_none());
    }

    #[test]
    fn test_parse_truncated_header() {
        let bytes = card("SIMPLE  =                    T");
        assert!(matches!(
            Header::parse(&bytes, 0),
            Err(FitsError::UnexpectedEof(_))
        ));
    }

    #[test]
    fn test_encode_then_parse() {
        let mut header = Header::new();
        header
            .push("SIMPLE", Value::Logical(true))
            .push("NAXIS", Value::Integer(0))
            .push("CRVAL1", Value::Float(1.0))
            .push("COORDSYS", Value::Text("C".into()));

        let bytes = header.encode();
        assert_eq!(bytes.len(), BLOCK_SIZE);
        assert_eq!(&bytes[..30], b"SIMPLE  =                    T");

        let (parsed, next) = Header::parse(&bytes, 0).unwrap();
        assert_eq!(next, BLOCK_SIZE);
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_format_float_has_decimal_point() {
        assert_eq!(format_float(1.0), "1.0E0");
        assert_eq!(format_float(-0.25), "-2.5E-1");
    }
}
