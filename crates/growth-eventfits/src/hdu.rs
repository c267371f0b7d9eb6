//! Header Data Unit discovery within a FITS byte stream.

use tracing::debug;

use crate::card::{padded_byte_len, parse_header, Card, Value, BLOCK_SIZE};
use crate::error::{Error, Result};

/// A single HDU: its header cards and the location of its data segment.
#[derive(Debug, Clone)]
pub struct Hdu {
    /// Position of the HDU in the file, primary = 0.
    pub index: usize,
    pub cards: Vec<Card>,
    /// Byte offset of the data segment.
    pub data_start: usize,
    /// Unpadded length of the data segment in bytes.
    pub data_len: usize,
}

impl Hdu {
    /// The first value recorded under `keyword`.
    pub fn value(&self, keyword: &str) -> Option<&Value> {
        self.cards
            .iter()
            .find(|c| c.keyword == keyword)
            .and_then(|c| c.value.as_ref())
    }

    pub fn integer(&self, keyword: &str) -> Option<i64> {
        match self.value(keyword)? {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn float(&self, keyword: &str) -> Option<f64> {
        self.value(keyword)?.as_f64()
    }

    pub fn string(&self, keyword: &str) -> Option<&str> {
        match self.value(keyword)? {
            Value::String(s) => Some(s.trim()),
            _ => None,
        }
    }

    pub fn extname(&self) -> Option<&str> {
        self.string("EXTNAME")
    }

    pub(crate) fn required_integer(&self, keyword: &str) -> Result<i64> {
        self.integer(keyword)
            .ok_or_else(|| Error::MissingKeyword(keyword.to_string()))
    }
}

/// Size of the data segment described by `cards`:
/// `|BITPIX| / 8 * GCOUNT * (PCOUNT + NAXIS1 * ... * NAXISn)`.
fn data_byte_len(hdu: &Hdu, is_primary: bool) -> Result<usize> {
    let bitpix = hdu.required_integer("BITPIX")?;
    let naxis = hdu.required_integer("NAXIS")?;
    if naxis == 0 {
        return Ok(0);
    }

    let mut pixels: usize = 1;
    for i in 1..=naxis {
        let dim = hdu.required_integer(&format!("NAXIS{i}"))?;
        let dim = usize::try_from(dim).map_err(|_| Error::InvalidHeader("negative NAXISn"))?;
        pixels = pixels
            .checked_mul(dim)
            .ok_or(Error::InvalidHeader("data size overflow"))?;
    }

    let (pcount, gcount) = if is_primary {
        (0, 1)
    } else {
        let pcount = hdu.integer("PCOUNT").unwrap_or(0).max(0) as usize;
        let gcount = hdu.integer("GCOUNT").unwrap_or(1).max(1) as usize;
        (pcount, gcount)
    };

    let bytes_per_value = (bitpix.unsigned_abs() / 8) as usize;
    pixels
        .checked_add(pcount)
        .and_then(|n| n.checked_mul(gcount))
        .and_then(|n| n.checked_mul(bytes_per_value))
        .ok_or(Error::InvalidHeader("data size overflow"))
}

/// Walk every HDU in `data`.
///
/// Trailing bytes that do not form a complete header block are ignored, and
/// the final data segment may omit its block padding.
pub fn parse_hdus(data: &[u8]) -> Result<Vec<Hdu>> {
    if data.len() < BLOCK_SIZE {
        return Err(Error::UnexpectedEof);
    }

    let mut hdus = Vec::new();
    let mut offset = 0usize;
    while data.len().saturating_sub(offset) >= BLOCK_SIZE {
        let (cards, header_len) = parse_header(&data[offset..])?;
        let is_primary = hdus.is_empty();
        if is_primary && cards.first().map(|c| c.keyword.as_str()) != Some("SIMPLE") {
            return Err(Error::InvalidHeader("first HDU must be primary"));
        }

        let mut hdu = Hdu {
            index: hdus.len(),
            cards,
            data_start: offset + header_len,
            data_len: 0,
        };
        hdu.data_len = data_byte_len(&hdu, is_primary)?;
        if hdu.data_start + hdu.data_len > data.len() {
            return Err(Error::UnexpectedEof);
        }

        debug!(
            index = hdu.index,
            extname = hdu.extname().unwrap_or(""),
            data_len = hdu.data_len,
            "found HDU"
        );
        offset = hdu.data_start + padded_byte_len(hdu.data_len);
        hdus.push(hdu);
    }
    Ok(hdus)
}

/// Find the first HDU whose EXTNAME equals `name`.
pub fn find_extension<'a>(hdus: &'a [Hdu], name: &str) -> Option<&'a Hdu> {
    hdus.iter().find(|h| h.extname() == Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CARD_SIZE;

    fn header(cards: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        for c in cards.iter().chain(std::iter::once(&"END")) {
            let mut buf = [b' '; CARD_SIZE];
            buf[..c.len()].copy_from_slice(c.as_bytes());
            out.extend_from_slice(&buf);
        }
        out.resize(padded_byte_len(out.len()), b' ');
        out
    }

    fn primary() -> Vec<u8> {
        header(&[
            "SIMPLE  =                    T",
            "BITPIX  =                    8",
            "NAXIS   =                    0",
        ])
    }

    fn table(extname: &str, naxis1: usize, naxis2: usize) -> Vec<u8> {
        let cards = [
            "XTENSION= 'BINTABLE'".to_string(),
            "BITPIX  =                    8".to_string(),
            "NAXIS   =                    2".to_string(),
            format!("NAXIS1  = {naxis1:>20}"),
            format!("NAXIS2  = {naxis2:>20}"),
            "PCOUNT  =                    0".to_string(),
            "GCOUNT  =                    1".to_string(),
            "TFIELDS =                    0".to_string(),
            format!("EXTNAME = '{extname}'"),
        ];
        let refs: Vec<&str> = cards.iter().map(String::as_str).collect();
        let mut out = header(&refs);
        let data_len = naxis1 * naxis2;
        out.resize(out.len() + padded_byte_len(data_len), 0);
        out
    }

    #[test]
    fn primary_only() {
        let hdus = parse_hdus(&primary()).unwrap();
        assert_eq!(hdus.len(), 1);
        assert_eq!(hdus[0].data_len, 0);
        assert_eq!(hdus[0].data_start, BLOCK_SIZE);
        assert_eq!(hdus[0].integer("BITPIX"), Some(8));
    }

    #[test]
    fn finds_extension_by_name() {
        let mut data = primary();
        data.extend(table("GTI", 16, 2));
        data.extend(table("EVENTS", 24, 1000));
        let hdus = parse_hdus(&data).unwrap();
        assert_eq!(hdus.len(), 3);

        let events = find_extension(&hdus, "EVENTS").unwrap();
        assert_eq!(events.index, 2);
        assert_eq!(events.data_len, 24_000);
        assert_eq!(events.data_start, 4 * BLOCK_SIZE);
        assert!(find_extension(&hdus, "SPECTRUM").is_none());
    }

    #[test]
    fn tolerates_missing_final_padding() {
        let mut data = primary();
        data.extend(table("EVENTS", 10, 3));
        data.truncate(data.len() - (BLOCK_SIZE - 30));
        let hdus = parse_hdus(&data).unwrap();
        assert_eq!(hdus[1].data_len, 30);
    }

    #[test]
    fn truncated_data_segment() {
        let mut data = primary();
        data.extend(table("EVENTS", 10, 3));
        data.truncate(data.len() - BLOCK_SIZE + 10);
        assert!(matches!(parse_hdus(&data), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn first_hdu_must_be_primary() {
        let data = table("EVENTS", 1, 1);
        assert!(matches!(parse_hdus(&data), Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn missing_naxis() {
        let data = header(&["SIMPLE  =                    T", "BITPIX  =                    8"]);
        assert!(matches!(parse_hdus(&data), Err(Error::MissingKeyword(ref k)) if k == "NAXIS"));
    }

    #[test]
    fn short_input() {
        assert!(matches!(parse_hdus(&[0u8; 10]), Err(Error::UnexpectedEof)));
    }
}
