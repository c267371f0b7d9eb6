use crate::error::{Error, Result};

const MAGIC: [u8; 2] = [0x1f, 0x8b];
const METHOD_DEFLATE: u8 = 8;
const HEADER_LEN: usize = 10;
const TRAILER_LEN: usize = 8;

const FHCRC: u8 = 0x02;
const FEXTRA: u8 = 0x04;
const FNAME: u8 = 0x08;
const FCOMMENT: u8 = 0x10;

pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&MAGIC)
}

/// Offset just past the NUL terminating a string field that starts at `pos`.
fn skip_zero_terminated(data: &[u8], pos: usize) -> Result<usize> {
    let len = data
        .get(pos..)
        .and_then(|rest| rest.iter().position(|&b| b == 0))
        .ok_or(Error::Decompression)?;
    Ok(pos + len + 1)
}

/// Locate the deflate payload of a single-member gzip stream. Returns the
/// payload and the uncompressed size recorded in the trailer.
fn deflate_payload(data: &[u8]) -> Result<(&[u8], u32)> {
    if data.len() < HEADER_LEN + TRAILER_LEN || !is_gzip(data) || data[2] != METHOD_DEFLATE {
        return Err(Error::Decompression);
    }
    let flags = data[3];
    let mut pos = HEADER_LEN;
    if flags & FEXTRA != 0 {
        let xlen = data.get(pos..pos + 2).ok_or(Error::Decompression)?;
        pos += 2 + usize::from(u16::from_le_bytes([xlen[0], xlen[1]]));
    }
    if flags & FNAME != 0 {
        pos = skip_zero_terminated(data, pos)?;
    }
    if flags & FCOMMENT != 0 {
        pos = skip_zero_terminated(data, pos)?;
    }
    if flags & FHCRC != 0 {
        pos += 2;
    }

    let trailer_start = data.len() - TRAILER_LEN;
    if pos > trailer_start {
        return Err(Error::Decompression);
    }
    let size = &data[data.len() - 4..];
    let recorded_len = u32::from_le_bytes([size[0], size[1], size[2], size[3]]);
    Ok((&data[pos..trailer_start], recorded_len))
}

/// Inflate a gzip stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let (payload, expected_len) = deflate_payload(data)?;
    let out = miniz_oxide::inflate::decompress_to_vec(payload).map_err(|_| Error::Decompression)?;
    // ISIZE is the length modulo 2^32.
    if out.len() as u32 != expected_len {
        return Err(Error::Decompression);
    }
    Ok(out)
}
