//! Column access for BINTABLE extensions.
//!
//! Every column layout is decoded so that byte offsets are correct, but only
//! scalar numeric columns can be read out.

use crate::error::{Error, Result};
use crate::hdu::Hdu;

/// Element type from a TFORMn code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// L
    Logical,
    /// X
    Bit,
    /// B
    UInt8,
    /// I
    Int16,
    /// J
    Int32,
    /// K
    Int64,
    /// E
    Float32,
    /// D
    Float64,
    /// C
    Complex32,
    /// M
    Complex64,
    /// A
    Ascii,
    /// P
    DescriptorP,
    /// Q
    DescriptorQ,
}

impl ColumnKind {
    fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'L' => Self::Logical,
            'X' => Self::Bit,
            'B' => Self::UInt8,
            'I' => Self::Int16,
            'J' => Self::Int32,
            'K' => Self::Int64,
            'E' => Self::Float32,
            'D' => Self::Float64,
            'C' => Self::Complex32,
            'M' => Self::Complex64,
            'A' => Self::Ascii,
            'P' => Self::DescriptorP,
            'Q' => Self::DescriptorQ,
            _ => return None,
        })
    }

    fn element_size(self) -> usize {
        match self {
            Self::Logical | Self::UInt8 | Self::Ascii => 1,
            Self::Int16 => 2,
            Self::Int32 | Self::Float32 => 4,
            Self::Int64 | Self::Float64 | Self::Complex32 | Self::DescriptorP => 8,
            Self::Complex64 | Self::DescriptorQ => 16,
            Self::Bit => 0,
        }
    }

    fn is_integer(self) -> bool {
        matches!(self, Self::UInt8 | Self::Int16 | Self::Int32 | Self::Int64)
    }
}

/// One column of a binary table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub tform: String,
    pub kind: ColumnKind,
    pub repeat: usize,
    /// Byte offset of the column within a row.
    pub offset: usize,
    pub width: usize,
    pub scale: f64,
    pub zero: f64,
}

/// Split a TFORM value like `1D` or `16A` into its repeat count and kind.
pub fn parse_tform(tform: &str) -> Option<(usize, ColumnKind)> {
    let tform = tform.trim();
    let digits = tform.bytes().take_while(u8::is_ascii_digit).count();
    let repeat = if digits == 0 {
        1
    } else {
        tform[..digits].parse().ok()?
    };
    let code = tform[digits..].chars().next()?;
    Some((repeat, ColumnKind::from_code(code)?))
}

fn byte_width(repeat: usize, kind: ColumnKind) -> usize {
    match kind {
        ColumnKind::Bit => repeat.div_ceil(8),
        _ => repeat * kind.element_size(),
    }
}

/// A binary table bound to the bytes of its HDU.
#[derive(Debug)]
pub struct BinaryTable<'a> {
    columns: Vec<Column>,
    row_len: usize,
    nrows: usize,
    data: &'a [u8],
}

impl<'a> BinaryTable<'a> {
    /// Interpret `hdu` inside the file bytes `file` as a binary table.
    pub fn new(hdu: &Hdu, file: &'a [u8]) -> Result<Self> {
        if hdu.string("XTENSION") != Some("BINTABLE") {
            return Err(Error::InvalidHeader("not a BINTABLE extension"));
        }
        let row_len = usize::try_from(hdu.required_integer("NAXIS1")?)
            .map_err(|_| Error::InvalidHeader("negative NAXIS1"))?;
        let nrows = usize::try_from(hdu.required_integer("NAXIS2")?)
            .map_err(|_| Error::InvalidHeader("negative NAXIS2"))?;
        let tfields = usize::try_from(hdu.required_integer("TFIELDS")?)
            .map_err(|_| Error::InvalidHeader("negative TFIELDS"))?;

        let mut columns = Vec::with_capacity(tfields);
        let mut offset = 0;
        for n in 1..=tfields {
            let tform_key = format!("TFORM{n}");
            let tform = hdu
                .string(&tform_key)
                .ok_or(Error::MissingKeyword(tform_key))?
                .to_string();
            let name = hdu.string(&format!("TTYPE{n}")).unwrap_or("").to_string();
            let (repeat, kind) = parse_tform(&tform).ok_or_else(|| Error::UnsupportedColumn {
                name: name.clone(),
                tform: tform.clone(),
            })?;
            let width = byte_width(repeat, kind);
            columns.push(Column {
                scale: hdu.float(&format!("TSCAL{n}")).unwrap_or(1.0),
                zero: hdu.float(&format!("TZERO{n}")).unwrap_or(0.0),
                name,
                tform,
                kind,
                repeat,
                offset,
                width,
            });
            offset += width;
        }
        if offset > row_len {
            return Err(Error::InvalidHeader("columns wider than NAXIS1"));
        }

        let table_len = row_len * nrows;
        let data = file
            .get(hdu.data_start..hdu.data_start + table_len)
            .ok_or(Error::UnexpectedEof)?;
        Ok(Self {
            columns,
            row_len,
            nrows,
            data,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Look up a column by TTYPE, falling back to a case-insensitive match.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(name))
            })
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    fn cells<'s>(&'s self, column: &'s Column) -> impl Iterator<Item = &'a [u8]> + 's {
        let data = self.data;
        let width = column.kind.element_size();
        (0..self.nrows).map(move |row| {
            let start = row * self.row_len + column.offset;
            &data[start..start + width]
        })
    }

    fn scalar_column(&self, name: &str) -> Result<&Column> {
        let column = self.column(name)?;
        let numeric = column.kind.is_integer()
            || matches!(column.kind, ColumnKind::Float32 | ColumnKind::Float64);
        if column.repeat != 1 || !numeric {
            return Err(unsupported(column));
        }
        Ok(column)
    }

    /// Read a numeric column as physical values (`TZERO + TSCAL * raw`).
    pub fn read_f64(&self, name: &str) -> Result<Vec<f64>> {
        let column = self.scalar_column(name)?;
        let raw: Vec<f64> = self.cells(column).map(|b| raw_f64(column.kind, b)).collect();
        if column.scale == 1.0 && column.zero == 0.0 {
            return Ok(raw);
        }
        Ok(raw
            .into_iter()
            .map(|v| column.zero + column.scale * v)
            .collect())
    }

    /// Read an integer column. Offsets from TZERO are applied, but a
    /// non-unit TSCAL, a fractional TZERO or one outside the i64 range is
    /// rejected.
    pub fn read_i64(&self, name: &str) -> Result<Vec<i64>> {
        let column = self.scalar_column(name)?;
        if !column.kind.is_integer() || column.scale != 1.0 || column.zero.fract() != 0.0 {
            return Err(unsupported(column));
        }
        // An offset of 2^63 (unsigned 64-bit columns) has no i64 form.
        const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
        if !(-I64_BOUND..I64_BOUND).contains(&column.zero) {
            return Err(unsupported(column));
        }
        let zero = column.zero as i64;
        self.cells(column)
            .map(|b| {
                raw_i64(column.kind, b)
                    .checked_add(zero)
                    .ok_or_else(|| unsupported(column))
            })
            .collect()
    }
}

fn unsupported(column: &Column) -> Error {
    Error::UnsupportedColumn {
        name: column.name.clone(),
        tform: column.tform.clone(),
    }
}

// Cell slices always have the element width of their kind, so the
// fixed-size conversions below cannot fail.
fn be<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

fn raw_i64(kind: ColumnKind, bytes: &[u8]) -> i64 {
    match kind {
        ColumnKind::UInt8 => i64::from(bytes[0]),
        ColumnKind::Int16 => i64::from(i16::from_be_bytes(be(bytes))),
        ColumnKind::Int32 => i64::from(i32::from_be_bytes(be(bytes))),
        ColumnKind::Int64 => i64::from_be_bytes(be(bytes)),
        _ => 0,
    }
}

fn raw_f64(kind: ColumnKind, bytes: &[u8]) -> f64 {
    match kind {
        ColumnKind::Float32 => f64::from(f32::from_be_bytes(be(bytes))),
        ColumnKind::Float64 => f64::from_be_bytes(be(bytes)),
        _ => raw_i64(kind, bytes) as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{padded_byte_len, CARD_SIZE};
    use crate::hdu::parse_hdus;

    #[test]
    fn tform_codes() {
        assert_eq!(parse_tform("1D"), Some((1, ColumnKind::Float64)));
        assert_eq!(parse_tform("J"), Some((1, ColumnKind::Int32)));
        assert_eq!(parse_tform("16A"), Some((16, ColumnKind::Ascii)));
        assert_eq!(parse_tform(" 1PE(12) "), Some((1, ColumnKind::DescriptorP)));
        assert_eq!(parse_tform("1Z"), None);
        assert_eq!(parse_tform(""), None);
    }

    #[test]
    fn widths() {
        assert_eq!(byte_width(1, ColumnKind::Float64), 8);
        assert_eq!(byte_width(16, ColumnKind::Ascii), 16);
        assert_eq!(byte_width(9, ColumnKind::Bit), 2);
        assert_eq!(byte_width(2, ColumnKind::Complex64), 32);
    }

    fn header(cards: &[String]) -> Vec<u8> {
        let mut out = Vec::new();
        for c in cards.iter().map(String::as_str).chain(std::iter::once("END")) {
            let mut buf = [b' '; CARD_SIZE];
            buf[..c.len()].copy_from_slice(c.as_bytes());
            out.extend_from_slice(&buf);
        }
        out.resize(padded_byte_len(out.len()), b' ');
        out
    }

    // Columns: TIME 1D, NAME 4A, PHA 1I (TZERO 32768), CH 1B, GAIN 1E (TSCAL 0.5)
    fn sample_file() -> Vec<u8> {
        let mut file = header(&[
            "SIMPLE  =                    T".into(),
            "BITPIX  =                    8".into(),
            "NAXIS   =                    0".into(),
        ]);
        let rows: [(f64, &[u8; 4], u16, u8, f32); 3] = [
            (1.5, b"abcd", 0, 3, 2.0),
            (2.25, b"efgh", 40000, 255, -4.0),
            (-8.0, b"ijkl", 32768, 0, 0.5),
        ];
        let row_len = 8 + 4 + 2 + 1 + 4;
        file.extend(header(&[
            "XTENSION= 'BINTABLE'".into(),
            "BITPIX  =                    8".into(),
            "NAXIS   =                    2".into(),
            format!("NAXIS1  = {row_len:>20}"),
            format!("NAXIS2  = {:>20}", rows.len()),
            "PCOUNT  =                    0".into(),
            "GCOUNT  =                    1".into(),
            "TFIELDS =                    5".into(),
            "TTYPE1  = 'TIME'".into(),
            "TFORM1  = '1D'".into(),
            "TTYPE2  = 'NAME'".into(),
            "TFORM2  = '4A'".into(),
            "TTYPE3  = 'PHA'".into(),
            "TFORM3  = '1I'".into(),
            "TZERO3  =                32768".into(),
            "TTYPE4  = 'CH'".into(),
            "TFORM4  = '1B'".into(),
            "TTYPE5  = 'GAIN'".into(),
            "TFORM5  = '1E'".into(),
            "TSCAL5  =                  0.5".into(),
            "EXTNAME = 'EVENTS'".into(),
        ]));
        let mut data = Vec::new();
        for (t, name, pha, ch, gain) in rows {
            data.extend_from_slice(&t.to_be_bytes());
            data.extend_from_slice(name);
            data.extend_from_slice(&((pha as i32 - 32768) as i16).to_be_bytes());
            data.push(ch);
            data.extend_from_slice(&gain.to_be_bytes());
        }
        let len = padded_byte_len(data.len());
        data.resize(len, 0);
        file.extend(data);
        file
    }

    #[test]
    fn reads_scalar_columns() {
        let file = sample_file();
        let hdus = parse_hdus(&file).unwrap();
        let table = BinaryTable::new(&hdus[1], &file).unwrap();
        assert_eq!(table.nrows(), 3);
        assert_eq!(table.columns().len(), 5);
        assert_eq!(table.column("PHA").unwrap().offset, 12);

        assert_eq!(table.read_f64("TIME").unwrap(), vec![1.5, 2.25, -8.0]);
        assert_eq!(table.read_i64("PHA").unwrap(), vec![0, 40000, 32768]);
        assert_eq!(table.read_i64("CH").unwrap(), vec![3, 255, 0]);
        assert_eq!(table.read_f64("CH").unwrap(), vec![3.0, 255.0, 0.0]);
        assert_eq!(table.read_f64("GAIN").unwrap(), vec![1.0, -2.0, 0.25]);
    }

    #[test]
    fn case_insensitive_lookup() {
        let file = sample_file();
        let hdus = parse_hdus(&file).unwrap();
        let table = BinaryTable::new(&hdus[1], &file).unwrap();
        assert_eq!(table.column("time").unwrap().name, "TIME");
        assert!(matches!(
            table.column("ENERGY"),
            Err(Error::MissingColumn(ref n)) if n == "ENERGY"
        ));
    }

    #[test]
    fn rejects_unreadable_columns() {
        let file = sample_file();
        let hdus = parse_hdus(&file).unwrap();
        let table = BinaryTable::new(&hdus[1], &file).unwrap();
        assert!(matches!(
            table.read_f64("NAME"),
            Err(Error::UnsupportedColumn { ref tform, .. }) if tform == "4A"
        ));
        // Float columns and scaled columns are not integers.
        assert!(table.read_i64("TIME").is_err());
        assert!(table.read_i64("GAIN").is_err());
    }

    fn unsigned_long_file(tzero: &str) -> Vec<u8> {
        let mut file = header(&[
            "SIMPLE  =                    T".into(),
            "BITPIX  =                    8".into(),
            "NAXIS   =                    0".into(),
        ]);
        file.extend(header(&[
            "XTENSION= 'BINTABLE'".into(),
            "BITPIX  =                    8".into(),
            "NAXIS   =                    2".into(),
            "NAXIS1  =                    8".into(),
            "NAXIS2  =                    2".into(),
            "PCOUNT  =                    0".into(),
            "GCOUNT  =                    1".into(),
            "TFIELDS =                    1".into(),
            "TTYPE1  = 'COUNTER'".into(),
            "TFORM1  = '1K'".into(),
            format!("TZERO1  = {tzero:>20}"),
        ]));
        let mut data = Vec::new();
        data.extend_from_slice(&i64::MIN.to_be_bytes());
        data.extend_from_slice(&(-1i64).to_be_bytes());
        data.resize(padded_byte_len(data.len()), 0);
        file.extend(data);
        file
    }

    #[test]
    fn unsigned_long_offset_is_not_an_i64() {
        let file = unsigned_long_file("9223372036854775808");
        let hdus = parse_hdus(&file).unwrap();
        let table = BinaryTable::new(&hdus[1], &file).unwrap();
        assert!(matches!(
            table.read_i64("COUNTER"),
            Err(Error::UnsupportedColumn { ref name, .. }) if name == "COUNTER"
        ));
        assert_eq!(table.read_f64("COUNTER").unwrap()[0], 0.0);
    }

    #[test]
    fn integer_offset_overflow_is_rejected() {
        let file = unsigned_long_file("1");
        let hdus = parse_hdus(&file).unwrap();
        let table = BinaryTable::new(&hdus[1], &file).unwrap();
        // i64::MIN - 1 overflows.
        assert_eq!(table.read_i64("COUNTER").unwrap(), vec![i64::MIN + 1, 0]);

        let file = unsigned_long_file("-1");
        let hdus = parse_hdus(&file).unwrap();
        let table = BinaryTable::new(&hdus[1], &file).unwrap();
        assert!(matches!(
            table.read_i64("COUNTER"),
            Err(Error::UnsupportedColumn { .. })
        ));
    }

    #[test]
    fn primary_is_not_a_table() {
        let file = sample_file();
        let hdus = parse_hdus(&file).unwrap();
        assert!(matches!(
            BinaryTable::new(&hdus[0], &file),
            Err(Error::InvalidHeader(_))
        ));
    }
}
