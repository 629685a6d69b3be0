//! A minimal reader of MATLAB level-5 MAT-files.
//!
//! Only cell arrays and char arrays are decoded, which is what the file
//! lists shipped with the dog dataset consist of. Other array classes are
//! kept as opaque values.

use crate::common::*;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::read::ZlibDecoder;

const HEADER_SIZE: usize = 128;

pub const MI_INT8: u32 = 1;
pub const MI_UINT8: u32 = 2;
pub const MI_UINT16: u32 = 4;
pub const MI_INT32: u32 = 5;
pub const MI_UINT32: u32 = 6;
pub const MI_MATRIX: u32 = 14;
pub const MI_COMPRESSED: u32 = 15;
pub const MI_UTF8: u32 = 16;
pub const MI_UTF16: u32 = 17;

pub const MX_CELL_CLASS: u32 = 1;
pub const MX_CHAR_CLASS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endian {
    Little,
    Big,
}

/// A decoded MAT array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatValue {
    /// Cells in column-major order.
    Cell(Vec<MatValue>),
    /// Rows of a char matrix.
    Char(Vec<String>),
    /// An array of a class that is not decoded.
    Other { class: u32 },
}

impl MatValue {
    /// Get the first string inside the value, descending into nested cells.
    pub fn first_string(&self) -> Option<&str> {
        match self {
            Self::Char(rows) => rows.first().map(String::as_str),
            Self::Cell(cells) => cells.first()?.first_string(),
            Self::Other { .. } => None,
        }
    }
}

/// Load a cell array variable and take one string per cell.
pub fn load_cell_strings(path: impl AsRef<Path>, variable: &str) -> Result<Vec<String>> {
    let path = path.as_ref();
    let value = load_variable(path, variable)?;

    let cells = match value {
        MatValue::Cell(cells) => cells,
        _ => bail!(
            "the variable '{}' in '{}' is not a cell array",
            variable,
            path.display()
        ),
    };

    cells
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            cell.first_string().map(ToOwned::to_owned).ok_or_else(|| {
                format_err!(
                    "the cell {} of '{}' in '{}' does not contain a string",
                    index,
                    variable,
                    path.display()
                )
            })
        })
        .try_collect()
}

/// Load a named variable from a MAT-file.
pub fn load_variable(path: impl AsRef<Path>, variable: &str) -> Result<MatValue> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("unable to read '{}'", path.display()))?;
    let variables =
        parse_mat(&bytes).with_context(|| format!("invalid MAT-file '{}'", path.display()))?;

    variables
        .into_iter()
        .find(|(name, _)| name == variable)
        .map(|(_, value)| value)
        .ok_or_else(|| {
            format_err!(
                "the variable '{}' is not found in '{}'",
                variable,
                path.display()
            )
        })
}

/// Parse all top-level variables of an in-memory MAT-file.
pub fn parse_mat(bytes: &[u8]) -> Result<Vec<(String, MatValue)>> {
    ensure!(bytes.len() >= HEADER_SIZE, "the file is shorter than the MAT header");
    ensure!(
        !bytes.starts_with(b"MATLAB 7.3"),
        "HDF5-based MAT-files are not supported"
    );

    let endian = match &bytes[126..128] {
        b"IM" => Endian::Little,
        b"MI" => Endian::Big,
        _ => bail!("not a level 5 MAT-file"),
    };

    parse_elements(&bytes[HEADER_SIZE..], endian)
}

fn parse_elements(data: &[u8], endian: Endian) -> Result<Vec<(String, MatValue)>> {
    let mut reader = ElementReader::new(data, endian);
    let mut variables = vec![];

    while !reader.is_empty() {
        let (data_type, payload) = reader.element()?;

        match data_type {
            MI_COMPRESSED => {
                let mut decoded = vec![];
                ZlibDecoder::new(payload)
                    .read_to_end(&mut decoded)
                    .context("unable to inflate compressed element")?;
                variables.extend(parse_elements(&decoded, endian)?);
            }
            MI_MATRIX => variables.push(parse_matrix(payload, endian)?),
            _ => {}
        }
    }

    Ok(variables)
}

fn parse_matrix(data: &[u8], endian: Endian) -> Result<(String, MatValue)> {
    // an empty array is written as a matrix element without payload
    if data.is_empty() {
        return Ok((String::new(), MatValue::Cell(vec![])));
    }

    let mut reader = ElementReader::new(data, endian);

    let class = {
        let (data_type, flags) = reader.element()?;
        ensure!(
            data_type == MI_UINT32 && flags.len() == 8,
            "malformed array flags"
        );
        endian.read_u32(&flags[0..4]) & 0xff
    };

    let dims: Vec<usize> = {
        let (data_type, dims) = reader.element()?;
        ensure!(
            data_type == MI_INT32 && dims.len() % 4 == 0,
            "malformed array dimensions"
        );
        dims.chunks(4)
            .map(|chunk| -> Result<_> {
                let dim = endian.read_i32(chunk);
                ensure!(dim >= 0, "negative array dimension {}", dim);
                Ok(dim as usize)
            })
            .try_collect()?
    };
    let numel: usize = dims.iter().product();

    let name = {
        let (_, name) = reader.element()?;
        String::from_utf8_lossy(name).into_owned()
    };

    let value = match class {
        MX_CELL_CLASS => {
            let cells: Vec<_> = (0..numel)
                .map(|_| -> Result<_> {
                    let (data_type, payload) = reader.element()?;
                    ensure!(
                        data_type == MI_MATRIX,
                        "cell entries must be arrays, but get data type {}",
                        data_type
                    );
                    let (_, value) = parse_matrix(payload, endian)?;
                    Ok(value)
                })
                .try_collect()?;
            MatValue::Cell(cells)
        }
        MX_CHAR_CLASS => {
            let num_rows = dims.first().copied().unwrap_or(0);
            let rows = if numel == 0 || num_rows == 0 {
                vec![String::new(); num_rows]
            } else {
                let (data_type, payload) = reader.element()?;
                decode_char_rows(data_type, payload, num_rows, numel / num_rows, endian)?
            };
            MatValue::Char(rows)
        }
        class => MatValue::Other { class },
    };

    Ok((name, value))
}

fn decode_char_rows(
    data_type: u32,
    payload: &[u8],
    num_rows: usize,
    num_cols: usize,
    endian: Endian,
) -> Result<Vec<String>> {
    let units: Vec<u16> = match data_type {
        MI_UINT16 | MI_UTF16 => {
            ensure!(payload.len() % 2 == 0, "odd length of UTF-16 char data");
            payload
                .chunks(2)
                .map(|chunk| endian.read_u16(chunk))
                .collect()
        }
        MI_UINT8 | MI_INT8 => payload.iter().map(|&byte| byte as u16).collect(),
        MI_UTF8 => {
            ensure!(num_rows == 1, "multi-row UTF-8 char arrays are not supported");
            let text = std::str::from_utf8(payload).context("invalid UTF-8 char data")?;
            return Ok(vec![text.to_owned()]);
        }
        _ => bail!("unsupported char data type {}", data_type),
    };

    ensure!(
        units.len() >= num_rows * num_cols,
        "char data is shorter than the array dimensions"
    );

    // chars are stored in column-major order
    let rows = (0..num_rows)
        .map(|row| {
            let row_units: Vec<u16> = (0..num_cols)
                .map(|col| units[row + col * num_rows])
                .collect();
            String::from_utf16_lossy(&row_units)
        })
        .collect();

    Ok(rows)
}

impl Endian {
    fn read_u16(&self, buf: &[u8]) -> u16 {
        match self {
            Self::Little => LittleEndian::read_u16(buf),
            Self::Big => BigEndian::read_u16(buf),
        }
    }

    fn read_u32(&self, buf: &[u8]) -> u32 {
        match self {
            Self::Little => LittleEndian::read_u32(buf),
            Self::Big => BigEndian::read_u32(buf),
        }
    }

    fn read_i32(&self, buf: &[u8]) -> i32 {
        match self {
            Self::Little => LittleEndian::read_i32(buf),
            Self::Big => BigEndian::read_i32(buf),
        }
    }
}

struct ElementReader<'a> {
    buf: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> ElementReader<'a> {
    fn new(buf: &'a [u8], endian: Endian) -> Self {
        Self {
            buf,
            pos: 0,
            endian,
        }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        ensure!(
            self.pos + len <= self.buf.len(),
            "unexpected end of data at byte {}",
            self.pos
        );
        let slice = &self.buf[self.pos..(self.pos + len)];
        self.pos += len;
        Ok(slice)
    }

    /// Read one data element and return its data type and payload.
    fn element(&mut self) -> Result<(u32, &'a [u8])> {
        let endian = self.endian;
        let first = endian.read_u32(self.take(4)?);

        // small data element packs type and size into the first word
        if first >> 16 != 0 {
            let data_type = first & 0xffff;
            let len = (first >> 16) as usize;
            ensure!(len <= 4, "small data element longer than 4 bytes");
            let data = self.take(4)?;
            return Ok((data_type, &data[..len]));
        }

        let data_type = first;
        let len = endian.read_u32(self.take(4)?) as usize;
        let data = self.take(len)?;

        // compressed elements are not padded
        if data_type != MI_COMPRESSED {
            let padding = (8 - len % 8) % 8;
            let remaining = self.buf.len() - self.pos;
            self.pos += cmp::min(padding, remaining);
        }

        Ok((data_type, data))
    }
}
