//! Reading and writing sparse matrices in the Matrix Market text format.
//!
//! Only the coordinate layout with integer values is handled: `%` comment
//! lines, one `rows cols entries` header line, then one `row col value`
//! line per entry with 1-based coordinates. The parser streams from any
//! [`BufRead`], so in-memory buffers, files and decompressing readers all
//! work; values are promoted to `f64` on load.
//!
//! The [`layered`] submodule builds the same data into narrower integer
//! storages partitioned by row magnitude.

use std::fmt::Display;
use std::fs::File;
use std::io;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::content::Value;
use crate::errors::AnymatError;
use crate::indexing::MatIndex;
use crate::matrix::Matrix;
use crate::sparse::compressed::{CompressedStorage, CsMatrix};
use crate::sparse::triplet::compress_sparse_triplets;

pub mod layered;

/// The dimensions declared by a Matrix Market header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketHeader {
    pub nrow: usize,
    pub ncol: usize,
    /// The number of data lines announced by the header.
    pub nlines: usize,
}

/// Receives the parsed stream: first the header, then one call per data
/// line with 0-based coordinates.
pub(crate) trait MmSink {
    /// When true, parsing stops right after the header line.
    const PREAMBLE_ONLY: bool = false;

    fn dimensions(&mut self, header: MarketHeader) -> Result<(), AnymatError>;

    fn line(&mut self, row: usize, col: usize, value: u64) -> Result<(), AnymatError>;
}

fn parse_three(line: &str) -> Result<(u64, u64, u64), AnymatError> {
    let mut fields = line.split_whitespace();
    let mut next = || -> Result<u64, AnymatError> {
        let field = fields.next().ok_or_else(|| {
            AnymatError::ParseError(format!(
                "expected three values per line, got fewer in {:?}",
                line,
            ))
        })?;
        field.parse::<u64>().map_err(|_| {
            AnymatError::ParseError(format!(
                "expected a non-negative integer, got {:?}",
                field,
            ))
        })
    };
    let a = next()?;
    let b = next()?;
    let c = next()?;
    if fields.next().is_some() {
        return Err(AnymatError::ParseError(format!(
            "expected three values per line, got more in {:?}",
            line,
        )));
    }
    Ok((a, b, c))
}

/// Stream a Matrix Market document from `reader` into `sink`.
///
/// Comment lines are only recognized before the header; blank lines are
/// skipped anywhere. The data-line count is checked against the header in
/// both directions.
pub(crate) fn parse<R: BufRead, S: MmSink>(
    reader: &mut R,
    sink: &mut S,
) -> Result<(), AnymatError> {
    let mut line = String::with_capacity(1024);
    let mut header: Option<MarketHeader> = None;
    let mut seen = 0usize;

    loop {
        line.clear();
        let len = reader
            .read_line(&mut line)
            .map_err(|e| AnymatError::ParseError(format!("read failure: {}", e)))?;
        if len == 0 {
            break;
        }
        let body = line.trim();
        if body.is_empty() {
            continue;
        }
        if header.is_none() {
            if body.starts_with('%') {
                continue;
            }
            let (nrow, ncol, nlines) = parse_three(body)?;
            let parsed = MarketHeader {
                nrow: nrow as usize,
                ncol: ncol as usize,
                nlines: nlines as usize,
            };
            sink.dimensions(parsed)?;
            if S::PREAMBLE_ONLY {
                return Ok(());
            }
            header = Some(parsed);
            continue;
        }

        let head = header.unwrap();
        if seen == head.nlines {
            return Err(AnymatError::ParseError(format!(
                "more lines present than the {} lines specified in the header",
                head.nlines,
            )));
        }
        let (r, c, v) = parse_three(body)?;
        if r == 0 || c == 0 {
            return Err(AnymatError::ParseError(
                "row and column indices must be positive".to_string(),
            ));
        }
        let (r, c) = (r as usize, c as usize);
        if r > head.nrow || c > head.ncol {
            return Err(AnymatError::ParseError(format!(
                "coordinate ({}, {}) out of range for a {} x {} matrix",
                r, c, head.nrow, head.ncol,
            )));
        }
        sink.line(r - 1, c - 1, v)?;
        seen += 1;
    }

    match header {
        None => Err(AnymatError::ParseError(
            "no header line before the end of the file".to_string(),
        )),
        Some(head) if seen < head.nlines => Err(AnymatError::ParseError(format!(
            "only {} lines present but {} lines specified in the header",
            seen, head.nlines,
        ))),
        Some(_) => Ok(()),
    }
}

#[derive(Default)]
struct Inspector {
    header: Option<MarketHeader>,
}

impl MmSink for Inspector {
    const PREAMBLE_ONLY: bool = true;

    fn dimensions(&mut self, header: MarketHeader) -> Result<(), AnymatError> {
        self.header = Some(header);
        Ok(())
    }

    fn line(&mut self, _row: usize, _col: usize, _value: u64) -> Result<(), AnymatError> {
        Ok(())
    }
}

#[derive(Default)]
struct TripletCollector {
    nrow: usize,
    ncol: usize,
    rows: Vec<i32>,
    cols: Vec<i32>,
    values: Vec<f64>,
}

impl MmSink for TripletCollector {
    fn dimensions(&mut self, header: MarketHeader) -> Result<(), AnymatError> {
        self.nrow = header.nrow;
        self.ncol = header.ncol;
        self.rows.reserve(header.nlines);
        self.cols.reserve(header.nlines);
        self.values.reserve(header.nlines);
        Ok(())
    }

    fn line(&mut self, row: usize, col: usize, value: u64) -> Result<(), AnymatError> {
        self.rows.push(i32::from_usize(row));
        self.cols.push(i32::from_usize(col));
        self.values.push(value as f64);
        Ok(())
    }
}

/// Parse only the header of a Matrix Market document.
pub fn inspect_header<R: BufRead>(reader: &mut R) -> Result<MarketHeader, AnymatError> {
    let mut sink = Inspector::default();
    parse(reader, &mut sink)?;
    sink.header.ok_or_else(|| {
        AnymatError::ParseError("no header line before the end of the file".to_string())
    })
}

/// Parse only the header of an in-memory Matrix Market document.
pub fn inspect_header_from_buffer(buffer: &[u8]) -> Result<MarketHeader, AnymatError> {
    inspect_header(&mut &buffer[..])
}

/// Load a Matrix Market document into a column-compressed `f64` matrix.
///
/// Explicitly zero entries are dropped during compression.
pub fn load_matrix<R: BufRead>(reader: &mut R) -> Result<CsMatrix<f64, i32>, AnymatError> {
    let mut sink = TripletCollector::default();
    parse(reader, &mut sink)?;
    let TripletCollector {
        nrow,
        ncol,
        mut rows,
        mut cols,
        mut values,
    } = sink;
    let indptr = compress_sparse_triplets(
        CompressedStorage::CSC,
        nrow,
        ncol,
        &mut values,
        &mut rows,
        &mut cols,
    )?;
    CsMatrix::new_csc(nrow, ncol, indptr, rows, values)
}

/// Load a Matrix Market document from an in-memory buffer.
pub fn load_matrix_from_buffer(buffer: &[u8]) -> Result<CsMatrix<f64, i32>, AnymatError> {
    load_matrix(&mut &buffer[..])
}

/// Load a Matrix Market file.
pub fn load_matrix_from_path<P: AsRef<Path>>(
    path: P,
) -> Result<CsMatrix<f64, i32>, AnymatError> {
    let f = File::open(path)
        .map_err(|e| AnymatError::ParseError(format!("cannot open file: {}", e)))?;
    load_matrix(&mut io::BufReader::new(f))
}

/// Write a compressed matrix into the Matrix Market format.
///
/// Values are written with their `Display` form; for the integer-valued
/// documents this module reads back, store whole numbers.
pub fn write_matrix_market<N, I, W>(
    writer: &mut W,
    mat: &CsMatrix<N, I>,
) -> Result<(), io::Error>
where
    N: Value + Display,
    I: MatIndex,
    W: Write,
{
    writeln!(writer, "% written by anymat")?;
    writeln!(writer, "{} {} {}", mat.nrow(), mat.ncol(), mat.nnz())?;
    let indptr = mat.indptr();
    for p in 0..indptr.len() - 1 {
        for k in indptr[p]..indptr[p + 1] {
            let inner = mat.indices()[k].index();
            let (row, col) = match mat.storage() {
                CompressedStorage::CSR => (p, inner),
                CompressedStorage::CSC => (inner, p),
            };
            writeln!(writer, "{} {} {}", row + 1, col + 1, mat.data()[k])?;
        }
    }
    Ok(())
}
