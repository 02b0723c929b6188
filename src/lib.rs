use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::ops::Range;
use std::path::Path;
pub mod error;
pub mod mode;
pub mod plot;

pub use error::{ReportError, Result};

pub const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

/// Column names, in the order they appear in the benchmark csv
pub const HEADERS: [&str; 8] = [
    "rows1",
    "cols1",
    "cols2",
    "k",
    "time_scalar",
    "time_simd",
    "time_mkl",
    "improvement",
];

pub const Y_DESC: &str = "Execution time in ms";

/// One line of the benchmark csv
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BenchmarkRecord {
    pub rows1: i64,
    pub cols1: i64,
    pub cols2: i64,
    pub k: i64,
    pub time_scalar: f64,
    pub time_simd: f64,
    pub time_mkl: f64,
    pub improvement: f64,
}

/// The main struct for the benchmark results, one vector per column.
/// All the vectors always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchTable {
    pub rows1: Vec<i64>,
    pub cols1: Vec<i64>,
    pub cols2: Vec<i64>,
    pub k: Vec<i64>,
    pub time_scalar: Vec<f64>,
    pub time_simd: Vec<f64>,
    pub time_mkl: Vec<f64>,
    pub improvement: Vec<f64>,
}

impl BenchTable {
    pub fn new(capacity: usize) -> BenchTable {
        BenchTable {
            rows1: Vec::with_capacity(capacity),
            cols1: Vec::with_capacity(capacity),
            cols2: Vec::with_capacity(capacity),
            k: Vec::with_capacity(capacity),
            time_scalar: Vec::with_capacity(capacity),
            time_simd: Vec::with_capacity(capacity),
            time_mkl: Vec::with_capacity(capacity),
            improvement: Vec::with_capacity(capacity),
        }
    }

    /// Init a BenchTable from csv.
    /// The first line is always dropped, whatever it contains.
    /// Every other line must have exactly 8 numeric fields,
    /// the first 4 integers and the last 4 floats;
    /// the first bad line stops the loading.
    pub fn from_csv(fin: &Path) -> Result<BenchTable> {
        let file = File::open(fin).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ReportError::FileNotFound {
                path: fin.to_path_buf(),
            },
            _ => ReportError::Io(e),
        })?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(BufReader::new(file));
        let mut table = BenchTable::new(1000);
        for (i, result) in reader.records().enumerate().skip(1) {
            let record = match result {
                Ok(r) => r,
                Err(e) if e.is_io_error() => return Err(ReportError::Io(e.into())),
                Err(e) => {
                    return Err(ReportError::DataFormat {
                        line: i as u64 + 1,
                        reason: e.to_string(),
                    })
                }
            };
            table.push(parse_record(&record, i as u64 + 1)?);
        }
        Ok(table)
    }

    pub fn push(&mut self, r: BenchmarkRecord) {
        self.rows1.push(r.rows1);
        self.cols1.push(r.cols1);
        self.cols2.push(r.cols2);
        self.k.push(r.k);
        self.time_scalar.push(r.time_scalar);
        self.time_simd.push(r.time_simd);
        self.time_mkl.push(r.time_mkl);
        self.improvement.push(r.improvement);
    }

    pub fn len(&self) -> usize {
        self.rows1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows1.is_empty()
    }
}

fn parse_record(record: &StringRecord, fallback_line: u64) -> Result<BenchmarkRecord> {
    let line = record
        .position()
        .map(|p| p.line())
        .unwrap_or(fallback_line);
    if record.len() != HEADERS.len() {
        return Err(ReportError::DataFormat {
            line,
            reason: format!(
                "expected {} fields, found {}",
                HEADERS.len(),
                record.len()
            ),
        });
    }
    record.deserialize(None).map_err(|e| {
        let reason = match e.kind() {
            csv::ErrorKind::Deserialize { err, .. } => match err.field() {
                Some(f) => format!(
                    "column {} = {:?}: {}",
                    HEADERS[f as usize],
                    record.get(f as usize).unwrap_or_default(),
                    err.kind()
                ),
                None => err.to_string(),
            },
            _ => e.to_string(),
        };
        ReportError::DataFormat { line, reason }
    })
}

impl std::fmt::Display for BenchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", HEADERS.join(","))?;
        for i in 0..self.len() {
            writeln!(
                f,
                "{},{},{},{},{},{},{},{}",
                self.rows1[i],
                self.cols1[i],
                self.cols2[i],
                self.k[i],
                self.time_scalar[i],
                self.time_simd[i],
                self.time_mkl[i],
                self.improvement[i]
            )?
        }
        Ok(())
    }
}

/// None for an empty iterator
pub fn min_and_max<T, I>(values: I) -> Option<(T, T)>
where
    T: PartialOrd + Copy,
    I: IntoIterator<Item = T>,
{
    let mut iter = values.into_iter();
    let first = iter.next()?;
    let (mut min, mut max) = (first, first);
    for v in iter {
        if v > max {
            max = v
        }
        if v < min {
            min = v
        }
    }
    Some((min, max))
}

/// axis range with a margin of 1/10 of the span on both sides,
/// or of 1 when all the values are equal.
/// NAN, infinite bounds, or a span that overflows give the default 0..1.
pub fn padded_range(minmax: Option<(f64, f64)>) -> Range<f64> {
    match minmax {
        Some((min, max)) if !(max - min).is_finite() => 0f64..1f64,
        Some((min, max)) if max > min => {
            let span = (max - min) / 10f64;
            let padded = (min - span)..(max + span);
            if padded.start.is_finite() && padded.end.is_finite() {
                padded
            } else {
                min..max
            }
        }
        Some((v, _)) => (v - 1.)..(v + 1.),
        None => 0f64..1f64,
    }
}
