//! Semicolon-separated timing report appended by the bench command.
//!
//! Layout:
//!
//! ```text
//!
//! Constant=;(-0.805,0.156)
//! range=;( [-1.7, 1.7], [-1.7, 1.7] )
//!
//! Variables;;Timings
//! size;max_iterations;gpu;gpu event;parallel;sequential
//! 1000;300;0.0123;0.0101;0.2;1.4
//! ```
//!
//! GPU columns carry a second "event" column with the device-measured
//! kernel time (`-1` when the device has no timestamps). A backend that
//! fails on a row gets `-1` in all of its cells.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use julia_core::models::ExecutionStats;
use num_complex::Complex32;

/// One report column group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kernel_time: bool,
}

/// Timings of one `(size, max_iterations)` row, in column order.
///
/// `None` marks a backend that failed on this row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub size: u32,
    pub max_iterations: u32,
    pub stats: Vec<Option<ExecutionStats>>,
}

/// Write the section header.
pub fn write_header<W: Write>(
    out: &mut W,
    constant: Complex32,
    limit: f32,
    columns: &[Column],
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Constant=;({},{})", constant.re, constant.im)?;
    writeln!(
        out,
        "range=;( [{}, {}], [{}, {}] )",
        -limit, limit, -limit, limit
    )?;
    writeln!(out)?;
    writeln!(out, "Variables;;Timings")?;

    let mut names = vec!["size".to_string(), "max_iterations".to_string()];
    for column in columns {
        names.push(column.name.clone());
        if column.kernel_time {
            names.push(format!("{} event", column.name));
        }
    }
    writeln!(out, "{}", names.join(";"))
}

/// Write one data row. Failed cells get the `-1` sentinel.
pub fn write_row<W: Write>(out: &mut W, columns: &[Column], row: &Row) -> io::Result<()> {
    let mut cells = vec![row.size.to_string(), row.max_iterations.to_string()];
    for (column, stats) in columns.iter().zip(&row.stats) {
        let (wall, kernel) = match stats {
            Some(stats) => (stats.wall_seconds(), stats.kernel_seconds_or_sentinel()),
            None => (SENTINEL, SENTINEL),
        };
        cells.push(wall.to_string());
        if column.kernel_time {
            cells.push(kernel.to_string());
        }
    }
    writeln!(out, "{}", cells.join(";"))
}

const SENTINEL: f64 = -1.0;

/// Report section open for appending. The header is written on open and
/// every row reaches the file as soon as it is appended.
pub struct ReportWriter {
    path: PathBuf,
    file: File,
    columns: Vec<Column>,
    rows: usize,
}

impl ReportWriter {
    /// Open `path` for appending, creating it if needed, and write a new
    /// section header.
    pub fn open(
        path: &Path,
        constant: Complex32,
        limit: f32,
        columns: Vec<Column>,
    ) -> Result<Self, String> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| format!("Failed to open report {}: {}", path.display(), e))?;

        let mut writer = Self {
            path: path.to_path_buf(),
            file,
            columns,
            rows: 0,
        };
        let mut buf = Vec::new();
        write_header(&mut buf, constant, limit, &writer.columns)
            .map_err(|e| format!("Failed to format report: {}", e))?;
        writer.write_all(&buf)?;
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of rows appended so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn append(&mut self, row: &Row) -> Result<(), String> {
        let mut buf = Vec::new();
        write_row(&mut buf, &self.columns, row)
            .map_err(|e| format!("Failed to format report: {}", e))?;
        self.write_all(&buf)?;
        self.rows += 1;
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), String> {
        self.file
            .write_all(bytes)
            .and_then(|()| self.file.flush())
            .map_err(|e| format!("Failed to write report {}: {}", self.path.display(), e))
    }
}
