use memchr::{memchr, memchr_iter};
use memmap2::Mmap;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::Serialize;
use std::{borrow::Cow, fmt, fs::File, ops::Deref, path::Path, time::Instant};
use tracing::{debug, info, warn};

use crate::processor::{
    InvalidValuePolicy, LoadOptions, ParseError, ParseSummary, ProcessorError,
    column::{SalesColumns, Span},
    schema::{ColumnType, Field, HeaderMap, KeyField, NumericField},
};

/// Chunks smaller than this are not worth a parser thread of their own.
const MIN_CHUNK_BYTES: usize = 64 * 1024;

/// Bytes backing a table: a read-only file mapping, or an owned buffer for
/// data that did not come from disk.
enum Source {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for Source {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Source::Mapped(mmap) => mmap,
            Source::Owned(bytes) => bytes,
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Mapped(m) => write!(f, "Mapped({} bytes)", m.len()),
            Source::Owned(b) => write!(f, "Owned({} bytes)", b.len()),
        }
    }
}

/// One sales transaction, with text cells borrowed from the table's buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord<'a> {
    pub year: i64,
    pub category: Cow<'a, str>,
    pub product_name: Cow<'a, str>,
    pub sales: f64,
    pub profit: f64,
    pub order_id: Cow<'a, str>,
    pub days_to_ship: f64,
}

/// The loaded sales dataset: immutable, columnar, and typed.
///
/// Numeric columns are parsed up front; text columns are kept as byte spans
/// into the source buffer and decoded on access.
///
/// # Examples
///
/// ```rust
/// use sales_dashboard::processor::{LoadOptions, sales_table::SalesTable};
///
/// let csv = "Year,Category,Product Name,Sales,Profit,Order ID,Days to ship\n\
///            2020,Furniture,Chair,100.0,10.0,CA-1,3\n";
/// let (table, summary) = SalesTable::from_csv_bytes(csv, &LoadOptions::default()).unwrap();
/// assert_eq!(table.len(), 1);
/// assert!(summary.errors.is_empty());
/// ```
#[derive(Debug)]
pub struct SalesTable {
    source: Source,
    columns: SalesColumns,
}

struct BatchResult {
    columns: SalesColumns,
    /// Lines are numbered from 0 within the chunk.
    errors: Vec<ParseError>,
    lines: usize,
    skipped: usize,
}

impl SalesTable {
    /// Memory-maps a CSV file and loads it.
    ///
    /// The header must name every schema column; other columns are ignored.
    /// Data lines are parsed in parallel, one chunk per rayon worker.
    ///
    /// # Errors
    /// Returns a [`ProcessorError`] if:
    /// - the file cannot be opened or mapped
    /// - the header is missing or lacks a schema column
    /// - the policy is [`InvalidValuePolicy::Fail`] and any row is bad
    pub fn load_csv(
        path: &Path,
        options: &LoadOptions,
    ) -> Result<(Self, ParseSummary), ProcessorError> {
        let file = File::open(path)?;
        let source = if file.metadata()?.len() == 0 {
            Source::Owned(Vec::new())
        } else {
            // The mapping is read-only and the table never hands out mutable access.
            Source::Mapped(unsafe { Mmap::map(&file)? })
        };
        debug!(path = %path.display(), "loading sales dataset");
        Self::from_source(source, options)
    }

    /// Loads CSV text already in memory.
    pub fn from_csv_bytes(
        bytes: impl Into<Vec<u8>>,
        options: &LoadOptions,
    ) -> Result<(Self, ParseSummary), ProcessorError> {
        Self::from_source(Source::Owned(bytes.into()), options)
    }

    fn from_source(
        source: Source,
        options: &LoadOptions,
    ) -> Result<(Self, ParseSummary), ProcessorError> {
        let started = Instant::now();
        let buf: &[u8] = &source;

        // Parse header
        let header_end = memchr(b'\n', buf).unwrap_or(buf.len());
        let mut header_start = 0;
        if buf.starts_with(b"\xEF\xBB\xBF") {
            header_start = 3;
        }
        let header_line = trim_line_end(&buf[header_start.min(header_end)..header_end]);
        if header_line.trim_ascii().is_empty() {
            return Err(ProcessorError::MissingHeader);
        }

        let mut cells = Vec::new();
        split_fields(header_line, &mut cells)
            .map_err(|reason| ProcessorError::MalformedRow { line: 1, reason })?;
        let headers: Vec<Cow<'_, str>> = cells
            .iter()
            .map(|c| String::from_utf8_lossy(&header_line[c.start..c.end]))
            .collect();
        let header_map = HeaderMap::resolve(&headers)?;

        let data_start = (header_end + 1).min(buf.len());
        let data = &buf[data_start..];

        // Find chunk boundaries (split by newlines)
        let chunks = find_chunk_boundaries(data, rayon::current_num_threads());

        let estimated_rows_per_chunk = {
            let first_line_len = memchr(b'\n', data).unwrap_or(data.len()) + 1;
            data.len() / chunks.len().max(1) / first_line_len + 16
        };

        let policy = options.invalid_values;
        let batches: Vec<BatchResult> = chunks
            .par_iter()
            .map(|&(start, end)| {
                parse_chunk(
                    &data[start..end],
                    data_start + start,
                    &header_map,
                    policy,
                    estimated_rows_per_chunk,
                )
            })
            .collect();

        let mut columns = SalesColumns::default();
        let mut summary = ParseSummary::default();
        // Line 1 is the header.
        let mut line_base = 2;

        for mut batch in batches {
            for mut error in batch.errors {
                error.line += line_base;
                summary.errors.push(error);
            }
            line_base += batch.lines;
            summary.rows_skipped += batch.skipped;
            columns.append(&mut batch.columns);
        }
        columns.shrink_to_fit();
        summary.rows_loaded = columns.len();

        if policy == InvalidValuePolicy::Fail {
            if let Some(first) = summary.errors.first() {
                return Err(failure_from(first));
            }
        }

        if !summary.errors.is_empty() {
            warn!(
                skipped = summary.rows_skipped,
                problems = summary.errors.len(),
                ?policy,
                "dataset contained invalid rows"
            );
        }
        info!(
            rows = summary.rows_loaded,
            chunks = chunks.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sales dataset loaded"
        );

        Ok((SalesTable { source, columns }, summary))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn years(&self) -> &[i64] {
        &self.columns.year
    }

    pub fn numeric(&self, field: NumericField) -> &[f64] {
        self.columns.numeric(field)
    }

    /// Decoded text of a cell: quote escapes collapsed, invalid UTF-8 replaced.
    pub fn text(&self, span: Span) -> Cow<'_, str> {
        let bytes = self.source.get(span.start..span.end).unwrap_or(&[]);
        let text = String::from_utf8_lossy(bytes);
        if span.escaped {
            Cow::Owned(text.replace("\"\"", "\""))
        } else {
            text
        }
    }

    /// Text of a key column at `row`; years are rendered in decimal.
    pub fn key_text(&self, field: KeyField, row: usize) -> Cow<'_, str> {
        match self.columns.text(field) {
            Some(spans) => self.text(spans[row]),
            None => Cow::Owned(self.columns.year[row].to_string()),
        }
    }

    pub(crate) fn spans(&self, field: KeyField) -> Option<&[Span]> {
        self.columns.text(field)
    }

    pub fn record(&self, row: usize) -> Option<SalesRecord<'_>> {
        if row >= self.len() {
            return None;
        }
        let c = &self.columns;
        Some(SalesRecord {
            year: c.year[row],
            category: self.text(c.category[row]),
            product_name: self.text(c.product_name[row]),
            sales: c.sales[row],
            profit: c.profit[row],
            order_id: self.text(c.order_id[row]),
            days_to_ship: c.days_to_ship[row],
        })
    }
}

fn failure_from(error: &ParseError) -> ProcessorError {
    if error.column.is_empty() {
        ProcessorError::MalformedRow {
            line: error.line,
            reason: error.error.clone(),
        }
    } else {
        ProcessorError::InvalidValue {
            line: error.line,
            column: error.column.clone(),
            value: error.value.clone(),
        }
    }
}

fn find_chunk_boundaries(data: &[u8], num_chunks: usize) -> Vec<(usize, usize)> {
    if data.is_empty() {
        return vec![];
    }

    let num_chunks = num_chunks.clamp(1, data.len() / MIN_CHUNK_BYTES + 1);
    let chunk_size = data.len() / num_chunks;
    let mut boundaries = Vec::with_capacity(num_chunks);
    let mut start = 0;

    for i in 0..num_chunks - 1 {
        let target = ((i + 1) * chunk_size).max(start);
        if target >= data.len() {
            break;
        }

        // Cut just after the next newline
        let end = match memchr(b'\n', &data[target..]) {
            Some(pos) => target + pos + 1,
            None => data.len(),
        };

        if start < end {
            boundaries.push((start, end));
        }
        start = end;
    }

    // Last chunk gets everything remaining
    if start < data.len() {
        boundaries.push((start, data.len()));
    }

    boundaries
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Splits one CSV record into cell spans relative to `line`.
///
/// Handles quoted cells with `""` escapes; a record may not span lines.
pub(crate) fn split_fields(line: &[u8], out: &mut Vec<Span>) -> Result<(), String> {
    out.clear();
    let mut pos = 0;
    loop {
        if line.get(pos) == Some(&b'"') {
            let content_start = pos + 1;
            let mut scan = content_start;
            let mut escaped = false;
            let content_end = loop {
                match memchr(b'"', &line[scan..]) {
                    None => return Err(format!("unterminated quoted field at byte {pos}")),
                    Some(i) => {
                        let quote = scan + i;
                        if line.get(quote + 1) == Some(&b'"') {
                            escaped = true;
                            scan = quote + 2;
                        } else {
                            break quote;
                        }
                    }
                }
            };
            out.push(Span::new(content_start, content_end, escaped));
            pos = content_end + 1;
            match line.get(pos) {
                None => return Ok(()),
                Some(b',') => pos += 1,
                Some(_) => {
                    return Err(format!("unexpected character after quoted field at byte {pos}"));
                }
            }
        } else {
            match memchr(b',', &line[pos..]) {
                Some(i) => {
                    out.push(Span::new(pos, pos + i, false));
                    pos += i + 1;
                }
                None => {
                    out.push(Span::new(pos, line.len(), false));
                    return Ok(());
                }
            }
        }
    }
}

fn parse_number(bytes: &[u8]) -> Option<f64> {
    fast_float::parse::<f64, _>(bytes.trim_ascii())
        .ok()
        .filter(|v: &f64| v.is_finite())
}

fn parse_chunk(
    chunk: &[u8],
    chunk_offset: usize, // Absolute offset of this chunk in the source
    header: &HeaderMap,
    policy: InvalidValuePolicy,
    estimated_rows: usize,
) -> BatchResult {
    let mut columns = SalesColumns::with_capacity(estimated_rows);
    let mut errors = Vec::new();
    let mut skipped = 0;
    let mut lines = 0;
    let mut cells = Vec::with_capacity(header.width());

    let mut line_start = 0;
    let line_ends = memchr_iter(b'\n', chunk).chain(std::iter::once(chunk.len()));
    for line_end in line_ends {
        if line_end == chunk.len() && line_start >= chunk.len() {
            break;
        }
        let line_offset = line_start;
        let line = trim_line_end(&chunk[line_start..line_end]);
        line_start = line_end + 1;

        let line_no = lines;
        lines += 1;

        if line.trim_ascii().is_empty() {
            continue;
        }

        let row_error = |column: &str, value: &[u8], error: String| ParseError {
            line: line_no,
            column: column.to_string(),
            value: String::from_utf8_lossy(value).into_owned(),
            error,
        };

        if let Err(reason) = split_fields(line, &mut cells) {
            errors.push(row_error("", line, reason));
            skipped += 1;
            if policy == InvalidValuePolicy::Fail {
                break;
            }
            continue;
        }

        if cells.len() != header.width() {
            let reason = format!("expected {} fields, got {}", header.width(), cells.len());
            errors.push(row_error("", line, reason));
            skipped += 1;
            if policy == InvalidValuePolicy::Fail {
                break;
            }
            continue;
        }

        let cell = |field: Field| cells[header.position(field)];
        let bytes = |field: Field| {
            let c = cell(field);
            &line[c.start..c.end]
        };

        let mut year = None;
        let mut numbers = [0.0f64; 3];
        let mut keep = true;
        let mut n = 0;
        for field in Field::ALL {
            match field.column_type() {
                ColumnType::Int64 => match atoi_simd::parse::<i64>(bytes(field).trim_ascii()) {
                    Ok(v) => year = Some(v),
                    Err(e) => {
                        errors.push(row_error(field.header(), bytes(field), e.to_string()));
                        keep = false;
                    }
                },
                ColumnType::Float64 => {
                    match parse_number(bytes(field)) {
                        Some(v) => numbers[n] = v,
                        None => {
                            errors.push(row_error(
                                field.header(),
                                bytes(field),
                                "not a finite number".to_string(),
                            ));
                            if policy != InvalidValuePolicy::Zero {
                                keep = false;
                            }
                        }
                    }
                    n += 1;
                }
                ColumnType::Str => {}
            }
        }

        let Some(year) = year.filter(|_| keep) else {
            skipped += 1;
            if policy == InvalidValuePolicy::Fail {
                break;
            }
            continue;
        };

        // Store absolute offsets into the source
        let absolute = |field: Field| {
            let c = cell(field);
            let base = chunk_offset + line_offset;
            Span::new(base + c.start, base + c.end, c.escaped)
        };

        columns.year.push(year);
        columns.category.push(absolute(Field::Category));
        columns.product_name.push(absolute(Field::ProductName));
        columns.sales.push(numbers[0]);
        columns.profit.push(numbers[1]);
        columns.order_id.push(absolute(Field::OrderId));
        columns.days_to_ship.push(numbers[2]);
    }

    BatchResult {
        columns,
        errors,
        lines,
        skipped,
    }
}
