//! # Sort-Merge Stager
//!
//! Collects the lines of one region, orders them by standardized path and
//! hands them to the tree builder as a single sorted stream.
//!
//! ## Ordering
//!
//! Lines are compared by their key segments (`standardized_name;level`)
//! element by element, so a path sorts right before its extensions:
//!
//! ```text
//! 東京都;1
//! 東京都;1 渋谷区;3
//! 東京都;1 渋谷区;3 道玄坂;5        !01
//! 東京都;1 渋谷区;3 道玄坂;5        !03   <- duplicate, dropped later
//! 東京都;1 港区;3
//! ```
//!
//! Ties on the full path are broken by priority (lower first) and then by
//! arrival order (the sort is stable and files are read in name order), so
//! the line that survives deduplication does not depend on the raw text of
//! the priority marker.
//!
//! ## Spill File
//!
//! The sorted run is written to an anonymous temporary file, one line per
//! record:
//!
//! ```text
//! line_no \t source_index \t raw line
//! ```
//!
//! The raw line is the last field and never holds a newline, so it may
//! contain tabs. Standardized keys are not spilled: a pluggable standardizer
//! may emit any character, so the key is recomputed from the re-parsed line
//! on the way back. The in-memory run is released before the stream is read
//! back.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use eyre::{eyre, Result, WrapErr};
use tracing::debug;

use crate::address::{parse_line, NormalizedLine, Standardizer};

struct StagedLine {
    segments: Vec<String>,
    priority: u8,
    line_no: usize,
    source: usize,
    raw: String,
}

/// One line of the sorted stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedEntry {
    pub segments: Vec<String>,
    pub line: NormalizedLine,
}

pub struct SortMergeStager<'s> {
    standardizer: &'s dyn Standardizer,
    sources: Vec<String>,
    lines: Vec<StagedLine>,
}

impl<'s> SortMergeStager<'s> {
    pub fn new(standardizer: &'s dyn Standardizer) -> Self {
        Self {
            standardizer,
            sources: Vec::new(),
            lines: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Parses every line of `text`. The first malformed line aborts with
    /// `DictError::InputFormat` naming `origin` and the 1-based line number.
    pub fn add_text(&mut self, origin: &str, text: &str) -> Result<usize> {
        let source = self.sources.len();
        self.sources.push(origin.to_string());

        let before = self.lines.len();
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let Some(line) = parse_line(raw, origin, line_no)? else {
                continue;
            };
            self.lines.push(StagedLine {
                segments: line.key_segments(self.standardizer),
                priority: line.priority,
                line_no,
                source,
                raw: raw.trim_end_matches('\r').to_string(),
            });
        }

        let added = self.lines.len() - before;
        debug!(origin, lines = added, "staged source");
        Ok(added)
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read '{}'", path.display()))?;
        self.add_text(&path.display().to_string(), &text)
    }

    /// Sorts the staged lines, spills them to a temporary file and returns
    /// the stream reading them back.
    pub fn sort(mut self) -> Result<SortedLines<'s>> {
        self.lines.sort_by(|a, b| {
            a.segments
                .cmp(&b.segments)
                .then_with(|| a.priority.cmp(&b.priority))
        });

        let file = tempfile::tempfile().wrap_err("failed to create sort spill file")?;
        let mut writer = BufWriter::new(file);
        let count = self.lines.len();

        for staged in self.lines.drain(..) {
            writeln!(writer, "{}\t{}\t{}", staged.line_no, staged.source, staged.raw)
                .wrap_err("failed to write sort spill file")?;
        }

        let mut file = writer
            .into_inner()
            .map_err(|e| eyre!("failed to flush sort spill file: {}", e.error()))?;
        file.seek(SeekFrom::Start(0))
            .wrap_err("failed to rewind sort spill file")?;

        debug!(lines = count, "sorted region");

        Ok(SortedLines {
            standardizer: self.standardizer,
            reader: BufReader::new(file),
            sources: self.sources,
            buf: String::new(),
            remaining: count,
        })
    }
}

/// Sorted stream read back from the spill file.
pub struct SortedLines<'s> {
    standardizer: &'s dyn Standardizer,
    reader: BufReader<File>,
    sources: Vec<String>,
    buf: String,
    remaining: usize,
}

impl SortedLines<'_> {
    fn read_entry(&mut self) -> Result<Option<StagedEntry>> {
        self.buf.clear();
        let read = self
            .reader
            .read_line(&mut self.buf)
            .wrap_err("failed to read sort spill file")?;
        if read == 0 {
            return Ok(None);
        }

        let record = self.buf.trim_end_matches('\n');
        let mut parts = record.splitn(3, '\t');
        let (Some(line_no), Some(source), Some(raw)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(eyre!("damaged sort spill record: {:?}", record));
        };

        let line_no: usize = line_no.parse().wrap_err("damaged line number in spill file")?;
        let source: usize = source.parse().wrap_err("damaged source index in spill file")?;
        let origin = self
            .sources
            .get(source)
            .ok_or_else(|| eyre!("unknown source index {} in spill file", source))?;

        let line = parse_line(raw, origin, line_no)?
            .ok_or_else(|| eyre!("{}:{}: staged line vanished on re-read", origin, line_no))?;

        Ok(Some(StagedEntry {
            segments: line.key_segments(self.standardizer),
            line,
        }))
    }
}

impl Iterator for SortedLines<'_> {
    type Item = Result<StagedEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_entry() {
            Ok(Some(entry)) => {
                self.remaining = self.remaining.saturating_sub(1);
                Some(Ok(entry))
            }
            Ok(None) => None,
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
