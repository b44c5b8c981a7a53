//! Streaming statement splitter for SQL dumps.
//!
//! Splits on `;` outside of quoted strings, quoted identifiers and comments.
//! Comments are dropped from the returned statements.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;
use std::io::{self, BufRead};

static CREATE_TABLE_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*CREATE\s+TABLE\b").unwrap());

static ALTER_TABLE_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*ALTER\s+TABLE\b").unwrap());

static CREATE_INDEX_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*CREATE\s+(?:UNIQUE\s+)?(?:CLUSTERED\s+|NONCLUSTERED\s+)?INDEX\b").unwrap()
});

/// Statements the loader cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementType {
    Unknown,
    CreateTable,
    AlterTable,
    CreateIndex,
}

impl StatementType {
    pub fn classify(stmt: &str) -> Self {
        if CREATE_TABLE_PREFIX_RE.is_match(stmt) {
            StatementType::CreateTable
        } else if ALTER_TABLE_PREFIX_RE.is_match(stmt) {
            StatementType::AlterTable
        } else if CREATE_INDEX_PREFIX_RE.is_match(stmt) {
            StatementType::CreateIndex
        } else {
            StatementType::Unknown
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    Quoted(u8),
    BlockComment,
}

/// Reads one statement at a time from a line-oriented source
pub struct StatementReader<R: BufRead> {
    reader: R,
    line: Vec<u8>,
    pending: Vec<u8>,
    ready: VecDeque<String>,
    state: ScanState,
    eof: bool,
}

impl<R: BufRead> StatementReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::with_capacity(4096),
            pending: Vec::with_capacity(32 * 1024),
            ready: VecDeque::new(),
            state: ScanState::Code,
            eof: false,
        }
    }

    /// Next non-empty statement without its terminator, or `None` at end of input
    pub fn read_statement(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(stmt) = self.ready.pop_front() {
                return Ok(Some(stmt));
            }
            if self.eof {
                return Ok(None);
            }

            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line)? == 0 {
                self.eof = true;
                self.finish_statement();
                continue;
            }
            self.scan_line();
        }
    }

    fn scan_line(&mut self) {
        let line = std::mem::take(&mut self.line);
        let mut i = 0;

        while i < line.len() {
            let b = line[i];
            let next = line.get(i + 1).copied();

            match self.state {
                ScanState::BlockComment => {
                    if b == b'*' && next == Some(b'/') {
                        self.state = ScanState::Code;
                        self.pending.push(b' ');
                        i += 2;
                        continue;
                    }
                }
                ScanState::Quoted(quote) => {
                    self.pending.push(b);
                    if b == b'\\' && quote != b'`' {
                        if let Some(escaped) = next {
                            self.pending.push(escaped);
                            i += 2;
                            continue;
                        }
                    } else if b == quote {
                        self.state = ScanState::Code;
                    }
                }
                ScanState::Code => match b {
                    b'-' if next == Some(b'-') => {
                        self.pending.push(b'\n');
                        break;
                    }
                    b'#' => {
                        self.pending.push(b'\n');
                        break;
                    }
                    b'/' if next == Some(b'*') => {
                        self.state = ScanState::BlockComment;
                        i += 2;
                        continue;
                    }
                    b'\'' | b'"' | b'`' => {
                        self.state = ScanState::Quoted(b);
                        self.pending.push(b);
                    }
                    b';' => self.finish_statement(),
                    _ => self.pending.push(b),
                },
            }
            i += 1;
        }

        self.line = line;
    }

    fn finish_statement(&mut self) {
        let raw = std::mem::take(&mut self.pending);
        let stmt = String::from_utf8_lossy(&raw);
        let trimmed = stmt.trim();
        if !trimmed.is_empty() {
            self.ready.push_back(trimmed.to_string());
        }
    }
}

impl<R: BufRead> Iterator for StatementReader<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_statement().transpose()
    }
}
