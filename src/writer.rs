use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Serializer, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::Path;

/// Writes records as line-delimited JSON, up to a fixed number of lines.
///
/// Each line is one object with keys in ascending order and every non-ASCII
/// character escaped, so the file is plain ASCII.
pub struct JsonlWriter<W: Write> {
    out: BufWriter<W>,
    limit: usize,
    written: usize,
}

impl JsonlWriter<File> {
    /// Create or truncate `path`.
    pub fn create(path: &Path, limit: NonZeroUsize) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(file, limit))
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(inner: W, limit: NonZeroUsize) -> Self {
        Self {
            out: BufWriter::new(inner),
            limit: limit.get(),
            written: 0,
        }
    }

    /// True once `limit` lines have been written.
    pub fn is_full(&self) -> bool {
        self.written >= self.limit
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Append one record. Records offered after the limit are ignored.
    ///
    /// Returns whether the record was written.
    pub fn write_record<T: Serialize>(&mut self, record: &T) -> io::Result<bool> {
        if self.is_full() {
            return Ok(false);
        }
        let line = encode_line(record).map_err(io::Error::other)?;
        self.out.write_all(&line)?;
        self.written += 1;
        Ok(true)
    }

    /// Flush buffered lines and release the underlying handle.
    pub fn finish(mut self) -> io::Result<usize> {
        self.out.flush()?;
        Ok(self.written)
    }
}

/// Encode `record` as a single newline-terminated JSON line.
pub fn encode_line<T: Serialize>(record: &T) -> serde_json::Result<Vec<u8>> {
    let sorted = sort_keys(serde_json::to_value(record)?);
    let mut buf = Vec::with_capacity(128);
    let mut ser = Serializer::with_formatter(&mut buf, AsciiFormatter);
    sorted.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

fn sort_keys(value: Value) -> Sorted {
    match value {
        Value::Object(map) => Sorted::Object(
            map.into_iter()
                .map(|(k, v)| (k, sort_keys(v)))
                .collect(),
        ),
        Value::Array(items) => Sorted::Array(items.into_iter().map(sort_keys).collect()),
        other => Sorted::Leaf(other),
    }
}

/// A JSON value whose objects iterate in key order regardless of how
/// `serde_json::Map` is configured.
#[derive(Serialize)]
#[serde(untagged)]
enum Sorted {
    Object(BTreeMap<String, Sorted>),
    Array(Vec<Sorted>),
    Leaf(Value),
}

// ── Formatter ───────────────────────────────────────────────────────────────

/// `{"a": 1, "b": "é"}` style: spaced separators, ASCII-only strings.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..i])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}
