//! Canonical text encoding.
//!
//! The canonical format is JSON with a fixed layout:
//!
//! ```text
//! {
//!   "hash": "3f2a...",
//!   "modules": {
//!     "2.13.8": [{"module": {"organization": "org", "name": "lib"}, "artifacts": []}]
//!   }
//! }
//! ```
//!
//! - Objects place one field per line, indented two spaces per nesting level,
//!   fields separated by `",\n"`.
//! - Arrays stay on one line with `", "` separators, and everything nested
//!   inside an array is written on that same line.
//!
//! Struct fields are emitted in declaration order. Maps must be `BTreeMap` so
//! keys come out sorted; a `HashMap` would leak iteration order into the bytes.
//! Both the fingerprint and the persisted lock file are computed from this
//! output, so any layout change alters both.

use std::io;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::Formatter;
use thiserror::Error;

use crate::consts::INDENT;

/// Errors from canonical encoding or decoding.
#[derive(Debug, Error)]
pub enum CanonicalError {
  /// Value could not be encoded.
  #[error("failed to encode canonical text: {0}")]
  Encode(#[source] serde_json::Error),

  /// Input could not be decoded.
  #[error("failed to decode canonical text: {0}")]
  Decode(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
  Object,
  Array,
}

#[derive(Debug)]
struct Frame {
  container: Container,
  inline: bool,
  has_value: bool,
}

/// `serde_json` formatter producing the canonical layout.
#[derive(Debug, Default)]
pub struct CanonicalFormatter {
  frames: Vec<Frame>,
}

impl CanonicalFormatter {
  pub fn new() -> Self {
    Self::default()
  }

  fn inside_inline(&self) -> bool {
    self.frames.last().is_some_and(|f| f.inline)
  }

  /// Number of enclosing objects laid out one field per line.
  fn block_depth(&self) -> usize {
    self
      .frames
      .iter()
      .filter(|f| f.container == Container::Object && !f.inline)
      .count()
  }

  fn indent<W: ?Sized + io::Write>(writer: &mut W, depth: usize) -> io::Result<()> {
    for _ in 0..depth {
      writer.write_all(INDENT)?;
    }
    Ok(())
  }
}

impl Formatter for CanonicalFormatter {
  fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
    let inline = self.inside_inline();
    self.frames.push(Frame {
      container: Container::Object,
      inline,
      has_value: false,
    });
    writer.write_all(b"{")
  }

  fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
    if let Some(frame) = self.frames.pop()
      && !frame.inline
      && frame.has_value
    {
      writer.write_all(b"\n")?;
      Self::indent(writer, self.block_depth())?;
    }
    writer.write_all(b"}")
  }

  fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
    let depth = self.block_depth();
    let Some(frame) = self.frames.last_mut() else {
      return Ok(());
    };
    frame.has_value = true;
    if frame.inline {
      if !first {
        writer.write_all(b", ")?;
      }
      return Ok(());
    }
    writer.write_all(if first { b"\n" } else { b",\n" })?;
    Self::indent(writer, depth)
  }

  fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
    writer.write_all(b": ")
  }

  fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
    self.frames.push(Frame {
      container: Container::Array,
      inline: true,
      has_value: false,
    });
    writer.write_all(b"[")
  }

  fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
    self.frames.pop();
    writer.write_all(b"]")
  }

  fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
    if let Some(frame) = self.frames.last_mut() {
      frame.has_value = true;
    }
    if first { Ok(()) } else { writer.write_all(b", ") }
  }
}

/// Encode a value as canonical bytes.
pub fn to_canonical_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CanonicalError> {
  let mut out = Vec::with_capacity(256);
  let mut serializer = serde_json::Serializer::with_formatter(&mut out, CanonicalFormatter::new());
  value.serialize(&mut serializer).map_err(CanonicalError::Encode)?;
  Ok(out)
}

/// Encode a value as canonical text.
pub fn to_canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String, CanonicalError> {
  let bytes = to_canonical_vec(value)?;
  // serde_json only emits UTF-8
  Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Decode canonical (or any conforming JSON) text.
pub fn from_canonical_str<T: DeserializeOwned>(text: &str) -> Result<T, CanonicalError> {
  serde_json::from_str(text).map_err(CanonicalError::Decode)
}

/// Decode canonical (or any conforming JSON) bytes.
pub fn from_canonical_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CanonicalError> {
  serde_json::from_slice(bytes).map_err(CanonicalError::Decode)
}
