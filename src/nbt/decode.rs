//! Tolerant decoder for the binary tag-tree format.
//!
//! Big-endian throughout. The decoder is lenient by design: a truncated or
//! malformed node closes the enclosing compound with whatever entries parsed
//! before the damage, so callers can still extract surviving fields. Hard
//! rejection is reserved for inputs that are not a tag tree at all (wrong
//! root tag). All reads are bounds-checked; hostile lengths clamp to the
//! remaining input instead of allocating.

use std::io::Read;

use flate2::read::GzDecoder;
use tracing::trace;

use crate::sniff::COMPOUND_TAG;

use super::value::{Compound, Value};

const TAG_END: u8 = 0;
const TAG_BYTE: u8 = 1;
const TAG_SHORT: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_LONG: u8 = 4;
const TAG_FLOAT: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_BYTE_ARRAY: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_LIST: u8 = 9;
const TAG_COMPOUND: u8 = 10;
const TAG_INT_ARRAY: u8 = 11;
const TAG_LONG_ARRAY: u8 = 12;

/// Nesting cap; deeper structures stop decoding cleanly.
const MAX_DEPTH: usize = 64;

/// Inflate a gzip-framed buffer.
pub fn inflate_gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

/// Decode a bare (already-decompressed) tag tree.
///
/// Returns `None` when the input does not start with a compound root, the
/// one case treated as "not this format" rather than damage.
pub fn decode_bytes(data: &[u8]) -> Option<Value> {
    let mut cur = Cursor::new(data);
    if cur.u8()? != COMPOUND_TAG {
        return None;
    }
    // Root name; tolerate its absence on heavily truncated files.
    let _name = cur.string().unwrap_or_default();
    Some(Value::Compound(read_compound(&mut cur, 0)))
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if n > self.remaining() {
            return None;
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Some(slice)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn i16(&mut self) -> Option<i16> {
        self.take(2).map(|b| i16::from_be_bytes([b[0], b[1]]))
    }

    fn u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    fn i32(&mut self) -> Option<i32> {
        self.take(4)
            .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i64(&mut self) -> Option<i64> {
        self.take(8).map(|b| {
            i64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        })
    }

    fn f32(&mut self) -> Option<f32> {
        self.take(4)
            .map(|b| f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f64(&mut self) -> Option<f64> {
        self.take(8).map(|b| {
            f64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        })
    }

    /// Length-prefixed string. The on-disk encoding is a Java-flavored UTF-8;
    /// lossy conversion is close enough for key names and world names.
    fn string(&mut self) -> Option<String> {
        let len = self.u16()? as usize;
        let bytes = self.take(len)?;
        Some(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Read compound entries until an End tag, exhausted input, or damage.
/// Damage closes the compound with the entries read so far.
fn read_compound(cur: &mut Cursor<'_>, depth: usize) -> Compound {
    let mut out = Compound::new();
    loop {
        let Some(tag) = cur.u8() else { break };
        if tag == TAG_END {
            break;
        }
        let Some(name) = cur.string() else {
            trace!(depth, "truncated entry name, closing compound");
            break;
        };
        let Some(value) = read_payload(cur, tag, depth) else {
            trace!(depth, name, "truncated payload, closing compound");
            break;
        };
        out.insert(name, value);
    }
    out
}

fn read_payload(cur: &mut Cursor<'_>, tag: u8, depth: usize) -> Option<Value> {
    if depth > MAX_DEPTH {
        return None;
    }
    match tag {
        TAG_BYTE => cur.u8().map(|v| Value::Byte(v as i8)),
        TAG_SHORT => cur.i16().map(Value::Short),
        TAG_INT => cur.i32().map(Value::Int),
        TAG_LONG => cur.i64().map(Value::Long),
        TAG_FLOAT => cur.f32().map(Value::Float),
        TAG_DOUBLE => cur.f64().map(Value::Double),
        TAG_BYTE_ARRAY => {
            let len = clamp_len(cur.i32()?, cur.remaining(), 1);
            cur.take(len).map(|b| Value::ByteArray(b.to_vec()))
        }
        TAG_STRING => cur.string().map(Value::String),
        TAG_LIST => {
            let item_tag = cur.u8()?;
            let len = clamp_len(cur.i32()?, cur.remaining(), 1);
            let mut items = Vec::new();
            for _ in 0..len {
                match read_payload(cur, item_tag, depth + 1) {
                    Some(item) => items.push(item),
                    None => break,
                }
            }
            Some(Value::List(items))
        }
        TAG_COMPOUND => Some(Value::Compound(read_compound(cur, depth + 1))),
        TAG_INT_ARRAY => {
            let len = clamp_len(cur.i32()?, cur.remaining(), 4);
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(cur.i32()?);
            }
            Some(Value::IntArray(items))
        }
        TAG_LONG_ARRAY => {
            let len = clamp_len(cur.i32()?, cur.remaining(), 8);
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(cur.i64()?);
            }
            Some(Value::LongArray(items))
        }
        _ => None,
    }
}

/// Clamp a declared element count to what the remaining input can hold.
fn clamp_len(declared: i32, remaining: usize, elem_size: usize) -> usize {
    if declared <= 0 {
        return 0;
    }
    (declared as usize).min(remaining / elem_size.max(1))
}

#[cfg(test)]
pub(crate) mod test_bytes {
    //! Byte-level builders for tag-tree fixtures.

    pub fn named(tag: u8, name: &str) -> Vec<u8> {
        let mut out = vec![tag];
        out.extend((name.len() as u16).to_be_bytes());
        out.extend(name.as_bytes());
        out
    }

    pub fn root() -> Vec<u8> {
        named(10, "")
    }

    pub fn long_entry(name: &str, value: i64) -> Vec<u8> {
        let mut out = named(4, name);
        out.extend(value.to_be_bytes());
        out
    }

    pub fn int_entry(name: &str, value: i32) -> Vec<u8> {
        let mut out = named(3, name);
        out.extend(value.to_be_bytes());
        out
    }

    pub fn byte_entry(name: &str, value: i8) -> Vec<u8> {
        let mut out = named(1, name);
        out.push(value as u8);
        out
    }

    pub fn string_entry(name: &str, value: &str) -> Vec<u8> {
        let mut out = named(8, name);
        out.extend((value.len() as u16).to_be_bytes());
        out.extend(value.as_bytes());
        out
    }

    pub fn compound_open(name: &str) -> Vec<u8> {
        named(10, name)
    }

    pub const END: u8 = 0;
}
