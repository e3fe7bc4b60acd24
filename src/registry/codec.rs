//! Binary plugin cache codec
//!
//! Reads and writes the cache format consumed by the plugin loader at
//! runtime. All integers are big-endian.
//!
//! ```text
//! registry  := i32 category_count, category*
//! category  := utf(name), i32 entry_count, entry*
//! entry     := utf(key), utf(class_name), utf(name), bool printable, bool defer
//! utf       := u16 byte_length, modified UTF-8 bytes
//! bool      := u8, non-zero is true
//! ```

use crate::error::{PlugcacheError, PlugcacheResult};
use crate::registry::{mutf8, Registry, RegistryEntry};
use std::io::{BufWriter, Write};
use tracing::debug;

/// Longest encodable string, in bytes
pub const MAX_STRING_BYTES: usize = u16::MAX as usize;

/// Decode one cache fragment
pub fn decode(bytes: &[u8]) -> PlugcacheResult<Registry> {
    let mut reader = Reader::new(bytes);
    let mut registry = Registry::new();

    let category_count = reader.read_count("category count")?;
    for _ in 0..category_count {
        let category_name = reader.read_utf()?;
        let category = registry.category_mut(&category_name);

        let entry_count = reader.read_count("entry count")?;
        for _ in 0..entry_count {
            let key = reader.read_utf()?;
            let class_name = reader.read_utf()?;
            let name = reader.read_utf()?;
            let printable = reader.read_bool()?;
            let defer = reader.read_bool()?;
            category.insert(RegistryEntry {
                key,
                class_name,
                name,
                printable,
                defer,
            });
        }
    }

    if reader.remaining() > 0 {
        debug!("Ignoring {} trailing bytes after registry", reader.remaining());
    }

    Ok(registry)
}

/// Encode a registry into a new buffer
pub fn encode(registry: &Registry) -> PlugcacheResult<Vec<u8>> {
    let mut out = Vec::new();
    write_count(&mut out, registry.len(), "categories")?;

    for (name, category) in registry.categories() {
        write_utf(&mut out, name)?;
        write_count(&mut out, category.len(), "entries")?;

        for entry in category.entries() {
            write_utf(&mut out, &entry.key)?;
            write_utf(&mut out, &entry.class_name)?;
            write_utf(&mut out, &entry.name)?;
            out.push(u8::from(entry.printable));
            out.push(u8::from(entry.defer));
        }
    }

    Ok(out)
}

/// Encode a registry into `writer`
///
/// The writer is consumed and dropped once everything is flushed. Nothing
/// is written if the registry cannot be encoded.
pub fn write_registry<W: Write>(registry: &Registry, writer: W) -> PlugcacheResult<usize> {
    let bytes = encode(registry)?;
    let mut out = BufWriter::new(writer);
    out.write_all(&bytes)
        .and_then(|()| out.flush())
        .map_err(|e| PlugcacheError::destination("writing encoded registry", e))?;
    Ok(bytes.len())
}

fn write_count(out: &mut Vec<u8>, count: usize, what: &'static str) -> PlugcacheResult<()> {
    let count = i32::try_from(count).map_err(|_| PlugcacheError::CountOverflow { what, count })?;
    out.extend_from_slice(&count.to_be_bytes());
    Ok(())
}

fn write_utf(out: &mut Vec<u8>, s: &str) -> PlugcacheResult<()> {
    let len = mutf8::encoded_len(s);
    if len > MAX_STRING_BYTES {
        return Err(PlugcacheError::StringTooLong { len });
    }
    out.extend_from_slice(&(len as u16).to_be_bytes());
    mutf8::encode_into(s, out);
    Ok(())
}

/// Cursor over a fragment that reports errors with their byte offset
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, len: usize, what: &str) -> PlugcacheResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(PlugcacheError::malformed(
                self.pos,
                format!(
                    "unexpected end of input reading {} ({} bytes needed, {} left)",
                    what,
                    len,
                    self.remaining()
                ),
            ));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_count(&mut self, what: &str) -> PlugcacheResult<usize> {
        let start = self.pos;
        let raw = self.take(4, what)?;
        let value = i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
        usize::try_from(value)
            .map_err(|_| PlugcacheError::malformed(start, format!("negative {}: {}", what, value)))
    }

    fn read_bool(&mut self) -> PlugcacheResult<bool> {
        Ok(self.take(1, "flag")?[0] != 0)
    }

    fn read_utf(&mut self) -> PlugcacheResult<String> {
        let raw = self.take(2, "string length")?;
        let len = usize::from(u16::from_be_bytes([raw[0], raw[1]]));
        let start = self.pos;
        let data = self.take(len, "string")?;
        mutf8::decode(data).map_err(|e| {
            PlugcacheError::malformed(start + e.position, format!("invalid string: {}", e.reason))
        })
    }
}
