//! Sparse simulated address space
//!
//! Only written bytes are mapped; touching anything else is a
//! [`Error::MemoryAccess`]. Multi-byte values are little-endian and
//! `Long`/`ULong`/`Pointer` are 8 bytes wide.

use introshim_common::{AccessorType, Error, NativePointer, Result, ScanMatch, TypedMemory, Value};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct SimMemory {
    bytes: Arc<RwLock<BTreeMap<u64, u8>>>,
}

impl SimMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer into this address space
    pub fn pointer(&self, address: u64) -> NativePointer {
        NativePointer::new(address, Arc::new(self.clone()))
    }

    pub fn write_bytes(&self, address: u64, data: &[u8]) {
        let mut bytes = self.bytes.write();
        for (offset, byte) in data.iter().enumerate() {
            bytes.insert(address.wrapping_add(offset as u64), *byte);
        }
    }

    pub fn read_bytes(&self, address: u64, len: usize) -> Result<Vec<u8>> {
        let bytes = self.bytes.read();
        (0..len as u64)
            .map(|offset| {
                let at = address.wrapping_add(offset);
                bytes.get(&at).copied().ok_or(Error::MemoryAccess {
                    address: at,
                    message: "unmapped".into(),
                })
            })
            .collect()
    }

    /// Read units of `width` bytes until a zero unit or `limit` units
    fn read_terminated(&self, address: u64, width: usize, limit: Option<usize>) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut at = address;
        while limit.map_or(true, |limit| out.len() / width < limit) {
            let unit = self.read_bytes(at, width)?;
            if unit.iter().all(|b| *b == 0) {
                break;
            }
            out.extend_from_slice(&unit);
            at = at.wrapping_add(width as u64);
        }
        Ok(out)
    }

    /// Find `pattern` (hex bytes, `??` wildcards) in `[address, address + size)`
    pub fn scan(&self, address: u64, size: u64, pattern: &str) -> Result<Vec<ScanMatch>> {
        let pattern = parse_pattern(pattern)?;
        let data = self.read_bytes(address, size as usize)?;
        if data.len() < pattern.len() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        'outer: for i in 0..=data.len() - pattern.len() {
            for (j, expected) in pattern.iter().enumerate() {
                if let Some(expected) = expected {
                    if data[i + j] != *expected {
                        continue 'outer;
                    }
                }
            }
            matches.push(ScanMatch {
                address: address + i as u64,
                size: pattern.len() as u64,
            });
        }
        Ok(matches)
    }
}

fn parse_pattern(pattern: &str) -> Result<Vec<Option<u8>>> {
    let parsed = pattern
        .split_whitespace()
        .map(|token| match token {
            "??" | "?" => Ok(None),
            hex => u8::from_str_radix(hex, 16)
                .map(Some)
                .map_err(|_| Error::InvalidArgument(format!("bad pattern byte: {}", hex))),
        })
        .collect::<Result<Vec<_>>>()?;
    if parsed.is_empty() {
        return Err(Error::InvalidArgument("empty pattern".into()));
    }
    Ok(parsed)
}

fn length_arg(extra: &[Value]) -> Option<usize> {
    extra.first().and_then(Value::as_u64).map(|n| n as usize)
}

fn integer_bits(value: &Value) -> Option<u64> {
    match value {
        Value::Pointer(p) => Some(p.address()),
        other => other
            .as_u64()
            .or_else(|| other.as_i64().map(|v| v as u64)),
    }
}

fn invalid(ty: AccessorType, value: &Value) -> Error {
    Error::InvalidArgument(format!("cannot write a {} with {}", value.kind(), ty.write_name()))
}

impl TypedMemory for SimMemory {
    fn read(&self, address: u64, ty: AccessorType, extra: &[Value]) -> Result<Value> {
        match ty {
            AccessorType::ByteArray => {
                let len = length_arg(extra).ok_or_else(|| {
                    Error::InvalidArgument("readByteArray expects a length".into())
                })?;
                Ok(Value::Bytes(self.read_bytes(address, len)?))
            }
            AccessorType::Utf8String | AccessorType::CString | AccessorType::AnsiString => {
                let raw = self.read_terminated(address, 1, length_arg(extra))?;
                Ok(Value::String(String::from_utf8_lossy(&raw).into_owned()))
            }
            AccessorType::Utf16String => {
                let raw = self.read_terminated(address, 2, length_arg(extra))?;
                let units: Vec<u16> = raw
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .collect();
                Ok(Value::String(String::from_utf16_lossy(&units)))
            }
            AccessorType::Float => {
                let raw = self.read_bytes(address, 4)?;
                Ok(Value::Float(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64))
            }
            AccessorType::Double => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&self.read_bytes(address, 8)?);
                Ok(Value::Float(f64::from_le_bytes(buf)))
            }
            fixed => {
                let width = fixed.width().unwrap_or(8);
                let raw = self.read_bytes(address, width)?;
                let mut buf = [0u8; 8];
                buf[..width].copy_from_slice(&raw);
                let bits = u64::from_le_bytes(buf);
                if fixed == AccessorType::Pointer {
                    return Ok(Value::Pointer(self.pointer(bits)));
                }
                if fixed.is_signed() {
                    let shift = 64 - 8 * width as u32;
                    Ok(Value::Int(((bits << shift) as i64) >> shift))
                } else {
                    Ok(Value::UInt(bits))
                }
            }
        }
    }

    fn write(&self, address: u64, ty: AccessorType, value: &Value, _extra: &[Value]) -> Result<()> {
        let data = match ty {
            AccessorType::ByteArray => match value {
                Value::Bytes(bytes) => bytes.clone(),
                Value::Array(items) => items
                    .iter()
                    .map(|item| item.as_u64().map(|b| b as u8).ok_or_else(|| invalid(ty, item)))
                    .collect::<Result<Vec<u8>>>()?,
                other => return Err(invalid(ty, other)),
            },
            AccessorType::Utf8String | AccessorType::CString | AccessorType::AnsiString => {
                let s = value.as_str().ok_or_else(|| invalid(ty, value))?;
                let mut data = s.as_bytes().to_vec();
                data.push(0);
                data
            }
            AccessorType::Utf16String => {
                let s = value.as_str().ok_or_else(|| invalid(ty, value))?;
                s.encode_utf16()
                    .chain(std::iter::once(0))
                    .flat_map(u16::to_le_bytes)
                    .collect()
            }
            AccessorType::Float => {
                let f = value.as_f64().ok_or_else(|| invalid(ty, value))?;
                (f as f32).to_le_bytes().to_vec()
            }
            AccessorType::Double => {
                let f = value.as_f64().ok_or_else(|| invalid(ty, value))?;
                f.to_le_bytes().to_vec()
            }
            fixed => {
                let width = fixed.width().unwrap_or(8);
                let bits = integer_bits(value).ok_or_else(|| invalid(ty, value))?;
                bits.to_le_bytes()[..width].to_vec()
            }
        };
        self.write_bytes(address, &data);
        Ok(())
    }
}
