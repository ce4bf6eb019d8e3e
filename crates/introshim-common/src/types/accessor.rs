//! Typed memory accessor kinds
//!
//! Each kind maps to a `read<Suffix>` / `write<Suffix>` operation pair on
//! the memory namespace and on pointers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessorType {
    Pointer,
    ByteArray,
    Utf8String,
    Utf16String,
    S8,
    U8,
    S16,
    U16,
    S32,
    U32,
    Float,
    Double,
    S64,
    U64,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    CString,
    AnsiString,
}

impl AccessorType {
    pub const ALL: [AccessorType; 22] = [
        AccessorType::Pointer,
        AccessorType::ByteArray,
        AccessorType::Utf8String,
        AccessorType::Utf16String,
        AccessorType::S8,
        AccessorType::U8,
        AccessorType::S16,
        AccessorType::U16,
        AccessorType::S32,
        AccessorType::U32,
        AccessorType::Float,
        AccessorType::Double,
        AccessorType::S64,
        AccessorType::U64,
        AccessorType::Short,
        AccessorType::UShort,
        AccessorType::Int,
        AccessorType::UInt,
        AccessorType::Long,
        AccessorType::ULong,
        AccessorType::CString,
        AccessorType::AnsiString,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            AccessorType::Pointer => "Pointer",
            AccessorType::ByteArray => "ByteArray",
            AccessorType::Utf8String => "Utf8String",
            AccessorType::Utf16String => "Utf16String",
            AccessorType::S8 => "S8",
            AccessorType::U8 => "U8",
            AccessorType::S16 => "S16",
            AccessorType::U16 => "U16",
            AccessorType::S32 => "S32",
            AccessorType::U32 => "U32",
            AccessorType::Float => "Float",
            AccessorType::Double => "Double",
            AccessorType::S64 => "S64",
            AccessorType::U64 => "U64",
            AccessorType::Short => "Short",
            AccessorType::UShort => "UShort",
            AccessorType::Int => "Int",
            AccessorType::UInt => "UInt",
            AccessorType::Long => "Long",
            AccessorType::ULong => "ULong",
            AccessorType::CString => "CString",
            AccessorType::AnsiString => "AnsiString",
        }
    }

    pub fn read_name(self) -> String {
        format!("read{}", self.suffix())
    }

    pub fn write_name(self) -> String {
        format!("write{}", self.suffix())
    }

    /// Width in bytes for fixed-size kinds, `None` for strings and byte
    /// arrays. `Long`/`ULong` follow LP64.
    pub fn width(self) -> Option<usize> {
        match self {
            AccessorType::S8 | AccessorType::U8 => Some(1),
            AccessorType::S16 | AccessorType::U16 | AccessorType::Short | AccessorType::UShort => {
                Some(2)
            }
            AccessorType::S32
            | AccessorType::U32
            | AccessorType::Int
            | AccessorType::UInt
            | AccessorType::Float => Some(4),
            AccessorType::S64
            | AccessorType::U64
            | AccessorType::Long
            | AccessorType::ULong
            | AccessorType::Double
            | AccessorType::Pointer => Some(8),
            AccessorType::ByteArray
            | AccessorType::Utf8String
            | AccessorType::Utf16String
            | AccessorType::CString
            | AccessorType::AnsiString => None,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            AccessorType::S8
                | AccessorType::S16
                | AccessorType::S32
                | AccessorType::S64
                | AccessorType::Short
                | AccessorType::Int
                | AccessorType::Long
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names() {
        assert_eq!(AccessorType::U32.read_name(), "readU32");
        assert_eq!(AccessorType::CString.write_name(), "writeCString");
    }

    #[test]
    fn test_suffixes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for ty in AccessorType::ALL {
            assert!(seen.insert(ty.suffix()), "duplicate suffix {}", ty.suffix());
        }
    }

    #[test]
    fn test_alias_widths() {
        assert_eq!(AccessorType::Short.width(), AccessorType::S16.width());
        assert_eq!(AccessorType::UInt.width(), Some(4));
        assert_eq!(AccessorType::Long.width(), Some(8));
        assert_eq!(AccessorType::CString.width(), None);
        assert!(AccessorType::Int.is_signed());
        assert!(!AccessorType::UShort.is_signed());
    }
}
