//! Symbol table entries: named addresses and sizes of program entities.

use crate::codec::{read_u16, read_u32, read_u64, write_u16, write_u32, write_u64};
use crate::error::{Error, Result};
use crate::ident::{ElfClass, ElfDataEncoding};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
/// The kind of entity a symbol names (low 4 bits of `st_info`).
pub enum SymbolType {
    /// Type not specified.
    NoType,
    /// A data object.
    Object,
    /// A function entry point.
    Func,
    /// Associated with a section.
    Section,
    /// The source file associated with the object file.
    File,
    /// Any other value.
    Other(u8),
}

impl From<u8> for SymbolType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::NoType,
            1 => Self::Object,
            2 => Self::Func,
            3 => Self::Section,
            4 => Self::File,
            other => Self::Other(other),
        }
    }
}

impl From<SymbolType> for u8 {
    fn from(value: SymbolType) -> Self {
        match value {
            SymbolType::NoType => 0,
            SymbolType::Object => 1,
            SymbolType::Func => 2,
            SymbolType::Section => 3,
            SymbolType::File => 4,
            SymbolType::Other(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
/// A symbol's linkage visibility (high 4 bits of `st_info`).
pub enum SymbolBind {
    /// Not visible outside the object file.
    Local,
    /// Visible to all object files being combined.
    Global,
    /// Global scope, but with lower precedence than `Global` symbols.
    Weak,
    /// Any other value.
    Other(u8),
}

impl From<u8> for SymbolBind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Local,
            1 => Self::Global,
            2 => Self::Weak,
            other => Self::Other(other),
        }
    }
}

impl From<SymbolBind> for u8 {
    fn from(value: SymbolBind) -> Self {
        match value {
            SymbolBind::Local => 0,
            SymbolBind::Global => 1,
            SymbolBind::Weak => 2,
            SymbolBind::Other(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Uniform view of a symbol table entry (`Elf32_Sym`/`Elf64_Sym`).
pub struct SymbolEntry {
    /// Index into the string table referenced by the symbol table's `link`.
    pub name_index: u32,
    /// Kind of entity this symbol names.
    pub symbol_type: SymbolType,
    /// Linkage visibility.
    pub binding: SymbolBind,
    /// Section header index this symbol is defined relative to.
    pub section_index: u16,
    /// Value (usually a virtual address) of the symbol.
    pub value: u64,
    /// Size of the object this symbol refers to, or 0 if unknown/not applicable.
    pub size: u64,
}

/// Class-specific byte size of one symbol table entry.
pub fn entry_size(class: ElfClass) -> u64 {
    match class {
        ElfClass::Elf32 => 16,
        ElfClass::Elf64 => 24,
    }
}

fn split_info(info: u8) -> (SymbolType, SymbolBind) {
    (SymbolType::from(info & 0x0F), SymbolBind::from(info >> 4))
}

fn join_info(symbol_type: SymbolType, binding: SymbolBind) -> u8 {
    (u8::from(binding) << 4) | (u8::from(symbol_type) & 0x0F)
}

/// Decode one symbol table entry from `raw`, which must contain at least
/// [`entry_size`] bytes for `class`.
pub fn decode_symbol_entry(raw: &[u8], class: ElfClass, data: ElfDataEncoding) -> Result<SymbolEntry> {
    if (raw.len() as u64) < entry_size(class) {
        return Err(Error::IoEof);
    }
    Ok(match class {
        ElfClass::Elf32 => {
            let (symbol_type, binding) = split_info(raw[12]);
            SymbolEntry {
                name_index: read_u32(&raw[0..], data),
                value: read_u32(&raw[4..], data) as u64,
                size: read_u32(&raw[8..], data) as u64,
                symbol_type,
                binding,
                section_index: read_u16(&raw[14..], data),
            }
        }
        ElfClass::Elf64 => {
            let (symbol_type, binding) = split_info(raw[4]);
            SymbolEntry {
                name_index: read_u32(&raw[0..], data),
                symbol_type,
                binding,
                section_index: read_u16(&raw[6..], data),
                value: read_u64(&raw[8..], data),
                size: read_u64(&raw[16..], data),
            }
        }
    })
}

/// Encode a symbol table entry into `out`, which must be at least
/// [`entry_size`] bytes for `class`.
pub fn encode_symbol_entry(entry: &SymbolEntry, class: ElfClass, data: ElfDataEncoding, out: &mut [u8]) {
    let info = join_info(entry.symbol_type, entry.binding);
    match class {
        ElfClass::Elf32 => {
            out[0..4].copy_from_slice(&write_u32(entry.name_index, data));
            out[4..8].copy_from_slice(&write_u32(entry.value as u32, data));
            out[8..12].copy_from_slice(&write_u32(entry.size as u32, data));
            out[12] = info;
            out[13] = 0;
            out[14..16].copy_from_slice(&write_u16(entry.section_index, data));
        }
        ElfClass::Elf64 => {
            out[0..4].copy_from_slice(&write_u32(entry.name_index, data));
            out[4] = info;
            out[5] = 0;
            out[6..8].copy_from_slice(&write_u16(entry.section_index, data));
            out[8..16].copy_from_slice(&write_u64(entry.value, data));
            out[16..24].copy_from_slice(&write_u64(entry.size, data));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_info_byte_into_type_and_binding() {
        let (symbol_type, binding) = split_info(0x12);
        assert_eq!(symbol_type, SymbolType::Func);
        assert_eq!(binding, SymbolBind::Global);
    }

    #[test]
    fn round_trips_elf64_entry() {
        let entry = SymbolEntry {
            name_index: 7,
            symbol_type: SymbolType::Func,
            binding: SymbolBind::Global,
            section_index: 1,
            value: 0x1000,
            size: 0x20,
        };
        let mut out = vec![0u8; 24];
        encode_symbol_entry(&entry, ElfClass::Elf64, ElfDataEncoding::Lsb, &mut out);
        let decoded = decode_symbol_entry(&out, ElfClass::Elf64, ElfDataEncoding::Lsb).unwrap();
        assert_eq!(decoded, entry);
    }
}
