//! Section headers: typed, named regions of the file holding code, data,
//! string tables, symbol tables and relocations.

use crate::codec::{read_u32, read_u64, write_u32, write_u64};
use crate::error::{Error, Result};
use crate::ident::{ElfClass, ElfDataEncoding};

/// Reserved section index meaning "no section" / "undefined reference".
pub const SHN_UNDEF: u16 = 0;
/// Start of the reserved processor-specific index range.
pub const SHN_LOPROC: u16 = 0xff00;
/// End of the reserved processor-specific index range.
pub const SHN_HIPROC: u16 = 0xff1f;
/// Start of the reserved OS-specific index range.
pub const SHN_LOOS: u16 = 0xff20;
/// End of the reserved OS-specific index range.
pub const SHN_HIOS: u16 = 0xff3f;
/// Symbols defined relative to this index are absolute, not relocated.
pub const SHN_ABS: u16 = 0xfff1;
/// Symbols defined relative to this index are common, unallocated C symbols.
pub const SHN_COMMON: u16 = 0xfff2;
/// Sentinel meaning "the real section-name index lives in section 0's link".
pub const SHN_XINDEX: u16 = 0xffff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
/// A section's type (`sh_type`): a closed set of generic kinds plus the
/// OS- and processor-specific open ranges.
pub enum SectionType {
    /// Inactive; no associated section.
    Null,
    /// Program-defined data.
    ProgBits,
    /// Symbol table.
    SymTab,
    /// String table.
    StrTab,
    /// Relocation entries with explicit addends.
    Rela,
    /// Symbol hash table.
    Hash,
    /// Dynamic linking information.
    Dynamic,
    /// Note section.
    Note,
    /// Occupies no file space (e.g. `.bss`).
    NoBits,
    /// Relocation entries without explicit addends.
    Rel,
    /// Reserved, unspecified semantics.
    ShLib,
    /// Minimal symbol table for dynamic linking.
    DynSym,
    /// Section group.
    Group,
    /// Extended section index array for a symbol table.
    SymTabShIndex,
    /// Relocation entries with implicit addends, relative encoding (RELR).
    Relr,
    /// OS-specific range (`0x60000000..=0x6fffffff`).
    Os(u32),
    /// Processor-specific range (`0x70000000..=0x7fffffff`).
    Processor(u32),
    /// Any other value.
    Other(u32),
}

impl From<u32> for SectionType {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Null,
            1 => Self::ProgBits,
            2 => Self::SymTab,
            3 => Self::StrTab,
            4 => Self::Rela,
            5 => Self::Hash,
            6 => Self::Dynamic,
            7 => Self::Note,
            8 => Self::NoBits,
            9 => Self::Rel,
            10 => Self::ShLib,
            11 => Self::DynSym,
            17 => Self::Group,
            18 => Self::SymTabShIndex,
            19 => Self::Relr,
            0x6000_0000..=0x6fff_ffff => Self::Os(value),
            0x7000_0000..=0x7fff_ffff => Self::Processor(value),
            other => Self::Other(other),
        }
    }
}

impl From<SectionType> for u32 {
    fn from(value: SectionType) -> Self {
        match value {
            SectionType::Null => 0,
            SectionType::ProgBits => 1,
            SectionType::SymTab => 2,
            SectionType::StrTab => 3,
            SectionType::Rela => 4,
            SectionType::Hash => 5,
            SectionType::Dynamic => 6,
            SectionType::Note => 7,
            SectionType::NoBits => 8,
            SectionType::Rel => 9,
            SectionType::ShLib => 10,
            SectionType::DynSym => 11,
            SectionType::Group => 17,
            SectionType::SymTabShIndex => 18,
            SectionType::Relr => 19,
            SectionType::Os(v) | SectionType::Processor(v) | SectionType::Other(v) => v,
        }
    }
}

bitflags::bitflags! {
    /// A section's flags (`sh_flags`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SectionFlags: u64 {
        /// Contains writable data.
        const WRITE = 0x1;
        /// Occupies memory during process execution.
        const ALLOC = 0x2;
        /// Contains executable machine instructions.
        const EXECINSTR = 0x4;
        /// May be merged to eliminate duplication.
        const MERGE = 0x10;
        /// Contains null-terminated strings.
        const STRINGS = 0x20;
        /// `sh_info` holds a section header table index.
        const INFO_LINK = 0x40;
        /// Preserve order after combining.
        const LINK_ORDER = 0x80;
        /// Requires OS-specific processing to avoid incorrect behavior.
        const OS_NONCONFORMING = 0x100;
        /// Member of a section group.
        const GROUP = 0x200;
        /// Holds thread-local storage.
        const TLS = 0x400;
        /// Contains compressed data.
        const COMPRESSED = 0x800;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Uniform view of a section header (`sh_*` fields).
pub struct SectionHeader {
    /// Index into the section-name string table.
    pub name_index: u32,
    /// Section type.
    pub section_type: SectionType,
    /// Section flags.
    pub flags: SectionFlags,
    /// Virtual address in the in-memory image, if `ALLOC`.
    pub address: u64,
    /// File offset of the section's first byte.
    pub offset: u64,
    /// Size of the section in bytes (the in-file size for `NOBITS`).
    pub size: u64,
    /// Associated section index; meaning depends on `section_type`.
    pub link: u32,
    /// Extra information; meaning depends on `section_type`.
    pub info: u32,
    /// Required address alignment, a power of two or zero.
    pub alignment: u64,
    /// Size of one fixed-size entry, or 0 if the section holds no table.
    pub entry_size: u64,
}

/// Class-specific byte size of one section header table entry.
pub fn entry_size(class: ElfClass) -> u64 {
    match class {
        ElfClass::Elf32 => 40,
        ElfClass::Elf64 => 64,
    }
}

/// Decode one section header record from `raw`, which must contain at least
/// [`entry_size`] bytes for `class`, and apply the per-type structural
/// invariants (relocation/symbol entry sizes, `COMPRESSED`/`ALLOC`/`NOBITS`
/// exclusivity, `GROUP` only valid in relocatable files).
pub fn decode_section_header(
    raw: &[u8],
    class: ElfClass,
    data: ElfDataEncoding,
    is_relocatable: bool,
) -> Result<SectionHeader> {
    if (raw.len() as u64) < entry_size(class) {
        return Err(Error::IoEof);
    }
    let header = match class {
        ElfClass::Elf32 => SectionHeader {
            name_index: read_u32(&raw[0..], data),
            section_type: SectionType::from(read_u32(&raw[4..], data)),
            flags: SectionFlags::from_bits_truncate(read_u32(&raw[8..], data) as u64),
            address: read_u32(&raw[12..], data) as u64,
            offset: read_u32(&raw[16..], data) as u64,
            size: read_u32(&raw[20..], data) as u64,
            link: read_u32(&raw[24..], data),
            info: read_u32(&raw[28..], data),
            alignment: read_u32(&raw[32..], data) as u64,
            entry_size: read_u32(&raw[36..], data) as u64,
        },
        ElfClass::Elf64 => SectionHeader {
            name_index: read_u32(&raw[0..], data),
            section_type: SectionType::from(read_u32(&raw[4..], data)),
            flags: SectionFlags::from_bits_truncate(read_u64(&raw[8..], data)),
            address: read_u64(&raw[16..], data),
            offset: read_u64(&raw[24..], data),
            size: read_u64(&raw[32..], data),
            link: read_u32(&raw[40..], data),
            info: read_u32(&raw[44..], data),
            alignment: read_u64(&raw[48..], data),
            entry_size: read_u64(&raw[56..], data),
        },
    };
    validate(&header, class, is_relocatable)?;
    Ok(header)
}

fn validate(header: &SectionHeader, class: ElfClass, is_relocatable: bool) -> Result<()> {
    let rel_entry_size = match class {
        ElfClass::Elf32 => 8u64,
        ElfClass::Elf64 => 16,
    };
    let rela_entry_size = match class {
        ElfClass::Elf32 => 12u64,
        ElfClass::Elf64 => 24,
    };
    let sym_entry_size = match class {
        ElfClass::Elf32 => 16u64,
        ElfClass::Elf64 => 24,
    };
    let relr_entry_size = match class {
        ElfClass::Elf32 => 4u64,
        ElfClass::Elf64 => 8,
    };

    match header.section_type {
        SectionType::Rel if header.entry_size != rel_entry_size => {
            return Err(Error::BadSize {
                expected: rel_entry_size,
                actual: header.entry_size,
            })
        }
        SectionType::Rela if header.entry_size != rela_entry_size => {
            return Err(Error::BadSize {
                expected: rela_entry_size,
                actual: header.entry_size,
            })
        }
        SectionType::SymTab | SectionType::DynSym if header.entry_size != sym_entry_size => {
            return Err(Error::BadSize {
                expected: sym_entry_size,
                actual: header.entry_size,
            })
        }
        SectionType::Relr if header.entry_size != relr_entry_size => {
            return Err(Error::BadSize {
                expected: relr_entry_size,
                actual: header.entry_size,
            })
        }
        _ => {}
    }

    if header.flags.contains(SectionFlags::COMPRESSED)
        && (header.flags.contains(SectionFlags::ALLOC) || header.section_type == SectionType::NoBits)
    {
        return Err(Error::BadFormat);
    }

    if header.section_type == SectionType::Group && !is_relocatable {
        return Err(Error::BadFormat);
    }

    Ok(())
}

/// Encode a section header into `out`, which must be at least
/// [`entry_size`] bytes for `class`.
pub fn encode_section_header(
    header: &SectionHeader,
    class: ElfClass,
    data: ElfDataEncoding,
    out: &mut [u8],
) {
    match class {
        ElfClass::Elf32 => {
            out[0..4].copy_from_slice(&write_u32(header.name_index, data));
            out[4..8].copy_from_slice(&write_u32(u32::from(header.section_type), data));
            out[8..12].copy_from_slice(&write_u32(header.flags.bits() as u32, data));
            out[12..16].copy_from_slice(&write_u32(header.address as u32, data));
            out[16..20].copy_from_slice(&write_u32(header.offset as u32, data));
            out[20..24].copy_from_slice(&write_u32(header.size as u32, data));
            out[24..28].copy_from_slice(&write_u32(header.link, data));
            out[28..32].copy_from_slice(&write_u32(header.info, data));
            out[32..36].copy_from_slice(&write_u32(header.alignment as u32, data));
            out[36..40].copy_from_slice(&write_u32(header.entry_size as u32, data));
        }
        ElfClass::Elf64 => {
            out[0..4].copy_from_slice(&write_u32(header.name_index, data));
            out[4..8].copy_from_slice(&write_u32(u32::from(header.section_type), data));
            out[8..16].copy_from_slice(&write_u64(header.flags.bits(), data));
            out[16..24].copy_from_slice(&write_u64(header.address, data));
            out[24..32].copy_from_slice(&write_u64(header.offset, data));
            out[32..40].copy_from_slice(&write_u64(header.size, data));
            out[40..44].copy_from_slice(&write_u32(header.link, data));
            out[44..48].copy_from_slice(&write_u32(header.info, data));
            out[48..56].copy_from_slice(&write_u64(header.alignment, data));
            out[56..64].copy_from_slice(&write_u64(header.entry_size, data));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A section's compression header (present when `COMPRESSED` is set),
/// itself class-sized like every other record.
pub struct CompressionHeader {
    /// Compression algorithm in use.
    pub compression_type: u32,
    /// Uncompressed size of the section's data.
    pub size: u64,
    /// Uncompressed address alignment.
    pub alignment: u64,
}

/// Class-specific byte size of a compression header.
pub fn compression_header_size(class: ElfClass) -> u64 {
    match class {
        ElfClass::Elf32 => 12,
        ElfClass::Elf64 => 24,
    }
}

/// Decode a section's compression header. `raw` must contain at least
/// [`compression_header_size`] bytes for `class`.
pub fn decode_compression_header(
    raw: &[u8],
    class: ElfClass,
    data: ElfDataEncoding,
) -> Result<CompressionHeader> {
    if (raw.len() as u64) < compression_header_size(class) {
        return Err(Error::IoEof);
    }
    Ok(match class {
        ElfClass::Elf32 => CompressionHeader {
            compression_type: read_u32(&raw[0..], data),
            size: read_u32(&raw[4..], data) as u64,
            alignment: read_u32(&raw[8..], data) as u64,
        },
        ElfClass::Elf64 => CompressionHeader {
            compression_type: read_u32(&raw[0..], data),
            size: read_u64(&raw[8..], data),
            alignment: read_u64(&raw[16..], data),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_null_section() {
        let raw = vec![0u8; 64];
        let header =
            decode_section_header(&raw, ElfClass::Elf64, ElfDataEncoding::Lsb, false).unwrap();
        assert_eq!(header.section_type, SectionType::Null);
        assert_eq!(header.size, 0);
    }

    #[test]
    fn rejects_mismatched_symtab_entry_size() {
        let mut raw = vec![0u8; 64];
        raw[4..8].copy_from_slice(&2u32.to_le_bytes()); // SYMTAB
        raw[56..64].copy_from_slice(&8u64.to_le_bytes()); // wrong entry size
        let err =
            decode_section_header(&raw, ElfClass::Elf64, ElfDataEncoding::Lsb, false).unwrap_err();
        assert_eq!(
            err,
            Error::BadSize {
                expected: 24,
                actual: 8
            }
        );
    }

    #[test]
    fn rejects_mismatched_relr_entry_size() {
        let mut raw = vec![0u8; 64];
        raw[4..8].copy_from_slice(&19u32.to_le_bytes()); // RELR
        raw[56..64].copy_from_slice(&4u64.to_le_bytes()); // wrong entry size (Elf32's width)
        let err =
            decode_section_header(&raw, ElfClass::Elf64, ElfDataEncoding::Lsb, false).unwrap_err();
        assert_eq!(
            err,
            Error::BadSize {
                expected: 8,
                actual: 4
            }
        );
    }

    #[test]
    fn rejects_compressed_and_alloc_together() {
        let mut raw = vec![0u8; 64];
        let flags = (SectionFlags::COMPRESSED | SectionFlags::ALLOC).bits();
        raw[8..16].copy_from_slice(&flags.to_le_bytes());
        let err =
            decode_section_header(&raw, ElfClass::Elf64, ElfDataEncoding::Lsb, false).unwrap_err();
        assert_eq!(err, Error::BadFormat);
    }

    #[test]
    fn rejects_group_section_outside_relocatable_file() {
        let mut raw = vec![0u8; 64];
        raw[4..8].copy_from_slice(&17u32.to_le_bytes()); // GROUP
        let err =
            decode_section_header(&raw, ElfClass::Elf64, ElfDataEncoding::Lsb, false).unwrap_err();
        assert_eq!(err, Error::BadFormat);

        let ok = decode_section_header(&raw, ElfClass::Elf64, ElfDataEncoding::Lsb, true).unwrap();
        assert_eq!(ok.section_type, SectionType::Group);
    }
}
