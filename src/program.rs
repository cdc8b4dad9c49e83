//! Program headers: segments describing byte ranges of the file meant to be
//! loaded into the process image at a given virtual address.

use crate::codec::{read_u32, read_u64, write_u32, write_u64};
use crate::error::{Error, Result};
use crate::ident::{ElfClass, ElfDataEncoding};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
/// A segment's type (`p_type`).
pub enum SegmentType {
    /// Unused entry.
    Null,
    /// Loadable segment.
    Load,
    /// Dynamic linking information.
    Dynamic,
    /// Path to an interpreter.
    Interp,
    /// Auxiliary information.
    Note,
    /// Reserved, unspecified semantics.
    ShLib,
    /// The program header table itself.
    Phdr,
    /// OS-specific range (`0x60000000..=0x6fffffff`).
    Os(u32),
    /// Processor-specific range (`0x70000000..=0x7fffffff`).
    Processor(u32),
    /// Any other value.
    Other(u32),
}

impl From<u32> for SegmentType {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Null,
            1 => Self::Load,
            2 => Self::Dynamic,
            3 => Self::Interp,
            4 => Self::Note,
            5 => Self::ShLib,
            6 => Self::Phdr,
            0x6000_0000..=0x6fff_ffff => Self::Os(value),
            0x7000_0000..=0x7fff_ffff => Self::Processor(value),
            other => Self::Other(other),
        }
    }
}

impl From<SegmentType> for u32 {
    fn from(value: SegmentType) -> Self {
        match value {
            SegmentType::Null => 0,
            SegmentType::Load => 1,
            SegmentType::Dynamic => 2,
            SegmentType::Interp => 3,
            SegmentType::Note => 4,
            SegmentType::ShLib => 5,
            SegmentType::Phdr => 6,
            SegmentType::Os(v) | SegmentType::Processor(v) | SegmentType::Other(v) => v,
        }
    }
}

bitflags::bitflags! {
    /// A segment's flags (`p_flags`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SegmentFlags: u32 {
        /// Execute permission.
        const EXECUTE = 0x1;
        /// Write permission.
        const WRITE = 0x2;
        /// Read permission.
        const READ = 0x4;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Uniform view of a program header (`p_*` fields).
pub struct ProgramHeader {
    /// Segment type.
    pub segment_type: SegmentType,
    /// Segment flags.
    pub flags: SegmentFlags,
    /// File offset of the segment's first byte.
    pub offset: u64,
    /// Physical address, meaningful only on systems that use it.
    pub physical_address: u64,
    /// Virtual address at which the segment should be loaded.
    pub virtual_address: u64,
    /// Size of the segment in the file, in bytes.
    pub file_size: u64,
    /// Size of the segment in the memory image, in bytes.
    pub memory_size: u64,
    /// Required alignment; zero or one means no constraint.
    pub alignment: u64,
}

/// Class-specific byte size of one program header table entry.
pub fn entry_size(class: ElfClass) -> u64 {
    match class {
        ElfClass::Elf32 => 32,
        ElfClass::Elf64 => 56,
    }
}

/// Decode one program header record from `raw`, which must contain at
/// least [`entry_size`] bytes for `class`.
pub fn decode_program_header(raw: &[u8], class: ElfClass, data: ElfDataEncoding) -> Result<ProgramHeader> {
    if (raw.len() as u64) < entry_size(class) {
        return Err(Error::IoEof);
    }
    Ok(match class {
        ElfClass::Elf32 => ProgramHeader {
            segment_type: SegmentType::from(read_u32(&raw[0..], data)),
            offset: read_u32(&raw[4..], data) as u64,
            virtual_address: read_u32(&raw[8..], data) as u64,
            physical_address: read_u32(&raw[12..], data) as u64,
            file_size: read_u32(&raw[16..], data) as u64,
            memory_size: read_u32(&raw[20..], data) as u64,
            flags: SegmentFlags::from_bits_truncate(read_u32(&raw[24..], data)),
            alignment: read_u32(&raw[28..], data) as u64,
        },
        ElfClass::Elf64 => ProgramHeader {
            segment_type: SegmentType::from(read_u32(&raw[0..], data)),
            flags: SegmentFlags::from_bits_truncate(read_u32(&raw[4..], data)),
            offset: read_u64(&raw[8..], data),
            virtual_address: read_u64(&raw[16..], data),
            physical_address: read_u64(&raw[24..], data),
            file_size: read_u64(&raw[32..], data),
            memory_size: read_u64(&raw[40..], data),
            alignment: read_u64(&raw[48..], data),
        },
    })
}

/// Encode a program header into `out`, which must be at least
/// [`entry_size`] bytes for `class`.
pub fn encode_program_header(header: &ProgramHeader, class: ElfClass, data: ElfDataEncoding, out: &mut [u8]) {
    match class {
        ElfClass::Elf32 => {
            out[0..4].copy_from_slice(&write_u32(u32::from(header.segment_type), data));
            out[4..8].copy_from_slice(&write_u32(header.offset as u32, data));
            out[8..12].copy_from_slice(&write_u32(header.virtual_address as u32, data));
            out[12..16].copy_from_slice(&write_u32(header.physical_address as u32, data));
            out[16..20].copy_from_slice(&write_u32(header.file_size as u32, data));
            out[20..24].copy_from_slice(&write_u32(header.memory_size as u32, data));
            out[24..28].copy_from_slice(&write_u32(header.flags.bits(), data));
            out[28..32].copy_from_slice(&write_u32(header.alignment as u32, data));
        }
        ElfClass::Elf64 => {
            out[0..4].copy_from_slice(&write_u32(u32::from(header.segment_type), data));
            out[4..8].copy_from_slice(&write_u32(header.flags.bits(), data));
            out[8..16].copy_from_slice(&write_u64(header.offset, data));
            out[16..24].copy_from_slice(&write_u64(header.virtual_address, data));
            out[24..32].copy_from_slice(&write_u64(header.physical_address, data));
            out[32..40].copy_from_slice(&write_u64(header.file_size, data));
            out[40..48].copy_from_slice(&write_u64(header.memory_size, data));
            out[48..56].copy_from_slice(&write_u64(header.alignment, data));
        }
    }
}
