//! The ELF file header: the fixed-size record immediately following the
//! identification prefix, describing the program-header and section-header
//! tables.

use crate::codec::{read_u16, read_u32, read_u64, write_u16, write_u32, write_u64};
use crate::error::{Error, Result};
use crate::ident::{ElfClass, ElfDataEncoding};

/// Sentinel `e_shnum` value meaning "the real count lives in section 0's
/// `sh_size`" (spec.md §3 invariant 5).
pub const SHN_UNDEF: u16 = 0;
/// Sentinel `e_shstrndx` value meaning "the real index lives in section 0's
/// `sh_link`".
pub const SHN_XINDEX: u16 = 0xffff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
/// The ELF object type (`e_type`).
pub enum ElfType {
    /// No file type.
    None,
    /// Relocatable file.
    Relocatable,
    /// Executable file.
    Executable,
    /// Shared object (dynamic) file.
    Dynamic,
    /// Core file.
    Core,
    /// OS-specific range (`0xFE00..=0xFEFF`).
    Os(u16),
    /// Processor-specific range (`0xFF00..=0xFFFF`).
    Processor(u16),
    /// Any other value.
    Other(u16),
}

impl From<u16> for ElfType {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Relocatable,
            2 => Self::Executable,
            3 => Self::Dynamic,
            4 => Self::Core,
            0xfe00..=0xfeff => Self::Os(value),
            0xff00..=0xffff => Self::Processor(value),
            other => Self::Other(other),
        }
    }
}

impl From<ElfType> for u16 {
    fn from(value: ElfType) -> Self {
        match value {
            ElfType::None => 0,
            ElfType::Relocatable => 1,
            ElfType::Executable => 2,
            ElfType::Dynamic => 3,
            ElfType::Core => 4,
            ElfType::Os(v) | ElfType::Processor(v) | ElfType::Other(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
/// The ELF object's target machine (`e_machine`).
///
/// The original specification this crate's behavior is grounded on only
/// names a handful of values (`NONE`, `ARM`, `RISCV`, `AARCH64`); the rest of
/// the official registry is carried here so real object files decode to a
/// named variant instead of only succeeding on that toy subset. Unknown
/// values are not an error — see spec.md's non-goal on semantic validation.
pub enum ElfMachine {
    /// No machine.
    None,
    /// SPARC.
    Sparc,
    /// Intel 80386.
    I386,
    /// Motorola 68000.
    M68k,
    /// MIPS I Architecture.
    Mips,
    /// Hewlett-Packard PA-RISC.
    PaRisc,
    /// PowerPC.
    Ppc,
    /// 64-bit PowerPC.
    Ppc64,
    /// IBM System/390.
    S390,
    /// ARM 32-bit architecture (AARCH32).
    Arm,
    /// Hitachi/Renesas SuperH.
    Sh,
    /// SPARC Version 9.
    SparcV9,
    /// Intel IA-64.
    Ia64,
    /// AMD/Intel x86-64.
    X86_64,
    /// ARM 64-bit architecture (AARCH64).
    Aarch64,
    /// Tensilica Xtensa.
    Xtensa,
    /// RISC-V.
    RiscV,
    /// Linux BPF virtual machine.
    Bpf,
    /// Any other / unrecognized machine value.
    Other(u16),
}

impl From<u16> for ElfMachine {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::None,
            2 => Self::Sparc,
            3 => Self::I386,
            4 => Self::M68k,
            8 => Self::Mips,
            15 => Self::PaRisc,
            20 => Self::Ppc,
            21 => Self::Ppc64,
            22 => Self::S390,
            40 => Self::Arm,
            42 => Self::Sh,
            43 => Self::SparcV9,
            50 => Self::Ia64,
            62 => Self::X86_64,
            183 => Self::Aarch64,
            94 => Self::Xtensa,
            243 => Self::RiscV,
            247 => Self::Bpf,
            other => Self::Other(other),
        }
    }
}

impl From<ElfMachine> for u16 {
    fn from(value: ElfMachine) -> Self {
        match value {
            ElfMachine::None => 0,
            ElfMachine::Sparc => 2,
            ElfMachine::I386 => 3,
            ElfMachine::M68k => 4,
            ElfMachine::Mips => 8,
            ElfMachine::PaRisc => 15,
            ElfMachine::Ppc => 20,
            ElfMachine::Ppc64 => 21,
            ElfMachine::S390 => 22,
            ElfMachine::Arm => 40,
            ElfMachine::Sh => 42,
            ElfMachine::SparcV9 => 43,
            ElfMachine::Ia64 => 50,
            ElfMachine::X86_64 => 62,
            ElfMachine::Aarch64 => 183,
            ElfMachine::Xtensa => 94,
            ElfMachine::RiscV => 243,
            ElfMachine::Bpf => 247,
            ElfMachine::Other(v) => v,
        }
    }
}

/// Size in bytes of the ELF32 header, including the 16-byte identification
/// prefix.
pub const EHSIZE_32: u16 = 52;
/// Size in bytes of the ELF64 header, including the 16-byte identification
/// prefix.
pub const EHSIZE_64: u16 = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Uniform, class-independent view of the ELF header's non-identification
/// fields, as cached by [`crate::reader::ElfContext`].
pub struct ElfHeader {
    /// Object file type.
    pub file_type: ElfType,
    /// Target machine.
    pub machine: ElfMachine,
    /// Object file version; always [`crate::ident::EV_CURRENT`].
    pub version: u32,
    /// Entry point virtual address.
    pub entry: u64,
    /// File offset of the program header table, or 0 if absent.
    pub program_header_offset: u64,
    /// File offset of the section header table, or 0 if absent.
    pub section_header_offset: u64,
    /// Processor-specific flags.
    pub flags: u32,
    /// Size of this header, in bytes.
    pub header_size: u16,
    /// Size of one program header table entry.
    pub program_header_entry_size: u16,
    /// Number of program header table entries.
    pub program_header_count: u16,
    /// Size of one section header table entry.
    pub section_header_entry_size: u16,
    /// Number of section header table entries (post extended-index resolution).
    pub section_header_count: u16,
    /// Section header table index of the section name string table
    /// (post extended-index resolution).
    pub section_name_string_table_index: u16,
}

/// Decode the class-specific header fields that follow the identification
/// prefix, performing only the size/offset validation that does not depend
/// on fetching section 0 (spec.md §4.2 steps 2-3).
///
/// `raw` must contain exactly the class-specific header size
/// ([`EHSIZE_32`] or [`EHSIZE_64`]) starting at file offset 0, including the
/// 16-byte identification prefix.
pub fn decode_header(raw: &[u8], class: ElfClass, data: ElfDataEncoding) -> Result<ElfHeader> {
    match class {
        ElfClass::Elf32 => decode_header_32(raw, data),
        ElfClass::Elf64 => decode_header_64(raw, data),
    }
}

fn decode_header_32(raw: &[u8], data: ElfDataEncoding) -> Result<ElfHeader> {
    if raw.len() < EHSIZE_32 as usize {
        return Err(Error::IoEof);
    }
    let file_type = ElfType::from(read_u16(&raw[16..], data));
    let machine = ElfMachine::from(read_u16(&raw[18..], data));
    let version = read_u32(&raw[20..], data);
    let entry = read_u32(&raw[24..], data) as u64;
    let program_header_offset = read_u32(&raw[28..], data) as u64;
    let section_header_offset = read_u32(&raw[32..], data) as u64;
    let flags = read_u32(&raw[36..], data);
    let header_size = read_u16(&raw[40..], data);
    let program_header_entry_size = read_u16(&raw[42..], data);
    let program_header_count = read_u16(&raw[44..], data);
    let section_header_entry_size = read_u16(&raw[46..], data);
    let section_header_count = read_u16(&raw[48..], data);
    let section_name_string_table_index = read_u16(&raw[50..], data);

    if header_size != EHSIZE_32 {
        return Err(Error::BadSize {
            expected: EHSIZE_32 as u64,
            actual: header_size as u64,
        });
    }
    validate_entry_sizes(
        program_header_count,
        program_header_entry_size,
        PHENTSIZE_32,
        section_header_count,
        section_header_entry_size,
        SHENTSIZE_32,
    )?;

    Ok(ElfHeader {
        file_type,
        machine,
        version,
        entry,
        program_header_offset,
        section_header_offset,
        flags,
        header_size,
        program_header_entry_size,
        program_header_count,
        section_header_entry_size,
        section_header_count,
        section_name_string_table_index,
    })
}

fn decode_header_64(raw: &[u8], data: ElfDataEncoding) -> Result<ElfHeader> {
    if raw.len() < EHSIZE_64 as usize {
        return Err(Error::IoEof);
    }
    let file_type = ElfType::from(read_u16(&raw[16..], data));
    let machine = ElfMachine::from(read_u16(&raw[18..], data));
    let version = read_u32(&raw[20..], data);
    let entry = read_u64(&raw[24..], data);
    let program_header_offset = read_u64(&raw[32..], data);
    let section_header_offset = read_u64(&raw[40..], data);
    let flags = read_u32(&raw[48..], data);
    let header_size = read_u16(&raw[52..], data);
    let program_header_entry_size = read_u16(&raw[54..], data);
    let program_header_count = read_u16(&raw[56..], data);
    let section_header_entry_size = read_u16(&raw[58..], data);
    let section_header_count = read_u16(&raw[60..], data);
    let section_name_string_table_index = read_u16(&raw[62..], data);

    if header_size != EHSIZE_64 {
        return Err(Error::BadSize {
            expected: EHSIZE_64 as u64,
            actual: header_size as u64,
        });
    }
    validate_entry_sizes(
        program_header_count,
        program_header_entry_size,
        PHENTSIZE_64,
        section_header_count,
        section_header_entry_size,
        SHENTSIZE_64,
    )?;

    Ok(ElfHeader {
        file_type,
        machine,
        version,
        entry,
        program_header_offset,
        section_header_offset,
        flags,
        header_size,
        program_header_entry_size,
        program_header_count,
        section_header_entry_size,
        section_header_count,
        section_name_string_table_index,
    })
}

/// Size of one ELF32 program header table entry.
pub const PHENTSIZE_32: u16 = 32;
/// Size of one ELF64 program header table entry.
pub const PHENTSIZE_64: u16 = 56;
/// Size of one ELF32 section header table entry.
pub const SHENTSIZE_32: u16 = 40;
/// Size of one ELF64 section header table entry.
pub const SHENTSIZE_64: u16 = 64;

#[allow(clippy::too_many_arguments)]
fn validate_entry_sizes(
    ph_count: u16,
    ph_entry_size: u16,
    ph_expected: u16,
    sh_count: u16,
    sh_entry_size: u16,
    sh_expected: u16,
) -> Result<()> {
    if ph_count != 0 && ph_entry_size != ph_expected {
        return Err(Error::BadSize {
            expected: ph_expected as u64,
            actual: ph_entry_size as u64,
        });
    }
    if sh_count != 0 && sh_entry_size != sh_expected {
        return Err(Error::BadSize {
            expected: sh_expected as u64,
            actual: sh_entry_size as u64,
        });
    }
    Ok(())
}

/// Encode the class-specific header fields (everything after the 16-byte
/// identification prefix) into `out`, which must be at least
/// `EHSIZE_32 - 16`/`EHSIZE_64 - 16` bytes.
pub fn encode_header(header: &ElfHeader, class: ElfClass, data: ElfDataEncoding, out: &mut [u8]) {
    out[0..2].copy_from_slice(&write_u16(u16::from(header.file_type), data));
    out[2..4].copy_from_slice(&write_u16(u16::from(header.machine), data));
    out[4..8].copy_from_slice(&write_u32(header.version, data));
    match class {
        ElfClass::Elf32 => {
            out[8..12].copy_from_slice(&write_u32(header.entry as u32, data));
            out[12..16].copy_from_slice(&write_u32(header.program_header_offset as u32, data));
            out[16..20].copy_from_slice(&write_u32(header.section_header_offset as u32, data));
            out[20..24].copy_from_slice(&write_u32(header.flags, data));
            out[24..26].copy_from_slice(&write_u16(header.header_size, data));
            out[26..28].copy_from_slice(&write_u16(header.program_header_entry_size, data));
            out[28..30].copy_from_slice(&write_u16(header.program_header_count, data));
            out[30..32].copy_from_slice(&write_u16(header.section_header_entry_size, data));
            out[32..34].copy_from_slice(&write_u16(header.section_header_count, data));
            out[34..36]
                .copy_from_slice(&write_u16(header.section_name_string_table_index, data));
        }
        ElfClass::Elf64 => {
            out[8..16].copy_from_slice(&write_u64(header.entry, data));
            out[16..24].copy_from_slice(&write_u64(header.program_header_offset, data));
            out[24..32].copy_from_slice(&write_u64(header.section_header_offset, data));
            out[32..36].copy_from_slice(&write_u32(header.flags, data));
            out[36..38].copy_from_slice(&write_u16(header.header_size, data));
            out[38..40].copy_from_slice(&write_u16(header.program_header_entry_size, data));
            out[40..42].copy_from_slice(&write_u16(header.program_header_count, data));
            out[42..44].copy_from_slice(&write_u16(header.section_header_entry_size, data));
            out[44..46].copy_from_slice(&write_u16(header.section_header_count, data));
            out[46..48]
                .copy_from_slice(&write_u16(header.section_name_string_table_index, data));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_elf64_lsb_header() -> Vec<u8> {
        let mut raw = vec![0u8; EHSIZE_64 as usize];
        raw[0..4].copy_from_slice(&[0x7F, b'E', b'L', b'F']);
        raw[4] = 2; // class 64
        raw[5] = 1; // data LSB
        raw[6] = 1; // version
        raw[16..18].copy_from_slice(&1u16.to_le_bytes()); // e_type = REL
        raw[52..54].copy_from_slice(&EHSIZE_64.to_le_bytes());
        raw
    }

    #[test]
    fn decodes_minimal_elf64_lsb_header() {
        let raw = minimal_elf64_lsb_header();
        let header = decode_header(&raw, ElfClass::Elf64, ElfDataEncoding::Lsb).unwrap();
        assert_eq!(header.file_type, ElfType::Relocatable);
        assert_eq!(header.program_header_count, 0);
        assert_eq!(header.section_header_count, 0);
    }

    #[test]
    fn rejects_mismatched_header_size() {
        let mut raw = minimal_elf64_lsb_header();
        raw[52..54].copy_from_slice(&10u16.to_le_bytes());
        let err = decode_header(&raw, ElfClass::Elf64, ElfDataEncoding::Lsb).unwrap_err();
        assert_eq!(
            err,
            Error::BadSize {
                expected: EHSIZE_64 as u64,
                actual: 10
            }
        );
    }

    #[test]
    fn decodes_big_endian_offsets_via_swap() {
        let mut raw = minimal_elf64_lsb_header();
        raw[5] = 2; // data MSB
        raw[28..36].copy_from_slice(&0x0000_0000_0000_0040u64.to_be_bytes());
        raw[52..54].copy_from_slice(&EHSIZE_64.to_be_bytes());
        let header = decode_header(&raw, ElfClass::Elf64, ElfDataEncoding::Msb).unwrap();
        assert_eq!(header.program_header_offset, 0x40);
    }
}
