//! In-memory ELF builder: a push-based counterpart to [`crate::reader`].
//!
//! The caller describes a header, adds sections built from ordered chunk
//! lists, declares segments mapping section byte ranges, then calls
//! [`WriterContext::serialise`] once to get a byte-exact ELF image.

use typed_builder::TypedBuilder;

use crate::error::{Error, Result};
use crate::header::{self, ElfHeader, ElfMachine, ElfType};
use crate::ident::{ElfClass, ElfDataEncoding, ElfOsAbi, EI_NIDENT, EV_CURRENT};
use crate::program::{self, ProgramHeader, SegmentFlags, SegmentType};
use crate::section::{self, SectionFlags, SectionHeader, SectionType};
use crate::symbol;

/// Handle to a section owned by a [`WriterContext`]. Stable for the life
/// of the context; invalidated (in the sense of no longer resolving to
/// anything) once the context that produced it is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionHandle(usize);

/// Layout policy for [`WriterContext::serialise`]. Only [`LayoutPolicy::Compat`]
/// has defined semantics; the others are named hooks for future strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutPolicy {
    /// Emit sections in declared order, padding between them for alignment.
    #[default]
    Compat,
    /// Reserved for a future densest-first strategy.
    Fast,
    /// Reserved for a future strategy minimizing padding.
    Packed,
    /// Reserved for a future minimal-table-count strategy.
    Minimal,
}

#[derive(Debug, Clone, TypedBuilder)]
/// Parameters describing the ELF header to build.
pub struct HeaderInfo {
    /// Field width for the rest of the file.
    pub class: ElfClass,
    /// Byte order for the rest of the file.
    pub data: ElfDataEncoding,
    /// Object file type.
    pub file_type: ElfType,
    /// Target machine.
    pub machine: ElfMachine,
    #[builder(default = ElfOsAbi::NoneSystemV)]
    /// OS/ABI extensions in use.
    pub os_abi: ElfOsAbi,
    #[builder(default)]
    /// ABI version, meaning dependent on `os_abi`.
    pub abi_version: u8,
    #[builder(default)]
    /// Entry point virtual address.
    pub entry: u64,
    #[builder(default)]
    /// Processor-specific flags.
    pub flags: u32,
}

#[derive(Debug, Clone, TypedBuilder)]
/// Parameters describing a section to add.
pub struct SectionInfo {
    /// Section name, copied into the builder's owned string table.
    #[builder(setter(into))]
    pub name: String,
    /// Section type.
    pub section_type: SectionType,
    #[builder(default = SectionFlags::empty())]
    /// Section flags.
    pub flags: SectionFlags,
    #[builder(default)]
    /// Virtual address, if `ALLOC`.
    pub address: u64,
    #[builder(default, setter(strip_option))]
    /// Associated section, if any (becomes the encoded `link` field).
    pub link: Option<SectionHandle>,
    #[builder(default)]
    /// Extra type-dependent information.
    pub info: u32,
    #[builder(default = 1)]
    /// Required address alignment; must be a power of two.
    pub alignment: u64,
    #[builder(default)]
    /// Size of one fixed-size entry, or 0.
    pub entry_size: u64,
}

/// A borrowed, alignment-padded byte range appended to a section.
pub struct Chunk<'a> {
    data: &'a [u8],
    alignment: u64,
}

/// A section under construction: its description plus an ordered list of
/// borrowed chunks and the running offset they occupy.
pub struct Section<'a> {
    info: SectionInfo,
    chunks: Vec<Chunk<'a>>,
    offset: u64,
}

impl<'a> Section<'a> {
    fn packed_size(&self) -> u64 {
        self.offset
    }
}

fn align_up(offset: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        offset
    } else {
        (offset + alignment - 1) & !(alignment - 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// One (section, byte range) placement within a segment.
pub struct SegmentMap {
    /// Section the range is taken from.
    pub section: SectionHandle,
    /// Offset into the section, in bytes.
    pub offset: u64,
    /// Size of the range, in bytes.
    pub size: u64,
}

/// A segment under construction.
struct Segment {
    segment_type: SegmentType,
    flags: SegmentFlags,
    alignment: u64,
    maps: Vec<SegmentMap>,
}

/// Builder context for constructing an ELF image in memory.
pub struct WriterContext<'a> {
    header: Option<HeaderInfo>,
    sections: Vec<Section<'a>>,
    segments: Vec<Segment>,
}

impl<'a> Default for WriterContext<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> WriterContext<'a> {
    /// Create an empty writer context.
    pub fn new() -> Self {
        Self {
            header: None,
            sections: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Set (or replace) the header description.
    ///
    /// Re-declaring class or file type on a context that already has
    /// sections is not rejected, but produces undefined layout if any
    /// section offsets were already computed against the old class — this
    /// context never precomputes offsets eagerly, so in practice the only
    /// consequence is a `serialise` with the new class.
    pub fn create_header(&mut self, info: HeaderInfo) {
        self.header = Some(info);
    }

    /// Add a section, validating its creation parameters.
    ///
    /// Checks alignment is a nonzero power of two, `address % alignment ==
    /// 0`, `address != 0` implies `ALLOC`, `entry_size % alignment == 0`
    /// (vacuously true when `entry_size` is 0), and per-type constraints
    /// (`NULL` sections carry zero address/entry size; `STRTAB` entry size
    /// is 0 or 1; `SYMTAB`/`DYNSYM` entry size matches the class's symbol
    /// width once the header's class is known).
    pub fn add_section(&mut self, info: SectionInfo) -> Result<SectionHandle> {
        if info.alignment == 0 || !info.alignment.is_power_of_two() {
            return Err(Error::BadArg);
        }
        if info.address % info.alignment != 0 {
            return Err(Error::BadArg);
        }
        if info.address != 0 && !info.flags.contains(SectionFlags::ALLOC) {
            return Err(Error::BadArg);
        }
        if info.entry_size != 0 && info.entry_size % info.alignment != 0 {
            return Err(Error::BadArg);
        }
        match info.section_type {
            SectionType::Null if info.address != 0 || info.entry_size != 0 => {
                return Err(Error::BadArg)
            }
            SectionType::StrTab if info.entry_size != 0 && info.entry_size != 1 => {
                return Err(Error::BadArg)
            }
            SectionType::SymTab | SectionType::DynSym => {
                if let Some(header) = &self.header {
                    let expected = symbol::entry_size(header.class);
                    if info.entry_size != expected {
                        return Err(Error::BadArg);
                    }
                }
            }
            _ => {}
        }

        let handle = SectionHandle(self.sections.len());
        self.sections.push(Section {
            info,
            chunks: Vec::new(),
            offset: 0,
        });
        Ok(handle)
    }

    fn section_mut(&mut self, handle: SectionHandle) -> Result<&mut Section<'a>> {
        self.sections.get_mut(handle.0).ok_or(Error::BadArg)
    }

    /// Append a data chunk to a section. `size == 0` is a no-op.
    ///
    /// The bytes are borrowed: the caller must keep them alive until
    /// [`Self::serialise`] completes.
    pub fn section_append_data(
        &mut self,
        handle: SectionHandle,
        data: &'a [u8],
        alignment: u64,
    ) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let section = self.section_mut(handle)?;
        let next = align_up(section.offset, alignment.max(1));
        section.chunks.push(Chunk { data, alignment });
        section.offset = next + data.len() as u64;
        Ok(())
    }

    /// Replace a section's entire chunk list with a single chunk.
    /// Semantically equivalent to clearing the section then appending once.
    pub fn section_set_data(
        &mut self,
        handle: SectionHandle,
        data: &'a [u8],
        alignment: u64,
    ) -> Result<()> {
        {
            let section = self.section_mut(handle)?;
            section.chunks.clear();
            section.offset = 0;
        }
        self.section_append_data(handle, data, alignment)
    }

    /// Return the offset the next chunk would be placed at, without
    /// mutating the section.
    pub fn section_next_offset(&self, handle: SectionHandle, alignment: u64) -> Result<u64> {
        let section = self.sections.get(handle.0).ok_or(Error::BadArg)?;
        Ok(align_up(section.offset, alignment.max(1)))
    }

    /// Add a segment.
    pub fn add_segment(
        &mut self,
        segment_type: SegmentType,
        flags: SegmentFlags,
        alignment: u64,
        maps: Vec<SegmentMap>,
    ) -> Result<()> {
        for map in &maps {
            if map.section.0 >= self.sections.len() {
                return Err(Error::BadArg);
            }
        }
        self.segments.push(Segment {
            segment_type,
            flags,
            alignment,
            maps,
        });
        Ok(())
    }

    /// Compute the file layout and emit the final byte image, using
    /// [`LayoutPolicy::Compat`] (declared order, padded between sections).
    pub fn serialise(&self) -> Result<Vec<u8>> {
        let header_info = self.header.as_ref().ok_or(Error::BadArg)?;
        let class = header_info.class;
        let data = header_info.data;

        for section in &self.sections {
            if let Some(link) = section.info.link {
                if link.0 >= self.sections.len() {
                    return Err(Error::BadArg);
                }
            }
        }

        let ehsize = match class {
            ElfClass::Elf32 => header::EHSIZE_32,
            ElfClass::Elf64 => header::EHSIZE_64,
        } as u64;
        let sh_entry_size = section::entry_size(class);
        let ph_entry_size = program::entry_size(class);

        // Section 0 is always the implicit reserved NULL section.
        let section_count = self.sections.len() as u64 + 1;
        let program_count = self.segments.len() as u64;

        let mut name_table = Vec::new();
        name_table.push(0u8);
        let mut name_offsets = Vec::with_capacity(self.sections.len());
        for section in &self.sections {
            name_offsets.push(name_table.len() as u32);
            name_table.extend_from_slice(section.info.name.as_bytes());
            name_table.push(0);
        }

        // The section-name string table is populated here rather than by
        // the caller appending chunk data to it: there is only ever one,
        // and its contents are exactly the names already passed to
        // `add_section`.
        let shstrtab_index = self
            .sections
            .iter()
            .position(|s| s.info.section_type == SectionType::StrTab && s.info.name == ".shstrtab");
        let section_size = |i: usize, section: &Section<'a>| -> u64 {
            if Some(i) == shstrtab_index {
                name_table.len() as u64
            } else {
                section.packed_size()
            }
        };

        let mut offset = ehsize;
        if program_count > 0 {
            offset = align_up(offset, 8);
            // program header table placed right after the ELF header
        }
        let program_header_offset = if program_count > 0 { offset } else { 0 };
        if program_count > 0 {
            offset += program_count * ph_entry_size;
        }

        let mut section_offsets = Vec::with_capacity(self.sections.len());
        for (i, section) in self.sections.iter().enumerate() {
            let align = section.info.alignment.max(1);
            offset = align_up(offset, align);
            section_offsets.push(offset);
            offset += section_size(i, section);
        }

        offset = align_up(offset, 8);
        let section_header_offset = offset;
        offset += section_count * sh_entry_size;

        let mut image = vec![0u8; offset as usize];

        image[0..4].copy_from_slice(&[0x7F, b'E', b'L', b'F']);
        image[4] = match class {
            ElfClass::Elf32 => ElfClass::ELF32,
            ElfClass::Elf64 => ElfClass::ELF64,
        };
        image[5] = match data {
            ElfDataEncoding::Lsb => ElfDataEncoding::LSB,
            ElfDataEncoding::Msb => ElfDataEncoding::MSB,
        };
        image[6] = EV_CURRENT;
        image[7] = u8::from(header_info.os_abi);
        image[8] = header_info.abi_version;
        // bytes 9..16 are the zero padding of the identification block.

        let uniform_header = ElfHeader {
            file_type: header_info.file_type,
            machine: header_info.machine,
            version: EV_CURRENT as u32,
            entry: header_info.entry,
            program_header_offset,
            section_header_offset,
            flags: header_info.flags,
            header_size: ehsize as u16,
            program_header_entry_size: if program_count > 0 { ph_entry_size as u16 } else { 0 },
            program_header_count: program_count as u16,
            section_header_entry_size: sh_entry_size as u16,
            section_header_count: section_count as u16,
            section_name_string_table_index: self.resolve_shstrtab_index().unwrap_or(0),
        };
        header::encode_header(&uniform_header, class, data, &mut image[EI_NIDENT..ehsize as usize]);

        for (i, (section, chunk_offset)) in self.sections.iter().zip(section_offsets.iter()).enumerate() {
            if Some(i) == shstrtab_index {
                let start = *chunk_offset as usize;
                image[start..start + name_table.len()].copy_from_slice(&name_table);
                continue;
            }
            let mut local = *chunk_offset;
            for chunk in &section.chunks {
                local = align_up(local, chunk.alignment.max(1));
                let start = local as usize;
                image[start..start + chunk.data.len()].copy_from_slice(chunk.data);
                local += chunk.data.len() as u64;
            }
        }

        if program_count > 0 {
            for (index, segment) in self.segments.iter().enumerate() {
                let map_offset = segment
                    .maps
                    .first()
                    .map(|m| section_offsets[m.section.0] + m.offset)
                    .unwrap_or(0);
                let map_size: u64 = segment.maps.iter().map(|m| m.size).sum();
                let program_header = ProgramHeader {
                    segment_type: segment.segment_type,
                    flags: segment.flags,
                    offset: map_offset,
                    physical_address: 0,
                    virtual_address: map_offset,
                    file_size: map_size,
                    memory_size: map_size,
                    alignment: segment.alignment,
                };
                let start = (program_header_offset + index as u64 * ph_entry_size) as usize;
                program::encode_program_header(
                    &program_header,
                    class,
                    data,
                    &mut image[start..start + ph_entry_size as usize],
                );
            }
        }

        // Section header 0: the reserved NULL entry.
        let null_header = SectionHeader {
            name_index: 0,
            section_type: SectionType::Null,
            flags: SectionFlags::empty(),
            address: 0,
            offset: 0,
            size: 0,
            link: 0,
            info: 0,
            alignment: 0,
            entry_size: 0,
        };
        let start = section_header_offset as usize;
        section::encode_section_header(&null_header, class, data, &mut image[start..start + sh_entry_size as usize]);

        for (i, (section, chunk_offset)) in self.sections.iter().zip(section_offsets.iter()).enumerate() {
            let resolved_link = section
                .info
                .link
                .map(|handle| handle.0 as u32 + 1)
                .unwrap_or(0);
            let header = SectionHeader {
                name_index: name_offsets[i],
                section_type: section.info.section_type,
                flags: section.info.flags,
                address: section.info.address,
                offset: *chunk_offset,
                size: section_size(i, section),
                link: resolved_link,
                info: section.info.info,
                alignment: section.info.alignment,
                entry_size: section.info.entry_size,
            };
            let start = (section_header_offset + (i as u64 + 1) * sh_entry_size) as usize;
            section::encode_section_header(&header, class, data, &mut image[start..start + sh_entry_size as usize]);
        }

        Ok(image)
    }

    fn resolve_shstrtab_index(&self) -> Option<u16> {
        self.sections
            .iter()
            .position(|s| s.info.section_type == SectionType::StrTab && s.info.name == ".shstrtab")
            .map(|i| i as u16 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_power_of_two_alignment() {
        let mut ctx = WriterContext::new();
        ctx.create_header(
            HeaderInfo::builder()
                .class(ElfClass::Elf64)
                .data(ElfDataEncoding::Lsb)
                .file_type(ElfType::Executable)
                .machine(ElfMachine::X86_64)
                .build(),
        );
        let info = SectionInfo::builder()
            .name(".text")
            .section_type(SectionType::ProgBits)
            .alignment(3)
            .build();
        assert_eq!(ctx.add_section(info), Err(Error::BadArg));
    }

    #[test]
    fn round_trips_minimal_section_through_reader() {
        let mut ctx = WriterContext::new();
        ctx.create_header(
            HeaderInfo::builder()
                .class(ElfClass::Elf64)
                .data(ElfDataEncoding::Lsb)
                .file_type(ElfType::Executable)
                .machine(ElfMachine::None)
                .build(),
        );
        let text = ctx
            .add_section(
                SectionInfo::builder()
                    .name(".text")
                    .section_type(SectionType::ProgBits)
                    .flags(SectionFlags::ALLOC | SectionFlags::EXECINSTR)
                    .alignment(4)
                    .build(),
            )
            .unwrap();
        let payload: Vec<u8> = (0..13).collect();
        ctx.section_append_data(text, &payload, 4).unwrap();

        let shstrtab = ctx
            .add_section(
                SectionInfo::builder()
                    .name(".shstrtab")
                    .section_type(SectionType::StrTab)
                    .alignment(1)
                    .build(),
            )
            .unwrap();
        let _ = shstrtab;

        let image = ctx.serialise().unwrap();
        assert!(!image.is_empty());
        assert_eq!(&image[0..4], &[0x7F, b'E', b'L', b'F']);
    }
}
