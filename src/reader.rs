//! Random-access ELF reader, parameterised on a caller-supplied byte source.
//!
//! The C original drives this through a `user_ctx` pointer plus a free
//! function; the idiomatic Rust shape for "opaque callback with private
//! state" is a trait object, so [`ByteSource`] plays that role here.

use crate::error::{Error, Result};
use crate::header::{self, ElfHeader};
use crate::ident::{ElfClass, ElfDataEncoding, Identification, EI_NIDENT};
use crate::program::{self, ProgramHeader};
use crate::section::{self, CompressionHeader, SectionFlags, SectionHeader, SectionType};
use crate::symbol::{self, SymbolEntry};

/// A random-access source of file bytes.
///
/// Implementations must place exactly `dest.len()` bytes starting at
/// absolute file offset `offset` into `dest`, or fail with [`Error::IoEof`]
/// (short read at end) or [`Error::IoError`] (any other failure). The
/// reader never requests overlapping ranges within a single call.
pub trait ByteSource {
    /// Fetch `dest.len()` bytes starting at `offset`.
    fn fetch(&mut self, offset: u64, dest: &mut [u8]) -> Result<()>;
}

impl<F> ByteSource for F
where
    F: FnMut(u64, &mut [u8]) -> Result<()>,
{
    fn fetch(&mut self, offset: u64, dest: &mut [u8]) -> Result<()> {
        (self)(offset, dest)
    }
}

/// A reader context: cached identification and header fields, plus the
/// byte source used to satisfy every other call.
///
/// Created once by [`ElfContext::init`]; no further allocation occurs
/// after that beyond what individual accessor calls need for their own
/// return values.
pub struct ElfContext<S> {
    source: S,
    class: ElfClass,
    data: ElfDataEncoding,
    identification: Identification,
    header: ElfHeader,
}

/// Read exactly `dest.len()` bytes at `offset`, turning a short read from
/// [`ByteSource::fetch`] into the distinction the format needs.
fn fetch_exact<S: ByteSource>(source: &mut S, offset: u64, dest: &mut [u8]) -> Result<()> {
    source.fetch(offset, dest)
}

impl<S: ByteSource> ElfContext<S> {
    /// Initialise a reader context over `source`.
    ///
    /// Fetches and validates the identification prefix, then the
    /// class-specific header, then resolves the extended section-count and
    /// section-name-index sentinels by fetching section header 0 when
    /// needed. On any failure, no context is returned: there is no
    /// half-initialised state to observe.
    pub fn init(mut source: S) -> Result<Self> {
        let mut ident_raw = [0u8; EI_NIDENT];
        fetch_exact(&mut source, 0, &mut ident_raw)?;
        let identification = Identification::decode(&ident_raw)?;

        let header_size = match identification.class {
            ElfClass::Elf32 => header::EHSIZE_32,
            ElfClass::Elf64 => header::EHSIZE_64,
        } as usize;
        let mut header_raw = vec![0u8; header_size];
        fetch_exact(&mut source, 0, &mut header_raw)?;
        let mut decoded_header =
            header::decode_header(&header_raw, identification.class, identification.data)?;

        if decoded_header.program_header_count != 0 && decoded_header.program_header_offset == 0 {
            return Err(Error::BadHeader);
        }
        if decoded_header.section_header_count != 0 && decoded_header.section_header_offset == 0 {
            return Err(Error::BadHeader);
        }

        let mut ctx = Self {
            source,
            class: identification.class,
            data: identification.data,
            identification,
            header: decoded_header.clone(),
        };

        let needs_extended_count = decoded_header.section_header_count == 0
            && decoded_header.section_header_offset != 0;
        let needs_extended_name_index =
            decoded_header.section_name_string_table_index == header::SHN_XINDEX;

        if needs_extended_count || needs_extended_name_index {
            let zero = ctx.fetch_section_header_raw(0)?;
            if zero.section_type != SectionType::Null {
                return Err(Error::BadFormat);
            }
            if needs_extended_count {
                decoded_header.section_header_count =
                    u16::try_from(zero.size).map_err(|_| Error::BadFormat)?;
            }
            if needs_extended_name_index {
                decoded_header.section_name_string_table_index =
                    u16::try_from(zero.link).map_err(|_| Error::BadFormat)?;
            }
            ctx.header = decoded_header;
        }

        Ok(ctx)
    }

    /// The cached, class-independent header.
    pub fn get_header(&self) -> &ElfHeader {
        &self.header
    }

    /// Field width used throughout the file.
    pub fn class(&self) -> ElfClass {
        self.class
    }

    /// Byte order used throughout the file.
    pub fn data_encoding(&self) -> ElfDataEncoding {
        self.data
    }

    /// OS/ABI and its version, from the identification prefix.
    pub fn identification(&self) -> &Identification {
        &self.identification
    }

    /// Number of entries in the section header table, after extended-index
    /// resolution. Zero on an otherwise-valid empty file.
    pub fn get_section_count(&self) -> u16 {
        self.header.section_header_count
    }

    /// Number of entries in the program header table.
    pub fn get_program_header_count(&self) -> u16 {
        self.header.program_header_count
    }

    fn fetch_section_header_raw(&mut self, index: u16) -> Result<SectionHeader> {
        let size = section::entry_size(self.class);
        let offset = self.header.section_header_offset + index as u64 * size;
        let mut raw = vec![0u8; size as usize];
        fetch_exact(&mut self.source, offset, &mut raw)?;
        let is_relocatable = matches!(self.header.file_type, crate::header::ElfType::Relocatable);
        section::decode_section_header(&raw, self.class, self.data, is_relocatable)
    }

    /// Fetch and decode the section header at `index`.
    ///
    /// Fails with [`Error::BadIndex`] if `index >= get_section_count()`.
    pub fn get_section_header(&mut self, index: u16) -> Result<SectionHeader> {
        let count = self.get_section_count();
        if index >= count {
            return Err(Error::BadIndex {
                index: index as u64,
                count: count as u64,
            });
        }
        self.fetch_section_header_raw(index)
    }

    /// Fetch and decode the program header at `index`.
    ///
    /// Fails with [`Error::BadIndex`] if `index >= get_program_header_count()`.
    pub fn get_program_header(&mut self, index: u16) -> Result<ProgramHeader> {
        let count = self.get_program_header_count();
        if index >= count {
            return Err(Error::BadIndex {
                index: index as u64,
                count: count as u64,
            });
        }
        let size = program::entry_size(self.class);
        let offset = self.header.program_header_offset + index as u64 * size;
        let mut raw = vec![0u8; size as usize];
        fetch_exact(&mut self.source, offset, &mut raw)?;
        program::decode_program_header(&raw, self.class, self.data)
    }

    /// Fetch a section's compression header (valid when its `COMPRESSED`
    /// flag is set; the caller is responsible for checking that first).
    pub fn get_compression_header(&mut self, section: &SectionHeader) -> Result<CompressionHeader> {
        if !section.flags.contains(SectionFlags::COMPRESSED) {
            return Err(Error::BadArg);
        }
        let size = section::compression_header_size(self.class);
        let mut raw = vec![0u8; size as usize];
        fetch_exact(&mut self.source, section.offset, &mut raw)?;
        section::decode_compression_header(&raw, self.class, self.data)
    }

    /// Fetch up to `len` bytes of a null-terminated string from section
    /// `section_index` starting at byte `string_index`, requiring the
    /// section to be a `STRTAB`.
    ///
    /// Returns the string without its terminator. Fails with
    /// [`Error::BufferOverflow`] if no terminator appears within `len`
    /// bytes.
    pub fn get_str_from_table(
        &mut self,
        section_index: u16,
        string_index: u32,
        len: usize,
    ) -> Result<Vec<u8>> {
        let section = self.get_section_header(section_index)?;
        if section.section_type != SectionType::StrTab {
            return Err(Error::BadArg);
        }
        if string_index as u64 >= section.size {
            return Err(Error::BadArg);
        }

        let mut out = Vec::with_capacity(len.min(64));
        let mut byte = [0u8; 1];
        for i in 0..len {
            fetch_exact(&mut self.source, section.offset + string_index as u64 + i as u64, &mut byte)?;
            if byte[0] == 0 {
                return Ok(out);
            }
            out.push(byte[0]);
        }
        Err(Error::BufferOverflow)
    }

    /// Fetch a section's name using the cached section-name string table
    /// index.
    pub fn get_section_name(&mut self, section: &SectionHeader, max_len: usize) -> Result<Vec<u8>> {
        self.get_str_from_table(
            self.header.section_name_string_table_index,
            section.name_index,
            max_len,
        )
    }

    /// Linear scan for a section whose name equals `name`, starting at
    /// index 1 (index 0 is the reserved `NULL` section). Returns the first
    /// match; [`Error::NotFound`] if none.
    pub fn get_section_by_name(&mut self, name: &[u8]) -> Result<(u16, SectionHeader)> {
        let count = self.get_section_count();
        for index in 1..count {
            let section = self.get_section_header(index)?;
            let fetched = self.get_section_name(&section, 256)?;
            if fetched == name {
                return Ok((index, section));
            }
        }
        Err(Error::NotFound)
    }

    /// Number of symbol entries in `section`, or 0 if its entry size is 0.
    pub fn get_symbol_count(&self, section: &SectionHeader) -> u64 {
        if section.entry_size == 0 {
            0
        } else {
            section.size / section.entry_size
        }
    }

    /// Fetch and decode the symbol table entry at `index` within `section`.
    pub fn get_symbol_entry(&mut self, section: &SectionHeader, index: u64) -> Result<SymbolEntry> {
        let count = self.get_symbol_count(section);
        if index >= count {
            return Err(Error::BadIndex { index, count });
        }
        let size = symbol::entry_size(self.class);
        let offset = section.offset + index * section.entry_size;
        let mut raw = vec![0u8; size as usize];
        fetch_exact(&mut self.source, offset, &mut raw)?;
        symbol::decode_symbol_entry(&raw, self.class, self.data)
    }

    /// Fetch a symbol's name, resolved through the string table named by
    /// `link_section_index` (normally the symbol table's own `link`).
    pub fn get_symbol_name(
        &mut self,
        link_section_index: u16,
        entry: &SymbolEntry,
        max_len: usize,
    ) -> Result<Vec<u8>> {
        self.get_str_from_table(link_section_index, entry.name_index, max_len)
    }

    /// Find the first symbol (index ≥ 1, type `FUNC`/`OBJECT`, not
    /// `section_index == SHN_UNDEF`) whose `value` equals `addr`.
    pub fn get_symbol_by_addr_exact(
        &mut self,
        section: &SectionHeader,
        addr: u64,
    ) -> Result<(u64, SymbolEntry)> {
        let count = self.get_symbol_count(section);
        if count == 0 {
            return Err(Error::BadArg);
        }
        for index in 1..count {
            let entry = self.get_symbol_entry(section, index)?;
            if entry.section_index == crate::section::SHN_UNDEF {
                continue;
            }
            if !matches!(
                entry.symbol_type,
                crate::symbol::SymbolType::Func | crate::symbol::SymbolType::Object
            ) {
                continue;
            }
            if entry.value == addr {
                return Ok((index, entry));
            }
        }
        Err(Error::NotFound)
    }

    /// Find the first symbol (index ≥ 1, not `SHN_UNDEF`) whose `[value,
    /// value + size)` range contains `addr`. No type filter: zero-size
    /// label-like symbols are already excluded by the strict upper bound.
    pub fn get_symbol_by_addr_range(
        &mut self,
        section: &SectionHeader,
        addr: u64,
    ) -> Result<(u64, SymbolEntry)> {
        let count = self.get_symbol_count(section);
        if count == 0 {
            return Err(Error::BadArg);
        }
        for index in 1..count {
            let entry = self.get_symbol_entry(section, index)?;
            if entry.section_index == crate::section::SHN_UNDEF {
                continue;
            }
            if entry.value <= addr && addr < entry.value + entry.size {
                return Ok((index, entry));
            }
        }
        Err(Error::NotFound)
    }

    /// Find the first symbol whose name (resolved through `section.link`)
    /// equals `name`. [`Error::BadArg`] if `name` is empty or the table
    /// has no entries.
    pub fn get_symbol_by_name(
        &mut self,
        section: &SectionHeader,
        name: &[u8],
    ) -> Result<(u64, SymbolEntry)> {
        let count = self.get_symbol_count(section);
        if name.is_empty() || count == 0 {
            return Err(Error::BadArg);
        }
        let link_index = u16::try_from(section.link).map_err(|_| Error::BadArg)?;
        for index in 1..count {
            let entry = self.get_symbol_entry(section, index)?;
            let fetched = self.get_symbol_name(link_index, &entry, 256)?;
            if fetched == name {
                return Ok((index, entry));
            }
        }
        Err(Error::NotFound)
    }
}
