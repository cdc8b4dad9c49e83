mod common;

use common::{minimal_elf64_header, SliceSource};
use elf_core::{header, section, symbol, ElfContext, Error, SectionFlags, SectionType};

#[test]
fn minimal_elf64_lsb_file_decodes_with_one_null_section() {
    let mut file = minimal_elf64_header(1); // REL
    let sh_off = header::EHSIZE_64 as u64;
    file[32..40].copy_from_slice(&sh_off.to_le_bytes());
    file[58..60].copy_from_slice(&1u16.to_le_bytes()); // shnum
    file[60..62].copy_from_slice(&section::entry_size(elf_core::ElfClass::Elf64).to_le_bytes());
    file.extend(vec![0u8; section::entry_size(elf_core::ElfClass::Elf64) as usize]);

    let mut ctx = ElfContext::init(SliceSource(file)).unwrap();
    assert_eq!(ctx.get_section_count(), 1);
    assert_eq!(ctx.get_program_header_count(), 0);
    let zero = ctx.get_section_header(0).unwrap();
    assert_eq!(zero.section_type, SectionType::Null);
    assert_eq!(zero.flags, SectionFlags::empty());
    assert_eq!(zero.address, 0);
    assert_eq!(zero.size, 0);
}

#[test]
fn bad_magic_is_rejected_and_leaves_no_context() {
    let mut file = minimal_elf64_header(1);
    file[3] = b'G'; // corrupt the 4th magic byte
    let err = ElfContext::init(SliceSource(file)).unwrap_err();
    assert_eq!(err, Error::BadMagic);
}

#[test]
fn big_endian_file_decodes_correctly_on_little_endian_host() {
    let mut file = vec![0u8; header::EHSIZE_64 as usize];
    file[0..4].copy_from_slice(&[0x7F, b'E', b'L', b'F']);
    file[4] = elf_core::ElfClass::ELF64;
    file[5] = elf_core::ElfDataEncoding::MSB;
    file[6] = 1;
    file[28..36].copy_from_slice(&0x0000_0000_0000_0040u64.to_be_bytes()); // phoff
    file[52..54].copy_from_slice(&header::EHSIZE_64.to_be_bytes());

    let ctx = ElfContext::init(SliceSource(file)).unwrap();
    assert_eq!(ctx.get_header().program_header_offset, 0x40);
}

#[test]
fn symbol_by_addr_range_returns_first_entry_in_range() {
    let mut file = minimal_elf64_header(1);
    let sh_off = header::EHSIZE_64 as u64;
    let sh_entry = section::entry_size(elf_core::ElfClass::Elf64);
    let sym_entry = symbol::entry_size(elf_core::ElfClass::Elf64);

    file[32..40].copy_from_slice(&sh_off.to_le_bytes());
    file[58..60].copy_from_slice(&2u16.to_le_bytes()); // NULL + SYMTAB
    file[60..62].copy_from_slice(&sh_entry.to_le_bytes());

    file.extend(vec![0u8; sh_entry as usize]); // section 0: NULL

    let sym_offset = sh_off + 2 * sh_entry;
    let mut symtab = vec![0u8; sh_entry as usize];
    symtab[4..8].copy_from_slice(&2u32.to_le_bytes()); // SYMTAB
    symtab[24..32].copy_from_slice(&sym_offset.to_le_bytes());
    symtab[32..40].copy_from_slice(&(2 * sym_entry).to_le_bytes());
    symtab[56..64].copy_from_slice(&sym_entry.to_le_bytes());
    file.extend(symtab);

    let mut first = vec![0u8; sym_entry as usize];
    first[6..8].copy_from_slice(&1u16.to_le_bytes());
    first[8..16].copy_from_slice(&0x1000u64.to_le_bytes());
    first[16..24].copy_from_slice(&0x20u64.to_le_bytes());
    file.extend(first);

    let mut second = vec![0u8; sym_entry as usize];
    second[6..8].copy_from_slice(&1u16.to_le_bytes());
    second[8..16].copy_from_slice(&0x2000u64.to_le_bytes());
    second[16..24].copy_from_slice(&0x10u64.to_le_bytes());
    file.extend(second);

    let mut ctx = ElfContext::init(SliceSource(file)).unwrap();
    let symtab_header = ctx.get_section_header(1).unwrap();

    let (index, _) = ctx.get_symbol_by_addr_range(&symtab_header, 0x1005).unwrap();
    assert_eq!(index, 1);
    let (index, _) = ctx.get_symbol_by_addr_range(&symtab_header, 0x101F).unwrap();
    assert_eq!(index, 1);
    assert_eq!(
        ctx.get_symbol_by_addr_range(&symtab_header, 0x1020).unwrap_err(),
        Error::NotFound
    );
    let (index, _) = ctx.get_symbol_by_addr_range(&symtab_header, 0x2000).unwrap();
    assert_eq!(index, 2);
}

#[test]
fn string_table_fetch_respects_buffer_length() {
    let mut file = minimal_elf64_header(1);
    let sh_off = header::EHSIZE_64 as u64;
    let sh_entry = section::entry_size(elf_core::ElfClass::Elf64);

    file[32..40].copy_from_slice(&sh_off.to_le_bytes());
    file[58..60].copy_from_slice(&2u16.to_le_bytes());
    file[60..62].copy_from_slice(&sh_entry.to_le_bytes());

    file.extend(vec![0u8; sh_entry as usize]); // section 0: NULL

    // "\0main\0foo\0bar\0\0\0" — 16 bytes
    let strtab_bytes: &[u8] = b"\0main\0foo\0bar\0\0\0";
    assert_eq!(strtab_bytes.len(), 16);
    let strtab_offset = sh_off + 2 * sh_entry;
    let mut strtab_section = vec![0u8; sh_entry as usize];
    strtab_section[4..8].copy_from_slice(&3u32.to_le_bytes()); // STRTAB
    strtab_section[24..32].copy_from_slice(&strtab_offset.to_le_bytes());
    strtab_section[32..40].copy_from_slice(&(strtab_bytes.len() as u64).to_le_bytes());
    file.extend(strtab_section);
    file.extend_from_slice(strtab_bytes);

    let mut ctx = ElfContext::init(SliceSource(file)).unwrap();

    assert_eq!(ctx.get_str_from_table(1, 1, 8).unwrap(), b"main");
    assert_eq!(ctx.get_str_from_table(1, 6, 8).unwrap(), b"foo");
    assert_eq!(ctx.get_str_from_table(1, 10, 8).unwrap(), b"bar");
    assert_eq!(
        ctx.get_str_from_table(1, 16, 8).unwrap_err(),
        Error::BadArg
    );
}

#[test]
fn writer_round_trip_produces_a_decodable_file() {
    use elf_core::writer::{HeaderInfo, SectionInfo, WriterContext};
    use elf_core::{ElfMachine, ElfType};

    let mut ctx = WriterContext::new();
    ctx.create_header(
        HeaderInfo::builder()
            .class(elf_core::ElfClass::Elf64)
            .data(elf_core::ElfDataEncoding::Lsb)
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
    let payload: Vec<u8> = (0u8..13).collect();
    ctx.section_append_data(text, &payload, 4).unwrap();

    ctx.add_section(
        SectionInfo::builder()
            .name(".shstrtab")
            .section_type(SectionType::StrTab)
            .alignment(1)
            .build(),
    )
    .unwrap();

    let image = ctx.serialise().unwrap();

    let mut reader = ElfContext::init(SliceSource(image)).unwrap();
    assert_eq!(reader.get_section_count(), 3);
    let text_header = reader.get_section_header(1).unwrap();
    assert_eq!(text_header.size, 13);
    assert_eq!(text_header.alignment, 4);
    assert_eq!(text_header.offset % 4, 0);

    let name = reader.get_section_name(&text_header, 16).unwrap();
    assert_eq!(name, b".text");
}

#[test]
fn zero_sized_symbol_table_reports_bad_arg_for_name_lookup() {
    let mut file = minimal_elf64_header(1);
    let sh_off = header::EHSIZE_64 as u64;
    let sh_entry = section::entry_size(elf_core::ElfClass::Elf64);
    file[32..40].copy_from_slice(&sh_off.to_le_bytes());
    file[58..60].copy_from_slice(&2u16.to_le_bytes());
    file[60..62].copy_from_slice(&sh_entry.to_le_bytes());
    file.extend(vec![0u8; sh_entry as usize]);

    let mut symtab = vec![0u8; sh_entry as usize];
    symtab[4..8].copy_from_slice(&2u32.to_le_bytes()); // SYMTAB, size 0
    symtab[56..64].copy_from_slice(&symbol::entry_size(elf_core::ElfClass::Elf64).to_le_bytes());
    file.extend(symtab);

    let mut ctx = ElfContext::init(SliceSource(file)).unwrap();
    let symtab_header = ctx.get_section_header(1).unwrap();
    assert_eq!(ctx.get_symbol_count(&symtab_header), 0);
    assert_eq!(
        ctx.get_symbol_by_name(&symtab_header, b"anything").unwrap_err(),
        Error::BadArg
    );
}

#[test]
fn compressed_section_cannot_also_be_alloc() {
    let mut file = minimal_elf64_header(1);
    let sh_off = header::EHSIZE_64 as u64;
    let sh_entry = section::entry_size(elf_core::ElfClass::Elf64);
    file[32..40].copy_from_slice(&sh_off.to_le_bytes());
    file[58..60].copy_from_slice(&2u16.to_le_bytes());
    file[60..62].copy_from_slice(&sh_entry.to_le_bytes());
    file.extend(vec![0u8; sh_entry as usize]);

    let mut bad = vec![0u8; sh_entry as usize];
    let flags = (SectionFlags::COMPRESSED | SectionFlags::ALLOC).bits();
    bad[8..16].copy_from_slice(&flags.to_le_bytes());
    file.extend(bad);

    let mut ctx = ElfContext::init(SliceSource(file)).unwrap();
    assert_eq!(ctx.get_section_header(1).unwrap_err(), Error::BadFormat);
}
