use elf_core::{ByteSource, Error, Result};

pub struct SliceSource(pub Vec<u8>);

impl ByteSource for SliceSource {
    fn fetch(&mut self, offset: u64, dest: &mut [u8]) -> Result<()> {
        let offset = offset as usize;
        let end = offset + dest.len();
        if end > self.0.len() {
            return Err(Error::IoEof);
        }
        dest.copy_from_slice(&self.0[offset..end]);
        Ok(())
    }
}

pub fn minimal_elf64_header(file_type: u16) -> Vec<u8> {
    let mut raw = vec![0u8; elf_core::header::EHSIZE_64 as usize];
    raw[0..4].copy_from_slice(&[0x7F, b'E', b'L', b'F']);
    raw[4] = elf_core::ElfClass::ELF64;
    raw[5] = elf_core::ElfDataEncoding::LSB;
    raw[6] = 1;
    raw[16..18].copy_from_slice(&file_type.to_le_bytes());
    raw[52..54].copy_from_slice(&elf_core::header::EHSIZE_64.to_le_bytes());
    raw
}
