use elf_core::{ElfClass, ElfDataEncoding};

macro_rules! identification_case {
    ($name:ident, class = $class_byte:expr, data = $data_byte:expr, class = $expect_class:expr, data = $expect_data:expr) => {
        paste::paste! {
            #[test]
            fn [<identification_decodes_ $name>]() {
                let raw: [u8; elf_core::ident::EI_NIDENT] = [
                    0x7F, b'E', b'L', b'F', $class_byte, $data_byte, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0,
                ];
                let ident = elf_core::Identification::decode(&raw).unwrap();
                assert_eq!(ident.class, $expect_class);
                assert_eq!(ident.data, $expect_data);
            }
        }
    };
}

identification_case!(
    elf32_lsb,
    class = ElfClass::ELF32,
    data = ElfDataEncoding::LSB,
    class = ElfClass::Elf32,
    data = ElfDataEncoding::Lsb
);
identification_case!(
    elf32_msb,
    class = ElfClass::ELF32,
    data = ElfDataEncoding::MSB,
    class = ElfClass::Elf32,
    data = ElfDataEncoding::Msb
);
identification_case!(
    elf64_lsb,
    class = ElfClass::ELF64,
    data = ElfDataEncoding::LSB,
    class = ElfClass::Elf64,
    data = ElfDataEncoding::Lsb
);
identification_case!(
    elf64_msb,
    class = ElfClass::ELF64,
    data = ElfDataEncoding::MSB,
    class = ElfClass::Elf64,
    data = ElfDataEncoding::Msb
);
