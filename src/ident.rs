//! The ELF identification prefix: class, data encoding, and the fixed
//! 16-byte block every ELF file begins with.

use crate::error::{Error, Result};

/// Number of bytes in the identification block (`e_ident`).
pub const EI_NIDENT: usize = 16;

const MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Field width used throughout the rest of the file.
pub enum ElfClass {
    /// 32-bit field widths.
    Elf32 = Self::ELF32,
    /// 64-bit field widths.
    Elf64 = Self::ELF64,
}

impl ElfClass {
    /// Raw `EI_CLASS` value meaning "no class" — always rejected by `init`.
    pub const NONE: u8 = 0;
    /// Raw `EI_CLASS` value for [`ElfClass::Elf32`].
    pub const ELF32: u8 = 1;
    /// Raw `EI_CLASS` value for [`ElfClass::Elf64`].
    pub const ELF64: u8 = 2;
}

impl TryFrom<u8> for ElfClass {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            Self::ELF32 => Ok(Self::Elf32),
            Self::ELF64 => Ok(Self::Elf64),
            other => Err(Error::BadClass(other)),
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Byte order used for every multi-byte field in the file.
pub enum ElfDataEncoding {
    /// Little-endian.
    Lsb = Self::LSB,
    /// Big-endian.
    Msb = Self::MSB,
}

impl ElfDataEncoding {
    /// Raw `EI_DATA` value meaning "no encoding" — always rejected by `init`.
    pub const NONE: u8 = 0;
    /// Raw `EI_DATA` value for [`ElfDataEncoding::Lsb`].
    pub const LSB: u8 = 1;
    /// Raw `EI_DATA` value for [`ElfDataEncoding::Msb`].
    pub const MSB: u8 = 2;

    /// This host's native data encoding.
    pub const fn host() -> Self {
        #[cfg(target_endian = "little")]
        {
            ElfDataEncoding::Lsb
        }
        #[cfg(target_endian = "big")]
        {
            ElfDataEncoding::Msb
        }
    }
}

impl TryFrom<u8> for ElfDataEncoding {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            Self::LSB => Ok(Self::Lsb),
            Self::MSB => Ok(Self::Msb),
            other => Err(Error::BadEndianness(other)),
        }
    }
}

/// The ELF version byte; the only defined value is [`ElfVersion::Current`].
pub const EV_CURRENT: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
/// The file's OS/ABI (`EI_OSABI`).
///
/// Identifies OS- or ABI-specific ELF extensions used by the file. A value
/// outside this set is not a format error: spec.md's non-goals explicitly
/// exclude semantic validation beyond structural safety, so unrecognized
/// bytes decode to [`ElfOsAbi::Other`] rather than failing `init`.
pub enum ElfOsAbi {
    /// Unix System V ABI, or none specified.
    NoneSystemV = 0,
    /// HP-UX
    Hpux = 1,
    /// NetBSD
    NetBsd = 2,
    /// Object uses GNU ELF extensions.
    GnuLinux = 3,
    /// SUN Solaris
    Solaris = 6,
    /// IBM AIX
    Aix = 7,
    /// SGI Irix
    Irix = 8,
    /// FreeBSD
    FreeBsd = 9,
    /// Compaq TRU64 UNIX
    Tru64 = 10,
    /// Novell Modesto
    NovellModesto = 11,
    /// OpenBSD
    OpenBsd = 12,
    /// Open Virtual Memory System
    OpenVms = 13,
    /// NSK Non-Stop Kernel
    NonStopKernel = 14,
    /// Amiga Research OS
    Aros = 15,
    /// FenixOS Highly scalable multi-core OS
    FenixOs = 16,
    /// Nuxi CloudABI
    CloudAbi = 17,
    /// Stratus Technologies OpenVOS
    OpenVos = 18,
    /// Any other / unrecognized OS-ABI byte.
    Other(u8),
}

impl From<u8> for ElfOsAbi {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::NoneSystemV,
            1 => Self::Hpux,
            2 => Self::NetBsd,
            3 => Self::GnuLinux,
            6 => Self::Solaris,
            7 => Self::Aix,
            8 => Self::Irix,
            9 => Self::FreeBsd,
            10 => Self::Tru64,
            11 => Self::NovellModesto,
            12 => Self::OpenBsd,
            13 => Self::OpenVms,
            14 => Self::NonStopKernel,
            15 => Self::Aros,
            16 => Self::FenixOs,
            17 => Self::CloudAbi,
            18 => Self::OpenVos,
            other => Self::Other(other),
        }
    }
}

impl From<ElfOsAbi> for u8 {
    fn from(value: ElfOsAbi) -> Self {
        match value {
            ElfOsAbi::NoneSystemV => 0,
            ElfOsAbi::Hpux => 1,
            ElfOsAbi::NetBsd => 2,
            ElfOsAbi::GnuLinux => 3,
            ElfOsAbi::Solaris => 6,
            ElfOsAbi::Aix => 7,
            ElfOsAbi::Irix => 8,
            ElfOsAbi::FreeBsd => 9,
            ElfOsAbi::Tru64 => 10,
            ElfOsAbi::NovellModesto => 11,
            ElfOsAbi::OpenBsd => 12,
            ElfOsAbi::OpenVms => 13,
            ElfOsAbi::NonStopKernel => 14,
            ElfOsAbi::Aros => 15,
            ElfOsAbi::FenixOs => 16,
            ElfOsAbi::CloudAbi => 17,
            ElfOsAbi::OpenVos => 18,
            ElfOsAbi::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Decoded form of the 16-byte identification prefix (`e_ident`).
pub struct Identification {
    /// Field width for the rest of the file.
    pub class: ElfClass,
    /// Byte order for the rest of the file.
    pub data: ElfDataEncoding,
    /// OS/ABI extensions in use.
    pub os_abi: ElfOsAbi,
    /// ABI version, meaning dependent on `os_abi`.
    pub abi_version: u8,
}

impl Identification {
    /// Decode and validate the 16-byte identification block.
    ///
    /// Checks the magic (`7F 45 4C 46`), the version byte (must be `1`), and
    /// that class/data are both non-`NONE` and within their allowed ranges.
    pub fn decode(raw: &[u8; EI_NIDENT]) -> Result<Self> {
        if raw[0..4] != MAGIC {
            return Err(Error::BadMagic);
        }
        let class = ElfClass::try_from(raw[4])?;
        let data = ElfDataEncoding::try_from(raw[5])?;
        if raw[6] != EV_CURRENT {
            return Err(Error::BadVersion(raw[6]));
        }
        Ok(Self {
            class,
            data,
            os_abi: ElfOsAbi::from(raw[7]),
            abi_version: raw[8],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_elf64_lsb_identification() {
        let raw: [u8; EI_NIDENT] = [
            0x7F, b'E', b'L', b'F', 2, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ];
        let ident = Identification::decode(&raw).unwrap();
        assert_eq!(ident.class, ElfClass::Elf64);
        assert_eq!(ident.data, ElfDataEncoding::Lsb);
        assert_eq!(ident.os_abi, ElfOsAbi::NoneSystemV);
        assert_eq!(ident.abi_version, 0);
    }

    #[test]
    fn rejects_bad_magic() {
        let raw: [u8; EI_NIDENT] = [
            0x7F, b'E', b'L', b'G', 2, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ];
        assert_eq!(Identification::decode(&raw), Err(Error::BadMagic));
    }

    #[test]
    fn rejects_none_class_and_endianness() {
        let raw: [u8; EI_NIDENT] = [
            0x7F, b'E', b'L', b'F', 0, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ];
        assert_eq!(Identification::decode(&raw), Err(Error::BadClass(0)));
    }
}
