//! Decode and construct ELF (Executable and Linkable Format) object files
//! over a caller-supplied byte source.
//!
//! An ELF file is a layered binary container: a fixed identification
//! prefix, a header describing two tables (program headers and section
//! headers), typed sections, and segments (program-load views of
//! sections). Every multi-byte field's width and byte order is determined
//! at runtime from the identification prefix — see [`ident`] for that
//! dispatch and [`codec`] for the decode/encode primitives built on it.
//!
//! [`reader::ElfContext`] is a random-access decoder parameterised over a
//! [`reader::ByteSource`]; it never mutates its source and caches only the
//! fixed-size identification and header fields. [`writer::WriterContext`]
//! is the push-based counterpart: build a header description, add
//! sections and chunks, declare segments, then call `serialise` once for a
//! byte-exact image.
//!
//! Not handled here: the byte source/sink itself (file I/O, memory
//! mapping, decompression), a pretty-printer front end, a DWARF decoder,
//! relocation application, or dynamic linking.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs)]

pub mod codec;
pub mod error;
pub mod header;
pub mod ident;
pub mod program;
pub mod reader;
pub mod section;
pub mod symbol;
pub mod writer;

pub use error::{Error, Result};
pub use header::{ElfHeader, ElfMachine, ElfType};
pub use ident::{ElfClass, ElfDataEncoding, ElfOsAbi, Identification};
pub use program::{ProgramHeader, SegmentFlags, SegmentType};
pub use reader::{ByteSource, ElfContext};
pub use section::{CompressionHeader, SectionFlags, SectionHeader, SectionType};
pub use symbol::{SymbolBind, SymbolEntry, SymbolType};
pub use writer::{HeaderInfo, LayoutPolicy, Section, SectionHandle, SectionInfo, SegmentMap, WriterContext};
