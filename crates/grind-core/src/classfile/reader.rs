//! Minimal JVM class file header reader
//!
//! Only the fields needed for test selection are decoded: the constant pool
//! (to resolve the class name), the access flags and `this_class`. Everything
//! after `this_class` is ignored.

use std::path::Path;

use tracing::trace;

use crate::error::ClassfileError;

use super::{ClassDescriptor, ClassReader};

const MAGIC: u32 = 0xCAFE_BABE;

/// `ACC_INTERFACE` access flag
pub const ACC_INTERFACE: u16 = 0x0200;
/// `ACC_ABSTRACT` access flag
pub const ACC_ABSTRACT: u16 = 0x0400;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKE_DYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

/// Reads class descriptors straight from `.class` files on disk
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassfileReader;

impl ClassfileReader {
    /// Create a new reader
    pub fn new() -> Self {
        Self
    }

    /// Parse a descriptor from raw class file bytes
    pub fn parse(path: &Path, bytes: &[u8]) -> Result<ClassDescriptor, ClassfileError> {
        let mut cursor = Cursor::new(path, bytes);

        if cursor.u32()? != MAGIC {
            return Err(ClassfileError::BadMagic(path.to_path_buf()));
        }
        let _minor = cursor.u16()?;
        let _major = cursor.u16()?;

        let pool = ConstantPool::parse(&mut cursor)?;

        let access_flags = cursor.u16()?;
        let this_class = cursor.u16()?;
        let internal_name = pool.class_name(this_class, path)?;

        let descriptor = ClassDescriptor {
            path: path.to_path_buf(),
            class_name: internal_name.replace('/', "."),
            is_interface: access_flags & ACC_INTERFACE != 0,
            is_abstract: access_flags & ACC_ABSTRACT != 0,
        };
        trace!(
            class = %descriptor.class_name,
            access_flags,
            "parsed class file"
        );
        Ok(descriptor)
    }
}

impl ClassReader for ClassfileReader {
    fn read(&self, path: &Path) -> Result<ClassDescriptor, ClassfileError> {
        let bytes = std::fs::read(path).map_err(|source| ClassfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &bytes)
    }
}

struct Cursor<'a> {
    path: &'a Path,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(path: &'a Path, bytes: &'a [u8]) -> Self {
        Self {
            path,
            bytes,
            pos: 0,
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ClassfileError> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.bytes.len());
        match end {
            Some(end) => {
                let slice = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(ClassfileError::Truncated(self.path.to_path_buf())),
        }
    }

    fn u8(&mut self) -> Result<u8, ClassfileError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ClassfileError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ClassfileError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

enum Constant {
    Utf8(String),
    Class(u16),
    Other,
    /// Second slot of a Long or Double
    Unusable,
}

struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    fn parse(cursor: &mut Cursor<'_>) -> Result<Self, ClassfileError> {
        let count = cursor.u16()? as usize;
        // Index 0 is never valid
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable);

        while entries.len() < count {
            let tag = cursor.u8()?;
            match tag {
                TAG_UTF8 => {
                    let len = cursor.u16()? as usize;
                    let raw = cursor.take(len)?;
                    entries.push(Constant::Utf8(String::from_utf8_lossy(raw).into_owned()));
                }
                TAG_CLASS => {
                    let name_index = cursor.u16()?;
                    entries.push(Constant::Class(name_index));
                }
                TAG_LONG | TAG_DOUBLE => {
                    cursor.take(8)?;
                    entries.push(Constant::Other);
                    entries.push(Constant::Unusable);
                }
                TAG_INTEGER | TAG_FLOAT | TAG_FIELDREF | TAG_METHODREF
                | TAG_INTERFACE_METHODREF | TAG_NAME_AND_TYPE | TAG_DYNAMIC
                | TAG_INVOKE_DYNAMIC => {
                    cursor.take(4)?;
                    entries.push(Constant::Other);
                }
                TAG_METHOD_HANDLE => {
                    cursor.take(3)?;
                    entries.push(Constant::Other);
                }
                TAG_STRING | TAG_METHOD_TYPE | TAG_MODULE | TAG_PACKAGE => {
                    cursor.take(2)?;
                    entries.push(Constant::Other);
                }
                other => {
                    return Err(ClassfileError::Malformed {
                        path: cursor.path.to_path_buf(),
                        message: format!("unknown constant pool tag {}", other),
                    });
                }
            }
        }

        Ok(Self { entries })
    }

    fn class_name(&self, index: u16, path: &Path) -> Result<String, ClassfileError> {
        let malformed = |message: String| ClassfileError::Malformed {
            path: path.to_path_buf(),
            message,
        };

        let name_index = match self.entries.get(index as usize) {
            Some(Constant::Class(name_index)) => *name_index,
            _ => return Err(malformed(format!("this_class #{} is not a class entry", index))),
        };

        match self.entries.get(name_index as usize) {
            Some(Constant::Utf8(name)) => Ok(name.clone()),
            _ => Err(malformed(format!(
                "class name #{} is not a UTF-8 entry",
                name_index
            ))),
        }
    }
}
