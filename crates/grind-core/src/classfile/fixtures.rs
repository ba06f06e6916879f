//! Minimal class file encoder for tests

use std::path::{Path, PathBuf};

/// Encode the smallest valid class file header naming `internal_name`
/// (slash-separated, e.g. `com/acme/FooTest`) with the given access flags.
pub fn class_bytes(internal_name: &str, access_flags: u16) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
    // minor, major (Java 8)
    bytes.extend_from_slice(&0u16.to_be_bytes());
    bytes.extend_from_slice(&52u16.to_be_bytes());
    // #1 Utf8 name, #2 Class -> #1
    bytes.extend_from_slice(&3u16.to_be_bytes());
    bytes.push(1);
    bytes.extend_from_slice(&(internal_name.len() as u16).to_be_bytes());
    bytes.extend_from_slice(internal_name.as_bytes());
    bytes.push(7);
    bytes.extend_from_slice(&1u16.to_be_bytes());
    bytes.extend_from_slice(&access_flags.to_be_bytes());
    bytes.extend_from_slice(&2u16.to_be_bytes());
    // super_class, interfaces, fields, methods, attributes
    bytes.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    bytes
}

/// Write a class file for `fqcn` (dot-separated) under `classes_dir`,
/// following the package directory layout. Returns the written path.
pub fn write_class(classes_dir: &Path, fqcn: &str, access_flags: u16) -> PathBuf {
    let internal = fqcn.replace('.', "/");
    let path = classes_dir.join(format!("{}.class", internal));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create class directory");
    }
    std::fs::write(&path, class_bytes(&internal, access_flags)).expect("write class file");
    path
}

/// Write a minimal module (`pom.xml` plus `target/`) at `dir`
pub fn write_module(dir: &Path) {
    std::fs::create_dir_all(dir.join("target")).expect("create target directory");
    std::fs::write(dir.join("pom.xml"), "<project/>").expect("write pom.xml");
}
