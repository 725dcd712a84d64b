//! Fixtures shared by unit tests.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;

use localtools_schema::Platform;
use zip::write::SimpleFileOptions;

use crate::NullReporter;
use crate::host::HostContext;
use crate::ops::{Context, InstallSettings};

/// A linux context whose download cache lives in `cache_dir`.
pub(crate) fn context(cache_dir: &Path) -> Context {
    let env = HashMap::from([("HOME".to_string(), "/nonexistent".to_string())]);
    let host = HostContext::from_env(Platform::LinuxX86_64, env)
        .unwrap()
        .with_cache_dir(cache_dir);
    Context::new(
        host,
        reqwest::Client::new(),
        Arc::new(NullReporter),
        InstallSettings::default(),
    )
}

/// In-memory zip of `(name, contents, mode)` entries.
pub(crate) fn zip_bytes(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data, mode) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default().unix_permissions(*mode))
            .unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// In-memory tar.gz of `(name, contents, mode)` entries.
pub(crate) fn tar_gz_bytes(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data, mode) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(*mode);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    let raw = builder.into_inner().unwrap();

    let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
    enc.write_all(&raw).unwrap();
    enc.finish().unwrap()
}
