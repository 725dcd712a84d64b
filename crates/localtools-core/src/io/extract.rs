//! Archive extraction module
//!
//! Handles zip, tar.gz and tar.xz in-process and macOS installer packages
//! through the system `installer` tool. Every extractor creates the
//! destination directory first and refuses entries that would land outside it.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use localtools_schema::TarCompression;
use thiserror::Error;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::io::process::{self, InstallerError};

const S_IFMT: u32 = 0o170_000;
const S_IFLNK: u32 = 0o120_000;

/// Errors unpacking an archive or installer package.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Filesystem failure while writing entries.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The archive is malformed or has an entry escaping the destination.
    #[error("Archive error in {}: {message}", path.display())]
    Archive {
        /// The archive being unpacked.
        path: PathBuf,
        /// What was wrong.
        message: String,
    },

    /// An external unpacking tool failed.
    #[error("{tool} failed (exit code {exit_code:?}): {stderr}")]
    Tool {
        /// Command line of the tool.
        tool: String,
        /// Exit code, `None` if it never ran or was killed.
        exit_code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// An external unpacking tool exceeded the timeout.
    #[error("{tool} did not finish within {secs}s")]
    Timeout {
        /// Command line of the tool.
        tool: String,
        /// Configured limit in seconds.
        secs: u64,
    },
}

impl ExtractError {
    fn archive(path: &Path, message: impl ToString) -> Self {
        Self::Archive {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

impl From<InstallerError> for ExtractError {
    fn from(err: InstallerError) -> Self {
        match err {
            InstallerError::Failed {
                command,
                exit_code,
                stderr,
            } => Self::Tool {
                tool: command,
                exit_code,
                stderr,
            },
            InstallerError::Spawn { command, source } => Self::Tool {
                tool: command,
                exit_code: None,
                stderr: source.to_string(),
            },
            InstallerError::Timeout { command, secs } => Self::Timeout {
                tool: command,
                secs,
            },
        }
    }
}

/// Unzip `archive` into `dest`, overwriting existing files.
pub async fn unzip(archive: &Path, dest: &Path) -> Result<(), ExtractError> {
    info!("unzipping {}", archive.display());
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || extract_zip(&archive, &dest))
        .await
        .map_err(io::Error::other)??;
    Ok(())
}

/// Untar a compressed `archive` into `dest`.
pub async fn untar(
    archive: &Path,
    dest: &Path,
    compression: TarCompression,
) -> Result<(), ExtractError> {
    info!("untarring {} ({compression})", archive.display());
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || extract_compressed_tar(&archive, &dest, compression))
        .await
        .map_err(io::Error::other)??;
    Ok(())
}

/// Install a macOS `.pkg` with its default choice relocated to `dest`.
pub async fn unpackage(
    pkg: &Path,
    dest: &Path,
    timeout: Option<Duration>,
) -> Result<(), ExtractError> {
    info!("unpacking {}", pkg.display());
    tokio::fs::create_dir_all(dest).await?;

    let choices = write_choices(dest).await?;

    let args: [&OsStr; 6] = [
        "-pkg".as_ref(),
        pkg.as_os_str(),
        "-target".as_ref(),
        "CurrentUserHomeDirectory".as_ref(),
        "-applyChoiceChangesXML".as_ref(),
        choices.path().as_os_str(),
    ];
    process::run("installer", &args, timeout).await?;
    Ok(())
}

/// Write the choice-changes plist for `dest` to a temp file removed on drop.
async fn write_choices(dest: &Path) -> io::Result<tempfile::NamedTempFile> {
    let choices = tempfile::Builder::new()
        .prefix("localtools-choices-")
        .suffix(".xml")
        .tempfile()?;
    tokio::fs::write(choices.path(), choices_xml(dest)).await?;
    Ok(choices)
}

/// Mark a file as executable (`rwxr-xr-x`).
pub async fn make_executable(path: &Path) -> Result<(), io::Error> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, fs::Permissions::from_mode(0o755)).await?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Choice-changes plist relocating the package's default choice.
fn choices_xml(dest: &Path) -> String {
    let location = dest
        .to_string_lossy()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
  <array>
    <dict>
      <key>choiceAttribute</key>
      <string>customLocation</string>
      <key>attributeSetting</key>
      <string>{location}</string>
      <key>choiceIdentifier</key>
      <string>default</string>
    </dict>
  </array>
</plist>
"#
    )
}

/// Extract a zip archive, returning the number of entries written.
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractError> {
    let file = File::open(archive_path)?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|e| ExtractError::archive(archive_path, e))?;

    fs::create_dir_all(dest_dir)?;
    let mut written = 0;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| ExtractError::archive(archive_path, e))?;
        let relative_path = entry.enclosed_name().ok_or_else(|| {
            ExtractError::archive(
                archive_path,
                format!("entry escapes destination: {}", entry.name()),
            )
        })?;
        let absolute_path = dest_dir.join(&relative_path);

        if entry.is_dir() {
            fs::create_dir_all(&absolute_path)?;
            continue;
        }
        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent)?;
        }
        remove_existing(&absolute_path)?;

        let mode = entry.unix_mode();
        if mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
            let mut target = String::new();
            entry.read_to_string(&mut target)?;
            check_link_target(archive_path, &relative_path, Path::new(&target))?;
            create_symlink(Path::new(&target), &absolute_path)?;
        } else {
            let mut outfile = File::create(&absolute_path)?;
            io::copy(&mut entry, &mut outfile)?;

            #[cfg(unix)]
            if let Some(mode) = mode {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode & 0o7777))?;
            }
        }
        written += 1;
    }

    debug!("extracted {written} entries into {}", dest_dir.display());
    Ok(written)
}

/// Extract a gzip- or xz-compressed tar archive.
pub fn extract_compressed_tar(
    archive_path: &Path,
    dest_dir: &Path,
    compression: TarCompression,
) -> Result<usize, ExtractError> {
    let reader = BufReader::new(File::open(archive_path)?);
    match compression {
        TarCompression::Gzip => {
            extract_tar(flate2::read::GzDecoder::new(reader), archive_path, dest_dir)
        }
        TarCompression::Xz => extract_tar(xz2::read::XzDecoder::new(reader), archive_path, dest_dir),
    }
}

/// Extract a tar stream, returning the number of entries written.
fn extract_tar<R: Read>(
    reader: R,
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<usize, ExtractError> {
    fs::create_dir_all(dest_dir)?;

    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);

    let mut written = 0;
    let entries = archive
        .entries()
        .map_err(|e| ExtractError::archive(archive_path, e))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| ExtractError::archive(archive_path, e))?;
        let relative_path = entry
            .path()
            .map_err(|e| ExtractError::archive(archive_path, e))?
            .into_owned();
        check_entry_path(archive_path, &relative_path)?;

        let kind = entry.header().entry_type();
        if kind.is_symlink() || kind.is_hard_link() {
            let target = entry
                .link_name()
                .map_err(|e| ExtractError::archive(archive_path, e))?
                .ok_or_else(|| ExtractError::archive(archive_path, "link without a target"))?;
            if kind.is_symlink() {
                check_link_target(archive_path, &relative_path, &target)?;
            } else {
                check_entry_path(archive_path, &target)?;
            }
        }

        let unpacked = entry
            .unpack_in(dest_dir)
            .map_err(|e| ExtractError::archive(archive_path, e))?;
        if !unpacked {
            return Err(ExtractError::archive(
                archive_path,
                format!("entry escapes destination: {}", relative_path.display()),
            ));
        }
        written += 1;
    }

    debug!("extracted {written} entries into {}", dest_dir.display());
    Ok(written)
}

/// Reject absolute paths and any `..` component.
fn check_entry_path(archive_path: &Path, relative: &Path) -> Result<(), ExtractError> {
    if stays_within(Path::new(""), relative)
        && !relative.components().any(|c| c == Component::ParentDir)
    {
        Ok(())
    } else {
        Err(ExtractError::archive(
            archive_path,
            format!("entry escapes destination: {}", relative.display()),
        ))
    }
}

/// Reject symlinks that resolve (lexically) outside the destination.
fn check_link_target(
    archive_path: &Path,
    link: &Path,
    target: &Path,
) -> Result<(), ExtractError> {
    let base = link.parent().unwrap_or_else(|| Path::new(""));
    if stays_within(base, target) {
        Ok(())
    } else {
        Err(ExtractError::archive(
            archive_path,
            format!(
                "symlink {} points outside destination: {}",
                link.display(),
                target.display()
            ),
        ))
    }
}

/// True if `rel`, taken relative to the already-validated `base`, never
/// climbs above the root.
fn stays_within(base: &Path, rel: &Path) -> bool {
    let mut depth = base
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count();
    for component in rel.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// Remove a non-directory at `path` so it is replaced rather than written through.
fn remove_existing(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if !meta.is_dir() => fs::remove_file(path),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    let _ = (target, link);
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks in archives require a unix host",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, build: impl FnOnce(&mut zip::ZipWriter<File>)) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        build(&mut writer);
        writer.finish().unwrap();
    }

    fn tar_bytes(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data, mode) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn write_tar_gz(path: &Path, raw: &[u8]) {
        let mut enc =
            flate2::write::GzEncoder::new(File::create(path).unwrap(), flate2::Compression::fast());
        enc.write_all(raw).unwrap();
        enc.finish().unwrap();
    }

    fn write_tar_xz(path: &Path, raw: &[u8]) {
        let mut enc = xz2::write::XzEncoder::new(File::create(path).unwrap(), 1);
        enc.write_all(raw).unwrap();
        enc.finish().unwrap();
    }

    #[tokio::test]
    async fn test_unzip_preserves_layout_and_modes() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("p.zip");
        write_zip(&archive, |w| {
            w.add_directory("p/bin/", SimpleFileOptions::default())
                .unwrap();
            w.start_file(
                "p/bin/tool",
                SimpleFileOptions::default().unix_permissions(0o755),
            )
            .unwrap();
            w.write_all(b"#!/bin/sh\necho hi\n").unwrap();
            w.start_file(
                "p/README",
                SimpleFileOptions::default().unix_permissions(0o644),
            )
            .unwrap();
            w.write_all(b"readme").unwrap();
        });

        let dest = dir.path().join("out");
        unzip(&archive, &dest).await.unwrap();

        assert_eq!(fs::read_to_string(dest.join("p/README")).unwrap(), "readme");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(dest.join("p/bin/tool"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[tokio::test]
    async fn test_unzip_overwrites_existing_files() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("b.zip");
        write_zip(&archive, |w| {
            w.start_file("tool", SimpleFileOptions::default()).unwrap();
            w.write_all(b"new").unwrap();
        });
        let dest = dir.path().join("bin");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("tool"), "old").unwrap();

        unzip(&archive, &dest).await.unwrap();
        assert_eq!(fs::read_to_string(dest.join("tool")).unwrap(), "new");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unzip_recreates_symlinks() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("links.zip");
        write_zip(&archive, |w| {
            w.start_file("lib/real", SimpleFileOptions::default())
                .unwrap();
            w.write_all(b"payload").unwrap();
            w.add_symlink("lib/alias", "real", SimpleFileOptions::default())
                .unwrap();
        });

        let dest = dir.path().join("out");
        unzip(&archive, &dest).await.unwrap();

        let link = dest.join("lib/alias");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(link).unwrap(), "payload");
    }

    #[test]
    fn test_zip_rejects_parent_traversal() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("evil.zip");
        write_zip(&archive, |w| {
            w.start_file("../evil.txt", SimpleFileOptions::default())
                .unwrap();
            w.write_all(b"gotcha").unwrap();
        });

        let dest = dir.path().join("out");
        let err = extract_zip(&archive, &dest).unwrap_err();
        assert!(matches!(err, ExtractError::Archive { .. }));
        assert!(!dir.path().join("evil.txt").exists());
    }

    #[test]
    fn test_zip_rejects_escaping_symlink() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("evil-link.zip");
        write_zip(&archive, |w| {
            w.add_symlink("bin/passwd", "../../etc/passwd", SimpleFileOptions::default())
                .unwrap();
        });

        let err = extract_zip(&archive, &dir.path().join("out")).unwrap_err();
        assert!(err.to_string().contains("points outside destination"));
    }

    #[test]
    fn test_corrupt_zip_is_archive_error() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("broken.zip");
        fs::write(&archive, b"definitely not a zip").unwrap();

        let err = extract_zip(&archive, &dir.path().join("out")).unwrap_err();
        match err {
            ExtractError::Archive { path, .. } => assert_eq!(path, archive),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_untar_gzip() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("node.tar.gz");
        write_tar_gz(
            &archive,
            &tar_bytes(&[
                ("node-v18/bin/node", b"elf", 0o755),
                ("node-v18/LICENSE", b"MIT", 0o644),
            ]),
        );

        let dest = dir.path().join("out");
        untar(&archive, &dest, TarCompression::Gzip).await.unwrap();

        assert_eq!(fs::read_to_string(dest.join("node-v18/LICENSE")).unwrap(), "MIT");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(dest.join("node-v18/bin/node"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[tokio::test]
    async fn test_untar_xz_into_relative_dir() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("tool.tar.xz");
        write_tar_xz(&archive, &tar_bytes(&[("bin/tool", b"xz payload", 0o755)]));

        let dest = dir.path().join("proj").join("tool");
        untar(&archive, &dest, TarCompression::Xz).await.unwrap();

        assert_eq!(
            fs::read_to_string(dest.join("bin/tool")).unwrap(),
            "xz payload"
        );
    }

    #[test]
    fn test_untar_wrong_compression_is_archive_error() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("tool.tar.gz");
        write_tar_gz(&archive, &tar_bytes(&[("a", b"a", 0o644)]));

        let err =
            extract_compressed_tar(&archive, &dir.path().join("out"), TarCompression::Xz).unwrap_err();
        assert!(matches!(err, ExtractError::Archive { .. }));
    }

    #[test]
    fn test_tar_rejects_parent_traversal() {
        let mut header = tar::Header::new_old();
        let name = b"../escape.txt";
        header.as_old_mut().name[..name.len()].copy_from_slice(name);
        header.set_size(3);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        let mut builder = tar::Builder::new(Vec::new());
        builder.append(&header, &b"bad"[..]).unwrap();
        let raw = builder.into_inner().unwrap();

        let dir = tempdir().unwrap();
        let archive = dir.path().join("evil.tar.gz");
        write_tar_gz(&archive, &raw);

        let dest = dir.path().join("out");
        let err = extract_compressed_tar(&archive, &dest, TarCompression::Gzip).unwrap_err();
        assert!(matches!(err, ExtractError::Archive { .. }));
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_stays_within() {
        assert!(stays_within(Path::new(""), Path::new("a/b")));
        assert!(stays_within(Path::new("a/b"), Path::new("../c")));
        assert!(stays_within(Path::new("a"), Path::new("./x/../y")));
        assert!(!stays_within(Path::new(""), Path::new("../a")));
        assert!(!stays_within(Path::new("a"), Path::new("../../b")));
        assert!(!stays_within(Path::new(""), Path::new("/etc/passwd")));
    }

    #[test]
    fn test_choices_xml_relocates_default_choice() {
        let xml = choices_xml(Path::new("/tmp/proj/aws & co"));
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<string>/tmp/proj/aws &amp; co</string>"));
        assert!(xml.contains("<string>customLocation</string>"));
        assert!(xml.contains("<string>default</string>"));
    }

    #[tokio::test]
    async fn test_write_choices_file() {
        let choices = write_choices(Path::new("/tmp/proj/lib")).await.unwrap();
        let path = choices.path().to_path_buf();
        assert!(path.extension() == Some(OsStr::new("xml")));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            choices_xml(Path::new("/tmp/proj/lib"))
        );

        drop(choices);
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_make_executable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let file = dir.path().join("t");
        fs::write(&file, "x").unwrap();
        make_executable(&file).await.unwrap();
        let mode = fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_installer_error_maps_to_tool_error() {
        let err: ExtractError = InstallerError::Failed {
            command: "installer -pkg x.pkg".into(),
            exit_code: Some(1),
            stderr: "no".into(),
        }
        .into();
        match err {
            ExtractError::Tool {
                tool,
                exit_code,
                stderr,
            } => {
                assert_eq!(tool, "installer -pkg x.pkg");
                assert_eq!(exit_code, Some(1));
                assert_eq!(stderr, "no");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
