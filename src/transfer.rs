use chrono::{Local, NaiveDateTime};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::{Error, Result, TransferError, status_error};
use crate::session::Session;

/// Bytes per read/write when streaming a response to disk.
pub const CHUNK_SIZE: usize = 16 * 1024;

/// Default permission bits for delivered files (`rwxrwxr-x`).
pub const DEFAULT_MODE: u32 = 0o775;

const STAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Keep the delivered zip as one file, streamed in fixed-size chunks.
    #[default]
    Archive,
    /// Buffer the zip in memory and unpack every member into a directory.
    Extract,
}

#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// Working directory the file or directory is created under.
    pub directory: PathBuf,
    /// Permission bits applied to every produced file (Unix only).
    pub mode: u32,
    pub delivery: DeliveryMode,
    /// Show a progress bar while streaming archives.
    pub progress: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            mode: DEFAULT_MODE,
            delivery: DeliveryMode::Archive,
            progress: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferOutcome {
    Archive { path: PathBuf },
    Extracted { directory: PathBuf, files: Vec<PathBuf> },
}

impl TransferOutcome {
    /// The archive file or the extraction directory.
    pub fn path(&self) -> &Path {
        match self {
            TransferOutcome::Archive { path } => path,
            TransferOutcome::Extracted { directory, .. } => directory,
        }
    }
}

/// `{product}_{YYYY-MM-DDTHH-MM-SS}`.
pub fn output_stem(product: &str, started: &NaiveDateTime) -> String {
    format!("{}_{}", product, started.format(STAMP_FORMAT))
}

/// Performs one GET of `url` through `session` and delivers the result
/// under `options.directory`, named after `product` and the current local time.
pub fn transfer(
    session: &Session,
    product: &str,
    url: &str,
    options: &TransferOptions,
) -> Result<TransferOutcome> {
    transfer_at(session, product, url, options, Local::now().naive_local())
}

pub(crate) fn transfer_at(
    session: &Session,
    product: &str,
    url: &str,
    options: &TransferOptions,
    started: NaiveDateTime,
) -> Result<TransferOutcome> {
    let stem = output_stem(product, &started);
    match options.delivery {
        DeliveryMode::Archive => {
            let path = options.directory.join(format!("{}.zip", stem));
            info!(url, path = %path.display(), "retrieving");
            download_archive(session, url, &path, options)
        }
        DeliveryMode::Extract => {
            let directory = options.directory.join(&stem);
            info!(url, directory = %directory.display(), "retrieving and extracting");
            download_and_extract(session, url, &directory, options)
        }
    }
}

fn download_archive(
    session: &Session,
    url: &str,
    path: &Path,
    options: &TransferOptions,
) -> Result<TransferOutcome> {
    let mut resp = session.get(url)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(status_error(status, resp.url().as_str()));
    }

    ensure_directory(&options.directory)?;
    let mut out = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;

    let pb = match resp.content_length() {
        Some(len) if options.progress => Some(progress_bar(len)),
        _ => None,
    };

    let copied = copy_chunked(&mut resp, &mut out, |n| {
        if let Some(pb) = &pb {
            pb.inc(n as u64);
        }
    });
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }
    match copied {
        Ok(bytes) => debug!(bytes, path = %path.display(), "archive written"),
        Err(CopyError::Read(e)) => {
            return Err(Error::Transfer(TransferError::Interrupted {
                url: url.to_string(),
                source: e,
            }));
        }
        Err(CopyError::Write(e)) => return Err(Error::io(path, e)),
    }
    out.flush().map_err(|e| Error::io(path, e))?;
    drop(out);

    set_mode(path, options.mode)?;
    Ok(TransferOutcome::Archive {
        path: path.to_path_buf(),
    })
}

fn download_and_extract(
    session: &Session,
    url: &str,
    directory: &Path,
    options: &TransferOptions,
) -> Result<TransferOutcome> {
    let resp = session.get(url)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(status_error(status, resp.url().as_str()));
    }

    // The central directory sits at the end of the zip, so the whole body is
    // buffered before anything is unpacked.
    let body = resp.bytes().map_err(TransferError::Http)?;
    let mut archive = ZipArchive::new(Cursor::new(body)).map_err(|e| Error::Format {
        origin: url.to_string(),
        reason: "response is not a readable zip archive".to_string(),
        source: Some(e),
    })?;

    ensure_directory(&options.directory)?;
    fs::create_dir(directory).map_err(|e| Error::io(directory, e))?;

    let files = extract_archive(&mut archive, directory, options.mode, url)?;
    Ok(TransferOutcome::Extracted {
        directory: directory.to_path_buf(),
        files,
    })
}

/// Unpacks every member of `archive` under `dest`, applying `mode` to each
/// file. Members whose names would land outside `dest` are rejected.
///
/// Files already under `dest` are never overwritten. A later member that
/// resolves to a path written earlier in the same call (`a.h5` and `./a.h5`)
/// replaces it.
pub(crate) fn extract_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    dest: &Path,
    mode: u32,
    origin: &str,
) -> Result<Vec<PathBuf>> {
    let format_error = |reason: String, source: Option<zip::result::ZipError>| Error::Format {
        origin: origin.to_string(),
        reason,
        source,
    };

    let mut files = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut member = archive
            .by_index(i)
            .map_err(|e| format_error(format!("cannot read member #{}", i), Some(e)))?;
        let relative = member.enclosed_name().ok_or_else(|| {
            format_error(format!("unsafe member name '{}'", member.name()), None)
        })?;
        let target = dest.join(relative);

        if member.is_dir() {
            fs::create_dir_all(&target).map_err(|e| Error::io(&target, e))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let repeated = files.contains(&target);
        if repeated {
            debug!(path = %target.display(), "member repeated, replacing");
            fs::remove_file(&target).map_err(|e| Error::io(&target, e))?;
        }

        let mut out = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .map_err(|e| Error::io(&target, e))?;
        match copy_chunked(&mut member, &mut out, |_| {}) {
            Ok(_) => {}
            Err(CopyError::Read(e)) => {
                return Err(format_error(
                    format!("corrupt member '{}': {}", member.name(), e),
                    None,
                ));
            }
            Err(CopyError::Write(e)) => return Err(Error::io(&target, e)),
        }
        drop(out);

        debug!(path = %target.display(), "extracted");
        set_mode(&target, mode)?;
        if !repeated {
            files.push(target);
        }
    }
    Ok(files)
}

enum CopyError {
    Read(std::io::Error),
    Write(std::io::Error),
}

fn copy_chunked<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    mut on_chunk: impl FnMut(usize),
) -> std::result::Result<u64, CopyError> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        writer.write_all(&buf[..n]).map_err(CopyError::Write)?;
        total += n as u64;
        on_chunk(n);
    }
}

fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} {bytes}/{total_bytes} ({bytes_per_sec}) {wide_bar} {eta}",
    ) {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| Error::io(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
