//! Crash-safe file output.
//!
//! Every file this tool produces is first written to a temporary file in the
//! destination directory and then atomically moved over the destination. A
//! failed or interrupted write leaves the previous file untouched, and the
//! temporary file is removed when it is dropped.

use crate::Result;
use camino::Utf8Path;
use core::time::Duration;
use ohno::IntoAppError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use tempfile::NamedTempFile;

const LOG_TARGET: &str = "    output";

/// Replacing a file can fail transiently while another process holds it open.
const PERSIST_ATTEMPTS: u32 = 3;
const PERSIST_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Write a file through a temporary file, replacing `path` only on success.
///
/// Blocks while retrying the replace, so async callers run it on the blocking pool.
pub fn write_with<F>(path: &Utf8Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<()>,
{
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };

    fs::create_dir_all(parent).into_app_err_with(|| format!("unable to create directory '{parent}'"))?;

    let mut temp = NamedTempFile::new_in(parent).into_app_err_with(|| format!("unable to create a temporary file in '{parent}'"))?;

    {
        let mut writer = BufWriter::new(&mut temp);
        write(&mut writer)?;
        writer.flush().into_app_err_with(|| format!("unable to write '{path}'"))?;
    }

    persist(temp, path)
}

fn persist(mut temp: NamedTempFile, path: &Utf8Path) -> Result<()> {
    let mut attempt = 1;
    loop {
        match temp.persist(path) {
            Ok(_) => {
                log::debug!(target: LOG_TARGET, "Wrote '{path}'");
                return Ok(());
            }
            Err(e) if attempt < PERSIST_ATTEMPTS => {
                log::debug!(target: LOG_TARGET, "Attempt {attempt} to replace '{path}' failed: {}", e.error);
                temp = e.file;
                attempt += 1;
                std::thread::sleep(PERSIST_RETRY_DELAY);
            }
            Err(e) => {
                return Err(e.error).into_app_err_with(|| format!("unable to replace '{path}'"));
            }
        }
    }
}

/// Serialize `data` as pretty-printed JSON into `path`.
pub fn write_json<T>(data: &T, path: &Utf8Path) -> Result<()>
where
    T: Serialize,
{
    write_with(path, |writer| {
        serde_json::to_writer_pretty(&mut *writer, data).into_app_err_with(|| format!("unable to serialize '{path}'"))?;
        writer.write_all(b"\n").into_app_err_with(|| format!("unable to write '{path}'"))
    })
}

/// Copy `from` over `to` with the same guarantees as [`write_with`].
pub fn copy_file(from: &Utf8Path, to: &Utf8Path) -> Result<()> {
    let mut source = File::open(from).into_app_err_with(|| format!("unable to open '{from}'"))?;
    write_with(to, |writer| {
        let _ = std::io::copy(&mut source, writer).into_app_err_with(|| format!("unable to copy '{from}' to '{to}'"))?;
        Ok(())
    })
}

/// Load a JSON document.
pub fn load_json<T>(path: &Utf8Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let file = File::open(path).into_app_err_with(|| format!("unable to open file '{path}'"))?;
    serde_json::from_reader(BufReader::new(file)).into_app_err_with(|| format!("unable to parse file '{path}'"))
}
