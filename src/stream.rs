//! Binary downloads: in-memory bytes and files streamed from disk.
//!
//! Both send `application/octet-stream` with
//! `Content-Disposition: attachment; filename="<name>"`.
//!
//! [`Response::stream_file`] is meant for one-shot exports written into a
//! scratch directory: once the body has been sent (or abandoned) the file is
//! closed and its **whole parent directory is removed**.

use std::convert::Infallible;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use http::header::CONTENT_DISPOSITION;
use http::{HeaderValue, StatusCode};
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};

use crate::response::{ContentType, Response, ResponseBody};

const CHUNK_SIZE: usize = 64 * 1024;

impl Response {
    /// Sends `bytes` as a file download named `filename`.
    pub fn stream_bytes(status: StatusCode, bytes: impl Into<Bytes>, filename: &str) -> Self {
        Self::builder()
            .status(status)
            .header_value(CONTENT_DISPOSITION, attachment(filename))
            .bytes(ContentType::OctetStream, bytes)
    }

    /// Streams the file at `path` as a download named `filename`.
    ///
    /// If the file cannot be opened the response is a bare `500` and nothing
    /// is deleted. Otherwise the parent directory of `path` is removed after
    /// the body finishes, fails mid-way, or is dropped. Read and cleanup
    /// failures happen after the status line is out, so they are only logged.
    pub async fn stream_file(status: StatusCode, path: impl AsRef<Path>, filename: &str) -> Self {
        let path = path.as_ref();
        let file = match File::open(path).await {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), "cannot open file for streaming: {e}");
                return Self::status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => Some(dir.to_path_buf()),
            _ => {
                warn!(path = %path.display(), "file has no parent directory, skipping cleanup");
                None
            }
        };

        Self::builder()
            .status(status)
            .header_value(CONTENT_DISPOSITION, attachment(filename))
            .finish(ContentType::OctetStream, file_body(FileStream { file: Some(file), dir, copied: 0 }))
    }
}

/// Builds `attachment; filename="<name>"`, escaping quotes and backslashes
/// and dropping control characters.
fn attachment(filename: &str) -> HeaderValue {
    let mut escaped = String::with_capacity(filename.len());
    for c in filename.chars().filter(|c| !c.is_control()) {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    HeaderValue::from_str(&format!("attachment; filename=\"{escaped}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Owns the open file for the lifetime of the body.
struct FileStream {
    file: Option<File>,
    dir: Option<PathBuf>,
    copied: u64,
}

impl Drop for FileStream {
    fn drop(&mut self) {
        // Close before removing the directory that holds it.
        drop(self.file.take());
        info!(bytes = self.copied, "file stream finished");

        let Some(dir) = self.dir.take() else { return };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_scratch_dir(&dir));
            }
            Err(_) => remove_scratch_dir(&dir),
        }
    }
}

fn remove_scratch_dir(dir: &Path) {
    if let Err(e) = std::fs::remove_dir_all(dir) {
        warn!(dir = %dir.display(), "failed to clean up temp dir: {e}");
    }
}

fn file_body(state: FileStream) -> ResponseBody {
    let chunks = stream::unfold(state, |mut state| async move {
        let file = state.file.as_mut()?;
        let mut buf = vec![0u8; CHUNK_SIZE];
        match file.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                state.copied += n as u64;
                Some((Frame::data(Bytes::from(buf)), state))
            }
            Err(e) => {
                error!(copied = state.copied, "streaming failed: {e}");
                None
            }
        }
    });

    StreamBody::new(chunks.map(Ok::<_, Infallible>)).boxed_unsync()
}
