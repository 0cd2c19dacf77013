//! Streaming archive upload path
//!
//! Produces a gzip-compressed tar stream over the staged `package` folder
//! and feeds it straight into a single object write. The producer runs on
//! a blocking task and pushes fixed-size chunks through a bounded channel,
//! so the archiver can never run arbitrarily far ahead of the network
//! writer and the archive is never materialized in memory or on disk.
//!
//! Archive entry paths are rooted at `package/...` by construction, so no
//! working-directory manipulation is involved.

use crate::build::staging::STAGE_DIR_NAME;
use crate::core::error::{PublishError, StoreError};
use crate::core::traits::{ObjectBody, ObjectStore, PutReceipt};
use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

const CHUNK_SIZE: usize = 64 * 1024;
const CHANNEL_DEPTH: usize = 8;

/// `Write` adapter that hands accumulated chunks to the async consumer.
/// `blocking_send` on the bounded channel provides the backpressure.
struct ChannelWriter {
    tx: mpsc::Sender<std::io::Result<Bytes>>,
    buf: Vec<u8>,
}

impl ChannelWriter {
    fn new(tx: mpsc::Sender<std::io::Result<Bytes>>) -> Self {
        Self {
            tx,
            buf: Vec::with_capacity(CHUNK_SIZE),
        }
    }

    fn send_buffered(&mut self) -> std::io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }

        let chunk = Bytes::from(std::mem::take(&mut self.buf));
        self.buf.reserve(CHUNK_SIZE);
        self.tx.blocking_send(Ok(chunk)).map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "upload consumer dropped")
        })
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(data);
        if self.buf.len() >= CHUNK_SIZE {
            self.send_buffered()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.send_buffered()
    }
}

/// Stream a `package/`-rooted tar.gz of the staged directory
pub fn package_stream(stage_root: &Path) -> ObjectBody {
    let stage_root: PathBuf = stage_root.to_path_buf();
    let (tx, mut rx) = mpsc::channel(CHANNEL_DEPTH);

    tokio::task::spawn_blocking(move || {
        if let Err(e) = write_archive(&stage_root, tx.clone()) {
            // Forward the failure; if the consumer already went away the
            // error has nowhere to go and the upload has failed anyway
            let _ = tx.blocking_send(Err(e));
        }
    });

    Box::pin(futures::stream::poll_fn(move |cx| rx.poll_recv(cx)))
}

fn write_archive(stage_root: &Path, tx: mpsc::Sender<std::io::Result<Bytes>>) -> std::io::Result<()> {
    let writer = ChannelWriter::new(tx);
    let encoder = GzEncoder::new(writer, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    builder.append_dir_all(STAGE_DIR_NAME, stage_root)?;

    let encoder = builder.into_inner()?;
    let mut writer = encoder.finish()?;
    writer.flush()
}

/// Archive the staged directory and write it as one object.
///
/// Archive-stream failures surface as [`PublishError::Archive`] when the
/// backend reports them as body errors; backends that fold body failures
/// into their transport error (reqwest does) surface them as
/// [`PublishError::Backend`] instead. Either way the failure aborts the
/// upload and is surfaced once, with no retries.
pub async fn upload_archive(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    stage_root: &Path,
) -> Result<PutReceipt, PublishError> {
    let body = package_stream(stage_root);

    store
        .put_object(bucket, key, body)
        .await
        .map_err(|source| match source {
            StoreError::Body(e) => PublishError::Archive(e),
            other => PublishError::Backend {
                operation: "put_object",
                source: other,
            },
        })
}
