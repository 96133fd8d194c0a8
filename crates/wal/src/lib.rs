//! # WAL — the intent log
//!
//! Append-only record of mutation intents, the durability backbone of the
//! store. Every `PUT` or `DEL` is framed by [`codec`], appended, and
//! `fsync`-ed **before** the corresponding in-memory update. On restart the
//! log is replayed from offset 0 to reconstruct the memory index, so no
//! acknowledged write is lost.
//!
//! ## Record format
//!
//! ```text
//! [crc32: u32 LE][type: u8][key_len: u32 LE][val_len: u32 LE][key][value]
//! ```
//!
//! `type` is 1 for `PUT`, 2 for `DEL` (which carries `val_len = 0`).
//!
//! ## Example
//!
//! ```rust,no_run
//! use wal::{WalReader, WalWriter};
//!
//! let mut w = WalWriter::open("kv.wal", true).unwrap();
//! w.append_put(b"hello", b"world").unwrap();
//! drop(w);
//!
//! let mut r = WalReader::open("kv.wal").unwrap();
//! r.replay(|op, key, value| println!("{:?} {:?} {:?}", op, key, value))
//!     .unwrap();
//! ```

use codec::{CodecError, Decoded};
pub use codec::Op;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Errors from intent-log operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// The log handle has been closed; append and sync are refused.
    #[error("wal not open")]
    NotOpen,

    /// An I/O error while appending or syncing a record.
    #[error("wal write failed: {0}")]
    WriteFailed(#[source] io::Error),

    /// An I/O error while opening or reading the log.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Append-only intent-log writer.
///
/// The file is opened once and held for the engine's lifetime. Each record
/// is encoded into a reusable scratch buffer and written with a single
/// `write_all`; when `sync` is on, every append is followed by `sync_all`
/// (fsync) so the record is durable before the call returns.
pub struct WalWriter {
    file: Option<File>,
    sync: bool,
    /// Reusable scratch buffer to avoid allocation on every append.
    buf: Vec<u8>,
}

impl WalWriter {
    /// Opens (or creates) the intent log in append mode.
    ///
    /// * `path` — log file path, created if absent.
    /// * `sync` — if true, every append fsyncs before returning.
    pub fn open<P: AsRef<Path>>(path: P, sync: bool) -> Result<Self, WalError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(WalError::Io)?;
        Ok(Self {
            file: Some(file),
            sync,
            buf: Vec::with_capacity(256),
        })
    }

    /// Appends an upsert intent and makes it durable.
    pub fn append_put(&mut self, key: &[u8], value: &[u8]) -> Result<(), WalError> {
        self.append(Op::Put, key, value)
    }

    /// Appends a delete intent (zero-length value) and makes it durable.
    pub fn append_del(&mut self, key: &[u8]) -> Result<(), WalError> {
        self.append(Op::Del, key, b"")
    }

    fn append(&mut self, op: Op, key: &[u8], value: &[u8]) -> Result<(), WalError> {
        let file = self.file.as_mut().ok_or(WalError::NotOpen)?;

        codec::encode_intent(op, key, value, &mut self.buf).map_err(|e| match e {
            CodecError::BodyTooLarge(_) => {
                WalError::WriteFailed(io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))
            }
            CodecError::Io(io_err) => WalError::WriteFailed(io_err),
        })?;

        use std::io::Write;
        file.write_all(&self.buf).map_err(WalError::WriteFailed)?;
        if self.sync {
            file.sync_all().map_err(WalError::WriteFailed)?;
        }
        Ok(())
    }

    /// Forces everything written so far to stable storage.
    ///
    /// Useful when `sync` is off (batched loads) and the caller wants a
    /// durability point before acknowledging a batch.
    pub fn sync(&mut self) -> Result<(), WalError> {
        let file = self.file.as_mut().ok_or(WalError::NotOpen)?;
        file.sync_all().map_err(WalError::WriteFailed)
    }

    /// Closes the underlying handle. Later appends and syncs report
    /// [`WalError::NotOpen`].
    pub fn close(&mut self) {
        self.file = None;
    }

    /// Whether the log handle is still open.
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

/// Sequential intent-log reader.
///
/// Generic over any `Read` implementor so tests can replay from in-memory
/// buffers. Each record's CRC is verified during replay; a truncated tail
/// or a corrupt record terminates the scan cleanly — every complete record
/// before it has already been applied.
pub struct WalReader<R: Read> {
    rdr: BufReader<R>,
}

impl WalReader<File> {
    /// Opens an existing log file for replay from offset 0.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<WalReader<File>, WalError> {
        let f = File::open(path)?;
        Ok(WalReader {
            rdr: BufReader::new(f),
        })
    }
}

impl<R: Read> WalReader<R> {
    /// Constructs a reader from any `Read` implementor.
    pub fn from_reader(reader: R) -> Self {
        WalReader {
            rdr: BufReader::new(reader),
        }
    }

    /// Replays every intact record, calling `apply` for each.
    ///
    /// # Termination
    ///
    /// - Clean end of stream → `Ok(())`.
    /// - Truncated tail (crash mid-append) → `Ok(())` after the complete
    ///   records before it.
    /// - CRC mismatch or unknown type byte → `Ok(())`; the damaged tail is
    ///   treated as absent.
    /// - Real I/O error → `Err(WalError::Io)`.
    pub fn replay<F>(&mut self, mut apply: F) -> Result<(), WalError>
    where
        F: FnMut(Op, Vec<u8>, Vec<u8>),
    {
        loop {
            match codec::decode_intent(&mut self.rdr) {
                Ok(Decoded::Record(rec)) => apply(rec.op, rec.key, rec.value),
                Ok(Decoded::EndOfStream) | Ok(Decoded::Truncated) | Ok(Decoded::Corrupt) => {
                    return Ok(())
                }
                Err(CodecError::Io(e)) => return Err(WalError::Io(e)),
                // Decode never reports BodyTooLarge; oversized length
                // fields classify as Corrupt above.
                Err(CodecError::BodyTooLarge(_)) => return Ok(()),
            }
        }
    }
}
