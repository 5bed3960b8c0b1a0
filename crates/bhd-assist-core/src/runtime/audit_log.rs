// crates/bhd-assist-core/src/runtime/audit_log.rs
// ============================================================================
// Module: BHD Assist Decision Log Writers
// Description: Append-only JSONL and in-memory decision log sinks.
// Purpose: Serialize concurrent appends and make the log tamper-evident.
// Dependencies: serde, serde_json, tracing, crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`JsonlAuditLog`] owns its writer behind a single mutex: each append
//! serializes one complete record, writes it with one `write_all`, and
//! flushes before the lock is released, so records are never interleaved.
//! With hash chaining enabled each record carries `prev_hash` and `hash`
//! (SHA-256 over `prev_hash` and the canonical record body). Reopening a log
//! file resumes its sequence and chain; [`verify_chain`] re-reads a log and
//! reports the first broken link.
//!
//! File logs hold an exclusive advisory lock for each append and re-read the
//! chain tail whenever another handle has appended, so separate processes
//! extend one chain. A failed write is truncated away; a store that cannot
//! be truncated halts its writer instead of appending after a torn record.
//!
//! Timestamps are forced strictly increasing per log, so file order and
//! timestamp order agree.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use tracing::error;

use crate::core::AuditTimestamp;
use crate::core::DecisionLogEntry;
use crate::core::hashing::GENESIS_HASH;
use crate::core::hashing::chain_digest;
use crate::interfaces::AuditError;
use crate::interfaces::AuditSink;

// ============================================================================
// SECTION: Records
// ============================================================================

/// One line of a JSONL decision log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// One-based position in the log.
    pub sequence: u64,
    /// Logged decision.
    #[serde(flatten)]
    pub entry: DecisionLogEntry,
    /// Hash of the previous record (chained logs only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    /// Hash of this record (chained logs only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// Record body covered by the chain hash.
#[derive(Serialize)]
struct ChainPayload<'a> {
    /// Record sequence.
    sequence: u64,
    /// Logged decision.
    #[serde(flatten)]
    entry: &'a DecisionLogEntry,
}

/// Computes the chain hash for a record body.
fn record_hash(
    prev_hash: &str,
    sequence: u64,
    entry: &DecisionLogEntry,
) -> Result<String, AuditError> {
    chain_digest(
        prev_hash,
        &ChainPayload {
            sequence,
            entry,
        },
    )
    .map_err(|err| AuditError::Serialization(err.to_string()))
}

// ============================================================================
// SECTION: Storage
// ============================================================================

/// Byte store behind a [`JsonlAuditLog`].
///
/// The defaults describe a private, write-only stream: no other writer can
/// append to it and a failed write cannot be undone. File storage overrides
/// every hook so separate processes can share one log.
pub trait AuditStorage: Write + Send {
    /// Takes exclusive access for one append and returns the current store
    /// length when it can be measured.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when access cannot be taken.
    fn acquire(&mut self) -> io::Result<Option<u64>> {
        Ok(None)
    }

    /// Returns a reader positioned at the start of the store, or `None` when
    /// the store cannot be read back.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the store cannot be rewound.
    fn read_back(&mut self) -> io::Result<Option<Box<dyn BufRead + '_>>> {
        Ok(None)
    }

    /// Truncates the store to `len` bytes. Returns `false` when unsupported.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when truncation fails.
    fn truncate_to(&mut self, _len: u64) -> io::Result<bool> {
        Ok(false)
    }

    /// Releases access taken by [`AuditStorage::acquire`].
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the release fails.
    fn release(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AuditStorage for Vec<u8> {}

impl AuditStorage for File {
    fn acquire(&mut self) -> io::Result<Option<u64>> {
        self.lock()?;
        match self.metadata() {
            Ok(metadata) => Ok(Some(metadata.len())),
            Err(err) => {
                let _ = self.unlock();
                Err(err)
            }
        }
    }

    fn read_back(&mut self) -> io::Result<Option<Box<dyn BufRead + '_>>> {
        self.seek(SeekFrom::Start(0))?;
        Ok(Some(Box::new(BufReader::new(&*self))))
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<bool> {
        self.set_len(len)?;
        Ok(true)
    }

    fn release(&mut self) -> io::Result<()> {
        self.unlock()
    }
}

// ============================================================================
// SECTION: JSONL Writer
// ============================================================================

/// Options for [`JsonlAuditLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditLogOptions {
    /// Adds `prev_hash` and `hash` to every record.
    pub hash_chain: bool,
}

impl Default for AuditLogOptions {
    fn default() -> Self {
        Self {
            hash_chain: true,
        }
    }
}

/// Position of the last record in a log.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChainTail {
    /// Sequence assigned to the next record.
    next_sequence: u64,
    /// Hash of the last chained record, or the genesis hash.
    last_hash: String,
    /// Timestamp of the last record.
    last_timestamp: Option<AuditTimestamp>,
}

impl Default for ChainTail {
    fn default() -> Self {
        Self {
            next_sequence: 1,
            last_hash: GENESIS_HASH.to_string(),
            last_timestamp: None,
        }
    }
}

/// Mutable writer state guarded by the log mutex.
struct WriterState<W> {
    /// Output store.
    writer: W,
    /// Chain position.
    tail: ChainTail,
    /// Store length after the last record this state knows about.
    committed_len: Option<u64>,
    /// Set when a failed write could not be rolled back.
    halted: bool,
}

impl<W: AuditStorage> WriterState<W> {
    /// Appends one record while the store is held exclusively.
    fn append_held(
        &mut self,
        entry: DecisionLogEntry,
        hash_chain: bool,
        store_len: Option<u64>,
    ) -> Result<(), AuditError> {
        if store_len.is_some() && store_len != self.committed_len {
            self.resync(store_len)?;
        }
        let entry = entry.stamped_after(self.tail.last_timestamp);
        let sequence = self.tail.next_sequence;
        let (prev_hash, hash) = if hash_chain {
            let hash = record_hash(&self.tail.last_hash, sequence, &entry)?;
            (Some(self.tail.last_hash.clone()), Some(hash))
        } else {
            (None, None)
        };
        let record = AuditRecord {
            sequence,
            entry,
            prev_hash,
            hash,
        };
        let mut line = serde_json::to_vec(&record)
            .map_err(|err| AuditError::Serialization(err.to_string()))?;
        line.push(b'\n');
        let written = self.writer.write_all(&line).and_then(|()| self.writer.flush());
        if let Err(err) = written {
            error!(sequence, error = %err, "decision log append failed");
            self.roll_back(store_len);
            return Err(AuditError::Io(err.to_string()));
        }
        let line_len = u64::try_from(line.len()).unwrap_or(u64::MAX);
        self.committed_len = store_len.map(|len| len.saturating_add(line_len));
        self.tail.next_sequence = sequence + 1;
        self.tail.last_timestamp = Some(record.entry.timestamp());
        if let Some(hash) = record.hash {
            self.tail.last_hash = hash;
        }
        Ok(())
    }

    /// Re-reads the chain tail after another writer extended the store.
    fn resync(&mut self, store_len: Option<u64>) -> Result<(), AuditError> {
        let reader = self.writer.read_back().map_err(|err| AuditError::Io(err.to_string()))?;
        if let Some(reader) = reader {
            self.tail = read_tail(reader)?;
            self.committed_len = store_len;
        }
        Ok(())
    }

    /// Removes a partially written record, halting the writer when it cannot.
    fn roll_back(&mut self, store_len: Option<u64>) {
        let restored = match store_len {
            Some(len) => self.writer.truncate_to(len),
            None => Ok(false),
        };
        match restored {
            Ok(true) => {}
            Ok(false) => {
                error!("decision log cannot roll back a failed write; halting writer");
                self.halted = true;
            }
            Err(err) => {
                error!(error = %err, "decision log rollback failed; halting writer");
                self.halted = true;
            }
        }
    }
}

/// Append-only JSONL decision log with a single serialized writer.
pub struct JsonlAuditLog<W: AuditStorage> {
    /// Writer and chain position.
    state: Mutex<WriterState<W>>,
    /// Whether records are hash-chained.
    hash_chain: bool,
}

impl JsonlAuditLog<File> {
    /// Opens (or creates) a log file in append mode, resuming its chain.
    ///
    /// Every append holds an exclusive advisory lock on the file and
    /// re-reads the chain tail when another handle appended since, so
    /// separate processes can share one log.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Io`] when the file cannot be opened or locked,
    /// [`AuditError::Corrupt`] when an existing line cannot be parsed, and
    /// [`AuditError::ChainBroken`] when existing records do not link up.
    pub fn open(path: &Path, options: AuditLogOptions) -> Result<Self, AuditError> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|err| AuditError::Io(err.to_string()))?;
        let store_len = file.acquire().map_err(|err| AuditError::Io(err.to_string()))?;
        let tail = read_tail(BufReader::new(&file));
        file.release().map_err(|err| AuditError::Io(err.to_string()))?;
        Ok(Self::with_state(file, options, tail?, store_len))
    }
}

impl<W: AuditStorage> JsonlAuditLog<W> {
    /// Creates a log over an empty writer.
    #[must_use]
    pub fn new(writer: W, options: AuditLogOptions) -> Self {
        Self::with_state(writer, options, ChainTail::default(), None)
    }

    /// Creates a log positioned after `tail` in a store of `committed_len` bytes.
    const fn with_state(
        writer: W,
        options: AuditLogOptions,
        tail: ChainTail,
        committed_len: Option<u64>,
    ) -> Self {
        Self {
            state: Mutex::new(WriterState {
                writer,
                tail,
                committed_len,
                halted: false,
            }),
            hash_chain: options.hash_chain,
        }
    }

    /// Consumes the log and returns the writer.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Poisoned`] when a writer panicked mid-append.
    pub fn into_inner(self) -> Result<W, AuditError> {
        self.state.into_inner().map(|state| state.writer).map_err(|_| AuditError::Poisoned)
    }
}

impl<W: AuditStorage> AuditSink for JsonlAuditLog<W> {
    fn append(&self, entry: DecisionLogEntry) -> Result<(), AuditError> {
        let mut state = self.state.lock().map_err(|_| AuditError::Poisoned)?;
        if state.halted {
            return Err(AuditError::Halted);
        }
        let store_len = state.writer.acquire().map_err(|err| AuditError::Io(err.to_string()))?;
        let appended = state.append_held(entry, self.hash_chain, store_len);
        if let Err(err) = state.writer.release() {
            error!(error = %err, "decision log lock release failed");
        }
        appended
    }
}

/// Reads an existing log and returns the position after its last record.
///
/// Sequence numbers and `prev_hash` links are checked so that a log forked by
/// uncoordinated writers is refused rather than extended.
fn read_tail<R: BufRead>(reader: R) -> Result<ChainTail, AuditError> {
    let mut tail = ChainTail::default();
    for record in records(reader) {
        let record = record?;
        if record.sequence != tail.next_sequence {
            return Err(AuditError::ChainBroken {
                sequence: record.sequence,
                message: "unexpected sequence number".to_string(),
            });
        }
        if record.prev_hash.as_ref().is_some_and(|prev| *prev != tail.last_hash) {
            return Err(AuditError::ChainBroken {
                sequence: record.sequence,
                message: "prev_hash does not match previous record".to_string(),
            });
        }
        tail.next_sequence = record.sequence + 1;
        tail.last_timestamp = Some(record.entry.timestamp());
        if let Some(hash) = record.hash {
            tail.last_hash = hash;
        }
    }
    Ok(tail)
}

/// Iterates the parsed records of a JSONL log, skipping blank lines.
fn records<R: BufRead>(reader: R) -> impl Iterator<Item = Result<AuditRecord, AuditError>> {
    reader.lines().enumerate().filter_map(|(index, line)| {
        let line = match line {
            Ok(line) => line,
            Err(err) => return Some(Err(AuditError::Io(err.to_string()))),
        };
        if line.trim().is_empty() {
            return None;
        }
        Some(serde_json::from_str::<AuditRecord>(&line).map_err(|err| AuditError::Corrupt {
            line: index + 1,
            message: err.to_string(),
        }))
    })
}

// ============================================================================
// SECTION: Chain Verification
// ============================================================================

/// Summary of a verified log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    /// Number of verified records.
    pub records: u64,
    /// Hash of the last record, or the genesis hash for an empty log.
    pub last_hash: String,
}

/// Verifies sequence numbering and the hash chain of a JSONL log.
///
/// # Errors
///
/// Returns [`AuditError::ChainBroken`] for the first record whose sequence,
/// `prev_hash`, or `hash` does not verify, and [`AuditError::Corrupt`] or
/// [`AuditError::Io`] when the log cannot be read.
pub fn verify_chain<R: BufRead>(reader: R) -> Result<ChainReport, AuditError> {
    let mut expected_sequence = 1;
    let mut last_hash = GENESIS_HASH.to_string();
    for record in records(reader) {
        let record = record?;
        let broken = |message: &str| AuditError::ChainBroken {
            sequence: record.sequence,
            message: message.to_string(),
        };
        if record.sequence != expected_sequence {
            return Err(broken("unexpected sequence number"));
        }
        let (Some(prev_hash), Some(hash)) = (&record.prev_hash, &record.hash) else {
            return Err(broken("record is not hash-chained"));
        };
        if *prev_hash != last_hash {
            return Err(broken("prev_hash does not match previous record"));
        }
        if *hash != record_hash(prev_hash, record.sequence, &record.entry)? {
            return Err(broken("hash does not match record contents"));
        }
        last_hash.clone_from(hash);
        expected_sequence += 1;
    }
    Ok(ChainReport {
        records: expected_sequence - 1,
        last_hash,
    })
}

/// Verifies the log file at `path`. See [`verify_chain`].
///
/// # Errors
///
/// Returns [`AuditError`] when the file cannot be read or does not verify.
pub fn verify_chain_file(path: &Path) -> Result<ChainReport, AuditError> {
    let file = File::open(path).map_err(|err| AuditError::Io(err.to_string()))?;
    verify_chain(BufReader::new(file))
}

// ============================================================================
// SECTION: In-Memory Log
// ============================================================================

/// Shared in-memory decision log; clones observe the same entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLog {
    /// Appended entries in order.
    entries: Arc<Mutex<Vec<DecisionLogEntry>>>,
}

impl InMemoryAuditLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the appended entries.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Poisoned`] when a writer panicked mid-append.
    pub fn entries(&self) -> Result<Vec<DecisionLogEntry>, AuditError> {
        self.entries.lock().map(|entries| entries.clone()).map_err(|_| AuditError::Poisoned)
    }
}

impl AuditSink for InMemoryAuditLog {
    fn append(&self, entry: DecisionLogEntry) -> Result<(), AuditError> {
        let mut entries = self.entries.lock().map_err(|_| AuditError::Poisoned)?;
        let floor = entries.last().map(DecisionLogEntry::timestamp);
        entries.push(entry.stamped_after(floor));
        Ok(())
    }
}
