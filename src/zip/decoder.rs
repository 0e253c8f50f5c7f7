//! Push-driven ZIP decoder.
//!
//! ## Decoding Strategy
//!
//! A ZIP archive written front to back is a run of local file records
//! (header, name, extra field, compressed data), then the central directory,
//! then the end of central directory record. The decoder walks that layout
//! in stream order, one record at a time:
//!
//! 1. Read a 4-byte signature and pick the record kind
//! 2. Read the record's fixed fields
//! 3. Read its variable-length name, extra field and comment
//! 4. For file records, pass `compressed_size` payload bytes through
//!
//! Every step asks the [`ByteCursor`] for exactly the bytes it needs. If they
//! have not arrived yet the step is retried, unchanged, on the next `feed`.

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};
use std::io;
use std::mem;

use super::cursor::ByteCursor;
use super::error::DecodeError;
use super::event::{ArchiveEvent, EventQueue, EventSource};
use super::extra::parse_extra_fields;
use super::sink::EntryPayloadSink;
use super::structures::*;

/// Decoder configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Continue into the central directory and end record, and decode DOS
    /// timestamps and extra fields. When off, decoding stops at the first
    /// central directory record.
    pub extended: bool,
}

impl DecoderOptions {
    pub fn extended() -> Self {
        Self { extended: true }
    }
}

/// Push side of a byte stream consumer.
pub trait ChunkSink {
    /// Append a chunk of input and process as much as possible.
    fn feed(&mut self, chunk: Vec<u8>);

    /// Signal that no more input will arrive.
    fn finish(&mut self);
}

/// The file entry whose payload is streaming.
#[derive(Debug)]
struct ActiveEntry {
    offset: u64,
    file_name: String,
    has_data_descriptor: bool,
    sink: EntryPayloadSink,
}

#[derive(Debug)]
enum State {
    /// Waiting for the next record signature
    Ready,
    FileHeader { offset: u64 },
    FileHeaderExtra(LocalFileHeader),
    FileData(ActiveEntry),
    CentralDirectory { offset: u64 },
    CentralDirectoryExtra(CentralDirectoryRecord),
    EndRecord { offset: u64 },
    EndRecordComment(EndOfCentralDirectoryRecord),
    /// The end record has been decoded
    Terminal,
    /// Decoding stopped; remaining input is ignored
    Skip,
}

enum Step {
    /// Moved to a new state, keep going
    Advance(State),
    /// The current state needs more input
    Suspend(State),
    /// No further progress is possible
    Halt(State),
}

/// Incremental ZIP decoder fed with arbitrary byte chunks.
///
/// ## Example
///
/// ```
/// use zipstream::{ArchiveEvent, DecoderOptions, ZipStreamDecoder};
///
/// let mut decoder = ZipStreamDecoder::new(DecoderOptions::default());
/// decoder.feed(&b"PK\x05\x06"[..]);
/// decoder.finish();
///
/// assert_eq!(decoder.next_event(), Some(ArchiveEvent::Finished));
/// ```
#[derive(Debug)]
pub struct ZipStreamDecoder {
    options: DecoderOptions,
    cursor: ByteCursor,
    state: State,
    events: EventQueue,
    finished_published: bool,
}

impl Default for ZipStreamDecoder {
    fn default() -> Self {
        Self::new(DecoderOptions::default())
    }
}

impl ZipStreamDecoder {
    pub fn new(options: DecoderOptions) -> Self {
        Self {
            options,
            cursor: ByteCursor::new(),
            state: State::Ready,
            events: EventQueue::default(),
            finished_published: false,
        }
    }

    pub fn options(&self) -> DecoderOptions {
        self.options
    }

    /// Append a chunk of input and decode as far as it allows.
    ///
    /// Input that arrives after decoding has stopped, or after
    /// [`finish`](Self::finish), is dropped.
    pub fn feed(&mut self, chunk: impl Into<Vec<u8>>) {
        let chunk = chunk.into();
        if chunk.is_empty() {
            return;
        }
        if self.is_done() || self.cursor.is_finished() {
            debug!("ignoring {} bytes after decoding stopped", chunk.len());
            return;
        }
        self.cursor.push(chunk);
        self.drive();
    }

    /// Signal end of input. A read still pending at this point is reported
    /// as [`DecodeError::TruncatedInput`].
    pub fn finish(&mut self) {
        if self.cursor.is_finished() {
            return;
        }
        self.cursor.finish();
        self.drive();
    }

    pub fn next_event(&mut self) -> Option<ArchiveEvent> {
        self.events.pop()
    }

    /// Take every event published so far.
    pub fn drain_events(&mut self) -> impl Iterator<Item = ArchiveEvent> + '_ {
        self.events.drain()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Stream offset of the next byte the decoder will consume.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Whether decoding has stopped, successfully or not.
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Terminal | State::Skip)
    }

    fn drive(&mut self) {
        loop {
            let state = mem::replace(&mut self.state, State::Skip);
            match self.step(state) {
                Ok(Step::Advance(next)) => self.state = next,
                Ok(Step::Suspend(current)) | Ok(Step::Halt(current)) => {
                    self.state = current;
                    break;
                }
                Err(err) => {
                    self.fail(err);
                    break;
                }
            }
        }

        if self.is_done() && self.cursor.is_finished() {
            self.publish_finished();
        }
    }

    fn step(&mut self, state: State) -> Result<Step, DecodeError> {
        match state {
            State::Ready => self.read_signature(),
            State::FileHeader { offset } => self.read_file_header(offset),
            State::FileHeaderExtra(header) => self.read_file_header_extra(header),
            State::FileData(entry) => self.stream_file_data(entry),
            State::CentralDirectory { offset } => self.read_central_directory(offset),
            State::CentralDirectoryExtra(record) => self.read_central_directory_extra(record),
            State::EndRecord { offset } => self.read_end_record(offset),
            State::EndRecordComment(record) => self.read_end_record_comment(record),
            State::Terminal => Ok(Step::Halt(State::Terminal)),
            State::Skip => Ok(Step::Halt(State::Skip)),
        }
    }

    fn read_signature(&mut self) -> Result<Step, DecodeError> {
        let offset = self.cursor.position();
        if self.cursor.is_finished() && self.cursor.buffered() == 0 {
            debug!("input ended after a complete record at offset {offset}");
            return Ok(Step::Halt(self.terminate(State::Terminal)));
        }

        let Some(bytes) = self.cursor.try_read_array::<SIGNATURE_SIZE>()? else {
            return Ok(Step::Suspend(State::Ready));
        };

        match LittleEndian::read_u32(&bytes) {
            LFH_SIGNATURE => Ok(Step::Advance(State::FileHeader { offset })),
            CDFH_SIGNATURE
            | EOCD_SIGNATURE
            | ZIP64_EOCD_SIGNATURE
            | ZIP64_EOCD_LOCATOR_SIGNATURE
                if !self.options.extended =>
            {
                debug!("file entries end at offset {offset}");
                Ok(Step::Halt(self.terminate(State::Skip)))
            }
            CDFH_SIGNATURE => Ok(Step::Advance(State::CentralDirectory { offset })),
            EOCD_SIGNATURE => Ok(Step::Advance(State::EndRecord { offset })),
            ZIP64_EOCD_SIGNATURE | ZIP64_EOCD_LOCATOR_SIGNATURE => {
                Err(DecodeError::Zip64Unsupported {
                    record: "ZIP64 end of central directory",
                    offset,
                })
            }
            signature => Err(DecodeError::UnknownSignature { signature, offset }),
        }
    }

    fn read_file_header(&mut self, offset: u64) -> Result<Step, DecodeError> {
        let Some(body) = self.cursor.try_read_array::<LFH_BODY_SIZE>()? else {
            return Ok(Step::Suspend(State::FileHeader { offset }));
        };

        let mut header = LocalFileHeader::from_bytes(&body, offset);
        if header.is_zip64() {
            return Err(DecodeError::Zip64Unsupported {
                record: "local file header",
                offset,
            });
        }
        if self.options.extended {
            header.modified = Some(DosDateTime::from_raw(
                header.last_mod_date,
                header.last_mod_time,
            ));
        }

        Ok(Step::Advance(State::FileHeaderExtra(header)))
    }

    fn read_file_header_extra(&mut self, mut header: LocalFileHeader) -> Result<Step, DecodeError> {
        let name_len = usize::from(header.file_name_length);
        let mut problems = Vec::new();

        if self.options.extended {
            header.extra_fields = Some(Vec::new());
        }
        if header.variable_data_size() > 0 {
            let Some(region) = self.cursor.try_read(header.variable_data_size())? else {
                return Ok(Step::Suspend(State::FileHeaderExtra(header)));
            };
            let (name, extra) = region.split_at(name_len);
            header.file_name = String::from_utf8_lossy(name).into_owned();
            if self.options.extended {
                let list = parse_extra_fields(extra);
                header.extra_fields = Some(list.entries);
                problems = list.problems;
            }
        }

        let offset = header.position.offset;
        self.report_extra_field_problems(offset, problems);

        debug!(
            "file entry {:?} at offset {}: {} bytes {}",
            header.file_name, offset, header.compressed_size, header.compression_method
        );

        let entry = ActiveEntry {
            offset,
            file_name: header.file_name.clone(),
            has_data_descriptor: header.has_data_descriptor,
            sink: EntryPayloadSink::open(u64::from(header.compressed_size)),
        };
        self.events.publish(ArchiveEvent::FileEntry(header));

        Ok(Step::Advance(State::FileData(entry)))
    }

    fn stream_file_data(&mut self, mut entry: ActiveEntry) -> Result<Step, DecodeError> {
        // Finding the end of a deferred-size entry would mean scanning for
        // the descriptor signature inside compressed data.
        if entry.has_data_descriptor {
            return Err(DecodeError::DataDescriptorUnsupported {
                file_name: entry.file_name,
                offset: entry.offset,
            });
        }

        let remaining = entry.sink.remaining();
        if remaining > 0 {
            let max = usize::try_from(remaining).unwrap_or(usize::MAX);
            match self.cursor.take_contiguous(max) {
                Some(fragment) => entry.sink.deliver(fragment, &mut self.events),
                None if self.cursor.is_finished() => {
                    return Err(DecodeError::TruncatedInput {
                        offset: self.cursor.position(),
                        needed: remaining,
                        available: 0,
                    });
                }
                None => return Ok(Step::Suspend(State::FileData(entry))),
            }
        }

        if entry.sink.remaining() > 0 {
            return Ok(Step::Advance(State::FileData(entry)));
        }

        entry.sink.close(&mut self.events);
        Ok(Step::Advance(State::Ready))
    }

    fn read_central_directory(&mut self, offset: u64) -> Result<Step, DecodeError> {
        let Some(body) = self.cursor.try_read_array::<CDFH_BODY_SIZE>()? else {
            return Ok(Step::Suspend(State::CentralDirectory { offset }));
        };

        let record = CentralDirectoryRecord::from_bytes(&body, offset);
        if record.is_zip64() {
            return Err(DecodeError::Zip64Unsupported {
                record: "central directory record",
                offset,
            });
        }

        Ok(Step::Advance(State::CentralDirectoryExtra(record)))
    }

    fn read_central_directory_extra(
        &mut self,
        mut record: CentralDirectoryRecord,
    ) -> Result<Step, DecodeError> {
        let name_len = usize::from(record.file_name_length);
        let extra_len = usize::from(record.extra_field_length);
        let mut problems = Vec::new();

        if record.variable_data_size() > 0 {
            let Some(region) = self.cursor.try_read(record.variable_data_size())? else {
                return Ok(Step::Suspend(State::CentralDirectoryExtra(record)));
            };
            let (name, rest) = region.split_at(name_len);
            let (extra, comment) = rest.split_at(extra_len);
            record.file_name = String::from_utf8_lossy(name).into_owned();
            record.file_comment = String::from_utf8_lossy(comment).into_owned();
            let list = parse_extra_fields(extra);
            record.extra_fields = list.entries;
            problems = list.problems;
        }

        self.report_extra_field_problems(record.offset, problems);

        debug!(
            "central directory entry {:?} at offset {}",
            record.file_name, record.offset
        );
        self.events
            .publish(ArchiveEvent::CentralDirectoryEntry(record));

        Ok(Step::Advance(State::Ready))
    }

    fn read_end_record(&mut self, offset: u64) -> Result<Step, DecodeError> {
        let Some(body) = self.cursor.try_read_array::<EOCD_BODY_SIZE>()? else {
            return Ok(Step::Suspend(State::EndRecord { offset }));
        };

        let record = EndOfCentralDirectoryRecord::from_bytes(&body, offset);
        if record.is_zip64() {
            return Err(DecodeError::Zip64Unsupported {
                record: "end of central directory",
                offset,
            });
        }

        Ok(Step::Advance(State::EndRecordComment(record)))
    }

    fn read_end_record_comment(
        &mut self,
        mut record: EndOfCentralDirectoryRecord,
    ) -> Result<Step, DecodeError> {
        if record.comment_len > 0 {
            let Some(comment) = self.cursor.try_read(usize::from(record.comment_len))? else {
                return Ok(Step::Suspend(State::EndRecordComment(record)));
            };
            record.comment = String::from_utf8_lossy(&comment).into_owned();
        }

        debug!(
            "end of central directory at offset {}: {} entries",
            record.offset, record.total_entries
        );
        self.events.publish(ArchiveEvent::EndOfArchive(record));

        Ok(Step::Halt(self.terminate(State::Terminal)))
    }

    fn report_extra_field_problems(&mut self, offset: u64, problems: Vec<String>) {
        for detail in problems {
            let err = DecodeError::MalformedExtraField { offset, detail };
            warn!("{err}");
            self.events.publish(ArchiveEvent::Error(err));
        }
    }

    /// Stop decoding cleanly and drop whatever input is left.
    fn terminate(&mut self, state: State) -> State {
        self.cursor.discard();
        self.publish_finished();
        state
    }

    fn fail(&mut self, err: DecodeError) {
        warn!("{err}; ignoring the rest of the input");
        self.events.publish(ArchiveEvent::Error(err));
        self.cursor.discard();
        self.state = State::Skip;
    }

    fn publish_finished(&mut self) {
        if !self.finished_published {
            self.finished_published = true;
            self.events.publish(ArchiveEvent::Finished);
        }
    }
}

impl ChunkSink for ZipStreamDecoder {
    fn feed(&mut self, chunk: Vec<u8>) {
        ZipStreamDecoder::feed(self, chunk);
    }

    fn finish(&mut self) {
        ZipStreamDecoder::finish(self);
    }
}

impl EventSource for ZipStreamDecoder {
    fn next_event(&mut self) -> Option<ArchiveEvent> {
        ZipStreamDecoder::next_event(self)
    }
}

/// Lets blocking readers be copied straight into the decoder with
/// [`std::io::copy`]. Writes never fail.
impl io::Write for ZipStreamDecoder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ZipStreamDecoder::feed(self, buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Local file record with no extra field.
    fn local_record(name: &str, flags: u16, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&LFH_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(&flags.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(data);
        out
    }

    fn collect(decoder: &mut ZipStreamDecoder) -> Vec<ArchiveEvent> {
        decoder.drain_events().collect()
    }

    #[test]
    fn suspends_inside_signature() {
        let record = local_record("a", 0, b"x");
        let mut decoder = ZipStreamDecoder::default();

        decoder.feed(&record[..2]);
        assert_eq!(decoder.pending_events(), 0);
        assert_eq!(decoder.position(), 0);

        decoder.feed(&record[2..]);
        let events = collect(&mut decoder);
        assert!(matches!(&events[0], ArchiveEvent::FileEntry(h) if h.file_name == "a"));
        assert_eq!(events[1], ArchiveEvent::Payload(b"x".to_vec()));
        assert_eq!(events[2], ArchiveEvent::PayloadEnd);
    }

    #[test]
    fn empty_feed_is_a_no_op() {
        let record = local_record("a", 0, b"xyz");
        let mut decoder = ZipStreamDecoder::default();
        decoder.feed(&record[..10]);
        let position = decoder.position();

        decoder.feed(Vec::new());
        decoder.feed(&b""[..]);

        assert_eq!(decoder.pending_events(), 0);
        assert_eq!(decoder.position(), position);
    }

    #[test]
    fn zero_length_entry_closes_immediately() {
        let mut decoder = ZipStreamDecoder::default();
        decoder.feed(local_record("empty", 0, b""));

        let events = collect(&mut decoder);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], ArchiveEvent::PayloadEnd);
    }

    #[test]
    fn unknown_signature_skips_the_rest() {
        let mut decoder = ZipStreamDecoder::default();
        decoder.feed(&b"ABCDEFGH"[..]);

        assert_eq!(
            collect(&mut decoder),
            vec![ArchiveEvent::Error(DecodeError::UnknownSignature {
                signature: 0x44434241,
                offset: 0,
            })]
        );
        assert!(decoder.is_done());

        decoder.feed(local_record("late", 0, b"data"));
        assert_eq!(decoder.pending_events(), 0);

        decoder.finish();
        assert_eq!(collect(&mut decoder), vec![ArchiveEvent::Finished]);
    }

    #[test]
    fn finish_mid_payload_reports_truncation() {
        let record = local_record("a", 0, b"hello");
        let mut decoder = ZipStreamDecoder::default();
        decoder.feed(&record[..record.len() - 2]);
        decoder.finish();

        let events = collect(&mut decoder);
        let n = events.len();
        assert_eq!(events[n - 3], ArchiveEvent::Payload(b"hel".to_vec()));
        assert_eq!(
            events[n - 2],
            ArchiveEvent::Error(DecodeError::TruncatedInput {
                offset: record.len() as u64 - 2,
                needed: 2,
                available: 0,
            })
        );
        assert_eq!(events[n - 1], ArchiveEvent::Finished);
    }

    #[test]
    fn finish_inside_header_reports_truncation() {
        let record = local_record("a", 0, b"hello");
        let mut decoder = ZipStreamDecoder::default();
        decoder.feed(&record[..10]);
        decoder.finish();

        assert_eq!(
            collect(&mut decoder),
            vec![
                ArchiveEvent::Error(DecodeError::TruncatedInput {
                    offset: 4,
                    needed: LFH_BODY_SIZE as u64,
                    available: 6,
                }),
                ArchiveEvent::Finished,
            ]
        );
    }

    #[test]
    fn clean_end_after_entries() {
        let mut decoder = ZipStreamDecoder::default();
        decoder.feed(local_record("a", 0, b"1"));
        decoder.finish();
        decoder.finish();

        let events = collect(&mut decoder);
        assert_eq!(events.last(), Some(&ArchiveEvent::Finished));
        assert_eq!(
            events.iter().filter(|e| **e == ArchiveEvent::Finished).count(),
            1
        );
    }

    #[test]
    fn central_directory_ends_streaming_mode() {
        let mut input = local_record("a", 0, b"1");
        input.extend_from_slice(&CDFH_SIGNATURE.to_le_bytes());
        input.extend_from_slice(&[0u8; 10]);

        let mut decoder = ZipStreamDecoder::default();
        decoder.feed(input);

        let events = collect(&mut decoder);
        assert_eq!(events.last(), Some(&ArchiveEvent::Finished));
        assert!(decoder.is_done());
    }

    #[test]
    fn data_descriptor_entries_are_rejected() {
        let mut decoder = ZipStreamDecoder::default();
        let mut input = local_record("streamed", 0x0008, b"");
        input.extend(local_record("next", 0, b"abc"));
        decoder.feed(input);

        let events = collect(&mut decoder);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], ArchiveEvent::FileEntry(h) if h.has_data_descriptor));
        assert_eq!(
            events[1],
            ArchiveEvent::Error(DecodeError::DataDescriptorUnsupported {
                file_name: "streamed".to_string(),
                offset: 0,
            })
        );
    }

    #[test]
    fn zip64_sizes_are_rejected() {
        let mut record = local_record("big", 0, b"");
        record[18..22].copy_from_slice(&u32::MAX.to_le_bytes());

        let mut decoder = ZipStreamDecoder::default();
        decoder.feed(record);

        assert_eq!(
            collect(&mut decoder),
            vec![ArchiveEvent::Error(DecodeError::Zip64Unsupported {
                record: "local file header",
                offset: 0,
            })]
        );
    }

    #[test]
    fn streaming_mode_skips_timestamps_and_extra_fields() {
        let mut decoder = ZipStreamDecoder::default();
        decoder.feed(local_record("a", 0, b""));

        match decoder.next_event() {
            Some(ArchiveEvent::FileEntry(header)) => {
                assert_eq!(header.modified, None);
                assert_eq!(header.extra_fields, None);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn io_write_feeds_the_decoder() {
        use std::io::Write;

        let record = local_record("w", 0, b"data");
        let mut decoder = ZipStreamDecoder::default();
        decoder.write_all(&record).unwrap();

        assert_eq!(decoder.pending_events(), 3);
    }
}
