use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

use super::extra::ExtraFieldEntry;

/// Local File Header (LFH) signature, `PK\x03\x04`
pub const LFH_SIGNATURE: u32 = 0x04034b50;
/// Central Directory File Header (CDFH) signature, `PK\x01\x02`
pub const CDFH_SIGNATURE: u32 = 0x02014b50;
/// End of Central Directory (EOCD) signature, `PK\x05\x06`
pub const EOCD_SIGNATURE: u32 = 0x06054b50;
/// ZIP64 End of Central Directory signature, `PK\x06\x06`
pub const ZIP64_EOCD_SIGNATURE: u32 = 0x06064b50;
/// ZIP64 End of Central Directory Locator signature, `PK\x06\x07`
pub const ZIP64_EOCD_LOCATOR_SIGNATURE: u32 = 0x07064b50;

/// Length of every record signature
pub const SIGNATURE_SIZE: usize = 4;
/// Fixed part of the LFH after its signature
pub const LFH_BODY_SIZE: usize = 26;
/// Local File Header including the signature - 30 bytes
pub const LFH_SIZE: usize = SIGNATURE_SIZE + LFH_BODY_SIZE;
/// Fixed part of the CDFH after its signature
pub const CDFH_BODY_SIZE: usize = 42;
/// Fixed part of the EOCD after its signature
pub const EOCD_BODY_SIZE: usize = 18;

/// General purpose flag: sizes and CRC follow the data in a data descriptor
const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Shrink,
    /// Reduce with compression factor 1 to 4
    Reduce(u8),
    Implode,
    Deflate,
    /// Deflate64
    DeflateEnhanced,
    Bzip2,
    Lzma,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            1 => CompressionMethod::Shrink,
            2..=5 => CompressionMethod::Reduce((value - 1) as u8),
            6 => CompressionMethod::Implode,
            8 => CompressionMethod::Deflate,
            9 => CompressionMethod::DeflateEnhanced,
            12 => CompressionMethod::Bzip2,
            // APPNOTE assigns 14 to LZMA; some writers use 13
            13 | 14 => CompressionMethod::Lzma,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CompressionMethod::Stored => "stored",
            CompressionMethod::Shrink => "shrink",
            CompressionMethod::Reduce(1) => "reduce-1",
            CompressionMethod::Reduce(2) => "reduce-2",
            CompressionMethod::Reduce(3) => "reduce-3",
            CompressionMethod::Reduce(_) => "reduce-4",
            CompressionMethod::Implode => "implode",
            CompressionMethod::Deflate => "deflate",
            CompressionMethod::DeflateEnhanced => "deflate-enhanced",
            CompressionMethod::Bzip2 => "bzip2",
            CompressionMethod::Lzma => "lzma",
            CompressionMethod::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Calendar fields of a packed MS-DOS date and time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    /// Always even: DOS time has a 2-second resolution
    pub second: u8,
}

impl DosDateTime {
    pub fn from_raw(date: u16, time: u16) -> Self {
        Self {
            year: ((date >> 9) & 0x7F) + 1980,
            month: ((date >> 5) & 0x0F) as u8,
            day: (date & 0x1F) as u8,
            hour: ((time >> 11) & 0x1F) as u8,
            minute: ((time >> 5) & 0x3F) as u8,
            second: ((time & 0x1F) * 2) as u8,
        }
    }
}

impl fmt::Display for DosDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Where a local file record sits in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPosition {
    /// Offset of the record's signature
    pub offset: u64,
    /// Signature, fixed fields, file name and extra field
    pub header_size: u64,
    /// `header_size` plus the compressed payload
    pub length: u64,
}

impl EntryPosition {
    /// Offset of the first payload byte.
    pub fn data_offset(&self) -> u64 {
        self.offset + self.header_size
    }

    /// Offset just past the payload.
    pub fn end_offset(&self) -> u64 {
        self.offset + self.length
    }
}

/// A decoded Local File Header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    /// Raw method id as stored in the header
    pub compression_method_id: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    /// Decoded `last_mod_date`/`last_mod_time`, only in extended mode
    pub modified: Option<DosDateTime>,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
    /// Bit 3 of `flags`
    pub has_data_descriptor: bool,
    pub file_name: String,
    /// Decoded extra fields, only in extended mode
    pub extra_fields: Option<Vec<ExtraFieldEntry>>,
    pub position: EntryPosition,
}

impl LocalFileHeader {
    /// Decode the fixed fields that follow the signature. The name and
    /// extra fields are filled in once their bytes arrive.
    pub fn from_bytes(data: &[u8; LFH_BODY_SIZE], offset: u64) -> Self {
        let flags = LittleEndian::read_u16(&data[2..4]);
        let compression_method_id = LittleEndian::read_u16(&data[4..6]);
        let compressed_size = LittleEndian::read_u32(&data[14..18]);
        let file_name_length = LittleEndian::read_u16(&data[22..24]);
        let extra_field_length = LittleEndian::read_u16(&data[24..26]);

        let header_size =
            LFH_SIZE as u64 + u64::from(file_name_length) + u64::from(extra_field_length);

        Self {
            version_needed: LittleEndian::read_u16(&data[0..2]),
            flags,
            compression_method: CompressionMethod::from_u16(compression_method_id),
            compression_method_id,
            last_mod_time: LittleEndian::read_u16(&data[6..8]),
            last_mod_date: LittleEndian::read_u16(&data[8..10]),
            modified: None,
            crc32: LittleEndian::read_u32(&data[10..14]),
            compressed_size,
            uncompressed_size: LittleEndian::read_u32(&data[18..22]),
            file_name_length,
            extra_field_length,
            has_data_descriptor: flags & FLAG_DATA_DESCRIPTOR != 0,
            file_name: String::new(),
            extra_fields: None,
            position: EntryPosition {
                offset,
                header_size,
                length: header_size + u64::from(compressed_size),
            },
        }
    }

    /// Length of the file name plus extra field that follow the fixed fields.
    pub fn variable_data_size(&self) -> usize {
        usize::from(self.file_name_length) + usize::from(self.extra_field_length)
    }

    /// Sizes are deferred to a ZIP64 extra field.
    pub fn is_zip64(&self) -> bool {
        self.compressed_size == 0xFFFFFFFF || self.uncompressed_size == 0xFFFFFFFF
    }

    /// Directory entries end with '/'
    pub fn is_directory(&self) -> bool {
        self.file_name.ends_with('/')
    }

    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let dt = DosDateTime::from_raw(self.last_mod_date, self.last_mod_time);
        (dt.year, dt.month, dt.day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let dt = DosDateTime::from_raw(self.last_mod_date, self.last_mod_time);
        (dt.hour, dt.minute, dt.second)
    }
}

/// A decoded Central Directory File Header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryRecord {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub compression_method_id: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub modified: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
    pub file_comment_length: u16,
    /// Disk on which the entry's local header starts
    pub disk_number: u16,
    pub internal_attributes: u16,
    pub external_attributes: u32,
    pub local_header_offset: u32,
    pub has_data_descriptor: bool,
    pub file_name: String,
    pub extra_fields: Vec<ExtraFieldEntry>,
    pub file_comment: String,
    /// Offset of this record's signature
    pub offset: u64,
}

impl CentralDirectoryRecord {
    pub fn from_bytes(data: &[u8; CDFH_BODY_SIZE], offset: u64) -> Self {
        let flags = LittleEndian::read_u16(&data[4..6]);
        let compression_method_id = LittleEndian::read_u16(&data[6..8]);
        let last_mod_time = LittleEndian::read_u16(&data[8..10]);
        let last_mod_date = LittleEndian::read_u16(&data[10..12]);

        Self {
            version_made_by: LittleEndian::read_u16(&data[0..2]),
            version_needed: LittleEndian::read_u16(&data[2..4]),
            flags,
            compression_method: CompressionMethod::from_u16(compression_method_id),
            compression_method_id,
            last_mod_time,
            last_mod_date,
            modified: DosDateTime::from_raw(last_mod_date, last_mod_time),
            crc32: LittleEndian::read_u32(&data[12..16]),
            compressed_size: LittleEndian::read_u32(&data[16..20]),
            uncompressed_size: LittleEndian::read_u32(&data[20..24]),
            file_name_length: LittleEndian::read_u16(&data[24..26]),
            extra_field_length: LittleEndian::read_u16(&data[26..28]),
            file_comment_length: LittleEndian::read_u16(&data[28..30]),
            disk_number: LittleEndian::read_u16(&data[30..32]),
            internal_attributes: LittleEndian::read_u16(&data[32..34]),
            external_attributes: LittleEndian::read_u32(&data[34..38]),
            local_header_offset: LittleEndian::read_u32(&data[38..42]),
            has_data_descriptor: flags & FLAG_DATA_DESCRIPTOR != 0,
            file_name: String::new(),
            extra_fields: Vec::new(),
            file_comment: String::new(),
            offset,
        }
    }

    /// Length of the file name, extra field and comment.
    pub fn variable_data_size(&self) -> usize {
        usize::from(self.file_name_length)
            + usize::from(self.extra_field_length)
            + usize::from(self.file_comment_length)
    }

    pub fn is_zip64(&self) -> bool {
        self.compressed_size == 0xFFFFFFFF
            || self.uncompressed_size == 0xFFFFFFFF
            || self.local_header_offset == 0xFFFFFFFF
            || self.disk_number == 0xFFFF
    }

    pub fn is_directory(&self) -> bool {
        self.file_name.ends_with('/')
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectoryRecord {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
    pub comment: String,
    /// Offset of this record's signature
    pub offset: u64,
}

impl EndOfCentralDirectoryRecord {
    pub fn from_bytes(data: &[u8; EOCD_BODY_SIZE], offset: u64) -> Self {
        Self {
            disk_number: LittleEndian::read_u16(&data[0..2]),
            disk_with_cd: LittleEndian::read_u16(&data[2..4]),
            disk_entries: LittleEndian::read_u16(&data[4..6]),
            total_entries: LittleEndian::read_u16(&data[6..8]),
            cd_size: LittleEndian::read_u32(&data[8..12]),
            cd_offset: LittleEndian::read_u32(&data[12..16]),
            comment_len: LittleEndian::read_u16(&data[16..18]),
            comment: String::new(),
            offset,
        }
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}
