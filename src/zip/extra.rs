//! Extra field sub-records.
//!
//! An extra field is a sequence of `id(2) length(2) payload(length)`
//! records. Two Info-ZIP kinds are decoded, everything else is carried as
//! opaque bytes. See <https://libzip.org/specifications/extrafld.txt>.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// Info-ZIP extended timestamp ("UT")
pub const EXTENDED_TIMESTAMP_ID: u16 = 0x5455;
/// Info-ZIP Unix UID/GID, version 3 ("ux")
pub const UNIX_OWNER_ID: u16 = 0x7875;

/// One extra field sub-record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraFieldEntry {
    pub id: u16,
    /// Declared payload length
    pub length: u16,
    pub data: ExtraFieldData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraFieldData {
    ExtendedTimestamp(ExtendedTimestamp),
    UnixOwner(UnixOwner),
    /// Payload of a kind that is not decoded, or failed to decode
    Opaque(Vec<u8>),
    /// Bytes left over at the end of the region that do not form a
    /// complete sub-record
    Truncated(Vec<u8>),
}

/// Unix timestamps in seconds since the epoch. Only the fields flagged in
/// `flags` are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtendedTimestamp {
    pub flags: u8,
    pub mtime: Option<u32>,
    pub atime: Option<u32>,
    pub ctime: Option<u32>,
}

impl ExtendedTimestamp {
    const MTIME: u8 = 0b001;
    const ATIME: u8 = 0b010;
    const CTIME: u8 = 0b100;

    /// A flagged field with no bytes left is treated as absent: central
    /// directory copies keep the local flags but only store the mtime.
    pub fn parse(payload: &[u8]) -> Result<Self, String> {
        let mut cursor = Cursor::new(payload);
        let flags = cursor
            .read_u8()
            .map_err(|_| "extended timestamp has no flags byte".to_string())?;

        let mut read_if = |bit: u8| {
            if flags & bit != 0 {
                cursor.read_u32::<LittleEndian>().ok()
            } else {
                None
            }
        };

        Ok(Self {
            flags,
            mtime: read_if(Self::MTIME),
            atime: read_if(Self::ATIME),
            ctime: read_if(Self::CTIME),
        })
    }
}

/// Unix owner ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnixOwner {
    pub version: u8,
    pub uid: u64,
    pub gid: u64,
}

impl UnixOwner {
    pub fn parse(payload: &[u8]) -> Result<Self, String> {
        let mut cursor = Cursor::new(payload);
        let truncated = |_| "unix owner field is truncated".to_string();

        let version = cursor.read_u8().map_err(truncated)?;
        let uid_size = cursor.read_u8().map_err(truncated)?;
        let uid = read_sized_id(&mut cursor, uid_size, "uid")?;
        let gid_size = cursor.read_u8().map_err(truncated)?;
        let gid = read_sized_id(&mut cursor, gid_size, "gid")?;

        Ok(Self { version, uid, gid })
    }
}

fn read_sized_id(cursor: &mut Cursor<&[u8]>, size: u8, what: &str) -> Result<u64, String> {
    let value = match size {
        1 => cursor.read_u8().map(u64::from),
        2 => cursor.read_u16::<LittleEndian>().map(u64::from),
        4 => cursor.read_u32::<LittleEndian>().map(u64::from),
        8 => cursor.read_u64::<LittleEndian>(),
        other => return Err(format!("unsupported {what} width of {other} bytes")),
    };
    value.map_err(|_| format!("{what} of {size} bytes is truncated"))
}

/// The outcome of splitting an extra field region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraFieldList {
    pub entries: Vec<ExtraFieldEntry>,
    /// One description per malformed sub-record; decoding went on past each
    pub problems: Vec<String>,
}

/// Split an extra field region into sub-records and decode the known kinds.
pub fn parse_extra_fields(data: &[u8]) -> ExtraFieldList {
    let mut list = ExtraFieldList::default();
    let mut rest = data;

    while !rest.is_empty() {
        let [id_low, id_high, len_low, len_high, tail @ ..] = rest else {
            list.problems.push(format!(
                "{} trailing bytes do not form a sub-record header",
                rest.len()
            ));
            let id = match rest {
                [low, high, ..] => u16::from_le_bytes([*low, *high]),
                _ => 0,
            };
            list.entries.push(ExtraFieldEntry {
                id,
                length: rest.len() as u16,
                data: ExtraFieldData::Truncated(rest.to_vec()),
            });
            break;
        };

        let id = u16::from_le_bytes([*id_low, *id_high]);
        let length = u16::from_le_bytes([*len_low, *len_high]);

        if usize::from(length) > tail.len() {
            list.problems.push(format!(
                "sub-record {id:#06x} declares {length} bytes but only {} remain",
                tail.len()
            ));
            list.entries.push(ExtraFieldEntry {
                id,
                length,
                data: ExtraFieldData::Truncated(tail.to_vec()),
            });
            break;
        }

        let (payload, next) = tail.split_at(usize::from(length));
        let decoded = match id {
            EXTENDED_TIMESTAMP_ID => {
                ExtendedTimestamp::parse(payload).map(ExtraFieldData::ExtendedTimestamp)
            }
            UNIX_OWNER_ID => UnixOwner::parse(payload).map(ExtraFieldData::UnixOwner),
            _ => Ok(ExtraFieldData::Opaque(payload.to_vec())),
        };
        let data = decoded.unwrap_or_else(|problem| {
            list.problems.push(format!("sub-record {id:#06x}: {problem}"));
            ExtraFieldData::Opaque(payload.to_vec())
        });

        list.entries.push(ExtraFieldEntry { id, length, data });
        rest = next;
    }

    list
}
