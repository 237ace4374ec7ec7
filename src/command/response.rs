use crate::command::{CheckpointInfo, CommandType, DisplayBuffer, MemoryGet};
use crate::constants::STATUS_OK;
use crate::error::{MonitorError, ValidationError};
use crate::frame::RawResponse;
use crate::utils::ByteReader;

/// Version information reported by the emulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorInfo {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankInfo {
    pub id: u16,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterValue {
    pub id: u8,
    pub value: u16,
}

/// A successfully decoded response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Empty,
    Info(EmulatorInfo),
    Memory(Vec<u8>),
    Banks(Vec<BankInfo>),
    Registers(Vec<RegisterValue>),
    Checkpoint(CheckpointInfo),
    /// A checkpoint list, reassembled from its item frames. See
    /// [`encode_checkpoint_list`](Self::encode_checkpoint_list).
    Checkpoints(Vec<CheckpointInfo>),
    Display(DisplayBuffer),
}

impl Response {
    /// Encodes the body a monitor would send for this response.
    ///
    /// A checkpoint list is sent as one frame per checkpoint, so
    /// `Checkpoints` encodes only the final frame's count.
    pub fn encode_body(&self) -> Result<Vec<u8>, ValidationError> {
        let mut buf = Vec::new();

        match self {
            Response::Empty => {}
            Response::Info(info) => {
                buf.push(info.major);
                buf.push(info.minor);
                buf.push(info.patch);
                buf.extend(info.version.as_bytes());
                buf.push(0);
            }
            Response::Memory(data) => {
                // A full 64 KiB read does not fit the length field and is sent as 0.
                let len = match data.len() {
                    0 => return Err(ValidationError::InvalidRange("no memory data")),
                    0x10000 => 0,
                    len => fit::<u16>("memory data", len)?,
                };
                buf.extend(&len.to_le_bytes());
                buf.extend(data);
            }
            Response::Banks(banks) => {
                buf.extend(&fit::<u16>("bank list", banks.len())?.to_le_bytes());
                for bank in banks {
                    let name = bank.name.as_bytes();
                    let item_size = fit::<u8>("bank name", BANK_ITEM_FIXED_SIZE + name.len())?;
                    buf.push(item_size);
                    buf.extend(&bank.id.to_le_bytes());
                    buf.push(item_size - BANK_ITEM_FIXED_SIZE as u8);
                    buf.extend(name);
                }
            }
            Response::Registers(registers) => {
                encode_register_items(&mut buf, registers)?;
            }
            Response::Checkpoint(info) => info.encode_into(&mut buf),
            Response::Checkpoints(list) => {
                buf.extend(&fit::<u32>("checkpoint list", list.len())?.to_le_bytes());
            }
            Response::Display(display) => display.encode_into(&mut buf)?,
        }

        Ok(buf)
    }

    /// Encodes the frame bodies a monitor sends for a checkpoint list, items
    /// first and the closing count last.
    pub fn encode_checkpoint_list(
        list: &[CheckpointInfo],
    ) -> Result<(Vec<Vec<u8>>, Vec<u8>), ValidationError> {
        let items = list
            .iter()
            .map(|info| Response::Checkpoint(info.clone()).encode_body())
            .collect::<Result<Vec<_>, _>>()?;
        let end = Response::Checkpoints(list.to_vec()).encode_body()?;
        Ok((items, end))
    }
}

/// Narrows a length to the width of its wire field.
fn fit<T: TryFrom<usize>>(field: &'static str, len: usize) -> Result<T, ValidationError> {
    T::try_from(len).map_err(|_| ValidationError::Overflow { field, len })
}

/// Count-prefixed register items, shared by register reads and writes.
pub(crate) fn encode_register_items(
    buf: &mut Vec<u8>,
    registers: &[RegisterValue],
) -> Result<(), ValidationError> {
    buf.extend(&fit::<u16>("register list", registers.len())?.to_le_bytes());
    for register in registers {
        buf.push(REGISTER_ITEM_SIZE as u8);
        buf.push(register.id);
        buf.extend(&register.value.to_le_bytes());
    }
    Ok(())
}

impl EmulatorInfo {
    /// Decodes an `Info` response, status included.
    pub fn decode_response(response: &RawResponse) -> Result<Self, MonitorError> {
        check_status(CommandType::Info, response)?;
        decode_info(response)
    }
}

impl BankInfo {
    /// Decodes a `BanksAvailable` response, status included.
    pub fn decode_list_response(response: &RawResponse) -> Result<Vec<Self>, MonitorError> {
        check_status(CommandType::BanksAvailable, response)?;
        decode_banks(response)
    }
}

impl RegisterValue {
    /// Decodes a `RegistersGet` response, status included.
    pub fn decode_list_response(response: &RawResponse) -> Result<Vec<Self>, MonitorError> {
        check_status(CommandType::RegistersGet, response)?;
        decode_registers(response)
    }

    /// Decodes a `RegistersSet` response, which lists every register after
    /// the write.
    pub fn decode_set_response(response: &RawResponse) -> Result<Vec<Self>, MonitorError> {
        check_status(CommandType::RegistersSet, response)?;
        decode_registers(response)
    }
}

impl CheckpointInfo {
    /// Decodes a checkpoint get or set response, status included.
    pub fn decode_response(command: CommandType, response: &RawResponse) -> Result<Self, MonitorError> {
        check_status(command, response)?;
        decode_checkpoint(response)
    }

    /// Decodes the final frame of a `CheckpointList` reply, status included.
    pub fn decode_list_response(response: &RawResponse) -> Result<Vec<Self>, MonitorError> {
        check_status(CommandType::CheckpointList, response)?;
        decode_checkpoint_list(response)
    }
}

impl DisplayBuffer {
    /// Decodes a `DisplayGet` response, status included.
    pub fn decode_response(response: &RawResponse) -> Result<Self, MonitorError> {
        check_status(CommandType::DisplayGet, response)?;
        decode_display(response)
    }
}

impl MemoryGet {
    /// Decodes the response to this read, status included. The returned data
    /// is exactly [`expected_len`](Self::expected_len) bytes long.
    pub fn decode_response(&self, response: &RawResponse) -> Result<Vec<u8>, MonitorError> {
        check_status(CommandType::MemoryGet, response)?;
        decode_memory(self, response)
    }
}

// Bank item: u16 id + u8 name length, then the name.
const BANK_ITEM_FIXED_SIZE: usize = 3;
// Register item: u8 id + u16 value.
const REGISTER_ITEM_SIZE: usize = 3;

fn malformed(response: &RawResponse, reason: &'static str) -> MonitorError {
    MonitorError::MalformedResponseBody {
        response_type: response.response_type(),
        reason,
    }
}

pub(crate) fn check_status(command: CommandType, response: &RawResponse) -> Result<(), MonitorError> {
    if response.status() == STATUS_OK {
        return Ok(());
    }

    // The layout of error bodies is not established; they are only logged.
    tracing::debug!(
        ?command,
        status = response.status(),
        body_len = response.body.len(),
        "Monitor returned an error status"
    );

    Err(MonitorError::from_status(command, response.status()))
}

pub(crate) fn decode_empty(response: &RawResponse) -> Result<(), MonitorError> {
    if !response.body.is_empty() {
        return Err(malformed(response, "expected an empty body"));
    }
    Ok(())
}

pub(crate) fn decode_memory(get: &MemoryGet, response: &RawResponse) -> Result<Vec<u8>, MonitorError> {
    let mut reader = ByteReader::new(&response.body);

    let declared = reader
        .u16_le()
        .ok_or_else(|| malformed(response, "missing data length"))? as usize;

    let expected = get.expected_len();
    let declared = if declared == 0 && expected == 0x10000 {
        expected
    } else {
        declared
    };

    if reader.remaining() != declared {
        return Err(malformed(response, "data length disagrees with body size"));
    }

    if declared != expected {
        return Err(malformed(response, "data length does not match the requested range"));
    }

    Ok(reader.rest().to_vec())
}

pub(crate) fn decode_info(response: &RawResponse) -> Result<EmulatorInfo, MonitorError> {
    let mut reader = ByteReader::new(&response.body);
    let truncated = || malformed(response, "version header is truncated");

    let major = reader.u8().ok_or_else(truncated)?;
    let minor = reader.u8().ok_or_else(truncated)?;
    let patch = reader.u8().ok_or_else(truncated)?;

    let rest = reader.rest();
    let nul = rest
        .iter()
        .position(|b| *b == 0)
        .ok_or_else(|| malformed(response, "version string is not terminated"))?;

    if nul + 1 != rest.len() {
        return Err(malformed(response, "trailing bytes after version string"));
    }

    let version = String::from_utf8(rest[..nul].to_vec())
        .map_err(|_| malformed(response, "version string is not UTF-8"))?;

    Ok(EmulatorInfo {
        major,
        minor,
        patch,
        version,
    })
}

pub(crate) fn decode_banks(response: &RawResponse) -> Result<Vec<BankInfo>, MonitorError> {
    let mut reader = ByteReader::new(&response.body);
    let truncated = || malformed(response, "bank list is truncated");

    let count = reader.u16_le().ok_or_else(truncated)?;
    let mut banks = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let item_size = reader.u8().ok_or_else(truncated)? as usize;
        let mut item = ByteReader::new(reader.take(item_size).ok_or_else(truncated)?);

        let id = item.u16_le().ok_or_else(truncated)?;
        let name_len = item.u8().ok_or_else(truncated)? as usize;
        let name = item.take(name_len).ok_or_else(truncated)?;

        if !item.is_empty() {
            return Err(malformed(response, "bank item size disagrees with its name length"));
        }

        banks.push(BankInfo {
            id,
            name: String::from_utf8_lossy(name).into_owned(),
        });
    }

    if !reader.is_empty() {
        return Err(malformed(response, "trailing bytes after bank list"));
    }

    Ok(banks)
}

pub(crate) fn decode_checkpoint(response: &RawResponse) -> Result<CheckpointInfo, MonitorError> {
    let mut reader = ByteReader::new(&response.body);
    let info = CheckpointInfo::read(&mut reader)
        .ok_or_else(|| malformed(response, "checkpoint record is truncated or invalid"))?;

    if !reader.is_empty() {
        return Err(malformed(response, "trailing bytes after checkpoint record"));
    }

    Ok(info)
}

/// Decodes the final frame of a checkpoint list together with the item
/// frames the correlator gathered ahead of it.
pub(crate) fn decode_checkpoint_list(response: &RawResponse) -> Result<Vec<CheckpointInfo>, MonitorError> {
    let mut reader = ByteReader::new(&response.body);
    let count = reader
        .u32_le()
        .ok_or_else(|| malformed(response, "missing checkpoint count"))?;

    if !reader.is_empty() {
        return Err(malformed(response, "trailing bytes after checkpoint count"));
    }

    if count as usize != response.items.len() {
        return Err(malformed(response, "checkpoint count disagrees with the records received"));
    }

    response.items.iter().map(decode_checkpoint).collect()
}

pub(crate) fn decode_display(response: &RawResponse) -> Result<DisplayBuffer, MonitorError> {
    let mut reader = ByteReader::new(&response.body);

    let (mut display, pixels_len) = DisplayBuffer::read_header(&mut reader)
        .ok_or_else(|| malformed(response, "display header is truncated"))?;

    if reader.remaining() != pixels_len {
        return Err(malformed(response, "display buffer length disagrees with body size"));
    }

    display.pixels = reader.rest().to_vec();
    Ok(display)
}

pub(crate) fn decode_registers(response: &RawResponse) -> Result<Vec<RegisterValue>, MonitorError> {
    let mut reader = ByteReader::new(&response.body);
    let truncated = || malformed(response, "register list is truncated");

    let count = reader.u16_le().ok_or_else(truncated)?;
    let mut registers = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let item_size = reader.u8().ok_or_else(truncated)? as usize;
        if item_size < REGISTER_ITEM_SIZE {
            return Err(malformed(response, "register item is too small"));
        }

        // Items may grow in later protocol revisions; unknown tail bytes are skipped.
        let mut item = ByteReader::new(reader.take(item_size).ok_or_else(truncated)?);
        let id = item.u8().ok_or_else(truncated)?;
        let value = item.u16_le().ok_or_else(truncated)?;

        registers.push(RegisterValue { id, value });
    }

    if !reader.is_empty() {
        return Err(malformed(response, "trailing bytes after register list"));
    }

    Ok(registers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameHeader;

    fn response(kind: u8, body: Vec<u8>) -> RawResponse {
        RawResponse {
            header: FrameHeader {
                version: crate::constants::FRAME_API_VERSION,
                body_length: body.len() as u32,
                request_id: 7,
                kind,
                status: STATUS_OK,
            },
            body,
            items: Vec::new(),
        }
    }

    #[test]
    fn info_requires_terminator() {
        let raw = response(0x85, vec![3, 9, 0, b'3', b'.', b'9']);
        assert!(matches!(
            decode_info(&raw),
            Err(MonitorError::MalformedResponseBody { .. })
        ));
    }

    #[test]
    fn registers_skip_unknown_item_tail() {
        let raw = response(0x31, vec![1, 0, 4, 0x03, 0x34, 0x12, 0xee]);
        assert_eq!(
            decode_registers(&raw).unwrap(),
            vec![RegisterValue {
                id: 3,
                value: 0x1234
            }]
        );
    }

    #[test]
    fn oversized_fields_refuse_to_encode() {
        let long_name = Response::Banks(vec![BankInfo {
            id: 0,
            name: "x".repeat(253),
        }]);
        assert_eq!(
            long_name.encode_body(),
            Err(ValidationError::Overflow {
                field: "bank name",
                len: 256
            })
        );

        let longest_name = Response::Banks(vec![BankInfo {
            id: 0,
            name: "x".repeat(252),
        }]);
        let body = longest_name.encode_body().unwrap();
        assert_eq!(&body[2..6], &[255, 0, 0, 252]);

        assert_eq!(
            Response::Memory(vec![0; 0x10001]).encode_body(),
            Err(ValidationError::Overflow {
                field: "memory data",
                len: 0x10001
            })
        );
    }

    #[test]
    fn checkpoint_record_without_memspace_is_main_memory() {
        let mut body = vec![42, 0, 0, 0, 1, 0x00, 0x10, 0x00, 0x20, 1, 1, 0x02, 0];
        body.extend([5, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(body.len(), 22);

        let info = decode_checkpoint(&response(0x11, body)).unwrap();
        assert_eq!(info.number, 42);
        assert!(info.currently_hit);
        assert_eq!((info.start, info.end), (0x1000, 0x2000));
        assert_eq!(info.operation, crate::command::CpuOperation::Store);
        assert_eq!(info.hit_count, 5);
        assert_eq!(info.memspace, crate::command::Memspace::MainMemory);
    }

    #[test]
    fn memory_rejects_overrun() {
        let get = MemoryGet::new(0x1000, 0x1001);
        let raw = response(0x01, vec![2, 0, 0xaa, 0xbb, 0xcc]);
        assert!(decode_memory(&get, &raw).is_err());
    }
}
