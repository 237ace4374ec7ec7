use crate::command::response::{
    check_status, decode_banks, decode_checkpoint, decode_checkpoint_list, decode_display,
    decode_empty, decode_info, decode_memory, decode_registers, encode_register_items,
};
use crate::command::{
    CheckpointSet, CommandType, CpuOperation, DisplayFormat, Memspace, RegisterValue, ResetKind,
    Response,
};
use crate::error::{MonitorError, ValidationError};
use crate::frame::{FrameCodec, RawRequest, RawResponse};
use crate::utils::ByteReader;

/// Reads `start..=end` from one memory bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryGet {
    /// Allow the read to trigger I/O side effects on the emulated machine.
    pub side_effects: bool,
    pub start: u16,
    pub end: u16,
    pub memspace: Memspace,
    pub bank: u16,
}

impl MemoryGet {
    /// A side-effect free read of main memory, bank 0.
    pub fn new(start: u16, end: u16) -> Self {
        Self {
            side_effects: false,
            start,
            end,
            memspace: Memspace::MainMemory,
            bank: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.start > self.end {
            return Err(ValidationError::InvalidRange(
                "start address is past the end address",
            ));
        }
        Ok(())
    }

    /// Number of bytes the monitor must return; `1..=65536`.
    pub fn expected_len(&self) -> usize {
        (self.end as usize).saturating_sub(self.start as usize) + 1
    }
}

/// Writes `data` starting at `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySet {
    pub side_effects: bool,
    pub start: u16,
    pub memspace: Memspace,
    pub bank: u16,
    pub data: Vec<u8>,
}

impl MemorySet {
    pub fn new(start: u16, data: Vec<u8>) -> Self {
        Self {
            side_effects: false,
            start,
            memspace: Memspace::MainMemory,
            bank: 0,
            data,
        }
    }

    /// Inclusive end address implied by `start` and the data length.
    pub fn end(&self) -> Result<u16, ValidationError> {
        if self.data.is_empty() {
            return Err(ValidationError::InvalidRange("no data to write"));
        }

        let last = self.start as usize + self.data.len() - 1;
        u16::try_from(last).map_err(|_| {
            ValidationError::InvalidRange("data runs past the end of the address space")
        })
    }
}

/// Every request this client can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MemoryGet(MemoryGet),
    MemorySet(MemorySet),
    CheckpointGet {
        number: u32,
    },
    CheckpointSet(CheckpointSet),
    CheckpointDelete {
        number: u32,
    },
    /// Answered by one checkpoint frame per checkpoint, then a count.
    CheckpointList,
    CheckpointToggle {
        number: u32,
        enabled: bool,
    },
    RegistersGet {
        memspace: Memspace,
    },
    RegistersSet {
        memspace: Memspace,
        values: Vec<RegisterValue>,
    },
    AdvanceInstructions {
        step_over_subroutines: bool,
        count: u16,
    },
    /// PETSCII text typed into the keyboard buffer.
    KeyboardFeed {
        text: Vec<u8>,
    },
    ExecuteUntilReturn,
    Ping,
    BanksAvailable,
    /// Captures the screen of the VIC-II (or VIC/TED) when `use_vic` is
    /// set, otherwise the VDC.
    DisplayGet {
        use_vic: bool,
        format: DisplayFormat,
    },
    Info,
    /// Leave the monitor and resume emulation.
    Exit,
    Quit,
    Reset(ResetKind),
}

impl Command {
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::MemoryGet(_) => CommandType::MemoryGet,
            Command::MemorySet(_) => CommandType::MemorySet,
            Command::CheckpointGet { .. } => CommandType::CheckpointGet,
            Command::CheckpointSet(_) => CommandType::CheckpointSet,
            Command::CheckpointDelete { .. } => CommandType::CheckpointDelete,
            Command::CheckpointList => CommandType::CheckpointList,
            Command::CheckpointToggle { .. } => CommandType::CheckpointToggle,
            Command::RegistersGet { .. } => CommandType::RegistersGet,
            Command::RegistersSet { .. } => CommandType::RegistersSet,
            Command::AdvanceInstructions { .. } => CommandType::AdvanceInstructions,
            Command::KeyboardFeed { .. } => CommandType::KeyboardFeed,
            Command::ExecuteUntilReturn => CommandType::ExecuteUntilReturn,
            Command::Ping => CommandType::Ping,
            Command::BanksAvailable => CommandType::BanksAvailable,
            Command::DisplayGet { .. } => CommandType::DisplayGet,
            Command::Info => CommandType::Info,
            Command::Exit => CommandType::Exit,
            Command::Quit => CommandType::Quit,
            Command::Reset(_) => CommandType::Reset,
        }
    }

    /// Type byte the correlated response must carry. Most responses echo the
    /// command type; checkpoint and register writes answer with the record
    /// their read counterpart returns.
    pub fn expected_response_type(&self) -> u8 {
        match self {
            Command::CheckpointSet(_) => CommandType::CheckpointGet.into(),
            Command::RegistersSet { .. } => CommandType::RegistersGet.into(),
            _ => self.command_type().into(),
        }
    }

    /// Type byte of the item frames that precede the response, for commands
    /// answered with a list.
    pub fn item_response_type(&self) -> Option<u8> {
        match self {
            Command::CheckpointList => Some(CommandType::CheckpointGet.into()),
            _ => None,
        }
    }

    /// Rejects arguments that can never form a valid request.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Command::MemoryGet(get) => get.validate(),
            Command::MemorySet(set) => set.end().map(|_| ()),
            Command::CheckpointSet(set) => set.validate(),
            Command::RegistersSet { values, .. } if values.len() > u16::MAX as usize => {
                Err(ValidationError::Overflow {
                    field: "register list",
                    len: values.len(),
                })
            }
            Command::KeyboardFeed { text } if text.len() > u8::MAX as usize => {
                Err(ValidationError::TextTooLong(text.len()))
            }
            _ => Ok(()),
        }
    }

    /// Encodes the command-specific part of the request body.
    pub fn encode_payload(&self) -> Result<Vec<u8>, ValidationError> {
        self.validate()?;

        let mut buf = Vec::new();

        match self {
            Command::MemoryGet(get) => {
                buf.push(get.side_effects as u8);
                buf.extend(&get.start.to_le_bytes());
                buf.extend(&get.end.to_le_bytes());
                buf.push(get.memspace.into());
                buf.extend(&get.bank.to_le_bytes());
            }
            Command::MemorySet(set) => {
                let end = set.end()?;
                buf.reserve(8 + set.data.len());
                buf.push(set.side_effects as u8);
                buf.extend(&set.start.to_le_bytes());
                buf.extend(&end.to_le_bytes());
                buf.push(set.memspace.into());
                buf.extend(&set.bank.to_le_bytes());
                buf.extend(&set.data);
            }
            Command::CheckpointGet { number } | Command::CheckpointDelete { number } => {
                buf.extend(&number.to_le_bytes());
            }
            Command::CheckpointSet(set) => set.encode_into(&mut buf),
            Command::CheckpointToggle { number, enabled } => {
                buf.extend(&number.to_le_bytes());
                buf.push(*enabled as u8);
            }
            Command::RegistersGet { memspace } => {
                buf.push((*memspace).into());
            }
            Command::RegistersSet { memspace, values } => {
                buf.push((*memspace).into());
                encode_register_items(&mut buf, values)?;
            }
            Command::DisplayGet { use_vic, format } => {
                buf.push(*use_vic as u8);
                buf.push((*format).into());
            }
            Command::AdvanceInstructions {
                step_over_subroutines,
                count,
            } => {
                buf.push(*step_over_subroutines as u8);
                buf.extend(&count.to_le_bytes());
            }
            Command::KeyboardFeed { text } => {
                buf.push(text.len() as u8);
                buf.extend(text);
            }
            Command::Reset(kind) => {
                buf.push((*kind).into());
            }
            Command::CheckpointList
            | Command::ExecuteUntilReturn
            | Command::Ping
            | Command::BanksAvailable
            | Command::Info
            | Command::Exit
            | Command::Quit => {}
        }

        Ok(buf)
    }

    /// Encodes a complete request frame, header included.
    ///
    /// Validation happens first, so an invalid command never produces bytes.
    pub fn encode_frame(&self, request_id: u32) -> Result<Vec<u8>, ValidationError> {
        let payload = self.encode_payload()?;
        Ok(FrameCodec::encode(
            request_id,
            self.command_type().into(),
            &payload,
        ))
    }

    /// Inverse of [`encode_payload`](Self::encode_payload).
    pub fn decode_payload(command_type: u8, payload: &[u8]) -> Result<Command, MonitorError> {
        let malformed = |reason: &'static str| MonitorError::MalformedRequestBody {
            command_type,
            reason,
        };

        let kind = CommandType::try_from(command_type)
            .map_err(|_| malformed("unknown command type"))?;

        let mut reader = ByteReader::new(payload);
        let truncated = || malformed("payload is truncated");
        let parse_memspace =
            |byte: u8| Memspace::try_from(byte).map_err(|_| malformed("unknown memspace"));

        let command = match kind {
            CommandType::MemoryGet => {
                let side_effects = reader.u8().ok_or_else(truncated)? != 0;
                let start = reader.u16_le().ok_or_else(truncated)?;
                let end = reader.u16_le().ok_or_else(truncated)?;
                let memspace = parse_memspace(reader.u8().ok_or_else(truncated)?)?;
                let bank = reader.u16_le().ok_or_else(truncated)?;
                Command::MemoryGet(MemoryGet {
                    side_effects,
                    start,
                    end,
                    memspace,
                    bank,
                })
            }
            CommandType::MemorySet => {
                let side_effects = reader.u8().ok_or_else(truncated)? != 0;
                let start = reader.u16_le().ok_or_else(truncated)?;
                let end = reader.u16_le().ok_or_else(truncated)?;
                let memspace = parse_memspace(reader.u8().ok_or_else(truncated)?)?;
                let bank = reader.u16_le().ok_or_else(truncated)?;
                if end < start {
                    return Err(malformed("end address precedes start address"));
                }
                let data = reader.rest().to_vec();
                if data.len() != (end - start) as usize + 1 {
                    return Err(malformed("data length does not match the address range"));
                }
                Command::MemorySet(MemorySet {
                    side_effects,
                    start,
                    memspace,
                    bank,
                    data,
                })
            }
            CommandType::CheckpointGet => Command::CheckpointGet {
                number: reader.u32_le().ok_or_else(truncated)?,
            },
            CommandType::CheckpointSet => {
                let start = reader.u16_le().ok_or_else(truncated)?;
                let end = reader.u16_le().ok_or_else(truncated)?;
                let stop_when_hit = reader.u8().ok_or_else(truncated)? != 0;
                let enabled = reader.u8().ok_or_else(truncated)? != 0;
                let operation = CpuOperation::from(reader.u8().ok_or_else(truncated)?);
                let temporary = reader.u8().ok_or_else(truncated)? != 0;
                let memspace = match reader.u8() {
                    Some(byte) => parse_memspace(byte)?,
                    None => Memspace::MainMemory,
                };
                Command::CheckpointSet(CheckpointSet {
                    start,
                    end,
                    stop_when_hit,
                    enabled,
                    operation,
                    temporary,
                    memspace,
                })
            }
            CommandType::CheckpointDelete => Command::CheckpointDelete {
                number: reader.u32_le().ok_or_else(truncated)?,
            },
            CommandType::CheckpointList => Command::CheckpointList,
            CommandType::CheckpointToggle => Command::CheckpointToggle {
                number: reader.u32_le().ok_or_else(truncated)?,
                enabled: reader.u8().ok_or_else(truncated)? != 0,
            },
            CommandType::RegistersGet => Command::RegistersGet {
                memspace: parse_memspace(reader.u8().ok_or_else(truncated)?)?,
            },
            CommandType::RegistersSet => {
                let memspace = parse_memspace(reader.u8().ok_or_else(truncated)?)?;
                let count = reader.u16_le().ok_or_else(truncated)?;
                let mut values = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let item_size = reader.u8().ok_or_else(truncated)? as usize;
                    let mut item = ByteReader::new(reader.take(item_size).ok_or_else(truncated)?);
                    values.push(RegisterValue {
                        id: item.u8().ok_or_else(truncated)?,
                        value: item.u16_le().ok_or_else(truncated)?,
                    });
                }
                Command::RegistersSet { memspace, values }
            }
            CommandType::DisplayGet => Command::DisplayGet {
                use_vic: reader.u8().ok_or_else(truncated)? != 0,
                format: DisplayFormat::try_from(reader.u8().ok_or_else(truncated)?)
                    .map_err(|_| malformed("unknown display format"))?,
            },
            CommandType::AdvanceInstructions => Command::AdvanceInstructions {
                step_over_subroutines: reader.u8().ok_or_else(truncated)? != 0,
                count: reader.u16_le().ok_or_else(truncated)?,
            },
            CommandType::KeyboardFeed => {
                let len = reader.u8().ok_or_else(truncated)?;
                let text = reader.take(len as usize).ok_or_else(truncated)?.to_vec();
                Command::KeyboardFeed { text }
            }
            CommandType::Reset => Command::Reset(
                ResetKind::try_from(reader.u8().ok_or_else(truncated)?)
                    .map_err(|_| malformed("unknown reset kind"))?,
            ),
            CommandType::ExecuteUntilReturn => Command::ExecuteUntilReturn,
            CommandType::Ping => Command::Ping,
            CommandType::BanksAvailable => Command::BanksAvailable,
            CommandType::Info => Command::Info,
            CommandType::Exit => Command::Exit,
            CommandType::Quit => Command::Quit,
        };

        if !reader.is_empty() {
            return Err(malformed("trailing bytes after payload"));
        }

        Ok(command)
    }

    /// Decodes the command carried by a request frame.
    pub fn from_request(request: &RawRequest) -> Result<Command, MonitorError> {
        Self::decode_payload(request.command_type, &request.payload)
    }

    /// Checks the status byte and decodes the body of this command's response.
    ///
    /// A non-zero status becomes `Remote` / `UnknownRemoteError`; the error
    /// body is not interpreted.
    pub fn decode_response(&self, response: &RawResponse) -> Result<Response, MonitorError> {
        check_status(self.command_type(), response)?;

        match self {
            Command::MemoryGet(get) => decode_memory(get, response).map(Response::Memory),
            Command::Info => decode_info(response).map(Response::Info),
            Command::BanksAvailable => decode_banks(response).map(Response::Banks),
            Command::RegistersGet { .. } | Command::RegistersSet { .. } => {
                decode_registers(response).map(Response::Registers)
            }
            Command::CheckpointGet { .. } | Command::CheckpointSet(_) => {
                decode_checkpoint(response).map(Response::Checkpoint)
            }
            Command::CheckpointList => decode_checkpoint_list(response).map(Response::Checkpoints),
            Command::DisplayGet { .. } => decode_display(response).map(Response::Display),
            _ => decode_empty(response).map(|()| Response::Empty),
        }
    }

    /// Decodes the response of a command that carries no result, status
    /// included. Any body bytes are a `MalformedResponseBody`.
    pub fn decode_empty_response(&self, response: &RawResponse) -> Result<(), MonitorError> {
        check_status(self.command_type(), response)?;
        decode_empty(response)
    }
}
