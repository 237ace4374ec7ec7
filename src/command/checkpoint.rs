use crate::command::Memspace;
use crate::error::ValidationError;
use crate::utils::ByteReader;
use num_enum::{FromPrimitive, IntoPrimitive};

/// Memory access that triggers a checkpoint. The values are bit flags.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, FromPrimitive, IntoPrimitive)]
pub enum CpuOperation {
    Load = 0x01,
    Store = 0x02,
    Exec = 0x04,
    /// Any other combination of the flags above.
    #[num_enum(catch_all)]
    Combined(u8),
}

/// Arguments of a checkpoint set request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointSet {
    pub start: u16,
    pub end: u16,
    pub stop_when_hit: bool,
    pub enabled: bool,
    pub operation: CpuOperation,
    /// Deleted by the monitor after its first hit.
    pub temporary: bool,
    pub memspace: Memspace,
}

impl CheckpointSet {
    /// An enabled, stopping execution breakpoint on `start..=end` in main
    /// memory.
    pub fn breakpoint(start: u16, end: u16) -> Self {
        Self {
            start,
            end,
            stop_when_hit: true,
            enabled: true,
            operation: CpuOperation::Exec,
            temporary: false,
            memspace: Memspace::MainMemory,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.start > self.end {
            return Err(ValidationError::InvalidRange(
                "checkpoint start is past its end",
            ));
        }
        Ok(())
    }

    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend(&self.start.to_le_bytes());
        buf.extend(&self.end.to_le_bytes());
        buf.push(self.stop_when_hit as u8);
        buf.push(self.enabled as u8);
        buf.push(self.operation.into());
        buf.push(self.temporary as u8);

        // Older monitors only know main memory and reject the extra byte.
        if self.memspace != Memspace::MainMemory {
            buf.push(self.memspace.into());
        }
    }
}

/// A checkpoint as reported by the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointInfo {
    pub number: u32,
    pub currently_hit: bool,
    pub start: u16,
    pub end: u16,
    pub stop_when_hit: bool,
    pub enabled: bool,
    pub operation: CpuOperation,
    pub temporary: bool,
    pub hit_count: u32,
    pub ignore_count: u32,
    pub has_condition: bool,
    /// Absent from older monitors, which only know main memory.
    pub memspace: Memspace,
}

impl CheckpointInfo {
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend(&self.number.to_le_bytes());
        buf.push(self.currently_hit as u8);
        buf.extend(&self.start.to_le_bytes());
        buf.extend(&self.end.to_le_bytes());
        buf.push(self.stop_when_hit as u8);
        buf.push(self.enabled as u8);
        buf.push(self.operation.into());
        buf.push(self.temporary as u8);
        buf.extend(&self.hit_count.to_le_bytes());
        buf.extend(&self.ignore_count.to_le_bytes());
        buf.push(self.has_condition as u8);
        buf.push(self.memspace.into());
    }

    /// Reads one checkpoint record. `None` means the record is truncated or
    /// names an unknown memspace.
    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Option<Self> {
        let number = reader.u32_le()?;
        let currently_hit = reader.u8()? != 0;
        let start = reader.u16_le()?;
        let end = reader.u16_le()?;
        let stop_when_hit = reader.u8()? != 0;
        let enabled = reader.u8()? != 0;
        let operation = CpuOperation::from(reader.u8()?);
        let temporary = reader.u8()? != 0;
        let hit_count = reader.u32_le()?;
        let ignore_count = reader.u32_le()?;
        let has_condition = reader.u8()? != 0;

        let memspace = if reader.is_empty() {
            Memspace::MainMemory
        } else {
            Memspace::try_from(reader.u8()?).ok()?
        };

        Some(Self {
            number,
            currently_hit,
            start,
            end,
            stop_when_hit,
            enabled,
            operation,
            temporary,
            hit_count,
            ignore_count,
            has_condition,
            memspace,
        })
    }
}
