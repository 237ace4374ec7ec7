use crate::command::EventType;
use crate::error::MonitorError;
use crate::frame::RawResponse;
use crate::utils::ByteReader;

/// An unsolicited frame pushed by the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// The CPU jammed at `pc`.
    Jam { pc: u16 },

    /// Emulation halted and the monitor took control at `pc`.
    Stopped { pc: u16 },

    /// Emulation resumed at `pc`.
    Resumed { pc: u16 },

    /// Any other broadcast frame, passed through undecoded.
    Other(RawResponse),
}

impl MonitorEvent {
    pub fn decode(response: RawResponse) -> Result<Self, MonitorError> {
        let Ok(kind) = EventType::try_from(response.response_type()) else {
            return Ok(MonitorEvent::Other(response));
        };

        let mut reader = ByteReader::new(&response.body);
        let pc = reader.u16_le();

        let pc = match pc {
            Some(pc) if reader.is_empty() => pc,
            _ => {
                return Err(MonitorError::MalformedResponseBody {
                    response_type: response.response_type(),
                    reason: "event body must be a single program counter",
                });
            }
        };

        Ok(match kind {
            EventType::Jam => MonitorEvent::Jam { pc },
            EventType::Stopped => MonitorEvent::Stopped { pc },
            EventType::Resumed => MonitorEvent::Resumed { pc },
        })
    }
}
