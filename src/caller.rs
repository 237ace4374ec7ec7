use crate::command::{
    BankInfo, CheckpointInfo, CheckpointSet, Command, CommandType, DisplayBuffer, DisplayFormat,
    EmulatorInfo, MemoryGet, MemorySet, Memspace, RegisterValue, ResetKind, Response,
};
use crate::error::MonitorError;
use crate::frame::RawResponse;

/// Connection state reported to state-change handlers.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransportState {
    Connected,
    Disconnected,
}

/// Typed monitor operations on top of a single raw `call`.
///
/// Any type that can send a command and hand back its correlated response
/// (a serialized session, a multiplexed client, or a test double) implements
/// [`call`](Self::call) and gets every typed operation for free.
#[async_trait::async_trait]
pub trait MonitorCallerInterface: Send + Sync {
    // --- METHODS TO BE IMPLEMENTED BY THE STRUCT (e.g., Session) ---

    /// Sends `command` and waits for its correlated response.
    ///
    /// Implementations must reject an invalid command before any I/O, and
    /// return the raw response without looking at its status.
    async fn call(&self, command: Command) -> Result<RawResponse, MonitorError>;

    // --- METHODS PROVIDED AUTOMATICALLY BY THE TRAIT ---

    /// Sends `command` and decodes its response, status included.
    async fn call_decoded(&self, command: Command) -> Result<Response, MonitorError> {
        command.validate()?;
        let raw = self.call(command.clone()).await?;
        command.decode_response(&raw)
    }

    /// Sends a command that has no result body.
    async fn call_empty(&self, command: Command) -> Result<(), MonitorError> {
        command.validate()?;
        let raw = self.call(command.clone()).await?;
        command.decode_empty_response(&raw)
    }

    async fn ping(&self) -> Result<(), MonitorError> {
        self.call_empty(Command::Ping).await
    }

    async fn get_info(&self) -> Result<EmulatorInfo, MonitorError> {
        let raw = self.call(Command::Info).await?;
        EmulatorInfo::decode_response(&raw)
    }

    /// Reads `start..=end`. Returns exactly `end - start + 1` bytes.
    async fn read_memory(
        &self,
        start: u16,
        end: u16,
        memspace: Memspace,
        bank: u16,
        side_effects: bool,
    ) -> Result<Vec<u8>, MonitorError> {
        let get = MemoryGet {
            side_effects,
            start,
            end,
            memspace,
            bank,
        };
        get.validate()?;

        let raw = self.call(Command::MemoryGet(get.clone())).await?;
        get.decode_response(&raw)
    }

    async fn write_memory(
        &self,
        start: u16,
        data: Vec<u8>,
        memspace: Memspace,
        bank: u16,
    ) -> Result<(), MonitorError> {
        self.call_empty(Command::MemorySet(MemorySet {
            side_effects: false,
            start,
            memspace,
            bank,
            data,
        }))
        .await
    }

    async fn banks_available(&self) -> Result<Vec<BankInfo>, MonitorError> {
        let raw = self.call(Command::BanksAvailable).await?;
        BankInfo::decode_list_response(&raw)
    }

    async fn get_registers(&self, memspace: Memspace) -> Result<Vec<RegisterValue>, MonitorError> {
        let raw = self.call(Command::RegistersGet { memspace }).await?;
        RegisterValue::decode_list_response(&raw)
    }

    /// Writes register values and returns the full register set as the
    /// monitor reports it afterwards.
    async fn set_registers(
        &self,
        memspace: Memspace,
        values: Vec<RegisterValue>,
    ) -> Result<Vec<RegisterValue>, MonitorError> {
        let command = Command::RegistersSet { memspace, values };
        command.validate()?;

        let raw = self.call(command).await?;
        RegisterValue::decode_set_response(&raw)
    }

    async fn checkpoint_get(&self, number: u32) -> Result<CheckpointInfo, MonitorError> {
        let raw = self.call(Command::CheckpointGet { number }).await?;
        CheckpointInfo::decode_response(CommandType::CheckpointGet, &raw)
    }

    /// Creates a checkpoint and returns it with its assigned number.
    async fn checkpoint_set(&self, set: CheckpointSet) -> Result<CheckpointInfo, MonitorError> {
        set.validate()?;

        let raw = self.call(Command::CheckpointSet(set)).await?;
        CheckpointInfo::decode_response(CommandType::CheckpointSet, &raw)
    }

    async fn checkpoint_delete(&self, number: u32) -> Result<(), MonitorError> {
        self.call_empty(Command::CheckpointDelete { number }).await
    }

    async fn checkpoint_list(&self) -> Result<Vec<CheckpointInfo>, MonitorError> {
        let raw = self.call(Command::CheckpointList).await?;
        CheckpointInfo::decode_list_response(&raw)
    }

    async fn checkpoint_toggle(&self, number: u32, enabled: bool) -> Result<(), MonitorError> {
        self.call_empty(Command::CheckpointToggle { number, enabled }).await
    }

    async fn display_get(
        &self,
        use_vic: bool,
        format: DisplayFormat,
    ) -> Result<DisplayBuffer, MonitorError> {
        let raw = self.call(Command::DisplayGet { use_vic, format }).await?;
        DisplayBuffer::decode_response(&raw)
    }

    async fn advance_instructions(
        &self,
        step_over_subroutines: bool,
        count: u16,
    ) -> Result<(), MonitorError> {
        self.call_empty(Command::AdvanceInstructions {
            step_over_subroutines,
            count,
        })
        .await
    }

    async fn keyboard_feed(&self, text: Vec<u8>) -> Result<(), MonitorError> {
        self.call_empty(Command::KeyboardFeed { text }).await
    }

    async fn execute_until_return(&self) -> Result<(), MonitorError> {
        self.call_empty(Command::ExecuteUntilReturn).await
    }

    /// Leaves the monitor and resumes emulation.
    async fn exit(&self) -> Result<(), MonitorError> {
        self.call_empty(Command::Exit).await
    }

    async fn quit(&self) -> Result<(), MonitorError> {
        self.call_empty(Command::Quit).await
    }

    async fn reset(&self, kind: ResetKind) -> Result<(), MonitorError> {
        self.call_empty(Command::Reset(kind)).await
    }
}
