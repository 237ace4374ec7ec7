use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Command type byte of a request. Responses echo it in their type byte.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum CommandType {
    MemoryGet = 0x01,
    MemorySet = 0x02,
    CheckpointGet = 0x11,
    CheckpointSet = 0x12,
    CheckpointDelete = 0x13,
    CheckpointList = 0x14,
    CheckpointToggle = 0x15,
    RegistersGet = 0x31,
    RegistersSet = 0x32,
    AdvanceInstructions = 0x71,
    KeyboardFeed = 0x72,
    ExecuteUntilReturn = 0x73,
    Ping = 0x81,
    BanksAvailable = 0x82,
    DisplayGet = 0x84,
    Info = 0x85,
    Exit = 0xaa,
    Quit = 0xbb,
    Reset = 0xcc,
}

/// Type byte of an unsolicited frame.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum EventType {
    Jam = 0x61,
    Stopped = 0x62,
    Resumed = 0x63,
}
