use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Which CPU's address space a memory or register command targets.
#[repr(u8)]
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum Memspace {
    #[default]
    MainMemory = 0x00,
    Drive8 = 0x01,
    Drive9 = 0x02,
    Drive10 = 0x03,
    Drive11 = 0x04,
}

#[repr(u8)]
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum ResetKind {
    #[default]
    Soft = 0x00,
    Hard = 0x01,
    Drive8 = 0x08,
    Drive9 = 0x09,
    Drive10 = 0x0a,
    Drive11 = 0x0b,
}
