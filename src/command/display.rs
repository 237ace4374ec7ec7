use crate::error::ValidationError;
use crate::utils::ByteReader;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Pixel format of a display capture.
#[repr(u8)]
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum DisplayFormat {
    /// One palette index per byte.
    #[default]
    Indexed8 = 0x00,
}

/// A snapshot of the emulated screen.
///
/// The debug area is the full rendered frame, borders included; the inner
/// area is the visible screen within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBuffer {
    pub debug_width: u16,
    pub debug_height: u16,
    pub debug_offset_x: u16,
    pub debug_offset_y: u16,
    pub inner_width: u16,
    pub inner_height: u16,
    pub bits_per_pixel: u8,
    pub pixels: Vec<u8>,
}

// Geometry (six u16), bits per pixel (u8) and the buffer length (u32).
pub(crate) const DISPLAY_INFO_LEN: u32 = 17;

impl DisplayBuffer {
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), ValidationError> {
        let pixels_len =
            u32::try_from(self.pixels.len()).map_err(|_| ValidationError::Overflow {
                field: "display buffer",
                len: self.pixels.len(),
            })?;

        buf.extend(&DISPLAY_INFO_LEN.to_le_bytes());
        for field in [
            self.debug_width,
            self.debug_height,
            self.debug_offset_x,
            self.debug_offset_y,
            self.inner_width,
            self.inner_height,
        ] {
            buf.extend(&field.to_le_bytes());
        }
        buf.push(self.bits_per_pixel);
        buf.extend(&pixels_len.to_le_bytes());
        buf.extend(&self.pixels);

        Ok(())
    }

    /// Reads the geometry header. The declared info length is read past but
    /// not trusted; the pixel data length is checked by the caller.
    pub(crate) fn read_header(reader: &mut ByteReader<'_>) -> Option<(Self, usize)> {
        let _info_len = reader.u32_le()?;

        let buffer = Self {
            debug_width: reader.u16_le()?,
            debug_height: reader.u16_le()?,
            debug_offset_x: reader.u16_le()?,
            debug_offset_y: reader.u16_le()?,
            inner_width: reader.u16_le()?,
            inner_height: reader.u16_le()?,
            bits_per_pixel: reader.u8()?,
            pixels: Vec::new(),
        };
        let pixels_len = reader.u32_le()? as usize;

        Some((buffer, pixels_len))
    }
}
