//! ESC/POS byte builder.
//!
//! ```rust
//! use comanda_print::escpos::EscPosEncoder;
//! use comanda_print::Align;
//!
//! let mut enc = EscPosEncoder::new();
//! enc.init().align(Align::Center).line("COMANDA").feed(3).cut();
//! let bytes = enc.build();
//! assert_eq!(&bytes[..2], &[0x1B, 0x40]);
//! ```

use crate::command::{render_row, Align, Column, PrintCommand};
use crate::logo::Logo;

const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;
const LF: u8 = 0x0A;

/// Paper width in characters (Font A).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperWidth {
    Mm58,
    Mm80,
}

impl PaperWidth {
    pub fn chars(self) -> usize {
        match self {
            PaperWidth::Mm58 => 32,
            PaperWidth::Mm80 => 48,
        }
    }

    pub fn from_mm(mm: u32) -> Self {
        if mm <= 58 {
            PaperWidth::Mm58
        } else {
            PaperWidth::Mm80
        }
    }
}

/// Builder for ESC/POS command buffers.
#[derive(Debug, Default)]
pub struct EscPosEncoder {
    buffer: Vec<u8>,
}

impl EscPosEncoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(512),
        }
    }

    /// ESC @: reset printer to defaults.
    pub fn init(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x40]);
        self
    }

    /// ESC a n
    pub fn align(&mut self, align: Align) -> &mut Self {
        let n = match align {
            Align::Left => 0,
            Align::Center => 1,
            Align::Right => 2,
        };
        self.buffer.extend_from_slice(&[ESC, 0x61, n]);
        self
    }

    /// Text followed by LF. Anything outside printable ASCII becomes `?`.
    pub fn line(&mut self, text: &str) -> &mut Self {
        self.buffer.extend(
            text.chars()
                .map(|c| if matches!(c, ' '..='~') { c as u8 } else { b'?' }),
        );
        self.buffer.push(LF);
        self
    }

    pub fn columns(&mut self, columns: &[Column]) -> &mut Self {
        self.line(&render_row(columns))
    }

    /// GS v 0: raster bit image, normal density.
    pub fn raster(&mut self, logo: &Logo) -> &mut Self {
        let width_bytes = logo.width_bytes() as u16;
        let height = logo.height_dots() as u16;
        self.buffer.extend_from_slice(&[GS, 0x76, 0x30, 0x00]);
        self.buffer.extend_from_slice(&width_bytes.to_le_bytes());
        self.buffer.extend_from_slice(&height.to_le_bytes());
        self.buffer.extend_from_slice(logo.bits());
        self
    }

    /// ESC d n: print and feed n lines.
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x64, lines]);
        self
    }

    /// GS V A 16: partial cut after a short feed.
    pub fn cut(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[GS, 0x56, 0x41, 0x10]);
        self
    }

    /// Appends one command.
    pub fn command(&mut self, command: &PrintCommand) -> &mut Self {
        match command {
            PrintCommand::Image(logo) => self.raster(logo),
            PrintCommand::Align(align) => self.align(*align),
            PrintCommand::Text(text) => self.line(text),
            PrintCommand::Columns(columns) => self.columns(columns),
            PrintCommand::Feed(lines) => self.feed(*lines),
            PrintCommand::Cut => self.cut(),
        }
    }

    /// Takes the bytes built so far, leaving the encoder empty.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    pub fn build(self) -> Vec<u8> {
        self.buffer
    }
}

/// Encodes a whole command sequence, with a leading init.
pub fn encode(commands: &[PrintCommand]) -> Vec<u8> {
    let mut enc = EscPosEncoder::new();
    enc.init();
    for command in commands {
        enc.command(command);
    }
    enc.build()
}
