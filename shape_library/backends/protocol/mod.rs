//! Board packet codec
//!
//! Pins are driven by small boards, each owning a run of consecutive pins
//! along one row. Every packet addresses one board:
//!
//! ```text
//! [term_id, board_id, payload[pins_per_board], checksum?]
//! ```
//!
//! Board ids are 1-based and laid out row-major. The checksum, when the
//! display uses one, is the XOR of every preceding byte.

use shape_core::{DisplayKind, GridSize, HeightField, PinConfig, ShapeError, Timestamp};
use std::ops::Range;
use thiserror::Error;

/// Packet type, the first byte of every packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    /// Target heights, no reply expected
    SendHeights,
    /// Tuning for every pin on the board
    SendConfig,
    /// Target heights; the board answers with a `HeightReply`
    ExchangeHeights,
    /// Measured heights from a board
    HeightReply,
}

impl Term {
    pub const fn id(self) -> u8 {
        match self {
            Term::SendHeights => 246,
            Term::SendConfig => 247,
            Term::ExchangeHeights => 253,
            Term::HeightReply => 254,
        }
    }
}

impl TryFrom<u8> for Term {
    type Error = ProtocolError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            246 => Ok(Term::SendHeights),
            247 => Ok(Term::SendConfig),
            253 => Ok(Term::ExchangeHeights),
            254 => Ok(Term::HeightReply),
            other => Err(ProtocolError::UnknownTerm(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("packet is {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },

    #[error("unknown term id {0}")]
    UnknownTerm(u8),

    #[error("board id {board_id} outside 1..={board_count}")]
    BoardOutOfRange { board_id: u8, board_count: usize },

    #[error("checksum mismatch: computed {computed:#04x}, received {received:#04x}")]
    Checksum { computed: u8, received: u8 },

    #[error("expected {expected:?} from board {board_id}, got {actual:?}")]
    UnexpectedTerm {
        board_id: u8,
        expected: Term,
        actual: Term,
    },

    #[error("reply came from board {actual}, expected board {expected}")]
    UnexpectedBoard { expected: u8, actual: u8 },
}

impl From<ProtocolError> for ShapeError {
    fn from(err: ProtocolError) -> Self {
        ShapeError::ActuatorProtocol(err.to_string())
    }
}

/// A decoded packet borrowing its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet<'a> {
    pub term: Term,
    pub board_id: u8,
    pub payload: &'a [u8],
}

/// Packet layout of one display variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireFormat {
    pub display: DisplayKind,
    pub grid: GridSize,
    pub pins_per_board: usize,
    pub checksum: bool,
    /// Heights travel as `255 - h`
    pub inverted: bool,
}

impl WireFormat {
    pub const fn for_display(display: DisplayKind) -> Self {
        match display {
            DisplayKind::Inform => WireFormat {
                display,
                grid: display.grid_size(),
                pins_per_board: 6,
                checksum: false,
                inverted: false,
            },
            DisplayKind::Transform => WireFormat {
                display,
                grid: display.grid_size(),
                pins_per_board: 8,
                checksum: true,
                inverted: true,
            },
            DisplayKind::Cooperform => WireFormat {
                display,
                grid: display.grid_size(),
                pins_per_board: 6,
                checksum: true,
                inverted: false,
            },
        }
    }

    pub const fn packet_len(&self) -> usize {
        2 + self.pins_per_board + if self.checksum { 1 } else { 0 }
    }

    pub const fn boards_per_row(&self) -> usize {
        self.grid.x / self.pins_per_board
    }

    pub const fn board_count(&self) -> usize {
        self.boards_per_row() * self.grid.y
    }

    /// Row and column range driven by the board at `index` (0-based)
    pub fn board_pins(&self, index: usize) -> (usize, Range<usize>) {
        let row = index / self.boards_per_row();
        let start = (index % self.boards_per_row()) * self.pins_per_board;
        (row, start..start + self.pins_per_board)
    }

    pub fn board_id(index: usize) -> u8 {
        (index + 1) as u8
    }

    fn encode_height(&self, height: u8) -> u8 {
        if self.inverted {
            255 - height
        } else {
            height
        }
    }

    // Inversion is its own inverse
    fn decode_height(&self, byte: u8) -> u8 {
        self.encode_height(byte)
    }

    fn begin(&self, out: &mut Vec<u8>, term: Term, board_index: usize) {
        out.clear();
        out.push(term.id());
        out.push(Self::board_id(board_index));
    }

    fn finish(&self, out: &mut Vec<u8>) {
        if self.checksum {
            let checksum = xor_checksum(out);
            out.push(checksum);
        }
    }

    /// Encode the heights of one board's pins, taken from `heights`
    pub fn encode_heights(
        &self,
        out: &mut Vec<u8>,
        term: Term,
        board_index: usize,
        heights: &HeightField,
    ) {
        let (row, columns) = self.board_pins(board_index);
        self.begin(out, term, board_index);
        for &height in &heights.row(row)[columns] {
            out.push(self.encode_height(height));
        }
        self.finish(out);
    }

    /// Encode one board's measured pin positions
    pub fn encode_reply(&self, out: &mut Vec<u8>, board_index: usize, positions: &[u8]) {
        self.begin(out, Term::HeightReply, board_index);
        for &height in positions.iter().take(self.pins_per_board) {
            out.push(self.encode_height(height));
        }
        out.resize(2 + self.pins_per_board, self.encode_height(0));
        self.finish(out);
    }

    /// Encode a tuning record for every pin on one board
    pub fn encode_config(&self, out: &mut Vec<u8>, board_index: usize, config: &PinConfig) {
        self.begin(out, Term::SendConfig, board_index);
        out.push(scale_to_byte(config.gain_p, 25.0));
        out.push(scale_to_byte(config.gain_i, 100.0));
        out.push(config.max_i);
        out.push(config.dead_zone);
        out.push((config.max_speed / 2).min(255) as u8);
        out.resize(2 + self.pins_per_board, 0);
        self.finish(out);
    }

    /// Validate framing and checksum, returning a borrowed view
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Packet<'a>, ProtocolError> {
        if bytes.len() != self.packet_len() {
            return Err(ProtocolError::Length {
                expected: self.packet_len(),
                actual: bytes.len(),
            });
        }

        if self.checksum {
            let (body, received) = bytes.split_at(bytes.len() - 1);
            let computed = xor_checksum(body);
            if computed != received[0] {
                return Err(ProtocolError::Checksum {
                    computed,
                    received: received[0],
                });
            }
        }

        let term = Term::try_from(bytes[0])?;
        let board_id = bytes[1];
        if board_id == 0 || board_id as usize > self.board_count() {
            return Err(ProtocolError::BoardOutOfRange {
                board_id,
                board_count: self.board_count(),
            });
        }

        Ok(Packet {
            term,
            board_id,
            payload: &bytes[2..2 + self.pins_per_board],
        })
    }

    /// Heights carried by a height packet, in pin order
    pub fn decode_heights<'a>(&'a self, packet: &Packet<'a>) -> impl Iterator<Item = u8> + 'a {
        packet
            .payload
            .iter()
            .map(move |&byte| self.decode_height(byte))
    }

    /// Tuning carried by a config packet
    pub fn decode_config(&self, packet: &Packet<'_>) -> PinConfig {
        let payload = packet.payload;
        PinConfig {
            gain_p: payload[0] as f64 / 25.0,
            gain_i: payload[1] as f64 / 100.0,
            max_i: payload[2],
            dead_zone: payload[3],
            max_speed: payload[4] as u16 * 2,
            time_of_update: Timestamp::ZERO,
        }
    }
}

pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, &byte| acc ^ byte)
}

fn scale_to_byte(value: f64, scale: f64) -> u8 {
    (value * scale).round().clamp(0.0, 255.0) as u8
}
