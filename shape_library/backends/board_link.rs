use super::protocol::{ProtocolError, Term, WireFormat};
use super::transport::Transport;
use shape_core::{HeightField, PinConfig, PinConfigGrid, ShapeError, ShapeResult};
use tracing::{debug, info, warn};

/// Packet traffic shared by every board-based display
///
/// Boards are spread over the transports in contiguous blocks, so a display
/// wired as several serial chains keeps each chain's boards together.
pub struct BoardLink {
    format: WireFormat,
    transports: Vec<Box<dyn Transport>>,
    readback: bool,
    measured: HeightField,
    packet: Vec<u8>,
    reply: Vec<u8>,
    packets_sent: u64,
    /// Boards whose pins disagreed on tuning in the last grid push
    mixed_tuning_boards: usize,
    closed: bool,
}

impl BoardLink {
    pub fn new(
        format: WireFormat,
        transports: Vec<Box<dyn Transport>>,
        readback: bool,
    ) -> ShapeResult<Self> {
        if transports.is_empty() {
            return Err(ShapeError::config(format!(
                "{} display needs at least one transport",
                format.display.label()
            )));
        }
        if transports.len() > format.board_count() {
            return Err(ShapeError::config(format!(
                "{} transports for {} boards",
                transports.len(),
                format.board_count()
            )));
        }

        info!(
            "{} link: {} boards of {} pins over {}",
            format.display.label(),
            format.board_count(),
            format.pins_per_board,
            transports
                .iter()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            format,
            transports,
            readback,
            measured: HeightField::zeroed(format.grid),
            packet: Vec::with_capacity(format.packet_len()),
            reply: vec![0; format.packet_len()],
            packets_sent: 0,
            mixed_tuning_boards: 0,
            closed: false,
        })
    }

    pub fn format(&self) -> &WireFormat {
        &self.format
    }

    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    pub fn mixed_tuning_boards(&self) -> usize {
        self.mixed_tuning_boards
    }

    fn transport_index(&self, board: usize) -> usize {
        board * self.transports.len() / self.format.board_count()
    }

    fn ensure_open(&self) -> ShapeResult<()> {
        if self.closed {
            Err(ShapeError::ShutDown)
        } else {
            Ok(())
        }
    }

    fn write_packet(&mut self, board: usize) -> ShapeResult<()> {
        let index = self.transport_index(board);
        self.transports[index].write_all(&self.packet)?;
        self.packets_sent += 1;
        Ok(())
    }

    /// Send every board its targets; read-back displays collect one reply per board
    pub fn send_heights(&mut self, heights: &HeightField) -> ShapeResult<()> {
        self.ensure_open()?;
        self.format.grid.ensure_matches(heights.size())?;

        let term = if self.readback {
            Term::ExchangeHeights
        } else {
            Term::SendHeights
        };

        for board in 0..self.format.board_count() {
            self.format
                .encode_heights(&mut self.packet, term, board, heights);
            self.write_packet(board)?;
            if self.readback {
                self.collect_reply(board)?;
            }
        }
        Ok(())
    }

    fn collect_reply(&mut self, board: usize) -> ShapeResult<()> {
        let index = self.transport_index(board);
        self.transports[index].read_exact(&mut self.reply)?;

        let packet = self.format.decode(&self.reply)?;
        let expected = WireFormat::board_id(board);
        if packet.term != Term::HeightReply {
            return Err(ProtocolError::UnexpectedTerm {
                board_id: packet.board_id,
                expected: Term::HeightReply,
                actual: packet.term,
            }
            .into());
        }
        if packet.board_id != expected {
            return Err(ProtocolError::UnexpectedBoard {
                expected,
                actual: packet.board_id,
            }
            .into());
        }

        let (row, columns) = self.format.board_pins(board);
        let measured_row = &mut self.measured.row_mut(row)[columns];
        for (slot, height) in measured_row.iter_mut().zip(self.format.decode_heights(&packet)) {
            *slot = height;
        }
        Ok(())
    }

    /// Heights collected during the last send
    pub fn read_heights(&self, out: &mut HeightField) -> ShapeResult<()> {
        self.ensure_open()?;
        out.copy_from(&self.measured)
    }

    pub fn send_config(&mut self, board: usize, config: &PinConfig) -> ShapeResult<()> {
        self.format.encode_config(&mut self.packet, board, config);
        self.write_packet(board)
    }

    /// Same tuning on every board
    pub fn set_global_tuning(&mut self, config: &PinConfig) -> ShapeResult<()> {
        self.ensure_open()?;
        for board in 0..self.format.board_count() {
            self.send_config(board, config)?;
        }
        debug!(
            "Applied global tuning to {} boards (gain_p {:.2})",
            self.format.board_count(),
            config.gain_p
        );
        Ok(())
    }

    /// Each board takes the tuning of its first pin
    ///
    /// Boards carry one tuning record for all their pins, so per-pin
    /// differences within a board cannot be represented and are logged.
    pub fn push_tuning(&mut self, configs: &PinConfigGrid) -> ShapeResult<()> {
        self.ensure_open()?;
        self.format.grid.ensure_matches(configs.size())?;

        let grid_uniform = configs.uniform_config().is_some();
        let mut mixed = 0;
        for board in 0..self.format.board_count() {
            let (row, columns) = self.format.board_pins(board);
            let config = *configs.get(columns.start, row);
            let uniform = grid_uniform
                || columns.clone().all(|x| configs.get(x, row).same_tuning(&config));
            if !uniform {
                mixed += 1;
                debug!(
                    "Board {} pins carry different tuning; using pin ({}, {})",
                    WireFormat::board_id(board),
                    columns.start,
                    row
                );
            }
            self.send_config(board, &config)?;
        }

        self.mixed_tuning_boards = mixed;
        if mixed > 0 {
            warn!(
                "{} of {} boards received their first pin's tuning in place of per-pin values",
                mixed,
                self.format.board_count()
            );
        }
        Ok(())
    }

    /// Close every transport; the link cannot be used afterwards
    pub fn shutdown(&mut self) -> ShapeResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut first_error = None;
        for transport in &mut self.transports {
            if let Err(err) = transport.close() {
                warn!("Failed to close {}: {}", transport.name(), err);
                first_error.get_or_insert(err);
            }
        }
        info!(
            "{} link closed after {} packets",
            self.format.display.label(),
            self.packets_sent
        );
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
