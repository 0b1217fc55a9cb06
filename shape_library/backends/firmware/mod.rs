//! Simulated board firmware
//!
//! Stands in for the boards of a display when no hardware is attached. It
//! decodes the same packets real boards receive, moves every pin toward its
//! target with a [`PinPid`], and queues height replies for read-back packets.

use super::protocol::{Packet, Term, WireFormat};
use crate::algorithms::pin_pid::PinPid;
use parking_lot::Mutex;
use serde::Serialize;
use shape_core::{HeightField, PinConfig};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

pub type SharedFirmware = Arc<Mutex<SimulatedFirmware>>;

/// Packet counters kept by the simulated boards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FirmwareStats {
    pub height_packets: u64,
    pub config_packets: u64,
    pub replies: u64,
    pub rejected_packets: u64,
}

pub struct SimulatedFirmware {
    format: WireFormat,
    /// Seconds a board advances its pins per height packet
    step_secs: f64,
    controllers: Vec<PinPid>,
    configs: Vec<PinConfig>,
    positions: Vec<f64>,
    targets: HeightField,
    rx: Vec<u8>,
    tx: VecDeque<u8>,
    reply: Vec<u8>,
    stats: FirmwareStats,
}

impl SimulatedFirmware {
    pub fn new(format: WireFormat, step_secs: f64) -> Self {
        let pins = format.grid.pin_count();
        let config = PinConfig::default();
        Self {
            format,
            step_secs,
            controllers: vec![PinPid::from_config(&config); pins],
            configs: vec![config; pins],
            positions: vec![0.0; pins],
            targets: HeightField::zeroed(format.grid),
            rx: Vec::with_capacity(format.packet_len()),
            tx: VecDeque::new(),
            reply: Vec::with_capacity(format.packet_len()),
            stats: FirmwareStats::default(),
        }
    }

    pub fn shared(format: WireFormat, step_secs: f64) -> SharedFirmware {
        Arc::new(Mutex::new(Self::new(format, step_secs)))
    }

    pub fn format(&self) -> &WireFormat {
        &self.format
    }

    pub fn stats(&self) -> FirmwareStats {
        self.stats
    }

    /// Current pin positions, rounded
    pub fn positions(&self) -> HeightField {
        let mut heights = HeightField::zeroed(self.format.grid);
        for (out, &position) in heights.as_mut_slice().iter_mut().zip(&self.positions) {
            *out = position.round() as u8;
        }
        heights
    }

    pub fn targets(&self) -> &HeightField {
        &self.targets
    }

    /// Tuning currently applied to the pin at (x, y)
    pub fn config(&self, x: usize, y: usize) -> PinConfig {
        self.configs[y * self.format.grid.x + x]
    }

    /// Move a pin by hand, as a person pressing on the surface would
    pub fn press(&mut self, x: usize, y: usize, height: u8) {
        let index = y * self.format.grid.x + x;
        self.positions[index] = height as f64;
    }

    /// Accept bytes from the host; complete packets are processed immediately
    pub fn receive(&mut self, bytes: &[u8]) {
        let packet_len = self.format.packet_len();
        self.rx.extend_from_slice(bytes);

        while self.rx.len() >= packet_len {
            let packet: Vec<u8> = self.rx.drain(..packet_len).collect();
            match self.format.decode(&packet) {
                Ok(decoded) => self.handle(decoded),
                Err(err) => {
                    self.stats.rejected_packets += 1;
                    warn!("Simulated board dropped packet: {}", err);
                }
            }
        }
    }

    /// Pop exactly `buf.len()` reply bytes, or nothing if not enough are queued
    pub fn transmit(&mut self, buf: &mut [u8]) -> bool {
        let len = buf.len();
        if self.tx.len() < len {
            return false;
        }
        for (slot, byte) in buf.iter_mut().zip(self.tx.drain(..len)) {
            *slot = byte;
        }
        true
    }

    pub fn pending_reply_bytes(&self) -> usize {
        self.tx.len()
    }

    fn handle(&mut self, packet: Packet<'_>) {
        let board_index = packet.board_id as usize - 1;
        let (row, columns) = self.format.board_pins(board_index);
        let width = self.format.grid.x;

        match packet.term {
            Term::SendHeights | Term::ExchangeHeights => {
                self.stats.height_packets += 1;
                for (x, target) in columns.clone().zip(self.format.decode_heights(&packet)) {
                    self.targets.set(x, row, target);
                }
                for x in columns.clone() {
                    let index = row * width + x;
                    let target = self.targets.get(x, row) as f64;
                    self.positions[index] =
                        self.controllers[index].step(target, self.positions[index], self.step_secs);
                }

                if packet.term == Term::ExchangeHeights {
                    let measured: Vec<u8> = columns
                        .map(|x| self.positions[row * width + x].round() as u8)
                        .collect();
                    self.format
                        .encode_reply(&mut self.reply, board_index, &measured);
                    self.tx.extend(self.reply.iter().copied());
                    self.stats.replies += 1;
                }
            }
            Term::SendConfig => {
                self.stats.config_packets += 1;
                let config = self.format.decode_config(&packet);
                debug!(
                    "Board {} tuning: gain_p {:.2}, gain_i {:.2}, max_speed {}",
                    packet.board_id, config.gain_p, config.gain_i, config.max_speed
                );
                for x in columns {
                    let index = row * width + x;
                    self.controllers[index].apply(&config);
                    self.configs[index] = config;
                }
            }
            Term::HeightReply => {
                self.stats.rejected_packets += 1;
                warn!("Simulated board {} received a reply packet", packet.board_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::protocol::xor_checksum;
    use shape_core::DisplayKind;

    fn send_all(firmware: &mut SimulatedFirmware, term: Term, heights: &HeightField) {
        let format = *firmware.format();
        let mut packet = Vec::new();
        for board in 0..format.board_count() {
            format.encode_heights(&mut packet, term, board, heights);
            firmware.receive(&packet);
        }
    }

    #[test]
    fn test_pins_converge_to_targets() {
        let format = WireFormat::for_display(DisplayKind::Transform);
        let mut firmware = SimulatedFirmware::new(format, 1.0 / 30.0);
        let mut targets = HeightField::zeroed(format.grid);
        targets.set(0, 0, 200);
        targets.set(47, 23, 90);

        for _ in 0..300 {
            send_all(&mut firmware, Term::SendHeights, &targets);
        }

        let positions = firmware.positions();
        assert!((positions.get(0, 0) as i32 - 200).abs() <= 3);
        assert!((positions.get(47, 23) as i32 - 90).abs() <= 3);
        assert_eq!(positions.get(10, 10), 0);
        assert_eq!(firmware.targets().get(0, 0), 200);
        assert_eq!(firmware.pending_reply_bytes(), 0);
    }

    #[test]
    fn test_exchange_queues_one_reply_per_board() {
        let format = WireFormat::for_display(DisplayKind::Cooperform);
        let mut firmware = SimulatedFirmware::new(format, 1.0 / 30.0);
        let targets = HeightField::filled(format.grid, 50);

        send_all(&mut firmware, Term::ExchangeHeights, &targets);
        assert_eq!(
            firmware.pending_reply_bytes(),
            format.board_count() * format.packet_len()
        );
        assert_eq!(firmware.stats().replies, 150);

        let mut reply = vec![0; format.packet_len()];
        assert!(firmware.transmit(&mut reply));
        let packet = format.decode(&reply).unwrap();
        assert_eq!(packet.term, Term::HeightReply);
        assert_eq!(packet.board_id, 1);
        // One step from zero toward 50
        assert!(packet.payload.iter().all(|&h| h > 0 && h < 50));
    }

    #[test]
    fn test_transmit_is_all_or_nothing() {
        let format = WireFormat::for_display(DisplayKind::Inform);
        let mut firmware = SimulatedFirmware::new(format, 1.0 / 30.0);
        let mut packet = Vec::new();
        format.encode_heights(&mut packet, Term::ExchangeHeights, 2, &HeightField::filled(format.grid, 40));
        firmware.receive(&packet);
        assert_eq!(firmware.pending_reply_bytes(), format.packet_len());

        let mut too_long = vec![0; format.packet_len() + 1];
        assert!(!firmware.transmit(&mut too_long));
        assert!(too_long.iter().all(|&b| b == 0));
        assert_eq!(firmware.pending_reply_bytes(), format.packet_len());

        let mut head = [0u8; 2];
        assert!(firmware.transmit(&mut head));
        assert_eq!(head, [Term::HeightReply.id(), 3]);
        assert_eq!(firmware.pending_reply_bytes(), format.packet_len() - 2);
    }

    #[test]
    fn test_config_applies_to_board_pins_only() {
        let format = WireFormat::for_display(DisplayKind::Inform);
        let mut firmware = SimulatedFirmware::new(format, 1.0 / 30.0);
        let soft = PinConfig {
            gain_p: 0.4,
            max_speed: 60,
            ..PinConfig::default()
        };

        let mut packet = Vec::new();
        format.encode_config(&mut packet, 1, &soft);
        firmware.receive(&packet);

        assert_eq!(firmware.config(6, 0).gain_p, 0.4);
        assert_eq!(firmware.config(11, 0).max_speed, 60);
        assert_eq!(firmware.config(5, 0).gain_p, 1.5);
        assert_eq!(firmware.config(6, 1).max_speed, 200);
        assert_eq!(firmware.stats().config_packets, 1);
    }

    #[test]
    fn test_split_writes_and_bad_packets() {
        let format = WireFormat::for_display(DisplayKind::Cooperform);
        let mut firmware = SimulatedFirmware::new(format, 1.0 / 30.0);
        let mut packet = Vec::new();
        format.encode_heights(&mut packet, Term::SendHeights, 0, &HeightField::filled(format.grid, 9));

        firmware.receive(&packet[..4]);
        assert_eq!(firmware.stats().height_packets, 0);
        firmware.receive(&packet[4..]);
        assert_eq!(firmware.stats().height_packets, 1);

        let mut bad = packet.clone();
        bad[2] = 200;
        firmware.receive(&bad);
        assert_eq!(firmware.stats().rejected_packets, 1);
        assert_ne!(xor_checksum(&bad[..bad.len() - 1]), bad[bad.len() - 1]);
    }

    #[test]
    fn test_pressed_pin_is_reported() {
        let format = WireFormat::for_display(DisplayKind::Inform);
        let mut firmware = SimulatedFirmware::new(format, 0.0);
        firmware.press(3, 2, 140);
        assert_eq!(firmware.positions().get(3, 2), 140);
    }
}
