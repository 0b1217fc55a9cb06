//! Pure computational algorithms
//!
//! No I/O here: these are reused by the simulated firmware and can be
//! exercised on their own.
//!
//! - **pin_pid**: per-pin PI position control with anti-windup, dead zone and speed limit

pub mod pin_pid;
