//! `shapedisplay displays` and `shapedisplay apps`

use anyhow::Result;
use colored::*;
use shape_core::{Clock, DisplayKind, PinConfig, SystemClock};
use shape_library::backends::WireFormat;
use shape_library::default_applications;
use std::sync::Arc;

pub fn list_displays() -> Result<()> {
    println!("{}", "Supported displays".cyan().bold());
    println!();
    for kind in DisplayKind::ALL {
        let format = WireFormat::for_display(kind);
        let grid = kind.grid_size();
        println!("  {} ({})", kind.as_str().bold(), kind.label());
        println!(
            "    {:<12} {}x{} pins, {} boards of {}",
            "Grid:".dimmed(),
            grid.x,
            grid.y,
            format.board_count(),
            format.pins_per_board
        );
        println!(
            "    {:<12} {}",
            "Read-back:".dimmed(),
            if kind.readback_supported() {
                "yes".green()
            } else {
                "no".yellow()
            }
        );
        println!(
            "    {:<12} {} bytes{}{}",
            "Packets:".dimmed(),
            format.packet_len(),
            if format.checksum { ", XOR checksum" } else { "" },
            if format.inverted {
                ", inverted heights"
            } else {
                ""
            }
        );
    }
    println!();
    println!(
        "Select with {} or the {} environment variable",
        "--display <KIND>".yellow(),
        shape_core::backend::DISPLAY_ENV_VAR.yellow()
    );
    Ok(())
}

pub fn list_applications() -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    println!("{}", "Bundled applications".cyan().bold());
    for (name, application) in default_applications(clock, PinConfig::default()) {
        println!();
        println!("  {} ({})", name.bold(), application.display_name());
        for line in application.instructions().lines() {
            println!("    {}", line.dimmed());
        }
    }
    Ok(())
}
