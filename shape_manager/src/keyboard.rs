//! Terminal keyboard input
//!
//! Puts the terminal in raw mode for the lifetime of [`KeyboardInput`] and
//! translates crossterm events into orchestrator input. The manager keeps a
//! few keys for itself:
//!
//! | Key            | Action                         |
//! |----------------|--------------------------------|
//! | `Esc`, Ctrl+C  | stop the run loop              |
//! | `F1`..`F12`    | select the n-th application    |
//!
//! Everything else, space included, goes to the orchestrator.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use shape_core::Key;
use std::io::{self, IsTerminal};
use std::time::Duration;
use tracing::warn;

/// Something the operator did at the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalCommand {
    Key(Key),
    Resized { width: u16, height: u16 },
    /// Zero-based index into the sorted application names
    SelectApplication(usize),
    Quit,
}

pub struct KeyboardInput {
    _private: (),
}

impl KeyboardInput {
    /// Enter raw mode, or `None` when stdin is not a terminal
    pub fn open() -> io::Result<Option<Self>> {
        if !io::stdin().is_terminal() {
            return Ok(None);
        }
        terminal::enable_raw_mode()?;
        Ok(Some(Self { _private: () }))
    }

    /// Drain pending events without blocking
    pub fn poll(&mut self) -> io::Result<Vec<TerminalCommand>> {
        let mut commands = Vec::new();
        while event::poll(Duration::ZERO)? {
            if let Some(command) = translate(event::read()?) {
                commands.push(command);
            }
        }
        Ok(commands)
    }
}

impl Drop for KeyboardInput {
    fn drop(&mut self) {
        if let Err(err) = terminal::disable_raw_mode() {
            warn!("Failed to restore terminal mode: {}", err);
        }
    }
}

pub fn translate(event: Event) -> Option<TerminalCommand> {
    match event {
        Event::Key(key) => translate_key(key),
        Event::Resize(width, height) => Some(TerminalCommand::Resized { width, height }),
        _ => None,
    }
}

fn translate_key(key: KeyEvent) -> Option<TerminalCommand> {
    // Some platforms report releases and repeats too
    if key.kind != KeyEventKind::Press {
        return None;
    }

    let command = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            TerminalCommand::Quit
        }
        KeyCode::Esc => TerminalCommand::Quit,
        KeyCode::F(n) if (1..=12).contains(&n) => {
            TerminalCommand::SelectApplication(n as usize - 1)
        }
        KeyCode::Char(c) => TerminalCommand::Key(Key::Char(c)),
        KeyCode::Enter => TerminalCommand::Key(Key::Enter),
        KeyCode::Tab => TerminalCommand::Key(Key::Tab),
        KeyCode::Backspace => TerminalCommand::Key(Key::Backspace),
        KeyCode::Up => TerminalCommand::Key(Key::Up),
        KeyCode::Down => TerminalCommand::Key(Key::Down),
        KeyCode::Left => TerminalCommand::Key(Key::Left),
        KeyCode::Right => TerminalCommand::Key(Key::Right),
        _ => return None,
    };
    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_characters_are_forwarded() {
        assert_eq!(
            translate(press(KeyCode::Char(' '))),
            Some(TerminalCommand::Key(Key::Char(' ')))
        );
        assert_eq!(
            translate(press(KeyCode::Char('f'))),
            Some(TerminalCommand::Key(Key::Char('f')))
        );
        assert_eq!(
            translate(press(KeyCode::Up)),
            Some(TerminalCommand::Key(Key::Up))
        );
    }

    #[test]
    fn test_manager_keys() {
        assert_eq!(translate(press(KeyCode::Esc)), Some(TerminalCommand::Quit));
        assert_eq!(
            translate(Event::Key(KeyEvent::new(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL
            ))),
            Some(TerminalCommand::Quit)
        );
        assert_eq!(
            translate(press(KeyCode::F(2))),
            Some(TerminalCommand::SelectApplication(1))
        );
        assert_eq!(translate(press(KeyCode::F(13))), None);
    }

    #[test]
    fn test_releases_and_other_events_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(translate(Event::Key(release)), None);
        assert_eq!(translate(Event::FocusGained), None);
        assert_eq!(
            translate(Event::Resize(120, 40)),
            Some(TerminalCommand::Resized {
                width: 120,
                height: 40
            })
        );
    }
}
