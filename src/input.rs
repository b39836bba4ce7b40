use crate::session::Phase;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

pub(crate) const INPUT_MAX: usize = 32;

#[derive(Clone, Debug)]
pub(crate) struct InputEvent {
    pub(crate) key: KeyCode,
    pub(crate) mods: KeyModifiers,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PlayerAction {
    Char(char),
    Backspace,
    Submit,
    Restart,
    Quit,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                out.push(InputEvent {
                    key: k.code,
                    mods: k.modifiers,
                });
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_action(phase: Phase, ev: InputEvent) -> Option<PlayerAction> {
    // Global
    if matches!(ev.key, KeyCode::Char('c') | KeyCode::Char('C'))
        && ev.mods.contains(KeyModifiers::CONTROL)
    {
        return Some(PlayerAction::Quit);
    }
    if ev.key == KeyCode::Esc {
        return Some(PlayerAction::Quit);
    }

    match phase {
        Phase::Playing => match ev.key {
            KeyCode::Enter => Some(PlayerAction::Submit),
            KeyCode::Backspace => Some(PlayerAction::Backspace),
            KeyCode::Char(ch) if !ev.mods.contains(KeyModifiers::CONTROL) => {
                if ch.is_ascii() && !ch.is_ascii_control() {
                    Some(PlayerAction::Char(ch))
                } else {
                    None
                }
            }
            _ => None,
        },
        Phase::GameOver => match ev.key {
            KeyCode::Enter | KeyCode::Char('r') | KeyCode::Char('R') => Some(PlayerAction::Restart),
            _ => None,
        },
    }
}

/// The pending command line.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    text: String,
}

impl LineBuffer {
    pub(crate) fn as_str(&self) -> &str {
        &self.text
    }

    pub(crate) fn push(&mut self, ch: char) {
        if self.text.len() < INPUT_MAX {
            self.text.push(ch);
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.text.pop();
    }

    /// Hands back the line and leaves the buffer empty.
    pub(crate) fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    pub(crate) fn clear(&mut self) {
        self.text.clear();
    }
}
