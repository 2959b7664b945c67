use crate::app::model::TestHandle;
use crossterm::event::{Event, KeyEvent, KeyEventKind};
use std::time::Duration;

/// Everything the view reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Key(KeyEvent),
    Resize(u16, u16),
    /// The redraw hold-off interval elapsed.
    Tick,
    /// Some test changed state.
    TestUpdated,
    /// The active mode has just been (re)entered.
    Open,
    Quit,
}

impl Message {
    /// Key presses and resizes; other terminal events are of no interest.
    pub fn from_event(event: Event) -> Option<Self> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(Message::Key(key)),
            Event::Resize(width, height) => Some(Message::Resize(width, height)),
            _ => None,
        }
    }
}

/// Work the view asks the runtime to perform on its behalf.
#[derive(Debug)]
pub enum Command {
    None,
    Run(TestHandle),
    RunAll(Vec<TestHandle>),
    /// Deliver [`Message::Tick`] after the given delay.
    Tick(Duration),
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    #[test]
    fn test_only_presses_are_forwarded() {
        let press = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE);
        let release = KeyEvent {
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
            ..press
        };

        assert_eq!(Message::from_event(Event::Key(press)), Some(Message::Key(press)));
        assert_eq!(Message::from_event(Event::Key(release)), None);
        assert_eq!(
            Message::from_event(Event::Resize(80, 24)),
            Some(Message::Resize(80, 24))
        );
        assert_eq!(Message::from_event(Event::FocusGained), None);
    }
}
