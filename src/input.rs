use crate::interaction::{InputEvent, ModifierKey, Modifiers};
use crate::scene::Viewport;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode, MouseButton,
    MouseEvent, MouseEventKind,
};
use std::time::Duration;

/// Application keys. These never reach the interaction machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Quit,
    ToggleInertia,
    ToggleGrain,
    ToggleRenderMode,
    ToggleHud,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum HostEvent {
    Input(InputEvent),
    /// Wheel notches, positive away from the scene.
    Zoom(f32),
    Command(Command),
}

/// Last known Shift/Alt state. Terminals without the keyboard enhancement
/// protocol never report bare modifier presses, so changes seen on mouse
/// events are turned into key transitions here.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ModifierTracker {
    mods: Modifiers,
}

impl ModifierTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn current(&self) -> Modifiers {
        self.mods
    }

    /// Records `next`, pushing KeyDown/KeyUp for whatever changed.
    fn sync(&mut self, next: Modifiers, out: &mut Vec<HostEvent>) {
        if next.shift != self.mods.shift {
            out.push(HostEvent::Input(key_transition(ModifierKey::Shift, next.shift)));
        }
        if next.alt != self.mods.alt {
            out.push(HostEvent::Input(key_transition(ModifierKey::Alt, next.alt)));
        }
        self.mods = next;
    }

    fn set(&mut self, key: ModifierKey, down: bool, out: &mut Vec<HostEvent>) {
        let mut next = self.mods;
        match key {
            ModifierKey::Shift => next.shift = down,
            ModifierKey::Alt => next.alt = down,
        }
        self.sync(next, out);
    }
}

fn key_transition(key: ModifierKey, down: bool) -> InputEvent {
    if down {
        InputEvent::KeyDown(key)
    } else {
        InputEvent::KeyUp(key)
    }
}

fn modifiers_of(m: KeyModifiers) -> Modifiers {
    Modifiers {
        shift: m.contains(KeyModifiers::SHIFT),
        alt: m.contains(KeyModifiers::ALT),
    }
}

pub(crate) fn collect_events_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<Event>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        out.push(event::read()?);
        if out.len() >= 64 {
            break;
        }
    }
    Ok(out)
}

pub(crate) fn translate(ev: &Event, tracker: &mut ModifierTracker, viewport: &Viewport) -> Vec<HostEvent> {
    let mut out = Vec::new();
    match ev {
        Event::Mouse(m) => translate_mouse(m, tracker, viewport, &mut out),
        Event::Key(k) => translate_key(k, tracker, &mut out),
        Event::Resize(cols, rows) => out.push(HostEvent::Input(InputEvent::Resize {
            cols: *cols,
            rows: *rows,
        })),
        _ => {}
    }
    out
}

fn translate_mouse(
    m: &MouseEvent,
    tracker: &mut ModifierTracker,
    viewport: &Viewport,
    out: &mut Vec<HostEvent>,
) {
    let pos = viewport.cell_center(m.column, m.row);
    let pointer = |mods| match m.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::PointerDown { pos, mods }),
        MouseEventKind::Up(MouseButton::Left) => Some(InputEvent::PointerUp { pos, mods }),
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            Some(InputEvent::PointerMove { pos, mods })
        }
        _ => None,
    };

    match m.kind {
        MouseEventKind::ScrollUp => out.push(HostEvent::Zoom(-1.0)),
        MouseEventKind::ScrollDown => out.push(HostEvent::Zoom(1.0)),
        _ => {
            tracker.sync(modifiers_of(m.modifiers), out);
            if let Some(ev) = pointer(tracker.current()) {
                out.push(HostEvent::Input(ev));
            }
        }
    }
}

fn translate_key(k: &KeyEvent, tracker: &mut ModifierTracker, out: &mut Vec<HostEvent>) {
    if let KeyCode::Modifier(code) = k.code {
        let key = match code {
            ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => ModifierKey::Shift,
            ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => ModifierKey::Alt,
            _ => return,
        };
        match k.kind {
            KeyEventKind::Press => tracker.set(key, true, out),
            KeyEventKind::Release => tracker.set(key, false, out),
            KeyEventKind::Repeat => {}
        }
        return;
    }

    if k.kind != KeyEventKind::Press {
        return;
    }
    if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
        out.push(HostEvent::Command(Command::Quit));
        return;
    }
    let cmd = match k.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Command::Quit,
        KeyCode::Char('i') | KeyCode::Char('I') => Command::ToggleInertia,
        KeyCode::Char('g') | KeyCode::Char('G') => Command::ToggleGrain,
        KeyCode::Char('b') | KeyCode::Char('B') => Command::ToggleRenderMode,
        KeyCode::Char('h') | KeyCode::Char('H') => Command::ToggleHud,
        _ => return,
    };
    out.push(HostEvent::Command(cmd));
}
