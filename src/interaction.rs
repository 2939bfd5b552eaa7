use crate::pick;
use crate::scene::{ObjectHandle, Stage};
use glam::Vec2;
use log::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Modifiers {
    pub(crate) shift: bool,
    pub(crate) alt: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ModifierKey {
    Shift,
    Alt,
}

/// Pointer and modifier input, in viewport pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum InputEvent {
    PointerDown { pos: Vec2, mods: Modifiers },
    PointerMove { pos: Vec2, mods: Modifiers },
    PointerUp { pos: Vec2, mods: Modifiers },
    KeyDown(ModifierKey),
    KeyUp(ModifierKey),
    Resize { cols: u16, rows: u16 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InteractionMode {
    Rotate,
    Move,
    Depth,
}

impl InteractionMode {
    fn from_shift(shift: bool) -> Self {
        if shift {
            Self::Move
        } else {
            Self::Rotate
        }
    }

    fn cursor(self) -> Cursor {
        match self {
            Self::Rotate => Cursor::Grabbing,
            Self::Move => Cursor::Move,
            Self::Depth => Cursor::DepthResize,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Cursor {
    Default,
    Grab,
    Grabbing,
    Move,
    DepthResize,
}

impl Cursor {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Grab => "grab",
            Self::Grabbing => "grabbing",
            Self::Move => "move",
            Self::DepthResize => "depth",
        }
    }

    pub(crate) fn glyph(self) -> char {
        match self {
            Self::Default => '↖',
            Self::Grab => '✋',
            Self::Grabbing => '✊',
            Self::Move => '✥',
            Self::DepthResize => '↕',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DragSession {
    pub(crate) object: ObjectHandle,
    pub(crate) last_pointer: Vec2,
    pub(crate) mode: InteractionMode,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum InteractionState {
    Idle,
    Hovering(ObjectHandle),
    Dragging(DragSession),
}

/// What the host must do after an event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Effect {
    Cursor(Cursor),
    OrbitEnabled(bool),
    Impulse {
        object: ObjectHandle,
        mode: InteractionMode,
        delta: Vec2,
    },
    Resize { cols: u16, rows: u16 },
}

/// Hit-testing as seen by the state machine.
pub(crate) trait Picker {
    fn pick(&self, pointer: Vec2) -> Option<ObjectHandle>;
}

impl Picker for Stage {
    fn pick(&self, pointer: Vec2) -> Option<ObjectHandle> {
        pick::pick(pointer, &self.viewport, &self.camera, &self.scene).map(|h| h.object)
    }
}

/// Drag and hover state for the pointer. Holds no velocity: drags come
/// out as [`Effect::Impulse`] for the motion simulator.
pub(crate) struct InteractionMachine {
    state: InteractionState,
    mods: Modifiers,
}

impl InteractionMachine {
    pub(crate) fn new() -> Self {
        Self {
            state: InteractionState::Idle,
            mods: Modifiers::default(),
        }
    }

    pub(crate) fn state(&self) -> InteractionState {
        self.state
    }

    pub(crate) fn session(&self) -> Option<&DragSession> {
        match &self.state {
            InteractionState::Dragging(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn is_dragging(&self) -> bool {
        self.session().is_some()
    }

    pub(crate) fn hovered(&self) -> Option<ObjectHandle> {
        match self.state {
            InteractionState::Hovering(h) => Some(h),
            _ => None,
        }
    }

    pub(crate) fn handle_event<P: Picker>(&mut self, event: InputEvent, picker: &P) -> Vec<Effect> {
        let mut fx = Vec::new();
        match event {
            InputEvent::PointerDown { pos, mods } => {
                self.mods = mods;
                if self.is_dragging() {
                    return fx;
                }
                if let Some(object) = picker.pick(pos) {
                    let mode = InteractionMode::from_shift(mods.shift);
                    debug!("drag start on {object:?} in {mode:?}");
                    self.state = InteractionState::Dragging(DragSession {
                        object,
                        last_pointer: pos,
                        mode,
                    });
                    fx.push(Effect::OrbitEnabled(false));
                    fx.push(Effect::Cursor(mode.cursor()));
                }
            }
            InputEvent::PointerMove { pos, mods } => {
                self.mods = mods;
                if let InteractionState::Dragging(s) = &mut self.state {
                    let delta = pos - s.last_pointer;
                    s.last_pointer = pos;
                    if delta != Vec2::ZERO {
                        fx.push(Effect::Impulse {
                            object: s.object,
                            mode: s.mode,
                            delta,
                        });
                    }
                } else {
                    self.update_hover(picker.pick(pos), &mut fx);
                }
            }
            InputEvent::PointerUp { mods, .. } => {
                self.mods = mods;
                if let Some(s) = self.session() {
                    debug!("drag end on {:?}", s.object);
                    self.state = InteractionState::Idle;
                    fx.push(Effect::OrbitEnabled(true));
                    fx.push(Effect::Cursor(Cursor::Default));
                }
            }
            InputEvent::KeyDown(ModifierKey::Alt) => {
                self.mods.alt = true;
                if let InteractionState::Dragging(s) = &mut self.state {
                    if s.mode != InteractionMode::Depth {
                        s.mode = InteractionMode::Depth;
                        debug!("mode switch to Depth");
                        fx.push(Effect::Cursor(Cursor::DepthResize));
                    }
                }
            }
            InputEvent::KeyUp(ModifierKey::Alt) => {
                self.mods.alt = false;
                if let InteractionState::Dragging(s) = &mut self.state {
                    s.mode = InteractionMode::from_shift(self.mods.shift);
                    debug!("mode switch to {:?}", s.mode);
                    fx.push(Effect::Cursor(s.mode.cursor()));
                }
            }
            InputEvent::KeyDown(ModifierKey::Shift) | InputEvent::KeyUp(ModifierKey::Shift) => {
                self.mods.shift = matches!(event, InputEvent::KeyDown(_));
                if matches!(self.state, InteractionState::Hovering(_)) {
                    fx.push(Effect::Cursor(self.hover_cursor()));
                }
            }
            InputEvent::Resize { cols, rows } => fx.push(Effect::Resize { cols, rows }),
        }
        fx
    }

    fn hover_cursor(&self) -> Cursor {
        if self.mods.shift {
            Cursor::Move
        } else {
            Cursor::Grab
        }
    }

    fn update_hover(&mut self, hit: Option<ObjectHandle>, fx: &mut Vec<Effect>) {
        match hit {
            Some(h) => {
                self.state = InteractionState::Hovering(h);
                fx.push(Effect::Cursor(self.hover_cursor()));
            }
            None => {
                self.state = InteractionState::Idle;
                fx.push(Effect::Cursor(Cursor::Default));
            }
        }
    }
}

impl Default for InteractionMachine {
    fn default() -> Self {
        Self::new()
    }
}
