//! Jump intent capture.
//!
//! Input events can arrive any number of times between two frames. They are
//! folded into a single latch that the game loop reads once per frame, so an
//! input storm still produces at most one jump per frame.

/// What a raw input event was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The play field itself.
    Field,
    /// Buttons and overlay panels.
    Chrome,
    /// A text entry widget; typing there never jumps.
    TextEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// The designated jump key.
    JumpKey,
    /// Primary pointer button pressed.
    PointerDown,
    TouchStart,
    TouchMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub target: Target,
}

impl InputEvent {
    pub const fn new(kind: InputKind, target: Target) -> Self {
        Self { kind, target }
    }

    pub const fn jump_key() -> Self {
        Self::new(InputKind::JumpKey, Target::Field)
    }

    pub const fn pointer_down(target: Target) -> Self {
        Self::new(InputKind::PointerDown, target)
    }

    /// Whether this event counts as a jump-like action when no run is active.
    pub fn is_press(&self) -> bool {
        match self.kind {
            InputKind::JumpKey => self.target != Target::TextEntry,
            InputKind::PointerDown | InputKind::TouchStart => self.target == Target::Field,
            InputKind::TouchMove => false,
        }
    }
}

/// How the host should treat the event after the controller saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Let the host apply its default handling.
    Pass,
    /// Swallow the default action (scrolling, key repeat into widgets, ...).
    Suppress,
}

#[derive(Debug, Default)]
pub struct InputController {
    enabled: bool,
    jump_requested: bool,
}

impl InputController {
    /// Starts disabled; the game enables it when a run starts.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.jump_requested = false;
        }
    }

    /// Returns `true` once per latched jump and clears the latch.
    pub fn consume_jump(&mut self) -> bool {
        std::mem::take(&mut self.jump_requested)
    }

    /// Drops a pending jump without touching the enabled flag.
    pub fn reset(&mut self) {
        self.jump_requested = false;
    }

    pub fn handle(&mut self, event: InputEvent) -> Response {
        match event.kind {
            InputKind::JumpKey => {
                if event.target != Target::TextEntry && self.enabled {
                    self.jump_requested = true;
                }
                Response::Suppress
            }
            InputKind::PointerDown | InputKind::TouchStart => {
                if event.target == Target::Chrome || !self.enabled {
                    return Response::Pass;
                }
                self.jump_requested = true;
                Response::Suppress
            }
            InputKind::TouchMove => {
                if self.enabled {
                    Response::Suppress
                } else {
                    Response::Pass
                }
            }
        }
    }
}
