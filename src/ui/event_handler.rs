/// Distance in pixels the cursor may travel between press and release while
/// still counting as a click rather than a drag.
const CLICK_SLOP: f64 = 4.0;

/// Tracks the cursor and turns raw press/move/release events into either a
/// click or a sequence of pan deltas.
///
/// Panning only engages when the press landed on empty background; presses on
/// a circle or panel stay click candidates so a slightly shaky click does not
/// tug the canvas around.
pub struct EventHandler {
    cursor: (f64, f64),
    press: Option<PressState>,
}

struct PressState {
    origin: (f64, f64),
    last: (f64, f64),
    on_background: bool,
    dragging: bool,
}

/// What a cursor movement means for the scene.
pub enum DragUpdate {
    /// Cursor moved while panning; apply this delta to the scene offset.
    Pan { dx: f32, dy: f32 },
    /// Nothing to do.
    None,
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            cursor: (0.0, 0.0),
            press: None,
        }
    }

    /// Last known cursor position in surface pixels.
    pub fn cursor(&self) -> (f64, f64) {
        self.cursor
    }

    /// Record a button press. `on_background` is whether the press missed
    /// every circle and panel.
    pub fn press(&mut self, on_background: bool) {
        self.press = Some(PressState {
            origin: self.cursor,
            last: self.cursor,
            on_background,
            dragging: false,
        });
    }

    /// Record cursor movement, returning a pan delta while a background drag
    /// is in progress.
    pub fn cursor_moved(&mut self, x: f64, y: f64) -> DragUpdate {
        self.cursor = (x, y);
        let Some(press) = self.press.as_mut() else {
            return DragUpdate::None;
        };

        if !press.dragging {
            let dx = x - press.origin.0;
            let dy = y - press.origin.1;
            if (dx * dx + dy * dy).sqrt() <= CLICK_SLOP {
                return DragUpdate::None;
            }
            press.dragging = true;
        }

        let (dx, dy) = (x - press.last.0, y - press.last.1);
        press.last = (x, y);
        if press.on_background {
            DragUpdate::Pan {
                dx: dx as f32,
                dy: dy as f32,
            }
        } else {
            DragUpdate::None
        }
    }

    /// Record the button release. Returns the click position if the gesture
    /// stayed within the click slop.
    pub fn release(&mut self) -> Option<(f64, f64)> {
        let press = self.press.take()?;
        if press.dragging {
            None
        } else {
            Some(self.cursor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_release_without_motion_is_a_click() {
        let mut handler = EventHandler::new();
        handler.cursor_moved(100.0, 50.0);
        handler.press(false);
        assert_eq!(handler.release(), Some((100.0, 50.0)));
    }

    #[test]
    fn small_wobble_still_counts_as_a_click() {
        let mut handler = EventHandler::new();
        handler.cursor_moved(100.0, 50.0);
        handler.press(true);
        handler.cursor_moved(102.0, 51.0);
        assert_eq!(handler.release(), Some((102.0, 51.0)));
    }

    #[test]
    fn background_drag_pans_and_suppresses_the_click() {
        let mut handler = EventHandler::new();
        handler.cursor_moved(100.0, 100.0);
        handler.press(true);
        // Past the slop: the whole distance from the origin is one delta.
        match handler.cursor_moved(120.0, 100.0) {
            DragUpdate::Pan { dx, dy } => {
                assert_eq!(dx, 20.0);
                assert_eq!(dy, 0.0);
            }
            DragUpdate::None => panic!("expected a pan delta"),
        }
        match handler.cursor_moved(125.0, 103.0) {
            DragUpdate::Pan { dx, dy } => {
                assert_eq!(dx, 5.0);
                assert_eq!(dy, 3.0);
            }
            DragUpdate::None => panic!("expected a pan delta"),
        }
        assert_eq!(handler.release(), None);
    }

    #[test]
    fn drag_starting_on_a_circle_never_pans() {
        let mut handler = EventHandler::new();
        handler.cursor_moved(100.0, 100.0);
        handler.press(false);
        assert!(matches!(
            handler.cursor_moved(150.0, 100.0),
            DragUpdate::None
        ));
        // It still consumed the click.
        assert_eq!(handler.release(), None);
    }

    #[test]
    fn motion_without_a_press_is_ignored() {
        let mut handler = EventHandler::new();
        assert!(matches!(
            handler.cursor_moved(300.0, 300.0),
            DragUpdate::None
        ));
        assert_eq!(handler.release(), None);
    }
}
