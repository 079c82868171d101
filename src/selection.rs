//! Drag-to-select state machine
//!
//! ```text
//! Idle --press--> Dragging --release--> Finalized
//!   |               |  ^
//!   |               +--+ drag
//!   +------cancel---+-----------------> Cancelled
//! ```
//!
//! The machine is single-shot: the outcome is sent on a oneshot channel the
//! first time it reaches `Finalized` or `Cancelled`, and every event after
//! that is ignored. It knows nothing about windows; the preview feeds it
//! events in display space.

use crate::geometry::{to_native, DisplayRect, NativeRect, Point, Scale};
use tokio::sync::oneshot;

/// Input events, in display space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionEvent {
    /// Primary button pressed
    Press(Point),
    /// Pointer moved with the button held
    Drag(Point),
    /// Primary button released
    Release,
    /// Host window is closing
    Cancel,
}

/// What the selection produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionOutcome {
    Finalized(NativeRect),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionState {
    Idle,
    Dragging { start: Point, selection: DisplayRect },
    Finalized,
    Cancelled,
}

pub struct SelectionMachine {
    state: SelectionState,
    scale: Scale,
    completion: Option<oneshot::Sender<SelectionOutcome>>,
}

impl SelectionMachine {
    /// Create a machine for a preview drawn at `scale`. The outcome is sent
    /// on `completion` exactly once.
    pub fn new(scale: Scale, completion: oneshot::Sender<SelectionOutcome>) -> Self {
        Self {
            state: SelectionState::Idle,
            scale,
            completion: Some(completion),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// The in-progress selection, if a drag is under way
    pub fn selection(&self) -> Option<DisplayRect> {
        match self.state {
            SelectionState::Dragging { selection, .. } => Some(selection),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(
            self.state,
            SelectionState::Finalized | SelectionState::Cancelled
        )
    }

    /// Feed one event. Returns true when the selection changed and the
    /// preview should be redrawn.
    pub fn handle(&mut self, event: SelectionEvent) -> bool {
        match (self.state, event) {
            (SelectionState::Finalized | SelectionState::Cancelled, _) => false,

            (SelectionState::Idle, SelectionEvent::Press(point)) => {
                self.state = SelectionState::Dragging {
                    start: point,
                    selection: DisplayRect::from_corners(point, point),
                };
                true
            }

            (SelectionState::Dragging { start, .. }, SelectionEvent::Drag(point)) => {
                self.state = SelectionState::Dragging {
                    start,
                    selection: DisplayRect::from_corners(start, point),
                };
                true
            }

            (SelectionState::Dragging { selection, .. }, SelectionEvent::Release) => {
                let native = to_native(selection, self.scale);
                tracing::debug!(
                    "Selection finalized: display {} -> native {} at scale {}",
                    selection,
                    native,
                    self.scale
                );
                self.state = SelectionState::Finalized;
                self.complete(SelectionOutcome::Finalized(native));
                false
            }

            (_, SelectionEvent::Cancel) => {
                tracing::debug!("Selection cancelled");
                self.state = SelectionState::Cancelled;
                self.complete(SelectionOutcome::Cancelled);
                false
            }

            // Drag or release before a press, or a second press mid-drag
            _ => false,
        }
    }

    fn complete(&mut self, outcome: SelectionOutcome) {
        if let Some(tx) = self.completion.take() {
            if tx.send(outcome).is_err() {
                tracing::debug!("Selection outcome dropped, receiver already gone");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(scale: f64) -> (SelectionMachine, oneshot::Receiver<SelectionOutcome>) {
        let (tx, rx) = oneshot::channel();
        (SelectionMachine::new(Scale::new(scale).unwrap(), tx), rx)
    }

    #[test]
    fn test_drag_and_release_emits_native_rect() {
        let (mut m, mut rx) = machine(0.5);

        assert!(m.handle(SelectionEvent::Press(Point::new(10.0, 10.0))));
        assert!(m.handle(SelectionEvent::Drag(Point::new(50.0, 30.0))));
        assert!(m.handle(SelectionEvent::Drag(Point::new(110.0, 60.0))));
        assert_eq!(m.selection(), Some(DisplayRect::new(10.0, 10.0, 100.0, 50.0)));

        m.handle(SelectionEvent::Release);
        assert_eq!(m.state(), SelectionState::Finalized);
        assert_eq!(
            rx.try_recv().unwrap(),
            SelectionOutcome::Finalized(NativeRect::new(20.0, 20.0, 200.0, 100.0))
        );
    }

    #[test]
    fn test_drag_up_and_left() {
        let (mut m, mut rx) = machine(1.0);
        m.handle(SelectionEvent::Press(Point::new(100.0, 80.0)));
        m.handle(SelectionEvent::Drag(Point::new(40.0, 20.0)));
        m.handle(SelectionEvent::Release);

        assert_eq!(
            rx.try_recv().unwrap(),
            SelectionOutcome::Finalized(NativeRect::new(40.0, 20.0, 60.0, 60.0))
        );
    }

    #[test]
    fn test_click_without_drag_is_degenerate_but_final() {
        let (mut m, mut rx) = machine(1.0);
        m.handle(SelectionEvent::Press(Point::new(5.0, 5.0)));
        m.handle(SelectionEvent::Release);

        match rx.try_recv().unwrap() {
            SelectionOutcome::Finalized(rect) => assert!(rect.is_degenerate()),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_cancel_from_idle() {
        let (mut m, mut rx) = machine(1.0);
        m.handle(SelectionEvent::Cancel);

        assert_eq!(m.state(), SelectionState::Cancelled);
        assert_eq!(rx.try_recv().unwrap(), SelectionOutcome::Cancelled);
    }

    #[test]
    fn test_cancel_mid_drag() {
        let (mut m, mut rx) = machine(1.0);
        m.handle(SelectionEvent::Press(Point::new(5.0, 5.0)));
        m.handle(SelectionEvent::Drag(Point::new(50.0, 50.0)));
        m.handle(SelectionEvent::Cancel);

        assert_eq!(rx.try_recv().unwrap(), SelectionOutcome::Cancelled);
        assert_eq!(m.selection(), None);
    }

    #[test]
    fn test_events_after_finalize_are_ignored() {
        let (mut m, _rx) = machine(1.0);
        m.handle(SelectionEvent::Press(Point::new(0.0, 0.0)));
        m.handle(SelectionEvent::Drag(Point::new(10.0, 10.0)));
        m.handle(SelectionEvent::Release);

        for event in [
            SelectionEvent::Press(Point::new(1.0, 1.0)),
            SelectionEvent::Drag(Point::new(9.0, 9.0)),
            SelectionEvent::Release,
            SelectionEvent::Cancel,
        ] {
            assert!(!m.handle(event));
            assert_eq!(m.state(), SelectionState::Finalized);
        }
    }

    #[test]
    fn test_events_after_cancel_are_ignored() {
        let (mut m, mut rx) = machine(1.0);
        m.handle(SelectionEvent::Cancel);
        m.handle(SelectionEvent::Press(Point::new(1.0, 1.0)));
        m.handle(SelectionEvent::Release);

        assert_eq!(m.state(), SelectionState::Cancelled);
        assert_eq!(rx.try_recv().unwrap(), SelectionOutcome::Cancelled);
    }

    #[test]
    fn test_release_and_drag_before_press_ignored() {
        let (mut m, mut rx) = machine(1.0);
        assert!(!m.handle(SelectionEvent::Drag(Point::new(3.0, 3.0))));
        assert!(!m.handle(SelectionEvent::Release));

        assert_eq!(m.state(), SelectionState::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_outcome_survives_dropped_receiver() {
        let (mut m, rx) = machine(1.0);
        drop(rx);
        m.handle(SelectionEvent::Cancel);
        assert!(m.is_done());
    }
}
