use std::sync::Arc;

use super::button::{ButtonAction, ButtonRegistry};
use super::session::SessionState;

/// Translates pointer clicks into Session State changes.
#[derive(Clone, Debug)]
pub struct InputDispatcher {
    registry: Arc<ButtonRegistry>,
    session: Arc<SessionState>,
}

impl InputDispatcher {
    pub fn new(registry: Arc<ButtonRegistry>, session: Arc<SessionState>) -> Self {
        Self { registry, session }
    }

    /// Apply the action of the first button containing `(x, y)`.
    ///
    /// Returns the applied action, or `None` when the click missed every button.
    pub fn handle_click(&self, x: i32, y: i32) -> Option<ButtonAction> {
        let button = self.registry.hit(x, y)?;
        match &button.action {
            ButtonAction::Quit => {
                if self.session.stop() {
                    log::info!("quit button pressed at ({}, {})", x, y);
                }
            }
            ButtonAction::SelectClass(class) => {
                let previous = self.session.set_target_class(class);
                if previous != *class {
                    log::info!("switched target to: {}", class);
                }
            }
        }
        Some(button.action.clone())
    }

    pub fn registry(&self) -> &ButtonRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::button::Button;
    use crate::geometry::Rect;

    fn dispatcher() -> (InputDispatcher, Arc<SessionState>) {
        let classes: Vec<String> = ["person", "car", "dog", "bicycle"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let registry = Arc::new(ButtonRegistry::from_classes(&classes).unwrap());
        let session = SessionState::new("car");
        (InputDispatcher::new(registry, session.clone()), session)
    }

    #[test]
    fn click_on_person_button_selects_person() {
        let (dispatcher, session) = dispatcher();
        let action = dispatcher.handle_click(30, 30);
        assert_eq!(action, Some(ButtonAction::SelectClass("person".into())));
        assert_eq!(session.target_class(), "person");
        assert!(session.is_running());
    }

    #[test]
    fn click_on_quit_button_stops() {
        let (dispatcher, session) = dispatcher();
        assert_eq!(dispatcher.handle_click(600, 40), Some(ButtonAction::Quit));
        assert!(!session.is_running());
        assert_eq!(session.target_class(), "car");
    }

    #[test]
    fn every_button_interior_applies_its_own_action() {
        let (dispatcher, session) = dispatcher();
        for button in dispatcher.registry().buttons().to_vec() {
            if button.is_quit() {
                continue;
            }
            let cx = (button.region.x1 + button.region.x2) / 2;
            let cy = (button.region.y1 + button.region.y2) / 2;
            dispatcher.handle_click(cx, cy);
            assert_eq!(session.target_class(), button.label);
        }
    }

    #[test]
    fn edges_count_as_inside() {
        let (dispatcher, session) = dispatcher();
        dispatcher.handle_click(420, 60);
        assert_eq!(session.target_class(), "dog");
        dispatcher.handle_click(440, 20);
        assert_eq!(session.target_class(), "bicycle");
    }

    #[test]
    fn misses_leave_state_unchanged() {
        let (dispatcher, session) = dispatcher();
        for (x, y) in [(0, 0), (150, 40), (80, 61), (-5, -5), (10_000, 30), (710, 40)] {
            assert_eq!(dispatcher.handle_click(x, y), None);
            assert_eq!(session.target_class(), "car");
            assert!(session.is_running());
        }
    }

    #[test]
    fn reselecting_active_class_is_a_no_op() {
        let (dispatcher, session) = dispatcher();
        dispatcher.handle_click(200, 40);
        dispatcher.handle_click(200, 40);
        assert_eq!(session.target_class(), "car");
        assert!(session.is_running());
    }

    #[test]
    fn overlapping_regions_resolve_to_earliest_button() {
        let registry = ButtonRegistry::new(vec![
            Button::quit(Rect::new(0, 0, 50, 50)),
            Button::select("person", Rect::new(0, 0, 100, 100)),
        ])
        .unwrap();
        let session = SessionState::new("dog");
        let dispatcher = InputDispatcher::new(Arc::new(registry), session.clone());

        assert_eq!(dispatcher.handle_click(25, 25), Some(ButtonAction::Quit));
        assert_eq!(session.target_class(), "dog");
        assert!(!session.is_running());
    }
}
