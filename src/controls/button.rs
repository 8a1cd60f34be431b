use anyhow::{anyhow, Result};

use crate::geometry::Rect;

/// Label of the quit button.
pub const QUIT_LABEL: &str = "quit";

/// Button bar layout: 120x40 buttons, 20px apart, starting at (20, 20).
const BAR_ORIGIN_X: i32 = 20;
const BAR_ORIGIN_Y: i32 = 20;
const BUTTON_WIDTH: i32 = 120;
const BUTTON_HEIGHT: i32 = 40;
const BUTTON_GAP: i32 = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    SelectClass(String),
    Quit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub region: Rect,
    pub action: ButtonAction,
}

impl Button {
    pub fn select(label: impl Into<String>, region: Rect) -> Self {
        let label = label.into();
        Self {
            action: ButtonAction::SelectClass(label.clone()),
            label,
            region,
        }
    }

    pub fn quit(region: Rect) -> Self {
        Self {
            label: QUIT_LABEL.to_string(),
            region,
            action: ButtonAction::Quit,
        }
    }

    pub fn is_quit(&self) -> bool {
        self.action == ButtonAction::Quit
    }

    /// True when this button selects `target`.
    pub fn selects(&self, target: &str) -> bool {
        matches!(&self.action, ButtonAction::SelectClass(class) if class == target)
    }
}

/// Ordered, fixed set of on-screen buttons.
///
/// Order matters: hit-testing is first-match, so an earlier button wins any overlap.
#[derive(Clone, Debug)]
pub struct ButtonRegistry {
    buttons: Vec<Button>,
}

impl ButtonRegistry {
    pub fn new(buttons: Vec<Button>) -> Result<Self> {
        if buttons.is_empty() {
            return Err(anyhow!("button registry must not be empty"));
        }
        Ok(Self { buttons })
    }

    /// Lay out one select button per class, left to right, followed by the quit button.
    pub fn from_classes(classes: &[String]) -> Result<Self> {
        let mut buttons = Vec::with_capacity(classes.len() + 1);
        for (slot, class) in classes.iter().enumerate() {
            if class == QUIT_LABEL {
                return Err(anyhow!("'{}' is reserved for the quit button", QUIT_LABEL));
            }
            buttons.push(Button::select(class.clone(), slot_region(slot)));
        }
        buttons.push(Button::quit(slot_region(classes.len())));
        Self::new(buttons)
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn iter(&self) -> impl Iterator<Item = &Button> {
        self.buttons.iter()
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    /// First button whose region contains `(x, y)`.
    pub fn hit(&self, x: i32, y: i32) -> Option<&Button> {
        self.buttons.iter().find(|b| b.region.contains(x, y))
    }

    /// Classes offered by select buttons, in bar order.
    pub fn classes(&self) -> Vec<String> {
        self.buttons
            .iter()
            .filter_map(|b| match &b.action {
                ButtonAction::SelectClass(class) => Some(class.clone()),
                ButtonAction::Quit => None,
            })
            .collect()
    }
}

fn slot_region(slot: usize) -> Rect {
    let x1 = BAR_ORIGIN_X + slot as i32 * (BUTTON_WIDTH + BUTTON_GAP);
    Rect::new(
        x1,
        BAR_ORIGIN_Y,
        x1 + BUTTON_WIDTH,
        BAR_ORIGIN_Y + BUTTON_HEIGHT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes() -> Vec<String> {
        ["person", "car", "dog", "bicycle"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn default_layout_matches_reference_bar() -> Result<()> {
        let registry = ButtonRegistry::from_classes(&classes())?;
        let regions: Vec<(String, Rect)> = registry
            .iter()
            .map(|b| (b.label.clone(), b.region))
            .collect();
        assert_eq!(
            regions,
            vec![
                ("person".to_string(), Rect::new(20, 20, 140, 60)),
                ("car".to_string(), Rect::new(160, 20, 280, 60)),
                ("dog".to_string(), Rect::new(300, 20, 420, 60)),
                ("bicycle".to_string(), Rect::new(440, 20, 560, 60)),
                ("quit".to_string(), Rect::new(580, 20, 700, 60)),
            ]
        );
        assert!(registry.buttons()[4].is_quit());
        assert_eq!(registry.classes(), classes());
        Ok(())
    }

    #[test]
    fn quit_is_reserved() {
        let err = ButtonRegistry::from_classes(&["quit".to_string()]).unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn hit_is_first_match_on_overlap() -> Result<()> {
        let registry = ButtonRegistry::new(vec![
            Button::select("person", Rect::new(0, 0, 100, 100)),
            Button::select("car", Rect::new(50, 50, 150, 150)),
        ])?;
        assert_eq!(registry.hit(75, 75).map(|b| b.label.as_str()), Some("person"));
        assert_eq!(registry.hit(120, 120).map(|b| b.label.as_str()), Some("car"));
        assert!(registry.hit(200, 200).is_none());
        Ok(())
    }

    #[test]
    fn empty_registry_is_rejected() {
        assert!(ButtonRegistry::new(Vec::new()).is_err());
    }
}
