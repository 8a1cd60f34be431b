use crate::geometry::Rect;

/// One detector result for one frame. Boxes are in the pixel space of the input frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    pub bbox: Rect,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: Rect) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
            bbox,
        }
    }

    /// Caption drawn above the box, e.g. `person 0.87`.
    pub fn caption(&self) -> String {
        format!("{} {:.2}", self.label, self.confidence)
    }
}

/// Detections whose label equals `target`, in detector order.
pub fn matching<'a>(detections: &'a [Detection], target: &str) -> Vec<&'a Detection> {
    detections.iter().filter(|d| d.label == target).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_uses_two_decimals() {
        let d = Detection::new("person", 0.876, Rect::new(0, 0, 1, 1));
        assert_eq!(d.caption(), "person 0.88");
    }

    #[test]
    fn confidence_is_clamped() {
        let d = Detection::new("dog", 1.7, Rect::new(0, 0, 1, 1));
        assert_eq!(d.confidence, 1.0);
    }

    #[test]
    fn matching_keeps_only_target_in_order() {
        let dets = vec![
            Detection::new("person", 0.9, Rect::new(0, 0, 10, 10)),
            Detection::new("car", 0.8, Rect::new(5, 5, 20, 20)),
            Detection::new("person", 0.5, Rect::new(30, 30, 40, 40)),
        ];
        let hits = matching(&dets, "person");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].confidence, 0.9);
        assert_eq!(hits[1].confidence, 0.5);
        assert!(matching(&dets, "Person").is_empty());
    }
}
