//! Point, stroke and surface-state records.

use kurbo::{Affine, BezPath, Point};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A captured point in surface-local pixel space (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
    /// Wall-clock capture time in milliseconds since the Unix epoch.
    pub time: u64,
}

impl StrokePoint {
    pub fn new(x: f64, y: f64, time: u64) -> Self {
        Self { x, y, time }
    }

    /// Position as a kurbo point.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// One continuous pen-down-to-pen-up drawing action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: String,
    /// Hex color string, e.g. `#000000`.
    pub color: String,
    /// Line width in pixels.
    pub thickness: f64,
    pub points: Vec<StrokePoint>,
}

impl Stroke {
    /// Create a new empty stroke with a fresh unique id.
    pub fn new(color: impl Into<String>, thickness: f64) -> Self {
        Self {
            id: format!("stroke-{}", Uuid::new_v4()),
            color: color.into(),
            thickness,
            points: Vec::new(),
        }
    }

    /// Add a point to the stroke.
    pub fn add_point(&mut self, point: StrokePoint) {
        self.points.push(point);
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the stroke has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_point(&self) -> Option<&StrokePoint> {
        self.points.first()
    }

    pub fn last_point(&self) -> Option<&StrokePoint> {
        self.points.last()
    }

    /// The stroke as a connected polyline.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();

        let Some(first) = self.points.first() else {
            return path;
        };

        path.move_to(first.position());
        for point in self.points.iter().skip(1) {
            path.line_to(point.position());
        }

        path
    }

    /// Apply an affine transform to every point. Timestamps are kept.
    pub fn transform(&mut self, affine: Affine) {
        for point in &mut self.points {
            let moved = affine * point.position();
            point.x = moved.x;
            point.y = moved.y;
        }
    }
}

/// Derived summary of a captured signature, sent next to the rendered image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureMetadata {
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
    pub stroke_count: usize,
    pub point_count: usize,
    /// Span between the earliest and latest point, if any point exists.
    pub duration_ms: Option<u64>,
}

/// Surface dimensions plus the committed strokes in commit order.
///
/// The stroke list doubles as the undo stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceState {
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
    pub strokes: Vec<Stroke>,
}

impl SurfaceState {
    /// Create an empty state.
    pub fn new(width: u32, height: u32, dpi: u32) -> Self {
        Self {
            width,
            height,
            dpi,
            strokes: Vec::new(),
        }
    }

    /// Total number of points over all strokes.
    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(Stroke::len).sum()
    }

    /// Rescale every stroke to a new surface size.
    ///
    /// Axes scale independently; the aspect ratio is not preserved.
    pub fn renormalized(&self, width: u32, height: u32) -> Self {
        let scale_x = f64::from(width) / f64::from(self.width.max(1));
        let scale_y = f64::from(height) / f64::from(self.height.max(1));
        let affine = Affine::scale_non_uniform(scale_x, scale_y);

        let strokes = self
            .strokes
            .iter()
            .map(|stroke| {
                let mut stroke = stroke.clone();
                stroke.transform(affine);
                stroke
            })
            .collect();

        Self {
            width,
            height,
            dpi: self.dpi,
            strokes,
        }
    }

    /// Summarize the state for upload.
    pub fn metadata(&self) -> SignatureMetadata {
        let times = self.strokes.iter().flat_map(|s| s.points.iter().map(|p| p.time));
        let (min, max) = times.fold((None, None), |(min, max): (Option<u64>, Option<u64>), t| {
            (
                Some(min.map_or(t, |m| m.min(t))),
                Some(max.map_or(t, |m| m.max(t))),
            )
        });

        SignatureMetadata {
            width: self.width,
            height: self.height,
            dpi: self.dpi,
            stroke_count: self.strokes.len(),
            point_count: self.point_count(),
            duration_ms: min.zip(max).map(|(min, max)| max - min),
        }
    }

    /// Serialize to compact JSON (the onward upload shape).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke_with(points: &[(f64, f64, u64)]) -> Stroke {
        let mut stroke = Stroke::new("#000000", 2.0);
        for &(x, y, t) in points {
            stroke.add_point(StrokePoint::new(x, y, t));
        }
        stroke
    }

    #[test]
    fn test_stroke_ids_are_unique() {
        let a = Stroke::new("#000000", 2.0);
        let b = Stroke::new("#000000", 2.0);
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("stroke-"));
    }

    #[test]
    fn test_to_path_is_polyline() {
        let stroke = stroke_with(&[(0.0, 0.0, 1), (10.0, 0.0, 2), (10.0, 10.0, 3)]);
        let path = stroke.to_path();
        assert_eq!(path.elements().len(), 3);
        assert!(Stroke::new("#000", 1.0).to_path().elements().is_empty());
    }

    #[test]
    fn test_renormalize_scales_axes_independently() {
        let mut state = SurfaceState::new(400, 200, 96);
        state.strokes.push(stroke_with(&[(100.0, 50.0, 7), (200.0, 100.0, 9)]));

        let scaled = state.renormalized(800, 100);

        assert_eq!((scaled.width, scaled.height, scaled.dpi), (800, 100, 96));
        let points = &scaled.strokes[0].points;
        assert!((points[0].x - 200.0).abs() < 1e-9);
        assert!((points[0].y - 25.0).abs() < 1e-9);
        assert!((points[1].x - 400.0).abs() < 1e-9);
        assert!((points[1].y - 50.0).abs() < 1e-9);
        // Timestamps untouched
        assert_eq!(points[0].time, 7);
        assert_eq!(points[1].time, 9);
        assert_eq!(scaled.strokes[0].id, state.strokes[0].id);
    }

    #[test]
    fn test_metadata() {
        let mut state = SurfaceState::new(600, 300, 96);
        assert_eq!(state.metadata().duration_ms, None);

        state.strokes.push(stroke_with(&[(0.0, 0.0, 1000), (1.0, 1.0, 1040)]));
        state.strokes.push(stroke_with(&[(5.0, 5.0, 1500)]));

        let meta = state.metadata();
        assert_eq!(meta.stroke_count, 2);
        assert_eq!(meta.point_count, 3);
        assert_eq!(meta.duration_ms, Some(500));
    }

    #[test]
    fn test_json_shape() {
        let mut state = SurfaceState::new(600, 300, 96);
        let mut stroke = stroke_with(&[(1.5, 2.0, 42)]);
        stroke.id = "stroke-1".to_string();
        state.strokes.push(stroke);

        let value: serde_json::Value = serde_json::from_str(&state.to_json().unwrap()).unwrap();
        assert_eq!(value["width"], 600);
        assert_eq!(value["dpi"], 96);
        assert_eq!(value["strokes"][0]["id"], "stroke-1");
        assert_eq!(value["strokes"][0]["color"], "#000000");
        assert_eq!(value["strokes"][0]["thickness"], 2.0);
        assert_eq!(value["strokes"][0]["points"][0]["x"], 1.5);
        assert_eq!(value["strokes"][0]["points"][0]["time"], 42);

        let parsed = SurfaceState::from_json(&state.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn test_metadata_json_keys() {
        let state = SurfaceState::new(600, 300, 96);
        let value = serde_json::to_value(state.metadata()).unwrap();
        assert_eq!(value["strokeCount"], 0);
        assert!(value["durationMs"].is_null());
    }
}
