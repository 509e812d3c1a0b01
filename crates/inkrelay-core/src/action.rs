//! Drawing actions exchanged with clients and recorded in history.
//!
//! Actions travel as JSON objects tagged by a `type` field:
//! ```json
//! { "type": "stroke", "id": "a-1", "path": [{ "x": 0, "y": 0 }], "size": 4, "color": "#000" }
//! { "type": "image", "id": "a-2", "src": "data:image/png;base64,..." }
//! { "type": "delete-stroke", "id": "del-3", "targetId": "a-1", "timestamp": 1700000000000 }
//! { "type": "erase-stroke-request", "path": [{ "x": 0, "y": 0 }], "size": 20 }
//! { "type": "clear", "id": "clear-4" }
//! ```

use std::fmt;

use kurbo::Point;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Free-form attributes carried through untouched (color, opacity, image source, ...).
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Prefix for ids assigned to client actions that arrive without one.
pub const ACTION_ID_PREFIX: &str = "a-";
/// Prefix for ids of server-generated tombstones.
pub const DELETE_ID_PREFIX: &str = "del-";
/// Prefix for ids of clear markers.
pub const CLEAR_ID_PREFIX: &str = "clear-";

/// Opaque action identifier.
///
/// An empty id means "not yet assigned". Clients may send `null` (unassigned)
/// or a non-string scalar, which is kept in its JSON text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl<'de> Deserialize<'de> for ActionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Self::default(),
            Some(Value::String(id)) => Self(id),
            Some(other) => Self(other.to_string()),
        })
    }
}

impl ActionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id with a readable origin prefix.
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{prefix}{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ActionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Decode a field that falls back to its default when the value has the
/// wrong shape, instead of rejecting the whole action.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// One sampled point of a path, kept as the client sent it.
///
/// Extra per-point fields (pressure, tilt, time) survive storage and replay;
/// only `x` and `y` are read, and a point without numeric coordinates never
/// takes part in hit-testing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathPoint(Attributes);

impl PathPoint {
    pub fn new(x: f64, y: f64) -> Self {
        let mut fields = Attributes::new();
        fields.insert("x".to_string(), Value::from(x));
        fields.insert("y".to_string(), Value::from(y));
        Self(fields)
    }

    /// Coordinates, if both are numbers.
    pub fn position(&self) -> Option<Point> {
        let x = self.0.get("x")?.as_f64()?;
        let y = self.0.get("y")?.as_f64()?;
        Some(Point::new(x, y))
    }

    pub fn fields(&self) -> &Attributes {
        &self.0
    }
}

impl From<Point> for PathPoint {
    fn from(point: Point) -> Self {
        Self::new(point.x, point.y)
    }
}

fn to_path(points: Vec<Point>) -> Vec<PathPoint> {
    points.into_iter().map(PathPoint::from).collect()
}

/// One recorded or ephemeral event in the drawing protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Action {
    /// A freehand stroke.
    Stroke(Stroke),
    /// A placed image.
    Image(Image),
    /// Tombstone for a previously recorded stroke.
    DeleteStroke(DeleteStroke),
    /// Eraser gesture; resolved into tombstones and never stored.
    EraseStrokeRequest(EraseRequest),
    /// Marker for a full history reset.
    Clear(Clear),
}

impl Action {
    pub fn id(&self) -> &ActionId {
        match self {
            Action::Stroke(s) => &s.id,
            Action::Image(i) => &i.id,
            Action::DeleteStroke(d) => &d.id,
            Action::EraseStrokeRequest(e) => &e.id,
            Action::Clear(c) => &c.id,
        }
    }

    fn id_mut(&mut self) -> &mut ActionId {
        match self {
            Action::Stroke(s) => &mut s.id,
            Action::Image(i) => &mut i.id,
            Action::DeleteStroke(d) => &mut d.id,
            Action::EraseStrokeRequest(e) => &mut e.id,
            Action::Clear(c) => &mut c.id,
        }
    }

    /// Assign a generated id if the action has none.
    /// Returns `true` if an id was assigned.
    pub fn ensure_id(&mut self) -> bool {
        let id = self.id_mut();
        if id.is_empty() {
            *id = ActionId::generate(ACTION_ID_PREFIX);
            true
        } else {
            false
        }
    }

    /// Wire name of the action's `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Stroke(_) => "stroke",
            Action::Image(_) => "image",
            Action::DeleteStroke(_) => "delete-stroke",
            Action::EraseStrokeRequest(_) => "erase-stroke-request",
            Action::Clear(_) => "clear",
        }
    }

    pub fn as_stroke(&self) -> Option<&Stroke> {
        match self {
            Action::Stroke(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_delete_stroke(&self) -> Option<&DeleteStroke> {
        match self {
            Action::DeleteStroke(d) => Some(d),
            _ => None,
        }
    }
}

impl From<Stroke> for Action {
    fn from(stroke: Stroke) -> Self {
        Action::Stroke(stroke)
    }
}

impl From<DeleteStroke> for Action {
    fn from(delete: DeleteStroke) -> Self {
        Action::DeleteStroke(delete)
    }
}

impl From<EraseRequest> for Action {
    fn from(request: EraseRequest) -> Self {
        Action::EraseStrokeRequest(request)
    }
}

impl From<Clear> for Action {
    fn from(clear: Clear) -> Self {
        Action::Clear(clear)
    }
}

/// A freehand stroke: a sampled path plus drawing attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    #[serde(default)]
    pub id: ActionId,
    /// Sampled points, in drawing order.
    #[serde(default, deserialize_with = "lenient")]
    pub path: Vec<PathPoint>,
    /// Stroke width in canvas units.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Stroke {
    /// Width assumed for strokes that don't carry a size.
    pub const DEFAULT_SIZE: f64 = 4.0;

    pub fn new(id: impl Into<ActionId>, path: Vec<Point>) -> Self {
        Self {
            id: id.into(),
            path: to_path(path),
            size: None,
            attributes: Attributes::new(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    /// Half of the stroke width.
    pub fn half_width(&self) -> f64 {
        self.size.unwrap_or(Self::DEFAULT_SIZE) / 2.0
    }
}

/// A placed image. Everything except the id is opaque to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub id: ActionId,
    #[serde(flatten)]
    pub attributes: Attributes,
}

/// Tombstone marking a stroke as logically deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteStroke {
    #[serde(default)]
    pub id: ActionId,
    #[serde(default)]
    pub target_id: ActionId,
    /// Creation time in milliseconds since the Unix epoch.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl DeleteStroke {
    /// A tombstone for `target_id`, stamped with a fresh id and the current time.
    pub fn new(target_id: ActionId) -> Self {
        Self {
            id: ActionId::generate(DELETE_ID_PREFIX),
            target_id,
            timestamp: Some(chrono::Utc::now().timestamp_millis()),
        }
    }
}

/// Eraser gesture sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EraseRequest {
    #[serde(default)]
    pub id: ActionId,
    #[serde(default, deserialize_with = "lenient")]
    pub path: Vec<PathPoint>,
    /// Eraser diameter.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

impl EraseRequest {
    /// Eraser diameter assumed when the request carries no size.
    pub const DEFAULT_SIZE: f64 = 20.0;

    pub fn new(path: Vec<Point>) -> Self {
        Self {
            id: ActionId::default(),
            path: to_path(path),
            size: None,
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn radius(&self) -> f64 {
        self.size.unwrap_or(Self::DEFAULT_SIZE) / 2.0
    }
}

/// Full reset marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clear {
    #[serde(default)]
    pub id: ActionId,
}

impl Clear {
    pub fn new() -> Self {
        Self {
            id: ActionId::generate(CLEAR_ID_PREFIX),
        }
    }
}

impl Default for Clear {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stroke_keeps_drawing_attributes() {
        let value = json!({
            "type": "stroke",
            "id": "s1",
            "path": [{ "x": 1, "y": 2 }, { "x": 3.5, "y": 4 }],
            "size": 6,
            "color": "#ff0000",
            "tool": "pen"
        });

        let action: Action = serde_json::from_value(value).unwrap();
        let stroke = action.as_stroke().unwrap();
        assert_eq!(stroke.id.as_str(), "s1");
        let points: Vec<_> = stroke.path.iter().filter_map(PathPoint::position).collect();
        assert_eq!(points, vec![Point::new(1.0, 2.0), Point::new(3.5, 4.0)]);
        assert_eq!(stroke.size, Some(6.0));
        assert_eq!(stroke.attributes.get("color"), Some(&json!("#ff0000")));
        assert!(!stroke.attributes.contains_key("type"));

        let out = serde_json::to_value(&action).unwrap();
        assert_eq!(out["type"], "stroke");
        assert_eq!(out["tool"], "pen");
        assert_eq!(out["size"], 6.0);
    }

    #[test]
    fn test_image_passes_through() {
        let value = json!({
            "type": "image",
            "id": "img",
            "src": "data:image/png;base64,AAAA",
            "x": 10,
            "y": 20,
            "w": 64
        });

        let action: Action = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(action.kind(), "image");
        assert_eq!(serde_json::to_value(&action).unwrap(), value);
    }

    #[test]
    fn test_delete_stroke_uses_camel_case() {
        let action = Action::from(DeleteStroke::new(ActionId::from("s1")));
        let out = serde_json::to_value(&action).unwrap();

        assert_eq!(out["type"], "delete-stroke");
        assert_eq!(out["targetId"], "s1");
        assert!(out["timestamp"].is_i64());
        assert!(out["id"].as_str().unwrap().starts_with(DELETE_ID_PREFIX));
    }

    #[test]
    fn test_missing_type_is_rejected() {
        let result = serde_json::from_value::<Action>(json!({ "id": "x", "path": [] }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result = serde_json::from_value::<Action>(json!({ "type": "laser", "id": "x" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_erase_request_defaults() {
        let action: Action = serde_json::from_value(json!({ "type": "erase-stroke-request" })).unwrap();
        let Action::EraseStrokeRequest(request) = action else {
            panic!("expected erase request");
        };
        assert!(request.id.is_empty());
        assert!(request.path.is_empty());
        assert!((request.radius() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ensure_id_only_fills_missing() {
        let mut fresh: Action = serde_json::from_value(json!({ "type": "clear" })).unwrap();
        assert!(fresh.ensure_id());
        assert!(fresh.id().as_str().starts_with(ACTION_ID_PREFIX));

        let mut named = Action::from(Stroke::new("keep-me", vec![]));
        assert!(!named.ensure_id());
        assert_eq!(named.id().as_str(), "keep-me");
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(ActionId::generate("x-"), ActionId::generate("x-"));
    }

    #[test]
    fn test_null_id_counts_as_missing() {
        let mut action: Action =
            serde_json::from_value(json!({ "type": "stroke", "id": null, "path": [] })).unwrap();
        assert!(action.id().is_empty());
        assert!(action.ensure_id());
    }

    #[test]
    fn test_numeric_id_is_stringified() {
        let action: Action =
            serde_json::from_value(json!({ "type": "stroke", "id": 7, "path": [] })).unwrap();
        assert_eq!(action.id().as_str(), "7");
        assert_eq!(serde_json::to_value(&action).unwrap()["id"], "7");
    }

    #[test]
    fn test_delete_stroke_without_target_is_accepted() {
        let action: Action =
            serde_json::from_value(json!({ "type": "delete-stroke", "id": "d1" })).unwrap();
        let delete = action.as_delete_stroke().unwrap();
        assert!(delete.target_id.is_empty());
        assert_eq!(delete.timestamp, None);
    }

    #[test]
    fn test_badly_shaped_fields_fall_back_to_defaults() {
        let action: Action = serde_json::from_value(json!({
            "type": "stroke",
            "id": "s1",
            "path": null,
            "size": "thick"
        }))
        .unwrap();
        let stroke = action.as_stroke().unwrap();
        assert!(stroke.path.is_empty());
        assert_eq!(stroke.size, None);

        let action: Action = serde_json::from_value(json!({
            "type": "erase-stroke-request",
            "path": "everywhere"
        }))
        .unwrap();
        let Action::EraseStrokeRequest(request) = action else {
            panic!("expected erase request");
        };
        assert!(request.path.is_empty());
    }

    #[test]
    fn test_path_points_keep_extra_fields() {
        let value = json!({
            "type": "stroke",
            "id": "s1",
            "path": [{ "x": 1, "y": 2, "pressure": 0.5 }, { "x": 3, "y": 4, "t": 17 }]
        });

        let action: Action = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(serde_json::to_value(&action).unwrap(), value);

        let stroke = action.as_stroke().unwrap();
        assert_eq!(stroke.path[0].position(), Some(Point::new(1.0, 2.0)));
        assert_eq!(stroke.path[0].fields().get("pressure"), Some(&json!(0.5)));
    }

    #[test]
    fn test_point_without_coordinates_has_no_position() {
        let point: PathPoint = serde_json::from_value(json!({ "x": "left", "y": 2 })).unwrap();
        assert_eq!(point.position(), None);
        assert_eq!(PathPoint::new(1.5, -2.0).position(), Some(Point::new(1.5, -2.0)));
    }

    #[test]
    fn test_stroke_half_width_default() {
        let stroke = Stroke::new("s", vec![]);
        assert!((stroke.half_width() - 2.0).abs() < f64::EPSILON);
        assert!((stroke.with_size(10.0).half_width() - 5.0).abs() < f64::EPSILON);
    }
}
