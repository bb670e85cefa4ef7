//! Reproduction capture for offline bug reports, and reconstruction of a
//! minimal test scene from a capture. Neither sits on the runtime hot path.

use crate::contract::{QueryKind, VisibilityQuery};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use sightline_common::Wall;
use std::path::Path;

const CAPTURE_VERSION: u32 = 1;

/// Errors from capture encoding/decoding and fixture IO.
#[derive(Debug, thiserror::Error)]
pub enum ReproError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported capture version {0}")]
    UnsupportedVersion(u32),
}

/// A fully reproducible serialization of one kernel query.
///
/// Attached to error logs so a bug report carries everything needed to rerun
/// the exact computation offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReproCapture {
    pub version: u32,
    pub kind: QueryKind,
    pub walls: Vec<Wall>,
    pub origin: DVec2,
    pub elevation: f64,
    pub radius: f64,
    pub distance: f64,
    pub density: f64,
    pub angle: f64,
    pub rotation: f64,
}

impl ReproCapture {
    pub fn new(kind: QueryKind, walls: &[Wall], query: &VisibilityQuery) -> Self {
        Self {
            version: CAPTURE_VERSION,
            kind,
            walls: walls.to_vec(),
            origin: query.origin,
            elevation: query.elevation,
            radius: query.radius,
            distance: query.distance,
            density: query.density,
            angle: query.angle,
            rotation: query.rotation,
        }
    }

    /// Reassemble the query this capture records. Debug capture is off: the
    /// replayed run wants the polygons, not another trace.
    pub fn query(&self) -> VisibilityQuery {
        VisibilityQuery {
            origin: self.origin,
            elevation: self.elevation,
            radius: self.radius,
            distance: self.distance,
            density: self.density,
            angle: self.angle,
            rotation: self.rotation,
            debug: false,
        }
    }

    pub fn to_json(&self) -> Result<String, ReproError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(data: &str) -> Result<Self, ReproError> {
        let capture: Self = serde_json::from_str(data)?;
        if capture.version != CAPTURE_VERSION {
            return Err(ReproError::UnsupportedVersion(capture.version));
        }
        Ok(capture)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReproError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// The single vision-emitting actor placed in a reconstructed scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionActor {
    pub position: DVec2,
    pub sight_radius: f64,
    pub angle: f64,
    pub rotation: f64,
    pub elevation: f64,
}

/// A minimal test scene rebuilt from a capture: the wall set plus one
/// vision-emitting actor. Used to generate test fixtures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestScene {
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub walls: Vec<Wall>,
    pub actor: VisionActor,
}

impl TestScene {
    /// Dimensions span every wall endpoint and the query origin.
    pub fn from_capture(name: impl Into<String>, capture: &ReproCapture) -> Self {
        let mut width = capture.origin.x;
        let mut height = capture.origin.y;
        for wall in &capture.walls {
            width = width.max(wall.p1.x).max(wall.p2.x);
            height = height.max(wall.p1.y).max(wall.p2.y);
        }
        Self {
            name: name.into(),
            width,
            height,
            walls: capture.walls.clone(),
            actor: VisionActor {
                position: capture.origin,
                sight_radius: capture.radius,
                angle: capture.angle,
                rotation: capture.rotation,
                elevation: capture.elevation,
            },
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ReproError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReproError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture() -> ReproCapture {
        let walls = vec![
            Wall::new(DVec2::new(100.0, 100.0), DVec2::new(700.0, 100.0)),
            Wall::new(DVec2::new(700.0, 100.0), DVec2::new(400.0, 900.0)),
        ];
        let query = VisibilityQuery {
            origin: DVec2::new(300.0, 250.0),
            radius: 120.0,
            distance: 1500.0,
            ..VisibilityQuery::default()
        };
        ReproCapture::new(QueryKind::Sight, &walls, &query)
    }

    #[test]
    fn json_round_trip() {
        let original = capture();
        let json = original.to_json().unwrap();
        let decoded = ReproCapture::from_json(&json).unwrap();
        assert_eq!(original, decoded);
        assert_eq!(decoded.query().origin, original.origin);
    }

    #[test]
    fn future_version_rejected() {
        let mut doc = capture();
        doc.version = 99;
        let json = serde_json::to_string(&doc).unwrap();
        assert!(matches!(
            ReproCapture::from_json(&json),
            Err(ReproError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn scene_spans_walls_and_origin() {
        let scene = TestScene::from_capture("repro", &capture());
        assert_eq!(scene.width, 700.0);
        assert_eq!(scene.height, 900.0);
        assert_eq!(scene.walls.len(), 2);
        assert_eq!(scene.actor.position, DVec2::new(300.0, 250.0));
        assert_eq!(scene.actor.sight_radius, 120.0);
    }

    #[test]
    fn scene_file_round_trip() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let scene = TestScene::from_capture("repro", &capture());
        scene.save(tmp.path()).unwrap();
        let loaded = TestScene::load(tmp.path()).unwrap();
        assert_eq!(scene, loaded);
    }
}
