pub mod model_azure;

use std::future::Future;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::DetectionError;
use crate::face::{DetectedFace, FaceRectangle, Glasses};

/// A face detection backend.
///
/// Implementations receive the raw bytes of an encoded image and return one
/// descriptor per detected face, in the order the backend reports them.
pub trait FaceDetectionModel: Send + Sync {
    fn run(
        &self,
        image: Vec<u8>,
    ) -> impl Future<Output = Result<Vec<DetectedFace>, DetectionError>> + Send;
}

/// Runs one detection per call and reports the faces it found.
pub struct FaceDetector<M> {
    model: M,
}

impl<M: FaceDetectionModel> FaceDetector<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Uploads the file at `path` and returns the face rectangles, in response order.
    ///
    /// One summary line per face is written to stdout, ordered left to right.
    pub async fn detect(&self, path: &Path) -> Result<Vec<FaceRectangle>, DetectionError> {
        let faces = self.detect_faces(path).await?;

        let stdout = std::io::stdout();
        if let Err(err) = write_summaries(&faces, &mut stdout.lock()) {
            warn!("failed to write face summaries: {}", err);
        }

        Ok(faces.iter().map(|face| face.rectangle).collect())
    }

    /// Same as [`FaceDetector::detect`] but returns the full descriptors and writes nothing.
    pub async fn detect_faces(&self, path: &Path) -> Result<Vec<DetectedFace>, DetectionError> {
        // read the whole file up front so the handle is closed before the upload
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| DetectionError::io(path, err))?;
        debug!(path = %path.display(), bytes = bytes.len(), "uploading image");

        let faces = self.model.run(bytes).await?;
        info!(path = %path.display(), faces = faces.len(), "detection finished");
        Ok(faces)
    }
}

/// Printable attribute digest of one face, sorted by `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceSummary {
    pub age: Option<f64>,
    pub gender: Option<String>,
    pub smile: Option<f64>,
    pub beard: Option<f64>,
    pub glasses: Option<Glasses>,
    /// Horizontal center of the face rectangle.
    pub position: i32,
}

impl From<&DetectedFace> for FaceSummary {
    fn from(face: &DetectedFace) -> Self {
        let attributes = face.attributes.as_ref();
        Self {
            age: attributes.map(|a| a.age),
            gender: attributes.map(|a| a.gender.clone()),
            smile: attributes.map(|a| a.smile),
            beard: attributes.map(|a| a.facial_hair.beard),
            glasses: attributes.map(|a| a.glasses),
            position: face.rectangle.center_x(),
        }
    }
}

impl std::fmt::Display for FaceSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Age = {}, gender = {}, smile = {}, beard = {}, glasses = {}, position from left = {}",
            or_unknown(self.age),
            or_unknown(self.gender.as_ref()),
            or_unknown(self.smile),
            or_unknown(self.beard),
            or_unknown(self.glasses),
            self.position
        )
    }
}

fn or_unknown<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

/// Summaries ordered by non-decreasing horizontal center; ties keep response order.
pub fn summarize(faces: &[DetectedFace]) -> Vec<FaceSummary> {
    let mut summaries: Vec<FaceSummary> = faces.iter().map(FaceSummary::from).collect();
    summaries.sort_by_key(|s| s.position);
    summaries
}

pub fn write_summaries<W: Write>(faces: &[DetectedFace], sink: &mut W) -> std::io::Result<()> {
    for summary in summarize(faces) {
        writeln!(sink, "{}", summary)?;
    }
    sink.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::{FaceAttributes, FacialHair};

    fn face_centered_at(center: i32, age: f64) -> DetectedFace {
        DetectedFace::new(FaceRectangle::new(center - 10, 0, 20, 20)).with_attributes(
            FaceAttributes {
                age,
                gender: "female".into(),
                smile: 0.25,
                facial_hair: FacialHair {
                    beard: 0.1,
                    ..Default::default()
                },
                glasses: Glasses::ReadingGlasses,
                ..Default::default()
            },
        )
    }

    #[test]
    fn summary_line_format() {
        let summary = FaceSummary::from(&face_centered_at(50, 31.0));
        assert_eq!(
            summary.to_string(),
            "Age = 31, gender = female, smile = 0.25, beard = 0.1, glasses = ReadingGlasses, position from left = 50"
        );
    }

    #[test]
    fn summary_without_attributes_uses_placeholders() {
        let face = DetectedFace::new(FaceRectangle::new(0, 0, 9, 9));
        assert_eq!(
            FaceSummary::from(&face).to_string(),
            "Age = ?, gender = ?, smile = ?, beard = ?, glasses = ?, position from left = 4"
        );
    }

    #[test]
    fn summaries_are_ordered_left_to_right() {
        let faces = vec![
            face_centered_at(50, 1.0),
            face_centered_at(200, 2.0),
            face_centered_at(120, 3.0),
        ];
        let positions: Vec<i32> = summarize(&faces).iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![50, 120, 200]);
    }

    #[test]
    fn ties_keep_response_order() {
        let faces = vec![
            face_centered_at(70, 1.0),
            face_centered_at(30, 2.0),
            face_centered_at(70, 3.0),
        ];
        let ages: Vec<f64> = summarize(&faces).iter().filter_map(|s| s.age).collect();
        assert_eq!(ages, vec![2.0, 1.0, 3.0]);
    }

    #[test]
    fn write_summaries_emits_one_line_per_face() {
        let faces = vec![face_centered_at(200, 40.0), face_centered_at(50, 20.0)];
        let mut out = Vec::new();
        write_summaries(&faces, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Age = 20,"));
        assert!(lines[1].ends_with("position from left = 200"));
    }

    #[test]
    fn write_summaries_with_no_faces_writes_nothing() {
        let mut out = Vec::new();
        write_summaries(&[], &mut out).unwrap();
        assert!(out.is_empty());
    }
}
