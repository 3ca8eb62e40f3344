//! Client for the Azure Cognitive Services Face API `detect` operation.

use std::collections::HashMap;
use std::time::Duration;

use nalgebra::Point2;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{DetectionError, Error, Result};
use crate::face::{
    DetectedFace, FaceAttributes, FaceLandmarks, FaceRectangle, FacialHair, Glasses, HeadPose,
    LandmarkPoint,
};
use crate::face_detection::FaceDetectionModel;

pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Attributes requested on every call.
pub const DETECT_ATTRIBUTES: &str = "age,gender,smile,facialHair,headPose,glasses";

pub struct AzureFaceModel {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl AzureFaceModel {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(Error::HttpClient)?;

        Ok(Self::with_client(client, &config.endpoint, &config.api_key))
    }

    pub fn with_client(client: Client, endpoint: &str, api_key: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn detect_url(&self) -> String {
        format!("{}/detect", self.endpoint)
    }

    async fn call_detect(&self, image: Vec<u8>) -> Result<Vec<DetectedFace>, DetectionError> {
        let response = self
            .client
            .post(self.detect_url())
            .query(&[
                ("returnFaceId", "true"),
                ("returnFaceLandmarks", "true"),
                ("returnFaceAttributes", DETECT_ATTRIBUTES),
            ])
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await
            .map_err(DetectionError::Transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(DetectionError::Transport)?;

        if !status.is_success() {
            let err = service_error(status.as_u16(), &body);
            warn!("face service returned {}: {}", status, err);
            return Err(err);
        }

        let faces: Vec<WireFace> = serde_json::from_slice(&body).map_err(|err| {
            DetectionError::service(status.as_u16(), "MalformedResponse", err.to_string())
        })?;
        debug!("face service returned {} face(s)", faces.len());

        Ok(faces.into_iter().map(WireFace::into_detected_face).collect())
    }
}

impl FaceDetectionModel for AzureFaceModel {
    async fn run(&self, image: Vec<u8>) -> Result<Vec<DetectedFace>, DetectionError> {
        self.call_detect(image).await
    }
}

fn service_error(status: u16, body: &[u8]) -> DetectionError {
    match serde_json::from_slice::<WireErrorResponse>(body) {
        Ok(WireErrorResponse { error }) => DetectionError::service(status, error.code, error.message),
        Err(_) => DetectionError::service(
            status,
            status.to_string(),
            String::from_utf8_lossy(body).trim().to_string(),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct WireErrorResponse {
    error: WireErrorBody,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFace {
    face_id: Option<String>,
    face_rectangle: WireRectangle,
    face_landmarks: Option<HashMap<String, WirePoint>>,
    face_attributes: Option<WireAttributes>,
}

#[derive(Debug, Deserialize)]
struct WireRectangle {
    top: i32,
    left: i32,
    width: i32,
    height: i32,
}

#[derive(Debug, Deserialize)]
struct WirePoint {
    x: f32,
    y: f32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireAttributes {
    age: f64,
    gender: String,
    smile: f64,
    facial_hair: WireFacialHair,
    head_pose: WireHeadPose,
    glasses: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireFacialHair {
    moustache: f64,
    beard: f64,
    sideburns: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireHeadPose {
    roll: f64,
    yaw: f64,
    pitch: f64,
}

impl WireFace {
    fn into_detected_face(self) -> DetectedFace {
        let rectangle = FaceRectangle::new(
            self.face_rectangle.left,
            self.face_rectangle.top,
            self.face_rectangle.width,
            self.face_rectangle.height,
        );

        // unknown landmark names are skipped
        let landmarks = self.face_landmarks.map(|points| {
            FaceLandmarks::from_points(points.into_iter().filter_map(|(name, p)| {
                LandmarkPoint::from_name(&name).map(|point| (point, Point2::new(p.x, p.y)))
            }))
        });

        let attributes = self.face_attributes.map(|a| FaceAttributes {
            age: a.age,
            gender: a.gender,
            smile: a.smile,
            facial_hair: FacialHair {
                moustache: a.facial_hair.moustache,
                beard: a.facial_hair.beard,
                sideburns: a.facial_hair.sideburns,
            },
            head_pose: HeadPose {
                roll: a.head_pose.roll,
                yaw: a.head_pose.yaw,
                pitch: a.head_pose.pitch,
            },
            glasses: Glasses::from_label(&a.glasses),
        });

        DetectedFace {
            face_id: self.face_id,
            rectangle,
            landmarks,
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_FACE: &str = r#"[{
        "faceId": "c5c24a82-6845-4031-9d5d-978df9175426",
        "faceRectangle": {"width": 78, "height": 78, "left": 394, "top": 54},
        "faceLandmarks": {
            "pupilLeft": {"x": 412.7, "y": 78.4},
            "pupilRight": {"x": 446.8, "y": 74.2},
            "noseTip": {"x": 437.7, "y": 92.4}
        },
        "faceAttributes": {
            "age": 71.0,
            "gender": "male",
            "smile": 0.88,
            "facialHair": {"moustache": 0.8, "beard": 0.1, "sideburns": 0.02},
            "glasses": "sunglasses",
            "headPose": {"roll": 2.1, "yaw": 3.0, "pitch": 0.0}
        }
    }]"#;

    #[test]
    fn decodes_detect_response() {
        let faces: Vec<WireFace> = serde_json::from_str(ONE_FACE).unwrap();
        let face = faces.into_iter().next().unwrap().into_detected_face();

        assert_eq!(face.rectangle, FaceRectangle::new(394, 54, 78, 78));
        assert_eq!(
            face.face_id.as_deref(),
            Some("c5c24a82-6845-4031-9d5d-978df9175426")
        );

        let landmarks = face.landmarks.unwrap();
        assert_eq!(landmarks.len(), 3);
        assert_eq!(
            landmarks.get_point(LandmarkPoint::NoseTip),
            Some(Point2::new(437.7, 92.4))
        );

        let attributes = face.attributes.unwrap();
        assert_eq!(attributes.age, 71.0);
        assert_eq!(attributes.gender, "male");
        assert_eq!(attributes.facial_hair.beard, 0.1);
        assert_eq!(attributes.head_pose.roll, 2.1);
        assert_eq!(attributes.glasses, Glasses::Sunglasses);
    }

    #[test]
    fn missing_landmarks_and_attributes_are_none() {
        let body = r#"[{"faceRectangle": {"width": 1, "height": 2, "left": 3, "top": 4}}]"#;
        let faces: Vec<WireFace> = serde_json::from_str(body).unwrap();
        let face = faces.into_iter().next().unwrap().into_detected_face();
        assert_eq!(face.rectangle, FaceRectangle::new(3, 4, 1, 2));
        assert!(face.landmarks.is_none());
        assert!(face.attributes.is_none());
    }

    #[test]
    fn service_error_uses_vendor_body() {
        let body = br#"{"error": {"code": "InvalidImage", "message": "Decoding error."}}"#;
        match service_error(400, body) {
            DetectionError::Service(err) => {
                assert_eq!(err.status, 400);
                assert_eq!(err.code, "InvalidImage");
                assert_eq!(err.message, "Decoding error.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn service_error_falls_back_to_raw_body() {
        match service_error(503, b"upstream unavailable\n") {
            DetectionError::Service(err) => {
                assert_eq!(err.code, "503");
                assert_eq!(err.message, "upstream unavailable");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn detect_url_strips_trailing_slash() {
        let model = AzureFaceModel::with_client(Client::new(), "https://example.test/face/v1.0/", "k");
        assert_eq!(model.detect_url(), "https://example.test/face/v1.0/detect");
    }
}
