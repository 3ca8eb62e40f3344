use nalgebra::Point2;

/// Axis-aligned face box in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaceRectangle {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl FaceRectangle {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Horizontal center, rounded towards zero.
    pub fn center_x(&self) -> i32 {
        self.left + self.width / 2
    }
}

// the 27 named points the service returns with returnFaceLandmarks=true
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LandmarkPoint {
    PupilLeft,
    PupilRight,
    NoseTip,
    MouthLeft,
    MouthRight,
    EyebrowLeftOuter,
    EyebrowLeftInner,
    EyeLeftOuter,
    EyeLeftTop,
    EyeLeftBottom,
    EyeLeftInner,
    EyebrowRightInner,
    EyebrowRightOuter,
    EyeRightInner,
    EyeRightTop,
    EyeRightBottom,
    EyeRightOuter,
    NoseRootLeft,
    NoseRootRight,
    NoseLeftAlarTop,
    NoseRightAlarTop,
    NoseLeftAlarOutTip,
    NoseRightAlarOutTip,
    UpperLipTop,
    UpperLipBottom,
    UnderLipTop,
    UnderLipBottom,
}

impl LandmarkPoint {
    pub const ALL: [LandmarkPoint; 27] = [
        LandmarkPoint::PupilLeft,
        LandmarkPoint::PupilRight,
        LandmarkPoint::NoseTip,
        LandmarkPoint::MouthLeft,
        LandmarkPoint::MouthRight,
        LandmarkPoint::EyebrowLeftOuter,
        LandmarkPoint::EyebrowLeftInner,
        LandmarkPoint::EyeLeftOuter,
        LandmarkPoint::EyeLeftTop,
        LandmarkPoint::EyeLeftBottom,
        LandmarkPoint::EyeLeftInner,
        LandmarkPoint::EyebrowRightInner,
        LandmarkPoint::EyebrowRightOuter,
        LandmarkPoint::EyeRightInner,
        LandmarkPoint::EyeRightTop,
        LandmarkPoint::EyeRightBottom,
        LandmarkPoint::EyeRightOuter,
        LandmarkPoint::NoseRootLeft,
        LandmarkPoint::NoseRootRight,
        LandmarkPoint::NoseLeftAlarTop,
        LandmarkPoint::NoseRightAlarTop,
        LandmarkPoint::NoseLeftAlarOutTip,
        LandmarkPoint::NoseRightAlarOutTip,
        LandmarkPoint::UpperLipTop,
        LandmarkPoint::UpperLipBottom,
        LandmarkPoint::UnderLipTop,
        LandmarkPoint::UnderLipBottom,
    ];

    /// Field name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            LandmarkPoint::PupilLeft => "pupilLeft",
            LandmarkPoint::PupilRight => "pupilRight",
            LandmarkPoint::NoseTip => "noseTip",
            LandmarkPoint::MouthLeft => "mouthLeft",
            LandmarkPoint::MouthRight => "mouthRight",
            LandmarkPoint::EyebrowLeftOuter => "eyebrowLeftOuter",
            LandmarkPoint::EyebrowLeftInner => "eyebrowLeftInner",
            LandmarkPoint::EyeLeftOuter => "eyeLeftOuter",
            LandmarkPoint::EyeLeftTop => "eyeLeftTop",
            LandmarkPoint::EyeLeftBottom => "eyeLeftBottom",
            LandmarkPoint::EyeLeftInner => "eyeLeftInner",
            LandmarkPoint::EyebrowRightInner => "eyebrowRightInner",
            LandmarkPoint::EyebrowRightOuter => "eyebrowRightOuter",
            LandmarkPoint::EyeRightInner => "eyeRightInner",
            LandmarkPoint::EyeRightTop => "eyeRightTop",
            LandmarkPoint::EyeRightBottom => "eyeRightBottom",
            LandmarkPoint::EyeRightOuter => "eyeRightOuter",
            LandmarkPoint::NoseRootLeft => "noseRootLeft",
            LandmarkPoint::NoseRootRight => "noseRootRight",
            LandmarkPoint::NoseLeftAlarTop => "noseLeftAlarTop",
            LandmarkPoint::NoseRightAlarTop => "noseRightAlarTop",
            LandmarkPoint::NoseLeftAlarOutTip => "noseLeftAlarOutTip",
            LandmarkPoint::NoseRightAlarOutTip => "noseRightAlarOutTip",
            LandmarkPoint::UpperLipTop => "upperLipTop",
            LandmarkPoint::UpperLipBottom => "upperLipBottom",
            LandmarkPoint::UnderLipTop => "underLipTop",
            LandmarkPoint::UnderLipBottom => "underLipBottom",
        }
    }

    pub fn from_name(name: &str) -> Option<LandmarkPoint> {
        LandmarkPoint::ALL.iter().copied().find(|p| p.as_str() == name)
    }
}

/// Landmark points of one face, in source-image pixel coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FaceLandmarks {
    points: Vec<(LandmarkPoint, Point2<f32>)>,
}

impl FaceLandmarks {
    pub fn from_points(points: impl IntoIterator<Item = (LandmarkPoint, Point2<f32>)>) -> Self {
        let mut points: Vec<_> = points.into_iter().collect();
        points.sort_by_key(|(name, _)| *name);
        points.dedup_by_key(|(name, _)| *name);
        Self { points }
    }

    pub fn get_point(&self, point: LandmarkPoint) -> Option<Point2<f32>> {
        self.points
            .binary_search_by_key(&point, |(name, _)| *name)
            .ok()
            .map(|i| self.points[i].1)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FacialHair {
    pub moustache: f64,
    pub beard: f64,
    pub sideburns: f64,
}

/// Head orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadPose {
    pub roll: f64,
    pub yaw: f64,
    pub pitch: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Glasses {
    #[default]
    NoGlasses,
    ReadingGlasses,
    Sunglasses,
    SwimmingGoggles,
}

impl Glasses {
    /// Unknown labels fall back to `NoGlasses`.
    pub fn from_label(label: &str) -> Glasses {
        match label.to_ascii_lowercase().as_str() {
            "readingglasses" => Glasses::ReadingGlasses,
            "sunglasses" => Glasses::Sunglasses,
            "swimminggoggles" => Glasses::SwimmingGoggles,
            _ => Glasses::NoGlasses,
        }
    }
}

impl std::fmt::Display for Glasses {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Glasses::NoGlasses => "NoGlasses",
            Glasses::ReadingGlasses => "ReadingGlasses",
            Glasses::Sunglasses => "Sunglasses",
            Glasses::SwimmingGoggles => "SwimmingGoggles",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FaceAttributes {
    pub age: f64,
    pub gender: String,
    pub smile: f64,
    pub facial_hair: FacialHair,
    pub head_pose: HeadPose,
    pub glasses: Glasses,
}

/// One face as reported by the detection service.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedFace {
    pub face_id: Option<String>,
    pub rectangle: FaceRectangle,
    pub landmarks: Option<FaceLandmarks>,
    pub attributes: Option<FaceAttributes>,
}

impl DetectedFace {
    pub fn new(rectangle: FaceRectangle) -> Self {
        Self {
            face_id: None,
            rectangle,
            landmarks: None,
            attributes: None,
        }
    }

    pub fn with_attributes(mut self, attributes: FaceAttributes) -> Self {
        self.attributes = Some(attributes);
        self
    }
}
