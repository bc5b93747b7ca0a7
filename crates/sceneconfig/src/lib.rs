//! TOML configuration for the background scene.
//!
//! Every key is optional; an empty file resolves to the same
//! [`scene::SceneSettings`] as `SceneSettings::default()`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use glam::DVec3;
use scene::{
    AmbientLight, Camera, FieldPalette, Lights, PointLight, SceneSettings, SolidMaterial,
    SolidParams, DEFAULT_SMOOTHING,
};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Deepest icosahedron subdivision accepted; detail 5 is already ~2000 faces.
pub const MAX_DETAIL: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialise configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Unmount automatically after this long.
    #[serde(
        deserialize_with = "deserialize_duration_opt",
        serialize_with = "serialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub run_for: Option<Duration>,
    pub window: WindowSection,
    pub camera: CameraSection,
    pub lights: LightsSection,
    pub field: FieldSection,
    pub pointer: PointerSection,
    pub solid: SolidSection,
}

/// Presentation settings for the windowed host; CLI flags override these.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
    #[serde(
        deserialize_with = "deserialize_antialias_opt",
        serialize_with = "serialize_antialias_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub antialias: Option<AntialiasSetting>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CameraSection {
    pub fov_degrees: f64,
    pub distance: f64,
}

impl Default for CameraSection {
    fn default() -> Self {
        let camera = Camera::default();
        Self {
            fov_degrees: camera.fov_degrees,
            distance: camera.distance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LightsSection {
    pub ambient_intensity: f64,
    pub point_position: [f64; 3],
    pub point_intensity: f64,
}

impl Default for LightsSection {
    fn default() -> Self {
        let lights = Lights::default();
        Self {
            ambient_intensity: lights.ambient.intensity,
            point_position: lights.point.position.to_array(),
            point_intensity: lights.point.intensity,
        }
    }
}

/// Linear RGB endpoints of the background field.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FieldSection {
    pub color_a: [f64; 3],
    pub color_b: [f64; 3],
}

impl Default for FieldSection {
    fn default() -> Self {
        let palette = FieldPalette::default();
        Self {
            color_a: palette.color_a.to_array(),
            color_b: palette.color_b.to_array(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PointerSection {
    pub smoothing: f64,
}

impl Default for PointerSection {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SolidSection {
    pub radius: f64,
    pub detail: u32,
    pub rotation_speed: f64,
    pub float_speed: f64,
    pub float_amplitude: f64,
    pub rotation_intensity: f64,
    pub distort: f64,
    pub distort_speed: f64,
    /// `#rrggbb` or `#rgb`, sRGB encoded.
    pub color: String,
    pub roughness: f64,
    pub metalness: f64,
}

impl Default for SolidSection {
    fn default() -> Self {
        let params = SolidParams::default();
        Self {
            radius: params.radius,
            detail: params.detail,
            rotation_speed: params.rotation_speed,
            float_speed: params.float_speed,
            float_amplitude: params.float_amplitude,
            rotation_intensity: params.rotation_intensity,
            distort: params.distort,
            distort_speed: params.distort_speed,
            color: "#0a0a0a".into(),
            roughness: params.material.roughness,
            metalness: params.material.metalness,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntialiasSetting {
    Auto,
    Off,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
}

impl AntialiasSetting {
    pub fn from_samples(samples: u32) -> Option<Self> {
        match samples {
            0 | 1 => Some(Self::Off),
            2 => Some(Self::Samples2),
            4 => Some(Self::Samples4),
            8 => Some(Self::Samples8),
            16 => Some(Self::Samples16),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Off => "off",
            Self::Samples2 => "2",
            Self::Samples4 => "4",
            Self::Samples8 => "8",
            Self::Samples16 => "16",
        }
    }
}

impl fmt::Display for AntialiasSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AntialiasSetting {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "auto" | "max" | "default" => Ok(Self::Auto),
            "off" | "none" | "disable" | "disabled" | "0" | "1" => Ok(Self::Off),
            other => other
                .parse::<u32>()
                .ok()
                .and_then(Self::from_samples)
                .ok_or_else(|| format!("invalid antialias setting '{other}'")),
        }
    }
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be a finite, non-negative number"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration_opt<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(duration) => {
            serializer.serialize_str(&humantime::format_duration(*duration).to_string())
        }
        None => serializer.serialize_none(),
    }
}

fn deserialize_antialias_opt<'de, D>(deserializer: D) -> Result<Option<AntialiasSetting>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Num(i64),
    }

    let helper: Option<Helper> = Option::deserialize(deserializer)?;
    let result = match helper {
        None => None,
        Some(Helper::Str(raw)) => Some(raw.parse().map_err(de::Error::custom)?),
        Some(Helper::Num(value)) => {
            if value < 0 {
                return Err(de::Error::custom("antialias value must be non-negative"));
            }
            Some(value.to_string().parse().map_err(de::Error::custom)?)
        }
    };
    Ok(result)
}

fn serialize_antialias_opt<S>(
    value: &Option<AntialiasSetting>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(setting) => serializer.serialize_str(setting.as_str()),
        None => serializer.serialize_none(),
    }
}

/// Parses `#rrggbb` / `#rgb` (leading `#` optional) into sRGB components in `[0, 1]`.
pub fn parse_hex_color(raw: &str) -> Result<[f64; 3], ConfigError> {
    let digits = raw.trim().trim_start_matches('#');
    let invalid = || ConfigError::Invalid(format!("invalid colour '{raw}'; expected #rrggbb"));
    if !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |text: &str| u8::from_str_radix(text, 16).map_err(|_| invalid());
    let bytes = match digits.len() {
        6 => [
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        ],
        3 => {
            let mut out = [0u8; 3];
            for (slot, ch) in out.iter_mut().zip(digits.chars()) {
                *slot = channel(&format!("{ch}{ch}"))?;
            }
            out
        }
        _ => return Err(invalid()),
    };
    Ok(bytes.map(|byte| f64::from(byte) / 255.0))
}

fn require(condition: bool, message: impl FnOnce() -> String) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid(message()))
    }
}

fn finite_all(values: &[f64]) -> bool {
    values.iter().all(|value| value.is_finite())
}

impl SceneConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SceneConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(run_for) = self.run_for {
            require(!run_for.is_zero(), || {
                "run_for must be greater than zero".into()
            })?;
        }

        if let Some([width, height]) = self.window.size {
            require(width > 0 && height > 0, || {
                format!("window.size must be positive, got {width}x{height}")
            })?;
        }
        if let Some(fps) = self.window.fps {
            require(fps.is_finite() && fps >= 0.0, || {
                "window.fps must be >= 0".into()
            })?;
        }

        let camera = &self.camera;
        require(
            camera.fov_degrees.is_finite()
                && camera.fov_degrees > 0.0
                && camera.fov_degrees < 180.0,
            || {
                format!(
                    "camera.fov_degrees must be in (0, 180), got {}",
                    camera.fov_degrees
                )
            },
        )?;
        require(camera.distance.is_finite() && camera.distance > 0.0, || {
            format!("camera.distance must be > 0, got {}", camera.distance)
        })?;

        let lights = &self.lights;
        require(finite_all(&lights.point_position), || {
            "lights.point_position must be finite".into()
        })?;
        for (name, value) in [
            ("lights.ambient_intensity", lights.ambient_intensity),
            ("lights.point_intensity", lights.point_intensity),
        ] {
            require(value.is_finite() && value >= 0.0, || {
                format!("{name} must be >= 0, got {value}")
            })?;
        }

        for (name, color) in [
            ("field.color_a", self.field.color_a),
            ("field.color_b", self.field.color_b),
        ] {
            require(
                color.iter().all(|c| c.is_finite() && (0.0..=1.0).contains(c)),
                || format!("{name} components must be within [0, 1]"),
            )?;
        }

        let smoothing = self.pointer.smoothing;
        require(smoothing.is_finite() && smoothing > 0.0 && smoothing <= 1.0, || {
            format!("pointer.smoothing must be in (0, 1], got {smoothing}")
        })?;

        let solid = &self.solid;
        require(solid.radius.is_finite() && solid.radius > 0.0, || {
            format!("solid.radius must be > 0, got {}", solid.radius)
        })?;
        require(solid.detail <= MAX_DETAIL, || {
            format!("solid.detail must be <= {MAX_DETAIL}, got {}", solid.detail)
        })?;
        require(
            finite_all(&[
                solid.rotation_speed,
                solid.float_speed,
                solid.float_amplitude,
                solid.rotation_intensity,
                solid.distort_speed,
            ]),
            || "solid motion parameters must be finite".into(),
        )?;
        require(solid.distort.is_finite() && (0.0..1.0).contains(&solid.distort), || {
            format!("solid.distort must be in [0, 1), got {}", solid.distort)
        })?;
        for (name, value) in [
            ("solid.roughness", solid.roughness),
            ("solid.metalness", solid.metalness),
        ] {
            require(value.is_finite() && (0.0..=1.0).contains(&value), || {
                format!("{name} must be within [0, 1], got {value}")
            })?;
        }
        parse_hex_color(&solid.color)?;

        Ok(())
    }

    /// Validates and resolves the file into scene construction constants.
    pub fn into_settings(self) -> Result<SceneSettings, ConfigError> {
        self.validate()?;
        let defaults = SceneSettings::default();
        let solid = self.solid;

        Ok(SceneSettings {
            camera: Camera {
                fov_degrees: self.camera.fov_degrees,
                distance: self.camera.distance,
                ..defaults.camera
            },
            lights: Lights {
                ambient: AmbientLight {
                    intensity: self.lights.ambient_intensity,
                },
                point: PointLight {
                    position: DVec3::from_array(self.lights.point_position),
                    intensity: self.lights.point_intensity,
                },
            },
            palette: FieldPalette {
                color_a: DVec3::from_array(self.field.color_a),
                color_b: DVec3::from_array(self.field.color_b),
            },
            pointer_smoothing: self.pointer.smoothing,
            solid: SolidParams {
                radius: solid.radius,
                detail: solid.detail,
                rotation_speed: solid.rotation_speed,
                float_speed: solid.float_speed,
                float_amplitude: solid.float_amplitude,
                rotation_intensity: solid.rotation_intensity,
                distort: solid.distort,
                distort_speed: solid.distort_speed,
                material: SolidMaterial {
                    color: DVec3::from_array(parse_hex_color(&solid.color)?),
                    roughness: solid.roughness,
                    metalness: solid.metalness,
                },
            },
        })
    }
}
