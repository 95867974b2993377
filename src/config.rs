//! Pipeline configuration.
//!
//! Configuration arrives as a handful of named [`Options`] (from the command
//! line or a YAML parameter file) and is validated once into an immutable
//! [`Config`]. Layout and element type are resolved to closed enums at that
//! point, so nothing is looked up by string while images are processed.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::image::RGB_CHANNELS;

/// Memory layout of the packed tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TensorLayout {
    /// `[batch, height, width, channels]` (`nhwc`).
    ChannelLast,
    /// `[batch, channels, height, width]` (`nchw`).
    ChannelFirst,
}

impl TensorLayout {
    /// Option key accepted for this layout.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::ChannelLast => "nhwc",
            Self::ChannelFirst => "nchw",
        }
    }
}

impl FromStr for TensorLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nhwc" => Ok(Self::ChannelLast),
            "nchw" => Ok(Self::ChannelFirst),
            other => Err(Error::invalid_parameter(
                "tensor_fmt",
                format!("unsupported value `{other}`, supported: nhwc, nchw"),
            )),
        }
    }
}

impl fmt::Display for TensorLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Numeric type of each tensor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 8-bit unsigned integer (`uint8`, code 0).
    Uint8,
    /// 32-bit float (`float32`, code 2).
    Float32,
    /// 64-bit float (`float64`, code 3).
    Float64,
}

impl ElementType {
    /// Option key accepted for this element type.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Uint8 => "uint8",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// Type code written into the tensor record.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Uint8 => 0,
            Self::Float32 => 2,
            Self::Float64 => 3,
        }
    }

    /// Size of one element in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Uint8 => 1,
            Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }
}

impl FromStr for ElementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "uint8" => Ok(Self::Uint8),
            "float32" => Ok(Self::Float32),
            "float64" => Ok(Self::Float64),
            other => Err(Error::invalid_parameter(
                "data_type",
                format!("unsupported value `{other}`, supported: uint8, float32, float64"),
            )),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw, unvalidated named options.
///
/// Defaults mirror the parameter declarations of the processing node: the
/// resize target defaults to 0 and therefore has to be set explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Target width in pixels.
    pub resize_width: i64,

    /// Target height in pixels.
    pub resize_height: i64,

    /// Divide pixel values by 255.0 after type conversion.
    pub normalize: bool,

    /// Tensor layout key (`nhwc` or `nchw`).
    pub tensor_fmt: String,

    /// Element type key (`uint8`, `float32` or `float64`).
    pub data_type: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            resize_width: 0,
            resize_height: 0,
            normalize: true,
            tensor_fmt: TensorLayout::ChannelLast.key().to_string(),
            data_type: ElementType::Float32.key().to_string(),
        }
    }
}

impl Options {
    /// Load options from a YAML parameter file.
    ///
    /// Missing keys keep their defaults; unknown keys are rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::ParamsRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents, path)
    }

    fn from_yaml_str(contents: &str, path: &Path) -> Result<Self> {
        serde_yaml::from_str(contents).map_err(|source| Error::ParamsFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Validated, immutable pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    target_width: u32,
    target_height: u32,
    normalize: bool,
    layout: TensorLayout,
    element_type: ElementType,
}

impl Config {
    /// Build a configuration from already-typed values.
    ///
    /// # Errors
    ///
    /// Returns an error if either target dimension is zero, or if the
    /// resulting tensor would not be addressable.
    pub fn new(
        target_width: u32,
        target_height: u32,
        normalize: bool,
        layout: TensorLayout,
        element_type: ElementType,
    ) -> Result<Self> {
        if target_width == 0 || target_height == 0 {
            return Err(Error::invalid_parameter(
                "resize",
                format!("invalid resize value: {target_width},{target_height}"),
            ));
        }

        let payload = usize::try_from(target_width)
            .ok()
            .zip(usize::try_from(target_height).ok())
            .and_then(|(w, h)| w.checked_mul(h))
            .and_then(|px| px.checked_mul(RGB_CHANNELS))
            .and_then(|n| n.checked_mul(element_type.size()));
        if payload.is_none() {
            return Err(Error::invalid_parameter(
                "resize",
                format!(
                    "{target_width}x{target_height} {element_type} tensor exceeds addressable memory"
                ),
            ));
        }

        Ok(Self {
            target_width,
            target_height,
            normalize,
            layout,
            element_type,
        })
    }

    /// Target width in pixels.
    #[must_use]
    pub const fn target_width(&self) -> u32 {
        self.target_width
    }

    /// Target height in pixels.
    #[must_use]
    pub const fn target_height(&self) -> u32 {
        self.target_height
    }

    /// Whether values are divided by 255.0.
    #[must_use]
    pub const fn normalize(&self) -> bool {
        self.normalize
    }

    /// Output tensor layout.
    #[must_use]
    pub const fn layout(&self) -> TensorLayout {
        self.layout
    }

    /// Output element type.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Byte length of every tensor this configuration produces.
    #[must_use]
    pub fn payload_size(&self) -> usize {
        // Overflow is ruled out in `new`.
        self.target_width as usize * self.target_height as usize * RGB_CHANNELS
            * self.element_type.size()
    }
}

impl TryFrom<&Options> for Config {
    type Error = Error;

    fn try_from(options: &Options) -> Result<Self> {
        let dimension = |value: i64| u32::try_from(value).ok().filter(|&v| v > 0);
        let (Some(width), Some(height)) = (
            dimension(options.resize_width),
            dimension(options.resize_height),
        ) else {
            return Err(Error::invalid_parameter(
                "resize",
                format!(
                    "invalid resize value: {},{}",
                    options.resize_width, options.resize_height
                ),
            ));
        };

        let layout = options.tensor_fmt.parse()?;
        let element_type = options.data_type.parse()?;

        Self::new(width, height, options.normalize, layout, element_type)
    }
}

impl TryFrom<Options> for Config {
    type Error = Error;

    fn try_from(options: Options) -> Result<Self> {
        Self::try_from(&options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(width: i64, height: i64) -> Options {
        Options {
            resize_width: width,
            resize_height: height,
            ..Options::default()
        }
    }

    #[test]
    fn test_defaults_require_resize() {
        let err = Config::try_from(&Options::default()).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("invalid resize value: 0,0"));
    }

    #[test]
    fn test_default_keys() {
        let config = Config::try_from(options(224, 224)).unwrap();
        assert_eq!(config.layout(), TensorLayout::ChannelLast);
        assert_eq!(config.element_type(), ElementType::Float32);
        assert!(config.normalize());
    }

    #[test]
    fn test_dimension_boundaries() {
        assert!(Config::try_from(options(1, 1)).is_ok());
        assert!(Config::try_from(options(4096, 4096)).is_ok());
        assert!(Config::try_from(options(0, 10)).is_err());
        assert!(Config::try_from(options(10, 0)).is_err());
        assert!(Config::try_from(options(-5, 10)).is_err());
        assert!(Config::try_from(options(i64::from(u32::MAX) + 1, 10)).is_err());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let mut opts = options(8, 8);
        opts.tensor_fmt = "NCHW".to_string();
        let err = Config::try_from(&opts).unwrap_err();
        assert!(err.to_string().contains("tensor_fmt"));

        let mut opts = options(8, 8);
        opts.data_type = "float16".to_string();
        let err = Config::try_from(&opts).unwrap_err();
        assert!(err.to_string().contains("data_type"));
    }

    #[test]
    fn test_element_type_codes() {
        let cases = [
            ("uint8", 0, 1),
            ("float32", 2, 4),
            ("float64", 3, 8),
        ];
        for (key, code, size) in cases {
            let ty: ElementType = key.parse().unwrap();
            assert_eq!(ty.code(), code);
            assert_eq!(ty.size(), size);
            assert_eq!(ty.to_string(), key);
        }
    }

    #[test]
    fn test_payload_size() {
        let config = Config::new(
            224,
            224,
            true,
            TensorLayout::ChannelFirst,
            ElementType::Float64,
        )
        .unwrap();
        assert_eq!(config.payload_size(), 224 * 224 * 3 * 8);
    }

    #[test]
    fn test_yaml_options() {
        let yaml = "resize_width: 320\nresize_height: 240\ntensor_fmt: nchw\n";
        let opts = Options::from_yaml_str(yaml, Path::new("params.yaml")).unwrap();
        assert_eq!(opts.resize_width, 320);
        assert_eq!(opts.resize_height, 240);
        assert_eq!(opts.tensor_fmt, "nchw");
        assert_eq!(opts.data_type, "float32");
        assert!(opts.normalize);

        let err = Options::from_yaml_str("resize_depth: 3\n", Path::new("params.yaml"))
            .unwrap_err();
        assert!(matches!(err, Error::ParamsFile { .. }));
    }

    #[test]
    fn test_unreadable_params_file_is_fatal() {
        let err = Options::from_yaml_file("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, Error::ParamsRead { .. }));
        assert!(err.is_fatal());
    }
}
