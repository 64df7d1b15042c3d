use crate::frame::FrameType;

pub const CAMERA: &str = "camera";
pub const OPTIC: &str = "optic";
pub const DATE: &str = "date";
pub const EXPOSURE_SECONDS: &str = "exposureseconds";
pub const GAIN: &str = "gain";
pub const OFFSET: &str = "offset";
pub const SET_TEMP: &str = "settemp";
pub const READOUT_MODE: &str = "readoutmode";
pub const FILTER: &str = "filter";
pub const TYPE: &str = "type";

/// Container formats picked up while scanning.
pub const FILE_PATTERNS: [&str; 2] = [r"(?i).*\.xisf$", r"(?i).*\.fits$"];

/// Directory layout below `<dest>/<type>/<camera>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryShape {
    /// `<camera>/<filename>`
    Camera,
    /// `<camera>[/<optic>]/DATE_<date>/<filename>`
    Dated,
}

#[derive(Debug)]
pub struct NamingRules {
    pub required: &'static [&'static str],
    pub filename_properties: &'static [&'static str],
    pub shape: DirectoryShape,
}

static BIAS_RULES: NamingRules = NamingRules {
    required: &[CAMERA],
    filename_properties: &[GAIN, OFFSET, SET_TEMP, READOUT_MODE],
    shape: DirectoryShape::Camera,
};

static DARK_RULES: NamingRules = NamingRules {
    required: &[CAMERA, EXPOSURE_SECONDS],
    filename_properties: &[EXPOSURE_SECONDS, GAIN, OFFSET, SET_TEMP, READOUT_MODE],
    shape: DirectoryShape::Camera,
};

static FLAT_RULES: NamingRules = NamingRules {
    required: &[CAMERA, DATE],
    filename_properties: &[FILTER, GAIN, OFFSET, SET_TEMP, READOUT_MODE],
    shape: DirectoryShape::Dated,
};

pub fn naming_rules(frame_type: FrameType) -> &'static NamingRules {
    match frame_type {
        FrameType::MasterBias => &BIAS_RULES,
        FrameType::MasterDark => &DARK_RULES,
        FrameType::MasterFlat => &FLAT_RULES,
    }
}

/// Header keyword shown in filenames for a normalized metadata key.
pub fn denormalize(key: &str) -> Option<&'static str> {
    match key {
        CAMERA => Some("INSTRUME"),
        OPTIC => Some("TELESCOP"),
        DATE => Some("DATE"),
        EXPOSURE_SECONDS => Some("EXPTIME"),
        GAIN => Some("GAIN"),
        OFFSET => Some("OFFSET"),
        SET_TEMP => Some("SETTEMP"),
        READOUT_MODE => Some("READOUTMODE"),
        FILTER => Some("FILTER"),
        TYPE => Some("IMAGETYP"),
        _ => None,
    }
}

/// Display label for a key, falling back to the upper-cased key.
pub fn display_key(key: &str) -> String {
    denormalize(key)
        .map(str::to_string)
        .unwrap_or_else(|| key.to_uppercase())
}
