//! Canonical library paths for master calibration frames.
//!
//! A destination depends only on the destination root, the source file
//! extension and the metadata fields named by the frame type's naming rules:
//!
//! ```text
//! <dest>/<type>/<camera>/<prefix>[_<KEY>_<value>...].<ext>
//! <dest>/<type>/<camera>[/<optic>]/DATE_<date>/<prefix>[_<KEY>_<value>...].<ext>
//! ```

use std::path::{Component, Path, PathBuf};

use crate::config::{self, DirectoryShape};
use crate::error::{Error, MetadataError, Result};
use crate::frame::FrameType;
use crate::metadata::Metadata;

/// Computes where `source_file` belongs under `dest_dir`.
pub fn plan_destination(source_file: &Path, dest_dir: &Path, metadata: &Metadata) -> Result<PathBuf> {
    let invalid = |reason: MetadataError| Error::InvalidMetadata {
        source_file: source_file.to_path_buf(),
        reason,
    };

    let type_value = metadata
        .frame_type_value()
        .ok_or_else(|| invalid(MetadataError::MissingType))?;
    let frame_type =
        FrameType::parse(&type_value).ok_or_else(|| invalid(MetadataError::UnknownType(type_value.clone())))?;
    let rules = config::naming_rules(frame_type);

    for key in rules.required {
        if metadata.text(key).is_none() {
            return Err(invalid(MetadataError::MissingProperty(key.to_string())));
        }
    }
    let camera = metadata
        .text(config::CAMERA)
        .ok_or_else(|| invalid(MetadataError::MissingProperty(config::CAMERA.to_string())))?;
    let camera = path_segment(config::CAMERA, camera).map_err(invalid)?;
    for key in rules.filename_properties {
        if let Some(value) = metadata.text(key)
            && has_separator(&value)
        {
            return Err(invalid(MetadataError::InvalidPathSegment {
                key: key.to_string(),
                value,
            }));
        }
    }

    let filename = build_filename(frame_type, metadata, &file_extension(source_file));

    let type_dir = dest_dir.join(type_directory(&type_value)).join(camera);
    let dest = match rules.shape {
        DirectoryShape::Camera => type_dir.join(filename),
        DirectoryShape::Dated => {
            let date = metadata
                .text(config::DATE)
                .ok_or_else(|| invalid(MetadataError::MissingProperty(config::DATE.to_string())))?;
            let date = path_segment(config::DATE, date).map_err(invalid)?;
            let optic = match metadata.text(config::OPTIC).filter(|o| !o.is_empty()) {
                Some(optic) => Some(path_segment(config::OPTIC, optic).map_err(invalid)?),
                None => None,
            };
            dated_path(type_dir, optic, &date, &filename)
        }
    };

    Ok(normalize(&dest))
}

/// The recorded `type` value with surrounding and repeated whitespace removed.
fn type_directory(type_value: &str) -> String {
    type_value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn has_separator(value: &str) -> bool {
    value.contains(['/', '\\'])
}

/// Accepts a metadata value as exactly one directory level below its parent.
fn path_segment(key: &str, value: String) -> std::result::Result<String, MetadataError> {
    let trimmed = value.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || has_separator(&value)
        || Path::new(&value).is_absolute()
    {
        return Err(MetadataError::InvalidPathSegment {
            key: key.to_string(),
            value,
        });
    }
    Ok(value)
}

/// Extension of the source file including the leading dot, case preserved.
pub fn file_extension(source_file: &Path) -> String {
    source_file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}

/// `<prefix>_<KEY>_<value>...<ext>` following the frame type's property order.
pub fn build_filename(frame_type: FrameType, metadata: &Metadata, extension: &str) -> String {
    let mut filename = frame_type.filename_prefix();
    for key in config::naming_rules(frame_type).filename_properties {
        if let Some(value) = metadata.text(key) {
            filename.push_str(&format!("_{}_{}", config::display_key(key), value));
        }
    }
    filename.push_str(extension);
    filename
}

fn dated_path(camera_dir: PathBuf, optic: Option<String>, date: &str, filename: &str) -> PathBuf {
    let mut path = camera_dir;
    if let Some(optic) = optic {
        path.push(optic);
    }
    path.push(format!("DATE_{date}"));
    path.push(filename);
    path
}

/// Lexically collapses `.`, `..` and repeated separators.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = out.components().next_back();
                let at_top = matches!(last, Some(Component::RootDir | Component::Prefix(_)));
                let popable = matches!(last, Some(Component::Normal(_)));
                if popable {
                    out.pop();
                } else if !at_top {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn plan(source: &str, metadata: &Metadata) -> Result<PathBuf> {
        plan_destination(Path::new(source), Path::new("/dest"), metadata)
    }

    fn bias() -> Metadata {
        Metadata::new()
            .with("type", "MASTER BIAS")
            .with("camera", "DWARFIII")
            .with("gain", 100)
            .with("offset", 10)
    }

    fn flat() -> Metadata {
        Metadata::new()
            .with("type", "MASTER FLAT")
            .with("camera", "DWARFIII")
            .with("optic", "REDCAT51")
            .with("date", "2026-01-27")
            .with("filter", "L")
    }

    fn missing_property(result: Result<PathBuf>) -> String {
        match result {
            Err(Error::InvalidMetadata {
                reason: MetadataError::MissingProperty(key),
                ..
            }) => key,
            other => panic!("expected missing property, got {other:?}"),
        }
    }

    #[test]
    fn bias_path_matches_library_layout() {
        let dest = plan("test.xisf", &bias()).unwrap();
        assert_eq!(
            dest,
            PathBuf::from("/dest/MASTER BIAS/DWARFIII/masterBias_GAIN_100_OFFSET_10.xisf")
        );
    }

    #[test]
    fn lowercase_alias_keeps_directory_and_canonical_prefix() {
        let metadata = Metadata::new()
            .with("type", "bias master")
            .with("camera", "CAM1")
            .with("gain", 100);
        let dest = plan_destination(Path::new("a.xisf"), Path::new("/lib"), &metadata).unwrap();
        assert_eq!(dest, PathBuf::from("/lib/bias master/CAM1/masterBias_GAIN_100.xisf"));
    }

    #[test]
    fn dark_puts_exposure_before_gain() {
        let metadata = Metadata::new()
            .with("type", "MASTER DARK")
            .with("camera", "DWARFIII")
            .with("gain", 100)
            .with("exposureseconds", 300)
            .with("settemp", -10);
        let dest = plan("test.fits", &metadata).unwrap();
        assert_eq!(
            dest,
            PathBuf::from(
                "/dest/MASTER DARK/DWARFIII/masterDark_EXPTIME_300_GAIN_100_SETTEMP_-10.fits"
            )
        );
    }

    #[test]
    fn flat_with_optic_places_date_directory_after_optic() {
        let dest = plan("b.xisf", &flat()).unwrap();
        assert_eq!(
            dest,
            PathBuf::from("/dest/MASTER FLAT/DWARFIII/REDCAT51/DATE_2026-01-27/masterFlat_FILTER_L.xisf")
        );
        let filename = dest.file_name().unwrap().to_str().unwrap();
        assert!(!filename.contains("2026-01-27"));
        assert_eq!(dest.to_str().unwrap().matches("2026-01-27").count(), 1);
    }

    #[test]
    fn flat_without_optic_places_date_directory_after_camera() {
        let metadata = Metadata::new()
            .with("type", "MASTER FLAT")
            .with("camera", "DWARFIII")
            .with("date", "2026-01-27");
        let dest = plan("b.xisf", &metadata).unwrap();
        assert_eq!(
            dest,
            PathBuf::from("/dest/MASTER FLAT/DWARFIII/DATE_2026-01-27/masterFlat.xisf")
        );
    }

    #[test]
    fn empty_or_null_optic_is_treated_as_absent() {
        let expected = PathBuf::from("/dest/MASTER FLAT/DWARFIII/DATE_2026-01-27/masterFlat_FILTER_L.xisf");
        assert_eq!(plan("b.xisf", &flat().with("optic", "")).unwrap(), expected);
        assert_eq!(plan("b.xisf", &flat().with("optic", Value::Null)).unwrap(), expected);
    }

    fn rejected_segment(result: Result<PathBuf>) -> (String, String) {
        match result {
            Err(Error::InvalidMetadata {
                reason: MetadataError::InvalidPathSegment { key, value },
                ..
            }) => (key, value),
            other => panic!("expected invalid path segment, got {other:?}"),
        }
    }

    #[test]
    fn absolute_camera_cannot_leave_the_library() {
        let metadata = Metadata::new().with("type", "MASTER BIAS").with("camera", "/etc");
        let result = plan_destination(Path::new("a.xisf"), Path::new("/lib"), &metadata);
        assert_eq!(rejected_segment(result), ("camera".to_string(), "/etc".to_string()));
    }

    #[test]
    fn traversal_values_are_rejected() {
        assert_eq!(rejected_segment(plan("a.xisf", &bias().with("camera", ".."))).0, "camera");
        assert_eq!(rejected_segment(plan("a.xisf", &bias().with("camera", "."))).0, "camera");
        assert_eq!(rejected_segment(plan("a.xisf", &bias().with("camera", "a/../../x"))).0, "camera");
        assert_eq!(rejected_segment(plan("a.xisf", &bias().with("camera", "a\\b"))).0, "camera");
        assert_eq!(rejected_segment(plan("a.xisf", &bias().with("camera", "  "))).0, "camera");
        assert_eq!(rejected_segment(plan("b.xisf", &flat().with("optic", "../.."))).0, "optic");
        assert_eq!(rejected_segment(plan("b.xisf", &flat().with("optic", "/tmp"))).0, "optic");
        assert_eq!(rejected_segment(plan("b.xisf", &flat().with("date", "2026/01/27"))).0, "date");
    }

    #[test]
    fn filename_values_cannot_add_directories() {
        let (key, value) = rejected_segment(plan("b.xisf", &flat().with("filter", "../../../x")));
        assert_eq!(key, "filter");
        assert_eq!(value, "../../../x");
        assert_eq!(rejected_segment(plan("a.xisf", &bias().with("readoutmode", "a/b"))).0, "readoutmode");
    }

    #[test]
    fn dots_inside_values_are_kept() {
        let dest = plan("a.xisf", &bias().with("camera", "ASI2600MM.v2")).unwrap();
        assert_eq!(
            dest,
            PathBuf::from("/dest/MASTER BIAS/ASI2600MM.v2/masterBias_GAIN_100_OFFSET_10.xisf")
        );
    }

    #[test]
    fn type_directory_drops_extra_whitespace() {
        let metadata = Metadata::new()
            .with("type", " master  bias ")
            .with("camera", "C");
        let dest = plan_destination(Path::new("a.xisf"), Path::new("/lib"), &metadata).unwrap();
        assert_eq!(dest, PathBuf::from("/lib/master bias/C/masterBias.xisf"));
    }

    #[test]
    fn missing_type_is_invalid() {
        let metadata = Metadata::new().with("camera", "DWARFIII");
        assert!(matches!(
            plan("x.xisf", &metadata),
            Err(Error::InvalidMetadata {
                reason: MetadataError::MissingType,
                ..
            })
        ));
    }

    #[test]
    fn unknown_type_is_invalid() {
        let metadata = Metadata::new().with("type", "MASTER LIGHT").with("camera", "C");
        match plan("x.xisf", &metadata) {
            Err(Error::InvalidMetadata {
                reason: MetadataError::UnknownType(t),
                source_file,
            }) => {
                assert_eq!(t, "MASTER LIGHT");
                assert_eq!(source_file, PathBuf::from("x.xisf"));
            }
            other => panic!("expected unknown type, got {other:?}"),
        }
    }

    #[test]
    fn missing_required_properties_are_named() {
        let no_camera = Metadata::new().with("type", "MASTER BIAS").with("gain", 100);
        assert_eq!(missing_property(plan("x.xisf", &no_camera)), "camera");

        let null_camera = bias().with("camera", Value::Null);
        assert_eq!(missing_property(plan("x.xisf", &null_camera)), "camera");

        let no_date = flat().with("date", Value::Null);
        assert_eq!(missing_property(plan("x.xisf", &no_date)), "date");

        let no_exposure = Metadata::new().with("type", "MASTER DARK").with("camera", "C");
        assert_eq!(missing_property(plan("x.xisf", &no_exposure)), "exposureseconds");
    }

    #[test]
    fn optional_properties_are_skipped_when_absent() {
        let metadata = Metadata::new()
            .with("type", "MASTER BIAS")
            .with("camera", "DWARFIII")
            .with("gain", 100)
            .with("readoutmode", Value::Null);
        let dest = plan("test.xisf", &metadata).unwrap();
        let name = dest.file_name().unwrap().to_str().unwrap();
        assert_eq!(name, "masterBias_GAIN_100.xisf");
    }

    #[test]
    fn unlisted_properties_never_reach_the_filename() {
        let dest = plan("test.xisf", &bias().with("binning", 2).with("date", "2026-01-01")).unwrap();
        let name = dest.file_name().unwrap().to_str().unwrap();
        assert_eq!(name, "masterBias_GAIN_100_OFFSET_10.xisf");
    }

    #[test]
    fn extension_case_is_preserved() {
        assert!(plan("a.xisf", &bias()).unwrap().to_str().unwrap().ends_with(".xisf"));
        assert!(plan("a.fits", &bias()).unwrap().to_str().unwrap().ends_with(".fits"));
        assert!(plan("a.FIT", &bias()).unwrap().to_str().unwrap().ends_with(".FIT"));
        assert!(plan("noext", &bias()).unwrap().to_str().unwrap().ends_with("OFFSET_10"));
    }

    #[test]
    fn planning_is_deterministic_across_insertion_order() {
        let forward = bias().with("settemp", -10).with("readoutmode", "Normal");
        let reversed = Metadata::new()
            .with("readoutmode", "Normal")
            .with("settemp", -10)
            .with("offset", 10)
            .with("gain", 100)
            .with("camera", "DWARFIII")
            .with("type", "MASTER BIAS");
        let a = plan("test.xisf", &forward).unwrap();
        let b = plan("test.xisf", &reversed).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, plan("test.xisf", &forward).unwrap());
        assert!(a.ends_with("masterBias_GAIN_100_OFFSET_10_SETTEMP_-10_READOUTMODE_Normal.xisf"));
    }

    #[test]
    fn destination_root_is_normalized() {
        let dest = plan_destination(Path::new("a.xisf"), Path::new("/lib//sub/./../"), &bias()).unwrap();
        assert_eq!(
            dest,
            PathBuf::from("/lib/MASTER BIAS/DWARFIII/masterBias_GAIN_100_OFFSET_10.xisf")
        );
    }

    #[test]
    fn normalize_handles_relative_paths() {
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("./")), PathBuf::from("."));
    }
}
