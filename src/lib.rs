//! Organizes master calibration frames into a library laid out by frame
//! type, camera and optical configuration.

pub mod config;
pub mod copier;
pub mod env;
pub mod error;
pub mod frame;
pub mod metadata;
pub mod organizer;
pub mod planner;

pub use copier::{FileCopier, FsCopier};
pub use error::{Error, MetadataError, Result};
pub use frame::FrameType;
pub use metadata::{Metadata, MetadataQuery, MetadataSource, SidecarSource};
pub use organizer::{CopyPlanEntry, Options, RunStatistics, TypeStats, organize, organize_with};
pub use planner::plan_destination;
