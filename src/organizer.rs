use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::config;
use crate::copier::{FileCopier, FsCopier};
use crate::env::replace_env_vars;
use crate::error::{Error, Result};
use crate::frame::FrameType;
use crate::metadata::{MetadataQuery, MetadataSource, SidecarSource};
use crate::planner::plan_destination;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    pub dry_run: bool,
    pub no_overwrite: bool,
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeStats {
    pub scanned: usize,
    pub copied: usize,
    pub skipped: usize,
}

/// Per frame type counters of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatistics {
    per_type: BTreeMap<FrameType, TypeStats>,
    dry_run: bool,
}

impl RunStatistics {
    fn new(dry_run: bool) -> Self {
        Self {
            per_type: FrameType::ALL
                .into_iter()
                .map(|t| (t, TypeStats::default()))
                .collect(),
            dry_run,
        }
    }

    pub fn get(&self, frame_type: FrameType) -> TypeStats {
        self.per_type.get(&frame_type).copied().unwrap_or_default()
    }

    fn entry(&mut self, frame_type: FrameType) -> &mut TypeStats {
        self.per_type.entry(frame_type).or_default()
    }

    pub fn totals(&self) -> TypeStats {
        self.per_type.values().fold(TypeStats::default(), |acc, s| TypeStats {
            scanned: acc.scanned + s.scanned,
            copied: acc.copied + s.copied,
            skipped: acc.skipped + s.skipped,
        })
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "SUMMARY")?;
        writeln!(f, "{rule}")?;
        for frame_type in FrameType::ALL {
            let s = self.get(frame_type);
            writeln!(
                f,
                "{}: scanned={}, copied={}, skipped={}",
                frame_type, s.scanned, s.copied, s.skipped
            )?;
        }
        let t = self.totals();
        writeln!(
            f,
            "TOTAL: scanned={}, copied={}, skipped={}",
            t.scanned, t.copied, t.skipped
        )?;
        write!(f, "{rule}")?;
        if self.dry_run {
            write!(f, "\n(DRY RUN - no files were actually copied)")?;
        }
        Ok(())
    }
}

/// One planned copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPlanEntry {
    pub frame_type: FrameType,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Organizes master frames found under `source_dir` into the library at `dest_dir`.
pub fn organize(source_dir: &str, dest_dir: &str, options: Options) -> Result<RunStatistics> {
    organize_with(&SidecarSource, &FsCopier, source_dir, dest_dir, options)
}

pub fn organize_with(
    source: &dyn MetadataSource,
    copier: &dyn FileCopier,
    source_dir: &str,
    dest_dir: &str,
    options: Options,
) -> Result<RunStatistics> {
    let source_dir = PathBuf::from(replace_env_vars(source_dir));
    let dest_dir = PathBuf::from(replace_env_vars(dest_dir));

    if !source_dir.is_dir() {
        return Err(Error::InvalidSourceDirectory(source_dir));
    }

    log::info!("Scanning source directory: {}", source_dir.display());

    let mut stats = RunStatistics::new(options.dry_run);
    let mut plan = Vec::new();
    for frame_type in FrameType::ALL {
        plan.extend(plan_frame_type(source, frame_type, &source_dir, &dest_dir, options, &mut stats)?);
    }

    if options.no_overwrite {
        let existing = check_for_collisions(&plan);
        if !existing.is_empty() {
            log::error!("The following destination files already exist or are planned more than once:");
            for path in &existing {
                log::error!("  {}", path.display());
            }
            return Err(Error::DestinationCollision(existing));
        }
    }

    copy_planned(copier, &plan, options, &mut stats);

    for line in stats.to_string().lines() {
        log::info!("{line}");
    }
    Ok(stats)
}

fn plan_frame_type(
    source: &dyn MetadataSource,
    frame_type: FrameType,
    source_dir: &Path,
    dest_dir: &Path,
    options: Options,
    stats: &mut RunStatistics,
) -> Result<Vec<CopyPlanEntry>> {
    log::debug!("Scanning for {frame_type} frames...");

    let query = MetadataQuery::new(vec![source_dir.to_path_buf()])
        .with_patterns(&config::FILE_PATTERNS)?
        .frame_type(frame_type)
        .debug(options.debug);
    let found = source.filtered_metadata(&query)?;

    stats.entry(frame_type).scanned = found.len();
    log::debug!("Found {} {} frames", found.len(), frame_type);

    let mut entries = Vec::with_capacity(found.len());
    for (source_file, metadata) in found {
        match plan_destination(&source_file, dest_dir, &metadata) {
            Ok(destination) => entries.push(CopyPlanEntry {
                frame_type,
                source: source_file,
                destination,
            }),
            Err(e) => {
                log::warn!("Skipping {}: {}", source_file.display(), e);
                stats.entry(frame_type).skipped += 1;
            }
        }
    }
    Ok(entries)
}

/// Planned destinations that already exist on disk or that more than one
/// source would be copied to, each listed once in plan order.
pub fn check_for_collisions(plan: &[CopyPlanEntry]) -> Vec<PathBuf> {
    let mut planned: BTreeMap<&Path, usize> = BTreeMap::new();
    for entry in plan {
        *planned.entry(entry.destination.as_path()).or_default() += 1;
    }

    let mut reported = BTreeSet::new();
    plan.iter()
        .map(|entry| entry.destination.as_path())
        .filter(|dest| planned[dest] > 1 || dest.exists())
        .filter(|dest| reported.insert(*dest))
        .map(Path::to_path_buf)
        .collect()
}

fn copy_planned(copier: &dyn FileCopier, plan: &[CopyPlanEntry], options: Options, stats: &mut RunStatistics) {
    let pb = ProgressBar::new(plan.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) Copying masters...")
    {
        pb.set_style(style);
    }

    for entry in plan {
        let copied = pb.suspend(|| {
            log::debug!("Copy {} -> {}", entry.source.display(), entry.destination.display());
            copier.copy_file(&entry.source, &entry.destination, options.debug, options.dry_run)
        });
        match copied {
            Ok(()) => stats.entry(entry.frame_type).copied += 1,
            Err(e) => {
                let failure = Error::CopyFailure {
                    source_file: entry.source.clone(),
                    source: e,
                };
                pb.suspend(|| log::error!("{}: {}", failure, failure_reason(&failure)));
                stats.entry(entry.frame_type).skipped += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
}

fn failure_reason(error: &Error) -> String {
    std::error::Error::source(error)
        .map(|cause| cause.to_string())
        .unwrap_or_default()
}
