/*!
 * Destination resolution for frame sequences.
 *
 * Resolution runs in two steps so a run can fail on curated input before touching disk:
 * 1. `resolve_shot`: mapping lookup, type tokens and publish base directory (pure)
 * 2. `allocate`: version reservation and the per-frame rename map
 */

use chrono::{Local, NaiveDate};
use log::info;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::app_config::{Config, JobOptions};
use crate::errors::{IngestError, MappingError};
use crate::mapping::{MappingRecord, MappingTable, TypeTokens};
use crate::sequence::FrameSequence;

use super::template;
use super::version;

const REPO: &str = "repo";

/// Mapping data and publish directory for one sequence
#[derive(Debug, Clone)]
pub struct ResolvedShot {
    pub scene: String,
    pub record: MappingRecord,
    pub tokens: TypeTokens,
    /// Publish base directory of the shot
    pub base: PathBuf,
}

/// Source plate and its renamed destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateTarget {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Frame number carried by the destination name
    pub frame: u32,
}

/// Concrete output locations for one sequence, all under one version
#[derive(Debug, Clone)]
pub struct DestinationSet {
    pub version: String,
    pub plate_dir: PathBuf,
    pub proxy_dir: PathBuf,
    pub movie_dir: PathBuf,
    /// Ordered by ascending source frame
    pub plates: Vec<PlateTarget>,
    pub shot: ResolvedShot,
}

impl DestinationSet {
    /// Source to destination pairs in frame order
    pub fn copy_pairs(&self) -> Vec<(PathBuf, PathBuf)> {
        self.plates
            .iter()
            .map(|p| (p.source.clone(), p.destination.clone()))
            .collect()
    }
}

/// Computes versioned destinations from mapping data and path templates
pub struct PathResolver<'a> {
    config: &'a Config,
    job: &'a JobOptions,
    mapping: &'a MappingTable,
}

impl<'a> PathResolver<'a> {
    pub fn new(config: &'a Config, job: &'a JobOptions, mapping: &'a MappingTable) -> Self {
        Self { config, job, mapping }
    }

    /// Resolve mapping data and the publish base directory.
    ///
    /// Fails when the sequence has no scene/shot, no mapping entry matches, or the type
    /// string is malformed.
    pub fn resolve_shot(&self, sequence: &FrameSequence) -> Result<ResolvedShot, IngestError> {
        let (Some(scene), Some(shot)) = (&sequence.scene, &sequence.shot) else {
            return Err(MappingError::MissingSceneShot(sequence.pattern()).into());
        };

        let record = self.mapping.find(scene, shot)?;
        let tokens = record.type_tokens()?;

        let project_root = self.project_root()?;
        let vars = HashMap::from([
            ("project_root", project_root),
            ("repo", REPO.to_string()),
            ("sequence", format!("SC_{}", scene)),
            ("shot", format!("SH_{}", record.shot_code())),
        ]);
        let base = PathBuf::from(template::render(&self.config.templates.publish_base, &vars)?);

        Ok(ResolvedShot {
            scene: scene.clone(),
            record,
            tokens,
            base,
        })
    }

    /// Reserve the next version and build the destination set for a resolved shot
    pub fn allocate(&self, sequence: &FrameSequence, shot: ResolvedShot) -> Result<DestinationSet, IngestError> {
        let version = version::reserve_next_version(&shot.base)?;
        let proxy_resolution = self.config.resolution_string(&self.job.resolution);

        let variant_dir = shot.base.join(&shot.tokens.variant);
        let plate_dir = match &shot.tokens.product_type {
            Some(product_type) => variant_dir.join(product_type).join(&version),
            None => variant_dir.join(&version),
        };
        let proxy_dir = variant_dir.join("proxy").join(&version).join(&proxy_resolution);
        let movie_dir = variant_dir.join("mov").join(&version);

        let plates = self.rename_map(sequence, &shot.record, &plate_dir);

        info!(
            "{} -> {} ({} plates, {})",
            sequence,
            plate_dir.display(),
            plates.len(),
            version
        );

        Ok(DestinationSet {
            version,
            plate_dir,
            proxy_dir,
            movie_dir,
            plates,
            shot,
        })
    }

    /// Both steps in one call
    pub fn resolve(&self, sequence: &FrameSequence) -> Result<DestinationSet, IngestError> {
        let shot = self.resolve_shot(sequence)?;
        self.allocate(sequence, shot)
    }

    /// Destination names for every member, numbered in ascending source order.
    ///
    /// Numbering is fixed here, before any copy task exists.
    pub fn rename_map(&self, sequence: &FrameSequence, record: &MappingRecord, plate_dir: &Path) -> Vec<PlateTarget> {
        let ext = if sequence.extension.is_empty() {
            String::new()
        } else {
            format!(".{}", sequence.extension)
        };

        sequence
            .frames()
            .iter()
            .enumerate()
            .map(|(index, frame)| {
                let number = if self.job.preserve_frame_numbers {
                    frame.number
                } else {
                    self.job.start_frame + index as u32
                };
                let name = plate_file_name(record, sequence.resolution.as_deref(), number, &ext);
                PlateTarget {
                    source: frame.path.clone(),
                    destination: plate_dir.join(name),
                    frame: number,
                }
            })
            .collect()
    }

    /// Directory that receives standalone files
    pub fn delivery_dir(&self) -> Result<PathBuf, IngestError> {
        let vars = HashMap::from([
            ("project_root", self.project_root()?),
            ("repo", REPO.to_string()),
            ("vendor", self.job.vendor.clone().unwrap_or_else(|| "unknown_vendor".to_string())),
            ("date", self.delivery_date()?),
        ]);
        Ok(PathBuf::from(template::render(&self.config.templates.delivery, &vars)?))
    }

    /// Vendor delivery folder built from project, vendor and input date
    pub fn source_dir(&self) -> Result<PathBuf, IngestError> {
        let vendor = self
            .job
            .vendor
            .clone()
            .ok_or_else(|| IngestError::Config("a vendor is required to locate the delivery".to_string()))?;
        if self.job.input_date.is_none() {
            return Err(IngestError::Config("an input date is required to locate the delivery".to_string()));
        }

        let scene = self.job.scene.clone().unwrap_or_default();
        let shot = match &self.job.shot {
            Some(shot) if !scene.is_empty() => format!("{}_{}", scene, shot),
            Some(shot) => shot.clone(),
            None => String::new(),
        };

        let vars = HashMap::from([
            ("project_root", self.project_root()?),
            ("vendor", vendor),
            ("date", self.delivery_date()?),
            ("scene", scene),
            ("shot", shot),
        ]);
        Ok(PathBuf::from(template::render(&self.config.templates.ingest_workspace, &vars)?))
    }

    fn project_root(&self) -> Result<String, IngestError> {
        let vars = HashMap::from([
            ("output", self.job.output.to_string_lossy().to_string()),
            ("project", self.job.project.clone()),
        ]);
        template::render(&self.config.templates.project_root, &vars)
    }

    // YYYY-MM-DD input rendered as YYYYMMDD; today when absent
    fn delivery_date(&self) -> Result<String, IngestError> {
        match &self.job.input_date {
            Some(date) => compact_date(date),
            None => Ok(Local::now().format("%Y%m%d").to_string()),
        }
    }
}

/// `<label>_<type>_f<resolution>_<frame:04><ext>`; the resolution segment is dropped when unknown
pub fn plate_file_name(record: &MappingRecord, resolution: Option<&str>, frame: u32, ext: &str) -> String {
    match resolution {
        Some(res) => format!("{}_{}_f{}_{:04}{}", record.label, record.type_string, res, frame, ext),
        None => format!("{}_{}_{:04}{}", record.label, record.type_string, frame, ext),
    }
}

/// Convert `YYYY-MM-DD` to `YYYYMMDD`
pub fn compact_date(date: &str) -> Result<String, IngestError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y%m%d").to_string())
        .map_err(|_| IngestError::Config(format!("input date '{}' must be in YYYY-MM-DD format", date)))
}
