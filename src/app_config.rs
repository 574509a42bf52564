use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::PathBuf;

use crate::paths::resolver::compact_date;
use crate::resolution;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings, and the per-run job options.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// External tool configuration
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Named resolution presets used for proxies
    #[serde(default = "default_resolutions")]
    pub resolutions: Vec<ResolutionPreset>,

    /// Resolution used when a requested value is neither a preset nor `WxH`
    #[serde(default = "default_fallback_resolution")]
    pub fallback_resolution: String,

    /// Filesystem path templates
    #[serde(default)]
    pub templates: TemplateConfig,

    /// Pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// External tools invoked by the proxy and movie stages
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolsConfig {
    /// Image resize tool, invoked as `<tool> <input> --resize <WxH> -o <output>`
    #[serde(default = "default_resize_tool")]
    pub resize: String,

    /// Generic transcoder used as the movie fallback
    #[serde(default = "default_transcoder")]
    pub transcoder: String,

    /// Movie-composition command; receives the movie record as JSON
    #[serde(default)]
    pub composer: Option<String>,

    /// Upper bound for a single tool invocation. None waits indefinitely.
    #[serde(default)]
    pub tool_timeout_secs: Option<u64>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            resize: default_resize_tool(),
            transcoder: default_transcoder(),
            composer: None,
            tool_timeout_secs: None,
        }
    }
}

/// A named proxy resolution
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResolutionPreset {
    /// Preset name, matched case-insensitively
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl ResolutionPreset {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
        }
    }
}

/// Path templates rendered with `{token}` placeholders
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TemplateConfig {
    /// Root of a project inside the output tree. Tokens: output, project
    #[serde(default = "default_project_root_template")]
    pub project_root: String,

    /// Publish directory for one shot. Tokens: project_root, repo, sequence, shot
    #[serde(default = "default_publish_base_template")]
    pub publish_base: String,

    /// Vendor delivery folder used when no input is given. Tokens: project_root, vendor, date, scene, shot
    #[serde(default = "default_ingest_workspace_template")]
    pub ingest_workspace: String,

    /// Destination of standalone files. Tokens: project_root, repo, vendor, date
    #[serde(default = "default_delivery_template")]
    pub delivery: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            project_root: default_project_root_template(),
            publish_base: default_publish_base_template(),
            ingest_workspace: default_ingest_workspace_template(),
            delivery: default_delivery_template(),
        }
    }
}

/// Pipeline tuning knobs
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PipelineSettings {
    /// Run proxy and movie generation as two concurrent tasks
    #[serde(default)]
    pub parallel_post: bool,

    /// Override for the copy worker pool size
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// Upper bound on items processed at once. Defaults to the worker pool size.
    #[serde(default)]
    pub max_concurrent_items: Option<usize>,
}

impl PipelineSettings {
    /// Copy pool size: host core count, never below four
    pub fn worker_count(&self) -> usize {
        self.max_workers
            .filter(|n| *n > 0)
            .unwrap_or_else(|| num_cpus::get().max(default_min_workers()))
    }

    pub fn item_concurrency(&self) -> usize {
        self.max_concurrent_items
            .filter(|n| *n > 0)
            .unwrap_or_else(|| self.worker_count())
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_min_workers() -> usize {
    4
}

fn default_resize_tool() -> String {
    "oiiotool".to_string()
}

fn default_transcoder() -> String {
    "ffmpeg".to_string()
}

fn default_fallback_resolution() -> String {
    "2048x1080".to_string()
}

fn default_project_root_template() -> String {
    "{output}/{project}".to_string()
}

fn default_publish_base_template() -> String {
    "{project_root}/{repo}/sequences/{sequence}/{shot}".to_string()
}

fn default_ingest_workspace_template() -> String {
    "{project_root}/incoming/{vendor}/{date}".to_string()
}

fn default_delivery_template() -> String {
    "{project_root}/{repo}/delivery/{vendor}/{date}".to_string()
}

fn default_resolutions() -> Vec<ResolutionPreset> {
    vec![
        ResolutionPreset::new("2K_DCP", 2048, 1080),
        ResolutionPreset::new("4K_DCP", 4096, 2160),
        ResolutionPreset::new("HD_1080", 1920, 1080),
        ResolutionPreset::new("HD_720", 1280, 720),
        ResolutionPreset::new("UHD", 3840, 2160),
    ]
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.tools.resize.trim().is_empty() {
            return Err(anyhow!("A resize tool must be configured"));
        }
        if self.tools.transcoder.trim().is_empty() {
            return Err(anyhow!("A transcoder must be configured"));
        }
        if resolution::parse_literal(&self.fallback_resolution).is_none() {
            return Err(anyhow!(
                "Fallback resolution '{}' is not of the form WIDTHxHEIGHT",
                self.fallback_resolution
            ));
        }
        for preset in &self.resolutions {
            if preset.width == 0 || preset.height == 0 {
                return Err(anyhow!("Resolution preset '{}' has a zero dimension", preset.name));
            }
        }
        if !self.templates.publish_base.contains("{shot}") {
            return Err(anyhow!("The publish_base template must contain a {{shot}} token"));
        }
        Ok(())
    }

    /// Resolve a preset name or literal `WxH` against the configured table
    pub fn resolution_string(&self, name: &str) -> String {
        resolution::resolve(&self.resolutions, name, &self.fallback_resolution)
    }

    /// Names of every configured preset
    pub fn supported_resolutions(&self) -> Vec<String> {
        self.resolutions.iter().map(|p| p.name.clone()).collect()
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            tools: ToolsConfig::default(),
            resolutions: default_resolutions(),
            fallback_resolution: default_fallback_resolution(),
            templates: TemplateConfig::default(),
            pipeline: PipelineSettings::default(),
            log_level: LogLevel::default(),
        }
    }
}

/// Everything one ingest run needs to know about the job.
///
/// Built once before the run starts and never mutated afterwards.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobOptions {
    pub project: String,

    /// Vendor label, also burned into review movies
    #[serde(default)]
    pub vendor: Option<String>,

    /// Delivery date in `YYYY-MM-DD` form
    #[serde(default)]
    pub input_date: Option<String>,

    /// Scene hint; derived from file names when absent
    #[serde(default)]
    pub scene: Option<String>,

    /// Shot hint; derived from file names when absent
    #[serde(default)]
    pub shot: Option<String>,

    /// Source file or directory. Built from the ingest workspace template when absent.
    #[serde(default)]
    pub input: Option<PathBuf>,

    /// Root of the output tree
    pub output: PathBuf,

    /// Scene/shot mapping table
    pub csv_path: PathBuf,

    /// Proxy image format (file extension)
    #[serde(default = "default_proxy_format")]
    pub proxy_format: String,

    /// Proxy resolution: preset name or literal `WxH`
    #[serde(default = "default_proxy_resolution")]
    pub resolution: String,

    /// Regenerate movies that already exist
    #[serde(default)]
    pub force: bool,

    /// Recopy plates that already exist
    #[serde(default)]
    pub overwrite: bool,

    /// Generate a review movie per sequence
    #[serde(default)]
    pub mov: bool,

    /// Generate proxy images per sequence
    #[serde(default)]
    pub use_proxy: bool,

    /// First frame number of renamed plates
    #[serde(default = "default_start_frame")]
    pub start_frame: u32,

    /// Keep source frame numbers instead of renumbering from `start_frame`
    #[serde(default)]
    pub preserve_frame_numbers: bool,
}

fn default_proxy_format() -> String {
    "jpeg".to_string()
}

fn default_proxy_resolution() -> String {
    "2K_DCP".to_string()
}

fn default_start_frame() -> u32 {
    1001
}

impl JobOptions {
    /// Create job options with the required values and defaults for everything else
    pub fn new(project: &str, output: impl Into<PathBuf>, csv_path: impl Into<PathBuf>) -> Self {
        Self {
            project: project.to_string(),
            vendor: None,
            input_date: None,
            scene: None,
            shot: None,
            input: None,
            output: output.into(),
            csv_path: csv_path.into(),
            proxy_format: default_proxy_format(),
            resolution: default_proxy_resolution(),
            force: false,
            overwrite: false,
            mov: false,
            use_proxy: false,
            start_frame: default_start_frame(),
            preserve_frame_numbers: false,
        }
    }

    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_vendor(mut self, vendor: &str) -> Self {
        self.vendor = Some(vendor.to_string());
        self
    }

    pub fn with_input_date(mut self, date: &str) -> Self {
        self.input_date = Some(date.to_string());
        self
    }

    pub fn with_scene_shot(mut self, scene: &str, shot: &str) -> Self {
        self.scene = Some(scene.to_string());
        self.shot = Some(shot.to_string());
        self
    }

    pub fn with_proxy(mut self, format: &str, resolution: &str) -> Self {
        self.use_proxy = true;
        self.proxy_format = format.to_string();
        self.resolution = resolution.to_string();
        self
    }

    pub fn with_movie(mut self, enabled: bool) -> Self {
        self.mov = enabled;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_start_frame(mut self, start_frame: u32) -> Self {
        self.start_frame = start_frame;
        self
    }

    pub fn with_preserved_frame_numbers(mut self, preserve: bool) -> Self {
        self.preserve_frame_numbers = preserve;
        self
    }

    /// Vendor label, or an empty string when none was given
    pub fn vendor_label(&self) -> &str {
        self.vendor.as_deref().unwrap_or("")
    }

    /// Validate the job options
    pub fn validate(&self) -> Result<()> {
        if self.project.trim().is_empty() {
            return Err(anyhow!("A project is required"));
        }
        if self.output.as_os_str().is_empty() {
            return Err(anyhow!("An output directory is required"));
        }
        if self.csv_path.as_os_str().is_empty() {
            return Err(anyhow!("A mapping table (--csv-path) is required"));
        }
        if self.input.is_none() && (self.vendor.is_none() || self.input_date.is_none()) {
            return Err(anyhow!(
                "Either --input or all of --project, --vendor and --input-date must be provided"
            ));
        }
        if self.proxy_format.trim().is_empty() {
            return Err(anyhow!("Proxy format must not be empty"));
        }
        if let Some(date) = &self.input_date {
            compact_date(date)?;
        }
        Ok(())
    }
}
