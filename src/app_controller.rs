use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::{Config, InsertConfig};
use crate::errors::ConversionError;
use crate::file_utils::FileManager;
use crate::normalizer::{ConversionJob, ConversionOutcome, SubtitleNormalizer};
use crate::providers::TextConverter;

// @module: Batch controller for subtitle conversion

/// Per-run choices that are not persisted in the configuration
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Insert-config names applied to every file, in order
    pub selected_inserts: Vec<String>,
    /// Run the text converter over event texts
    pub convert_text: bool,
    /// Remove each source after a successful write
    pub delete_original: bool,
    /// Overrides the configured output directory
    pub output_dir: Option<PathBuf>,
    /// Overwrite existing outputs
    pub force: bool,
    /// Hide the progress bar
    pub quiet: bool,
}

/// Final state of one submitted file
#[derive(Debug)]
pub enum JobStatus {
    Succeeded(ConversionOutcome),
    Failed(ConversionError),
    /// Destination already existed and overwriting was not requested
    Skipped,
}

#[derive(Debug)]
pub struct JobResult {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub status: JobStatus,
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        matches!(self.status, JobStatus::Succeeded(_))
    }
}

/// Tally of a batch, in completion order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub results: Vec<JobResult>,
}

impl BatchReport {
    fn record(&mut self, result: JobResult) {
        match &result.status {
            JobStatus::Succeeded(_) => self.succeeded += 1,
            JobStatus::Failed(_) => self.failed += 1,
            JobStatus::Skipped => self.skipped += 1,
        }
        self.results.push(result);
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &ConversionError)> {
        self.results.iter().filter_map(|r| match &r.status {
            JobStatus::Failed(e) => Some((r.source.as_path(), e)),
            _ => None,
        })
    }

    /// Delete failures attached to otherwise successful jobs
    pub fn delete_failures(&self) -> impl Iterator<Item = &ConversionError> {
        self.results.iter().filter_map(|r| match &r.status {
            JobStatus::Succeeded(outcome) => outcome.delete_error.as_ref(),
            _ => None,
        })
    }
}

/// Main application controller for subtitle conversion
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Shared pipeline
    normalizer: SubtitleNormalizer,
}

impl Controller {
    // @method: Create a new controller with the given configuration and converter
    pub fn with_config(config: Config, converter: Arc<dyn TextConverter>) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self {
            config,
            normalizer: SubtitleNormalizer::new(converter),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn output_dir(&self, options: &BatchOptions) -> Option<PathBuf> {
        options.output_dir.clone().or_else(|| {
            self.config
                .settings
                .output_directory()
                .map(FileManager::expand_home)
        })
    }

    /// Build the job for one source file
    pub fn build_job(&self, source: &Path, options: &BatchOptions, inserts: &Arc<[InsertConfig]>) -> ConversionJob {
        let output_dir = self.output_dir(options);
        let settings = &self.config.settings;
        let subtitles = &self.config.subtitles;

        ConversionJob {
            source: source.to_path_buf(),
            destination: FileManager::generate_output_path(source, output_dir.as_deref()),
            selected_inserts: options.selected_inserts.clone(),
            insert_configs: Arc::clone(inserts),
            primary_color: subtitles.subtitle_color,
            outline_color: subtitles.outline_color,
            delete_original: options.delete_original,
            convert_text: options.convert_text,
            font_family: settings.font_family.clone(),
            font_size: f64::from(settings.font_size),
            short_reply_policy: settings.short_reply_policy,
        }
    }

    /// Convert every subtitle file found under the given paths
    pub async fn convert_paths(&self, inputs: &[PathBuf], options: &BatchOptions) -> Result<BatchReport> {
        self.convert_paths_with_callback(inputs, options, |_, _| {}).await
    }

    /// Like `convert_paths`, calling `on_complete(done, total)` after each job
    pub async fn convert_paths_with_callback<F>(
        &self,
        inputs: &[PathBuf],
        options: &BatchOptions,
        on_complete: F,
    ) -> Result<BatchReport>
    where
        F: Fn(usize, usize),
    {
        let start_time = Instant::now();
        let files = FileManager::collect_inputs(inputs)?;
        if files.is_empty() {
            warn!("No subtitle files found");
            return Ok(BatchReport::default());
        }

        let inserts: Arc<[InsertConfig]> = Arc::from(self.config.subtitles.subtitle_configs.clone());
        let jobs: Vec<ConversionJob> = files
            .iter()
            .map(|file| self.build_job(file, options, &inserts))
            .collect();

        let total = jobs.len();
        let (jobs, conflicts) = Self::claim_destinations(jobs);
        let concurrency = self.config.settings.concurrent_jobs.max(1);
        info!("Converting {} file(s), {} at a time", total, concurrency);

        let progress_bar = Self::progress_bar(total, options.quiet);

        let mut report = BatchReport {
            total,
            ..BatchReport::default()
        };

        for conflict in conflicts {
            report.record(conflict);
            progress_bar.inc(1);
            on_complete(report.results.len(), total);
        }

        let mut results = stream::iter(jobs)
            .map(|job| {
                let force = options.force;
                async move { self.run_job(job, force).await }
            })
            .buffer_unordered(concurrency);

        while let Some(result) = results.next().await {
            if let Some(name) = result.source.file_name() {
                progress_bar.set_message(name.to_string_lossy().to_string());
            }
            report.record(result);
            progress_bar.inc(1);
            on_complete(report.results.len(), total);
        }

        progress_bar.finish_and_clear();

        info!(
            "Conversion completed in {}: {} succeeded, {} skipped, {} failed",
            Self::format_duration(start_time.elapsed()),
            report.succeeded,
            report.skipped,
            report.failed
        );

        Ok(report)
    }

    /// Give each destination to a single job
    ///
    /// A job converting a file in place owns that path; otherwise the first
    /// job in input order does. Every other job aiming at the same path fails
    /// without running, so no output or source is written by two jobs.
    fn claim_destinations(jobs: Vec<ConversionJob>) -> (Vec<ConversionJob>, Vec<JobResult>) {
        let mut owners: HashMap<PathBuf, PathBuf> = jobs
            .iter()
            .filter(|job| job.source == job.destination)
            .map(|job| (job.destination.clone(), job.source.clone()))
            .collect();

        let mut runnable = Vec::with_capacity(jobs.len());
        let mut conflicts = Vec::new();
        for job in jobs {
            match owners.entry(job.destination.clone()) {
                Entry::Occupied(owner) if *owner.get() != job.source => {
                    let error = ConversionError::DestinationConflict {
                        path: job.destination.clone(),
                        owner: owner.get().clone(),
                    };
                    error!("Error processing {:?}: {}", job.source, error);
                    conflicts.push(JobResult {
                        source: job.source,
                        destination: job.destination,
                        status: JobStatus::Failed(error),
                    });
                }
                Entry::Occupied(_) => runnable.push(job),
                Entry::Vacant(slot) => {
                    slot.insert(job.source.clone());
                    runnable.push(job);
                }
            }
        }

        (runnable, conflicts)
    }

    async fn run_job(&self, job: ConversionJob, force: bool) -> JobResult {
        let in_place = job.source == job.destination;
        let status = if job.destination.exists() && !force && !in_place {
            warn!(
                "Skipping {:?}, {:?} already exists (use --force to overwrite)",
                job.source, job.destination
            );
            JobStatus::Skipped
        } else {
            debug!("Converting {:?} -> {:?}", job.source, job.destination);
            match self.normalizer.normalize(&job).await {
                Ok(outcome) => JobStatus::Succeeded(outcome),
                Err(e) => {
                    error!("Error processing {:?}: {}", job.source, e);
                    JobStatus::Failed(e)
                }
            }
        };

        JobResult {
            source: job.source,
            destination: job.destination,
            status,
        }
    }

    fn progress_bar(total: usize, quiet: bool) -> ProgressBar {
        let progress_bar = ProgressBar::new(total as u64);
        if quiet {
            progress_bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
