//! Aggregator: validate, fan out, bucket, order.

use crate::aggregate::timezone::{bucket_date, parse_timezone};
use crate::aggregate::{AggregationError, AggregationResult};
use crate::config::{AggregationConfig, ConfigError};
use crate::model::bucket::DateBucket;
use crate::model::item::ProjectItem;
use crate::model::project::{Project, ProjectKind};
use crate::source::router::{RouterError, TypeRouter};
use crate::source::{DateWindow, ItemSource, SourceError};
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One aggregation request, scoped to an already-authorized project set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationQuery {
    pub kinds: Vec<ProjectKind>,
    /// Inclusive.
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    /// IANA zone identifier; validated by `Aggregator::aggregate`.
    pub timezone: String,
}

impl AggregationQuery {
    pub fn new(
        kinds: Vec<ProjectKind>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            kinds,
            start_date,
            end_date,
            timezone: timezone.into(),
        }
    }

    /// Builds a query from wire values.
    ///
    /// # Errors
    /// - `UnsupportedKind` for an unknown kind name.
    /// - `InvalidDate` for dates not formatted `YYYY-MM-DD`.
    pub fn parse<S: AsRef<str>>(
        kinds: &[S],
        start_date: &str,
        end_date: &str,
        timezone: &str,
    ) -> AggregationResult<Self> {
        let kinds = kinds
            .iter()
            .map(|name| {
                ProjectKind::parse(name.as_ref())
                    .ok_or_else(|| AggregationError::UnsupportedKind(name.as_ref().trim().to_string()))
            })
            .collect::<AggregationResult<Vec<_>>>()?;

        Ok(Self::new(
            kinds,
            parse_date(start_date)?,
            parse_date(end_date)?,
            timezone.trim(),
        ))
    }
}

fn parse_date(value: &str) -> AggregationResult<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| AggregationError::InvalidDate(trimmed.to_string()))
}

struct FetchJob<'a> {
    project: &'a Project,
    source: Arc<dyn ItemSource>,
}

/// Merges items of several kinds and projects into per-day buckets.
pub struct Aggregator {
    router: TypeRouter,
    config: AggregationConfig,
}

impl Aggregator {
    /// # Errors
    /// - `ConfigError::Invalid` when `config` fails `AggregationConfig::validate`.
    pub fn new(router: TypeRouter, config: AggregationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { router, config })
    }

    pub fn router(&self) -> &TypeRouter {
        &self.router
    }

    /// Aggregates the items of `accessible_projects` for `query`.
    ///
    /// `accessible_projects` must already be filtered to what the requester
    /// may read; no access checks happen here.
    ///
    /// # Errors
    /// - Validation errors (`NoKindsRequested`, `InvalidRange`,
    ///   `InvalidTimezone`, `UnsupportedKind`) before any fetch.
    /// - `SourceUnavailable` for the first failing project, in input order.
    pub fn aggregate(
        &self,
        accessible_projects: &[Project],
        query: &AggregationQuery,
    ) -> AggregationResult<Vec<DateBucket>> {
        let started_at = Instant::now();
        let (sources, zone) = self.validate(query)?;

        let mut seen = BTreeSet::new();
        let jobs: Vec<FetchJob<'_>> = accessible_projects
            .iter()
            .filter(|project| seen.insert(project.id))
            .filter_map(|project| {
                sources.get(&project.kind).map(|source| FetchJob {
                    project,
                    source: Arc::clone(source),
                })
            })
            .collect();

        let window =
            DateWindow::new(query.start_date, query.end_date).widen(self.config.fetch_slack_days);
        let requested = DateWindow::new(query.start_date, query.end_date);

        let mut buckets: BTreeMap<NaiveDate, DateBucket> = BTreeMap::new();
        let mut item_count = 0usize;
        for result in self.fetch_all(&jobs, &window) {
            for item in result? {
                let Some(anchor) = item.anchor() else {
                    continue;
                };
                let date = bucket_date(&anchor, zone);
                if !requested.contains(date) {
                    continue;
                }
                item_count += 1;
                buckets
                    .entry(date)
                    .or_insert_with(|| DateBucket::new(date))
                    .push(item);
            }
        }

        let ordered: Vec<DateBucket> = buckets
            .into_values()
            .rev()
            .filter(|bucket| !bucket.is_empty())
            .map(|mut bucket| {
                bucket.seal();
                bucket
            })
            .collect();

        info!(
            "event=aggregate module=aggregate status=ok projects={} items={} buckets={} duration_ms={}",
            jobs.len(),
            item_count,
            ordered.len(),
            started_at.elapsed().as_millis()
        );
        Ok(ordered)
    }

    /// Runs every request check `aggregate` performs before fetching.
    pub fn validate_query(&self, query: &AggregationQuery) -> AggregationResult<()> {
        self.validate(query).map(|_| ())
    }

    fn validate(
        &self,
        query: &AggregationQuery,
    ) -> AggregationResult<(BTreeMap<ProjectKind, Arc<dyn ItemSource>>, chrono_tz::Tz)> {
        if query.kinds.is_empty() {
            return Err(AggregationError::NoKindsRequested);
        }
        if query.start_date > query.end_date {
            return Err(AggregationError::InvalidRange {
                start: query.start_date,
                end: query.end_date,
            });
        }
        let zone = parse_timezone(&query.timezone)
            .ok_or_else(|| AggregationError::InvalidTimezone(query.timezone.clone()))?;

        let mut sources = BTreeMap::new();
        for kind in &query.kinds {
            let source = self.router.resolve(*kind).map_err(|err| match err {
                RouterError::UnsupportedKind(kind) | RouterError::DuplicateKind(kind) => {
                    AggregationError::UnsupportedKind(kind.to_string())
                }
            })?;
            sources.insert(*kind, source);
        }
        Ok((sources, zone))
    }

    /// Runs every job, at most `fetch_parallelism` at a time.
    /// Results come back in job order regardless of completion order.
    fn fetch_all(
        &self,
        jobs: &[FetchJob<'_>],
        window: &DateWindow,
    ) -> Vec<AggregationResult<Vec<ProjectItem>>> {
        let parallelism = self.config.fetch_parallelism.max(1);
        if parallelism == 1 || jobs.len() <= 1 {
            return jobs.iter().map(|job| run_fetch(job, window)).collect();
        }

        let mut results = Vec::with_capacity(jobs.len());
        for chunk in jobs.chunks(parallelism) {
            thread::scope(|scope| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|job| (job, scope.spawn(move || run_fetch(job, window))))
                    .collect();
                for (job, handle) in handles {
                    let result = handle.join().unwrap_or_else(|_| {
                        Err(source_unavailable(
                            job,
                            SourceError::Unavailable("fetch worker panicked".to_string()),
                        ))
                    });
                    results.push(result);
                }
            });
        }
        results
    }
}

fn run_fetch(job: &FetchJob<'_>, window: &DateWindow) -> AggregationResult<Vec<ProjectItem>> {
    let started_at = Instant::now();
    match job.source.fetch(job.project, window) {
        Ok(items) => {
            debug!(
                "event=source_fetch module=aggregate status=ok source={} project_id={} items={} duration_ms={}",
                job.source.name(),
                job.project.id,
                items.len(),
                started_at.elapsed().as_millis()
            );
            Ok(items)
        }
        Err(err) => {
            warn!(
                "event=source_fetch module=aggregate status=error source={} project_id={} duration_ms={} error={}",
                job.source.name(),
                job.project.id,
                started_at.elapsed().as_millis(),
                err
            );
            Err(source_unavailable(job, err))
        }
    }
}

fn source_unavailable(job: &FetchJob<'_>, cause: SourceError) -> AggregationError {
    AggregationError::SourceUnavailable {
        source_name: job.source.name().to_string(),
        project_id: Some(job.project.id),
        cause,
    }
}
