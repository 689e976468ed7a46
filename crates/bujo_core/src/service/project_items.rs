//! Date-bucketed items across the requester's projects.

use crate::aggregate::{AggregationError, AggregationQuery, AggregationResult, Aggregator};
use crate::model::bucket::DateBucket;
use crate::service::new_request_id;
use crate::source::ProjectDirectory;
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;

/// Source name reported when the project listing itself fails.
pub const PROJECT_DIRECTORY_SOURCE: &str = "project_directory";

pub struct ProjectItemsService {
    directory: Arc<dyn ProjectDirectory>,
    aggregator: Aggregator,
}

impl ProjectItemsService {
    pub fn new(directory: Arc<dyn ProjectDirectory>, aggregator: Aggregator) -> Self {
        Self {
            directory,
            aggregator,
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Buckets the items of every project `requester` may read.
    ///
    /// # Contract
    /// - Request values are validated before the directory is consulted.
    /// - A directory failure is `SourceUnavailable`, never an empty result.
    pub fn project_items<S: AsRef<str>>(
        &self,
        requester: &str,
        kinds: &[S],
        start_date: &str,
        end_date: &str,
        timezone: &str,
    ) -> AggregationResult<Vec<DateBucket>> {
        let request_id = new_request_id();
        let started_at = Instant::now();
        info!(
            "event=project_items module=service status=start request_id={request_id} kinds={}",
            kinds.len()
        );

        let result = self.run(requester, kinds, start_date, end_date, timezone);
        match &result {
            Ok(buckets) => info!(
                "event=project_items module=service status=ok request_id={request_id} buckets={} duration_ms={}",
                buckets.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=project_items module=service status=error request_id={request_id} error_code={} duration_ms={}",
                err.code(),
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    fn run<S: AsRef<str>>(
        &self,
        requester: &str,
        kinds: &[S],
        start_date: &str,
        end_date: &str,
        timezone: &str,
    ) -> AggregationResult<Vec<DateBucket>> {
        let query = AggregationQuery::parse(kinds, start_date, end_date, timezone)?;
        self.aggregator.validate_query(&query)?;
        let projects = self
            .directory
            .accessible_projects(requester)
            .map_err(|cause| AggregationError::SourceUnavailable {
                source_name: PROJECT_DIRECTORY_SOURCE.to_string(),
                project_id: None,
                cause,
            })?;
        self.aggregator.aggregate(&projects, &query)
    }
}
