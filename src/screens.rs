use crate::client::{regions_by_country_path, Resource, ResourceClient};
use crate::error::ApiError;
use crate::metrics::{MetricName, MetricsClient, REPORTING_METRICS, SUMMARY_METRICS};
use crate::types::{IdentityStatus, Region, ResourceId, User};
use crate::render::render_grid;
use serde_json::Value;
use std::collections::BTreeSet;

pub const USER_NOT_FOUND: &str = "User not found";
pub const IDENTITY_UPDATE_FAILED: &str = "Failed to update identity status";
pub const METRICS_FAILED: &str = "Failed to load metrics";
pub const REPORTING_FAILED: &str = "Failed to load reporting metrics";
pub const DASHBOARD_GRAPH_FAILED: &str = "Failed to load dashboard graph data";

/// One CRUD tab: the current page of records plus whatever went wrong last.
#[derive(Debug)]
pub struct ListScreen<R: Resource> {
    pub page: u64,
    pub total_pages: u64,
    pub items: Vec<R>,
    pub error: Option<Vec<String>>,
    collection: String,
}

impl<R: Resource> Default for ListScreen<R> {
    fn default() -> Self {
        Self::with_collection(R::KIND.collection_path())
    }
}

impl<R: Resource> ListScreen<R> {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_collection(collection: impl Into<String>) -> Self {
        Self {
            page: 1,
            total_pages: 1,
            items: vec![],
            error: None,
            collection: collection.into(),
        }
    }

    fn fail(&mut self, err: &ApiError, fallback: String) {
        tracing::debug!(kind = %err.kind, status = ?err.status, "{fallback}");
        self.error = Some(err.screen_lines(&fallback));
    }

    pub async fn load(&mut self, client: &ResourceClient, page: u64) {
        self.page = page.max(1);
        self.error = None;
        match client.list_at::<R>(&self.collection, self.page).await {
            Ok(result) => {
                self.items = result.items;
                self.total_pages = result.total_pages;
            }
            Err(e) => self.fail(&e, format!("Failed to fetch {}", R::KIND.plural())),
        }
    }

    pub async fn reload(&mut self, client: &ResourceClient) {
        self.load(client, self.page).await;
    }

    pub async fn next_page(&mut self, client: &ResourceClient) {
        let page = (self.page + 1).min(self.total_pages.max(1));
        self.load(client, page).await;
    }

    pub async fn previous_page(&mut self, client: &ResourceClient) {
        let page = self.page.saturating_sub(1).max(1);
        self.load(client, page).await;
    }

    /// Creates when `editing` is `None`, otherwise replaces that record.
    /// The list is reloaded after a successful save.
    pub async fn save(&mut self, client: &ResourceClient, editing: Option<&ResourceId>, input: &R::Input) -> Option<R> {
        self.error = None;
        let result = match editing {
            Some(id) => client.update::<R>(id, input).await,
            None => client.create::<R>(input).await,
        };
        match result {
            Ok(record) => {
                self.reload(client).await;
                Some(record)
            }
            Err(e) => {
                self.fail(&e, format!("Failed to save {}", R::KIND.singular()));
                None
            }
        }
    }

    pub async fn remove(&mut self, client: &ResourceClient, id: &ResourceId) -> bool {
        self.error = None;
        match client.delete::<R>(id).await {
            Ok(()) => {
                self.reload(client).await;
                true
            }
            Err(e) => {
                self.fail(&e, format!("Failed to delete {}", R::KIND.singular()));
                false
            }
        }
    }
}

impl ListScreen<Region> {
    /// Region tab filtered to one country.
    pub fn for_country(country: &ResourceId) -> Self {
        Self::with_collection(regions_by_country_path(country))
    }
}

impl ListScreen<User> {
    pub async fn set_identity_status(&mut self, client: &ResourceClient, id: &ResourceId, status: IdentityStatus) -> bool {
        self.error = None;
        match client.update_identity_status(id, status).await {
            Ok(_) => {
                self.reload(client).await;
                true
            }
            Err(e) => {
                // The table only ever shows the generic message here.
                tracing::debug!(kind = %e.kind, "identity status update failed");
                self.error = Some(vec![IDENTITY_UPDATE_FAILED.to_string()]);
                false
            }
        }
    }
}

/// Looks the user up in the first page of the users list.
pub async fn find_user(client: &ResourceClient, id: &ResourceId) -> Result<User, Vec<String>> {
    let page = client
        .list::<User>(1)
        .await
        .map_err(|e| e.screen_lines("Failed to fetch user"))?;
    page.items
        .into_iter()
        .find(|u| &u.id == id)
        .ok_or_else(|| vec![USER_NOT_FOUND.to_string()])
}

/// Saves from the user detail page, where backend messages are shown.
pub async fn save_identity_status(client: &ResourceClient, id: &ResourceId, status: IdentityStatus) -> Result<User, Vec<String>> {
    client
        .update_identity_status(id, status)
        .await
        .map_err(|e| e.screen_lines(IDENTITY_UPDATE_FAILED))
}

/// A group of metric panels loaded together.
#[derive(Debug, Default)]
pub struct MetricsPanel {
    pub values: Vec<(MetricName, Value)>,
    pub error: Option<Vec<String>>,
}

impl MetricsPanel {
    pub async fn load(&mut self, metrics: &MetricsClient, batch: &[MetricName], fallback: &str) {
        self.error = None;
        match metrics.fetch_batch(batch).await {
            Ok(values) => self.values = values,
            Err(e) => {
                tracing::debug!(kind = %e.kind, status = ?e.status, "{fallback}");
                self.values.clear();
                self.error = Some(vec![fallback.to_string()]);
            }
        }
    }

    pub async fn summary(metrics: &MetricsClient) -> Self {
        let mut panel = Self::default();
        panel.load(metrics, &SUMMARY_METRICS, METRICS_FAILED).await;
        panel
    }

    pub async fn reporting(metrics: &MetricsClient) -> Self {
        let mut panel = Self::default();
        panel.load(metrics, &REPORTING_METRICS, REPORTING_FAILED).await;
        panel
    }
}

/// Daily counts of new users, trips and package requests on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTrend {
    pub day: String,
    pub users: u64,
    pub trips: u64,
    pub requests: u64,
}

const TREND_SERIES: [&str; 3] = ["users_per_day", "trips_per_day", "requests_per_day"];

fn series<'a>(data: &'a Value, key: &str) -> &'a [Value] {
    data.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

fn count_on(entries: &[Value], day: &str) -> u64 {
    entries
        .iter()
        .find(|e| e.get("day").and_then(Value::as_str) == Some(day))
        .and_then(|e| e.get("count"))
        .and_then(|c| c.as_u64().or_else(|| c.as_f64().filter(|c| *c > 0.0).map(|c| c as u64)))
        .unwrap_or(0)
}

/// Aligns the three `*_per_day` series of the dashboard payload by day: one
/// row per distinct day in sorted order, a missing count reads as 0. Days are
/// cut to their `YYYY-MM-DD` prefix for display.
pub fn merge_daily_trends(data: &Value) -> Vec<DailyTrend> {
    let [users, trips, requests] = TREND_SERIES.map(|key| series(data, key));
    let days: BTreeSet<&str> = users
        .iter()
        .chain(trips)
        .chain(requests)
        .filter_map(|e| e.get("day").and_then(Value::as_str))
        .collect();

    days.into_iter()
        .map(|day| DailyTrend {
            day: day.chars().take(10).collect(),
            users: count_on(users, day),
            trips: count_on(trips, day),
            requests: count_on(requests, day),
        })
        .collect()
}

/// The per-day trend chart on the dashboard tab.
#[derive(Debug, Default)]
pub struct DashboardGraph {
    pub rows: Vec<DailyTrend>,
    pub error: Option<Vec<String>>,
}

impl DashboardGraph {
    pub const TITLE: &'static str = "User, Trip, and Request Trends (per Day)";

    pub async fn load(metrics: &MetricsClient) -> Self {
        match metrics.fetch(MetricName::DashboardData).await {
            Ok(data) => Self {
                rows: merge_daily_trends(&data),
                error: None,
            },
            Err(e) => {
                tracing::debug!(kind = %e.kind, status = ?e.status, "{DASHBOARD_GRAPH_FAILED}");
                Self {
                    rows: vec![],
                    error: Some(vec![DASHBOARD_GRAPH_FAILED.to_string()]),
                }
            }
        }
    }

    pub fn render(&self) -> String {
        let header = ["Day", "Users", "Trips", "Requests"].map(str::to_string);
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| vec![r.day.clone(), r.users.to_string(), r.trips.to_string(), r.requests.to_string()])
            .collect();
        render_grid(&header, &body)
    }
}
