use crate::client::ResourceClient;
use crate::envelope::metric_value;
use crate::error::ApiError;
use futures::future::try_join_all;
use serde_json::Value;

pub const METRICS_BASE_PATH: &str = "/api/admin/metrics";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    TotalUsers,
    NewUsers,
    VerifiedTravelers,
    TotalTrips,
    TripsPerDay,
    TripsPerWeek,
    TripsPerMonth,
    TripsPerYear,
    AvgPricePerKg,
    TotalKgOffered,
    Routes,
    TotalPackageRequests,
    PackageStatusDistribution,
    OffersPerTrip,
    TotalKgSold,
    KgSoldVsAvailable,
    OfferToMessageRatio,
    DauWauMau,
    TripCreatorsVsSenders,
    AvgTimeToFirstPackageRequest,
    PackageRequestResponseTimeBuckets,
    RouteSaturation,
    CancellationDisputeRates,
    FunnelConversion,
    DashboardData,
}

impl MetricName {
    pub const ALL: [MetricName; 25] = [
        Self::TotalUsers,
        Self::NewUsers,
        Self::VerifiedTravelers,
        Self::TotalTrips,
        Self::TripsPerDay,
        Self::TripsPerWeek,
        Self::TripsPerMonth,
        Self::TripsPerYear,
        Self::AvgPricePerKg,
        Self::TotalKgOffered,
        Self::Routes,
        Self::TotalPackageRequests,
        Self::PackageStatusDistribution,
        Self::OffersPerTrip,
        Self::TotalKgSold,
        Self::KgSoldVsAvailable,
        Self::OfferToMessageRatio,
        Self::DauWauMau,
        Self::TripCreatorsVsSenders,
        Self::AvgTimeToFirstPackageRequest,
        Self::PackageRequestResponseTimeBuckets,
        Self::RouteSaturation,
        Self::CancellationDisputeRates,
        Self::FunnelConversion,
        Self::DashboardData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalUsers => "total_users",
            Self::NewUsers => "new_users",
            Self::VerifiedTravelers => "verified_travelers",
            Self::TotalTrips => "total_trips",
            Self::TripsPerDay => "trips_per_day",
            Self::TripsPerWeek => "trips_per_week",
            Self::TripsPerMonth => "trips_per_month",
            Self::TripsPerYear => "trips_per_year",
            Self::AvgPricePerKg => "avg_price_per_kg",
            Self::TotalKgOffered => "total_kg_offered",
            Self::Routes => "routes",
            Self::TotalPackageRequests => "total_package_requests",
            Self::PackageStatusDistribution => "package_status_distribution",
            Self::OffersPerTrip => "offers_per_trip",
            Self::TotalKgSold => "total_kg_sold",
            Self::KgSoldVsAvailable => "kg_sold_vs_available",
            Self::OfferToMessageRatio => "offer_to_message_ratio",
            Self::DauWauMau => "dau_wau_mau",
            Self::TripCreatorsVsSenders => "trip_creators_vs_senders",
            Self::AvgTimeToFirstPackageRequest => "avg_time_to_first_package_request",
            Self::PackageRequestResponseTimeBuckets => "package_request_response_time_buckets",
            Self::RouteSaturation => "route_saturation",
            Self::CancellationDisputeRates => "cancellation_dispute_rates",
            Self::FunnelConversion => "funnel_conversion",
            Self::DashboardData => "dashboard_data",
        }
    }

    pub fn path(&self) -> String {
        format!("{METRICS_BASE_PATH}/{}/", self.as_str())
    }
}

impl std::str::FromStr for MetricName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| format!("unknown metric `{}`", s.trim()))
    }
}

/// Headline counters on the dashboard tab.
pub const SUMMARY_METRICS: [MetricName; 5] = [
    MetricName::TotalUsers,
    MetricName::NewUsers,
    MetricName::VerifiedTravelers,
    MetricName::TotalTrips,
    MetricName::TotalPackageRequests,
];

pub const REPORTING_METRICS: [MetricName; 18] = [
    MetricName::TripsPerDay,
    MetricName::TripsPerWeek,
    MetricName::TripsPerMonth,
    MetricName::TripsPerYear,
    MetricName::AvgPricePerKg,
    MetricName::TotalKgOffered,
    MetricName::TotalKgSold,
    MetricName::KgSoldVsAvailable,
    MetricName::OfferToMessageRatio,
    MetricName::DauWauMau,
    MetricName::TripCreatorsVsSenders,
    MetricName::AvgTimeToFirstPackageRequest,
    MetricName::PackageRequestResponseTimeBuckets,
    MetricName::RouteSaturation,
    MetricName::CancellationDisputeRates,
    MetricName::FunnelConversion,
    MetricName::PackageStatusDistribution,
    MetricName::Routes,
];

#[derive(Debug, Clone)]
pub struct MetricsClient {
    client: ResourceClient,
}

impl MetricsClient {
    pub fn new(client: ResourceClient) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, metric: MetricName) -> Result<Value, ApiError> {
        let body = self.client.get_json(&metric.path()).await?;
        Ok(metric_value(body))
    }

    /// Fetches every metric concurrently. One failure fails the batch, even
    /// if the others already arrived.
    pub async fn fetch_batch(&self, metrics: &[MetricName]) -> Result<Vec<(MetricName, Value)>, ApiError> {
        let values = try_join_all(metrics.iter().map(|m| self.fetch(*m))).await?;
        Ok(metrics.iter().copied().zip(values).collect())
    }
}
