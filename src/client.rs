use crate::envelope::{normalize_page, unwrap_record};
use crate::error::ApiError;
use crate::http::{bearer_headers, is_success, join_url, normalize_base_url, read_response};
use crate::redact::redact_secrets;
use crate::session::SessionManager;
use crate::types::{
    Country, CountryInput, IdType, IdentityStatus, IdentityStatusInput, NamedTypeInput, Page,
    PackageType, Region, RegionInput, ResourceId, TransportType, User,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Country,
    Region,
    TransportType,
    PackageType,
    IdType,
    User,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        Self::Country,
        Self::Region,
        Self::TransportType,
        Self::PackageType,
        Self::IdType,
        Self::User,
    ];

    pub fn collection_path(&self) -> &'static str {
        match self {
            Self::Country => "/api/listings/countries/",
            Self::Region => "/api/listings/regions/",
            Self::TransportType => "/api/listings/transport-types/",
            Self::PackageType => "/api/listings/package-types/",
            Self::IdType => "/api/users/id-types/",
            Self::User => "/api/users/",
        }
    }

    pub fn item_path(&self, id: &ResourceId) -> String {
        format!("{}{}/", self.collection_path(), urlencoding::encode(id.as_str()))
    }

    /// Singular label used in screen messages.
    pub fn singular(&self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Region => "region",
            Self::TransportType => "transport type",
            Self::PackageType => "package type",
            Self::IdType => "ID type",
            Self::User => "user",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            Self::Country => "countries",
            Self::Region => "regions",
            Self::TransportType => "transport types",
            Self::PackageType => "package types",
            Self::IdType => "ID types",
            Self::User => "users",
        }
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "country" | "countries" => Ok(Self::Country),
            "region" | "regions" => Ok(Self::Region),
            "transport" | "transport-type" | "transport-types" => Ok(Self::TransportType),
            "package" | "package-type" | "package-types" => Ok(Self::PackageType),
            "id" | "id-type" | "id-types" => Ok(Self::IdType),
            "user" | "users" => Ok(Self::User),
            other => Err(format!("unknown resource kind `{other}`")),
        }
    }
}

pub fn regions_by_country_path(country: &ResourceId) -> String {
    format!(
        "{}by-country/{}/",
        ResourceKind::Region.collection_path(),
        urlencoding::encode(country.as_str())
    )
}

/// A record type served by one of the CRUD collections.
pub trait Resource: DeserializeOwned + Serialize + Send + 'static {
    /// Body accepted by create and full update.
    type Input: Serialize + DeserializeOwned + Sync;

    const KIND: ResourceKind;
}

impl Resource for Country {
    type Input = CountryInput;
    const KIND: ResourceKind = ResourceKind::Country;
}

impl Resource for Region {
    type Input = RegionInput;
    const KIND: ResourceKind = ResourceKind::Region;
}

impl Resource for TransportType {
    type Input = NamedTypeInput;
    const KIND: ResourceKind = ResourceKind::TransportType;
}

impl Resource for PackageType {
    type Input = NamedTypeInput;
    const KIND: ResourceKind = ResourceKind::PackageType;
}

impl Resource for IdType {
    type Input = NamedTypeInput;
    const KIND: ResourceKind = ResourceKind::IdType;
}

/// Users are not created or replaced from the dashboard; the input type only
/// exists to satisfy the trait and carries the raw record.
impl Resource for User {
    type Input = Value;
    const KIND: ResourceKind = ResourceKind::User;
}

/// Authenticated request issuer shared by every screen.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl ResourceClient {
    pub fn new(http: reqwest::Client, base_url: &str, session: Arc<SessionManager>) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url),
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Resolves a token, then sends. Fails before touching the network when
    /// no token can be obtained.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, ApiError> {
        let Some(token) = self.session.get_valid_access_token().await else {
            return Err(ApiError::unauthenticated());
        };

        let mut req = self
            .http
            .request(method.clone(), join_url(&self.base_url, path))
            .headers(bearer_headers(&token));
        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req.send().await.map_err(|e| {
            tracing::debug!(%method, path, error = %redact_secrets(&e.to_string()), "request failed");
            ApiError::from(e)
        })?;

        let (status, payload) = read_response(res).await?;
        if !is_success(status) {
            let err = ApiError::from_response(status, payload.as_ref());
            tracing::debug!(%method, path, status, kind = %err.kind, "backend rejected request");
            return Err(err);
        }
        Ok(payload)
    }

    pub async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, path, None)
            .await?
            .ok_or_else(ApiError::invalid_response)
    }

    async fn send_record<R: Resource>(
        &self,
        method: Method,
        path: &str,
        body: &Value,
    ) -> Result<R, ApiError> {
        let payload = self
            .request(method, path, Some(body))
            .await?
            .ok_or_else(ApiError::invalid_response)?;
        serde_json::from_value(unwrap_record(payload)).map_err(|e| {
            tracing::debug!(path, error = %e, "unexpected record shape");
            ApiError::invalid_response()
        })
    }

    fn to_body<T: Serialize>(value: &T) -> Result<Value, ApiError> {
        serde_json::to_value(value).map_err(|_| ApiError::invalid_response())
    }

    pub async fn list_at<R: Resource>(&self, collection: &str, page: u64) -> Result<Page<R>, ApiError> {
        let path = format!("{collection}?page={}", page.max(1));
        let body = self
            .request(Method::GET, &path, None)
            .await?
            .unwrap_or(Value::Null);
        Ok(normalize_page(&body))
    }

    pub async fn list<R: Resource>(&self, page: u64) -> Result<Page<R>, ApiError> {
        self.list_at(R::KIND.collection_path(), page).await
    }

    pub async fn create<R: Resource>(&self, input: &R::Input) -> Result<R, ApiError> {
        let body = Self::to_body(input)?;
        self.send_record(Method::POST, R::KIND.collection_path(), &body).await
    }

    pub async fn update<R: Resource>(&self, id: &ResourceId, input: &R::Input) -> Result<R, ApiError> {
        let body = Self::to_body(input)?;
        self.send_record(Method::PUT, &R::KIND.item_path(id), &body).await
    }

    pub async fn partial_update<R: Resource>(&self, id: &ResourceId, partial: &Value) -> Result<R, ApiError> {
        self.send_record(Method::PATCH, &R::KIND.item_path(id), partial).await
    }

    pub async fn delete<R: Resource>(&self, id: &ResourceId) -> Result<(), ApiError> {
        self.request(Method::DELETE, &R::KIND.item_path(id), None).await?;
        Ok(())
    }

    pub async fn regions_by_country(&self, country: &ResourceId, page: u64) -> Result<Page<Region>, ApiError> {
        self.list_at(&regions_by_country_path(country), page).await
    }

    pub async fn update_identity_status(&self, user: &ResourceId, status: IdentityStatus) -> Result<User, ApiError> {
        let path = format!("{}identity-status/", ResourceKind::User.item_path(user));
        let body = Self::to_body(&IdentityStatusInput {
            is_identity_verified: status,
        })?;
        self.send_record(Method::PATCH, &path, &body).await
    }
}
