//! HTTP client for the money-flow REST backend.
//!
//! [`Client`] exposes one async method per backend operation. Requests are
//! either anonymous (sign-up, sign-in, password reset, global reference
//! lists) or authenticated with the token the client was built with; the
//! client never reads persisted state on its own.
//!
//! Screens depend on the [`Backend`] trait rather than on [`Client`]
//! directly so they can be exercised against an in-memory implementation.
mod backend;
mod error;
mod query;

use api_types::{
    ListResponse,
    auth::{AuthToken, PasswordChange, PasswordReset, SignIn, SignUp},
    money_flow::{MoneyFlow, MoneyFlowFilter, MoneyFlowWrite},
    reference::{EntityKind, ReferenceRecord},
    user::{Avatar, User},
};
use reqwest::{Method, RequestBuilder, Response, Url, header::AUTHORIZATION};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

pub use backend::Backend;
pub use error::{ClientError, GENERIC_FAILURE, normalize_error_body};
pub use query::Query;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Anonymous,
    Token,
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
    token: Option<String>,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self> {
        // `Url::join` drops the last segment unless the base ends with a slash.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url =
            Url::parse(&normalized).map_err(|err| ClientError::InvalidUrl(err.to_string()))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ClientError::InvalidUrl(err.to_string()))
    }

    fn request(&self, method: Method, path: &str, auth: Auth) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;
        tracing::debug!("{method} {url}");
        let mut req = self.http.request(method, url);
        if auth == Auth::Token {
            let token = self.token.as_deref().ok_or(ClientError::Unauthorized)?;
            req = req.header(AUTHORIZATION, format!("Token {token}"));
        }
        Ok(req)
    }

    async fn check(res: Response) -> Result<Response> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = match res.text().await {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!("body read failed: {err}");
                String::new()
            }
        };
        tracing::debug!("request failed with {status}: {body}");
        Err(ClientError::from_response(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
        let res = Self::check(req.send().await?).await?;
        Ok(res.json::<T>().await?)
    }

    async fn send_empty(req: RequestBuilder) -> Result<()> {
        Self::check(req.send().await?).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, auth: Auth, query: &Query) -> Result<T> {
        let req = self.request(Method::GET, path, auth)?.query(query.pairs());
        Self::send_json(req).await
    }

    async fn write<B, T>(&self, method: Method, path: &str, auth: Auth, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(method, path, auth)?.json(body);
        Self::send_json(req).await
    }

    async fn write_empty<B>(&self, method: Method, path: &str, auth: Auth, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let mut req = self.request(method, path, auth)?;
        if let Some(body) = body {
            req = req.json(body);
        }
        Self::send_empty(req).await
    }

    // Auth

    pub async fn signup(&self, payload: &SignUp) -> Result<User> {
        self.write(Method::POST, "api/auth/users/", Auth::Anonymous, payload)
            .await
    }

    pub async fn signin(&self, payload: &SignIn) -> Result<AuthToken> {
        self.write(Method::POST, "api/auth/token/login/", Auth::Anonymous, payload)
            .await
    }

    pub async fn signout(&self) -> Result<()> {
        self.write_empty::<()>(Method::POST, "api/auth/token/logout/", Auth::Token, None)
            .await
    }

    pub async fn reset_password(&self, email: &str) -> Result<()> {
        let payload = PasswordReset {
            email: email.to_string(),
        };
        self.write_empty(
            Method::POST,
            "api/auth/users/reset_password/",
            Auth::Anonymous,
            Some(&payload),
        )
        .await
    }

    pub async fn change_password(&self, payload: &PasswordChange) -> Result<()> {
        self.write_empty(
            Method::POST,
            "api/auth/users/set_password/",
            Auth::Token,
            Some(payload),
        )
        .await
    }

    // User

    pub async fn me(&self) -> Result<User> {
        self.get("api/v1/users/me/", Auth::Token, &Query::new()).await
    }

    /// Uploads an avatar given as a `data:` URI.
    pub async fn set_avatar(&self, data_uri: &str) -> Result<Avatar> {
        let payload = Avatar {
            avatar: Some(data_uri.to_string()),
        };
        self.write(Method::PUT, "api/v1/users/me/avatar/", Auth::Token, &payload)
            .await
    }

    pub async fn delete_avatar(&self) -> Result<()> {
        self.write_empty::<()>(Method::DELETE, "api/v1/users/me/avatar/", Auth::Token, None)
            .await
    }

    // Reference data

    /// Lists the caller's own entities of `kind`.
    ///
    /// `parent` narrows categories by type and subcategories by category;
    /// it is ignored for kinds without a parent.
    pub async fn references(
        &self,
        kind: EntityKind,
        page: Option<u32>,
        parent: Option<i64>,
    ) -> Result<ListResponse<ReferenceRecord>> {
        self.references_as(kind, page, parent).await
    }

    /// Same as [`Client::references`] but decoded into a concrete type.
    pub async fn references_as<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        page: Option<u32>,
        parent: Option<i64>,
    ) -> Result<ListResponse<T>> {
        let mut query = Query::new().page(page);
        if let Some((field, _)) = kind.parent() {
            query = query.push(field, parent);
        }
        self.get(&my_collection(kind), Auth::Token, &query).await
    }

    /// Read-only global list, used to fill selects without a session.
    pub async fn global_references<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        page: Option<u32>,
    ) -> Result<ListResponse<T>> {
        let path = format!("api/v1/{}/", kind.collection());
        self.get(&path, Auth::Anonymous, &Query::new().page(page))
            .await
    }

    pub async fn create_reference(
        &self,
        kind: EntityKind,
        fields: &Map<String, Value>,
    ) -> Result<ReferenceRecord> {
        self.write(Method::POST, &my_collection(kind), Auth::Token, fields)
            .await
    }

    pub async fn update_reference(
        &self,
        kind: EntityKind,
        id: i64,
        fields: &Map<String, Value>,
    ) -> Result<ReferenceRecord> {
        self.write(Method::PUT, &my_item(kind, id), Auth::Token, fields)
            .await
    }

    pub async fn delete_reference(&self, kind: EntityKind, id: i64) -> Result<()> {
        self.write_empty::<()>(Method::DELETE, &my_item(kind, id), Auth::Token, None)
            .await
    }

    // Money flows

    pub async fn money_flows(
        &self,
        page: Option<u32>,
        filter: &MoneyFlowFilter,
    ) -> Result<ListResponse<MoneyFlow>> {
        self.get(
            "api/v1/money-flows/",
            Auth::Token,
            &Query::money_flows(page, filter),
        )
        .await
    }

    pub async fn money_flow(&self, id: i64) -> Result<MoneyFlow> {
        self.get(&money_flow_item(id), Auth::Token, &Query::new())
            .await
    }

    pub async fn create_money_flow(&self, payload: &MoneyFlowWrite) -> Result<Value> {
        self.write(Method::POST, "api/v1/money-flows/", Auth::Token, payload)
            .await
    }

    pub async fn update_money_flow(&self, id: i64, payload: &MoneyFlowWrite) -> Result<Value> {
        self.write(Method::PUT, &money_flow_item(id), Auth::Token, payload)
            .await
    }

    pub async fn delete_money_flow(&self, id: i64) -> Result<()> {
        self.write_empty::<()>(Method::DELETE, &money_flow_item(id), Auth::Token, None)
            .await
    }
}

fn my_collection(kind: EntityKind) -> String {
    format!("api/v1/my/{}/", kind.collection())
}

fn my_item(kind: EntityKind, id: i64) -> String {
    format!("api/v1/my/{}/{id}/", kind.collection())
}

fn money_flow_item(id: i64) -> String {
    format!("api/v1/money-flows/{id}/")
}
