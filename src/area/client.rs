use super::model::{Area, AreaId, AreaListEntry, Polygon};
use crate::{conf::Conf, Error, Result};
use futures_util::future::{BoxFuture, FutureExt};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct AreaUpdate {
    pub name: String,
    pub code: String,
    pub geometry: Polygon,
}

/// Backend operations the editor depends on. Update and delete responses are
/// only logged, so they're passed through as raw JSON.
pub trait AreaApi: Send + Sync {
    fn get_areas(&self) -> BoxFuture<'_, Result<Vec<AreaListEntry>>>;

    fn get_area_by_id(&self, id: AreaId) -> BoxFuture<'_, Result<Area>>;

    fn update_area(&self, id: AreaId, update: AreaUpdate) -> BoxFuture<'_, Result<Value>>;

    fn delete_area_by_id(&self, id: AreaId) -> BoxFuture<'_, Result<Value>>;
}

pub struct RestAreaApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl RestAreaApi {
    pub fn new(conf: &Conf) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = conf.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(RestAreaApi {
            client: builder.build()?,
            base_url: base_url(&conf.api_url),
            token: conf.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let req = self.authorized(req).build()?;
        let method = req.method().to_string();
        let url = req.url().to_string();
        info!(method, url, "Querying backend");
        let res = self.client.execute(req).await?;
        info!(
            request_method = method,
            request_url = url,
            response_status = ?res.status(),
            "Got response from backend",
        );
        Ok(res)
    }
}

impl AreaApi for RestAreaApi {
    fn get_areas(&self) -> BoxFuture<'_, Result<Vec<AreaListEntry>>> {
        async move {
            let url = self.url("areas")?;
            read_json(self.send(self.client.get(url)).await?).await
        }
        .boxed()
    }

    fn get_area_by_id(&self, id: AreaId) -> BoxFuture<'_, Result<Area>> {
        async move {
            let url = self.url(&format!("areas/{id}"))?;
            read_json(self.send(self.client.get(url)).await?).await
        }
        .boxed()
    }

    fn update_area(&self, id: AreaId, update: AreaUpdate) -> BoxFuture<'_, Result<Value>> {
        async move {
            let url = self.url(&format!("areas/{id}"))?;
            read_ack(self.send(self.client.put(url).json(&update)).await?).await
        }
        .boxed()
    }

    fn delete_area_by_id(&self, id: AreaId) -> BoxFuture<'_, Result<Value>> {
        async move {
            let url = self.url(&format!("areas/{id}"))?;
            read_ack(self.send(self.client.delete(url)).await?).await
        }
        .boxed()
    }
}

// Url::join drops the last path segment unless it ends with a slash
fn base_url(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T> {
    let res = check_status(res).await?;
    Ok(res.json().await?)
}

async fn read_ack(res: Response) -> Result<Value> {
    let res = check_status(res).await?;
    let body = res.text().await?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body).unwrap_or_else(|_| Value::String(body)))
}

async fn check_status(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let url = res.url().to_string();
    let body = res.text().await.unwrap_or_default();
    warn!(url, status = status.as_u16(), body, "Backend request failed");
    match status {
        StatusCode::NOT_FOUND => Err(Error::NotFound(format!("{url} doesn't exist"))),
        _ => Err(Error::Api {
            status: status.as_u16(),
            message: body,
        }),
    }
}
