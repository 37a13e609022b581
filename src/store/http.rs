use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::models::RecordId;

use super::mapping::Fields;
use super::remote::{FetchResponse, GetResponse, MutationResponse, Transport};
use super::{BoxFuture, StoreError, StoreResult};

const PROJECT_HEADER: &str = "x-project-id";

/// Record service transport over HTTP/JSON.
///
/// No request timeout is configured here; the service owns that policy.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, api_key: &str, project_id: &str) -> StoreResult<Self> {
        let client = Client::builder()
            .default_headers(default_headers(api_key, project_id)?)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn records_url(&self, table: &str) -> String {
        format!("{}/tables/{}/records", self.base_url, table)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, table: &str) -> StoreResult<T> {
        let response = request.send().await.map_err(|err| {
            tracing::error!(table, error = %err, "Record service request failed.");
            err
        })?;
        let body = response.error_for_status()?.json::<T>().await?;
        Ok(body)
    }

    fn mutation<'a>(
        &'a self,
        method: Method,
        table: &'a str,
        body: serde_json::Value,
    ) -> BoxFuture<'a, StoreResult<MutationResponse>> {
        Box::pin(async move {
            tracing::debug!(table, %method, "Sending record mutation.");
            let request = self.client.request(method, self.records_url(table)).json(&body);
            self.send(request, table).await
        })
    }
}

fn default_headers(api_key: &str, project_id: &str) -> StoreResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    if !api_key.is_empty() {
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {api_key}"))?);
    }
    if !project_id.is_empty() {
        headers.insert(HeaderName::from_static(PROJECT_HEADER), header_value(project_id)?);
    }
    Ok(headers)
}

fn header_value(raw: &str) -> StoreResult<HeaderValue> {
    HeaderValue::from_str(raw).map_err(|err| StoreError::Rejected {
        table: "*",
        operation: "configure",
        message: format!("invalid header value: {err}"),
    })
}

impl Transport for HttpTransport {
    fn fetch<'a>(
        &'a self,
        table: &'a str,
        fields: &'a [&'static str],
    ) -> BoxFuture<'a, StoreResult<FetchResponse>> {
        Box::pin(async move {
            let url = format!("{}/fetch", self.records_url(table));
            let request = self.client.post(url).json(&json!({ "fields": fields }));
            self.send(request, table).await
        })
    }

    fn get<'a>(&'a self, table: &'a str, id: RecordId) -> BoxFuture<'a, StoreResult<GetResponse>> {
        Box::pin(async move {
            let url = format!("{}/{}", self.records_url(table), id);
            self.send(self.client.get(url), table).await
        })
    }

    fn create<'a>(
        &'a self,
        table: &'a str,
        records: Vec<Fields>,
    ) -> BoxFuture<'a, StoreResult<MutationResponse>> {
        self.mutation(Method::POST, table, json!({ "records": records }))
    }

    fn update<'a>(
        &'a self,
        table: &'a str,
        records: Vec<Fields>,
    ) -> BoxFuture<'a, StoreResult<MutationResponse>> {
        self.mutation(Method::PATCH, table, json!({ "records": records }))
    }

    fn delete<'a>(
        &'a self,
        table: &'a str,
        ids: Vec<RecordId>,
    ) -> BoxFuture<'a, StoreResult<MutationResponse>> {
        self.mutation(Method::DELETE, table, json!({ "RecordIds": ids }))
    }
}
