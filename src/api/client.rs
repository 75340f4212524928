use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::json;

use super::download::{filename_from_disposition, Download, EXPORT_DEFAULT_NAME, TEMPLATE_DEFAULT_NAME};
use super::{Backend, MutationAck};
use crate::config::BackendSettings;
use crate::error::{DashboardError, Result};
use crate::models::{
    ApiEnvelope, AuthUser, DashboardSummary, InventoryCategory, InvoiceRecord, ProductRecord, StockUpdate,
    StoreRecord,
};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// reqwest-backed [`Backend`].
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BackendClient {
    pub fn new(settings: &BackendSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("erp-dashboard/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone().filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> Result<(RequestBuilder, String)> {
        let token = self.token.as_deref().ok_or(DashboardError::Unauthorized)?;
        let request_id = uuid::Uuid::new_v4().to_string();

        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert(REQUEST_ID_HEADER, value);
        }

        let builder = self
            .http
            .request(method, self.endpoint(path))
            .bearer_auth(token)
            .headers(headers);
        Ok((builder, request_id))
    }

    /// Sends the request and maps auth failures. Other statuses are left to the
    /// envelope, since the backend reports business errors with 4xx bodies.
    async fn send(&self, builder: RequestBuilder, request_id: &str, what: &str) -> Result<reqwest::Response> {
        tracing::debug!(request_id, what, "sending request");
        let response = builder.send().await.map_err(|e| {
            tracing::warn!(request_id, what, error = %e, "request failed");
            DashboardError::from(e)
        })?;

        let status = response.status();
        tracing::debug!(request_id, what, status = status.as_u16(), "response received");
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            tracing::warn!(request_id, what, status = status.as_u16(), "not authorized");
            return Err(DashboardError::Unauthorized);
        }
        Ok(response)
    }

    async fn envelope(&self, builder: RequestBuilder, request_id: &str, what: &str) -> Result<ApiEnvelope> {
        let response = self.send(builder, request_id, what).await?;
        let status = response.status();
        let body = response.bytes().await?;

        match serde_json::from_slice::<ApiEnvelope>(&body) {
            Ok(env) => env.into_success(),
            Err(_) if status.is_server_error() => {
                Err(DashboardError::Transport(format!("server returned {status}")))
            }
            Err(e) => {
                tracing::warn!(request_id, what, status = status.as_u16(), error = %e, "undecodable response");
                Err(DashboardError::Decode(e.to_string()))
            }
        }
    }

    async fn call(&self, method: Method, path: &str) -> Result<ApiEnvelope> {
        let (builder, request_id) = self.request(method, path)?;
        self.envelope(builder, &request_id, path).await
    }

    async fn call_json<B: Serialize + ?Sized + Sync>(&self, method: Method, path: &str, body: &B) -> Result<ApiEnvelope> {
        let (builder, request_id) = self.request(method, path)?;
        self.envelope(builder.json(body), &request_id, path).await
    }

    fn ack(env: ApiEnvelope) -> MutationAck {
        MutationAck { message: env.message }
    }

    /// Reads a file response chunk by chunk. A JSON body is the backend
    /// reporting an error in its usual envelope.
    async fn download(&self, builder: RequestBuilder, request_id: &str, what: &str, default_name: &str) -> Result<Download> {
        let response = self.send(builder, request_id, what).await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| default_name.to_string());

        let is_json = content_type
            .as_deref()
            .and_then(|ct| ct.parse::<mime::Mime>().ok())
            .is_some_and(|m| m.subtype() == mime::JSON);
        if is_json || !status.is_success() {
            let body = response.bytes().await?;
            return match serde_json::from_slice::<ApiEnvelope>(&body) {
                Ok(env) => {
                    env.into_success()?;
                    Err(DashboardError::Decode(format!("{what}: expected a file, got JSON")))
                }
                Err(_) => Err(DashboardError::Transport(format!("{what}: server returned {status}"))),
            };
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            bytes.extend_from_slice(&chunk?);
        }

        tracing::info!(request_id, what, file_name = %file_name, size = bytes.len(), "download completed");
        Ok(Download {
            file_name,
            content_type,
            bytes,
        })
    }
}

fn upload_mime(file_name: &str) -> Result<mime::Mime> {
    let ext = file_name.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Ok(mime::TEXT_CSV),
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            .parse()
            .map_err(|_| DashboardError::validation("file", "unsupported spreadsheet type")),
        _ => Err(DashboardError::validation(
            "file",
            "only .csv and .xlsx files can be uploaded",
        )),
    }
}

/// Percent-encodes an id for use as one path segment; only unreserved
/// characters pass through.
fn path_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[async_trait]
impl Backend for BackendClient {
    async fn list_products(&self, category: InventoryCategory) -> Result<Vec<ProductRecord>> {
        let path = format!("product/all?category={category}");
        self.call(Method::GET, &path).await?.take_or_default("products")
    }

    async fn list_wip(&self) -> Result<Vec<ProductRecord>> {
        self.call(Method::GET, "product/wip").await?.take_or_default("products")
    }

    async fn get_product(&self, id: &str) -> Result<ProductRecord> {
        self.call(Method::GET, &format!("product/{}", path_segment(id))).await?.take("product")
    }

    async fn create_product(&self, product: &ProductRecord) -> Result<MutationAck> {
        self.call_json(Method::POST, "product", product).await.map(Self::ack)
    }

    async fn update_product(&self, product: &ProductRecord) -> Result<MutationAck> {
        if product.id.is_none() {
            return Err(DashboardError::validation("id", "product id is required for an update"));
        }
        self.call_json(Method::PUT, "product", product).await.map(Self::ack)
    }

    async fn delete_product(&self, id: &str) -> Result<MutationAck> {
        self.call_json(Method::DELETE, "product", &json!({ "id": id }))
            .await
            .map(Self::ack)
    }

    async fn update_stock(&self, updates: &[StockUpdate]) -> Result<MutationAck> {
        self.call_json(
            Method::PUT,
            "product/update-stock-and-shortages",
            &json!({ "products": updates }),
        )
        .await
        .map(Self::ack)
    }

    async fn list_stores(&self) -> Result<Vec<StoreRecord>> {
        self.call(Method::GET, "store/all").await?.take_or_default("stores")
    }

    async fn current_user(&self) -> Result<AuthUser> {
        self.call(Method::GET, "auth/user").await?.take("user")
    }

    async fn list_invoices(&self) -> Result<Vec<InvoiceRecord>> {
        self.call(Method::GET, "invoice/all").await?.take_or_default("invoices")
    }

    async fn get_invoice(&self, id: &str) -> Result<InvoiceRecord> {
        self.call(Method::GET, &format!("invoice/{}", path_segment(id))).await?.take("invoice")
    }

    async fn create_invoice(&self, invoice: &InvoiceRecord) -> Result<MutationAck> {
        self.call_json(Method::POST, "invoice", invoice).await.map(Self::ack)
    }

    async fn update_invoice(&self, invoice: &InvoiceRecord) -> Result<MutationAck> {
        if invoice.id.is_none() {
            return Err(DashboardError::validation("id", "invoice id is required for an update"));
        }
        self.call_json(Method::PUT, "invoice", invoice).await.map(Self::ack)
    }

    async fn delete_invoice(&self, id: &str) -> Result<MutationAck> {
        self.call_json(Method::DELETE, "invoice", &json!({ "id": id }))
            .await
            .map(Self::ack)
    }

    async fn dashboard_summary(&self) -> Result<DashboardSummary> {
        self.call(Method::GET, "dashboard/summary").await?.take_or_default("summary")
    }

    async fn bulk_upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<MutationAck> {
        let mime = upload_mime(file_name)?;
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime.as_ref())?;
        let form = Form::new().part("file", part);

        let (builder, request_id) = self.request(Method::POST, "product/bulk-upload")?;
        let env = self.envelope(builder.multipart(form), &request_id, "product/bulk-upload").await?;
        tracing::info!(request_id, file_name, "bulk upload accepted");
        Ok(Self::ack(env))
    }

    async fn sample_template(&self) -> Result<Download> {
        let (builder, request_id) = self.request(Method::GET, "product/sample-template")?;
        self.download(builder, &request_id, "product/sample-template", TEMPLATE_DEFAULT_NAME)
            .await
    }

    async fn export_products(&self, category: Option<InventoryCategory>) -> Result<Download> {
        let path = match category {
            Some(c) => format!("product/export?category={c}"),
            None => "product/export".to_string(),
        };
        let (builder, request_id) = self.request(Method::GET, &path)?;
        self.download(builder, &request_id, &path, EXPORT_DEFAULT_NAME).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(token: Option<&str>) -> BackendSettings {
        BackendSettings {
            base_url: "http://localhost:9000/api/".to_string(),
            token: token.map(str::to_string),
            timeout_secs: 5,
        }
    }

    #[test]
    fn endpoints_join_cleanly() {
        let client = BackendClient::new(&settings(Some("t"))).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000/api");
        assert_eq!(client.endpoint("/product/wip"), "http://localhost:9000/api/product/wip");
    }

    #[test]
    fn ids_are_encoded_as_a_single_segment() {
        assert_eq!(path_segment("65f1c0ab"), "65f1c0ab");
        assert_eq!(path_segment("a/b c"), "a%2Fb%20c");
        assert_eq!(path_segment("../all?x=1"), "..%2Fall%3Fx%3D1");
        assert_eq!(path_segment("ß"), "%C3%9F");
    }

    #[tokio::test]
    async fn missing_token_is_an_auth_failure() {
        let client = BackendClient::new(&settings(None)).unwrap();
        let err = client.list_wip().await.unwrap_err();
        assert!(matches!(err, DashboardError::Unauthorized));
    }

    #[test]
    fn only_spreadsheets_upload() {
        assert_eq!(upload_mime("stock.CSV").unwrap(), mime::TEXT_CSV);
        assert!(upload_mime("stock.xlsx").is_ok());
        assert!(matches!(upload_mime("stock.pdf"), Err(DashboardError::Validation { .. })));
    }
}
