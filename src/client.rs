//! The configured API gateway: one explicitly constructed client owning the
//! transport handle and the backend's resolved endpoint set. Constructed in
//! `main` (or a test) and passed by reference; there is no hidden global.

use crate::config::Config;
use crate::endpoint::{Endpoint, EndpointError, ResourceSpec, ResourceTree, Verb};
use crate::models::Page;
use crate::transport::{ApiError, ApiRequest, HttpTransport, Transport};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Resolved endpoints of the workbench backend.
#[derive(Debug, Clone)]
pub(crate) struct Endpoints {
    pub captures: Endpoint,
    pub capture_messages: Endpoint,
    pub messages: Endpoint,
    pub symbols: Endpoint,
    pub symbol_messages: Endpoint,
    pub symbol_cells: Endpoint,
    pub symbol_split_align: Endpoint,
    pub symbol_specialize: Endpoint,
    pub parse_raw: Endpoint,
    pub parse_pcap: Endpoint,
}

/// The backend's resource tree. `split_align`, `specialize` and the misc
/// parse operations route without a trailing slash on the server side.
fn resource_tree(base_url: &str) -> Result<ResourceTree, EndpointError> {
    ResourceTree::new(
        base_url,
        vec![
            ResourceSpec::new("captures").child(ResourceSpec::new("messages")),
            ResourceSpec::new("messages"),
            ResourceSpec::new("symbols")
                .child(ResourceSpec::new("messages"))
                .child(ResourceSpec::new("cells"))
                .child(ResourceSpec::new("split_align").no_trailing_slash())
                .child(ResourceSpec::new("specialize").no_trailing_slash()),
            ResourceSpec::new("misc")
                .child(ResourceSpec::new("parse_raw").no_trailing_slash())
                .child(ResourceSpec::new("parse_pcap").no_trailing_slash()),
        ],
    )
}

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    pub(crate) ep: Endpoints,
    page_limit: usize,
}

impl ApiClient {
    /// Build a client over the given transport. Every endpoint is resolved
    /// here, so a malformed base URL or tree fails before any request.
    pub fn new(cfg: &Config, transport: Arc<dyn Transport>) -> Result<Self, ApiError> {
        let tree = resource_tree(&cfg.base_url)?;
        let ep = Endpoints {
            captures: tree.endpoint(&["captures"])?,
            capture_messages: tree.endpoint(&["captures", "messages"])?,
            messages: tree.endpoint(&["messages"])?,
            symbols: tree.endpoint(&["symbols"])?,
            symbol_messages: tree.endpoint(&["symbols", "messages"])?,
            symbol_cells: tree.endpoint(&["symbols", "cells"])?,
            symbol_split_align: tree.endpoint(&["symbols", "split_align"])?,
            symbol_specialize: tree.endpoint(&["symbols", "specialize"])?,
            parse_raw: tree.endpoint(&["misc", "parse_raw"])?,
            parse_pcap: tree.endpoint(&["misc", "parse_pcap"])?,
        };
        Ok(Self {
            transport,
            ep,
            page_limit: cfg.page_limit,
        })
    }

    /// Convenience constructor wiring the production HTTP transport.
    pub fn over_http(cfg: &Config) -> Result<Self, ApiError> {
        Self::new(cfg, Arc::new(HttpTransport::new(cfg.timeout_ms, cfg.retries)))
    }

    /// Page size the configuration asked list operations to use.
    pub fn default_page(&self) -> Page {
        Page::first(self.page_limit)
    }

    pub(crate) async fn create<T: DeserializeOwned>(
        &self,
        ep: &Endpoint,
        parents: &[&str],
        body: Value,
    ) -> Result<T, ApiError> {
        let url = ep.collection(parents)?;
        let raw = self
            .transport
            .send(ApiRequest::new(ep.method(Verb::Create), url.clone()).with_body(body))
            .await?;
        decode(&url, raw)
    }

    pub(crate) async fn read_all<T: DeserializeOwned>(
        &self,
        ep: &Endpoint,
        parents: &[&str],
        page: Page,
    ) -> Result<Vec<T>, ApiError> {
        let url = ep.collection(parents)?;
        let raw = self
            .transport
            .send(ApiRequest::new(ep.method(Verb::Read), url.clone()).with_query(page.query()))
            .await?;
        decode(&url, raw)
    }

    pub(crate) async fn read_one<T: DeserializeOwned>(
        &self,
        ep: &Endpoint,
        parents: &[&str],
        id: &str,
    ) -> Result<T, ApiError> {
        let url = ep.item(parents, id)?;
        let raw = self
            .transport
            .send(ApiRequest::new(ep.method(Verb::Read), url.clone()))
            .await?;
        decode(&url, raw)
    }

    /// GET on a nested operation resource (cells, split_align, specialize).
    pub(crate) async fn read_nested<T: DeserializeOwned>(
        &self,
        ep: &Endpoint,
        parents: &[&str],
    ) -> Result<T, ApiError> {
        let url = ep.collection(parents)?;
        let raw = self
            .transport
            .send(ApiRequest::new(ep.method(Verb::Read), url.clone()))
            .await?;
        decode(&url, raw)
    }

    /// PUT an item under its parent: associates `id` with the parent chain.
    /// Used for message-to-symbol assignment.
    pub(crate) async fn update(
        &self,
        ep: &Endpoint,
        parents: &[&str],
        id: &str,
    ) -> Result<(), ApiError> {
        let url = ep.item(parents, id)?;
        self.transport
            .send(ApiRequest::new(ep.method(Verb::Update), url))
            .await?;
        Ok(())
    }

    /// PATCH a single record; only the fields present in `body` change.
    pub(crate) async fn patch<T: DeserializeOwned>(
        &self,
        ep: &Endpoint,
        parents: &[&str],
        id: &str,
        body: Value,
    ) -> Result<T, ApiError> {
        let url = ep.item(parents, id)?;
        let raw = self
            .transport
            .send(ApiRequest::new(ep.method(Verb::Patch), url.clone()).with_body(body))
            .await?;
        decode(&url, raw)
    }

    pub(crate) async fn delete(
        &self,
        ep: &Endpoint,
        parents: &[&str],
        id: &str,
    ) -> Result<(), ApiError> {
        let url = ep.item(parents, id)?;
        self.transport
            .send(ApiRequest::new(ep.method(Verb::Delete), url))
            .await?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(url: &str, raw: Value) -> Result<T, ApiError> {
    serde_json::from_value(raw).map_err(|e| ApiError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Symbol;
    use crate::transport::testing::{Canned, RouteTransport};
    use crate::transport::Method;
    use serde_json::json;

    fn test_config() -> Config {
        Config {
            base_url: "http://backend.test/api/v1/projects/p1".to_string(),
            timeout_ms: 1000,
            retries: 0,
            page_limit: 50,
        }
    }

    fn client(routes: Vec<(Method, &str, Canned)>) -> (ApiClient, Arc<RouteTransport>) {
        let transport = Arc::new(RouteTransport::new(routes));
        let api = ApiClient::new(&test_config(), transport.clone()).unwrap();
        (api, transport)
    }

    #[tokio::test]
    async fn create_posts_body_to_collection() {
        let (api, transport) = client(vec![(
            Method::Post,
            "/symbols/",
            Canned::Ok(json!({"id": "s1", "name": "login"})),
        )]);
        let ep = api.ep.symbols.clone();
        let created: Symbol = api.create(&ep, &[], json!({"name": "login"})).await.unwrap();
        assert_eq!(created.id, "s1");

        let seen = transport.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].url,
            "http://backend.test/api/v1/projects/p1/symbols/"
        );
        assert_eq!(seen[0].body, Some(json!({"name": "login"})));
    }

    #[tokio::test]
    async fn read_all_sends_page_query() {
        let (api, transport) = client(vec![(Method::Get, "/symbols/", Canned::Ok(json!([])))]);
        let ep = api.ep.symbols.clone();
        let listed: Vec<Symbol> = api.read_all(&ep, &[], Page::first(50)).await.unwrap();
        assert!(listed.is_empty());
        assert_eq!(
            transport.requests()[0].query,
            vec![
                ("limit".to_string(), "50".to_string()),
                ("offset".to_string(), "0".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn patch_targets_the_item_url() {
        let (api, transport) = client(vec![(
            Method::Patch,
            "/symbols/s1/",
            Canned::Ok(json!({"id": "s1", "name": "renamed"})),
        )]);
        let ep = api.ep.symbols.clone();
        let patched: Symbol = api
            .patch(&ep, &[], "s1", json!({"name": "renamed"}))
            .await
            .unwrap();
        assert_eq!(patched.name, "renamed");
        assert_eq!(transport.requests()[0].method, Method::Patch);
    }

    #[tokio::test]
    async fn update_puts_nested_item_without_body() {
        let (api, transport) = client(vec![(
            Method::Put,
            "/symbols/s1/messages/m2/",
            Canned::Ok(serde_json::Value::Null),
        )]);
        let ep = api.ep.symbol_messages.clone();
        api.update(&ep, &["s1"], "m2").await.unwrap();
        let seen = transport.requests();
        assert_eq!(seen[0].method, Method::Put);
        assert_eq!(seen[0].body, None);
    }

    #[tokio::test]
    async fn delete_propagates_not_found() {
        let (api, _) = client(vec![(
            Method::Delete,
            "/symbols/nope/",
            Canned::Status(404, "no such symbol"),
        )]);
        let ep = api.ep.symbols.clone();
        let err = api.delete(&ep, &[], "nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn decode_failure_is_surfaced() {
        let (api, _) = client(vec![(
            Method::Get,
            "/symbols/s1/",
            Canned::Ok(json!({"unexpected": true})),
        )]);
        let ep = api.ep.symbols.clone();
        let err = api.read_one::<Symbol>(&ep, &[], "s1").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[test]
    fn construction_rejects_malformed_base_url() {
        let cfg = Config {
            base_url: "backend.test/api".to_string(),
            ..test_config()
        };
        let transport = Arc::new(RouteTransport::new(vec![]));
        assert!(ApiClient::new(&cfg, transport).is_err());
    }
}
