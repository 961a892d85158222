//! Fake knowledge sources on a single wiremock server
//!
//! Each service lives under its own path prefix so one `MockServer` can
//! stand in for all four. Requests nothing is mounted for get wiremock's
//! default 404.

use onto_enrich::sources::{CheckFailurePolicy, SourceConfig, SourceEndpoints};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const WIKIPEDIA_PATH: &str = "/wikipedia/api.php";
pub const WIKIDATA_PATH: &str = "/wikidata/api.php";
pub const KNOWLEDGE_GRAPH_PATH: &str = "/kg/v1/entities:search";
pub const PRODUCT_ONTOLOGY_PATH: &str = "/po/id/";

pub struct FakeWeb {
    pub server: MockServer,
}

impl FakeWeb {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Endpoints pointing API calls at the mock server
    ///
    /// Article and entity bases keep their public values; they are only
    /// used to build output URLs.
    pub fn endpoints(&self) -> SourceEndpoints {
        let uri = self.server.uri();
        SourceEndpoints {
            wikipedia_api: format!("{}{}", uri, WIKIPEDIA_PATH),
            wikidata_api: format!("{}{}", uri, WIKIDATA_PATH),
            knowledge_graph_api: format!("{}{}", uri, KNOWLEDGE_GRAPH_PATH),
            product_ontology_base: format!("{}{}", uri, PRODUCT_ONTOLOGY_PATH),
            ..SourceEndpoints::default()
        }
    }

    pub fn source_config(&self, knowledge_graph_api_key: Option<&str>) -> SourceConfig {
        SourceConfig {
            endpoints: self.endpoints(),
            timeout: Duration::from_secs(5),
            knowledge_graph_api_key: knowledge_graph_api_key.map(str::to_string),
            check_product_ontology: true,
            check_failure_policy: CheckFailurePolicy::AssumeValid,
        }
    }

    /// Number of requests received whose query string contains `needle`
    pub async fn requests_matching(&self, needle: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.query().unwrap_or("").contains(needle))
            .count()
    }

    pub async fn total_requests(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or(0)
    }

    pub async fn mount_wikipedia_search(&self, query: &str, titles: &[&str]) {
        let hits: Vec<_> = titles
            .iter()
            .enumerate()
            .map(|(i, title)| json!({ "ns": 0, "title": title, "pageid": 1000 + i }))
            .collect();

        Mock::given(method("GET"))
            .and(path(WIKIPEDIA_PATH))
            .and(query_param("list", "search"))
            .and(query_param("srsearch", query))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "batchcomplete": "",
                "query": { "searchinfo": { "totalhits": hits.len() }, "search": hits }
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_wikipedia_extract(&self, title: &str, extract: &str) {
        Mock::given(method("GET"))
            .and(path(WIKIPEDIA_PATH))
            .and(query_param("prop", "extracts"))
            .and(query_param("titles", title))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": { "pages": { "1000": { "pageid": 1000, "title": title, "extract": extract } } }
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_wikipedia_pageprops(&self, title: &str, wikidata_id: &str) {
        Mock::given(method("GET"))
            .and(path(WIKIPEDIA_PATH))
            .and(query_param("prop", "pageprops"))
            .and(query_param("titles", title))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": { "pages": { "1000": { "pageid": 1000, "title": title,
                    "pageprops": { "wikibase_item": wikidata_id } } } }
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_wikidata_search(&self, name: &str, wikidata_id: &str) {
        Mock::given(method("GET"))
            .and(path(WIKIDATA_PATH))
            .and(query_param("action", "wbsearchentities"))
            .and(query_param("search", name))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "search": [{ "id": wikidata_id, "label": name }],
                "success": 1
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_wikidata_image(&self, wikidata_id: &str, file_name: &str) {
        Mock::given(method("GET"))
            .and(path(WIKIDATA_PATH))
            .and(query_param("action", "wbgetentities"))
            .and(query_param("ids", wikidata_id))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": { wikidata_id: { "claims": { "P18": [
                    { "mainsnak": { "snaktype": "value", "property": "P18",
                        "datavalue": { "value": file_name, "type": "string" } } }
                ] } } }
            })))
            .mount(&self.server)
            .await;
    }

    /// Knowledge Graph answer for `query`; `None` returns an empty list
    pub async fn mount_knowledge_graph(&self, query: &str, graph_id: Option<&str>) {
        let items = match graph_id {
            Some(id) => json!([{ "@type": "EntitySearchResult",
                "result": { "@id": format!("kg:{}", id), "name": query }, "resultScore": 1000 }]),
            None => json!([]),
        };

        Mock::given(method("GET"))
            .and(path(KNOWLEDGE_GRAPH_PATH))
            .and(query_param("query", query))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "@type": "ItemList",
                "itemListElement": items
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_product_ontology(&self, slug: &str, status: u16) {
        Mock::given(method("HEAD"))
            .and(path(format!("{}{}", PRODUCT_ONTOLOGY_PATH, slug)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Every source answering for `name` under `title` / `wikidata_id`
    pub async fn mount_fully_known(&self, name: &str, wikidata_id: &str, graph_id: &str, slug: &str) {
        self.mount_wikipedia_search(name, &[name, &format!("{} (disambiguation)", name)])
            .await;
        self.mount_wikipedia_extract(name, &format!("{} is a well-known entity.", name))
            .await;
        self.mount_wikipedia_pageprops(name, wikidata_id).await;
        self.mount_wikidata_image(wikidata_id, &format!("{} logo.svg", name))
            .await;
        self.mount_knowledge_graph(name, Some(graph_id)).await;
        self.mount_product_ontology(slug, 200).await;
    }
}
