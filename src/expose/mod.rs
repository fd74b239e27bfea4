//! Prometheus text exposition: sample encoding plus the HTTP surface.
//!
//! Encoding builds a fresh registry per scrape. Samples are gauges rather
//! than counters even where the underlying value is cumulative, because every
//! value is a point-in-time restatement of a hypervisor or guest counter, not
//! a value this process increments.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use prometheus::{GaugeVec, Opts, Registry, TextEncoder};
use tokio::net::ToSocketAddrs;

use crate::sample::Sample;
use crate::scrape::Scraper;

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to build metric family `{name}`: {source}")]
    Family {
        name: String,
        #[source]
        source: prometheus::Error,
    },

    #[error("failed to render metrics: {source}")]
    Render {
        #[source]
        source: prometheus::Error,
    },
}

/// Renders a batch of samples as Prometheus text format.
///
/// Samples sharing a metric name are merged into one family; their label
/// names must agree (they come from the same [`Desc`](crate::sample::Desc)).
pub fn encode(samples: &[Sample]) -> Result<String, EncodeError> {
    let registry = Registry::new();
    let mut families: HashMap<&str, GaugeVec> = HashMap::new();

    for sample in samples {
        let gauge = match families.entry(sample.name()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let gauge = GaugeVec::new(
                    Opts::new(sample.name(), sample.help()),
                    sample.label_names(),
                )
                .map_err(|source| EncodeError::Family {
                    name: sample.name().to_owned(),
                    source,
                })?;
                registry
                    .register(Box::new(gauge.clone()))
                    .map_err(|source| EncodeError::Family {
                        name: sample.name().to_owned(),
                        source,
                    })?;
                entry.insert(gauge)
            }
        };
        let values: Vec<&str> = sample.label_values().iter().map(String::as_str).collect();
        gauge.with_label_values(&values).set(sample.value());
    }

    let mut body = String::new();
    TextEncoder::new()
        .encode_utf8(&registry.gather(), &mut body)
        .map_err(|source| EncodeError::Render { source })?;
    Ok(body)
}

const INDEX_PAGE: &str = "<html>\
<head><title>Libvirt Exporter</title></head>\
<body><h1>Libvirt Exporter</h1><p><a href=\"/metrics\">Metrics</a></p></body>\
</html>";

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

async fn metrics(State(scraper): State<Arc<Scraper>>) -> Response {
    let scraped =
        tokio::task::spawn_blocking(move || scraper.scrape().map(|samples| encode(&samples)))
            .await;
    let body = match scraped {
        Ok(Ok(Ok(body))) => body,
        Ok(Ok(Err(err))) => {
            log::error!("Failed to encode metrics: {}", err);
            return (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics")
                .into_response();
        }
        Ok(Err(err)) => {
            log::error!("Failed to scrape hypervisor: {}", err);
            return (StatusCode::INTERNAL_SERVER_ERROR, "failed to scrape hypervisor")
                .into_response();
        }
        Err(err) => {
            log::error!("Scrape worker panicked: {}", err);
            return (StatusCode::INTERNAL_SERVER_ERROR, "failed to scrape hypervisor")
                .into_response();
        }
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}

pub struct MetricsServer {
    router: axum::Router,
}

impl MetricsServer {
    pub fn new(scraper: Arc<Scraper>) -> Self {
        let router = axum::Router::new()
            .route("/", get(index))
            .route("/metrics", get(metrics))
            .with_state(scraper);
        Self { router }
    }

    pub async fn listen(self, addr: impl ToSocketAddrs) {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("TCP Listener bind");
        axum::serve(listener, self.router.into_make_service())
            .await
            .expect("HTTP server")
    }
}
