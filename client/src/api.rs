use reqwest::{StatusCode, Url};
use shared::{
    Coordinate, GeocodeHit, LoadMapReply, LoadMapRequest, MapStats, RouteError, RouteRequest,
    ServerReply, first_geocode_match,
};

use crate::{config::ClientConfig, error::ClientError};

/// HTTP side of the route server contract plus the geocoder.
#[derive(Debug, Clone)]
pub struct RouteClient {
    inner: reqwest::Client,
    base: Url,
    geocoder: Url,
}

impl RouteClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        // Nominatim rejects requests without a user agent.
        let inner = reqwest::Client::builder()
            .user_agent(concat!("route-planner/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            inner,
            base: parse_base(&config.server_url)?,
            geocoder: parse_base(&config.geocoder_url)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, RouteError> {
        self.base.join(path).map_err(RouteError::transport)
    }

    pub async fn load_map(&self, place_name: &str) -> Result<MapStats, RouteError> {
        let url = self.endpoint("load-map")?;
        tracing::info!(place_name, "loading map");
        let body = LoadMapRequest {
            place_name: place_name.to_string(),
        };
        let reply: LoadMapReply = self
            .inner
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(RouteError::transport)?
            .json()
            .await
            .map_err(RouteError::transport)?;
        reply.into_stats()
    }

    pub async fn calculate_route(&self, request: &RouteRequest) -> Result<ServerReply, RouteError> {
        let url = self.endpoint("calculate-route")?;
        tracing::debug!(
            start = ?request.start(),
            end = ?request.end(),
            optimization = request.optimization.as_str(),
            safety_points = request.safety_points.len(),
            "submitting route request"
        );
        let response = self
            .inner
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(RouteError::transport)?;
        read_reply(response, false).await
    }

    /// `404` means the task is still being processed.
    pub async fn route_result(&self, task_id: &str) -> Result<ServerReply, RouteError> {
        let mut url = self.endpoint("route-result/")?;
        url.path_segments_mut()
            .map_err(|()| RouteError::transport("route server url cannot be a base"))?
            .pop_if_empty()
            .push(task_id);
        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(RouteError::transport)?;
        read_reply(response, true).await
    }

    pub async fn geocode(&self, place: &str) -> Result<Option<Coordinate>, RouteError> {
        let mut url = self.geocoder.join("search").map_err(RouteError::transport)?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("q", place);
        let hits: Vec<GeocodeHit> = self
            .inner
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(RouteError::transport)?
            .json()
            .await
            .map_err(RouteError::transport)?;
        Ok(first_geocode_match(&hits))
    }
}

fn parse_base(raw: &str) -> Result<Url, ClientError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|err| ClientError::Url {
        url: raw.to_string(),
        reason: err.to_string(),
    })
}

/// A non-2xx answer that still carries an `error` field surfaces that message.
async fn read_reply(
    response: reqwest::Response,
    pending_on_404: bool,
) -> Result<ServerReply, RouteError> {
    let status = response.status();
    if pending_on_404 && status == StatusCode::NOT_FOUND {
        return Ok(ServerReply::processing());
    }
    let body = response.bytes().await.map_err(RouteError::transport)?;
    match serde_json::from_slice::<ServerReply>(&body) {
        Ok(reply) if status.is_success() => Ok(reply),
        Ok(ServerReply {
            error: Some(message),
            ..
        }) => Err(RouteError::Server(message)),
        Err(err) if status.is_success() => Err(RouteError::transport(err)),
        _ => Err(RouteError::transport(format!(
            "server responded with {status}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_urls_gain_a_trailing_slash() {
        let base = parse_base("http://localhost:5000/api").unwrap();
        assert_eq!(base.as_str(), "http://localhost:5000/api/");
        assert_eq!(
            base.join("calculate-route").unwrap().as_str(),
            "http://localhost:5000/api/calculate-route"
        );
    }

    #[test]
    fn rejects_garbage_urls() {
        let err = parse_base("not a url").unwrap_err();
        assert!(matches!(err, ClientError::Url { .. }));
    }
}
