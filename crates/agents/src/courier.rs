use super::*;

/// Transport failure talking to an agent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CourierError {
    #[error("agent unreachable: {0}")]
    Transport(String),
    #[error("agent answered {0}")]
    Status(u16),
    #[error("agent reply is not json: {0}")]
    Body(String),
}

/// Outbound channel to agents.
/// Dropping the returned future must abandon the call.
#[async_trait::async_trait]
pub trait Courier: Send + Sync {
    async fn deliver(
        &self,
        endpoint: &str,
        request: &DecisionRequest,
    ) -> Result<serde_json::Value, CourierError>;
}

/// reqwest-backed [`Courier`].
#[derive(Default, Clone)]
pub struct HttpCourier {
    client: reqwest::Client,
}

impl HttpCourier {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Courier for HttpCourier {
    async fn deliver(
        &self,
        endpoint: &str,
        request: &DecisionRequest,
    ) -> Result<serde_json::Value, CourierError> {
        let response = self
            .client
            .post(endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| CourierError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(CourierError::Status(response.status().as_u16()));
        }
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| CourierError::Body(e.to_string()))
    }
}

/// Endpoint an agent answers decisions on.
pub fn endpoint(callback_url: &str) -> String {
    format!("{}/decision", callback_url.trim_end_matches('/'))
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    #[test]
    fn endpoint_appends_decision_path() {
        assert_eq!(endpoint("http://a:4077"), "http://a:4077/decision");
        assert_eq!(endpoint("http://a:4077/"), "http://a:4077/decision");
    }
    #[tokio::test]
    async fn http_courier_posts_the_request_body() {
        let url = stub::agent(|body| json!({ "seen": body["decisionType"] })).await;
        let request = DecisionRequest::new(1, 2, DecisionKind::Trade, json!({}), Utc::now());
        let reply = HttpCourier::default()
            .deliver(&endpoint(&url), &request)
            .await
            .unwrap();
        assert_eq!(reply, json!({ "seen": "trade" }));
    }
    #[tokio::test]
    async fn http_courier_reports_error_statuses() {
        let url = stub::agent(|_| json!({})).await;
        let request = DecisionRequest::new(1, 2, DecisionKind::Trade, json!({}), Utc::now());
        let reply = HttpCourier::default()
            .deliver(&format!("{}/elsewhere", url), &request)
            .await;
        assert_eq!(reply, Err(CourierError::Status(404)));
    }
}
