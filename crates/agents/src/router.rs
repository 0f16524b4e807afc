use super::*;
use std::sync::Arc;
use std::time::Duration;
use tycoon_core::*;

/// Why routing produced no decision. Only ever logged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Miss {
    #[error("no agent bound")]
    Unbound,
    #[error("agent timed out after {0:?}")]
    Timeout(Duration),
    #[error("agent reply invalid: {0}")]
    Invalid(#[from] Malformed),
    #[error("agent transport failed: {0}")]
    Transport(#[from] CourierError),
}

/// Resolves decisions for agent-bound seats under a hard deadline.
pub struct Router {
    registry: Arc<Registry>,
    courier: Arc<dyn Courier>,
    timeout: Duration,
}

impl Router {
    pub fn new(registry: Arc<Registry>, courier: Arc<dyn Courier>, timeout: Duration) -> Self {
        Self {
            registry,
            courier,
            timeout,
        }
    }
    pub fn http(registry: Arc<Registry>, timeout: Duration) -> Self {
        Self::new(registry, Arc::new(HttpCourier::default()), timeout)
    }
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
    /// Agent decision for the seat, or `None` when the caller should use built-in logic.
    pub async fn route(
        &self,
        game: GameId,
        slot: Slot,
        kind: DecisionKind,
        context: serde_json::Value,
    ) -> Option<Decision> {
        match self.resolve(game, slot, kind, context).await {
            Ok(decision) => Some(decision),
            Err(Miss::Unbound) => None,
            Err(miss) => {
                log::warn!("[router] game {} slot {} {}: {}", game, slot, kind, miss);
                None
            }
        }
    }
    /// Like [`Router::route`] but keeps the reason for a miss.
    /// A reply arriving after the timeout is never observed: the call is dropped.
    pub async fn resolve(
        &self,
        game: GameId,
        slot: Slot,
        kind: DecisionKind,
        context: serde_json::Value,
    ) -> Result<Decision, Miss> {
        let binding = self.registry.lookup(game, slot).await.ok_or(Miss::Unbound)?;
        let deadline = chrono::Utc::now()
            + chrono::Duration::from_std(self.timeout).unwrap_or(chrono::Duration::zero());
        let request = DecisionRequest::new(game, slot, kind, context, deadline);
        let ref url = endpoint(&binding.callback_url);
        log::debug!(
            "[router] asking {} for {} ({})",
            binding.agent_id,
            kind,
            request.request_id
        );
        let body = tokio::time::timeout(self.timeout, self.courier.deliver(url, &request))
            .await
            .map_err(|_| Miss::Timeout(self.timeout))??;
        let decision = request.accept(body)?;
        log::info!(
            "[router] {} decided {} for game {} slot {}",
            binding.agent_id,
            decision.action,
            game,
            slot
        );
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use serde_json::json;
    use std::sync::Mutex;

    /// Stub courier that answers with a closure, optionally after a delay.
    struct Scripted {
        delay: Duration,
        reply: Box<dyn Fn(&DecisionRequest) -> Result<Value, CourierError> + Send + Sync>,
        seen: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new<F>(delay: Duration, reply: F) -> Arc<Self>
        where
            F: Fn(&DecisionRequest) -> Result<Value, CourierError> + Send + Sync + 'static,
        {
            Arc::new(Self {
                delay,
                reply: Box::new(reply),
                seen: Mutex::new(Vec::new()),
            })
        }
        fn echo(action: &'static str) -> Arc<Self> {
            Self::new(Duration::ZERO, move |r| {
                Ok(json!({ "requestId": r.request_id.to_string(), "action": action }))
            })
        }
    }

    #[async_trait::async_trait]
    impl Courier for Scripted {
        async fn deliver(&self, url: &str, request: &DecisionRequest) -> Result<Value, CourierError> {
            self.seen.lock().unwrap().push(url.to_string());
            tokio::time::sleep(self.delay).await;
            (self.reply)(request)
        }
    }

    async fn router(courier: Arc<Scripted>, timeout: Duration) -> Router {
        let registry = Arc::new(Registry::default());
        registry
            .register(Registration::new(2, "x", "http://a:4077"))
            .await
            .unwrap();
        Router::new(registry, courier, timeout)
    }

    #[tokio::test]
    async fn unbound_slot_is_a_silent_miss() {
        let courier = Scripted::echo("buy");
        let router = Router::new(Arc::new(Registry::default()), courier.clone(), Duration::from_secs(8));
        let miss = router.resolve(1, 3, DecisionKind::Property, json!({})).await;
        assert_eq!(miss, Err(Miss::Unbound));
        assert!(courier.seen.lock().unwrap().is_empty());
    }
    #[tokio::test]
    async fn echoed_decision_is_returned() {
        let router = router(Scripted::echo("buy"), Duration::from_secs(8)).await;
        let decision = router.route(1, 2, DecisionKind::Property, json!({})).await;
        assert_eq!(decision, Some(Decision::new("buy")));
    }
    #[tokio::test]
    async fn calls_the_decision_endpoint() {
        let courier = Scripted::echo("skip");
        let router = router(courier.clone(), Duration::from_secs(8)).await;
        router.route(1, 2, DecisionKind::Strategy, json!({})).await;
        assert_eq!(*courier.seen.lock().unwrap(), vec!["http://a:4077/decision"]);
    }
    #[tokio::test(start_paused = true)]
    async fn slow_agent_times_out_to_none() {
        let courier = Scripted::new(Duration::from_secs(30), |r| {
            Ok(json!({ "requestId": r.request_id.to_string(), "action": "buy" }))
        });
        let router = router(courier, Duration::from_millis(8000)).await;
        let start = tokio::time::Instant::now();
        let miss = router.resolve(1, 2, DecisionKind::Property, json!({})).await;
        assert_eq!(miss, Err(Miss::Timeout(Duration::from_millis(8000))));
        assert!(start.elapsed() < Duration::from_millis(8100));
    }
    #[tokio::test]
    async fn mismatched_request_id_is_discarded() {
        let courier = Scripted::new(Duration::ZERO, |_| {
            Ok(json!({ "requestId": "stale", "action": "buy" }))
        });
        let router = router(courier, Duration::from_secs(8)).await;
        assert!(matches!(
            router.resolve(1, 2, DecisionKind::Property, json!({})).await,
            Err(Miss::Invalid(Malformed::Mismatch { .. }))
        ));
        assert_eq!(router.route(1, 2, DecisionKind::Property, json!({})).await, None);
    }
    #[tokio::test]
    async fn transport_errors_collapse_to_none() {
        let courier = Scripted::new(Duration::ZERO, |_| {
            Err(CourierError::Transport("connection refused".into()))
        });
        let router = router(courier, Duration::from_secs(8)).await;
        assert_eq!(router.route(1, 2, DecisionKind::Trade, json!({})).await, None);
    }
    #[tokio::test]
    async fn context_reaches_the_agent_verbatim() {
        let context = json!({ "myBalance": 1000, "landedProperty": { "price": 300 } });
        let expected = context.clone();
        let courier = Scripted::new(Duration::ZERO, move |r| {
            assert_eq!(r.context, expected);
            Ok(json!({ "requestId": r.request_id.to_string(), "action": "buy" }))
        });
        let router = router(courier, Duration::from_secs(8)).await;
        assert!(router.route(1, 2, DecisionKind::Property, context).await.is_some());
    }
    #[tokio::test]
    async fn stub_agent_over_http_round_trip() {
        let url = crate::courier::stub::agent(|body| {
            json!({
                "requestId": body["requestId"],
                "action": "buy",
                "confidence": 0.8,
            })
        })
        .await;
        let registry = Arc::new(Registry::default());
        registry
            .register(Registration::new(2, "x", &url))
            .await
            .unwrap();
        let router = Router::http(registry, Duration::from_millis(8000));
        let context = json!({ "myBalance": 1000, "landedProperty": { "price": 300 } });
        let decision = router.route(1, 2, DecisionKind::Property, context).await;
        assert_eq!(
            decision,
            Some(Decision {
                action: "buy".into(),
                property_id: None,
                reasoning: None,
                confidence: Some(0.8),
            })
        );
    }
}
