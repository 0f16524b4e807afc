use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::http::StatusCode;
use actix_web::web;
use serde::Deserialize;
use tycoon_arbiter::Action;
use tycoon_arbiter::Arbiter;
use tycoon_arbiter::Rejection;
use tycoon_cache::SessionCache;
use tycoon_core::*;
use tycoon_gate::Gate;

/// Body of `POST /games/{id}/actions`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub user_id: UserId,
    pub action: Action,
}

/// Body of `POST /games/{id}/votes`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub voter_id: UserId,
    pub target_id: UserId,
}

pub async fn health(arbiter: web::Data<Arbiter>) -> impl Responder {
    match arbiter
        .store()
        .ping()
        .await
        .inspect_err(|e| log::error!("health check failed: {}", e))
    {
        Ok(_) => HttpResponse::Ok().body("ok"),
        Err(_) => HttpResponse::ServiceUnavailable().body("database unavailable"),
    }
}

/// Viewer snapshot through the read-through cache.
pub async fn snapshot(
    arbiter: web::Data<Arbiter>,
    cache: web::Data<SessionCache>,
    path: web::Path<String>,
) -> impl Responder {
    let code = path.into_inner();
    let load = {
        let store = arbiter.store().clone();
        let code = code.clone();
        move || async move { store.snapshot(&code).await }
    };
    match cache.fetch(&code, load).await {
        Ok(Some(snapshot)) => HttpResponse::Ok().json(snapshot),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({ "error": "game not found" })),
        Err(e) => {
            log::error!("snapshot {} failed: {}", code, e);
            HttpResponse::ServiceUnavailable().json(serde_json::json!({ "error": e.to_string() }))
        }
    }
}

pub async fn act(
    arbiter: web::Data<Arbiter>,
    gate: web::Data<Gate>,
    path: web::Path<GameId>,
    req: web::Json<ActionRequest>,
    http: HttpRequest,
) -> impl Responder {
    if let Some(refusal) = throttle(&gate, &http) {
        return refusal;
    }
    let ActionRequest { user_id, action } = req.into_inner();
    match arbiter.into_inner().attempt(path.into_inner(), user_id, action).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(rejection) => refuse(rejection),
    }
}

pub async fn vote(
    arbiter: web::Data<Arbiter>,
    gate: web::Data<Gate>,
    path: web::Path<GameId>,
    req: web::Json<VoteRequest>,
    http: HttpRequest,
) -> impl Responder {
    if let Some(refusal) = throttle(&gate, &http) {
        return refusal;
    }
    let VoteRequest {
        voter_id,
        target_id,
    } = req.into_inner();
    match arbiter.into_inner().vote(path.into_inner(), voter_id, target_id).await {
        Ok(ballot) => HttpResponse::Ok().json(ballot),
        Err(rejection) => refuse(rejection),
    }
}

pub fn status(rejection: &Rejection) -> StatusCode {
    match rejection {
        Rejection::LockContention => StatusCode::CONFLICT,
        Rejection::NotYourTurn { .. } => StatusCode::FORBIDDEN,
        Rejection::UnknownGame(_) | Rejection::UnknownPlayer(_) => StatusCode::NOT_FOUND,
        Rejection::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Refusal for an origin over its request budget.
/// Requests without a peer address are not attributed and pass.
fn throttle(gate: &Gate, http: &HttpRequest) -> Option<HttpResponse> {
    let origin = http.peer_addr()?.ip();
    let throttled = gate.limit(origin).err()?;
    log::warn!("[gate] {}: {}", origin, throttled);
    Some(HttpResponse::TooManyRequests().json(serde_json::json!({
        "error": throttled.to_string(),
        "retryable": true,
    })))
}

fn refuse(rejection: Rejection) -> HttpResponse {
    HttpResponse::build(status(&rejection)).json(serde_json::json!({
        "error": rejection.to_string(),
        "retryable": !rejection.is_domain(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::App;
    use actix_web::test;
    use serde_json::Value;
    use serde_json::json;
    use std::sync::Arc;
    use std::net::SocketAddr;
    use tycoon_arbiter::Loaded;
    use tycoon_gate::GateConfig;
    use tycoon_records::*;

    async fn seeded() -> (Arc<Memory>, Arc<Arbiter>, Arc<SessionCache>) {
        let store = Arc::new(Memory::default());
        store
            .insert(
                GameSession::running(1, "G1", 10),
                vec![Player::new(10, 1, 1500), Player::new(20, 2, 1500)],
            )
            .await;
        let cache = Arc::new(SessionCache::default());
        let arbiter = Arbiter::new(store.clone(), Arc::new(Barren), cache.clone(), Arc::new(()))
            .with_dice(Arc::new(Loaded::new([(1, 2)])));
        (store, Arc::new(arbiter), cache)
    }

    macro_rules! app {
        ($arbiter:expr, $cache:expr) => {
            app!($arbiter, $cache, Gate::new(GateConfig::default()))
        };
        ($arbiter:expr, $cache:expr, $gate:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::from($arbiter.clone()))
                    .app_data(web::Data::from($cache.clone()))
                    .app_data(web::Data::from($gate))
                    .configure(crate::routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_answers_ok() {
        let (_, arbiter, cache) = seeded().await;
        let app = app!(arbiter, cache);
        let req = test::TestRequest::get().uri("/health").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "ok");
    }

    #[actix_web::test]
    async fn actions_map_rejections_to_statuses() {
        let (_, arbiter, cache) = seeded().await;
        let app = app!(arbiter, cache);
        let roll = json!({ "userId": 10, "action": { "kind": "roll" } });
        let req = test::TestRequest::post()
            .uri("/games/1/actions")
            .set_json(&roll)
            .to_request();
        let outcome: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(outcome["result"], "rolled");
        assert_eq!(outcome["position"], 3);
        let cases = [
            (json!({ "userId": 20, "action": { "kind": "roll" } }), 1, 403),
            (json!({ "userId": 10, "action": { "kind": "buy" } }), 1, 422),
            (json!({ "userId": 10, "action": { "kind": "roll" } }), 9, 404),
        ];
        for (body, game, code) in cases {
            let req = test::TestRequest::post()
                .uri(&format!("/games/{}/actions", game))
                .set_json(&body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status().as_u16(), code, "{}", body);
        }
    }

    #[actix_web::test]
    async fn actions_past_the_origin_budget_are_throttled() {
        let (store, arbiter, cache) = seeded().await;
        let gate = Gate::new(GateConfig {
            events_per_window: 1,
            ..GateConfig::default()
        });
        let app = app!(arbiter, cache, gate);
        let peer: SocketAddr = "10.0.0.1:5000".parse().unwrap();
        let roll = json!({ "userId": 10, "action": { "kind": "roll" } });
        let post = |uri: &str, body: &Value| {
            test::TestRequest::post()
                .uri(uri)
                .peer_addr(peer)
                .set_json(body)
                .to_request()
        };
        let first = test::call_service(&app, post("/games/1/actions", &roll)).await;
        assert_eq!(first.status(), StatusCode::OK);
        let again = test::call_service(&app, post("/games/1/actions", &roll)).await;
        assert_eq!(again.status(), StatusCode::TOO_MANY_REQUESTS);
        let ballot = json!({ "voterId": 20, "targetId": 20 });
        let vote = test::call_service(&app, post("/games/1/votes", &ballot)).await;
        assert_eq!(vote.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(store.player(1, 10).await.unwrap().position, 3);
    }

    #[actix_web::test]
    async fn self_votes_are_unprocessable() {
        let (_, arbiter, cache) = seeded().await;
        let app = app!(arbiter, cache);
        let req = test::TestRequest::post()
            .uri("/games/1/votes")
            .set_json(json!({ "voterId": 20, "targetId": 20 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn snapshots_are_cached_until_an_action_lands() {
        let (store, arbiter, cache) = seeded().await;
        let app = app!(arbiter, cache);
        let get = || test::TestRequest::get().uri("/games/code/G1").to_request();
        let first: Value = test::call_and_read_body_json(&app, get()).await;
        assert_eq!(first["game"]["code"], "G1");
        assert_eq!(first["players"][0]["position"], 0);
        store
            .edit(1, |_, players| players[0].address = "0xabc".into())
            .await;
        let cached: Value = test::call_and_read_body_json(&app, get()).await;
        assert_eq!(cached["players"][0]["address"], "");
        arbiter.attempt(1, 10, Action::Roll).await.unwrap();
        let fresh: Value = test::call_and_read_body_json(&app, get()).await;
        assert_eq!(fresh["players"][0]["position"], 3);
        assert_eq!(fresh["players"][0]["address"], "0xabc");
        let req = test::TestRequest::get().uri("/games/code/NOPE").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[::core::prelude::v1::test]
    fn infrastructure_failures_are_retryable() {
        assert_eq!(status(&Rejection::LockContention), StatusCode::CONFLICT);
        assert_eq!(
            status(&Rejection::Persistence(StoreError::Unavailable("down".into()))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert!(!Rejection::LockContention.is_domain());
        assert!(Rejection::SelfVote.is_domain());
    }
}
