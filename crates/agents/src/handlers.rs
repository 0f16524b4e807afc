use super::*;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use serde::Deserialize;
use tycoon_core::*;

/// Body or query of `POST /agents/unregister`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unbinding {
    pub slot: Option<i64>,
    pub game_id: Option<GameId>,
}

/// Body of `POST /agents/decision`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionQuery {
    pub game_id: Option<GameId>,
    pub slot: Option<i64>,
    pub decision_type: Option<DecisionKind>,
    #[serde(default)]
    pub context: serde_json::Value,
}

pub async fn list(registry: web::Data<Registry>) -> impl Responder {
    HttpResponse::Ok().json(registry.list().await)
}

pub async fn register(
    registry: web::Data<Registry>,
    req: web::Json<Registration>,
) -> impl Responder {
    match registry.register(req.into_inner()).await {
        Ok(binding) => HttpResponse::Ok().json(serde_json::json!({
            "key": binding.key,
            "registered": true,
        })),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

pub async fn unregister(
    registry: web::Data<Registry>,
    query: web::Query<Unbinding>,
    body: Option<web::Json<Unbinding>>,
) -> impl Responder {
    let body = body.map(web::Json::into_inner).unwrap_or_default();
    let query = query.into_inner();
    let slot = match body.slot.or(query.slot) {
        Some(slot) => slot,
        None => return bad(Invalid::Missing("slot")),
    };
    let slot = match slot_in_range(slot) {
        Ok(slot) => slot,
        Err(e) => return bad(e),
    };
    let (key, deleted) = registry
        .unregister(slot, body.game_id.or(query.game_id))
        .await;
    HttpResponse::Ok().json(serde_json::json!({ "key": key, "deleted": deleted }))
}

pub async fn decision(router: web::Data<Router>, req: web::Json<DecisionQuery>) -> impl Responder {
    let req = req.into_inner();
    let game = match req.game_id {
        Some(game) => game,
        None => return bad(Invalid::Missing("gameId")),
    };
    let slot = match req.slot {
        Some(slot) => slot,
        None => return bad(Invalid::Missing("slot")),
    };
    let kind = match req.decision_type {
        Some(kind) => kind,
        None => return bad(Invalid::Missing("decisionType")),
    };
    let data = match slot_in_range(slot) {
        Ok(slot) => router.route(game, slot, kind, req.context).await,
        Err(_) => None,
    };
    HttpResponse::Ok().json(serde_json::json!({
        "useBuiltIn": data.is_none(),
        "data": data,
    }))
}

fn bad(e: Invalid) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
}

/// Mounts the `/agents` routes.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/agents")
            .route("", web::get().to(list))
            .route("/register", web::post().to(register))
            .route("/unregister", web::post().to(unregister))
            .route("/decision", web::post().to(decision)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::App;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::Value;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn state() -> (web::Data<Registry>, web::Data<Router>) {
        let registry = Arc::new(Registry::default());
        let router = Router::http(registry.clone(), Duration::from_millis(200));
        (web::Data::from(registry), web::Data::new(router))
    }

    #[actix_web::test]
    async fn register_then_list() {
        let (registry, router) = state();
        let app = test::init_service(
            App::new()
                .app_data(registry.clone())
                .app_data(router)
                .configure(routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/agents/register")
            .set_json(json!({ "slot": 2, "agentId": "x", "callbackUrl": "http://a:4077" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "key": "slot_2", "registered": true }));
        let req = test::TestRequest::get().uri("/agents").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["agentId"], "x");
    }
    #[actix_web::test]
    async fn register_rejects_bad_input() {
        let (registry, router) = state();
        let app = test::init_service(
            App::new()
                .app_data(registry)
                .app_data(router)
                .configure(routes),
        )
        .await;
        for body in [
            json!({ "slot": 1, "agentId": "x", "callbackUrl": "http://a" }),
            json!({ "slot": 2, "agentId": "x", "callbackUrl": "ftp://a" }),
            json!({ "slot": 2, "callbackUrl": "http://a" }),
        ] {
            let req = test::TestRequest::post()
                .uri("/agents/register")
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }
    #[actix_web::test]
    async fn unregister_accepts_query_or_body() {
        let (registry, router) = state();
        registry
            .register(Registration::new(4, "x", "http://a").scoped(9))
            .await
            .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(registry.clone())
                .app_data(router)
                .configure(routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/agents/unregister?slot=4&gameId=9")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "key": "game_9_slot_4", "deleted": true }));
        let req = test::TestRequest::post()
            .uri("/agents/unregister")
            .set_json(json!({ "slot": 4, "gameId": 9 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "key": "game_9_slot_4", "deleted": false }));
    }
    #[actix_web::test]
    async fn decision_requires_fields() {
        let (registry, router) = state();
        let app = test::init_service(
            App::new()
                .app_data(registry)
                .app_data(router)
                .configure(routes),
        )
        .await;
        for body in [
            json!({ "slot": 2, "decisionType": "property" }),
            json!({ "gameId": 1, "decisionType": "property" }),
            json!({ "gameId": 1, "slot": 2 }),
        ] {
            let req = test::TestRequest::post()
                .uri("/agents/decision")
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }
    #[actix_web::test]
    async fn decision_without_agent_uses_built_in() {
        let (registry, router) = state();
        let app = test::init_service(
            App::new()
                .app_data(registry)
                .app_data(router)
                .configure(routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/agents/decision")
            .set_json(json!({ "gameId": 1, "slot": 2, "decisionType": "property", "context": {} }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "data": null, "useBuiltIn": true }));
    }
}
