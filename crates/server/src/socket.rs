use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::web;
use tycoon_gate::Gate;
use tycoon_hosting::Broadcaster;
use tycoon_hosting::bridge;

/// Admits the origin, then upgrades to the room channel.
/// Over-cap origins are refused before any upgrade happens.
pub async fn enter(
    gate: web::Data<Gate>,
    rooms: web::Data<Broadcaster>,
    body: web::Payload,
    req: HttpRequest,
) -> HttpResponse {
    let Some(origin) = req.peer_addr().map(|addr| addr.ip()) else {
        return HttpResponse::BadRequest().body("unknown origin");
    };
    let ticket = match gate.into_inner().admit(origin) {
        Ok(ticket) => ticket,
        Err(e) => {
            log::warn!("[gate] {}", e);
            return HttpResponse::TooManyRequests()
                .json(serde_json::json!({ "error": e.to_string() }));
        }
    };
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            bridge(rooms.into_inner(), ticket, session, stream);
            response
        }
        Err(e) => HttpResponse::BadRequest().body(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::App;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tycoon_gate::GateConfig;

    fn gate(max: usize) -> Arc<Gate> {
        Gate::new(GateConfig {
            max_connections: max,
            events_per_window: 60,
            window: Duration::from_secs(60),
        })
    }

    #[actix_web::test]
    async fn over_cap_origins_are_refused_before_upgrade() {
        let gate = gate(1);
        let ref peer = "10.0.0.7:5555".parse::<SocketAddr>().unwrap();
        let _held = gate.admit(peer.ip()).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(gate.clone()))
                .app_data(web::Data::new(Broadcaster::default()))
                .route("/ws", web::get().to(enter)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/ws")
            .peer_addr(*peer)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(gate.connections(peer.ip()), 1);
    }

    #[actix_web::test]
    async fn failed_upgrades_release_the_origin() {
        let gate = gate(1);
        let ref peer = "10.0.0.8:5555".parse::<SocketAddr>().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(gate.clone()))
                .app_data(web::Data::new(Broadcaster::default()))
                .route("/ws", web::get().to(enter)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/ws")
            .peer_addr(*peer)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(gate.connections(peer.ip()), 0);
    }
}
