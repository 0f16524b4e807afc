use super::*;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;
use tycoon_gate::Ticket;

/// Spawns the pump between an upgraded socket and the rooms.
/// Room signals go out as text frames; client frames go through [`Member::hear`].
/// The connection is released when the socket closes or fails.
pub fn bridge(
    rooms: Arc<Broadcaster>,
    ticket: Ticket,
    mut session: actix_ws::Session,
    mut stream: actix_ws::MessageStream,
) {
    let (tx, mut rx) = unbounded_channel::<String>();
    let mut member = Member::new(ticket, rooms, tx);
    let id = member.id();
    log::debug!("[bridge {}] connected", id);
    actix_web::rt::spawn(async move {
        'sesh: loop {
            tokio::select! {
                biased;
                frame = rx.recv() => match frame {
                    Some(json) => if session.text(json).await.is_err() { break 'sesh },
                    None => break 'sesh,
                },
                msg = stream.next() => match msg {
                    Some(Ok(actix_ws::Message::Text(text))) => {
                        if let Some(reply) = member.hear(&text) {
                            if session.text(reply.to_json()).await.is_err() { break 'sesh }
                        }
                    }
                    Some(Ok(actix_ws::Message::Ping(bytes))) => if session.pong(&bytes).await.is_err() { break 'sesh },
                    Some(Ok(actix_ws::Message::Close(_))) => break 'sesh,
                    Some(Err(_)) => break 'sesh,
                    None => break 'sesh,
                    _ => continue 'sesh,
                },
            }
        }
        drop(member);
        let _ = session.close(None).await;
        log::debug!("[bridge {}] disconnected", id);
    });
}
