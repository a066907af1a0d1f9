use actix_web::HttpResponse;

use crate::response::{ok, Message};

pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check endpoint called");
    ok(Message::new("OK"))
}
