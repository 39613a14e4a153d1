pub mod metrics;
pub mod shepherd;

pub use metrics::get_metrics;
pub use shepherd::handle_op;

use actix_web::{HttpResponse, Responder};

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy"
    }))
}
