use crate::db::Db;
use actix_web::{HttpResponse, web};

pub async fn health_check(db: web::Data<Db>) -> HttpResponse {
    let database = sqlx::query("SELECT 1").execute(&db.0).await.is_ok();
    let body = serde_json::json!({
        "health": database,
        "version": env!("CARGO_PKG_VERSION"),
    });
    if database {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
