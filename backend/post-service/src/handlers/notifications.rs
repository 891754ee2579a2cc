/// Notification handlers - the recipient's inbox under `/api/notifications`
use crate::error::Result;
use crate::AppState;
use actix_middleware::ActorId;
use actix_web::{web, HttpResponse};

/// GET /api/notifications
pub async fn list_notifications(
    state: web::Data<AppState>,
    actor: ActorId,
) -> Result<HttpResponse> {
    let notifications = state.notifications.list_for(actor.0).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

/// DELETE /api/notifications
pub async fn delete_notifications(
    state: web::Data<AppState>,
    actor: ActorId,
) -> Result<HttpResponse> {
    state.notifications.delete_all(actor.0).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Notifications deleted successfully"
    })))
}
