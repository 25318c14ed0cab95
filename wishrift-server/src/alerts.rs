use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json,
};
use wishrift_collab::{Cents, PriceAlertData, PrimaryKey};

use crate::{
    auth::Session,
    errors::{ServerError, ServerResult},
    items::owned_item,
    schemas::{UpdateAlertSchema, ValidatedJson},
    serialized::{PriceAlert, ToSerialized},
    Router, ServerContext,
};

/// Alerts are only visible to the owner of the item
async fn owned_alert(
    context: &ServerContext,
    session: &Session,
    alert_id: PrimaryKey,
) -> ServerResult<PriceAlertData> {
    let alert = context.collab.alerts.alert(alert_id).await?;

    owned_item(context, session, alert.item_id)
        .await
        .map_err(|e| match e {
            ServerError::NotFound { .. } => ServerError::NotFound {
                resource: "price alert",
            },
            e => e,
        })?;

    Ok(alert)
}

#[utoipa::path(
    get,
    path = "/api/alerts/{id}",
    tag = "alerts",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = PriceAlert)
    )
)]
async fn alert(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
) -> ServerResult<Json<PriceAlert>> {
    let alert = owned_alert(&context, &session, id).await?;

    Ok(Json(alert.to_serialized()))
}

#[utoipa::path(
    put,
    path = "/api/alerts/{id}",
    tag = "alerts",
    request_body = UpdateAlertSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = PriceAlert)
    )
)]
async fn update_alert(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
    ValidatedJson(body): ValidatedJson<UpdateAlertSchema>,
) -> ServerResult<Json<PriceAlert>> {
    owned_alert(&context, &session, id).await?;

    let alert = context
        .collab
        .alerts
        .update_alert(id, body.target_price.map(Cents::new), body.is_active)
        .await?;

    Ok(Json(alert.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/api/alerts/{id}",
    tag = "alerts",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204)
    )
)]
async fn delete_alert(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
) -> ServerResult<StatusCode> {
    owned_alert(&context, &session, id).await?;

    if !context.collab.alerts.delete_alert(id).await? {
        return Err(ServerError::NotFound {
            resource: "price alert",
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router {
    Router::new().route(
        "/:id",
        get(alert).put(update_alert).delete(delete_alert),
    )
}
