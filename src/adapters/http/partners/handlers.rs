//! HTTP handlers for partner endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use secrecy::SecretString;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::foundation::{PartnerId, Timestamp};
use crate::domain::partner::{EventType, Partner};
use crate::domain::webhook::EventEnvelope;
use crate::ports::TransportError;

use super::super::{ApiError, AppState};
use super::dto::{
    PartnerCreateRequest, PartnerCreatedResponse, PartnerResponse, SecretRotatedResponse,
    TestWebhookRequest, TestWebhookResponse,
};

/// GET /api/partners - All registered partners.
pub async fn list_partners(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let partners = state.directory.list().await?;
    let responses: Vec<PartnerResponse> =
        partners.into_iter().map(PartnerResponse::from).collect();
    Ok(Json(responses))
}

/// GET /api/partners/by-event/:event - Partners subscribed to an event.
pub async fn partners_by_event(
    State(state): State<AppState>,
    Path(event): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let event = EventType::parse(&event)
        .ok_or_else(|| ApiError::unprocessable(format!("unknown event type '{event}'")))?;

    let partners = state.directory.partners_for_event(event).await?;
    let responses: Vec<PartnerResponse> =
        partners.into_iter().map(PartnerResponse::from).collect();
    Ok(Json(responses))
}

/// POST /api/partners - Register a partner.
///
/// The generated secret is returned once, here.
pub async fn create_partner(
    State(state): State<AppState>,
    Json(request): Json<PartnerCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let partner = Partner::create(
        request.name,
        request.webhook_url,
        request.events,
        request.description,
        request.contact_email,
    )?;

    let secret = secrecy::ExposeSecret::expose_secret(partner.secret()).clone();
    state.directory.create(&partner).await?;

    tracing::info!(partner_id = %partner.id, name = %partner.name, "Registered partner");

    Ok((
        StatusCode::CREATED,
        Json(PartnerCreatedResponse {
            partner: PartnerResponse::from(partner),
            secret,
        }),
    ))
}

/// POST /api/partners/:id/rotate-secret - Issue a fresh secret.
pub async fn rotate_secret(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let id = PartnerId::from_uuid(id);
    let mut partner = state
        .directory
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Partner {id} not found")))?;

    let secret = partner.rotate_secret();
    state.directory.update(&partner).await?;

    tracing::info!(partner_id = %id, "Rotated partner secret");

    Ok(Json(SecretRotatedResponse {
        partner_id: id.to_string(),
        secret,
    }))
}

/// POST /api/partners/test-webhook - Deliver a signed test payload.
///
/// Lets a partner verify their endpoint and signature handling before
/// going live.
pub async fn test_webhook(
    State(state): State<AppState>,
    Json(request): Json<TestWebhookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let secret = SecretString::new(
        request
            .secret
            .unwrap_or_else(|| format!("whsec_test_{}", Uuid::new_v4().simple())),
    );

    let mut fields = Map::new();
    fields.insert("test".to_string(), Value::Bool(true));
    fields.insert(
        "message".to_string(),
        Value::String("Test webhook delivery".to_string()),
    );
    fields.insert(
        "data".to_string(),
        serde_json::json!({
            "payment_id": "test-payment-id",
            "amount": "100.00",
            "currency": "usd",
            "status": "succeeded",
        }),
    );

    let body = EventEnvelope::at(request.event_type, Timestamp::now(), fields).to_json();
    let signature = state.codec.sign(&secret, &body);
    let headers = [
        ("X-Webhook-Signature", signature.clone()),
        ("X-Partner-Id", "test-partner".to_string()),
        ("X-Test-Webhook", "true".to_string()),
    ];

    let response = match state
        .transport
        .post(
            &request.webhook_url,
            &body,
            &headers,
            state.webhook_config.delivery_timeout(),
        )
        .await
    {
        Ok(response) => TestWebhookResponse {
            success: response.is_accepted(),
            status_code: Some(response.status),
            response_body: (!response.body_excerpt.is_empty())
                .then_some(response.body_excerpt),
            error: None,
            signature_sent: signature,
        },
        Err(TransportError::Timeout) => TestWebhookResponse {
            success: false,
            status_code: None,
            response_body: None,
            error: Some("Request timeout".to_string()),
            signature_sent: signature,
        },
        Err(TransportError::Transport(error)) => TestWebhookResponse {
            success: false,
            status_code: None,
            response_body: None,
            error: Some(error),
            signature_sent: signature,
        },
    };

    Ok(Json(response))
}
