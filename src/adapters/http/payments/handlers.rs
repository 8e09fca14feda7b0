//! HTTP handlers for payment endpoints.

use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::handlers::payments::{
    CancelPaymentCommand, CreatePaymentCommand, RefundPaymentCommand, VerifyPaymentCommand,
};
use crate::domain::foundation::{
    PaymentId, ReservationId, SubscriptionId, UserId,
};
use crate::domain::payment::PaymentError;
use crate::ports::PaymentListFilter;

use super::super::{ApiError, AppState};
use super::dto::{
    PaymentCancelResponse, PaymentCreateRequest, PaymentIntentResponse, PaymentListQuery,
    PaymentRefundRequest, PaymentRefundResponse, PaymentResponse, PaymentVerifyResponse,
};

/// POST /api/payments - Create a payment and its provider intent.
///
/// Supports create-once semantics via the `Idempotency-Key` header.
pub async fn create_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PaymentCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let idempotency_key = headers
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let handler = state.create_payment_handler();
    let result = handler
        .handle(CreatePaymentCommand {
            amount: request.amount,
            currency: request.currency,
            payment_type: request.payment_type,
            reservation_id: request.reservation_id.map(ReservationId::from_uuid),
            subscription_id: request.subscription_id.map(SubscriptionId::from_uuid),
            user_id: request.user_id.map(UserId::from_uuid),
            payer_email: request.payer_email,
            payer_name: request.payer_name,
            description: request.description,
            metadata: request.metadata,
            success_url: request.success_url,
            cancel_url: request.cancel_url,
            idempotency_key,
        })
        .await?;

    let status = if result.idempotent_replay {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    let response = PaymentIntentResponse {
        payment_id: result.payment.id.to_string(),
        status: result.payment.status,
        provider: result.payment.provider.clone(),
        checkout_url: result.checkout_url,
        client_secret: result.client_secret,
        idempotent_replay: result.idempotent_replay,
    };

    Ok((status, Json(response)))
}

/// GET /api/payments/:id - Payment details.
pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let id = PaymentId::from_uuid(id);
    let payment = state
        .repository
        .get_by_id(&id)
        .await
        .map_err(PaymentError::from)?
        .ok_or(PaymentError::NotFound(id))?;

    Ok(Json(PaymentResponse::from(payment)))
}

/// GET /api/payments - List payments, with foreign-id and status filters.
pub async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<PaymentListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let payments = if let Some(reservation_id) = query.reservation_id {
        state
            .repository
            .get_by_reservation_id(&ReservationId::from_uuid(reservation_id))
            .await
    } else if let Some(subscription_id) = query.subscription_id {
        state
            .repository
            .get_by_subscription_id(&SubscriptionId::from_uuid(subscription_id))
            .await
    } else if let Some(user_id) = query.user_id {
        state.repository.get_by_user_id(&UserId::from_uuid(user_id)).await
    } else {
        state
            .repository
            .list(PaymentListFilter {
                status: query.status,
                limit: query.limit,
                offset: query.offset,
            })
            .await
    }
    .map_err(PaymentError::from)?;

    let responses: Vec<PaymentResponse> =
        payments.into_iter().map(PaymentResponse::from).collect();
    Ok(Json(responses))
}

/// POST /api/payments/:id/verify - Sync status with the provider.
pub async fn verify_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.verify_payment_handler();
    let result = handler
        .handle(VerifyPaymentCommand {
            payment_id: PaymentId::from_uuid(id),
        })
        .await?;

    Ok(Json(PaymentVerifyResponse {
        payment_id: result.payment_id.to_string(),
        previous_status: result.previous_status,
        current_status: result.current_status,
        synchronized: result.synchronized,
    }))
}

/// POST /api/payments/:id/cancel - Cancel a not-yet-settled payment.
pub async fn cancel_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.cancel_payment_handler();
    let result = handler
        .handle(CancelPaymentCommand {
            payment_id: PaymentId::from_uuid(id),
        })
        .await?;

    Ok(Json(PaymentCancelResponse {
        payment_id: result.payment_id.to_string(),
        status: result.status,
        canceled: result.canceled,
    }))
}

/// POST /api/payments/:id/refund - Refund a succeeded payment.
pub async fn refund_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<PaymentRefundRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let handler = state.refund_payment_handler();
    let result = handler
        .handle(RefundPaymentCommand {
            payment_id: PaymentId::from_uuid(id),
            amount: request.amount,
        })
        .await?;

    Ok(Json(PaymentRefundResponse {
        payment_id: result.payment_id.to_string(),
        status: result.status,
        refunded: result.refunded,
        refund_id: result.refund_id,
        error_message: result.error_message,
    }))
}
