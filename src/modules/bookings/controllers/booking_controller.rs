use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::core::AppError;
use crate::middleware::AuthContext;
use crate::modules::bookings::services::booking_service::{BookingService, CreateBookingRequest};

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub branch_id: i64,
    pub stylist_id: i64,
    /// Date in YYYY-MM-DD format
    pub date: NaiveDate,
}

/// Create a booking and its payment intent
/// POST /booking/create
pub async fn create_booking(
    service: web::Data<Arc<BookingService>>,
    auth: AuthContext,
    request: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse, AppError> {
    let (booking, intent) = service.create_booking(request.into_inner(), &auth).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "booking": booking,
        "payment": intent.payment,
        "provider": intent.charge,
    })))
}

/// Cancel a booking (owner or staff)
/// DELETE /booking/{id}
pub async fn cancel_booking(
    service: web::Data<Arc<BookingService>>,
    auth: AuthContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let booking = service.cancel_booking(path.into_inner(), &auth).await?;

    Ok(HttpResponse::Ok().json(booking))
}

/// Confirm an in-person cash payment (staff only)
/// POST /booking/{id}/confirm-cash-payment
pub async fn confirm_cash_payment(
    service: web::Data<Arc<BookingService>>,
    auth: AuthContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let booking = service
        .confirm_cash_payment(path.into_inner(), &auth)
        .await?;

    Ok(HttpResponse::Ok().json(booking))
}

/// Mark a confirmed booking completed (staff only)
/// POST /booking/{id}/complete
pub async fn complete_booking(
    service: web::Data<Arc<BookingService>>,
    auth: AuthContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let booking = service.complete_booking(path.into_inner(), &auth).await?;

    Ok(HttpResponse::Ok().json(booking))
}

/// List open 30-minute slots for a branch/stylist/date
/// GET /booking/availability
pub async fn availability(
    service: web::Data<Arc<BookingService>>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, AppError> {
    let slots = service
        .availability(query.branch_id, query.stylist_id, query.date)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "slots": slots })))
}

/// Configure booking routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/booking")
            .route("/create", web::post().to(create_booking))
            .route("/availability", web::get().to(availability))
            .route("/{id}", web::delete().to(cancel_booking))
            .route(
                "/{id}/confirm-cash-payment",
                web::post().to(confirm_cash_payment),
            )
            .route("/{id}/complete", web::post().to(complete_booking)),
    );
}
