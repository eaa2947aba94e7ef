use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::database::db::queries;
use crate::database::models::{NewService, Service, ServicePatch};
use crate::domain::auth::Actor;
use crate::domain::{validate, Done};
use crate::error::{AppError, AppResult};

fn service_not_found() -> AppError {
    AppError::not_found("Service not found.")
}

/// Services open for donations, newest first.
pub async fn active_services(pool: &Pool<Sqlite>) -> AppResult<Vec<Service>> {
    Ok(queries::list_services(pool, true).await?)
}

pub async fn all_services(pool: &Pool<Sqlite>, actor: &Actor) -> AppResult<Vec<Service>> {
    actor.require_admin("Unauthorized.")?;
    Ok(queries::list_services(pool, false).await?)
}

pub async fn create_service(
    pool: &Pool<Sqlite>,
    actor: &Actor,
    input: NewService,
) -> AppResult<Done<Service>> {
    actor.require_admin("Unauthorized. Only admins can create services.")?;

    let service = NewService {
        name: validate::required(&input.name, "Service name is required")?,
        description: validate::optional(input.description),
        service_type: input.service_type,
        target_amount: input
            .target_amount
            .map(|t| validate::positive(t, "Target amount must be positive"))
            .transpose()?,
    };

    let id = queries::create_service(pool, &service, Utc::now().naive_utc()).await?;
    let created = queries::get_service(pool, id)
        .await?
        .ok_or_else(service_not_found)?;

    tracing::info!(service_id = id, name = %created.name, "service created");
    Ok(Done::new(created, "Service created successfully."))
}

pub async fn update_service(
    pool: &Pool<Sqlite>,
    actor: &Actor,
    service_id: i64,
    patch: ServicePatch,
) -> AppResult<Done<Service>> {
    actor.require_admin("Unauthorized. Only admins can update services.")?;

    let patch = ServicePatch {
        name: patch
            .name
            .map(|n| validate::required(&n, "Service name is required"))
            .transpose()?,
        description: patch.description.map(|d| d.trim().to_string()),
        service_type: patch.service_type,
        target_amount: patch
            .target_amount
            .map(|t| validate::positive(t, "Target amount must be positive"))
            .transpose()?,
        is_active: patch.is_active,
    };

    if !queries::update_service(pool, service_id, &patch).await? {
        return Err(service_not_found());
    }
    let updated = queries::get_service(pool, service_id)
        .await?
        .ok_or_else(service_not_found)?;

    tracing::info!(service_id, active = updated.is_active, "service updated");
    Ok(Done::new(updated, "Service updated successfully."))
}

/// Services that already received donations can only be deactivated.
pub async fn delete_service(pool: &Pool<Sqlite>, actor: &Actor, service_id: i64) -> AppResult<Done<()>> {
    actor.require_admin("Unauthorized. Only admins can delete services.")?;

    if queries::get_service(pool, service_id).await?.is_none() {
        return Err(service_not_found());
    }
    if queries::count_service_transactions(pool, service_id).await? > 0 {
        return Err(AppError::conflict(
            "Cannot delete service with existing transactions. Deactivate it instead.",
        ));
    }

    queries::delete_service(pool, service_id).await?;
    tracing::info!(service_id, "service deleted");
    Ok(Done::new((), "Service deleted successfully."))
}
