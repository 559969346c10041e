//! Transactions pinned to one organization for row-level security.

use emociograma_core::{AppError, AppResult, OrganizationId};
use sqlx::{PgPool, Postgres, Transaction};

/// Session setting read by the row-level security policies.
pub const ORGANIZATION_SETTING: &str = "app.current_organization_id";

/// Opens a transaction whose row-level security scope is the organization.
///
/// The setting is transaction-local and disappears on commit or rollback.
pub async fn begin_organization_scope(
    pool: &PgPool,
    organization_id: OrganizationId,
) -> AppResult<Transaction<'static, Postgres>> {
    let mut transaction = pool
        .begin()
        .await
        .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))?;

    sqlx::query("SELECT set_config($1, $2, TRUE)")
        .bind(ORGANIZATION_SETTING)
        .bind(organization_id.to_string())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to scope transaction to organization '{organization_id}': {error}"
            ))
        })?;

    Ok(transaction)
}

/// Commits a scoped transaction.
pub async fn commit(transaction: Transaction<'static, Postgres>) -> AppResult<()> {
    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
}

pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return true;
    }

    false
}
