use super::*;

impl PostgresAlertRepository {
    pub(super) async fn list_impl(
        &self,
        organization_id: OrganizationId,
        query: &AlertListQuery,
    ) -> AppResult<Vec<Alert>> {
        let limit = query
            .limit
            .map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);
        let statement = format!(
            "SELECT {ALERT_COLUMNS} FROM emociograma_alerts \
             WHERE organization_id = $1 \
               AND ($2 OR NOT is_resolved) \
               AND ($3::text IS NULL OR severity = $3) \
             ORDER BY CASE severity \
                 WHEN 'critical' THEN 4 WHEN 'high' THEN 3 \
                 WHEN 'medium' THEN 2 WHEN 'low' THEN 1 ELSE 0 END DESC, \
               created_at DESC \
             LIMIT $4 OFFSET $5"
        );

        let mut transaction = begin_organization_scope(&self.pool, organization_id).await?;
        let rows = sqlx::query_as::<_, AlertRow>(statement.as_str())
            .bind(organization_id.as_uuid())
            .bind(query.include_resolved)
            .bind(query.severity.map(|severity| severity.as_str()))
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to list alerts for organization '{organization_id}': {error}"
                ))
            })?;
        commit(transaction).await?;

        rows.into_iter().map(Alert::try_from).collect()
    }

    pub(super) async fn list_created_between_impl(
        &self,
        organization_id: OrganizationId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Alert>> {
        let statement = format!(
            "SELECT {ALERT_COLUMNS} FROM emociograma_alerts \
             WHERE organization_id = $1 AND created_at BETWEEN $2 AND $3 \
             ORDER BY created_at DESC"
        );

        let mut transaction = begin_organization_scope(&self.pool, organization_id).await?;
        let rows = sqlx::query_as::<_, AlertRow>(statement.as_str())
            .bind(organization_id.as_uuid())
            .bind(start)
            .bind(end)
            .fetch_all(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to list alerts by date range: {error}"))
            })?;
        commit(transaction).await?;

        rows.into_iter().map(Alert::try_from).collect()
    }

    pub(super) async fn statistics_impl(
        &self,
        organization_id: OrganizationId,
        resolved_since: DateTime<Utc>,
    ) -> AppResult<AlertStatistics> {
        let rows = self
            .severity_totals(organization_id, Some(resolved_since))
            .await?;

        let mut statistics = AlertStatistics::default();
        for row in rows {
            let severity = row.severity.parse()?;
            statistics.by_severity.add(severity, count(row.total));
            statistics.total = statistics.total.saturating_add(count(row.total));
            statistics.unresolved = statistics.unresolved.saturating_add(count(row.unresolved));
            statistics.resolved_today = statistics
                .resolved_today
                .saturating_add(count(row.resolved_since));
        }

        Ok(statistics)
    }

    pub(super) async fn count_unresolved_by_severity_impl(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<SeverityCounts> {
        let rows = self.severity_totals(organization_id, None).await?;

        let mut counts = SeverityCounts::default();
        for row in rows {
            counts.add(row.severity.parse()?, count(row.unresolved));
        }

        Ok(counts)
    }

    async fn severity_totals(
        &self,
        organization_id: OrganizationId,
        resolved_since: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<SeverityTotalsRow>> {
        let mut transaction = begin_organization_scope(&self.pool, organization_id).await?;

        let rows = sqlx::query_as::<_, SeverityTotalsRow>(
            r#"
            SELECT severity,
                   COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE NOT is_resolved) AS unresolved,
                   COUNT(*) FILTER (
                       WHERE is_resolved AND $2::timestamptz IS NOT NULL AND resolved_at >= $2
                   ) AS resolved_since
            FROM emociograma_alerts
            WHERE organization_id = $1
            GROUP BY severity
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(resolved_since)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to aggregate alerts for organization '{organization_id}': {error}"
            ))
        })?;
        commit(transaction).await?;

        Ok(rows)
    }
}
