use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::Local;

use crate::dto::DashboardQuery;
use crate::error::{AppError, AppResult};
use crate::services::aggregator::date_bounds;
use crate::services::dashboard::{render_dashboard, DashboardView};
use crate::services::mood_log;
use crate::AppState;

pub async fn get_dashboard(
    State(state): State<AppState>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> AppResult<Json<DashboardView>> {
    let Query(query) = query?;
    let today = Local::now().date_naive();
    let date = query.date.unwrap_or(today);

    let snapshot = mood_log::load_snapshot(&state.store, &state.snapshots).await?;

    let bounds = date_bounds(&snapshot, today);
    if !bounds.contains(date) {
        let message = match bounds.min {
            Some(min) if date < min => {
                format!("Date cannot be before the earliest entry ({})", min)
            }
            _ => format!("Date cannot be after {}", bounds.max),
        };
        return Err(AppError::Validation(message));
    }

    Ok(Json(render_dashboard(&snapshot, date, today)))
}
