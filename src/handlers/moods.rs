use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::{Local, Utc};
use validator::Validate;

use crate::dto::{
    AllEntriesResponse, CatalogItem, EntryResponse, LogMoodRequest, LogMoodResponse,
    RefreshResponse,
};
use crate::error::{AppError, AppResult};
use crate::models::mood::Mood;
use crate::services::aggregator::all_entries;
use crate::services::dashboard::color_for;
use crate::services::mood_log;
use crate::AppState;

pub async fn get_catalog() -> Json<Vec<CatalogItem>> {
    let items = Mood::ALL
        .iter()
        .map(|mood| CatalogItem {
            name: mood.name(),
            label: mood.label(),
            symbol: mood.symbol(),
            color: color_for(*mood),
            default: mood.index() == 0,
        })
        .collect();
    Json(items)
}

pub async fn log_mood(
    State(state): State<AppState>,
    payload: Result<Json<LogMoodRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<LogMoodResponse>)> {
    let Json(body) = payload?;
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mood = Mood::parse_input(&body.mood).ok_or_else(|| {
        let options: Vec<String> = Mood::ALL.iter().map(|m| m.label()).collect();
        AppError::Validation(format!(
            "Unknown mood '{}'. Expected one of: {}",
            body.mood,
            options.join(", ")
        ))
    })?;

    // Server clock only; clients cannot backdate entries.
    let now = Local::now().naive_local();
    let entry = mood_log::log_mood(
        &state.store,
        &state.snapshots,
        mood,
        body.note.as_deref(),
        now,
    )
    .await?;

    let message = format!(
        "Mood '{}' logged with note: '{}'",
        mood.symbol(),
        entry.note.as_deref().unwrap_or("N/A")
    );

    Ok((
        StatusCode::CREATED,
        Json(LogMoodResponse {
            entry: EntryResponse::full(&entry),
            message,
        }),
    ))
}

pub async fn list_moods(State(state): State<AppState>) -> AppResult<Json<AllEntriesResponse>> {
    let snapshot = mood_log::load_snapshot(&state.store, &state.snapshots).await?;

    let entries: Vec<EntryResponse> = all_entries(&snapshot)
        .into_iter()
        .map(EntryResponse::full)
        .collect();

    Ok(Json(AllEntriesResponse {
        as_of: snapshot.loaded_at,
        total: entries.len(),
        unparsed_timestamps: snapshot.malformed_count(),
        entries,
    }))
}

pub async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    mood_log::refresh(&state.store, &state.snapshots).await;

    Json(RefreshResponse {
        message: "Data refreshed".into(),
        refreshed_at: Utc::now(),
    })
}
