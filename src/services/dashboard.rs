use chrono::NaiveDate;
use serde::Serialize;

use super::aggregator::{counts_for_date, date_bounds, details_for_date, DateBounds};
use crate::dto::EntryResponse;
use crate::models::entry::MoodSnapshot;
use crate::models::mood::Mood;

/// Plotly's qualitative palette, assigned by catalog position.
const PALETTE: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

pub const NO_DATA_MESSAGE: &str = "No mood data logged yet. Start logging to see the chart!";

#[derive(Debug, Serialize)]
pub struct ChartBar {
    pub mood: String,
    pub label: String,
    pub count: usize,
    pub color: &'static str,
}

#[derive(Debug, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x_title: &'static str,
    pub y_title: &'static str,
    pub bars: Vec<ChartBar>,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub date: NaiveDate,
    pub display_date: String,
    pub bounds: DateBounds,
    pub chart: BarChart,
    pub total: usize,
    pub unrecognized: usize,
    pub entries: Vec<EntryResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn color_for(mood: Mood) -> &'static str {
    PALETTE[mood.index() % PALETTE.len()]
}

/// `"January 05, 2024"`, or `"Today (January 05, 2024)"`.
pub fn display_date(date: NaiveDate, today: NaiveDate) -> String {
    let formatted = date.format("%B %d, %Y").to_string();
    if date == today {
        format!("Today ({})", formatted)
    } else {
        formatted
    }
}

pub fn render_dashboard(snapshot: &MoodSnapshot, date: NaiveDate, today: NaiveDate) -> DashboardView {
    let display = display_date(date, today);
    let counts = counts_for_date(snapshot, date);
    let details = details_for_date(snapshot, date);

    let message = if !snapshot.has_valid_timestamps() {
        Some(NO_DATA_MESSAGE.to_string())
    } else if details.is_empty() {
        Some(format!("No moods logged for {} yet.", display))
    } else {
        None
    };

    let bars = counts
        .rows
        .iter()
        .map(|row| ChartBar {
            mood: row.mood.symbol().to_string(),
            label: row.mood.label(),
            count: row.count,
            color: color_for(row.mood),
        })
        .collect();

    DashboardView {
        date,
        bounds: date_bounds(snapshot, today),
        chart: BarChart {
            title: format!("Mood Counts for {}", display),
            x_title: "Mood",
            y_title: "Count",
            bars,
        },
        total: counts.total(),
        unrecognized: counts.unrecognized,
        entries: details.into_iter().map(EntryResponse::time_of_day).collect(),
        display_date: display,
        message,
    }
}
