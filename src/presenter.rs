//! Plain-text rendering of pipeline output for the terminal.

use std::fmt::Write;

use tokio::sync::watch;

use crate::models::{Movie, RecommendationResponse, UploadProgress, UserAnalysis};

const BAR_WIDTH: usize = 30;
const OVERVIEW_WIDTH: usize = 120;

/// Progress bar plus status line, e.g. `[#########.....]  30% Uploading image...`
pub fn render_progress(progress: &UploadProgress) -> String {
    let filled = BAR_WIDTH * usize::from(progress.progress.min(100)) / 100;
    format!(
        "[{}{}] {:>3}% {}",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        progress.progress,
        progress.status_line()
    )
}

/// Emits a progress line per observed update until the sender is dropped
///
/// The last published snapshot is always emitted before this returns.
pub async fn follow_progress(
    mut progress_rx: watch::Receiver<UploadProgress>,
    mut emit: impl FnMut(String),
) {
    while progress_rx.changed().await.is_ok() {
        let progress = progress_rx.borrow_and_update().clone();
        emit(render_progress(&progress));
    }
}

pub fn render_analysis(analysis: &UserAnalysis) -> String {
    format!(
        "{} Detected emotion: {}\n   Gender: {}\n   Estimated age: {} years\n   Analysis confidence: {:.1}%",
        analysis.emotion_emoji(),
        analysis.emotion,
        analysis.gender,
        analysis.age,
        analysis.confidence * 100.0
    )
}

/// One catalog entry: title, year, rating and a shortened overview
pub fn render_movie(movie: &Movie) -> String {
    let mut line = movie.title.clone();
    if let Some(year) = release_year(&movie.release_date) {
        let _ = write!(line, " ({})", year);
    }
    let _ = write!(
        line,
        "  ★ {:.1}  {:.1}k votes",
        movie.vote_average,
        f64::from(movie.vote_count) / 1000.0
    );
    if !movie.overview.is_empty() {
        let _ = write!(line, "\n      {}", truncate(&movie.overview, OVERVIEW_WIDTH));
    }
    line
}

pub fn render_movies(movies: &[Movie]) -> String {
    movies
        .iter()
        .enumerate()
        .map(|(i, movie)| format!("{:>3}. {}", i + 1, render_movie(movie)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full result view of a completed run
pub fn render_results(response: &RecommendationResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", response.message);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", render_analysis(&response.analysis));
    let _ = writeln!(out);

    if response.recommendations.is_empty() {
        let _ = writeln!(out, "No recommendations found");
        let _ = write!(out, "Try uploading a different photo for better results");
        return out;
    }

    let _ = writeln!(
        out,
        "Movies picked for your {} mood ({}):",
        response.analysis.emotion,
        response.recommendations.len()
    );
    out.push_str(&render_movies(&response.recommendations));
    out
}

fn release_year(date: &str) -> Option<&str> {
    let year = date.get(..4)?;
    year.chars().all(|c| c.is_ascii_digit()).then_some(year)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}
