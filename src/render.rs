//! Plain-text rendering of session state for line-oriented views.

use chrono::{DateTime, TimeZone, Utc};

use crate::api::models::{RetrievalResult, Scope, Stats};
use crate::commands::chat::QueryOutcome;
use crate::db::models::Settings;
use crate::lineage::LineageView;
use crate::session::conversation::{ConversationMessage, Role};

/// Results shown inline per assistant message.
pub const INLINE_RESULTS: usize = 3;

pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);
    if elapsed.num_seconds() < 60 {
        "Just now".to_string()
    } else if elapsed.num_minutes() < 60 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        at.format("%Y-%m-%d").to_string()
    }
}

fn result_lines(index: usize, result: &RetrievalResult, settings: &Settings) -> Vec<String> {
    let mut lines = vec![
        format!("  [{index}] {}", result.display_title()),
        format!("      {}", result.snippet.as_deref().unwrap_or_default()),
    ];
    let mut meta = Vec::new();
    if settings.show_scores {
        meta.push(match result.score {
            Some(score) => format!("Score: {score:.2}"),
            None => "Score: N/A".to_string(),
        });
    }
    if let Some(version) = &result.version {
        meta.push(format!("v{version}"));
    }
    if !meta.is_empty() {
        lines.push(format!("      {}", meta.join("  ")));
    }
    lines
}

pub fn message(msg: &ConversationMessage, settings: &Settings, now: DateTime<Utc>) -> String {
    let speaker = match msg.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    let mut lines = vec![format!("{speaker}: {}", msg.content)];
    let results = msg.results();
    for (i, result) in results.iter().take(INLINE_RESULTS).enumerate() {
        lines.extend(result_lines(i, result, settings));
    }
    if results.len() > INLINE_RESULTS {
        lines.push(format!("  +{} more results", results.len() - INLINE_RESULTS));
    }
    lines.push(format!("  ({})", relative_time(msg.timestamp, now)));
    lines.join("\n")
}

/// The assistant turn of a query. A degraded turn names why the backend
/// could not answer, which may be the backend's own validation message.
pub fn outcome(outcome: &QueryOutcome, settings: &Settings, now: DateTime<Utc>) -> String {
    let rendered = message(outcome.message(), settings, now);
    match outcome {
        QueryOutcome::Answered { .. } => rendered,
        QueryOutcome::Degraded { reason, .. } => format!("{rendered}\n(offline fallback: {reason})"),
    }
}

pub fn conversation(messages: &[ConversationMessage], settings: &Settings, now: DateTime<Utc>) -> String {
    if messages.is_empty() {
        return "Select scopes and start a conversation".to_string();
    }
    messages
        .iter()
        .enumerate()
        .map(|(i, msg)| format!("#{i} {}", message(msg, settings, now)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn scopes(scopes: &[Scope], is_selected: impl Fn(&str) -> bool) -> String {
    if scopes.is_empty() {
        return "No scopes defined".to_string();
    }
    scopes
        .iter()
        .map(|scope| {
            format!(
                "[{}] {} ({}) {} patterns | {} pages",
                if is_selected(&scope.id) { "x" } else { " " },
                scope.name,
                scope.id,
                scope.patterns.len(),
                scope.page_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn lineage(view: &LineageView) -> String {
    let chunk = view.chunk_id.map(|c| c.to_string()).unwrap_or_default();
    let mut lines = vec![format!("Version lineage: {} #{chunk}", view.url)];
    if view.snapshots.is_empty() {
        lines.push("No versions recorded".to_string());
    }
    for snapshot in &view.snapshots {
        lines.push(format!("ts: {} • chunk: {}", snapshot.version_ts, snapshot.chunk_id));
        lines.push(snapshot.text.clone());
    }
    if let Some(diff) = &view.diff {
        lines.push("Diff (last vs previous)".to_string());
        lines.extend(diff.iter().cloned());
    }
    lines.join("\n")
}

pub fn stats(stats: &Stats, now: DateTime<Utc>) -> String {
    let mut lines = vec![
        format!("Scopes: {}", stats.total_scopes),
        format!("Pages: {}", stats.total_pages),
        format!("Active crawls: {}", stats.active_crawls),
        format!("Pending updates: {}", stats.pending_updates),
        "Recent activity:".to_string(),
    ];
    if stats.recent_activity.is_empty() {
        lines.push("  No recent activity".to_string());
    }
    for activity in &stats.recent_activity {
        let when = Utc
            .timestamp_millis_opt(activity.timestamp as i64)
            .single()
            .map(|at| relative_time(at, now))
            .unwrap_or_default();
        lines.push(format!("  {} ({when})", activity.description));
    }
    lines.push("Crawl queue:".to_string());
    if stats.crawl_queue.is_empty() {
        lines.push("  No pending crawls".to_string());
    }
    for item in &stats.crawl_queue {
        lines.push(format!("  {} (scope: {})", item.url, item.scope));
    }
    lines.push("Freshness:".to_string());
    if stats.freshness_data.is_empty() {
        lines.push("  No freshness data available".to_string());
    }
    for item in &stats.freshness_data {
        lines.push(format!("  {}: fresh {} | stale {}", item.scope, item.fresh, item.stale));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::conversation::{placeholder_result, ConversationLog};
    use chrono::Duration;

    #[test]
    fn relative_time_buckets() {
        let now = Utc::now();
        assert_eq!(relative_time(now - Duration::seconds(5), now), "Just now");
        assert_eq!(relative_time(now - Duration::minutes(12), now), "12m ago");
        assert_eq!(relative_time(now - Duration::hours(3), now), "3h ago");
        let old = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();
        assert_eq!(relative_time(old, old + Duration::days(3)), "2024-02-01");
    }

    #[test]
    fn empty_conversation_prompts_for_scopes() {
        assert_eq!(
            conversation(&[], &Settings::default(), Utc::now()),
            "Select scopes and start a conversation"
        );
    }

    #[test]
    fn assistant_message_shows_three_results_then_overflow() {
        let mut log = ConversationLog::new();
        log.append_assistant("found", Some(vec![placeholder_result(); 5]));
        let msg = log.last().unwrap();
        let text = message(msg, &Settings::default(), msg.timestamp);
        assert_eq!(text.matches("Example Result").count(), 3);
        assert!(text.contains("+2 more results"));
        assert!(text.contains("Score: 0.85"));
        assert!(text.contains("v1"));
        assert!(text.ends_with("(Just now)"));
    }

    #[test]
    fn degraded_outcome_shows_reason() {
        let mut log = ConversationLog::new();
        log.append_assistant("fallback", Some(vec![placeholder_result()]));
        let msg = log.last().unwrap().clone();
        let degraded = QueryOutcome::Degraded {
            message: msg.clone(),
            reason: "Invalid scope: x".into(),
        };
        let text = outcome(&degraded, &Settings::default(), msg.timestamp);
        assert!(text.ends_with("(offline fallback: Invalid scope: x)"));

        let answered = QueryOutcome::Answered { message: msg.clone() };
        assert!(!outcome(&answered, &Settings::default(), msg.timestamp).contains("offline"));
    }

    #[test]
    fn scores_hidden_when_disabled() {
        let mut log = ConversationLog::new();
        let mut unscored = placeholder_result();
        unscored.score = None;
        log.append_assistant("found", Some(vec![unscored]));
        let msg = log.last().unwrap();
        let shown = message(msg, &Settings::default(), msg.timestamp);
        assert!(shown.contains("Score: N/A"));
        let settings = Settings {
            show_scores: false,
            ..Default::default()
        };
        assert!(!message(msg, &settings, msg.timestamp).contains("Score"));
    }

    #[test]
    fn lineage_lists_snapshots_then_diff() {
        use crate::api::models::VersionSnapshot;
        let snapshots = vec![
            VersionSnapshot {
                version_ts: "t2".into(),
                chunk_id: 3,
                text: "a\nb".into(),
            },
            VersionSnapshot {
                version_ts: "t1".into(),
                chunk_id: 3,
                text: "a".into(),
            },
        ];
        let text = lineage(&LineageView::new("https://x", Some(3), &snapshots));
        assert!(text.starts_with("Version lineage: https://x #3"));
        assert!(text.contains("ts: t2 • chunk: 3"));
        assert!(text.ends_with("Diff (last vs previous)\n  a\n+ b"));
    }
}
