//! HTML and plain-text renderings of the job-alert email. Both carry the
//! same content: one card per job, an unsubscribe link embedding the
//! subscriber's token, and a manage-preferences link.

use crate::mailer::JobAlertMessage;
use crate::models::job::ScoredJob;

const DESCRIPTION_PREVIEW_CHARS: usize = 150;

pub fn subject_line(job_count: usize) -> String {
    let noun = if job_count == 1 { "position" } else { "positions" };
    format!("New Job Alerts - {job_count} matching {noun} found")
}

fn unsubscribe_url(app_url: &str, token: &str) -> String {
    format!("{app_url}/job-alerts/unsubscribe?token={token}")
}

fn manage_url(app_url: &str, token: &str) -> String {
    format!("{app_url}/job-alerts/preferences?token={token}")
}

fn job_url(app_url: &str, job: &ScoredJob) -> String {
    job.job
        .apply_url
        .clone()
        .unwrap_or_else(|| format!("{app_url}/jobs/{}", job.job.id))
}

/// Truncates on a char boundary and appends an ellipsis when shortened.
fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}…", truncated.trim_end())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn type_badge(job: &ScoredJob) -> String {
    let mut parts = Vec::new();
    if let Some(t) = &job.job.employment_type {
        parts.push(t.clone());
    }
    if job.job.is_remote {
        parts.push("Remote".to_string());
    }
    parts.join(" · ")
}

pub fn render_html(message: &JobAlertMessage, app_url: &str) -> String {
    let mut html = String::new();
    html.push_str("<html><body style=\"font-family: sans-serif; color: #222;\">");

    let greeting = if message.to_name.is_empty() {
        "Hello".to_string()
    } else {
        format!("Hello {}", escape_html(&message.to_name))
    };
    html.push_str(&format!("<h2>{greeting},</h2>"));
    html.push_str(&format!(
        "<p>We found <strong>{}</strong> new job{} matching your alert",
        message.jobs.len(),
        if message.jobs.len() == 1 { "" } else { "s" }
    ));
    if !message.keywords_summary.is_empty() {
        html.push_str(&format!(
            " for <em>{}</em>",
            escape_html(&message.keywords_summary)
        ));
    }
    if !message.locations_summary.is_empty() {
        html.push_str(&format!(
            " in <em>{}</em>",
            escape_html(&message.locations_summary)
        ));
    }
    html.push_str(".</p>");

    for job in &message.jobs {
        let url = job_url(app_url, job);
        html.push_str("<div style=\"border: 1px solid #ddd; border-radius: 6px; padding: 12px; margin: 12px 0;\">");
        html.push_str(&format!(
            "<h3 style=\"margin: 0 0 4px 0;\"><a href=\"{url}\">{}</a></h3>",
            escape_html(&job.job.title)
        ));
        html.push_str(&format!(
            "<p style=\"margin: 2px 0;\">{} — {}</p>",
            escape_html(&job.job.company),
            escape_html(&job.job.location)
        ));
        let badge = type_badge(job);
        if !badge.is_empty() {
            html.push_str(&format!(
                "<p style=\"margin: 2px 0; color: #666;\">{}</p>",
                escape_html(&badge)
            ));
        }
        html.push_str(&format!(
            "<p style=\"margin: 6px 0;\">{}</p>",
            escape_html(&preview(&job.job.description, DESCRIPTION_PREVIEW_CHARS))
        ));
        html.push_str(&format!("<a href=\"{url}\">View job →</a>"));
        html.push_str("</div>");
    }

    html.push_str(&format!(
        "<p style=\"font-size: 12px; color: #888;\">\
         <a href=\"{}\">Manage preferences</a> · <a href=\"{}\">Unsubscribe</a></p>",
        manage_url(app_url, &message.unsubscribe_token),
        unsubscribe_url(app_url, &message.unsubscribe_token)
    ));
    html.push_str("</body></html>");
    html
}

pub fn render_text(message: &JobAlertMessage, app_url: &str) -> String {
    let mut text = String::new();

    if message.to_name.is_empty() {
        text.push_str("Hello,\n\n");
    } else {
        text.push_str(&format!("Hello {},\n\n", message.to_name));
    }
    text.push_str(&format!(
        "We found {} new job{} matching your alert",
        message.jobs.len(),
        if message.jobs.len() == 1 { "" } else { "s" }
    ));
    if !message.keywords_summary.is_empty() {
        text.push_str(&format!(" for {}", message.keywords_summary));
    }
    if !message.locations_summary.is_empty() {
        text.push_str(&format!(" in {}", message.locations_summary));
    }
    text.push_str(".\n\n");

    for job in &message.jobs {
        text.push_str(&format!("* {}\n", job.job.title));
        text.push_str(&format!("  {} — {}\n", job.job.company, job.job.location));
        let badge = type_badge(job);
        if !badge.is_empty() {
            text.push_str(&format!("  {badge}\n"));
        }
        text.push_str(&format!(
            "  {}\n",
            preview(&job.job.description, DESCRIPTION_PREVIEW_CHARS)
        ));
        text.push_str(&format!("  {}\n\n", job_url(app_url, job)));
    }

    text.push_str(&format!(
        "Manage preferences: {}\n",
        manage_url(app_url, &message.unsubscribe_token)
    ));
    text.push_str(&format!(
        "Unsubscribe: {}\n",
        unsubscribe_url(app_url, &message.unsubscribe_token)
    ));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::test_fixtures::make_job;
    use chrono::Utc;

    fn message_with_jobs(count: usize) -> JobAlertMessage {
        let jobs = (0..count)
            .map(|i| ScoredJob {
                job: make_job(&format!("Engineer {i}"), Utc::now()),
                relevance_score: 10,
            })
            .collect();
        JobAlertMessage {
            to_email: "jane@example.com".to_string(),
            to_name: "Jane".to_string(),
            jobs,
            keywords_summary: "engineer".to_string(),
            locations_summary: "Remote".to_string(),
            unsubscribe_token: "tok123".to_string(),
        }
    }

    #[test]
    fn test_subject_encodes_match_count() {
        assert_eq!(subject_line(1), "New Job Alerts - 1 matching position found");
        assert_eq!(
            subject_line(5),
            "New Job Alerts - 5 matching positions found"
        );
    }

    #[test]
    fn test_html_contains_unsubscribe_and_manage_links_with_token() {
        let html = render_html(&message_with_jobs(2), "https://example.com");
        assert!(html.contains("https://example.com/job-alerts/unsubscribe?token=tok123"));
        assert!(html.contains("https://example.com/job-alerts/preferences?token=tok123"));
    }

    #[test]
    fn test_text_rendering_lists_every_job() {
        let text = render_text(&message_with_jobs(3), "https://example.com");
        for i in 0..3 {
            assert!(text.contains(&format!("Engineer {i}")));
        }
        assert!(text.contains("Unsubscribe:"));
    }

    #[test]
    fn test_text_rendering_carries_the_summary_sentence() {
        let text = render_text(&message_with_jobs(2), "https://example.com");
        assert!(text.contains("for engineer"));
        assert!(text.contains("in Remote"));
    }

    #[test]
    fn test_html_escapes_job_fields() {
        let mut message = message_with_jobs(1);
        message.jobs[0].job.title = "C++ <Senior> Dev".to_string();
        let html = render_html(&message, "https://example.com");
        assert!(html.contains("C++ &lt;Senior&gt; Dev"));
        assert!(!html.contains("<Senior>"));
    }

    #[test]
    fn test_description_preview_truncates() {
        let long = "x".repeat(400);
        let short = preview(&long, DESCRIPTION_PREVIEW_CHARS);
        assert!(short.chars().count() <= DESCRIPTION_PREVIEW_CHARS + 1);
        assert!(short.ends_with('…'));
    }

    #[test]
    fn test_job_without_apply_url_links_into_app() {
        let message = message_with_jobs(1);
        let text = render_text(&message, "https://example.com");
        assert!(text.contains(&format!("https://example.com/jobs/{}", message.jobs[0].job.id)));
    }
}
