//! Status line text

use std::time::Duration;

use chrono::{DateTime, Utc};
use tickbridge_common::resilience::QuotaUsage;
use tickbridge_common::time::format_duration_template;
use tickbridge_domain::constants::{
    CONNECTING_MESSAGE, LOW_QUOTA_MARKER, LOW_QUOTA_RATIO, NO_DESCRIPTION, NO_PROJECT,
    NO_TOKEN_STATUS, TITLE_TRUNCATE_SUFFIX, UNREACHABLE_STATUS,
};
use tickbridge_domain::{ApiStatus, StatusBarSettings, TimeEntry};

/// Everything the status line shows at one instant
#[derive(Debug, Clone)]
pub struct StatusLineView<'a> {
    pub status: ApiStatus,
    pub timer: Option<&'a TimeEntry>,
    /// Name of the timer's project, if it has one and it is known
    pub project: Option<&'a str>,
    /// Present only while rate limiting is enabled
    pub quota: Option<QuotaUsage>,
    pub now: DateTime<Utc>,
}

impl StatusLineView<'_> {
    pub fn render(&self, settings: &StatusBarSettings) -> String {
        match self.status {
            ApiStatus::Untested => return CONNECTING_MESSAGE.to_string(),
            ApiStatus::NoToken => return NO_TOKEN_STATUS.to_string(),
            ApiStatus::Unreachable => return UNREACHABLE_STATUS.to_string(),
            ApiStatus::Available | ApiStatus::Degraded => {}
        }

        let body = match self.timer {
            None => settings.no_entry_message.clone(),
            Some(entry) => {
                let description = entry
                    .description
                    .as_deref()
                    .filter(|d| !d.is_empty())
                    .unwrap_or(NO_DESCRIPTION);
                let mut title = truncate_title(description, settings.char_limit);
                if settings.show_project {
                    title.push_str(" - ");
                    title.push_str(self.project.unwrap_or(NO_PROJECT));
                }
                let elapsed = u64::try_from(entry.elapsed_seconds(self.now)).unwrap_or(0);
                let time = format_duration_template(Duration::from_secs(elapsed), &settings.format);
                format!("{title} ({time})")
            }
        };

        format!("{}{body}{}", settings.prefix, self.quota.map(quota_suffix).unwrap_or_default())
    }
}

/// Cut `title` to `limit` characters, ellipsis included
pub fn truncate_title(title: &str, limit: usize) -> String {
    if title.chars().count() <= limit {
        return title.to_string();
    }
    let keep = limit.saturating_sub(TITLE_TRUNCATE_SUFFIX.chars().count());
    let mut truncated: String = title.chars().take(keep).collect();
    truncated.push_str(TITLE_TRUNCATE_SUFFIX);
    truncated
}

fn quota_suffix(usage: QuotaUsage) -> String {
    let low = f64::from(usage.remaining) < f64::from(usage.cap) * LOW_QUOTA_RATIO;
    let marker = if low { LOW_QUOTA_MARKER } else { "" };
    format!(" | {marker}Q {}/{}", usage.remaining, usage.cap)
}
