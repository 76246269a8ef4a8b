//! Due-config selection
//!
//! Decides which page configurations should post at a given local minute.

use crate::clock::LocalTime;
use crate::types::{MinuteSet, PageConfig};

/// Every fifth minute of the hour, used when a page has no schedule
pub fn default_schedule_minutes() -> MinuteSet {
    (0..60).step_by(5).collect()
}

/// Parse a comma-separated minute list such as `"00, 15,30,45"`
///
/// Entries that are not integers in 0-59 are dropped. An input with no
/// valid entries yields an empty set, which never matches.
pub fn parse_minutes(input: &str) -> MinuteSet {
    input
        .split(',')
        .filter_map(|part| part.trim().parse::<u8>().ok())
        .filter(|minute| *minute < 60)
        .collect()
}

/// Render a minute set the way it is stored
pub fn format_minutes(minutes: &MinuteSet) -> String {
    minutes
        .iter()
        .map(|m| format!("{:02}", m))
        .collect::<Vec<_>>()
        .join(",")
}

/// Whether `config` is due at `now`
///
/// `force` bypasses both the working-hours window and the minute check,
/// but never the enabled/post-mode requirement.
pub fn is_due(config: &PageConfig, now: LocalTime, force: bool) -> bool {
    if !config.enabled || config.post_mode.is_none() {
        return false;
    }
    if force {
        return true;
    }

    let in_window = config.working_hours.contains(now.hour);
    let on_minute = match &config.schedule_minutes {
        Some(minutes) => minutes.contains(&now.minute),
        None => default_schedule_minutes().contains(&now.minute),
    };

    in_window && on_minute
}

/// Filter `configs` down to the ones due at `now`
pub fn select_due(configs: Vec<PageConfig>, now: LocalTime, force: bool) -> Vec<PageConfig> {
    configs
        .into_iter()
        .filter(|config| is_due(config, now, force))
        .collect()
}

/// Whether a share source page relays at `now`
///
/// Unlike posts, an unset or empty share schedule never matches.
pub fn share_minute_matches(minutes: Option<&MinuteSet>, now: LocalTime, force: bool) -> bool {
    if force {
        return true;
    }
    minutes.map(|m| m.contains(&now.minute)).unwrap_or(false)
}
