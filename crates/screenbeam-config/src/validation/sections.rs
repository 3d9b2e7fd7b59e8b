//! Per-section validation.

use crate::schema::ScreenbeamConfig;

use super::helpers::{validate_range, validate_url_safe};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

pub(crate) fn validate_signaling(errors: &mut Vec<String>, config: &ScreenbeamConfig) {
    let sig = &config.signaling;
    if sig.host.trim().is_empty() {
        errors.push("signaling.host must not be empty".into());
    }
    validate_range(errors, "signaling.port", sig.port, 1, 65535);
    validate_range(
        errors,
        "signaling.heartbeat_interval_ms",
        sig.heartbeat_interval_ms,
        1000,
        60000,
    );
    validate_range(
        errors,
        "signaling.connect_timeout_secs",
        sig.connect_timeout_secs,
        1,
        300,
    );
    if sig.key.is_empty() {
        errors.push("signaling.key must not be empty".into());
    }
}

pub(crate) fn validate_capture(errors: &mut Vec<String>, config: &ScreenbeamConfig) {
    validate_range(errors, "capture.frame_rate", config.capture.frame_rate, 1, 120);
}

pub(crate) fn validate_share(errors: &mut Vec<String>, config: &ScreenbeamConfig) {
    let share = &config.share;
    match url::Url::parse(&share.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(format!(
            "share.base_url scheme {:?} must be http or https",
            url.scheme()
        )),
        Err(e) => errors.push(format!("share.base_url {:?} is invalid: {e}", share.base_url)),
    }
    validate_url_safe(errors, "share.viewer_page", &share.viewer_page);
    validate_url_safe(errors, "share.query_param", &share.query_param);
    validate_url_safe(errors, "share.id_prefix", &share.id_prefix);
}

pub(crate) fn validate_timeouts(errors: &mut Vec<String>, config: &ScreenbeamConfig) {
    validate_range(
        errors,
        "timeouts.registration_secs",
        config.timeouts.registration_secs,
        1,
        300,
    );
    validate_range(
        errors,
        "timeouts.handshake_secs",
        config.timeouts.handshake_secs,
        1,
        300,
    );
}

pub(crate) fn validate_logging(errors: &mut Vec<String>, config: &ScreenbeamConfig) {
    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(format!(
            "logging.level = {:?} is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }
}
