use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

pub mod api;
pub mod cascade;
pub mod channel;
pub mod config;
pub mod downstream;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod ffmpeg;
pub mod init;
pub mod ledger;
pub mod metadata;
pub mod pipeline;
pub mod record;
pub mod sanitize;

pub type StatusHook = Arc<Mutex<dyn Fn(&str) + Send + Sync + 'static>>;

static LOG_HOOK: Lazy<Mutex<Option<StatusHook>>> = Lazy::new(|| Mutex::new(None));

/// Installs (or clears) a sink that receives every status line as `[TAG] message`.
pub fn set_log_hook(hook: Option<StatusHook>) {
    if let Ok(mut guard) = LOG_HOOK.lock() {
        *guard = hook;
    }
}

pub(crate) fn logv(tag: &str, message: &str) {
    match tag {
        "WARN" => tracing::warn!(status = tag, "{}", message),
        "ERROR" => tracing::error!(status = tag, "{}", message),
        _ => tracing::info!(status = tag, "{}", message),
    }

    if let Ok(guard) = LOG_HOOK.lock() {
        if let Some(hook) = guard.as_ref() {
            if let Ok(callback) = hook.lock() {
                let line = format!("[{}] {}", tag, message);
                callback(&line);
            }
        }
    }
}

pub(crate) fn logi(message: impl AsRef<str>) {
    logv("INFO", message.as_ref());
}

pub(crate) fn logok(message: impl AsRef<str>) {
    logv("OK", message.as_ref());
}

pub(crate) fn logw(message: impl AsRef<str>) {
    logv("WARN", message.as_ref());
}

pub(crate) fn loge(message: impl AsRef<str>) {
    logv("ERROR", message.as_ref());
}
