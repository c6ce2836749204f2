//! Per-section validation rules.

use crate::schema::TamaraConfig;

use super::helpers::{validate_non_empty, validate_range, validate_range_f64};

pub(crate) fn validate_llm(errors: &mut Vec<String>, config: &TamaraConfig) {
    validate_non_empty(errors, "llm.model", &config.llm.model);
    validate_non_empty(errors, "llm.base_url", &config.llm.base_url);
    validate_range(errors, "llm.max_history", config.llm.max_history, 2, 10_000);
    validate_range(
        errors,
        "llm.request_timeout_secs",
        config.llm.request_timeout_secs,
        1,
        3600,
    );
}

pub(crate) fn validate_speech(errors: &mut Vec<String>, config: &TamaraConfig) {
    validate_range_f64(errors, "tts.speed", config.tts.speed, 0.5, 2.0);
    if config.tts.enabled {
        validate_non_empty(errors, "tts.base_url", &config.tts.base_url);
        validate_non_empty(errors, "tts.voice", &config.tts.voice);
    }
}

pub(crate) fn validate_server(errors: &mut Vec<String>, config: &TamaraConfig) {
    validate_non_empty(errors, "server.host", &config.server.host);
    validate_range(
        errors,
        "server.min_message_chars",
        config.server.min_message_chars,
        0,
        64,
    );
}

pub(crate) fn validate_database(errors: &mut Vec<String>, config: &TamaraConfig) {
    validate_range(errors, "database.pool_size", config.database.pool_size, 1, 64);
    validate_range(
        errors,
        "database.acquire_timeout_secs",
        config.database.acquire_timeout_secs,
        1,
        300,
    );
    if config.database.enabled {
        validate_non_empty(errors, "database.host", &config.database.host);
        validate_non_empty(errors, "database.database", &config.database.database);
    }
}

pub(crate) fn validate_tools(errors: &mut Vec<String>, config: &TamaraConfig) {
    validate_range(errors, "tools.timeout_secs", config.tools.timeout_secs, 1, 600);
}
