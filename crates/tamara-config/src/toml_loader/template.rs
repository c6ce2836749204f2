//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Tamara Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[llm]
# model = "gpt-oss:20b"               # env: TAMARA_LLM_MODEL
# base_url = "http://localhost:11434" # env: OLLAMA_HOST
# max_history = 500                   # 2-10000, system prompt included
# request_timeout_secs = 120          # 1-3600
# system_prompt = "You are TAMARA, ..."

[tts]
# enabled = true
# base_url = "http://localhost:8880"
# model = "kokoro"
# voice = "ef_dora"
# speed = 1.1                         # 0.5-2.0
# language = "es"
# response_format = "wav"

[server]
# host = "0.0.0.0"
# port = 8000
# log_level = "info"                  # trace, debug, info, warn, error
# min_message_chars = 2

[database]
enabled = false
# host = "localhost"                  # env: TAMARA_DB_HOST
# port = 3306                         # env: TAMARA_DB_PORT
# user = "root"                       # env: TAMARA_DB_USER
# password = ""                       # env: TAMARA_DB_PASSWORD
# database = ""                       # env: TAMARA_DB_NAME
# allow_write = false                 # env: TAMARA_DB_ALLOW_WRITE
# pool_size = 3                       # 1-64
# acquire_timeout_secs = 10

[tools]
# enabled = true
# available = ["list_database_tables", "describe_table", "query_database", "get_table_count"]
# timeout_secs = 30                   # 1-600
"##
    .to_string()
}
