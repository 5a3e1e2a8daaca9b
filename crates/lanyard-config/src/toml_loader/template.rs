//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Lanyard client configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[presence]
# socket_url = "wss://api.lanyard.rest/socket"
# api_url = "https://api.lanyard.rest/v1/users"
# prefer_streaming = true
# poll_interval_secs = 30          # 5-3600
# reconnect_base_delay_ms = 2000   # 100-60000, multiplied by (retry + 1)
# max_retries = 3                  # 0-10, then polling for the rest of the session
# handshake_timeout_secs = 15      # 1-120
# request_timeout_secs = 10        # 1-120

[display]
# tick_interval_ms = 1000          # 100-10000
# show_diagnostics = false
# raw_response_limit = 512
# show_hidden_activities = false

[logging]
# level = "INFO"                   # DEBUG, INFO, WARNING, ERROR
"##
    .to_string()
}
