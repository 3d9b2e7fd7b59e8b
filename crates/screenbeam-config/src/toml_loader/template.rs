//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# screenbeam configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[signaling]
# host = "0.peerjs.com"
# port = 443                     # 1-65535
# path = "/"
# secure = true
# key = "peerjs"
# heartbeat_interval_ms = 5000   # 1000-60000
# connect_timeout_secs = 15      # 1-300

[capture]
# frame_rate = 60                # 1-120
# cursor = "always"              # always, motion, never
# display_surface = "window"     # monitor, window, browser

[share]
# base_url = "http://localhost:8080"
# viewer_page = "viewer.html"
# query_param = "view"
# id_prefix = "screen-"

[timeouts]
# registration_secs = 15         # 1-300
# handshake_secs = 20            # 1-300

[logging]
# level = "info"                 # trace, debug, info, warn, error
"##
    .to_string()
}
