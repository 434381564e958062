use super::SyncConfig;

/// Config file path from `TELEINFO_CONFIG`, if set.
pub fn config_path_from_env() -> Option<String> {
    std::env::var("TELEINFO_CONFIG").ok().filter(|p| !p.is_empty())
}

/// Apply env var overrides on top of file/default values.
///
/// Unparseable values are ignored.
pub fn apply_env_overrides(config: &mut SyncConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

fn apply_overrides(config: &mut SyncConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("TELEINFO_DEVICES_FILE") {
        if !v.is_empty() {
            config.bootstrap.devices_file = Some(v);
        }
    }
    if let Some(v) = var("TELEINFO_QUEUE_CAPACITY") {
        if let Ok(n) = v.parse::<usize>() {
            if n > 0 {
                config.bus.queue_capacity = n;
            }
        }
    }
}
