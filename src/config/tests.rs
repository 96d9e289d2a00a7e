use super::load::{default_cache_home, default_config_path, resolve_config_path};
use super::schema::*;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_sampleshelf_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("SAMPLESHELF_CONFIG_PATH", "/tmp/sampleshelf-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        PathBuf::from("/tmp/sampleshelf-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        PathBuf::from("/tmp/xdg-config-home")
            .join("sampleshelf")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("sampleshelf")
            .join("config.toml")
    );
}

#[test]
fn cache_dir_defaults_under_xdg_cache_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CACHE_HOME", "/tmp/xdg-cache");

    assert_eq!(default_cache_home(), Some(PathBuf::from("/tmp/xdg-cache")));
    assert_eq!(
        CacheSettings::default().resolved_dir(),
        Some(PathBuf::from("/tmp/xdg-cache/sampleshelf/peaks"))
    );
    assert_eq!(
        LogSettings::default().resolved_file(),
        Some(PathBuf::from("/tmp/xdg-cache/sampleshelf/sampleshelf.log"))
    );

    let explicit = CacheSettings {
        dir: Some(PathBuf::from("/srv/peaks")),
        ..CacheSettings::default()
    };
    assert_eq!(explicit.resolved_dir(), Some(PathBuf::from("/srv/peaks")));
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[library]
extensions = ["wav", "aiff"]
recursive = false
include_hidden = true
follow_links = true
max_depth = 4
display_fields = ["filename", "duration"]
display_separator = " | "

[cache]
dir = "/tmp/peaks-here"
resolution = 50
workers = 4

[ui]
header_text = "hello"
prefetch_rows = 0

[audio]
audition = false
volume = 0.5

[log]
level = "debug"
file = "/tmp/sampleshelf.log"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("SAMPLESHELF_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("SAMPLESHELF__CACHE__RESOLUTION");

    let s = Settings::load().unwrap();
    assert_eq!(s.library.extensions, vec!["wav".to_string(), "aiff".to_string()]);
    assert!(!s.library.recursive);
    assert!(s.library.include_hidden);
    assert!(s.library.follow_links);
    assert_eq!(s.library.max_depth, Some(4));
    assert_eq!(
        s.library.display_fields,
        vec![DisplayField::Filename, DisplayField::Duration]
    );
    assert_eq!(s.library.display_separator, " | ");
    assert_eq!(s.cache.dir, Some(PathBuf::from("/tmp/peaks-here")));
    assert_eq!(s.cache.resolution, 50);
    assert_eq!(s.cache.workers, 4);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(s.ui.prefetch_rows, 0);
    assert!(!s.audio.audition);
    assert_eq!(s.audio.volume, 0.5);
    assert_eq!(s.log.level, "debug");
    assert_eq!(s.log.file, Some(PathBuf::from("/tmp/sampleshelf.log")));
    assert!(s.validate().is_ok());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[cache]
resolution = 100
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("SAMPLESHELF_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("SAMPLESHELF__CACHE__RESOLUTION", "25");

    let s = Settings::load().unwrap();
    assert_eq!(s.cache.resolution, 25);
}

#[test]
fn missing_config_file_yields_defaults() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let _g1 = EnvGuard::set(
        "SAMPLESHELF_CONFIG_PATH",
        dir.path().join("absent.toml").to_str().unwrap(),
    );
    let _g2 = EnvGuard::remove("SAMPLESHELF__CACHE__RESOLUTION");

    let s = Settings::load().unwrap();
    assert_eq!(s.cache.resolution, CacheSettings::default().resolution);
    assert_eq!(s.library.extensions.len(), 5);
}

#[test]
fn validate_rejects_degenerate_values() {
    let mut s = Settings::default();
    assert!(s.validate().is_ok());

    s.cache.resolution = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.cache.workers = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.library.extensions = vec![" ".into(), ".".into()];
    assert!(s.validate().is_err());
}
