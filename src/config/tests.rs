use std::time::Duration;

use super::*;

#[test]
fn defaults_resolve_when_nothing_is_configured() {
    let settings = Settings::from_raw(RawSettings::default()).expect("settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.feed.page_size.get(), DEFAULT_PAGE_SIZE);
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.ttl, Duration::from_secs(DEFAULT_CACHE_TTL_SECS));
    assert_eq!(settings.database.max_connections.get(), DEFAULT_DB_MAX_CONNECTIONS);
    assert!(settings.database.url.is_none());
}

#[test]
fn zero_port_is_rejected() {
    let raw = RawSettings {
        server: RawServerSettings {
            host: None,
            port: Some(0),
        },
        ..RawSettings::default()
    };

    let err = Settings::from_raw(raw).expect_err("rejected");
    assert!(matches!(err, LoadError::Invalid { key: "server.port", .. }));
}

#[test]
fn zero_page_size_is_rejected() {
    let raw = RawSettings {
        feed: RawFeedSettings { page_size: Some(0) },
        ..RawSettings::default()
    };

    let err = Settings::from_raw(raw).expect_err("rejected");
    assert!(matches!(err, LoadError::Invalid { key: "feed.page_size", .. }));
}

#[test]
fn zero_ttl_requires_disabling_the_cache() {
    let raw = RawSettings {
        cache: RawCacheSettings {
            enabled: Some(true),
            ttl_seconds: Some(0),
        },
        ..RawSettings::default()
    };
    assert!(Settings::from_raw(raw).is_err());

    let raw = RawSettings {
        cache: RawCacheSettings {
            enabled: Some(false),
            ttl_seconds: Some(0),
        },
        ..RawSettings::default()
    };
    let settings = Settings::from_raw(raw).expect("settings");
    assert!(!settings.cache.enabled);
}

#[test]
fn blank_database_url_is_treated_as_unset() {
    let raw = RawSettings {
        database: RawDatabaseSettings {
            url: Some("   ".to_string()),
            max_connections: None,
        },
        ..RawSettings::default()
    };

    let settings = Settings::from_raw(raw).expect("settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn serve_overrides_take_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(9000);

    let overrides = ServeOverrides {
        server_port: Some(9100),
        feed_page_size: Some(5),
        cache_enabled: Some(false),
        ..ServeOverrides::default()
    };
    raw.apply_serve_overrides(&overrides);

    let settings = Settings::from_raw(raw).expect("settings");
    assert_eq!(settings.server.addr.port(), 9100);
    assert_eq!(settings.feed.page_size.get(), 5);
    assert!(!settings.cache.enabled);
}

#[test]
fn invalid_log_level_is_rejected() {
    let raw = RawSettings {
        logging: RawLoggingSettings {
            level: Some("noisy".to_string()),
            json: None,
        },
        ..RawSettings::default()
    };

    assert!(Settings::from_raw(raw).is_err());
}
