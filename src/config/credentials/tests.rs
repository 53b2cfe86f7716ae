use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_string_overrides() {
    let mut config = Config::default();
    apply_overrides(
        &mut config,
        &lookup_from(&[
            ("CHATTERBOX_SERVER_URLS", "http://a:1,http://b:2"),
            ("CHATTERBOX_SECRET", "s3cret"),
            ("CHATTERBOX_YOUTUBE_TOKEN_FILE", "/tmp/t.json"),
            ("CHATTERBOX_YOUTUBE_CLIENT_ID", "cid.apps.googleusercontent.com"),
            ("CHATTERBOX_YOUTUBE_CLIENT_SECRET", "GOCSPX-x"),
            ("CHATTERBOX_REPLY_API_KEY", "sk"),
        ]),
    );
    assert!(config.youtube.can_refresh());
    assert_eq!(config.youtube.client_secret, "GOCSPX-x");
    assert_eq!(config.client.server_urls, "http://a:1,http://b:2");
    assert_eq!(config.secret, "s3cret");
    assert_eq!(config.youtube.token_file, "/tmp/t.json");
    assert_eq!(config.auto_response.reply.api_key, "sk");
}

#[test]
fn test_empty_value_keeps_field() {
    let mut config = Config::default();
    config.secret = "from-file".into();
    apply_overrides(&mut config, &lookup_from(&[("CHATTERBOX_SECRET", "")]));
    assert_eq!(config.secret, "from-file");
}

#[test]
fn test_numeric_and_list_overrides() {
    let mut config = Config::default();
    apply_overrides(
        &mut config,
        &lookup_from(&[
            ("CHATTERBOX_PORT", "8081"),
            ("CHATTERBOX_AUTO_RESPONSE_INTERVAL_MS", "30000"),
            ("CHATTERBOX_AUTO_RESPONSE_NUMBERS", " 111, ,222 "),
        ]),
    );
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.auto_response.interval_ms, 30_000);
    assert_eq!(config.auto_response.numbers, vec!["111", "222"]);
}

#[test]
fn test_bad_numbers_are_ignored() {
    let mut config = Config::default();
    apply_overrides(
        &mut config,
        &lookup_from(&[
            ("CHATTERBOX_PORT", "eighty"),
            ("CHATTERBOX_AUTO_RESPONSE_INTERVAL_MS", "-1"),
        ]),
    );
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.auto_response.interval_ms, 60_000);
}

#[test]
fn test_read_secrets_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("chatterbox_secret.txt"), "  abc\n").unwrap();
    std::fs::write(dir.path().join("chatterbox_port"), "9000").unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();

    let secrets = read_secrets_dir(dir.path());
    assert_eq!(secrets.len(), 2);
    assert_eq!(secrets["CHATTERBOX_SECRET"], "abc");
    assert_eq!(secrets["CHATTERBOX_PORT"], "9000");
}

#[test]
fn test_read_missing_secrets_dir() {
    let secrets = read_secrets_dir(Path::new("/nonexistent/chatterbox/secrets"));
    assert!(secrets.is_empty());
}

#[test]
fn test_string_override_names_are_prefixed() {
    assert!(
        STRING_OVERRIDES
            .iter()
            .all(|name| name.starts_with("CHATTERBOX_"))
    );
}
