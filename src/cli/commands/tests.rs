use super::*;
use clap::CommandFactory;
use crate::whatsapp::UnlinkedSession;

#[test]
fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn test_parse_serve_with_overrides() {
    let cli = Cli::try_parse_from([
        "chatterbox",
        "--config",
        "/tmp/c.json",
        "serve",
        "--port",
        "8080",
    ])
    .unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
    match cli.command {
        Commands::Serve { host, port } => {
            assert_eq!(host, None);
            assert_eq!(port, Some(8080));
        }
        _ => panic!("expected serve"),
    }
}

#[test]
fn test_global_config_after_subcommand() {
    let cli = Cli::try_parse_from(["chatterbox", "status", "--config", "x.json"]).unwrap();
    assert!(matches!(cli.command, Commands::Status));
    assert_eq!(cli.config, Some(PathBuf::from("x.json")));
}

#[test]
fn test_unknown_subcommand_rejected() {
    assert!(Cli::try_parse_from(["chatterbox", "gateway"]).is_err());
}

#[tokio::test]
async fn test_credential_source_prefers_token_file() {
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token.json");
    std::fs::write(&token_path, r#"{"access_token": "from-file"}"#).unwrap();

    let config = YouTubeConfig {
        access_token: "static".into(),
        token_file: token_path.to_string_lossy().into_owned(),
        ..YouTubeConfig::default()
    };
    assert_eq!(
        credential_source(&config).access_token().await.unwrap(),
        "from-file"
    );

    let config = YouTubeConfig {
        access_token: "static".into(),
        ..YouTubeConfig::default()
    };
    assert_eq!(
        credential_source(&config).access_token().await.unwrap(),
        "static"
    );
}

#[tokio::test]
async fn test_credential_source_refreshes_with_oauth_client() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "renewed", "expires_in": 3600})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token.json");
    std::fs::write(
        &token_path,
        r#"{"access_token": "stale", "refresh_token": "r", "expiry_date": 1}"#,
    )
    .unwrap();

    let config = YouTubeConfig {
        token_file: token_path.to_string_lossy().into_owned(),
        client_id: "cid".into(),
        client_secret: "cs".into(),
        token_uri: format!("{}/token", server.uri()),
        ..YouTubeConfig::default()
    };
    assert_eq!(
        credential_source(&config).access_token().await.unwrap(),
        "renewed"
    );
}

#[test]
fn test_app_state_empty_secret_is_none() {
    let whatsapp = WhatsAppService::new(Arc::new(UnlinkedSession));
    let state = app_state(&Config::default(), whatsapp.clone());
    assert!(state.secret.is_none());

    let mut config = Config::default();
    config.secret = "s".into();
    assert_eq!(app_state(&config, whatsapp).secret.as_deref(), Some("s"));
}

#[tokio::test]
async fn test_auto_responder_only_with_numbers() {
    let whatsapp = WhatsAppService::new(Arc::new(UnlinkedSession));
    assert!(auto_responder(&Config::default(), whatsapp.clone()).is_none());

    let mut config = Config::default();
    config.auto_response.numbers = vec!["555".into()];
    config.auto_response.interval_ms = 5000;
    let task = auto_responder(&config, whatsapp).unwrap();
    assert_eq!(task.interval().await, Duration::from_secs(5));
    assert!(!task.is_running().await);
}
