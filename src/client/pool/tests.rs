use super::*;
use crate::client::testing::ScriptedProbe;
use proptest::prelude::*;

fn pool(probe: &Arc<ScriptedProbe>, raw: &str) -> ServerPool {
    ServerPool::new(probe.clone(), raw)
}

#[test]
fn test_parse_trims_and_drops_empties() {
    assert_eq!(
        parse_server_urls(" http://a:3000 ,, http://b:3000 ,"),
        vec!["http://a:3000", "http://b:3000"]
    );
}

#[test]
fn test_parse_deduplicates_preserving_first() {
    assert_eq!(
        parse_server_urls("http://b,http://a,http://b, http://a"),
        vec!["http://b", "http://a"]
    );
}

#[test]
fn test_parse_empty_input() {
    assert!(parse_server_urls("").is_empty());
    assert!(parse_server_urls(" , ,").is_empty());
}

proptest! {
    #[test]
    fn prop_parse_is_unique_trimmed_and_ordered(
        parts in proptest::collection::vec("[ ]{0,2}[a-c]{0,2}[ ]{0,2}", 0..12)
    ) {
        let raw = parts.join(",");
        let parsed = parse_server_urls(&raw);

        for url in &parsed {
            prop_assert!(!url.is_empty());
            prop_assert_eq!(url.trim(), url.as_str());
        }
        let unique: std::collections::HashSet<_> = parsed.iter().collect();
        prop_assert_eq!(unique.len(), parsed.len());

        // Order follows first appearance in the input
        let mut expected: Vec<String> = Vec::new();
        for p in &parts {
            let t = p.trim();
            if !t.is_empty() && !expected.iter().any(|e| e == t) {
                expected.push(t.to_string());
            }
        }
        prop_assert_eq!(parsed, expected);
    }
}

#[tokio::test]
async fn test_select_initial_picks_first_healthy_in_order() {
    let probe = Arc::new(ScriptedProbe::healthy(&["http://b", "http://c"]));
    let pool = pool(&probe, "http://a,http://b,http://c");

    let selected = pool.select_initial().await.unwrap();
    assert_eq!(selected, "http://b");
    assert_eq!(pool.active_url().as_deref(), Some("http://b"));
    // Stops probing once a healthy server is found
    assert_eq!(probe.calls(), vec!["http://a", "http://b"]);
}

#[tokio::test]
async fn test_select_initial_none_healthy() {
    let probe = Arc::new(ScriptedProbe::healthy(&[]));
    let pool = pool(&probe, "http://a,http://b");

    let err = pool.select_initial().await.unwrap_err();
    assert!(matches!(err, BridgeError::NoServersAvailable));
    assert!(pool.active_url().is_none());
}

#[tokio::test]
async fn test_select_initial_empty_pool() {
    let probe = Arc::new(ScriptedProbe::healthy(&["http://a"]));
    let pool = pool(&probe, "");
    assert!(matches!(
        pool.select_initial().await,
        Err(BridgeError::NoServersAvailable)
    ));
    assert!(probe.calls().is_empty());
}

#[tokio::test]
async fn test_failover_skips_current() {
    let probe = Arc::new(ScriptedProbe::healthy(&["http://a", "http://b"]));
    let pool = pool(&probe, "http://a,http://b");
    pool.select_initial().await.unwrap();

    let next = pool.failover("http://a").await;
    assert_eq!(next.as_deref(), Some("http://b"));
    assert_eq!(pool.active_url().as_deref(), Some("http://b"));
    // The current server is never re-probed during failover
    assert_eq!(probe.calls(), vec!["http://a", "http://b"]);
}

#[tokio::test]
async fn test_failover_earliest_healthy_wins() {
    let probe = Arc::new(ScriptedProbe::healthy(&["http://a", "http://c", "http://d"]));
    let pool = pool(&probe, "http://a,http://b,http://c,http://d");
    pool.select_initial().await.unwrap();

    assert_eq!(pool.failover("http://a").await.as_deref(), Some("http://c"));
}

#[tokio::test]
async fn test_failover_can_return_to_earlier_server() {
    let probe = Arc::new(ScriptedProbe::healthy(&["http://a", "http://b"]));
    let pool = pool(&probe, "http://a,http://b");
    pool.select_initial().await.unwrap();
    pool.failover("http://a").await.unwrap();

    assert_eq!(pool.failover("http://b").await.as_deref(), Some("http://a"));
}

#[tokio::test]
async fn test_failover_without_alternative_keeps_active() {
    let probe = Arc::new(ScriptedProbe::healthy(&["http://a"]));
    let pool = pool(&probe, "http://a,http://b");
    pool.select_initial().await.unwrap();

    assert!(pool.failover("http://a").await.is_none());
    assert_eq!(pool.active_url().as_deref(), Some("http://a"));
}

#[tokio::test]
async fn test_configure_resets_active() {
    let probe = Arc::new(ScriptedProbe::healthy(&["http://a", "http://x"]));
    let pool = pool(&probe, "http://a");
    pool.select_initial().await.unwrap();

    pool.configure("http://x, http://y,http://x").await;
    assert!(pool.active_url().is_none());
    assert_eq!(pool.candidates(), vec!["http://x", "http://y"]);
    assert_eq!(pool.select_initial().await.unwrap(), "http://x");
}

#[tokio::test]
async fn test_probe_all_marks_active() {
    let probe = Arc::new(ScriptedProbe::healthy(&["http://b"]));
    let pool = pool(&probe, "http://a,http://b");
    pool.select_initial().await.unwrap();

    let health = pool.probe_all().await;
    assert_eq!(
        health,
        vec![
            ServerHealth {
                url: "http://a".into(),
                healthy: false,
                active: false
            },
            ServerHealth {
                url: "http://b".into(),
                healthy: true,
                active: true
            },
        ]
    );
}

#[tokio::test]
async fn test_probe_active_when_uninitialised() {
    let probe = Arc::new(ScriptedProbe::healthy(&["http://a"]));
    let pool = pool(&probe, "http://a");
    assert!(pool.probe_active().await.is_none());
    pool.select_initial().await.unwrap();
    probe.set_healthy("http://a", false);
    assert_eq!(
        pool.probe_active().await,
        Some(("http://a".to_string(), false))
    );
}

#[tokio::test]
async fn test_concurrent_failovers_agree() {
    let probe = Arc::new(ScriptedProbe::healthy(&["http://a", "http://b"]));
    let pool = Arc::new(pool(&probe, "http://a,http://b"));
    pool.select_initial().await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move { pool.failover("http://a").await }));
    }
    for h in handles {
        assert_eq!(h.await.unwrap().as_deref(), Some("http://b"));
    }
    assert_eq!(pool.active_url().as_deref(), Some("http://b"));
}

#[tokio::test]
async fn test_active_or_select_reuses_active() {
    let probe = Arc::new(ScriptedProbe::healthy(&["http://a"]));
    let pool = pool(&probe, "http://a");

    assert_eq!(pool.active_or_select().await.unwrap(), "http://a");
    assert_eq!(pool.active_or_select().await.unwrap(), "http://a");
    assert_eq!(probe.calls(), vec!["http://a"]);
}

#[tokio::test]
async fn test_concurrent_initial_selection_sweeps_once() {
    let probe = Arc::new(ScriptedProbe::healthy(&["http://b"]));
    let pool = Arc::new(pool(&probe, "http://a,http://b"));

    let mut handles = Vec::new();
    for _ in 0..6 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move { pool.active_or_select().await }));
    }
    for h in handles {
        assert_eq!(h.await.unwrap().unwrap(), "http://b");
    }
    assert_eq!(probe.calls(), vec!["http://a", "http://b"]);
}
