mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{DATASET_URL, ScriptedTransport, TTL, blocked, complete, controller, partial};
use fpl_axiom::acquisition::{ConnectionMode, Strategy};
use fpl_axiom::clock::ManualClock;
use fpl_axiom::error::FetchError;
use fpl_axiom::http_client::Route;
use fpl_axiom::state::Completeness;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::at_secs(1_700_000_000))
}

#[test]
fn first_fetch_goes_through_the_proxy() {
    let transport = ScriptedTransport::new(vec![complete()]);
    let ctl = controller(transport.clone(), clock());

    let got = ctl.fetch().unwrap();
    assert_eq!(got.strategy, Strategy::Primary);
    assert_eq!(got.mode, ConnectionMode::Server);
    assert!(!got.stale);
    assert!(got.error.is_none());
    assert_eq!(got.data.completeness, Completeness::Complete);

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].route, Route::Proxied);
    assert_eq!(calls[0].url, format!("{DATASET_URL}?_cb=1700000000000"));
    assert!(calls[0].headers.iter().any(|(k, _)| k == "Referer"));
}

#[test]
fn fresh_cache_skips_the_network() {
    let transport = ScriptedTransport::new(vec![complete()]);
    let clock = clock();
    let ctl = controller(transport.clone(), clock.clone());
    ctl.fetch().unwrap();

    clock.advance(Duration::from_secs(60));
    let got = ctl.fetch().unwrap();
    assert_eq!(got.strategy, Strategy::FreshCache);
    assert_eq!(got.mode, ConnectionMode::Server);
    assert_eq!(transport.call_count(), 1);
}

#[test]
fn blocked_with_prior_cache_falls_back_to_client_mode() {
    let transport = ScriptedTransport::new(vec![complete()]);
    let clock = clock();
    let ctl = controller(transport.clone(), clock.clone());
    let first = ctl.fetch().unwrap();

    clock.advance(TTL + Duration::from_secs(1));
    transport.push(blocked());
    let got = ctl.fetch().unwrap();

    assert_eq!(got.strategy, Strategy::StaleCache);
    assert_eq!(got.mode, ConnectionMode::ClientFallback);
    assert_eq!(ctl.mode(), ConnectionMode::ClientFallback);
    assert!(got.stale);
    assert_eq!(got.error, Some(FetchError::Http { status: 403 }));
    assert!(Arc::ptr_eq(&got.data, &first.data));
    // direct path is never reached when the cache can answer
    assert_eq!(transport.call_count(), 2);
}

#[test]
fn blocked_without_cache_disconnects() {
    let transport = ScriptedTransport::new(vec![blocked(), blocked()]);
    let ctl = controller(transport.clone(), clock());

    let err = ctl.fetch().unwrap_err();
    assert_eq!(err.fetch_error(), &FetchError::Http { status: 403 });
    assert_eq!(ctl.mode(), ConnectionMode::Disconnected);
    assert!(ctl.cached().is_none());

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].route, Route::Direct);
    assert_eq!(
        calls[1].headers,
        vec![("User-Agent".to_string(), "FPL-App/1.0".to_string())]
    );
}

#[test]
fn direct_path_recovers_into_server_mode() {
    let transport = ScriptedTransport::new(vec![blocked(), complete()]);
    let ctl = controller(transport, clock());

    let got = ctl.fetch().unwrap();
    assert_eq!(got.strategy, Strategy::Direct);
    assert_eq!(got.mode, ConnectionMode::Server);
    assert_eq!(got.error, Some(FetchError::Http { status: 403 }));
    assert!(ctl.cached().is_some());
}

#[test]
fn mode_returns_to_server_after_an_outage() {
    let transport = ScriptedTransport::new(vec![]);
    let ctl = controller(transport.clone(), clock());

    assert!(ctl.fetch().is_err());
    assert_eq!(ctl.mode(), ConnectionMode::Disconnected);

    transport.push(complete());
    ctl.fetch().unwrap();
    assert_eq!(ctl.mode(), ConnectionMode::Server);
}

#[test]
fn partial_payload_is_still_served() {
    let transport = ScriptedTransport::new(vec![partial()]);
    let ctl = controller(transport, clock());

    let got = ctl.fetch().unwrap();
    assert_eq!(got.mode, ConnectionMode::Server);
    assert_eq!(
        got.data.completeness,
        Completeness::Partial {
            teams: 2,
            players: 7
        }
    );
}

#[test]
fn malformed_body_moves_down_the_chain() {
    let transport = ScriptedTransport::new(vec![common::respond(200, "<html>oops</html>"), complete()]);
    let ctl = controller(transport, clock());

    let got = ctl.fetch().unwrap();
    assert_eq!(got.strategy, Strategy::Direct);
    assert!(matches!(got.error, Some(FetchError::Malformed(_))));
}

#[test]
fn refresh_bypasses_a_fresh_cache() {
    let transport = ScriptedTransport::new(vec![complete(), complete()]);
    let ctl = controller(transport.clone(), clock());
    ctl.fetch().unwrap();

    let got = ctl.refresh().unwrap();
    assert_eq!(got.strategy, Strategy::Primary);
    assert_eq!(transport.call_count(), 2);
}

#[test]
fn invalidate_forces_the_next_fetch_online() {
    let transport = ScriptedTransport::new(vec![complete(), complete()]);
    let ctl = controller(transport.clone(), clock());
    ctl.fetch().unwrap();

    assert!(ctl.invalidate());
    assert!(!ctl.invalidate());
    assert!(ctl.cache_is_stale());

    ctl.fetch().unwrap();
    assert_eq!(transport.call_count(), 2);
}

#[test]
fn probe_leaves_cache_and_mode_alone() {
    let transport = ScriptedTransport::new(vec![blocked()]);
    let ctl = controller(transport, clock());

    let probe = ctl.probe_primary();
    assert_eq!(probe.result.unwrap_err(), FetchError::Http { status: 403 });
    assert_eq!(ctl.mode(), ConnectionMode::Server);
    assert!(ctl.cached().is_none());
}

#[test]
fn custom_chain_is_respected() {
    let transport = ScriptedTransport::new(vec![blocked()]);
    let ctl = controller(transport.clone(), clock()).with_chain(vec![Strategy::Primary]);

    assert!(ctl.fetch().is_err());
    assert_eq!(transport.call_count(), 1);
}
