//! Proxy classes: method unions, handler routing, caching, skeletons.

use std::sync::Arc;

use relay::testing::CapturingHandler;
use relay::{CallError, ProxyError, RelayError, Value, skeleton_of};

mod common;
use common::{EchoService, TickService, embedded_host};

#[test]
fn class_combines_contract_method_tables() {
    let host = embedded_host();
    let class = host
        .proxy_class(&["relaytest.EchoService", "relaytest.TickService"])
        .unwrap();

    assert!(class.label().starts_with("proxy"));
    assert_eq!(class.contracts().count(), 2);
    assert_eq!(class.methods().len(), 3); // echo, total, tick
}

#[test]
fn stub_routes_through_one_handler_call() {
    let host = embedded_host();
    let class = host.proxy_class(&["relaytest.EchoService"]).unwrap();

    let handler = CapturingHandler::new();
    handler.respond_with(Value::Str("pong".into()));
    let instance = class.instantiate(Arc::new(handler.clone()));

    let echo = instance.facet::<dyn EchoService>().unwrap();
    assert_eq!(echo.echo("ping".into()).unwrap(), "pong");

    let calls = handler.calls();
    assert_eq!(calls.len(), 1);
    let (method, args) = &calls[0];
    assert_eq!(method.contract, "relaytest.EchoService");
    assert_eq!(method.name, "echo");
    assert_eq!(args.as_slice(), &[Value::Str("ping".into())]);
}

#[test]
fn null_result_coerces_to_zero_for_int_returns() {
    let host = embedded_host();
    let class = host
        .proxy_class(&["relaytest.EchoService", "relaytest.TickService"])
        .unwrap();

    // CapturingHandler answers Null by default.
    let instance = class.instantiate(Arc::new(CapturingHandler::new()));

    let echo = instance.facet::<dyn EchoService>().unwrap();
    assert_eq!(echo.total(2, 3).unwrap(), 0);

    let tick = instance.facet::<dyn TickService>().unwrap();
    assert_eq!(tick.tick().unwrap(), 0);
}

#[test]
fn null_result_is_an_error_for_string_returns() {
    let host = embedded_host();
    let class = host.proxy_class(&["relaytest.EchoService"]).unwrap();
    let instance = class.instantiate(Arc::new(CapturingHandler::new()));

    let echo = instance.facet::<dyn EchoService>().unwrap();
    let err = echo.echo("ping".into()).unwrap_err();
    assert_eq!(err.to_string(), "expected string, found null");
}

#[test]
fn cache_key_ignores_order_and_duplicates() {
    let host = embedded_host();

    let ab = host
        .proxy_class(&["relaytest.EchoService", "relaytest.TickService"])
        .unwrap();
    let ba = host
        .proxy_class(&["relaytest.TickService", "relaytest.EchoService"])
        .unwrap();
    assert!(Arc::ptr_eq(&ab, &ba));

    let single = host.proxy_class(&["relaytest.EchoService"]).unwrap();
    let doubled = host
        .proxy_class(&["relaytest.EchoService", "relaytest.EchoService"])
        .unwrap();
    assert!(Arc::ptr_eq(&single, &doubled));
}

#[test]
fn unknown_contract_fails_and_is_retried() {
    let host = embedded_host();

    for _ in 0..2 {
        // The in-flight marker is evicted on failure, so the second
        // request re-attempts instead of blocking or replaying a cache.
        let err = host.proxy_class(&["relaytest.Missing"]).unwrap_err();
        assert!(matches!(
            err,
            RelayError::Proxy(ProxyError::UnknownContract { .. })
        ));
    }

    // The cache still works after a failure.
    assert!(host.proxy_class(&["relaytest.EchoService"]).is_ok());
}

struct LocalEcho;

impl EchoService for LocalEcho {
    fn echo(&self, message: String) -> Result<String, CallError> {
        Ok(format!("local:{message}"))
    }

    fn total(&self, amount: i64, batch: i64) -> Result<i64, CallError> {
        Ok(amount + batch)
    }
}

#[test]
fn skeleton_round_trips_through_a_stub() {
    let host = embedded_host();
    let class = host.proxy_class(&["relaytest.EchoService"]).unwrap();

    // Typed implementation -> generic handler -> typed stub.
    let handler = skeleton_of::<dyn EchoService>(Arc::new(LocalEcho)).unwrap();
    let instance = class.instantiate(handler);

    let echo = instance.facet::<dyn EchoService>().unwrap();
    assert_eq!(echo.echo("ping".into()).unwrap(), "local:ping");
    assert_eq!(echo.total(2, 3).unwrap(), 5);
}

#[test]
fn default_instance_refuses_every_call() {
    let host = embedded_host();
    let class = host.proxy_class(&["relaytest.EchoService"]).unwrap();
    let instance = class.instantiate_default();

    let echo = instance.facet::<dyn EchoService>().unwrap();
    let err = echo.echo("ping".into()).unwrap_err();
    assert!(matches!(err, CallError::Unsupported { .. }));
    assert!(err.to_string().contains("echo"));
}

#[test]
fn facet_of_an_uncombined_contract_is_absent() {
    let host = embedded_host();
    let class = host.proxy_class(&["relaytest.EchoService"]).unwrap();
    let instance = class.instantiate_default();

    assert!(instance.facet::<dyn TickService>().is_none());
}
