//! Programmatic registration: adding and replacing rows at run time.

use std::sync::Arc;

use relay::{ConfigError, Constructed, ExtensionPoint, ExtensionRegistration, RelayError};

mod common;
use common::embedded_host;

trait Dial: Send + Sync + std::fmt::Debug {
    fn label(&self) -> String;
}

impl ExtensionPoint for dyn Dial {
    const NAME: &'static str = "relaytest.Dial";
}

#[derive(Debug)]
struct RotaryDial;

impl Dial for RotaryDial {
    fn label(&self) -> String {
        "rotary".into()
    }
}

#[derive(Debug)]
struct TouchDial;

impl Dial for TouchDial {
    fn label(&self) -> String {
        "touch".into()
    }
}

#[derive(Debug)]
struct LoudDial {
    inner: Arc<dyn Dial>,
}

impl Dial for LoudDial {
    fn label(&self) -> String {
        format!("loud({})", self.inner.label())
    }
}

struct BrokenAdaptiveDial;

#[derive(Debug)]
struct FixedAdaptiveDial;

impl Dial for FixedAdaptiveDial {
    fn label(&self) -> String {
        "fixed".into()
    }
}

// Runtime rows are leaked: registration tables hold `&'static` rows.
fn rotary_row() -> &'static ExtensionRegistration {
    Box::leak(Box::new(ExtensionRegistration::normal::<
        dyn Dial,
        RotaryDial,
    >(
        "relaytest::RotaryDial",
        "rotary",
        |_ctx| Ok(Constructed::new::<dyn Dial>(Arc::new(RotaryDial))),
    )))
}

fn touch_row() -> &'static ExtensionRegistration {
    Box::leak(Box::new(ExtensionRegistration::normal::<dyn Dial, TouchDial>(
        "relaytest::TouchDial",
        "touch",
        |_ctx| Ok(Constructed::new::<dyn Dial>(Arc::new(TouchDial))),
    )))
}

fn loud_row() -> &'static ExtensionRegistration {
    Box::leak(Box::new(ExtensionRegistration::decorator::<dyn Dial, LoudDial>(
        "relaytest::LoudDial",
        |inner, _ctx| {
            let inner = *inner
                .downcast::<Arc<dyn Dial>>()
                .map_err(|_| RelayError::from("loud decorator got a foreign instance"))?;
            Ok(Constructed::new::<dyn Dial>(Arc::new(LoudDial { inner })))
        },
    )))
}

fn broken_adaptive_row() -> &'static ExtensionRegistration {
    Box::leak(Box::new(ExtensionRegistration::adaptive::<
        dyn Dial,
        BrokenAdaptiveDial,
    >(
        "relaytest::BrokenAdaptiveDial",
        |_ctx| Err(RelayError::from("dial backend unavailable")),
    )))
}

fn fixed_adaptive_row() -> &'static ExtensionRegistration {
    Box::leak(Box::new(ExtensionRegistration::adaptive::<
        dyn Dial,
        FixedAdaptiveDial,
    >(
        "relaytest::FixedAdaptiveDial",
        |_ctx| Ok(Constructed::new::<dyn Dial>(Arc::new(FixedAdaptiveDial))),
    )))
}

#[test]
fn added_rows_resolve_like_declared_ones() {
    let host = embedded_host();
    let registry = host.registry::<dyn Dial>();

    assert!(registry.names().unwrap().is_empty());
    registry.add_extension("rotary", rotary_row()).unwrap();

    assert_eq!(registry.get("rotary").unwrap().label(), "rotary");
    assert_eq!(registry.names().unwrap(), vec!["rotary".to_string()]);
}

#[test]
fn adding_a_taken_name_is_refused() {
    let host = embedded_host();
    let registry = host.registry::<dyn Dial>();

    registry.add_extension("dial", rotary_row()).unwrap();
    let err = registry.add_extension("dial", touch_row()).unwrap_err();
    assert!(matches!(
        err,
        RelayError::Config(ConfigError::DuplicateName { .. })
    ));

    // The original binding survives the refused add.
    assert_eq!(registry.get("dial").unwrap().label(), "rotary");
}

#[test]
fn added_decorators_join_the_chain() {
    let host = embedded_host();
    let registry = host.registry::<dyn Dial>();

    registry.add_extension("dial", rotary_row()).unwrap();
    registry.add_extension("", loud_row()).unwrap();

    assert_eq!(registry.get("dial").unwrap().label(), "loud(rotary)");
    assert_eq!(registry.get_undecorated("dial").unwrap().label(), "rotary");
}

#[test]
fn replacement_evicts_the_cached_instance() {
    let host = embedded_host();
    let registry = host.registry::<dyn Dial>();

    registry.add_extension("dial", rotary_row()).unwrap();
    assert_eq!(registry.get("dial").unwrap().label(), "rotary");

    registry.replace_extension("dial", touch_row()).unwrap();
    assert_eq!(registry.get("dial").unwrap().label(), "touch");
}

#[test]
fn replacing_an_unknown_name_is_refused() {
    let host = embedded_host();
    let registry = host.registry::<dyn Dial>();

    let err = registry.replace_extension("nobody", touch_row()).unwrap_err();
    assert!(matches!(
        err,
        RelayError::Config(ConfigError::ReplaceMissing { .. })
    ));
}

#[test]
fn a_second_adaptive_registration_is_refused() {
    let host = embedded_host();
    let registry = host.registry::<dyn Dial>();

    registry
        .add_extension("adaptive", broken_adaptive_row())
        .unwrap();
    let err = registry
        .add_extension("adaptive", fixed_adaptive_row())
        .unwrap_err();
    assert!(matches!(
        err,
        RelayError::Config(ConfigError::AdaptiveConflict { .. })
    ));
}

#[test]
fn adaptive_replacement_clears_the_cached_failure() {
    let host = embedded_host();
    let registry = host.registry::<dyn Dial>();

    registry
        .add_extension("adaptive", broken_adaptive_row())
        .unwrap();
    let err = registry.get_adaptive().unwrap_err();
    assert!(err.to_string().contains("relaytest::BrokenAdaptiveDial"));

    // The failure is cached; a second request replays it without building.
    assert!(registry.get_adaptive().is_err());
    assert_eq!(registry.synthesis_attempts(), 1);

    registry
        .replace_extension("adaptive", fixed_adaptive_row())
        .unwrap();
    assert_eq!(registry.get_adaptive().unwrap().label(), "fixed");
    assert_eq!(registry.synthesis_attempts(), 2);
}

#[test]
fn replacing_an_unfilled_adaptive_slot_is_refused() {
    let host = embedded_host();
    let registry = host.registry::<dyn Dial>();

    let err = registry
        .replace_extension("adaptive", fixed_adaptive_row())
        .unwrap_err();
    assert!(matches!(
        err,
        RelayError::Config(ConfigError::AdaptiveMissing { .. })
    ));
}
