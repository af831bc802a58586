use dash_schema::{default_tenant_config, parse_with_defaults, validate};
use proptest::prelude::*;
use serde_json::{json, Value};

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(|n| json!(n)),
        prop_oneof![
            Just("blue".to_string()),
            Just("10 20% 30%".to_string()),
            Just("dark".to_string()),
            Just("icon-only".to_string()),
            Just("en".to_string()),
            "[a-z]{0,6}",
        ]
        .prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(
                prop_oneof![
                    Just("id".to_string()),
                    Just("widgetId".to_string()),
                    Just("width".to_string()),
                    Just("mode".to_string()),
                    Just("primary".to_string()),
                    "[a-z]{1,5}",
                ],
                inner,
                0..4,
            )
            .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Documents shaped like tenant configs with random sections swapped in
fn arb_document() -> impl Strategy<Value = Value> {
    (
        arb_json(),
        arb_json(),
        arb_json(),
        arb_json(),
        arb_json(),
        arb_json(),
    )
        .prop_map(|(theme, sidebar, i18n, drag, layouts, flags)| {
            json!({
                "id": "acme",
                "name": "Acme",
                "theme": {"mode": theme.clone(), "colors": {"primary": theme}},
                "sidebar": sidebar,
                "i18n": i18n,
                "drag": drag,
                "layouts": {"home": layouts},
                "featureFlags": flags,
            })
        })
}

proptest! {
    #[test]
    fn default_fill_is_idempotent(raw in prop_oneof![arb_json(), arb_document()]) {
        let once = parse_with_defaults(&raw);
        let twice = parse_with_defaults(&serde_json::to_value(&once).unwrap());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn default_filled_output_always_validates(raw in arb_document()) {
        let filled = parse_with_defaults(&raw);
        let reparsed = validate(&serde_json::to_value(&filled).unwrap());
        prop_assert!(reparsed.is_ok(), "{:?}", reparsed);
    }
}

#[test]
fn valid_document_survives_default_fill_unchanged() {
    let config = default_tenant_config("acme", "Acme");
    let raw = serde_json::to_value(&config).unwrap();
    assert_eq!(parse_with_defaults(&raw), config);
}
