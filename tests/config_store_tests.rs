use serde_json::json;

use sonoflow::config::{
    ConfigError, ConfigurationStore, ParameterDomain, ParameterKind, ParameterSpec, ParameterValue, StageParams,
};
use sonoflow::core::ElementType;
use sonoflow::nodes::{BeamformingMvParams, ImageInferenceParams};

fn store() -> ConfigurationStore {
    let mut store = ConfigurationStore::new();
    store
        .declare(ParameterSpec::new("gain", ParameterDomain::range(0.0, 4.0), 1.0, "Gain"))
        .unwrap();
    store
        .declare(ParameterSpec::new("taps", ParameterDomain::range(1, 32), 8, "Filter taps"))
        .unwrap();
    store
        .declare(ParameterSpec::new(
            "outputType",
            ParameterDomain::choices([ElementType::Float, ElementType::Int16]),
            ElementType::Float,
            "Output type",
        ))
        .unwrap();
    store
}

#[test]
fn test_declared_defaults_are_readable() {
    let store = store();
    assert_eq!(store.get("gain").unwrap(), &ParameterValue::Float(1.0));
    assert_eq!(store.get_as::<u32>("taps").unwrap(), 8);
    assert_eq!(store.get_as::<ElementType>("outputType").unwrap(), ElementType::Float);
    assert_eq!(store.keys().collect::<Vec<_>>(), vec!["gain", "taps", "outputType"]);
}

#[test]
fn test_get_unknown_parameter() {
    let store = store();
    assert_eq!(
        store.get("missing"),
        Err(ConfigError::UnknownParameter("missing".to_string()))
    );
}

#[test]
fn test_apply_change_in_domain() {
    let mut store = store();

    let change = store.apply_change("gain", &json!(2.5)).unwrap();
    assert_eq!(change.previous, ParameterValue::Float(1.0));
    assert_eq!(change.current, ParameterValue::Float(2.5));
    assert_eq!(store.get_as::<f64>("gain").unwrap(), 2.5);

    // Element types arrive by name
    store.apply_change("outputType", &json!("int16")).unwrap();
    assert_eq!(store.get_as::<ElementType>("outputType").unwrap(), ElementType::Int16);
}

#[test]
fn test_range_bounds_are_inclusive() {
    let mut store = store();
    assert!(store.apply_change("taps", &json!(1)).is_ok());
    assert!(store.apply_change("taps", &json!(32)).is_ok());
    assert!(matches!(
        store.apply_change("taps", &json!(33)),
        Err(ConfigError::OutOfDomain { .. })
    ));
}

#[test]
fn test_out_of_domain_keeps_previous_value() {
    let mut store = store();
    store.apply_change("gain", &json!(3.0)).unwrap();

    let err = store.apply_change("gain", &json!(-1.0)).unwrap_err();
    match err {
        ConfigError::OutOfDomain { key, value, .. } => {
            assert_eq!(key, "gain");
            assert_eq!(value, ParameterValue::Float(-1.0));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(store.get_as::<f64>("gain").unwrap(), 3.0);

    // Valid element type, but not one of the declared choices
    assert!(matches!(
        store.apply_change("outputType", &json!("uint8")),
        Err(ConfigError::OutOfDomain { .. })
    ));
    assert_eq!(store.get_as::<ElementType>("outputType").unwrap(), ElementType::Float);
}

#[test]
fn test_wrong_kind_is_invalid_value() {
    let mut store = store();
    assert!(matches!(
        store.apply_change("taps", &json!("eight")),
        Err(ConfigError::InvalidValue { expected: ParameterKind::Int, .. })
    ));
    assert!(matches!(
        store.apply_change("taps", &json!(2.5)),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        store.apply_change("outputType", &json!("complex")),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert_eq!(store.get_as::<u32>("taps").unwrap(), 8);
}

#[test]
fn test_apply_change_unknown_parameter() {
    let mut store = store();
    assert!(matches!(
        store.apply_change("bogus", &json!(1)),
        Err(ConfigError::UnknownParameter(_))
    ));
}

#[test]
fn test_declare_rejects_default_outside_domain() {
    let mut store = ConfigurationStore::new();
    let result = store.declare(ParameterSpec::new("depth", ParameterDomain::range(0, 10), 11, "Depth"));
    assert!(matches!(result, Err(ConfigError::OutOfDomain { .. })));
    assert!(store.is_empty());
}

#[test]
fn test_reset_restores_defaults() {
    let mut store = store();
    store.apply_change("gain", &json!(0.5)).unwrap();
    store.apply_change("taps", &json!(16)).unwrap();

    store.reset();

    assert_eq!(store.get_as::<f64>("gain").unwrap(), 1.0);
    assert_eq!(store.get_as::<u32>("taps").unwrap(), 8);
}

#[test]
fn test_beamforming_params_derive() {
    let schema = BeamformingMvParams::schema();
    let keys: Vec<&str> = schema.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["subArraySize", "temporalSmoothing", "outputType"]);

    let store = BeamformingMvParams::declare_defaults().unwrap();
    let params = BeamformingMvParams::load(&store).unwrap();
    assert_eq!(
        params,
        BeamformingMvParams {
            sub_array_size: 0,
            temporal_smoothing: 3,
            output_type: ElementType::Float,
        }
    );

    assert_eq!(store.domain("subArraySize").unwrap(), &ParameterDomain::Range { min: 0.0, max: 64.0 });
    assert_eq!(store.domain("temporalSmoothing").unwrap(), &ParameterDomain::Range { min: 0.0, max: 10.0 });
    assert_eq!(
        store.domain("outputType").unwrap(),
        &ParameterDomain::choices([ElementType::Float, ElementType::Uint16])
    );
}

#[test]
fn test_params_reload_single_key() {
    let mut store = ImageInferenceParams::declare_defaults().unwrap();
    let mut params = ImageInferenceParams::load(&store).unwrap();

    store.apply_change("factor", &json!(1.5)).unwrap();
    store.apply_change("outputType", &json!("uint8")).unwrap();

    // Only the notified key is re-read
    assert!(params.reload("factor", &store).unwrap());
    assert_eq!(params.factor, 1.5);
    assert_eq!(params.output_type, ElementType::Float);

    assert!(params.reload("outputType", &store).unwrap());
    assert_eq!(params.output_type, ElementType::Uint8);

    assert!(!params.reload("unrelated", &store).unwrap());
}

#[test]
fn test_params_snapshot_uses_parameter_names() {
    let store = ImageInferenceParams::declare_defaults().unwrap();
    let snapshot = ImageInferenceParams::load(&store).unwrap().snapshot();

    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.get("factor"), Some(&ParameterValue::Float(1.0)));
    assert_eq!(snapshot.get("outputType"), Some(&ParameterValue::Element(ElementType::Float)));
}
