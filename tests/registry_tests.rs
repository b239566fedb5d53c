use serde_json::json;
use sonoflow::config::ParameterKind;
use sonoflow::registry;

#[test]
fn test_catalog_lists_builtin_stages() {
    let catalog = registry::catalog();
    let names: Vec<&str> = catalog.iter().map(|d| d.name.as_str()).collect();

    assert!(names.contains(&"BeamformingMV"));
    assert!(names.contains(&"ImageInference"));

    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn test_beamforming_descriptor() {
    let descriptor = registry::find("BeamformingMV").unwrap();
    assert_eq!(descriptor.id, "beamformingmv");
    assert_eq!(descriptor.category, "Beamformer");
    assert_eq!(descriptor.parameters.len(), 3);

    let sub_array = descriptor.parameter("subArraySize").unwrap();
    assert_eq!(sub_array.kind, ParameterKind::Int);
    assert_eq!(sub_array.default, json!(0));
    assert_eq!(sub_array.min, Some(0.0));
    assert_eq!(sub_array.max, Some(64.0));

    let output_type = descriptor.parameter("outputType").unwrap();
    assert_eq!(output_type.kind, ParameterKind::Element);
    assert_eq!(output_type.default, json!("float"));
    assert_eq!(output_type.choices, vec![json!("float"), json!("uint16")]);
    assert_eq!(output_type.min, None);
}

#[test]
fn test_find_by_id() {
    let descriptor = registry::find("imageinference").unwrap();
    assert_eq!(descriptor.name, "ImageInference");
    assert_eq!(descriptor.parameter("factor").unwrap().default, json!(1.0));

    assert!(registry::find("Unknown").is_none());
}

#[test]
fn test_by_category() {
    let processing = registry::by_category("Processing");
    assert!(processing.iter().any(|d| d.name == "ImageInference"));
    assert!(processing.iter().all(|d| d.category == "Processing"));
}

#[test]
fn test_descriptor_serializes() {
    let descriptor = registry::find("ImageInference").unwrap();
    let value = serde_json::to_value(&descriptor).unwrap();

    assert_eq!(value["name"], "ImageInference");
    assert_eq!(value["parameters"][0]["key"], "factor");
    assert_eq!(value["parameters"][0]["type"], "float");
    assert_eq!(value["parameters"][1]["choices"], json!(["float", "uint8", "int16"]));
}
