//! Link-time catalog of stage types and their configuration surface.

pub mod descriptor;

pub use descriptor::{ParameterSchema, StageDescriptor, StageDescriptorFactory, StageDescriptorFn};

/// Every registered stage type, sorted by name
pub fn catalog() -> Vec<StageDescriptor> {
    let mut stages = Vec::new();
    for factory in inventory::iter::<StageDescriptorFactory> {
        stages.push((factory.0)());
    }
    stages.sort_by(|a, b| a.name.cmp(&b.name));
    stages
}

/// Look up a stage type by name or id
pub fn find(name: &str) -> Option<StageDescriptor> {
    catalog()
        .into_iter()
        .find(|d| d.name == name || d.id == name.to_lowercase())
}

pub fn by_category(category: &str) -> Vec<StageDescriptor> {
    catalog()
        .into_iter()
        .filter(|d| d.category == category)
        .collect()
}
