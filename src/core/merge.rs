use crate::domain::model::{PropertyMapping, SourceLayer};

/// Merges layers ordered from lowest to highest precedence. A key takes its value
/// from the last layer that defines it.
pub fn merge<'a, I>(layers: I) -> PropertyMapping
where
    I: IntoIterator<Item = &'a PropertyMapping>,
{
    layers
        .into_iter()
        .fold(PropertyMapping::new(), |mut merged, layer| {
            merged.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
            merged
        })
}

/// Same as [`merge`] for named layers, logging what each layer contributed.
pub fn merge_layers(layers: &[SourceLayer]) -> PropertyMapping {
    for (rank, layer) in layers.iter().enumerate() {
        tracing::debug!(
            "Layer {} '{}' provides {} properties",
            rank,
            layer.name,
            layer.properties.len()
        );
    }
    merge(layers.iter().map(|layer| &layer.properties))
}
