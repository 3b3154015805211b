// Domain models: poll snapshots, container counts, sink fields

mod container;
mod fields;
mod snapshot;

pub use container::{ContainerCounts, ContainerSnapshot, ContainerState};
pub use fields::{Field, FieldKind, FieldValue, Record};
pub use snapshot::{ErrorEvent, ResourceSnapshot, SourceKind};
