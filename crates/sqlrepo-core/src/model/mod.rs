//! Entity model: descriptors, values and records

pub mod descriptor;
pub mod record;
pub mod value;

pub use descriptor::{DescriptorBuilder, Entity, EntityDescriptor, FieldDef, FieldKind};
pub use record::Record;
pub use value::{Literal, Value};
