//! # Otter Object
//!
//! Object and property model for the Otter JavaScript runtime.
//!
//! ## Design Principles
//!
//! - **Ordered keys**: indices ascending, then strings and symbols in insertion order
//! - **One check, two surfaces**: rejections are values, thrown by `Object.*`
//!   and reported as `false` by `Reflect.*`
//! - **Closed dispatch**: ordinary, array, function, proxy, wrapper and map
//!   objects share one set of internal methods
//! - **Cycle safe**: export and memory accounting track visited identities per call

#![warn(clippy::all)]
#![warn(missing_docs)]

mod array;
pub mod config;
pub mod error;
pub mod export;
pub mod gc;
pub mod host;
pub mod host_value;
mod intrinsics;
pub mod map_data;
pub mod memory;
pub mod object;
pub mod object_api;
pub mod object_cell;
pub mod property;
pub mod property_map;
pub mod proxy;
mod proxy_operations;
pub mod realm;
pub mod reflect;
pub mod string;
pub mod symbol;
pub mod value;

pub use config::MemUsageConfig;
pub use error::{ObjectError, ObjectResult};
pub use export::{ExportContext, FromJs, RecordReader};
pub use gc::GcRef;
pub use host::{Flag, Object};
pub use host_value::{HostArray, HostFunction, HostMap, HostValue};
pub use memory::{BudgetLimit, MemUsage, MemUsageContext, estimate};
pub use object::{IntegrityLevel, JsObject, ObjectKind, ObjectRef, OnFailure};
pub use property::{PartialDescriptor, PropertyAttributes, PropertyDescriptor, PropertyKey};
pub use realm::Realm;
pub use string::JsString;
pub use symbol::Symbol;
pub use value::Value;
