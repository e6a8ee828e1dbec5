pub mod builder;
pub mod debug_dump;
pub mod error;
pub mod math;
pub mod pool;
pub mod svg;

pub use builder::{MeshOptions, PolygonMeshBuilder, Vertex};
pub use error::{PolyMeshError, Result};
pub use pool::{BuilderPool, PooledBuilder};
