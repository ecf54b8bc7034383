//! Prelude module for Carta.
//!
//! Re-exports the most commonly used types for convenient importing:
//!
//! ```ignore
//! use carta::prelude::*;
//! ```
//!
//! This provides access to:
//! - Graph construction (`Composition`, `ConfigDocument`, `TypeRegistry`)
//! - The event system (`EventValue`, `PointerEvent`)
//! - Document fetching (`DocumentFetcher`, `HttpFetcher`, `StaticFetcher`)
//! - Geometry (`Bounds`, `Extent`, `Projection`)

// ============================================================================
// Graph Construction
// ============================================================================

pub use crate::{Composition, ConfigDocument, ModuleLoader, NoopLoader, TypeRegistry};

// ============================================================================
// Objects and Events
// ============================================================================

pub use crate::{
    EventValue, Modifiers, ModelKind, ModelStatus, ObjectId, ObjectKind, PointerEvent,
    PointerKind, ToolKind, WidgetKind,
};

// ============================================================================
// Fetching and Errors
// ============================================================================

pub use crate::{
    ContentDocument, CoreError, DocumentFetcher, FetchError, HttpFetcher, PayloadKind,
    StaticFetcher, TransferMethod,
};

// ============================================================================
// Geometry
// ============================================================================

pub use crate::geo::{Bounds, Extent, Projection, ProjectionError, Units};
