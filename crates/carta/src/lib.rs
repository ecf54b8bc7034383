//! Carta - a declarative, configuration-driven map-client runtime.
//!
//! This is the main umbrella crate that re-exports all public APIs.
//!
//! # Example
//!
//! ```no_run
//! use carta::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigDocument::parse(
//!         r#"<composition>
//!             <models>
//!                 <Context id="mainMap"><url>http://example.com/ctx.xml</url></Context>
//!             </models>
//!         </composition>"#,
//!     )?;
//!     let fetcher = Box::new(HttpFetcher::new()?);
//!     let (mut comp, _diags) =
//!         Composition::build(&config, &TypeRegistry::default(), &mut NoopLoader, fetcher);
//!     comp.init();
//!     Ok(())
//! }
//! ```

pub use carta_core::*;

/// Extent geometry and the projection family.
pub mod geo {
    pub use carta_geo::*;
}

pub mod prelude;
