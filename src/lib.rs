//! # halo-pairs
//!
//! This is a library for finding mutually isolated reciprocal nearest-neighbour
//! pairs in a periodic 3D point catalog, such as the halo catalogs of a
//! cosmological N-body simulation.
//!
//! Two points form a *reciprocal pair* when each is the other's nearest
//! neighbour under the minimum-image metric of the periodic box. A pair is
//! *isolated* when no third point within `exclusion_factor × separation` of a
//! member has a larger prominence than that member.
//!
//! # Features
//!
//! - Exact k-nearest and radius-ball queries on a periodic k-d tree
//! - Reciprocal pairing and isolation filtering on the [rayon](https://docs.rs/rayon) thread pool
//! - One configurable pipeline with optional prominence upper limit and positive-mass filter
//! - Per-stage counts and [tracing](https://docs.rs/tracing) spans for every realization
//! - Serialization of configuration and output records with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use halo_pairs::prelude::*;
//!
//! // Raw catalog positions live in [-L/2, L/2).
//! let catalog = Catalog::new(
//!     1000.0,
//!     vec![
//!         [100.0, 100.0, 100.0],
//!         [101.0, 100.0, 100.0],
//!         [300.0, 300.0, 300.0],
//!         [301.0, 300.0, 300.0],
//!         [302.5, 300.0, 300.0],
//!     ],
//!     vec![[0.0; 3]; 5],
//!     vec![250.0, 240.0, 250.0, 240.0, 300.0],
//!     vec![1, 1, 1, 1, 1],
//!     vec![10, 11, 12, 13, 14],
//! )
//! .unwrap();
//!
//! let config = SelectionConfigBuilder::default()
//!     .exclusion_factor(3.0)
//!     .build()
//!     .unwrap();
//! let result = select_pairs(&catalog, &config).unwrap();
//!
//! // (2, 3) is reciprocal too, but the brighter point 4 lies within its exclusion radius.
//! assert_eq!(result.report.reciprocal, 2);
//! assert_eq!(result.pairs, vec![Pair::new(0, 1).unwrap()]);
//! assert_eq!(result.to_pair_catalog().id_a, vec![10]);
//! ```
//!
//! # Coordinate convention
//!
//! Catalog positions are shifted by `(x + L/2) mod L` exactly once before
//! indexing (see [`PeriodicBox::recenter`](geometry::periodic_box::PeriodicBox::recenter)).
//! Set [`SelectionConfig::recenter_positions`](core::config::SelectionConfig::recenter_positions)
//! to `false` for catalogs that already use `[0, L)`.

#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// The `core` module contains the spatial index, the pairing algorithms and
/// the selection pipeline, together with the data types they exchange.
pub mod core {
    /// Pairing and isolation algorithms run over a built index
    pub mod algorithms {
        pub mod isolation;
        pub mod reciprocal;
    }
    pub mod catalog;
    /// Hash map, set and inline buffer aliases
    pub mod collections;
    pub mod config;
    pub mod error;
    pub mod pair;
    pub mod pipeline;
    pub mod point;
    pub mod spatial_index;

    pub use catalog::*;
    pub use config::*;
    pub use error::*;
    pub use pair::*;
    pub use pipeline::*;
    pub use point::*;
    pub use spatial_index::*;
}

/// Periodic box geometry and synthetic catalog generation.
pub mod geometry {
    pub mod periodic_box;
    pub mod util;

    pub use periodic_box::*;
    pub use util::*;
}

/// A prelude module that re-exports commonly used types.
/// This makes it easier to import the most commonly used items from the crate.
pub mod prelude {
    pub use crate::core::{
        algorithms::{isolation::*, reciprocal::*},
        catalog::*,
        config::*,
        error::*,
        pair::*,
        pipeline::*,
        point::*,
        spatial_index::*,
    };

    pub use crate::core::collections::{
        FastHashMap, FastHashSet, SmallBuffer, fast_hash_map_with_capacity,
        fast_hash_set_with_capacity,
    };

    pub use crate::geometry::{periodic_box::*, util::*};
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{
        core::{
            catalog::{Catalog, PairCatalog},
            config::SelectionConfig,
            pair::Pair,
            pipeline::{SelectionPipeline, SelectionResult},
            point::Point,
            spatial_index::PeriodicIndex,
        },
        geometry::periodic_box::PeriodicBox,
        is_normal,
    };

    // =============================================================================
    // TYPE SAFETY TESTS
    // =============================================================================

    #[test]
    fn normal_types() {
        assert!(is_normal::<Point>());
        assert!(is_normal::<Pair>());
        assert!(is_normal::<PeriodicBox<3>>());
        assert!(is_normal::<PeriodicIndex<3>>());
        assert!(is_normal::<Catalog>());
        assert!(is_normal::<PairCatalog>());
        assert!(is_normal::<SelectionConfig>());
        assert!(is_normal::<SelectionPipeline>());
        assert!(is_normal::<SelectionResult>());
    }

    #[test]
    fn test_prelude_exports() {
        use crate::prelude::*;

        let mut map: FastHashMap<u64, usize> = FastHashMap::default();
        map.insert(123, 456);
        assert_eq!(map.get(&123), Some(&456));

        let set = fast_hash_set_with_capacity::<Pair>(50);
        assert!(set.capacity() >= 50);

        let mut buffer: SmallBuffer<usize, 8> = SmallBuffer::new();
        buffer.push(42);
        assert_eq!(buffer.len(), 1);

        let catalog = generate_random_catalog_seeded(10, 100.0, (0.0, 100.0), 1).unwrap();
        let result = SelectionPipeline::new(SelectionConfig::default())
            .unwrap()
            .run(&catalog)
            .unwrap();
        assert!(result.report.short_circuited);
    }
}
