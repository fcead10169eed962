//! # Serving Stub
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide the server side of the
//! Feast `ServingService` for integration testing the `feast-client` crate.
//! It is not intended for production use.

pub mod pb {
    pub mod feast {
        pub mod serving {
            include!(concat!(env!("OUT_DIR"), "/feast.serving.rs"));
        }

        pub mod types {
            include!(concat!(env!("OUT_DIR"), "/feast.types.rs"));
        }
    }
}

pub use pb::feast::serving::serving_service_server::{ServingService, ServingServiceServer};
