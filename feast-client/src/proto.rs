//! # Protocol Bindings
//!
//! Messages and the client stub generated from the vendored Feast protocol definitions
//! (`feast/serving/ServingService.proto` and `feast/types/Value.proto`).
pub mod feast {
    pub mod serving {
        include!(concat!(env!("OUT_DIR"), "/feast.serving.rs"));
    }

    pub mod types {
        include!(concat!(env!("OUT_DIR"), "/feast.types.rs"));
    }
}

pub use feast::serving::{
    FeastServingType, FeatureReferenceV2, GetFeastServingInfoRequest, GetFeastServingInfoResponse,
    GetOnlineFeaturesRequestV2, GetOnlineFeaturesResponse,
    get_online_features_request_v2::EntityRow, get_online_features_response::FieldValues,
    serving_service_client::ServingServiceClient,
};
