//! # Gripper Proto
//!
//! Generated `prost`/`tonic` bindings for the `gripper.GRIPSource` service, the streaming
//! contract a GRIP graph server uses to pull rows out of an external source.
//!
//! The encoded descriptor set is exported as well so the server can expose the contract
//! through gRPC server reflection.

pub mod pb {
    include!(concat!(env!("OUT_DIR"), "/gripper.rs"));
}

pub use pb::grip_source_client::GripSourceClient;
pub use pb::grip_source_server::{GripSource, GripSourceServer};
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("gripper_descriptors");
