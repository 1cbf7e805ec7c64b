//! FusionAuth resource schema definitions

pub mod idp_google;
