//! Clients for external collaborators

pub mod vendor;

pub use vendor::{
    DefaultVendorDispatcher, DispatchOptions, DispatchReport, HttpEmailGateway, LoggingSmsGateway,
    SmsGateway, VendorDispatcher,
};
