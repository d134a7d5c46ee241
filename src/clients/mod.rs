pub mod webhook_client;

pub use webhook_client::{
    build_request, OutboundRequest, RequestBody, ReqwestTransport, Transport, TransportResponse,
};
