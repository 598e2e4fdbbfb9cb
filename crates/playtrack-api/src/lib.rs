//! playtrack-api: remote playtime service client.
//! Game resolution and best-effort playtime reporting over JSON HTTP.
//! The transport lives behind a small trait so tests run against fakes.

pub mod client;

pub use client::{
    ApiClient, ApiError, HttpPost, HttpResponse, PlaytimeReport, ReqwestTransport, ResolveRequest,
};
