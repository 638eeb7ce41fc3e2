// Jobtrail API Library
//
// This crate provides the REST API layer for Jobtrail,
// including HTTP handlers, routes, identity middleware, and
// request/response models.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
