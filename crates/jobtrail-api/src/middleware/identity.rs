//! Identity middleware for the Jobtrail API.
//!
//! Credential resolution itself happens at the API gateway, which
//! authenticates the raw key and forwards the resolved scope in trusted
//! internal headers:
//!
//! - `x-identity-team-id` (required)
//! - `x-identity-api-key-id` (optional; absent for credentials without a
//!   key scope)
//!
//! This middleware turns those headers into an [`AuthedKey`] in the request
//! extensions and rejects unidentified requests with 401. Handlers access
//! the scope through the [`Identity`] extractor.

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use jobtrail_commons::AuthedKey;
use log::debug;
use serde_json::json;
use std::future::{ready, Ready};
use std::rc::Rc;

pub const TEAM_ID_HEADER: &str = "x-identity-team-id";
pub const API_KEY_ID_HEADER: &str = "x-identity-api-key-id";

/// Extractor handing handlers the resolved authorization scope.
#[derive(Debug, Clone)]
pub struct Identity(pub AuthedKey);

impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthedKey>()
                .cloned()
                .map(Identity)
                .ok_or_else(|| ErrorUnauthorized("Unauthorized")),
        )
    }
}

/// Identity middleware factory.
pub struct IdentityMiddleware;

impl<S> Transform<S, ServiceRequest> for IdentityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct IdentityMiddlewareService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let team_id = req
                .headers()
                .get(TEAM_ID_HEADER)
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            let team_id = match team_id {
                Some(id) => id,
                None => {
                    debug!("request without identity headers rejected");
                    let response = HttpResponse::Unauthorized()
                        .json(json!({"success": false, "error": "Unauthorized"}));
                    return Ok(req.into_response(response));
                }
            };

            // A credential can resolve without a key scope; that is not a
            // transport failure, the handler decides whether it matters.
            let api_key_id = req
                .headers()
                .get(API_KEY_ID_HEADER)
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());

            req.extensions_mut()
                .insert(AuthedKey::new(api_key_id, team_id));
            service.call(req).await
        })
    }
}
