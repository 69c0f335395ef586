//! Matchit routing configuration.

use std::sync::Arc;

use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use matchit::Router as MatchitRouter;
use tracing::warn;

use sheet_clean_core::config::CleanConfig;
use sheet_clean_core::error::FilterError;
use sheet_clean_core::row::EntityType;

use crate::handlers;
use crate::handlers::request_utils::read_request_body_with_timeout;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CleanConfig>,
}

/// HTTP request router.
pub struct Router {
    inner: MatchitRouter<RouteHandler>,
    state: AppState,
}

const ROUTES: &[(&str, RouteHandler)] = &[
    ("/entities/{entity}/schema", RouteHandler::Schema),
    ("/entities/{entity}/presets", RouteHandler::Presets),
    ("/entities/{entity}/validate", RouteHandler::Validate),
    ("/entities/{entity}/validate/field", RouteHandler::ValidateField),
    ("/entities/{entity}/filter", RouteHandler::TextFilter),
    ("/entities/{entity}/filter/chips", RouteHandler::ChipReplay),
    ("/entities/{entity}/filter/expression", RouteHandler::ExpressionFilter),
    ("/entities/{entity}/headers", RouteHandler::Headers),
    ("/rules/validate", RouteHandler::RuleValidate),
    ("/rules/build", RouteHandler::RuleBuild),
    ("/rules/export", RouteHandler::RuleExport),
];

impl Router {
    /// Creates a router with every endpoint registered.
    pub fn new(config: Arc<CleanConfig>) -> Self {
        let mut router = MatchitRouter::new();
        for (path, handler) in ROUTES {
            router
                .insert(*path, *handler)
                .unwrap_or_else(|e| panic!("Failed to insert {} route: {}", path, e));
        }

        Self {
            inner: router,
            state: AppState { config },
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Routes a request, turning every failure into a JSON error response.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Bytes>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        match self.route(req).await {
            Ok(response) => response,
            Err(err) => {
                warn!(%method, %path, "Request failed: {}", err);
                Response::from(err)
            }
        }
    }

    /// Routes an incoming request to the appropriate handler.
    pub async fn route<B>(&self, req: Request<B>) -> Result<Response<Bytes>, RouterError>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let path = req.uri().path().to_string();
        let matched = self
            .inner
            .at(&path)
            .map_err(|_| RouterError::NotFound(format!("No route found for {}", path)))?;
        let handler = *matched.value;
        let entity = matched
            .params
            .get("entity")
            .map(|name| {
                name.parse::<EntityType>()
                    .map_err(|e| RouterError::NotFound(e.to_string()))
            })
            .transpose()?;

        if req.method() != handler.method() {
            return Err(RouterError::MethodNotAllowed);
        }
        let body = if handler.method() == Method::POST {
            read_request_body_with_timeout(req, self.state.config.request_timeout_ms).await?
        } else {
            Bytes::new()
        };

        handler.handle(&body, entity, &self.state)
    }
}

/// Route handler function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteHandler {
    Schema,
    Presets,
    Validate,
    ValidateField,
    TextFilter,
    ChipReplay,
    ExpressionFilter,
    Headers,
    RuleValidate,
    RuleBuild,
    RuleExport,
}

impl RouteHandler {
    fn method(&self) -> Method {
        match self {
            RouteHandler::Schema | RouteHandler::Presets => Method::GET,
            _ => Method::POST,
        }
    }

    fn handle(
        &self,
        body: &Bytes,
        entity: Option<EntityType>,
        state: &AppState,
    ) -> Result<Response<Bytes>, RouterError> {
        let require_entity =
            || entity.ok_or_else(|| RouterError::BadRequest("Missing entity".to_string()));
        match self {
            RouteHandler::Schema => handlers::get_schema(require_entity()?),
            RouteHandler::Presets => handlers::get_presets(require_entity()?),
            RouteHandler::Validate => handlers::validate_rows(body, require_entity()?, state),
            RouteHandler::ValidateField => handlers::validate_field(body, require_entity()?, state),
            RouteHandler::TextFilter => handlers::text_filter(body, require_entity()?, state),
            RouteHandler::ChipReplay => handlers::replay_chips(body, require_entity()?),
            RouteHandler::ExpressionFilter => {
                require_entity()?;
                handlers::expression_filter(body, state)
            }
            RouteHandler::Headers => {
                require_entity()?;
                handlers::map_headers(body)
            }
            RouteHandler::RuleValidate => handlers::validate_rule(body),
            RouteHandler::RuleBuild => handlers::create_rule(body),
            RouteHandler::RuleExport => handlers::export_rules(body),
        }
    }
}

/// Router error type.
#[derive(Debug)]
pub enum RouterError {
    MethodNotAllowed,
    InternalError(String),
    Timeout,
    BadRequest(String),
    NotFound(String),
    /// Typed filter failure, answered with 422
    Filter(FilterError),
}

impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterError::MethodNotAllowed => write!(f, "Method Not Allowed"),
            RouterError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            RouterError::Timeout => write!(f, "Request Timeout"),
            RouterError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            RouterError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            RouterError::Filter(err) => write!(f, "Filter Error: {}", err),
        }
    }
}

impl std::error::Error for RouterError {}

impl From<FilterError> for RouterError {
    fn from(err: FilterError) -> Self {
        RouterError::Filter(err)
    }
}

impl RouterError {
    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            RouterError::MethodNotAllowed => 405,
            RouterError::InternalError(_) => 500,
            RouterError::Timeout => 408,
            RouterError::BadRequest(_) => 400,
            RouterError::NotFound(_) => 404,
            RouterError::Filter(_) => 422,
        }
    }
}

impl From<RouterError> for Response<Bytes> {
    fn from(err: RouterError) -> Self {
        let status = err.status();
        let error_response = match &err {
            RouterError::Filter(filter) => handlers::filter_error_response(status, filter),
            RouterError::MethodNotAllowed => {
                handlers::error_response(status, "Method Not Allowed".to_string(), None)
            }
            RouterError::Timeout => {
                handlers::error_response(status, "Request Timeout".to_string(), None)
            }
            RouterError::InternalError(msg)
            | RouterError::BadRequest(msg)
            | RouterError::NotFound(msg) => handlers::error_response(status, msg.clone(), None),
        };

        let body = serde_json::to_vec(&error_response)
            .unwrap_or_else(|e| format!("{{\"success\":false,\"error\":{{\"code\":\"500\",\"message\":\"Failed to serialize error: {}\",\"details\":null}}}}", e).into_bytes());

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Bytes::from(body))
            .unwrap_or_else(|_| {
                let mut fallback = Response::new(Bytes::from_static(b"Internal Server Error"));
                *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}
