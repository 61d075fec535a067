use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use tower::{Layer, Service};

use crate::{
    errors::RawError,
    interceptor::{Interceptor, RequestInfo},
};

/// A layer that turns a [RawError] returned by a handler into a logged, normalized JSON
/// error response.
#[derive(Clone, Debug)]
pub struct InterceptErrorLayer {
    interceptor: Interceptor,
}

impl InterceptErrorLayer {
    /// Create a new `InterceptErrorLayer` that runs `interceptor` on each error.
    pub fn new(interceptor: Interceptor) -> InterceptErrorLayer {
        InterceptErrorLayer { interceptor }
    }
}

impl<S> Layer<S> for InterceptErrorLayer {
    type Service = InterceptError<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InterceptError {
            inner,
            interceptor: self.interceptor.clone(),
        }
    }
}

/// The middleware created by [InterceptErrorLayer]
#[derive(Debug, Clone)]
pub struct InterceptError<S> {
    inner: S,
    interceptor: Interceptor,
}

impl<S> Service<Request> for InterceptError<S>
where
    S: Service<Request> + Send + 'static,
    S::Future: Send + 'static,
    S::Response: IntoResponse + Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let interceptor = self.interceptor.clone();
        let info = RequestInfo::from_request(&req);
        let fut = self.inner.call(req);
        Box::pin(async move {
            let mut res = fut.await?.into_response();
            let Some(err) = res.extensions_mut().remove::<RawError>() else {
                // The handler succeeded, or produced its own error response
                return Ok(res);
            };

            let body = interceptor.handle(err, &info, &mut res, |normalized| normalized);

            let mut new_res = body.into_response();
            // The interceptor already set the status, and the body may disagree with it
            *new_res.status_mut() = res.status();

            Ok(new_res)
        })
    }
}

#[cfg(test)]
mod test {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        routing::get,
        Router,
    };
    use serde_json::json;
    use tower::ServiceExt;

    use super::InterceptErrorLayer;
    use crate::{
        errors::RawError,
        interceptor::{Interceptor, InterceptorConfig},
        logger::{LineKind, MemorySink},
        Severity,
    };

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    fn make_app(levels: Option<Vec<Severity>>) -> (Router, MemorySink) {
        #[cfg(feature = "tracing")]
        crate::tracing_config::test::init();

        let sink = MemorySink::new();
        let interceptor =
            Interceptor::with_sink(InterceptorConfig { log_level: levels }, sink.clone());

        let items = Router::new().route(
            "/:id",
            get(|| async { Err::<&'static str, _>(RawError::from(404u16)) }),
        );

        let app = Router::new()
            .route("/200", get(|| async { (StatusCode::OK, "success") }))
            .route(
                "/teapot",
                get(|| async { (StatusCode::IM_A_TEAPOT, "short and stout") }),
            )
            .route(
                "/rich",
                get(|| async {
                    Err::<&'static str, _>(RawError::from(
                        json!({ "status": 503, "message": "db down", "retry": 30 }),
                    ))
                }),
            )
            .route(
                "/boom",
                get(|| async { Err::<&'static str, _>(RawError::failure(Boom)) }),
            )
            .route(
                "/string",
                get(|| async { Err::<&'static str, _>(RawError::from("oops")) }),
            )
            .nest("/items", items)
            .layer(InterceptErrorLayer::new(interceptor));

        (app, sink)
    }

    async fn send_req(app: &Router, url: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri(url)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1000000)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn passes_through_responses_without_errors() {
        let (app, sink) = make_app(None);

        let (code, body) = send_req(&app, "/200").await;
        assert_eq!(code, 200, "/200 status code");
        assert_eq!(body, "success", "/200 body");

        let (code, body) = send_req(&app, "/teapot").await;
        assert_eq!(code, 418, "/teapot status code");
        assert_eq!(body, "short and stout", "/teapot body");

        assert!(sink.lines().is_empty(), "nothing should be logged");
    }

    #[tokio::test]
    async fn status_error_in_nested_router() {
        let (app, sink) = make_app(Some(vec![Severity::Info]));

        let (code, body) = send_req(&app, "/items/7?full=true").await;
        assert_eq!(code, 404);
        assert_eq!(body, r##"{"status":404,"message":"Not Found"}"##);

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].kind, LineKind::Request);
        assert_eq!(lines[0].severity, Severity::Info);
        assert_eq!(lines[0].body, "GET /items/7?full=true (404) - Not Found");
    }

    #[tokio::test]
    async fn rich_error_body_is_unchanged() {
        let (app, sink) = make_app(Some(vec![Severity::Error]));

        let (code, body) = send_req(&app, "/rich").await;
        assert_eq!(code, 503);
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&body).unwrap(),
            json!({ "status": 503, "message": "db down", "retry": 30 })
        );

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].severity, Severity::Error);
        assert_eq!(lines[0].body, "GET /rich (503) - db down");
    }

    #[tokio::test]
    async fn failure_hides_message_from_client() {
        let (app, sink) = make_app(None);

        let (code, body) = send_req(&app, "/boom").await;
        assert_eq!(code, 500);
        assert_eq!(body, r##"{"status":500,"message":"Internal Server Error"}"##);
        assert_eq!(sink.lines()[0].body, "GET /boom (500) - boom");
    }

    #[tokio::test]
    async fn gated_errors_still_normalize() {
        let (app, sink) = make_app(Some(vec![Severity::Info]));

        let (code, body) = send_req(&app, "/string").await;
        assert_eq!(code, 500);
        assert_eq!(body, r##"{"status":500,"message":"Internal Server Error"}"##);
        assert!(sink.lines().is_empty(), "server errors are not logged at info");
    }
}
