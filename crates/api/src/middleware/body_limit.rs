use tower_http::limit::RequestBodyLimitLayer;

/// Hard ceiling on request bodies, applied to every route. Upload routes
/// raise axum's default extractor limit to the same value.
pub fn body_limit_layer(max_bytes: usize) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(max_bytes)
}
