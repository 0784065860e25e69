//! Protocol layer tests — field keys, scheme resolution, error types.

#[cfg(test)]
mod tests {
    use iopa_protocol::*;

    // ─────────────────────────────────────────────────────────────────────
    // Field keys
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn field_keys_are_verbatim() {
        assert_eq!(IOPA::SCHEME, "iopa.Scheme");
        assert_eq!(IOPA::METHOD, "iopa.Method");
        assert_eq!(IOPA::PATH, "iopa.Path");
        assert_eq!(IOPA::PATH_BASE, "iopa.PathBase");
        assert_eq!(IOPA::QUERY_STRING, "iopa.QueryString");
        assert_eq!(IOPA::PROTOCOL, "iopa.Protocol");
        assert_eq!(IOPA::HEADERS, "iopa.Headers");
        assert_eq!(IOPA::BODY, "iopa.Body");
        assert_eq!(IOPA::HOST, "iopa.Host");
        assert_eq!(IOPA::STATUS_CODE, "iopa.StatusCode");
        assert_eq!(IOPA::REASON_PHRASE, "iopa.ReasonPhrase");
        assert_eq!(IOPA::ERROR, "iopa.Error");
        assert_eq!(IOPA::VERSION, "iopa.Version");
        assert_eq!(IOPA::SEQ, "iopa.Seq");
        assert_eq!(SERVER::CAPABILITIES, "server.Capabilities");
        assert_eq!(SERVER::LOGGER, "server.Logger");
        assert_eq!(SERVER::APP_ID, "server.AppId");
        assert_eq!(SERVER::IS_LOCAL_ORIGIN, "server.IsLocalOrigin");
        assert_eq!(SERVER::REMOTE_ADDRESS, "server.RemoteAddress");
        assert_eq!(SERVER::REMOTE_PORT, "server.RemotePort");
        assert_eq!(SERVER::TLS, "server.TLS");
        assert_eq!(SERVER::PARENT_CONTEXT, "server.ParentContext");
        assert_eq!(APP::DEFAULT_APP, "app.DefaultApp");
        assert_eq!(APP::DEFAULT_MIDDLEWARE, "app.DefaultMiddleware");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scheme resolution
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn http_scheme_defaults() {
        let d = SchemeDefaults::resolve("http");
        assert_eq!(d.protocol, "HTTP/1.1");
        assert!(!d.tls);
        assert_eq!(d.default_port, 80);
    }

    #[test]
    fn https_scheme_defaults() {
        let d = SchemeDefaults::resolve("https:");
        assert_eq!(d.protocol, "HTTP/1.1");
        assert!(d.tls);
        assert_eq!(d.default_port, 443);
    }

    #[test]
    fn coap_scheme_defaults() {
        let d = SchemeDefaults::resolve("coap");
        assert_eq!(d.protocol, "COAP/1.0");
        assert!(!d.tls);
        assert_eq!(d.default_port, 5683);

        let d = SchemeDefaults::resolve("coaps");
        assert_eq!(d.protocol, "COAP/1.0");
        assert!(d.tls);
        assert_eq!(d.default_port, 5684);
    }

    #[test]
    fn mqtt_scheme_defaults() {
        let d = SchemeDefaults::resolve("mqtt");
        assert_eq!(d.protocol, "MQTT/3.1.1");
        assert!(!d.tls);
        assert_eq!(d.default_port, 1883);

        let d = SchemeDefaults::resolve("mqtts");
        assert_eq!(d.protocol, "MQTT/3.1.1");
        assert!(d.tls);
        assert_eq!(d.default_port, 8883);
    }

    #[test]
    fn unrecognized_scheme_falls_back() {
        let d = SchemeDefaults::resolve("ws");
        assert_eq!(d.protocol, "ws:");
        assert!(!d.tls);
        assert_eq!(d.default_port, 80);
    }

    #[test]
    fn resolve_accepts_both_colon_forms() {
        assert_eq!(
            SchemeDefaults::resolve("mqtt"),
            SchemeDefaults::resolve("mqtt:")
        );
    }

    // ─────────────────────────────────────────────────────────────────────
    // Pipeline errors
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn not_found_renders_404() {
        let e = PipelineError::not_found("/missing");
        assert_eq!(e.status_code(), 404);
        assert_eq!(e.reason_phrase(), "Not Found");
        assert!(e.to_string().contains("/missing"));
    }

    #[test]
    fn internal_renders_500() {
        let e = PipelineError::internal("boom");
        assert_eq!(e.status_code(), 500);
        assert_eq!(e.reason_phrase(), "Server Error");
        assert_eq!(e.to_string(), "boom");
    }

    #[test]
    fn error_serialization_is_tagged() {
        let e = PipelineError::not_found("/a");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "notFound");
        assert_eq!(json["path"], "/a");

        let e = PipelineError::internal("x");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "internal");
        assert_eq!(json["detail"], "x");
    }
}
