//! Context pool tests — allocation defaults, recycling hygiene, sequence
//! ids, request construction from URLs, capability merging, disposal.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use iopa_context::{ContextEvent, ContextPool, PoolConfig};
    use iopa_protocol::{IOPA, PipelineError, SERVER};
    use serde_json::{Value, json};

    // ─────────────────────────────────────────────────────────────────────
    // Allocation defaults
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn create_context_exposes_documented_defaults() {
        let pool = ContextPool::new();
        let context = pool.create_context();

        assert_eq!(context.version(), "1.2");
        assert_ne!(context.seq(), 0);
        assert!(context.headers().is_empty());
        assert_eq!(context.method(), "");
        assert_eq!(context.path(), "");
        assert_eq!(context.path_base(), "");
        assert_eq!(context.scheme(), "");
        assert_eq!(context.query_string(), "");
        assert_eq!(context.protocol(), "");
        assert_eq!(context.host(), "");
        assert!(context.body().is_none());
        assert!(context.status_code().is_none());
        assert!(!context.is_cancelled());
        assert!(context.cancellation_token().is_some());
    }

    #[test]
    fn create_context_pairs_exactly_one_response() {
        let pool = ContextPool::new();
        let context = pool.create_context();

        let response = context.response().expect("paired response");
        assert!(response.response().is_none());
        assert!(!response.is_request());
        assert!(response.status_code().is_none());
        assert_eq!(response.reason_phrase(), "");
        assert!(response.headers().is_empty());
        assert!(response.body().is_none());

        let parent = response.parent().expect("parent back-reference");
        assert!(parent.same(&context));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Recycling hygiene
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn disposed_slot_leaks_nothing_to_next_tenant() {
        let pool = ContextPool::new();
        let context = pool.create_context();
        context.set_method("PUT");
        context.set_header("X-Custom", "abc");
        context.set_body(json!({"payload": true}));
        context.set("custom.Key", json!("secret"));
        context.set_error(PipelineError::internal("stale"));

        let old = context.clone();
        pool.dispose(&context);

        // LIFO free list: the next allocation reuses the request cell.
        let fresh = pool.allocate();
        assert!(fresh.same(&old));
        assert_eq!(fresh.method(), "");
        assert!(fresh.header("X-Custom").is_none());
        assert!(fresh.body().is_none());
        assert!(fresh.get("custom.Key").is_none());
        assert!(fresh.error().is_none());
        assert!(fresh.response().is_none());
    }

    #[test]
    fn dispose_returns_both_cells_to_the_free_list() {
        let pool = ContextPool::new();
        let context = pool.create_context();
        assert_eq!(pool.free_count(), 0);

        pool.dispose(&context);
        assert_eq!(pool.free_count(), 2);
    }

    #[test]
    fn double_dispose_is_a_noop() {
        let pool = ContextPool::new();
        let context = pool.create_context();

        pool.dispose(&context);
        assert_eq!(pool.free_count(), 2);

        pool.dispose(&context);
        assert_eq!(pool.free_count(), 2);
    }

    #[test]
    fn dispose_cancels_outstanding_token() {
        let pool = ContextPool::new();
        let context = pool.create_context();
        let token = context.cancellation_token().unwrap();

        assert!(!token.is_cancelled());
        pool.dispose(&context);
        assert!(token.is_cancelled());
    }

    #[test]
    fn dispose_emits_finish_event() {
        let pool = ContextPool::new();
        let context = pool.create_context();
        let mut events = context.subscribe().unwrap();

        pool.dispose(&context);
        assert_eq!(events.try_recv().unwrap(), ContextEvent::Finish);
    }

    #[test]
    fn free_list_retention_is_bounded_by_capacity() {
        let pool = ContextPool::with_config(PoolConfig { capacity: 1 });
        let context = pool.create_context();

        pool.dispose(&context);
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn pool_grows_beyond_capacity_without_failing() {
        let pool = ContextPool::with_config(PoolConfig { capacity: 1 });
        let contexts: Vec<_> = (0..8).map(|_| pool.create_context()).collect();

        for (i, a) in contexts.iter().enumerate() {
            for b in &contexts[i + 1..] {
                assert!(!a.same(b));
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Sequence ids
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn sequence_ids_increase_monotonically_and_skip_zero() {
        let pool = ContextPool::new();
        let mut prev = pool.allocate().seq();

        for _ in 0..50 {
            let next = pool.allocate().seq();
            let mut expected = prev.wrapping_add(1);
            if expected == 0 {
                expected = 1;
            }
            assert_eq!(next, expected);
            assert_ne!(next, 0);
            prev = next;
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Request construction
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn http_request_defaults() {
        let pool = ContextPool::new();
        let context = pool.create_request("http://example.com/a").unwrap();

        assert_eq!(context.protocol(), "HTTP/1.1");
        assert!(!context.tls());
        assert_eq!(context.remote_port(), Some(80));
        assert_eq!(context.host(), "example.com");
        assert_eq!(context.remote_address(), "example.com");
        assert_eq!(context.scheme(), "http:");
        assert_eq!(context.path(), "/a");
        assert_eq!(context.method(), "GET");
        assert!(context.is_request());
        assert!(context.is_local_origin());
        assert_eq!(
            context.original_url().as_deref(),
            Some("http://example.com/a")
        );
        assert_eq!(context.header("Host").as_deref(), Some("example.com"));
    }

    #[test]
    fn explicit_port_overrides_table_default() {
        let pool = ContextPool::new();
        let context = pool.create_request("mqtts://broker.test:8884/x").unwrap();

        assert_eq!(context.protocol(), "MQTT/3.1.1");
        assert!(context.tls());
        assert_eq!(context.remote_port(), Some(8884));
        assert_eq!(context.host(), "broker.test");
        assert_eq!(context.path(), "/x");
    }

    #[test]
    fn mqtt_request_uses_table_default_port() {
        let pool = ContextPool::new();
        let context = pool.create_request("mqtt://broker.test/topic").unwrap();

        assert_eq!(context.protocol(), "MQTT/3.1.1");
        assert!(!context.tls());
        assert_eq!(context.remote_port(), Some(1883));
        assert!(context.header("Host").is_none());
    }

    #[test]
    fn coaps_request_defaults() {
        let pool = ContextPool::new();
        let context = pool.create_request("coaps://device.local/led").unwrap();

        assert_eq!(context.protocol(), "COAP/1.0");
        assert!(context.tls());
        assert_eq!(context.remote_port(), Some(5684));
    }

    #[test]
    fn unrecognized_scheme_falls_back_verbatim() {
        let pool = ContextPool::new();
        let context = pool.create_request("ws://gateway.test/feed").unwrap();

        assert_eq!(context.protocol(), "ws:");
        assert!(!context.tls());
        assert_eq!(context.remote_port(), Some(80));
    }

    #[test]
    fn query_string_is_captured() {
        let pool = ContextPool::new();
        let context = pool
            .create_request("https://example.com/search?q=iopa&page=2")
            .unwrap();

        assert_eq!(context.query_string(), "q=iopa&page=2");
        assert_eq!(context.path(), "/search");
        assert!(context.tls());
        assert_eq!(context.remote_port(), Some(443));
    }

    #[test]
    fn method_shorthand_option() {
        let pool = ContextPool::new();
        let context = pool
            .create_request_with("http://example.com/items", "POST")
            .unwrap();

        assert_eq!(context.method(), "POST");
    }

    #[test]
    fn option_map_wins_over_derived_defaults() {
        let pool = ContextPool::new();
        let options: HashMap<String, Value> = HashMap::from([
            (IOPA::METHOD.to_string(), json!("DELETE")),
            (IOPA::PATH.to_string(), json!("/override")),
            ("custom.Flag".to_string(), json!(true)),
        ]);
        let context = pool
            .create_request_with("http://example.com/original", options)
            .unwrap();

        assert_eq!(context.method(), "DELETE");
        assert_eq!(context.path(), "/override");
        assert_eq!(context.get("custom.Flag"), Some(json!(true)));
        // Untouched defaults survive the merge.
        assert_eq!(context.host(), "example.com");
        assert_eq!(context.protocol(), "HTTP/1.1");
    }

    #[test]
    fn invalid_url_is_a_typed_error() {
        let pool = ContextPool::new();
        let err = pool.create_request("not a url").unwrap_err();
        assert!(err.to_string().contains("invalid request url"));
    }

    #[test]
    fn create_request_alone_has_no_response() {
        let pool = ContextPool::new();
        let context = pool.create_request("http://example.com/").unwrap();
        assert!(context.response().is_none());
    }

    #[test]
    fn create_request_response_inherits_connection_fields() {
        let pool = ContextPool::new();
        let context = pool
            .create_request_response("https://example.com:9443/a")
            .unwrap();

        let response = context.response().expect("paired response");
        assert_eq!(response.protocol(), "HTTP/1.1");
        assert!(response.tls());
        assert_eq!(response.remote_address(), "example.com");
        assert_eq!(response.remote_port(), Some(9443));
        assert!(!response.is_request());
        assert!(!response.is_local_origin());
        assert!(response.parent().unwrap().same(&context));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Capability merging
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn merged_capabilities_are_structurally_independent() {
        let pool = ContextPool::new();
        let parent = pool.create_context();
        parent.set_capability("urn:io.iopa:cache", json!({"version": "1.0", "size": 64}));

        let child = pool.create_context();
        pool.merge_capabilities(&child, &parent);

        assert_eq!(
            child.capability("urn:io.iopa:cache"),
            parent.capability("urn:io.iopa:cache")
        );

        // Mutating the child's entry must not reach the parent.
        child.set_capability("urn:io.iopa:cache", json!({"version": "2.0"}));
        assert_eq!(
            parent.capability("urn:io.iopa:cache").unwrap()["version"],
            "1.0"
        );
        assert!(child.parent().unwrap().same(&parent));
    }

    #[test]
    fn merge_keeps_existing_child_entries() {
        let pool = ContextPool::new();
        let parent = pool.create_context();
        parent.set_capability("urn:io.iopa:log", json!({"level": "info"}));

        let child = pool.create_context();
        child.set_capability("urn:io.iopa:log", json!({"level": "debug"}));
        pool.merge_capabilities(&child, &parent);

        assert_eq!(
            child.capability("urn:io.iopa:log").unwrap()["level"],
            "debug"
        );
    }

    #[test]
    fn merge_covers_response_capabilities() {
        let pool = ContextPool::new();
        let parent = pool.create_context();
        parent
            .response()
            .unwrap()
            .set_capability("urn:io.iopa:stream", json!({"chunked": true}));

        let child = pool.create_context();
        pool.merge_capabilities(&child, &parent);

        assert_eq!(
            child
                .response()
                .unwrap()
                .capability("urn:io.iopa:stream")
                .unwrap()["chunked"],
            json!(true)
        );
    }

    // ─────────────────────────────────────────────────────────────────────
    // Boundary keys on pooled contexts
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn boundary_keys_reflect_request_construction() {
        let pool = ContextPool::new();
        let context = pool.create_request("http://example.com/a?x=1").unwrap();

        assert_eq!(context.get(IOPA::METHOD), Some(json!("GET")));
        assert_eq!(context.get(IOPA::PATH), Some(json!("/a")));
        assert_eq!(context.get(IOPA::QUERY_STRING), Some(json!("x=1")));
        assert_eq!(context.get(IOPA::PROTOCOL), Some(json!("HTTP/1.1")));
        assert_eq!(context.get(SERVER::TLS), Some(json!(false)));
        assert_eq!(context.get(SERVER::REMOTE_PORT), Some(json!(80)));
        assert_eq!(context.get(SERVER::IS_REQUEST), Some(json!(true)));
        assert_eq!(
            context.get(SERVER::ORIGINAL_URL),
            Some(json!("http://example.com/a?x=1"))
        );
    }
}
