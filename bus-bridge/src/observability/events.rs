//! Canonical structured event names used across `bus-bridge`.

// Bus adapter and decorator events.
pub const BUS_CLOSED: &str = "bus_closed";
pub const BUS_CLOSE_FAILED: &str = "bus_close_failed";
pub const EGRESS_PUBLISH_OK: &str = "egress_publish_ok";
pub const EGRESS_PUBLISH_FAILED: &str = "egress_publish_failed";

// Lane pool and lane worker events.
pub const LANE_POOL_CREATE: &str = "lane_pool_create";
pub const LANE_POOL_CLOSE: &str = "lane_pool_close";
pub const LANE_WORKER_START: &str = "lane_worker_start";
pub const LANE_WORKER_STOP: &str = "lane_worker_stop";
pub const LANE_WORKER_JOIN_FAILED: &str = "lane_worker_join_failed";
pub const LANE_PUBLISH_ATTEMPT: &str = "lane_publish_attempt";
pub const LANE_PUBLISH_OK: &str = "lane_publish_ok";
pub const LANE_PUBLISH_FAILED: &str = "lane_publish_failed";
pub const LANE_COMPLETION_DROPPED: &str = "lane_completion_dropped";

// Ingress and pipeline events.
pub const INGRESS_RECEIVE: &str = "ingress_receive";
pub const INGRESS_REJECT_SHUTTING_DOWN: &str = "ingress_reject_shutting_down";
pub const PIPELINE_DECODE_FAILED: &str = "pipeline_decode_failed";
pub const PIPELINE_FILTERED: &str = "pipeline_filtered";
pub const PIPELINE_FILTER_FAILED: &str = "pipeline_filter_failed";
pub const PIPELINE_PROJECTION_MISSING_FIELD: &str = "pipeline_projection_missing_field";
pub const PIPELINE_PROJECTION_FAILED: &str = "pipeline_projection_failed";
pub const PROJECTION_BEST_EFFORT_PASSTHROUGH: &str = "projection_best_effort_passthrough";
pub const PIPELINE_ENCODE_FAILED: &str = "pipeline_encode_failed";
pub const PIPELINE_DELIVERED: &str = "pipeline_delivered";
pub const PIPELINE_UNDELIVERED: &str = "pipeline_undelivered";

// Delivery-mode retry state machine events.
pub const DELIVERY_RETRY_SCHEDULED: &str = "delivery_retry_scheduled";
pub const DELIVERY_TOLERATED: &str = "delivery_tolerated";
pub const DELIVERY_CANCELLED: &str = "delivery_cancelled";

// Control-plane lifecycle events.
pub const ROUTE_COMPILE_FAILED: &str = "route_compile_failed";
pub const ROUTE_START: &str = "route_start";
pub const ROUTE_START_FAILED: &str = "route_start_failed";
pub const ROUTE_STOP_START: &str = "route_stop_start";
pub const ROUTE_STOP_OK: &str = "route_stop_ok";
pub const ENGINE_START_OK: &str = "engine_start_ok";
pub const ENGINE_STOP_START: &str = "engine_stop_start";
pub const ENGINE_STOP_OK: &str = "engine_stop_ok";
