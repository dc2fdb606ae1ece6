/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod support;

use bus_bridge::{now_unix_ms, HandleError, Metadata, ModeConfig, RouteConfig};
use memory_bus::InjectError;
use std::time::Duration;
use support::{created_at, table, Fixture, LEFT, RIGHT};

fn orders_route(mode: ModeConfig) -> RouteConfig {
    RouteConfig::direct("orders", (LEFT, "orders.in"), (RIGHT, "a")).with_mode(mode)
}

#[tokio::test(flavor = "multi_thread")]
async fn drop_mode_commits_expired_messages_without_publishing() {
    let fixture = Fixture::new();
    fixture.egress("a").fail_always(true);
    let routes = fixture
        .engine()
        .start_routes(&table(vec![orders_route(ModeConfig::drop(Some(1_000), None))]))
        .await
        .expect("routes should start");

    fixture
        .ingress("orders.in")
        .inject(b"late".to_vec(), created_at(now_unix_ms() - 1_500))
        .await
        .expect("expired message should be committed");

    assert_eq!(fixture.egress("a").attempts(), 1);
    assert_eq!(fixture.egress("a").published_count(), 0);
    routes.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn drop_mode_gives_up_after_max_attempts() {
    let fixture = Fixture::new();
    fixture.egress("a").fail_always(true);
    let routes = fixture
        .engine()
        .start_routes(&table(vec![orders_route(ModeConfig::drop(None, Some(3)))]))
        .await
        .expect("routes should start");

    fixture
        .ingress("orders.in")
        .inject(b"doomed".to_vec(), Metadata::new())
        .await
        .expect("message should be committed after the last attempt");

    assert_eq!(fixture.egress("a").attempts(), 3);
    routes.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn persistent_mode_holds_the_commit_until_the_destination_recovers() {
    let fixture = Fixture::new();
    let egress = fixture.egress("a");
    egress.fail_always(true);
    let routes = fixture
        .engine()
        .start_routes(&table(vec![orders_route(ModeConfig::persistent())]))
        .await
        .expect("routes should start");

    let ingress = fixture.ingress("orders.in");
    let injection = tokio::spawn(async move {
        ingress
            .inject(b"important".to_vec(), created_at(now_unix_ms() - 86_400_000))
            .await
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!injection.is_finished());
    assert!(egress.attempts() > 1);
    assert_eq!(egress.published_count(), 0);

    egress.fail_always(false);
    injection
        .await
        .expect("injection task should not panic")
        .expect("message should commit once published");
    assert_eq!(egress.published_count(), 1);
    routes.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn persistent_mode_never_commits_when_stopped_while_failing() {
    let fixture = Fixture::new();
    fixture.egress("a").fail_always(true);
    let routes = fixture
        .engine()
        .start_routes(&table(vec![orders_route(ModeConfig::persistent())]))
        .await
        .expect("routes should start");

    let ingress = fixture.ingress("orders.in");
    let injection =
        tokio::spawn(async move { ingress.inject(b"stuck".to_vec(), Metadata::new()).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    routes.stop().await;

    match injection.await.expect("injection task should not panic") {
        Err(InjectError::Refused(HandleError::Undelivered(err))) => {
            assert_eq!(err.route(), "orders");
            assert_eq!(err.failures().len(), 1);
            assert!(err.failures()[0].attempts() >= 1);
        }
        other => panic!("expected an undelivered refusal, got {other:?}"),
    }
    assert_eq!(fixture.ingress("orders.in").committed(), 0);
}
