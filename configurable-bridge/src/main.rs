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

mod config;

use crate::config::Config;
use bus_bridge::{BusRegistry, Connector, Engine};
use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Bridges messages between buses according to a JSON5 route table")]
struct BridgeArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,

    /// Compile the route table against the configured connectors and exit.
    #[arg(long)]
    check: bool,
}

fn init_logging() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| e as Box<dyn Error>)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging()?;
    info!("Started configurable-bridge");

    let args = BridgeArgs::parse();
    let config = Config::load(&args.config)?;

    let connectors: Vec<Arc<dyn Connector>> = config
        .build_connectors()
        .into_iter()
        .map(|connector| connector as Arc<dyn Connector>)
        .collect();
    let buses = BusRegistry::from_connectors(connectors);
    let engine = Engine::new(buses.clone())
        .with_codecs(config.codecs())
        .with_config(config.engine_config());
    let table = config.route_table();

    if args.check {
        let routes = engine.compile(&table)?;
        for route in &routes {
            let destinations: Vec<&str> = route
                .destinations()
                .iter()
                .map(|destination| destination.label())
                .collect();
            println!(
                "{}: {} -> [{}] mode={} filters={:?} projection={}",
                route.name(),
                route.source().label(),
                destinations.join(", "),
                route.mode(),
                route.filter_names(),
                route.projection_name().unwrap_or("none"),
            );
        }
        println!("{} route(s) OK", routes.len());
        return Ok(());
    }

    let routes = engine.start_routes(&table).await?;
    info!(routes = ?routes.route_names(), "bridge running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, stopping routes");
    routes.stop().await;

    if let Err(err) = buses.close_all().await {
        warn!(err = %err, "unable to close every bus");
    }
    info!("configurable-bridge stopped");
    Ok(())
}
