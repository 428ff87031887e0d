/*
 * SPDX-FileCopyrightText: Copyright (c) 2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: Apache-2.0
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 * http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use netmetrics_exporter::bootstrap::BootstrapSet;
use netmetrics_exporter::collectors::{CollectorSet, HttpTransport};
use netmetrics_exporter::config::Config;
use netmetrics_exporter::inventory::{
    FileInventorySource, InventoryFormat, InventorySource, StaticInventorySource, load_inventory,
};
use netmetrics_exporter::metrics::{METRICS_PREFIX, MetricsManager};
use netmetrics_exporter::scheduler::PollScheduler;
use netmetrics_exporter::server;
use netmetrics_exporter::sink::{CompositeDataSink, DataSink, PrometheusSink, TracingSink};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Prometheus exporter for Arista, Cisco and SR Linux network devices.
#[derive(Parser, Debug)]
#[command(name = "netmetrics", version)]
struct Args {
    /// TOML configuration file.
    #[arg(long, env = "NETMETRICS_CONFIG")]
    config: Option<PathBuf>,

    /// Inventory file, flat or Ansible-style YAML.
    #[arg(long)]
    inventory: Option<PathBuf>,

    #[arg(long, value_enum)]
    inventory_format: Option<InventoryFormat>,

    /// Address for /metrics, e.g. `:9200` or `127.0.0.1:9200`.
    #[arg(long)]
    listen_address: Option<String>,

    /// Debug logging including raw device payloads.
    #[arg(
        long,
        short,
        env = "NETMETRICS_DEBUG",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    verbose: bool,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(path) = self.inventory {
            config.inventory.path = path;
        }
        if let Some(format) = self.inventory_format {
            config.inventory.format = format;
        }
        if let Some(listen_address) = self.listen_address {
            config.server.listen_address = listen_address;
        }
        config.verbose |= self.verbose;
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("netmetrics={level},netmetrics_exporter={level}"))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn inventory_source(config: &Config) -> anyhow::Result<Arc<dyn InventorySource>> {
    let inventory = &config.inventory;
    if inventory.reload_each_sweep {
        let source = FileInventorySource::new(inventory.path.clone(), inventory.format)
            .with_context(|| format!("loading inventory {}", inventory.path.display()))?;
        return Ok(Arc::new(source));
    }

    let devices = load_inventory(&inventory.path, inventory.format)
        .with_context(|| format!("loading inventory {}", inventory.path.display()))?;
    tracing::info!(
        devices = devices.len(),
        path = %inventory.path.display(),
        "inventory loaded"
    );
    Ok(Arc::new(StaticInventorySource::new(devices)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    init_tracing(config.verbose);

    let source = inventory_source(&config)?;

    let metrics_manager = Arc::new(MetricsManager::new());
    let prometheus_sink: Arc<dyn DataSink> =
        Arc::new(PrometheusSink::new(metrics_manager.clone(), METRICS_PREFIX)?);
    let sink: Arc<dyn DataSink> = if config.verbose {
        Arc::new(CompositeDataSink::new(vec![
            prometheus_sink,
            Arc::new(TracingSink),
        ]))
    } else {
        prometheus_sink
    };

    let transport = Arc::new(HttpTransport::new(&config.http, config.verbose)?);
    let collectors = CollectorSet::from_transport(transport.clone());
    let bootstraps = BootstrapSet::from_config(&config.bootstrap, &config.http, transport);

    let scheduler = PollScheduler::new(
        source,
        collectors,
        sink,
        bootstraps,
        &config.scheduler,
        &metrics_manager,
    )?;

    let listener = server::bind(&config.server.listen_address).await?;

    let cancel = CancellationToken::new();
    let scheduler_task = tokio::spawn({
        let cancel = cancel.clone();
        async move { scheduler.run(cancel).await }
    });
    let server_task = tokio::spawn(server::serve(
        listener,
        metrics_manager.clone(),
        cancel.clone(),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("shutdown requested");
    cancel.cancel();

    scheduler_task.await?;
    server_task.await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_from_debug_env() {
        // Single test so the env var is never mutated concurrently.
        unsafe { std::env::set_var("NETMETRICS_DEBUG", "1") };
        let enabled = Args::try_parse_from(["netmetrics"]).expect("NETMETRICS_DEBUG=1 parses");
        assert!(enabled.verbose);

        unsafe { std::env::set_var("NETMETRICS_DEBUG", "0") };
        let disabled = Args::try_parse_from(["netmetrics"]).expect("NETMETRICS_DEBUG=0 parses");
        assert!(!disabled.verbose);

        let flag = Args::try_parse_from(["netmetrics", "-v"]).expect("-v parses");
        assert!(flag.verbose);

        unsafe { std::env::remove_var("NETMETRICS_DEBUG") };
        let unset = Args::try_parse_from(["netmetrics"]).expect("no flags parses");
        assert!(!unset.verbose);
    }
}
