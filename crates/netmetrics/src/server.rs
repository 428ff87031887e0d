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

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::NetmetricsError;
use crate::metrics::MetricsManager;

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// `:9200` style addresses listen on every interface.
pub fn normalize_listen_address(listen_address: &str) -> String {
    let trimmed = listen_address.trim();
    if trimmed.starts_with(':') {
        format!("0.0.0.0{trimmed}")
    } else {
        trimmed.to_string()
    }
}

pub fn router(metrics_manager: Arc<MetricsManager>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(metrics_manager)
}

pub async fn bind(listen_address: &str) -> Result<TcpListener, NetmetricsError> {
    let address = normalize_listen_address(listen_address);
    TcpListener::bind(&address).await.map_err(|e| {
        NetmetricsError::ConfigError(format!("failed to listen on {address}: {e}"))
    })
}

/// Serves the exposition endpoints until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    metrics_manager: Arc<MetricsManager>,
    cancel: CancellationToken,
) -> Result<(), NetmetricsError> {
    if let Ok(address) = listener.local_addr() {
        tracing::info!(%address, "server: serving /metrics");
    }
    axum::serve(listener, router(metrics_manager))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;
    Ok(())
}

async fn metrics_handler(State(metrics_manager): State<Arc<MetricsManager>>) -> Response {
    match metrics_manager.export_all() {
        Ok(body) => ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            tracing::error!(error = ?e, "server: failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn health_handler() -> &'static str {
    "ok"
}
