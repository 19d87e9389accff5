// Copyright 2025 The Xref Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use xref_serve::{router, run_reloader, standard_registry, Opts};

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Opts::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Some(logdir) = &opts.logdir {
        std::fs::create_dir_all(logdir)
            .with_context(|| format!("create log directory {}", logdir.display()))?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(logdir.join("xref-server.log"))
            .with_context(|| format!("open log file under {}", logdir.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let registry = Arc::new(standard_registry(&opts.project, opts.index_dir.clone()));

    // First discovery pass before accepting queries, then the periodic
    // reloader keeps the registry current.
    {
        let registry = Arc::clone(&registry);
        tokio::task::spawn_blocking(move || registry.update())
            .await
            .context("initial index discovery")?;
    }
    tokio::spawn(run_reloader(Arc::clone(&registry)));

    let app = router(Arc::clone(&registry), opts.web_root.clone(), opts.index_files());

    let addr: SocketAddr = opts
        .bind_addr()
        .parse()
        .with_context(|| format!("parse listen address {}", opts.bind_addr()))?;
    tracing::info!("serving queries on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))?;
    axum::serve(listener, app).await.context("serve")?;

    Ok(())
}
