// Copyright 2025 Fernando Borretti
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

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use axum::Router;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use axum::routing::get;
use axum::routing::post;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::time::sleep;

use crate::drill::get::get_handler;
use crate::drill::post::post_handler;
use crate::drill::state::MutableState;
use crate::drill::state::ServerState;
use crate::error::Fallible;
use crate::session::ReviewSession;
use crate::session::filter::Filter;
use crate::store::RecordStore;
use crate::types::set::SetId;

pub struct ServerOptions {
    pub port: u16,
    pub open_browser: bool,
}

/// Start a session over `set_id` and serve it until the user shuts it down
/// or the process is interrupted.
pub async fn start_server(
    store: Arc<dyn RecordStore>,
    set_id: SetId,
    filter: Filter,
    options: ServerOptions,
) -> Fallible<()> {
    let mut rng = StdRng::from_entropy();
    let session = ReviewSession::start(store.as_ref(), &set_id, filter, &mut rng).await?;
    log::debug!(
        "Session on {} with filter {filter}: {} cards",
        session.set_name(),
        session.progress().total
    );

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mutable = Arc::new(tokio::sync::Mutex::new(MutableState {
        session,
        notice: None,
    }));
    let state = ServerState {
        store: store.clone(),
        mutable: mutable.clone(),
        shutdown_tx: Arc::new(Mutex::new(Some(shutdown_tx))),
    };
    let app = Router::new();
    let app = app.route("/", get(get_handler));
    let app = app.route("/", post(post_handler));
    let app = app.route("/script.js", get(script));
    let app = app.route("/style.css", get(stylesheet));
    let app = app.fallback(not_found_handler);
    let app = app.with_state(state);
    let bind = format!("127.0.0.1:{}", options.port);

    if options.open_browser {
        // Open the browser once the listener is up.
        let url = format!("http://{bind}/");
        let target = bind.clone();
        tokio::spawn(async move {
            loop {
                if let Ok(stream) = TcpStream::connect(&target).await {
                    drop(stream);
                    break;
                }
                sleep(Duration::from_millis(1)).await;
            }
            let _ = open::that(url);
        });
    }

    log::debug!("Starting server on {bind}");
    let listener = TcpListener::bind(&bind).await?;
    println!("Drilling at http://{bind}/");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_rx))
        .await?;

    let mut mutable = mutable.lock().await;
    if mutable.session.pending_writes() > 0 {
        let left = mutable.session.retry_pending(store.as_ref()).await;
        if left > 0 {
            log::warn!("{left} writes could not be saved.");
        }
    }
    if let Some(summary) = mutable.session.summary() {
        println!(
            "Reviewed {} cards. Average {:.1}, score {}.",
            summary.total_cards, summary.avg_rating, summary.score
        );
    }
    Ok(())
}

async fn shutdown_signal(shutdown_rx: oneshot::Receiver<()>) {
    tokio::select! {
        _ = shutdown_rx => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    log::debug!("Stopping server");
}

async fn script() -> (StatusCode, [(HeaderName, &'static str); 1], &'static str) {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/javascript")],
        include_str!("script.js"),
    )
}

async fn stylesheet() -> (StatusCode, [(HeaderName, &'static str); 2], &'static [u8]) {
    let bytes = include_bytes!("style.css");
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/css"),
            (CACHE_CONTROL, "public, max-age=604800, immutable"),
        ],
        bytes,
    )
}

async fn not_found_handler() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html("Not Found".to_string()))
}
