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

use std::str::FromStr;

use axum::Form;
use axum::extract::State;
use axum::response::Redirect;
use serde::Deserialize;

use crate::drill::state::MutableState;
use crate::drill::state::ServerState;
use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::error::Fallible;

#[derive(Debug, PartialEq)]
enum Action {
    Reveal,
    Undo,
    End,
    Shutdown,
    /// A rating button: its label is the rating.
    Rate(f64),
}

impl FromStr for Action {
    type Err = ErrorReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Reveal" => Ok(Action::Reveal),
            "Undo" => Ok(Action::Undo),
            "End" => Ok(Action::End),
            "Shutdown" => Ok(Action::Shutdown),
            other => other.parse::<f64>().map(Action::Rate).map_err(|_| {
                ErrorReport::with_kind(ErrorKind::InvalidInput, format!("unknown action: {other:?}"))
            }),
        }
    }
}

#[derive(Deserialize)]
pub struct FormData {
    action: String,
}

pub async fn post_handler(
    State(state): State<ServerState>,
    Form(form): Form<FormData>,
) -> Redirect {
    let mut mutable = state.mutable.lock().await;
    mutable.notice = None;
    let result = match form.action.parse::<Action>() {
        Ok(action) => action_handler(&state, &mut mutable, action).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        match e.kind() {
            ErrorKind::StorageUnavailable | ErrorKind::Other => log::error!("{e}"),
            _ => log::warn!("{e}"),
        }
        mutable.notice = Some(e.to_string());
    }
    Redirect::to("/")
}

async fn action_handler(
    state: &ServerState,
    mutable: &mut MutableState,
    action: Action,
) -> Fallible<()> {
    let store = state.store.as_ref();
    if mutable.session.pending_writes() > 0 {
        let left = mutable.session.retry_pending(store).await;
        log::debug!("{left} writes still pending after retry");
    }
    match action {
        Action::Reveal => {
            mutable.session.reveal()?;
        }
        Action::Rate(value) => {
            let outcome = mutable.session.rate(store, value).await?;
            log::debug!(
                "Card {} rated {} (review #{})",
                outcome.record.card_index,
                outcome.record.rating,
                outcome.record.total_reviews
            );
            if let Some(summary) = &outcome.summary {
                log::debug!("Session completed with score {}", summary.score);
            }
            if !outcome.persisted {
                mutable.notice = Some("Your rating could not be saved yet.".to_string());
            }
        }
        Action::Undo => {
            if !mutable.session.undo(store).await? {
                mutable.notice = Some("The undo could not be saved yet.".to_string());
            }
        }
        Action::End => {
            mutable.session.end(store).await?;
        }
        Action::Shutdown => {
            log::debug!("Shutdown requested");
            let sender = match state.shutdown_tx.lock() {
                Ok(mut guard) => guard.take(),
                Err(_) => None,
            };
            if let Some(sender) = sender {
                let _ = sender.send(());
            }
        }
    }
    Ok(())
}
