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

use tokio::sync::oneshot;

use crate::session::ReviewSession;
use crate::store::RecordStore;

#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<dyn RecordStore>,
    /// A `tokio` mutex: handlers hold it across store writes.
    pub mutable: Arc<tokio::sync::Mutex<MutableState>>,
    pub shutdown_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

pub struct MutableState {
    pub session: ReviewSession,
    /// Shown once on the next page render.
    pub notice: Option<String>,
}
