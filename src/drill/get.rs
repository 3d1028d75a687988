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

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use maud::Markup;
use maud::html;

use crate::drill::state::MutableState;
use crate::drill::state::ServerState;
use crate::drill::template::page_template;
use crate::session::Phase;
use crate::types::rating::Rating;
use crate::types::session_summary::SessionSummary;

pub async fn get_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    let mut mutable = state.mutable.lock().await;
    let body = render_body(&mutable);
    mutable.notice = None;
    let html = page_template(body);
    (StatusCode::OK, Html(html.into_string()))
}

fn render_body(mutable: &MutableState) -> Markup {
    let session = &mutable.session;
    let notice = html! {
        @if let Some(notice) = &mutable.notice {
            div.notice { (notice) }
        }
        @if session.pending_writes() > 0 {
            div.notice {
                (session.pending_writes()) " unsaved change(s). They will be retried on your next action."
            }
        }
    };
    let candidate = match session.current() {
        Some(candidate) => candidate,
        None => {
            return html! {
                div.root {
                    div.finished {
                        h1 { "Session Completed" }
                        (notice)
                        @match session.summary() {
                            Some(summary) => {
                                (render_summary(summary))
                            }
                            None => {
                                p { "No cards were rated." }
                            }
                        }
                        form action="/" method="post" {
                            input id="shutdown" type="submit" name="action" value="Shutdown";
                        }
                    }
                }
            };
        }
    };
    let progress = session.progress();
    let revealed = session.phase() == Phase::Revealed;
    let undo_disabled = !session.can_undo();
    let card_controls = if revealed {
        html! {
            form action="/" method="post" {
                @if undo_disabled {
                    input id="undo" type="submit" name="action" value="Undo" disabled;
                } @else {
                    input id="undo" type="submit" name="action" value="Undo";
                }
                div.spacer {}
                div.ratings {
                    @for rating in Rating::all() {
                        input.rating type="submit" name="action" value=(rating.to_string());
                    }
                }
                div.spacer {}
                input id="end" type="submit" name="action" value="End";
            }
        }
    } else {
        html! {
            form action="/" method="post" {
                @if undo_disabled {
                    input id="undo" type="submit" name="action" value="Undo" disabled;
                } @else {
                    input id="undo" type="submit" name="action" value="Undo";
                }
                div.spacer {}
                input id="reveal" type="submit" name="action" value="Reveal";
                div.spacer {}
                input id="end" type="submit" name="action" value="End";
            }
        }
    };
    html! {
        div.root {
            div.card {
                div.header {
                    h1 {
                        (session.set_name())
                    }
                    div.progress {
                        (progress.current) " / " (progress.total)
                    }
                }
                (notice)
                div.content {
                    div.question .rich-text {
                        (candidate.card.html_front())
                    }
                    @if revealed {
                        div.answer .rich-text {
                            (candidate.card.html_back())
                        }
                    } @else {
                        div.answer .rich-text {}
                    }
                }
                div.controls {
                    (card_controls)
                }
                div.footer {
                    "Filter: " (session.filter().to_string()) ". Rated: " (session.ratings().len()) "."
                }
            }
        }
    }
}

fn render_summary(summary: &SessionSummary) -> Markup {
    html! {
        table.summary {
            tbody {
                tr { td { "Cards" } td { (summary.total_cards) } }
                tr { td { "Average" } td { (format!("{:.1}", summary.avg_rating)) } }
                tr { td { "Score" } td { (summary.score) } }
                tr { td { "Low (2.5 or less)" } td { (summary.ratings.low) } }
                tr { td { "Mid" } td { (summary.ratings.mid) } }
                tr { td { "High (4 or more)" } td { (summary.ratings.high) } }
            }
        }
    }
}
