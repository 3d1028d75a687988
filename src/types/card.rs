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

use maud::Markup;
use maud::PreEscaped;
use maud::html;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorKind;
use crate::error::Fallible;
use crate::error::fail_with;
use crate::markdown::markdown_to_html;

/// A single flashcard. Cards have no identity of their own: they are
/// addressed by their position within the owning set.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(default)]
    front: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    front_image: Option<String>,
    #[serde(default)]
    back: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    back_image: Option<String>,
}

impl Card {
    pub fn new(
        front: impl Into<String>,
        front_image: Option<String>,
        back: impl Into<String>,
        back_image: Option<String>,
    ) -> Fallible<Self> {
        let card = Self {
            front: front.into().trim().to_string(),
            front_image: non_empty(front_image),
            back: back.into().trim().to_string(),
            back_image: non_empty(back_image),
        };
        if card.is_blank() {
            return fail_with(ErrorKind::InvalidInput, "card has no content.");
        }
        Ok(card)
    }

    #[cfg(test)]
    pub fn basic(front: impl Into<String>, back: impl Into<String>) -> Fallible<Self> {
        Self::new(front, None, back, None)
    }

    pub fn front(&self) -> &str {
        &self.front
    }

    #[cfg(test)]
    pub fn front_image(&self) -> Option<&str> {
        self.front_image.as_deref()
    }

    #[cfg(test)]
    pub fn back(&self) -> &str {
        &self.back
    }

    #[cfg(test)]
    pub fn back_image(&self) -> Option<&str> {
        self.back_image.as_deref()
    }

    pub fn is_blank(&self) -> bool {
        self.front.is_empty()
            && self.back.is_empty()
            && self.front_image.is_none()
            && self.back_image.is_none()
    }

    pub fn html_front(&self) -> Markup {
        render_side(&self.front, self.front_image.as_deref())
    }

    pub fn html_back(&self) -> Markup {
        render_side(&self.back, self.back_image.as_deref())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn render_side(text: &str, image: Option<&str>) -> Markup {
    html! {
        @if let Some(src) = image {
            img.card-image src=(src) alt="";
        }
        @if !text.is_empty() {
            (PreEscaped(markdown_to_html(text)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_card_is_rejected() {
        let err = Card::new("  ", Some(" ".to_string()), "", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_image_only_card_is_valid() -> Fallible<()> {
        let card = Card::new("", Some("cat.png".to_string()), "", None)?;
        assert_eq!(card.front_image(), Some("cat.png"));
        assert!(!card.is_blank());
        Ok(())
    }

    #[test]
    fn test_text_is_trimmed() -> Fallible<()> {
        let card = Card::basic("  hola ", "\thello\n")?;
        assert_eq!(card.front(), "hola");
        assert_eq!(card.back(), "hello");
        Ok(())
    }

    #[test]
    fn test_html_front_with_image() -> Fallible<()> {
        let card = Card::new("**dog**", Some("dog.png".to_string()), "perro", None)?;
        let html = card.html_front().into_string();
        assert!(html.contains("<img class=\"card-image\" src=\"dog.png\""));
        assert!(html.contains("<strong>dog</strong>"));
        Ok(())
    }

    #[test]
    fn test_json_roundtrip_omits_missing_images() -> Fallible<()> {
        let card = Card::basic("a", "b")?;
        let json = serde_json::to_string(&card)?;
        assert_eq!(json, r#"{"front":"a","back":"b"}"#);
        let parsed: Card = serde_json::from_str(&json)?;
        assert_eq!(parsed, card);
        Ok(())
    }
}
